use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("kernelwire {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: kernelwire");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!(
        "build_target: {}",
        option_env!("KERNELWIRE_BUILD_TARGET").unwrap_or("unknown")
    );
    println!(
        "build_profile: {}",
        option_env!("KERNELWIRE_BUILD_PROFILE").unwrap_or("unknown")
    );
    println!(
        "delimiter: {}",
        String::from_utf8_lossy(kernelwire_message::DELIMITER)
    );
    println!(
        "protocol_version: {}",
        kernelwire_message::DEFAULT_PROTOCOL_VERSION
    );

    Ok(SUCCESS)
}
