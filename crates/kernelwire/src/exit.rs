use std::fmt;
use std::io;

use kernelwire_message::{DecodeAbort, WireError};
use kernelwire_socket::SocketError;
use kernelwire_transport::TransportError;

// sysexits-style exit codes.
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => FAILURE,
        io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof => DATA_INVALID,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn wire_error(context: &str, err: WireError) -> CliError {
    match err {
        WireError::Json { .. } => CliError::new(DATA_INVALID, format!("{context}: {err}")),
        WireError::InvalidKey => CliError::new(USAGE, format!("{context}: {err}")),
    }
}

pub fn decode_abort(reason: DecodeAbort) -> CliError {
    CliError::new(DATA_INVALID, format!("message rejected: {reason}"))
}

pub fn socket_error(context: &str, err: SocketError) -> CliError {
    match err {
        SocketError::Wire(err) => wire_error(context, err),
        SocketError::Transport(TransportError::Io(source)) => io_error(context, source),
        SocketError::Transport(err) => {
            CliError::new(TRANSPORT_ERROR, format!("{context}: {err}"))
        }
    }
}
