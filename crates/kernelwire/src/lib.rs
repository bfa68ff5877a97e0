//! Signed multipart messaging between compute kernels and their clients.
//!
//! # Crate Structure
//!
//! - [`transport`]: Multipart socket contract and in-process endpoints
//! - [`message`]: Message model and the signed wire codec
//! - [`socket`]: Message-aware adapter over a multipart socket

/// Re-export transport types.
pub mod transport {
    pub use kernelwire_transport::*;
}

/// Re-export message types.
pub mod message {
    pub use kernelwire_message::*;
}

/// Re-export socket adapter types.
pub mod socket {
    pub use kernelwire_socket::*;
}

pub use kernelwire_message::{Message, WireConfig};
pub use kernelwire_socket::MessageSocket;
