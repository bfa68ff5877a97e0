//! Multipart socket abstraction.
//!
//! The message layers above only need two things from a transport:
//! - sending an ordered sequence of opaque byte frames
//! - subscribing handlers to events that deliver received frame sequences
//!
//! [`MultipartSocket`] captures that contract. [`LocalSocket`] is an
//! in-process implementation with connected pairs, used for tests and demos.

pub mod error;
pub mod kind;
pub mod local;
pub mod traits;

pub use error::{Result, TransportError};
pub use kind::SocketKind;
pub use local::LocalSocket;
pub use traits::{FrameHandler, MultipartSocket, SendFlags, MESSAGE_EVENT};
