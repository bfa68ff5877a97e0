//! Signed multipart message codec.
//!
//! A message travels as an ordered list of frames:
//!
//! ```text
//! <idents...> <IDS|MSG> <hex signature> <header> <parent_header> <metadata> <content> <blobs...>
//! ```
//!
//! The four JSON frames are authenticated with an HMAC keyed by a shared
//! secret. An empty key disables signing and verification.

pub mod config;
pub mod error;
pub mod message;
pub mod reply;
pub mod sign;

pub use config::WireConfig;
pub use error::{Result, Section, WireError};
pub use message::{
    DecodeAbort, Decoded, JsonObject, Message, DEFAULT_PROTOCOL_VERSION, DELIMITER, MSG_ID,
    MSG_TYPE, SESSION, USERNAME, VERSION,
};
pub use reply::MessageSender;
pub use sign::{SignatureScheme, Signer};
