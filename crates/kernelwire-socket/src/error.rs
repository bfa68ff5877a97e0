/// Errors that can occur in message socket operations.
#[derive(Debug, thiserror::Error)]
pub enum SocketError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] kernelwire_transport::TransportError),

    /// Message encode error.
    #[error("wire error: {0}")]
    Wire(#[from] kernelwire_message::WireError),
}

pub type Result<T> = std::result::Result<T, SocketError>;
