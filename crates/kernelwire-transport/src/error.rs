/// Errors that can occur in multipart transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The endpoint has been closed.
    #[error("socket closed")]
    Closed,

    /// The endpoint is not connected to a peer.
    #[error("socket has no connected peer")]
    NoPeer,

    /// A routing socket was asked to send without a leading identity frame.
    #[error("router send requires an identity frame")]
    MissingIdentity,

    /// The identity frame does not address the connected peer.
    #[error("unknown routing identity ({0} bytes)")]
    UnknownIdentity(usize),

    /// The socket kind string is not recognised.
    #[error("unknown socket kind '{0}'")]
    UnknownKind(String),

    /// An I/O error occurred on the transport.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;
