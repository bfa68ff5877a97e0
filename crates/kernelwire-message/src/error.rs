use std::fmt;

/// One of the four JSON sections of a message body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Header,
    ParentHeader,
    Metadata,
    Content,
}

impl Section {
    /// Sections in wire order.
    pub const ALL: [Section; 4] = [
        Section::Header,
        Section::ParentHeader,
        Section::Metadata,
        Section::Content,
    ];
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Section::Header => "header",
            Section::ParentHeader => "parent_header",
            Section::Metadata => "metadata",
            Section::Content => "content",
        })
    }
}

/// Fatal errors raised while encoding or decoding a message.
///
/// Expected transport conditions (missing delimiter, short frame lists,
/// bad signatures) are not errors; see [`crate::DecodeAbort`].
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// A body section is not a UTF-8 JSON object, or could not be serialized.
    #[error("invalid {section} json: {source}")]
    Json {
        section: Section,
        source: serde_json::Error,
    },

    /// The signing key was rejected by the MAC implementation.
    ///
    /// The HMAC schemes accept keys of any length and never produce this;
    /// it is reserved for schemes that bound the key length.
    #[error("invalid signing key length")]
    InvalidKey,
}

pub type Result<T> = std::result::Result<T, WireError>;
