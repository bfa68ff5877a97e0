use bytes::Bytes;
use serde_json::{Map, Value};
use tracing::{debug, trace, warn};

use crate::config::WireConfig;
use crate::error::{Result, Section, WireError};

/// Frame separating routing identities from the signed body.
pub const DELIMITER: &[u8] = b"<IDS|MSG>";

/// Protocol version stamped on messages built with [`Message::request`].
pub const DEFAULT_PROTOCOL_VERSION: &str = "5.3";

/// Header field: unique message id.
pub const MSG_ID: &str = "msg_id";
/// Header field: user that sent the message.
pub const USERNAME: &str = "username";
/// Header field: session id.
pub const SESSION: &str = "session";
/// Header field: message type.
pub const MSG_TYPE: &str = "msg_type";
/// Header field: protocol version.
pub const VERSION: &str = "version";

/// Number of frames that must follow the delimiter:
/// signature, header, parent header, metadata, content.
const BODY_FRAMES: usize = 5;

/// A JSON object section of a message.
pub type JsonObject = Map<String, Value>;

/// One protocol message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Message {
    /// Routing identities, emitted before the delimiter.
    pub idents: Vec<Bytes>,
    pub header: JsonObject,
    pub parent_header: JsonObject,
    pub metadata: JsonObject,
    pub content: JsonObject,
    /// Trailing frames after content. Populated by decode only.
    pub blobs: Vec<Bytes>,
    /// `None` when unsigned, `Some(false)` only on a [`Decoded::Rejected`] message.
    pub signature_ok: Option<bool>,
}

/// Why a decode produced no usable message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DecodeAbort {
    #[error("missing {} delimiter frame", String::from_utf8_lossy(DELIMITER))]
    MissingDelimiter,

    #[error("too few frames after delimiter ({found}, need {need})", need = BODY_FRAMES)]
    TooFewFrames { found: usize },

    #[error("signature mismatch")]
    SignatureMismatch,
}

/// Outcome of [`Message::decode`].
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Message(Message),
    /// Signature mismatch. Carries the idents with `signature_ok == Some(false)`
    /// and empty sections; the body is never parsed.
    Rejected(Message),
    Aborted(DecodeAbort),
}

impl Decoded {
    /// The verified message, or `None` for a rejected or aborted decode.
    pub fn into_message(self) -> Option<Message> {
        match self {
            Decoded::Message(message) => Some(message),
            Decoded::Rejected(_) | Decoded::Aborted(_) => None,
        }
    }

    pub fn abort_reason(&self) -> Option<DecodeAbort> {
        match self {
            Decoded::Message(_) => None,
            Decoded::Rejected(_) => Some(DecodeAbort::SignatureMismatch),
            Decoded::Aborted(reason) => Some(*reason),
        }
    }

    pub fn is_aborted(&self) -> bool {
        !matches!(self, Decoded::Message(_))
    }
}

impl Message {
    /// Empty message: all sections `{}`, no idents, no blobs.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh outbound message with a newly generated id.
    pub fn request(session: &str, username: &str, msg_type: &str, content: JsonObject) -> Self {
        let mut header = JsonObject::new();
        header.insert(MSG_ID.into(), Value::String(new_msg_id()));
        header.insert(USERNAME.into(), Value::String(username.to_string()));
        header.insert(SESSION.into(), Value::String(session.to_string()));
        header.insert(MSG_TYPE.into(), Value::String(msg_type.to_string()));
        header.insert(
            VERSION.into(),
            Value::String(DEFAULT_PROTOCOL_VERSION.to_string()),
        );

        Self {
            header,
            content,
            ..Self::default()
        }
    }

    pub fn with_idents(mut self, idents: impl IntoIterator<Item = Bytes>) -> Self {
        self.idents = idents.into_iter().collect();
        self
    }

    pub fn msg_id(&self) -> Option<&str> {
        self.header_str(MSG_ID)
    }

    pub fn msg_type(&self) -> Option<&str> {
        self.header_str(MSG_TYPE)
    }

    pub fn session(&self) -> Option<&str> {
        self.header_str(SESSION)
    }

    pub fn username(&self) -> Option<&str> {
        self.header_str(USERNAME)
    }

    pub fn version(&self) -> Option<&str> {
        self.header_str(VERSION)
    }

    fn header_str(&self, field: &str) -> Option<&str> {
        self.header.get(field).and_then(Value::as_str)
    }

    /// Serialize into wire frames.
    ///
    /// Emits `idents`, the delimiter, the signature (empty when unsigned)
    /// and the four JSON sections. Blobs are never emitted.
    pub fn encode(&self, config: &WireConfig) -> Result<Vec<Bytes>> {
        let header = to_json(Section::Header, &self.header)?;
        let parent_header = to_json(Section::ParentHeader, &self.parent_header)?;
        let metadata = to_json(Section::Metadata, &self.metadata)?;
        let content = to_json(Section::Content, &self.content)?;

        let signature = match config.signer() {
            Some(signer) => signer.sign(&[
                header.as_slice(),
                parent_header.as_slice(),
                metadata.as_slice(),
                content.as_slice(),
            ])?,
            None => String::new(),
        };

        let mut frames = Vec::with_capacity(self.idents.len() + 1 + BODY_FRAMES);
        frames.extend(self.idents.iter().cloned());
        frames.push(Bytes::from_static(DELIMITER));
        frames.push(Bytes::from(signature));
        frames.push(Bytes::from(header));
        frames.push(Bytes::from(parent_header));
        frames.push(Bytes::from(metadata));
        frames.push(Bytes::from(content));

        trace!(frames = frames.len(), signed = config.is_signing(), "encoded message");
        Ok(frames)
    }

    /// Parse wire frames.
    ///
    /// Missing delimiter and short frame lists yield [`Decoded::Aborted`];
    /// a signature mismatch yields [`Decoded::Rejected`]. Both are logged. A body section that is not a
    /// JSON object is a protocol fault and returns `Err`.
    pub fn decode(frames: &[Bytes], config: &WireConfig) -> Result<Decoded> {
        let Some(delim) = frames.iter().position(|f| f.as_ref() == DELIMITER) else {
            return Ok(abort(config, DecodeAbort::MissingDelimiter, frames.len()));
        };

        let body = &frames[delim + 1..];
        if body.len() < BODY_FRAMES {
            return Ok(abort(
                config,
                DecodeAbort::TooFewFrames { found: body.len() },
                frames.len(),
            ));
        }

        let signature = &body[0];
        let sections = &body[1..BODY_FRAMES];

        let mut signature_ok = None;
        if let Some(signer) = config.signer() {
            let parts: Vec<&[u8]> = sections.iter().map(Bytes::as_ref).collect();
            let ok = signer.verify(&parts, signature)?;
            signature_ok = Some(ok);
            if !ok {
                log_abort(config, DecodeAbort::SignatureMismatch, frames.len());
                return Ok(Decoded::Rejected(Message {
                    idents: frames[..delim].to_vec(),
                    signature_ok,
                    ..Message::default()
                }));
            }
        }

        let message = Message {
            idents: frames[..delim].to_vec(),
            header: from_json(Section::Header, &sections[0])?,
            parent_header: from_json(Section::ParentHeader, &sections[1])?,
            metadata: from_json(Section::Metadata, &sections[2])?,
            content: from_json(Section::Content, &sections[3])?,
            blobs: body[BODY_FRAMES..].to_vec(),
            signature_ok,
        };

        trace!(
            idents = message.idents.len(),
            blobs = message.blobs.len(),
            msg_type = message.msg_type().unwrap_or(""),
            "decoded message"
        );
        Ok(Decoded::Message(message))
    }
}

fn abort(config: &WireConfig, reason: DecodeAbort, frames: usize) -> Decoded {
    log_abort(config, reason, frames);
    Decoded::Aborted(reason)
}

fn log_abort(config: &WireConfig, reason: DecodeAbort, frames: usize) {
    if config.verbose {
        warn!(%reason, frames, "dropping undecodable message");
    } else {
        debug!(%reason, frames, "dropping undecodable message");
    }
}

fn to_json(section: Section, value: &JsonObject) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|source| WireError::Json { section, source })
}

fn from_json(section: Section, frame: &[u8]) -> Result<JsonObject> {
    serde_json::from_slice(frame).map_err(|source| WireError::Json { section, source })
}

pub(crate) fn new_msg_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
