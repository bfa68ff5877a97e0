use serde_json::Value;

use crate::message::{new_msg_id, JsonObject, Message, MSG_ID, MSG_TYPE, SESSION, USERNAME, VERSION};

/// Endpoint that can send a [`Message`].
pub trait MessageSender {
    type Error;

    fn send_message(&self, message: Message) -> Result<(), Self::Error>;
}

impl Message {
    /// Build the reply to this message without sending it.
    ///
    /// The reply keeps this message's idents so the transport routes it back
    /// to the requester, and carries this header as its parent header.
    /// `version` falls back to this message's header version when `None`.
    pub fn reply(
        &self,
        msg_type: &str,
        content: Option<JsonObject>,
        metadata: Option<JsonObject>,
        version: Option<&str>,
    ) -> Message {
        let mut header = JsonObject::new();
        header.insert(MSG_ID.into(), Value::String(new_msg_id()));
        for field in [USERNAME, SESSION] {
            if let Some(value) = self.header.get(field) {
                header.insert(field.into(), value.clone());
            }
        }
        header.insert(MSG_TYPE.into(), Value::String(msg_type.to_string()));

        let version = version
            .map(|v| Value::String(v.to_string()))
            .or_else(|| self.header.get(VERSION).cloned());
        if let Some(version) = version {
            header.insert(VERSION.into(), version);
        }

        Message {
            idents: self.idents.clone(),
            header,
            parent_header: self.header.clone(),
            metadata: metadata.unwrap_or_default(),
            content: content.unwrap_or_default(),
            ..Message::default()
        }
    }

    /// Build the reply to this message and send it through `socket`.
    pub fn respond<S>(
        &self,
        socket: &S,
        msg_type: &str,
        content: Option<JsonObject>,
        metadata: Option<JsonObject>,
        version: Option<&str>,
    ) -> Result<&Self, S::Error>
    where
        S: MessageSender + ?Sized,
    {
        socket.send_message(self.reply(msg_type, content, metadata, version))?;
        Ok(self)
    }
}
