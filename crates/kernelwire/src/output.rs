use std::io::IsTerminal;

use bytes::Bytes;
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use kernelwire_message::{JsonObject, Message, Section, DELIMITER};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// JSON form of one frame: text when it is UTF-8, hex otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FrameRepr {
    Text(String),
    Hex { hex: String },
}

impl FrameRepr {
    pub fn from_frame(frame: &[u8]) -> Self {
        match std::str::from_utf8(frame) {
            Ok(text) => FrameRepr::Text(text.to_string()),
            Err(_) => FrameRepr::Hex {
                hex: hex::encode(frame),
            },
        }
    }

    pub fn into_frame(self) -> Result<Bytes, String> {
        match self {
            FrameRepr::Text(text) => Ok(Bytes::from(text)),
            FrameRepr::Hex { hex: text } => hex::decode(&text)
                .map(Bytes::from)
                .map_err(|err| format!("invalid hex frame '{text}': {err}")),
        }
    }
}

#[derive(Serialize)]
struct MessageOutput<'a> {
    idents: Vec<FrameRepr>,
    header: &'a JsonObject,
    parent_header: &'a JsonObject,
    metadata: &'a JsonObject,
    content: &'a JsonObject,
    blobs: Vec<FrameRepr>,
    signature_ok: Option<bool>,
}

pub fn print_frames(frames: &[Bytes], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out: Vec<FrameRepr> = frames.iter().map(|f| FrameRepr::from_frame(f)).collect();
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "[]".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["#", "ROLE", "SIZE", "FRAME"]);
            for (index, (role, frame)) in frame_roles(frames).into_iter().enumerate() {
                table.add_row(vec![
                    index.to_string(),
                    role.to_string(),
                    frame.len().to_string(),
                    frame_preview(frame),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for (role, frame) in frame_roles(frames) {
                println!("{role:>13}: {}", frame_preview(frame));
            }
        }
    }
}

pub fn print_message(message: &Message, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = MessageOutput {
                idents: message.idents.iter().map(|f| FrameRepr::from_frame(f)).collect(),
                header: &message.header,
                parent_header: &message.parent_header,
                metadata: &message.metadata,
                content: &message.content,
                blobs: message.blobs.iter().map(|f| FrameRepr::from_frame(f)).collect(),
                signature_ok: message.signature_ok,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FIELD", "VALUE"]);
            for (field, value) in message_rows(message) {
                table.add_row(vec![field, value]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for (field, value) in message_rows(message) {
                println!("{field:>13}: {value}");
            }
        }
    }
}

fn message_rows(message: &Message) -> Vec<(String, String)> {
    let idents: Vec<String> = message.idents.iter().map(|f| frame_preview(f)).collect();
    let signature = match message.signature_ok {
        Some(true) => "verified",
        Some(false) => "mismatch",
        None => "unchecked",
    };
    vec![
        ("idents".into(), idents.join(", ")),
        ("signature".into(), signature.into()),
        (Section::Header.to_string(), object_text(&message.header)),
        (
            Section::ParentHeader.to_string(),
            object_text(&message.parent_header),
        ),
        (Section::Metadata.to_string(), object_text(&message.metadata)),
        (Section::Content.to_string(), object_text(&message.content)),
        ("blobs".into(), message.blobs.len().to_string()),
    ]
}

/// Label each frame with its position in the wire layout.
fn frame_roles(frames: &[Bytes]) -> Vec<(String, &Bytes)> {
    let delim = frames.iter().position(|f| f.as_ref() == DELIMITER);
    frames
        .iter()
        .enumerate()
        .map(|(index, frame)| {
            let role = match delim {
                None => "frame".to_string(),
                Some(d) if index < d => "ident".to_string(),
                Some(d) if index == d => "delimiter".to_string(),
                Some(d) if index == d + 1 => "signature".to_string(),
                Some(d) if index - d - 2 < Section::ALL.len() => {
                    Section::ALL[index - d - 2].to_string()
                }
                Some(_) => "blob".to_string(),
            };
            (role, frame)
        })
        .collect()
}

fn object_text(object: &JsonObject) -> String {
    serde_json::to_string(object).unwrap_or_else(|_| "{}".to_string())
}

fn frame_preview(frame: &[u8]) -> String {
    match std::str::from_utf8(frame) {
        Ok(text) => text.to_string(),
        Err(_) => format!("<binary {} bytes>", frame.len()),
    }
}
