//! Fixed-width text chunking for the remote rich-text size limit.
//!
//! The document store rejects any single rich-text element longer than a
//! configured number of characters, so long passage bodies are written as an
//! ordered sequence of bounded chunks that concatenate back to the original
//! string. Offsets are counted in Unicode scalar values, matching the unit
//! the remote limit is expressed in.

use serde::{Deserialize, Serialize};

/// One rich-text element in a write-back payload.
///
/// Serializes to the wire shape `{"type":"text","text":{"content":…}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextChunk {
    #[serde(rename = "type")]
    kind: String,
    text: TextContent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextContent {
    pub content: String,
}

impl TextChunk {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            kind: "text".to_string(),
            text: TextContent {
                content: content.into(),
            },
        }
    }

    pub fn content(&self) -> &str {
        &self.text.content
    }
}

/// Splits `s` into chunks of at most `max_chars` characters each.
///
/// Pure and stateless: chunk boundaries fall at fixed offsets, the final
/// chunk may be shorter, and concatenating the chunks in order reproduces
/// `s` exactly. An empty string yields an empty vec.
pub fn chunk_text(s: &str, max_chars: usize) -> Vec<TextChunk> {
    if s.is_empty() {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut buf = String::new();
    let mut len = 0usize;
    for ch in s.chars() {
        buf.push(ch);
        len += 1;
        if len == max_chars {
            chunks.push(TextChunk::new(std::mem::take(&mut buf)));
            len = 0;
        }
    }
    if !buf.is_empty() {
        chunks.push(TextChunk::new(buf));
    }
    chunks
}
