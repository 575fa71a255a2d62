//! Line-based codec for the IRC transport.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use super::{Message, ProtocolError};

/// Maximum IRC line length in bytes, including CRLF.
pub const MAX_LINE_LEN: usize = 512;

/// Newline-terminated line codec.
///
/// Decodes to trimmed strings, lossily replacing invalid UTF-8 — a bot
/// lurking in public channels cannot treat mojibake as fatal. Encodes
/// [`Message`]s with a trailing CRLF.
pub struct LineCodec {
    /// Index of next byte to check for newline
    next_index: usize,
    max_len: usize,
}

impl LineCodec {
    pub fn new() -> Self {
        Self {
            next_index: 0,
            max_len: MAX_LINE_LEN,
        }
    }

    #[cfg(test)]
    fn with_max_len(max_len: usize) -> Self {
        Self {
            next_index: 0,
            max_len,
        }
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<String>, ProtocolError> {
        if let Some(offset) = src[self.next_index..].iter().position(|b| *b == b'\n') {
            let line = src.split_to(self.next_index + offset + 1);
            self.next_index = 0;

            if line.len() > self.max_len {
                return Err(ProtocolError::LineTooLong {
                    actual: line.len(),
                    limit: self.max_len,
                });
            }

            let text = String::from_utf8_lossy(&line)
                .trim_end_matches(['\r', '\n'])
                .to_string();
            Ok(Some(text))
        } else {
            // No complete line yet - remember where we stopped
            self.next_index = src.len();

            if src.len() > self.max_len {
                return Err(ProtocolError::LineTooLong {
                    actual: src.len(),
                    limit: self.max_len,
                });
            }

            Ok(None)
        }
    }
}

impl Encoder<Message> for LineCodec {
    type Error = ProtocolError;

    fn encode(&mut self, msg: Message, dst: &mut BytesMut) -> Result<(), ProtocolError> {
        dst.extend_from_slice(msg.to_string().as_bytes());
        dst.extend_from_slice(b"\r\n");
        Ok(())
    }
}
