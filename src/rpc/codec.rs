//! Line framer for the skill RPC wire format.
//!
//! Every message on the wire is one UTF-8 text line terminated by `\n`,
//! carrying a single JSON value. Serialization is compact, so the JSON text
//! itself never contains literal newlines; any that do appear (a peer that
//! pretty-prints, say) are escaped to the two-character sequence `\` `n`
//! before the terminator is appended, keeping line-splitting safe.
//!
//! Line framing is delegated to [`tokio_util::codec::LinesCodec`] with a
//! fixed maximum line length, used through
//! [`tokio_util::codec::FramedRead`] on the inbound side.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder, LinesCodec, LinesCodecError};

use crate::{Result, SkillError};

/// Maximum line length accepted by the codec: 1 MiB.
///
/// Inbound lines exceeding this limit fail with [`SkillError::Framing`]
/// instead of allocating unbounded memory for a single message.
pub const MAX_LINE_BYTES: usize = 1_048_576;

/// Newline-delimited line codec for both RPC directions.
///
/// Delegates framing to [`LinesCodec`] with the fixed [`MAX_LINE_BYTES`]
/// limit. Each `\n`-terminated UTF-8 string is one complete RPC line; JSON
/// interpretation happens separately in [`decode_line`] / [`encode_line`].
#[derive(Debug)]
pub struct LineCodec(LinesCodec);

impl LineCodec {
    /// Create a codec with the default [`MAX_LINE_BYTES`] limit.
    #[must_use]
    pub fn new() -> Self {
        Self(LinesCodec::new_with_max_length(MAX_LINE_BYTES))
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = SkillError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        self.0.decode(src).map_err(map_codec_error)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        self.0.decode_eof(src).map_err(map_codec_error)
    }
}

impl Encoder<String> for LineCodec {
    type Error = SkillError;

    fn encode(&mut self, item: String, dst: &mut BytesMut) -> Result<()> {
        self.0.encode(item, dst).map_err(map_codec_error)
    }
}

/// Serialize a JSON value to one wire line, without the `\n` terminator.
///
/// Compact serialization never emits literal newlines, so the escaping pass
/// is normally a no-op; it guards the framing invariant all the same.
#[must_use]
pub fn encode_line(value: &serde_json::Value) -> String {
    value.to_string().replace('\n', "\\n").replace('\r', "\\r")
}

/// Parse one received wire line into a JSON value.
///
/// The line is parsed as-is first; when that fails, a second attempt is made
/// after unescaping `\` `n` sequences back to literal newlines. The retry
/// recovers peers that escaped real newlines out of multi-line JSON, while
/// the parse-first order keeps `\n` escapes inside JSON strings intact.
///
/// # Errors
///
/// Returns [`SkillError::Framing`] when the line is not valid JSON under
/// either reading. The caller must treat this as connection-fatal.
pub fn decode_line(line: &str) -> Result<serde_json::Value> {
    match serde_json::from_str(line) {
        Ok(value) => Ok(value),
        Err(first) => {
            let unescaped = line.replace("\\n", "\n").replace("\\r", "\r");
            serde_json::from_str(&unescaped)
                .map_err(|_| SkillError::Framing(format!("malformed json line: {first}")))
        }
    }
}

// ── Private helper ────────────────────────────────────────────────────────────

/// Map a [`LinesCodecError`] to a [`SkillError`].
fn map_codec_error(e: LinesCodecError) -> SkillError {
    match e {
        LinesCodecError::MaxLineLengthExceeded => {
            SkillError::Framing(format!("line too long: exceeded {MAX_LINE_BYTES} bytes"))
        }
        LinesCodecError::Io(io_err) => SkillError::Transport(io_err.to_string()),
    }
}
