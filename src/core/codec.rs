//! Transcoding between operator text, hex text and wire bytes.
//!
//! Everything here is a pure function. Encoding for send is strict about
//! hex input but lossy for text; decoding for display never fails.

use crate::domain::error::EncodingError;
use encoding_rs::{EncoderResult, Encoding};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Byte substituted for characters the target codec cannot represent
pub const ENCODE_REPLACEMENT: u8 = b'?';

/// Line ending appended to text sends when auto-newline is on
pub const LINE_ENDING: &[u8] = b"\r\n";

/// Annotation appended to the hex fallback rendering
pub const DECODE_ERROR_MARKER: &str = "decode error";

/// Codec used to read third-party import files
pub const LEGACY_CODEC: Codec = Codec::Gbk;

/// Supported text codecs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Codec {
    Utf8,
    Gbk,
    Gb2312,
    Big5,
    Latin1,
    Ascii,
}

/// How the operator's payload is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadKind {
    Text,
    Hex,
}

/// Encoding mode for a single send
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendMode {
    Hex,
    Text(String),
}

impl Codec {
    /// All codecs in selector order
    pub const ALL: [Codec; 6] = [
        Codec::Utf8,
        Codec::Gbk,
        Codec::Gb2312,
        Codec::Big5,
        Codec::Latin1,
        Codec::Ascii,
    ];

    /// Canonical display name
    pub fn name(&self) -> &'static str {
        match self {
            Codec::Utf8 => "UTF-8",
            Codec::Gbk => "GBK",
            Codec::Gb2312 => "GB2312",
            Codec::Big5 => "BIG5",
            Codec::Latin1 => "ISO-8859-1",
            Codec::Ascii => "ASCII",
        }
    }

    /// Canonical names of every supported codec
    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(Codec::name).collect()
    }

    /// Resolve a codec from a case-insensitive name or alias
    pub fn from_name(name: &str) -> Result<Self, EncodingError> {
        let normalized = name.trim().to_ascii_lowercase().replace('_', "-");
        let codec = match normalized.as_str() {
            "utf-8" | "utf8" => Codec::Utf8,
            "gbk" | "cp936" | "windows-936" => Codec::Gbk,
            "gb2312" | "gb-2312" => Codec::Gb2312,
            "big5" | "big-5" => Codec::Big5,
            "iso-8859-1" | "iso8859-1" | "latin1" | "latin-1" => Codec::Latin1,
            "ascii" | "us-ascii" => Codec::Ascii,
            _ => return Err(EncodingError::UnknownCodec(name.to_string())),
        };
        Ok(codec)
    }

    /// Encode text, substituting `?` for unmappable characters
    pub fn encode(&self, text: &str) -> Vec<u8> {
        match self {
            Codec::Utf8 => text.as_bytes().to_vec(),
            Codec::Latin1 => narrow_chars(text, 0xFF),
            Codec::Ascii => narrow_chars(text, 0x7F),
            Codec::Gb2312 => encode_gb2312(text),
            Codec::Gbk | Codec::Big5 => encode_with_substitution(self.multibyte_encoding(), text),
        }
    }

    /// Decode bytes, substituting U+FFFD for malformed sequences.
    ///
    /// The flag reports whether any substitution happened.
    pub fn decode(&self, bytes: &[u8]) -> (String, bool) {
        match self {
            Codec::Latin1 => (bytes.iter().map(|&b| b as char).collect(), false),
            Codec::Ascii => {
                let mut had_errors = false;
                let text: String = bytes
                    .iter()
                    .map(|&b| {
                        if b.is_ascii() {
                            b as char
                        } else {
                            had_errors = true;
                            char::REPLACEMENT_CHARACTER
                        }
                    })
                    .collect();
                (text, had_errors)
            }
            Codec::Utf8 => {
                let (text, had_errors) = encoding_rs::UTF_8.decode_without_bom_handling(bytes);
                (text.into_owned(), had_errors)
            }
            Codec::Gb2312 => decode_gb2312(bytes),
            Codec::Gbk | Codec::Big5 => {
                let (text, had_errors) =
                    self.multibyte_encoding().decode_without_bom_handling(bytes);
                (text.into_owned(), had_errors)
            }
        }
    }

    fn multibyte_encoding(&self) -> &'static Encoding {
        match self {
            Codec::Big5 => encoding_rs::BIG5,
            _ => encoding_rs::GBK,
        }
    }
}

impl FromStr for Codec {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Codec::from_name(s)
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadKind::Text => write!(f, "text"),
            PayloadKind::Hex => write!(f, "hex"),
        }
    }
}

fn narrow_chars(text: &str, max: u32) -> Vec<u8> {
    text.chars()
        .map(|c| {
            let code = c as u32;
            if code <= max {
                code as u8
            } else {
                ENCODE_REPLACEMENT
            }
        })
        .collect()
}

fn encode_with_substitution(encoding: &'static Encoding, text: &str) -> Vec<u8> {
    let mut encoder = encoding.new_encoder();
    let mut out = Vec::with_capacity(text.len() * 2);
    let mut remaining = text;

    loop {
        let needed = encoder
            .max_buffer_length_from_utf8_without_replacement(remaining.len())
            .unwrap_or(remaining.len() * 4 + 16);
        out.reserve(needed);

        let (result, read) =
            encoder.encode_from_utf8_to_vec_without_replacement(remaining, &mut out, true);
        remaining = &remaining[read..];

        match result {
            EncoderResult::InputEmpty => break,
            EncoderResult::OutputFull => continue,
            EncoderResult::Unmappable(_) => out.push(ENCODE_REPLACEMENT),
        }
    }

    out
}

/// Whether a two-byte sequence lies in the EUC-CN (GB2312) code space
fn is_gb2312_pair(lead: u8, trail: u8) -> bool {
    (0xA1..=0xF7).contains(&lead) && (0xA1..=0xFE).contains(&trail)
}

// GB2312 goes through the GBK tables but only keeps its own code space;
// anything GBK adds on top is unmappable.
fn encode_gb2312(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() * 2);
    let mut utf8 = [0u8; 4];
    for c in text.chars() {
        let encoded = encode_with_substitution(encoding_rs::GBK, c.encode_utf8(&mut utf8));
        match encoded.as_slice() {
            [b] if b.is_ascii() => out.push(*b),
            [lead, trail] if is_gb2312_pair(*lead, *trail) => out.extend_from_slice(&encoded),
            _ => out.push(ENCODE_REPLACEMENT),
        }
    }
    out
}

fn decode_gb2312(bytes: &[u8]) -> (String, bool) {
    let mut text = String::with_capacity(bytes.len());
    let mut had_errors = false;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b.is_ascii() {
            text.push(b as char);
            i += 1;
            continue;
        }
        match bytes.get(i + 1) {
            Some(&trail) if is_gb2312_pair(b, trail) => {
                let (pair, bad) = encoding_rs::GBK.decode_without_bom_handling(&bytes[i..i + 2]);
                text.push_str(&pair);
                had_errors |= bad;
                i += 2;
            }
            _ => {
                text.push(char::REPLACEMENT_CHARACTER);
                had_errors = true;
                i += 1;
            }
        }
    }
    (text, had_errors)
}

/// Turn operator input into the bytes to put on the wire
pub fn encode_for_send(text: &str, mode: &SendMode) -> Result<Vec<u8>, EncodingError> {
    match mode {
        SendMode::Hex => decode_hex_string(text),
        SendMode::Text(codec_name) => {
            let codec = Codec::from_name(codec_name)?;
            Ok(codec.encode(text))
        }
    }
}

/// Append CRLF when enabled.
///
/// Hex sends never go through here: hex payloads are exact byte sequences.
pub fn append_line_ending(mut bytes: Vec<u8>, enabled: bool) -> Vec<u8> {
    if enabled {
        bytes.extend_from_slice(LINE_ENDING);
    }
    bytes
}

/// Render received bytes for display; always yields text
pub fn decode_for_display(bytes: &[u8], hex_display: bool, codec_name: &str) -> String {
    if hex_display {
        return encode_as_hex_string(bytes);
    }

    let codec = match Codec::from_name(codec_name) {
        Ok(codec) => codec,
        Err(_) => {
            return format!(
                "{} ({}: unknown codec {})",
                encode_as_hex_string(bytes),
                DECODE_ERROR_MARKER,
                codec_name
            )
        }
    };

    let (text, had_errors) = codec.decode(bytes);
    if had_errors && text.chars().all(|c| c == char::REPLACEMENT_CHARACTER) {
        return format!("{} ({})", encode_as_hex_string(bytes), DECODE_ERROR_MARKER);
    }
    text
}

/// Bytes as space separated uppercase hex pairs, e.g. `41 42 0D`
pub fn encode_as_hex_string(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 3);
    for (i, byte) in bytes.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(&hex::encode_upper([*byte]));
    }
    out
}

/// Parse hex text, ignoring any whitespace between digits
pub fn decode_hex_string(text: &str) -> Result<Vec<u8>, EncodingError> {
    let digits: String = text.chars().filter(|c| !c.is_whitespace()).collect();

    let count = digits.chars().count();
    if count % 2 != 0 {
        return Err(EncodingError::OddHexLength(count));
    }
    if let Some(bad) = digits.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(EncodingError::InvalidHexDigits(format!(
            "'{}' in \"{}\"",
            bad,
            text.trim()
        )));
    }

    hex::decode(&digits).map_err(|e| EncodingError::InvalidHexDigits(e.to_string()))
}
