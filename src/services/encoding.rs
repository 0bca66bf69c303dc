use std::borrow::Cow;

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8};
use tracing::debug;

/// Guesses below this are reported as low-confidence.
pub const LOW_CONFIDENCE: f32 = 0.5;

/// Confidence of any decode that hit malformed bytes.
const DECODE_ERROR_CONFIDENCE: f32 = 0.35;

/// Text decoded from a file, plus what is needed to write it back the same way.
#[derive(Debug, Clone)]
pub struct DecodedText {
    pub text: String,
    pub encoding: &'static Encoding,
    pub bom: bool,
    pub confidence: f32,
}

impl DecodedText {
    pub fn encoding_name(&self) -> &'static str {
        self.encoding.name()
    }

    pub fn is_low_confidence(&self) -> bool {
        self.confidence < LOW_CONFIDENCE
    }
}

pub fn decode(bytes: &[u8]) -> DecodedText {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        let (text, had_errors) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        return DecodedText {
            text: text.into_owned(),
            encoding,
            bom: true,
            confidence: if had_errors { DECODE_ERROR_CONFIDENCE } else { 0.99 },
        };
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);

    let encoding = detector.guess(None, true);
    let confidence = estimate_confidence(bytes, encoding);
    let (text, _) = encoding.decode_without_bom_handling(bytes);

    DecodedText {
        text: text.into_owned(),
        encoding,
        bom: false,
        confidence,
    }
}

/// Encodes `text` with the encoding it was read in.
///
/// Text the legacy encoding can't represent is written as UTF-8 with a BOM
/// instead, so nothing is lost.
pub fn encode(text: &str, encoding: &'static Encoding, bom: bool) -> Vec<u8> {
    if encoding == UTF_16LE || encoding == UTF_16BE {
        return encode_utf16(text, encoding == UTF_16LE, bom);
    }

    if encoding == UTF_8 {
        return with_utf8_bom(Cow::Borrowed(text.as_bytes()), bom);
    }

    let (bytes, _, had_errors) = encoding.encode(text);
    if had_errors {
        debug!(
            encoding = encoding.name(),
            "text not representable, writing utf-8"
        );
        return with_utf8_bom(Cow::Borrowed(text.as_bytes()), true);
    }
    bytes.into_owned()
}

fn with_utf8_bom(body: Cow<'_, [u8]>, bom: bool) -> Vec<u8> {
    let mut out = Vec::with_capacity(body.len() + 3);
    if bom {
        out.extend_from_slice(&[0xEF, 0xBB, 0xBF]);
    }
    out.extend_from_slice(&body);
    out
}

fn encode_utf16(text: &str, little_endian: bool, bom: bool) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() * 2 + 2);
    let units = bom.then_some(0xFEFFu16).into_iter().chain(text.encode_utf16());
    for unit in units {
        let bytes = if little_endian {
            unit.to_le_bytes()
        } else {
            unit.to_be_bytes()
        };
        out.extend_from_slice(&bytes);
    }
    out
}

/// Length heuristic: longer clean decodes score higher, malformed bytes score
/// below [`LOW_CONFIDENCE`].
fn estimate_confidence(bytes: &[u8], encoding: &'static Encoding) -> f32 {
    let (text, _, had_errors) = encoding.decode(bytes);

    if had_errors {
        return DECODE_ERROR_CONFIDENCE;
    }

    let len = text.len();
    if len < 64 {
        0.55
    } else if len < 512 {
        0.70
    } else if len < 4096 {
        0.82
    } else {
        0.90
    }
}
