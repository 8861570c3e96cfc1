//! Content-type sniffing
//!
//! Infers a MIME type from the leading bytes of a body when the handler did
//! not declare one. Follows the WHATWG MIME Sniffing algorithm as implemented
//! by mainstream HTTP servers: at most [`SNIFF_LEN`] bytes are considered and
//! the result is always a valid `Content-Type` value.
//!
//! Sniffing must run on plaintext. Compressed bytes look like
//! `application/octet-stream` to every signature below.

/// Maximum number of leading bytes inspected
pub const SNIFF_LEN: usize = 512;

/// Returned when nothing more specific matches binary data
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Returned for data without binary control bytes
pub const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

const TEXT_HTML: &str = "text/html; charset=utf-8";

enum Signature {
    /// HTML tag opener, matched case-insensitively after leading whitespace
    /// and followed by a space or `>`
    Html(&'static [u8]),
    Masked {
        mask: &'static [u8],
        pattern: &'static [u8],
        skip_ws: bool,
        mime: &'static str,
    },
    Exact(&'static [u8], &'static str),
    Mp4,
    Text,
}

const fn masked(mask: &'static [u8], pattern: &'static [u8], mime: &'static str) -> Signature {
    Signature::Masked {
        mask,
        pattern,
        skip_ws: false,
        mime,
    }
}

const RIFF_MASK: &[u8] = b"\xFF\xFF\xFF\xFF\x00\x00\x00\x00\xFF\xFF\xFF\xFF";

// Order matters: the first match wins.
static SIGNATURES: &[Signature] = &[
    Signature::Html(b"<!DOCTYPE HTML"),
    Signature::Html(b"<HTML"),
    Signature::Html(b"<HEAD"),
    Signature::Html(b"<SCRIPT"),
    Signature::Html(b"<IFRAME"),
    Signature::Html(b"<H1"),
    Signature::Html(b"<DIV"),
    Signature::Html(b"<FONT"),
    Signature::Html(b"<TABLE"),
    Signature::Html(b"<A"),
    Signature::Html(b"<STYLE"),
    Signature::Html(b"<TITLE"),
    Signature::Html(b"<B"),
    Signature::Html(b"<BODY"),
    Signature::Html(b"<BR"),
    Signature::Html(b"<P"),
    Signature::Html(b"<!--"),
    Signature::Masked {
        mask: b"\xFF\xFF\xFF\xFF\xFF",
        pattern: b"<?xml",
        skip_ws: true,
        mime: "text/xml; charset=utf-8",
    },
    Signature::Exact(b"%PDF-", "application/pdf"),
    Signature::Exact(b"%!PS-Adobe-", "application/postscript"),
    // Byte order marks
    masked(b"\xFF\xFF\x00\x00", b"\xFE\xFF\x00\x00", "text/plain; charset=utf-16be"),
    masked(b"\xFF\xFF\x00\x00", b"\xFF\xFE\x00\x00", "text/plain; charset=utf-16le"),
    masked(b"\xFF\xFF\xFF\x00", b"\xEF\xBB\xBF\x00", TEXT_PLAIN),
    // Images
    Signature::Exact(b"\x00\x00\x01\x00", "image/x-icon"),
    Signature::Exact(b"\x00\x00\x02\x00", "image/x-icon"),
    Signature::Exact(b"BM", "image/bmp"),
    Signature::Exact(b"GIF87a", "image/gif"),
    Signature::Exact(b"GIF89a", "image/gif"),
    masked(
        b"\xFF\xFF\xFF\xFF\x00\x00\x00\x00\xFF\xFF\xFF\xFF\xFF\xFF",
        b"RIFF\x00\x00\x00\x00WEBPVP",
        "image/webp",
    ),
    Signature::Exact(b"\x89PNG\x0D\x0A\x1A\x0A", "image/png"),
    Signature::Exact(b"\xFF\xD8\xFF", "image/jpeg"),
    // Audio and video
    masked(
        b"\xFF\xFF\xFF\xFF\x00\x00\x00\x00\xFF\xFF\xFF\xFF",
        b"FORM\x00\x00\x00\x00AIFF",
        "audio/aiff",
    ),
    masked(b"\xFF\xFF\xFF", b"ID3", "audio/mpeg"),
    masked(b"\xFF\xFF\xFF\xFF\xFF", b"OggS\x00", "application/ogg"),
    masked(
        b"\xFF\xFF\xFF\xFF\xFF\xFF\xFF\xFF",
        b"MThd\x00\x00\x00\x06",
        "audio/midi",
    ),
    masked(RIFF_MASK, b"RIFF\x00\x00\x00\x00AVI ", "video/avi"),
    masked(RIFF_MASK, b"RIFF\x00\x00\x00\x00WAVE", "audio/wave"),
    Signature::Mp4,
    Signature::Exact(b"\x1A\x45\xDF\xA3", "video/webm"),
    // Fonts
    Signature::Exact(b"\x00\x01\x00\x00", "font/ttf"),
    Signature::Exact(b"OTTO", "font/otf"),
    Signature::Exact(b"ttcf", "font/collection"),
    Signature::Exact(b"wOFF", "font/woff"),
    Signature::Exact(b"wOF2", "font/woff2"),
    // Archives
    Signature::Exact(b"\x1F\x8B\x08", "application/x-gzip"),
    Signature::Exact(b"PK\x03\x04", "application/zip"),
    Signature::Exact(b"Rar!\x1A\x07\x00", "application/x-rar-compressed"),
    Signature::Exact(b"Rar!\x1A\x07\x01\x00", "application/x-rar-compressed"),
    Signature::Exact(b"\x00\x61\x73\x6D", "application/wasm"),
    Signature::Text,
];

/// Infer the content type of `data` from its first [`SNIFF_LEN`] bytes.
///
/// Always returns a usable value: [`TEXT_PLAIN`] for empty input and
/// [`OCTET_STREAM`] when no signature matches binary data.
pub fn detect_content_type(data: &[u8]) -> &'static str {
    let data = &data[..data.len().min(SNIFF_LEN)];
    let first_non_ws = data
        .iter()
        .position(|b| !is_whitespace(*b))
        .unwrap_or(data.len());

    SIGNATURES
        .iter()
        .find_map(|sig| sig.matches(data, first_non_ws))
        .unwrap_or(OCTET_STREAM)
}

impl Signature {
    fn matches(&self, data: &[u8], first_non_ws: usize) -> Option<&'static str> {
        match self {
            Signature::Html(tag) => {
                let data = &data[first_non_ws..];
                if data.len() < tag.len() + 1 {
                    return None;
                }
                let same = tag.iter().zip(data).all(|(&t, &d)| {
                    let d = if t.is_ascii_uppercase() { d & 0xDF } else { d };
                    t == d
                });
                (same && is_tag_terminator(data[tag.len()])).then_some(TEXT_HTML)
            }
            Signature::Masked {
                mask,
                pattern,
                skip_ws,
                mime,
            } => {
                let data = if *skip_ws { &data[first_non_ws..] } else { data };
                if data.len() < pattern.len() {
                    return None;
                }
                pattern
                    .iter()
                    .zip(mask.iter())
                    .zip(data)
                    .all(|((&p, &m), &d)| d & m == p)
                    .then_some(*mime)
            }
            Signature::Exact(sig, mime) => data.starts_with(sig).then_some(*mime),
            Signature::Mp4 => is_mp4(data).then_some("video/mp4"),
            Signature::Text => {
                let binary = data[first_non_ws..].iter().any(|b| is_binary(*b));
                (!binary).then_some(TEXT_PLAIN)
            }
        }
    }
}

/// ISO base media file with an `ftyp` box naming an mp4 brand
fn is_mp4(data: &[u8]) -> bool {
    if data.len() < 12 {
        return false;
    }
    let box_size = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as usize;
    if data.len() < box_size || box_size % 4 != 0 || &data[4..8] != b"ftyp" {
        return false;
    }
    (8..box_size)
        .step_by(4)
        // bytes 12..16 hold the minor version, not a brand
        .filter(|&st| st != 12)
        .any(|st| &data[st..st + 3] == b"mp4")
}

fn is_whitespace(b: u8) -> bool {
    matches!(b, b'\t' | b'\n' | b'\x0C' | b'\r' | b' ')
}

fn is_tag_terminator(b: u8) -> bool {
    b == b' ' || b == b'>'
}

fn is_binary(b: u8) -> bool {
    matches!(b, 0x00..=0x08 | 0x0B | 0x0E..=0x1A | 0x1C..=0x1F)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text() {
        assert_eq!(detect_content_type(b"test"), TEXT_PLAIN);
        assert_eq!(detect_content_type(b"Hello, world!\n"), TEXT_PLAIN);
        assert_eq!(detect_content_type(b""), TEXT_PLAIN);
    }

    #[test]
    fn test_html() {
        assert_eq!(detect_content_type(b"<html><body>hi</body></html>"), TEXT_HTML);
        assert_eq!(detect_content_type(b"  \n<!DOCTYPE html>\n<html>"), TEXT_HTML);
        assert_eq!(detect_content_type(b"<p>paragraph</p>"), TEXT_HTML);
        assert_eq!(detect_content_type(b"<!-- comment -->"), TEXT_HTML);
        // Tag must be terminated
        assert_eq!(detect_content_type(b"<htmlx"), TEXT_PLAIN);
    }

    #[test]
    fn test_xml() {
        assert_eq!(
            detect_content_type(b"\n<?xml version=\"1.0\"?><a/>"),
            "text/xml; charset=utf-8"
        );
    }

    #[test]
    fn test_binary_signatures() {
        assert_eq!(detect_content_type(b"%PDF-1.7"), "application/pdf");
        assert_eq!(detect_content_type(b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR"), "image/png");
        assert_eq!(detect_content_type(b"GIF89a\x01\x00"), "image/gif");
        assert_eq!(detect_content_type(b"\xFF\xD8\xFF\xE0"), "image/jpeg");
        assert_eq!(detect_content_type(b"RIFF\x10\x00\x00\x00WEBPVP8 "), "image/webp");
        assert_eq!(detect_content_type(b"RIFF\x10\x00\x00\x00WAVEfmt "), "audio/wave");
        assert_eq!(detect_content_type(b"wOF2\x00\x01"), "font/woff2");
        assert_eq!(detect_content_type(b"\x00asm\x01\x00\x00\x00"), "application/wasm");
    }

    #[test]
    fn test_gzip_output_is_not_text() {
        assert_eq!(
            detect_content_type(b"\x1F\x8B\x08\x00\x00\x00\x00\x00\x00\xFF"),
            "application/x-gzip"
        );
    }

    #[test]
    fn test_mp4() {
        let mut data = Vec::new();
        data.extend_from_slice(&[0, 0, 0, 0x18]);
        data.extend_from_slice(b"ftypmp42");
        data.extend_from_slice(&[0, 0, 0, 0]);
        data.extend_from_slice(b"mp42isom");
        assert_eq!(detect_content_type(&data), "video/mp4");
    }

    #[test]
    fn test_unknown_binary() {
        assert_eq!(detect_content_type(b"\x01\x02\x03\x04"), OCTET_STREAM);
    }

    #[test]
    fn test_only_first_bytes_considered() {
        let mut data = vec![b'a'; SNIFF_LEN];
        data.push(0x00);
        assert_eq!(detect_content_type(&data), TEXT_PLAIN);
    }
}
