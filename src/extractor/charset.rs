use encoding_rs::Encoding;
use regex::Regex;
use std::sync::LazyLock;

static CHARSET_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)charset\s*=\s*["']?([^"'\s;]+)"#).unwrap());

static META_CHARSET_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<meta\s+[^>]*?charset\s*=\s*["']?([^"'\s/>]+)"#).unwrap());

static META_HTTP_EQUIV_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta\s+[^>]*?http-equiv\s*=\s*["']?content-type["']?[^>]*?content\s*=\s*["']?[^"'>]*?charset\s*=\s*([^"'\s;/>]+)"#).unwrap()
});

const SNIFF_LEN: usize = 4096;

/// Text of a response body and how it was obtained.
#[derive(Debug)]
pub struct DecodedBody {
    pub text: String,
    pub encoding: &'static Encoding,
    /// Some byte sequences were invalid and became U+FFFD.
    pub lossy: bool,
}

/// Decode a raw response body to text.
///
/// The charset comes from the `Content-Type` header, then from a `<meta>`
/// declaration near the top of the document, then from statistical
/// detection. Decoding never fails: malformed sequences are replaced with
/// U+FFFD, which tokenization treats as a separator.
pub fn decode_body(content_type: &str, body: &[u8]) -> DecodedBody {
    let encoding = detect_encoding(content_type, body);
    let (decoded, encoding, lossy) = encoding.decode(body);

    DecodedBody {
        text: decoded.into_owned(),
        encoding,
        lossy,
    }
}

fn encoding_from(regex: &Regex, haystack: &str) -> Option<&'static Encoding> {
    let label = regex.captures(haystack)?.get(1)?.as_str().to_lowercase();
    Encoding::for_label(label.as_bytes())
}

fn detect_encoding(content_type: &str, body: &[u8]) -> &'static Encoding {
    if let Some(encoding) = encoding_from(&CHARSET_REGEX, content_type) {
        return encoding;
    }

    let sniff = &body[..body.len().min(SNIFF_LEN)];
    let sniff_str = String::from_utf8_lossy(sniff);

    if let Some(encoding) = encoding_from(&META_CHARSET_REGEX, &sniff_str)
        .or_else(|| encoding_from(&META_HTTP_EQUIV_REGEX, &sniff_str))
    {
        return encoding;
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(sniff, body.len() <= SNIFF_LEN);
    detector.guess(None, true)
}
