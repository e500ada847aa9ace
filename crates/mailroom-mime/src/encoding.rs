//! RFC 2047 encoded-word decoding.
//!
//! Header text may carry `=?charset?B?...?=` (base64) and `=?charset?Q?...?=`
//! (quoted-printable with `_` for space) words. UTF-8, US-ASCII and
//! ISO-8859-1 charsets are understood.

use base64::Engine;
use base64::engine::general_purpose::STANDARD_NO_PAD;

use crate::error::{Error, Result};

/// Decodes every encoded word in a header value.
///
/// Whitespace between two adjacent encoded words is dropped. Words that are
/// malformed or use an unknown charset are kept as sent.
#[must_use]
pub fn decode_rfc2047(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    let mut after_word = false;

    while let Some(start) = rest.find("=?") {
        let (before, candidate) = rest.split_at(start);
        let decoded = encoded_word_len(candidate)
            .and_then(|len| Some((len, decode_encoded_word(&candidate[..len]).ok()?)));

        if let Some((len, word)) = decoded {
            if !(after_word && before.chars().all(char::is_whitespace)) {
                out.push_str(before);
            }
            out.push_str(&word);
            rest = &candidate[len..];
            after_word = true;
        } else {
            out.push_str(before);
            out.push_str("=?");
            rest = &candidate[2..];
            after_word = false;
        }
    }
    out.push_str(rest);
    out
}

/// Decodes a single `=?charset?encoding?text?=` word.
///
/// # Errors
///
/// [`Error::InvalidEncoding`] for a malformed word or an encoding other
/// than `B`/`Q`, [`Error::UnsupportedCharset`], and base64 or UTF-8 errors.
pub fn decode_encoded_word(word: &str) -> Result<String> {
    let inner = word
        .strip_prefix("=?")
        .and_then(|w| w.strip_suffix("?="))
        .ok_or_else(|| Error::InvalidEncoding(format!("not an encoded word: {word}")))?;

    let mut parts = inner.splitn(3, '?');
    let (Some(charset), Some(encoding), Some(payload)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(Error::InvalidEncoding(format!("incomplete encoded word: {word}")));
    };
    // RFC 2231 language suffix: `utf-8*en`
    let charset = charset.split('*').next().unwrap_or(charset);

    let bytes = match encoding {
        "B" | "b" => STANDARD_NO_PAD.decode(payload.trim_end_matches('='))?,
        "Q" | "q" => decode_q(payload)?,
        other => {
            return Err(Error::InvalidEncoding(format!("unknown encoding: {other}")));
        }
    };
    decode_charset(bytes, charset)
}

/// Converts bytes in `charset` to a string.
///
/// # Errors
///
/// [`Error::UnsupportedCharset`] for charsets other than UTF-8, US-ASCII and
/// ISO-8859-1, and [`Error::Utf8Decode`] for invalid UTF-8.
pub fn decode_charset(bytes: Vec<u8>, charset: &str) -> Result<String> {
    match charset.to_ascii_lowercase().as_str() {
        "utf-8" | "utf8" | "us-ascii" | "ascii" => Ok(String::from_utf8(bytes)?),
        "iso-8859-1" | "latin1" | "latin-1" => Ok(bytes.into_iter().map(char::from).collect()),
        _ => Err(Error::UnsupportedCharset(charset.to_string())),
    }
}

/// Length of the encoded word at the start of `s`, if there is one.
fn encoded_word_len(s: &str) -> Option<usize> {
    let body = s.strip_prefix("=?")?;
    let charset_end = body.find('?')?;
    let after_charset = &body[charset_end + 1..];
    let encoding_end = after_charset.find('?')?;
    let payload = &after_charset[encoding_end + 1..];
    let payload_end = payload.find("?=")?;

    if charset_end == 0
        || encoding_end != 1
        || payload[..payload_end].contains(char::is_whitespace)
    {
        return None;
    }
    Some(2 + charset_end + 1 + encoding_end + 1 + payload_end + 2)
}

fn decode_q(payload: &str) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(payload.len());
    let mut bytes = payload.bytes();

    while let Some(byte) = bytes.next() {
        match byte {
            b'_' => out.push(b' '),
            b'=' => {
                let hex = [bytes.next(), bytes.next()];
                let [Some(hi), Some(lo)] = hex else {
                    return Err(Error::InvalidEncoding(
                        "Incomplete escape sequence".to_string(),
                    ));
                };
                let value = std::str::from_utf8(&[hi, lo])
                    .ok()
                    .and_then(|h| u8::from_str_radix(h, 16).ok())
                    .ok_or_else(|| {
                        let escape = format!("={}{}", char::from(hi), char::from(lo));
                        Error::InvalidEncoding(format!("Invalid hex: {escape}"))
                    })?;
                out.push(value);
            }
            other => out.push(other),
        }
    }
    Ok(out)
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_plain_text_unchanged() {
        assert_eq!(decode_rfc2047("Hello"), "Hello");
        assert_eq!(decode_rfc2047("a =? b"), "a =? b");
        assert_eq!(decode_rfc2047(""), "");
    }

    #[test]
    fn test_base64_word() {
        assert_eq!(decode_rfc2047("=?utf-8?B?SMOpbGxv?="), "Héllo");
        assert_eq!(decode_rfc2047("=?UTF-8?B?0J/RgNC40LLRltGC?="), "Привіт");
        // padding is optional
        assert_eq!(decode_rfc2047("=?utf-8?b?SMOpbGxv?="), "Héllo");
    }

    #[test]
    fn test_q_word() {
        assert_eq!(decode_rfc2047("=?utf-8?Q?H=C3=A9llo_world?="), "Héllo world");
        assert_eq!(decode_rfc2047("=?ISO-8859-1?Q?Andr=E9?= Pirard"), "André Pirard");
    }

    #[test]
    fn test_adjacent_words_join() {
        assert_eq!(decode_rfc2047("=?utf-8?Q?a?= =?utf-8?Q?b?="), "ab");
        assert_eq!(decode_rfc2047("=?utf-8?Q?a?=\t =?utf-8?Q?b?="), "ab");
        assert_eq!(decode_rfc2047("=?utf-8?Q?a?= x =?utf-8?Q?b?="), "a x b");
        assert_eq!(decode_rfc2047("Re: =?utf-8?Q?caf=C3=A9?= time"), "Re: café time");
    }

    #[test]
    fn test_bad_words_kept() {
        assert_eq!(decode_rfc2047("=?koi8-r?B?9NXQ?="), "=?koi8-r?B?9NXQ?=");
        assert_eq!(decode_rfc2047("=?utf-8?X?abc?="), "=?utf-8?X?abc?=");
        assert_eq!(decode_rfc2047("=?utf-8?Q?a b?="), "=?utf-8?Q?a b?=");
    }

    #[test]
    fn test_decode_encoded_word_errors() {
        assert!(matches!(
            decode_encoded_word("=?koi8-r?B?9NXQ?="),
            Err(Error::UnsupportedCharset(_))
        ));
        assert!(matches!(
            decode_encoded_word("plain"),
            Err(Error::InvalidEncoding(_))
        ));
        assert!(decode_encoded_word("=?utf-8?Q?=E?=").is_err());
        assert_eq!(decode_encoded_word("=?utf-8*en?Q?hi?=").unwrap(), "hi");
    }

    #[test]
    fn test_latin1() {
        assert_eq!(decode_charset(vec![0x63, 0x61, 0x66, 0xE9], "ISO-8859-1").unwrap(), "café");
        assert!(decode_charset(vec![0xE9], "utf-8").is_err());
    }

    proptest! {
        #[test]
        fn prop_text_without_words_unchanged(text in "[^=]*") {
            prop_assert_eq!(decode_rfc2047(&text), text);
        }

        #[test]
        fn prop_q_hex_escapes_decode(text in "\\PC{0,40}") {
            let payload: String = text.bytes().map(|b| format!("={b:02X}")).collect();
            let word = format!("=?utf-8?Q?{payload}?=");
            prop_assert_eq!(decode_encoded_word(&word).unwrap(), text);
        }
    }
}
