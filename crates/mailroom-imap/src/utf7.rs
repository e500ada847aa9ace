//! Modified UTF-7 mailbox names (RFC 3501 section 5.1.3).
//!
//! Printable ASCII stands for itself except `&`, which is written `&-`.
//! Anything else is UTF-16BE, base64-encoded with `,` in place of `/` and
//! no padding, between `&` and `-`.

use base64::Engine;
use base64::alphabet::IMAP_MUTF7;
use base64::engine::GeneralPurpose;
use base64::engine::general_purpose::NO_PAD;

const MUTF7: GeneralPurpose = GeneralPurpose::new(&IMAP_MUTF7, NO_PAD);

const fn is_direct(c: u8) -> bool {
    matches!(c, 0x20..=0x7e)
}

/// Decodes a modified UTF-7 name, or `None` if it is not valid.
#[must_use]
pub fn decode(input: &str) -> Option<String> {
    let bytes = input.as_bytes();
    let mut output = String::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'&' => {
                let start = i + 1;
                let len = bytes[start..].iter().position(|&b| b == b'-')?;
                let end = start + len;
                if len == 0 {
                    output.push('&');
                } else {
                    let raw = MUTF7.decode(&bytes[start..end]).ok()?;
                    if raw.len() % 2 != 0 {
                        return None;
                    }
                    let units = raw
                        .chunks_exact(2)
                        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]));
                    for c in char::decode_utf16(units) {
                        output.push(c.ok()?);
                    }
                }
                i = end + 1;
            }
            c if is_direct(c) => {
                output.push(char::from(c));
                i += 1;
            }
            _ => return None,
        }
    }

    Some(output)
}

/// Encodes a name into modified UTF-7.
#[must_use]
pub fn encode(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut pending: Vec<u16> = Vec::new();

    for c in input.chars() {
        if u8::try_from(c).is_ok_and(is_direct) {
            flush(&mut output, &mut pending);
            if c == '&' {
                output.push_str("&-");
            } else {
                output.push(c);
            }
        } else {
            let mut units = [0u16; 2];
            pending.extend_from_slice(c.encode_utf16(&mut units));
        }
    }
    flush(&mut output, &mut pending);

    output
}

/// Returns the form of a mailbox name to send to the server.
///
/// Names that already are valid modified UTF-7, such as the raw names LIST
/// returns, are sent unchanged; anything else is encoded.
#[must_use]
pub fn to_wire(name: &str) -> String {
    if decode(name).is_some() {
        name.to_string()
    } else {
        encode(name)
    }
}

fn flush(output: &mut String, pending: &mut Vec<u16>) {
    if pending.is_empty() {
        return;
    }
    let raw: Vec<u8> = pending.iter().flat_map(|unit| unit.to_be_bytes()).collect();
    output.push('&');
    output.push_str(&MUTF7.encode(raw));
    output.push('-');
    pending.clear();
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn decode_rfc_examples() {
        assert_eq!(decode("").unwrap(), "");
        assert_eq!(decode("&-").unwrap(), "&");
        assert_eq!(
            decode("~peter/mail/&U,BTFw-/&ZeVnLIqe-").unwrap(),
            "~peter/mail/台北/日本語"
        );
        assert_eq!(decode("&Jjo-!").unwrap(), "☺!");
        assert_eq!(decode("&U,BTF2XlZyyKng-").unwrap(), "台北日本語");
    }

    #[test]
    fn decode_gmail_trash() {
        assert_eq!(decode("&BBoEPgRIBDgEOg-").unwrap(), "Кошик");
    }

    #[test]
    fn decode_rejects_unterminated_shift() {
        assert_eq!(decode("&Jjo!"), None);
    }

    #[test]
    fn decode_rejects_raw_non_ascii() {
        assert_eq!(decode("Entwürfe"), None);
    }

    #[test]
    fn decode_rejects_lone_surrogate() {
        // 0xD800 alone
        assert_eq!(decode("&2AA-"), None);
    }

    #[test]
    fn encode_rfc_examples() {
        assert_eq!(encode("&"), "&-");
        assert_eq!(encode("~peter/mail/台北/日本語"), "~peter/mail/&U,BTFw-/&ZeVnLIqe-");
        assert_eq!(encode("台北日本語"), "&U,BTF2XlZyyKng-");
        assert_eq!(encode("INBOX"), "INBOX");
    }

    #[test]
    fn wire_form() {
        assert_eq!(to_wire("INBOX"), "INBOX");
        assert_eq!(to_wire("[Gmail]/&BBoEPgRIBDgEOg-"), "[Gmail]/&BBoEPgRIBDgEOg-");
        assert_eq!(to_wire("[Gmail]/Кошик"), "[Gmail]/&BBoEPgRIBDgEOg-");
        assert_eq!(to_wire("Tom & Jerry"), "Tom &- Jerry");
    }

    proptest! {
        #[test]
        fn round_trip(name in "\\PC*") {
            prop_assert_eq!(decode(&encode(&name)), Some(name));
        }
    }
}
