use std::borrow::Cow;

use percent_encoding::percent_decode;

use crate::error::Result;

/// Decodes a single key or value token:
/// - Replaces `+` with a space
/// - Decodes percent-encoded bytes (malformed escapes are kept verbatim)
/// - Validates the result as UTF-8
///
/// Borrows the input when there is nothing to decode.
pub(crate) fn decode_str(input: &[u8]) -> Result<Cow<'_, str>> {
    if !input.iter().any(|&b| b == b'+' || b == b'%') {
        return Ok(Cow::Borrowed(std::str::from_utf8(input)?));
    }

    let bytes: Cow<'_, [u8]> = if input.contains(&b'+') {
        let replaced: Vec<u8> = input
            .iter()
            .map(|&b| if b == b'+' { b' ' } else { b })
            .collect();
        Cow::Owned(percent_decode(&replaced).collect())
    } else {
        percent_decode(input).into()
    };

    Ok(match bytes {
        Cow::Borrowed(b) => Cow::Borrowed(std::str::from_utf8(b)?),
        Cow::Owned(b) => Cow::Owned(String::from_utf8(b)?),
    })
}

#[cfg(test)]
mod test {
    use super::decode_str;

    #[test]
    fn decode_plain() {
        assert_eq!(decode_str(b"abc").unwrap(), "abc");
    }

    #[test]
    fn decode_plus_and_percent() {
        assert_eq!(decode_str(b"a+b%20c").unwrap(), "a b c");
        assert_eq!(decode_str(b"%5Bx%5D").unwrap(), "[x]");
        assert_eq!(decode_str(b"%2B").unwrap(), "+");
        assert_eq!(decode_str(b"caf%C3%A9").unwrap(), "café");
    }

    #[test]
    fn decode_malformed_escape_is_kept() {
        assert_eq!(decode_str(b"100%").unwrap(), "100%");
        assert_eq!(decode_str(b"%zz").unwrap(), "%zz");
    }
}
