use std::borrow::Cow;

use percent_encoding::AsciiSet;

/// Based on https://url.spec.whatwg.org/#query-percent-encode-set
///
/// The set of characters that need to be encoded in a _query_ string
/// are:
/// - CONTROL characters
/// - U+0022 ("), U+0023 (#), U+003C (<), and U+003E (>).
///
/// Keys and values additionally escape the querystring delimiters `&` and
/// `=`, `+` (which decodes to a space) and `%` itself. Brackets are left
/// alone so that nested keys stay readable.
///
/// SPACE is not part of the set; it is written as `+`.
const QUERY_SET: &AsciiSet = &percent_encoding::CONTROLS
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'%')
    .add(b'+')
    .add(b'&')
    .add(b'=');

/// Based on https://url.spec.whatwg.org/#application-x-www-form-urlencoded-percent-encode-set
///
/// Every byte except the ASCII alphanumerics and `*`, `-`, `.`, `_` is
/// percent-encoded, brackets included. SPACE is written as `+`.
const FORM_SET: &AsciiSet = &percent_encoding::NON_ALPHANUMERIC
    .remove(b'*')
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b' ');

fn encode_set(use_form_encoding: bool) -> &'static AsciiSet {
    if use_form_encoding {
        FORM_SET
    } else {
        QUERY_SET
    }
}

/// Percent-encodes a key or value token.
///
/// Returns an iterator of chunks so that nothing is allocated when the
/// token needs no escaping.
pub(crate) fn encode(
    input: &str,
    use_form_encoding: bool,
) -> impl Iterator<Item = Cow<'_, str>> + '_ {
    encode_with(input, encode_set(use_form_encoding))
}

fn encode_with<'a>(
    input: &'a str,
    set: &'static AsciiSet,
) -> impl Iterator<Item = Cow<'a, str>> + 'a {
    percent_encoding::utf8_percent_encode(input, set).map(|chunk| {
        if chunk.contains(' ') {
            Cow::Owned(chunk.replace(' ', "+"))
        } else {
            Cow::Borrowed(chunk)
        }
    })
}

/// Escapes a string that is written as the whole querystring.
///
/// A leading `?` is kept, and `=` and `&` are left unescaped so that a
/// string already in `key=value` form is written unchanged.
pub(crate) fn encode_query(input: &str, use_form_encoding: bool) -> String {
    let (prefix, rest) = match input.strip_prefix('?') {
        Some(rest) => ("?", rest),
        None => ("", input),
    };
    let set: &'static AsciiSet = if use_form_encoding {
        &RAW_FORM_SET
    } else {
        &RAW_QUERY_SET
    };
    let mut out = String::with_capacity(input.len());
    out.push_str(prefix);
    out.extend(encode_with(rest, set));
    out
}

const RAW_QUERY_SET: AsciiSet = QUERY_SET.remove(b'=').remove(b'&');
const RAW_FORM_SET: AsciiSet = FORM_SET.remove(b'=').remove(b'&');
