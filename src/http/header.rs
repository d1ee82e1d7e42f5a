//! Header key validation and canonical casing.

/// Returns true when `key` is a non-empty run of ASCII letters, digits and
/// hyphens.
pub fn is_valid_header_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-')
}

/// Canonicalizes a header key: the first letter and every letter following a
/// hyphen are upper-cased, all other letters are lower-cased.
///
/// ```
/// # use docserve::http::header::canonical_header_key;
/// assert_eq!(canonical_header_key("content-type"), "Content-Type");
/// assert_eq!(canonical_header_key("HOST"), "Host");
/// ```
pub fn canonical_header_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper = true;

    for c in key.chars() {
        if upper {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c.to_ascii_lowercase());
        }
        upper = c == '-';
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_key_after_hyphen() {
        assert_eq!(canonical_header_key("x-fORWARDED-for"), "X-Forwarded-For");
        assert_eq!(canonical_header_key("-a"), "-A");
    }
}
