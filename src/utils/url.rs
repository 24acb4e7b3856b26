//! URL helpers.

/// Adds `http://` in front of `url` if no scheme separator appears in its
/// first 12 characters.
pub fn fix_url(url: &str) -> String {
    let head: String = url.chars().take(12).collect();
    if head.contains("://") {
        url.to_string()
    } else {
        format!("http://{url}")
    }
}

/// Length in bytes of the longest common prefix of `a` and `b`.
///
/// Always ends on a character boundary of both strings.
pub fn common_prefix_len(a: &str, b: &str) -> usize {
    a.char_indices()
        .zip(b.chars())
        .find(|((_, ca), cb)| ca != cb)
        .map(|((i, _), _)| i)
        .unwrap_or_else(|| a.len().min(b.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fix_url_adds_scheme() {
        assert_eq!(fix_url("example.com/page"), "http://example.com/page");
        assert_eq!(fix_url("https://example.com"), "https://example.com");
        assert_eq!(fix_url("ftp://example.com"), "ftp://example.com");
    }

    #[test]
    fn test_fix_url_only_looks_at_head() {
        // "://" deep inside a query does not count as a scheme
        assert_eq!(
            fix_url("example.com/?next=http://x"),
            "http://example.com/?next=http://x"
        );
    }

    #[test]
    fn test_common_prefix_len() {
        assert_eq!(common_prefix_len("http://a.com/x/1", "http://a.com/x/2"), 15);
        assert_eq!(common_prefix_len("abc", "abc"), 3);
        assert_eq!(common_prefix_len("abc", "abcdef"), 3);
        assert_eq!(common_prefix_len("", "abc"), 0);
        assert_eq!(common_prefix_len("xyz", "abc"), 0);
    }

    #[test]
    fn test_common_prefix_respects_char_boundaries() {
        // 'é' and 'è' share their first UTF-8 byte
        let n = common_prefix_len("/café", "/cafè");
        assert_eq!(n, 4);
        assert!("/café".is_char_boundary(n));
    }
}
