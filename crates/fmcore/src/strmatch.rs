//! Byte-string substring and home-directory prettification helpers.
//!
//! Implemented directly over byte slices rather than built on a regex
//! engine: the engine only ever needs a literal contiguous-byte-substring
//! check and a fixed-prefix strip.

/// Count of leading bytes `a` and `b` have in common ("initial matching
/// bytes").
#[must_use]
pub fn initial_matching_bytes(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b.iter()).take_while(|(x, y)| x == y).count()
}

/// True iff `needle` occurs as a contiguous byte-substring of `haystack`.
/// An empty `needle` always matches.
#[must_use]
pub fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    if needle.is_empty() {
        return true;
    }
    if needle.len() > haystack.len() {
        return false;
    }
    (0..=haystack.len() - needle.len()).any(|start| {
        initial_matching_bytes(&haystack[start..], needle) == needle.len()
    })
}

/// Byte offset just past `home` in `path` if `path` starts with `home`,
/// else `None`.
#[must_use]
pub fn prettify_path_i(path: &[u8], home: &[u8]) -> Option<usize> {
    if path.len() >= home.len() && path[..home.len()] == *home {
        Some(home.len())
    } else {
        None
    }
}

/// Render `path` with a leading `home` component replaced by `~`.
/// Returns `path` unchanged (as an owned `String`) when `home` is not a
/// prefix.
#[must_use]
pub fn prettify_path(path: &str, home: &str) -> String {
    match prettify_path_i(path.as_bytes(), home.as_bytes()) {
        Some(offset) => format!("~{}", &path[offset..]),
        None => path.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_basic() {
        assert!(contains(b"hello world", b"wor"));
        assert!(contains(b"hello", b""));
        assert!(!contains(b"hello", b"xyz"));
        assert!(!contains(b"hi", b"hello"));
    }

    #[test]
    fn prettify_strips_home() {
        assert_eq!(prettify_path("/home/user/.config", "/home/user"), "~/.config");
        assert_eq!(prettify_path("/etc/passwd", "/home/user"), "/etc/passwd");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn contains_finds_any_embedded_slice(
            prefix in prop::collection::vec(any::<u8>(), 0..16),
            needle in prop::collection::vec(any::<u8>(), 0..8),
            suffix in prop::collection::vec(any::<u8>(), 0..16),
        ) {
            let mut haystack = prefix.clone();
            haystack.extend_from_slice(&needle);
            haystack.extend_from_slice(&suffix);
            prop_assert!(contains(&haystack, &needle));
        }

        #[test]
        fn contains_matches_naive_windows_scan(
            haystack in prop::collection::vec(any::<u8>(), 0..32),
            needle in prop::collection::vec(any::<u8>(), 0..6),
        ) {
            let expected = if needle.is_empty() {
                true
            } else {
                haystack.windows(needle.len()).any(|w| w == needle.as_slice())
            };
            prop_assert_eq!(contains(&haystack, &needle), expected);
        }
    }
}
