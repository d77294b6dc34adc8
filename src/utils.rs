//! Utility functions for the proxy pool.

use std::collections::HashSet;

/// Parse a newline-delimited proxy list.
///
/// Blank lines and lines starting with `#` are skipped. Repeated addresses
/// keep only their first occurrence, so the order of the file is preserved.
pub(crate) fn parse_proxy_list(content: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter(|line| seen.insert(*line))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skips_comments_and_blanks() {
        let content = "# upstreams\nhttp://10.0.0.1:8080\n\n   \n#http://10.0.0.9:8080\nhttp://10.0.0.2:8080\n";
        assert_eq!(
            parse_proxy_list(content),
            vec!["http://10.0.0.1:8080", "http://10.0.0.2:8080"]
        );
    }

    #[test]
    fn test_handles_crlf_and_duplicates() {
        let content = "p1\r\np2\r\np1\r\n";
        assert_eq!(parse_proxy_list(content), vec!["p1", "p2"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_proxy_list("").is_empty());
        assert!(parse_proxy_list("# only a comment\n\n").is_empty());
    }
}
