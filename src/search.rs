/// Keep the lines of `text` that contain `query`, ignoring case.
///
/// An empty query returns the text unchanged.
pub fn filter_lines(text: &str, query: &str) -> String {
    if query.is_empty() {
        return text.to_string();
    }

    let needle = query.to_lowercase();
    text.split('\n')
        .filter(|line| line.to_lowercase().contains(&needle))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Number of lines containing `query`, ignoring case.
pub fn count_matches(text: &str, query: &str) -> usize {
    if query.is_empty() {
        return 0;
    }
    let needle = query.to_lowercase();
    text.split('\n')
        .filter(|line| line.to_lowercase().contains(&needle))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &str = "Invoice 2024\nTotal due: 42\nthank you\nTOTAL paid: 0";

    #[test]
    fn test_filter_is_case_insensitive() {
        assert_eq!(filter_lines(TEXT, "total"), "Total due: 42\nTOTAL paid: 0");
    }

    #[test]
    fn test_empty_query_returns_text() {
        assert_eq!(filter_lines(TEXT, ""), TEXT);
        assert_eq!(count_matches(TEXT, ""), 0);
    }

    #[test]
    fn test_no_match_is_empty() {
        assert_eq!(filter_lines(TEXT, "receipt"), "");
        assert_eq!(count_matches(TEXT, "receipt"), 0);
    }

    #[test]
    fn test_count_matches() {
        assert_eq!(count_matches(TEXT, "TOTAL"), 2);
    }
}
