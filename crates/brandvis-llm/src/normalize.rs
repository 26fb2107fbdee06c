//! Reply-text normalization shared by every provider.

use std::sync::LazyLock;

use regex::Regex;

/// Leading list markers models add despite being told not to: `-`, `*`, `•`,
/// `1.`, `1)`.
static LIST_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[-*•]+\s*|\d{1,3}[.)]\s+)").expect("valid list marker regex")
});

/// Lazily split a free-text reply into normalized names.
///
/// Each line is trimmed, stripped of a leading list marker, and lower-cased;
/// lines left empty are dropped.
pub fn parse_lines(text: &str) -> impl Iterator<Item = String> + '_ {
    text.lines().filter_map(|line| {
        let trimmed = line.trim();
        let unmarked = LIST_MARKER.replace(trimmed, "");
        let name = unmarked.trim();
        if name.is_empty() {
            None
        } else {
            Some(name.to_lowercase())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(text: &str) -> Vec<String> {
        parse_lines(text).collect()
    }

    #[test]
    fn trims_lowercases_and_drops_blank_lines() {
        assert_eq!(
            collect("  Asana \n\n   \nTrello\r\nMonday.com"),
            vec!["asana", "trello", "monday.com"]
        );
    }

    #[test]
    fn strips_bullets_and_numbering() {
        assert_eq!(
            collect("- Asana\n* Trello\n• Jira\n1. Acme\n12) ClickUp"),
            vec!["asana", "trello", "jira", "acme", "clickup"]
        );
    }

    #[test]
    fn keeps_names_that_start_with_digits() {
        assert_eq!(
            collect("3M\n1Password\n7-Eleven"),
            vec!["3m", "1password", "7-eleven"]
        );
    }

    #[test]
    fn marker_only_line_is_dropped() {
        assert!(collect("-\n  * ").is_empty());
    }

    #[test]
    fn empty_text_yields_nothing() {
        assert!(collect("").is_empty());
    }
}
