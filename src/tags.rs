/// Normalize a tag for storage: trim surrounding whitespace and lowercase.
/// Returns an empty string for whitespace-only input; callers reject that.
pub fn normalize_tag(tag: &str) -> String {
    tag.trim().to_lowercase()
}

/// Normalize, drop empties, and deduplicate a list of tags.
/// The result is sorted for stable display and diffing.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut normalized: Vec<String> = tags
        .iter()
        .map(|t| normalize_tag(t))
        .filter(|t| !t.is_empty())
        .collect();
    normalized.sort();
    normalized.dedup();
    normalized
}

/// Split comma-separated CLI input ("work, home") into normalized tags
pub fn parse_tag_list(input: &str) -> Vec<String> {
    let raw: Vec<String> = input.split(',').map(|t| t.to_string()).collect();
    normalize_tags(&raw)
}

/// Join tags for display ("[work] [home]")
pub fn format_tags(tags: &[String]) -> String {
    tags.iter()
        .map(|t| format!("[{}]", t))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_trims_and_lowercases() {
        assert_eq!(normalize_tag("  Work  "), "work");
        assert_eq!(normalize_tag("HOME"), "home");
        assert_eq!(normalize_tag("   "), "");
    }

    #[test]
    fn normalize_tags_collapses_case_duplicates() {
        let tags = vec!["Work".to_string(), "work".to_string(), " ".to_string()];
        assert_eq!(normalize_tags(&tags), vec!["work"]);
    }

    #[test]
    fn parse_tag_list_splits_on_commas() {
        assert_eq!(parse_tag_list("Work, home,,  "), vec!["home", "work"]);
        assert!(parse_tag_list("").is_empty());
    }

    #[test]
    fn format_tags_brackets_each() {
        let tags = vec!["home".to_string(), "work".to_string()];
        assert_eq!(format_tags(&tags), "[home] [work]");
    }
}
