//! Pure text classifiers shared by the diff-row classifier and the applier.

/// Stable content fingerprint: md5 of the trimmed text, as lowercase hex.
pub fn fingerprint(text: &str) -> String {
    format!("{:x}", md5::compute(text.trim()))
}

/// Indentation depth, counted as the number of leading `:` characters.
pub fn depth(text: &str) -> usize {
    text.chars().take_while(|&c| c == ':').count()
}

/// True iff `text` is a MediaWiki section heading, wrapped in a matched pair
/// of `===...===` or `==...==`.
pub fn is_section_heading(text: &str) -> bool {
    (text.len() >= 6 && text.starts_with("===") && text.ends_with("==="))
        || (text.len() >= 4 && text.starts_with("==") && text.ends_with("=="))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_trims_before_hashing() {
        assert_eq!(fingerprint("Hello."), fingerprint("  Hello.  \n"));
    }

    #[test]
    fn fingerprint_is_stable_hex() {
        let h = fingerprint("Hello.");
        assert_eq!(h.len(), 32);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn depth_counts_leading_colons() {
        assert_eq!(depth("no indent"), 0);
        assert_eq!(depth(":one"), 1);
        assert_eq!(depth("::::deep"), 4);
    }

    #[test]
    fn section_heading_detects_both_levels() {
        assert!(is_section_heading("== Greet =="));
        assert!(is_section_heading("=== Farewell ==="));
        assert!(!is_section_heading("Hello."));
    }

    #[test]
    fn section_heading_rejects_too_short() {
        assert!(!is_section_heading("=="));
        assert!(!is_section_heading("==="));
    }
}
