//! Canonical matching-key normalization.
//!
//! Skill names, alias texts, and raw tokens are all normalized through the
//! same function so equality comparisons are meaningful across all three.

/// Normalize raw text into its canonical matching key.
///
/// Trims leading/trailing whitespace, lowercases, replaces underscores and
/// hyphens with a space, and collapses whitespace runs to a single space.
/// Total and deterministic; empty input normalizes to the empty string.
pub fn normalize(text: &str) -> String {
    let mut key = String::with_capacity(text.len());
    let mut pending_space = false;
    for ch in text.trim().chars() {
        let ch = match ch {
            '_' | '-' => ' ',
            c => c,
        };
        if ch.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space && !key.is_empty() {
            key.push(' ');
        }
        pending_space = false;
        for lower in ch.to_lowercase() {
            key.push(lower);
        }
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_trims_and_lowercases() {
        assert_eq!(normalize("  Python Developer  "), "python developer");
    }

    #[test]
    fn test_normalize_separators_become_spaces() {
        assert_eq!(normalize("python-developer"), "python developer");
        assert_eq!(normalize("python_developer"), "python developer");
        assert_eq!(normalize("machine-learning_engineer"), "machine learning engineer");
    }

    #[test]
    fn test_normalize_collapses_whitespace_runs() {
        assert_eq!(normalize("java \t  script"), "java script");
        assert_eq!(normalize("a - _ b"), "a b");
    }

    #[test]
    fn test_normalize_empty_input() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   "), "");
        assert_eq!(normalize("-_-"), "");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let inputs = [
            "  Rust_Engineer  ",
            "C++",
            "data---science",
            "Déjà Vu",
            "",
            "ALL CAPS   NAME",
        ];
        for input in inputs {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "not idempotent for {:?}", input);
        }
    }

    #[test]
    fn test_normalize_leading_separators_do_not_leave_space() {
        assert_eq!(normalize("--kubernetes"), "kubernetes");
        assert_eq!(normalize("kubernetes--"), "kubernetes");
    }

    #[test]
    fn test_normalize_unicode_lowercase() {
        assert_eq!(normalize("ÉLAN"), "élan");
    }
}
