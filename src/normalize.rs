//! Canonical text form shared by every ingestion source.
//!
//! Lowercase, strip ASCII punctuation, collapse whitespace runs to one space,
//! trim. Characters outside ASCII punctuation (including non-ASCII letters and
//! digits) pass through untouched.

/// Whitespace that separates words: space, tab, LF, CR, form feed, vertical tab.
fn is_separator(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0c' | '\x0b')
}

pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;

    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_punctuation() {
            continue;
        }
        if is_separator(c) {
            pending_space = !out.is_empty();
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        out.push(c);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const PUNCTUATION: &str = r##"!"#$%&'()*+,-./:;<=>?@[\]^_`{|}~"##;

    fn assert_canonical(output: &str) {
        assert!(!output.chars().any(|c| PUNCTUATION.contains(c)), "{output:?}");
        assert!(!output.contains("  "), "{output:?}");
        assert_eq!(output, output.trim_matches(' '), "{output:?}");
        assert!(!output.chars().any(|c| is_separator(c) && c != ' '), "{output:?}");
    }

    #[test]
    fn greeting_example() {
        assert_eq!(normalize("Hello,   World!!"), "hello world");
    }

    #[test]
    fn punctuation_set_has_thirty_two_symbols() {
        assert_eq!(PUNCTUATION.chars().count(), 32);
        assert!(PUNCTUATION.chars().all(|c| c.is_ascii_punctuation()));
        assert_eq!(normalize(PUNCTUATION), "");
    }

    #[test]
    fn every_whitespace_kind_collapses() {
        assert_eq!(normalize(" a\t\tb\n\r\nc\x0c\x0bd  "), "a b c d");
    }

    #[test]
    fn punctuation_removal_can_join_words() {
        assert_eq!(normalize("state-of-the-art e.g. don't"), "stateoftheart eg dont");
        assert_eq!(normalize("a , b"), "a b");
    }

    #[test]
    fn non_ascii_passes_through_lowercased() {
        assert_eq!(normalize("Ärger \u{2014} ÉCOLE №5 «quoted»"), "ärger \u{2014} école №5 «quoted»");
        assert_eq!(normalize("数据 分析"), "数据 分析");
    }

    #[test]
    fn empty_and_blank_inputs() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize(" \t\n "), "");
        assert_eq!(normalize("!!! ..."), "");
    }

    #[test]
    fn flattened_table_text() {
        assert_eq!(normalize("a,b\n1,2\n3,4"), "ab 12 34");
    }

    #[test]
    fn output_is_canonical_and_idempotent() {
        let samples = [
            "Hello,   World!!",
            "  Leading and trailing\t",
            "Mixed:CASE;and\r\nbreaks\x0bhere",
            "--- only ~ punctuation ---",
            "ÀÉÎ õü\u{2003}wide space stays",
            "{\"visits\": 3, \"ok\": true}",
            "",
        ];
        for sample in samples {
            let once = normalize(sample);
            assert_canonical(&once);
            assert_eq!(normalize(&once), once, "not idempotent for {sample:?}");
        }
    }
}
