use regex::Regex;
use std::sync::OnceLock;

/// A quoted string literal found in one line of input.
///
/// `start..end` are byte offsets of the whole literal within the line,
/// delimiters included, recorded at extraction time so the rewriter can
/// splice replacements positionally instead of by text search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralMatch {
    pub start: usize,
    pub end: usize,
    pub quote: char,
    pub inner: String,
}

impl LiteralMatch {
    /// Re-wraps replacement text in the original delimiter pair.
    pub fn requote(&self, inner: &str) -> String {
        format!("{}{}{}", self.quote, inner, self.quote)
    }
}

// Matches a single- or double-quoted run on one line, shortest span first,
// consuming backslash escapes pairwise so an escaped quote stays inside the
// literal. The scan is left-to-right and non-overlapping; it knows nothing
// about the surrounding syntax (comments, f-strings, concatenation), which
// is an accepted limit of the heuristic.
fn literal_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#""(?:\\.|[^"\\])*"|'(?:\\.|[^'\\])*'"#).expect("literal regex must compile")
    })
}

/// Scans one line and returns every quoted literal in order of appearance.
///
/// # Examples
///
/// ```
/// use litrans_core::extract::find_literals;
///
/// let found = find_literals(r#"speak("ola mundo")"#);
/// assert_eq!(found.len(), 1);
/// assert_eq!(found[0].inner, "ola mundo");
/// assert_eq!(found[0].quote, '"');
/// ```
pub fn find_literals(line: &str) -> Vec<LiteralMatch> {
    literal_regex()
        .find_iter(line)
        .map(|m| {
            let text = m.as_str();
            let quote = text.chars().next().unwrap_or('"');
            LiteralMatch {
                start: m.start(),
                end: m.end(),
                quote,
                inner: text[1..text.len() - 1].to_string(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_double_quoted_literal() {
        let found = find_literals(r#"speak("ola mundo")"#);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].inner, "ola mundo");
        assert_eq!(found[0].quote, '"');
        assert_eq!(found[0].start, 6);
        assert_eq!(found[0].end, 17);
    }

    #[test]
    fn finds_single_quoted_literal() {
        let found = find_literals("x = 'oi'");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].inner, "oi");
        assert_eq!(found[0].quote, '\'');
    }

    #[test]
    fn line_without_quotes_yields_nothing() {
        assert!(find_literals("total += 1").is_empty());
    }

    #[test]
    fn multiple_literals_keep_file_order() {
        let found = find_literals(r#"a = "um"; b = 'dois'"#);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].inner, "um");
        assert_eq!(found[1].inner, "dois");
        assert!(found[0].end <= found[1].start);
    }

    #[test]
    fn delimiters_must_match() {
        // an apostrophe inside a double-quoted literal is not a closer
        let found = find_literals(r#"say("it's fine")"#);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].inner, "it's fine");
    }

    #[test]
    fn escaped_quote_stays_inside_literal() {
        let found = find_literals(r#"say("ele disse \"oi\" ontem")"#);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].inner, r#"ele disse \"oi\" ontem"#);
    }

    #[test]
    fn empty_literal_is_a_match() {
        let found = find_literals(r#"x = """#);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].inner, "");
    }

    #[test]
    fn unterminated_quote_is_ignored() {
        assert!(find_literals(r#"x = "aberto"#).is_empty());
    }

    #[test]
    fn duplicate_literals_get_distinct_offsets() {
        let found = find_literals(r#"a = "oi"; b = "oi""#);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].inner, found[1].inner);
        assert_ne!(found[0].start, found[1].start);
    }

    #[test]
    fn requote_preserves_delimiter() {
        let m = &find_literals("t = 'ola'")[0];
        assert_eq!(m.requote("hello"), "'hello'");
    }
}
