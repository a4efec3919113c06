use regex::Regex;
use std::fmt;

/// Relational operator used by numeric predicates and confidence filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

impl Comparator {
    /// Splits a leading comparator off `text`, longest spelling first.
    /// `=` and `==` both mean equality.
    pub fn split_leading(text: &str) -> Option<(Comparator, &str)> {
        const SPELLINGS: [(&str, Comparator); 7] = [
            ("<=", Comparator::Le),
            (">=", Comparator::Ge),
            ("==", Comparator::Eq),
            ("!=", Comparator::Ne),
            ("=", Comparator::Eq),
            ("<", Comparator::Lt),
            (">", Comparator::Gt),
        ];
        SPELLINGS
            .iter()
            .find_map(|(sym, op)| text.strip_prefix(sym).map(|rest| (*op, rest)))
    }

    /// Applies the comparison to two numbers. All numeric predicates compare
    /// as floats, even when the filter literal was written as an integer.
    pub fn compare(self, lhs: f64, rhs: f64) -> bool {
        match self {
            Comparator::Eq => lhs == rhs,
            Comparator::Ne => lhs != rhs,
            Comparator::Lt => lhs < rhs,
            Comparator::Gt => lhs > rhs,
            Comparator::Le => lhs <= rhs,
            Comparator::Ge => lhs >= rhs,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Comparator::Eq => "=",
            Comparator::Ne => "!=",
            Comparator::Lt => "<",
            Comparator::Gt => ">",
            Comparator::Le => "<=",
            Comparator::Ge => ">=",
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A compiled text pattern. `*` matches any run of characters and `?`
/// matches exactly one; patterns without wildcards fall back to plain
/// equality or containment.
#[derive(Debug, Clone)]
pub struct Pattern {
    raw: String,
    matcher: Matcher,
}

#[derive(Debug, Clone)]
enum Matcher {
    Exact { case_sensitive: bool },
    Substring { case_sensitive: bool },
    Glob(Regex),
}

impl Pattern {
    /// A pattern that must match the whole value, used for tag and marking
    /// label tests.
    pub fn whole(raw: &str, case_sensitive: bool) -> Self {
        let matcher = if has_wildcard(raw) {
            Matcher::Glob(compile_glob(raw, true, case_sensitive))
        } else {
            Matcher::Exact { case_sensitive }
        };
        Self {
            raw: raw.to_string(),
            matcher,
        }
    }

    /// A pattern that matches anywhere inside the value, used for caption,
    /// name and path tests. The pattern behaves as if wrapped in `*...*`
    /// unless the user anchored it with explicit wildcards.
    pub fn substring(raw: &str, case_sensitive: bool) -> Self {
        let matcher = if has_wildcard(raw) {
            Matcher::Glob(compile_glob(raw, false, case_sensitive))
        } else {
            Matcher::Substring { case_sensitive }
        };
        Self {
            raw: raw.to_string(),
            matcher,
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn matches(&self, text: &str) -> bool {
        match &self.matcher {
            Matcher::Exact {
                case_sensitive: true,
            } => text == self.raw,
            Matcher::Exact {
                case_sensitive: false,
            } => text.to_lowercase() == self.raw.to_lowercase(),
            Matcher::Substring {
                case_sensitive: true,
            } => text.contains(&self.raw),
            Matcher::Substring {
                case_sensitive: false,
            } => text.to_lowercase().contains(&self.raw.to_lowercase()),
            Matcher::Glob(re) => re.is_match(text),
        }
    }
}

pub fn has_wildcard(text: &str) -> bool {
    text.contains(['*', '?'])
}

/// Parses a numeric filter literal. The original tool accepts a comma as
/// the decimal separator, so both `0.8` and `0,8` are valid.
pub fn parse_number(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    text.replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

fn compile_glob(pattern: &str, anchored: bool, case_sensitive: bool) -> Regex {
    let mut body = String::with_capacity(pattern.len() + 8);
    if !case_sensitive {
        body.push_str("(?i)");
    }
    // (?s) lets wildcards cross newlines inside multi-line captions.
    body.push_str("(?s)");
    if anchored {
        body.push('^');
    }
    let mut buf = [0u8; 4];
    for c in pattern.chars() {
        match c {
            '*' => body.push_str(".*"),
            '?' => body.push('.'),
            c => body.push_str(&regex::escape(c.encode_utf8(&mut buf))),
        }
    }
    if anchored {
        body.push('$');
    }
    Regex::new(&body).expect("valid glob regex")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comparator_spellings() {
        assert_eq!(
            Comparator::split_leading(">=0.8"),
            Some((Comparator::Ge, "0.8"))
        );
        assert_eq!(
            Comparator::split_leading("==3"),
            Some((Comparator::Eq, "3"))
        );
        assert_eq!(Comparator::split_leading("=3"), Some((Comparator::Eq, "3")));
        assert_eq!(
            Comparator::split_leading("!=3"),
            Some((Comparator::Ne, "3"))
        );
        assert_eq!(Comparator::split_leading("!3"), None);
        assert_eq!(Comparator::split_leading("3"), None);
    }

    #[test]
    fn comparison_boundaries() {
        assert!(Comparator::Eq.compare(13.0, 13.0));
        assert!(!Comparator::Lt.compare(100.0, 100.0));
        assert!(Comparator::Le.compare(100.0, 100.0));
        assert!(Comparator::Ne.compare(99.0, 100.0));
    }

    #[test]
    fn whole_pattern_without_wildcard_is_equality() {
        let p = Pattern::whole("cat", false);
        assert!(p.matches("cat"));
        assert!(p.matches("CAT"));
        assert!(!p.matches("catastrophe"));
        assert!(!p.matches("orange cat"));
    }

    #[test]
    fn whole_pattern_with_leading_star() {
        let p = Pattern::whole("*cat", false);
        assert!(p.matches("cat"));
        assert!(p.matches("orange cat"));
        assert!(p.matches("large cat"));
        assert!(!p.matches("catastrophe"));
    }

    #[test]
    fn substring_pattern_without_wildcard_is_containment() {
        let p = Pattern::substring("cat", false);
        assert!(p.matches("catastrophe"));
        assert!(p.matches("a Cat sleeps"));
        assert!(!p.matches("dog"));
    }

    #[test]
    fn substring_pattern_with_wildcard_is_unanchored() {
        let p = Pattern::substring("*cat", false);
        assert!(p.matches("catastrophe"));
        let q = Pattern::substring("w?te", false);
        assert!(!q.matches("white"));
        assert!(q.matches("wite"));
    }

    #[test]
    fn question_mark_matches_exactly_one_char() {
        let p = Pattern::whole("c?t", false);
        assert!(p.matches("cat"));
        assert!(p.matches("cot"));
        assert!(!p.matches("ct"));
        assert!(!p.matches("coat"));
    }

    #[test]
    fn case_sensitive_patterns() {
        let p = Pattern::whole("Cat", true);
        assert!(p.matches("Cat"));
        assert!(!p.matches("cat"));
        let g = Pattern::whole("Ca*", true);
        assert!(g.matches("Cat"));
        assert!(!g.matches("cat"));
    }

    #[test]
    fn regex_metacharacters_are_literal() {
        let p = Pattern::whole("a.b+c", false);
        assert!(p.matches("a.b+c"));
        assert!(!p.matches("axb+c"));
        let g = Pattern::whole("a.b*", false);
        assert!(g.matches("a.bcd"));
        assert!(!g.matches("axbcd"));
    }
}
