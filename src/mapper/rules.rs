//! Ordered substring rules: the first rule whose matcher accepts the folded
//! input decides the mapped value.

use crate::normalizer::fold;

/// How a rule inspects folded text. Tokens must already be folded.
#[derive(Debug, Clone, Copy)]
pub enum Matcher {
    /// Any token is a substring.
    Any(&'static [&'static str]),
    /// Every token is a substring.
    All(&'static [&'static str]),
    /// A token from each group is a substring.
    Both(&'static [&'static str], &'static [&'static str]),
    /// The whole input equals one of the tokens.
    Exact(&'static [&'static str]),
}

impl Matcher {
    pub fn matches(&self, folded: &str) -> bool {
        match self {
            Matcher::Any(tokens) => tokens.iter().any(|t| folded.contains(t)),
            Matcher::All(tokens) => tokens.iter().all(|t| folded.contains(t)),
            Matcher::Both(left, right) => {
                left.iter().any(|t| folded.contains(t)) && right.iter().any(|t| folded.contains(t))
            }
            Matcher::Exact(tokens) => tokens.iter().any(|t| folded == *t),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Rule<T> {
    pub name: &'static str,
    pub matcher: Matcher,
    pub value: T,
}

impl<T> Rule<T> {
    pub const fn new(name: &'static str, matcher: Matcher, value: T) -> Self {
        Self { name, matcher, value }
    }
}

/// Evaluates `rules` top to bottom against already folded text.
pub fn first_match_folded<'a, T>(rules: &'a [Rule<T>], folded: &str) -> Option<&'a Rule<T>> {
    if folded.is_empty() {
        return None;
    }
    rules.iter().find(|rule| rule.matcher.matches(folded))
}

/// Folds `raw` and returns the value of the first matching rule.
pub fn first_match<T: Copy>(rules: &[Rule<T>], raw: &str) -> Option<T> {
    first_match_folded(rules, &fold(raw)).map(|rule| rule.value)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RULES: &[Rule<u8>] = &[
        Rule::new("both", Matcher::Both(&["hybrid"], &["diesel"]), 1),
        Rule::new("any", Matcher::Any(&["hybrid", "electri"]), 2),
        Rule::new("exact", Matcher::Exact(&["diesel"]), 3),
    ];

    #[test]
    fn earlier_rules_win() {
        assert_eq!(first_match(RULES, "Hybride Diesel"), Some(1));
        assert_eq!(first_match(RULES, "Électrique"), Some(2));
        assert_eq!(first_match(RULES, " DIESEL "), Some(3));
        assert_eq!(first_match(RULES, "diesel 2.0"), None);
        assert_eq!(first_match(RULES, ""), None);
    }

    #[test]
    fn reports_the_rule_that_fired() {
        let rule = first_match_folded(RULES, "hybrid").unwrap();
        assert_eq!(rule.name, "any");
    }
}
