use crate::config::LabeledPattern;
use crate::error::{AnalystError, Result};
use regex::Regex;

/// Ordered list of labelled regexes, each evaluated on its own.
#[derive(Debug, Clone)]
pub struct PatternSet {
    patterns: Vec<(String, Regex)>,
}

impl PatternSet {
    pub fn compile(patterns: &[LabeledPattern]) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| {
                Regex::new(&p.pattern)
                    .map(|re| (p.label.clone(), re))
                    .map_err(|source| AnalystError::Pattern {
                        label: p.label.clone(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(|(label, _)| label.as_str())
    }

    /// Labels of every pattern matching `text`, in list order.
    pub fn matches<'a>(&'a self, text: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.patterns
            .iter()
            .filter(move |(_, re)| re.is_match(text))
            .map(|(label, _)| label.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(pairs: &[(&str, &str)]) -> PatternSet {
        let patterns: Vec<_> = pairs
            .iter()
            .map(|(label, pattern)| LabeledPattern {
                label: label.to_string(),
                pattern: pattern.to_string(),
            })
            .collect();
        PatternSet::compile(&patterns).unwrap()
    }

    #[test]
    fn reports_every_matching_label_in_order() {
        let set = set(&[("token", "(?i)token"), ("pw", "(?i)password"), ("none", "zzz")]);
        let hits: Vec<_> = set.matches("rotate PASSWORD and Token").collect();
        assert_eq!(hits, vec!["token", "pw"]);
    }

    #[test]
    fn invalid_regex_names_its_label() {
        let patterns = vec![LabeledPattern {
            label: "broken".into(),
            pattern: "(unclosed".into(),
        }];
        let err = PatternSet::compile(&patterns).unwrap_err();
        assert!(matches!(err, AnalystError::Pattern { ref label, .. } if label == "broken"));
    }
}
