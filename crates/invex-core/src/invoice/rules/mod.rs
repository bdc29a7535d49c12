//! Rule-based field extractors.

pub mod patterns;

use regex::Regex;

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the field from text.
    fn extract(&self, text: &str) -> Option<Self::Output>;
}

/// Extraction context with confidence scores.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Confidence score (0.0 - 1.0).
    pub confidence: f32,
    /// Source text that was matched.
    pub source: String,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, confidence: f32, source: impl Into<String>) -> Self {
        Self {
            value,
            confidence,
            source: source.into(),
        }
    }
}

/// A field extracted by an ordered list of patterns; the first pattern that
/// captures a non-empty value wins.
pub struct PatternRule {
    name: &'static str,
    patterns: &'static [Regex],
}

impl PatternRule {
    pub fn new(name: &'static str, patterns: &'static [Regex]) -> Self {
        Self { name, patterns }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Earlier patterns are more specific and score higher.
    fn confidence(index: usize) -> f32 {
        (0.95 - 0.2 * index as f32).max(0.3)
    }

    fn matches<'a>(
        pattern: &'a Regex,
        index: usize,
        text: &'a str,
    ) -> impl Iterator<Item = ExtractionMatch<String>> + 'a {
        pattern.captures_iter(text).filter_map(move |caps| {
            let value = caps.get(1)?;
            let trimmed = value.as_str().trim();
            if trimmed.is_empty() {
                return None;
            }
            let full = caps.get(0)?;
            Some(ExtractionMatch::new(
                trimmed.to_string(),
                Self::confidence(index),
                full.as_str(),
            ))
        })
    }
}

impl FieldExtractor for PatternRule {
    type Output = ExtractionMatch<String>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.patterns
            .iter()
            .enumerate()
            .find_map(|(index, pattern)| Self::matches(pattern, index, text).next())
    }
}

#[cfg(test)]
mod tests {
    use super::patterns::TOTAL_AMOUNT_PATTERNS;
    use super::*;

    #[test]
    fn test_first_pattern_wins() {
        let rule = PatternRule::new("total_amount", &TOTAL_AMOUNT_PATTERNS);
        let found = rule.extract("Paid $45.00 earlier\nTotal Due: $120.00").unwrap();

        assert_eq!(found.value, "$120.00");
        assert!(found.confidence > 0.9);
        assert!(found.source.starts_with("Total Due"));
    }

    #[test]
    fn test_loose_match_scores_lower() {
        let rule = PatternRule::new("total_amount", &TOTAL_AMOUNT_PATTERNS);
        let labeled = rule.extract("Total Due: $120.00").unwrap();
        let loose = rule.extract("Paid $45.00").unwrap();

        assert_eq!(loose.value, "$45.00");
        assert!(loose.confidence < labeled.confidence);
    }

    #[test]
    fn test_no_match() {
        let rule = PatternRule::new("total_amount", &TOTAL_AMOUNT_PATTERNS);
        assert!(rule.extract("nothing to see").is_none());
        assert!(rule.extract("").is_none());
    }
}
