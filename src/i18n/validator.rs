//! Translation quality validation module.
//!
//! FAQ answers are rich text, so a usable translation must keep the HTML
//! structure and every link of the English source. Findings are advisory: the
//! orchestrator logs them but still stores the translation.

use regex::Regex;
use std::sync::OnceLock;

/// Validation report containing errors and warnings about a translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    /// Critical errors that indicate translation issues
    pub errors: Vec<String>,

    /// Non-critical warnings about potential issues
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Check if the report is clean (no errors or warnings)
    pub fn is_clean(&self) -> bool {
        !self.has_errors() && !self.has_warnings()
    }
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

/// Validator for translation quality.
pub struct TranslationValidator;

static TAG_REGEX: OnceLock<Regex> = OnceLock::new();
static URL_REGEX: OnceLock<Regex> = OnceLock::new();

impl TranslationValidator {
    /// Validate that a translation preserves the markup of the original.
    ///
    /// This function checks that:
    /// - The translation is not blank
    /// - HTML tags appear in the same order
    /// - URLs (including `href` targets) are preserved
    pub fn validate(original: &str, translated: &str) -> ValidationReport {
        let mut report = ValidationReport::new();

        if translated.trim().is_empty() {
            report.errors.push("Translation is empty".to_string());
            return report;
        }

        let orig_tags = Self::extract_tags(original);
        let trans_tags = Self::extract_tags(translated);
        if orig_tags != trans_tags {
            report.warnings.push(format!(
                "HTML tag mismatch: original has {:?}, translation has {:?}",
                orig_tags, trans_tags
            ));
        }

        let orig_urls = Self::extract_urls(original);
        let trans_urls = Self::extract_urls(translated);
        if orig_urls != trans_urls {
            report.warnings.push(format!(
                "URL mismatch: original has {} URLs, translation has {} URLs",
                orig_urls.len(),
                trans_urls.len()
            ));
        }

        report
    }

    /// Extract tag names in document order, closing tags prefixed with `/`.
    fn extract_tags(text: &str) -> Vec<String> {
        let regex = TAG_REGEX.get_or_init(|| Regex::new(r"<\s*(/?)\s*([a-zA-Z][a-zA-Z0-9]*)").unwrap());

        regex
            .captures_iter(text)
            .map(|cap| format!("{}{}", &cap[1], cap[2].to_ascii_lowercase()))
            .collect()
    }

    fn extract_urls(text: &str) -> Vec<String> {
        let regex = URL_REGEX.get_or_init(|| Regex::new(r#"https?://[^\s"'<>)\]]+"#).unwrap());

        regex
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Tag Extraction Tests ====================

    #[test]
    fn test_extract_tags_in_order() {
        let tags = TranslationValidator::extract_tags("<p>Hello <strong>world</strong></p>");
        assert_eq!(tags, vec!["p", "strong", "/strong", "/p"]);
    }

    #[test]
    fn test_extract_tags_case_insensitive() {
        let tags = TranslationValidator::extract_tags("<P>Hi</P>");
        assert_eq!(tags, vec!["p", "/p"]);
    }

    #[test]
    fn test_extract_tags_plain_text() {
        assert!(TranslationValidator::extract_tags("What is this service?").is_empty());
    }

    #[test]
    fn test_extract_urls_from_href() {
        let urls = TranslationValidator::extract_urls(
            r#"<a href="https://example.com/help">help</a> or http://docs.example.com"#,
        );
        assert_eq!(
            urls,
            vec!["https://example.com/help", "http://docs.example.com"]
        );
    }

    // ==================== Validation Tests ====================

    #[test]
    fn test_validate_clean_html_translation() {
        let report = TranslationValidator::validate(
            "<p>This is a test service.</p>",
            "<p>यह एक परीक्षण सेवा है।</p>",
        );
        assert!(report.is_clean(), "{:?}", report);
    }

    #[test]
    fn test_validate_missing_tag_warns() {
        let report = TranslationValidator::validate(
            "<p>I am fine, thank you.</p>",
            "मैं ठीक हूँ, धन्यवाद।",
        );
        assert!(report.has_warnings());
        assert!(!report.has_errors());
        assert!(report.warnings[0].contains("HTML tag mismatch"));
    }

    #[test]
    fn test_validate_dropped_url_warns() {
        let report = TranslationValidator::validate(
            "See https://example.com for details",
            "বিস্তারিত জানতে দেখুন",
        );
        assert!(report.warnings.iter().any(|w| w.contains("URL mismatch")));
    }

    #[test]
    fn test_validate_blank_translation_is_error() {
        let report = TranslationValidator::validate("Hello", "   ");
        assert!(report.has_errors());
    }

    #[test]
    fn test_validation_report_default_is_clean() {
        assert!(ValidationReport::default().is_clean());
    }
}
