//! FAQ records, write payloads, and the views served to API clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::FaqError;
use crate::i18n::Language;

/// Maximum number of characters shown when a record is rendered as a label.
const LABEL_MAX_CHARS: usize = 100;

/// Store-assigned record identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FaqId(pub i64);

impl fmt::Display for FaqId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for FaqId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(FaqId)
    }
}

/// The fields that carry per-language text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaqField {
    Question,
    Answer,
}

impl FaqField {
    pub const ALL: [FaqField; 2] = [FaqField::Question, FaqField::Answer];

    pub fn as_str(&self) -> &'static str {
        match self {
            FaqField::Question => "question",
            FaqField::Answer => "answer",
        }
    }
}

impl fmt::Display for FaqField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Translated text for one language. Either field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translation {
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub answer: Option<String>,
}

impl Translation {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: Some(question.into()),
            answer: Some(answer.into()),
        }
    }

    /// The stored value for `field`, or `None` when absent or blank.
    pub fn get(&self, field: FaqField) -> Option<&str> {
        let value = match field {
            FaqField::Question => self.question.as_deref(),
            FaqField::Answer => self.answer.as_deref(),
        };
        value.filter(|text| !text.trim().is_empty())
    }

    pub fn set(&mut self, field: FaqField, value: String) {
        match field {
            FaqField::Question => self.question = Some(value),
            FaqField::Answer => self.answer = Some(value),
        }
    }

    /// Overlay every field present in `other` onto `self`.
    pub fn merge(&mut self, other: &Translation) {
        if let Some(question) = &other.question {
            self.question = Some(question.clone());
        }
        if let Some(answer) = &other.answer {
            self.answer = Some(answer.clone());
        }
    }
}

/// A stored FAQ entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaqRecord {
    pub id: FaqId,
    pub question: String,
    pub answer: String,
    /// Keyed by language code (e.g. "hi", "bn").
    pub translations: BTreeMap<String, Translation>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FaqRecord {
    /// The English source text of `field`.
    pub fn english(&self, field: FaqField) -> &str {
        match field {
            FaqField::Question => &self.question,
            FaqField::Answer => &self.answer,
        }
    }

    /// The stored translation of `field` in `lang`, if present and non-empty.
    pub fn translated(&self, field: FaqField, lang: &str) -> Option<&str> {
        self.translations
            .get(lang)
            .and_then(|translation| translation.get(field))
    }

    /// Short admin label: the English question cut to 100 characters.
    pub fn label(&self) -> String {
        self.question.chars().take(LABEL_MAX_CHARS).collect()
    }
}

impl fmt::Display for FaqRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

fn default_active() -> bool {
    true
}

/// Payload for creating a record. Translations are optional; missing ones
/// are generated before the record is stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewFaq {
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub translations: BTreeMap<String, Translation>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

impl NewFaq {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            translations: BTreeMap::new(),
            is_active: true,
        }
    }

    pub fn with_translation(mut self, lang: Language, translation: Translation) -> Self {
        self.translations.insert(lang.code().to_string(), translation);
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    pub fn english(&self, field: FaqField) -> &str {
        match field {
            FaqField::Question => &self.question,
            FaqField::Answer => &self.answer,
        }
    }

    pub fn translated(&self, field: FaqField, lang: &str) -> Option<&str> {
        self.translations
            .get(lang)
            .and_then(|translation| translation.get(field))
    }

    /// English content is required; translation keys must be known targets.
    pub fn validate(&self) -> Result<(), FaqError> {
        require_text("question", &self.question)?;
        require_text("answer", &self.answer)?;
        validate_translation_languages(&self.translations)
    }
}

/// Partial update. `None` leaves a field unchanged; translation entries are
/// merged field by field over the stored ones.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FaqUpdate {
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub translations: BTreeMap<String, Translation>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl FaqUpdate {
    pub fn question(mut self, question: impl Into<String>) -> Self {
        self.question = Some(question.into());
        self
    }

    pub fn answer(mut self, answer: impl Into<String>) -> Self {
        self.answer = Some(answer.into());
        self
    }

    pub fn translation(mut self, lang: Language, translation: Translation) -> Self {
        self.translations.insert(lang.code().to_string(), translation);
        self
    }

    pub fn active(mut self, is_active: bool) -> Self {
        self.is_active = Some(is_active);
        self
    }

    pub fn validate(&self) -> Result<(), FaqError> {
        if let Some(question) = &self.question {
            require_text("question", question)?;
        }
        if let Some(answer) = &self.answer {
            require_text("answer", answer)?;
        }
        validate_translation_languages(&self.translations)
    }

    /// Apply the changes in place and stamp `updated_at`.
    pub fn apply_to(&self, record: &mut FaqRecord, now: DateTime<Utc>) {
        if let Some(question) = &self.question {
            record.question = question.clone();
        }
        if let Some(answer) = &self.answer {
            record.answer = answer.clone();
        }
        for (lang, translation) in &self.translations {
            record
                .translations
                .entry(lang.clone())
                .or_default()
                .merge(translation);
        }
        if let Some(is_active) = self.is_active {
            record.is_active = is_active;
        }
        record.updated_at = now;
    }
}

fn require_text(field: &str, value: &str) -> Result<(), FaqError> {
    if value.trim().is_empty() {
        return Err(FaqError::Validation(format!("{} (English) is required", field)));
    }
    Ok(())
}

fn validate_translation_languages(
    translations: &BTreeMap<String, Translation>,
) -> Result<(), FaqError> {
    for code in translations.keys() {
        match Language::from_code(code) {
            Ok(lang) if !lang.is_canonical() => {}
            _ => {
                return Err(FaqError::Validation(format!(
                    "unsupported translation language '{}'",
                    code
                )))
            }
        }
    }
    Ok(())
}

/// One FAQ as returned to API clients, resolved into a single language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaqView {
    pub id: FaqId,
    pub question: String,
    pub answer: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// List payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaqList {
    pub count: usize,
    pub results: Vec<FaqView>,
}

impl FaqList {
    pub fn new(results: Vec<FaqView>) -> Self {
        Self {
            count: results.len(),
            results,
        }
    }
}
