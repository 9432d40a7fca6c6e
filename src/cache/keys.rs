//! Deterministic cache keys. Identical requests always map to the same key.

use crate::model::{FaqField, FaqId};

/// `faq_{id}_{field}_{lang}`
pub fn field_key(id: FaqId, field: FaqField, lang: &str) -> String {
    format!("faq_{}_{}_{}", id, field.as_str(), lang)
}

/// `faq_list_{lang}`
pub fn list_key(lang: &str) -> String {
    format!("faq_list_{}", lang)
}

/// `faq_detail_{id}_{lang}`
pub fn detail_key(id: FaqId, lang: &str) -> String {
    format!("faq_detail_{}_{}", id, lang)
}
