//! Internationalization (i18n) module for multi-language support.
//!
//! # Architecture
//!
//! - `registry`: Single source of truth for all supported languages and their metadata
//! - `language`: Type-safe Language type validated against the registry
//! - `validator`: Translation quality validation
//! - `metrics`: Cache and translation counters
//!
//! # Example
//!
//! ```rust,ignore
//! use faq_service::i18n::Language;
//!
//! // Strict: configuration and admin input
//! let hindi = Language::from_code("hi")?;
//!
//! // Lenient: query parameters, unknown codes become English
//! let requested = Language::resolve(Some("fr"));
//! assert!(requested.is_canonical());
//! ```

mod language;
mod metrics;
mod registry;
mod validator;

pub use language::Language;
pub use metrics::{MetricsReport, TranslationMetrics};
pub use registry::{LanguageConfig, LanguageRegistry};
pub use validator::{TranslationValidator, ValidationReport};
