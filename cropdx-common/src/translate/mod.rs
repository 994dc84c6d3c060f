//! English → Kinyarwanda translation of disease text
//!
//! Translation never fails from the caller's point of view: whatever
//! cannot be translated comes back unchanged.

mod http;
pub mod phrases;

pub use http::{HttpTranslator, TranslateError};

use crate::config::{TranslationBackend, TranslationConfig};
use crate::db::models::Disease;
use crate::{Error, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Text translation backend
#[async_trait]
pub trait Translator: Send + Sync {
    /// Short backend name for logs and health output
    fn name(&self) -> &'static str;

    /// Translate `text`; returns the input unchanged when no translation exists
    async fn translate(&self, text: &str, source: &str, target: &str) -> String;
}

/// Phrase-table translator
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticTranslator;

#[async_trait]
impl Translator for StaticTranslator {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn translate(&self, text: &str, source: &str, target: &str) -> String {
        if source == "en" && target == "rw" {
            if let Some(translated) = phrases::lookup(text) {
                return translated.to_string();
            }
        }
        text.to_string()
    }
}

/// Translated copy of a disease's text fields
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiseaseTranslation {
    pub name_rw: String,
    pub description_rw: String,
    pub treatment_rw: String,
    pub care_tips_rw: String,
}

/// Translate the four user-facing fields of a disease concurrently
pub async fn translate_disease(
    translator: &dyn Translator,
    disease: &Disease,
    source: &str,
    target: &str,
) -> DiseaseTranslation {
    let (name_rw, description_rw, treatment_rw, care_tips_rw) = tokio::join!(
        translator.translate(&disease.name, source, target),
        translator.translate(&disease.description, source, target),
        translator.translate(&disease.treatment, source, target),
        translator.translate(&disease.care_tips, source, target),
    );

    DiseaseTranslation {
        name_rw,
        description_rw,
        treatment_rw,
        care_tips_rw,
    }
}

/// Construct the configured backend
pub fn build_translator(config: &TranslationConfig) -> Result<Arc<dyn Translator>> {
    match config.backend {
        TranslationBackend::Static => Ok(Arc::new(StaticTranslator)),
        TranslationBackend::Http => {
            let base_url = config
                .base_url
                .as_deref()
                .filter(|url| !url.is_empty())
                .ok_or_else(|| Error::Config("translation.base_url is not set".to_string()))?;
            let translator = HttpTranslator::new(
                base_url,
                config.api_key.clone(),
                Duration::from_millis(config.timeout_ms),
            )?;
            Ok(Arc::new(translator))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::catalog::default_catalog;

    #[tokio::test]
    async fn test_static_covers_default_catalog() {
        let translator = StaticTranslator;
        for entry in default_catalog() {
            for text in [&entry.name, &entry.description, &entry.treatment, &entry.care_tips] {
                let translated = translator.translate(text, "en", "rw").await;
                assert_ne!(&translated, text, "no translation for {:?}", text);
            }
        }
    }

    #[tokio::test]
    async fn test_static_passthrough() {
        let translator = StaticTranslator;
        assert_eq!(translator.translate("Cassava Mosaic", "en", "rw").await, "Cassava Mosaic");
        // Other language pairs are not in the table
        assert_eq!(translator.translate("Maize Leaf Blight", "en", "fr").await, "Maize Leaf Blight");
    }

    #[tokio::test]
    async fn test_translate_disease_fields() {
        let disease = Disease {
            id: 1,
            name: "Banana Bacterial Wilt".to_string(),
            species: "Banana".to_string(),
            description: "Bacterial disease causing wilting and yellowing.".to_string(),
            treatment: "Something new".to_string(),
            healthy_image_url: String::new(),
            care_tips: String::new(),
        };

        let translation = translate_disease(&StaticTranslator, &disease, "en", "rw").await;
        assert_eq!(translation.name_rw, "Indwara ya Banana yo kurwara kuri Bacteria");
        assert!(translation.description_rw.starts_with("Indwara ya Bacteria"));
        assert_eq!(translation.treatment_rw, "Something new");
        assert_eq!(translation.care_tips_rw, "");
    }

    #[test]
    fn test_build_translator_backends() {
        let config = TranslationConfig::default();
        assert_eq!(build_translator(&config).unwrap().name(), "static");

        let http = TranslationConfig {
            backend: TranslationBackend::Http,
            base_url: Some("http://127.0.0.1:5000".to_string()),
            ..Default::default()
        };
        assert_eq!(build_translator(&http).unwrap().name(), "http");

        let missing_url = TranslationConfig {
            backend: TranslationBackend::Http,
            ..Default::default()
        };
        assert!(build_translator(&missing_url).is_err());
    }
}
