//! Reply translation
//!
//! Translation never blocks speech: a failed call is logged and the source
//! text is spoken as-is.

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use crate::voice::GoogleAuth;
use crate::{Error, Result};

/// Public Google Cloud Translation endpoint
pub const GOOGLE_TRANSLATE_ENDPOINT: &str = "https://translation.googleapis.com";

/// A text translation backend
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text` into `target_language` (ISO 639-1, e.g. `hi`)
    async fn translate(&self, text: &str, target_language: &str) -> Result<String>;
}

/// Language subtag of a BCP 47 locale (`hi-IN` → `hi`)
#[must_use]
pub fn language_of(locale: &str) -> &str {
    locale.split(['-', '_']).next().unwrap_or(locale)
}

/// Translate, falling back to the original text on any failure
pub async fn translate_or_passthrough(
    translator: &dyn Translator,
    text: &str,
    target_language: &str,
) -> String {
    if text.trim().is_empty() {
        return text.to_string();
    }

    match translator.translate(text, target_language).await {
        Ok(translated) => {
            tracing::debug!(target_language, "translated reply");
            translated
        }
        Err(e) => {
            tracing::warn!(error = %e, target_language, "translation failed, using original text");
            text.to_string()
        }
    }
}

/// Google Cloud Translation v3 REST backend
pub struct GoogleTranslator {
    client: reqwest::Client,
    endpoint: String,
    project: String,
    auth: GoogleAuth,
}

impl GoogleTranslator {
    /// Create a translator for a Google Cloud project
    ///
    /// # Errors
    ///
    /// Returns error if the project is empty
    pub fn new(project: impl Into<String>, auth: GoogleAuth) -> Result<Self> {
        Self::with_endpoint(project, auth, GOOGLE_TRANSLATE_ENDPOINT)
    }

    /// Create a translator for a custom endpoint
    ///
    /// # Errors
    ///
    /// Returns error if the project is empty
    pub fn with_endpoint(
        project: impl Into<String>,
        auth: GoogleAuth,
        endpoint: impl Into<String>,
    ) -> Result<Self> {
        let project = project.into();
        if project.is_empty() {
            return Err(Error::Config(
                "Google Cloud project required for translation".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            project,
            auth,
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TranslateRequest<'a> {
    contents: [&'a str; 1],
    target_language_code: &'a str,
    mime_type: &'static str,
}

#[derive(Deserialize)]
struct TranslateResponse {
    #[serde(default)]
    translations: Vec<Translation>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Translation {
    translated_text: String,
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn translate(&self, text: &str, target_language: &str) -> Result<String> {
        let url = format!(
            "{}/v3/projects/{}/locations/global:translateText",
            self.endpoint, self.project
        );

        let request = TranslateRequest {
            contents: [text],
            target_language_code: target_language,
            mime_type: "text/plain",
        };

        let builder = self.client.post(&url).json(&request);
        let builder = match &self.auth {
            GoogleAuth::ApiKey(key) => builder.header("x-goog-api-key", key.expose_secret()),
            GoogleAuth::Bearer(token) => builder.bearer_auth(token.expose_secret()),
        };

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Translation(format!("Google Translate error {status}: {body}")));
        }

        let result: TranslateResponse = response.json().await?;
        result
            .translations
            .into_iter()
            .next()
            .map(|t| t.translated_text)
            .ok_or_else(|| Error::Translation("empty translation response".to_string()))
    }
}
