use std::{env, thread, time::Duration};

use rand::{thread_rng, Rng};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{LocalizeError, Result, TransformError};

const MAX_RETRIES: usize = 3;
const BASE_DELAY_MS: u64 = 800;
const TIMEOUT_SECS: u64 = 60;

const MISSING_API_KEY: &str = "Please register yourself as a developer at deepl.com \
and add the api key to the DEEPL_API_KEY environment variable";

/// Remote text translation, one string per call.
pub trait TranslationService: Send + Sync {
    fn translate(&self, text: &str) -> std::result::Result<String, TransformError>;
}

#[derive(Debug, Clone)]
pub struct DeeplConfig {
    pub api_key: String,
    pub uri: String,
    pub source_lang: String,
    pub target_lang: String,
}

impl DeeplConfig {
    /// Reads `DEEPL_API_KEY` and `DEEPL_URI`.
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("DEEPL_API_KEY")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| LocalizeError::Config(MISSING_API_KEY.into()))?;
        let uri = env::var("DEEPL_URI")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| LocalizeError::Config("set the DEEPL_URI environment variable".into()))?;

        Ok(Self {
            api_key,
            uri,
            source_lang: "RU".into(),
            target_lang: "EN-US".into(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct DeeplResponse {
    translations: Vec<DeeplTranslation>,
}

#[derive(Debug, Deserialize)]
struct DeeplTranslation {
    text: String,
}

pub struct DeeplClient {
    client: Client,
    cfg: DeeplConfig,
}

impl DeeplClient {
    pub fn new(cfg: DeeplConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .build()
            .map_err(|e| LocalizeError::Config(format!("failed to build http client: {e}")))?;

        Ok(Self { client, cfg })
    }

    fn send_once(&self, text: &str) -> std::result::Result<(StatusCode, String), reqwest::Error> {
        let form = [
            ("text", text),
            ("target_lang", self.cfg.target_lang.as_str()),
            ("source_lang", self.cfg.source_lang.as_str()),
            ("tag_handling", "xml"),
        ];

        let resp = self
            .client
            .post(&self.cfg.uri)
            .header(
                reqwest::header::AUTHORIZATION,
                format!("DeepL-Auth-Key {}", self.cfg.api_key),
            )
            .form(&form)
            .send()?;

        let status = resp.status();
        let body = resp.text()?;
        Ok((status, body))
    }
}

impl TranslationService for DeeplClient {
    fn translate(&self, text: &str) -> std::result::Result<String, TransformError> {
        let mut last_err = TransformError::Http("no attempt made".into());

        for attempt in 0..MAX_RETRIES {
            let last_attempt = attempt + 1 == MAX_RETRIES;

            match self.send_once(text) {
                Ok((status, body)) if status.is_success() => return parse_response(&body),
                Ok((status, body)) => {
                    last_err = TransformError::TranslationService {
                        status: status.as_u16(),
                        body,
                    };
                    if !should_retry_http(status) || last_attempt {
                        break;
                    }
                }
                Err(err) => {
                    last_err = TransformError::Http(err.to_string());
                    if last_attempt {
                        break;
                    }
                }
            }

            warn!(attempt = attempt + 1, error = %last_err, "translation request failed, retrying");
            thread::sleep(backoff(attempt));
        }

        Err(last_err)
    }
}

/// The service may split one text into several sentences; they are joined back.
fn parse_response(body: &str) -> std::result::Result<String, TransformError> {
    let parsed: DeeplResponse =
        serde_json::from_str(body).map_err(|e| TransformError::InvalidResponse(e.to_string()))?;

    debug!(parts = parsed.translations.len(), "translation received");

    let texts: Vec<String> = parsed.translations.into_iter().map(|t| t.text).collect();
    Ok(texts.join(" "))
}

fn backoff(attempt: usize) -> Duration {
    let jitter: u64 = thread_rng().gen_range(0..200);
    let ms = BASE_DELAY_MS * (2_u64.pow(attempt as u32)) + jitter;
    Duration::from_millis(ms)
}

fn should_retry_http(status: StatusCode) -> bool {
    status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
        || status.is_server_error()
}
