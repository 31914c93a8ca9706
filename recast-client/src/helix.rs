//! Helix reporting system client
//!
//! Helix authenticates with a JWT obtained from a login endpoint and stores
//! records as entries of named forms. Test results are written to one form;
//! recordings awaiting conversion are read from another.

use std::path::Path;

use recast_core::domain::job::safe_file_stem;
use recast_core::dto::report::{EntryPayload, RecordingEntries, RecordingEntryValues};
use reqwest::Client;
use serde::Serialize;

use crate::check_status;
use crate::error::{ClientError, Result};

/// Connection settings for Helix
#[derive(Debug, Clone)]
pub struct HelixConfig {
    pub url: String,
    pub user: String,
    pub password: String,
    /// Form receiving test results
    pub results_form: Option<String>,
    /// Form holding stored recordings
    pub recording_form: Option<String>,
}

impl HelixConfig {
    /// Load settings from `HELIX_*` environment variables
    ///
    /// `HELIX_URL`, `HELIX_USER` and `HELIX_PASS` are required; the form
    /// names are checked by the operation that needs them.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings through an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let missing: Vec<&str> = ["HELIX_URL", "HELIX_USER", "HELIX_PASS"]
            .into_iter()
            .filter(|key| get(key).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(ClientError::MissingConfig(missing.join(", ")));
        }

        Ok(Self {
            url: get("HELIX_URL")
                .unwrap_or_default()
                .trim_end_matches('/')
                .to_string(),
            user: get("HELIX_USER").unwrap_or_default(),
            password: get("HELIX_PASS").unwrap_or_default(),
            results_form: get("HELIX_FORM"),
            recording_form: get("HELIX_RECORDING_FORM"),
        })
    }
}

/// HTTP client for Helix
#[derive(Debug, Clone)]
pub struct HelixClient {
    config: HelixConfig,
    client: Client,
}

impl HelixClient {
    pub fn new(config: HelixConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    pub fn config(&self) -> &HelixConfig {
        &self.config
    }

    /// Log in and return the JWT
    ///
    /// The token is the raw response body.
    pub async fn login(&self) -> Result<String> {
        let url = format!("{}/api/jwt/login", self.config.url);
        let response = self
            .client
            .post(&url)
            .query(&[
                ("username", self.config.user.as_str()),
                ("password", self.config.password.as_str()),
            ])
            .send()
            .await?;

        let token = check_status(response).await?.text().await?;
        tracing::info!("Logged in to Helix at {}", self.config.url);
        Ok(token)
    }

    /// Create one entry in `form`
    pub async fn post_entry<T: Serialize>(
        &self,
        token: &str,
        form: &str,
        payload: &EntryPayload<T>,
    ) -> Result<()> {
        let url = format!("{}/api/arsys/v1/entry/{}", self.config.url, form);
        let response = self
            .client
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, format!("AR-JWT {}", token))
            .json(payload)
            .send()
            .await?;

        check_status(response).await?;
        Ok(())
    }

    /// List the entries of the recording form
    pub async fn fetch_recordings(
        &self,
        token: &str,
    ) -> Result<Vec<EntryPayload<RecordingEntryValues>>> {
        let form = self
            .config
            .recording_form
            .as_deref()
            .ok_or_else(|| ClientError::MissingConfig("HELIX_RECORDING_FORM".to_string()))?;

        let url = format!("{}/api/arsys/v1/entry/{}", self.config.url, form);
        let response = self
            .client
            .get(&url)
            .header(reqwest::header::AUTHORIZATION, format!("AR-JWT {}", token))
            .send()
            .await?;

        let entries: RecordingEntries = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse entries: {}", e)))?;
        Ok(entries.entries)
    }
}

/// Write fetched recordings into `dir` as pretty-printed JSON
///
/// Each file is named after the sanitized test name, falling back to
/// `recording_<n>` where `n` counts the recordings saved so far. Entries
/// without a recording, or whose recording is not valid JSON, are skipped.
///
/// # Returns
/// The number of recordings written
pub fn save_recordings(entries: &[EntryPayload<RecordingEntryValues>], dir: &Path) -> Result<usize> {
    std::fs::create_dir_all(dir).map_err(|e| ClientError::io(dir, e))?;

    let mut saved = 0;
    for entry in entries {
        let Some(raw) = entry.values.recording.as_deref() else {
            tracing::warn!("Skipping entry without a recording");
            continue;
        };

        let document: serde_json::Value = match serde_json::from_str(raw) {
            Ok(document) => document,
            Err(e) => {
                tracing::warn!("Skipping entry with an unreadable recording: {}", e);
                continue;
            }
        };

        let name = entry
            .values
            .test_name
            .clone()
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| format!("recording_{}", saved + 1));
        let path = dir.join(format!("{}.json", safe_file_stem(&name)));

        let pretty = serde_json::to_string_pretty(&document)
            .map_err(|e| ClientError::ParseError(e.to_string()))?;
        std::fs::write(&path, pretty).map_err(|e| ClientError::io(&path, e))?;

        tracing::info!("Saved recording to {}", path.display());
        saved += 1;
    }

    Ok(saved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::json;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn config(url: &str) -> HelixConfig {
        HelixConfig {
            url: url.to_string(),
            user: "bot".to_string(),
            password: "secret".to_string(),
            results_form: Some("TestResults".to_string()),
            recording_form: Some("Recordings".to_string()),
        }
    }

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn fake_helix() -> Router {
        Router::new()
            .route(
                "/api/jwt/login",
                post(|Query(params): Query<HashMap<String, String>>| async move {
                    if params.get("username").map(String::as_str) == Some("bot")
                        && params.get("password").map(String::as_str) == Some("secret")
                    {
                        (StatusCode::OK, "token-123".to_string())
                    } else {
                        (StatusCode::UNAUTHORIZED, "bad credentials".to_string())
                    }
                }),
            )
            .route(
                "/api/arsys/v1/entry/Recordings",
                get(|headers: HeaderMap| async move {
                    let auth = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_string();
                    if auth != "AR-JWT token-123" {
                        return (StatusCode::UNAUTHORIZED, Json(json!({})));
                    }
                    (
                        StatusCode::OK,
                        Json(json!({ "entries": [
                            { "values": { "TestName": "Login Flow", "Recording": "{\"steps\":[]}" } }
                        ] })),
                    )
                }),
            )
    }

    #[test]
    fn test_config_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("HELIX_URL", "https://helix.example.com/"),
            ("HELIX_USER", "bot"),
            ("HELIX_PASS", "secret"),
            ("HELIX_FORM", "TestResults"),
        ]
        .into_iter()
        .collect();

        let config = HelixConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap();
        assert_eq!(config.url, "https://helix.example.com");
        assert_eq!(config.results_form.as_deref(), Some("TestResults"));
        assert!(config.recording_form.is_none());
    }

    #[test]
    fn test_config_reports_missing_variables() {
        let err = HelixConfig::from_lookup(|key| {
            (key == "HELIX_URL").then(|| "https://helix.example.com".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, ClientError::MissingConfig(ref m) if m == "HELIX_USER, HELIX_PASS"));
    }

    #[tokio::test]
    async fn test_login_returns_body_as_token() {
        let url = serve(fake_helix()).await;
        let client = HelixClient::new(config(&url));
        assert_eq!(client.login().await.unwrap(), "token-123");

        let mut wrong = config(&url);
        wrong.password = "nope".to_string();
        let err = HelixClient::new(wrong).login().await.unwrap_err();
        assert!(matches!(err, ClientError::ApiError { status: 401, .. }));
    }

    #[tokio::test]
    async fn test_fetch_and_save_recordings() {
        let url = serve(fake_helix()).await;
        let client = HelixClient::new(config(&url));
        let token = client.login().await.unwrap();

        let entries = client.fetch_recordings(&token).await.unwrap();
        assert_eq!(entries.len(), 1);

        let dir = TempDir::new().unwrap();
        let saved = save_recordings(&entries, dir.path()).unwrap();
        assert_eq!(saved, 1);
        let content = std::fs::read_to_string(dir.path().join("login_flow.json")).unwrap();
        assert_eq!(serde_json::from_str::<serde_json::Value>(&content).unwrap(), json!({ "steps": [] }));
    }

    #[test]
    fn test_save_recordings_skips_and_names_fallbacks() {
        let dir = TempDir::new().unwrap();
        let entries = vec![
            EntryPayload {
                values: RecordingEntryValues {
                    test_name: Some("No recording".to_string()),
                    recording: None,
                },
            },
            EntryPayload {
                values: RecordingEntryValues {
                    test_name: None,
                    recording: Some("{\"title\":\"x\"}".to_string()),
                },
            },
            EntryPayload {
                values: RecordingEntryValues {
                    test_name: Some("Broken".to_string()),
                    recording: Some("{ nope".to_string()),
                },
            },
        ];

        assert_eq!(save_recordings(&entries, dir.path()).unwrap(), 1);
        assert!(dir.path().join("recording_1.json").exists());
        assert!(!dir.path().join("broken.json").exists());
    }
}
