use crate::config::Config;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Body of `POST /api/ask`.
///
/// The first round-trip carries only the query (plus images); the follow-up
/// adds `clarifications`, index-aligned with the questions the server asked.
/// `image_base64` is the legacy single-image field and always mirrors the
/// first entry of `images_base64`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AskRequest {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clarifications: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_base64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images_base64: Option<Vec<String>>,
}

impl AskRequest {
    pub fn initial(query: impl Into<String>, images: Vec<String>) -> Self {
        let mut request = Self {
            query: query.into(),
            clarifications: None,
            image_base64: None,
            images_base64: None,
        };
        request.attach_images(images);
        request
    }

    pub fn clarified(
        query: impl Into<String>,
        clarifications: Vec<String>,
        images: Vec<String>,
    ) -> Self {
        let mut request = Self::initial(query, images);
        request.clarifications = Some(clarifications);
        request
    }

    fn attach_images(&mut self, images: Vec<String>) {
        if images.is_empty() {
            return;
        }
        self.image_base64 = images.first().cloned();
        self.images_base64 = Some(images);
    }

    pub fn image_count(&self) -> usize {
        self.images_base64.as_ref().map_or(0, Vec::len)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AskResponse {
    #[serde(default)]
    pub need_clarification: bool,
    #[serde(default)]
    pub clarification_questions: Option<Vec<String>>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub judge: Option<bool>,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Error)]
pub enum AskError {
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server responded with HTTP {status}")]
    Status { status: StatusCode },
}

impl AskError {
    /// Text shown in the answer area in place of an answer.
    pub fn user_message(&self) -> String {
        match self {
            Self::Status { status } => {
                format!("Error: the server responded with HTTP {status}. Please try again.")
            }
            Self::Http(err) if err.is_timeout() => {
                "Error: the request timed out. Please try again.".to_string()
            }
            Self::Http(err) if err.is_decode() => {
                format!("Error: the server sent an unreadable response ({err}).")
            }
            Self::Http(err) => format!("Error: could not reach the server ({err})."),
            Self::ClientBuild(err) => format!("Error: HTTP client unavailable ({err})."),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AskClient {
    http: reqwest::Client,
    url: String,
}

impl AskClient {
    pub fn new(config: &Config) -> Result<Self, AskError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(AskError::ClientBuild)?;

        Ok(Self {
            http,
            url: config.ask_url(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn ask(&self, request: &AskRequest) -> Result<AskResponse, AskError> {
        let response = self.http.post(&self.url).json(request).send().await?;
        let status = response.status();
        debug!(%status, "ask endpoint responded");
        if !status.is_success() {
            return Err(AskError::Status { status });
        }
        Ok(response.json::<AskResponse>().await?)
    }
}
