use std::env;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;

use lesson_core::model::{LessonId, StageId};

use super::{HintProvider, HintResponse, MoveValidator, ValidationRequest, Verdict};
use crate::error::RemoteError;

#[derive(Clone, Debug)]
pub struct RemoteConfig {
    pub base_url: String,
    pub api_token: Option<String>,
}

impl RemoteConfig {
    /// Reads `LESSONS_API_URL` and `LESSONS_API_TOKEN`; `None` without a URL.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let base_url = env::var("LESSONS_API_URL").ok()?;
        if base_url.trim().is_empty() {
            return None;
        }
        let api_token = env::var("LESSONS_API_TOKEN")
            .ok()
            .filter(|token| !token.trim().is_empty());
        Some(Self {
            base_url: base_url.trim().to_owned(),
            api_token,
        })
    }
}

/// Move validation and hints over the lesson HTTP API.
#[derive(Clone)]
pub struct HttpLessonApi {
    client: Client,
    config: Option<RemoteConfig>,
}

impl HttpLessonApi {
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(RemoteConfig::from_env())
    }

    #[must_use]
    pub fn new(config: Option<RemoteConfig>) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.is_some()
    }

    fn stage_url(
        &self,
        lesson_id: LessonId,
        stage_id: StageId,
        tail: &str,
    ) -> Result<(String, &RemoteConfig), RemoteError> {
        let config = self.config.as_ref().ok_or(RemoteError::Disabled)?;
        let url = format!(
            "{}/lessons/{lesson_id}/stages/{stage_id}/{tail}",
            config.base_url.trim_end_matches('/')
        );
        Ok((url, config))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ValidatePayload<'a> {
    notation: &'a str,
    position: &'a str,
    elapsed_seconds: u64,
}

#[async_trait]
impl MoveValidator for HttpLessonApi {
    async fn validate(&self, request: &ValidationRequest) -> Result<Verdict, RemoteError> {
        let (url, config) = self.stage_url(request.lesson_id, request.stage_id, "validate")?;
        let payload = ValidatePayload {
            notation: &request.notation,
            position: &request.resulting_position,
            elapsed_seconds: request.elapsed_seconds,
        };

        let mut builder = self.client.post(url).json(&payload);
        if let Some(token) = &config.api_token {
            builder = builder.bearer_auth(token);
        }
        let response = builder.send().await?;

        if !response.status().is_success() {
            return Err(RemoteError::HttpStatus(response.status()));
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl HintProvider for HttpLessonApi {
    async fn next_hint(
        &self,
        lesson_id: LessonId,
        stage_id: StageId,
        index: usize,
    ) -> Result<Option<HintResponse>, RemoteError> {
        let (url, config) = self.stage_url(lesson_id, stage_id, &format!("hints/{index}"))?;

        let mut builder = self.client.get(url);
        if let Some(token) = &config.api_token {
            builder = builder.bearer_auth(token);
        }
        let response = builder.send().await?;

        match response.status() {
            StatusCode::NOT_FOUND | StatusCode::NO_CONTENT => Ok(None),
            status if status.is_success() => Ok(Some(response.json().await?)),
            status => Err(RemoteError::HttpStatus(status)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_client_refuses_calls() {
        let api = HttpLessonApi::new(None);
        assert!(!api.enabled());
        let request = ValidationRequest {
            lesson_id: LessonId::new(1),
            stage_id: StageId::new(1),
            notation: "e2e4".into(),
            resulting_position: String::new(),
            elapsed_seconds: 3,
        };
        assert!(matches!(
            api.validate(&request).await,
            Err(RemoteError::Disabled)
        ));
        assert!(matches!(
            api.next_hint(LessonId::new(1), StageId::new(1), 0).await,
            Err(RemoteError::Disabled)
        ));
    }

    #[test]
    fn stage_urls_trim_trailing_slash() {
        let api = HttpLessonApi::new(Some(RemoteConfig {
            base_url: "https://lessons.example/api/".into(),
            api_token: None,
        }));
        let (url, _) = api
            .stage_url(LessonId::new(4), StageId::new(9), "hints/2")
            .unwrap();
        assert_eq!(url, "https://lessons.example/api/lessons/4/stages/9/hints/2");
    }

    #[test]
    fn verdict_parses_camel_case() {
        let verdict: Verdict = serde_json::from_str(
            r#"{"success":false,"feedbackType":"warning","feedbackMessage":"Close"}"#,
        )
        .unwrap();
        assert!(!verdict.success);
        assert_eq!(verdict.feedback_type, "warning");

        let hint: HintResponse = serde_json::from_str(r#"{"hint":"Look at f7"}"#).unwrap();
        assert_eq!(hint.text, "Look at f7");
        assert_eq!(hint.next_index, None);
    }
}
