// src/generator.rs

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::OwnedMutexGuard;

use crate::config::Config;
use crate::error::AppError;
use crate::models::content::GeneratedContent;
use crate::utils::locks::KeyedLocks;

/// Client for the hosted model that turns a lesson transcript into a
/// summary and a four-question quiz, via an OpenAI-compatible
/// `chat/completions` endpoint.
///
/// Holds the per-lesson in-flight lock table: callers take the lesson's
/// lock around cache-check + generate + store, so a duplicate request for
/// the same lesson awaits the first and reuses its stored result instead
/// of issuing a second model call. Requests for different lessons proceed
/// independently.
#[derive(Clone)]
pub struct ContentGenerator {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    timeout: Duration,
    in_flight: Arc<KeyedLocks<i64>>,
}

impl ContentGenerator {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            base_url: config.ai_base_url.trim_end_matches('/').to_string(),
            api_key: config.ai_api_key.clone(),
            model: config.ai_model.clone(),
            timeout: Duration::from_secs(config.ai_timeout_secs),
            in_flight: Arc::new(KeyedLocks::new()),
        }
    }

    /// Acquires the in-flight lock for a lesson. Hold the guard across the
    /// cache check and the store to get dedupe for free.
    pub async fn lock_lesson(&self, lesson_id: i64) -> OwnedMutexGuard<()> {
        self.in_flight.acquire(lesson_id).await
    }

    /// One-shot generation call. Every failure mode (transport error,
    /// timeout, non-success status, malformed or structurally invalid
    /// output) maps to `AppError::ContentGeneration` so the client can
    /// surface a retry affordance.
    pub async fn generate(
        &self,
        title: &str,
        transcript: &str,
    ) -> Result<GeneratedContent, AppError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            AppError::ContentGeneration(
                "Content generation is not configured (AI_API_KEY is unset)".to_string(),
            )
        })?;

        let payload = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user",
                content: build_prompt(title, transcript),
            }],
            temperature: 0.2,
        };

        tracing::info!("Generating content for lesson '{}'", title);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::ContentGeneration(format!("model request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::ContentGeneration(format!(
                "model endpoint returned status {}",
                response.status()
            )));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| AppError::ContentGeneration(format!("unreadable model response: {}", e)))?;

        let text = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AppError::ContentGeneration("model returned no content".to_string()))?;

        parse_content(&text)
    }
}

fn build_prompt(title: &str, transcript: &str) -> String {
    format!(
        r#"You are an expert instructional designer. Based on the provided video title and transcript, your task is to generate a concise summary and a multiple-choice quiz.

The summary should be 2-3 paragraphs long, capturing the key concepts and main points from the transcript.

The quiz must contain exactly 4 multiple-choice questions. Each question must have exactly 4 distinct options, one of which is the correct answer. The questions should test understanding of the core concepts presented in the transcript.

Respond with a single JSON object and nothing else, in exactly this shape:
{{"summary": "...", "quiz": [{{"question": "...", "options": ["...", "...", "...", "..."], "correctAnswer": "..."}}]}}

Video Title: {title}
Transcript:
{transcript}"#
    )
}

/// Parses raw model output into validated content. Models routinely wrap
/// JSON in markdown fences, so those are stripped first.
fn parse_content(raw: &str) -> Result<GeneratedContent, AppError> {
    let json = strip_code_fence(raw);
    let content: GeneratedContent = serde_json::from_str(json)
        .map_err(|e| AppError::ContentGeneration(format!("model returned malformed JSON: {}", e)))?;
    content.validate().map_err(AppError::ContentGeneration)?;
    Ok(content)
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening fence line.
    let rest = rest.split_once('\n').map(|(_, body)| body).unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}
