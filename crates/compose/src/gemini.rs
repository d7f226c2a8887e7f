//! Minimal client for the Gemini `generateContent` endpoint.

use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const GENERATE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash-lite-preview-06-17:generateContent";

const TEMPERATURE: f32 = 0.0;
const MAX_OUTPUT_TOKENS: u32 = 500;
const TOP_P: f32 = 0.1;
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(StatusCode),
    #[error("no candidates in response")]
    NoCandidates,
    #[error("completion truncated at the token limit")]
    Truncated,
    #[error("candidate carried no text content")]
    NoContent,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
    #[serde(rename = "topP")]
    top_p: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Send one prompt and return the raw completion text.
pub(crate) async fn generate(
    client: &reqwest::Client,
    api_key: &str,
    prompt: &str,
) -> Result<String, GeminiError> {
    let body = GenerateRequest {
        contents: vec![Content {
            parts: vec![Part { text: prompt }],
        }],
        generation_config: GenerationConfig {
            temperature: TEMPERATURE,
            max_output_tokens: MAX_OUTPUT_TOKENS,
            top_p: TOP_P,
        },
    };

    let response = client
        .post(GENERATE_URL)
        .header("x-goog-api-key", api_key)
        .timeout(HTTP_TIMEOUT)
        .json(&body)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(GeminiError::Status(status));
    }

    let parsed: GenerateResponse = response.json().await?;
    extract_completion(parsed)
}

fn extract_completion(response: GenerateResponse) -> Result<String, GeminiError> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or(GeminiError::NoCandidates)?;

    if candidate.finish_reason.as_deref() == Some("MAX_TOKENS") {
        return Err(GeminiError::Truncated);
    }

    candidate
        .content
        .and_then(|content| content.parts.into_iter().next())
        .and_then(|part| part.text)
        .ok_or(GeminiError::NoContent)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> GenerateResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn extracts_the_first_candidate_text() {
        let response = parse(
            r#"{"candidates":[{"finishReason":"STOP","content":{"parts":[{"text":"Line1: A\nLine2: B"}]}}]}"#,
        );
        assert_eq!(extract_completion(response).unwrap(), "Line1: A\nLine2: B");
    }

    #[test]
    fn empty_candidate_list_is_an_error() {
        let response = parse(r#"{"candidates":[]}"#);
        assert!(matches!(
            extract_completion(response),
            Err(GeminiError::NoCandidates)
        ));
    }

    #[test]
    fn truncated_completions_are_rejected() {
        let response = parse(
            r#"{"candidates":[{"finishReason":"MAX_TOKENS","content":{"parts":[{"text":"partial"}]}}]}"#,
        );
        assert!(matches!(
            extract_completion(response),
            Err(GeminiError::Truncated)
        ));
    }

    #[test]
    fn candidate_without_parts_is_an_error() {
        let response = parse(r#"{"candidates":[{"finishReason":"STOP","content":{"parts":[]}}]}"#);
        assert!(matches!(
            extract_completion(response),
            Err(GeminiError::NoContent)
        ));
    }
}
