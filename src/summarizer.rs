//! Summary and title generation against a local Ollama instance.
//!
//! The pipeline talks to the service through the [`Summarize`] trait so the
//! generation backend can be swapped out (or stubbed in tests). The concrete
//! [`OllamaClient`] drives Ollama's `/api/generate` endpoint and will start
//! the server itself when the health probe cannot reach one.
//!
//! # Failure model
//!
//! Generation is best-effort. Every failure mode (service unreachable,
//! non-200 status, malformed body) logs a warning and yields `None`; the
//! caller persists the article without a summary rather than aborting the
//! batch.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::process::Stdio;
use std::time::{Duration as StdDuration, Instant};
use tokio::time::sleep;
use tracing::{info, instrument, warn};

use crate::config::GenerationConfig;
use crate::utils::clip_chars;

/// Articles longer than this are clipped before prompting, counted in
/// characters.
pub const SUMMARY_INPUT_MAX_CHARS: usize = 5000;

/// Trait for generating article summaries and titles.
///
/// Both operations are best-effort: `None` means generation failed and the
/// caller should carry on without the text.
pub trait Summarize {
    /// Produce a summary of the given article content.
    async fn summarize(&self, content: &str) -> Option<String>;

    /// Produce a title for a previously generated summary.
    async fn title(&self, summary: &str) -> Option<String>;
}

/// Client for a local Ollama server.
pub struct OllamaClient {
    http: Client,
    config: GenerationConfig,
}

impl OllamaClient {
    /// Build a client from the generation settings.
    ///
    /// No request timeout is set: completions on a cold model can take
    /// minutes. Only the health probe is bounded.
    pub fn new(config: GenerationConfig) -> anyhow::Result<Self> {
        let http = Client::builder().build()?;
        Ok(Self { http, config })
    }

    /// Probe the service and start it if the probe cannot connect.
    ///
    /// Returns whether the service is believed reachable. A reachable server
    /// answering non-200 is reported as-is without a spawn attempt.
    async fn ensure_running(&self) -> bool {
        let probe_url = format!("{}/api/tags", self.config.base_url);
        let probe = self
            .http
            .get(&probe_url)
            .timeout(StdDuration::from_secs(self.config.probe_timeout_secs))
            .send()
            .await;
        match probe {
            Ok(resp) => resp.status() == reqwest::StatusCode::OK,
            Err(_) => {
                let Some((program, args)) = self.config.spawn_command.split_first() else {
                    warn!("Generation service unreachable and no spawn command configured");
                    return false;
                };
                info!(command = %self.config.spawn_command.join(" "), "Starting generation service");
                match tokio::process::Command::new(program)
                    .args(args)
                    .stdout(Stdio::null())
                    .stderr(Stdio::null())
                    .spawn()
                {
                    Ok(_child) => {
                        // child handle dropped on purpose; the server outlives us
                        sleep(StdDuration::from_secs(self.config.settle_secs)).await;
                        true
                    }
                    Err(e) => {
                        warn!(error = %e, "Failed to start generation service");
                        false
                    }
                }
            }
        }
    }

    /// Run one completion and return the trimmed response text.
    async fn generate(&self, prompt: &str) -> Option<String> {
        let url = format!("{}/api/generate", self.config.base_url);
        let body = GenerateRequest {
            model: &self.config.model,
            prompt,
            stream: false,
        };
        let t0 = Instant::now();
        let resp = match self.http.post(&url).json(&body).send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!(error = %e, "Generation request failed");
                return None;
            }
        };
        if resp.status() != reqwest::StatusCode::OK {
            warn!(status = %resp.status(), "Generation service returned an error");
            return None;
        }
        match resp.json::<GenerateResponse>().await {
            Ok(parsed) => {
                info!(
                    elapsed_ms = t0.elapsed().as_millis() as u128,
                    "Completion received"
                );
                Some(parsed.response.trim().to_string())
            }
            Err(e) => {
                warn!(error = %e, "Generation response failed to parse");
                None
            }
        }
    }
}

impl Summarize for OllamaClient {
    #[instrument(level = "info", skip_all)]
    async fn summarize(&self, content: &str) -> Option<String> {
        self.ensure_running().await;
        let clipped = clip_chars(content, SUMMARY_INPUT_MAX_CHARS);
        self.generate(&summary_prompt(clipped)).await
    }

    #[instrument(level = "info", skip_all)]
    async fn title(&self, summary: &str) -> Option<String> {
        self.ensure_running().await;
        let raw = self.generate(&title_prompt(summary)).await?;
        Some(raw.replace('"', ""))
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

pub(crate) fn summary_prompt(content: &str) -> String {
    format!(
        "You are a professional ESG analyst. Write a detailed half-page summary (at least 300 words) based on the following ESG report content.\n\
         \n\
         Focus on:\n\
         - Environmental protection efforts\n\
         - Indoor air quality and emissions reduction\n\
         - Energy efficiency and HVAC improvements\n\
         - Corporate sustainability goals and progress\n\
         \n\
         Do not ask questions or introduce yourself. Just provide a well-structured, concise but rich summary using paragraphs.\n\
         \n\
         --- BEGIN REPORT ---\n\
         {content}\n\
         --- END REPORT ---"
    )
}

pub(crate) fn title_prompt(summary: &str) -> String {
    format!(
        "Based on the following ESG summary, write a concise, informative, and SEO-friendly title (10 words max).\n\
         Do not include quotes or your own commentary.\n\
         \n\
         --- SUMMARY ---\n\
         {summary}\n\
         --- END ---"
    )
}

/// Canned generation backend for pipeline tests.
#[cfg(test)]
pub struct StubSummarizer {
    pub summary: Option<String>,
    pub title: Option<String>,
}

#[cfg(test)]
impl Summarize for StubSummarizer {
    async fn summarize(&self, _content: &str) -> Option<String> {
        self.summary.clone()
    }

    async fn title(&self, _summary: &str) -> Option<String> {
        self.title.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_prompt_frames_content() {
        let prompt = summary_prompt("Acme cut scope 2 emissions.");
        assert!(prompt.starts_with("You are a professional ESG analyst."));
        assert!(prompt.contains("- Indoor air quality and emissions reduction"));
        assert!(prompt.contains("- Energy efficiency and HVAC improvements"));
        assert!(prompt.contains("--- BEGIN REPORT ---\nAcme cut scope 2 emissions.\n--- END REPORT ---"));
    }

    #[test]
    fn test_title_prompt_frames_summary() {
        let prompt = title_prompt("Acme improved HVAC across campuses.");
        assert!(prompt.contains("(10 words max)"));
        assert!(prompt.contains("--- SUMMARY ---\nAcme improved HVAC across campuses.\n--- END ---"));
    }

    #[test]
    fn test_generate_response_defaults_missing_field() {
        let parsed: GenerateResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed.response, "");
        let parsed: GenerateResponse =
            serde_json::from_str(r#"{"response": " text ", "done": true}"#).unwrap();
        assert_eq!(parsed.response, " text ");
    }
}
