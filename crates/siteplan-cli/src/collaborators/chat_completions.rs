//! Language model client for OpenAI-compatible `/chat/completions` APIs.
//!
//! One client serves as insight generator, plan generator and task
//! evaluator. Each call sends the relevant records as JSON and asks for a
//! single JSON object back, which is parsed into the core payload types.
//! Validation of the parsed payloads is left to the engine.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;
use siteplan_core::{
    AnalysisReport, CollaboratorError, GeneratedPlan, InsightGenerator, PlanGenerator, Snapshot,
    Task, TaskEvaluator, Verdict,
};

const SYSTEM_PROMPT: &str = "You are an experienced website auditor covering SEO, performance, \
accessibility, content and conversion. You answer with exactly one JSON object and nothing else.";

const ANALYSIS_INSTRUCTIONS: &str = r#"Audit the web page described by the snapshot below.
Reply with a JSON object of this shape:
{"overall_score": 0-100,
 "category_scores": {"<category>": 0-100, ...},
 "findings": [{"category": "...", "severity": "low|medium|high|critical", "title": "...", "detail": "..."}],
 "summary": "..."}"#;

const PLAN_INSTRUCTIONS: &str = r#"Turn the audit below into an ordered action plan, most valuable work first.
Reply with a JSON object of this shape:
{"summary": "...",
 "timeline": "...",
 "quick_wins": ["..."],
 "tasks": [{"category": "...", "priority": "low|medium|high", "effort": "low|medium|high",
            "impact": "low|medium|high", "title": "...", "description": "...", "estimated_time": "..."}]}"#;

const EVALUATION_INSTRUCTIONS: &str = r#"Decide whether the task below has been done, judging only from the fresh snapshot of the site.
Reply with a JSON object of this shape:
{"outcome": "resolved|still_open|inconclusive",
 "detail": "...",
 "evidence": ["..."]}"#;

/// Connection settings for the chat completions endpoint.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

pub struct ChatCompletionsGenerator {
    client: Client,
    api_key: String,
    model: String,
    endpoint: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    #[serde(default)]
    total_tokens: u64,
}

/// Task fields the evaluator needs, without bookkeeping columns.
#[derive(Serialize)]
struct TaskBrief<'a> {
    category: &'a str,
    title: &'a str,
    description: &'a str,
    notes: Option<&'a str>,
}

impl ChatCompletionsGenerator {
    pub fn new(config: ChatConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            api_key: config.api_key,
            model: config.model,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
        })
    }

    async fn complete_json<T: DeserializeOwned>(
        &self,
        instructions: &str,
        sections: &[(&str, String)],
    ) -> Result<T, CollaboratorError> {
        let mut prompt = instructions.to_string();
        for (heading, body) in sections {
            prompt.push_str(&format!("\n\n{heading}:\n{body}"));
        }

        let request = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": prompt }
            ],
            "temperature": 0.2,
            "response_format": { "type": "json_object" }
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CollaboratorError::Failed(format!(
                "model API returned {status}: {}",
                body.chars().take(300).collect::<String>()
            )));
        }

        let reply: ChatResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                CollaboratorError::Timeout
            } else {
                CollaboratorError::Malformed(e.to_string())
            }
        })?;
        if let Some(usage) = &reply.usage {
            debug!("Model {} used {} tokens", self.model, usage.total_tokens);
        }

        let content = reply
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| CollaboratorError::Malformed("reply has no content".to_string()))?;
        parse_reply(&content)
    }
}

#[async_trait]
impl InsightGenerator for ChatCompletionsGenerator {
    async fn generate_analysis(
        &self,
        snapshot: &Snapshot,
    ) -> Result<AnalysisReport, CollaboratorError> {
        self.complete_json(ANALYSIS_INSTRUCTIONS, &[("Snapshot", to_json(snapshot)?)])
            .await
    }
}

#[async_trait]
impl PlanGenerator for ChatCompletionsGenerator {
    async fn generate_plan(
        &self,
        report: &AnalysisReport,
        snapshot: &Snapshot,
    ) -> Result<GeneratedPlan, CollaboratorError> {
        self.complete_json(
            PLAN_INSTRUCTIONS,
            &[("Audit", to_json(report)?), ("Snapshot", to_json(snapshot)?)],
        )
        .await
    }
}

#[async_trait]
impl TaskEvaluator for ChatCompletionsGenerator {
    async fn evaluate_task(
        &self,
        task: &Task,
        snapshot: &Snapshot,
    ) -> Result<Verdict, CollaboratorError> {
        let brief = TaskBrief {
            category: &task.category,
            title: &task.title,
            description: &task.description,
            notes: task.notes.as_deref(),
        };
        self.complete_json(
            EVALUATION_INSTRUCTIONS,
            &[("Task", to_json(&brief)?), ("Snapshot", to_json(snapshot)?)],
        )
        .await
    }
}

/// Parses a model reply into `T`, tolerating a surrounding markdown fence.
pub fn parse_reply<T: DeserializeOwned>(content: &str) -> Result<T, CollaboratorError> {
    serde_json::from_str(strip_code_fences(content))
        .map_err(|e| CollaboratorError::Malformed(e.to_string()))
}

fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn to_json<T: Serialize>(value: &T) -> Result<String, CollaboratorError> {
    serde_json::to_string(value).map_err(|e| CollaboratorError::Failed(e.to_string()))
}

fn request_error(error: reqwest::Error) -> CollaboratorError {
    if error.is_timeout() {
        CollaboratorError::Timeout
    } else {
        CollaboratorError::Failed(error.to_string())
    }
}
