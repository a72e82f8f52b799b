use anyhow::Context;
use serde::Serialize;
use tracing::{info, instrument};

use crate::llm_client::SharedLlmClient;
use crate::normalize::normalize;

/// Prompt sent to the completion backend. The wording is kept stable so
/// answers stay comparable with earlier runs.
pub fn analysis_prompt(prompt: &str, data_text: &str) -> String {
    format!(
        "User prompt: {prompt}\n\nData:\n{data_text}\n\n\
         Respond in three sections:\n\
         1. Summary/Conclusion\n\
         2. Insights based on data\n\
         3. Recommendations"
    )
}

#[derive(Debug, Clone, Serialize)]
pub struct CompanionAnswer {
    pub label: String,
    pub output: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub response: String,
    pub companions: Vec<CompanionAnswer>,
}

/// Normalizes source text, asks the primary model for the three-section
/// analysis, then asks each companion the bare user prompt.
pub struct Analyst {
    llm: SharedLlmClient,
    companions: Vec<(String, SharedLlmClient)>,
}

impl Analyst {
    pub fn new(llm: SharedLlmClient) -> Self {
        Self {
            llm,
            companions: Vec::new(),
        }
    }

    pub fn with_companion(mut self, label: impl Into<String>, client: SharedLlmClient) -> Self {
        self.companions.push((label.into(), client));
        self
    }

    #[instrument(skip_all, fields(prompt_len = prompt.len(), data_len = data_text.len()))]
    pub async fn analyze(&self, prompt: &str, data_text: &str) -> anyhow::Result<AnalysisReport> {
        anyhow::ensure!(!prompt.trim().is_empty(), "A prompt is required for analysis");

        let clean = normalize(data_text);
        info!(normalized_len = clean.len(), "data normalized");

        let response = self
            .llm
            .complete(&analysis_prompt(prompt, &clean))
            .await
            .context("Analysis completion failed")?;

        let mut companions = Vec::with_capacity(self.companions.len());
        for (label, client) in &self.companions {
            let output = client
                .complete(prompt)
                .await
                .with_context(|| format!("{label} completion failed"))?;
            companions.push(CompanionAnswer {
                label: label.clone(),
                output,
            });
        }

        Ok(AnalysisReport {
            response,
            companions,
        })
    }
}
