use std::env;
use std::sync::Arc;

use anyhow::Context;
use async_openai::types::{
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_openai::{config::OpenAIConfig, Client as AsyncOpenAiClient};
use async_trait::async_trait;
use tracing::instrument;

pub type SharedLlmClient = Arc<dyn LlmClient>;

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> anyhow::Result<String>;
}

/// Sampling parameters shared by every completion request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InferenceConfig {
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u16,
}

pub const INFERENCE_CONFIG: InferenceConfig = InferenceConfig {
    temperature: 0.3,
    top_p: 0.9,
    max_tokens: 1024,
};

/// Offline stand-in used when no LLM backend is configured.
#[derive(Debug, Default, Clone)]
pub struct EchoLlmClient;

#[async_trait]
impl LlmClient for EchoLlmClient {
    async fn complete(&self, prompt: &str) -> anyhow::Result<String> {
        Ok(format!(
            "[stubbed analyst response]\nI received: {prompt}\nNext step: set OPENAI_API_KEY to reach a real model."
        ))
    }
}

impl EchoLlmClient {
    pub fn shared() -> SharedLlmClient {
        Arc::new(Self)
    }
}

/// OpenAI-compatible client that can point at OpenAI, vLLM, or any HTTP-compatible backend.
pub struct OpenAiLlmClient {
    client: AsyncOpenAiClient<OpenAIConfig>,
    model: String,
    system_prompt: String,
    inference: InferenceConfig,
}

impl OpenAiLlmClient {
    const DEFAULT_MODEL: &'static str = "gpt-3.5-turbo";
    const DEFAULT_SYSTEM_PROMPT: &'static str =
        "You are a data analyst. Ground every statement in the supplied data.";
    const MODEL_VARS: [&'static str; 2] = ["INSIGHT_LLM_MODEL", "AIE_INSIGHT_LLM_MODEL"];
    const SYSTEM_PROMPT_VARS: [&'static str; 2] =
        ["INSIGHT_SYSTEM_PROMPT", "AIE_INSIGHT_SYSTEM_PROMPT"];

    pub fn shared_from_env() -> anyhow::Result<SharedLlmClient> {
        let model = Self::read_env(&Self::MODEL_VARS)
            .unwrap_or_else(|| Self::DEFAULT_MODEL.to_string());
        Ok(Arc::new(Self::from_env_with_model(model)?))
    }

    /// Companion endpoints (hosted agent, knowledge base) share credentials
    /// and base URL with the primary client but name their own model.
    pub fn shared_companion_from_env(
        model_vars: &[&'static str],
    ) -> anyhow::Result<Option<SharedLlmClient>> {
        match Self::read_env(model_vars) {
            Some(model) => Ok(Some(Arc::new(Self::from_env_with_model(model)?))),
            None => Ok(None),
        }
    }

    fn from_env_with_model(model: String) -> anyhow::Result<Self> {
        let config = Self::build_config_from_env()?;
        let system_prompt = Self::read_env(&Self::SYSTEM_PROMPT_VARS)
            .unwrap_or_else(|| Self::DEFAULT_SYSTEM_PROMPT.to_string());

        Ok(Self {
            client: AsyncOpenAiClient::with_config(config),
            model,
            system_prompt,
            inference: INFERENCE_CONFIG,
        })
    }

    fn build_config_from_env() -> anyhow::Result<OpenAIConfig> {
        let api_key = env::var("OPENAI_API_KEY")
            .or_else(|_| env::var("AIE_OPENAI_API_KEY"))
            .context("Set OPENAI_API_KEY (or AIE_OPENAI_API_KEY) to use the OpenAI client")?;

        let mut config = OpenAIConfig::new().with_api_key(api_key);

        if let Ok(base_url) =
            env::var("OPENAI_BASE_URL").or_else(|_| env::var("AIE_OPENAI_BASE_URL"))
        {
            config = config.with_api_base(base_url);
        }

        Ok(config)
    }

    fn read_env(candidates: &[&'static str]) -> Option<String> {
        candidates.iter().find_map(|key| env::var(key).ok())
    }

    #[instrument(level = "debug", skip_all, fields(model = %self.model))]
    async fn chat(&self, prompt: &str) -> anyhow::Result<String> {
        let system_message = ChatCompletionRequestSystemMessageArgs::default()
            .content(&self.system_prompt)
            .build()?;
        let user_message = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .temperature(self.inference.temperature)
            .top_p(self.inference.top_p)
            .max_tokens(self.inference.max_tokens)
            .messages(vec![system_message.into(), user_message.into()])
            .build()?;

        let response = self.client.chat().create(request).await?;
        let choice = response
            .choices
            .first()
            .context("LLM response did not contain any choices")?;

        let output = choice
            .message
            .content
            .clone()
            .unwrap_or_else(|| String::from("[empty LLM response]"));

        Ok(output)
    }
}

#[async_trait]
impl LlmClient for OpenAiLlmClient {
    async fn complete(&self, prompt: &str) -> anyhow::Result<String> {
        self.chat(prompt).await
    }
}

/// Attempt to build an OpenAI-compatible client, optionally falling back to the echo client.
pub fn build_llm_client_from_env(default_to_echo: bool) -> anyhow::Result<SharedLlmClient> {
    match OpenAiLlmClient::shared_from_env() {
        Ok(client) => Ok(client),
        Err(err) if default_to_echo => {
            tracing::warn!(?err, "Falling back to EchoLlmClient");
            Ok(EchoLlmClient::shared())
        }
        Err(err) => Err(err),
    }
}
