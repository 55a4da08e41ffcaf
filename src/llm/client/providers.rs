//! LLM Provider支持模块

use anyhow::Result;
use rig::{
    agent::{Agent, AgentBuilder},
    client::CompletionClient,
    completion::{CompletionModel, Prompt, PromptError},
    extractor::Extractor,
    providers::gemini::completion::gemini_api_types::{AdditionalParameters, GenerationConfig},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::config::{LLMConfig, LLMProvider};
use crate::crew::agents::{AgentSpec, Capability};
use crate::llm::tools::ToolRegistry;

/// 统一的Provider客户端枚举
#[derive(Clone)]
pub enum ProviderClient {
    Groq(rig::providers::groq::Client),
    OpenAI(rig::providers::openai::Client),
    Gemini(rig::providers::gemini::Client),
    Ollama(rig::providers::ollama::Client),
}

/// 按能力集为Agent挂载对应的工具句柄
fn attach_tools<M: CompletionModel>(
    mut builder: AgentBuilder<M>,
    spec: &AgentSpec,
    tools: &ToolRegistry,
) -> AgentBuilder<M> {
    for capability in &spec.capabilities {
        builder = match capability {
            Capability::WebSearch => builder.tool(tools.web_search.clone()),
            Capability::CitationSearch => builder.tool(tools.citation_search.clone()),
            Capability::FileWrite => builder.tool(tools.file_writer.clone()),
            Capability::KnowledgeStore => builder.tool(tools.knowledge_store.clone()),
            Capability::KnowledgeRetrieve => builder.tool(tools.knowledge_retrieve.clone()),
        };
    }
    builder
}

impl ProviderClient {
    /// 根据配置创建相应的provider客户端
    pub fn new(config: &LLMConfig) -> Result<Self> {
        match config.provider {
            LLMProvider::Groq => {
                let client = rig::providers::groq::Client::builder(&config.api_key).build();
                Ok(ProviderClient::Groq(client))
            }
            LLMProvider::OpenAI => {
                let client = rig::providers::openai::Client::builder(&config.api_key)
                    .base_url(&config.api_base_url)
                    .build();
                Ok(ProviderClient::OpenAI(client))
            }
            LLMProvider::Gemini => {
                let client = rig::providers::gemini::Client::builder(&config.api_key).build()?;
                Ok(ProviderClient::Gemini(client))
            }
            LLMProvider::Ollama => {
                let client = rig::providers::ollama::Client::builder().build();
                Ok(ProviderClient::Ollama(client))
            }
        }
    }

    /// 创建rig Agent。`bindings`提供Agent描述和工具注册表时，按能力集挂载工具
    pub fn create_agent(
        &self,
        model: &str,
        preamble: &str,
        config: &LLMConfig,
        bindings: Option<(&AgentSpec, &ToolRegistry)>,
    ) -> ProviderAgent {
        match self {
            ProviderClient::Groq(client) => {
                let mut builder = client
                    .agent(model)
                    .preamble(preamble)
                    .max_tokens(config.max_tokens.into())
                    .temperature(config.temperature);
                if let Some((spec, tools)) = bindings {
                    builder = attach_tools(builder, spec, tools);
                }
                ProviderAgent::Groq(builder.build())
            }
            ProviderClient::OpenAI(client) => {
                let mut builder = client
                    .completion_model(model)
                    .completions_api()
                    .into_agent_builder()
                    .preamble(preamble)
                    .max_tokens(config.max_tokens.into())
                    .temperature(config.temperature);
                if let Some((spec, tools)) = bindings {
                    builder = attach_tools(builder, spec, tools);
                }
                ProviderAgent::OpenAI(builder.build())
            }
            ProviderClient::Gemini(client) => {
                let gen_cfg = GenerationConfig::default();
                let cfg = AdditionalParameters::default().with_config(gen_cfg);

                let mut builder = client
                    .agent(model)
                    .preamble(preamble)
                    .max_tokens(config.max_tokens.into())
                    .temperature(config.temperature)
                    .additional_params(serde_json::to_value(cfg).unwrap());
                if let Some((spec, tools)) = bindings {
                    builder = attach_tools(builder, spec, tools);
                }
                ProviderAgent::Gemini(builder.build())
            }
            ProviderClient::Ollama(client) => {
                let mut builder = client
                    .agent(model)
                    .preamble(preamble)
                    .max_tokens(config.max_tokens.into())
                    .temperature(config.temperature);
                if let Some((spec, tools)) = bindings {
                    builder = attach_tools(builder, spec, tools);
                }
                ProviderAgent::Ollama(builder.build())
            }
        }
    }

    /// 创建Extractor，用于结构化产出（如经理Agent的统筹计划）
    pub fn create_extractor<T>(
        &self,
        model: &str,
        system_prompt: &str,
        config: &LLMConfig,
    ) -> ProviderExtractor<T>
    where
        T: JsonSchema + for<'a> Deserialize<'a> + Serialize + Send + Sync + 'static,
    {
        match self {
            ProviderClient::Groq(client) => {
                let extractor = client
                    .extractor::<T>(model)
                    .preamble(system_prompt)
                    .max_tokens(config.max_tokens.into())
                    .build();
                ProviderExtractor::Groq(extractor)
            }
            ProviderClient::OpenAI(client) => {
                let extractor = client
                    .extractor_completions_api::<T>(model)
                    .preamble(system_prompt)
                    .max_tokens(config.max_tokens.into())
                    .build();
                ProviderExtractor::OpenAI(extractor)
            }
            ProviderClient::Gemini(client) => {
                let gen_cfg = GenerationConfig::default();
                let cfg = AdditionalParameters::default().with_config(gen_cfg);

                let extractor = client
                    .extractor::<T>(model)
                    .preamble(system_prompt)
                    .max_tokens(config.max_tokens.into())
                    .additional_params(serde_json::to_value(cfg).unwrap())
                    .build();
                ProviderExtractor::Gemini(extractor)
            }
            ProviderClient::Ollama(client) => {
                let extractor = client
                    .extractor::<T>(model)
                    .preamble(system_prompt)
                    .max_tokens(config.max_tokens.into())
                    .build();
                ProviderExtractor::Ollama(extractor)
            }
        }
    }
}

/// 统一的Agent枚举
pub enum ProviderAgent {
    Groq(Agent<rig::providers::groq::CompletionModel>),
    OpenAI(Agent<rig::providers::openai::CompletionModel>),
    Gemini(Agent<rig::providers::gemini::completion::CompletionModel>),
    Ollama(Agent<rig::providers::ollama::CompletionModel<reqwest::Client>>),
}

impl ProviderAgent {
    /// 执行单轮prompt
    pub async fn prompt(&self, prompt: &str) -> Result<String> {
        match self {
            ProviderAgent::Groq(agent) => agent.prompt(prompt).await.map_err(|e| e.into()),
            ProviderAgent::OpenAI(agent) => agent.prompt(prompt).await.map_err(|e| e.into()),
            ProviderAgent::Gemini(agent) => agent.prompt(prompt).await.map_err(|e| e.into()),
            ProviderAgent::Ollama(agent) => agent.prompt(prompt).await.map_err(|e| e.into()),
        }
    }

    /// 执行多轮对话，允许Agent在轮次内调用工具
    pub async fn multi_turn(
        &self,
        prompt: &str,
        max_iterations: usize,
    ) -> Result<String, PromptError> {
        match self {
            ProviderAgent::Groq(agent) => agent.prompt(prompt).multi_turn(max_iterations).await,
            ProviderAgent::OpenAI(agent) => agent.prompt(prompt).multi_turn(max_iterations).await,
            ProviderAgent::Gemini(agent) => agent.prompt(prompt).multi_turn(max_iterations).await,
            ProviderAgent::Ollama(agent) => agent.prompt(prompt).multi_turn(max_iterations).await,
        }
    }
}

/// 统一的Extractor枚举
pub enum ProviderExtractor<T>
where
    T: JsonSchema + for<'a> Deserialize<'a> + Serialize + Send + Sync + 'static,
{
    Groq(Extractor<rig::providers::groq::CompletionModel, T>),
    OpenAI(Extractor<rig::providers::openai::CompletionModel, T>),
    Gemini(Extractor<rig::providers::gemini::completion::CompletionModel, T>),
    Ollama(Extractor<rig::providers::ollama::CompletionModel<reqwest::Client>, T>),
}

impl<T> ProviderExtractor<T>
where
    T: JsonSchema + for<'a> Deserialize<'a> + Serialize + Send + Sync + 'static,
{
    /// 执行提取
    pub async fn extract(&self, prompt: &str) -> Result<T> {
        match self {
            ProviderExtractor::Groq(extractor) => {
                extractor.extract(prompt).await.map_err(|e| e.into())
            }
            ProviderExtractor::OpenAI(extractor) => {
                extractor.extract(prompt).await.map_err(|e| e.into())
            }
            ProviderExtractor::Gemini(extractor) => {
                extractor.extract(prompt).await.map_err(|e| e.into())
            }
            ProviderExtractor::Ollama(extractor) => {
                extractor.extract(prompt).await.map_err(|e| e.into())
            }
        }
    }
}
