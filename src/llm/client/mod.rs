//! LLM客户端 - 提供统一的LLM服务接口

use anyhow::Result;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::future::Future;

use crate::config::LLMConfig;
use crate::crew::agents::AgentSpec;
use crate::llm::tools::ToolRegistry;

mod providers;

pub use providers::{ProviderAgent, ProviderClient, ProviderExtractor};

/// LLM客户端 - 封装provider差异、重试与Agent构建
#[derive(Clone)]
pub struct LLMClient {
    config: LLMConfig,
    client: ProviderClient,
}

impl LLMClient {
    /// 创建新的LLM客户端
    pub fn new(config: LLMConfig) -> Result<Self> {
        let client = ProviderClient::new(&config)?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &LLMConfig {
        &self.config
    }

    /// 检查模型连接和功能是否正常
    pub async fn check_connection(&self) -> Result<()> {
        println!("🔄 正在检查模型连接...");
        match self
            .prompt_plain("You are a helpful assistant.", "Hello")
            .await
        {
            Ok(_) => {
                println!("✅ 模型连接正常");
                Ok(())
            }
            Err(e) => {
                eprintln!("❌ 模型连接失败: {}", e);
                Err(e)
            }
        }
    }

    /// 通用重试逻辑，用于处理异步操作的重试机制
    async fn retry_with_backoff<T, F, Fut>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, anyhow::Error>>,
    {
        let max_retries = self.config.retry_attempts;
        let retry_delay_ms = self.config.retry_delay_ms;
        let mut retries = 0;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(err) => {
                    retries += 1;
                    eprintln!(
                        "❌ 调用模型服务出错，重试中 (第 {} / {}次尝试): {}",
                        retries, max_retries, err
                    );
                    if retries >= max_retries {
                        return Err(err);
                    }
                    tokio::time::sleep(std::time::Duration::from_millis(retry_delay_ms)).await;
                }
            }
        }
    }

    /// 单轮对话（不挂载工具）
    pub async fn prompt_plain(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let agent = self
            .client
            .create_agent(&self.config.model, system_prompt, &self.config, None);

        self.retry_with_backoff(|| async { agent.prompt(user_prompt).await })
            .await
    }

    /// 以指定Agent描述执行任务：挂载其能力集对应的工具，允许多轮工具调用
    pub async fn prompt_agent(
        &self,
        spec: &AgentSpec,
        tools: &ToolRegistry,
        user_prompt: &str,
    ) -> Result<String> {
        let preamble = spec.preamble();
        let agent =
            self.client
                .create_agent(&spec.model, &preamble, &self.config, Some((spec, tools)));

        if spec.capabilities.is_empty() {
            self.retry_with_backoff(|| async { agent.prompt(user_prompt).await })
                .await
        } else {
            let max_turns = self.config.max_tool_turns;
            self.retry_with_backoff(|| async {
                agent
                    .multi_turn(user_prompt, max_turns)
                    .await
                    .map_err(|e| e.into())
            })
            .await
        }
    }

    /// 结构化提取
    pub async fn extract<T>(&self, system_prompt: &str, user_prompt: &str) -> Result<T>
    where
        T: JsonSchema + for<'a> Deserialize<'a> + Serialize + Send + Sync + 'static,
    {
        let extractor =
            self.client
                .create_extractor::<T>(&self.config.model, system_prompt, &self.config);

        self.retry_with_backoff(|| async { extractor.extract(user_prompt).await })
            .await
    }
}
