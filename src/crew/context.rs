use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::config::Config;
use crate::knowledge::{EmbeddingBackend, FastEmbedBackend, KnowledgeBase};
use crate::llm::client::LLMClient;
use crate::llm::tools::ToolRegistry;
use crate::memory::Memory;

/// 一次运行的共享上下文：LLM客户端、知识库、工具注册表与运行期记忆
#[derive(Clone)]
pub struct CrewContext {
    /// LLM调用器，用于与AI通信
    pub llm_client: LLMClient,
    /// 配置
    pub config: Config,
    /// 知识库
    pub knowledge: Arc<KnowledgeBase>,
    /// 工具注册表
    pub tools: ToolRegistry,
    /// 运行期记忆
    pub memory: Arc<RwLock<Memory>>,
}

impl CrewContext {
    /// 创建新的运行上下文，使用fastembed作为嵌入后端。首次运行会下载嵌入模型
    pub fn new(config: Config) -> Result<Self> {
        println!("🧠 正在初始化嵌入模型...");
        let backend = Arc::new(FastEmbedBackend::new()?);
        Self::with_backend(config, backend)
    }

    /// 以指定嵌入后端创建运行上下文
    pub fn with_backend(config: Config, backend: Arc<dyn EmbeddingBackend>) -> Result<Self> {
        let llm_client = LLMClient::new(config.llm.clone())?;
        let knowledge = Arc::new(KnowledgeBase::new(config.knowledge.clone(), backend)?);
        let tools = ToolRegistry::new(&config, knowledge.clone())?;
        let memory = Arc::new(RwLock::new(Memory::new()));

        Ok(Self {
            llm_client,
            config,
            knowledge,
            tools,
            memory,
        })
    }

    /// 存储数据到 Memory
    pub async fn store_to_memory<T>(&self, scope: &str, key: &str, data: T) -> Result<()>
    where
        T: Serialize + Send + Sync,
    {
        let mut memory = self.memory.write().await;
        memory.store(scope, key, data)
    }

    /// 从 Memory 获取数据
    pub async fn get_from_memory<T>(&self, scope: &str, key: &str) -> Option<T>
    where
        T: for<'a> Deserialize<'a> + Send + Sync,
    {
        let memory = self.memory.read().await;
        memory.get(scope, key)
    }

    /// 检查Memory中是否存在指定数据
    pub async fn has_memory_data(&self, scope: &str, key: &str) -> bool {
        let memory = self.memory.read().await;
        memory.has_data(scope, key)
    }
}
