//! 知识库工具 - 存入与检索两个能力，绑定同一个知识库实例

use rig::tool::Tool;
use serde::Deserialize;
use std::sync::Arc;

use crate::knowledge::KnowledgeBase;

/// 知识存入参数
#[derive(Debug, Deserialize)]
pub struct KnowledgeStoreArgs {
    /// 要存入知识库的内容
    pub content: String,
}

#[derive(Debug, thiserror::Error)]
#[error("knowledge store tool error: {0}")]
pub struct KnowledgeStoreToolError(String);

/// 知识存入工具 - 供调研Agent把调研发现写入知识库
#[derive(Clone)]
pub struct AgentToolKnowledgeStore {
    knowledge: Arc<KnowledgeBase>,
}

impl AgentToolKnowledgeStore {
    pub fn new(knowledge: Arc<KnowledgeBase>) -> Self {
        Self { knowledge }
    }
}

impl Tool for AgentToolKnowledgeStore {
    const NAME: &'static str = "knowledge_store";

    type Error = KnowledgeStoreToolError;
    type Args = KnowledgeStoreArgs;
    type Output = String;

    async fn definition(&self, _prompt: String) -> rig::completion::ToolDefinition {
        rig::completion::ToolDefinition {
            name: Self::NAME.to_string(),
            description: "Store research findings, facts, and data into the internal knowledge \
                          base. Use this tool to save useful information found during research."
                .to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "content": {
                        "type": "string",
                        "description": "Content to store in the knowledge base"
                    }
                },
                "required": ["content"]
            }),
        }
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        println!("   🔧 tool called...knowledge_store ({}字)", args.content.len());

        self.knowledge
            .add(&args.content)
            .map_err(|e| KnowledgeStoreToolError(e.to_string()))?;

        Ok("Content successfully stored in knowledge base.".to_string())
    }
}

/// 知识检索参数
#[derive(Debug, Deserialize)]
pub struct KnowledgeRetrieveArgs {
    /// 检索查询
    pub query: String,
}

#[derive(Debug, thiserror::Error)]
#[error("knowledge retrieve tool error: {0}")]
pub struct KnowledgeRetrieveToolError(String);

/// 知识检索工具 - 供分析Agent按相似度取回调研片段
#[derive(Clone)]
pub struct AgentToolKnowledgeRetrieve {
    knowledge: Arc<KnowledgeBase>,
    top_k: usize,
}

impl AgentToolKnowledgeRetrieve {
    pub fn new(knowledge: Arc<KnowledgeBase>, top_k: usize) -> Self {
        Self { knowledge, top_k }
    }
}

impl Tool for AgentToolKnowledgeRetrieve {
    const NAME: &'static str = "knowledge_retrieve";

    type Error = KnowledgeRetrieveToolError;
    type Args = KnowledgeRetrieveArgs;
    type Output = String;

    async fn definition(&self, _prompt: String) -> rig::completion::ToolDefinition {
        rig::completion::ToolDefinition {
            name: Self::NAME.to_string(),
            description: "Search and retrieve research snippets from the internal knowledge base, \
                          most relevant first. Useful for synthesizing stored findings."
                .to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Query to search the knowledge base"
                    }
                },
                "required": ["query"]
            }),
        }
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        println!("   🔧 tool called...knowledge_retrieve@{:?}", args);

        let snippets = self
            .knowledge
            .search(&args.query, self.top_k)
            .map_err(|e| KnowledgeRetrieveToolError(e.to_string()))?;

        if snippets.is_empty() {
            return Ok("No relevant knowledge found.".to_string());
        }

        Ok(snippets.join("\n\n"))
    }
}
