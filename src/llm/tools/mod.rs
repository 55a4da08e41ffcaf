//! 工具注册表 - 构造并命名Agent可绑定的全部能力

use anyhow::Result;
use std::sync::Arc;

use crate::config::Config;
use crate::knowledge::KnowledgeBase;

pub mod file_writer;
pub mod knowledge;
pub mod web_search;

pub use file_writer::AgentToolFileWriter;
pub use knowledge::{AgentToolKnowledgeRetrieve, AgentToolKnowledgeStore};
pub use web_search::{AgentToolCitationSearch, AgentToolWebSearch};

/// 工具注册表 - 固定的五个能力句柄，知识类工具绑定共享的知识库实例
#[derive(Clone)]
pub struct ToolRegistry {
    pub web_search: AgentToolWebSearch,
    pub citation_search: AgentToolCitationSearch,
    pub file_writer: AgentToolFileWriter,
    pub knowledge_store: AgentToolKnowledgeStore,
    pub knowledge_retrieve: AgentToolKnowledgeRetrieve,
}

impl ToolRegistry {
    pub fn new(config: &Config, knowledge: Arc<KnowledgeBase>) -> Result<Self> {
        Ok(Self {
            web_search: AgentToolWebSearch::new(&config.search)?,
            citation_search: AgentToolCitationSearch::new(&config.search)?,
            file_writer: AgentToolFileWriter::new(config.output_path.clone()),
            knowledge_store: AgentToolKnowledgeStore::new(knowledge.clone()),
            knowledge_retrieve: AgentToolKnowledgeRetrieve::new(
                knowledge,
                config.knowledge.top_k,
            ),
        })
    }
}
