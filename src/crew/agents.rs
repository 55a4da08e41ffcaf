//! Agent工厂 - 产出五个固定角色的Agent描述

use serde::{Deserialize, Serialize};

use crate::config::LLMConfig;

/// 固定的五个Agent角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentRole {
    Manager,
    Researcher,
    Analyst,
    Writer,
    Verifier,
}

impl AgentRole {
    pub const ALL: [AgentRole; 5] = [
        AgentRole::Manager,
        AgentRole::Researcher,
        AgentRole::Analyst,
        AgentRole::Writer,
        AgentRole::Verifier,
    ];

    /// 角色头衔，用于Agent的身份提示词
    pub fn title(&self) -> &'static str {
        match self {
            AgentRole::Manager => "Senior Project Manager",
            AgentRole::Researcher => "Deep-Dive Research Analyst",
            AgentRole::Analyst => "Data Synthesis Expert",
            AgentRole::Writer => "Professional Report Writer",
            AgentRole::Verifier => "Fact and Citation Verifier",
        }
    }
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentRole::Manager => write!(f, "manager"),
            AgentRole::Researcher => write!(f, "researcher"),
            AgentRole::Analyst => write!(f, "analyst"),
            AgentRole::Writer => write!(f, "writer"),
            AgentRole::Verifier => write!(f, "verifier"),
        }
    }
}

/// Agent可绑定的能力（工具）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    WebSearch,
    CitationSearch,
    FileWrite,
    KnowledgeStore,
    KnowledgeRetrieve,
}

/// Agent描述 - 角色、目标、背景、模型引用与能力集，构造后不可变
#[derive(Debug, Clone)]
pub struct AgentSpec {
    pub role: AgentRole,
    pub goal: String,
    pub backstory: String,
    pub model: String,
    pub capabilities: Vec<Capability>,
    pub allow_delegation: bool,
}

impl AgentSpec {
    /// 组装Agent的身份提示词（系统preamble）
    pub fn preamble(&self) -> String {
        format!(
            "You are {}. {}\n\nYour personal goal is: {}",
            self.role.title(),
            self.backstory,
            self.goal
        )
    }

    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }
}

/// Agent工厂 - 模型引用来自运行配置，首次调用前不校验模型可达性
pub struct AgentFactory {
    model: String,
}

impl AgentFactory {
    pub fn new(llm: &LLMConfig) -> Self {
        Self {
            model: llm.model.clone(),
        }
    }

    /// 构造指定角色的Agent描述。仅经理允许委派，其余均为叶子执行者
    pub fn make(&self, role: AgentRole) -> AgentSpec {
        match role {
            AgentRole::Manager => AgentSpec {
                role,
                goal: "Orchestrate the research process and ensure the final report is delivered on time.".to_string(),
                backstory: "Leader of a high-performance research crew, expert in delegation and quality control.".to_string(),
                model: self.model.clone(),
                capabilities: vec![],
                allow_delegation: true,
            },
            AgentRole::Researcher => AgentSpec {
                role,
                goal: "Gather comprehensive, citable information using web search.".to_string(),
                backstory: "Meticulous analyst responsible for populating the knowledge base.".to_string(),
                model: self.model.clone(),
                capabilities: vec![Capability::WebSearch, Capability::KnowledgeStore],
                allow_delegation: false,
            },
            AgentRole::Analyst => AgentSpec {
                role,
                goal: "Analyze and synthesize stored facts into structured insights.".to_string(),
                backstory: "Brilliant strategist using the retrieval tool to create clear, thesis-driven arguments.".to_string(),
                model: self.model.clone(),
                capabilities: vec![Capability::KnowledgeRetrieve],
                allow_delegation: false,
            },
            AgentRole::Writer => AgentSpec {
                role,
                goal: "Draft a polished research report and save it using the file writer tool.".to_string(),
                backstory: "Experienced technical writer transforming analysis into compelling narrative content.".to_string(),
                model: self.model.clone(),
                capabilities: vec![Capability::FileWrite],
                allow_delegation: false,
            },
            AgentRole::Verifier => AgentSpec {
                role,
                goal: "Verify key facts and ensure all sources are accurate and trustworthy.".to_string(),
                backstory: "Final line of defense against misinformation using specialized search tool.".to_string(),
                model: self.model.clone(),
                capabilities: vec![Capability::CitationSearch],
                allow_delegation: false,
            },
        }
    }

    /// 构造全部五个角色
    pub fn build_all(&self) -> Vec<AgentSpec> {
        AgentRole::ALL.iter().map(|role| self.make(*role)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LLMConfig;

    fn factory() -> AgentFactory {
        let llm = LLMConfig {
            model: "test-model".to_string(),
            ..Default::default()
        };
        AgentFactory::new(&llm)
    }

    #[test]
    fn test_build_all_produces_five_unique_roles() {
        let agents = factory().build_all();
        assert_eq!(agents.len(), 5);

        let mut roles: Vec<AgentRole> = agents.iter().map(|a| a.role).collect();
        roles.dedup();
        assert_eq!(roles.len(), 5);
    }

    #[test]
    fn test_only_manager_delegates() {
        for agent in factory().build_all() {
            if agent.role == AgentRole::Manager {
                assert!(agent.allow_delegation);
            } else {
                assert!(!agent.allow_delegation, "{} must not delegate", agent.role);
            }
        }
    }

    #[test]
    fn test_capability_sets_match_roles() {
        let factory = factory();

        let researcher = factory.make(AgentRole::Researcher);
        assert_eq!(
            researcher.capabilities,
            vec![Capability::WebSearch, Capability::KnowledgeStore]
        );

        let analyst = factory.make(AgentRole::Analyst);
        assert_eq!(analyst.capabilities, vec![Capability::KnowledgeRetrieve]);

        let writer = factory.make(AgentRole::Writer);
        assert_eq!(writer.capabilities, vec![Capability::FileWrite]);

        let verifier = factory.make(AgentRole::Verifier);
        assert_eq!(verifier.capabilities, vec![Capability::CitationSearch]);

        let manager = factory.make(AgentRole::Manager);
        assert!(manager.capabilities.is_empty());
    }

    #[test]
    fn test_model_reference_from_config() {
        let agent = factory().make(AgentRole::Researcher);
        assert_eq!(agent.model, "test-model");
    }

    #[test]
    fn test_preamble_contains_identity() {
        let agent = factory().make(AgentRole::Verifier);
        let preamble = agent.preamble();
        assert!(preamble.contains("Fact and Citation Verifier"));
        assert!(preamble.contains(&agent.goal));
        assert!(preamble.contains(&agent.backstory));
    }
}
