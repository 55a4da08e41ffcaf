//! 任务图构建 - 固定的四步调研流水线及报告文件名推导

use anyhow::{Result, bail};
use chrono::Local;
use std::path::PathBuf;

use crate::config::Config;
use crate::crew::agents::AgentRole;

/// 固定的四个任务节点
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    Research,
    Analysis,
    Verification,
    Reporting,
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskKind::Research => write!(f, "research"),
            TaskKind::Analysis => write!(f, "analysis"),
            TaskKind::Verification => write!(f, "verification"),
            TaskKind::Reporting => write!(f, "reporting"),
        }
    }
}

/// 任务描述 - 描述文本、期望产出、执行角色与上游依赖
#[derive(Debug, Clone)]
pub struct TaskSpec {
    pub kind: TaskKind,
    pub description: String,
    pub expected_output: String,
    pub agent: AgentRole,
    /// 上游任务在图中的下标。只允许引用已声明的任务，因此图必然无环
    pub context: Vec<usize>,
    pub output_file: Option<PathBuf>,
}

/// 任务图 - research → analysis → verification → reporting（reporting同时依赖analysis与verification）
#[derive(Debug, Clone)]
pub struct TaskGraph {
    tasks: Vec<TaskSpec>,
}

impl TaskGraph {
    /// 基于主题构建四任务流水线，报告文件名带当前时间戳
    pub fn for_topic(topic: &str, config: &Config) -> Result<Self> {
        let timestamp = Local::now().format("%Y%m%d-%H%M%S").to_string();
        Self::for_topic_at(topic, &timestamp, config)
    }

    /// 基于主题和给定时间戳构建任务图。时间戳独立传入以便推导确定性的文件名
    pub fn for_topic_at(topic: &str, timestamp: &str, config: &Config) -> Result<Self> {
        let topic = topic.trim();
        if topic.is_empty() {
            bail!("研究主题不能为空");
        }

        let report_file = config
            .output_path
            .join(report_filename(topic, timestamp));

        let mut graph = TaskGraph { tasks: Vec::new() };

        let research = graph.push(TaskSpec {
            kind: TaskKind::Research,
            description: format!(
                "Gather comprehensive, citable information on '{}'. \
                 Use the web search tool to find facts, statistics and sources, \
                 and store every useful finding into the knowledge base.",
                topic
            ),
            expected_output: "Complete raw text including facts, statistics, and citations."
                .to_string(),
            agent: AgentRole::Researcher,
            context: vec![],
            output_file: None,
        })?;

        let analysis = graph.push(TaskSpec {
            kind: TaskKind::Analysis,
            description: "Query the internal knowledge base using the retrieval tool \
                          and synthesize insights into an outline."
                .to_string(),
            expected_output: "Structured outline with key themes and thesis statements."
                .to_string(),
            agent: AgentRole::Analyst,
            context: vec![research],
            output_file: None,
        })?;

        let verification = graph.push(TaskSpec {
            kind: TaskKind::Verification,
            description: "Verify 3-5 key claims using the citation search tool \
                          and provide a short verification report."
                .to_string(),
            expected_output: "Short verification report for each claim.".to_string(),
            agent: AgentRole::Verifier,
            context: vec![analysis],
            output_file: None,
        })?;

        graph.push(TaskSpec {
            kind: TaskKind::Reporting,
            description: format!(
                "Draft a professional Markdown report based on the analysis, \
                 saving to '{}'.",
                report_file.display()
            ),
            expected_output: "Final polished research report, confirmed saved.".to_string(),
            agent: AgentRole::Writer,
            context: vec![analysis, verification],
            output_file: Some(report_file),
        })?;

        Ok(graph)
    }

    /// 追加任务并返回其下标。上游引用必须指向已声明的任务
    fn push(&mut self, task: TaskSpec) -> Result<usize> {
        let index = self.tasks.len();
        for &upstream in &task.context {
            if upstream >= index {
                bail!("任务 {} 引用了尚未声明的上游任务 {}", task.kind, upstream);
            }
        }
        self.tasks.push(task);
        Ok(index)
    }

    pub fn tasks(&self) -> &[TaskSpec] {
        &self.tasks
    }

    /// 没有上游依赖的根任务
    pub fn roots(&self) -> Vec<&TaskSpec> {
        self.tasks.iter().filter(|t| t.context.is_empty()).collect()
    }

    /// 末位任务，其产出即整次运行的最终工件
    pub fn terminal(&self) -> &TaskSpec {
        self.tasks.last().expect("task graph is never empty")
    }
}

/// 规整主题字符串：仅保留字母数字、空格、连字符、下划线，空白折叠为单个下划线
pub fn normalize_topic(topic: &str) -> String {
    let filtered: String = topic
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect();

    filtered.split_whitespace().collect::<Vec<_>>().join("_")
}

/// 报告文件名，仅由规整后的主题和时间戳决定，避免同主题多次运行互相覆盖
pub fn report_filename(topic: &str, timestamp: &str) -> String {
    format!("report_{}_{}.md", normalize_topic(topic), timestamp)
}
