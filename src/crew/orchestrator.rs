//! 任务编排器 - 对任务图做拓扑执行，把上游产出拼接进每个任务的提示词
//!
//! 编排器对Agent的调用通过`AgentRuntime`多态：生产实现走rig Agent，
//! 测试中可替换为确定性的桩实现。

use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::config::Process;
use crate::crew::agents::{AgentRole, AgentSpec};
use crate::crew::context::CrewContext;
use crate::crew::tasks::{TaskGraph, TaskSpec};
use crate::llm::client::LLMClient;
use crate::llm::tools::ToolRegistry;

/// 运行结果 - 最终的Markdown报告与落盘路径，创建后不可变
#[derive(Debug, Clone)]
pub struct RunResult {
    pub report: String,
    pub output_file: Option<PathBuf>,
}

/// 运行期记忆的作用域
pub struct MemoryScope;

impl MemoryScope {
    pub const TASK_OUTPUTS: &'static str = "task_outputs";
}

/// 经理Agent产出的统筹计划
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CoordinationPlan {
    /// 每个任务一条执行要点
    pub briefings: Vec<TaskBriefing>,
}

/// 单个任务的统筹要点
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TaskBriefing {
    /// 任务名（research / analysis / verification / reporting）
    pub task: String,
    /// 给执行Agent的简短指导
    pub guidance: String,
}

impl CoordinationPlan {
    pub fn guidance_for(&self, task: &str) -> Option<&str> {
        self.briefings
            .iter()
            .find(|b| b.task.eq_ignore_ascii_case(task))
            .map(|b| b.guidance.as_str())
    }
}

/// Agent执行能力的多态接口
#[async_trait]
pub trait AgentRuntime: Send + Sync {
    /// 以指定Agent执行一个任务提示词，返回文本产出
    async fn perform(&self, agent: &AgentSpec, task_prompt: &str) -> Result<String>;

    /// 由经理Agent产出统筹计划
    async fn plan(&self, manager: &AgentSpec, overview: &str) -> Result<CoordinationPlan>;
}

/// 生产运行时：通过rig构建Agent并执行
pub struct RigRuntime {
    llm_client: LLMClient,
    tools: ToolRegistry,
}

impl RigRuntime {
    pub fn new(llm_client: LLMClient, tools: ToolRegistry) -> Self {
        Self { llm_client, tools }
    }
}

#[async_trait]
impl AgentRuntime for RigRuntime {
    async fn perform(&self, agent: &AgentSpec, task_prompt: &str) -> Result<String> {
        self.llm_client
            .prompt_agent(agent, &self.tools, task_prompt)
            .await
    }

    async fn plan(&self, manager: &AgentSpec, overview: &str) -> Result<CoordinationPlan> {
        self.llm_client
            .extract::<CoordinationPlan>(&manager.preamble(), overview)
            .await
    }
}

/// 执行团队 - Agent集合 + 任务图 + 编排方式
pub struct Crew {
    agents: Vec<AgentSpec>,
    graph: TaskGraph,
    process: Process,
}

impl Crew {
    /// 校验Agent与任务图的一致性后组建团队
    pub fn new(agents: Vec<AgentSpec>, graph: TaskGraph, process: Process) -> Result<Self> {
        for task in graph.tasks() {
            let agent = agents
                .iter()
                .find(|a| a.role == task.agent)
                .ok_or_else(|| anyhow!("任务 {} 缺少对应的Agent: {}", task.kind, task.agent))?;
            if agent.allow_delegation {
                bail!("任务 {} 不能绑定到允许委派的Agent: {}", task.kind, agent.role);
            }
        }

        if process == Process::Hierarchical {
            let managers: Vec<&AgentSpec> =
                agents.iter().filter(|a| a.allow_delegation).collect();
            if managers.len() != 1 {
                bail!(
                    "层级编排需要恰好一个允许委派的经理Agent，当前有 {} 个",
                    managers.len()
                );
            }
        }

        Ok(Self {
            agents,
            graph,
            process,
        })
    }

    fn agent_for(&self, role: AgentRole) -> &AgentSpec {
        self.agents
            .iter()
            .find(|a| a.role == role)
            .expect("validated in Crew::new")
    }

    fn manager(&self) -> Option<&AgentSpec> {
        self.agents.iter().find(|a| a.allow_delegation)
    }

    /// 以生产运行时启动整个任务图
    pub async fn kickoff(&self, context: &CrewContext) -> Result<RunResult> {
        let runtime = RigRuntime::new(context.llm_client.clone(), context.tools.clone());
        self.kickoff_with(context, &runtime).await
    }

    /// 以指定运行时启动整个任务图。任何任务失败即整次运行失败，不做部分恢复
    pub async fn kickoff_with(
        &self,
        context: &CrewContext,
        runtime: &dyn AgentRuntime,
    ) -> Result<RunResult> {
        let plan = match self.process {
            Process::Hierarchical => {
                let manager = self
                    .manager()
                    .ok_or_else(|| anyhow!("层级编排缺少经理Agent"))?;
                println!("🧭 经理Agent [{}] 正在制定统筹计划...", manager.role);
                let plan = runtime
                    .plan(manager, &self.plan_overview())
                    .await
                    .context("统筹计划生成失败")?;
                Some(plan)
            }
            Process::Sequential => None,
        };

        // 任务图按声明顺序即拓扑序，上游必然先于下游执行完毕
        for task in self.graph.tasks() {
            let agent = self.agent_for(task.agent);
            println!("🤖 执行任务 [{}]，由 {} 负责...", task.kind, agent.role);

            let prompt = self.compose_task_prompt(context, task, plan.as_ref()).await?;
            let output = match runtime.perform(agent, &prompt).await {
                Ok(output) => output,
                Err(e) => {
                    eprintln!("❌ 任务 [{}] 执行失败，本次运行终止", task.kind);
                    return Err(e.context(format!("任务 {} 执行失败", task.kind)));
                }
            };

            context
                .store_to_memory(MemoryScope::TASK_OUTPUTS, &task.kind.to_string(), &output)
                .await?;
            println!("✓ 任务 [{}] 完成", task.kind);
        }

        self.finalize(context).await
    }

    /// 汇总终端任务的产出并落盘
    async fn finalize(&self, context: &CrewContext) -> Result<RunResult> {
        let terminal = self.graph.terminal();
        let report: String = context
            .get_from_memory(MemoryScope::TASK_OUTPUTS, &terminal.kind.to_string())
            .await
            .ok_or_else(|| anyhow!("终端任务 {} 没有产出", terminal.kind))?;

        if let Some(path) = &terminal.output_file {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
                && !parent.exists()
            {
                fs::create_dir_all(parent)
                    .context(format!("Failed to create output dir: {:?}", parent))?;
            }
            fs::write(path, &report).context(format!("Failed to save report: {:?}", path))?;
            println!("💾 报告已保存: {}", path.display());
        }

        Ok(RunResult {
            report,
            output_file: terminal.output_file.clone(),
        })
    }

    /// 组装任务提示词：任务描述 + 期望产出 + 经理要点 + 上游任务产出
    async fn compose_task_prompt(
        &self,
        context: &CrewContext,
        task: &TaskSpec,
        plan: Option<&CoordinationPlan>,
    ) -> Result<String> {
        let mut prompt = String::new();

        prompt.push_str("## Task\n");
        prompt.push_str(&task.description);
        prompt.push_str("\n\n## Expected output\n");
        prompt.push_str(&task.expected_output);
        prompt.push('\n');

        if let Some(guidance) = plan.and_then(|p| p.guidance_for(&task.kind.to_string())) {
            prompt.push_str("\n## Coordination notes from the project manager\n");
            prompt.push_str(guidance);
            prompt.push('\n');
        }

        if !task.context.is_empty() {
            prompt.push_str("\n## Context from upstream tasks\n");
            for &upstream in &task.context {
                let upstream_kind = self.graph.tasks()[upstream].kind;
                let output: String = context
                    .get_from_memory(MemoryScope::TASK_OUTPUTS, &upstream_kind.to_string())
                    .await
                    .ok_or_else(|| {
                        anyhow!("任务 {} 的上游 {} 尚无产出", task.kind, upstream_kind)
                    })?;
                prompt.push_str(&format!("\n### Output of {}\n{}\n", upstream_kind, output));
            }
        }

        Ok(prompt)
    }

    /// 给经理Agent看的任务全景，用于产出统筹计划
    fn plan_overview(&self) -> String {
        let mut overview = String::from(
            "Your crew is about to execute the following task pipeline. \
             For each task, provide one short guidance note (field `task` must be \
             the task name, field `guidance` the note).\n\n## Tasks\n",
        );
        for task in self.graph.tasks() {
            overview.push_str(&format!(
                "- {} (agent: {}): {}\n",
                task.kind,
                self.agent_for(task.agent).role.title(),
                task.description
            ));
        }
        overview
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, KnowledgeConfig, Process};
    use crate::crew::agents::AgentFactory;
    use crate::crew::tasks::TaskGraph;
    use crate::knowledge::EmbeddingBackend;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    struct StubBackend;

    impl EmbeddingBackend for StubBackend {
        fn embed(&self, text: &str) -> Result<Vec<f32>> {
            Ok(vec![text.len() as f32, 1.0])
        }
    }

    /// 记录每次调用并按角色返回固定产出的桩运行时
    struct StubRuntime {
        calls: Mutex<Vec<(AgentRole, String)>>,
        fail_on: Option<AgentRole>,
    }

    impl StubRuntime {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_on: None,
            }
        }

        fn failing_on(role: AgentRole) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_on: Some(role),
            }
        }

        fn prompts_for(&self, role: AgentRole) -> Vec<String> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|(r, _)| *r == role)
                .map(|(_, p)| p.clone())
                .collect()
        }
    }

    #[async_trait]
    impl AgentRuntime for StubRuntime {
        async fn perform(&self, agent: &AgentSpec, task_prompt: &str) -> Result<String> {
            self.calls
                .lock()
                .unwrap()
                .push((agent.role, task_prompt.to_string()));

            if self.fail_on == Some(agent.role) {
                bail!("simulated failure for {}", agent.role);
            }
            Ok(format!("output-of-{}", agent.role))
        }

        async fn plan(&self, _manager: &AgentSpec, _overview: &str) -> Result<CoordinationPlan> {
            Ok(CoordinationPlan {
                briefings: vec![TaskBriefing {
                    task: "research".to_string(),
                    guidance: "focus on primary sources".to_string(),
                }],
            })
        }
    }

    fn test_context(temp_dir: &TempDir, process: Process) -> CrewContext {
        let config = Config {
            output_path: temp_dir.path().join("reports"),
            process,
            knowledge: KnowledgeConfig {
                store_dir: temp_dir.path().join("knowledge_db"),
                ..Default::default()
            },
            ..Default::default()
        };
        CrewContext::with_backend(config, Arc::new(StubBackend)).unwrap()
    }

    fn test_crew(context: &CrewContext) -> Crew {
        let agents = AgentFactory::new(&context.config.llm).build_all();
        let graph =
            TaskGraph::for_topic_at("Quantum Computing", "20240101-120000", &context.config)
                .unwrap();
        Crew::new(agents, graph, context.config.process).unwrap()
    }

    #[tokio::test]
    async fn test_kickoff_produces_terminal_output() {
        let temp_dir = TempDir::new().unwrap();
        let context = test_context(&temp_dir, Process::Sequential);
        let crew = test_crew(&context);
        let runtime = StubRuntime::new();

        let result = crew.kickoff_with(&context, &runtime).await.unwrap();

        assert_eq!(result.report, "output-of-writer");
        let report_path = result.output_file.unwrap();
        assert!(
            report_path
                .to_string_lossy()
                .ends_with("report_Quantum_Computing_20240101-120000.md")
        );
        assert_eq!(fs::read_to_string(report_path).unwrap(), "output-of-writer");
    }

    #[tokio::test]
    async fn test_upstream_outputs_are_injected() {
        let temp_dir = TempDir::new().unwrap();
        let context = test_context(&temp_dir, Process::Sequential);
        let crew = test_crew(&context);
        let runtime = StubRuntime::new();

        crew.kickoff_with(&context, &runtime).await.unwrap();

        // analysis的提示词包含research产出
        let analysis_prompts = runtime.prompts_for(AgentRole::Analyst);
        assert_eq!(analysis_prompts.len(), 1);
        assert!(analysis_prompts[0].contains("output-of-researcher"));

        // reporting的提示词同时包含analysis与verification产出
        let reporting_prompts = runtime.prompts_for(AgentRole::Writer);
        assert_eq!(reporting_prompts.len(), 1);
        assert!(reporting_prompts[0].contains("output-of-analyst"));
        assert!(reporting_prompts[0].contains("output-of-verifier"));
    }

    #[tokio::test]
    async fn test_hierarchical_injects_manager_guidance() {
        let temp_dir = TempDir::new().unwrap();
        let context = test_context(&temp_dir, Process::Hierarchical);
        let crew = test_crew(&context);
        let runtime = StubRuntime::new();

        crew.kickoff_with(&context, &runtime).await.unwrap();

        let research_prompts = runtime.prompts_for(AgentRole::Researcher);
        assert!(research_prompts[0].contains("focus on primary sources"));

        // 计划中未覆盖的任务不注入统筹要点
        let analysis_prompts = runtime.prompts_for(AgentRole::Analyst);
        assert!(!analysis_prompts[0].contains("Coordination notes"));
    }

    #[tokio::test]
    async fn test_failure_propagates_as_single_error() {
        let temp_dir = TempDir::new().unwrap();
        let context = test_context(&temp_dir, Process::Sequential);
        let crew = test_crew(&context);
        let runtime = StubRuntime::failing_on(AgentRole::Verifier);

        let result = crew.kickoff_with(&context, &runtime).await;
        assert!(result.is_err());

        // 失败后不产出报告文件
        let reports_dir = temp_dir.path().join("reports");
        let report_written = reports_dir.exists()
            && fs::read_dir(&reports_dir).unwrap().next().is_some();
        assert!(!report_written);

        // 失败任务之后的任务不再执行
        assert!(runtime.prompts_for(AgentRole::Writer).is_empty());
    }

    #[tokio::test]
    async fn test_task_outputs_stored_in_memory() {
        let temp_dir = TempDir::new().unwrap();
        let context = test_context(&temp_dir, Process::Sequential);
        let crew = test_crew(&context);
        let runtime = StubRuntime::new();

        crew.kickoff_with(&context, &runtime).await.unwrap();

        for task in ["research", "analysis", "verification", "reporting"] {
            assert!(context.has_memory_data(MemoryScope::TASK_OUTPUTS, task).await);
        }
    }

    #[test]
    fn test_hierarchical_requires_exactly_one_manager() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config {
            output_path: temp_dir.path().to_path_buf(),
            ..Default::default()
        };
        let factory = AgentFactory::new(&config.llm);
        let graph = TaskGraph::for_topic_at("Topic", "20240101-120000", &config).unwrap();

        // 只有四个执行者、没有经理
        let workers: Vec<AgentSpec> = factory
            .build_all()
            .into_iter()
            .filter(|a| !a.allow_delegation)
            .collect();
        assert!(Crew::new(workers.clone(), graph.clone(), Process::Hierarchical).is_err());

        // 顺序编排不需要经理
        assert!(Crew::new(workers, graph, Process::Sequential).is_ok());
    }

    #[test]
    fn test_task_without_agent_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config {
            output_path: temp_dir.path().to_path_buf(),
            ..Default::default()
        };
        let factory = AgentFactory::new(&config.llm);
        let graph = TaskGraph::for_topic_at("Topic", "20240101-120000", &config).unwrap();

        // 缺少writer，reporting任务无人执行
        let agents: Vec<AgentSpec> = factory
            .build_all()
            .into_iter()
            .filter(|a| a.role != AgentRole::Writer)
            .collect();
        assert!(Crew::new(agents, graph, Process::Sequential).is_err());
    }
}
