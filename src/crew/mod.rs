// Multi-Agent 调研团队
// 固定的四步流水线：
//   research     调研员通过网络检索收集可引用的事实，写入知识库
//   analysis     分析师从知识库检索片段，综合为结构化提纲
//   verification 核查员用引文检索核实关键论断
//   reporting    撰写员基于分析与核查成稿，落盘为Markdown报告
// 层级编排时，经理Agent在启动前产出各任务的统筹要点

use anyhow::{Result, bail};

use crate::config::Config;

pub mod agents;
pub mod context;
pub mod ingest;
pub mod orchestrator;
pub mod tasks;

pub use context::CrewContext;
pub use orchestrator::{Crew, RunResult};

use crate::crew::agents::AgentFactory;
use crate::crew::tasks::TaskGraph;

/// 执行一次完整的调研运行：校验主题、可选清库、组建团队并启动任务图
pub async fn launch(context: &CrewContext, topic: &str, clear_store: bool) -> Result<RunResult> {
    let topic = topic.trim();
    if topic.is_empty() {
        bail!("研究主题不能为空");
    }

    println!("🚀 开始调研: {}", topic);

    if clear_store {
        // 集合不存在属于首次运行的正常情况，清理失败不中断运行
        match context.knowledge.clear() {
            Ok(()) => println!("🧹 知识库已清空"),
            Err(e) => eprintln!("⚠️ 知识库清理跳过或失败: {}", e),
        }
    }

    let factory = AgentFactory::new(&context.config.llm);
    let agents = factory.build_all();
    let graph = TaskGraph::for_topic(topic, &context.config)?;
    let crew = Crew::new(agents, graph, context.config.process)?;

    crew.kickoff(context).await
}

/// 验证环境配置：初始化工具与知识库、构建Agent、探测模型连通性
pub async fn verify_setup(config: &Config) -> Result<()> {
    println!("🔎 正在验证环境配置...");

    let context = CrewContext::new(config.clone())?;
    println!(
        "✅ 工具与知识库初始化成功（现有 {} 条知识记录）",
        context.knowledge.len()
    );

    let factory = AgentFactory::new(&config.llm);
    let agents = factory.build_all();
    let roles: Vec<String> = agents.iter().map(|a| a.role.to_string()).collect();
    println!("✅ Agent初始化成功: {}", roles.join(", "));

    context.llm_client.check_connection().await?;
    println!("✅ 环境验证通过");
    Ok(())
}
