use crate::config::{Config, LLMProvider, Process};
use anyhow::Result;
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;

/// DeepScribe - 由Rust与AI驱动的多Agent调研报告引擎
#[derive(Parser, Debug)]
#[command(name = "DeepScribe (deepscribe-rs)")]
#[command(
    about = "Autonomous multi-agent research engine. It orchestrates role-specialized LLM agents through a fixed research pipeline, grounds them in a retrieval-augmented knowledge store, and synthesizes citable Markdown reports."
)]
#[command(version)]
pub struct Args {
    /// 研究主题。缺省时交互式询问
    #[arg(short, long)]
    pub topic: Option<String>,

    /// 启动Web表单界面
    #[arg(long)]
    pub serve: bool,

    /// Web界面监听地址
    #[arg(long)]
    pub bind: Option<String>,

    /// 配置文件路径
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 报告输出目录
    #[arg(short, long)]
    pub output_path: Option<PathBuf>,

    /// LLM Provider (groq, openai, gemini, ollama)
    #[arg(long)]
    pub llm_provider: Option<String>,

    /// LLM API KEY
    #[arg(long)]
    pub llm_api_key: Option<String>,

    /// LLM API基地址
    #[arg(long)]
    pub llm_api_base_url: Option<String>,

    /// 模型标识
    #[arg(short, long)]
    pub model: Option<String>,

    /// 最大tokens数
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// 温度参数
    #[arg(long)]
    pub temperature: Option<f64>,

    /// 搜索API KEY
    #[arg(long)]
    pub search_api_key: Option<String>,

    /// 知识库目录
    #[arg(long)]
    pub store_dir: Option<PathBuf>,

    /// 运行前保留知识库（默认每次运行前清空）
    #[arg(long)]
    pub keep_knowledge: bool,

    /// 使用顺序编排而非经理Agent统筹的层级编排
    #[arg(long)]
    pub sequential: bool,

    /// 把指定文档摄取进知识库后退出
    #[arg(long)]
    pub ingest: Option<PathBuf>,

    /// 验证环境配置（工具、Agent、模型连通性）后退出
    #[arg(long)]
    pub check: bool,

    /// 是否启用详细日志
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// 加载配置文件后应用CLI覆盖项，得到最终配置
    pub fn into_config(&self) -> Config {
        let mut config = if let Some(config_path) = &self.config {
            // 如果显式指定了配置文件路径，从该路径加载
            Config::from_file(config_path).unwrap_or_else(|_| {
                panic!("⚠️ 警告: 无法读取配置文件 {:?}", config_path)
            })
        } else {
            // 如果没有显式指定配置文件，尝试从默认位置加载
            let default_config_path = std::env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join("deepscribe.toml");

            if default_config_path.exists() {
                Config::from_file(&default_config_path).unwrap_or_else(|_| {
                    panic!(
                        "⚠️ 警告: 无法读取默认配置文件 {:?}",
                        default_config_path
                    )
                })
            } else {
                Config::default()
            }
        };

        // 覆盖输出与Web配置
        if let Some(output_path) = &self.output_path {
            config.output_path = output_path.clone();
        }
        if let Some(bind) = &self.bind {
            config.web.bind = bind.clone();
        }

        // 覆盖LLM配置
        if let Some(provider_str) = &self.llm_provider {
            if let Ok(provider) = provider_str.parse::<LLMProvider>() {
                // provider切换后，未显式给key时改读对应provider的环境变量
                if self.llm_api_key.is_none() && provider != config.llm.provider {
                    config.llm.api_key = if provider.requires_api_key() {
                        std::env::var(provider.api_key_env()).unwrap_or_default()
                    } else {
                        String::new()
                    };
                }
                config.llm.provider = provider;
            } else {
                eprintln!(
                    "⚠️ 警告: 未知的provider: {}，使用默认provider",
                    provider_str
                );
            }
        }
        if let Some(llm_api_key) = &self.llm_api_key {
            config.llm.api_key = llm_api_key.clone();
        }
        if let Some(llm_api_base_url) = &self.llm_api_base_url {
            config.llm.api_base_url = llm_api_base_url.clone();
        }
        if let Some(model) = &self.model {
            config.llm.model = model.clone();
        }
        if let Some(max_tokens) = self.max_tokens {
            config.llm.max_tokens = max_tokens;
        }
        if let Some(temperature) = self.temperature {
            config.llm.temperature = temperature;
        }

        // 覆盖搜索与知识库配置
        if let Some(search_api_key) = &self.search_api_key {
            config.search.api_key = search_api_key.clone();
        }
        if let Some(store_dir) = &self.store_dir {
            config.knowledge.store_dir = store_dir.clone();
        }
        if self.keep_knowledge {
            config.knowledge.clear_before_run = false;
        }

        // 其他配置
        if self.sequential {
            config.process = Process::Sequential;
        }
        config.verbose = self.verbose;

        config
    }
}

/// 交互式读取研究主题。直接回车时退回默认主题
pub fn prompt_topic_interactive() -> Result<String> {
    print!("Enter the research topic: ");
    std::io::stdout().flush()?;

    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;

    let topic = line.trim().to_string();
    if topic.is_empty() {
        let fallback = "The Future of AI Agents in 2025";
        println!("未输入主题，使用默认主题: {}", fallback);
        return Ok(fallback.to_string());
    }
    Ok(topic)
}

// Include tests
#[cfg(test)]
mod tests;
