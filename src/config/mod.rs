use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

/// LLM Provider类型
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub enum LLMProvider {
    #[serde(rename = "groq")]
    #[default]
    Groq,
    #[serde(rename = "openai")]
    OpenAI,
    #[serde(rename = "gemini")]
    Gemini,
    #[serde(rename = "ollama")]
    Ollama,
}

impl LLMProvider {
    /// 各Provider对应的API KEY环境变量名
    pub fn api_key_env(&self) -> &'static str {
        match self {
            LLMProvider::Groq => "GROQ_API_KEY",
            LLMProvider::OpenAI => "OPENAI_API_KEY",
            LLMProvider::Gemini => "GEMINI_API_KEY",
            LLMProvider::Ollama => "",
        }
    }

    /// 本地Provider不需要API KEY
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, LLMProvider::Ollama)
    }
}

impl std::fmt::Display for LLMProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LLMProvider::Groq => write!(f, "groq"),
            LLMProvider::OpenAI => write!(f, "openai"),
            LLMProvider::Gemini => write!(f, "gemini"),
            LLMProvider::Ollama => write!(f, "ollama"),
        }
    }
}

impl std::str::FromStr for LLMProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "groq" => Ok(LLMProvider::Groq),
            "openai" => Ok(LLMProvider::OpenAI),
            "gemini" => Ok(LLMProvider::Gemini),
            "ollama" => Ok(LLMProvider::Ollama),
            _ => Err(format!("Unknown provider: {}", s)),
        }
    }
}

/// 任务编排方式
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Process {
    /// 由经理Agent统筹调度各任务
    #[default]
    Hierarchical,
    /// 按任务声明顺序直接执行
    Sequential,
}

/// 应用程序配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct Config {
    /// 报告输出目录
    pub output_path: PathBuf,

    /// 任务编排方式
    pub process: Process,

    /// LLM模型配置
    pub llm: LLMConfig,

    /// Web搜索配置
    pub search: SearchConfig,

    /// 知识库配置
    pub knowledge: KnowledgeConfig,

    /// Web界面配置
    pub web: WebConfig,

    /// 是否启用详细日志
    pub verbose: bool,
}

/// LLM模型配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LLMConfig {
    /// LLM Provider类型
    pub provider: LLMProvider,

    /// LLM API KEY
    pub api_key: String,

    /// LLM API基地址（用于OpenAI兼容端点）
    pub api_base_url: String,

    /// 模型标识
    pub model: String,

    /// 最大tokens
    pub max_tokens: u32,

    /// 温度
    pub temperature: f64,

    /// 重试次数
    pub retry_attempts: u32,

    /// 重试间隔（毫秒）
    pub retry_delay_ms: u64,

    /// 超时时间（秒）
    pub timeout_seconds: u64,

    /// 带工具Agent的最大工具调用轮数
    pub max_tool_turns: usize,
}

/// Web搜索配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct SearchConfig {
    /// Tavily搜索API KEY
    pub api_key: String,

    /// 搜索API基地址
    pub api_base_url: String,

    /// 调研搜索的结果数上限
    pub research_max_results: usize,

    /// 引文核查搜索的结果数上限
    pub citation_max_results: usize,

    /// 搜索请求超时时间（秒）
    pub timeout_seconds: u64,
}

/// 知识库配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct KnowledgeConfig {
    /// 向量集合的持久化目录
    pub store_dir: PathBuf,

    /// 集合名称
    pub collection: String,

    /// 检索返回的片段数
    pub top_k: usize,

    /// 每次运行前是否清空知识库
    pub clear_before_run: bool,
}

/// Web界面配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct WebConfig {
    /// 监听地址
    pub bind: String,
}

impl Config {
    /// 从文件加载配置
    pub fn from_file(path: &PathBuf) -> Result<Self> {
        let mut file =
            File::open(path).context(format!("Failed to open config file: {:?}", path))?;
        let mut content = String::new();
        file.read_to_string(&mut content)
            .context("Failed to read config file")?;

        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// 启动时报告配置缺口。缺少API KEY只警告不中断，首次调用模型时才会真正失败
    pub fn report_startup_warnings(&self) {
        if self.llm.provider.requires_api_key() && self.llm.api_key.trim().is_empty() {
            eprintln!(
                "⚠️ 警告: 未配置模型API KEY，请设置环境变量 {}（或在配置文件中提供 llm.api_key）",
                self.llm.provider.api_key_env()
            );
        }
        if self.search.api_key.trim().is_empty() {
            eprintln!(
                "⚠️ 警告: 未配置搜索API KEY，请设置环境变量 TAVILY_API_KEY，网络检索工具将不可用"
            );
        }
    }
}

/// 解析`LLM_MODEL`环境变量，支持`provider/model`前缀写法（如`groq/llama-3.1-8b-instant`）
pub fn parse_model_spec(raw: &str) -> (Option<LLMProvider>, String) {
    if let Some((prefix, rest)) = raw.split_once('/')
        && let Ok(provider) = prefix.parse::<LLMProvider>()
    {
        return (Some(provider), rest.to_string());
    }
    (None, raw.to_string())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from("."),
            process: Process::default(),
            llm: LLMConfig::default(),
            search: SearchConfig::default(),
            knowledge: KnowledgeConfig::default(),
            web: WebConfig::default(),
            verbose: false,
        }
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        let (env_provider, env_model) = std::env::var("LLM_MODEL")
            .map(|raw| parse_model_spec(&raw))
            .unwrap_or((None, String::new()));

        let provider = env_provider.unwrap_or_default();
        let model = if env_model.is_empty() {
            String::from("llama-3.1-8b-instant")
        } else {
            env_model
        };
        let api_key = if provider.requires_api_key() {
            std::env::var(provider.api_key_env()).unwrap_or_default()
        } else {
            String::new()
        };

        Self {
            provider,
            api_key,
            api_base_url: String::from("https://api.groq.com/openai/v1"),
            model,
            max_tokens: 4096,
            temperature: 0.2,
            retry_attempts: 5,
            retry_delay_ms: 3000,
            timeout_seconds: 120,
            max_tool_turns: 10,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: std::env::var("TAVILY_API_KEY").unwrap_or_default(),
            api_base_url: String::from("https://api.tavily.com"),
            research_max_results: 8,
            citation_max_results: 3,
            timeout_seconds: 60,
        }
    }
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            store_dir: std::env::var("KNOWLEDGE_DB_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./knowledge_db")),
            collection: String::from("research_knowledge_base"),
            top_k: 5,
            clear_before_run: true,
        }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind: String::from("127.0.0.1:8080"),
        }
    }
}
