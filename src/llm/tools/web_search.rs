//! 网络检索工具 - 基于Tavily搜索API

use anyhow::{Context, Result, bail};
use rig::tool::Tool;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::SearchConfig;

/// Tavily搜索客户端。调研检索与引文核查共用同一套请求逻辑，仅结果数上限不同
#[derive(Debug, Clone)]
pub struct TavilySearchClient {
    http: reqwest::Client,
    api_key: String,
    api_base_url: String,
    max_results: usize,
}

#[derive(Debug, Serialize)]
struct TavilySearchRequest<'a> {
    query: &'a str,
    search_depth: &'a str,
    max_results: usize,
}

#[derive(Debug, Deserialize)]
struct TavilySearchResponse {
    results: Vec<TavilySearchResult>,
}

#[derive(Debug, Deserialize)]
struct TavilySearchResult {
    title: String,
    url: String,
    content: String,
}

impl TavilySearchClient {
    pub fn new(config: &SearchConfig, max_results: usize) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to build search HTTP client")?;

        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            api_base_url: config.api_base_url.clone(),
            max_results,
        })
    }

    /// 执行一次搜索，返回格式化的结果文本
    pub async fn search(&self, query: &str) -> Result<String> {
        if self.api_key.trim().is_empty() {
            bail!("缺少搜索API KEY，请设置环境变量 TAVILY_API_KEY");
        }

        let request = TavilySearchRequest {
            query,
            search_depth: "basic",
            max_results: self.max_results,
        };

        let response = self
            .http
            .post(format!("{}/search", self.api_base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("Search request failed")?
            .error_for_status()
            .context("Search API returned an error status")?
            .json::<TavilySearchResponse>()
            .await
            .context("Failed to parse search response")?;

        if response.results.is_empty() {
            return Ok(format!("No search results found for '{}'.", query));
        }

        let mut formatted = String::new();
        for (i, result) in response.results.iter().enumerate() {
            formatted.push_str(&format!(
                "{}. {}\n   URL: {}\n   {}\n\n",
                i + 1,
                result.title,
                result.url,
                result.content
            ));
        }
        Ok(formatted)
    }
}

/// 调研检索参数
#[derive(Debug, Deserialize)]
pub struct WebSearchArgs {
    pub query: String,
}

#[derive(Debug, thiserror::Error)]
#[error("web search tool error: {0}")]
pub struct WebSearchToolError(String);

/// 调研检索工具 - 供调研Agent收集可引用的信息
#[derive(Debug, Clone)]
pub struct AgentToolWebSearch {
    client: TavilySearchClient,
}

impl AgentToolWebSearch {
    pub fn new(config: &SearchConfig) -> Result<Self> {
        Ok(Self {
            client: TavilySearchClient::new(config, config.research_max_results)?,
        })
    }
}

impl Tool for AgentToolWebSearch {
    const NAME: &'static str = "web_search";

    type Error = WebSearchToolError;
    type Args = WebSearchArgs;
    type Output = String;

    async fn definition(&self, _prompt: String) -> rig::completion::ToolDefinition {
        rig::completion::ToolDefinition {
            name: Self::NAME.to_string(),
            description: "Search the web for comprehensive, citable information on a topic. \
                          Returns titles, URLs and content snippets."
                .to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The search query"
                    }
                },
                "required": ["query"]
            }),
        }
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        println!("   🔧 tool called...web_search@{:?}", args);

        self.client
            .search(&args.query)
            .await
            .map_err(|e| WebSearchToolError(e.to_string()))
    }
}

/// 引文核查参数
#[derive(Debug, Deserialize)]
pub struct CitationSearchArgs {
    pub query: String,
}

#[derive(Debug, thiserror::Error)]
#[error("citation search tool error: {0}")]
pub struct CitationSearchToolError(String);

/// 引文核查工具 - 结果数更少，供核查Agent核实关键论断与来源
#[derive(Debug, Clone)]
pub struct AgentToolCitationSearch {
    client: TavilySearchClient,
}

impl AgentToolCitationSearch {
    pub fn new(config: &SearchConfig) -> Result<Self> {
        Ok(Self {
            client: TavilySearchClient::new(config, config.citation_max_results)?,
        })
    }
}

impl Tool for AgentToolCitationSearch {
    const NAME: &'static str = "citation_search";

    type Error = CitationSearchToolError;
    type Args = CitationSearchArgs;
    type Output = String;

    async fn definition(&self, _prompt: String) -> rig::completion::ToolDefinition {
        rig::completion::ToolDefinition {
            name: Self::NAME.to_string(),
            description: "Verify a factual claim by searching the web for authoritative sources. \
                          Returns a small number of high-relevance results."
                .to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The claim or fact to verify"
                    }
                },
                "required": ["query"]
            }),
        }
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        println!("   🔧 tool called...citation_search@{:?}", args);

        self.client
            .search(&args.query)
            .await
            .map_err(|e| CitationSearchToolError(e.to_string()))
    }
}
