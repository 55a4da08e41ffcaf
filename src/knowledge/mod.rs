//! 知识库适配器 - 封装持久化的向量集合，支撑检索增强的调研流程

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use crate::config::KnowledgeConfig;

pub mod embedder;

pub use embedder::{EmbeddingBackend, FastEmbedBackend, cosine_similarity};

/// 知识记录 - 一段文本及其嵌入向量
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeRecord {
    pub id: Uuid,
    pub content: String,
    pub embedding: Vec<f32>,
    pub created_at: DateTime<Utc>,
}

/// 知识库 - 以JSON Lines文件持久化的相似度检索集合
///
/// 允许重复存储相同文本；检索按余弦相似度降序返回。
/// 集合跨运行保留，除非显式清空。
pub struct KnowledgeBase {
    config: KnowledgeConfig,
    backend: Arc<dyn EmbeddingBackend>,
    records: RwLock<Vec<KnowledgeRecord>>,
}

impl KnowledgeBase {
    /// 打开（或新建）知识库，加载已持久化的记录
    pub fn new(config: KnowledgeConfig, backend: Arc<dyn EmbeddingBackend>) -> Result<Self> {
        let store = Self {
            config,
            backend,
            records: RwLock::new(Vec::new()),
        };
        store.load()?;
        Ok(store)
    }

    /// 集合文件路径
    pub fn collection_path(&self) -> PathBuf {
        self.config
            .store_dir
            .join(format!("{}.jsonl", self.config.collection))
    }

    /// 从磁盘加载集合。文件不存在视为空集合；损坏的行跳过并警告
    fn load(&self) -> Result<()> {
        let path = self.collection_path();
        if !path.exists() {
            return Ok(());
        }

        let content = fs::read_to_string(&path)
            .context(format!("Failed to read knowledge collection: {:?}", path))?;

        let mut records = Vec::new();
        for (line_no, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<KnowledgeRecord>(line) {
                Ok(record) => records.push(record),
                Err(e) => {
                    eprintln!("⚠️ 警告: 跳过损坏的知识记录（第{}行）: {}", line_no + 1, e);
                }
            }
        }

        *self.records.write().expect("knowledge records lock") = records;
        Ok(())
    }

    /// 存入一段文本。重复内容允许再次存储
    pub fn add(&self, content: &str) -> Result<()> {
        let embedding = self.backend.embed(content)?;
        let record = KnowledgeRecord {
            id: Uuid::new_v4(),
            content: content.to_string(),
            embedding,
            created_at: Utc::now(),
        };

        self.append_to_disk(&record)?;
        self.records
            .write()
            .expect("knowledge records lock")
            .push(record);
        Ok(())
    }

    /// 按相似度检索最多k条文本片段，相似度最高的排在最前
    pub fn search(&self, query: &str, k: usize) -> Result<Vec<String>> {
        let records = self.records.read().expect("knowledge records lock");
        if records.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let query_embedding = self.backend.embed(query)?;

        let mut scored: Vec<(f32, &KnowledgeRecord)> = records
            .iter()
            .map(|record| (cosine_similarity(&query_embedding, &record.embedding), record))
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(_, record)| record.content.clone())
            .collect())
    }

    /// 清空集合。集合不存在属于首次运行的正常情况，失败由调用方记录、不应中断流程
    pub fn clear(&self) -> Result<()> {
        self.records.write().expect("knowledge records lock").clear();

        let path = self.collection_path();
        if path.exists() {
            fs::remove_file(&path)
                .context(format!("Failed to remove knowledge collection: {:?}", path))?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records.read().expect("knowledge records lock").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn append_to_disk(&self, record: &KnowledgeRecord) -> Result<()> {
        fs::create_dir_all(&self.config.store_dir).context(format!(
            "Failed to create knowledge store dir: {:?}",
            self.config.store_dir
        ))?;

        let path = self.collection_path();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .context(format!("Failed to open knowledge collection: {:?}", path))?;

        let line = serde_json::to_string(record)?;
        writeln!(file, "{}", line)?;
        Ok(())
    }
}
