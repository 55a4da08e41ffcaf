//! 文档摄取 - 把本地文本/Markdown文档切分后存入知识库，供后续运行检索

use anyhow::{Context, Result};
use std::path::Path;

use crate::crew::context::CrewContext;

/// 文本切分器 - 固定字符窗口，窗口间保留重叠以保住跨段语义
#[derive(Debug, Clone)]
pub struct ChunkSplitter {
    chunk_size: usize,
    overlap: usize,
}

impl Default for ChunkSplitter {
    fn default() -> Self {
        Self {
            chunk_size: 1500,
            overlap: 200,
        }
    }
}

impl ChunkSplitter {
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            overlap,
        }
    }

    /// 切分为带重叠的片段。按字符计数，避免在多字节字符中间截断
    pub fn split(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        if chars.is_empty() {
            return Vec::new();
        }

        let step = self.chunk_size.saturating_sub(self.overlap).max(1);
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < chars.len() {
            let end = (start + self.chunk_size).min(chars.len());
            let chunk: String = chars[start..end].iter().collect();
            let trimmed = chunk.trim();
            if !trimmed.is_empty() {
                chunks.push(trimmed.to_string());
            }
            if end == chars.len() {
                break;
            }
            start += step;
        }

        chunks
    }
}

/// 读取文档、切分并逐片段存入知识库，返回存入的片段数
pub fn ingest_file(context: &CrewContext, path: &Path) -> Result<usize> {
    let content = std::fs::read_to_string(path)
        .context(format!("Failed to read document: {:?}", path))?;

    let splitter = ChunkSplitter::default();
    let chunks = splitter.split(&content);

    println!("📄 文档切分为 {} 个片段，正在写入知识库...", chunks.len());
    for chunk in &chunks {
        context.knowledge.add(chunk)?;
    }

    Ok(chunks.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_single_chunk() {
        let splitter = ChunkSplitter::default();
        let chunks = splitter.split("short document");
        assert_eq!(chunks, vec!["short document".to_string()]);
    }

    #[test]
    fn test_empty_text_no_chunks() {
        let splitter = ChunkSplitter::default();
        assert!(splitter.split("").is_empty());
        assert!(splitter.split("   \n  ").is_empty());
    }

    #[test]
    fn test_chunks_overlap() {
        let splitter = ChunkSplitter::new(10, 4);
        let text = "abcdefghijklmnopqrst";
        let chunks = splitter.split(text);

        assert_eq!(chunks[0], "abcdefghij");
        // 下一个窗口从第7个字符开始，与上一个窗口共享4个字符
        assert_eq!(chunks[1], "ghijklmnop");
    }

    #[test]
    fn test_chunk_size_bound() {
        let splitter = ChunkSplitter::new(10, 2);
        let text = "x".repeat(95);
        for chunk in splitter.split(&text) {
            assert!(chunk.chars().count() <= 10);
        }
    }

    #[test]
    fn test_multibyte_safe() {
        let splitter = ChunkSplitter::new(5, 1);
        let text = "量子计算是一种新型计算范式";
        let chunks = splitter.split(text);
        assert!(!chunks.is_empty());
        assert!(chunks.iter().all(|c| c.chars().count() <= 5));
    }
}
