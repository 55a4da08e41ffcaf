//! 文件写入工具

use rig::tool::Tool;
use serde::Deserialize;
use std::path::{Component, Path, PathBuf};

/// 文件写入参数
#[derive(Debug, Deserialize)]
pub struct FileWriterArgs {
    /// 目标路径，相对于输出目录
    pub path: String,
    /// 要写入的文本内容
    pub content: String,
}

#[derive(Debug, thiserror::Error)]
#[error("file writer tool error: {0}")]
pub struct FileWriterToolError(String);

/// 文件写入工具 - 供报告Agent把成稿落盘到输出目录
#[derive(Debug, Clone)]
pub struct AgentToolFileWriter {
    output_dir: PathBuf,
}

impl AgentToolFileWriter {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    /// 目标路径必须落在输出目录内：拒绝绝对路径和上跳路径
    fn resolve(&self, raw: &str) -> Result<PathBuf, FileWriterToolError> {
        let candidate = Path::new(raw);
        if candidate.is_absolute() {
            return Err(FileWriterToolError(format!(
                "绝对路径不允许写入: {}",
                raw
            )));
        }
        if candidate
            .components()
            .any(|c| matches!(c, Component::ParentDir))
        {
            return Err(FileWriterToolError(format!(
                "路径不允许包含上级目录: {}",
                raw
            )));
        }
        Ok(self.output_dir.join(candidate))
    }
}

impl Tool for AgentToolFileWriter {
    const NAME: &'static str = "file_writer";

    type Error = FileWriterToolError;
    type Args = FileWriterArgs;
    type Output = String;

    async fn definition(&self, _prompt: String) -> rig::completion::ToolDefinition {
        rig::completion::ToolDefinition {
            name: Self::NAME.to_string(),
            description: "Write text content to a file in the report output directory. \
                          The path is relative to the output directory."
                .to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "path": {
                        "type": "string",
                        "description": "Target file path, relative to the output directory"
                    },
                    "content": {
                        "type": "string",
                        "description": "Text content to write"
                    }
                },
                "required": ["path", "content"]
            }),
        }
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        println!("   🔧 tool called...file_writer@{}", args.path);

        let target = self.resolve(&args.path)?;

        if let Some(parent) = target.parent()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)
                .map_err(|e| FileWriterToolError(format!("创建目录失败: {}", e)))?;
        }

        std::fs::write(&target, &args.content)
            .map_err(|e| FileWriterToolError(format!("写入文件失败: {}", e)))?;

        Ok(format!("File saved to {}", target.display()))
    }
}
