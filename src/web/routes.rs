//! Web表单界面 - 路由与页面渲染

use axum::{
    Router,
    extract::{Form, Path, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use std::sync::Arc;

use crate::crew::{self, CrewContext, RunResult};

/// 所有路由共享的应用状态
#[derive(Clone)]
pub struct AppState {
    pub context: Arc<CrewContext>,
}

/// 创建路由
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/run", post(run))
        .route("/clear", post(clear))
        .route("/download/:file", get(download))
        .with_state(state)
}

/// 运行表单
#[derive(Debug, Deserialize)]
pub struct RunForm {
    pub topic: String,
    /// checkbox，勾选时为"on"
    #[serde(default)]
    pub clear: Option<String>,
}

/// GET / - 渲染主表单
async fn index(State(state): State<AppState>) -> Html<String> {
    Html(render_index(&state, None))
}

/// POST /run - 校验主题后执行整条流水线，阻塞至运行结束
async fn run(State(state): State<AppState>, Form(form): Form<RunForm>) -> Html<String> {
    let topic = form.topic.trim().to_string();
    if topic.is_empty() {
        return Html(render_index(
            &state,
            Some("⚠️ Please enter a topic first."),
        ));
    }

    let clear_store = form.clear.is_some();
    match crew::launch(&state.context, &topic, clear_store).await {
        Ok(result) => Html(render_report(&topic, &result)),
        Err(e) => Html(render_error(&topic, &e)),
    }
}

/// POST /clear - 独立的清库按钮。清理失败只提示，不报错
async fn clear(State(state): State<AppState>) -> Html<String> {
    let notice = match state.context.knowledge.clear() {
        Ok(()) => "✅ Knowledge base cleared.".to_string(),
        Err(e) => format!("⚠️ Knowledge base clear skipped or failed: {}", e),
    };
    Html(render_index(&state, Some(&notice)))
}

/// GET /download/:file - 下载已生成的报告。只放行本引擎生成的报告文件名
async fn download(State(state): State<AppState>, Path(file): Path<String>) -> Response {
    if !is_safe_report_name(&file) {
        return (StatusCode::NOT_FOUND, "report not found").into_response();
    }

    let path = state.context.config.output_path.join(&file);
    match std::fs::read_to_string(&path) {
        Ok(content) => (
            [
                (header::CONTENT_TYPE, "text/markdown; charset=utf-8".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", file),
                ),
            ],
            content,
        )
            .into_response(),
        Err(_) => (StatusCode::NOT_FOUND, "report not found").into_response(),
    }
}

/// 报告文件名白名单：仅本引擎生成的`report_*.md`，且不含路径成分
fn is_safe_report_name(name: &str) -> bool {
    name.starts_with("report_")
        && name.ends_with(".md")
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn render_page(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
  body {{ font-family: sans-serif; max-width: 860px; margin: 2rem auto; padding: 0 1rem; color: #222; }}
  header {{ border-bottom: 1px solid #ddd; margin-bottom: 1.5rem; padding-bottom: 0.5rem; }}
  input[type=text] {{ width: 100%; padding: 0.5rem; font-size: 1rem; }}
  button {{ padding: 0.5rem 1.2rem; font-size: 1rem; margin-top: 0.5rem; cursor: pointer; }}
  .notice {{ background: #fff8e1; border: 1px solid #e0c36a; padding: 0.6rem 1rem; margin: 1rem 0; }}
  .error {{ background: #fdecea; border: 1px solid #d9534f; padding: 0.6rem 1rem; margin: 1rem 0; }}
  .report {{ background: #fafafa; border: 1px solid #ddd; padding: 1rem 1.5rem; margin-top: 1rem; }}
  .meta {{ color: #666; font-size: 0.9rem; }}
</style>
</head>
<body>
<header>
  <h1>🕵️ Agentic Research Assistant</h1>
  <p class="meta">An autonomous multi-agent system that conducts deep, structured research and synthesizes citable reports.</p>
</header>
{body}
</body>
</html>"#
    )
}

fn render_index(state: &AppState, notice: Option<&str>) -> String {
    let config = &state.context.config;

    let notice_html = notice
        .map(|n| format!(r#"<div class="notice">{}</div>"#, escape_html(n)))
        .unwrap_or_default();

    let key_warning = if config.llm.provider.requires_api_key() && config.llm.api_key.trim().is_empty() {
        format!(
            r#"<div class="notice">⚠️ No API key configured for the active provider — set <code>{}</code> before running.</div>"#,
            config.llm.provider.api_key_env()
        )
    } else {
        String::new()
    };

    let body = format!(
        r#"{notice_html}
{key_warning}
<p class="meta">Provider: <b>{provider}</b> · Model: <b>{model}</b> · Knowledge records: <b>{records}</b></p>
<form method="post" action="/run">
  <label for="topic">Research topic</label>
  <input type="text" id="topic" name="topic" placeholder="e.g., The Future of Quantum Computing">
  <p><label><input type="checkbox" name="clear" checked> Clear knowledge base before run</label></p>
  <button type="submit">Start Research</button>
</form>
<form method="post" action="/clear">
  <button type="submit">Clear Knowledge Base Now</button>
</form>"#,
        provider = escape_html(&config.llm.provider.to_string()),
        model = escape_html(&config.llm.model),
        records = state.context.knowledge.len(),
    );

    render_page("Agentic Research Assistant", &body)
}

fn render_report(topic: &str, result: &RunResult) -> String {
    let report_html = markdown::to_html(&result.report);

    let download_html = result
        .output_file
        .as_ref()
        .and_then(|path| path.file_name())
        .map(|name| {
            let name = name.to_string_lossy();
            format!(
                r#"<p><a href="/download/{name}">📥 Download Report</a> <span class="meta">(saved to <code>{name}</code>)</span></p>"#
            )
        })
        .unwrap_or_default();

    let body = format!(
        r#"<div class="notice">✅ Research completed: <b>{topic}</b></div>
{download_html}
<div class="report">{report_html}</div>
<p><a href="/">← Run another topic</a></p>"#,
        topic = escape_html(topic),
    );

    render_page("Research Report", &body)
}

fn render_error(topic: &str, error: &anyhow::Error) -> String {
    let body = format!(
        r#"<div class="error">❌ Research on <b>{topic}</b> failed.</div>
<pre>{detail}</pre>
<p><a href="/">← Back</a></p>"#,
        topic = escape_html(topic),
        detail = escape_html(&format!("{:#}", error)),
    );

    render_page("Research Failed", &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_report_names() {
        assert!(is_safe_report_name(
            "report_Quantum_Computing_20240101-120000.md"
        ));
        assert!(is_safe_report_name("report_a.md"));
    }

    #[test]
    fn test_unsafe_report_names() {
        assert!(!is_safe_report_name("notes.md"));
        assert!(!is_safe_report_name("report_x.txt"));
        assert!(!is_safe_report_name("../report_x.md"));
        assert!(!is_safe_report_name("report_/etc/passwd.md"));
        assert!(!is_safe_report_name("report x.md"));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<b>"AI" & more</b>"#),
            "&lt;b&gt;&quot;AI&quot; &amp; more&lt;/b&gt;"
        );
    }
}
