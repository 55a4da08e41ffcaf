//! Web服务器启动

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::config::Config;
use crate::crew::CrewContext;
use crate::web::routes::{self, AppState};

/// 启动Web表单界面。运行上下文只初始化一次，跨请求复用
pub async fn serve(config: Config) -> Result<()> {
    let bind = config.web.bind.clone();
    let context = Arc::new(CrewContext::new(config)?);

    let state = AppState { context };
    let app = routes::create_router(state);

    println!("🌐 Web界面已启动: http://{}", bind);
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .context(format!("Failed to bind web server to {}", bind))?;
    axum::serve(listener, app).await?;

    Ok(())
}
