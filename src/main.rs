use anyhow::Result;
use clap::Parser;

mod cli;
mod config;
mod crew;
mod knowledge;
mod llm;
mod memory;
mod web;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = cli::Args::parse();
    let config = args.into_config();
    config.report_startup_warnings();

    if args.check {
        return crew::verify_setup(&config).await;
    }

    if args.serve {
        return web::serve(config).await;
    }

    if let Some(path) = &args.ingest {
        let context = crew::CrewContext::new(config)?;
        let count = crew::ingest::ingest_file(&context, path)?;
        println!("✅ 已摄取 {} 个片段到知识库", count);
        return Ok(());
    }

    // 显式传入的空白主题拒绝启动；交互式输入为空时退回默认主题
    let topic = match &args.topic {
        Some(topic) => {
            if topic.trim().is_empty() {
                eprintln!("⚠️ 警告: 研究主题不能为空");
                std::process::exit(2);
            }
            topic.trim().to_string()
        }
        None => cli::prompt_topic_interactive()?,
    };

    let clear_store = config.knowledge.clear_before_run;
    let context = crew::CrewContext::new(config)?;
    let result = crew::launch(&context, &topic, clear_store).await?;

    println!("\n\n########################");
    println!("## HERE IS THE RESULT ##");
    println!("########################\n");
    println!("{}", result.report);

    if let Some(path) = &result.output_file {
        println!("\n💾 报告文件: {}", path.display());
    }

    Ok(())
}
