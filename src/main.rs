//! apply-agent 命令行入口
//!
//! 每个子命令读取一个 JSON 请求文件（`-` 表示 stdin），把 JSON 响应打印到 stdout。
//! 日志写到 stderr。

use std::io::Read;
use std::path::PathBuf;

use anyhow::Context;
use apply_agent::{
    load_config, observability, ApplicationRequest, ApplyAgent, OrchestrationMode,
};
use clap::{Parser, Subcommand};
use serde::Serialize;

#[derive(Debug, Parser)]
#[command(name = "apply-agent", version, about = "Job application agent")]
struct Cli {
    /// 额外的配置文件（覆盖 config/default.toml）
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// 覆盖配置中的编排模式：pipeline | agentic
    #[arg(long, global = true)]
    mode: Option<OrchestrationMode>,

    /// 以缩进格式输出 JSON
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// 只生成定制简历
    Apply { request: PathBuf },
    /// 生成求职信
    CoverLetter { request: PathBuf },
    /// 回答申请问题
    Answer { request: PathBuf },
    /// 完整申请（生成 + 可选的外部门户提交）
    AutoApply { request: PathBuf },
    /// 批量完整申请，请求文件为 JSON 数组
    Batch { requests: PathBuf },
}

fn read_input(path: &PathBuf) -> anyhow::Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &PathBuf) -> anyhow::Result<T> {
    let raw = read_input(path)?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Invalid request JSON in {}", path.display()))
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> anyhow::Result<()> {
    let out = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{out}");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init();
    let cli = Cli::parse();

    let config = load_config(cli.config.clone()).context("Failed to load config")?;
    let mut builder = ApplyAgent::builder(config);
    if let Some(mode) = cli.mode {
        builder = builder.with_mode(mode);
    }
    let agent = builder.build();

    match &cli.command {
        Command::Apply { request } => {
            let req: ApplicationRequest = read_json(request)?;
            print_json(&agent.apply(&req.job, &req.profile).await, cli.pretty)
        }
        Command::CoverLetter { request } => {
            let req: ApplicationRequest = read_json(request)?;
            print_json(
                &agent.generate_cover_letter(&req.job, &req.profile).await,
                cli.pretty,
            )
        }
        Command::Answer { request } => {
            let req: ApplicationRequest = read_json(request)?;
            print_json(
                &agent
                    .answer_questions(&req.job, &req.profile, &req.questions)
                    .await,
                cli.pretty,
            )
        }
        Command::AutoApply { request } => {
            let req: ApplicationRequest = read_json(request)?;
            print_json(
                &agent.auto_apply(&req.job, &req.profile, &req.questions).await,
                cli.pretty,
            )
        }
        Command::Batch { requests } => {
            let reqs: Vec<ApplicationRequest> = read_json(requests)?;
            print_json(&agent.auto_apply_batch(&reqs).await, cli.pretty)
        }
    }
}
