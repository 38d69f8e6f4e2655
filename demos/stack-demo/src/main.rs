//! Drive the message stack from the command line.
//!
//! Run with: cargo run -p stack-demo -- push:hello push:world pop depth pop
//!
//! Pass `--config FILE` to load limits from JSON, and set `RUST_LOG=debug`
//! to watch each session open and close.

use std::path::PathBuf;

use anyhow::{Context, bail};
use msgstack_core::StackConfig;
use msgstack_session::{OpenFlags, StackDriver};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// One step of the demo script.
#[derive(Debug)]
enum Op {
    Push(String),
    Pop,
    Depth,
}

impl Op {
    fn parse(arg: &str) -> anyhow::Result<Self> {
        if let Some(text) = arg.strip_prefix("push:") {
            return Ok(Self::Push(text.to_string()));
        }
        match arg {
            "pop" => Ok(Self::Pop),
            "depth" => Ok(Self::Depth),
            other => bail!("unknown operation `{other}` (expected push:<text>, pop or depth)"),
        }
    }
}

fn parse_args() -> anyhow::Result<(Option<PathBuf>, Vec<Op>)> {
    let mut config = None;
    let mut ops = Vec::new();
    let mut args = std::env::args().skip(1);

    while let Some(arg) = args.next() {
        if arg == "--config" {
            let path = args.next().context("--config needs a file path")?;
            config = Some(PathBuf::from(path));
        } else {
            ops.push(Op::parse(&arg)?);
        }
    }
    Ok((config, ops))
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<StackConfig> {
    let Some(path) = path else {
        return Ok(StackConfig::default());
    };
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    StackConfig::from_json(&json).with_context(|| format!("invalid config in {}", path.display()))
}

async fn push(driver: &StackDriver, text: &str) -> anyhow::Result<()> {
    let id = driver.open(OpenFlags::WRITE).await?;
    let written = driver.write(id, text.as_bytes()).await?;
    if written < text.len() {
        tracing::warn!(written, requested = text.len(), "Message truncated");
    }
    driver.close(id).await.context("commit failed")?;
    println!("pushed {}", String::from_utf8_lossy(&text.as_bytes()[..written]));
    Ok(())
}

async fn pop(driver: &StackDriver) -> anyhow::Result<()> {
    let id = driver.open(OpenFlags::READ).await?;
    let mut msg = Vec::new();
    loop {
        let chunk = driver.read(id, 8).await?;
        if chunk.is_empty() {
            break;
        }
        msg.extend_from_slice(&chunk);
    }
    driver.close(id).await?;
    println!("popped {}", String::from_utf8_lossy(&msg));
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let (config_path, ops) = parse_args()?;
    let config = load_config(config_path)?;
    let driver = StackDriver::construct(config)?;

    let failed = run(&driver, &ops).await;

    let report = driver.destroy().await;
    println!("freed {} message(s) at detach", report.messages_freed);

    if failed > 0 {
        bail!("{failed} of {} operation(s) failed", ops.len());
    }
    Ok(())
}

/// Run every op in order, logging failures. Returns how many failed.
async fn run(driver: &StackDriver, ops: &[Op]) -> usize {
    let mut failed = 0;
    for op in ops {
        let result = match op {
            Op::Push(text) => push(driver, text).await,
            Op::Pop => pop(driver).await,
            Op::Depth => {
                println!("depth {}", driver.depth());
                Ok(())
            }
        };
        if let Err(e) = result {
            tracing::error!(?op, "{e:#}");
            failed += 1;
        }
    }
    failed
}
