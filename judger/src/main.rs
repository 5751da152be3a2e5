use anyhow::Context;
use clap::Parser;
use codecheck_judger::{
    config::EvaluatorConfig,
    model::{EvaluateRequest, Language},
    runner::remote::default_language_ids,
    Evaluator,
};
use std::io::Read;
use tracing_subscriber::EnvFilter;

mod opt;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let opt = opt::Opts::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cfg = match &opt.config {
        Some(path) => EvaluatorConfig::load(path)?,
        None => {
            let mut cfg = EvaluatorConfig::default();
            cfg.apply_env();
            cfg
        }
    };

    match opt.cmd {
        opt::SubCmd::Eval(cmd) => eval(cmd, &cfg).await,
        opt::SubCmd::Languages => {
            languages(&cfg);
            Ok(())
        }
    }
}

async fn eval(cmd: opt::EvalSubCmd, cfg: &EvaluatorConfig) -> anyhow::Result<()> {
    let raw = if cmd.request.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("reading request from stdin")?;
        buf
    } else {
        std::fs::read_to_string(&cmd.request)
            .with_context(|| format!("reading request {}", cmd.request.display()))?
    };
    let mut req: EvaluateRequest = serde_json::from_str(&raw).context("parsing request")?;
    if let Some(mode) = cmd.mode {
        req.mode = mode.into();
    }

    let evaluator = Evaluator::from_config(cfg, cmd.backends())?;
    let outcome = evaluator.evaluate(&req).await?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

fn languages(cfg: &EvaluatorConfig) {
    let ids = cfg
        .judge
        .language_ids
        .clone()
        .unwrap_or_else(default_language_ids);
    for language in Language::ALL.iter() {
        match ids.get(language) {
            Some(id) => println!("{:<12}{}", language, id),
            None => println!("{:<12}(local only)", language),
        }
    }
}
