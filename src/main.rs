use std::env;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use report_template_engine::config::LogConfig;
use report_template_engine::metrics::encode_metrics;
use report_template_engine::TemplateEngine;

#[tokio::main]
async fn main() -> Result<()> {
    let engine = TemplateEngine::from_env().context("Failed to load configuration")?;
    init_tracing(&engine.settings().log);

    let (flags, args): (Vec<String>, Vec<String>) =
        env::args().skip(1).partition(|arg| arg.starts_with("--"));
    let [template_path, context_path] = args.as_slice() else {
        bail!("usage: report-render [--metrics] <template.json> <context.json>");
    };
    let print_metrics = flags.iter().any(|flag| flag == "--metrics");

    let definition = read_json(Path::new(template_path))?;
    let data = read_json(Path::new(context_path))?;

    let compiled = engine.compile_json(definition)?;
    let document = engine.render_json(&compiled, data).await?;

    println!("{}", serde_json::to_string_pretty(&document)?);
    if print_metrics {
        eprintln!("{}", encode_metrics()?);
    }
    Ok(())
}

fn read_json(path: &Path) -> Result<serde_json::Value> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid JSON in {}", path.display()))
}

fn init_tracing(log: &LogConfig) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Logs go to stderr so stdout carries only the document
    let registry = tracing_subscriber::registry().with(env_filter);
    if log.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
