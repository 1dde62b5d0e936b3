//! Runs the processing pipeline against a stored object.
//!
//! Configuration comes from the environment (see pictor-core): storage
//! backend, style store, auto-webp and the other pipeline tunables. The
//! path may carry a `!style` / `@!style` shorthand; otherwise pass
//! `--process` with a chain like `image/resize,w_100/format,png`.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use pictor_core::Config;
use pictor_processing::{build_registry, parse_request, ProcessData};
use pictor_storage::{create_buffer_store, create_kv_store};

#[derive(Parser)]
#[command(name = "pictor", about = "On-demand image transformation pipeline")]
struct Cli {
    /// Object path, optionally with a `!style` shorthand
    path: String,

    /// Processing chain, e.g. "image/resize,w_100/format,png"
    #[arg(short, long)]
    process: Option<String>,

    /// Output file; defaults to `<basename>.out.<ext>` in the current
    /// directory
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print response headers to stderr
    #[arg(long)]
    show_headers: bool,
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        "image/gif" => "gif",
        _ => "bin",
    }
}

/// Output name that cannot collide with a source under a local store
/// rooted at the working directory.
fn default_output(uri: &str, content_type: &str) -> PathBuf {
    let base = uri.rsplit('/').next().unwrap_or(uri);
    let stem = base.rsplit_once('.').map_or(base, |(stem, _)| stem);
    let stem = if stem.is_empty() { "output" } else { stem };
    PathBuf::from(format!("{stem}.out.{}", extension_for(content_type)))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = Config::from_env().context("load configuration")?;
    let store = create_buffer_store(&config)
        .await
        .context("create buffer store")?;
    let kv = create_kv_store(&config).await.context("create style store")?;
    let registry = build_registry(&config, kv).context("build processor registry")?;

    let mut query = HashMap::new();
    if let Some(process) = &cli.process {
        query.insert("x-oss-process".to_string(), process.clone());
    }
    let (uri, mut actions) = parse_request(&cli.path, &query)?;
    if actions.is_empty() {
        actions = vec!["image".to_string()];
    }

    let response = registry.dispatch(&uri, &actions, store).await?;

    if cli.show_headers {
        for (name, value) in &response.headers {
            eprintln!("{name}: {value}");
        }
    }

    match response.data {
        ProcessData::Json(payload) => {
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
        ProcessData::Image(bytes) => {
            let output = cli
                .output
                .unwrap_or_else(|| default_output(&uri, &response.content_type));
            tokio::fs::write(&output, &bytes)
                .await
                .with_context(|| format!("write {}", output.display()))?;
            println!(
                "{} ({}, {} bytes)",
                output.display(),
                response.content_type,
                bytes.len()
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_drops_directories() {
        assert_eq!(
            default_output("a/b/photo.jpg", "image/webp"),
            PathBuf::from("photo.out.webp")
        );
    }

    #[test]
    fn test_default_output_without_extension() {
        assert_eq!(
            default_output("photo", "image/png"),
            PathBuf::from("photo.out.png")
        );
        assert_eq!(
            default_output(".hidden", "image/png"),
            PathBuf::from("output.out.png")
        );
    }

    #[test]
    fn test_extension_for_unknown_type() {
        assert_eq!(extension_for("application/octet-stream"), "bin");
    }
}
