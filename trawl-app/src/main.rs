use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use std::time::Duration;
use trawl_common::observability::{LogConfig, init_logging};
use trawl_config::{TrawlConfig, TrawlConfigLoader};
use trawl_social::mastodon::MastodonApi;
mod cli;
mod commands;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1) Load config (env wins over the file)
    let cfg: TrawlConfig = TrawlConfigLoader::new()
        .with_file(&cli.config)
        .load()
        .with_context(|| format!("loading {}", cli.config.display()))?;

    // 2) Logging from the config's `logging` section
    let log_path = init_logging(LogConfig {
        app_name: "trawl",
        log_dir: cfg.logging.dir.clone(),
        emit_stderr: cfg.logging.stderr,
        format: cfg.logging.format,
        default_filter: cfg.logging.filter.clone(),
    })?;
    tracing::info!(log = %log_path.display(), instance = %cfg.mastodon.api_base_url, "trawl.start");

    let mut api = MastodonApi::new(&cfg.mastodon.api_base_url, cfg.mastodon.access_token.clone())?;
    if let Some(secs) = cfg.mastodon.timeout_secs {
        api = api.with_timeout(Duration::from_secs(secs));
    }

    commands::run(api, &cfg.output_dir, cli.command).await
}
