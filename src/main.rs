use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::io::IsTerminal;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use dlcsync::cli::{Cli, Command, DecryptSource};
use dlcsync::fetch::{fetch_links, BarProgress, ProgressSink, SilentProgress};
use dlcsync::manifest::{parse_links, ManifestStore};
use dlcsync::storage::{AuthorizedUserFile, CredentialProvider, StaticToken};
use dlcsync::{
    Config, DcryptClient, DirectoryWalker, DriveClient, ObjectStorage, ResumableFetcher, Scheduler,
};

fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .try_init();
}

fn build_storage(config: &Config) -> Result<Arc<dyn ObjectStorage>> {
    let credentials: Arc<dyn CredentialProvider> = match &config.access_token {
        Some(token) => {
            info!("Using access token from configuration");
            Arc::new(StaticToken::new(token.clone()))
        }
        None => Arc::new(AuthorizedUserFile::new(&config.token_path)),
    };

    let drive = DriveClient::new(credentials, config.request_timeout())
        .context("Failed to create storage client")?;
    Ok(Arc::new(drive))
}

fn build_fetcher(config: &Config) -> Result<ResumableFetcher> {
    let progress: Arc<dyn ProgressSink> = if config.progress && std::io::stderr().is_terminal() {
        Arc::new(BarProgress)
    } else {
        Arc::new(SilentProgress)
    };

    Ok(ResumableFetcher::new(
        build_storage(config)?,
        progress,
        config.retry_policy(),
    ))
}

fn build_resolver(config: &Config) -> Result<DcryptClient> {
    DcryptClient::new(&config.decrypt_url, config.request_timeout())
        .context("Failed to create decryption client")
}

fn build_scheduler(config: &Config) -> Result<Scheduler> {
    let walker = DirectoryWalker::new(
        Arc::new(build_resolver(config)?),
        ManifestStore::new(&config.failure_log),
        build_fetcher(config)?,
    )
    .follow_symlinks(config.follow_symlinks);

    Ok(Scheduler::new(
        walker,
        config.root_dir.clone(),
        config.scan_interval(),
    ))
}

async fn decrypt(config: &Config, source: &DecryptSource) -> Result<()> {
    let client = build_resolver(config)?;

    let links = if let Some(file) = &source.file {
        info!("Decrypting {}...", file.display());
        client
            .upload(file)
            .await
            .with_context(|| format!("Failed to decrypt {}", file.display()))?
    } else if let Some(link) = &source.link {
        info!("Decrypting container at {}...", link);
        client
            .container(link)
            .await
            .with_context(|| format!("Failed to decrypt container at {}", link))?
    } else if let Some(path) = &source.paste {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        info!("Decrypting pasted content from {}...", path.display());
        client
            .paste(&content)
            .await
            .with_context(|| format!("Failed to decrypt content of {}", path.display()))?
    } else {
        anyhow::bail!("Nothing to decrypt");
    };

    info!("Found {} links", links.len());
    for link in links {
        println!("{}", link);
    }
    Ok(())
}

async fn download(config: &Config, links_file: &Path, output: &Path) -> Result<()> {
    let content = tokio::fs::read_to_string(links_file)
        .await
        .with_context(|| format!("File {} not found.", links_file.display()))?;
    let links = parse_links(&content);

    tokio::fs::create_dir_all(output)
        .await
        .with_context(|| format!("Failed to create {}", output.display()))?;

    let store = ManifestStore::new(&config.failure_log);
    let summary = fetch_links(&build_fetcher(config)?, &links, output).await;
    summary.record_failures(&store)?;

    if summary.failed.is_empty() {
        println!(
            "{} {} downloaded, {} already complete",
            "✓".green().bold(),
            summary.downloaded,
            summary.skipped
        );
    } else {
        println!(
            "{} {} of {} files failed. Logged to '{}'",
            "✗".red().bold(),
            summary.failed.len(),
            summary.processed,
            store.failure_log().display()
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = cli.resolve_config().context("Invalid configuration")?;

    match cli.command() {
        Command::Watch => {
            build_scheduler(&config)?.run().await;
        }
        Command::Scan => {
            let scheduler = build_scheduler(&config)?;
            match scheduler.run_once().await {
                Some(stats) if stats.is_clean() => {
                    println!("{} {}", "✓".green().bold(), stats);
                }
                Some(stats) => {
                    println!("{} {}", "!".yellow().bold(), stats);
                }
                None => {
                    println!(
                        "{} {} was not scanned",
                        "✗".red().bold(),
                        scheduler.root().display()
                    );
                }
            }
        }
        Command::Decrypt { source } => decrypt(&config, &source).await?,
        Command::Download { links_file, output } => {
            download(&config, &links_file, &output).await?
        }
    }

    Ok(())
}
