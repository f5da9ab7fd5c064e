use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use subtitlr::config::credentials::{self, WriteOutcome};
use subtitlr::translate::translate_document;
use subtitlr::utils;
use subtitlr::{
    Cli, Commands, Config, Credential, DeeplClient, Source, SubtitlePipeline, SubtitlrError,
};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    let default_filter = if cli.verbose { "subtitlr=debug" } else { "subtitlr=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Interrupted, cleaning up...");
            interrupt.cancel();
        }
    });

    if let Err(error) = run(cli, &cancel).await {
        report_error(&error);
        std::process::exit(1);
    }
}

async fn run(cli: Cli, cancel: &CancellationToken) -> Result<()> {
    let mut config = Config::load().context("Failed to load configuration")?;
    if cli.quiet {
        config.app.show_progress = false;
    }

    match cli.command {
        Commands::Configure { api_key, path } => {
            let key = Credential::new(api_key)?;
            match credentials::write_credential_file(&path, &key)? {
                WriteOutcome::Created => {
                    println!(
                        "The {} file has been created with your OpenAI API key ({})",
                        path.display(),
                        key
                    );
                }
                WriteOutcome::AlreadyExists => {
                    println!("The {} file already exists, nothing was changed", path.display());
                }
            }
        }
        Commands::Generate {
            id,
            file,
            lang,
            output,
            api_key,
        } => {
            let source = Source::from_flags(id.as_deref(), file.as_deref())?;
            utils::validate_spoken_language(&lang)?;

            if matches!(source, Source::Video(_)) {
                let missing =
                    utils::check_dependencies(&config.app.downloader, &config.app.converter).await;
                for dep in missing {
                    tracing::warn!("Dependency check: {} not found", dep);
                }
            }

            let credential =
                credentials::resolve_openai_key(api_key.as_deref(), &config.app.credential_file)?;
            let pipeline = SubtitlePipeline::new(&config, credential)?;

            tracing::info!("Generating {} subtitles into {}", lang, output.display());
            let report = pipeline
                .run(&source, &lang, &output, cancel)
                .await
                .context("Failed to generate subtitles")?;

            println!(
                "{} Subtitles saved to: {} ({})",
                style("✔").green(),
                report.output_path.display(),
                utils::format_file_size(report.bytes_written)
            );
        }
        Commands::Translate {
            input,
            lang,
            output,
            api_key_deepl,
        } => {
            let credential = Credential::new(api_key_deepl)?;
            let client = DeeplClient::new(&config.deepl, credential)?;

            let policy = config.poll_policy();
            let written = translate_document(&client, &input, &lang, &output, &policy, cancel)
                .await
                .context("Failed to translate subtitles")?;

            println!(
                "{} Translated subtitles saved to: {} ({})",
                style("✔").green(),
                output.display(),
                utils::format_file_size(written)
            );
        }
    }

    Ok(())
}

/// Print the failed stage and the full cause chain
fn report_error(error: &anyhow::Error) {
    let stage = error
        .downcast_ref::<SubtitlrError>()
        .map(SubtitlrError::stage)
        .unwrap_or("subtitlr");
    eprintln!("{} {} failed: {:#}", style("error:").red().bold(), stage, error);
}
