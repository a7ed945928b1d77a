use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use imagekit_upload_provider::models::{File, ProviderMetadata, SignedUrlParams, UploadOptions};
use imagekit_upload_provider::{ImageKitProvider, ProviderOptions, UploadProvider};
use std::path::{Path, PathBuf};
use tokio_util::io::ReaderStream;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "imagekit-upload")]
#[command(about = "Upload, delete and sign ImageKit files using IMAGEKIT_* settings")]
struct CliArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Stream a local file to ImageKit.
    Upload {
        path: PathBuf,
        /// Host folder path appended to the configured base folder.
        #[arg(long)]
        folder_path: Option<String>,
        /// Comma-separated tags.
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,
    },
    /// Delete a file by its ImageKit id.
    Delete { file_id: String },
    /// Print a signed URL for a stored file.
    Sign {
        url: String,
        #[arg(long)]
        file_id: String,
        #[arg(long)]
        expire_seconds: Option<u64>,
    },
}

fn split_file_name(path: &Path) -> Result<(String, String)> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .with_context(|| format!("Invalid file name: {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e))
        .unwrap_or_default();
    Ok((stem.to_string(), ext))
}

async fn run(provider: &ImageKitProvider, command: Command) -> Result<()> {
    match command {
        Command::Upload {
            path,
            folder_path,
            tags,
        } => {
            let (stem, ext) = split_file_name(&path)?;
            let hash = format!("{}_{}", stem, Uuid::new_v4().simple());
            let handle = tokio::fs::File::open(&path)
                .await
                .with_context(|| format!("Failed to open {}", path.display()))?;

            let mut file = File::new(hash, ext).with_stream(ReaderStream::new(handle));
            file.folder_path = folder_path;

            let options = UploadOptions {
                tags: (!tags.is_empty()).then_some(tags),
                ..Default::default()
            };
            provider.upload_stream(&mut file, Some(&options)).await?;

            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "url": file.url,
                    "providerMetadata": file.provider_metadata,
                }))?
            );
        }
        Command::Delete { file_id } => {
            let file = File::new(file_id.clone(), "")
                .with_provider_metadata(ProviderMetadata::for_file_id(file_id));
            provider.delete(&file).await?;
        }
        Command::Sign {
            url,
            file_id,
            expire_seconds,
        } => {
            let file = File::new(file_id.clone(), "")
                .with_url(url)
                .with_provider_metadata(ProviderMetadata::for_file_id(file_id).private(true));
            let params = SignedUrlParams {
                expire_seconds,
                ..Default::default()
            };
            let signed = provider.get_signed_url(&file, &params).await;
            println!("{}", signed.url.unwrap_or_default());
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "imagekit_upload_provider=info,imagekit_upload=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse();

    let provider = match ImageKitProvider::init(ProviderOptions::from_env()) {
        Ok(provider) => provider,
        Err(e) => {
            error!("Failed to initialize provider: {}", e);
            std::process::exit(1);
        }
    };

    match run(&provider, args.command).await {
        Ok(()) => {
            info!("Done");
            Ok(())
        }
        Err(e) => {
            error!("Command failed: {:#}", e);
            std::process::exit(1);
        }
    }
}
