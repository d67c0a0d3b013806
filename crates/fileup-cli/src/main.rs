//! 🚀 fileup-cli — the front door.
//!
//! Parses the arguments, sets up logging, loads the config, and hands the rest
//! to `fileup::run`. If something breaks, it reads out the whole cause chain so
//! nobody has to guess. 🦆

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

/// 📦 Import a JSON, NDJSON or GeoJSON file into a new index, in chunks.
#[derive(Debug, Parser)]
#[command(name = "fileup-cli", version, about)]
struct Args {
    /// 📂 The file to import. `.ndjson`/`.jsonl` are line-delimited; `.gz` is unpacked first.
    file: PathBuf,

    /// 🏷️ Name of the index to create.
    #[arg(short, long)]
    index: String,

    /// 🔄 Built-in transform: `geo` or `json`.
    #[arg(short, long, default_value = "geo")]
    transform: String,

    /// 🗺️ `geo_point` or `geo_shape`. Inferred from the features when left out.
    #[arg(long)]
    data_type: Option<String>,

    /// 🔧 TOML config. `FILEUP_*` env vars fill in whatever it leaves out.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 📇 Register an index pattern titled after the index once the import succeeds.
    #[arg(long)]
    index_pattern: bool,

    /// 🧪 Do everything against in-memory backends. Nothing is sent.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    if let Some(ref config_file) = args.config {
        let exists = config_file.try_exists().with_context(|| {
            format!(
                "💀 Couldn't check whether the config file exists. If it's a relative path, \
                 try an absolute one. Was checking here: '{}'",
                config_file.display()
            )
        })?;
        if !exists {
            anyhow::bail!("💀 Config file '{}' does not exist", config_file.display());
        }
    }

    let app_config = fileup::load_config(args.config.as_deref())
        .context("💀 Couldn't load the config. Check the TOML and the FILEUP_* variables; `service.url` is required")?;

    let job = fileup::UploadJob {
        file: args.file,
        index: args.index,
        transform: args.transform,
        data_type: args.data_type,
        create_index_pattern: args.index_pattern,
        dry_run: args.dry_run,
    };

    if let Err(err) = fileup::run(app_config, job).await {
        error!("💀 error: {}", err);
        // -- 🧅 one layer at a time
        let mut looks_like_connectivity = false;
        for cause in err.chain().skip(1) {
            error!("⚠️  cause: {}", cause);
            let cause_str = cause.to_string();
            if cause_str.contains("error sending request")
                || cause_str.contains("connection refused")
                || cause_str.contains("Connection refused")
                || cause_str.contains("tcp connect error")
                || cause_str.contains("dns error")
            {
                looks_like_connectivity = true;
            }
        }

        if looks_like_connectivity {
            error!(
                "🔧 hint: the upload service isn't reachable. Check `service.url` \
                (or FILEUP_SERVICE__URL) and that the service is actually up. \
                `--dry-run` runs the whole thing without a server."
            );
        }

        std::process::exit(1);
    }

    Ok(())
}
