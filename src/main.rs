use std::path::PathBuf;
use std::time::SystemTime;

use acescrape::settings::Settings;
use clap::Parser;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(version, about = "Build AceStream M3U playlists", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(long, default_value = "acescrape.toml")]
    config: PathBuf,

    /// Playlist name to be created, minus the scheme suffix and .m3u extension
    #[arg(long)]
    playlist_name: Option<String>,

    /// Directory the playlists are read from and written to
    #[arg(long)]
    output_dir: Option<String>,

    /// Only keep channels whose name contains one of the entries in this file
    #[arg(long)]
    filter_file: Option<String>,

    /// CSV file of `old,new` name replacements
    #[arg(long)]
    name_replacements: Option<String>,

    /// XML catalog of channel logos
    #[arg(long)]
    logos: Option<String>,

    /// URL of an M3U playlist to scrape channels from
    #[arg(long)]
    m3u_url: Option<String>,

    /// URL of the AceStream API to scrape channels from (empty to skip)
    #[arg(long)]
    api_url: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let settings = Settings::load(
        &args.config,
        &[
            ("playlist_name", args.playlist_name),
            ("output_dir", args.output_dir),
            ("filter_file", args.filter_file),
            ("name_replacements", args.name_replacements),
            ("logos_path", args.logos),
            ("m3u_url", args.m3u_url),
            ("api_url", args.api_url),
        ],
    )?;
    info!("Configuration loaded from {}: {:?}", args.config.display(), settings);

    let ctx = settings.run_context(SystemTime::now());
    match acescrape::run(&settings, &ctx).await {
        Ok(channels) => {
            info!("Done, {} channels in playlist '{}'", channels.len(), settings.playlist_name);
            Ok(())
        }
        Err(e) => {
            error!("Playlist generation failed: {:#}", e);
            Err(e)
        }
    }
}
