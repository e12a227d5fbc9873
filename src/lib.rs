pub mod channels;
pub mod enrich;
pub mod history;
pub mod identifier;
pub mod lists;
pub mod logos;
pub mod normalize;
pub mod playlist;
pub mod reconcile;
pub mod settings;
pub mod source;

use std::path::Path;

use anyhow::Result;
use tracing::info;

use channels::{Channel, M3uParser};
use enrich::ChannelEnricher;
use history::{HistoryStore, RunContext};
use logos::{LogoCatalog, LogoMatcher};
use normalize::NameNormalizer;
use settings::Settings;
use source::SourceClient;

fn print_heading(heading: &str) {
    info!("========== {} ==========", heading);
}

/// Fetches every configured source. The playlist source goes first; any failure aborts.
pub async fn fetch_channels(settings: &Settings, parser: &M3uParser) -> Result<Vec<Channel>> {
    let client = SourceClient::new(settings.request_timeout())?;
    let mut channels = Vec::new();

    if !settings.m3u_url.is_empty() {
        channels.extend(client.fetch_playlist(&settings.m3u_url, parser).await?);
    }
    if !settings.api_url.is_empty() {
        channels.extend(client.fetch_api(&settings.api_url).await?);
    }

    Ok(channels)
}

/// One full playlist generation: scrape, enrich, bring back recently vanished
/// channels, deduplicate, sort and write every playlist flavour.
pub async fn run(settings: &Settings, ctx: &RunContext) -> Result<Vec<Channel>> {
    info!("Playlist name: {}", settings.playlist_name);

    print_heading("Loading Logos");
    let catalog = LogoCatalog::load(&settings.logos_path)?;

    print_heading("Loading Filters");
    let filters = if settings.filter_file.is_empty() {
        Vec::new()
    } else {
        lists::load_filters(Path::new(&settings.filter_file))?
    };

    print_heading("Scraping Sources");
    let parser = M3uParser::default();
    let scraped = fetch_channels(settings, &parser).await?;

    print_heading("Loading Name Replacements");
    let replacements = if settings.name_replacements.is_empty() {
        Vec::new()
    } else {
        lists::load_replacements(Path::new(&settings.name_replacements))?
    };

    print_heading("Processing Channels");
    let enricher = ChannelEnricher::new(
        NameNormalizer::new(replacements),
        LogoMatcher::new(catalog),
        filters,
    );
    let current = enricher.enrich_all(scraped);

    print_heading("Checking for Old Channels");
    let history = HistoryStore::load(&settings.output_dir, &settings.playlist_name, &parser)?;
    let resurrected = history.missing_channels(&current, ctx);

    print_heading("Post-Processing Channels");
    let channels = reconcile::reconcile(current, resurrected);

    print_heading("Creating Playlists");
    playlist::write_playlists(&settings.output_dir, &settings.playlist_name, &channels)?;

    Ok(channels)
}
