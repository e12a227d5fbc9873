use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use anyhow::Result;
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::history::{RunContext, DEFAULT_STALE_AFTER};
use crate::source::DEFAULT_API_URL;

pub const ENV_PREFIX: &str = "ACESCRAPE";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Output files are named `{playlist_name}_{scheme}.m3u`.
    pub playlist_name: String,
    pub output_dir: PathBuf,
    /// Empty disables the API source.
    pub api_url: String,
    /// Empty disables the playlist source.
    pub m3u_url: String,
    /// Empty means every channel is kept.
    pub filter_file: String,
    pub name_replacements: String,
    pub logos_path: PathBuf,
    pub request_timeout_secs: u64,
    pub stale_after_hours: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            playlist_name: "default".to_string(),
            output_dir: PathBuf::from("playlists"),
            api_url: DEFAULT_API_URL.to_string(),
            m3u_url: String::new(),
            filter_file: String::new(),
            name_replacements: "channel_name_replacements.csv".to_string(),
            logos_path: PathBuf::from("channel_logos.xml"),
            request_timeout_secs: 10,
            stale_after_hours: DEFAULT_STALE_AFTER.as_secs() / (60 * 60),
        }
    }
}

impl Settings {
    /// Layers the optional config file, `ACESCRAPE_*` environment variables and
    /// command line overrides, in increasing priority.
    pub fn load(config_file: &Path, overrides: &[(&str, Option<String>)]) -> Result<Self> {
        let mut builder = Config::builder()
            .add_source(File::from(config_file).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX));

        for (key, value) in overrides {
            builder = builder.set_override_option(*key, value.clone())?;
        }

        Ok(builder.build()?.try_deserialize()?)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_hours * 60 * 60)
    }

    pub fn run_context(&self, now: SystemTime) -> RunContext {
        RunContext::new(now, self.stale_after())
    }
}
