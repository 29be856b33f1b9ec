//! Worker configuration: CLI flags and per-feed descriptors.

use clap::Parser;
use serde::Deserialize;
use std::error::Error;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// The closed set of extractable article fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Article headline.
    Title,
    /// Lead paragraph shown before the body.
    Preface,
    /// Full body text.
    Content,
    /// Publication timestamp.
    PublishedAt,
    /// Metadata block carrying the viewers count.
    Info,
    /// Cover image.
    MainImage,
    /// Inline body images.
    ContentImages,
}

/// One field to extract from an article detail page.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldConfig {
    /// Which article field this descriptor fills.
    #[serde(rename = "type")]
    pub kind: FieldKind,
    /// Class fragment identifying the subtree holding the field.
    pub class_selector: String,
    /// Substrings removed verbatim from extracted content.
    #[serde(default)]
    pub ignored_sentences: Vec<String>,
}

/// Field descriptors for one article page layout.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArticleConfig {
    /// Per-field extraction descriptors.
    pub fields: Vec<FieldConfig>,
}

/// Immutable descriptor of one news feed.
#[derive(Debug, Clone, Deserialize)]
pub struct NewsFeedConfig {
    /// Feed page URL.
    pub news_feed_url: String,
    /// Class fragments identifying an article container on the feed page.
    pub news_feed_article_selector: Vec<String>,
    /// Nanoseconds between feed-page refreshes.
    pub news_feed_refresh_interval: u64,
    /// Prefix resolved against relative `href`/`src` values.
    pub article_prefix_url: String,
    /// Field descriptors for the article detail pages.
    #[serde(default)]
    pub article_config: ArticleConfig,
    /// Nanoseconds between article detail-page fetches.
    pub article_pull_interval: u64,
    /// Class fragments on the clickable inside an article container.
    pub article_page_selector: Vec<String>,
}

impl NewsFeedConfig {
    /// Feed refresh cadence.
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_nanos(self.news_feed_refresh_interval)
    }

    /// Article pull cadence.
    pub fn pull_interval(&self) -> Duration {
        Duration::from_nanos(self.article_pull_interval)
    }
}

/// Failures loading the feed configuration. All of them are fatal at
/// startup: the worker refuses to run without at least one usable feed.
#[derive(Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    Read(std::io::Error),
    /// The config file is not valid JSON for the expected shape.
    Parse(serde_json::Error),
    /// The config file holds no feeds.
    Empty,
    /// A feed declares a zero refresh or pull interval.
    ZeroInterval {
        /// Feed URL of the offending entry.
        url: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read(err) => write!(f, "config read error: {err}"),
            Self::Parse(err) => write!(f, "config parse error: {err}"),
            Self::Empty => write!(f, "no feed configs provided"),
            Self::ZeroInterval { url } => {
                write!(f, "feed {url} declares a zero interval")
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Read(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::Empty | Self::ZeroInterval { .. } => None,
        }
    }
}

/// Loads the JSON array of feed configs from `path`.
pub fn load_feeds(path: &Path) -> Result<Vec<NewsFeedConfig>, ConfigError> {
    let raw = fs::read_to_string(path).map_err(ConfigError::Read)?;
    parse_feeds(&raw)
}

fn parse_feeds(raw: &str) -> Result<Vec<NewsFeedConfig>, ConfigError> {
    let feeds: Vec<NewsFeedConfig> = serde_json::from_str(raw).map_err(ConfigError::Parse)?;
    if feeds.is_empty() {
        return Err(ConfigError::Empty);
    }
    for feed in &feeds {
        if feed.news_feed_refresh_interval == 0 || feed.article_pull_interval == 0 {
            return Err(ConfigError::ZeroInterval {
                url: feed.news_feed_url.clone(),
            });
        }
    }
    Ok(feeds)
}

/// Command-line interface of the worker binary.
#[derive(Parser, Debug, Clone)]
#[command(name = "newswire", about = "News-feed ingestion worker")]
pub struct Cli {
    /// Path to the JSON array of feed configurations
    #[arg(long, env = "NEWSWIRE_CONFIG", default_value = "feeds.json")]
    pub config: PathBuf,

    /// Seconds to run before requesting shutdown (0 = until interrupted)
    #[arg(long, env = "NEWSWIRE_DURATION", default_value_t = 0)]
    pub duration_secs: u64,
}

impl Cli {
    /// The requested run duration, if bounded.
    pub fn run_duration(&self) -> Option<Duration> {
        (self.duration_secs > 0).then(|| Duration::from_secs(self.duration_secs))
    }
}
