//! Article record and its wire representation.

use chrono::{DateTime, Local};
use serde::{Serialize, Serializer};

/// One extracted news article.
///
/// Created fresh per detail-page extraction, populated by the field
/// extractors while the page parses, then emitted on the feed processor's
/// output channel and never mutated again.
#[derive(Debug, Clone, PartialEq)]
pub struct Article {
    /// Headline.
    pub title: String,
    /// Lead paragraph.
    pub preface: String,
    /// Body text with ignored substrings removed.
    pub content: String,
    /// Publication timestamp; defaults to the extraction time.
    pub published_at: DateTime<Local>,
    /// Reader counter scraped from the info block.
    pub viewers_count: i64,
    /// Cover image URL.
    pub main_image: String,
    /// Inline body image URLs in discovery order.
    pub content_images: Vec<String>,
    /// Host of the feed the article came from.
    pub origin: String,
}

impl Article {
    /// An empty article stamped with the current time.
    pub fn new() -> Self {
        Self {
            title: String::new(),
            preface: String::new(),
            content: String::new(),
            published_at: Local::now(),
            viewers_count: 0,
            main_image: String::new(),
            content_images: Vec::new(),
            origin: String::new(),
        }
    }
}

impl Default for Article {
    fn default() -> Self {
        Self::new()
    }
}

/// Wire shape published to the bus. `published_at` travels as an RFC 3339
/// string and empty image lists are omitted.
#[derive(Serialize)]
struct ArticleWire<'a> {
    title: &'a str,
    preface: &'a str,
    content: &'a str,
    published_at: String,
    viewers_count: i64,
    main_image: &'a str,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    content_images: &'a [String],
    origin: &'a str,
}

impl Serialize for Article {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ArticleWire {
            title: &self.title,
            preface: &self.preface,
            content: &self.content,
            published_at: self.published_at.to_rfc3339(),
            viewers_count: self.viewers_count,
            main_image: &self.main_image,
            content_images: &self.content_images,
            origin: &self.origin,
        }
        .serialize(serializer)
    }
}
