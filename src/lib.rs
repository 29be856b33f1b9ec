#![warn(missing_docs)]
//! Core library entry points for the newswire ingestion worker.
//!
//! The worker periodically fetches configured news-feed pages, streams them
//! through the `feed-parser` crate, follows each article container to its
//! detail page, extracts the configured fields into [`Article`] records, and
//! hands them to a [`publish::Publisher`].

pub mod article;
pub mod config;
pub mod date;
pub mod extract;
pub mod feed;
pub mod fetch;
pub mod publish;
pub mod runtime;

pub use article::Article;
pub use config::{ArticleConfig, Cli, ConfigError, FieldConfig, FieldKind, NewsFeedConfig};
pub use extract::ArticlePageExtractor;
pub use feed::NewsFeedProcessor;
pub use publish::{article_subject, LogPublisher, Publisher};
pub use runtime::run;
