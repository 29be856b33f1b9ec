//! Two-ticker feed processor driving fetches and article extraction.
//!
//! Each processor owns one feed: a refresh ticker triggers feed-page
//! fetches, and a pull ticker throttles the detail-page fetch of every
//! article container the feed parse completes. Extracted articles go out on
//! a bounded channel, so the producer waits until the consumer keeps up.
//! Cancellation is observed between refresh ticks; work already in flight
//! runs to completion and the channel closes when the processor exits.

use crate::article::Article;
use crate::config::NewsFeedConfig;
use crate::extract::ArticlePageExtractor;
use crate::fetch::{self, RemoteBody};
use feed_parser::{contains_class, ClassSelector, Selector, Tree};
use reqwest::Client;
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, watch};
use tokio::task;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{info, warn};
use url::Url;

type DynError = Box<dyn std::error::Error + Send + Sync>;

/// Periodic worker for a single configured news feed.
pub struct NewsFeedProcessor {
    config: NewsFeedConfig,
    client: Client,
    origin: String,
    article_tx: mpsc::Sender<Article>,
}

impl NewsFeedProcessor {
    /// Builds the processor and the receiving end of its article channel.
    pub fn new(config: NewsFeedConfig, client: Client) -> (Self, mpsc::Receiver<Article>) {
        let (article_tx, article_rx) = mpsc::channel(1);
        let origin = feed_origin(&config.news_feed_url);
        (
            Self {
                config,
                client,
                origin,
                article_tx,
            },
            article_rx,
        )
    }

    /// Runs refresh cycles until `shutdown` fires. Consumes the processor;
    /// dropping it closes the article channel.
    pub async fn start(self, mut shutdown: watch::Receiver<bool>) {
        // Ticks missed while a parse or fetch runs long are dropped, never
        // queued, so a slow cycle cannot produce an unthrottled burst.
        let refresh_period = self.config.refresh_interval();
        let mut refresh = interval_at(Instant::now() + refresh_period, refresh_period);
        refresh.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let pull_period = self.config.pull_interval();
        let mut pull = interval_at(Instant::now() + pull_period, pull_period);
        pull.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            info!(
                url = %self.config.news_feed_url,
                next_in = ?refresh_period,
                "awaiting next news feed refresh"
            );
            tokio::select! {
                _ = shutdown.changed() => break,
                _ = refresh.tick() => {
                    info!(url = %self.config.news_feed_url, "refreshing news feed page");
                    match self.refresh_feed(&mut pull).await {
                        Ok(()) => {
                            info!(url = %self.config.news_feed_url, "news feed refresh done");
                        }
                        Err(err) => warn!(
                            error = %err,
                            url = %self.config.news_feed_url,
                            "news feed refresh failed"
                        ),
                    }
                }
            }
        }
    }

    async fn refresh_feed(&self, pull: &mut Interval) -> Result<(), DynError> {
        let body = fetch::fetch_page(&self.client, &self.config.news_feed_url).await?;
        let links = self.collect_article_links(body).await?;

        for href in links {
            pull.tick().await;
            let url = format!("{}{}", self.config.article_prefix_url, href);
            info!(%url, "fetching article page");
            match self.extract_article(&url).await {
                Ok(article) => {
                    if self.article_tx.send(article).await.is_err() {
                        // Consumer went away; no point fetching more.
                        break;
                    }
                }
                Err(err) => warn!(error = %err, %url, "article page fetch failed"),
            }
        }
        Ok(())
    }

    /// Parses the feed page with the container selector and returns the
    /// article-page links its completed containers point at, in completion
    /// order.
    async fn collect_article_links(&self, body: RemoteBody) -> Result<Vec<String>, DynError> {
        let links = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&links);
        let page_selector = self.config.article_page_selector.clone();

        let container = Arc::new(ClassSelector::new(
            self.config.news_feed_article_selector.clone(),
            Box::new(move |tree| {
                if let Some(href) = find_article_link(tree, &page_selector) {
                    sink.lock()
                        .unwrap_or_else(|_| panic!("feed link sink mutex poisoned"))
                        .push(href);
                }
            }),
        )) as Arc<dyn Selector>;

        if let Err(err) =
            task::spawn_blocking(move || feed_parser::parse(body, &[container])).await?
        {
            warn!(
                error = %err,
                url = %self.config.news_feed_url,
                "feed page stream failed mid-parse"
            );
        }

        let collected = match Arc::try_unwrap(links) {
            Ok(sink) => sink
                .into_inner()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
            Err(shared) => shared
                .lock()
                .unwrap_or_else(|_| panic!("feed link sink mutex poisoned"))
                .clone(),
        };
        Ok(collected)
    }

    async fn extract_article(&self, url: &str) -> Result<Article, DynError> {
        let body = fetch::fetch_page(&self.client, url).await?;
        let extractor = ArticlePageExtractor::new(self.config.article_prefix_url.clone());
        let selectors = extractor.selectors(&self.config.article_config.fields);

        if let Err(err) = task::spawn_blocking(move || feed_parser::parse(body, &selectors)).await?
        {
            warn!(error = %err, %url, "article page stream failed mid-parse");
        }

        let mut article = extractor.into_article();
        article.origin = self.origin.clone();
        Ok(article)
    }
}

/// Walks a completed container subtree and returns the `href` of the first
/// node whose class matches the article-page selector.
fn find_article_link(tree: &Tree, page_selector: &[String]) -> Option<String> {
    tree.iter()
        .find(|node| contains_class(node.class_attr(), page_selector))
        .and_then(|node| node.attr("href"))
        .map(str::to_owned)
}

/// Host component of the feed URL, used as the downstream partition key.
fn feed_origin(feed_url: &str) -> String {
    Url::parse(feed_url)
        .ok()
        .and_then(|url| url.host_str().map(str::to_owned))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::{feed_origin, find_article_link};
    use feed_parser::{ClassSelector, Selector, Tree};
    use pretty_assertions::assert_eq;
    use std::sync::{Arc, Mutex};

    fn containers(page: &str, container_class: &str) -> Vec<Option<String>> {
        let found: Arc<Mutex<Vec<Option<String>>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&found);
        let page_selector = vec!["article-button".to_string()];
        let selector = Arc::new(ClassSelector::new(
            vec![container_class.to_string()],
            Box::new(move |tree: &Tree| {
                sink.lock()
                    .expect("sink mutex")
                    .push(find_article_link(tree, &page_selector));
            }),
        )) as Arc<dyn Selector>;

        feed_parser::parse(page.as_bytes(), &[selector]).expect("parse feed page");
        Arc::try_unwrap(found)
            .expect("selector dropped")
            .into_inner()
            .expect("sink mutex")
    }

    #[test]
    fn finds_link_inside_each_container() {
        let page = r#"<ol>
            <li class="blog-item"><a class="article-button" href="/news/1">one</a></li>
            <li class="blog-item"><a class="article-button" href="/news/2">two</a></li>
        </ol>"#;

        assert_eq!(
            containers(page, "blog-item"),
            vec![
                Some("/news/1".to_string()),
                Some("/news/2".to_string()),
            ]
        );
    }

    #[test]
    fn container_without_link_yields_nothing() {
        let page = r#"<li class="blog-item"><span>no clickable</span></li>"#;
        assert_eq!(containers(page, "blog-item"), vec![None]);
    }

    #[test]
    fn origin_is_the_feed_host() {
        assert_eq!(
            feed_origin("https://news.example.ua/rubrics/all"),
            "news.example.ua"
        );
        assert_eq!(feed_origin("not a url"), "");
    }
}
