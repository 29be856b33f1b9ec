//! Worker runner wiring feed processors to the publisher.

use crate::config::{self, Cli};
use crate::feed::NewsFeedProcessor;
use crate::publish::{article_subject, LogPublisher, Publisher};
use anyhow::Context;
use futures_util::future::join_all;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{info, warn};

const USER_AGENT: &str = "newswire/0.1";
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Runs the worker until Ctrl-C or the configured duration elapses.
///
/// One processor task and one publishing task per configured feed; shutdown
/// is signalled to every processor, after which the article channels drain
/// and close.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let feeds = config::load_feeds(&cli.config)
        .with_context(|| format!("load feed config from {}", cli.config.display()))?;

    let client = Client::builder()
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(5))
        .timeout(HTTP_TIMEOUT)
        .build()?;

    let publisher: Arc<dyn Publisher> = Arc::new(LogPublisher);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let mut tasks = Vec::new();
    for feed in feeds {
        info!(url = %feed.news_feed_url, "starting feed processor");
        let (processor, mut articles) = NewsFeedProcessor::new(feed, client.clone());
        tasks.push(tokio::spawn(processor.start(shutdown_rx.clone())));

        let publisher = Arc::clone(&publisher);
        tasks.push(tokio::spawn(async move {
            while let Some(article) = articles.recv().await {
                let subject = article_subject(&article.origin, &article.title);
                match serde_json::to_vec(&article) {
                    Ok(payload) => {
                        if let Err(err) = publisher.publish(&subject, &payload) {
                            warn!(error = %err, subject, "publish failed");
                        }
                    }
                    Err(err) => warn!(error = %err, subject, "article serialization failed"),
                }
            }
        }));
    }

    wait_for_shutdown(cli.run_duration()).await;
    info!("shutdown requested, draining feed processors");
    let _ = shutdown_tx.send(true);
    join_all(tasks).await;
    Ok(())
}

async fn wait_for_shutdown(limit: Option<Duration>) {
    match limit {
        Some(limit) => {
            tokio::select! {
                _ = sleep(limit) => {}
                _ = signal::ctrl_c() => {}
            }
        }
        None => {
            let _ = signal::ctrl_c().await;
        }
    }
}
