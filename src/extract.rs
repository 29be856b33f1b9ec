//! Per-field callbacks populating an [`Article`] from completed subtrees.
//!
//! Every field descriptor materializes into one class selector whose
//! completion callback walks the subtree chain and writes its field into the
//! shared article record. The record sits behind a mutex so the parse
//! driver's parallel dispatch stays safe; all selectors of one page share
//! the same record.

use crate::article::Article;
use crate::config::{FieldConfig, FieldKind};
use crate::date;
use chrono::Local;
use feed_parser::{ClassSelector, Node, NodeKind, Selector, Tree, TreeCallback};
use std::sync::{Arc, Mutex, MutexGuard};

/// Class fragment marking the node whose chain carries the viewers count.
pub const VIEWERS_COUNT_SELECTOR: &str = "ServicePeopleItem__icon ServicePeopleItem__icon_look";

/// Builds the selector set for one article detail page and collects the
/// extracted record.
pub struct ArticlePageExtractor {
    article: Arc<Mutex<Article>>,
    prefix_url: String,
}

impl ArticlePageExtractor {
    /// A fresh extractor resolving relative URLs against `prefix_url`.
    pub fn new(prefix_url: impl Into<String>) -> Self {
        Self {
            article: Arc::new(Mutex::new(Article::new())),
            prefix_url: prefix_url.into(),
        }
    }

    /// One class selector per field descriptor, all writing into this
    /// extractor's article.
    pub fn selectors(&self, fields: &[FieldConfig]) -> Vec<Arc<dyn Selector>> {
        fields
            .iter()
            .map(|field| {
                Arc::new(ClassSelector::new(
                    vec![field.class_selector.clone()],
                    self.field_callback(field),
                )) as Arc<dyn Selector>
            })
            .collect()
    }

    fn field_callback(&self, field: &FieldConfig) -> TreeCallback {
        let article = Arc::clone(&self.article);
        match field.kind {
            FieldKind::Title => Box::new(move |tree| {
                lock_article(&article).title = first_text(tree);
            }),
            FieldKind::Preface => Box::new(move |tree| {
                lock_article(&article).preface = first_text(tree);
            }),
            FieldKind::Content => {
                let ignored = field.ignored_sentences.clone();
                Box::new(move |tree| {
                    let mut content: String =
                        tree.iter().map(|node| node.content.as_str()).collect();
                    for sentence in &ignored {
                        content = content.replace(sentence.as_str(), "");
                    }
                    lock_article(&article).content = content;
                })
            }
            FieldKind::PublishedAt => Box::new(move |tree| {
                let stamp = date::parse_feed_date(&first_text(tree))
                    .unwrap_or_else(|_| Local::now());
                lock_article(&article).published_at = stamp;
            }),
            FieldKind::Info => Box::new(move |tree| {
                lock_article(&article).viewers_count = viewers_count(tree);
            }),
            FieldKind::MainImage => {
                let prefix = self.prefix_url.clone();
                Box::new(move |tree| {
                    if let Some(src) = image_sources(tree).next() {
                        lock_article(&article).main_image = format!("{prefix}{src}");
                    }
                })
            }
            FieldKind::ContentImages => {
                let prefix = self.prefix_url.clone();
                Box::new(move |tree| {
                    let mut article = lock_article(&article);
                    for src in image_sources(tree).skip(1) {
                        article.content_images.push(format!("{prefix}{src}"));
                    }
                })
            }
        }
    }

    /// Takes the populated article out of the extractor. Call after the page
    /// parse finished and the selectors were dropped.
    pub fn into_article(self) -> Article {
        match Arc::try_unwrap(self.article) {
            Ok(record) => record
                .into_inner()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
            Err(shared) => shared
                .lock()
                .unwrap_or_else(|_| panic!("article record mutex poisoned"))
                .clone(),
        }
    }
}

fn lock_article(article: &Arc<Mutex<Article>>) -> MutexGuard<'_, Article> {
    article
        .lock()
        .unwrap_or_else(|_| panic!("article record mutex poisoned"))
}

/// Content of the first text node under the root.
fn first_text(tree: &Tree) -> String {
    tree.iter()
        .find(|node| node.kind == NodeKind::Text)
        .map(|node| node.content.clone())
        .unwrap_or_default()
}

/// `src` values of every `img` element in chain order.
fn image_sources(tree: &Tree) -> impl Iterator<Item = &str> + '_ {
    tree.iter()
        .filter(|node| node.name == "img")
        .filter_map(|node| node.attr("src"))
}

/// The integer three nodes past the viewers-count marker, or zero.
fn viewers_count(tree: &Tree) -> i64 {
    let nodes: Vec<&Node> = tree.iter().collect();
    let Some(marker) = nodes
        .iter()
        .position(|node| node.class_attr().contains(VIEWERS_COUNT_SELECTOR))
    else {
        return 0;
    };
    match nodes.get(marker + 3) {
        Some(node) => node.content.trim().parse().unwrap_or(0),
        None => 0,
    }
}
