//! Downstream publishing seam for extracted articles.
//!
//! The worker only shapes the subject and payload; the actual bus client
//! lives behind [`Publisher`] so the pipeline can run against anything that
//! accepts subject-addressed byte payloads.

use tracing::info;

type DynError = Box<dyn std::error::Error + Send + Sync>;

/// Builds the publishing subject `article.<origin>.<title>`, with dots in
/// the origin and spaces in the title replaced by underscores so neither
/// component introduces extra subject tokens.
pub fn article_subject(origin: &str, title: &str) -> String {
    format!(
        "article.{}.{}",
        origin.replace('.', "_"),
        title.replace(' ', "_")
    )
}

/// Sink for serialized articles.
pub trait Publisher: Send + Sync {
    /// Delivers one payload under `subject`.
    fn publish(&self, subject: &str, payload: &[u8]) -> Result<(), DynError>;
}

/// Publisher that logs instead of delivering; stands in when no bus is
/// wired up.
pub struct LogPublisher;

impl Publisher for LogPublisher {
    fn publish(&self, subject: &str, payload: &[u8]) -> Result<(), DynError> {
        info!(subject, bytes = payload.len(), "article published");
        Ok(())
    }
}
