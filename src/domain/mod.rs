use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Closed set of provider failure modes the gateway knows how to surface.
/// `Upstream` covers everything else (network, bad status, malformed JSON)
/// and is never folded into the tool result shape.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("no page found for '{0}'")]
    NotFound(String),
    #[error("'{title}' may refer to multiple pages")]
    Ambiguous { title: String, options: Vec<String> },
    #[error("{0}")]
    Upstream(String),
}

/// A Wikipedia page, fetched fresh on every call. `content` is the full
/// plaintext body with MediaWiki heading markers (`== Heading ==`) left in;
/// `sections` is derived from those markers in document order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    pub title: String,
    pub summary: String,
    pub url: String,
    pub content: String,
    pub sections: Vec<String>,
}

impl Page {
    /// Extract the body of a named section, exact (case-sensitive) heading
    /// match. Returns `None` when the heading is absent from `content` or
    /// when it carries no prose of its own (eg. a heading that only
    /// introduces sub-sections).
    pub fn section(&self, heading: &str) -> Option<String> {
        let needle = format!("== {} ==", heading);
        let idx = self.content.find(&needle)? + needle.len();
        let end = self.content[idx..]
            .find("==")
            .map(|off| idx + off)
            .unwrap_or(self.content.len());
        let body = self.content[idx..end].trim_matches('=').trim();
        if body.is_empty() {
            None
        } else {
            Some(body.to_string())
        }
    }

    /// Pull section headings out of a plaintext extract, all levels
    /// flattened, in document order.
    pub fn parse_sections(content: &str) -> Vec<String> {
        content
            .lines()
            .filter_map(|line| {
                let line = line.trim();
                if line.len() > 4 && line.starts_with("==") && line.ends_with("==") {
                    let heading = line.trim_matches('=').trim();
                    if heading.is_empty() {
                        None
                    } else {
                        Some(heading.to_string())
                    }
                } else {
                    None
                }
            })
            .collect()
    }
}

/// Provider seam: everything the tools need from Wikipedia, abstracted so
/// handlers are testable without a network.
#[async_trait::async_trait]
pub trait WikiProvider: Send + Sync {
    /// Ranked candidate page titles for a free-text query.
    async fn search(&self, query: &str) -> Result<Vec<String>, ProviderError>;
    /// Resolve a title directly to a page.
    async fn page(&self, title: &str) -> Result<Page, ProviderError>;
}
