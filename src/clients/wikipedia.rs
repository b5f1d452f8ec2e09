//! MediaWiki Action API client. This is the "provider" behind every tool:
//! ranked title search, page fetch (plaintext extract + canonical URL), and
//! disambiguation detection via `pageprops`.

use std::collections::HashMap;
use std::time::Instant;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::domain::{Page, ProviderError, WikiProvider};
use crate::infra::http::headers::{add_standard_headers, generate_request_id};
use crate::infra::logging::log_metric;
use crate::infra::runtime::limits::{make_http_client, retry_async_if};

/// Matches the upstream search default; only rank 0 is ever fetched, the
/// rest exist so callers can see what else matched.
const SEARCH_LIMIT: u32 = 10;
const OPTIONS_LIMIT: u32 = 20;

#[derive(Clone)]
pub struct WikipediaRemote {
    base: String,
    http: Client,
    retries: u32,
}

impl WikipediaRemote {
    pub fn new(base: impl Into<String>) -> Self {
        let base = base.into().trim_end_matches('/').to_string();
        Self {
            base,
            http: make_http_client(),
            retries: 2,
        }
    }

    #[allow(dead_code)]
    pub async fn health(&self) -> bool {
        let url = format!("{}/w/api.php?action=query&format=json", self.base);
        let (builder, _rid) = add_standard_headers(self.http.get(url), None);
        match builder.send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    /// GET a wire struct with bounded retry. 5xx statuses and transport
    /// errors are retried with backoff; definitive 4xx responses and decode
    /// failures surface immediately.
    async fn get_wire<T: DeserializeOwned + Send>(&self, url: String) -> Result<T, String> {
        let http = self.http.clone();
        let req_id = generate_request_id();
        tracing::debug!(endpoint = %url, "wikipedia request");
        retry_async_if(
            self.retries,
            move |_| {
                let http = http.clone();
                let url = url.clone();
                let req_id = req_id.clone();
                async move {
                    let (builder, _rid) = add_standard_headers(http.get(url), Some(req_id));
                    let resp = builder
                        .send()
                        .await
                        .map_err(|e| FetchError::Retryable(e.to_string()))?;
                    if !resp.status().is_success() {
                        if resp.status().is_server_error() {
                            return Err(FetchError::Retryable(format!(
                                "retryable status {}",
                                resp.status()
                            )));
                        }
                        return Err(FetchError::Terminal(format!(
                            "upstream status {}",
                            resp.status()
                        )));
                    }
                    resp.json::<T>()
                        .await
                        .map_err(|e| FetchError::Terminal(e.to_string()))
                }
            },
            FetchError::is_retryable,
        )
        .await
        .map_err(FetchError::into_message)
    }

    /// Namespace-0 outgoing links of a disambiguation page, used as the
    /// candidate list shown to the caller.
    async fn disambiguation_options(&self, title: &str) -> Result<Vec<String>, String> {
        let url = format!(
            "{}/w/api.php?action=query&format=json&titles={}&prop=links&plnamespace=0&pllimit={}",
            self.base,
            urlencoding::encode(title),
            OPTIONS_LIMIT,
        );
        let wire: PagesEnvelope<LinksWire> = self.get_wire(url).await?;
        let links = wire
            .query
            .and_then(|q| q.pages.into_values().next())
            .and_then(|p| p.links)
            .unwrap_or_default();
        Ok(links.into_iter().map(|l| l.title).collect())
    }
}

#[async_trait::async_trait]
impl WikiProvider for WikipediaRemote {
    async fn search(&self, query: &str) -> Result<Vec<String>, ProviderError> {
        let url = format!(
            "{}/w/api.php?action=query&list=search&srsearch={}&srlimit={}&format=json&utf8=1",
            self.base,
            urlencoding::encode(query),
            SEARCH_LIMIT,
        );
        let start = Instant::now();
        let wire: SearchEnvelope = self.get_wire(url).await.map_err(|e| {
            log_metric("wikipedia.search", "remote_error_total", 1.0);
            ProviderError::Upstream(e)
        })?;
        log_metric(
            "wikipedia.search",
            "remote_latency_ms",
            start.elapsed().as_millis() as f64,
        );
        Ok(wire
            .query
            .map(|q| q.search.into_iter().map(|hit| hit.title).collect())
            .unwrap_or_default())
    }

    async fn page(&self, title: &str) -> Result<Page, ProviderError> {
        let url = format!(
            "{}/w/api.php?action=query&format=json&redirects=1&titles={}&prop=extracts%7Cinfo%7Cpageprops&explaintext=1&inprop=url",
            self.base,
            urlencoding::encode(title),
        );
        let start = Instant::now();
        let wire: PagesEnvelope<PageWire> = self.get_wire(url).await.map_err(|e| {
            log_metric("wikipedia.page", "remote_error_total", 1.0);
            ProviderError::Upstream(e)
        })?;
        log_metric(
            "wikipedia.page",
            "remote_latency_ms",
            start.elapsed().as_millis() as f64,
        );

        // A single-title query yields exactly one entry, keyed by pageid
        // ("-1" when the page does not exist).
        let pw = wire
            .query
            .and_then(|q| q.pages.into_values().next())
            .ok_or_else(|| ProviderError::Upstream("malformed page response".into()))?;

        if pw.missing.is_some() || pw.invalid.is_some() {
            return Err(ProviderError::NotFound(title.to_string()));
        }
        if pw
            .pageprops
            .as_ref()
            .map(|p| p.disambiguation.is_some())
            .unwrap_or(false)
        {
            let options = self
                .disambiguation_options(&pw.title)
                .await
                .map_err(ProviderError::Upstream)?;
            return Err(ProviderError::Ambiguous {
                title: pw.title,
                options,
            });
        }

        let content = pw.extract.unwrap_or_default();
        // The intro runs up to the first heading marker.
        let summary = content
            .split("\n==")
            .next()
            .unwrap_or_default()
            .trim()
            .to_string();
        let sections = Page::parse_sections(&content);
        let url = pw
            .fullurl
            .unwrap_or_else(|| format!("{}/wiki/{}", self.base, pw.title.replace(' ', "_")));

        Ok(Page {
            title: pw.title,
            summary,
            url,
            content,
            sections,
        })
    }
}

/// Whether an attempt is worth repeating. Transport hiccups and 5xx are;
/// definitive upstream answers (4xx, undecodable bodies) are not.
enum FetchError {
    Retryable(String),
    Terminal(String),
}

impl FetchError {
    fn is_retryable(&self) -> bool {
        matches!(self, FetchError::Retryable(_))
    }

    fn into_message(self) -> String {
        match self {
            FetchError::Retryable(m) | FetchError::Terminal(m) => m,
        }
    }
}

#[derive(Deserialize)]
struct SearchEnvelope {
    query: Option<SearchBody>,
}

#[derive(Deserialize)]
struct SearchBody {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Deserialize)]
#[serde(bound(deserialize = "T: serde::Deserialize<'de>"))]
struct PagesEnvelope<T> {
    query: Option<PagesBody<T>>,
}

#[derive(Deserialize)]
#[serde(bound(deserialize = "T: serde::Deserialize<'de>"))]
struct PagesBody<T> {
    #[serde(default)]
    pages: HashMap<String, T>,
}

#[derive(Deserialize)]
struct PageWire {
    #[serde(default)]
    title: String,
    // Present (as an empty string) when the API flags the entry.
    missing: Option<String>,
    invalid: Option<String>,
    extract: Option<String>,
    fullurl: Option<String>,
    pageprops: Option<PagePropsWire>,
}

#[derive(Deserialize)]
struct PagePropsWire {
    disambiguation: Option<String>,
}

#[derive(Deserialize)]
struct LinksWire {
    links: Option<Vec<LinkWire>>,
}

#[derive(Deserialize)]
struct LinkWire {
    title: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    const EXTRACT: &str = "Mercury is the smallest planet.\n\n\
        == Orbit ==\nIt orbits in 88 days.\n\n\
        == Exploration ==\n=== Mariner 10 ===\nFirst flyby in 1974.\n";

    #[tokio::test]
    async fn search_maps_ranked_titles() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(GET)
                .path("/w/api.php")
                .query_param("action", "query")
                .query_param("list", "search")
                .query_param("srsearch", "mercury planet");
            then.status(200).json_body(json!({
                "query": {"search": [
                    {"title": "Mercury (planet)"},
                    {"title": "Mercury (element)"},
                ]}
            }));
        });

        let cli = WikipediaRemote::new(server.base_url());
        let titles = cli.search("mercury planet").await.unwrap();
        m.assert();
        assert_eq!(titles, vec!["Mercury (planet)", "Mercury (element)"]);
    }

    #[tokio::test]
    async fn search_with_no_hits_is_empty() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/w/api.php").query_param("list", "search");
            then.status(200).json_body(json!({"query": {"search": []}}));
        });

        let cli = WikipediaRemote::new(server.base_url());
        assert!(cli.search("zzzz").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn page_parses_summary_url_and_sections() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET)
                .path("/w/api.php")
                .query_param("prop", "extracts|info|pageprops")
                .query_param("titles", "Mercury (planet)");
            then.status(200).json_body(json!({
                "query": {"pages": {"1234": {
                    "pageid": 1234,
                    "title": "Mercury (planet)",
                    "extract": EXTRACT,
                    "fullurl": "https://en.wikipedia.org/wiki/Mercury_(planet)",
                }}}
            }));
        });

        let cli = WikipediaRemote::new(server.base_url());
        let page = cli.page("Mercury (planet)").await.unwrap();
        assert_eq!(page.title, "Mercury (planet)");
        assert_eq!(page.summary, "Mercury is the smallest planet.");
        assert_eq!(page.url, "https://en.wikipedia.org/wiki/Mercury_(planet)");
        assert_eq!(page.sections, vec!["Orbit", "Exploration", "Mariner 10"]);
        assert_eq!(page.section("Orbit").as_deref(), Some("It orbits in 88 days."));
    }

    #[tokio::test]
    async fn missing_page_is_not_found() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET)
                .path("/w/api.php")
                .query_param("prop", "extracts|info|pageprops");
            then.status(200).json_body(json!({
                "query": {"pages": {"-1": {"title": "Nope", "missing": ""}}}
            }));
        });

        let cli = WikipediaRemote::new(server.base_url());
        let err = cli.page("Nope").await.unwrap_err();
        assert!(matches!(err, ProviderError::NotFound(t) if t == "Nope"));
    }

    #[tokio::test]
    async fn disambiguation_page_yields_ambiguous_with_options() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET)
                .path("/w/api.php")
                .query_param("prop", "extracts|info|pageprops");
            then.status(200).json_body(json!({
                "query": {"pages": {"99": {
                    "title": "Mercury",
                    "extract": "Mercury may refer to:",
                    "pageprops": {"disambiguation": ""},
                }}}
            }));
        });
        server.mock(|when, then| {
            when.method(GET).path("/w/api.php").query_param("prop", "links");
            then.status(200).json_body(json!({
                "query": {"pages": {"99": {"links": [
                    {"ns": 0, "title": "Mercury (planet)"},
                    {"ns": 0, "title": "Mercury (element)"},
                    {"ns": 0, "title": "Mercury (mythology)"},
                ]}}}
            }));
        });

        let cli = WikipediaRemote::new(server.base_url());
        let err = cli.page("Mercury").await.unwrap_err();
        match err {
            ProviderError::Ambiguous { title, options } => {
                assert_eq!(title, "Mercury");
                assert_eq!(
                    options,
                    vec![
                        "Mercury (planet)",
                        "Mercury (element)",
                        "Mercury (mythology)"
                    ]
                );
            }
            other => panic!("expected Ambiguous, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn server_errors_get_bounded_retries() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(GET).path("/w/api.php");
            then.status(500).body("err");
        });

        let cli = WikipediaRemote::new(server.base_url());
        let err = cli.search("x").await.unwrap_err();
        assert!(matches!(err, ProviderError::Upstream(m) if m.contains("retryable status")));
        // First try plus two retries.
        m.assert_hits(3);
    }

    #[tokio::test]
    async fn client_error_surfaces_as_upstream_without_retry() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(GET).path("/w/api.php");
            then.status(403).body("blocked");
        });

        let cli = WikipediaRemote::new(server.base_url());
        let err = cli.search("x").await.unwrap_err();
        assert!(matches!(err, ProviderError::Upstream(m) if m.contains("upstream status")));
        m.assert_hits(1);
    }

    #[tokio::test]
    async fn undecodable_body_is_terminal() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(GET).path("/w/api.php");
            then.status(200).body("<html>not json</html>");
        });

        let cli = WikipediaRemote::new(server.base_url());
        let err = cli.search("x").await.unwrap_err();
        assert!(matches!(err, ProviderError::Upstream(_)));
        m.assert_hits(1);
    }

    #[tokio::test]
    async fn it_sets_request_id_and_user_agent() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(GET)
                .path("/w/api.php")
                .header_exists("x-request-id")
                .header_exists("user-agent");
            then.status(200).json_body(json!({"query": {"search": []}}));
        });

        let cli = WikipediaRemote::new(server.base_url());
        let _ = cli.search("x").await.unwrap();
        m.assert();
    }

    #[tokio::test]
    async fn health_gets_200() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(GET)
                .path("/w/api.php")
                .header_exists("x-request-id")
                .header_exists("user-agent");
            then.status(200).json_body(json!({}));
        });

        let cli = WikipediaRemote::new(server.base_url());
        assert!(cli.health().await);
        m.assert();
    }
}
