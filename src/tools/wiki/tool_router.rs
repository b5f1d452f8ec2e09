//! The three Wikipedia tools. Each operation is one (or two) provider calls
//! plus translation of the closed provider error set into the uniform
//! `{"error": ...}` result shape. Anything outside that set is a real fault
//! and crosses the boundary as a JSON-RPC internal error instead.

use std::future::Future;
use std::sync::Arc;

use rmcp::handler::server::tool::{Parameters, ToolRouter};
use rmcp::model::JsonObject;
use rmcp::ErrorData as McpError;
use rmcp::ServerHandler;
use serde_json::json;

use super::{
    ambiguous_message, section_not_available_message, section_not_found_message,
    NO_PAGE_FOR_QUERY, NO_PAGE_FOR_TOPIC, NO_SEARCH_RESULTS,
};
use crate::clients::wikipedia::WikipediaRemote;
use crate::domain::{ProviderError, WikiProvider};
use crate::infra::config::wikipedia_base_url_from_env;

#[derive(Clone)]
pub struct WikiSvc {
    provider: Arc<dyn WikiProvider>,
}

impl WikiSvc {
    pub fn new(provider: Arc<dyn WikiProvider>) -> Self {
        Self { provider }
    }

    pub fn from_base_url(base: impl Into<String>) -> Self {
        Self::new(Arc::new(WikipediaRemote::new(base)))
    }

    pub fn from_env() -> Self {
        Self::from_base_url(wikipedia_base_url_from_env())
    }

    pub fn router() -> WikiRouter {
        // Wrapper to expose the macro-generated private tool_router
        Self::tool_router()
    }
}

impl ServerHandler for WikiSvc {}

pub type WikiRouter = ToolRouter<WikiSvc>;

/// Factory shape required by the rmcp stdio and streamable HTTP transports.
pub fn factory_with_provider(provider: Arc<dyn WikiProvider>) -> (WikiSvc, WikiRouter) {
    (WikiSvc::new(provider), WikiSvc::router())
}

pub fn factory_from_env() -> (WikiSvc, WikiRouter) {
    (WikiSvc::from_env(), WikiSvc::router())
}

fn require_str(params: &JsonObject, field: &str) -> Result<String, McpError> {
    params
        .get(field)
        .and_then(|v| v.as_str())
        .map(str::to_owned)
        .ok_or_else(|| {
            McpError::invalid_params(format!("missing required field: {field}"), None)
        })
}

fn error_payload(message: impl Into<String>) -> rmcp::Json<serde_json::Value> {
    rmcp::Json(json!({ "error": message.into() }))
}

#[rmcp::tool_router]
impl WikiSvc {
    #[rmcp::tool(
        name = "fetch_best_match",
        description = "Search Wikipedia for a topic and return title, summary, and URL of the best match."
    )]
    async fn fetch_best_match(
        &self,
        params: Parameters<JsonObject>,
    ) -> Result<rmcp::Json<serde_json::Value>, McpError> {
        let query = require_str(&params.0, "query")?;
        tracing::debug!(query = %query, "fetch_best_match invoked");

        let results = self
            .provider
            .search(&query)
            .await
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;
        let Some(best_match) = results.first() else {
            return Ok(error_payload(NO_SEARCH_RESULTS));
        };

        match self.provider.page(best_match).await {
            Ok(page) => Ok(rmcp::Json(json!({
                "title": page.title,
                "summary": page.summary,
                "url": page.url,
            }))),
            Err(ProviderError::NotFound(_)) => Ok(error_payload(NO_PAGE_FOR_QUERY)),
            Err(ProviderError::Ambiguous { options, .. }) => {
                Ok(error_payload(ambiguous_message(&options)))
            }
            Err(ProviderError::Upstream(m)) => Err(McpError::internal_error(m, None)),
        }
    }

    #[rmcp::tool(
        name = "list_sections",
        description = "List sections of a Wikipedia page for a given topic."
    )]
    async fn list_sections(
        &self,
        params: Parameters<JsonObject>,
    ) -> Result<rmcp::Json<serde_json::Value>, McpError> {
        let topic = require_str(&params.0, "topic")?;
        tracing::debug!(topic = %topic, "list_sections invoked");

        match self.provider.page(&topic).await {
            Ok(page) => Ok(rmcp::Json(json!({
                "title": page.title,
                "sections": page.sections,
            }))),
            Err(ProviderError::NotFound(_)) => Ok(error_payload(NO_PAGE_FOR_TOPIC)),
            Err(ProviderError::Ambiguous { options, .. }) => {
                Ok(error_payload(ambiguous_message(&options)))
            }
            Err(ProviderError::Upstream(m)) => Err(McpError::internal_error(m, None)),
        }
    }

    #[rmcp::tool(
        name = "get_section_content",
        description = "Get the content of a specific section from a Wikipedia page."
    )]
    async fn get_section_content(
        &self,
        params: Parameters<JsonObject>,
    ) -> Result<rmcp::Json<serde_json::Value>, McpError> {
        let topic = require_str(&params.0, "topic")?;
        let section = require_str(&params.0, "section")?;
        tracing::debug!(topic = %topic, section = %section, "get_section_content invoked");

        let page = match self.provider.page(&topic).await {
            Ok(page) => page,
            Err(ProviderError::NotFound(_)) => return Ok(error_payload(NO_PAGE_FOR_TOPIC)),
            Err(ProviderError::Ambiguous { options, .. }) => {
                return Ok(error_payload(ambiguous_message(&options)))
            }
            Err(ProviderError::Upstream(m)) => return Err(McpError::internal_error(m, None)),
        };

        // Heading absent vs. heading present but content-less are distinct
        // conditions with distinct messages.
        if !page.sections.iter().any(|s| s == &section) {
            return Ok(error_payload(section_not_found_message(&section, &topic)));
        }
        match page.section(&section) {
            None => Ok(error_payload(section_not_available_message(&section, &topic))),
            Some(content) => Ok(rmcp::Json(json!({
                "title": page.title,
                "section": section,
                "content": content,
            }))),
        }
    }
}
