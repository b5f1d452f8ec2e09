//! Wikipedia tool surface. Handler logic lives in [`tool_router`]; this
//! module owns the caller-facing error wording, which predates this
//! implementation and must not drift.

pub mod tool_router;

pub(crate) const NO_SEARCH_RESULTS: &str = "No results found for your query.";
pub(crate) const NO_PAGE_FOR_QUERY: &str = "No Wikipedia page could be loaded for this query.";
pub(crate) const NO_PAGE_FOR_TOPIC: &str = "No Wikipedia page could be loaded for this topic.";

const MAX_ALTERNATIVES: usize = 5;

pub(crate) fn ambiguous_message(options: &[String]) -> String {
    let shown: Vec<&str> = options
        .iter()
        .take(MAX_ALTERNATIVES)
        .map(String::as_str)
        .collect();
    format!("Ambiguous topic. Try one of these: {}", shown.join(", "))
}

pub(crate) fn section_not_found_message(section: &str, topic: &str) -> String {
    format!("Section '{section}' not found in the page '{topic}'.")
}

// The backticks (vs. straight quotes above) are load-bearing: existing
// callers match on the exact wording of each variant.
pub(crate) fn section_not_available_message(section: &str, topic: &str) -> String {
    format!("Section `{section}` is not available in the page `{topic}`.")
}
