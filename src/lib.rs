//! A thin MCP gateway exposing Wikipedia lookups (best-match search, section
//! listing, section content) as tools. All substantive work happens in the
//! MediaWiki API; this crate registers the tools, forwards calls, and
//! normalizes provider failures into a uniform `{"error": ...}` result shape.

pub mod clients;
pub mod domain;
pub mod infra;
pub mod tools;
