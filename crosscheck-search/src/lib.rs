//! Crosscheck Search Layer
//!
//! Clients for the external web-search collaborator:
//! - Provider trait and shared handle
//! - Brave Search API client
//! - DuckDuckGo HTML endpoint client (no API key required)

pub mod brave;
pub mod duckduckgo;
pub mod provider;

pub use brave::*;
pub use duckduckgo::*;
pub use provider::*;
