//! # scour - Terminal Search Console
//!
//! This crate implements a client for a remote post search service: a
//! free-text and structured-filter query builder, request orchestration with
//! latest-request-wins sequencing, an in-memory result cache, and the
//! presentation layer that turns hits into display cards and detail views.
//!
//! ## Features
//!
//! - Static searchable-field schema with per-type operator vocabularies
//! - Dynamic filter rule builder with stable rule handles
//! - One HTTP client covering all backend routes (plain, structured,
//!   similarity, delete)
//! - Session-scoped result cache, rebuilt on every successful response
//! - Pure, independently testable hit/detail formatting
//! - Async API with Tokio
//! - Robust error handling and logging
//!
//! ## Example
//!
//! ```rust,no_run
//! use scour::http::SearchClient;
//! use scour::query::{RuleSet, SearchRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = SearchClient::new("http://localhost:5000")?;
//!
//!     // One rule: the default field (Likes) at its default operator (>=)
//!     let mut rules = RuleSet::new();
//!     let rule = rules.add_rule();
//!     rules.set_value(rule, "100");
//!
//!     let request = SearchRequest::from_input("election", rules.serialize_non_empty())
//!         .expect("query is not empty");
//!
//!     for hit in client.execute(&request).await? {
//!         println!("{} ({:.2})", hit.id, hit.score);
//!     }
//!     Ok(())
//! }
//! ```

mod error;

pub mod http;
pub mod query;
pub mod results;
pub mod schema;

pub use error::Error;

/// Re-export of types module for public use
pub mod prelude {
    pub use crate::error::Error;
    pub use crate::error::Result;
}
