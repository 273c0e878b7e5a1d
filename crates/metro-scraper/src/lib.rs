//! Category scraper for the Metro online store.
//!
//! [`Pipeline`] drives a browser [`engine::Engine`] from the site root to a
//! category listing, expands it, extracts every product card and writes a
//! JSON snapshot.

pub mod collect;
pub mod engine;
pub mod error;
pub mod export;
pub mod extract;
pub mod navigator;
pub mod normalize;
pub mod pagination;
pub mod pipeline;
pub mod policy;
pub mod selectors;
pub mod session;

#[cfg(test)]
mod test_logs;

pub use engine::chromium::ChromiumEngine;
pub use engine::fixture::{FixtureEngine, FixtureProbe, FixtureSite};
pub use error::{InteractionError, InteractionKind, ScraperError, Step};
pub use export::{export, to_json_string};
pub use pagination::PaginationReport;
pub use pipeline::{Pipeline, PipelineState, RunReport};
pub use selectors::SiteSelectors;
