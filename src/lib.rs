//! Schema-driven extraction of customers, agents and policies from carrier
//! web pages.
//!
//! Pipeline: carrier configuration → unique-entity extraction (customer,
//! agent) and paginated policy walk → aggregation into a store keyed by
//! carrier and natural key.

pub mod aggregate;
pub mod carrier;
pub mod carriers;
pub mod document;
pub mod error;
pub mod parser;
pub mod records;
pub mod report;
pub mod settings;
pub mod walker;

pub use aggregate::{AdapterFailure, AggregateStore, Aggregator, RunReport};
pub use carrier::{CarrierAdapter, NextLinkRule, Pagination, PolicyListing};
pub use document::{DocumentTree, Fetch, HttpFetcher};
pub use error::{ConfigError, ExtractionError, PaginationError, ScrapeError, TransportError};
pub use records::{Agent, Customer, Policy, PolicyKind, Record};
pub use walker::PolicyWalker;
