//! Update and deprecation resolution engine for npm package comparators
//!
//! Resolves, for a `(package name, comparator)` pair, whether a newer version
//! exists and whether the package is deprecated or abandoned, against one or
//! more npm-compatible registries. Consumed by editor tooling but
//! editor-agnostic: pure resolution logic plus a TTL result cache and a
//! bounded-concurrency scan orchestrator.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌─────────────┐     ┌──────────────┐
//! │ UpdateEngine │────▶│  ScanCache  │     │ RegistryClient│
//! │ (orchestrate)│     │ (TTL store) │     │   (queries)  │
//! └──────┬───────┘     └─────────────┘     └──────▲───────┘
//!        │                                        │
//!        ▼                                        │
//! ┌──────────────┐     ┌─────────────┐     ┌──────┴───────┐
//! │  comparator  │     │    range    │     │  registries  │
//! │ alias (class)│     │ (matching)  │     │    (npm)     │
//! └──────────────┘     └─────────────┘     └──────────────┘
//! ```
//!
//! # Modules
//!
//! - [`engine`]: engine façade, scan orchestration, progress counters
//! - [`update`] / [`deprecation`]: the two resolvers
//! - [`cache`]: TTL- and comparator-scoped result cache
//! - [`comparator`] / [`alias`]: comparator classification and alias rewriting
//! - [`range`]: loose semver parsing and comparator range matching
//! - [`registry`] / [`registries`]: registry seam and the npm client
//! - [`config`]: resolution-time configuration
//! - [`types`]: resolution result types

pub mod alias;
pub mod cache;
pub mod comparator;
pub mod config;
pub mod deprecation;
pub mod engine;
pub mod error;
pub mod range;
pub mod registries;
pub mod registry;
pub mod types;
pub mod update;

pub use config::ResolverConfig;
pub use engine::{ScanProgress, UpdateEngine};
pub use registries::NpmRegistryClient;
pub use registry::RegistryClient;
pub use types::{
    Deprecation, DeprecationKind, Replacement, Update, UpdateChannel, Versions,
};
