//! Sitegraft - Replace deprecated lists and branding in a document repository
//!
//! Sitegraft migrates a site away from a retired list template and swaps its
//! master pages and page layouts for new ones. Every change goes through the
//! repository's own versioning rules: documents are checked out, checked
//! in, published and approved exactly as a site owner would.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to engine)
//! - [`engine`] - Schema reconciliation, content migration, document
//!   workflow and reference rewriting
//! - [`core`] - Domain types, settings documents, layout registries, config
//! - [`remote`] - Repository client trait, mutation batches, HTTP gateway
//!   and in-memory mock
//! - [`ui`] - Output formatting
//!
//! # Guarantees
//!
//! 1. Schema reconciliation is idempotent: a second run changes nothing
//! 2. Each batch is submitted whole; an empty batch is never sent
//! 3. A document left checked out by a failed run is taken over by the next run

pub mod cli;
pub mod core;
pub mod engine;
pub mod remote;
pub mod ui;
