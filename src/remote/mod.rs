//! remote
//!
//! Abstraction over the content-management repository.
//!
//! # Architecture
//!
//! The `RepositoryClient` trait defines every read the engine performs and a
//! single write entry point, `execute`, that applies a [`Batch`] of typed
//! [`Mutation`]s. The engine never talks to a concrete client directly.
//!
//! - Reads materialize fresh records on every call
//! - Writes take effect only when a batch is executed
//! - Nothing is retried
//!
//! # Modules
//!
//! - `traits`: Core `RepositoryClient` trait, `RepoError`, and entity records
//! - `batch`: `Mutation` and `Batch`
//! - [`http`]: JSON gateway client over HTTP
//! - [`mock`]: In-memory implementation for deterministic testing
//!
//! # Example
//!
//! ```ignore
//! use sitegraft::remote::{http::HttpRepository, RepositoryClient};
//!
//! let client = HttpRepository::new("http://w15-sp/sites/ftclab", None)?;
//! for list in client.lists().await? {
//!     println!("{} (template {})", list.title, list.template);
//! }
//! ```

mod batch;
pub mod http;
pub mod mock;
mod traits;

pub use batch::{Batch, CheckInKind, Mutation};
pub use traits::*;
