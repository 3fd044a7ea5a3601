//! core
//!
//! Core domain types, documents, and configuration for sitegraft.
//!
//! # Modules
//!
//! - [`types`] - Strong types: ServerPath, CheckoutState, ViewKind, etc.
//! - [`paths`] - Server-relative path rebasing and file-name checks
//! - [`settings`] - Branding settings document
//! - [`layouts`] - Available page layout registry encoding
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Parsing is strict; nothing here touches the network

pub mod config;
pub mod layouts;
pub mod paths;
pub mod settings;
pub mod types;
