//! core
//!
//! Core domain types, configuration, and file I/O for tagscribe.
//!
//! # Modules
//!
//! - [`types`] - Tags, items, events, and instants
//! - [`config`] - Configuration schema and loading
//! - [`base_changelog`] - Reading an existing changelog to append
//! - [`output`] - Writing the rendered changelog
//!
//! # Design Principles
//!
//! - Typed records instead of loose maps
//! - Schemas are strict and self-describing
//! - Writes are atomic

pub mod base_changelog;
pub mod config;
pub mod output;
pub mod types;
