//! ui
//!
//! User-facing output.
//!
//! # Modules
//!
//! - [`markdown`] - Rendering changelog windows and the final document
//! - [`output`] - Progress and status messages on the terminal
//!
//! # Design
//!
//! Terminal messages go through [`output`] so quiet mode is honored in one
//! place. Rendering is pure and never prints.

pub mod markdown;
pub mod output;
