//! Core library components.
//!
//! This module contains the secret sync engine: target selection, store
//! lookup, format conversion, and crash-safe file writes.

pub mod atomic;
pub mod constants;
pub mod domain;
pub mod dotenv;
pub mod index;
pub mod manifest;
pub mod select;
pub mod settings;
pub mod store;
pub mod sync;
