//! Bloomery Core - Shared types library.
//!
//! This crate provides the domain types used across the Bloomery client
//! components:
//! - `client` - HTTP client, retry machinery, and the store/background caches
//! - `integration-tests` - Hermetic end-to-end tests against a mock API
//!
//! # Architecture
//!
//! The core crate contains only types and their merge/derivation logic - no
//! I/O, no HTTP clients, no async. This keeps it lightweight and allows it to
//! be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, prices, and the hero/settings/announcement/
//!   background wire types

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
