//! Core types and trait definitions for Flightwatch.
//!
//! This crate is deliberately free of HTTP and database dependencies. It
//! holds the domain records, the lookup decision engine, and the two seams
//! everything else plugs into: [`store::FlightStore`] for persistence and the
//! provider traits in [`provider`] for the flight-data and weather APIs.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod decision;
pub mod error;
pub mod flight;
pub mod forecast;
pub mod provider;
pub mod schedule;
pub mod store;

pub use error::{Error, ProviderError, Result};
