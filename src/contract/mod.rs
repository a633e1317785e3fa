//! # Contract Module
//!
//! Bindings and wrappers for the contracts bundled with this crate.

pub mod counter;

pub use counter::{Counter, CounterContract, CounterMiddleware};
