//! Shared item store contract tests.
//!
//! Tests the ItemStore interface against all implementations.
//! Each backend test binary imports these functions and runs them.

pub mod item_store_tests;
