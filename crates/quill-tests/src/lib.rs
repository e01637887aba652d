//! Integration test suite for Quill.
//!
//! Exercises the wallet and builder end to end: the documented payment
//! scenarios, conservation and determinism properties, and the async send
//! path against an in-memory ledger.

pub mod helpers;
