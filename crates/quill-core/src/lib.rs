//! # quill-core
//! Note model, lock conditions, engine settings, and transaction types for
//! the Quill transaction engine.

pub mod constants;
pub mod crypto;
pub mod error;
pub mod lock;
pub mod settings;
pub mod traits;
pub mod tx;
pub mod types;
