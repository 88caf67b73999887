//! Bank statement reconciliation against recorded fee payments
//!
//! A run parses the uploaded statement, keeps the credits, fetches the
//! recorded payments for the window the credits cover, then pairs them
//! greedily by exact amount and a small date tolerance.

pub mod engine;
pub mod export;
pub mod matcher;

pub use engine::*;
pub use export::{to_csv_string, to_json, write_csv};
pub use matcher::*;
