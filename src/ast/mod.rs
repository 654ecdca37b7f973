//! Stack file types - YAML → Rust declarations

mod stack;

pub use stack::{ResourceDecl, Stack, SCHEMA_V01};
