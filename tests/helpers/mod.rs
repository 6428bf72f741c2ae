//! Shared grammar, fixtures and assertions for the integration tests

pub mod fixtures;
pub mod grammar;
pub mod tree_assertions;
