//! Shared fixtures for codedrive integration tests.

pub mod harness;

pub use harness::TestHarness;
