//! Charforge End-to-End Test Support
//!
//! Shared harness for the journey tests:
//! - [`harness::TestDatabaseManager`]: isolated on-disk databases
//! - [`mocks::TestDataFactory`]: realistic records and scenarios

pub mod harness;
pub mod mocks;

pub use harness::TestDatabaseManager;
pub use mocks::{TestDataFactory, TestScenario};
