//! Test harness for CLI integration tests.
//!
//! Provides isolated config environments and CLI assertion helpers using
//! `assert_cmd`.

mod command;
mod env;

// Re-export main types for external use
#[allow(unused_imports)]
pub use command::BriefingCommand;
#[allow(unused_imports)]
pub use env::TestEnv;
