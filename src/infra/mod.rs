//! API clients and secret lookup

pub mod linear;
pub mod obsidian;
pub mod secrets;
pub mod slack;

pub use linear::{IssueNode, IssueQuery, LinearClient, LinearError, Viewer};
pub use obsidian::{ObsidianClient, ObsidianError, Vault};
pub use secrets::{SecretError, SecretSpec};
pub use slack::{SlackClient, SlackError};
