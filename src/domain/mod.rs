//! Core types: Document sections, Slack text, countdowns

mod countdown;
mod section;
mod slack_text;

pub use countdown::{AnnualEvent, Countdown, ParseEventError};
pub use section::{DEFAULT_SECTION_LEVEL, Document, SectionInsert, header_level, target_level};
pub use slack_text::{
    PriorityUsers, UserDirectory, clean_slack_text, fallback_permalink, format_slack_timestamp,
};
