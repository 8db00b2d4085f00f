//! Serializable strategy configuration.

use crate::error::ConfigError;
use crate::feed::FeedKeys;
use crate::sizing::SizingPolicy;
use serde::{Deserialize, Serialize};

/// Everything the decision core needs to be constructed.
///
/// Every field has a default, so an empty TOML table is a valid config.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    pub sizing: SizingPolicy,
    pub feed: FeedKeys,
}

impl StrategyConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.sizing.validate()?;
        self.feed.validate()
    }
}
