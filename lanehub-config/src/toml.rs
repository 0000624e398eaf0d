//! TOML unit configuration
//!
//! Each lane is a `[lane.<name>]` table; keys not given take the
//! [`LaneConfig`] defaults. Lanes are stored in name order.

use alloc::collections::BTreeMap;
use alloc::string::String;

use serde::Deserialize;

use lanehub_core::config::{LaneConfig, LaneConfigError, UnitConfig, CONFIG_VERSION, MAX_LABEL_LEN};

/// Parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Not valid TOML, or a value has the wrong type
    Syntax,
    /// Lane name is empty or longer than the label capacity
    InvalidLaneName,
    /// More lanes than the unit supports
    TooManyLanes,
    /// Parsed configuration failed validation
    Invalid(LaneConfigError),
}

impl From<LaneConfigError> for ParseError {
    fn from(e: LaneConfigError) -> Self {
        ParseError::Invalid(e)
    }
}

fn default_version() -> u8 {
    CONFIG_VERSION
}

#[derive(Deserialize)]
struct UnitDocument {
    #[serde(default = "default_version")]
    version: u8,
    #[serde(default)]
    lane: BTreeMap<String, LaneConfig>,
}

/// Parse TOML configuration into a validated [`UnitConfig`]
pub fn parse_config(input: &str) -> Result<UnitConfig, ParseError> {
    let document: UnitDocument = ::toml::from_str(input).map_err(|_| ParseError::Syntax)?;

    let mut config = UnitConfig::new();
    config.version = document.version;

    for (name, mut lane) in document.lane {
        if name.is_empty() || name.len() > MAX_LABEL_LEN {
            return Err(ParseError::InvalidLaneName);
        }
        // Table key names the lane
        lane.name.clear();
        lane.name
            .push_str(&name)
            .map_err(|_| ParseError::InvalidLaneName)?;

        config
            .lanes
            .push(lane)
            .map_err(|_| ParseError::TooManyLanes)?;
    }

    config.validate()?;
    Ok(config)
}
