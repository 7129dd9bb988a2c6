//! Severity level definitions
//!
//! Levels follow the syslog ordering: the smaller the ordinal, the more
//! severe the level. A logger configured with a maximum level lets through
//! every entry whose level is at least as severe as that maximum.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u8)]
pub enum Level {
    Emergency = 0,
    Alert = 1,
    Critical = 2,
    Error = 3,
    Warning = 4,
    Notice = 5,
    Info = 6,
    #[default]
    Debug = 7,
}

impl Level {
    /// Every level, most severe first
    pub const ALL: [Level; 8] = [
        Level::Emergency,
        Level::Alert,
        Level::Critical,
        Level::Error,
        Level::Warning,
        Level::Notice,
        Level::Info,
        Level::Debug,
    ];

    pub fn to_str(&self) -> &'static str {
        match self {
            Level::Emergency => "Emergency",
            Level::Alert => "Alert",
            Level::Critical => "Critical",
            Level::Error => "Error",
            Level::Warning => "Warning",
            Level::Notice => "Notice",
            Level::Info => "Info",
            Level::Debug => "Debug",
        }
    }

    #[inline]
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    pub fn from_ordinal(ordinal: u8) -> Option<Self> {
        Self::ALL.get(usize::from(ordinal)).copied()
    }

    /// Whether an entry of this level passes a `max` threshold
    #[inline]
    pub fn passes(self, max: Level) -> bool {
        self <= max
    }

    #[cfg(feature = "console")]
    pub fn color_code(&self) -> colored::Color {
        use colored::Color::*;
        match self {
            Level::Emergency | Level::Alert => BrightMagenta,
            Level::Critical => BrightRed,
            Level::Error => Red,
            Level::Warning => Yellow,
            Level::Notice => Cyan,
            Level::Info => Green,
            Level::Debug => BrightBlack,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_str())
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "emergency" | "emerg" => Ok(Level::Emergency),
            "alert" => Ok(Level::Alert),
            "critical" | "crit" => Ok(Level::Critical),
            "error" | "err" => Ok(Level::Error),
            "warning" | "warn" => Ok(Level::Warning),
            "notice" => Ok(Level::Notice),
            "info" => Ok(Level::Info),
            "debug" => Ok(Level::Debug),
            _ => Err(format!("Invalid log level: '{}'", s)),
        }
    }
}

impl Serialize for Level {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.to_str())
    }
}

/// Configuration files may name a level or give its ordinal
#[derive(Deserialize)]
#[serde(untagged)]
enum LevelRepr {
    Ordinal(u64),
    Name(String),
}

impl<'de> Deserialize<'de> for Level {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match LevelRepr::deserialize(deserializer)? {
            LevelRepr::Ordinal(n) => u8::try_from(n)
                .ok()
                .and_then(Level::from_ordinal)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid level ordinal {}", n))),
            LevelRepr::Name(name) => name.parse().map_err(serde::de::Error::custom),
        }
    }
}
