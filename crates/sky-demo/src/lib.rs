//! Sky Demo
//!
//! A whole day compressed into one minute of wall clock:
//! - `DemoClock`: stopped / running / paused transport with a session deadline
//! - `DemoSimulation`: closed-form sun, moon, wind and weather for a time offset
//! - `DemoCommand`: the transport and condition-select actions a UI can send

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use sky_weather::{Condition, WeatherError};

pub mod simulation;
pub mod transport;

// Re-exports
pub use simulation::{DemoSimulation, CYCLE_MS};
pub use transport::{DemoClock, DemoRunState, MAX_SESSION_MS};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DemoError {
    #[error("Unknown demo command: {0}")]
    UnknownCommand(String),
    #[error(transparent)]
    Condition(#[from] WeatherError),
}

pub type Result<T> = std::result::Result<T, DemoError>;

/// Actions offered by the demo controls
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "action", content = "condition", rename_all = "snake_case")]
pub enum DemoCommand {
    Play,
    Pause,
    Stop,
    /// Rewind simulated time to midnight of the first day
    Reset,
    /// Pin a condition, or `None` to go back to the shuffled scenario
    Force(Option<Condition>),
}

/// Label of the "no override" entry in the condition select
pub const AUTO: &str = "auto";

impl DemoCommand {
    /// Entries of the condition select: "auto" then every condition
    pub fn condition_options() -> Vec<String> {
        std::iter::once(AUTO.to_string())
            .chain(Condition::ALL.iter().map(|c| c.as_str().to_string()))
            .collect()
    }
}

impl fmt::Display for DemoCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Play => f.write_str("play"),
            Self::Pause => f.write_str("pause"),
            Self::Stop => f.write_str("stop"),
            Self::Reset => f.write_str("reset"),
            Self::Force(None) => f.write_str(AUTO),
            Self::Force(Some(c)) => write!(f, "{}", c),
        }
    }
}

impl FromStr for DemoCommand {
    type Err = DemoError;

    /// "play", "pause", "stop", "reset", "auto" or a condition name
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "" => Err(DemoError::UnknownCommand(s.to_string())),
            "play" => Ok(Self::Play),
            "pause" => Ok(Self::Pause),
            "stop" => Ok(Self::Stop),
            "reset" => Ok(Self::Reset),
            AUTO => Ok(Self::Force(None)),
            other => Ok(Self::Force(Some(other.parse::<Condition>()?))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!("play".parse::<DemoCommand>(), Ok(DemoCommand::Play));
        assert_eq!(" Pause ".parse::<DemoCommand>(), Ok(DemoCommand::Pause));
        assert_eq!("auto".parse::<DemoCommand>(), Ok(DemoCommand::Force(None)));
        assert_eq!(
            "snowy".parse::<DemoCommand>(),
            Ok(DemoCommand::Force(Some(Condition::Snowy)))
        );
        assert!(matches!(
            "hail".parse::<DemoCommand>(),
            Err(DemoError::Condition(WeatherError::UnknownCondition(_)))
        ));
        assert!(matches!(
            "".parse::<DemoCommand>(),
            Err(DemoError::UnknownCommand(_))
        ));
    }

    #[test]
    fn test_display_matches_parse() {
        for cmd in [
            DemoCommand::Play,
            DemoCommand::Stop,
            DemoCommand::Force(None),
            DemoCommand::Force(Some(Condition::ClearNight)),
        ] {
            assert_eq!(cmd.to_string().parse::<DemoCommand>(), Ok(cmd));
        }
    }

    #[test]
    fn test_condition_options() {
        let options = DemoCommand::condition_options();
        assert_eq!(options.len(), 10);
        assert_eq!(options[0], "auto");
        assert!(options.contains(&"lightning-rainy".to_string()));
    }

    #[test]
    fn test_command_json() {
        let json = serde_json::to_string(&DemoCommand::Force(Some(Condition::Fog))).unwrap();
        assert_eq!(json, r#"{"action":"force","condition":"fog"}"#);
        let play: DemoCommand = serde_json::from_str(r#"{"action":"play"}"#).unwrap();
        assert_eq!(play, DemoCommand::Play);
    }
}
