//! Inbound control messages and their dispatch onto the scheduler.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CommandError;
use crate::popup::WindowHost;
use crate::scheduler::{AlarmHost, BreakScheduler};
use crate::settings::StateStore;

pub use crate::scheduler::{SchedulerMode, SchedulerStatus};

/// Smallest interval the settings page lets through.
pub const MIN_INTERVAL_MINUTES: f64 = 0.1;

/// Quick picks offered next to the free-form interval field.
pub const PRESET_MINUTES: [f64; 5] = [1.0, 5.0, 15.0, 30.0, 60.0];

/// One week. Longer intervals cannot be armed as a timer.
pub const MAX_INTERVAL_MINUTES: f64 = 7.0 * 24.0 * 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CommandMessage", into = "CommandMessage")]
pub enum Command {
    StartTimer { interval_minutes: f64 },
    StopTimer,
    SetInterval { interval_minutes: f64 },
}

/// Wire shape: `{"action": "...", "value": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandMessage {
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl TryFrom<CommandMessage> for Command {
    type Error = CommandError;

    fn try_from(msg: CommandMessage) -> Result<Self, Self::Error> {
        let value = || msg.value.as_ref().unwrap_or(&Value::Null);
        match msg.action.as_str() {
            "startTimer" => Ok(Command::StartTimer {
                interval_minutes: parse_interval(value())?,
            }),
            "stopTimer" => Ok(Command::StopTimer),
            "setInterval" => Ok(Command::SetInterval {
                interval_minutes: parse_interval(value())?,
            }),
            other => Err(CommandError::Malformed(format!("unknown action {other:?}"))),
        }
    }
}

impl From<Command> for CommandMessage {
    fn from(command: Command) -> Self {
        let (action, value) = match command {
            Command::StartTimer { interval_minutes } => ("startTimer", Some(interval_minutes)),
            Command::StopTimer => ("stopTimer", None),
            Command::SetInterval { interval_minutes } => ("setInterval", Some(interval_minutes)),
        };
        CommandMessage {
            action: action.to_string(),
            value: value.map(Value::from),
        }
    }
}

impl Command {
    /// Parses a raw JSON message, keeping the precise rejection reason.
    pub fn from_json(value: Value) -> Result<Self, CommandError> {
        let msg: CommandMessage =
            serde_json::from_value(value).map_err(|e| CommandError::Malformed(e.to_string()))?;
        Command::try_from(msg)
    }
}

/// Accepts a JSON number or a numeric string, in minutes.
pub fn parse_interval(value: &Value) -> Result<f64, CommandError> {
    let minutes = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match minutes {
        Some(m) => validate_minutes(m),
        None => Err(CommandError::InvalidInterval(value.to_string())),
    }
}

pub fn validate_minutes(minutes: f64) -> Result<f64, CommandError> {
    if !minutes.is_finite() || minutes <= 0.0 {
        return Err(CommandError::InvalidInterval(minutes.to_string()));
    }
    if minutes < MIN_INTERVAL_MINUTES {
        return Err(CommandError::IntervalTooShort(minutes));
    }
    if minutes > MAX_INTERVAL_MINUTES {
        return Err(CommandError::IntervalTooLong(minutes));
    }
    Ok(minutes)
}

pub fn dispatch<A, W, S>(
    scheduler: &mut BreakScheduler<A, W, S>,
    command: Command,
) -> Result<SchedulerStatus, CommandError>
where
    A: AlarmHost,
    W: WindowHost,
    S: StateStore,
{
    match command {
        Command::StartTimer { interval_minutes } => scheduler.start(interval_minutes)?,
        Command::StopTimer => scheduler.stop(),
        Command::SetInterval { interval_minutes } => scheduler.set_interval(interval_minutes)?,
    }
    Ok(scheduler.status())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_interval_accepts_numbers_and_numeric_strings() {
        assert_eq!(parse_interval(&json!(5)), Ok(5.0));
        assert_eq!(parse_interval(&json!("2.5")), Ok(2.5));
        assert_eq!(parse_interval(&json!(" 15 ")), Ok(15.0));
    }

    #[test]
    fn parse_interval_rejects_garbage() {
        for bad in [json!("abc"), json!(null), json!(true), json!(0), json!(-3), json!("-1")] {
            assert!(
                matches!(parse_interval(&bad), Err(CommandError::InvalidInterval(_))),
                "{bad} should be rejected"
            );
        }
        assert_eq!(
            parse_interval(&json!(0.05)),
            Err(CommandError::IntervalTooShort(0.05))
        );
    }

    #[test]
    fn messages_round_trip_through_the_wire_shape() {
        let cmd: Command =
            serde_json::from_value(json!({"action": "setInterval", "value": "30"})).expect("parse");
        assert_eq!(cmd, Command::SetInterval { interval_minutes: 30.0 });

        let stop: Command = serde_json::from_value(json!({"action": "stopTimer"})).expect("parse");
        assert_eq!(stop, Command::StopTimer);

        let wire = serde_json::to_value(Command::StartTimer { interval_minutes: 5.0 }).expect("serialize");
        assert_eq!(wire, json!({"action": "startTimer", "value": 5.0}));
    }

    #[test]
    fn from_json_reports_reason() {
        assert!(matches!(
            Command::from_json(json!({"action": "explode"})),
            Err(CommandError::Malformed(_))
        ));
        assert!(matches!(
            Command::from_json(json!({"action": "startTimer", "value": "soon"})),
            Err(CommandError::InvalidInterval(_))
        ));
        assert!(matches!(
            Command::from_json(json!([1, 2])),
            Err(CommandError::Malformed(_))
        ));
    }

    #[test]
    fn parse_interval_rejects_intervals_longer_than_a_week() {
        assert_eq!(parse_interval(&json!(1e300)), Err(CommandError::IntervalTooLong(1e300)));
        assert_eq!(
            parse_interval(&json!("20000")),
            Err(CommandError::IntervalTooLong(20000.0))
        );
        assert_eq!(parse_interval(&json!(MAX_INTERVAL_MINUTES)), Ok(MAX_INTERVAL_MINUTES));
    }

    #[test]
    fn presets_are_all_valid() {
        for preset in PRESET_MINUTES {
            assert_eq!(validate_minutes(preset), Ok(preset));
        }
    }
}
