//! Inbound mailbox commands.
//!
//! Wire format (plain text, one command per mailbox write):
//! ```text
//! [sentinel] TAG | arg1 | arg2 ...
//!
//! VIBE|<intensity 0..1>|<duration_ms>     duration may be "quoted"
//! STOP
//! CONF|...                                reserved
//! ```
//!
//! The external writer may prefix one non-alphanumeric marker character;
//! it is dropped when the payload is longer than one character. Numeric
//! fields are parsed best-effort and fall back to 0 so a malformed field
//! never aborts the decode.

use core::time::Duration;

/// Field separator.
pub const SEPARATOR: char = '|';

/// Commands the mailbox can deliver into a session.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Add a stackable pulse of `amount` (already clamped to 0–1) for `duration`.
    Vibe { amount: f64, duration: Duration },

    /// Clear all pulses and stop the device.
    Stop,

    /// Reserved configuration command; carries its raw arguments.
    Conf(Vec<String>),

    /// Any other tag; carries the payload (sentinel already stripped).
    Unknown(String),
}

impl Command {
    /// The wire tag, for logging.
    pub fn tag(&self) -> &str {
        match self {
            Self::Vibe { .. } => "VIBE",
            Self::Stop => "STOP",
            Self::Conf(_) => "CONF",
            Self::Unknown(payload) => payload.split(SEPARATOR).next().unwrap_or_default(),
        }
    }
}

/// Decode one raw mailbox payload. Returns `None` for blank input.
pub fn decode(raw: &str) -> Option<Command> {
    let payload = strip_sentinel(raw.trim());
    if payload.is_empty() {
        return None;
    }

    let mut fields = payload.split(SEPARATOR);
    let tag = fields.next().unwrap_or_default();
    let args: Vec<&str> = fields.collect();

    let command = match tag {
        "VIBE" => Command::Vibe {
            amount: parse_intensity(args.first().copied()),
            duration: parse_duration(args.get(1).copied()),
        },
        "STOP" => Command::Stop,
        "CONF" => Command::Conf(args.iter().map(|a| (*a).to_string()).collect()),
        _ => Command::Unknown(payload.to_string()),
    };
    Some(command)
}

/// Drop a leading marker character written by the addon.
fn strip_sentinel(payload: &str) -> &str {
    let mut chars = payload.chars();
    match chars.next() {
        Some(first) if !first.is_alphanumeric() && chars.clone().next().is_some() => {
            chars.as_str()
        }
        _ => payload,
    }
}

/// Intensity field → 0–1. Unparseable input or NaN reads as 0; infinities
/// clamp like any other out-of-range value.
fn parse_intensity(field: Option<&str>) -> f64 {
    field
        .and_then(|f| f.trim().parse::<f64>().ok())
        .filter(|v| !v.is_nan())
        .unwrap_or(0.0)
        .clamp(0.0, 1.0)
}

/// Duration field (milliseconds, optionally quoted) → `Duration`.
/// Unparseable input reads as 0; negative values clamp to 0.
fn parse_duration(field: Option<&str>) -> Duration {
    let ms = field
        .and_then(|f| f.trim_matches('"').trim().parse::<i32>().ok())
        .unwrap_or(0)
        .max(0);
    Duration::from_millis(ms as u64)
}
