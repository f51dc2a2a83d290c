//! Telemetry payload types pushed to streaming clients

use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};

use crate::pid::Pid;

/// Per-client speed unit preference
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SpeedUnit {
    /// Kilometres per hour (device-native)
    #[default]
    Kmh,
    /// Miles per hour
    Mph,
}

impl SpeedUnit {
    /// The other unit
    pub fn toggled(self) -> SpeedUnit {
        match self {
            SpeedUnit::Kmh => SpeedUnit::Mph,
            SpeedUnit::Mph => SpeedUnit::Kmh,
        }
    }

    /// Unit tag as it appears in payloads
    pub fn as_str(self) -> &'static str {
        match self {
            SpeedUnit::Kmh => "km/h",
            SpeedUnit::Mph => "mph",
        }
    }
}

impl fmt::Display for SpeedUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SpeedUnit {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// One decoded metric as it appears in a telemetry payload.
///
/// Values serialize as the human-readable strings a dashboard displays,
/// e.g. `"1726 RPM"` or `"55.9 mph"`. Decode failures are carried inline
/// as diagnostic strings so one bad tick never drops the stream.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedValue {
    /// Engine speed in revolutions per minute
    Rpm(u32),
    /// Vehicle speed in km/h
    SpeedKmh(u16),
    /// Vehicle speed in mph, one decimal
    SpeedMph(f64),
    /// Percentage, one decimal
    Percent(f64),
    /// Temperature in °C
    Celsius(i16),
    /// Mass flow in g/s, two decimals
    GramsPerSecond(f64),
    /// Cleaned response text for PIDs without a decode formula
    Raw(String),
    /// Response carried no recognizable data frame
    NoData(String),
    /// Frame was located but its data bytes were missing or malformed
    ParseFailure(String),
}

impl fmt::Display for DecodedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodedValue::Rpm(v) => write!(f, "{v} RPM"),
            DecodedValue::SpeedKmh(v) => write!(f, "{v} km/h"),
            DecodedValue::SpeedMph(v) => write!(f, "{v:.1} mph"),
            DecodedValue::Percent(v) => write!(f, "{v:.1}%"),
            DecodedValue::Celsius(v) => write!(f, "{v} °C"),
            DecodedValue::GramsPerSecond(v) => write!(f, "{v:.2} g/s"),
            DecodedValue::Raw(text) => f.write_str(text),
            DecodedValue::NoData(clean) => write!(f, "No valid data: {clean}"),
            DecodedValue::ParseFailure(raw) => write!(f, "Parse error: {raw}"),
        }
    }
}

impl Serialize for DecodedValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

/// One telemetry tick as pushed to a client.
///
/// The four standard metrics keep their fixed key names; supplementary
/// PIDs land in `extras` keyed by metric name, and PIDs without a known
/// metric keep their code as the key.
#[derive(Debug, Clone, Serialize)]
pub struct TelemetryPayload {
    #[serde(rename = "RPM", skip_serializing_if = "Option::is_none")]
    pub rpm: Option<DecodedValue>,
    #[serde(rename = "Speed", skip_serializing_if = "Option::is_none")]
    pub speed: Option<DecodedValue>,
    #[serde(rename = "Throttle", skip_serializing_if = "Option::is_none")]
    pub throttle: Option<DecodedValue>,
    #[serde(rename = "Coolant Temp", skip_serializing_if = "Option::is_none")]
    pub coolant_temp: Option<DecodedValue>,
    #[serde(flatten)]
    pub extras: BTreeMap<String, DecodedValue>,
    #[serde(rename = "SpeedUnit")]
    pub speed_unit: SpeedUnit,
}

impl TelemetryPayload {
    /// Start an empty payload carrying the session's active unit
    pub fn new(speed_unit: SpeedUnit) -> Self {
        TelemetryPayload {
            rpm: None,
            speed: None,
            throttle: None,
            coolant_temp: None,
            extras: BTreeMap::new(),
            speed_unit,
        }
    }

    /// Record a decoded metric under the PID's payload key
    pub fn insert(&mut self, pid: Pid, value: DecodedValue) {
        match pid {
            Pid::Rpm => self.rpm = Some(value),
            Pid::Speed => self.speed = Some(value),
            Pid::Throttle => self.throttle = Some(value),
            Pid::CoolantTemp => self.coolant_temp = Some(value),
            _ => {
                self.extras.insert(pid.metric().to_string(), value);
            }
        }
    }

    /// Record a metric under an explicit key, for PIDs outside the known set
    pub fn insert_extra(&mut self, key: impl Into<String>, value: DecodedValue) {
        self.extras.insert(key.into(), value);
    }
}
