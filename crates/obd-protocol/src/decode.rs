//! PID decode formulas: located data frames to physical values

use crate::codec;
use crate::error::ProtocolResult;
use crate::payload::{DecodedValue, SpeedUnit};
use crate::pid::Pid;

const KMH_TO_MPH: f64 = 0.621371;

/// Decode one raw device response for a PID into a telemetry value.
///
/// Tokenizes the response, locates the `41` + PID-suffix marker, then
/// applies the PID's formula to the data bytes after it. A response with
/// no frame decodes to [`DecodedValue::NoData`]; a located frame with
/// missing or non-hex data bytes decodes to [`DecodedValue::ParseFailure`]
/// carrying the original response text. Pure and panic-free on arbitrary
/// input.
pub fn decode(pid: &str, raw: &str, unit: SpeedUnit) -> DecodedValue {
    let toks = codec::tokens(raw);
    let Some(index) = codec::locate(&toks, pid) else {
        return DecodedValue::NoData(codec::clean(raw));
    };
    decode_frame(pid, raw, &toks, index, unit)
        .unwrap_or_else(|_| DecodedValue::ParseFailure(raw.to_string()))
}

fn decode_frame(
    pid: &str,
    raw: &str,
    toks: &[&str],
    index: usize,
    unit: SpeedUnit,
) -> ProtocolResult<DecodedValue> {
    // A frame matched the suffix but the full code is not one we decode:
    // hand the cleaned text through untouched.
    let Some(known) = Pid::from_code(pid) else {
        return Ok(DecodedValue::Raw(codec::clean(raw)));
    };

    let a = codec::extract_byte(toks, index, 2)?;
    let value = match known {
        Pid::Rpm => {
            let b = codec::extract_byte(toks, index, 3)?;
            let rpm = f64::from(u32::from(a) * 256 + u32::from(b)) / 4.0;
            // quarter-RPM ties resolve to the even neighbor
            DecodedValue::Rpm(rpm.round_ties_even() as u32)
        }
        Pid::Speed => match unit {
            SpeedUnit::Kmh => DecodedValue::SpeedKmh(u16::from(a)),
            SpeedUnit::Mph => {
                let mph = f64::from(a) * KMH_TO_MPH;
                DecodedValue::SpeedMph((mph * 10.0).round() / 10.0)
            }
        },
        Pid::Throttle | Pid::EngineLoad => DecodedValue::Percent(f64::from(a) * 100.0 / 255.0),
        Pid::CoolantTemp | Pid::IntakeTemp => DecodedValue::Celsius(i16::from(a) - 40),
        Pid::Maf => {
            let b = codec::extract_byte(toks, index, 3)?;
            DecodedValue::GramsPerSecond((f64::from(a) * 256.0 + f64::from(b)) / 100.0)
        }
    };
    Ok(value)
}
