//! Simulated engine model
//!
//! A random walk over plausible driving ranges, shared by every
//! connection so concurrent clients see one consistent vehicle.

use parking_lot::RwLock;
use rand::Rng;

/// Shared engine state behind a read-write lock
pub struct SimulatedEngine {
    state: RwLock<EngineState>,
}

struct EngineState {
    /// rev/min
    rpm: f64,
    /// km/h
    speed: f64,
    /// percent
    throttle: f64,
    /// °C
    coolant: f64,
    /// percent
    load: f64,
    /// °C
    intake: f64,
    /// g/s
    maf: f64,
    /// battery volts
    voltage: f64,
}

impl SimulatedEngine {
    /// Start at a warm idle
    pub fn new() -> Self {
        Self {
            state: RwLock::new(EngineState {
                rpm: 800.0,
                speed: 0.0,
                throttle: 12.0,
                coolant: 85.0,
                load: 20.0,
                intake: 25.0,
                maf: 8.0,
                voltage: 13.8,
            }),
        }
    }

    /// Advance every value by one bounded random step
    pub fn update(&self) {
        let mut state = self.state.write();
        let mut rng = rand::thread_rng();
        state.rpm = walk(&mut rng, state.rpm, 750.0, 4500.0, 120.0);
        state.speed = walk(&mut rng, state.speed, 0.0, 130.0, 3.0);
        state.throttle = walk(&mut rng, state.throttle, 4.0, 80.0, 2.5);
        state.coolant = walk(&mut rng, state.coolant, 70.0, 105.0, 0.4);
        state.load = walk(&mut rng, state.load, 10.0, 95.0, 2.0);
        state.intake = walk(&mut rng, state.intake, 10.0, 45.0, 0.3);
        state.maf = walk(&mut rng, state.maf, 1.0, 120.0, 2.0);
        state.voltage = walk(&mut rng, state.voltage, 12.0, 14.4, 0.05);
    }

    /// Raw data bytes for a mode-01 PID suffix, or None if unsupported
    pub fn reading(&self, pid: &str) -> Option<Vec<u8>> {
        let state = self.state.read();
        match pid {
            // PIDs 01-20 support bitmap
            "00" => Some(vec![0xBE, 0x3F, 0xA8, 0x13]),
            "04" => Some(vec![percent_byte(state.load)]),
            "05" => Some(vec![temp_byte(state.coolant)]),
            "0C" => {
                let raw = (state.rpm * 4.0).round() as u16;
                Some(raw.to_be_bytes().to_vec())
            }
            "0D" => Some(vec![state.speed.round() as u8]),
            "0F" => Some(vec![temp_byte(state.intake)]),
            "10" => {
                let raw = (state.maf * 100.0).round() as u16;
                Some(raw.to_be_bytes().to_vec())
            }
            "11" => Some(vec![percent_byte(state.throttle)]),
            _ => None,
        }
    }

    /// Battery voltage for ATRV
    pub fn voltage(&self) -> f64 {
        self.state.read().voltage
    }
}

impl Default for SimulatedEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn walk(rng: &mut impl Rng, value: f64, min: f64, max: f64, step: f64) -> f64 {
    (value + rng.gen_range(-step..=step)).clamp(min, max)
}

/// Percentage to its raw byte, value = A * 100 / 255
fn percent_byte(percent: f64) -> u8 {
    (percent * 255.0 / 100.0).round() as u8
}

/// Temperature to its raw byte, value = A - 40
fn temp_byte(celsius: f64) -> u8 {
    (celsius + 40.0).round() as u8
}
