//! Known OBD-II service 01 PIDs

use std::fmt;

/// A queryable OBD-II parameter (service 01).
///
/// Each PID carries the four-character wire code sent to the device and
/// the metric name used as its key in telemetry payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pid {
    /// Engine RPM (010C)
    Rpm,
    /// Vehicle speed (010D)
    Speed,
    /// Throttle position (0111)
    Throttle,
    /// Engine coolant temperature (0105)
    CoolantTemp,
    /// Calculated engine load (0104)
    EngineLoad,
    /// Intake air temperature (010F)
    IntakeTemp,
    /// Mass air flow rate (0110)
    Maf,
}

impl Pid {
    /// Every PID this system can decode
    pub const ALL: [Pid; 7] = [
        Pid::Rpm,
        Pid::Speed,
        Pid::Throttle,
        Pid::CoolantTemp,
        Pid::EngineLoad,
        Pid::IntakeTemp,
        Pid::Maf,
    ];

    /// The default polling battery
    pub const DEFAULT_SET: [Pid; 4] = [Pid::Rpm, Pid::Speed, Pid::Throttle, Pid::CoolantTemp];

    /// Wire code sent to the device
    pub fn code(self) -> &'static str {
        match self {
            Pid::Rpm => "010C",
            Pid::Speed => "010D",
            Pid::Throttle => "0111",
            Pid::CoolantTemp => "0105",
            Pid::EngineLoad => "0104",
            Pid::IntakeTemp => "010F",
            Pid::Maf => "0110",
        }
    }

    /// Metric name used as the payload key
    pub fn metric(self) -> &'static str {
        match self {
            Pid::Rpm => "RPM",
            Pid::Speed => "Speed",
            Pid::Throttle => "Throttle",
            Pid::CoolantTemp => "Coolant Temp",
            Pid::EngineLoad => "Engine Load",
            Pid::IntakeTemp => "Intake Temp",
            Pid::Maf => "MAF",
        }
    }

    /// Look up a PID by wire code (case-insensitive)
    pub fn from_code(code: &str) -> Option<Pid> {
        Pid::ALL
            .iter()
            .copied()
            .find(|pid| pid.code().eq_ignore_ascii_case(code))
    }
}

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_code_round_trips() {
        for pid in Pid::ALL {
            assert_eq!(Pid::from_code(pid.code()), Some(pid));
        }
    }

    #[test]
    fn test_from_code_ignores_case() {
        assert_eq!(Pid::from_code("010c"), Some(Pid::Rpm));
        assert_eq!(Pid::from_code("010F"), Some(Pid::IntakeTemp));
    }

    #[test]
    fn test_from_code_rejects_unknown() {
        assert_eq!(Pid::from_code("0100"), None);
        assert_eq!(Pid::from_code(""), None);
    }

    #[test]
    fn test_default_set_is_the_dashboard_battery() {
        let metrics: Vec<&str> = Pid::DEFAULT_SET.iter().map(|p| p.metric()).collect();
        assert_eq!(metrics, ["RPM", "Speed", "Throttle", "Coolant Temp"]);
    }
}
