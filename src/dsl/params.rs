//! Collection and validation of `key = value` parameter lines.

use tracing::{info, warn};

use super::ast::{Edge, Params};
use super::lexer::parse_value;
use crate::error::{BusError, Result};

/// Parameter values gathered while scanning the top of a bus file.
#[derive(Debug, Clone, Default)]
pub struct ParamSet {
    risefall: Option<f64>,
    bittime: Option<f64>,
    bitlow: Option<f64>,
    bithigh: Option<f64>,
    clockdelay: Option<f64>,
    clockrisefall: Option<f64>,
    edge: Option<Edge>,
    tsu: Option<f64>,
    th: Option<f64>,
}

impl ParamSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one parameter. Unknown keys are logged and ignored.
    ///
    /// Keys are matched case-sensitively; all known keys are lowercase.
    pub fn set(&mut self, key: &str, value: &str, line: usize) -> Result<()> {
        if key == "edge" {
            let edge = Edge::from_keyword(value).ok_or_else(|| BusError::InvalidParameter {
                name: key.to_string(),
                message: format!("'{}' is not 'rising' or 'falling'", value),
            })?;
            info!("Parameter edge set to {}", value);
            self.edge = Some(edge);
            return Ok(());
        }

        let slot = match key {
            "risefall" => &mut self.risefall,
            "bittime" => &mut self.bittime,
            "bitlow" => &mut self.bitlow,
            "bithigh" => &mut self.bithigh,
            "clockdelay" => &mut self.clockdelay,
            "clockrisefall" => &mut self.clockrisefall,
            "tsu" => &mut self.tsu,
            "th" => &mut self.th,
            _ => {
                warn!(line, "Unknown parameter encountered: {}", key);
                return Ok(());
            }
        };
        let parsed = parse_value(value).map_err(|e| e.at_line(line))?;
        info!("Parameter {} set to {}", key, value);
        *slot = Some(parsed);
        Ok(())
    }

    /// Check required keys and value domains, producing the final parameters.
    pub fn finish(self) -> Result<Params> {
        let risefall = self.risefall.ok_or_else(|| BusError::missing("risefall"))?;
        let bittime = self.bittime.ok_or_else(|| BusError::missing("bittime"))?;
        let bitlow = self.bitlow.ok_or_else(|| BusError::missing("bitlow"))?;
        let bithigh = self.bithigh.ok_or_else(|| BusError::missing("bithigh"))?;

        if bittime <= 0.0 {
            return Err(invalid("bittime", "must be positive"));
        }
        let durations = [
            ("risefall", Some(risefall)),
            ("clockdelay", self.clockdelay),
            ("clockrisefall", self.clockrisefall),
            ("tsu", self.tsu),
            ("th", self.th),
        ];
        for (name, value) in durations {
            if matches!(value, Some(v) if v < 0.0) {
                return Err(invalid(name, "must not be negative"));
            }
        }

        Ok(Params {
            risefall,
            bittime,
            bitlow,
            bithigh,
            clockdelay: self.clockdelay,
            clockrisefall: self.clockrisefall,
            edge: self.edge.unwrap_or_default(),
            tsu: self.tsu,
            th: self.th,
        })
    }
}

fn invalid(name: &str, message: &str) -> BusError {
    BusError::InvalidParameter {
        name: name.to_string(),
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn required() -> ParamSet {
        let mut set = ParamSet::new();
        set.set("risefall", "200p", 1).unwrap();
        set.set("bittime", "1n", 2).unwrap();
        set.set("bitlow", "0", 3).unwrap();
        set.set("bithigh", "5", 4).unwrap();
        set
    }

    #[test]
    fn test_required_params() {
        let params = required().finish().unwrap();
        assert_eq!(params.risefall, 2e-10);
        assert_eq!(params.bittime, 1e-9);
        assert_eq!(params.bithigh, 5.0);
        assert_eq!(params.clockdelay, None);
        assert_eq!(params.edge, Edge::Rising);
    }

    #[test]
    fn test_missing_required_param() {
        let mut set = ParamSet::new();
        set.set("risefall", "200p", 1).unwrap();
        set.set("bittime", "1n", 2).unwrap();
        set.set("bithigh", "5", 3).unwrap();
        let err = set.finish().unwrap_err();
        assert!(matches!(err, BusError::MissingRequiredParameter { ref name } if name == "bitlow"));
    }

    #[test]
    fn test_unknown_key_is_ignored() {
        let mut set = required();
        set.set("wibble", "3", 5).unwrap();
        assert!(set.finish().is_ok());
    }

    #[test]
    fn test_keys_are_case_sensitive() {
        let mut set = ParamSet::new();
        set.set("RiseFall", "200p", 1).unwrap();
        set.set("bittime", "1n", 2).unwrap();
        set.set("bitlow", "0", 3).unwrap();
        set.set("bithigh", "5", 4).unwrap();
        assert!(matches!(
            set.finish(),
            Err(BusError::MissingRequiredParameter { .. })
        ));
    }

    #[test]
    fn test_bad_value_reports_line() {
        let mut set = ParamSet::new();
        let err = set.set("bittime", "1q", 12).unwrap_err();
        assert!(matches!(err, BusError::InvalidLiteral { line: 12, .. }));
    }

    #[test]
    fn test_optional_params_and_edge() {
        let mut set = required();
        set.set("clockdelay", "500p", 5).unwrap();
        set.set("edge", "falling", 6).unwrap();
        let params = set.finish().unwrap();
        assert_eq!(params.clockdelay, Some(5e-10));
        assert_eq!(params.clock_risefall(), 2e-10);
        assert_eq!(params.edge, Edge::Falling);

        let mut set = required();
        assert!(set.set("edge", "sideways", 5).is_err());
    }

    #[test]
    fn test_negative_duration_is_invalid() {
        let mut set = required();
        set.set("clockdelay", "-1n", 5).unwrap();
        assert!(matches!(
            set.finish(),
            Err(BusError::InvalidParameter { ref name, .. }) if name == "clockdelay"
        ));
    }
}
