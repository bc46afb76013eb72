//! Check simulated node voltages against a bus file's outputs block.
//!
//! Each expected output row is sampled around its clock edge. The edge for
//! row `r` sits at `r*bittime + clockdelay`; the sampling window runs from
//! `tsu` before the edge to `th` after the edge has finished rising. The
//! window mean is compared against a threshold three quarters of the way
//! from `bitlow` to `bithigh`.

mod trace;

pub use trace::{parse_trace, read_trace, Trace};

use tracing::{debug, error, info};

use crate::dsl::{Bits, Params, ParsedBus};
use crate::error::{BusError, Result};

/// Outcome for one output column.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalCheck {
    pub name: String,
    pub expected: Bits,
    pub measured: Bits,
    /// Row indices where `measured` differs from `expected`
    pub mismatches: Vec<usize>,
}

impl SignalCheck {
    pub fn passed(&self) -> bool {
        self.mismatches.is_empty()
    }
}

/// Per-column results of a verification run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VerifyReport {
    pub checks: Vec<SignalCheck>,
}

impl VerifyReport {
    /// True when every output column matched on every row.
    pub fn passed(&self) -> bool {
        self.checks.iter().all(SignalCheck::passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &SignalCheck> {
        self.checks.iter().filter(|c| !c.passed())
    }

    pub fn check(&self, name: &str) -> Option<&SignalCheck> {
        self.checks.iter().find(|c| c.name == name)
    }
}

/// Sampling geometry derived from the bus parameters.
#[derive(Debug, Clone, Copy)]
struct Sampler {
    bittime: f64,
    clockdelay: f64,
    clockrisefall: f64,
    tsu: f64,
    th: f64,
    threshold: f64,
}

impl Sampler {
    fn from_params(params: &Params) -> Result<Self> {
        let clockdelay = params.clockdelay.ok_or_else(|| BusError::missing("clockdelay"))?;
        let tsu = params.tsu.ok_or_else(|| BusError::missing("tsu"))?;
        let th = params.th.ok_or_else(|| BusError::missing("th"))?;
        Ok(Self {
            bittime: params.bittime,
            clockdelay,
            clockrisefall: params.clock_risefall(),
            tsu,
            th,
            threshold: params.bitlow + 0.75 * (params.bithigh - params.bitlow),
        })
    }

    fn edge(&self, row: usize) -> f64 {
        row as f64 * self.bittime + self.clockdelay
    }

    fn sample(&self, trace: &Trace, name: &str, row: usize) -> Option<bool> {
        let edge = self.edge(row);
        let start = edge - self.tsu;
        let end = edge + self.clockrisefall + self.th;
        let voltage = trace.window_mean(name, start, end, edge)?;
        debug!("{} row {}: {:.4}V over [{:e}, {:e}]", name, row, voltage, start, end);
        Some(voltage > self.threshold)
    }
}

/// Compare `trace` against the outputs block of `bus`.
///
/// Requires `clockdelay`, `tsu` and `th` to be set, and every output node
/// to be present in the trace.
pub fn verify(bus: &ParsedBus, trace: &Trace) -> Result<VerifyReport> {
    let outputs = bus.outputs.as_ref().ok_or(BusError::MissingOutputs)?;
    let sampler = Sampler::from_params(&bus.params)?;
    debug!("Logic threshold: {}V", sampler.threshold);

    if let Some(missing) = outputs
        .columns()
        .iter()
        .find(|c| trace.signal(&c.name).is_none())
    {
        return Err(BusError::TraceSignalNotFound {
            name: missing.name.clone(),
        });
    }
    info!("All {} outputs found in trace", outputs.width());

    let mut report = VerifyReport::default();
    for (index, column) in outputs.columns().iter().enumerate() {
        let expected = outputs.column_bits(index);
        let measured = (0..outputs.len())
            .map(|row| {
                sampler.sample(trace, &column.name, row).ok_or_else(|| BusError::TraceSignalNotFound {
                    name: column.name.clone(),
                })
            })
            .collect::<Result<Bits>>()?;
        let mismatches: Vec<usize> = expected
            .iter()
            .zip(measured.iter())
            .enumerate()
            .filter(|(_, (e, m))| e != m)
            .map(|(row, _)| row)
            .collect();

        if mismatches.is_empty() {
            info!("{} passed: {}", column.name, measured);
        } else {
            error!(
                "{} failed: measured {}, expected {}",
                column.name, measured, expected
            );
        }
        report.checks.push(SignalCheck {
            name: column.name.clone(),
            expected,
            measured,
            mismatches,
        });
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::{Column, Timeline};

    fn bits(s: &str) -> Bits {
        s.parse().unwrap()
    }

    fn bus(outputs: Option<Timeline>) -> ParsedBus {
        let params = Params::new(100e-12, 1e-9, 0.0, 1.0)
            .with_clock(500e-12, None)
            .with_setup_hold(100e-12, 100e-12);
        let signals = Timeline::from_rows(vec![Column::new("a")], vec![bits("0"), bits("1")]).unwrap();
        ParsedBus {
            params,
            signals,
            outputs,
        }
    }

    fn expected(rows: &[&str]) -> Timeline {
        Timeline::from_rows(
            vec![Column::new("q")],
            rows.iter().map(|r| bits(r)).collect(),
        )
        .unwrap()
    }

    // q is low for row 0 and high for row 1, sampled every 100ps
    fn trace() -> Trace {
        let time: Vec<f64> = (0..=20).map(|i| i as f64 * 100e-12).collect();
        let q = time.iter().map(|&t| if t < 1e-9 { 0.0 } else { 1.0 }).collect();
        Trace::from_columns(vec!["V(q)".into()], time, vec![q]).unwrap()
    }

    #[test]
    fn test_matching_trace_passes() {
        let report = verify(&bus(Some(expected(&["0", "1"]))), &trace()).unwrap();
        assert!(report.passed());
        let q = report.check("q").unwrap();
        assert_eq!(q.measured, bits("01"));
        assert_eq!(report.failures().count(), 0);
    }

    #[test]
    fn test_mismatch_is_reported() {
        let report = verify(&bus(Some(expected(&["1", "1"]))), &trace()).unwrap();
        assert!(!report.passed());
        let q = report.check("q").unwrap();
        assert_eq!(q.mismatches, vec![0]);
        assert_eq!(q.expected, bits("11"));
    }

    #[test]
    fn test_requires_outputs_and_timing() {
        assert!(matches!(verify(&bus(None), &trace()), Err(BusError::MissingOutputs)));

        let mut b = bus(Some(expected(&["0", "1"])));
        b.params.th = None;
        assert!(matches!(
            verify(&b, &trace()),
            Err(BusError::MissingRequiredParameter { ref name }) if name == "th"
        ));
    }

    #[test]
    fn test_missing_node() {
        let outputs = Timeline::from_rows(vec![Column::new("z")], vec![bits("0"), bits("1")]).unwrap();
        assert!(matches!(
            verify(&bus(Some(outputs)), &trace()),
            Err(BusError::TraceSignalNotFound { ref name }) if name == "z"
        ));
    }
}
