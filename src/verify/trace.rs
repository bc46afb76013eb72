//! Reader for tabulated simulation output.
//!
//! The format is a whitespace-separated table. The first non-comment line
//! is a header naming the time axis followed by one column per node:
//!
//! ```text
//! * exported from a transient run
//! time      V(s0)   V(s1)   cout
//! 0         0       0       0
//! 100p      0.02    0       0
//! 1.4n      4.98    5       0
//! ```
//!
//! Node columns may be written as `name` or `V(name)`. Values accept the
//! same SI suffixes as bus file parameters. Lines starting with `#` or `*`
//! are comments.

use std::path::Path;

use tracing::debug;

use crate::dsl::parse_value;
use crate::error::{BusError, Result};

/// Sampled node voltages over a shared time axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    names: Vec<String>,
    time: Vec<f64>,
    samples: Vec<Vec<f64>>,
}

impl Trace {
    /// Build a trace from already-sampled data.
    ///
    /// Every column in `samples` must have one value per entry of `time`,
    /// and `time` must be non-decreasing.
    pub fn from_columns(names: Vec<String>, time: Vec<f64>, samples: Vec<Vec<f64>>) -> Result<Self> {
        if names.len() != samples.len() {
            return Err(BusError::trace(
                0,
                format!("{} node names for {} columns", names.len(), samples.len()),
            ));
        }
        if let Some((name, column)) = names.iter().zip(&samples).find(|(_, c)| c.len() != time.len()) {
            return Err(BusError::trace(
                0,
                format!("node '{}' has {} samples, time axis has {}", name, column.len(), time.len()),
            ));
        }
        if let Some(i) = time.windows(2).position(|w| w[1] < w[0]) {
            return Err(BusError::trace(i + 2, "time axis goes backwards"));
        }
        Ok(Self {
            names: names.into_iter().map(|n| node_name(&n).to_string()).collect(),
            time,
            samples,
        })
    }

    /// Node names, with any `V(...)` wrapper removed.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn time(&self) -> &[f64] {
        &self.time
    }

    /// Number of samples per node.
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Samples for `name`, accepting either `name` or `V(name)`.
    pub fn signal(&self, name: &str) -> Option<&[f64]> {
        let name = node_name(name);
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.samples[i].as_slice())
    }

    /// Mean of the samples of `name` with time in `[start, end]`.
    ///
    /// Falls back to the interpolated value at `at` when no sample lies in
    /// the window. Returns `None` for an unknown node or an empty trace.
    pub fn window_mean(&self, name: &str, start: f64, end: f64, at: f64) -> Option<f64> {
        let values = self.signal(name)?;
        let lo = self.time.partition_point(|&t| t < start);
        let hi = self.time.partition_point(|&t| t <= end);
        if hi > lo {
            let window = &values[lo..hi];
            return Some(window.iter().sum::<f64>() / window.len() as f64);
        }
        self.interpolate(values, at)
    }

    /// Value of `name` at `time`, interpolating between samples.
    pub fn value_at(&self, name: &str, time: f64) -> Option<f64> {
        let values = self.signal(name)?;
        self.interpolate(values, time)
    }

    fn interpolate(&self, values: &[f64], time: f64) -> Option<f64> {
        let after = self.time.partition_point(|&t| t <= time);
        if after == 0 {
            return values.first().copied();
        }
        if after == self.time.len() {
            return values.last().copied();
        }
        let (t0, t1) = (self.time[after - 1], self.time[after]);
        let (v0, v1) = (values[after - 1], values[after]);
        if t1 <= t0 {
            return Some(v0);
        }
        Some(v0 + (time - t0) / (t1 - t0) * (v1 - v0))
    }
}

fn node_name(header: &str) -> &str {
    header
        .strip_prefix("V(")
        .or_else(|| header.strip_prefix("v("))
        .and_then(|rest| rest.strip_suffix(')'))
        .unwrap_or(header)
}

fn is_comment(line: &str) -> bool {
    line.starts_with('#') || line.starts_with('*')
}

/// Parse a trace table from text.
pub fn parse_trace(input: &str) -> Result<Trace> {
    let mut lines = input
        .lines()
        .enumerate()
        .map(|(i, text)| (i + 1, text.trim()))
        .filter(|(_, text)| !text.is_empty() && !is_comment(text));

    let (header_line, header) = lines
        .next()
        .ok_or_else(|| BusError::trace(0, "trace has no header"))?;
    let mut fields = header.split_whitespace();
    match fields.next() {
        Some(axis) if axis.eq_ignore_ascii_case("time") => {}
        _ => return Err(BusError::trace(header_line, "header must start with 'time'")),
    }
    let names: Vec<String> = fields.map(str::to_string).collect();
    if names.is_empty() {
        return Err(BusError::trace(header_line, "header names no signals"));
    }

    let mut time = Vec::new();
    let mut samples = vec![Vec::new(); names.len()];
    for (line, text) in lines {
        let values = text
            .split_whitespace()
            .map(|field| {
                parse_value(field)
                    .map_err(|_| BusError::trace(line, format!("'{}' is not a number", field)))
            })
            .collect::<Result<Vec<f64>>>()?;
        if values.len() != names.len() + 1 {
            return Err(BusError::trace(
                line,
                format!("expected {} values, found {}", names.len() + 1, values.len()),
            ));
        }
        if time.last().is_some_and(|&last| values[0] < last) {
            return Err(BusError::trace(line, "time axis goes backwards"));
        }
        time.push(values[0]);
        for (column, value) in samples.iter_mut().zip(&values[1..]) {
            column.push(*value);
        }
    }

    debug!("Read trace with {} nodes and {} samples", names.len(), time.len());
    Trace::from_columns(names, time, samples)
}

/// Read and parse a trace file.
pub fn read_trace(path: &Path) -> Result<Trace> {
    let content = std::fs::read_to_string(path).map_err(|e| BusError::read(path, e))?;
    parse_trace(&content)
}
