//! Piecewise-linear waveform synthesis.
//!
//! Turns a [`Timeline`] into one breakpoint sequence per column and, when
//! `clockdelay` is set, a derived clock.
//!
//! ## Data waveforms
//!
//! Row `r` occupies `[r*bittime, (r+1)*bittime)`. When a column changes
//! value at row `r`, the waveform holds the old level up to `r*bittime`
//! and ramps linearly to the new level over `risefall`. Rows that repeat
//! the previous value add no breakpoints. Every waveform ends with a hold
//! point at `rows*bittime`.
//!
//! ## Clock
//!
//! The clock toggles once per bit interval, so its period is
//! `2*bittime`. Edge `r` starts at `r*bittime + clockdelay` and lasts
//! `clockrisefall`. The clock ignores the data values and spans the same
//! duration as the data waveforms.

mod synth;
mod writer;

pub use synth::{clock_waveform, data_waveform, synthesize, synthesize_timeline};
pub use writer::{write_deck, write_file, CLOCK_NAME};

use std::fmt;

/// A (time, voltage) pair on a waveform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Breakpoint {
    /// Time in seconds
    pub time: f64,
    /// Voltage in volts
    pub voltage: f64,
}

impl Breakpoint {
    pub fn new(time: f64, voltage: f64) -> Self {
        Self { time, voltage }
    }
}

/// Breakpoints driving one node.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    /// Node name
    pub name: String,
    /// Breakpoints in non-decreasing time order
    pub points: Vec<Breakpoint>,
}

impl Waveform {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            points: Vec::new(),
        }
    }

    /// Append a breakpoint unless it repeats the last one exactly.
    pub(crate) fn push(&mut self, time: f64, voltage: f64) {
        let point = Breakpoint::new(time, voltage);
        if self.points.last() != Some(&point) {
            self.points.push(point);
        }
    }

    /// Time of the last breakpoint.
    pub fn end_time(&self) -> f64 {
        self.points.last().map_or(0.0, |p| p.time)
    }

    /// True when no breakpoint precedes its predecessor in time.
    pub fn is_monotonic(&self) -> bool {
        self.points.windows(2).all(|w| w[0].time <= w[1].time)
    }

    /// Voltage at `time`, interpolating between breakpoints.
    pub fn voltage_at(&self, time: f64) -> Option<f64> {
        let first = self.points.first()?;
        if time <= first.time {
            return Some(first.voltage);
        }
        let after = self.points.partition_point(|p| p.time <= time);
        match (self.points.get(after - 1), self.points.get(after)) {
            (Some(a), Some(b)) if b.time > a.time => {
                let frac = (time - a.time) / (b.time - a.time);
                Some(a.voltage + frac * (b.voltage - a.voltage))
            }
            (Some(a), _) => Some(a.voltage),
            _ => None,
        }
    }
}

/// The full set of sources synthesized from one bus file.
#[derive(Debug, Clone, PartialEq)]
pub struct PwlDeck {
    /// One waveform per column, in declaration order
    pub sources: Vec<Waveform>,
    /// Derived clock, when configured
    pub clock: Option<Waveform>,
    /// Time covered by the rows
    pub duration: f64,
}

impl PwlDeck {
    /// Total number of voltage sources including the clock.
    pub fn source_count(&self) -> usize {
        self.sources.len() + usize::from(self.clock.is_some())
    }

    /// Look up a data waveform by node name.
    pub fn source(&self, name: &str) -> Option<&Waveform> {
        self.sources.iter().find(|w| w.name == name)
    }
}

impl fmt::Display for PwlDeck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = Vec::new();
        write_deck(self, &mut buf).map_err(|_| fmt::Error)?;
        f.write_str(&String::from_utf8_lossy(&buf))
    }
}
