//! Data model produced by the bus file parser.

use std::fmt;
use std::str::FromStr;

use crate::error::{BusError, Result};

/// An ordered run of logic values, most significant first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Bits(Vec<bool>);

impl Bits {
    /// Create an empty bit string.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Render `value` as a `width`-bit binary field.
    ///
    /// Bits above `width` are discarded; callers check for overflow first.
    pub fn from_value(value: u64, width: u32) -> Self {
        Self(
            (0..width)
                .rev()
                .map(|bit| bit < 64 && (value >> bit) & 1 == 1)
                .collect(),
        )
    }

    /// Expand hex digits to exactly four bits per digit, leading zeros included.
    pub fn from_hex_digits(digits: &str) -> Option<Self> {
        let mut bits = Vec::with_capacity(digits.len() * 4);
        for ch in digits.chars() {
            let nibble = ch.to_digit(16)?;
            bits.extend((0..4).rev().map(|bit| (nibble >> bit) & 1 == 1));
        }
        Some(Self(bits))
    }

    /// Parse a string of `0` and `1` characters.
    pub fn from_binary_digits(digits: &str) -> Option<Self> {
        digits
            .chars()
            .map(|ch| match ch {
                '0' => Some(false),
                '1' => Some(true),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()
            .map(Self)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<bool> {
        self.0.get(index).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.0.iter().copied()
    }

    /// Append another bit string.
    pub fn extend_from(&mut self, other: &Bits) {
        self.0.extend_from_slice(&other.0);
    }
}

impl FromIterator<bool> for Bits {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl FromStr for Bits {
    type Err = BusError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_binary_digits(s)
            .ok_or_else(|| BusError::invalid_literal(0, s, "expected only '0' and '1'"))
    }
}

impl fmt::Display for Bits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in &self.0 {
            f.write_str(if *bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

/// One elementary named signal bit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Column {
    /// Full node name, e.g. `data[3]`
    pub name: String,
}

impl Column {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Polarity of the first clock edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Edge {
    /// Clock idles low, first edge rises
    #[default]
    Rising,
    /// Clock idles high, first edge falls
    Falling,
}

impl Edge {
    /// Parse an edge keyword (`rising` or `falling`).
    pub fn from_keyword(s: &str) -> Option<Self> {
        match s {
            "rising" => Some(Self::Rising),
            "falling" => Some(Self::Falling),
            _ => None,
        }
    }
}

/// Timing and level parameters of a bus file, in seconds and volts.
#[derive(Debug, Clone, PartialEq)]
pub struct Params {
    /// Data transition duration
    pub risefall: f64,
    /// Duration of one row
    pub bittime: f64,
    /// Voltage of logic 0
    pub bitlow: f64,
    /// Voltage of logic 1
    pub bithigh: f64,
    /// Clock edge lag behind the data edges; no clock when absent
    pub clockdelay: Option<f64>,
    /// Clock transition duration; falls back to `risefall`
    pub clockrisefall: Option<f64>,
    /// Polarity of the first clock edge
    pub edge: Edge,
    /// Setup window used by the verifier
    pub tsu: Option<f64>,
    /// Hold window used by the verifier
    pub th: Option<f64>,
}

impl Params {
    /// Create a parameter set from the four required values.
    pub fn new(risefall: f64, bittime: f64, bitlow: f64, bithigh: f64) -> Self {
        Self {
            risefall,
            bittime,
            bitlow,
            bithigh,
            clockdelay: None,
            clockrisefall: None,
            edge: Edge::default(),
            tsu: None,
            th: None,
        }
    }

    /// Enable the derived clock.
    pub fn with_clock(mut self, clockdelay: f64, clockrisefall: Option<f64>) -> Self {
        self.clockdelay = Some(clockdelay);
        self.clockrisefall = clockrisefall;
        self
    }

    /// Set the first clock edge polarity.
    pub fn with_edge(mut self, edge: Edge) -> Self {
        self.edge = edge;
        self
    }

    /// Set the verifier's setup and hold windows.
    pub fn with_setup_hold(mut self, tsu: f64, th: f64) -> Self {
        self.tsu = Some(tsu);
        self.th = Some(th);
        self
    }

    /// Clock transition duration, defaulting to `risefall`.
    pub fn clock_risefall(&self) -> f64 {
        self.clockrisefall.unwrap_or(self.risefall)
    }

    /// Map a logic value to its voltage.
    pub fn voltage(&self, bit: bool) -> f64 {
        if bit {
            self.bithigh
        } else {
            self.bitlow
        }
    }
}

/// Rows of bit values for an ordered set of columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    columns: Vec<Column>,
    rows: Vec<Bits>,
}

impl Timeline {
    /// Build a timeline, checking every row against the column count.
    ///
    /// Row numbers stand in for line numbers in the mismatch error.
    pub fn from_rows(columns: Vec<Column>, rows: Vec<Bits>) -> Result<Self> {
        if let Some((index, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != columns.len())
        {
            return Err(BusError::ColumnCountMismatch {
                line: index + 1,
                expected: columns.len(),
                found: row.len(),
            });
        }
        Ok(Self { columns, rows })
    }

    pub(crate) fn new_checked(columns: Vec<Column>, rows: Vec<Bits>) -> Self {
        debug_assert!(rows.iter().all(|row| row.len() == columns.len()));
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[Bits] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// All values of one column, in row order.
    pub fn column_bits(&self, index: usize) -> Bits {
        self.rows
            .iter()
            .map(|row| row.get(index).unwrap_or(false))
            .collect()
    }

    /// Position of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Total time covered by the rows.
    pub fn duration(&self, bittime: f64) -> f64 {
        self.rows.len() as f64 * bittime
    }
}

/// A fully parsed bus file.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedBus {
    /// Timing and level parameters
    pub params: Params,
    /// Stimulus rows from the `Signals:` block
    pub signals: Timeline,
    /// Expected response rows from the optional `Outputs:` block
    pub outputs: Option<Timeline>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bits_from_value() {
        assert_eq!(Bits::from_value(5, 4).to_string(), "0101");
        assert_eq!(Bits::from_value(0, 1).to_string(), "0");
        assert_eq!(Bits::from_value(255, 8).to_string(), "11111111");
    }

    #[test]
    fn test_bits_from_hex_keeps_leading_zeros() {
        assert_eq!(Bits::from_hex_digits("0").unwrap().len(), 4);
        assert_eq!(Bits::from_hex_digits("00").unwrap().len(), 8);
        assert_eq!(Bits::from_hex_digits("A5").unwrap().to_string(), "10100101");
        assert!(Bits::from_hex_digits("G").is_none());
    }

    #[test]
    fn test_timeline_column_bits() {
        let columns = vec![Column::new("a"), Column::new("b")];
        let rows = vec!["01".parse().unwrap(), "11".parse().unwrap(), "00".parse().unwrap()];
        let timeline = Timeline::from_rows(columns, rows).unwrap();
        assert_eq!(timeline.column_bits(0).to_string(), "010");
        assert_eq!(timeline.column_bits(1).to_string(), "110");
        assert_eq!(timeline.column_index("b"), Some(1));
    }

    #[test]
    fn test_timeline_rejects_short_row() {
        let columns = vec![Column::new("a"), Column::new("b")];
        let rows = vec!["01".parse().unwrap(), "1".parse().unwrap()];
        let err = Timeline::from_rows(columns, rows).unwrap_err();
        assert!(matches!(
            err,
            BusError::ColumnCountMismatch {
                line: 2,
                expected: 2,
                found: 1
            }
        ));
    }

    #[test]
    fn test_clock_risefall_fallback() {
        let params = Params::new(200e-12, 1e-9, 0.0, 5.0).with_clock(500e-12, None);
        assert_eq!(params.clock_risefall(), 200e-12);
        let params = params.with_clock(500e-12, Some(100e-12));
        assert_eq!(params.clock_risefall(), 100e-12);
    }
}
