//! Vector row expansion.
//!
//! Each line of a vectors block is lexed into tokens and resolved to a
//! [`RowTemplate`]. A line without range tokens is a single fixed row. A
//! line with range tokens produces one row per range step; every range on
//! the line must produce the same number of rows, while their widths may
//! differ. Static literals repeat unchanged on every generated row.

use tracing::{debug, warn};

use super::ast::{Bits, Column, Timeline};
use super::lexer::{Lexer, RangeSpec, Token, TokenKind};
use crate::error::{BusError, Result};

/// One column group within a ranged row template.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    /// Same bits on every row
    Static(Bits),
    /// Counter rendered fresh on every row
    Counter(RangeSpec),
}

impl Field {
    fn width(&self) -> usize {
        match self {
            Self::Static(bits) => bits.len(),
            Self::Counter(range) => range.nbits as usize,
        }
    }
}

/// A vectors-block line resolved to one or more rows.
#[derive(Debug, Clone, PartialEq)]
pub enum RowTemplate {
    /// A line of literals only
    Fixed(Bits),
    /// A line with at least one range; `rows` is the common row count
    Ranged { rows: usize, fields: Vec<Field> },
}

impl RowTemplate {
    /// Build a template from lexed tokens, checking that ranges agree on row count.
    pub fn from_tokens(tokens: Vec<Token>) -> Result<Self> {
        let mut rows: Option<usize> = None;
        let mut fields: Vec<Field> = Vec::with_capacity(tokens.len());

        for token in tokens {
            match token.kind {
                TokenKind::Binary(bits) | TokenKind::Hex(bits) => match fields.last_mut() {
                    Some(Field::Static(prev)) => prev.extend_from(&bits),
                    _ => fields.push(Field::Static(bits)),
                },
                TokenKind::Range(range) => {
                    let count = range.row_count();
                    match rows {
                        Some(expected) if expected != count => {
                            return Err(BusError::InconsistentRangeSpan {
                                line: token.line,
                                token: token.text,
                                expected,
                                found: count,
                            });
                        }
                        _ => rows = Some(count),
                    }
                    fields.push(Field::Counter(range));
                }
            }
        }

        Ok(match rows {
            None => match fields.pop() {
                Some(Field::Static(bits)) => Self::Fixed(bits),
                _ => Self::Fixed(Bits::new()),
            },
            Some(rows) => Self::Ranged { rows, fields },
        })
    }

    /// Number of rows the line produces.
    pub fn row_count(&self) -> usize {
        match self {
            Self::Fixed(_) => 1,
            Self::Ranged { rows, .. } => *rows,
        }
    }

    /// Number of columns every produced row covers.
    pub fn width(&self) -> usize {
        match self {
            Self::Fixed(bits) => bits.len(),
            Self::Ranged { fields, .. } => fields.iter().map(Field::width).sum(),
        }
    }

    /// Produce the row at `index`.
    pub fn row(&self, index: usize) -> Bits {
        match self {
            Self::Fixed(bits) => bits.clone(),
            Self::Ranged { fields, .. } => {
                let mut row = Bits::new();
                for field in fields {
                    match field {
                        Field::Static(bits) => row.extend_from(bits),
                        Field::Counter(range) => row.extend_from(&range.bits(index)),
                    }
                }
                row
            }
        }
    }

    /// All rows in order.
    pub fn rows(&self) -> impl Iterator<Item = Bits> + '_ {
        (0..self.row_count()).map(move |i| self.row(i))
    }
}

/// Lex and resolve one vectors-block line.
pub fn parse_row_template(text: &str, line: usize) -> Result<RowTemplate> {
    let tokens = Lexer::new(text, line).tokenize()?;
    RowTemplate::from_tokens(tokens)
}

/// Accumulates the rows of one vectors block against a fixed column set.
#[derive(Debug)]
pub struct TimelineBuilder {
    columns: Vec<Column>,
    rows: Vec<Bits>,
}

impl TimelineBuilder {
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Expand one source line and append its rows. Returns the number of rows added.
    pub fn push_line(&mut self, text: &str, line: usize) -> Result<usize> {
        let template = parse_row_template(text, line)?;

        if template.width() != self.columns.len() {
            return Err(BusError::ColumnCountMismatch {
                line,
                expected: self.columns.len(),
                found: template.width(),
            });
        }

        let count = template.row_count();
        if count == 0 {
            warn!(line, "range with equal bounds produces no rows");
        }
        self.rows.extend(template.rows());
        debug!(line, rows = count, "expanded vector line '{}'", text.trim());
        Ok(count)
    }

    /// Rows collected so far.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn finish(self) -> Timeline {
        Timeline::new_checked(self.columns, self.rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(n: usize) -> Vec<Column> {
        (0..n).map(|i| Column::new(format!("s{}", i))).collect()
    }

    fn rows_of(text: &str) -> Vec<String> {
        parse_row_template(text, 1)
            .unwrap()
            .rows()
            .map(|r| r.to_string())
            .collect()
    }

    #[test]
    fn test_fixed_line_is_one_row() {
        let template = parse_row_template("1010 0x3", 1).unwrap();
        assert_eq!(template.row_count(), 1);
        assert_eq!(template.row(0).to_string(), "10100011");
    }

    #[test]
    fn test_range_counts_up() {
        assert_eq!(
            rows_of("[4](0,8)"),
            vec!["0000", "0001", "0010", "0011", "0100", "0101", "0110", "0111"]
        );
    }

    #[test]
    fn test_range_counts_down_exclusive_of_stop() {
        assert_eq!(
            rows_of("[4](8,0)"),
            vec!["1000", "0111", "0110", "0101", "0100", "0011", "0010", "0001"]
        );
    }

    #[test]
    fn test_static_bits_repeat_around_range() {
        assert_eq!(rows_of("1 [2](0,3) 0"), vec!["1000", "1010", "1100"]);
    }

    #[test]
    fn test_equal_span_different_width_is_allowed() {
        let template = parse_row_template("[4](0,4) [3](3,7)", 1).unwrap();
        assert_eq!(template.row_count(), 4);
        assert_eq!(template.width(), 7);
        assert_eq!(template.row(0).to_string(), "0000011");
        assert_eq!(template.row(3).to_string(), "0011110");
    }

    #[test]
    fn test_unequal_spans_are_rejected() {
        let err = parse_row_template("[4](0,8) [4](0,4)", 3).unwrap_err();
        assert!(matches!(
            err,
            BusError::InconsistentRangeSpan {
                line: 3,
                expected: 8,
                found: 4,
                ..
            }
        ));
    }

    #[test]
    fn test_builder_checks_width() {
        let mut builder = TimelineBuilder::new(columns(4));
        assert_eq!(builder.push_line("0x0", 1).unwrap(), 1);
        let err = builder.push_line("0", 2).unwrap_err();
        assert!(matches!(
            err,
            BusError::ColumnCountMismatch {
                line: 2,
                expected: 4,
                found: 1
            }
        ));
        let err = builder.push_line("0x00", 3).unwrap_err();
        assert!(matches!(err, BusError::ColumnCountMismatch { found: 8, .. }));
    }

    #[test]
    fn test_builder_width_checked_for_empty_range() {
        let mut builder = TimelineBuilder::new(columns(4));
        assert_eq!(builder.push_line("[4](3,3)", 1).unwrap(), 0);
        assert!(builder.push_line("[3](3,3)", 2).is_err());
        assert!(builder.is_empty());
    }

    #[test]
    fn test_builder_concatenates_lines_in_order() {
        let mut builder = TimelineBuilder::new(columns(3));
        builder.push_line("111", 1).unwrap();
        builder.push_line("1 [2](0,2)", 2).unwrap();
        let timeline = builder.finish();
        assert_eq!(timeline.len(), 3);
        let rows: Vec<String> = timeline.rows().iter().map(|r| r.to_string()).collect();
        assert_eq!(rows, vec!["111", "100", "101"]);
    }
}
