//! Parser for the bus file format.
//!
//! The file is read top to bottom in a single pass: parameter lines, the
//! `Signals:` declarations and their `Vectors:` block, then an optional
//! `Outputs:` section with the same shape. Markers are matched
//! case-sensitively.

use tracing::{debug, info};

use super::ast::{Column, ParsedBus, Timeline};
use super::params::ParamSet;
use super::signals::expand_declarations;
use super::vectors::TimelineBuilder;
use crate::error::{BusError, Result};

const SIGNALS_MARKER: &str = "Signals:";
const VECTORS_MARKER: &str = "Vectors:";
const OUTPUTS_MARKER: &str = "Outputs:";

/// Options controlling how strictly a bus file is read.
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Pass malformed bus declarations through as single wires.
    pub permissive: bool,
}

impl ParseOptions {
    /// Create options with default (strict) values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow malformed bus declarations to pass through with a warning.
    pub fn with_permissive(mut self, permissive: bool) -> Self {
        self.permissive = permissive;
        self
    }
}

/// A source line with its 1-indexed number.
#[derive(Debug, Clone, Copy)]
struct Line<'a> {
    number: usize,
    text: &'a str,
}

impl<'a> Line<'a> {
    fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    fn is_comment(&self) -> bool {
        self.text.trim_start().starts_with('#')
    }

    /// If the line starts with `marker`, the text following it.
    fn after_marker(&self, marker: &str) -> Option<&'a str> {
        let rest = self.text.trim_start().strip_prefix(marker)?;
        match rest.chars().next() {
            Some(c) if !c.is_whitespace() => None,
            _ => Some(rest),
        }
    }
}

/// How a vectors block ended.
enum BlockEnd<'a> {
    Eof,
    Blank,
    Outputs(Line<'a>),
}

/// Parser for bus files.
pub struct Parser<'a> {
    lines: Vec<Line<'a>>,
    pos: usize,
    options: ParseOptions,
}

impl<'a> Parser<'a> {
    /// Create a new parser over the given input.
    pub fn new(input: &'a str, options: ParseOptions) -> Self {
        let lines = input
            .lines()
            .enumerate()
            .map(|(i, text)| Line {
                number: i + 1,
                text,
            })
            .collect();
        Self {
            lines,
            pos: 0,
            options,
        }
    }

    /// Parse the entire bus file.
    pub fn parse(&mut self) -> Result<ParsedBus> {
        let (params, signals_line) = self.parse_params()?;
        let params = params.finish()?;

        let (columns, vectors_line) = self.parse_declarations(signals_line, SIGNALS_MARKER)?;
        let (signals, end) = self.parse_vectors(columns, vectors_line)?;
        info!("Signals: {} columns, {} rows", signals.width(), signals.len());

        let outputs_line = match end {
            BlockEnd::Outputs(line) => Some(line),
            BlockEnd::Blank => match self.next_meaningful() {
                Some(line) if line.after_marker(OUTPUTS_MARKER).is_some() => Some(line),
                Some(line) => {
                    return Err(BusError::parse(
                        line.number,
                        format!("expected '{}' or end of file", OUTPUTS_MARKER),
                    ))
                }
                None => None,
            },
            BlockEnd::Eof => None,
        };

        let outputs = match outputs_line {
            Some(line) => Some(self.parse_outputs(line)?),
            None => {
                info!("No output signals detected");
                None
            }
        };

        if let Some(outputs) = &outputs {
            if outputs.len() != signals.len() {
                return Err(BusError::RowCountMismatch {
                    inputs: signals.len(),
                    outputs: outputs.len(),
                });
            }
        }

        Ok(ParsedBus {
            params,
            signals,
            outputs,
        })
    }

    fn next_line(&mut self) -> Option<Line<'a>> {
        let line = self.lines.get(self.pos).copied();
        if line.is_some() {
            self.pos += 1;
        }
        line
    }

    /// Next line that is neither blank nor a comment.
    fn next_meaningful(&mut self) -> Option<Line<'a>> {
        while let Some(line) = self.next_line() {
            if !line.is_blank() && !line.is_comment() {
                return Some(line);
            }
        }
        None
    }

    fn last_line_number(&self) -> usize {
        self.lines.len().max(1)
    }

    /// Read `key = value` lines up to the `Signals:` marker.
    fn parse_params(&mut self) -> Result<(ParamSet, Line<'a>)> {
        let mut params = ParamSet::new();
        loop {
            let line = self.next_meaningful().ok_or_else(|| {
                BusError::parse(
                    self.last_line_number(),
                    format!("'{}' marker not found", SIGNALS_MARKER),
                )
            })?;

            if line.after_marker(SIGNALS_MARKER).is_some() {
                return Ok((params, line));
            }

            let (key, value) = line.text.split_once('=').ok_or_else(|| {
                BusError::parse(
                    line.number,
                    format!("expected 'key = value' or '{}'", SIGNALS_MARKER),
                )
            })?;
            params.set(key.trim(), value.trim(), line.number)?;
        }
    }

    /// Expand declarations from the marker line onward, up to `Vectors:`.
    fn parse_declarations(&mut self, marker_line: Line<'a>, marker: &str) -> Result<(Vec<Column>, Line<'a>)> {
        let first = marker_line.after_marker(marker).unwrap_or("");
        let mut columns = expand_declarations(first, marker_line.number, &self.options)?;

        let vectors_line = loop {
            let line = self.next_meaningful().ok_or_else(|| {
                BusError::parse(
                    self.last_line_number(),
                    format!("'{}' marker not reached before end of file", VECTORS_MARKER),
                )
            })?;
            match line.after_marker(VECTORS_MARKER) {
                Some(rest) if rest.trim().is_empty() => break line,
                Some(_) => {
                    return Err(BusError::parse(
                        line.number,
                        format!("'{}' must be alone on its line", VECTORS_MARKER),
                    ))
                }
                None => columns.extend(expand_declarations(line.text, line.number, &self.options)?),
            }
        };

        if columns.is_empty() {
            return Err(BusError::parse(
                vectors_line.number,
                format!("no signals declared after '{}'", marker),
            ));
        }
        debug!(
            "{} {}",
            marker,
            columns
                .iter()
                .map(|c| c.name.as_str())
                .collect::<Vec<_>>()
                .join(" ")
        );
        Ok((columns, vectors_line))
    }

    /// Expand vector lines until a blank line, `Outputs:`, or end of file.
    fn parse_vectors(&mut self, columns: Vec<Column>, vectors_line: Line<'a>) -> Result<(Timeline, BlockEnd<'a>)> {
        let mut builder = TimelineBuilder::new(columns);
        let mut seen_vector_line = false;

        let end = loop {
            let Some(line) = self.next_line() else {
                break BlockEnd::Eof;
            };
            if line.is_comment() {
                continue;
            }
            if line.is_blank() {
                if seen_vector_line {
                    break BlockEnd::Blank;
                }
                continue;
            }
            if line.after_marker(OUTPUTS_MARKER).is_some() {
                break BlockEnd::Outputs(line);
            }
            builder.push_line(line.text, line.number)?;
            seen_vector_line = true;
        };

        if builder.is_empty() {
            return Err(BusError::parse(vectors_line.number, "vectors block is empty"));
        }
        Ok((builder.finish(), end))
    }

    /// Parse the `Outputs:` section, which must be the last content in the file.
    fn parse_outputs(&mut self, marker_line: Line<'a>) -> Result<Timeline> {
        let (columns, vectors_line) = self.parse_declarations(marker_line, OUTPUTS_MARKER)?;
        let (outputs, end) = self.parse_vectors(columns, vectors_line)?;
        info!("Outputs: {} columns, {} rows", outputs.width(), outputs.len());

        let trailing = match end {
            BlockEnd::Outputs(line) => Some(line),
            BlockEnd::Blank => self.next_meaningful(),
            BlockEnd::Eof => None,
        };
        match trailing {
            Some(line) => Err(BusError::parse(
                line.number,
                "unexpected content after outputs block",
            )),
            None => Ok(outputs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::parse;
    use super::*;

    const HEADER: &str = "risefall = 200p\nbittime = 1n\nbitlow = 0\nbithigh = 5\n";

    fn with_header(body: &str) -> String {
        format!("{}{}", HEADER, body)
    }

    #[test]
    fn test_parse_minimal() {
        let bus = parse(&with_header("Signals:\na b\nVectors:\n01\n10\n")).unwrap();
        assert_eq!(bus.signals.width(), 2);
        assert_eq!(bus.signals.len(), 2);
        assert_eq!(bus.signals.column_bits(0).to_string(), "01");
        assert!(bus.outputs.is_none());
    }

    #[test]
    fn test_comments_and_spacing() {
        let input = "# adder stimulus\n\n  risefall=200p\n# timing\nbittime   =   1n\nbitlow = 0\nbithigh = 5\n\nSignals:\n# names\nd[1:0]\nVectors:\n# first\n00\n11\n";
        let bus = parse(input).unwrap();
        assert_eq!(bus.signals.len(), 2);
        assert_eq!(bus.signals.columns()[0].name, "d[1]");
    }

    #[test]
    fn test_declarations_on_several_lines() {
        let bus = parse(&with_header("Signals:\na\nb c\nVectors:\n101\n")).unwrap();
        assert_eq!(bus.signals.width(), 3);
    }

    #[test]
    fn test_missing_param_before_vectors() {
        let err = parse("risefall = 200p\nbittime = 1n\nbitlow = 0\nSignals:\na\nVectors:\n1\n").unwrap_err();
        assert!(matches!(err, BusError::MissingRequiredParameter { ref name } if name == "bithigh"));
    }

    #[test]
    fn test_param_line_without_equals() {
        let err = parse("risefall 200p\n").unwrap_err();
        assert!(matches!(err, BusError::ParseError { line: 1, .. }));
    }

    #[test]
    fn test_markers_are_case_sensitive() {
        let err = parse(&with_header("signals:\na\nVectors:\n1\n")).unwrap_err();
        assert!(matches!(err, BusError::ParseError { line: 5, .. }));
    }

    #[test]
    fn test_column_mismatch_reports_line() {
        let err = parse(&with_header("Signals:\na b\nVectors:\n01\n0x1\n")).unwrap_err();
        assert!(matches!(
            err,
            BusError::ColumnCountMismatch {
                line: 9,
                expected: 2,
                found: 4
            }
        ));
    }

    #[test]
    fn test_outputs_block() {
        let bus = parse(&with_header(
            "Signals:\na b\nVectors:\n[2](0,4)\nOutputs:\ny\nVectors:\n0\n0\n0\n1\n",
        ))
        .unwrap();
        let outputs = bus.outputs.unwrap();
        assert_eq!(outputs.len(), 4);
        assert_eq!(outputs.column_bits(0).to_string(), "0001");
    }

    #[test]
    fn test_outputs_after_blank_line() {
        let bus = parse(&with_header(
            "Signals:\na\nVectors:\n0\n1\n\n# expected\nOutputs:\ny\nVectors:\n1\n0\n",
        ))
        .unwrap();
        assert_eq!(bus.outputs.unwrap().len(), 2);
    }

    #[test]
    fn test_outputs_row_count_must_match() {
        let err = parse(&with_header(
            "Signals:\na\nVectors:\n0\n1\nOutputs:\ny\nVectors:\n1\n",
        ))
        .unwrap_err();
        assert!(matches!(
            err,
            BusError::RowCountMismatch {
                inputs: 2,
                outputs: 1
            }
        ));
    }

    #[test]
    fn test_blank_line_ends_vectors() {
        let err = parse(&with_header("Signals:\na\nVectors:\n0\n\n1\n")).unwrap_err();
        assert!(matches!(err, BusError::ParseError { line: 10, .. }));
    }

    #[test]
    fn test_empty_vectors_block() {
        let err = parse(&with_header("Signals:\na\nVectors:\n")).unwrap_err();
        assert!(matches!(err, BusError::ParseError { line: 7, .. }));
    }

    #[test]
    fn test_missing_vectors_marker() {
        let err = parse(&with_header("Signals:\na\n")).unwrap_err();
        assert!(matches!(err, BusError::ParseError { .. }));
    }

    #[test]
    fn test_oversized_input_is_an_error() {
        let err = parse(&with_header("Signals:\nd[63:0]\nVectors:\n[64](0,0xFFFFFFFFFFFFFFFF)\n")).unwrap_err();
        assert!(matches!(err, BusError::InvalidLiteral { line: 8, .. }));

        let err = parse(&with_header(
            "Signals:\nd[-9223372036854775808:9223372036854775807]\nVectors:\n0\n",
        ))
        .unwrap_err();
        assert!(matches!(err, BusError::MalformedDeclaration { line: 6, .. }));
    }

    #[test]
    fn test_permissive_option() {
        let input = with_header("Signals:\nd[3] e\nVectors:\n01\n");
        assert!(matches!(
            parse(&input),
            Err(BusError::MalformedDeclaration { line: 6, .. })
        ));
        let bus = super::super::parse_with(&input, &ParseOptions::new().with_permissive(true)).unwrap();
        assert_eq!(bus.signals.columns()[0].name, "d");
    }
}
