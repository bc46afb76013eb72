//! Parser for the bus file notation.
//!
//! A bus file describes a set of digital stimuli as rows of bit values,
//! one row per bit interval. The format is line-oriented and human-editable.
//!
//! # Grammar Overview
//!
//! ```text
//! busfile     = { param_line } signals [ outputs ]
//! param_line  = key '=' value
//! signals     = "Signals:" decl_line+ "Vectors:" vector_line+
//! outputs     = "Outputs:" decl_line+ "Vectors:" vector_line+
//! comment     = '#' { any_char }
//!
//! decl_line   = { name | bus }
//! bus         = name '[' int ':' int ']' [ suffix ]
//!
//! vector_line = { binary | hex | range }
//! binary      = ['0b'] ('0' | '1')+
//! hex         = '0x' hex_digit+
//! range       = '[' nbits ']' '(' int ',' [ int ',' ] int ')'
//!
//! value       = number [ suffix ]
//! suffix      = 't' | 'g' | 'meg' | 'x' | 'k' | 'mil' | 'm' | 'u' | 'n' | 'p' | 'f'
//! ```
//!
//! # Parameters
//!
//! | Key | Required | Meaning |
//! |-----|----------|---------|
//! | risefall | yes | Data transition duration |
//! | bittime | yes | Duration of one row |
//! | bitlow | yes | Voltage of logic 0 |
//! | bithigh | yes | Voltage of logic 1 |
//! | clockdelay | no | Clock edge lag; enables the clock source |
//! | clockrisefall | no | Clock transition duration (default `risefall`) |
//! | edge | no | `rising` or `falling` first clock edge |
//! | tsu, th | no | Setup/hold windows for verification |
//!
//! # Vector Literals
//!
//! Each hex digit is exactly four columns, including leading zeros, so
//! `0x0` covers four columns and `0x00` eight. A bare `0` is a single
//! column. A range `[n](a,b)` generates `|b - a|` rows counting from `a`
//! toward `b`, exclusive of `b`, each rendered as an `n`-bit field. A
//! single range may generate at most [`MAX_RANGE_ROWS`] rows, and a bus
//! slice may declare at most [`MAX_BUS_WIDTH`] columns.
//!
//! Keywords, markers and suffixes are case-sensitive.
//!
//! # Example
//!
//! ```text
//! # 4-bit adder stimulus
//! risefall = 200p
//! bittime = 1n
//! bitlow = 0
//! bithigh = 5
//! clockdelay = 500p
//!
//! Signals:
//! a[3:0] b[3:0]
//! Vectors:
//! 0x00
//! [4](0,8) 0011
//! ```

mod ast;
mod lexer;
mod params;
mod parser;
mod signals;
mod vectors;

pub use ast::*;
pub use lexer::{
    format_value, parse_range, parse_value, Lexer, RangeSpec, Token, TokenKind, MAX_RANGE_ROWS,
};
pub use params::ParamSet;
pub use parser::{ParseOptions, Parser};
pub use signals::{expand_declarations, expand_signal, MAX_BUS_WIDTH};
pub use vectors::{parse_row_template, Field, RowTemplate, TimelineBuilder};

use std::path::Path;

use crate::error::{BusError, Result};

/// Parse a bus file string with default options.
pub fn parse(input: &str) -> Result<ParsedBus> {
    parse_with(input, &ParseOptions::default())
}

/// Parse a bus file string.
pub fn parse_with(input: &str, options: &ParseOptions) -> Result<ParsedBus> {
    let mut parser = Parser::new(input, options.clone());
    parser.parse()
}

/// Parse a bus file from disk.
pub fn parse_file(path: &Path, options: &ParseOptions) -> Result<ParsedBus> {
    let content = std::fs::read_to_string(path).map_err(|e| BusError::read(path, e))?;
    parse_with(&content, options)
}
