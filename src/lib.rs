//! # Bus PWL
//!
//! Converts compact digital test-vector files into SPICE piecewise-linear
//! voltage sources.
//!
//! This library provides:
//! - A parser for the line-oriented bus file notation (parameters, signal
//!   declarations, vector rows with binary, hex and counting-range tokens)
//! - Expansion of bus slices and range tokens into a flat bit [`Timeline`]
//! - Synthesis of one PWL waveform per column plus an optional derived clock
//! - A checker that compares simulated node voltages against expected outputs
//!
//! ## Architecture
//!
//! - [`dsl`] - Parser and expansion engine for the bus file notation
//! - [`pwl`] - Waveform synthesis and SPICE source output
//! - [`verify`] - Trace reading and output verification
//! - [`error`] - Unified error type
//!
//! ## Usage
//!
//! ### CLI
//!
//! ```bash
//! bus2pwl adder.bus -o adder.pwl
//! busverify adder.bus adder_trace.txt
//! ```
//!
//! ### Library
//!
//! ```
//! let input = "\
//! risefall = 200p
//! bittime = 1n
//! bitlow = 0
//! bithigh = 5
//! Signals:
//! a b
//! Vectors:
//! 00
//! 01
//! ";
//! let bus = buspwl::dsl::parse(input).unwrap();
//! let deck = buspwl::pwl::synthesize(&bus).unwrap();
//! assert_eq!(deck.sources.len(), 2);
//! assert!(deck.to_string().contains("Vb b 0 PWL 0 0 1n 0 1.2n 5 2n 5"));
//! ```
//!
//! ## Waveform Timing
//!
//! Row `r` of the timeline spans `[r*bittime, (r+1)*bittime)`. A column that
//! changes value at row `r` ramps linearly from `r*bittime` to
//! `r*bittime + risefall`. The optional clock toggles once per row,
//! `clockdelay` after each row boundary.

pub mod dsl;
pub mod error;
pub mod pwl;
pub mod verify;

// Re-export main types for convenience
pub use dsl::{ParseOptions, ParsedBus, Timeline};
pub use error::{BusError, Result};
pub use pwl::{synthesize, PwlDeck};
pub use verify::{verify, VerifyReport};
