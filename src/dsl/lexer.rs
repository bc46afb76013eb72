//! Lexer for vector lines and SI-suffixed numeric literals.

use std::iter::Peekable;
use std::str::CharIndices;

use super::ast::Bits;
use crate::error::{BusError, Result};

/// A token produced by the vector lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The kind of token
    pub kind: TokenKind,
    /// The token's text
    pub text: String,
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed)
    pub column: usize,
}

/// Token types on a vectors-block line.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Binary literal, bare (`0110`) or prefixed (`0b0110`)
    Binary(Bits),
    /// Hex literal (`0x3F`), four bits per digit
    Hex(Bits),
    /// Counting range (`[4](0,8)`)
    Range(RangeSpec),
}

impl TokenKind {
    /// Number of columns the token covers.
    pub fn width(&self) -> usize {
        match self {
            Self::Binary(bits) | Self::Hex(bits) => bits.len(),
            Self::Range(range) => range.nbits as usize,
        }
    }
}

/// Most rows a single range token may generate.
pub const MAX_RANGE_ROWS: u64 = 1 << 20;

/// A dynamic range `[nbits](start,stop)` or `[nbits](start,step,stop)`.
///
/// Counts from `start` toward `stop`, exclusive of `stop`, in either direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeSpec {
    pub nbits: u32,
    pub start: u64,
    pub step: u64,
    pub stop: u64,
}

impl RangeSpec {
    /// Number of rows this range generates.
    pub fn row_count(&self) -> usize {
        let span = self.start.abs_diff(self.stop);
        span.div_ceil(self.step) as usize
    }

    pub fn is_descending(&self) -> bool {
        self.start > self.stop
    }

    /// Value generated for row `index`.
    pub fn value(&self, index: usize) -> u64 {
        let offset = index as u64 * self.step;
        if self.is_descending() {
            self.start - offset
        } else {
            self.start + offset
        }
    }

    /// Binary field generated for row `index`.
    pub fn bits(&self, index: usize) -> Bits {
        Bits::from_value(self.value(index), self.nbits)
    }

    /// Largest value the range generates, if it generates any.
    pub fn max_value(&self) -> Option<u64> {
        match self.row_count() {
            0 => None,
            _ if self.is_descending() => Some(self.start),
            n => Some(self.value(n - 1)),
        }
    }

    fn fits(&self) -> bool {
        match self.max_value() {
            Some(max) if self.nbits < 64 => max >> self.nbits == 0,
            _ => true,
        }
    }
}

/// Lexer for one line of a vectors block.
///
/// Tokens are recognized greedily by syntax; whitespace between them is
/// optional.
pub struct Lexer<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
    line: usize,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for one source line.
    pub fn new(input: &'a str, line: usize) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
            line,
        }
    }

    /// Lex the whole line.
    pub fn tokenize(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }

    /// Get the next token, or `None` at end of line.
    pub fn next_token(&mut self) -> Result<Option<Token>> {
        self.skip_whitespace();

        let (start, ch) = match self.chars.peek().copied() {
            Some(next) => next,
            None => return Ok(None),
        };
        let input = self.input;
        let column = input[..start].chars().count() + 1;
        let rest = &input[start..];

        let kind = if ch == '[' {
            TokenKind::Range(self.read_range(start)?)
        } else if rest.starts_with("0x") {
            self.advance_by(2);
            let digits = self.read_while(start + 2, |c| c.is_ascii_hexdigit());
            self.reject_trailing(start)?;
            if digits.is_empty() {
                return Err(self.literal_error(start, "missing hex digits after '0x'"));
            }
            let bits = Bits::from_hex_digits(digits)
                .ok_or_else(|| self.literal_error(start, "invalid hex digit"))?;
            TokenKind::Hex(bits)
        } else if rest.starts_with("0b") {
            self.advance_by(2);
            let digits = self.read_while(start + 2, |c| c == '0' || c == '1');
            self.reject_trailing(start)?;
            if digits.is_empty() {
                return Err(self.literal_error(start, "missing binary digits after '0b'"));
            }
            TokenKind::Binary(digits.chars().map(|c| c == '1').collect())
        } else if ch == '0' || ch == '1' {
            let digits = self.read_while(start, |c| c == '0' || c == '1');
            self.reject_trailing(start)?;
            TokenKind::Binary(digits.chars().map(|c| c == '1').collect())
        } else {
            return Err(BusError::invalid_literal(
                self.line,
                ch.to_string(),
                format!("unexpected character '{}' at column {}", ch, column),
            ));
        };

        let end = self.pos();
        Ok(Some(Token {
            kind,
            text: input[start..end].to_string(),
            line: self.line,
            column,
        }))
    }

    fn pos(&mut self) -> usize {
        self.chars
            .peek()
            .map(|(pos, _)| *pos)
            .unwrap_or(self.input.len())
    }

    fn advance_by(&mut self, n: usize) {
        for _ in 0..n {
            self.chars.next();
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(&(_, ch)) = self.chars.peek() {
            if ch.is_whitespace() {
                self.chars.next();
            } else {
                break;
            }
        }
    }

    fn read_while(&mut self, from: usize, accept: impl Fn(char) -> bool) -> &'a str {
        while let Some(&(_, ch)) = self.chars.peek() {
            if accept(ch) {
                self.chars.next();
            } else {
                break;
            }
        }
        let input = self.input;
        let end = self.pos();
        &input[from..end]
    }

    /// A literal must end at whitespace, end of line, or the start of a range.
    fn reject_trailing(&mut self, start: usize) -> Result<()> {
        match self.chars.peek().copied() {
            Some((_, ch)) if ch.is_alphanumeric() || ch == '_' => {
                let end = self.input[start..]
                    .find(char::is_whitespace)
                    .map_or(self.input.len(), |i| start + i);
                Err(BusError::invalid_literal(
                    self.line,
                    &self.input[start..end],
                    format!("unexpected character '{}' in literal", ch),
                ))
            }
            _ => Ok(()),
        }
    }

    fn literal_error(&self, start: usize, message: &str) -> BusError {
        let end = self.input[start..]
            .find(char::is_whitespace)
            .map_or(self.input.len(), |i| start + i);
        BusError::invalid_literal(self.line, &self.input[start..end], message)
    }

    fn read_range(&mut self, start: usize) -> Result<RangeSpec> {
        let close = self.input[start..]
            .find(')')
            .ok_or_else(|| self.literal_error(start, "unterminated range, expected ')'"))?;
        let end = start + close + 1;
        while self.pos() < end {
            self.chars.next();
        }
        parse_range(&self.input[start..end], self.line)
    }
}

/// Parse a complete range token such as `[4](0,8)` or `[8](0x10,2,0)`.
pub fn parse_range(text: &str, line: usize) -> Result<RangeSpec> {
    let err = |message: &str| BusError::invalid_literal(line, text, message);

    let inner = text
        .trim()
        .strip_prefix('[')
        .ok_or_else(|| err("range must start with '['"))?;
    let (nbits, bounds) = inner
        .split_once(']')
        .ok_or_else(|| err("missing ']' after bit count"))?;
    let nbits: u32 = nbits
        .trim()
        .parse()
        .map_err(|_| err("bit count is not an integer"))?;
    if !(1..=64).contains(&nbits) {
        return Err(err("bit count must be between 1 and 64"));
    }

    let bounds = bounds
        .trim()
        .strip_prefix('(')
        .and_then(|b| b.strip_suffix(')'))
        .ok_or_else(|| err("bounds must be written as '(start,stop)'"))?;
    let parts = bounds
        .split(',')
        .map(|p| parse_integer(p.trim()).ok_or_else(|| err("bound is not an integer")))
        .collect::<Result<Vec<u64>>>()?;

    let (start, step, stop) = match parts.as_slice() {
        [start, stop] => (*start, 1, *stop),
        [start, step, stop] => (*start, *step, *stop),
        _ => return Err(err("expected two or three comma-separated values")),
    };
    if step == 0 {
        return Err(err("step must be positive"));
    }

    let range = RangeSpec {
        nbits,
        start,
        step,
        stop,
    };
    if start.abs_diff(stop).div_ceil(step) > MAX_RANGE_ROWS {
        return Err(err("range generates too many rows"));
    }
    if !range.fits() {
        return Err(BusError::RangeOverflow {
            line,
            token: text.to_string(),
            nbits,
        });
    }
    Ok(range)
}

/// Parse an unsigned integer in decimal, `0x` hex or `0b` binary.
fn parse_integer(text: &str) -> Option<u64> {
    if let Some(hex) = text.strip_prefix("0x") {
        u64::from_str_radix(hex, 16).ok()
    } else if let Some(bin) = text.strip_prefix("0b") {
        u64::from_str_radix(bin, 2).ok()
    } else {
        text.parse().ok()
    }
}

/// Magnitude attached to an SI suffix.
#[derive(Debug, Clone, Copy)]
enum Magnitude {
    Pow10(i32),
    Scale(f64),
}

/// Recognized magnitude suffixes. Longer suffixes come first.
const SI_SUFFIXES: &[(&str, Magnitude)] = &[
    ("meg", Magnitude::Pow10(6)),
    ("mil", Magnitude::Scale(25.4e-6)),
    ("t", Magnitude::Pow10(12)),
    ("g", Magnitude::Pow10(9)),
    ("x", Magnitude::Pow10(6)),
    ("k", Magnitude::Pow10(3)),
    ("m", Magnitude::Pow10(-3)),
    ("u", Magnitude::Pow10(-6)),
    ("µ", Magnitude::Pow10(-6)),
    ("n", Magnitude::Pow10(-9)),
    ("p", Magnitude::Pow10(-12)),
    ("f", Magnitude::Pow10(-15)),
];

/// Parse a number with an optional SI magnitude suffix.
///
/// Decimal suffixes are folded into the exponent before conversion, so
/// `200p` yields the closest `f64` to 2e-10 rather than `200.0 * 1e-12`.
/// Suffixes are case-sensitive.
pub fn parse_value(text: &str) -> Result<f64> {
    let text = text.trim();
    let invalid = |message: &str| BusError::invalid_literal(0, text, message);

    let split = text
        .find(|c: char| !(c.is_ascii_digit() || matches!(c, '.' | '+' | '-' | 'e' | 'E')))
        .unwrap_or(text.len());
    let (mantissa, suffix) = text.split_at(split);
    if !mantissa.chars().any(|c| c.is_ascii_digit()) {
        return Err(invalid("missing numeric mantissa"));
    }

    let magnitude = if suffix.is_empty() {
        Magnitude::Pow10(0)
    } else {
        SI_SUFFIXES
            .iter()
            .find(|(s, _)| *s == suffix)
            .map(|(_, m)| *m)
            .ok_or_else(|| invalid("unrecognized magnitude suffix"))?
    };

    let (base, exponent) = match mantissa.find(|c| c == 'e' || c == 'E') {
        Some(i) => {
            let exponent: i32 = mantissa[i + 1..]
                .parse()
                .map_err(|_| invalid("malformed exponent"))?;
            (&mantissa[..i], exponent)
        }
        None => (mantissa, 0),
    };

    let value = match magnitude {
        Magnitude::Pow10(shift) => format!("{}e{}", base, exponent + shift).parse::<f64>(),
        Magnitude::Scale(scale) => format!("{}e{}", base, exponent)
            .parse::<f64>()
            .map(|v| v * scale),
    };
    value.map_err(|_| invalid("mantissa is not a number"))
}

/// Engineering scales used when rendering numbers back to text.
const ENGINEERING: &[(f64, &str)] = &[
    (1e12, "t"),
    (1e9, "g"),
    (1e6, "meg"),
    (1e3, "k"),
    (1.0, ""),
    (1e-3, "m"),
    (1e-6, "u"),
    (1e-9, "n"),
    (1e-12, "p"),
    (1e-15, "f"),
];

/// Render a value in SPICE engineering notation, e.g. `2.2n` or `5`.
pub fn format_value(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    let magnitude = value.abs();
    let (scale, suffix) = ENGINEERING
        .iter()
        .copied()
        .find(|(scale, _)| magnitude >= scale * (1.0 - 1e-12))
        .unwrap_or((1e-15, "f"));

    let mut text = format!("{:.9}", value / scale);
    if text.contains('.') {
        let trimmed = text.trim_end_matches('0').trim_end_matches('.').len();
        text.truncate(trimmed);
    }
    if text == "-0" {
        text = "0".to_string();
    }
    text.push_str(suffix);
    text
}
