//! Signal declaration expansion.
//!
//! A declaration line is a whitespace-separated list of bare names and bus
//! slices. `data[7:0]` expands to `data[7] data[6] ... data[0]`, stepping
//! from the left bound toward the right bound, so `[0:7]` and `[7:0]` give
//! opposite column orders. An optional suffix after `]` is kept on every
//! expanded name (`q[1:0]_n` → `q[1]_n q[0]_n`).

use tracing::warn;

use super::ast::Column;
use super::parser::ParseOptions;
use crate::error::{BusError, Result};

/// Most columns a single bus slice may declare.
pub const MAX_BUS_WIDTH: u64 = 1 << 16;

/// Expand every token of a declaration line into columns.
pub fn expand_declarations(text: &str, line: usize, options: &ParseOptions) -> Result<Vec<Column>> {
    let mut columns = Vec::new();
    for token in text.split_whitespace() {
        columns.extend(expand_signal(token, line, options)?);
    }
    Ok(columns)
}

/// Expand a single declaration token.
pub fn expand_signal(token: &str, line: usize, options: &ParseOptions) -> Result<Vec<Column>> {
    if !token.contains('[') && !token.contains(']') {
        return Ok(vec![Column::new(token)]);
    }

    match split_slice(token) {
        Ok(slice) => Ok(slice.expand()),
        Err(message) => {
            let (name, _) = token.split_once('[').unwrap_or((token, ""));
            if options.permissive && !name.is_empty() && !name.contains(']') {
                warn!(line, token, "malformed bus declaration ({}), passing through as '{}'", message, name);
                Ok(vec![Column::new(name)])
            } else {
                Err(BusError::malformed(line, token, message))
            }
        }
    }
}

/// Anatomy of a bus declaration: `name[left:right]suffix`.
#[derive(Debug)]
struct Slice<'a> {
    name: &'a str,
    left: i64,
    right: i64,
    suffix: &'a str,
}

impl Slice<'_> {
    fn expand(&self) -> Vec<Column> {
        let indices: Box<dyn Iterator<Item = i64>> = if self.right >= self.left {
            Box::new(self.left..=self.right)
        } else {
            Box::new((self.right..=self.left).rev())
        };
        indices
            .map(|index| Column::new(format!("{}[{}]{}", self.name, index, self.suffix)))
            .collect()
    }
}

fn split_slice(token: &str) -> std::result::Result<Slice<'_>, &'static str> {
    let (name, tail) = token.split_once('[').ok_or("missing '['")?;
    let (bounds, suffix) = tail.split_once(']').ok_or("missing ']'")?;
    let (left, right) = bounds.split_once(':').ok_or("missing ':' in bus range")?;

    if name.is_empty() {
        return Err("no signal name before '['");
    }
    if name.contains(']') || suffix.contains('[') || suffix.contains(']') {
        return Err("unbalanced brackets");
    }
    let left: i64 = left.trim().parse().map_err(|_| "bus bound is not an integer")?;
    let right: i64 = right.trim().parse().map_err(|_| "bus bound is not an integer")?;
    let width = left.abs_diff(right).checked_add(1).ok_or("bus range too wide")?;
    if width > MAX_BUS_WIDTH {
        return Err("bus range too wide");
    }

    Ok(Slice {
        name,
        left,
        right,
        suffix,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(text: &str) -> Vec<String> {
        expand_declarations(text, 1, &ParseOptions::default())
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect()
    }

    #[test]
    fn test_bare_names_keep_order() {
        assert_eq!(names("a3 a2 clk"), vec!["a3", "a2", "clk"]);
    }

    #[test]
    fn test_bus_direction_is_preserved() {
        assert_eq!(names("d[3:0]"), vec!["d[3]", "d[2]", "d[1]", "d[0]"]);
        assert_eq!(names("d[0:3]"), vec!["d[0]", "d[1]", "d[2]", "d[3]"]);
        assert_eq!(names("d[5:5]"), vec!["d[5]"]);
    }

    #[test]
    fn test_bus_mixed_with_bare_and_suffix() {
        assert_eq!(
            names("en q[1:0]_n rst"),
            vec!["en", "q[1]_n", "q[0]_n", "rst"]
        );
    }

    #[test]
    fn test_duplicates_are_kept() {
        assert_eq!(names("a a"), vec!["a", "a"]);
    }

    #[test]
    fn test_malformed_declarations() {
        for token in ["d[3:0", "d3:0]", "[3:0]", "d[3]", "d[a:0]", "d[3:0]]", "d[1:0][2:0]"] {
            let err = expand_declarations(token, 9, &ParseOptions::default()).unwrap_err();
            assert!(
                matches!(err, BusError::MalformedDeclaration { line: 9, .. }),
                "{token}"
            );
        }
    }

    #[test]
    fn test_oversized_bus_is_rejected() {
        for token in ["d[-9223372036854775808:9223372036854775807]", "d[0:65536]"] {
            let err = expand_declarations(token, 4, &ParseOptions::default()).unwrap_err();
            assert!(
                matches!(err, BusError::MalformedDeclaration { line: 4, .. }),
                "{token}"
            );
        }
        assert_eq!(names("d[0:65535]").len(), 65536);
        assert_eq!(names("d[-1:1]"), vec!["d[-1]", "d[0]", "d[1]"]);
    }

    #[test]
    fn test_permissive_passes_through_name() {
        let options = ParseOptions::default().with_permissive(true);
        let columns = expand_declarations("d[3] x", 1, &options).unwrap();
        assert_eq!(columns, vec![Column::new("d"), Column::new("x")]);

        // A missing name is never recoverable
        assert!(expand_declarations("[3:0]", 1, &options).is_err());
    }
}
