//! SPICE source deck output.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use tracing::info;

use super::{PwlDeck, Waveform};
use crate::dsl::format_value;
use crate::error::{BusError, Result};

/// Node name of the derived clock source.
pub const CLOCK_NAME: &str = "clock";

/// Write `deck` as SPICE voltage sources, clock first.
///
/// Each source is a single `V<name> <name> 0 PWL t0 v0 t1 v1 ...` line
/// referenced to ground, followed by a blank line.
pub fn write_deck<W: Write>(deck: &PwlDeck, w: &mut W) -> io::Result<()> {
    writeln!(
        w,
        "* PWL sources: {} nodes, {}s",
        deck.source_count(),
        format_value(deck.duration)
    )?;
    writeln!(w)?;

    for wave in deck.clock.iter().chain(&deck.sources) {
        write_source(wave, w)?;
        writeln!(w)?;
    }
    Ok(())
}

fn write_source<W: Write>(wave: &Waveform, w: &mut W) -> io::Result<()> {
    write!(w, "V{} {} 0 PWL", wave.name, wave.name)?;
    for point in &wave.points {
        write!(
            w,
            " {} {}",
            format_value(point.time),
            format_value(point.voltage)
        )?;
    }
    writeln!(w)
}

/// Write `deck` to a file at `path`, replacing any existing content.
pub fn write_file(deck: &PwlDeck, path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|e| BusError::write(path, e))?;
    let mut out = BufWriter::new(file);
    write_deck(deck, &mut out)
        .and_then(|()| out.flush())
        .map_err(|e| BusError::write(path, e))?;
    info!("Output file: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pwl::Breakpoint;

    fn wave(name: &str, points: &[(f64, f64)]) -> Waveform {
        Waveform {
            name: name.to_string(),
            points: points.iter().map(|&(t, v)| Breakpoint::new(t, v)).collect(),
        }
    }

    #[test]
    fn test_source_line_format() {
        let mut buf = Vec::new();
        let a = wave("a", &[(0.0, 0.0), (2e-9, 0.0), (2.2e-9, 5.0), (4e-9, 5.0)]);
        write_source(&a, &mut buf).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "Va a 0 PWL 0 0 2n 0 2.2n 5 4n 5\n"
        );
    }

    #[test]
    fn test_clock_is_written_first() {
        let deck = PwlDeck {
            sources: vec![wave("a", &[(0.0, 0.0), (1e-9, 0.0)])],
            clock: Some(wave(CLOCK_NAME, &[(0.0, 0.0), (5e-10, 0.0), (7e-10, 3.3)])),
            duration: 1e-9,
        };
        let text = deck.to_string();
        let lines: Vec<&str> = text.lines().filter(|l| l.starts_with('V')).collect();
        assert_eq!(
            lines,
            vec![
                "Vclock clock 0 PWL 0 0 500p 0 700p 3.3",
                "Va a 0 PWL 0 0 1n 0",
            ]
        );
        assert!(text.starts_with("* "));
    }

    #[test]
    fn test_deck_without_clock() {
        let deck = PwlDeck {
            sources: vec![wave("x", &[(0.0, 1.2)]), wave("y", &[(0.0, -1.2)])],
            clock: None,
            duration: 0.0,
        };
        let text = deck.to_string();
        assert!(!text.contains("Vclock"));
        assert!(text.contains("Vx x 0 PWL 0 1.2\n"));
        assert!(text.contains("Vy y 0 PWL 0 -1.2\n"));
    }
}
