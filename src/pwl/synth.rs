//! Breakpoint generation for data and clock waveforms.

use tracing::{debug, info};

use super::{PwlDeck, Waveform};
use crate::dsl::{Edge, Params, ParsedBus, Timeline};
use crate::error::{BusError, Result};

/// Synthesize the stimulus deck for the signals block of a bus file.
pub fn synthesize(bus: &ParsedBus) -> Result<PwlDeck> {
    synthesize_timeline(&bus.signals, &bus.params)
}

/// Synthesize one waveform per column of `timeline`, plus the clock if configured.
pub fn synthesize_timeline(timeline: &Timeline, params: &Params) -> Result<PwlDeck> {
    check_overlap("risefall", params.risefall, params.bittime)?;

    let sources: Vec<Waveform> = timeline
        .columns()
        .iter()
        .enumerate()
        .map(|(index, column)| {
            let wave = data_waveform(&column.name, timeline.column_bits(index).iter(), params);
            debug!(
                "{}: {} breakpoints for {}",
                column.name,
                wave.points.len(),
                timeline.column_bits(index)
            );
            wave
        })
        .collect();

    let clock = clock_waveform(params, timeline.len())?;
    let duration = timeline.duration(params.bittime);
    info!(
        "Synthesized {} sources over {} rows ({:e}s){}",
        sources.len(),
        timeline.len(),
        duration,
        if clock.is_some() { " with clock" } else { "" }
    );

    Ok(PwlDeck {
        sources,
        clock,
        duration,
    })
}

/// Build the waveform for one column's bit sequence.
///
/// Emits a flat start at time 0, one pair of breakpoints per value change
/// and a closing hold point at the end of the last row. Callers are
/// responsible for rejecting `risefall` values that overlap adjacent rows.
pub fn data_waveform(name: &str, bits: impl IntoIterator<Item = bool>, params: &Params) -> Waveform {
    let mut wave = Waveform::new(name);
    let mut bits = bits.into_iter();

    let Some(first) = bits.next() else {
        wave.push(0.0, params.bitlow);
        return wave;
    };
    wave.push(0.0, params.voltage(first));

    let mut last = first;
    let mut rows = 1usize;
    for (row, bit) in bits.enumerate().map(|(i, bit)| (i + 1, bit)) {
        rows += 1;
        if bit != last {
            let start = row as f64 * params.bittime;
            wave.push(start, params.voltage(last));
            wave.push(start + params.risefall, params.voltage(bit));
            last = bit;
        }
    }

    let end = rows as f64 * params.bittime;
    if wave.end_time() < end {
        wave.push(end, params.voltage(last));
    }
    wave
}

/// Build the derived clock for a timeline of `rows` rows, if `clockdelay` is set.
///
/// The clock toggles once per bit interval, starting low for a rising
/// first edge and high for a falling one.
pub fn clock_waveform(params: &Params, rows: usize) -> Result<Option<Waveform>> {
    let Some(delay) = params.clockdelay else {
        return Ok(None);
    };
    let risefall = params.clock_risefall();
    check_overlap("clockrisefall", risefall, params.bittime)?;

    let mut level = params.edge == Edge::Falling;
    let mut wave = Waveform::new(super::CLOCK_NAME);
    wave.push(0.0, params.voltage(level));

    let end = rows as f64 * params.bittime;
    for edge in 0.. {
        let start = edge as f64 * params.bittime + delay;
        if start + risefall > end {
            break;
        }
        wave.push(start, params.voltage(level));
        level = !level;
        wave.push(start + risefall, params.voltage(level));
    }

    if wave.end_time() < end {
        wave.push(end, params.voltage(level));
    }
    Ok(Some(wave))
}

fn check_overlap(name: &str, risefall: f64, bittime: f64) -> Result<()> {
    if 2.0 * risefall > bittime {
        return Err(BusError::TransitionOverlap {
            name: name.to_string(),
            risefall,
            bittime,
        });
    }
    Ok(())
}
