//! Mass-ledger output files.
//!
//! Two plain-text files are written next to the solver output:
//!
//! - `evaporated_fluid.dat`: one `time volume` line per snapshot, where
//!   `volume` is the total evaporated so far
//! - `removed_fluid.csv`: one `time,x,y,volume,feature` line per
//!   waterbody absorption event, in time order
//!
//! Both are rewritten or appended by the caller at output-frame granularity;
//! nothing here runs inside a sub-step.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::source::{AbsorptionEvent, EvaporationRecord};

/// File name of the evaporated-volume history.
pub const EVAPORATED_FILE: &str = "evaporated_fluid.dat";

/// File name of the absorption-event ledger.
pub const REMOVED_FILE: &str = "removed_fluid.csv";

const REMOVED_HEADER: &str = "time,x,y,volume,feature";

/// Write the evaporated-volume history.
pub fn write_evaporation_history<W: Write>(
    mut writer: W,
    records: &[EvaporationRecord],
) -> std::io::Result<()> {
    writeln!(writer, "# time volume")?;
    for record in records {
        writeln!(writer, "{:.10e} {:.10e}", record.time, record.volume)?;
    }
    writer.flush()
}

/// Write absorption events with a header line, sorted by time.
///
/// Events sharing a time keep their recorded order.
pub fn write_absorption_events<W: Write>(
    mut writer: W,
    events: &[AbsorptionEvent],
) -> std::io::Result<()> {
    writeln!(writer, "{}", REMOVED_HEADER)?;
    write_event_lines(&mut writer, events)?;
    writer.flush()
}

fn write_event_lines<W: Write>(writer: &mut W, events: &[AbsorptionEvent]) -> std::io::Result<()> {
    let mut sorted = events.to_vec();
    sorted.sort_by(|a, b| a.time.total_cmp(&b.time));
    for e in &sorted {
        writeln!(
            writer,
            "{:.10e},{:.10e},{:.10e},{:.10e},{}",
            e.time, e.x, e.y, e.volume, e.feature
        )?;
    }
    Ok(())
}

/// Save the evaporated-volume history to `dir/evaporated_fluid.dat`.
pub fn save_evaporation_history<P: AsRef<Path>>(
    dir: P,
    records: &[EvaporationRecord],
) -> std::io::Result<()> {
    let file = File::create(dir.as_ref().join(EVAPORATED_FILE))?;
    write_evaporation_history(BufWriter::new(file), records)
}

/// Append events to `dir/removed_fluid.csv`, writing the header if the file
/// is new or empty.
pub fn append_absorption_events<P: AsRef<Path>>(
    dir: P,
    events: &[AbsorptionEvent],
) -> std::io::Result<()> {
    let path = dir.as_ref().join(REMOVED_FILE);
    let file = OpenOptions::new().create(true).append(true).open(&path)?;
    let is_new = file.metadata()?.len() == 0;

    let mut writer = BufWriter::new(file);
    if is_new {
        writeln!(writer, "{}", REMOVED_HEADER)?;
    }
    write_event_lines(&mut writer, events)?;
    writer.flush()
}
