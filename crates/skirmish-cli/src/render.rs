//! Text output for the terminal.

use std::fmt::Write as _;

use skirmish_core::world::Sighting;
use skirmish_core::{AgentRecord, Grid};

/// Renders one frame: a row per `y`, a column per `x`, `.` for empty cells.
///
/// Later sightings overwrite earlier ones in the same cell.
pub fn frame(grid: Grid, sightings: &[Sighting]) -> String {
    let size = usize::try_from(grid.size()).unwrap_or(0);
    let mut cells = vec![vec!['.'; size]; size];
    for sighting in sightings {
        let position = grid.clamp(sighting.position);
        if let (Ok(x), Ok(y)) = (usize::try_from(position.x), usize::try_from(position.y)) {
            if let Some(cell) = cells.get_mut(y).and_then(|row| row.get_mut(x)) {
                *cell = sighting.symbol;
            }
        }
    }

    let mut out = String::with_capacity(size * (size + 1));
    for row in cells {
        out.extend(row);
        out.push('\n');
    }
    out
}

/// One `name (symbol) at (x,y)` line per record.
pub fn survivors(records: &[AgentRecord]) -> String {
    let mut out = String::new();
    for record in records {
        let _ = writeln!(
            out,
            "{} ({}) at ({},{})",
            record.name,
            record.kind.symbol(),
            record.position.x,
            record.position.y
        );
    }
    out
}
