//! # Trial Corpus
//!
//! Benchmark schemas are kept in a line-oriented text file, one record per
//! line:
//!
//! ```text
//! % order 3, generated from the Siamese walk
//! trial(3, siamese1, easy, [[8,_,6],[_,5,_],[4,_,2]]).
//! ```
//!
//! `_` marks a free cell. `%` starts a comment that runs to the end of the
//! line, and blank lines are ignored.
//!
//! ## Example
//!
//! ```rust
//! use magicga::trial::{find_trial, parse_corpus};
//!
//! let corpus = "trial(3, siamese1, easy, [[8,_,6],[_,5,_],[4,_,2]]).\n";
//! let trials = parse_corpus(corpus).unwrap();
//! let trial = find_trial(&trials, 3, "siamese1", "easy").unwrap();
//! assert_eq!(trial.schema.fixed_count(), 5);
//! ```

use std::fs;
use std::path::Path;

use crate::error::{MagicError, Result, ResultExt};
use crate::square::Schema;

/// One record of the corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trial {
    pub order: usize,
    /// Name of the method that generated the underlying square.
    pub generator: String,
    pub difficulty: String,
    pub schema: Schema,
}

/// Parses every trial in `input`.
///
/// # Errors
///
/// Returns [`MagicError::Parse`] with the one-based line number of the first
/// malformed record.
pub fn parse_corpus(input: &str) -> Result<Vec<Trial>> {
    let mut trials = Vec::new();
    for (idx, raw) in input.lines().enumerate() {
        // `%` starts a comment anywhere on the line
        let line = raw.split('%').next().unwrap_or_default().trim();
        if line.is_empty() {
            continue;
        }
        let trial = parse_trial(line).map_err(|message| MagicError::Parse {
            line: idx + 1,
            message,
        })?;
        trials.push(trial);
    }
    Ok(trials)
}

/// Reads and parses a corpus file.
pub fn load_corpus<P: AsRef<Path>>(path: P) -> Result<Vec<Trial>> {
    let path = path.as_ref();
    let input = fs::read_to_string(path)
        .context(format!("failed to read trial corpus {}", path.display()))?;
    parse_corpus(&input)
}

/// Looks up a trial by order, generator and difficulty.
pub fn find_trial<'a>(
    trials: &'a [Trial],
    order: usize,
    generator: &str,
    difficulty: &str,
) -> Option<&'a Trial> {
    trials
        .iter()
        .find(|t| t.order == order && t.generator == generator && t.difficulty == difficulty)
}

fn parse_trial(line: &str) -> std::result::Result<Trial, String> {
    let body = line
        .strip_prefix("trial(")
        .ok_or_else(|| format!("expected `trial(`, found `{}`", line))?;
    let body = body
        .strip_suffix(").")
        .ok_or_else(|| "expected the record to end with `).`".to_string())?;

    let mut fields = body.splitn(4, ',');
    let mut next_field = |name: &str| {
        fields
            .next()
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .ok_or_else(|| format!("missing {}", name))
    };
    let order_field = next_field("order")?;
    let generator = next_field("generator")?.to_string();
    let difficulty = next_field("difficulty")?.to_string();
    let grid = next_field("grid")?;

    let order: usize = order_field
        .parse()
        .map_err(|_| format!("invalid order `{}`", order_field))?;
    if order == 0 {
        return Err("order cannot be zero".to_string());
    }

    let rows = parse_grid(grid)?;
    if rows.len() != order || rows.iter().any(|row| row.len() != order) {
        return Err(format!("grid is not {}×{}", order, order));
    }
    let schema =
        Schema::from_cells(rows.into_iter().flatten().collect()).map_err(|e| e.to_string())?;

    Ok(Trial {
        order,
        generator,
        difficulty,
        schema,
    })
}

/// Parses `[[a,b],[c,d]]` into rows, `_` becoming `None`.
fn parse_grid(grid: &str) -> std::result::Result<Vec<Vec<Option<usize>>>, String> {
    let inner = grid
        .strip_prefix('[')
        .and_then(|g| g.strip_suffix(']'))
        .ok_or_else(|| format!("expected a bracketed grid, found `{}`", grid))?;

    let mut rows = Vec::new();
    let mut rest = inner.trim();
    while !rest.is_empty() {
        let open = rest
            .strip_prefix('[')
            .ok_or_else(|| format!("expected `[` at `{}`", rest))?;
        let close = open
            .find(']')
            .ok_or_else(|| "unclosed row".to_string())?;
        let row = open[..close]
            .split(',')
            .map(|cell| parse_cell(cell.trim()))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        rows.push(row);

        rest = open[close + 1..].trim_start();
        if let Some(after) = rest.strip_prefix(',') {
            rest = after.trim_start();
        }
    }
    Ok(rows)
}

fn parse_cell(cell: &str) -> std::result::Result<Option<usize>, String> {
    match cell {
        "_" => Ok(None),
        _ => cell
            .parse()
            .map(Some)
            .map_err(|_| format!("invalid cell `{}`", cell)),
    }
}
