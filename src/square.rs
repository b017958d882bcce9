//! # Squares and Schemas
//!
//! A [`Square`] is an N×N grid stored flat in row-major order
//! (`row = idx / N`, `col = idx % N`). Values are one-based: a complete square
//! is a permutation of `1..=N²` and the value `0` marks a cell that has not
//! been filled yet.
//!
//! A [`Schema`] is the partial assignment a solution has to honour. Free cells
//! are `None`, fixed cells carry the value the solution must hold there.
//!
//! ## Example
//!
//! ```rust
//! use magicga::square::{magic_constant, Square};
//!
//! let lo_shu = Square::from_cells(vec![2, 7, 6, 9, 5, 1, 4, 3, 8]).unwrap();
//! assert_eq!(magic_constant(3), 15);
//! assert!(lo_shu.is_magic());
//! assert_eq!(lo_shu.to_string(), "[[2,7,6],[9,5,1],[4,3,8]]");
//! ```

use std::collections::HashSet;
use std::fmt;

use crate::error::{MagicError, Result};
use crate::rng::RandomNumberGenerator;

/// Returns the magic constant for a square of the given order: `N(N²+1)/2`.
pub fn magic_constant(order: usize) -> usize {
    order * (order * order + 1) / 2
}

/// Returns the order of a flat grid with `len` cells, if `len` is a non-zero perfect square.
pub fn order_of(len: usize) -> Option<usize> {
    let order = (len as f64).sqrt().round() as usize;
    (order > 0 && order * order == len).then_some(order)
}

/// A square grid of integers, stored row-major.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Square {
    order: usize,
    cells: Vec<usize>,
}

impl Square {
    /// Creates a zero-filled square.
    pub fn new(order: usize) -> Self {
        Self {
            order,
            cells: vec![0; order * order],
        }
    }

    /// Creates a uniformly random permutation of `1..=order²`.
    pub fn random(order: usize, rng: &mut RandomNumberGenerator) -> Self {
        let cells = rng
            .permutation(order * order)
            .into_iter()
            .map(|v| v + 1)
            .collect();
        Self { order, cells }
    }

    /// Wraps a flat row-major vector. The length must be a non-zero perfect square.
    pub fn from_cells(cells: Vec<usize>) -> Result<Self> {
        let order = order_of(cells.len()).ok_or_else(|| {
            MagicError::Configuration(format!(
                "{} cells do not form a square grid",
                cells.len()
            ))
        })?;
        Ok(Self { order, cells })
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[usize] {
        &self.cells
    }

    pub fn cells_mut(&mut self) -> &mut [usize] {
        &mut self.cells
    }

    pub fn into_cells(self) -> Vec<usize> {
        self.cells
    }

    pub fn index(&self, row: usize, col: usize) -> usize {
        row * self.order + col
    }

    pub fn get(&self, row: usize, col: usize) -> usize {
        self.cells[self.index(row, col)]
    }

    pub fn set(&mut self, row: usize, col: usize, value: usize) {
        let idx = self.index(row, col);
        self.cells[idx] = value;
    }

    /// Returns the index currently holding `value`.
    pub fn position_of(&self, value: usize) -> Option<usize> {
        self.cells.iter().position(|&v| v == value)
    }

    pub fn magic_constant(&self) -> usize {
        magic_constant(self.order)
    }

    /// Forces every fixed cell of `schema` to hold its required value.
    ///
    /// Fixed positions are visited in ascending index order; a mismatching
    /// cell is swapped with the cell currently holding the required value.
    /// With a validated schema (distinct fixed values) a cell fixed earlier is
    /// never disturbed, so the result satisfies the whole schema and repairing
    /// twice is the same as repairing once.
    pub fn repair(&mut self, schema: &Schema) {
        debug_assert_eq!(self.order, schema.order());
        for (i, required) in schema.fixed_cells() {
            if self.cells[i] == required {
                continue;
            }
            if let Some(j) = self.position_of(required) {
                self.cells.swap(i, j);
            }
        }
    }

    /// Returns `true` if every fixed cell of `schema` holds its value.
    pub fn satisfies(&self, schema: &Schema) -> bool {
        schema
            .fixed_cells()
            .all(|(i, required)| self.cells.get(i) == Some(&required))
    }

    /// Returns `true` if the cells are exactly a permutation of `1..=order²`.
    pub fn is_permutation(&self) -> bool {
        let size = self.cells.len();
        let mut seen = vec![false; size];
        for &v in &self.cells {
            if v == 0 || v > size || seen[v - 1] {
                return false;
            }
            seen[v - 1] = true;
        }
        true
    }

    pub fn row_sum(&self, row: usize) -> usize {
        self.cells[row * self.order..(row + 1) * self.order]
            .iter()
            .sum()
    }

    pub fn column_sum(&self, col: usize) -> usize {
        (0..self.order).map(|row| self.get(row, col)).sum()
    }

    /// Sum of the top-left to bottom-right diagonal.
    pub fn main_diagonal_sum(&self) -> usize {
        (0..self.order).map(|i| self.get(i, i)).sum()
    }

    /// Sum of the top-right to bottom-left diagonal.
    pub fn anti_diagonal_sum(&self) -> usize {
        (0..self.order)
            .map(|i| self.get(i, self.order - i - 1))
            .sum()
    }

    /// Sums of all `2·order + 2` lines: rows, then columns, then both diagonals.
    pub fn line_sums(&self) -> Vec<usize> {
        let mut sums = Vec::with_capacity(2 * self.order + 2);
        sums.extend((0..self.order).map(|row| self.row_sum(row)));
        sums.extend((0..self.order).map(|col| self.column_sum(col)));
        sums.push(self.main_diagonal_sum());
        sums.push(self.anti_diagonal_sum());
        sums
    }

    /// Number of lines summing to the magic constant.
    pub fn good_lines(&self) -> usize {
        let target = self.magic_constant();
        self.line_sums().into_iter().filter(|&s| s == target).count()
    }

    /// Total absolute distance of every line sum from the magic constant.
    pub fn deviation(&self) -> usize {
        let target = self.magic_constant();
        self.line_sums().into_iter().map(|s| s.abs_diff(target)).sum()
    }

    /// Returns `true` if this is a permutation whose lines all hit the magic constant.
    pub fn is_magic(&self) -> bool {
        self.is_permutation() && self.deviation() == 0
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_grid(f, self.order, self.cells.iter().map(|&v| (v != 0).then_some(v)))
    }
}

/// A partially specified square acting as a constraint template.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    order: usize,
    cells: Vec<Option<usize>>,
}

impl Schema {
    /// A schema of the given order with every cell free.
    pub fn free(order: usize) -> Self {
        Self {
            order,
            cells: vec![None; order * order],
        }
    }

    /// Builds a schema from flat row-major cells and validates it.
    ///
    /// # Errors
    ///
    /// Returns [`MagicError::InvalidSchema`] if the length is not a non-zero
    /// perfect square, a fixed value lies outside `1..=order²`, or two fixed
    /// cells require the same value.
    pub fn from_cells(cells: Vec<Option<usize>>) -> Result<Self> {
        let order = order_of(cells.len()).ok_or_else(|| {
            MagicError::InvalidSchema(format!(
                "{} cells do not form a square grid",
                cells.len()
            ))
        })?;
        let schema = Self { order, cells };
        schema.validate()?;
        Ok(schema)
    }

    /// Checks the schema invariants.
    ///
    /// Two fixed cells requiring the same value would make repair chase the
    /// same value back and forth, so they are rejected rather than guessed at.
    pub fn validate(&self) -> Result<()> {
        if self.order == 0 || self.cells.len() != self.order * self.order {
            return Err(MagicError::InvalidSchema(format!(
                "expected {} cells for order {}, found {}",
                self.order * self.order,
                self.order,
                self.cells.len()
            )));
        }
        let size = self.cells.len();
        let mut seen = HashSet::new();
        for (i, value) in self.fixed_cells() {
            if value == 0 || value > size {
                return Err(MagicError::InvalidSchema(format!(
                    "value {} at position {} is outside 1..={}",
                    value, i, size
                )));
            }
            if !seen.insert(value) {
                return Err(MagicError::InvalidSchema(format!(
                    "value {} is fixed more than once (again at position {})",
                    value, i
                )));
            }
        }
        Ok(())
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[Option<usize>] {
        &self.cells
    }

    /// The value required at `idx`, or `None` for a free cell.
    pub fn fixed(&self, idx: usize) -> Option<usize> {
        self.cells.get(idx).copied().flatten()
    }

    pub fn is_free(&self, idx: usize) -> bool {
        self.fixed(idx).is_none()
    }

    /// Iterates `(index, required value)` over fixed cells in ascending index order.
    pub fn fixed_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(i, cell)| cell.map(|v| (i, v)))
    }

    pub fn free_positions(&self) -> Vec<usize> {
        (0..self.cells.len()).filter(|&i| self.is_free(i)).collect()
    }

    pub fn fixed_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_grid(f, self.order, self.cells.iter().copied())
    }
}

/// Writes the nested `[[a,b],[c,d]]` literal, `_` standing for an empty cell.
fn write_grid<I>(f: &mut fmt::Formatter<'_>, order: usize, cells: I) -> fmt::Result
where
    I: Iterator<Item = Option<usize>>,
{
    write!(f, "[")?;
    for (i, cell) in cells.enumerate() {
        let col = i % order;
        if col == 0 {
            if i != 0 {
                write!(f, ",")?;
            }
            write!(f, "[")?;
        } else {
            write!(f, ",")?;
        }
        match cell {
            Some(v) => write!(f, "{}", v)?,
            None => write!(f, "_")?,
        }
        if col == order - 1 {
            write!(f, "]")?;
        }
    }
    write!(f, "]")
}
