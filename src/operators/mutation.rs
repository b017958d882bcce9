use crate::rng::RandomNumberGenerator;
use crate::square::{order_of, Schema};

/// Probability of each additional round of [`swap_rounds`].
pub const SWAP_PROBABILITY: f64 = 0.2;

/// Swaps the values of two distinct schema-free positions.
///
/// Returns `false` (and leaves the gene alone) when the schema leaves fewer
/// than two free positions.
pub fn random_swap(gene: &mut [usize], schema: &Schema, rng: &mut RandomNumberGenerator) -> bool {
    let free = schema.free_positions();
    if free.len() < 2 {
        return false;
    }
    let a = rng.index(free.len());
    let mut b = rng.index(free.len() - 1);
    if b >= a {
        b += 1;
    }
    gene.swap(free[a], free[b]);
    true
}

/// Performs random swaps while a [`SWAP_PROBABILITY`] draw succeeds.
///
/// At least `k` swaps happen with probability `0.2^k`. Returns the number of
/// rounds that won their draw.
pub fn swap_rounds(gene: &mut [usize], schema: &Schema, rng: &mut RandomNumberGenerator) -> usize {
    let mut rounds = 0;
    while rng.chance(SWAP_PROBABILITY) {
        random_swap(gene, schema, rng);
        rounds += 1;
    }
    rounds
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Horizontal,
    Vertical,
}

/// Corner-relation mutation.
///
/// In odd-order Siamese squares the corners come in pairs whose differences
/// match: `TR − TL == BR − BL` and `BL − TL == BR − TR`. A corner and an axis
/// are picked at random; the value the corner would need for the relation on
/// that axis to hold is computed from the other three corners, wrapped into
/// `1..=N²`, and swapped into the corner. Nothing happens if either endpoint
/// of the swap is fixed by the schema.
///
/// Returns `true` if a swap was performed.
pub fn smart_mutation(gene: &mut [usize], schema: &Schema, rng: &mut RandomNumberGenerator) -> bool {
    let corner = match rng.index(4) {
        0 => Corner::TopLeft,
        1 => Corner::TopRight,
        2 => Corner::BottomLeft,
        _ => Corner::BottomRight,
    };
    let axis = if rng.chance(0.5) {
        Axis::Horizontal
    } else {
        Axis::Vertical
    };
    apply_corner_relation(gene, schema, corner, axis)
}

fn apply_corner_relation(gene: &mut [usize], schema: &Schema, corner: Corner, axis: Axis) -> bool {
    let Some(order) = order_of(gene.len()) else {
        return false;
    };
    let size = gene.len() as i64;
    let tl = 0;
    let tr = order - 1;
    let bl = gene.len() - order;
    let br = gene.len() - 1;
    let v = |i: usize| gene[i] as i64;

    let (chosen, target) = match (axis, corner) {
        (Axis::Horizontal, Corner::TopLeft) => (tl, v(tr) + (v(bl) - v(br))),
        (Axis::Horizontal, Corner::TopRight) => (tr, v(tl) - (v(bl) - v(br))),
        (Axis::Horizontal, Corner::BottomLeft) => (bl, v(br) + (v(tl) - v(tr))),
        (Axis::Horizontal, Corner::BottomRight) => (br, v(bl) - (v(tl) - v(tr))),
        (Axis::Vertical, Corner::TopLeft) => (tl, v(bl) + (v(tr) - v(br))),
        (Axis::Vertical, Corner::BottomLeft) => (bl, v(tl) - (v(tr) - v(br))),
        (Axis::Vertical, Corner::TopRight) => (tr, v(br) + (v(tl) - v(bl))),
        (Axis::Vertical, Corner::BottomRight) => (br, v(tr) - (v(tl) - v(bl))),
    };

    let mut target = target;
    if target < 1 {
        target += size;
    } else if target > size {
        target -= size;
    }

    let Some(found) = gene.iter().position(|&x| x as i64 == target) else {
        return false;
    };
    if found == chosen || !schema.is_free(found) || !schema.is_free(chosen) {
        return false;
    }
    gene.swap(chosen, found);
    true
}

/// Adds a rounded standard-normal sample to every value.
pub fn gaussian_perturb(values: &mut [i64], rng: &mut RandomNumberGenerator) {
    for value in values.iter_mut() {
        *value += rng.standard_normal().round() as i64;
    }
}
