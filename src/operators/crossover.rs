use crate::rng::RandomNumberGenerator;

/// Cycle crossover.
///
/// Indices are partitioned into cycles: starting at an unvisited index `i`,
/// the value `dad[i]` is looked up in `mom`, and its index continues the cycle
/// until it returns to `i`. Cycles are copied alternately from `mom` and
/// `dad`, so every value keeps a position it held in one of the parents.
///
/// `mom` and `dad` must be permutations of the same value set; the child is
/// then a permutation of that set as well.
///
/// # Panics
///
/// Panics if the three slices have different lengths.
///
/// # Example
///
/// ```rust
/// use magicga::operators::cycle_crossover;
///
/// let mom = [1, 2, 3, 4, 5, 6, 7, 8];
/// let dad = [8, 5, 2, 1, 3, 6, 4, 7];
/// let mut child = [0; 8];
/// cycle_crossover(&mut child, &mom, &dad);
/// assert_eq!(child, [1, 5, 2, 4, 3, 6, 7, 8]);
/// ```
pub fn cycle_crossover(child: &mut [usize], mom: &[usize], dad: &[usize]) {
    assert_eq!(child.len(), mom.len());
    assert_eq!(mom.len(), dad.len());

    let max = mom.iter().copied().max().unwrap_or(0);
    let mut position_in_mom = vec![usize::MAX; max + 1];
    for (i, &v) in mom.iter().enumerate() {
        position_in_mom[v] = i;
    }

    let mut assigned = vec![false; mom.len()];
    let mut from_mom = true;
    for start in 0..mom.len() {
        if assigned[start] {
            continue;
        }
        let mut i = start;
        loop {
            assigned[i] = true;
            child[i] = if from_mom { mom[i] } else { dad[i] };
            let next = position_in_mom
                .get(dad[i])
                .copied()
                .unwrap_or(usize::MAX);
            if next == usize::MAX || next == start || assigned[next] {
                break;
            }
            i = next;
        }
        from_mom = !from_mom;
    }
}

/// Uniform crossover: each position is inherited from `mom` or `dad` with probability 0.5.
pub fn uniform_crossover<T: Copy>(
    child: &mut [T],
    mom: &[T],
    dad: &[T],
    rng: &mut RandomNumberGenerator,
) {
    for ((c, &m), &d) in child.iter_mut().zip(mom).zip(dad) {
        *c = if rng.chance(0.5) { m } else { d };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_permutation_of(values: &[usize], reference: &[usize]) -> bool {
        let mut a = values.to_vec();
        let mut b = reference.to_vec();
        a.sort_unstable();
        b.sort_unstable();
        a == b
    }

    #[test]
    fn test_cycle_crossover_textbook() {
        let mom = [1, 2, 3, 4, 5, 6, 7, 8];
        let dad = [8, 5, 2, 1, 3, 6, 4, 7];
        let mut child = [0; 8];
        cycle_crossover(&mut child, &mom, &dad);
        // cycle {0,3,6,7} from mom, {1,4,2} from dad, {5} from mom
        assert_eq!(child, [1, 5, 2, 4, 3, 6, 7, 8]);
    }

    #[test]
    fn test_cycle_crossover_identical_parents() {
        let mom = [3, 1, 2];
        let mut child = [0; 3];
        cycle_crossover(&mut child, &mom, &mom);
        assert_eq!(child, mom);
    }

    #[test]
    fn test_cycle_crossover_keeps_permutation() {
        let mut rng = RandomNumberGenerator::from_seed(99);
        for len in [1, 2, 9, 16, 25, 49] {
            for _ in 0..50 {
                let mom: Vec<usize> = rng.permutation(len).into_iter().map(|v| v + 1).collect();
                let dad: Vec<usize> = rng.permutation(len).into_iter().map(|v| v + 1).collect();
                let mut child = vec![0; len];
                cycle_crossover(&mut child, &mom, &dad);
                assert!(is_permutation_of(&child, &mom));
                for i in 0..len {
                    assert!(child[i] == mom[i] || child[i] == dad[i]);
                }
            }
        }
    }

    #[test]
    fn test_uniform_crossover_picks_from_parents() {
        let mut rng = RandomNumberGenerator::from_seed(4);
        let mom = [1i64, 2, 3, 4, 5, 6];
        let dad = [-1i64, -2, -3, -4, -5, -6];
        let mut from_mom = 0;
        for _ in 0..200 {
            let mut child = [0i64; 6];
            uniform_crossover(&mut child, &mom, &dad, &mut rng);
            for i in 0..6 {
                assert!(child[i] == mom[i] || child[i] == dad[i]);
                if child[i] == mom[i] {
                    from_mom += 1;
                }
            }
        }
        // 1200 draws at p = 0.5
        assert!((450..750).contains(&from_mom));
    }
}
