//! The annealing transition rule.

use crate::grid::LocalGrid;

/// Next state indexed by the number of live cells in a 3x3 neighbourhood
/// (centre included).
///
/// Live iff the count is 4, 6, 7, 8 or 9. A count of 5 dies, which is what
/// distinguishes annealing from plain majority voting.
pub const ANNEAL: [u8; 10] = [0, 0, 0, 0, 1, 0, 1, 1, 1, 1];

/// Maps a neighbourhood count to the next state.
#[inline]
pub fn next_state(alive: u8) -> u8 {
    ANNEAL[alive as usize]
}

/// Live cells in the 3x3 block centred on buffer coordinates `(x, y)`.
pub fn neighborhood(grid: &LocalGrid, x: usize, y: usize) -> u8 {
    (y - 1..=y + 1)
        .map(|row| grid.row(row)[x - 1..=x + 1].iter().sum::<u8>())
        .sum()
}

/// Computes one generation of `from`'s authoritative cells into `to`.
///
/// `from` must have synchronised guards and fresh halos. Only the
/// authoritative interior of `to` is written; its halos and guards are left
/// for the next exchange to refresh.
pub fn step(from: &LocalGrid, to: &mut LocalGrid) {
    debug_assert_eq!(from.width(), to.width());
    debug_assert_eq!(from.rows(), to.rows());

    let width = from.width();
    for y in 1..=from.rows() {
        let above = from.row(y - 1).windows(3);
        let here = from.row(y).windows(3);
        let below = from.row(y + 1).windows(3);

        let out = &mut to.row_mut(y)[1..=width];
        for (cell, ((a, h), b)) in out.iter_mut().zip(above.zip(here).zip(below)) {
            let alive = a[0] + a[1] + a[2] + h[0] + h[1] + h[2] + b[0] + b[1] + b[2];
            *cell = ANNEAL[alive as usize];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{ALIVE, DEAD};

    #[test]
    fn test_rule_table() {
        assert_eq!(next_state(0), DEAD);
        assert_eq!(next_state(9), ALIVE);
        assert_eq!(next_state(5), DEAD);

        let alive: Vec<u8> = (0..=9).filter(|&n| next_state(n) == ALIVE).collect();
        assert_eq!(alive, vec![4, 6, 7, 8, 9]);
    }

    #[test]
    fn test_neighborhood_counts_centre() {
        let mut grid = LocalGrid::new(3, 3).unwrap();
        grid.set(2, 2, ALIVE).unwrap();
        grid.set(1, 1, ALIVE).unwrap();
        grid.sync_columns();

        assert_eq!(neighborhood(&grid, 2, 2), 2);
        assert_eq!(neighborhood(&grid, 3, 3), 1);
    }

    #[test]
    fn test_step_matches_cellwise_rule() {
        let mut from = LocalGrid::new(6, 4).unwrap();
        for (x, y) in [(1, 1), (2, 1), (3, 2), (4, 2), (2, 3), (6, 4), (5, 3), (1, 4), (2, 2)] {
            from.set(x, y, ALIVE).unwrap();
        }
        // close the partition on itself so halos are meaningful
        from.sync_columns();
        let bottom = from.row(4).to_vec();
        let top = from.row(1).to_vec();
        from.load_row(0, &bottom).unwrap();
        from.load_row(5, &top).unwrap();

        let mut to = LocalGrid::new(6, 4).unwrap();
        step(&from, &mut to);

        for y in 1..=4 {
            for x in 1..=6 {
                let expected = next_state(neighborhood(&from, x, y));
                assert_eq!(to.get(x, y), expected, "cell ({}, {})", x, y);
            }
        }
    }

    #[test]
    fn test_step_reads_guards_for_wrap() {
        // A live vertical bar in column 1 plus one in column 3: column 2 sees 6 neighbours,
        // column 4 reaches column 3 and 1 (via the guard) in a width-4 ring.
        let mut from = LocalGrid::new(4, 3).unwrap();
        for y in 1..=3 {
            from.set(1, y, ALIVE).unwrap();
            from.set(3, y, ALIVE).unwrap();
        }
        from.sync_columns();
        let bottom = from.row(3).to_vec();
        let top = from.row(1).to_vec();
        from.load_row(0, &bottom).unwrap();
        from.load_row(4, &top).unwrap();

        let mut to = LocalGrid::new(4, 3).unwrap();
        step(&from, &mut to);

        for y in 1..=3 {
            assert_eq!(to.get(2, y), ALIVE);
            assert_eq!(to.get(4, y), ALIVE);
            assert_eq!(to.get(1, y), DEAD);
            assert_eq!(to.get(3, y), DEAD);
        }
    }

    #[test]
    fn test_step_leaves_halos_untouched() {
        let mut from = LocalGrid::new(3, 2).unwrap();
        for y in 0..4 {
            from.row_mut(y).fill(ALIVE);
        }
        let mut to = LocalGrid::new(3, 2).unwrap();
        step(&from, &mut to);

        assert_eq!(to.row(0), &[DEAD; 5]);
        assert_eq!(to.row(3), &[DEAD; 5]);
        assert_eq!(to.row(1), &[DEAD, ALIVE, ALIVE, ALIVE, DEAD]);
    }
}
