//! Row decomposition of the global grid over a ring of workers.

use crate::error::LayoutError;
use anneal_env::Rank;

/// How `total_rows` rows are split over `workers` ranks.
///
/// Every rank gets `total_rows / workers` contiguous rows, in rank order;
/// the last rank also absorbs the remainder. Ranks form a closed ring, so
/// rank 0 and rank `workers - 1` are neighbours and the grid wraps
/// vertically the same way each row wraps horizontally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingLayout {
    total_rows: usize,
    workers: usize,
}

/// One rank's share of the layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assignment {
    /// The rank this share belongs to
    pub rank: Rank,

    /// Number of authoritative rows
    pub rows: usize,

    /// Global index of the first authoritative row
    pub first_row: usize,

    /// Ring neighbour above (receives our top row)
    pub up: Rank,

    /// Ring neighbour below (receives our bottom row)
    pub down: Rank,
}

impl RingLayout {
    /// Creates a layout, rejecting degenerate decompositions.
    ///
    /// Requires `workers >= 1`, `total_rows >= 1` and `total_rows >= workers`
    /// so that every rank owns at least one row.
    pub fn new(total_rows: usize, workers: usize) -> Result<Self, LayoutError> {
        if workers == 0 {
            return Err(LayoutError::NoWorkers);
        }
        if total_rows == 0 {
            return Err(LayoutError::NoRows);
        }
        if total_rows < workers {
            return Err(LayoutError::TooManyWorkers {
                rows: total_rows,
                workers,
            });
        }
        Ok(Self { total_rows, workers })
    }

    pub fn total_rows(&self) -> usize {
        self.total_rows
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Rows owned by every rank but the last.
    pub fn base_rows(&self) -> usize {
        self.total_rows / self.workers
    }

    /// Rows owned by `rank`.
    pub fn rows(&self, rank: Rank) -> usize {
        if rank.index() + 1 == self.workers {
            self.base_rows() + self.total_rows % self.workers
        } else {
            self.base_rows()
        }
    }

    /// Global index of `rank`'s first row.
    pub fn first_row(&self, rank: Rank) -> usize {
        rank.index() * self.base_rows()
    }

    /// Neighbour above `rank`, wrapping from 0 to the last rank.
    pub fn up(&self, rank: Rank) -> Rank {
        Rank((rank.index() + self.workers - 1) % self.workers)
    }

    /// Neighbour below `rank`, wrapping from the last rank to 0.
    pub fn down(&self, rank: Rank) -> Rank {
        Rank((rank.index() + 1) % self.workers)
    }

    /// All ranks in order.
    pub fn ranks(&self) -> impl Iterator<Item = Rank> {
        (0..self.workers).map(Rank)
    }

    /// Returns `rank`'s complete share.
    pub fn assignment(&self, rank: Rank) -> Result<Assignment, LayoutError> {
        if rank.index() >= self.workers {
            return Err(LayoutError::RankOutOfRange {
                rank,
                workers: self.workers,
            });
        }
        Ok(Assignment {
            rank,
            rows: self.rows(rank),
            first_row: self.first_row(rank),
            up: self.up(rank),
            down: self.down(rank),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_uneven_split_goes_to_last() {
        let layout = RingLayout::new(10, 3).unwrap();
        assert_eq!(layout.rows(Rank(0)), 3);
        assert_eq!(layout.rows(Rank(1)), 3);
        assert_eq!(layout.rows(Rank(2)), 4);
        assert_eq!(layout.first_row(Rank(2)), 6);
    }

    #[test]
    fn test_single_worker_is_own_neighbour() {
        let layout = RingLayout::new(4, 1).unwrap();
        let share = layout.assignment(Rank(0)).unwrap();
        assert_eq!(share.rows, 4);
        assert_eq!(share.up, Rank(0));
        assert_eq!(share.down, Rank(0));
    }

    #[test]
    fn test_ring_wraps_at_both_ends() {
        let layout = RingLayout::new(8, 4).unwrap();
        assert_eq!(layout.up(Rank(0)), Rank(3));
        assert_eq!(layout.down(Rank(3)), Rank(0));
        assert_eq!(layout.up(Rank(2)), Rank(1));
        assert_eq!(layout.down(Rank(2)), Rank(3));
    }

    #[test]
    fn test_degenerate_layouts_rejected() {
        assert_eq!(RingLayout::new(5, 0), Err(LayoutError::NoWorkers));
        assert_eq!(RingLayout::new(0, 1), Err(LayoutError::NoRows));
        assert_eq!(
            RingLayout::new(2, 3),
            Err(LayoutError::TooManyWorkers { rows: 2, workers: 3 })
        );
        assert!(RingLayout::new(3, 3).is_ok());
    }

    #[test]
    fn test_assignment_out_of_range() {
        let layout = RingLayout::new(8, 2).unwrap();
        assert!(matches!(
            layout.assignment(Rank(2)),
            Err(LayoutError::RankOutOfRange { workers: 2, .. })
        ));
    }

    proptest! {
        #[test]
        fn prop_partition_sizes_conserved(workers in 1usize..64, extra in 0usize..2048) {
            let rows = workers + extra;
            let layout = RingLayout::new(rows, workers).unwrap();

            let total: usize = layout.ranks().map(|r| layout.rows(r)).sum();
            prop_assert_eq!(total, rows);

            for rank in layout.ranks().take(workers - 1) {
                prop_assert_eq!(layout.rows(rank), layout.base_rows());
            }
        }

        #[test]
        fn prop_partitions_are_contiguous(workers in 1usize..32, extra in 0usize..512) {
            let layout = RingLayout::new(workers + extra, workers).unwrap();
            let mut next = 0;
            for rank in layout.ranks() {
                prop_assert_eq!(layout.first_row(rank), next);
                next += layout.rows(rank);
            }
            prop_assert_eq!(next, layout.total_rows());
        }

        #[test]
        fn prop_ring_closes(workers in 1usize..128, start in 0usize..128) {
            let layout = RingLayout::new(workers, workers).unwrap();
            let origin = Rank(start % workers);

            let mut at = origin;
            for _ in 0..workers {
                at = layout.down(at);
            }
            prop_assert_eq!(at, origin);
            prop_assert_eq!(layout.up(layout.down(origin)), origin);
        }
    }
}
