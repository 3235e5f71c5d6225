use crate::catalog::Pattern;
use log::debug;
use rayon::prelude::*;

/// The four neighbour directions, in propagator table order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    West,
    South,
    East,
    North,
}

impl Direction {
    /// All directions, indexable by [`Direction::index`].
    pub const ALL: [Self; 4] = [Self::West, Self::South, Self::East, Self::North];

    /// Grid offset `(dx, dy)`, with y growing downwards.
    #[inline]
    pub const fn offset(self) -> (isize, isize) {
        match self {
            Self::West => (-1, 0),
            Self::South => (0, 1),
            Self::East => (1, 0),
            Self::North => (0, -1),
        }
    }

    #[inline]
    pub const fn opposite(self) -> Self {
        match self {
            Self::West => Self::East,
            Self::South => Self::North,
            Self::East => Self::West,
            Self::North => Self::South,
        }
    }

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Whether `p2`, shifted by `(dx, dy)` relative to `p1`, agrees with `p1` on every shared cell.
fn agrees(p1: &Pattern, p2: &Pattern, dx: isize, dy: isize) -> bool {
    let n = p1.size() as isize;
    let (xmin, xmax) = if dx < 0 { (0, dx + n) } else { (dx, n) };
    let (ymin, ymax) = if dy < 0 { (0, dy + n) } else { (dy, n) };
    for y in ymin..ymax {
        for x in xmin..xmax {
            if p1.get(x as usize, y as usize) != p2.get((x - dx) as usize, (y - dy) as usize) {
                return false;
            }
        }
    }
    true
}

/// Per-direction compatibility lists between patterns.
///
/// `compatible(d, t1)` lists every `t2` that may sit at offset `d` from `t1`.
/// Lists are sorted ascending, so construction is deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdjacencyRules {
    num_patterns: usize,
    /// Indexing: `table[direction][t1] -> [t2, ...]`
    table: [Vec<Vec<usize>>; 4],
}

impl AdjacencyRules {
    /// Builds the propagator table from overlap agreement of N×N patterns.
    pub fn build(patterns: &[Pattern]) -> Self {
        let table = Direction::ALL.map(|direction| {
            let (dx, dy) = direction.offset();
            patterns
                .par_iter()
                .map(|p1| {
                    patterns
                        .iter()
                        .enumerate()
                        .filter(|(_, p2)| agrees(p1, p2, dx, dy))
                        .map(|(t2, _)| t2)
                        .collect::<Vec<_>>()
                })
                .collect::<Vec<_>>()
        });
        let rules = Self {
            num_patterns: patterns.len(),
            table,
        };
        debug!(
            "Built propagator for {} patterns with {} compatibility entries",
            rules.num_patterns,
            rules.total_entries()
        );
        rules
    }

    /// Creates rules directly from per-direction lists.
    ///
    /// Intended for hand-written test fixtures; every list index must be `< num_patterns`.
    pub fn from_lists(num_patterns: usize, table: [Vec<Vec<usize>>; 4]) -> Self {
        Self {
            num_patterns,
            table,
        }
    }

    /// Number of patterns T these rules cover.
    pub fn num_patterns(&self) -> usize {
        self.num_patterns
    }

    /// Patterns allowed at offset `direction` from `pattern`.
    #[inline]
    pub fn compatible(&self, direction: Direction, pattern: usize) -> &[usize] {
        self.table[direction.index()]
            .get(pattern)
            .map_or(&[], Vec::as_slice)
    }

    /// Checks if `t2` may sit at offset `direction` from `t1`.
    ///
    /// Out-of-range indices are treated as disallowed.
    pub fn check(&self, t1: usize, t2: usize, direction: Direction) -> bool {
        self.compatible(direction, t1).binary_search(&t2).is_ok()
    }

    /// Sum of all list sizes; propagation cost scales with this.
    pub fn total_entries(&self) -> usize {
        self.table
            .iter()
            .flat_map(|lists| lists.iter().map(Vec::len))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Category;

    fn pattern(rows: &[&[u16]]) -> Pattern {
        Pattern::from_fn(rows.len(), |x, y| Category(rows[y][x]))
    }

    #[test]
    fn opposite_is_involution() {
        for direction in Direction::ALL {
            assert_eq!(direction.opposite().opposite(), direction);
            let (dx, dy) = direction.offset();
            let (ox, oy) = direction.opposite().offset();
            assert_eq!((dx + ox, dy + oy), (0, 0));
        }
    }

    #[test]
    fn overlap_agreement_for_stripes() {
        // Vertical stripes: [0 1] and [1 0] alternate horizontally.
        let a = pattern(&[&[0, 1], &[0, 1]]);
        let b = pattern(&[&[1, 0], &[1, 0]]);
        let rules = AdjacencyRules::build(&[a, b]);

        assert_eq!(rules.compatible(Direction::East, 0), &[1]);
        assert_eq!(rules.compatible(Direction::West, 0), &[1]);
        assert_eq!(rules.compatible(Direction::North, 0), &[0]);
        assert_eq!(rules.compatible(Direction::South, 1), &[1]);
        assert!(rules.check(1, 0, Direction::East));
        assert!(!rules.check(0, 0, Direction::East));
    }

    #[test]
    fn compatibility_is_symmetric_across_opposites() {
        let patterns = vec![
            pattern(&[&[0, 0], &[0, 1]]),
            pattern(&[&[0, 1], &[1, 1]]),
            pattern(&[&[1, 1], &[1, 1]]),
            pattern(&[&[0, 0], &[0, 0]]),
        ];
        let rules = AdjacencyRules::build(&patterns);
        for direction in Direction::ALL {
            for t1 in 0..patterns.len() {
                for &t2 in rules.compatible(direction, t1) {
                    assert!(rules.check(t2, t1, direction.opposite()));
                }
            }
        }
    }

    #[test]
    fn out_of_range_is_disallowed() {
        let rules = AdjacencyRules::build(&[pattern(&[&[0]])]);
        assert!(rules.check(0, 0, Direction::East));
        assert!(!rules.check(3, 0, Direction::East));
        assert!(rules.compatible(Direction::North, 7).is_empty());
        assert_eq!(rules.total_entries(), 4);
    }
}
