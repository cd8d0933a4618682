//! Cell adjacency used by region labelling and tracing

/// Which neighbouring cells count as adjacent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Neighborhood {
    /// Edge-sharing neighbours only (4-connectivity)
    #[default]
    Rook,
    /// Edge- and corner-sharing neighbours (8-connectivity)
    Queen,
}

const ROOK: [(isize, isize); 4] = [(-1, 0), (0, -1), (0, 1), (1, 0)];

const QUEEN: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

impl Neighborhood {
    /// Relative (row, col) offsets, centre excluded
    pub fn offsets(&self) -> &'static [(isize, isize)] {
        match self {
            Neighborhood::Rook => &ROOK,
            Neighborhood::Queen => &QUEEN,
        }
    }

    /// In-bounds neighbours of (row, col) in a grid of `shape`
    pub fn neighbors(
        &self,
        row: usize,
        col: usize,
        shape: (usize, usize),
    ) -> impl Iterator<Item = (usize, usize)> {
        let (rows, cols) = shape;
        self.offsets().iter().filter_map(move |&(dr, dc)| {
            let r = row.checked_add_signed(dr)?;
            let c = col.checked_add_signed(dc)?;
            (r < rows && c < cols).then_some((r, c))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neighborhood_offsets() {
        assert_eq!(Neighborhood::Rook.offsets().len(), 4);
        assert_eq!(Neighborhood::Queen.offsets().len(), 8);
    }

    #[test]
    fn test_neighbors_clip_to_grid() {
        let corner: Vec<_> = Neighborhood::Rook.neighbors(0, 0, (3, 3)).collect();
        assert_eq!(corner, vec![(0, 1), (1, 0)]);

        let centre = Neighborhood::Queen.neighbors(1, 1, (3, 3)).count();
        assert_eq!(centre, 8);

        let edge = Neighborhood::Queen.neighbors(2, 1, (3, 3)).count();
        assert_eq!(edge, 5);
    }
}
