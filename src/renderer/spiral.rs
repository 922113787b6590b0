use std::iter::FusedIterator;

use super::grid::TileGrid;

/// Cyclic direction order of the walk: down, left, up, right (grid rows).
const DIRECTIONS: [(i64, i64); 4] = [(0, -1), (-1, 0), (0, 1), (1, 0)];

/// Iterator over grid cells in deterministic center-outward spiral order.
///
/// The walk starts at cell `(gx/2, gy/2)` and spirals outward with arm
/// lengths 1, 1, 2, 2, 3, 3, …; cells outside the grid are skipped but still
/// advance the walk, so the spiral covers the whole rectangle even when it is
/// far from square. Every valid cell is emitted exactly once.
#[derive(Copy, Clone, Debug)]
pub struct SpiralOrder {
    gx: i64,
    gy: i64,

    x: i64,
    y: i64,
    direction: usize,
    arm_length: i64,
    steps_taken: i64,

    remaining: u64,
}

impl SpiralOrder {
    pub fn new(grid: &TileGrid) -> SpiralOrder {
        let gx = i64::from(grid.width());
        let gy = i64::from(grid.height());

        SpiralOrder {
            gx,
            gy,

            x: gx / 2,
            y: gy / 2,
            direction: 0,
            arm_length: 1,
            steps_taken: 0,

            remaining: grid.cell_count(),
        }
    }

    fn inside(&self) -> bool {
        (0..self.gx).contains(&self.x) && (0..self.gy).contains(&self.y)
    }

    /// One step of the walk: turn at the end of an arm, then move the cursor.
    /// The arm length grows on every second turn (1, 1, 2, 2, 3, 3, …).
    fn advance(&mut self) {
        if self.steps_taken >= self.arm_length {
            self.direction = (self.direction + 1) % 4;
            self.steps_taken = 0;
            if self.direction % 2 == 0 {
                self.arm_length += 1;
            }
        }

        let (dx, dy) = DIRECTIONS[self.direction];
        self.x += dx;
        self.y += dy;
        self.steps_taken += 1;
    }
}

impl Iterator for SpiralOrder {
    type Item = (u32, u32);

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining as usize;
        (remaining, Some(remaining))
    }

    fn next(&mut self) -> Option<Self::Item> {
        while self.remaining > 0 {
            // The walk only leaves the grid on both axes at once after the
            // spiral has grown past the whole rectangle, and by then every
            // cell has been emitted.
            debug_assert!(
                (0..self.gx).contains(&self.x) || (0..self.gy).contains(&self.y),
                "walk escaped the grid with cells still unvisited"
            );

            let emit = self.inside().then_some((self.x as u32, self.y as u32));
            self.advance();

            if let Some(cell) = emit {
                self.remaining -= 1;
                return Some(cell);
            }
        }

        None
    }
}

impl ExactSizeIterator for SpiralOrder {
    fn len(&self) -> usize {
        self.remaining as usize
    }
}

impl FusedIterator for SpiralOrder {}
