use std::num::NonZeroU32;

use itertools::iproduct;
use thiserror::Error;

use crate::geometry::ScreenSize;

/// A tile of the image. Interior tiles are `tile_size` square; tiles touching
/// the right or bottom image edge are clipped.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Tile {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Tile {
    pub fn area(&self) -> u32 {
        self.width * self.height
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }

    /// Iterates over absolute pixel coordinates (x, y) inside the tile,
    /// in C order (x changes first, then y).
    pub fn pixels(&self) -> impl Iterator<Item = (u32, u32)> + use<> {
        iproduct!(self.y..self.y + self.height, self.x..self.x + self.width).map(|(y, x)| (x, y))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
    #[error("image dimensions must be non-zero, got {width}x{height}")]
    EmptyImage { width: u32, height: u32 },
}

/// The rectangular tile grid for an image: `gx × gy` cells of `tile_size`
/// square pixels, clipped at the image edges. Together the tiles partition
/// the image exactly.
#[derive(Copy, Clone, Debug)]
pub struct TileGrid {
    image_size: ScreenSize,
    tile_size: NonZeroU32,
    gx: u32,
    gy: u32,
}

impl TileGrid {
    pub fn new(image_size: ScreenSize, tile_size: NonZeroU32) -> Result<TileGrid, GridError> {
        if image_size.x == 0 || image_size.y == 0 {
            return Err(GridError::EmptyImage {
                width: image_size.x,
                height: image_size.y,
            });
        }

        Ok(TileGrid {
            image_size,
            tile_size,
            gx: image_size.x.div_ceil(tile_size.get()),
            gy: image_size.y.div_ceil(tile_size.get()),
        })
    }

    pub fn image_size(&self) -> ScreenSize {
        self.image_size
    }

    pub fn width(&self) -> u32 {
        self.gx
    }

    pub fn height(&self) -> u32 {
        self.gy
    }

    pub fn cell_count(&self) -> u64 {
        u64::from(self.gx) * u64::from(self.gy)
    }

    /// The clipped tile bounds for grid cell `(cx, cy)`.
    pub fn tile(&self, cx: u32, cy: u32) -> Tile {
        debug_assert!(cx < self.gx && cy < self.gy);

        let t = self.tile_size.get();
        let x = cx * t;
        let y = cy * t;
        Tile {
            x,
            y,
            width: t.min(self.image_size.x - x),
            height: t.min(self.image_size.y - y),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert2::assert;
    use proptest::prelude::*;
    use test_case::test_case;

    #[test_case(128, 128, 64 => (2, 2))]
    #[test_case(100, 30, 7 => (15, 5))]
    #[test_case(1, 1, 64 => (1, 1))]
    #[test_case(1024, 768, 64 => (16, 12))]
    #[test_case(65, 64, 64 => (2, 1))]
    fn grid_dimensions(w: u32, h: u32, t: u32) -> (u32, u32) {
        let grid = TileGrid::new(ScreenSize::new(w, h), t.try_into().unwrap()).unwrap();
        (grid.width(), grid.height())
    }

    #[test]
    fn empty_image_is_rejected() {
        let tile_size = NonZeroU32::new(64).unwrap();
        assert!(
            TileGrid::new(ScreenSize::new(0, 100), tile_size).unwrap_err()
                == GridError::EmptyImage {
                    width: 0,
                    height: 100
                }
        );
        assert!(TileGrid::new(ScreenSize::new(100, 0), tile_size).is_err());
    }

    #[test]
    fn edge_tiles_are_clipped() {
        let grid = TileGrid::new(ScreenSize::new(100, 70), 64.try_into().unwrap()).unwrap();
        assert!(grid.tile(0, 0) == Tile { x: 0, y: 0, width: 64, height: 64 });
        assert!(grid.tile(1, 0) == Tile { x: 64, y: 0, width: 36, height: 64 });
        assert!(grid.tile(0, 1) == Tile { x: 0, y: 64, width: 64, height: 6 });
        assert!(grid.tile(1, 1) == Tile { x: 64, y: 64, width: 36, height: 6 });
    }

    proptest! {
        /// The tiles of a grid cover every pixel of the image exactly once.
        #[test]
        fn tiles_partition_the_image(w in 1..200u32, h in 1..200u32, t in 1..100u32) {
            let grid = TileGrid::new(ScreenSize::new(w, h), t.try_into().unwrap()).unwrap();

            let mut covered = vec![false; (w * h) as usize];
            for cy in 0..grid.height() {
                for cx in 0..grid.width() {
                    let tile = grid.tile(cx, cy);
                    prop_assert!(tile.width <= t && tile.height <= t);
                    // Only the right/bottom-most tiles may be smaller.
                    if cx + 1 < grid.width() {
                        prop_assert!(tile.width == t);
                    }
                    if cy + 1 < grid.height() {
                        prop_assert!(tile.height == t);
                    }
                    for (x, y) in tile.pixels() {
                        prop_assert!(x < w && y < h);
                        let index = (y * w + x) as usize;
                        prop_assert!(!covered[index]);
                        covered[index] = true;
                    }
                }
            }
            prop_assert!(covered.into_iter().all(|c| c));
        }

        /// A tile's pixel iterator visits exactly its area, inside its bounds.
        #[test]
        fn pixel_iterator_matches_area(x in 0..100u32, y in 0..100u32, w in 1..50u32, h in 1..50u32) {
            let tile = Tile { x, y, width: w, height: h };
            let pixels: Vec<_> = tile.pixels().collect();
            prop_assert_eq!(pixels.len(), tile.area() as usize);
            prop_assert!(pixels.iter().all(|&(px, py)| tile.contains(px, py)));
        }
    }
}
