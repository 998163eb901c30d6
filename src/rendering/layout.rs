//! Board geometry: where each of the 100 tiles lives on the canvas.
//!
//! Tile 1 is bottom-left, rows alternate direction (boustrophedon) and
//! tile 100 ends up top-left on a 10x10 grid.
//!
//! Grid math runs in `i64` so any `i32` tile, however far off the board,
//! maps to a finite position instead of overflowing.

/// Tiles per row and per column
pub const GRID_SIZE: i32 = 10;
/// Edge length of one tile in pixels
pub const TILE_SIZE: i32 = 140;
/// Edge length of the whole board in pixels
pub const BOARD_SIZE: u32 = (GRID_SIZE * TILE_SIZE) as u32;
/// Number of playable tiles
pub const TILE_COUNT: u32 = (GRID_SIZE * GRID_SIZE) as u32;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self { x: self.x + dx, y: self.y + dy }
    }

    pub fn lerp(self, other: Point, t: f32) -> Self {
        Self {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x as f32
            && p.y >= self.y as f32
            && p.x < (self.x + self.width as i64) as f32
            && p.y < (self.y + self.height as i64) as f32
    }

    pub fn center(&self) -> Point {
        Point::new(
            self.x as f32 + self.width as f32 / 2.0,
            self.y as f32 + self.height as f32 / 2.0,
        )
    }
}

/// Reading-order grid cell of a tile: `(row, col)` with row 0 holding tiles
/// 1-10. No boustrophedon flip and no vertical inversion.
pub fn logical_cell(tile: i32) -> (i64, i64) {
    let index = i64::from(tile) - 1;
    let grid = i64::from(GRID_SIZE);
    (index.div_euclid(grid), index.rem_euclid(grid))
}

/// Top-left pixel of a tile's square.
///
/// Tiles outside 1..=100 are not clamped; they land wherever the arithmetic
/// puts them, which is off the canvas.
pub fn tile_to_pixel(tile: i32) -> (i64, i64) {
    let (row, col) = logical_cell(tile);
    let last = i64::from(GRID_SIZE) - 1;
    let col = if row.rem_euclid(2) == 0 { col } else { last - col };
    let row = last - row;
    let size = i64::from(TILE_SIZE);
    (col * size, row * size)
}

pub fn tile_rect(tile: i32) -> Rect {
    let (x, y) = tile_to_pixel(tile);
    Rect { x, y, width: TILE_SIZE as u32, height: TILE_SIZE as u32 }
}

/// Centre of a tile; snakes and ladders start and end here.
pub fn tile_center(tile: i32) -> Point {
    tile_rect(tile).center()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn corners_follow_boustrophedon_order() {
        let t = i64::from(TILE_SIZE);
        assert_eq!(tile_to_pixel(1), (0, 9 * t));
        assert_eq!(tile_to_pixel(10), (9 * t, 9 * t));
        assert_eq!(tile_to_pixel(11), (9 * t, 8 * t));
        assert_eq!(tile_to_pixel(20), (0, 8 * t));
        assert_eq!(tile_to_pixel(21), (0, 7 * t));
        assert_eq!(tile_to_pixel(91), (9 * t, 0));
        assert_eq!(tile_to_pixel(100), (0, 0));
    }

    #[test]
    fn every_tile_gets_its_own_square_on_the_canvas() {
        let mut seen = HashSet::new();
        for tile in 1..=TILE_COUNT as i32 {
            let (x, y) = tile_to_pixel(tile);
            assert!(seen.insert((x, y)), "tile {} collides", tile);
            assert!((0..i64::from(BOARD_SIZE)).contains(&x));
            assert!((0..i64::from(BOARD_SIZE)).contains(&y));
            assert_eq!(x % i64::from(TILE_SIZE), 0);
            assert_eq!(y % i64::from(TILE_SIZE), 0);
        }
        assert_eq!(seen.len(), TILE_COUNT as usize);
    }

    #[test]
    fn consecutive_tiles_are_adjacent() {
        for tile in 1..TILE_COUNT as i32 {
            let (ax, ay) = tile_to_pixel(tile);
            let (bx, by) = tile_to_pixel(tile + 1);
            assert_eq!((ax - bx).abs() + (ay - by).abs(), i64::from(TILE_SIZE), "tiles {} and {}", tile, tile + 1);
        }
    }

    #[test]
    fn out_of_range_tiles_fall_off_the_canvas() {
        let (_, y) = tile_to_pixel(101);
        assert!(y < 0);
        let (_, y) = tile_to_pixel(0);
        assert!(y >= i64::from(BOARD_SIZE));
    }

    #[test]
    fn extreme_tiles_stay_finite() {
        for tile in [i32::MIN, i32::MIN + 1, -1, 2_000_000_000, i32::MAX] {
            let (x, y) = tile_to_pixel(tile);
            assert!((0..i64::from(BOARD_SIZE)).contains(&x), "tile {}", tile);
            assert!(y % i64::from(TILE_SIZE) == 0);
            let c = tile_center(tile);
            assert!(c.x.is_finite() && c.y.is_finite(), "tile {}", tile);
        }
        assert!(tile_to_pixel(i32::MIN).1 > 0);
        assert!(tile_to_pixel(i32::MAX).1 < 0);
    }

    #[test]
    fn center_is_inside_rect() {
        let r = tile_rect(37);
        assert!(r.contains(tile_center(37)));
        assert_eq!(tile_center(1), Point::new(70.0, 1330.0));
    }
}
