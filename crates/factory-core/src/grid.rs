//! Tile grid, orientations, and assembly-line membership.
//!
//! Coordinates are pixels with a bottom-left origin. Tiles are `GRID_SIZE`
//! pixels wide and are addressed by their center, which always sits at
//! `TILE_ORIGIN + GRID_SIZE * k` on both axes. Materials travel one pixel per
//! tick, so "at a tile center" is the only moment they interact with machines.

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Edge length of a tile, in pixels.
pub const GRID_SIZE: i32 = 25;

/// Pixel offset of the first tile center on both axes.
pub const TILE_ORIGIN: i32 = 13;

/// Number of tile columns in the world.
pub const COLUMNS: i32 = 50;

/// Number of tile rows in the world.
pub const ROWS: i32 = 16;

/// Columns that separate assembly lines. Always walled.
pub const BORDER_COLUMNS: [i32; 2] = [16, 33];

/// Tiles unlocked in a fresh world (six columns per assembly line).
pub const STARTING_TILES: usize = 288;

const STARTING_COLUMNS: [RangeInclusive<i32>; 3] = [0..=5, 17..=22, 34..=39];

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// A pixel position in world space.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Center of the tile at `(column, row)`.
    pub const fn tile(column: i32, row: i32) -> Self {
        Self {
            x: TILE_ORIGIN + GRID_SIZE * column,
            y: TILE_ORIGIN + GRID_SIZE * row,
        }
    }

    /// Column of the tile this position falls in.
    pub fn column(&self) -> i32 {
        (self.x - TILE_ORIGIN + GRID_SIZE / 2).div_euclid(GRID_SIZE)
    }

    /// Row of the tile this position falls in.
    pub fn row(&self) -> i32 {
        (self.y - TILE_ORIGIN + GRID_SIZE / 2).div_euclid(GRID_SIZE)
    }

    /// Whether this position is exactly on a tile center.
    pub fn is_tile_center(&self) -> bool {
        (self.x - TILE_ORIGIN).rem_euclid(GRID_SIZE) == 0
            && (self.y - TILE_ORIGIN).rem_euclid(GRID_SIZE) == 0
    }

    /// The nearest tile center.
    pub fn snapped(&self) -> Self {
        Self::tile(self.column(), self.row())
    }

    pub fn offset(&self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Move `distance` pixels in the direction of `orientation`.
    pub fn step(&self, orientation: Orientation, distance: i32) -> Self {
        let (dx, dy) = orientation.delta();
        self.offset(dx * distance, dy * distance)
    }

    /// Chebyshev (chessboard) distance to another position.
    pub fn chebyshev_distance(&self, other: &Position) -> u32 {
        (self.x - other.x)
            .unsigned_abs()
            .max((self.y - other.y).unsigned_abs())
    }
}

// ---------------------------------------------------------------------------
// Orientation
// ---------------------------------------------------------------------------

/// Facing of a machine or travel direction of a material.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Orientation {
    Up,
    Left,
    #[default]
    Down,
    Right,
}

impl Orientation {
    /// Rotation order used when a player rotates a machine.
    pub const ALL: [Orientation; 4] = [
        Orientation::Up,
        Orientation::Left,
        Orientation::Down,
        Orientation::Right,
    ];

    pub fn index(self) -> usize {
        match self {
            Orientation::Up => 0,
            Orientation::Left => 1,
            Orientation::Down => 2,
            Orientation::Right => 3,
        }
    }

    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % 4]
    }

    /// Unit step in pixel space.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Orientation::Up => (0, 1),
            Orientation::Left => (-1, 0),
            Orientation::Down => (0, -1),
            Orientation::Right => (1, 0),
        }
    }

    /// Next orientation in rotation order (U -> L -> D -> R -> U).
    pub fn rotated(self) -> Self {
        self.counter_clockwise()
    }

    /// Quarter turn clockwise (U -> R -> D -> L).
    pub fn clockwise(self) -> Self {
        Self::from_index(self.index() + 3)
    }

    /// Quarter turn counter-clockwise (U -> L -> D -> R).
    pub fn counter_clockwise(self) -> Self {
        Self::from_index(self.index() + 1)
    }

    /// Output direction a machine labels "left". Outputs are named as seen
    /// looking at the machine's face, so "left" is a clockwise turn.
    pub fn left_output(self) -> Self {
        self.clockwise()
    }

    /// Output direction a machine labels "right".
    pub fn right_output(self) -> Self {
        self.counter_clockwise()
    }
}

// ---------------------------------------------------------------------------
// Assembly lines
// ---------------------------------------------------------------------------

/// One of the three independently unlockable column ranges.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum AssemblyLine {
    #[default]
    One,
    Two,
    Three,
}

impl AssemblyLine {
    pub const ALL: [AssemblyLine; 3] = [AssemblyLine::One, AssemblyLine::Two, AssemblyLine::Three];

    /// Line membership of a pixel x coordinate. Pure: the three column ranges
    /// `0..=16`, `17..=33`, `34..` are disjoint and cover the whole grid.
    pub fn of(x: i32) -> Self {
        Self::from_column(Position::new(x, TILE_ORIGIN).column())
    }

    pub fn from_column(column: i32) -> Self {
        if column <= BORDER_COLUMNS[0] {
            AssemblyLine::One
        } else if column <= BORDER_COLUMNS[1] {
            AssemblyLine::Two
        } else {
            AssemblyLine::Three
        }
    }

    pub fn number(self) -> u8 {
        match self {
            AssemblyLine::One => 1,
            AssemblyLine::Two => 2,
            AssemblyLine::Three => 3,
        }
    }

    /// Columns of this line that can hold machines (border columns excluded).
    pub fn buildable_columns(self) -> RangeInclusive<i32> {
        match self {
            AssemblyLine::One => 0..=BORDER_COLUMNS[0] - 1,
            AssemblyLine::Two => BORDER_COLUMNS[0] + 1..=BORDER_COLUMNS[1] - 1,
            AssemblyLine::Three => BORDER_COLUMNS[1] + 1..=COLUMNS - 1,
        }
    }
}

// ---------------------------------------------------------------------------
// Tiles
// ---------------------------------------------------------------------------

/// A single grid cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub position: Position,
    pub line: AssemblyLine,
    pub locked: bool,
    pub walled: bool,
}

impl Tile {
    /// Whether a machine may be placed here.
    pub fn is_buildable(&self) -> bool {
        !self.locked && !self.walled
    }
}

/// The fixed set of tiles. Created once; only lock and wall flags change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    tiles: Vec<Tile>,
}

impl Default for Grid {
    fn default() -> Self {
        Self::standard()
    }
}

impl Grid {
    /// The starting layout: six unlocked columns per line, border columns
    /// walled, lines two and three walled until purchased.
    pub fn standard() -> Self {
        let mut tiles = Vec::with_capacity((COLUMNS * ROWS) as usize);
        for column in 0..COLUMNS {
            let line = AssemblyLine::from_column(column);
            let locked = !STARTING_COLUMNS.iter().any(|r| r.contains(&column));
            let walled = line != AssemblyLine::One || BORDER_COLUMNS.contains(&column);
            for row in 0..ROWS {
                tiles.push(Tile {
                    position: Position::tile(column, row),
                    line,
                    locked,
                    walled,
                });
            }
        }
        Self { tiles }
    }

    fn index_of(position: Position) -> Option<usize> {
        if !position.is_tile_center() {
            return None;
        }
        let (column, row) = (position.column(), position.row());
        if !(0..COLUMNS).contains(&column) || !(0..ROWS).contains(&row) {
            return None;
        }
        Some((column * ROWS + row) as usize)
    }

    /// Tile whose center is exactly `position`.
    pub fn tile_at(&self, position: Position) -> Option<&Tile> {
        Self::index_of(position).and_then(|i| self.tiles.get(i))
    }

    pub fn tile_at_mut(&mut self, position: Position) -> Option<&mut Tile> {
        Self::index_of(position).and_then(|i| self.tiles.get_mut(i))
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Whether a machine may be placed at `position`.
    pub fn is_buildable(&self, position: Position) -> bool {
        self.tile_at(position).is_some_and(Tile::is_buildable)
    }

    pub fn unlocked_count(&self) -> usize {
        self.tiles.iter().filter(|t| !t.locked).count()
    }

    /// Idempotent.
    pub fn set_locked(&mut self, position: Position, locked: bool) -> bool {
        match self.tile_at_mut(position) {
            Some(tile) => {
                tile.locked = locked;
                true
            }
            None => false,
        }
    }

    /// Wall or unwall every buildable column of `line`. Border columns stay
    /// walled regardless.
    pub fn set_line_walled(&mut self, line: AssemblyLine, walled: bool) {
        let columns = line.buildable_columns();
        for tile in &mut self.tiles {
            let column = tile.position.column();
            if columns.contains(&column) {
                tile.walled = walled;
            }
        }
    }

    /// Tile centers inside the rectangle spanned by two corners, inclusive,
    /// in column-major order.
    pub fn tiles_in_rect(&self, a: Position, b: Position) -> Vec<Position> {
        let (c0, c1) = (a.column().min(b.column()), a.column().max(b.column()));
        let (r0, r1) = (a.row().min(b.row()), a.row().max(b.row()));
        self.tiles
            .iter()
            .map(|t| t.position)
            .filter(|p| (c0..=c1).contains(&p.column()) && (r0..=r1).contains(&p.row()))
            .collect()
    }
}
