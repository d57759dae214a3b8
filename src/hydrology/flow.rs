//! Steepest-descent flow directions.
//!
//! Each cell points at its lowest strictly-lower 4-connected neighbor, or at
//! nothing when it is a pit or a flat. The grid is built once per run from the
//! pre-erosion terrain; tracing reuses [`steepest_descent`] against the live,
//! partly eroded heightmap.

use crate::tilemap::{Coord, EdgeMode, Tilemap, DIR_OFFSETS};

/// Compass direction, indexed like [`DIR_OFFSETS`]
/// 7 0 1
/// 6 X 2
/// 5 4 3
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::West,
        Direction::NorthWest,
    ];

    pub fn offset(self) -> (i32, i32) {
        DIR_OFFSETS[self as usize]
    }

    pub fn from_offset(dx: i32, dy: i32) -> Option<Direction> {
        Self::ALL.into_iter().find(|dir| dir.offset() == (dx, dy))
    }
}

/// `None` marks a local minimum.
pub type FlowDirectionGrid = Tilemap<Option<Direction>>;

/// Order in which 4-connected candidates are examined. Ties keep the earliest.
const DESCENT_SCAN: [Direction; 4] = [Direction::North, Direction::East, Direction::South, Direction::West];

/// Lowest 4-connected neighbor strictly below `from`, with the direction taken to reach it.
pub fn steepest_descent(
    heightmap: &Tilemap<f32>,
    from: Coord,
    mode: EdgeMode,
) -> Option<(Direction, Coord)> {
    let mut lowest = heightmap[from];
    let mut best = None;

    for dir in DESCENT_SCAN {
        let (dx, dy) = dir.offset();
        let Some(next) = heightmap.offset(from, dx, dy, mode) else {
            continue;
        };
        let elevation = heightmap[next];
        if elevation < lowest {
            lowest = elevation;
            best = Some((dir, next));
        }
    }

    best
}

/// Compute the flow direction of every cell.
pub fn compute_flow_direction(heightmap: &Tilemap<f32>, mode: EdgeMode) -> FlowDirectionGrid {
    let mut flow_dir = FlowDirectionGrid::new(heightmap.width, heightmap.height);

    for c in heightmap.coords() {
        if let Some((dir, _)) = steepest_descent(heightmap, c, mode) {
            flow_dir[c] = Some(dir);
        }
    }

    flow_dir
}

/// Cell that `c` drains into, if any.
pub fn downstream(flow_dir: &FlowDirectionGrid, c: Coord, mode: EdgeMode) -> Option<Coord> {
    let dir = flow_dir[c]?;
    let (dx, dy) = dir.offset();
    flow_dir.offset(c, dx, dy, mode)
}
