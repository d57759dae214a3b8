//! Traced rivers, the coordinate membership index used for merge checks,
//! and river map accumulation.

use std::collections::HashMap;

use serde::Serialize;

use crate::tilemap::{in_circle, Coord, EdgeMode, Tilemap};

/// How a traced river ended
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Terminus {
    /// Reached a cell at or below sea level
    Sea,
    /// Joined an earlier river at `path[at]` and adopted its remaining course
    Merge { river: usize, at: usize },
    /// No lower ground within reach; the last cell seeds a lake
    Lake,
}

/// Ordered source-to-terminus path of one river.
///
/// A merged river carries its own copy of the shared downstream suffix.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct River {
    pub path: Vec<Coord>,
    pub terminus: Terminus,
}

impl River {
    pub fn source(&self) -> Coord {
        self.path[0]
    }

    pub fn mouth(&self) -> Coord {
        self.path[self.path.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    /// Index into `path` where this river joined another, if it did
    pub fn merge_point(&self) -> Option<usize> {
        match self.terminus {
            Terminus::Merge { at, .. } => Some(at),
            _ => None,
        }
    }
}

/// Maps each cell to the first recorded river that contains it and the
/// position of its first occurrence there.
#[derive(Clone, Debug, Default)]
pub struct RiverIndex {
    cells: HashMap<Coord, (usize, usize)>,
}

impl RiverIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, river_id: usize, river: &River) {
        for (pos, &c) in river.path.iter().enumerate() {
            self.cells.entry(c).or_insert((river_id, pos));
        }
    }

    /// (river id, position in that river's path)
    pub fn owner(&self, c: Coord) -> Option<(usize, usize)> {
        self.cells.get(&c).copied()
    }

    pub fn contains(&self, c: Coord) -> bool {
        self.cells.contains_key(&c)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Write a river's cumulative flow into the river map.
///
/// The source starts from its accumulated water flow (or its own rainfall if
/// none was accumulated); every following cell adds its rainfall to the value
/// upstream. From a merge point on, the receiving river already counted each
/// cell's rainfall, so only the flow carried in from above the junction is
/// added on top.
pub fn accumulate_river_flow(
    river_map: &mut Tilemap<f32>,
    river: &River,
    water_flow: &Tilemap<f32>,
    rainfall: impl Fn(Coord) -> f32,
) {
    let merge_at = river.merge_point();
    let mut upstream = 0.0f32;

    for (i, &c) in river.path.iter().enumerate() {
        if let Some(at) = merge_at {
            if i >= at {
                river_map[c] += upstream;
                continue;
            }
        }

        let own = if i == 0 {
            let accumulated = water_flow[c];
            if accumulated > 0.0 { accumulated } else { rainfall(c) }
        } else {
            rainfall(c) + upstream
        };
        river_map[c] = own;
        upstream = own;
    }
}

/// True if any cell within `radius` of `center` carries river flow.
pub fn river_nearby(river_map: &Tilemap<f32>, center: Coord, radius: usize, mode: EdgeMode) -> bool {
    let r = radius as i64;
    let (cx, cy) = (center.x as i64, center.y as i64);

    for dy in -r..=r {
        for dx in -r..=r {
            if !in_circle(r, cx, cy, cx + dx, cy + dy) {
                continue;
            }
            let Some(c) = river_map.resolve(cx + dx, cy + dy, mode) else {
                continue;
            };
            if river_map[c] > 0.0 {
                return true;
            }
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn straight(y: usize, xs: std::ops::Range<usize>, terminus: Terminus) -> River {
        River {
            path: xs.map(|x| Coord::new(x, y)).collect(),
            terminus,
        }
    }

    #[test]
    fn test_index_keeps_first_owner() {
        let first = straight(2, 0..5, Terminus::Sea);
        let second = River {
            path: vec![Coord::new(3, 0), Coord::new(3, 1), Coord::new(3, 2), Coord::new(4, 2)],
            terminus: Terminus::Merge { river: 0, at: 2 },
        };
        let mut index = RiverIndex::new();
        index.insert(0, &first);
        index.insert(1, &second);

        assert_eq!(index.owner(Coord::new(3, 2)), Some((0, 3)));
        assert_eq!(index.owner(Coord::new(3, 1)), Some((1, 1)));
        assert!(!index.contains(Coord::new(0, 0)));
        assert_eq!(index.len(), 7);
    }

    #[test]
    fn test_flow_accumulates_downstream() {
        let mut river_map = Tilemap::new_with(6, 3, 0.0f32);
        let water_flow = Tilemap::new_with(6, 3, 0.0f32);
        let river = straight(1, 0..4, Terminus::Sea);

        accumulate_river_flow(&mut river_map, &river, &water_flow, |_| 1.0);

        let values: Vec<f32> = (0..4).map(|x| *river_map.get(x, 1)).collect();
        assert_eq!(values, vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(*river_map.get(4, 1), 0.0);
    }

    #[test]
    fn test_source_uses_accumulated_flow() {
        let mut river_map = Tilemap::new_with(4, 1, 0.0f32);
        let mut water_flow = Tilemap::new_with(4, 1, 0.0f32);
        water_flow.set(0, 0, 12.0);
        let river = straight(0, 0..3, Terminus::Sea);

        accumulate_river_flow(&mut river_map, &river, &water_flow, |_| 0.5);

        assert_eq!(*river_map.get(0, 0), 12.0);
        assert_eq!(*river_map.get(2, 0), 13.0);
    }

    #[test]
    fn test_confluence_adds_tributary_flow() {
        let mut river_map = Tilemap::new_with(5, 4, 0.0f32);
        let water_flow = Tilemap::new_with(5, 4, 0.0f32);
        let main = straight(2, 0..5, Terminus::Sea);
        // Tributary: (2,0) -> (2,1) -> joins main at (2,2), then follows it
        let tributary = River {
            path: vec![
                Coord::new(2, 0),
                Coord::new(2, 1),
                Coord::new(2, 2),
                Coord::new(3, 2),
                Coord::new(4, 2),
            ],
            terminus: Terminus::Merge { river: 0, at: 2 },
        };

        accumulate_river_flow(&mut river_map, &main, &water_flow, |_| 1.0);
        accumulate_river_flow(&mut river_map, &tributary, &water_flow, |_| 1.0);

        // main alone: 1..=5 along y=2; tributary brings the 2 cells above the junction
        assert_eq!(*river_map.get(1, 2), 2.0);
        assert_eq!(*river_map.get(2, 2), 3.0 + 2.0);
        assert_eq!(*river_map.get(4, 2), 5.0 + 2.0);
        assert_eq!(*river_map.get(2, 1), 2.0);
    }

    #[test]
    fn test_mouth_flow_counts_each_draining_cell_once() {
        let mut river_map = Tilemap::new_with(5, 4, 0.0f32);
        let water_flow = Tilemap::new_with(5, 4, 0.0f32);
        let main = straight(2, 0..5, Terminus::Sea);
        let tributary = River {
            path: vec![Coord::new(2, 0), Coord::new(2, 1), Coord::new(2, 2)],
            terminus: Terminus::Merge { river: 0, at: 2 },
        };

        accumulate_river_flow(&mut river_map, &main, &water_flow, |_| 1.0);
        accumulate_river_flow(&mut river_map, &tributary, &water_flow, |_| 1.0);

        let draining = main.len() + tributary.len() - 1;
        assert_eq!(*river_map.get(4, 2), draining as f32);
        assert_eq!(*river_map.get(2, 2), 5.0);
    }

    #[test]
    fn test_river_nearby() {
        let mut river_map = Tilemap::new_with(10, 10, 0.0f32);
        river_map.set(9, 5, 1.0);
        assert!(river_nearby(&river_map, Coord::new(7, 5), 2, EdgeMode::Clamp));
        assert!(!river_nearby(&river_map, Coord::new(6, 5), 2, EdgeMode::Clamp));
        assert!(river_nearby(&river_map, Coord::new(0, 5), 1, EdgeMode::Wrap));
        assert!(!river_nearby(&river_map, Coord::new(0, 5), 1, EdgeMode::Clamp));
    }
}
