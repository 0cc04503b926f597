//! Boundary extraction of same-colored regions of an index map
//!
//! Pixels are treated as unit squares and boundaries follow the cracks between
//! them, so every polygon vertex lies on integer coordinates. Foreground pixels are
//! grouped into 4-connected components. Each component produces exactly one outer
//! polygon with positive signed area (clockwise on screen with `y` pointing down)
//! and zero or more holes with negative signed area.
use crate::{Error, Image, Point, Scalar, utils::signed_area};
use std::collections::{HashMap, HashSet, VecDeque};

/// Closed polygon, last point is implicitly connected to the first one
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polygon {
    points: Vec<Point>,
}

impl Polygon {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Signed area, positive for clockwise orientation (y axis pointing down)
    pub fn area(&self) -> Scalar {
        signed_area(&self.points)
    }

    /// Perimeter including closing segment
    pub fn perimeter(&self) -> Scalar {
        let Some(last) = self.points.last() else {
            return 0.0;
        };
        let mut prev = *last;
        let mut length = 0.0;
        for point in self.points.iter() {
            length += prev.dist(*point);
            prev = *point;
        }
        length
    }
}

impl FromIterator<Point> for Polygon {
    fn from_iter<T: IntoIterator<Item = Point>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Connected component boundary: outer polygon and its holes
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub outer: Polygon,
    pub holes: Vec<Polygon>,
}

/// Crack direction, ordered clockwise (y axis pointing down)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Dir {
    East = 0,
    South = 1,
    West = 2,
    North = 3,
}

impl Dir {
    const ALL: [Dir; 4] = [Dir::East, Dir::South, Dir::West, Dir::North];

    fn turn(self, quarters: usize) -> Dir {
        Self::ALL[(self as usize + quarters) % 4]
    }

    fn delta(self) -> (i64, i64) {
        match self {
            Dir::East => (1, 0),
            Dir::South => (0, 1),
            Dir::West => (-1, 0),
            Dir::North => (0, -1),
        }
    }
}

/// Directed boundary edge between two pixel corners, foreground is on its right
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Crack {
    start: (i64, i64),
    dir: Dir,
}

impl Crack {
    fn end(&self) -> (i64, i64) {
        let (dx, dy) = self.dir.delta();
        (self.start.0 + dx, self.start.1 + dy)
    }
}

/// Extract boundaries of all regions where index map is equal to `index`
///
/// Components are enumerated in row-major order of their first pixel, outer
/// polygon starts at the top-left corner of that pixel. Result is a pure function
/// of the map layout.
pub fn trace_regions(map: &impl Image<Pixel = u8>, index: u8) -> Result<Vec<Region>, Error> {
    let shape = map.shape();
    let (width, height) = (shape.width, shape.height);
    let is_target = |row: usize, col: usize| map.get(row, col) == Some(&index);

    // 4-connected component labeling
    let mut labels = vec![usize::MAX; width * height];
    let mut components: Vec<Vec<(usize, usize)>> = Vec::new();
    let mut queue = VecDeque::new();
    for row in 0..height {
        for col in 0..width {
            if labels[row * width + col] != usize::MAX || !is_target(row, col) {
                continue;
            }
            let label = components.len();
            let mut pixels = Vec::new();
            labels[row * width + col] = label;
            queue.push_back((row, col));
            while let Some((r, c)) = queue.pop_front() {
                pixels.push((r, c));
                let neighbors = [
                    (r.wrapping_sub(1), c),
                    (r, c + 1),
                    (r + 1, c),
                    (r, c.wrapping_sub(1)),
                ];
                for (nr, nc) in neighbors {
                    if nr < height
                        && nc < width
                        && labels[nr * width + nc] == usize::MAX
                        && is_target(nr, nc)
                    {
                        labels[nr * width + nc] = label;
                        queue.push_back((nr, nc));
                    }
                }
            }
            pixels.sort_unstable();
            components.push(pixels);
        }
    }

    let mut regions = Vec::with_capacity(components.len());
    for (label, pixels) in components.iter().enumerate() {
        let inside = |row: i64, col: i64| {
            row >= 0
                && col >= 0
                && (row as usize) < height
                && (col as usize) < width
                && labels[row as usize * width + col as usize] == label
        };
        regions.push(trace_component(pixels, inside)?);
    }
    tracing::debug!(index, regions = regions.len(), "traced");
    Ok(regions)
}

fn trace_component(
    pixels: &[(usize, usize)],
    inside: impl Fn(i64, i64) -> bool,
) -> Result<Region, Error> {
    // boundary cracks in row-major pixel order
    let mut order = Vec::new();
    for (row, col) in pixels.iter() {
        let (y, x) = (*row as i64, *col as i64);
        if !inside(y - 1, x) {
            order.push(Crack {
                start: (x, y),
                dir: Dir::East,
            });
        }
        if !inside(y, x + 1) {
            order.push(Crack {
                start: (x + 1, y),
                dir: Dir::South,
            });
        }
        if !inside(y + 1, x) {
            order.push(Crack {
                start: (x + 1, y + 1),
                dir: Dir::West,
            });
        }
        if !inside(y, x - 1) {
            order.push(Crack {
                start: (x, y + 1),
                dir: Dir::North,
            });
        }
    }
    let cracks: HashSet<Crack> = order.iter().copied().collect();

    // Successor of a crack prefers right turn, then straight, then left. Right
    // turn keeps diagonally touching pixels apart, matching 4-connectivity.
    let next = |crack: &Crack| -> Option<Crack> {
        let start = crack.end();
        [1, 0, 3]
            .into_iter()
            .map(|quarters| Crack {
                start,
                dir: crack.dir.turn(quarters),
            })
            .find(|candidate| cracks.contains(candidate))
    };

    let mut visited: HashMap<Crack, usize> = HashMap::with_capacity(order.len());
    let mut loops = Vec::new();
    for first in order.iter() {
        if visited.contains_key(first) {
            continue;
        }
        let loop_index = loops.len();
        let mut chain = vec![*first];
        visited.insert(*first, loop_index);
        let mut current = *first;
        loop {
            current = next(&current).ok_or_else(|| {
                Error::TracingFailed(format!("open boundary at {:?}", current.end()))
            })?;
            if current == *first {
                break;
            }
            if visited.insert(current, loop_index).is_some() {
                return Err(Error::TracingFailed(format!(
                    "boundary revisits crack at {:?}",
                    current.start
                )));
            }
            chain.push(current);
        }
        loops.push(chain_to_polygon(&chain));
    }

    let mut loops = loops.into_iter();
    let outer = loops
        .next()
        .ok_or_else(|| Error::TracingFailed("component without boundary".to_owned()))?;
    if outer.area() <= 0.0 {
        return Err(Error::TracingFailed(format!(
            "outer boundary has non-positive area {}",
            outer.area()
        )));
    }
    let holes: Vec<Polygon> = loops.collect();
    if let Some(hole) = holes.iter().find(|hole| hole.area() >= 0.0) {
        return Err(Error::TracingFailed(format!(
            "hole boundary has non-negative area {}",
            hole.area()
        )));
    }
    Ok(Region { outer, holes })
}

/// Keep only corners, vertices between cracks of the same direction are dropped
fn chain_to_polygon(chain: &[Crack]) -> Polygon {
    let mut prev = match chain.last() {
        Some(last) => last.dir,
        None => return Polygon::default(),
    };
    let mut points = Vec::new();
    for crack in chain {
        if crack.dir != prev {
            points.push(Point::new(crack.start.0 as Scalar, crack.start.1 as Scalar));
        }
        prev = crack.dir;
    }
    Polygon::new(points)
}
