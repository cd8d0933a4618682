//! Class grid to polygons
//!
//! Cells sharing a class and joined through an edge (4-connectivity) form
//! one region. Each region becomes one polygon whose rings follow cell
//! edges; enclosed cells of other classes become holes. Two same-class cells
//! touching only at a corner belong to different regions, and their rings
//! meet at that corner without crossing.
//!
//! Ring tracing works on directed cell edges in pixel space (x = col,
//! y = row). Every region cell contributes the edges it shares with
//! non-region cells, oriented so that the region lies on the same side of
//! every edge:
//!
//! ```text
//!  (c,r) ──top──▶ (c+1,r)
//!    ▲               │
//!   left           right
//!    │               ▼
//!  (c,r+1) ◀─bottom─ (c+1,r+1)
//! ```
//!
//! Following edges head to tail closes every ring. At a corner shared by two
//! diagonal cells of the same region there are two outgoing edges. The one
//! turning away from the incoming cell is taken, so the cell enclosed by the
//! pinch becomes a hole meeting the exterior at that corner rather than a
//! ring that touches itself.

use geo::orient::{Direction, Orient};
use geo::{Coord, LineString, MapCoords, Polygon};
use std::collections::{HashMap, HashSet, VecDeque};
use wildhab_core::raster::{Neighborhood, Raster};
use wildhab_core::vector::{AttributeValue, Feature, FeatureCollection};

type Vertex = (i64, i64);

/// Polygonize a class grid.
///
/// One feature per 4-connected region of valid, non-zero cells. Each feature
/// carries `attribute` set to the region's class plus whatever `properties`
/// returns for that class. Coordinates are mapped through the grid's
/// transform and the collection takes the grid's CRS. Features are ordered by
/// the row-major position of each region's first cell.
pub fn vectorize<F>(classes: &Raster<u8>, attribute: &str, properties: F) -> FeatureCollection
where
    F: Fn(u8) -> Vec<(String, AttributeValue)>,
{
    let mut out = FeatureCollection::new(classes.crs().cloned());
    let transform = *classes.transform();

    for (index, region) in label_regions(classes).into_iter().enumerate() {
        let Some(polygon) = region_polygon(&region.cells) else {
            continue;
        };
        let polygon = polygon
            .map_coords(|c| {
                let (x, y) = transform.pixel_to_geo_f(c.x, c.y);
                Coord { x, y }
            })
            .orient(Direction::Default);

        let mut feature =
            Feature::new(polygon).with_property(attribute, i64::from(region.class));
        for (key, value) in properties(region.class) {
            feature.set_property(key, value);
        }
        feature.id = Some(index.to_string());
        out.push(feature);
    }

    out
}

struct Region {
    class: u8,
    cells: Vec<(usize, usize)>,
}

/// Breadth-first 4-connected labelling of valid non-zero cells
fn label_regions(classes: &Raster<u8>) -> Vec<Region> {
    let shape = classes.shape();
    let (rows, cols) = shape;
    let mut seen = vec![false; rows * cols];
    let mut regions = Vec::new();
    let mut queue = VecDeque::new();

    for row in 0..rows {
        for col in 0..cols {
            if seen[row * cols + col] {
                continue;
            }
            let class = match classes.value(row, col) {
                Some(c) if c != 0 => c,
                _ => continue,
            };

            seen[row * cols + col] = true;
            queue.push_back((row, col));
            let mut cells = Vec::new();

            while let Some((r, c)) = queue.pop_front() {
                cells.push((r, c));
                for (nr, nc) in Neighborhood::Rook.neighbors(r, c, shape) {
                    let idx = nr * cols + nc;
                    if !seen[idx] && classes.value(nr, nc) == Some(class) {
                        seen[idx] = true;
                        queue.push_back((nr, nc));
                    }
                }
            }

            regions.push(Region { class, cells });
        }
    }

    regions
}

/// Trace a region's rings in pixel space; the largest ring is the exterior
fn region_polygon(cells: &[(usize, usize)]) -> Option<Polygon<f64>> {
    let members: HashSet<(i64, i64)> = cells
        .iter()
        .map(|&(r, c)| (r as i64, c as i64))
        .collect();
    let inside = |r: i64, c: i64| members.contains(&(r, c));

    let mut edges: Vec<(Vertex, Vertex)> = Vec::new();
    for &(r, c) in &members {
        let (x, y) = (c, r);
        if !inside(r - 1, c) {
            edges.push(((x, y), (x + 1, y)));
        }
        if !inside(r, c + 1) {
            edges.push(((x + 1, y), (x + 1, y + 1)));
        }
        if !inside(r + 1, c) {
            edges.push(((x + 1, y + 1), (x, y + 1)));
        }
        if !inside(r, c - 1) {
            edges.push(((x, y + 1), (x, y)));
        }
    }
    // HashSet iteration order is arbitrary; sort for reproducible rings
    edges.sort_unstable();

    let mut outgoing: HashMap<Vertex, Vec<usize>> = HashMap::new();
    for (i, (from, _)) in edges.iter().enumerate() {
        outgoing.entry(*from).or_default().push(i);
    }

    let mut used = vec![false; edges.len()];
    let mut rings: Vec<Vec<Vertex>> = Vec::new();

    for start in 0..edges.len() {
        if used[start] {
            continue;
        }
        used[start] = true;
        let mut ring = vec![edges[start].0];
        let mut current = start;

        loop {
            let (from, to) = edges[current];
            let d_in = (to.0 - from.0, to.1 - from.1);
            let candidates = outgoing.get(&to).map(Vec::as_slice).unwrap_or(&[]);
            let next = match candidates {
                [only] => Some(*only),
                many => many.iter().copied().find(|&e| {
                    let (a, b) = edges[e];
                    let d_out = (b.0 - a.0, b.1 - a.1);
                    d_in.0 * d_out.1 - d_in.1 * d_out.0 < 0
                }),
            };
            match next {
                Some(e) if e == start => break,
                Some(e) if !used[e] => {
                    used[e] = true;
                    ring.push(to);
                    current = e;
                }
                // Unreachable for rings built from whole cells
                _ => break,
            }
        }

        rings.push(drop_collinear(ring));
    }

    let exterior = rings
        .iter()
        .enumerate()
        .max_by_key(|(_, ring)| twice_area(ring).abs())
        .map(|(i, _)| i)?;

    let to_line = |ring: &[Vertex]| -> LineString<f64> {
        let mut coords: Vec<Coord<f64>> = ring
            .iter()
            .map(|&(x, y)| Coord {
                x: x as f64,
                y: y as f64,
            })
            .collect();
        if let Some(&first) = coords.first() {
            coords.push(first);
        }
        LineString::new(coords)
    };

    let holes = rings
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != exterior)
        .map(|(_, ring)| to_line(ring))
        .collect();

    Some(Polygon::new(to_line(&rings[exterior]), holes))
}

/// Drop vertices in the middle of straight runs
fn drop_collinear(ring: Vec<Vertex>) -> Vec<Vertex> {
    let n = ring.len();
    if n < 4 {
        return ring;
    }
    (0..n)
        .filter(|&i| {
            let prev = ring[(i + n - 1) % n];
            let here = ring[i];
            let next = ring[(i + 1) % n];
            let a = (here.0 - prev.0, here.1 - prev.1);
            let b = (next.0 - here.0, next.1 - here.1);
            a.0 * b.1 - a.1 * b.0 != 0
        })
        .map(|i| ring[i])
        .collect()
}

/// Shoelace sum (twice the signed area) of an open ring
fn twice_area(ring: &[Vertex]) -> i64 {
    let n = ring.len();
    (0..n)
        .map(|i| {
            let (x0, y0) = ring[i];
            let (x1, y1) = ring[(i + 1) % n];
            x0 * y1 - x1 * y0
        })
        .sum()
}
