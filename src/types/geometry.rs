//! Geometry primitives shared by the basin resolver and the series extractor.
//!
//! Coordinates are geographic (longitude, latitude) in degrees. Polygons follow the
//! GeoJSON convention: rings are closed (first vertex repeated as the last one), the first
//! ring is the exterior and any further rings are holes.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// Length of one degree of latitude, in meters.
pub(crate) const METERS_PER_DEGREE: f64 = 111_320.0;

/// A geographical coordinate, longitude first.
///
/// # Examples
///
/// ```
/// use era5_basin::LonLat;
///
/// let saskylakh = LonLat(114.08, 71.97);
/// assert_eq!(saskylakh.lon(), 114.08);
/// assert_eq!(saskylakh.lat(), 71.97);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LonLat(pub f64, pub f64);

impl LonLat {
    pub fn lon(self) -> f64 {
        self.0
    }

    pub fn lat(self) -> f64 {
        self.1
    }
}

/// Axis-aligned bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl Bounds {
    fn of(points: &[LonLat]) -> Option<Bounds> {
        let first = points.first()?;
        let init = Bounds {
            min_lon: first.lon(),
            min_lat: first.lat(),
            max_lon: first.lon(),
            max_lat: first.lat(),
        };
        Some(points.iter().fold(init, |b, p| b.extend(*p)))
    }

    fn extend(self, p: LonLat) -> Bounds {
        Bounds {
            min_lon: self.min_lon.min(p.lon()),
            min_lat: self.min_lat.min(p.lat()),
            max_lon: self.max_lon.max(p.lon()),
            max_lat: self.max_lat.max(p.lat()),
        }
    }

    fn union(self, other: Bounds) -> Bounds {
        Bounds {
            min_lon: self.min_lon.min(other.min_lon),
            min_lat: self.min_lat.min(other.min_lat),
            max_lon: self.max_lon.max(other.max_lon),
            max_lat: self.max_lat.max(other.max_lat),
        }
    }
}

/// A polygon with one exterior ring and optional holes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub exterior: Vec<LonLat>,
    pub holes: Vec<Vec<LonLat>>,
}

impl Polygon {
    pub fn new(exterior: Vec<LonLat>, holes: Vec<Vec<LonLat>>) -> Self {
        Self { exterior, holes }
    }

    /// `true` if the point lies inside the exterior ring and outside every hole.
    pub fn contains(&self, p: LonLat) -> bool {
        ring_contains(&self.exterior, p) && !self.holes.iter().any(|h| ring_contains(h, p))
    }

    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::of(&self.exterior)
    }

    pub fn vertex_count(&self) -> usize {
        self.exterior.len() + self.holes.iter().map(Vec::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.exterior.len() < 4
    }

    /// Simplifies every ring with Douglas-Peucker at `tolerance_m` meters.
    pub fn simplify(&self, tolerance_m: f64) -> Polygon {
        Polygon {
            exterior: simplify_ring(&self.exterior, tolerance_m),
            holes: self
                .holes
                .iter()
                .map(|h| simplify_ring(h, tolerance_m))
                .collect(),
        }
    }
}

/// Geometry accepted by the extractor: a station point or a basin area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    Point(LonLat),
    Polygon(Polygon),
    MultiPolygon(Vec<Polygon>),
}

impl Geometry {
    pub fn kind(&self) -> &'static str {
        match self {
            Geometry::Point(_) => "Point",
            Geometry::Polygon(_) => "Polygon",
            Geometry::MultiPolygon(_) => "MultiPolygon",
        }
    }

    /// The polygons making up an areal geometry. Empty for points.
    pub fn polygons(&self) -> &[Polygon] {
        match self {
            Geometry::Point(_) => &[],
            Geometry::Polygon(p) => std::slice::from_ref(p),
            Geometry::MultiPolygon(ps) => ps,
        }
    }

    pub fn is_areal(&self) -> bool {
        !matches!(self, Geometry::Point(_))
    }

    /// An areal geometry without a single usable ring is empty. Points never are.
    pub fn is_empty(&self) -> bool {
        self.is_areal() && self.polygons().iter().all(Polygon::is_empty)
    }

    pub fn contains(&self, p: LonLat) -> bool {
        self.polygons().iter().any(|poly| poly.contains(p))
    }

    pub fn bounds(&self) -> Option<Bounds> {
        match self {
            Geometry::Point(p) => Bounds::of(std::slice::from_ref(p)),
            _ => self
                .polygons()
                .iter()
                .filter_map(Polygon::bounds)
                .reduce(Bounds::union),
        }
    }

    pub fn vertex_count(&self) -> usize {
        match self {
            Geometry::Point(_) => 1,
            _ => self.polygons().iter().map(Polygon::vertex_count).sum(),
        }
    }

    pub fn simplify(&self, tolerance_m: f64) -> Geometry {
        match self {
            Geometry::Point(p) => Geometry::Point(*p),
            Geometry::Polygon(p) => Geometry::Polygon(p.simplify(tolerance_m)),
            Geometry::MultiPolygon(ps) => {
                Geometry::MultiPolygon(ps.iter().map(|p| p.simplify(tolerance_m)).collect())
            }
        }
    }
}

// Even-odd ray casting; works for closed and open rings alike.
fn ring_contains(ring: &[LonLat], p: LonLat) -> bool {
    if ring.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let (a, b) = (ring[i], ring[j]);
        if (a.lat() > p.lat()) != (b.lat() > p.lat()) {
            let x = (b.lon() - a.lon()) * (p.lat() - a.lat()) / (b.lat() - a.lat()) + a.lon();
            if p.lon() < x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Local equirectangular projection to meters around a reference latitude.
struct LocalProjection {
    lon0: f64,
    lat0: f64,
    kx: f64,
}

impl LocalProjection {
    fn around(ring: &[LonLat]) -> Self {
        let n = ring.len().max(1) as f64;
        let lat0 = ring.iter().map(|p| p.lat()).sum::<f64>() / n;
        let lon0 = ring.first().map(|p| p.lon()).unwrap_or(0.0);
        Self {
            lon0,
            lat0,
            kx: lat0.to_radians().cos() * METERS_PER_DEGREE,
        }
    }

    fn project(&self, p: LonLat) -> (f64, f64) {
        (
            (p.lon() - self.lon0) * self.kx,
            (p.lat() - self.lat0) * METERS_PER_DEGREE,
        )
    }
}

fn segment_distance(p: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len2 = dx * dx + dy * dy;
    if len2 == 0.0 {
        return ((p.0 - a.0).powi(2) + (p.1 - a.1).powi(2)).sqrt();
    }
    let t = (((p.0 - a.0) * dx + (p.1 - a.1) * dy) / len2).clamp(0.0, 1.0);
    let (cx, cy) = (a.0 + t * dx, a.1 + t * dy);
    ((p.0 - cx).powi(2) + (p.1 - cy).powi(2)).sqrt()
}

/// Marks the vertices of `pts[first..=last]` that Douglas-Peucker keeps.
fn douglas_peucker(pts: &[(f64, f64)], first: usize, last: usize, tol: f64, keep: &mut [bool]) {
    keep[first] = true;
    keep[last] = true;
    let mut stack = vec![(first, last)];
    while let Some((start, end)) = stack.pop() {
        if end <= start + 1 {
            continue;
        }
        let farthest = (start + 1..end)
            .map(|i| (i, segment_distance(pts[i], pts[start], pts[end])))
            .max_by_key(|(_, d)| OrderedFloat(*d));
        if let Some((idx, dist)) = farthest {
            if dist > tol {
                keep[idx] = true;
                stack.push((start, idx));
                stack.push((idx, end));
            }
        }
    }
}

/// Simplifies a closed ring. The ring is split at the vertex farthest from its start so
/// both halves have a non-degenerate baseline. A result with fewer than three distinct
/// vertices is rejected in favour of the input ring.
fn simplify_ring(ring: &[LonLat], tolerance_m: f64) -> Vec<LonLat> {
    if tolerance_m <= 0.0 || ring.len() <= 4 {
        return ring.to_vec();
    }
    let projection = LocalProjection::around(ring);
    let pts: Vec<(f64, f64)> = ring.iter().map(|p| projection.project(*p)).collect();
    let last = pts.len() - 1;

    let split = (1..last)
        .max_by_key(|&i| OrderedFloat(segment_distance(pts[i], pts[0], pts[0])))
        .unwrap_or(last / 2);

    let mut keep = vec![false; pts.len()];
    douglas_peucker(&pts, 0, split, tolerance_m, &mut keep);
    douglas_peucker(&pts, split, last, tolerance_m, &mut keep);

    let simplified: Vec<LonLat> = ring
        .iter()
        .zip(keep)
        .filter_map(|(p, k)| k.then_some(*p))
        .collect();

    if simplified.len() < 4 {
        ring.to_vec()
    } else {
        simplified
    }
}
