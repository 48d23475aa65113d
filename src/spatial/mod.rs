//! Spatial model - points on a disc-shaped city centred at the origin

use serde::{Deserialize, Serialize};

/// Continuous position, used for people.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance
    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn inside(self, centre: Point, radius: f64) -> bool {
        self.distance(centre) <= radius
    }
}

/// Integer lattice position, used for business locations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPoint {
    pub x: i32,
    pub y: i32,
}

impl GridPoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn to_point(self) -> Point {
        Point::new(self.x as f64, self.y as f64)
    }
}

impl From<GridPoint> for Point {
    fn from(value: GridPoint) -> Self {
        value.to_point()
    }
}

/// Every lattice point within `radius` of the origin, x-major then y.
pub fn lattice_points(radius: f64) -> Vec<GridPoint> {
    if !radius.is_finite() || radius < 0.0 {
        return Vec::new();
    }
    let bound = radius.floor() as i32;
    let mut points = Vec::new();
    for x in -bound..=bound {
        for y in -bound..=bound {
            let point = GridPoint::new(x, y);
            if point.to_point().inside(Point::ORIGIN, radius) {
                points.push(point);
            }
        }
    }
    points
}
