use serde::{Deserialize, Serialize};

/// A 2D point with floating-point coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub const fn zero() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

impl std::ops::Add for Point {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl std::ops::AddAssign for Point {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl std::ops::Sub for Point {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

impl std::ops::Mul<f64> for Point {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self::Output {
        Self {
            x: self.x * rhs,
            y: self.y * rhs,
        }
    }
}

/// An axis-aligned rectangle defined by top-left corner, width, and height.
/// Used for face windows handed in by a detector or a dataset annotation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build a box from corner coordinates `(x0, y0)`..`(x1, y1)`.
    pub fn from_corners(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self {
            x: x0,
            y: y0,
            width: x1 - x0,
            height: y1 - y0,
        }
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// A landmark configuration represented as an ordered collection of points.
///
/// During cascade training this doubles as both the ground-truth label and
/// the per-sample running estimate refined stage by stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub points: Vec<Point>,
}

impl Shape {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn with_capacity(n: usize) -> Self {
        Self {
            points: Vec::with_capacity(n),
        }
    }

    pub fn num_landmarks(&self) -> usize {
        self.points.len()
    }

    /// Create a zeroed shape with n landmarks.
    pub fn zeros(n: usize) -> Self {
        Self {
            points: vec![Point::zero(); n],
        }
    }

    /// Add another shape's deltas to this shape.
    pub fn add_delta(&mut self, delta: &Shape) {
        debug_assert_eq!(self.points.len(), delta.points.len());
        for (p, d) in self.points.iter_mut().zip(delta.points.iter()) {
            *p += *d;
        }
    }

    /// Flatten shape to a vector of [x0, y0, x1, y1, ...] coordinates.
    pub fn to_flat_vec(&self) -> Vec<f64> {
        let mut v = Vec::with_capacity(self.points.len() * 2);
        for p in &self.points {
            v.push(p.x);
            v.push(p.y);
        }
        v
    }

    /// Create shape from a flat vector of [x0, y0, x1, y1, ...] coordinates.
    pub fn from_flat_vec(v: &[f64]) -> Self {
        debug_assert!(v.len() % 2 == 0);
        let points: Vec<Point> = v
            .chunks_exact(2)
            .map(|chunk| Point::new(chunk[0], chunk[1]))
            .collect();
        Self { points }
    }

    /// Mean squared coordinate error against another shape with the same
    /// number of landmarks.
    pub fn mean_squared_error(&self, other: &Shape) -> f64 {
        debug_assert_eq!(self.points.len(), other.points.len());
        if self.points.is_empty() {
            return 0.0;
        }
        let sum: f64 = self
            .points
            .iter()
            .zip(other.points.iter())
            .map(|(a, b)| {
                let dx = a.x - b.x;
                let dy = a.y - b.y;
                dx * dx + dy * dy
            })
            .sum();
        sum / (self.points.len() * 2) as f64
    }
}

impl std::ops::Index<usize> for Shape {
    type Output = Point;

    fn index(&self, idx: usize) -> &Self::Output {
        &self.points[idx]
    }
}

impl std::ops::IndexMut<usize> for Shape {
    fn index_mut(&mut self, idx: usize) -> &mut Self::Output {
        &mut self.points[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_arithmetic() {
        let a = Point::new(1.0, 2.0);
        let b = Point::new(3.0, 4.0);

        let sum = a + b;
        assert_eq!(sum.x, 4.0);
        assert_eq!(sum.y, 6.0);

        let diff = b - a;
        assert_eq!(diff.x, 2.0);
        assert_eq!(diff.y, 2.0);

        let scaled = a * 2.0;
        assert_eq!(scaled.x, 2.0);
        assert_eq!(scaled.y, 4.0);
    }

    #[test]
    fn bounding_box_corners() {
        let bbox = BoundingBox::from_corners(10.0, 20.0, 110.0, 70.0);
        assert_eq!(bbox.x, 10.0);
        assert_eq!(bbox.y, 20.0);
        assert_eq!(bbox.width, 100.0);
        assert_eq!(bbox.height, 50.0);

        let c = bbox.center();
        assert!((c.x - 60.0).abs() < 1e-12);
        assert!((c.y - 45.0).abs() < 1e-12);
    }

    #[test]
    fn shape_delta() {
        let mut shape = Shape::new(vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)]);
        let delta = Shape::new(vec![Point::new(0.1, 0.2), Point::new(0.3, 0.4)]);
        shape.add_delta(&delta);

        assert!((shape[0].x - 0.1).abs() < 1e-12);
        assert!((shape[0].y - 0.2).abs() < 1e-12);
        assert!((shape[1].x - 1.3).abs() < 1e-12);
        assert!((shape[1].y - 1.4).abs() < 1e-12);
    }

    #[test]
    fn flat_vec_round_trip() {
        let shape = Shape::new(vec![Point::new(3.0, 4.0), Point::new(5.5, -1.0)]);
        let flat = shape.to_flat_vec();
        assert_eq!(flat, vec![3.0, 4.0, 5.5, -1.0]);

        let back = Shape::from_flat_vec(&flat);
        assert_eq!(back, shape);
    }

    #[test]
    fn mean_squared_error_of_offset_shape() {
        let a = Shape::new(vec![Point::new(0.0, 0.0), Point::new(2.0, 2.0)]);
        let mut b = a.clone();
        let offset = Shape::new(vec![Point::new(1.0, 1.0), Point::new(1.0, 1.0)]);
        b.add_delta(&offset);

        // Every coordinate is off by 1, so the mean squared error is 1.
        assert!((a.mean_squared_error(&b) - 1.0).abs() < 1e-12);
        assert_eq!(a.mean_squared_error(&a), 0.0);
    }
}
