//! Geometry and transform primitives shared by the timeline model.
//!
//! All of these are plain `Copy` values. Owners copy them on write, nothing is aliased.

use serde::{Deserialize, Serialize};

use crate::tween::{lerp, lerp_angle};

/// A 2D point in stage or shape-local coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[inline]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Smallest rectangle enclosing every point, or `None` for an empty iterator.
    pub fn from_points<I: IntoIterator<Item = Point>>(points: I) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in iter {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(Self::new(min_x, min_y, max_x - min_x, max_y - min_y))
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Inclusive containment test.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Rect::new(
            x,
            y,
            self.right().max(other.right()) - x,
            self.bottom().max(other.bottom()) - y,
        )
    }

    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.x, self.y),
            Point::new(self.right(), self.y),
            Point::new(self.right(), self.bottom()),
            Point::new(self.x, self.bottom()),
        ]
    }
}

/// RGBA color; channels are 0-255, alpha is 0-1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    #[inline]
    pub fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
        Self {
            r,
            g,
            b,
            a: a.clamp(0.0, 1.0),
        }
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match digits.len() {
            3 => {
                let mut out = [0u8; 3];
                for (i, c) in digits.chars().enumerate() {
                    let v = c.to_digit(16)? as u8;
                    out[i] = v * 17;
                }
                Some(Self::rgb(out[0], out[1], out[2]))
            }
            6 | 8 => {
                let r = channel(digits.get(0..2)?)?;
                let g = channel(digits.get(2..4)?)?;
                let b = channel(digits.get(4..6)?)?;
                let a = match digits.get(6..8) {
                    Some(a) => f64::from(channel(a)?) / 255.0,
                    None => 1.0,
                };
                Some(Self::rgba(r, g, b, a))
            }
            _ => None,
        }
    }

    /// `#rrggbb`, alpha is dropped.
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

/// 2x3 affine matrix in canvas order: `x' = a*x + c*y + e`, `y' = b*x + d*y + f`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub fn translate(x: f64, y: f64) -> Self {
        Self {
            e: x,
            f: y,
            ..Self::IDENTITY
        }
    }

    pub fn scale(sx: f64, sy: f64) -> Self {
        Self {
            a: sx,
            d: sy,
            ..Self::IDENTITY
        }
    }

    pub fn rotate_degrees(deg: f64) -> Self {
        let (sin, cos) = deg.to_radians().sin_cos();
        Self {
            a: cos,
            b: sin,
            c: -sin,
            d: cos,
            ..Self::IDENTITY
        }
    }

    pub fn skew_degrees(skew_x: f64, skew_y: f64) -> Self {
        Self {
            b: skew_y.to_radians().tan(),
            c: skew_x.to_radians().tan(),
            ..Self::IDENTITY
        }
    }

    /// `self * other`: `other` is applied first.
    pub fn multiply(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.c * other.b,
            b: self.b * other.a + self.d * other.b,
            c: self.a * other.c + self.c * other.d,
            d: self.b * other.c + self.d * other.d,
            e: self.a * other.e + self.c * other.f + self.e,
            f: self.b * other.e + self.d * other.f + self.f,
        }
    }

    #[inline]
    pub fn apply(&self, p: Point) -> Point {
        Point::new(
            self.a * p.x + self.c * p.y + self.e,
            self.b * p.x + self.d * p.y + self.f,
        )
    }

    /// Bounds of a rectangle after transformation.
    pub fn apply_rect(&self, rect: &Rect) -> Rect {
        Rect::from_points(rect.corners().map(|p| self.apply(p))).unwrap_or(*rect)
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Placement of a shape or symbol instance on stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transform {
    pub x: f64,
    pub y: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    /// Degrees, clockwise in screen space.
    pub rotation: f64,
    pub skew_x: f64,
    pub skew_y: f64,
    /// Opacity in [0, 1].
    pub alpha: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    pub const fn identity() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            rotation: 0.0,
            skew_x: 0.0,
            skew_y: 0.0,
            alpha: 1.0,
        }
    }

    pub fn from_position(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            ..Self::identity()
        }
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.set_alpha(alpha);
        self
    }

    pub fn set_alpha(&mut self, alpha: f64) {
        self.alpha = alpha.clamp(0.0, 1.0);
    }

    pub fn translated(mut self, dx: f64, dy: f64) -> Self {
        self.x += dx;
        self.y += dy;
        self
    }

    /// translate · rotate · skew · scale
    pub fn to_matrix(&self) -> Matrix {
        Matrix::translate(self.x, self.y)
            .multiply(&Matrix::rotate_degrees(self.rotation))
            .multiply(&Matrix::skew_degrees(self.skew_x, self.skew_y))
            .multiply(&Matrix::scale(self.scale_x, self.scale_y))
    }

    #[inline]
    pub fn apply(&self, p: Point) -> Point {
        self.to_matrix().apply(p)
    }

    /// Component-wise interpolation, rotation along the shortest arc.
    pub fn lerp(&self, to: &Transform, t: f64) -> Transform {
        Transform {
            x: lerp(self.x, to.x, t),
            y: lerp(self.y, to.y, t),
            scale_x: lerp(self.scale_x, to.scale_x, t),
            scale_y: lerp(self.scale_y, to.scale_y, t),
            rotation: lerp_angle(self.rotation, to.rotation, t),
            skew_x: lerp(self.skew_x, to.skew_x, t),
            skew_y: lerp(self.skew_y, to.skew_y, t),
            alpha: lerp(self.alpha, to.alpha, t),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn rect_from_points_and_union() {
        let r = Rect::from_points([Point::new(2.0, 3.0), Point::new(-1.0, 5.0)]).unwrap();
        assert_eq!(r, Rect::new(-1.0, 3.0, 3.0, 2.0));
        assert!(Rect::from_points(std::iter::empty()).is_none());

        let u = r.union(&Rect::new(0.0, 0.0, 1.0, 1.0));
        assert_eq!(u, Rect::new(-1.0, 0.0, 3.0, 5.0));
        assert!(u.contains(Point::new(2.0, 5.0)));
        assert!(!u.contains(Point::new(2.1, 5.0)));
    }

    #[test]
    fn color_hex() {
        assert_eq!(Color::from_hex("#ff8000"), Some(Color::rgb(255, 128, 0)));
        assert_eq!(Color::from_hex("fff"), Some(Color::WHITE));
        assert_eq!(Color::from_hex("#00000080").map(|c| c.r), Some(0));
        assert!(Color::from_hex("#12").is_none());
        assert_eq!(Color::rgb(79, 129, 189).to_hex(), "#4f81bd");
    }

    #[test]
    fn transform_matrix_applies_translate_rotate_scale() {
        let t = Transform {
            x: 10.0,
            y: 20.0,
            scale_x: 2.0,
            rotation: 90.0,
            ..Transform::identity()
        };
        let p = t.apply(Point::new(1.0, 0.0));
        // scale to (2,0), rotate 90deg to (0,2), translate
        assert_relative_eq!(p.x, 10.0, epsilon = 1e-9);
        assert_relative_eq!(p.y, 22.0, epsilon = 1e-9);
    }

    #[test]
    fn alpha_is_clamped() {
        let t = Transform::identity().with_alpha(1.7);
        assert_eq!(t.alpha, 1.0);
        let t = Transform::identity().with_alpha(-0.2);
        assert_eq!(t.alpha, 0.0);
    }

    #[test]
    fn transform_lerp_takes_short_rotation() {
        let a = Transform {
            rotation: 350.0,
            ..Transform::identity()
        };
        let b = Transform {
            x: 100.0,
            rotation: 10.0,
            ..Transform::identity()
        };
        let mid = a.lerp(&b, 0.5);
        assert_relative_eq!(mid.x, 50.0);
        assert_relative_eq!(mid.rotation.rem_euclid(360.0), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn transform_serializes_camel_case() {
        let json = serde_json::to_value(Transform::identity()).unwrap();
        assert_eq!(json["scaleX"], 1.0);
        assert_eq!(json["skewY"], 0.0);
    }
}
