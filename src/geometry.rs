//! Vec2, AABB, Ray, and the ray/segment and ray/AABB primitives (component
//! C4). Ported from `hqz/src/ray.h`, with value semantics throughout in
//! place of the original's ambient mutation through back-pointers.

use std::ops::{Add, Mul, Sub};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub fn new(x: f64, y: f64) -> Self {
        Vec2 { x, y }
    }

    pub fn dot(&self, rhs: Vec2) -> f64 {
        self.x * rhs.x + self.y * rhs.y
    }

    pub fn length(&self) -> f64 {
        self.dot(*self).sqrt()
    }

    /// Perpendicular, matching `hqz`'s segment normal `(-dy, dx)`.
    pub fn perpendicular(&self) -> Vec2 {
        Vec2::new(-self.y, self.x)
    }

    pub fn normalized(&self) -> Vec2 {
        *self * (1.0 / self.length())
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Vec2;
    fn mul(self, rhs: f64) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

/// Axis-aligned bounding box, `left <= right`, `top <= bottom`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Aabb {
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Aabb {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn contains_point(&self, p: Vec2) -> bool {
        p.x > self.left && p.x < self.right && p.y > self.top && p.y < self.bottom
    }
}

/// A traced ray: origin, direction, a cached slope used to accelerate
/// ray/segment intersection, and the spectral color the photon carries.
///
/// Any code that mutates `direction` must go through [`Ray::set_direction`]
/// or [`Ray::set_angle`] so `slope` stays consistent.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Vec2,
    direction: Vec2,
    slope: f64,
}

impl Ray {
    pub fn new(origin: Vec2, direction: Vec2) -> Self {
        let mut r = Ray {
            origin,
            direction: Vec2::new(0.0, 0.0),
            slope: 0.0,
        };
        r.set_direction(direction);
        r
    }

    pub fn from_angle(origin: Vec2, angle_radians: f64) -> Self {
        Ray::new(origin, Vec2::new(angle_radians.cos(), angle_radians.sin()))
    }

    pub fn direction(&self) -> Vec2 {
        self.direction
    }

    pub fn slope(&self) -> f64 {
        self.slope
    }

    pub fn set_direction(&mut self, direction: Vec2) {
        self.direction = direction;
        self.slope = direction.y / direction.x;
    }

    pub fn set_angle(&mut self, angle_radians: f64) {
        self.set_direction(Vec2::new(angle_radians.cos(), angle_radians.sin()));
    }

    /// Reflect `direction` about `normal` (need not be unit length).
    pub fn reflect(&mut self, normal: Vec2) {
        let t = 2.0 * normal.dot(self.direction) / normal.dot(normal);
        let new_direction = self.direction - normal * t;
        self.set_direction(new_direction);
    }

    pub fn point_at_distance(&self, distance: f64) -> Vec2 {
        self.origin + self.direction * distance
    }

    /// Ray/segment intersection. Segment is `p1 + alpha * segment_dir`,
    /// `alpha in [0, 1]`; ray is `origin + t * direction`, `t >= 0`. Solves
    /// for `alpha` first using the cached slope, as `hqz/src/ray.h` does,
    /// so near-parallel rejections are cheap.
    ///
    /// Rays parallel to the vertical axis (`direction.x == 0`) fall back to
    /// solving along `y` instead, since the cached slope is infinite there.
    ///
    /// Returns `(distance, alpha)` on a hit.
    pub fn intersect_segment(&self, p1: Vec2, segment_dir: Vec2) -> Option<(f64, f64)> {
        if self.direction.x == 0.0 {
            if segment_dir.x == 0.0 {
                // Both vertical: either parallel-disjoint or degenerate-collinear.
                return None;
            }
            let alpha = (self.origin.x - p1.x) / segment_dir.x;
            if !(0.0..=1.0).contains(&alpha) {
                return None;
            }
            let distance =
                (p1.y + segment_dir.y * alpha - self.origin.y) / self.direction.y;
            if distance < 0.0 || !distance.is_finite() {
                return None;
            }
            return Some((distance, alpha));
        }

        let denom = segment_dir.y - segment_dir.x * self.slope;
        if denom == 0.0 || !denom.is_finite() {
            return None;
        }

        let alpha = ((p1.x - self.origin.x) * self.slope + (self.origin.y - p1.y)) / denom;
        if !(0.0..=1.0).contains(&alpha) {
            return None;
        }

        let distance = (p1.x + segment_dir.x * alpha - self.origin.x) / self.direction.x;
        if distance < 0.0 || !distance.is_finite() {
            return None;
        }

        Some((distance, alpha))
    }

    /// Ray/AABB intersection via the four bounding segments. Always
    /// updates `closest`/`furthest` when it returns `Some`.
    pub fn intersect_aabb(&self, b: &Aabb) -> Option<(f64, f64)> {
        let top_left = Vec2::new(b.left, b.top);
        let bottom_left = Vec2::new(b.left, b.bottom);
        let top_right = Vec2::new(b.right, b.top);
        let horizontal = Vec2::new(b.right - b.left, 0.0);
        let vertical = Vec2::new(0.0, b.bottom - b.top);

        let mut closest = f64::MAX;
        let mut furthest = 0.0f64;
        let mut hit = false;

        for (p, d) in [
            (top_left, horizontal),
            (bottom_left, horizontal),
            (top_left, vertical),
            (top_right, vertical),
        ] {
            if let Some((dist, _)) = self.intersect_segment(p, d) {
                hit = true;
                closest = closest.min(dist);
                furthest = furthest.max(dist);
            }
        }

        hit.then_some((closest, furthest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_direction_keeps_slope_consistent() {
        let mut r = Ray::new(Vec2::new(0.0, 0.0), Vec2::new(1.0, 1.0));
        assert_eq!(r.slope(), 1.0);
        r.set_direction(Vec2::new(2.0, 1.0));
        assert_eq!(r.slope(), 0.5);
    }

    #[test]
    fn reflect_keeps_slope_consistent() {
        let mut r = Ray::new(Vec2::new(0.0, 0.0), Vec2::new(1.0, -1.0));
        r.reflect(Vec2::new(0.0, 1.0));
        assert!((r.direction().x - 1.0).abs() < 1e-9);
        assert!((r.direction().y - 1.0).abs() < 1e-9);
        assert!((r.slope() - r.direction().y / r.direction().x).abs() < 1e-12);
    }

    #[test]
    fn horizontal_ray_hits_vertical_segment() {
        let r = Ray::new(Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0));
        let hit = r.intersect_segment(Vec2::new(5.0, -1.0), Vec2::new(0.0, 2.0));
        let (dist, alpha) = hit.expect("expected a hit");
        assert!((dist - 5.0).abs() < 1e-9);
        assert!((alpha - 0.5).abs() < 1e-9);
    }

    #[test]
    fn ray_missing_segment_behind_origin() {
        let r = Ray::new(Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0));
        let hit = r.intersect_segment(Vec2::new(-5.0, -1.0), Vec2::new(0.0, 2.0));
        assert!(hit.is_none());
    }

    #[test]
    fn ray_aabb_intersection_reports_near_and_far() {
        let r = Ray::new(Vec2::new(-10.0, 0.0), Vec2::new(1.0, 0.0));
        let b = Aabb::new(-1.0, -1.0, 1.0, 1.0);
        let (closest, furthest) = r.intersect_aabb(&b).expect("expected a hit");
        assert!((closest - 9.0).abs() < 1e-9);
        assert!((furthest - 11.0).abs() < 1e-9);
    }

    #[test]
    fn vertical_ray_hits_horizontal_segment() {
        let r = Ray::new(Vec2::new(0.0, -10.0), Vec2::new(0.0, 1.0));
        let hit = r.intersect_segment(Vec2::new(-2.0, 3.0), Vec2::new(4.0, 0.0));
        let (dist, alpha) = hit.expect("expected a hit");
        assert!((dist - 13.0).abs() < 1e-9);
        assert!((alpha - 0.5).abs() < 1e-9);
    }

    #[test]
    fn vertical_ray_intersects_aabb() {
        let r = Ray::new(Vec2::new(0.0, -10.0), Vec2::new(0.0, 1.0));
        let b = Aabb::new(-1.0, -1.0, 1.0, 1.0);
        let hit = r.intersect_aabb(&b);
        assert!(hit.is_some());
    }
}
