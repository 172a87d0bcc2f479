//! Probabilistic outcome dispatch (component C6). Ported from
//! `hqz/src/zmaterial.h`'s `rayOutcome`, generalized from a single
//! scatter-one-ray method into an ordered weighted-outcome table where
//! each effect (diffuse scatter, specular reflect, dielectric refract)
//! gets its own `OutcomeKind` instead of its own type.

use crate::geometry::{Ray, Vec2};
use crate::sampler::Sampler;
use std::f64::consts::PI;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutcomeKind {
    /// `d` — origin <- hit point; direction <- uniform angle on the circle.
    Diffuse,
    /// `t` — origin <- hit point; direction unchanged.
    Transmit,
    /// `r` — origin <- hit point; direction reflected about the normal.
    Reflect,
    /// `refract` — Snell's law with the given relative index; falls back
    /// to `Reflect` on total internal reflection.
    Refract { index: f64 },
    /// Any unrecognized kind string: the universal absorption fallback.
    Unknown,
}

#[derive(Debug, Clone, Copy)]
pub struct Outcome {
    pub weight: f64,
    pub kind: OutcomeKind,
}

/// An ordered sequence of weighted outcomes. Residual probability mass
/// (1 - sum of weights) is implicit absorption.
#[derive(Debug, Clone, Default)]
pub struct Material {
    pub outcomes: Vec<Outcome>,
}

impl Material {
    pub fn new(outcomes: Vec<Outcome>) -> Self {
        Material { outcomes }
    }

    /// Dispatch: draw `u = sampler.uniform()`, walk outcomes accumulating
    /// weight; the first outcome whose running sum is `>= u` fires. `None`
    /// means the ray is absorbed.
    pub fn choose_outcome(&self, sampler: &mut Sampler) -> Option<OutcomeKind> {
        let u = sampler.uniform();
        let mut sum = 0.0;
        for outcome in &self.outcomes {
            sum += outcome.weight;
            if u <= sum {
                return Some(outcome.kind);
            }
        }
        None
    }
}

/// Apply a chosen outcome to `ray` in place, given the hit point and the
/// object's outward normal. Returns whether the ray continues propagating;
/// `false` means absorbed.
pub fn apply_outcome(
    kind: OutcomeKind,
    ray: &mut Ray,
    hit_point: Vec2,
    normal: Vec2,
    sampler: &mut Sampler,
) -> bool {
    ray.origin = hit_point;
    match kind {
        OutcomeKind::Diffuse => {
            let angle = sampler.uniform_range(0.0, 2.0 * PI);
            ray.set_angle(angle);
            true
        }
        OutcomeKind::Transmit => true,
        OutcomeKind::Reflect => {
            ray.reflect(normal);
            true
        }
        OutcomeKind::Refract { index } => {
            match refract(ray.direction(), normal, index) {
                Some(refracted) => ray.set_direction(refracted),
                // Total internal reflection: fall back to specular reflect.
                None => ray.reflect(normal),
            }
            true
        }
        OutcomeKind::Unknown => false,
    }
}

/// Vector form of Snell's law. `index` is the relative refractive index of
/// the medium the ray is entering (vacuum assumed on the other side).
/// Returns `None` on total internal reflection.
fn refract(incident: Vec2, normal: Vec2, index: f64) -> Option<Vec2> {
    let mut n = normal.normalized();
    let mut eta = 1.0 / index;
    let mut cosi = -n.dot(incident);
    if cosi < 0.0 {
        // Exiting the medium rather than entering it.
        cosi = -cosi;
        n = n * -1.0;
        eta = index;
    }
    let sin2t = eta * eta * (1.0 - cosi * cosi);
    if sin2t > 1.0 {
        return None;
    }
    let cost = (1.0 - sin2t).sqrt();
    Some(incident * eta + n * (eta * cosi - cost))
}
