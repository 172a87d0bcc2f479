//! Per-ray photon path tracing and batch dispatch (component C7). Ported
//! from `hqz/src/ztrace.cpp`'s `traceRay`/`traceRayBatch`, generalized to
//! dispatch a batch across `rayon`'s work-stealing pool instead of the
//! original's serial `while (count--)`.

use crate::geometry::{Aabb, Ray, Vec2};
use crate::material;
use crate::quadtree::Quadtree;
use crate::sampler::Sampler;
use crate::scene::{Light, Scene};
use rayon::prelude::*;
use std::f64::consts::PI;

/// The polyline traced by a single photon: emission point, wavelength, and
/// every bounce vertex in order.
#[derive(Debug, Clone)]
pub struct Path {
    pub origin: Vec2,
    pub wavelength: f64,
    pub vertices: Vec<Vec2>,
}

pub struct Tracer<'a> {
    scene: &'a Scene,
    quadtree: &'a Quadtree,
    /// Bounding box a missed ray is clipped against instead of `FLT_MAX`.
    no_hit_bounds: Aabb,
}

impl<'a> Tracer<'a> {
    pub fn new(scene: &'a Scene, quadtree: &'a Quadtree, no_hit_bounds: Aabb) -> Self {
        Tracer {
            scene,
            quadtree,
            no_hit_bounds,
        }
    }

    /// Trace `count` independent rays, seeded `base_seed + k` for `k` in
    /// `0..count`. Serial or `rayon`-parallel per `scene.parallel`; both
    /// return paths in ray-index order.
    pub fn trace_batch(&self, base_seed: u32, count: u32) -> Vec<Path> {
        if self.scene.parallel {
            (0..count)
                .into_par_iter()
                .map(|k| self.trace_ray(base_seed.wrapping_add(k)))
                .collect()
        } else {
            (0..count).map(|k| self.trace_ray(base_seed.wrapping_add(k))).collect()
        }
    }

    fn choose_light<'s>(&'s self, sampler: &mut Sampler) -> Option<&'s Light> {
        let lights = &self.scene.lights;
        if lights.is_empty() {
            return None;
        }
        if lights.len() == 1 {
            return Some(&lights[0]);
        }
        let weights: Vec<f64> = lights.iter().map(|l| sampler.value(&l.power).max(0.0)).collect();
        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            return Some(&lights[0]);
        }
        let u = sampler.uniform() * total;
        let mut sum = 0.0;
        for (light, w) in lights.iter().zip(&weights) {
            sum += w;
            if u <= sum {
                return Some(light);
            }
        }
        lights.last()
    }

    fn init_ray(&self, sampler: &mut Sampler, light: &Light) -> (Ray, f64) {
        let cartesian = Vec2::new(sampler.value(&light.x), sampler.value(&light.y));
        let polar_angle = sampler.value(&light.polar_angle_deg) * (PI / 180.0);
        let polar_distance = sampler.value(&light.polar_distance);
        let origin = cartesian
            + Vec2::new(polar_angle.cos(), polar_angle.sin()) * polar_distance;

        let ray_angle = sampler.value(&light.ray_angle_deg) * (PI / 180.0);
        let ray = Ray::from_angle(origin, ray_angle);

        let wavelength = sampler.value(&light.wavelength);
        (ray, wavelength)
    }

    /// Extend a missed ray's hit point to the farthest intersection with
    /// `no_hit_bounds`, rather than `FLT_MAX`.
    fn extend_to_bounds(&self, ray: &Ray) -> Vec2 {
        match ray.intersect_aabb(&self.no_hit_bounds) {
            Some((_, furthest)) => ray.point_at_distance(furthest),
            None => ray.origin,
        }
    }

    pub fn trace_ray(&self, seed: u32) -> Path {
        let mut sampler = Sampler::new(seed);

        let Some(light) = self.choose_light(&mut sampler) else {
            return Path {
                origin: Vec2::new(0.0, 0.0),
                wavelength: 0.0,
                vertices: Vec::new(),
            };
        };

        let (mut ray, wavelength) = self.init_ray(&mut sampler, light);
        let origin = ray.origin;
        let mut vertices = Vec::new();
        let mut exclude: Option<usize> = None;

        for _ in 0..self.scene.max_reflection {
            match self.quadtree.closest_hit(&ray, exclude) {
                Some(hit) => {
                    vertices.push(hit.point);
                    let material_idx = hit.material_id;
                    let kind = self
                        .scene
                        .materials
                        .get(material_idx.max(0) as usize)
                        .and_then(|m| m.choose_outcome(&mut sampler));
                    match kind {
                        Some(kind) => {
                            let continues = material::apply_outcome(
                                kind, &mut ray, hit.point, hit.normal, &mut sampler,
                            );
                            if !continues {
                                break;
                            }
                            exclude = Some(hit.object_index);
                        }
                        None => break,
                    }
                }
                None => {
                    vertices.push(self.extend_to_bounds(&ray));
                    break;
                }
            }
        }

        Path {
            origin,
            wavelength,
            vertices,
        }
    }
}
