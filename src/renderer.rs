//! Top-level render loop, viewport projection, and tone-map scaling
//! (component C9). Ported from `hqz/src/zrender.cpp`'s `ZRender`
//! constructor order and `render`/`draw`, with batch dispatch delegated
//! to [`crate::tracer::Tracer`]'s `rayon`-parallel work-stealing pool.

use crate::config::RenderDefaults;
use crate::diagnostics::Diagnostics;
use crate::geometry::{Aabb, Ray, Vec2};
use crate::quadtree::Quadtree;
use crate::sampler::Sampler;
use crate::scene::Scene;
use crate::spectrum::Color;
use crate::tracer::{Path, Tracer};
use serde_json::Value;
use std::time::Instant;

/// Bit 0 of `scene.debug`: draw an outline of every quadtree node's AABB
/// over the render, in this fixed wavelength (a yellow).
const DEBUG_QUADTREE_BIT: i64 = 1;
const DEBUG_QUADTREE_WAVELENGTH_NM: f64 = 580.0;

#[derive(Debug, Clone, Copy)]
struct ViewportSample {
    origin: Vec2,
    size: Vec2,
}

impl ViewportSample {
    fn aabb(&self) -> Aabb {
        Aabb::new(
            self.origin.x,
            self.origin.y,
            self.origin.x + self.size.x,
            self.origin.y + self.size.y,
        )
    }

    fn x_scale(&self, x: f64, w: f64) -> f64 {
        (x - self.origin.x) * w / self.size.x
    }

    fn y_scale(&self, y: f64, h: f64) -> f64 {
        (y - self.origin.y) * h / self.size.y
    }
}

pub struct Renderer {
    scene: Scene,
    quadtree: Quadtree,
    histogram: crate::histogram::HistogramImage,
    viewport: ViewportSample,
    no_hit_bounds: Aabb,
    total_light_power: f64,
    ray_limit: f64,
    diagnostics: Diagnostics,
}

impl Renderer {
    /// Mirrors `ZRender`'s constructor order exactly, since it determines
    /// what diagnostics appear and in what order: debug flag, stopping
    /// condition, resolution, viewport tuple, quadtree build, total light
    /// power.
    pub fn new(scene_value: &Value, defaults: &RenderDefaults) -> Renderer {
        crate::config::apply_log_level(defaults);

        let mut diagnostics = Diagnostics::new();
        let scene = Scene::from_value(scene_value, &mut diagnostics, defaults);

        diagnostics.check_tuple(&scene.viewport, "viewport", 4);
        let viewport = ViewportSample {
            origin: Vec2::new(
                scene.viewport.get(0).map(|v| v.as_f64().unwrap_or(0.0)).unwrap_or(0.0),
                scene.viewport.get(1).map(|v| v.as_f64().unwrap_or(0.0)).unwrap_or(0.0),
            ),
            size: Vec2::new(
                scene.viewport.get(2).map(|v| v.as_f64().unwrap_or(0.0)).unwrap_or(0.0),
                scene.viewport.get(3).map(|v| v.as_f64().unwrap_or(0.0)).unwrap_or(0.0),
            ),
        };

        let mut build_sampler = Sampler::new(scene.seed);
        let quadtree = Quadtree::build(&scene.objects, &mut build_sampler);

        let margin = defaults.no_hit_margin.max(viewport.size.x.abs()).max(viewport.size.y.abs());
        let no_hit_bounds = Aabb::new(
            viewport.origin.x - margin,
            viewport.origin.y - margin,
            viewport.origin.x + viewport.size.x + margin,
            viewport.origin.y + viewport.size.y + margin,
        );

        let mut power_sampler = Sampler::new(scene.seed);
        let total_light_power: f64 = scene.lights.iter().map(|l| power_sampler.value(&l.power)).sum();
        diagnostics.check_light_power(total_light_power);

        let ray_limit = scene.rays;
        let (w, h) = scene.resolution;
        let histogram = crate::histogram::HistogramImage::new(w, h);

        Renderer {
            scene,
            quadtree,
            histogram,
            viewport,
            no_hit_bounds,
            total_light_power,
            ray_limit,
            diagnostics,
        }
    }

    pub fn error_text(&self) -> &str {
        self.diagnostics.error_text()
    }

    pub fn has_error(&self) -> bool {
        self.diagnostics.has_error()
    }

    /// Interrupt a render in progress. The currently running batch
    /// completes before the next stopping-condition check sees this.
    pub fn interrupt(&mut self) {
        self.ray_limit = -1.0;
    }

    fn width(&self) -> u32 {
        self.scene.resolution.0
    }

    fn height(&self) -> u32 {
        self.scene.resolution.1
    }

    /// Project one path onto the image and deposit its energy into the
    /// histogram, skipping invisible wavelengths at draw time but still
    /// counting the ray against the ray budget.
    fn draw_path(&mut self, path: &Path) {
        let color = Color::from_wavelength(path.wavelength);
        if !color.is_visible() || path.vertices.is_empty() {
            return;
        }

        let w = self.width() as f64;
        let h = self.height() as f64;
        let viewport_aabb = self.viewport.aabb();

        let mut previous = path.origin;
        let n = path.vertices.len();
        for (i, &vertex) in path.vertices.iter().enumerate() {
            let is_last = i == n - 1;
            let endpoint = if is_last && !viewport_aabb.contains_point(vertex) {
                let direction = vertex - previous;
                let ray = Ray::new(previous, direction);
                match ray.intersect_aabb(&viewport_aabb) {
                    Some((_, furthest)) => ray.point_at_distance(furthest),
                    None => vertex,
                }
            } else {
                vertex
            };

            self.histogram.line(
                path.wavelength,
                self.viewport.x_scale(previous.x, w),
                self.viewport.y_scale(previous.y, h),
                self.viewport.x_scale(endpoint.x, w),
                self.viewport.y_scale(endpoint.y, h),
            );
            previous = endpoint;
        }
    }

    fn draw_batch(&mut self, paths: &[Path]) {
        for path in paths {
            self.draw_path(path);
        }
    }

    /// Outline every quadtree node's AABB, root first then its children
    /// recursively, clipped to the (finite) no-hit bounds so the lines stay
    /// in pixel-reachable coordinates.
    fn draw_debug_quadtree(&mut self) {
        let w = self.width() as f64;
        let h = self.height() as f64;
        let boxes = self.quadtree.node_bounds(self.no_hit_bounds);
        for aabb in boxes {
            let left = self.viewport.x_scale(aabb.left, w);
            let top = self.viewport.y_scale(aabb.top, h);
            let right = self.viewport.x_scale(aabb.right, w);
            let bottom = self.viewport.y_scale(aabb.bottom, h);
            self.histogram.line(DEBUG_QUADTREE_WAVELENGTH_NM, left, top, right, top);
            self.histogram.line(DEBUG_QUADTREE_WAVELENGTH_NM, right, top, right, bottom);
            self.histogram.line(DEBUG_QUADTREE_WAVELENGTH_NM, right, bottom, left, bottom);
            self.histogram.line(DEBUG_QUADTREE_WAVELENGTH_NM, left, bottom, left, top);
        }
    }

    /// Run the render loop to completion (stopping at whichever of
    /// `rays`/`timelimit`/[`Renderer::interrupt`] fires first) and tone-map
    /// the result into an 8-bit RGB buffer, row-major `y, x, channel`.
    pub fn render(&mut self, defaults: &RenderDefaults) -> Vec<u8> {
        if self.scene.debug & DEBUG_QUADTREE_BIT != 0 {
            self.draw_debug_quadtree();
        }

        let mut num_rays: u64 = 0;
        let start = Instant::now();

        loop {
            if self.ray_limit < 0.0 {
                break;
            }
            if self.ray_limit > 0.0 && num_rays as f64 > self.ray_limit {
                break;
            }
            if self.scene.timelimit > 0.0 && start.elapsed().as_secs_f64() > self.scene.timelimit {
                break;
            }

            let batch_seed = self.scene.seed.wrapping_add(num_rays as u32);
            let paths = {
                let tracer = Tracer::new(&self.scene, &self.quadtree, self.no_hit_bounds);
                tracer.trace_batch(batch_seed, defaults.batch_size)
            };
            self.draw_batch(&paths);

            num_rays += defaults.batch_size as u64;
        }

        let gamma = self.scene.gamma;
        let area_scale = (self.width() as f64 * self.height() as f64 / (1024.0 * 576.0)).sqrt();
        let intensity_scale = self.total_light_power / (255.0 * 8192.0);
        let scale = (1.0 + 10.0 * self.scene.exposure).exp() * area_scale * intensity_scale
            / (num_rays.max(1) as f64);

        let mut out = vec![0u8; (self.width() * self.height() * 3) as usize];
        self.histogram.render(&mut out, scale, 1.0 / gamma, defaults.dither_seed);
        out
    }
}
