pub mod config;
pub mod diagnostics;
pub mod geometry;
pub mod histogram;
pub mod material;
pub mod prng;
pub mod quadtree;
pub mod renderer;
pub mod sampler;
pub mod scene;
pub mod tracer;

pub mod spectrum;

pub use config::RenderDefaults;
pub use diagnostics::Diagnostics;
pub use geometry::{Aabb, Ray, Vec2};
pub use histogram::HistogramImage;
pub use material::Material;
pub use renderer::Renderer;
pub use scene::Scene;
pub use spectrum::Color;
pub use tracer::{Path, Tracer};
