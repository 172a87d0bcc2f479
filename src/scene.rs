//! The scene value tree: lights, objects, materials and render settings,
//! parsed from a `serde_json::Value` the way `hqz/scene.h` reads straight
//! off a `rapidjson::Document`.
//!
//! Every numeric field is kept as a `Value` where it may be sampled per
//! ray (lights, object geometry) and only resolved eagerly where a single
//! one-time read is all that's needed (resolution, rays, seed, ...).

use crate::config::RenderDefaults;
use crate::diagnostics::Diagnostics;
use crate::material::{Material, Outcome, OutcomeKind};
use serde_json::Value;

/// A light descriptor: every field may be constant, a `[a,b]` range, or (for
/// `wavelength`) a blackbody `[T,"K"]` pair — resolved per ray by `Sampler`.
#[derive(Debug, Clone)]
pub struct Light {
    pub power: Value,
    pub x: Value,
    pub y: Value,
    pub polar_angle_deg: Value,
    pub polar_distance: Value,
    pub ray_angle_deg: Value,
    pub wavelength: Value,
}

/// A line-segment object: `(materialId, x, y, dx, dy)`, each field
/// sampleable.
#[derive(Debug, Clone)]
pub struct Object {
    pub material_id: Value,
    pub x: Value,
    pub y: Value,
    pub dx: Value,
    pub dy: Value,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

#[derive(Debug, Clone)]
pub struct Scene {
    pub resolution: (u32, u32),
    pub viewport: Value,
    pub exposure: f64,
    pub gamma: f64,
    pub rays: f64,
    pub timelimit: f64,
    pub seed: u32,
    pub max_reflection: u32,
    pub parallel: bool,
    pub debug: i64,
    pub lights: Vec<Light>,
    pub objects: Vec<Object>,
    pub materials: Vec<Material>,
}

fn as_value_or_null(v: Option<&Value>) -> Value {
    v.cloned().unwrap_or(Value::Null)
}

impl Light {
    fn from_value(v: &Value, diag: &mut Diagnostics) -> Option<Light> {
        let arr = v.as_array()?;
        if !diag.check_tuple(v, "light", 7) {
            return None;
        }
        Some(Light {
            power: arr[0].clone(),
            x: arr[1].clone(),
            y: arr[2].clone(),
            polar_angle_deg: arr[3].clone(),
            polar_distance: arr[4].clone(),
            ray_angle_deg: arr[5].clone(),
            wavelength: arr[6].clone(),
        })
    }
}

impl Object {
    fn from_value(v: &Value, diag: &mut Diagnostics) -> Option<Object> {
        let arr = v.as_array()?;
        if !diag.check_tuple(v, "object", 5) {
            return None;
        }
        Some(Object {
            material_id: arr[0].clone(),
            x: arr[1].clone(),
            y: arr[2].clone(),
            dx: arr[3].clone(),
            dy: arr[4].clone(),
        })
    }
}

fn material_from_value(v: &Value, diag: &mut Diagnostics) -> Material {
    let mut outcomes = Vec::new();
    let Some(arr) = v.as_array() else {
        diag.error(format!("material is not an array: {v}"));
        return Material::default();
    };
    for outcome in arr {
        let Some(parts) = outcome.as_array() else {
            diag.error(format!("material outcome is not an array: {outcome}"));
            continue;
        };
        if parts.len() < 2 {
            diag.error(format!("material outcome too short: {outcome}"));
            continue;
        }
        let weight = diag.check_number(&parts[0], "material outcome weight");
        let kind_str = parts[1].as_str().unwrap_or("");
        let kind = match kind_str {
            "d" => OutcomeKind::Diffuse,
            "t" => OutcomeKind::Transmit,
            "r" => OutcomeKind::Reflect,
            "refract" => {
                let index = parts
                    .get(2)
                    .map(|p| diag.check_number(p, "refract index"))
                    .unwrap_or(1.0);
                OutcomeKind::Refract { index }
            }
            _ => OutcomeKind::Unknown,
        };
        outcomes.push(Outcome { weight, kind });
    }
    Material::new(outcomes)
}

impl Scene {
    /// Parse and validate a scene tree, accumulating diagnostics exactly as
    /// `ZCheck`/`ZRender`'s constructor does. Malformed
    /// fields degrade to defaults rather than aborting parsing. Fields the
    /// scene omits outright (not merely malformed) fall back to `defaults`
    /// rather than a literal.
    pub fn from_value(v: &Value, diag: &mut Diagnostics, defaults: &RenderDefaults) -> Scene {
        let debug = diag.check_integer(v.get("debug").unwrap_or(&Value::Null), "debug");

        let rays = diag.check_number(v.get("rays").unwrap_or(&Value::Null), "rays");
        let timelimit = diag.check_number(v.get("timelimit").unwrap_or(&Value::Null), "timelimit");
        diag.check_stop_condition(rays, timelimit);

        let resolution = match v.get("resolution") {
            Some(r) if diag.check_tuple(r, "resolution", 2) => {
                let w = r[0].as_u64().unwrap_or(0) as u32;
                let h = r[1].as_u64().unwrap_or(0) as u32;
                (w, h)
            }
            _ => (0, 0),
        };

        let viewport = as_value_or_null(v.get("viewport"));

        let exposure = match v.get("exposure") {
            Some(e) => diag.check_number(e, "exposure"),
            None => defaults.exposure,
        };
        let gamma = match v.get("gamma") {
            Some(g) => {
                let raw = diag.check_number(g, "gamma");
                if raw > 0.0 { raw } else { 1.0 }
            }
            None => defaults.gamma,
        };

        let seed = v
            .get("seed")
            .and_then(Value::as_u64)
            .map(|s| s as u32)
            .unwrap_or_else(crate::config::derive_seed_from_clock);

        let max_reflection = v
            .get("maxReflection")
            .and_then(Value::as_u64)
            .map(|n| n as u32)
            .unwrap_or(defaults.max_reflection);

        let parallel = v.get("parallel").and_then(Value::as_bool).unwrap_or(false);

        let lights = v
            .get("lights")
            .and_then(Value::as_array)
            .map(|arr| arr.iter().filter_map(|l| Light::from_value(l, diag)).collect())
            .unwrap_or_default();

        let objects = v
            .get("objects")
            .and_then(Value::as_array)
            .map(|arr| arr.iter().filter_map(|o| Object::from_value(o, diag)).collect())
            .unwrap_or_default();

        let materials = v
            .get("materials")
            .and_then(Value::as_array)
            .map(|arr| arr.iter().map(|m| material_from_value(m, diag)).collect())
            .unwrap_or_default();

        for obj in &objects {
            diag.check_material_id(&obj.material_id, materials.len());
        }

        Scene {
            resolution,
            viewport,
            exposure,
            gamma,
            rays,
            timelimit,
            seed,
            max_reflection,
            parallel,
            debug,
            lights,
            objects,
            materials,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_minimal_scene() {
        let v = json!({
            "resolution": [128, 128],
            "viewport": [-64.0, -64.0, 128.0, 128.0],
            "rays": 1,
            "lights": [[1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 550.0]],
            "objects": [],
            "materials": [],
        });
        let mut diag = Diagnostics::new();
        let scene = Scene::from_value(&v, &mut diag, &RenderDefaults::default());
        assert_eq!(scene.resolution, (128, 128));
        assert_eq!(scene.lights.len(), 1);
        assert!(!diag.has_error());
    }

    #[test]
    fn malformed_light_tuple_is_dropped_with_diagnostic() {
        let v = json!({
            "resolution": [8, 8],
            "lights": [[1.0, 2.0]],
        });
        let mut diag = Diagnostics::new();
        let scene = Scene::from_value(&v, &mut diag, &RenderDefaults::default());
        assert!(scene.lights.is_empty());
        assert!(diag.has_error());
    }

    #[test]
    fn gamma_defaults_when_non_positive() {
        let v = json!({ "gamma": -1.0 });
        let mut diag = Diagnostics::new();
        let scene = Scene::from_value(&v, &mut diag, &RenderDefaults::default());
        assert_eq!(scene.gamma, 1.0);
    }

    #[test]
    fn omitted_render_settings_fall_back_to_render_defaults() {
        let v = json!({});
        let mut diag = Diagnostics::new();
        let defaults = RenderDefaults {
            max_reflection: 42,
            exposure: 2.5,
            gamma: 1.8,
            ..RenderDefaults::default()
        };
        let scene = Scene::from_value(&v, &mut diag, &defaults);
        assert_eq!(scene.max_reflection, 42);
        assert_eq!(scene.exposure, 2.5);
        assert_eq!(scene.gamma, 1.8);
    }

    #[test]
    fn material_outcome_kinds_parse() {
        let v = json!({
            "materials": [
                [[0.3, "d"], [0.2, "r"]],
                [[1.0, "refract", 1.5]],
            ]
        });
        let mut diag = Diagnostics::new();
        let scene = Scene::from_value(&v, &mut diag, &RenderDefaults::default());
        assert_eq!(scene.materials.len(), 2);
        assert_eq!(scene.materials[0].outcomes.len(), 2);
        match scene.materials[1].outcomes[0].kind {
            OutcomeKind::Refract { index } => assert_eq!(index, 1.5),
            _ => panic!("expected refract"),
        }
    }
}
