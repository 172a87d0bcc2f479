//! Wavelength → linear RGB and the blackbody inverse CDF (component C3).
//!
//! Ported from the contract in `hqz/include/hqz/spectrum.h` (`Color`,
//! `setWavelength`, `isVisible`): the tristimulus table was not part of the
//! retrieved original source, so it is built once from the standard
//! multi-lobe Gaussian analytic fit to the CIE 1931 2° color matching
//! functions (Wyman, Sloan & Shirley 2013), which reproduces the visible
//! CIE curves closely enough that many samples at a given wavelength give
//! a visibly correct color after RGB conversion.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

const WAVELENGTH_MIN: i32 = 360;
const WAVELENGTH_MAX: i32 = 830;
const TABLE_LEN: usize = (WAVELENGTH_MAX - WAVELENGTH_MIN + 1) as usize;
const SCALE: f64 = 8192.0;

/// Integer linear-RGB weights in `[-32768, 32767]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Color {
    pub r: i32,
    pub g: i32,
    pub b: i32,
}

impl Color {
    pub fn is_visible(&self) -> bool {
        self.r != 0 || self.g != 0 || self.b != 0
    }

    /// `lambda == 0` is the monochromatic-white sentinel; outside
    /// `[360, 830]` the color is zero (invisible); otherwise it's the
    /// premultiplied tristimulus table entry.
    pub fn from_wavelength(lambda_nm: f64) -> Color {
        if lambda_nm == 0.0 {
            return Color {
                r: SCALE as i32,
                g: SCALE as i32,
                b: SCALE as i32,
            };
        }
        let idx = lambda_nm.round() as i32;
        if idx < WAVELENGTH_MIN || idx > WAVELENGTH_MAX {
            return Color::default();
        }
        TABLE[(idx - WAVELENGTH_MIN) as usize]
    }
}

fn gaussian(x: f64, alpha: f64, mu: f64, sigma1: f64, sigma2: f64) -> f64 {
    let sigma = if x < mu { sigma1 } else { sigma2 };
    let t = (x - mu) / sigma;
    alpha * (-0.5 * t * t).exp()
}

/// CIE 1931 2° standard observer, analytic Gaussian-fit approximation.
fn cie_xyz(wavelength_nm: f64) -> (f64, f64, f64) {
    let x = gaussian(wavelength_nm, 1.056, 599.8, 37.9, 31.0)
        + gaussian(wavelength_nm, 0.362, 442.0, 16.0, 26.7)
        + gaussian(wavelength_nm, -0.065, 501.1, 20.4, 26.2);
    let y = gaussian(wavelength_nm, 0.821, 568.8, 46.9, 40.5)
        + gaussian(wavelength_nm, 0.286, 530.9, 16.3, 31.1);
    let z = gaussian(wavelength_nm, 1.217, 437.0, 11.8, 36.0)
        + gaussian(wavelength_nm, 0.681, 459.0, 26.0, 13.8);
    (x, y, z)
}

/// CIE XYZ → linear sRGB (D65 primaries).
fn xyz_to_linear_srgb(x: f64, y: f64, z: f64) -> (f64, f64, f64) {
    let r = 3.2406 * x - 1.5372 * y - 0.4986 * z;
    let g = -0.9689 * x + 1.8758 * y + 0.0415 * z;
    let b = 0.0557 * x - 0.2040 * y + 1.0570 * z;
    (r, g, b)
}

fn to_clamped_i32(v: f64) -> i32 {
    (v * SCALE).round().clamp(-32768.0, 32767.0) as i32
}

static TABLE: Lazy<[Color; TABLE_LEN]> = Lazy::new(|| {
    let mut table = [Color::default(); TABLE_LEN];
    for (i, slot) in table.iter_mut().enumerate() {
        let nm = (WAVELENGTH_MIN + i as i32) as f64;
        let (x, y, z) = cie_xyz(nm);
        let (r, g, b) = xyz_to_linear_srgb(x, y, z);
        *slot = Color {
            r: to_clamped_i32(r),
            g: to_clamped_i32(g),
            b: to_clamped_i32(b),
        };
    }
    table
});

// --- Blackbody inverse CDF -------------------------------------------------

const PLANCK_H: f64 = 6.626_070_15e-34;
const PLANCK_C: f64 = 2.997_924_58e8;
const PLANCK_KB: f64 = 1.380_649e-23;

fn planck_radiance(wavelength_m: f64, temperature_k: f64) -> f64 {
    let l5 = wavelength_m.powi(5);
    let exponent = (PLANCK_H * PLANCK_C) / (wavelength_m * PLANCK_KB * temperature_k);
    let numerator = 2.0 * PLANCK_H * PLANCK_C * PLANCK_C;
    numerator / (l5 * (exponent.exp() - 1.0))
}

/// A precomputed, normalized CDF over the visible band for one
/// temperature, cached because the same light (and hence the same
/// temperature) is sampled by many rays.
fn cdf_for_temperature(temperature_k: f64) -> Arc<[f64; TABLE_LEN]> {
    static CACHE: Lazy<Mutex<HashMap<u64, Arc<[f64; TABLE_LEN]>>>> =
        Lazy::new(|| Mutex::new(HashMap::new()));

    let key = temperature_k.to_bits();
    let mut cache = CACHE.lock().expect("blackbody CDF cache poisoned");
    if let Some(cdf) = cache.get(&key) {
        return Arc::clone(cdf);
    }

    let mut cdf = [0.0f64; TABLE_LEN];
    let mut running = 0.0;
    for (i, slot) in cdf.iter_mut().enumerate() {
        let nm = (WAVELENGTH_MIN + i as i32) as f64;
        running += planck_radiance(nm * 1e-9, temperature_k);
        *slot = running;
    }
    let total = cdf[TABLE_LEN - 1];
    if total > 0.0 {
        for v in cdf.iter_mut() {
            *v /= total;
        }
    }

    let cdf = Arc::new(cdf);
    cache.insert(key, Arc::clone(&cdf));
    cdf
}

/// Draw a wavelength (nm) from the Planck spectrum at `temperature_k`,
/// using `uniform` (expected uniform in `[0, 1)`) as the inverse-CDF
/// argument.
pub fn blackbody_wavelength(temperature_k: f64, uniform: f64) -> f64 {
    let cdf = cdf_for_temperature(temperature_k);
    match cdf.as_slice().binary_search_by(|v| v.partial_cmp(&uniform).unwrap()) {
        Ok(i) | Err(i) => {
            let idx = i.min(TABLE_LEN - 1);
            (WAVELENGTH_MIN + idx as i32) as f64
        }
    }
}
