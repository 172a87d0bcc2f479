//! Samples scalars from scene values (component C2). Ported from
//! `hqz/src/sampler.h`'s `Sampler::value` grammar.

use crate::prng::Prng;
use crate::spectrum;
use serde_json::Value;

pub struct Sampler {
    rng: Prng,
}

impl Sampler {
    pub fn new(seed: u32) -> Self {
        Sampler {
            rng: Prng::new(seed),
        }
    }

    pub fn uniform(&mut self) -> f64 {
        self.rng.uniform()
    }

    pub fn uniform_range(&mut self, a: f64, b: f64) -> f64 {
        self.rng.uniform_range(a, b)
    }

    pub fn blackbody(&mut self, temperature: f64) -> f64 {
        spectrum::blackbody_wavelength(temperature, self.uniform())
    }

    /// Sample a scene value:
    /// - a number -> itself
    /// - null -> 0
    /// - `[a, b]` of numbers -> uniform(a, b)
    /// - `[T, "K"]` -> blackbody wavelength at temperature `T`
    /// - anything else -> 0 (reserved for forward compatibility)
    pub fn value(&mut self, v: &Value) -> f64 {
        if let Some(n) = v.as_f64() {
            return n;
        }
        if v.is_null() {
            return 0.0;
        }
        if let Some(arr) = v.as_array() {
            if arr.len() == 2 {
                if let Some(a) = arr[0].as_f64() {
                    if let Some(b) = arr[1].as_f64() {
                        return self.uniform_range(a, b);
                    }
                    if let Some(s) = arr[1].as_str() {
                        if s == "K" {
                            return self.blackbody(a);
                        }
                    }
                }
            }
        }
        0.0
    }
}
