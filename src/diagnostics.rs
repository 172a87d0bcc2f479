//! Non-fatal, accumulating scene-validation diagnostics. Ported from
//! `hqz/src/zcheck.cpp`'s `ZCheck`: every `check_*` helper degrades
//! malformed input to a default value and appends a message to the error
//! log rather than aborting.
//!
//! This is distinct from the ambient `config` loader in [`crate::config`],
//! which handles real `Result`-propagating failures (missing/unreadable
//! config files) rather than malformed scene content.

use log::warn;
use serde_json::Value;

#[derive(Debug, Default)]
pub struct Diagnostics {
    log: String,
}

impl Diagnostics {
    pub fn new() -> Self {
        Diagnostics::default()
    }

    pub fn error_text(&self) -> &str {
        &self.log
    }

    pub fn has_error(&self) -> bool {
        !self.log.is_empty()
    }

    pub fn error(&mut self, message: impl AsRef<str>) {
        let message = message.as_ref();
        warn!("{message}");
        self.log.push_str(message);
        self.log.push('\n');
    }

    /// Array with at least `expected` elements. `Null` is not accepted here
    /// (callers handle an absent field before reaching this check).
    pub fn check_tuple(&mut self, v: &Value, noun: &str, expected: usize) -> bool {
        match v.as_array() {
            Some(arr) if arr.len() >= expected => true,
            _ => {
                let plural = if expected == 1 { "" } else { "s" };
                self.error(format!(
                    "'{noun}' expected an array with at least {expected} item{plural}"
                ));
                false
            }
        }
    }

    /// `Null` quietly returns 0; a valid integer returns itself; anything
    /// else logs and returns 0.
    pub fn check_integer(&mut self, v: &Value, noun: &str) -> i64 {
        if v.is_null() {
            return 0;
        }
        if let Some(n) = v.as_i64() {
            return n;
        }
        self.error(format!("'{noun}' expected an integer value"));
        0
    }

    /// `Null` quietly returns 0; a valid number returns itself; anything
    /// else logs and returns 0.
    pub fn check_number(&mut self, v: &Value, noun: &str) -> f64 {
        if v.is_null() {
            return 0.0;
        }
        if let Some(n) = v.as_f64() {
            return n;
        }
        self.error(format!("'{noun}' expected a number value"));
        0.0
    }

    pub fn check_material_id(&mut self, v: &Value, material_count: usize) -> bool {
        let Some(id) = v.as_u64() else {
            self.error("material ID must be an unsigned integer");
            return false;
        };
        if id as usize >= material_count {
            self.error(format!("material ID ({id}) out of range"));
            return false;
        }
        true
    }

    pub fn check_material_value(&mut self, index: usize, material: &Value) -> bool {
        let Some(outcomes) = material.as_array() else {
            self.error(format!("material #{index} is not an array"));
            return false;
        };
        let mut ok = true;
        for (i, outcome) in outcomes.iter().enumerate() {
            let starts_with_number = outcome
                .as_array()
                .and_then(|o| o.first())
                .map(|n| n.is_number())
                .unwrap_or(false);
            if !starts_with_number {
                self.error(format!(
                    "material #{index} outcome #{i} is not an array starting with a number"
                ));
                ok = false;
            }
        }
        ok
    }

    pub fn check_stop_condition(&mut self, ray_limit: f64, time_limit: f64) -> bool {
        if ray_limit <= 0.0 && time_limit <= 0.0 {
            self.error("no stopping conditions set; expected a ray limit and/or time limit");
            return false;
        }
        true
    }

    pub fn check_light_power(&mut self, total_light_power: f64) -> bool {
        if total_light_power <= 0.0 {
            self.error(format!(
                "total light power ({total_light_power}) must be positive"
            ));
            return false;
        }
        true
    }
}
