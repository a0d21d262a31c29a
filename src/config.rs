// Pad settings, read from a TOML file. Every field has a default, so an empty
// or missing file gives the classic 28x28 digit pad.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::session::BRUSH_RADIUS;

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Raster width in cells.
    pub width: usize,
    /// Raster height in cells.
    pub height: usize,
    /// Undo steps kept before the oldest is evicted.
    pub history_capacity: usize,
    pub brush_radius: f64,
    pub min_radius: f64,
    pub max_radius: f64,
    pub radius_step: f64,
    /// Window pixels per raster cell.
    pub scale: usize,
    /// JSON model for the bundled classifier; none means "no classifier".
    pub model: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            width: 28,
            height: 28,
            history_capacity: 32,
            brush_radius: BRUSH_RADIUS,
            min_radius: 0.5,
            max_radius: 3.0,
            radius_step: 0.5,
            scale: 20,
            model: None,
        }
    }
}

impl Config {
    /// Read `path`; a file that does not exist yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("no config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => return Err(Error::Io { path: path.to_path_buf(), source }),
        };

        let config = Self::parse(&text).map_err(|source| Error::Config { path: path.to_path_buf(), source })?;
        info!("config loaded from {}", path.display());
        Ok(config)
    }

    pub fn parse(text: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str::<Config>(text).map(Config::validate)
    }

    /// Pull nonsensical values back into range.
    pub fn validate(mut self) -> Self {
        let defaults = Self::default();
        if self.width == 0 || self.height == 0 {
            warn!("config: zero-sized raster, using {}x{}", defaults.width, defaults.height);
            self.width = defaults.width;
            self.height = defaults.height;
        }
        if self.history_capacity == 0 {
            warn!("config: history_capacity must be positive");
            self.history_capacity = 1;
        }
        if self.scale == 0 {
            self.scale = 1;
        }
        if !(self.radius_step > 0.0) || !self.radius_step.is_finite() {
            self.radius_step = defaults.radius_step;
        }
        // NaN compares false both ways, so the ordering is checked positively.
        if !(self.min_radius > 0.0) || !self.max_radius.is_finite() || !(self.min_radius <= self.max_radius) {
            warn!("config: radius bounds [{}, {}] invalid", self.min_radius, self.max_radius);
            self.min_radius = defaults.min_radius;
            self.max_radius = defaults.max_radius;
        }
        if !self.brush_radius.is_finite() {
            warn!("config: brush_radius {} invalid", self.brush_radius);
            self.brush_radius = defaults.brush_radius;
        }
        self.brush_radius = self.brush_radius.clamp(self.min_radius, self.max_radius);
        self
    }

    /// Step the radius by `steps * radius_step`, staying within bounds.
    pub fn step_radius(&self, radius: f64, steps: i32) -> f64 {
        (radius + steps as f64 * self.radius_step).clamp(self.min_radius, self.max_radius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn empty_file_is_default() {
        assert_eq!(Config::parse("").unwrap(), Config::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let c = Config::parse("width = 16\nhistory_capacity = 4\nmodel = \"nn/digits.json\"\n").unwrap();
        assert_eq!(c.width, 16);
        assert_eq!(c.height, 28);
        assert_eq!(c.history_capacity, 4);
        assert_eq!(c.model.as_deref(), Some(Path::new("nn/digits.json")));
    }

    #[test]
    fn bad_values_are_repaired() {
        let c = Config::parse("width = 0\nhistory_capacity = 0\nmin_radius = 5.0\nmax_radius = 1.0\nbrush_radius = 9.0\n").unwrap();
        assert_eq!((c.width, c.height), (28, 28));
        assert_eq!(c.history_capacity, 1);
        assert_relative_eq!(c.min_radius, 0.5);
        assert_relative_eq!(c.max_radius, 3.0);
        assert_relative_eq!(c.brush_radius, 3.0);
    }

    #[test]
    fn non_finite_radii_are_repaired() {
        let c = Config::parse("max_radius = nan\nbrush_radius = nan\nradius_step = inf\n").unwrap();
        assert_relative_eq!(c.min_radius, 0.5);
        assert_relative_eq!(c.max_radius, 3.0);
        assert_relative_eq!(c.brush_radius, 1.5);
        assert_relative_eq!(c.radius_step, 0.5);

        let c = Config::parse("min_radius = nan\nmax_radius = inf\n").unwrap();
        assert_relative_eq!(c.min_radius, 0.5);
        assert_relative_eq!(c.max_radius, 3.0);
        assert_relative_eq!(c.step_radius(c.brush_radius, 1), 2.0);
    }

    #[test]
    fn malformed_toml_is_an_error() {
        assert!(Config::parse("width = \"wide\"").is_err());
    }

    #[test]
    fn missing_file_gives_defaults() {
        let c = Config::load(Path::new("/definitely/not/here/digit-pad.toml")).unwrap();
        assert_eq!(c, Config::default());
    }

    #[test]
    fn radius_steps_clamp() {
        let c = Config::default();
        assert_relative_eq!(c.step_radius(1.5, 1), 2.0);
        assert_relative_eq!(c.step_radius(3.0, 1), 3.0);
        assert_relative_eq!(c.step_radius(0.5, -1), 0.5);
    }
}
