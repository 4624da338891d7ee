//! Configuration loading for the editor.
//!
//! Everything is read from a single TOML file with kebab-case keys. Every
//! section and key is optional; missing values fall back to the defaults the
//! editor has always used (600 unit field, backend on localhost:5000).

use serde::Deserialize;
use std::path::Path;

use crate::scene::Point;

/// Default name of the configuration file, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Root configuration object.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct EditorConfig {
    pub backend: BackendConfig,
    pub field: FieldConfig,
    pub planner: PlannerConfig,
}

/// Where the optimizer service lives and how to stay connected to it.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BackendConfig {
    /// Base URL of the optimizer service (without the `/api/...` suffix).
    pub url: String,
    pub request_timeout_secs: u64,
    /// Consecutive failed connection attempts before the push listener gives up.
    pub reconnect_attempts: u32,
    pub reconnect_delay_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:5000".to_string(),
            request_timeout_secs: 30,
            reconnect_attempts: 5,
            reconnect_delay_ms: 1000,
        }
    }
}

impl BackendConfig {
    /// Socket.IO WebSocket endpoint derived from the HTTP base URL.
    pub fn socket_url(&self) -> String {
        let base = self.url.trim_end_matches('/');
        let ws_base = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            base.to_string()
        };
        format!("{}/socket.io/?EIO=4&transport=websocket", ws_base)
    }
}

/// Immutable geometry of the editable field and the placement rules.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FieldConfig {
    /// Side of the square field in field units.
    pub grid_size: f64,
    pub min_radius: f64,
    pub max_radius: f64,
    /// Required clearance between an obstacle edge and the start/goal points.
    pub safe_distance: f64,
    /// Required gap between two obstacle edges.
    pub overlap_margin: f64,
    /// Radius increment of the placement relaxation search.
    pub radius_step: f64,
    pub placement_attempts: u32,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            grid_size: 600.0,
            min_radius: 20.0,
            max_radius: 100.0,
            safe_distance: 30.0,
            overlap_margin: 10.0,
            radius_step: 10.0,
            placement_attempts: 5,
        }
    }
}

impl FieldConfig {
    pub fn default_start(&self) -> Point {
        Point::new(50.0, self.grid_size / 2.0)
    }

    pub fn default_goal(&self) -> Point {
        Point::new(self.grid_size - 50.0, self.grid_size / 2.0)
    }

    /// Callers rely on `validate` having accepted the bounds.
    pub fn clamp_radius(&self, radius: f64) -> f64 {
        radius.clamp(self.min_radius, self.max_radius)
    }

    /// Reject geometry the placement rules cannot work with.
    ///
    /// # Returns
    /// * `Ok(())` if every value is usable
    /// * `Err(String)` naming the first offending key otherwise
    pub fn validate(&self) -> Result<(), String> {
        let finite = [
            ("grid-size", self.grid_size),
            ("min-radius", self.min_radius),
            ("max-radius", self.max_radius),
            ("safe-distance", self.safe_distance),
            ("overlap-margin", self.overlap_margin),
            ("radius-step", self.radius_step),
        ];
        if let Some((key, value)) = finite.iter().find(|(_, v)| !v.is_finite()) {
            return Err(format!("field.{} must be a finite number, got {}", key, value));
        }

        if self.grid_size <= 0.0 {
            return Err(format!("field.grid-size must be positive, got {}", self.grid_size));
        }
        if self.min_radius <= 0.0 {
            return Err(format!("field.min-radius must be positive, got {}", self.min_radius));
        }
        if self.min_radius > self.max_radius {
            return Err(format!(
                "field.min-radius ({}) must not exceed field.max-radius ({})",
                self.min_radius, self.max_radius
            ));
        }
        if 2.0 * self.min_radius > self.grid_size {
            return Err(format!(
                "field.min-radius ({}) does not fit into field.grid-size ({})",
                self.min_radius, self.grid_size
            ));
        }
        if self.safe_distance < 0.0 || self.overlap_margin < 0.0 || self.radius_step < 0.0 {
            return Err("field.safe-distance, field.overlap-margin and field.radius-step must not be negative".to_string());
        }
        if self.placement_attempts == 0 {
            return Err("field.placement-attempts must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Parameters forwarded to the optimizer on every planning request.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PlannerConfig {
    pub robot_radius: f64,
    /// Number of samples the optimizer evaluates along each candidate spline.
    pub resolution: u32,
    /// Initial values of the user-facing inputs.
    pub max_iter: u32,
    pub pop_size: u32,
    pub num_control_points: u32,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            robot_radius: 10.0,
            resolution: 50,
            max_iter: 100,
            pop_size: 100,
            num_control_points: 2,
        }
    }
}

impl EditorConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Returns
    /// * `Ok(EditorConfig)` if the file was read and parsed
    /// * `Err(String)` with a descriptive error message otherwise
    pub fn load(config_path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(config_path).map_err(|e| format!("Failed to read config file: {}", e))?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, String> {
        let config: Self = toml::from_str(content).map_err(|e| format!("Failed to parse config file: {}", e))?;
        config.field.validate().map_err(|e| format!("Invalid config file: {}", e))?;
        Ok(config)
    }

    /// Load the file if it exists, otherwise fall back to defaults.
    pub fn load_or_default(config_path: &Path) -> Result<Self, String> {
        if config_path.exists() {
            Self::load(config_path)
        } else {
            log::warn!("Config file {} not found, using defaults", config_path.display());
            Ok(Self::default())
        }
    }
}
