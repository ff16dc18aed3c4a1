//! Tunable canvas settings.
//!
//! Every field has a default, so a partial JSON document is enough to
//! override a single value.

use crate::handles::{HANDLE_HIT_RADIUS, ROTATE_HANDLE_OFFSET, ROTATION_SNAP_DEGREES};
use crate::store::DUPLICATE_OFFSET;
use crate::transform::{MAX_SCALE, MIN_SCALE, WHEEL_ZOOM_STEP, ZOOM_LEVELS};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors raised while reading settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Invalid settings: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Pointer and keyboard gesture tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InteractionSettings {
    /// Screen distance below which a box-select counts as a click.
    pub box_select_threshold: f64,
    pub rotation_snap_degrees: f64,
    pub handle_hit_radius: f64,
    pub rotate_handle_offset: f64,
    pub nudge_step: f64,
    /// Nudge distance with Shift held.
    pub nudge_step_large: f64,
}

impl Default for InteractionSettings {
    fn default() -> Self {
        Self {
            box_select_threshold: 5.0,
            rotation_snap_degrees: ROTATION_SNAP_DEGREES,
            handle_hit_radius: HANDLE_HIT_RADIUS,
            rotate_handle_offset: ROTATE_HANDLE_OFFSET,
            nudge_step: 1.0,
            nudge_step_large: 10.0,
        }
    }
}

/// Zoom stops and limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ZoomSettings {
    /// Ascending zoom stops used by zoom in/out.
    pub levels: Vec<f64>,
    /// Relative change per wheel tick.
    pub wheel_step: f64,
    pub min: f64,
    pub max: f64,
}

impl Default for ZoomSettings {
    fn default() -> Self {
        Self {
            levels: ZOOM_LEVELS.to_vec(),
            wheel_step: WHEEL_ZOOM_STEP,
            min: MIN_SCALE,
            max: MAX_SCALE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub interaction: InteractionSettings,
    pub zoom: ZoomSettings,
    pub duplicate_offset: f64,
    /// Screen padding kept around content by fit-to-view.
    pub fit_padding: f64,
    pub autosave_interval_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            interaction: InteractionSettings::default(),
            zoom: ZoomSettings::default(),
            duplicate_offset: DUPLICATE_OFFSET,
            fit_padding: 50.0,
            autosave_interval_ms: 1000,
        }
    }
}

impl Settings {
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let mut settings: Settings = serde_json::from_str(json)?;
        settings.sanitize();
        Ok(settings)
    }

    /// Read settings from a file. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(json) => Self::from_json(&json),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No settings at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Keep zoom limits ordered and the level table sorted within them.
    fn sanitize(&mut self) {
        let zoom = &mut self.zoom;
        if zoom.min.is_nan() || zoom.min <= 0.0 {
            zoom.min = MIN_SCALE;
        }
        if zoom.max < zoom.min {
            zoom.max = zoom.min;
        }
        let (min, max) = (zoom.min, zoom.max);
        zoom.levels.retain(|level| level.is_finite() && *level >= min && *level <= max);
        zoom.levels.sort_by(f64::total_cmp);
        zoom.levels.dedup();
        if zoom.levels.is_empty() {
            zoom.levels = vec![min, max];
            zoom.levels.dedup();
        }
    }
}
