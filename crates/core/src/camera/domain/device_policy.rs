use std::cmp::Ordering;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::shared::constants::{INFRARED_SENSOR_NAME, PRIMARY_CAMERA_NAME, SECONDARY_CAMERA_PATTERN};

/// A video-capture device as reported by enumeration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CameraDescriptor {
    /// Opaque platform identifier passed back to `open`.
    pub id: String,
    pub name: String,
}

impl CameraDescriptor {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Names that decide which camera an enrollment session uses.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DevicePolicy {
    /// Exact name of a sensor that must never be selected.
    pub infrared_sensor_name: String,
    /// Exact name of the preferred camera.
    pub primary_camera_name: String,
    /// Regular expression identifying fallback cameras.
    pub secondary_camera_pattern: String,
    /// Id (or part of one) of the camera picked last time.
    pub preferred_device_id: Option<String>,
}

impl Default for DevicePolicy {
    fn default() -> Self {
        Self {
            infrared_sensor_name: INFRARED_SENSOR_NAME.to_string(),
            primary_camera_name: PRIMARY_CAMERA_NAME.to_string(),
            secondary_camera_pattern: SECONDARY_CAMERA_PATTERN.to_string(),
            preferred_device_id: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Tier {
    Primary,
    Secondary,
    Other,
}

impl DevicePolicy {
    /// Orders devices for selection.
    ///
    /// The infrared sensor is dropped, the primary camera comes first, then
    /// names matching the secondary pattern sorted by name. Remaining
    /// devices keep their enumeration order; the ordering is deliberately
    /// coarse.
    pub fn rank_devices(&self, devices: &[CameraDescriptor]) -> Vec<CameraDescriptor> {
        let secondary = self.secondary_matcher();
        let tier = |device: &CameraDescriptor| {
            if device.name == self.primary_camera_name {
                Tier::Primary
            } else if secondary.as_ref().is_some_and(|re| re.is_match(&device.name)) {
                Tier::Secondary
            } else {
                Tier::Other
            }
        };

        let mut ranked: Vec<CameraDescriptor> = devices
            .iter()
            .filter(|d| d.name != self.infrared_sensor_name)
            .cloned()
            .collect();

        ranked.sort_by(|a, b| {
            let (ta, tb) = (tier(a), tier(b));
            match ta.cmp(&tb) {
                Ordering::Equal if ta == Tier::Secondary => a.name.cmp(&b.name),
                other => other,
            }
        });
        ranked
    }

    /// Picks the camera to open from an already ranked list.
    ///
    /// Without a remembered id the top-ranked device wins. A remembered id
    /// selects the first device whose id contains it; when none does the
    /// camera is treated as gone and nothing is selected.
    pub fn select_device<'a>(
        &self,
        ranked: &'a [CameraDescriptor],
    ) -> Option<&'a CameraDescriptor> {
        match self.preferred_device_id.as_deref() {
            None | Some("") => ranked.first(),
            Some(wanted) => {
                let found = ranked.iter().find(|d| d.id.contains(wanted));
                if found.is_none() {
                    log::warn!("Remembered camera {wanted} is not connected");
                }
                found
            }
        }
    }

    fn secondary_matcher(&self) -> Option<Regex> {
        if self.secondary_camera_pattern.is_empty() {
            return None;
        }
        match Regex::new(&self.secondary_camera_pattern) {
            Ok(re) => Some(re),
            Err(e) => {
                log::warn!(
                    "Ignoring invalid secondary camera pattern {:?}: {e}",
                    self.secondary_camera_pattern
                );
                None
            }
        }
    }
}
