use std::time::Duration;

/// IR face-authentication sensor exposed as a video device; never usable for enrollment.
pub const INFRARED_SENSOR_NAME: &str = "FJ IR Sensor";
pub const PRIMARY_CAMERA_NAME: &str = "FJ Camera";
/// Regex for the megapixel-rated cameras ("FJ 2M Camera", "FJ 8M Camera").
pub const SECONDARY_CAMERA_PATTERN: &str = "FJ .*M Camera";

/// Face samples collected before the enrollment request is submitted.
pub const DEFAULT_SAMPLE_COUNT: usize = 5;
pub const COUNTDOWN_FROM: u8 = 3;
pub const DEFAULT_STEP_DELAY: Duration = Duration::from_millis(1000);
/// Upper bound on capture actions when nobody is pressing the button.
pub const DEFAULT_MAX_ATTEMPTS: usize = 30;

pub const THUMBNAIL_SIZE: u32 = 128;

pub const DETECTOR_MODEL_NAME: &str = "models/seeta/seeta_fd_frontal_v1.0.bin";

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];

/// Directory name used under the platform config/data roots.
pub const APP_DIR_NAME: &str = "FaceEnroll";
