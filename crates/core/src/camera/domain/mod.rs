pub mod camera_device;
pub mod device_error;
pub mod device_policy;
pub mod stream_descriptor;
