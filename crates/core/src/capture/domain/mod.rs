pub mod capture_settings;
pub mod capture_status;
pub mod sample_buffer;
