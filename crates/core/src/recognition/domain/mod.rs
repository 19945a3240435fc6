pub mod engine_config;
pub mod enrollment_request;
pub mod error_record;
pub mod recognition_engine;
