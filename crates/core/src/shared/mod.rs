pub mod cancel_token;
pub mod constants;
pub mod face_box;
pub mod face_sample;
pub mod frame;
pub mod model_resolver;
