pub mod camera_session;
pub mod domain;
pub mod infrastructure;
pub mod session_manager;
