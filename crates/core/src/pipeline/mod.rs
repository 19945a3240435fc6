pub mod enroll_face_use_case;
pub mod enrollment_observer;
pub mod infrastructure;
