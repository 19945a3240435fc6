pub mod capture_flow;
pub mod domain;
pub mod pacer;
