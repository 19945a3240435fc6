pub mod camera;
pub mod capture;
pub mod config;
pub mod cropping;
pub mod detection;
pub mod pipeline;
pub mod recognition;
pub mod shared;

#[cfg(test)]
mod testing;
