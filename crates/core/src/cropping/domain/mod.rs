pub mod frame_cropper;
pub mod thumbnail_writer;
