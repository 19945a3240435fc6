pub mod file_gallery_engine;
