pub mod png_thumbnail_writer;
