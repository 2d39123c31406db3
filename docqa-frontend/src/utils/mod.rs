pub mod media;
pub mod render;
