/// Frame buffers.
pub mod backend;
/// CPU rasterizer.
pub mod cpu;
/// Pure per-pixel luminance programs.
pub mod field;
