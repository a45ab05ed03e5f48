/// Output surface contract and the in-memory capture surface.
pub mod surface;
