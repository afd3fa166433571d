pub mod geometry;
pub mod stroke;
pub mod surface;
