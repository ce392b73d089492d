pub mod filters;
pub mod stroke;
