//! Swell - GPU orbital-wave ocean surface simulation
//!
//! The simulation accumulates N orbital wave trains into a pair of
//! floating-point field textures (displaced position + packed normal) with
//! one additive full-screen pass per wave, then renders a flat unit-square
//! point grid whose vertices are placed by sampling those textures.

pub mod camera;
pub mod displacement;
pub mod gpu;
pub mod interp;
pub mod lookup;
pub mod mesh;
pub mod params;
pub mod render;
