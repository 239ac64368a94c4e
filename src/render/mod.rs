//! Heat map frames and animations of gridded variables.

pub mod animation;
pub mod colormap;
pub mod error;
pub mod frame;
