//! Inkslate Render Library
//!
//! Surfaces the drawing engine paints onto. The CPU raster surface backs PNG
//! thumbnails; the Vello scene surface is available behind `vello-renderer`.

mod glyphs;
mod raster;
mod thumbnail;

#[cfg(feature = "vello-renderer")]
mod vello_impl;

pub use raster::RasterSurface;
pub use thumbnail::{PngThumbnailer, fit_transform};

#[cfg(feature = "vello-renderer")]
pub use vello_impl::SceneSurface;

use thiserror::Error;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Invalid surface size: {0}x{1}")]
    InvalidSize(u32, u32),
    #[error("PNG encoding failed: {0}")]
    Encode(String),
    #[error("Image error: {0}")]
    Image(String),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;
