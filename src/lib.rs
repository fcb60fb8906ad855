//! Two small rendering demos built on gfx-hal: a textured cube turned with the
//! arrow keys and a triangle spinning in the plane.
//!
//! The binaries under `src/bin` only wire things together; geometry, rotation
//! matrices and the input handling live here so they can be tested without a
//! window.

#[cfg(feature = "dx11")]
pub extern crate gfx_backend_dx11 as back;
#[cfg(feature = "dx12")]
pub extern crate gfx_backend_dx12 as back;
#[cfg(not(any(
    feature = "vulkan",
    feature = "dx11",
    feature = "dx12",
    feature = "metal",
    feature = "gl",
)))]
pub extern crate gfx_backend_empty as back;
#[cfg(feature = "gl")]
pub extern crate gfx_backend_gl as back;
#[cfg(feature = "metal")]
pub extern crate gfx_backend_metal as back;
#[cfg(feature = "vulkan")]
pub extern crate gfx_backend_vulkan as back;

pub mod app;
pub mod config;
pub mod context;
pub mod controls;
pub mod entities;
pub mod error;
mod guard;
pub mod pipelines;
pub mod renderer;
pub mod texture;
pub mod transforms;

pub use error::{DemoError, Result};

/// The gfx-hal backend picked by cargo features.
pub type Backend = back::Backend;

/// True when no real backend feature is enabled and nothing will be drawn.
pub const EMPTY_BACKEND: bool = cfg!(not(any(
    feature = "vulkan",
    feature = "dx11",
    feature = "dx12",
    feature = "metal",
    feature = "gl",
)));
