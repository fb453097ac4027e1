// eglctx/src/platform/generic/egl/mod.rs
//
//! The EGL backend: driver loading, config negotiation and context management.

pub mod config;
pub mod context;
pub mod device;
pub mod driver;
pub(crate) mod error;
pub(crate) mod ffi;
pub mod loader;
pub mod surface;
