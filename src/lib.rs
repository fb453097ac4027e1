// eglctx/src/lib.rs
//
//! Runtime EGL loading, configuration negotiation and context lifecycle management.
//!
//! This crate sits between a toolkit's cross-platform graphics API and a platform EGL
//! implementation such as ANGLE. The EGL and GLES libraries are never linked at build time:
//! every entry point is resolved by name when the driver is loaded. On top of that binding the
//! crate translates a partially specified `SurfaceFormat` into a concrete `EGLConfig`, relaxing
//! the request step by step when the driver has no exact match, and manages EGL contexts through
//! creation, binding, loss detection, presentation and destruction.
//!
//! The driver is always reached through the `EglDriver` trait, so everything above the loader can
//! run against a mock implementation.

#[macro_use]
extern crate log;

pub mod platform;
pub use platform::generic::egl::config::{ConfigAttrib, ConfigAttributes, ConfigChooser};
pub use platform::generic::egl::context::{Context, ContextState};
pub use platform::generic::egl::device::Device;
pub use platform::generic::egl::driver::EglDriver;
pub use platform::generic::egl::loader::{EglLibrary, LibraryNames, ModuleHandle};
pub use platform::generic::egl::loader::{SymbolResolver, SystemResolver};
pub use platform::generic::egl::surface::{NativeSurfaceProvider, WindowSurface};

pub mod error;
pub use crate::error::{Error, WindowingApiError};

mod format;
pub use crate::format::{ColorPrimaries, ColorSpace, FormatOptions, Profile};
pub use crate::format::{RenderableType, SurfaceFormat, TransferFunction};

mod info;
pub use crate::info::{GLApi, GLVersion};

mod renderer;
pub use crate::renderer::Renderer;

/// Raw EGL 1.5 bindings generated at build time.
#[allow(non_camel_case_types, non_snake_case, non_upper_case_globals)]
#[allow(clippy::all, missing_docs)]
pub mod egl {
    use std::os::raw::{c_long, c_void};
    pub type khronos_utime_nanoseconds_t = khronos_uint64_t;
    pub type khronos_uint64_t = u64;
    pub type khronos_ssize_t = c_long;
    pub type EGLint = i32;
    pub type EGLNativeDisplayType = *const c_void;
    pub type EGLNativePixmapType = *const c_void;
    pub type EGLNativeWindowType = *const c_void;
    pub type NativeDisplayType = EGLNativeDisplayType;
    pub type NativePixmapType = EGLNativePixmapType;
    pub type NativeWindowType = EGLNativeWindowType;
    include!(concat!(env!("OUT_DIR"), "/egl_bindings.rs"));
}

#[cfg(test)]
mod tests;
