// eglctx/src/platform/generic/egl/surface.rs
//
//! Drawables that contexts render into.

use crate::egl;
use crate::egl::types::{EGLConfig, EGLNativeWindowType, EGLSurface, EGLint};
use crate::{ColorSpace, SurfaceFormat};
use super::device::Device;

#[cfg(feature = "raw-window-handle-06")]
use crate::Error;

use std::ptr;
use std::rc::Rc;

/// Something that can hand a context a native EGL drawable.
pub trait NativeSurfaceProvider {
    /// Returns the EGL surface to render into, creating it for `egl_config` if needed.
    ///
    /// On failure the EGL error code is returned. `EGL_CONTEXT_LOST` tells the context that
    /// its device went away.
    fn acquire_drawable(&mut self, egl_config: EGLConfig) -> Result<EGLSurface, EGLint>;

    /// Drops the current drawable. The next `acquire_drawable()` creates a fresh one.
    fn invalidate(&mut self);

    /// The swap interval to apply once a context is current on this drawable. Negative values
    /// leave the driver's setting alone.
    fn requested_swap_interval(&self) -> EGLint;

    /// Called right before a context is made current on this drawable.
    fn about_to_make_current(&mut self) {}
}

/// An EGL window surface for a native window, created lazily on first use.
pub struct WindowSurface {
    device: Rc<Device>,
    native_window: EGLNativeWindowType,
    color_space: Option<ColorSpace>,
    swap_interval: EGLint,
    egl_surface: EGLSurface,
    egl_config: EGLConfig,
}

impl WindowSurface {
    /// Wraps `native_window`. The color space and swap interval are taken from `format`.
    pub fn new(device: &Rc<Device>, native_window: EGLNativeWindowType, format: &SurfaceFormat)
               -> WindowSurface {
        WindowSurface {
            device: device.clone(),
            native_window,
            color_space: format.color_space,
            swap_interval: format.swap_interval,
            egl_surface: egl::NO_SURFACE,
            egl_config: ptr::null(),
        }
    }

    /// Wraps the native window behind a `raw-window-handle` window handle.
    ///
    /// Win32, Xlib, Xcb and Android windows are accepted. Anything else, including Wayland
    /// surfaces (which need a `wl_egl_window`), yields `Error::IncompatibleNativeWidget`.
    #[cfg(feature = "raw-window-handle-06")]
    pub fn from_raw_window_handle(device: &Rc<Device>,
                                  handle: rwh_06::WindowHandle,
                                  format: &SurfaceFormat)
                                  -> Result<WindowSurface, Error> {
        use rwh_06::RawWindowHandle;

        let native_window = match handle.as_raw() {
            RawWindowHandle::Win32(handle) => handle.hwnd.get() as EGLNativeWindowType,
            RawWindowHandle::Xlib(handle) => handle.window as usize as EGLNativeWindowType,
            RawWindowHandle::Xcb(handle) => handle.window.get() as usize as EGLNativeWindowType,
            RawWindowHandle::AndroidNdk(handle) => {
                handle.a_native_window.as_ptr() as EGLNativeWindowType
            }
            _ => return Err(Error::IncompatibleNativeWidget),
        };
        Ok(WindowSurface::new(device, native_window, format))
    }

    #[inline]
    pub fn native_window(&self) -> EGLNativeWindowType {
        self.native_window
    }

    /// The EGL surface, or `EGL_NO_SURFACE` if none has been created yet.
    #[inline]
    pub fn egl_surface(&self) -> EGLSurface {
        self.egl_surface
    }

    /// Changes the swap interval requested from contexts made current on this surface.
    #[inline]
    pub fn set_swap_interval(&mut self, swap_interval: EGLint) {
        self.swap_interval = swap_interval;
    }
}

impl NativeSurfaceProvider for WindowSurface {
    fn acquire_drawable(&mut self, egl_config: EGLConfig) -> Result<EGLSurface, EGLint> {
        if self.egl_surface != egl::NO_SURFACE {
            if self.egl_config == egl_config {
                return Ok(self.egl_surface);
            }
            // A surface is tied to the config it was created with.
            self.invalidate();
        }

        let egl_surface = self.device.create_window_surface(self.native_window,
                                                            egl_config,
                                                            self.color_space)?;
        self.egl_surface = egl_surface;
        self.egl_config = egl_config;
        Ok(egl_surface)
    }

    fn invalidate(&mut self) {
        if self.egl_surface != egl::NO_SURFACE {
            self.device.destroy_surface(self.egl_surface);
            self.egl_surface = egl::NO_SURFACE;
        }
    }

    #[inline]
    fn requested_swap_interval(&self) -> EGLint {
        self.swap_interval
    }
}

impl Drop for WindowSurface {
    fn drop(&mut self) {
        self.invalidate();
    }
}
