// eglctx/src/platform/generic/egl/driver.rs
//
//! The typed call surface of an EGL driver.

use crate::egl;
use crate::egl::types::{EGLConfig, EGLContext, EGLDisplay, EGLNativeDisplayType};
use crate::egl::types::{EGLNativeWindowType, EGLSurface, EGLenum, EGLint};
use crate::GLApi;
use super::ffi::GL_VERSION;
use super::loader::EglLibrary;

use std::ffi::CStr;
use std::os::raw::{c_char, c_void};
use std::ptr;

/// One method per driver entry point used by this crate.
///
/// `EglLibrary` implements this on top of the dynamically loaded driver. Everything above the
/// loader talks to the driver through this trait, so it can run against a mock.
///
/// Attribute slices must already be terminated with `EGL_NONE`.
///
/// # Safety
///
/// The methods call straight into the driver. Handles passed in must have been produced by the
/// same driver and must not have been destroyed.
#[allow(missing_docs)]
pub trait EglDriver {
    unsafe fn get_error(&self) -> EGLint;
    unsafe fn get_display(&self, native_display: EGLNativeDisplayType) -> EGLDisplay;
    /// Whether `get_platform_display()` is backed by `eglGetPlatformDisplayEXT`.
    fn has_platform_display(&self) -> bool;
    /// Returns `EGL_NO_DISPLAY` when the extension isn't available.
    unsafe fn get_platform_display(&self,
                                   platform: EGLenum,
                                   native_display: *mut c_void,
                                   attributes: &[EGLint])
                                   -> EGLDisplay;
    unsafe fn initialize(&self, display: EGLDisplay, major: &mut EGLint, minor: &mut EGLint)
                         -> bool;
    unsafe fn terminate(&self, display: EGLDisplay) -> bool;
    unsafe fn query_string(&self, display: EGLDisplay, name: EGLint) -> Option<String>;
    /// With an empty `configs` slice only the number of matching configs is returned.
    unsafe fn choose_config(&self,
                            display: EGLDisplay,
                            attributes: &[EGLint],
                            configs: &mut [EGLConfig],
                            config_count: &mut EGLint)
                            -> bool;
    unsafe fn get_config_attrib(&self, display: EGLDisplay, config: EGLConfig, attribute: EGLint)
                                -> Option<EGLint>;
    unsafe fn create_window_surface(&self,
                                    display: EGLDisplay,
                                    config: EGLConfig,
                                    native_window: EGLNativeWindowType,
                                    attributes: &[EGLint])
                                    -> EGLSurface;
    unsafe fn create_pbuffer_surface(&self,
                                     display: EGLDisplay,
                                     config: EGLConfig,
                                     attributes: &[EGLint])
                                     -> EGLSurface;
    unsafe fn destroy_surface(&self, display: EGLDisplay, surface: EGLSurface) -> bool;
    unsafe fn bind_api(&self, api: EGLenum) -> bool;
    unsafe fn swap_interval(&self, display: EGLDisplay, interval: EGLint) -> bool;
    unsafe fn create_context(&self,
                             display: EGLDisplay,
                             config: EGLConfig,
                             share_context: EGLContext,
                             attributes: &[EGLint])
                             -> EGLContext;
    unsafe fn destroy_context(&self, display: EGLDisplay, context: EGLContext) -> bool;
    unsafe fn make_current(&self,
                           display: EGLDisplay,
                           draw: EGLSurface,
                           read: EGLSurface,
                           context: EGLContext)
                           -> bool;
    unsafe fn get_current_context(&self) -> EGLContext;
    unsafe fn get_current_surface(&self, which: EGLint) -> EGLSurface;
    unsafe fn get_current_display(&self) -> EGLDisplay;
    unsafe fn swap_buffers(&self, display: EGLDisplay, surface: EGLSurface) -> bool;
    unsafe fn get_proc_address(&self, name: &CStr) -> *const c_void;

    /// `glGetString(GL_VERSION)` from the GLES module, for the context that is current.
    unsafe fn gl_version_string(&self) -> Option<String>;
    /// Looks a symbol up directly in the GLES module.
    fn resolve_gl_symbol(&self, name: &str) -> *const c_void;
    /// Which flavor of GL the loaded GPU module provides.
    fn module_api(&self) -> GLApi;
}

macro_rules! with_egl {
    ($library:expr, $fallback:expr, |$egl:ident| $body:expr) => {
        match $library.egl {
            Some(ref $egl) => $body,
            None => $fallback,
        }
    };
}

impl EglDriver for EglLibrary {
    unsafe fn get_error(&self) -> EGLint {
        with_egl!(self, egl::NOT_INITIALIZED as EGLint, |egl| egl.GetError())
    }

    unsafe fn get_display(&self, native_display: EGLNativeDisplayType) -> EGLDisplay {
        with_egl!(self, egl::NO_DISPLAY, |egl| egl.GetDisplay(native_display))
    }

    #[inline]
    fn has_platform_display(&self) -> bool {
        EglLibrary::has_platform_display(self)
    }

    unsafe fn get_platform_display(&self,
                                   platform: EGLenum,
                                   native_display: *mut c_void,
                                   attributes: &[EGLint])
                                   -> EGLDisplay {
        match self.get_platform_display_ext {
            Some(get_platform_display) => {
                get_platform_display(platform, native_display, attributes.as_ptr())
            }
            None => egl::NO_DISPLAY,
        }
    }

    unsafe fn initialize(&self, display: EGLDisplay, major: &mut EGLint, minor: &mut EGLint)
                         -> bool {
        with_egl!(self, false, |egl| egl.Initialize(display, major, minor) != egl::FALSE)
    }

    unsafe fn terminate(&self, display: EGLDisplay) -> bool {
        with_egl!(self, false, |egl| egl.Terminate(display) != egl::FALSE)
    }

    unsafe fn query_string(&self, display: EGLDisplay, name: EGLint) -> Option<String> {
        with_egl!(self, None, |egl| {
            let string = egl.QueryString(display, name);
            if string.is_null() {
                None
            } else {
                Some(CStr::from_ptr(string).to_string_lossy().into_owned())
            }
        })
    }

    unsafe fn choose_config(&self,
                            display: EGLDisplay,
                            attributes: &[EGLint],
                            configs: &mut [EGLConfig],
                            config_count: &mut EGLint)
                            -> bool {
        let configs_ptr = if configs.is_empty() { ptr::null_mut() } else { configs.as_mut_ptr() };
        with_egl!(self, false, |egl| {
            egl.ChooseConfig(display,
                             attributes.as_ptr(),
                             configs_ptr,
                             configs.len() as EGLint,
                             config_count) != egl::FALSE
        })
    }

    unsafe fn get_config_attrib(&self, display: EGLDisplay, config: EGLConfig, attribute: EGLint)
                                -> Option<EGLint> {
        with_egl!(self, None, |egl| {
            let mut value = 0;
            if egl.GetConfigAttrib(display, config, attribute, &mut value) == egl::FALSE {
                None
            } else {
                Some(value)
            }
        })
    }

    unsafe fn create_window_surface(&self,
                                    display: EGLDisplay,
                                    config: EGLConfig,
                                    native_window: EGLNativeWindowType,
                                    attributes: &[EGLint])
                                    -> EGLSurface {
        with_egl!(self, egl::NO_SURFACE, |egl| {
            egl.CreateWindowSurface(display, config, native_window, attributes.as_ptr())
        })
    }

    unsafe fn create_pbuffer_surface(&self,
                                     display: EGLDisplay,
                                     config: EGLConfig,
                                     attributes: &[EGLint])
                                     -> EGLSurface {
        with_egl!(self, egl::NO_SURFACE, |egl| {
            egl.CreatePbufferSurface(display, config, attributes.as_ptr())
        })
    }

    unsafe fn destroy_surface(&self, display: EGLDisplay, surface: EGLSurface) -> bool {
        with_egl!(self, false, |egl| egl.DestroySurface(display, surface) != egl::FALSE)
    }

    unsafe fn bind_api(&self, api: EGLenum) -> bool {
        with_egl!(self, false, |egl| egl.BindAPI(api) != egl::FALSE)
    }

    unsafe fn swap_interval(&self, display: EGLDisplay, interval: EGLint) -> bool {
        with_egl!(self, false, |egl| egl.SwapInterval(display, interval) != egl::FALSE)
    }

    unsafe fn create_context(&self,
                             display: EGLDisplay,
                             config: EGLConfig,
                             share_context: EGLContext,
                             attributes: &[EGLint])
                             -> EGLContext {
        with_egl!(self, egl::NO_CONTEXT, |egl| {
            egl.CreateContext(display, config, share_context, attributes.as_ptr())
        })
    }

    unsafe fn destroy_context(&self, display: EGLDisplay, context: EGLContext) -> bool {
        with_egl!(self, false, |egl| egl.DestroyContext(display, context) != egl::FALSE)
    }

    unsafe fn make_current(&self,
                           display: EGLDisplay,
                           draw: EGLSurface,
                           read: EGLSurface,
                           context: EGLContext)
                           -> bool {
        with_egl!(self, false, |egl| egl.MakeCurrent(display, draw, read, context) != egl::FALSE)
    }

    unsafe fn get_current_context(&self) -> EGLContext {
        with_egl!(self, egl::NO_CONTEXT, |egl| egl.GetCurrentContext())
    }

    unsafe fn get_current_surface(&self, which: EGLint) -> EGLSurface {
        with_egl!(self, egl::NO_SURFACE, |egl| egl.GetCurrentSurface(which))
    }

    unsafe fn get_current_display(&self) -> EGLDisplay {
        with_egl!(self, egl::NO_DISPLAY, |egl| egl.GetCurrentDisplay())
    }

    unsafe fn swap_buffers(&self, display: EGLDisplay, surface: EGLSurface) -> bool {
        with_egl!(self, false, |egl| egl.SwapBuffers(display, surface) != egl::FALSE)
    }

    unsafe fn get_proc_address(&self, name: &CStr) -> *const c_void {
        match self.get_proc_address {
            Some(get_proc_address) => get_proc_address(name.as_ptr()),
            None => ptr::null(),
        }
    }

    unsafe fn gl_version_string(&self) -> Option<String> {
        let get_string = self.gl_get_string?;
        let version = get_string(GL_VERSION);
        if version.is_null() {
            return None;
        }
        Some(CStr::from_ptr(version as *const c_char).to_string_lossy().into_owned())
    }

    #[inline]
    fn resolve_gl_symbol(&self, name: &str) -> *const c_void {
        self.resolve_gl(name)
    }

    #[inline]
    fn module_api(&self) -> GLApi {
        GLApi::GLES
    }
}
