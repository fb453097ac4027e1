// eglctx/src/platform/generic/egl/context.rs
//
//! EGL rendering contexts and their lifecycle.

use crate::egl;
use crate::egl::types::{EGLConfig, EGLContext, EGLDisplay, EGLSurface, EGLenum, EGLint};
use crate::{Error, FormatOptions, GLVersion, Profile, RenderableType, SurfaceFormat};
use super::config::{format_from_config, ConfigChooser};
use super::device::Device;
use super::driver::EglDriver;
use super::error::{egl_error_name, ToWindowingApiError};
use super::surface::NativeSurfaceProvider;

use euclid::default::Size2D;
use std::ffi::CString;
use std::os::raw::c_void;
use std::ptr;
use std::rc::Rc;

// The newest OpenGL ES version that ANGLE supports fully.
const WELL_SUPPORTED_GLES_VERSION: GLVersion = GLVersion { major: 3, minor: 0 };

// Entry points that OpenGL ES 2 contexts only get through their ANGLE extension aliases.
const ANGLE_ALIASED_ENTRY_POINTS: [&str; 2] = ["glBlitFramebuffer",
                                               "glRenderbufferStorageMultisample"];

/// Where a context is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContextState {
    /// The context was created and hasn't been made current yet.
    Created,
    /// The context was last made current successfully.
    Current,
    /// The context was made not current.
    Unbound,
    /// The driver reported the context lost. It has to be recreated.
    Lost,
    /// The context was destroyed.
    Destroyed,
}

/// An EGL rendering context.
///
/// The context owns its native handle and destroys it when dropped. A share context is only
/// remembered by handle; it can be destroyed independently.
pub struct Context {
    device: Rc<Device>,
    egl_context: EGLContext,
    egl_config: EGLConfig,
    share_context: EGLContext,
    format: SurfaceFormat,
    api: EGLenum,
    swap_interval: EGLint,
    invalidated: bool,
    state: ContextState,
}

/// Saves the current display, surfaces and context, and makes them current again when dropped.
#[must_use]
pub(crate) struct CurrentContextGuard<'a> {
    driver: &'a dyn EglDriver,
    egl_display: EGLDisplay,
    old_egl_draw_surface: EGLSurface,
    old_egl_read_surface: EGLSurface,
    old_egl_context: EGLContext,
}

impl<'a> CurrentContextGuard<'a> {
    /// If nothing is current, `fallback_display` is used to restore that state.
    pub(crate) fn new(driver: &'a dyn EglDriver, fallback_display: EGLDisplay)
                      -> CurrentContextGuard<'a> {
        unsafe {
            let mut egl_display = driver.get_current_display();
            if egl_display == egl::NO_DISPLAY {
                egl_display = fallback_display;
            }
            CurrentContextGuard {
                driver,
                egl_display,
                old_egl_draw_surface: driver.get_current_surface(egl::DRAW as EGLint),
                old_egl_read_surface: driver.get_current_surface(egl::READ as EGLint),
                old_egl_context: driver.get_current_context(),
            }
        }
    }
}

impl<'a> Drop for CurrentContextGuard<'a> {
    fn drop(&mut self) {
        unsafe {
            self.driver.make_current(self.egl_display,
                                     self.old_egl_draw_surface,
                                     self.old_egl_read_surface,
                                     self.old_egl_context);
        }
    }
}

// A 1x1 pbuffer that is destroyed when dropped.
struct VersionQuerySurface<'a> {
    device: &'a Device,
    egl_surface: EGLSurface,
}

impl<'a> VersionQuerySurface<'a> {
    fn new(device: &'a Device, egl_config: EGLConfig) -> Option<VersionQuerySurface<'a>> {
        match device.create_pbuffer_surface(egl_config, &Size2D::new(1, 1)) {
            Ok(egl_surface) => Some(VersionQuerySurface { device, egl_surface }),
            Err(err) => {
                debug!("Could not create a pbuffer for the version check: {}",
                       egl_error_name(err));
                None
            }
        }
    }
}

impl<'a> Drop for VersionQuerySurface<'a> {
    fn drop(&mut self) {
        self.device.destroy_surface(self.egl_surface);
    }
}

impl Device {
    /// Chooses a config for `format` and creates a context with it.
    pub fn create_context(self: &Rc<Self>, format: &SurfaceFormat, share: Option<&Context>)
                          -> Result<Context, Error> {
        let egl_config = ConfigChooser::new(self).choose(format)?;
        Context::create(self, egl_config, format, share)
    }
}

impl Context {
    /// Creates a context for `egl_config`.
    ///
    /// Sharing with `share` is best effort: if the driver refuses, an unshared context is created
    /// instead and `is_sharing()` reports false. The context is then briefly made current on a
    /// 1x1 pbuffer to read the real GL version, which replaces the requested one in `format()`.
    /// Whatever was current before is current again when this returns.
    pub fn create(device: &Rc<Device>,
                  egl_config: EGLConfig,
                  format: &SurfaceFormat,
                  share: Option<&Context>)
                  -> Result<Context, Error> {
        let mut resolved_format = format_from_config(device, egl_config, format);
        resolved_format.major_version = format.major_version;
        resolved_format.minor_version = format.minor_version;

        let requested_version = GLVersion::new(clamp_version(format.major_version),
                                               clamp_version(format.minor_version));
        if requested_version > WELL_SUPPORTED_GLES_VERSION {
            warn!("OpenGL ES versions above 3.0 are only partially supported");
        }

        let api = match resolved_format.renderable_type {
            RenderableType::OpenGL => egl::OPENGL_API,
            RenderableType::OpenVG => egl::OPENVG_API,
            RenderableType::Default | RenderableType::OpenGLES => egl::OPENGL_ES_API,
        };

        let context_attributes = [
            egl::CONTEXT_MAJOR_VERSION as EGLint, format.major_version,
            egl::CONTEXT_MINOR_VERSION as EGLint, format.minor_version,
            egl::NONE as EGLint,
        ];

        let driver = device.driver();
        let egl_display = device.egl_display();
        let mut share_context = share.map_or(egl::NO_CONTEXT, |share| share.egl_context);

        unsafe {
            driver.bind_api(api);
            let mut egl_context = driver.create_context(egl_display,
                                                        egl_config,
                                                        share_context,
                                                        &context_attributes);
            if egl_context == egl::NO_CONTEXT && share_context != egl::NO_CONTEXT {
                debug!("Could not create a shared context, retrying without sharing");
                share_context = egl::NO_CONTEXT;
                egl_context = driver.create_context(egl_display,
                                                    egl_config,
                                                    egl::NO_CONTEXT,
                                                    &context_attributes);
            }

            if egl_context == egl::NO_CONTEXT {
                let err = driver.get_error();
                warn!("Failed to create an EGL context: {}", egl_error_name(err));
                // ANGLE reports this when it can't reset a previously lost D3D device, for
                // example because the adapter was disabled.
                if err == egl::BAD_ALLOC as EGLint {
                    warn!("Graphics device lost. (Did the adapter get disabled?)");
                }
                return Err(Error::ContextCreationFailed(err.to_windowing_api_error()));
            }

            let mut context = Context {
                device: device.clone(),
                egl_context,
                egl_config,
                share_context,
                format: resolved_format,
                api,
                swap_interval: -1,
                invalidated: false,
                state: ContextState::Created,
            };
            context.query_version();
            Ok(context)
        }
    }

    // Reads the real version from the driver. This needs the context to be current, which in
    // turn needs a surface.
    fn query_version(&mut self) {
        let device = &*self.device;
        let pbuffer = match VersionQuerySurface::new(device, self.egl_config) {
            Some(pbuffer) => pbuffer,
            None => return,
        };
        let _guard = CurrentContextGuard::new(device.driver(), device.egl_display());

        unsafe {
            if !device.driver().make_current(device.egl_display(),
                                             pbuffer.egl_surface,
                                             pbuffer.egl_surface,
                                             self.egl_context) {
                debug!("Could not make the context current to read its version: {}",
                       egl_error_name(device.driver().get_error()));
                return;
            }

            let version = device.driver()
                                .gl_version_string()
                                .and_then(|version_string| GLVersion::parse(&version_string));
            if let Some(version) = version {
                self.format.major_version = version.major as i32;
                self.format.minor_version = version.minor as i32;
            }
        }
        self.format.profile = Profile::NoProfile;
        self.format.options = FormatOptions::empty();
    }

    /// Makes this context current on the surface's drawable, for both drawing and reading.
    ///
    /// Nothing is rebound if the context and drawable are already current. After a successful
    /// bind, the surface's requested swap interval is applied if it changed.
    ///
    /// If the drawable can't be acquired the native context is destroyed, since it is useless
    /// without one, and the context becomes `Lost`. If binding fails because the context was
    /// lost, the context becomes `Lost` and the surface's drawable is dropped; the caller has to
    /// create a new context.
    pub fn make_current(&mut self, surface: &mut dyn NativeSurfaceProvider) -> Result<(), Error> {
        if self.egl_context == egl::NO_CONTEXT || self.invalidated {
            return Err(Error::ContextInvalid);
        }

        let device = self.device.clone();
        let driver = device.driver();
        let egl_display = device.egl_display();

        unsafe {
            driver.bind_api(self.api);

            surface.about_to_make_current();
            let egl_surface = match surface.acquire_drawable(self.egl_config) {
                Ok(egl_surface) => egl_surface,
                Err(err) => {
                    match err as EGLenum {
                        egl::CONTEXT_LOST => {
                            debug!("Got EGL context lost while acquiring the drawable");
                        }
                        egl::BAD_ACCESS => {
                            debug!("Bad access (missing device?) while acquiring the drawable");
                        }
                        egl::BAD_ATTRIBUTE => {
                            debug!("Bad attribute while acquiring the drawable");
                        }
                        _ => debug!("Could not acquire the drawable: {}", egl_error_name(err)),
                    }
                    self.destroy();
                    self.state = ContextState::Lost;
                    return Err(Error::MakeCurrentFailed(err.to_windowing_api_error()));
                }
            };

            // eglMakeCurrent isn't cheap on every GPU.
            if driver.get_current_context() == self.egl_context &&
                    driver.get_current_display() == egl_display &&
                    driver.get_current_surface(egl::READ as EGLint) == egl_surface &&
                    driver.get_current_surface(egl::DRAW as EGLint) == egl_surface {
                self.state = ContextState::Current;
                return Ok(());
            }

            if driver.make_current(egl_display, egl_surface, egl_surface, self.egl_context) {
                self.state = ContextState::Current;
                let requested_swap_interval = surface.requested_swap_interval();
                if requested_swap_interval >= 0 && requested_swap_interval != self.swap_interval {
                    self.swap_interval = requested_swap_interval;
                    driver.swap_interval(egl_display, requested_swap_interval);
                }
                return Ok(());
            }

            let err = driver.get_error();
            match err as EGLenum {
                egl::CONTEXT_LOST => {
                    debug!("Got EGL context lost in make_current()");
                    self.mark_lost();
                    // The drawable is recreated on the next make_current().
                    surface.invalidate();
                }
                egl::BAD_ACCESS | egl::BAD_MATCH => {
                    debug!("Failed to make the context current: {}", egl_error_name(err));
                }
                _ => warn!("Failed to make the context current: {}", egl_error_name(err)),
            }
            Err(Error::MakeCurrentFailed(err.to_windowing_api_error()))
        }
    }

    /// Releases whatever context is current on this thread.
    ///
    /// Failure is returned but doesn't affect the context's validity.
    pub fn done_current(&mut self) -> Result<(), Error> {
        let driver = self.device.driver();
        unsafe {
            driver.bind_api(self.api);
            if !driver.make_current(self.device.egl_display(),
                                    egl::NO_SURFACE,
                                    egl::NO_SURFACE,
                                    egl::NO_CONTEXT) {
                let err = driver.get_error();
                warn!("Failed to make no context current: {}", egl_error_name(err));
                return Err(Error::MakeCurrentFailed(err.to_windowing_api_error()));
            }
        }
        if self.state == ContextState::Current || self.state == ContextState::Created {
            self.state = ContextState::Unbound;
        }
        Ok(())
    }

    /// Presents the surface's drawable.
    pub fn swap_buffers(&mut self, surface: &mut dyn NativeSurfaceProvider) -> Result<(), Error> {
        if !self.is_valid() {
            return Err(Error::ContextInvalid);
        }

        let device = self.device.clone();
        let driver = device.driver();

        unsafe {
            driver.bind_api(self.api);

            let egl_surface = match surface.acquire_drawable(self.egl_config) {
                Ok(egl_surface) => egl_surface,
                Err(err) => {
                    if err == egl::CONTEXT_LOST as EGLint {
                        debug!("Got EGL context lost while acquiring the drawable to present");
                        self.mark_lost();
                    }
                    return Err(Error::PresentFailed(err.to_windowing_api_error()));
                }
            };

            if driver.swap_buffers(device.egl_display(), egl_surface) {
                return Ok(());
            }

            let err = driver.get_error();
            if err == egl::CONTEXT_LOST as EGLint {
                debug!("Got EGL context lost in swap_buffers()");
                self.mark_lost();
            } else {
                warn!("Failed to swap buffers: {}", egl_error_name(err));
            }
            Err(Error::PresentFailed(err.to_windowing_api_error()))
        }
    }

    /// Looks up a GL entry point for this context. Returns null if it can't be found.
    ///
    /// OpenGL ES 2 contexts get the ANGLE aliases of `glBlitFramebuffer` and
    /// `glRenderbufferStorageMultisample`, since the core entry points need ES 3. Entry points
    /// that `eglGetProcAddress` doesn't expose are looked up in the GLES module directly.
    pub fn get_proc_address(&self, symbol_name: &str) -> *const c_void {
        let driver = self.device.driver();
        unsafe {
            driver.bind_api(self.api);

            let mut address = ptr::null();
            if self.format.major_version < 3 && ANGLE_ALIASED_ENTRY_POINTS.contains(&symbol_name) {
                address = egl_get_proc_address(driver, &format!("{}ANGLE", symbol_name));
            }
            if address.is_null() {
                address = egl_get_proc_address(driver, symbol_name);
            }
            if address.is_null() {
                address = driver.resolve_gl_symbol(symbol_name);
            }

            trace!("get_proc_address({}) = {:?}", symbol_name, address);
            address
        }
    }

    /// Destroys the native context. Calling this again does nothing.
    pub fn destroy(&mut self) {
        if self.egl_context != egl::NO_CONTEXT {
            let driver = self.device.driver();
            let egl_display = self.device.egl_display();
            unsafe {
                if driver.get_current_context() == self.egl_context {
                    driver.make_current(egl_display,
                                        egl::NO_SURFACE,
                                        egl::NO_SURFACE,
                                        egl::NO_CONTEXT);
                }
                if !driver.destroy_context(egl_display, self.egl_context) {
                    debug!("eglDestroyContext() failed: {}", egl_error_name(driver.get_error()));
                }
            }
            self.egl_context = egl::NO_CONTEXT;
        }
        self.state = ContextState::Destroyed;
    }

    /// Whether the context can still be used.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.egl_context != egl::NO_CONTEXT && !self.invalidated
    }

    /// Marks the context as unusable, for example because the window it renders to lost its
    /// drawable.
    #[inline]
    pub fn invalidate_context(&mut self) {
        self.invalidated = true;
    }

    /// Whether the context was created sharing objects with another context.
    #[inline]
    pub fn is_sharing(&self) -> bool {
        self.share_context != egl::NO_CONTEXT
    }

    /// The format the context actually has.
    #[inline]
    pub fn format(&self) -> &SurfaceFormat {
        &self.format
    }

    #[inline]
    pub fn egl_config(&self) -> EGLConfig {
        self.egl_config
    }

    #[inline]
    pub fn egl_context(&self) -> EGLContext {
        self.egl_context
    }

    /// The handle of the context this one shares with, or `EGL_NO_CONTEXT`.
    #[inline]
    pub fn share_context(&self) -> EGLContext {
        self.share_context
    }

    #[inline]
    pub fn state(&self) -> ContextState {
        self.state
    }

    #[inline]
    pub fn device(&self) -> &Rc<Device> {
        &self.device
    }

    // A lost context still owns its native handle until it is destroyed.
    fn mark_lost(&mut self) {
        if self.egl_context != egl::NO_CONTEXT {
            let driver = self.device.driver();
            unsafe {
                if !driver.destroy_context(self.device.egl_display(), self.egl_context) {
                    // Drivers may refuse to destroy a lost context; the handle is gone either way.
                    driver.get_error();
                }
            }
        }
        self.egl_context = egl::NO_CONTEXT;
        self.state = ContextState::Lost;
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        self.destroy();
    }
}

unsafe fn egl_get_proc_address(driver: &dyn EglDriver, symbol_name: &str) -> *const c_void {
    match CString::new(symbol_name) {
        Ok(symbol_name) => driver.get_proc_address(&symbol_name),
        Err(_) => ptr::null(),
    }
}

fn clamp_version(version: i32) -> u8 {
    version.clamp(0, u8::MAX as i32) as u8
}
