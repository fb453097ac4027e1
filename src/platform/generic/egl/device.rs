// eglctx/src/platform/generic/egl/device.rs
//
//! A connection to an EGL display.

use crate::egl;
use crate::egl::types::{EGLConfig, EGLDisplay, EGLNativeDisplayType, EGLNativeWindowType};
use crate::egl::types::{EGLSurface, EGLint};
use crate::{ColorPrimaries, ColorSpace, Error, GLApi, Renderer, TransferFunction};
use super::config::extension_list_contains;
use super::driver::EglDriver;
use super::error::{egl_error_name, ToWindowingApiError};
use super::ffi::{EGL_GL_COLORSPACE_BT2020_PQ_EXT, EGL_GL_COLORSPACE_KHR};
use super::ffi::{EGL_GL_COLORSPACE_LINEAR_KHR, EGL_GL_COLORSPACE_SCRGB_LINEAR_EXT};
use super::ffi::{EGL_GL_COLORSPACE_SRGB_KHR, EGL_PLATFORM_ANGLE_ANGLE};
use super::ffi::{EGL_PLATFORM_ANGLE_D3D11ON12_ANGLE, EGL_PLATFORM_ANGLE_DEVICE_TYPE_ANGLE};
use super::ffi::{EGL_PLATFORM_ANGLE_DEVICE_TYPE_D3D_WARP_ANGLE, EGL_PLATFORM_ANGLE_TYPE_ANGLE};
use super::ffi::{EGL_PLATFORM_ANGLE_TYPE_D3D11_ANGLE, EGL_PLATFORM_ANGLE_TYPE_D3D9_ANGLE};
use super::ffi::EGL_PLATFORM_ANGLE_TYPE_OPENGL_ANGLE;

use euclid::default::Size2D;
use std::fmt::{self, Debug, Formatter};
use std::os::raw::c_void;
use std::sync::Arc;

static ANGLE_D3D11_ATTRIBUTES: [EGLint; 3] = [
    EGL_PLATFORM_ANGLE_TYPE_ANGLE, EGL_PLATFORM_ANGLE_TYPE_D3D11_ANGLE,
    egl::NONE as EGLint,
];
static ANGLE_D3D9_ATTRIBUTES: [EGLint; 3] = [
    EGL_PLATFORM_ANGLE_TYPE_ANGLE, EGL_PLATFORM_ANGLE_TYPE_D3D9_ANGLE,
    egl::NONE as EGLint,
];
static ANGLE_D3D11_WARP_ATTRIBUTES: [EGLint; 5] = [
    EGL_PLATFORM_ANGLE_TYPE_ANGLE, EGL_PLATFORM_ANGLE_TYPE_D3D11_ANGLE,
    EGL_PLATFORM_ANGLE_DEVICE_TYPE_ANGLE, EGL_PLATFORM_ANGLE_DEVICE_TYPE_D3D_WARP_ANGLE,
    egl::NONE as EGLint,
];
static ANGLE_D3D11_ON_12_ATTRIBUTES: [EGLint; 5] = [
    EGL_PLATFORM_ANGLE_TYPE_ANGLE, EGL_PLATFORM_ANGLE_TYPE_D3D11_ANGLE,
    EGL_PLATFORM_ANGLE_D3D11ON12_ANGLE, egl::TRUE as EGLint,
    egl::NONE as EGLint,
];
static ANGLE_OPENGL_ATTRIBUTES: [EGLint; 3] = [
    EGL_PLATFORM_ANGLE_TYPE_ANGLE, EGL_PLATFORM_ANGLE_TYPE_OPENGL_ANGLE,
    egl::NONE as EGLint,
];

/// An initialized EGL display.
///
/// The display is terminated when the device is dropped. Contexts keep their device alive
/// through an `Rc`, so the display always outlives them.
pub struct Device {
    driver: Arc<dyn EglDriver>,
    egl_display: EGLDisplay,
    egl_version: (EGLint, EGLint),
    color_space_support: ColorSpaceSupport,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct ColorSpaceSupport {
    gl_colorspace: bool,
    scrgb_linear: bool,
    bt2020_pq: bool,
    pixel_format_float: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum AngleDisplay {
    NotRequested,
    Initialized { egl_display: EGLDisplay, major: EGLint, minor: EGLint },
    Failed,
}

impl Debug for Device {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        formatter.debug_struct("Device")
                 .field("egl_display", &self.egl_display)
                 .field("egl_version", &self.egl_version)
                 .finish()
    }
}

impl Device {
    /// Opens and initializes the EGL display for `native_display`.
    ///
    /// When the driver supports `eglGetPlatformDisplayEXT` and `preferred` names an ANGLE
    /// backend, that backend is tried first. If Direct3D 11 was requested and fails to
    /// initialize, the remaining backends in `preferred` are tried once more without it.
    pub fn new(driver: Arc<dyn EglDriver>,
               native_display: EGLNativeDisplayType,
               preferred: Renderer)
               -> Result<Device, Error> {
        let mut angle_display = initialize_angle(&*driver, native_display, preferred);
        if angle_display == AngleDisplay::Failed && preferred.contains(Renderer::ANGLE_D3D11) {
            angle_display = initialize_angle(&*driver,
                                             native_display,
                                             preferred - Renderer::ANGLE_D3D11);
        }

        unsafe {
            let (egl_display, egl_version) = match angle_display {
                AngleDisplay::Initialized { egl_display, major, minor } => {
                    (egl_display, Some((major, minor)))
                }
                AngleDisplay::NotRequested | AngleDisplay::Failed => {
                    (driver.get_display(native_display), None)
                }
            };
            if egl_display == egl::NO_DISPLAY {
                warn!("Could not obtain an EGL display");
                return Err(Error::DeviceOpenFailed);
            }

            let egl_version = match egl_version {
                Some(egl_version) => egl_version,
                None => {
                    let (mut major, mut minor) = (0, 0);
                    if !driver.initialize(egl_display, &mut major, &mut minor) {
                        let err = driver.get_error();
                        warn!("Could not initialize the EGL display: {}", egl_error_name(err));
                        if err == egl::NOT_INITIALIZED as EGLint {
                            warn!("When using ANGLE, check that d3dcompiler_4x.dll is available");
                        }
                        return Err(Error::DeviceInitializationFailed(err.to_windowing_api_error()));
                    }
                    (major, minor)
                }
            };

            let extensions = driver.query_string(egl_display, egl::EXTENSIONS as EGLint)
                                   .unwrap_or_default();
            let color_space_support = ColorSpaceSupport {
                gl_colorspace: extension_list_contains(&extensions, "EGL_KHR_gl_colorspace"),
                scrgb_linear: extension_list_contains(&extensions,
                                                      "EGL_EXT_gl_colorspace_scrgb_linear"),
                bt2020_pq: extension_list_contains(&extensions, "EGL_EXT_gl_colorspace_bt2020_pq"),
                pixel_format_float: extension_list_contains(&extensions,
                                                            "EGL_EXT_pixel_format_float"),
            };

            debug!("Created EGL display {:?} v{}.{}", egl_display, egl_version.0, egl_version.1);
            Ok(Device { driver, egl_display, egl_version, color_space_support })
        }
    }

    /// The driver this device was opened with.
    #[inline]
    pub fn driver(&self) -> &dyn EglDriver {
        &*self.driver
    }

    #[inline]
    pub fn egl_display(&self) -> EGLDisplay {
        self.egl_display
    }

    /// The EGL version reported when the display was initialized, as `(major, minor)`.
    #[inline]
    pub fn egl_version(&self) -> (EGLint, EGLint) {
        self.egl_version
    }

    /// Which flavor of GL the loaded GPU module provides.
    #[inline]
    pub fn module_api(&self) -> GLApi {
        self.driver.module_api()
    }

    /// Whether the display can create window surfaces in the given color space.
    pub fn supports_color_space(&self, primaries: ColorPrimaries, transfer: TransferFunction)
                                -> bool {
        let support = &self.color_space_support;
        match (primaries, transfer) {
            (ColorPrimaries::SRgb, TransferFunction::SRgb) |
            (ColorPrimaries::SRgb, TransferFunction::Linear) => support.gl_colorspace,
            (ColorPrimaries::ScRgb, TransferFunction::Linear) => {
                support.gl_colorspace && support.scrgb_linear && support.pixel_format_float
            }
            (ColorPrimaries::Bt2020, TransferFunction::St2084) => {
                support.gl_colorspace && support.bt2020_pq
            }
            _ => false,
        }
    }

    /// Creates a window surface for `native_window`.
    ///
    /// A color space is only requested from the driver if the display supports it. On failure
    /// the EGL error code is returned.
    pub fn create_window_surface(&self,
                                 native_window: EGLNativeWindowType,
                                 egl_config: EGLConfig,
                                 color_space: Option<ColorSpace>)
                                 -> Result<EGLSurface, EGLint> {
        let mut attributes = vec![];
        if let Some(color_space) = color_space {
            match self.color_space_attribute(color_space) {
                Some(value) => attributes.extend_from_slice(&[EGL_GL_COLORSPACE_KHR, value]),
                None => debug!("Color space {:?} isn't supported, using the default", color_space),
            }
        }
        attributes.push(egl::NONE as EGLint);

        unsafe {
            let egl_surface = self.driver.create_window_surface(self.egl_display,
                                                                egl_config,
                                                                native_window,
                                                                &attributes);
            if egl_surface == egl::NO_SURFACE {
                let err = self.driver.get_error();
                warn!("Could not create the EGL window surface: {}", egl_error_name(err));
                return Err(err);
            }
            Ok(egl_surface)
        }
    }

    /// Creates an offscreen pbuffer surface of exactly `size`.
    ///
    /// On failure the EGL error code is returned.
    pub fn create_pbuffer_surface(&self, egl_config: EGLConfig, size: &Size2D<i32>)
                                  -> Result<EGLSurface, EGLint> {
        let attributes = [
            egl::WIDTH as EGLint,           size.width,
            egl::HEIGHT as EGLint,          size.height,
            egl::LARGEST_PBUFFER as EGLint, egl::FALSE as EGLint,
            egl::NONE as EGLint,
        ];
        unsafe {
            let egl_surface = self.driver.create_pbuffer_surface(self.egl_display,
                                                                 egl_config,
                                                                 &attributes);
            if egl_surface == egl::NO_SURFACE {
                return Err(self.driver.get_error());
            }
            Ok(egl_surface)
        }
    }

    /// Destroys a surface created by `create_window_surface()` or `create_pbuffer_surface()`.
    pub fn destroy_surface(&self, egl_surface: EGLSurface) {
        unsafe {
            if !self.driver.destroy_surface(self.egl_display, egl_surface) {
                debug!("eglDestroySurface({:?}) failed: {}",
                       egl_surface,
                       egl_error_name(self.driver.get_error()));
            }
        }
    }

    fn color_space_attribute(&self, color_space: ColorSpace) -> Option<EGLint> {
        if !self.supports_color_space(color_space.primaries, color_space.transfer) {
            return None;
        }
        match (color_space.primaries, color_space.transfer) {
            (ColorPrimaries::SRgb, TransferFunction::SRgb) => Some(EGL_GL_COLORSPACE_SRGB_KHR),
            (ColorPrimaries::SRgb, TransferFunction::Linear) => Some(EGL_GL_COLORSPACE_LINEAR_KHR),
            (ColorPrimaries::ScRgb, _) => Some(EGL_GL_COLORSPACE_SCRGB_LINEAR_EXT),
            (ColorPrimaries::Bt2020, _) => Some(EGL_GL_COLORSPACE_BT2020_PQ_EXT),
            _ => None,
        }
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        debug!("Releasing EGL display {:?}", self.egl_display);
        unsafe {
            self.driver.terminate(self.egl_display);
        }
    }
}

fn angle_platform_attributes(preferred: Renderer) -> Option<&'static [EGLint]> {
    if preferred.contains(Renderer::ANGLE_D3D11) {
        Some(&ANGLE_D3D11_ATTRIBUTES)
    } else if preferred.contains(Renderer::ANGLE_D3D9) {
        Some(&ANGLE_D3D9_ATTRIBUTES)
    } else if preferred.contains(Renderer::ANGLE_D3D11_WARP) {
        Some(&ANGLE_D3D11_WARP_ATTRIBUTES)
    } else if preferred.contains(Renderer::ANGLE_D3D11_ON_12) {
        Some(&ANGLE_D3D11_ON_12_ATTRIBUTES)
    } else if preferred.contains(Renderer::ANGLE_OPENGL) {
        Some(&ANGLE_OPENGL_ATTRIBUTES)
    } else {
        None
    }
}

fn initialize_angle(driver: &dyn EglDriver,
                    native_display: EGLNativeDisplayType,
                    preferred: Renderer)
                    -> AngleDisplay {
    if !driver.has_platform_display() {
        return AngleDisplay::NotRequested;
    }
    let attributes = match angle_platform_attributes(preferred) {
        Some(attributes) => attributes,
        None => return AngleDisplay::NotRequested,
    };

    unsafe {
        let egl_display = driver.get_platform_display(EGL_PLATFORM_ANGLE_ANGLE,
                                                      native_display as *mut c_void,
                                                      attributes);
        let (mut major, mut minor) = (0, 0);
        if !driver.initialize(egl_display, &mut major, &mut minor) {
            warn!("Unable to initialize ANGLE: {}", egl_error_name(driver.get_error()));
            driver.terminate(egl_display);
            return AngleDisplay::Failed;
        }
        AngleDisplay::Initialized { egl_display, major, minor }
    }
}
