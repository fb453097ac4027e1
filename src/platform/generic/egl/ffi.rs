// eglctx/src/platform/generic/egl/ffi.rs
//
//! FFI-related functionality not covered by the core EGL 1.5 registry.

use crate::egl::types::{EGLDisplay, EGLenum, EGLint};

use std::os::raw::{c_char, c_uint, c_void};

// EGL_ANGLE_platform_angle and friends
pub const EGL_PLATFORM_ANGLE_ANGLE: EGLenum = 0x3202;
pub const EGL_PLATFORM_ANGLE_TYPE_ANGLE: EGLint = 0x3203;
pub const EGL_PLATFORM_ANGLE_TYPE_D3D9_ANGLE: EGLint = 0x3207;
pub const EGL_PLATFORM_ANGLE_TYPE_D3D11_ANGLE: EGLint = 0x3208;
pub const EGL_PLATFORM_ANGLE_DEVICE_TYPE_ANGLE: EGLint = 0x3209;
pub const EGL_PLATFORM_ANGLE_DEVICE_TYPE_D3D_WARP_ANGLE: EGLint = 0x320b;
pub const EGL_PLATFORM_ANGLE_TYPE_OPENGL_ANGLE: EGLint = 0x320d;
pub const EGL_PLATFORM_ANGLE_D3D11ON12_ANGLE: EGLint = 0x3488;

// EGL_KHR_gl_colorspace and its EXT extensions
pub const EGL_GL_COLORSPACE_KHR: EGLint = 0x309d;
pub const EGL_GL_COLORSPACE_SRGB_KHR: EGLint = 0x3089;
pub const EGL_GL_COLORSPACE_LINEAR_KHR: EGLint = 0x308a;
pub const EGL_GL_COLORSPACE_BT2020_PQ_EXT: EGLint = 0x3340;
pub const EGL_GL_COLORSPACE_SCRGB_LINEAR_EXT: EGLint = 0x3350;

// EGL_EXT_pixel_format_float
pub const EGL_COLOR_COMPONENT_TYPE_EXT: EGLint = 0x3339;
pub const EGL_COLOR_COMPONENT_TYPE_FLOAT_EXT: EGLint = 0x333b;

pub const GL_VERSION: c_uint = 0x1f02;

pub(crate) type EGLGetPlatformDisplayEXTFn = unsafe extern "system" fn(
    platform: EGLenum,
    native_display: *mut c_void,
    attrib_list: *const EGLint,
) -> EGLDisplay;

pub(crate) type EGLGetProcAddressFn =
    unsafe extern "system" fn(procname: *const c_char) -> *const c_void;

pub(crate) type GLGetStringFn = unsafe extern "system" fn(name: c_uint) -> *const u8;
