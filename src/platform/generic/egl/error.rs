// eglctx/src/platform/generic/egl/error.rs
//
//! EGL error codes: their `WindowingApiError` counterparts and their names for log messages.

use crate::egl;
use crate::egl::types::{EGLenum, EGLint};
use crate::WindowingApiError;

static EGL_ERRORS: [(EGLenum, WindowingApiError, &str); 14] = [
    (egl::NOT_INITIALIZED, WindowingApiError::NotInitialized, "EGL_NOT_INITIALIZED"),
    (egl::BAD_ACCESS, WindowingApiError::BadAccess, "EGL_BAD_ACCESS"),
    (egl::BAD_ALLOC, WindowingApiError::BadAlloc, "EGL_BAD_ALLOC"),
    (egl::BAD_ATTRIBUTE, WindowingApiError::BadAttribute, "EGL_BAD_ATTRIBUTE"),
    (egl::BAD_CONFIG, WindowingApiError::BadConfig, "EGL_BAD_CONFIG"),
    (egl::BAD_CONTEXT, WindowingApiError::BadContext, "EGL_BAD_CONTEXT"),
    (egl::BAD_CURRENT_SURFACE, WindowingApiError::BadCurrentSurface, "EGL_BAD_CURRENT_SURFACE"),
    (egl::BAD_DISPLAY, WindowingApiError::BadDisplay, "EGL_BAD_DISPLAY"),
    (egl::BAD_MATCH, WindowingApiError::BadMatch, "EGL_BAD_MATCH"),
    (egl::BAD_NATIVE_PIXMAP, WindowingApiError::BadNativePixmap, "EGL_BAD_NATIVE_PIXMAP"),
    (egl::BAD_NATIVE_WINDOW, WindowingApiError::BadNativeWindow, "EGL_BAD_NATIVE_WINDOW"),
    (egl::BAD_PARAMETER, WindowingApiError::BadParameter, "EGL_BAD_PARAMETER"),
    (egl::BAD_SURFACE, WindowingApiError::BadSurface, "EGL_BAD_SURFACE"),
    (egl::CONTEXT_LOST, WindowingApiError::ContextLost, "EGL_CONTEXT_LOST"),
];

pub(crate) trait ToWindowingApiError {
    fn to_windowing_api_error(self) -> WindowingApiError;
}

impl ToWindowingApiError for EGLint {
    fn to_windowing_api_error(self) -> WindowingApiError {
        lookup(self).map_or(WindowingApiError::Failed, |&(_, error, _)| error)
    }
}

/// The token name of an EGL error code, e.g. `EGL_CONTEXT_LOST`.
pub(crate) fn egl_error_name(code: EGLint) -> &'static str {
    if code == egl::SUCCESS as EGLint {
        return "EGL_SUCCESS";
    }
    lookup(code).map_or("unknown EGL error", |&(_, _, name)| name)
}

fn lookup(code: EGLint) -> Option<&'static (EGLenum, WindowingApiError, &'static str)> {
    EGL_ERRORS.iter().find(|&&(egl_code, _, _)| egl_code as EGLint == code)
}
