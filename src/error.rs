// eglctx/src/error.rs
//
//! Various errors that methods can produce.

/// Various errors that methods can produce.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Error {
    /// The EGL or GLES library couldn't be located or loaded.
    NoGLLibraryFound,
    /// A mandatory entry point couldn't be resolved from the loaded library.
    GLFunctionNotFound,
    /// No EGL display could be obtained for the native display.
    DeviceOpenFailed,
    /// The EGL display was obtained but couldn't be initialized.
    DeviceInitializationFailed(WindowingApiError),
    /// The driver couldn't produce any EGL config, even after relaxing the request.
    NoPixelFormatFound,
    /// The system couldn't create an EGL context.
    ContextCreationFailed(WindowingApiError),
    /// The system couldn't make the EGL context current or not current.
    MakeCurrentFailed(WindowingApiError),
    /// The context has been destroyed or lost and can't be used any more.
    ContextInvalid,
    /// The system couldn't present a window surface.
    PresentFailed(WindowingApiError),
    /// The native widget type is not supported by this backend.
    IncompatibleNativeWidget,
}

/// Abstraction of the errors that EGL returns.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum WindowingApiError {
    /// Miscellaneous error.
    Failed,
    /// EGL is not initialized, or could not be initialized, for the specified EGL display
    /// connection.
    NotInitialized,
    /// EGL cannot access a requested resource (for example a context is bound in another
    /// thread). With ANGLE this usually means the Direct3D device is missing.
    BadAccess,
    /// EGL failed to allocate resources for the requested operation.
    BadAlloc,
    /// An unrecognized attribute or attribute value was passed in the attribute list.
    BadAttribute,
    /// An EGLConfig argument does not name a valid EGL frame buffer configuration.
    BadConfig,
    /// An EGLContext argument does not name a valid EGL rendering context.
    BadContext,
    /// The current surface of the calling thread is a window, pixel buffer or pixmap that is no
    /// longer valid.
    BadCurrentSurface,
    /// An EGLDisplay argument does not name a valid EGL display connection.
    BadDisplay,
    /// Arguments are inconsistent (for example, a valid context requires buffers not supplied by
    /// a valid surface).
    BadMatch,
    /// A NativePixmapType argument does not refer to a valid native pixmap.
    BadNativePixmap,
    /// A NativeWindowType argument does not refer to a valid native window.
    BadNativeWindow,
    /// One or more argument values are invalid.
    BadParameter,
    /// An EGLSurface argument does not name a valid surface (window, pixel buffer or pixmap)
    /// configured for GL rendering.
    BadSurface,
    /// A power management event has occurred. The application must destroy all contexts and
    /// reinitialise OpenGL ES state and objects to continue rendering.
    ContextLost,
}
