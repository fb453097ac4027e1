// eglctx/src/platform/generic/egl/loader.rs
//
//! Runtime loading of the EGL and GLES driver modules.
//!
//! Nothing here links against the driver. The modules are located by name when the binding is
//! initialized and every entry point is looked up through a `SymbolResolver`.

use crate::egl::Egl;
use crate::Error;
use super::ffi::{EGLGetPlatformDisplayEXTFn, EGLGetProcAddressFn, GLGetStringFn};

use std::env;
use std::ffi::{CStr, CString};
use std::fmt::{self, Debug, Formatter};
use std::mem;
use std::os::raw::c_void;
use std::ptr;
use std::sync::{Arc, OnceLock};

#[cfg(not(windows))]
use libc::{dlopen, dlsym, RTLD_LAZY};
#[cfg(windows)]
use winapi::shared::minwindef::HMODULE;
#[cfg(windows)]
use winapi::um::{errhandlingapi, libloaderapi};
#[cfg(windows)]
use wio::wide::ToWide;

/// The environment variable that overrides the EGL module name.
pub const EGL_LIBRARY_ENV: &str = "EGLCTX_EGL_LIBRARY";
/// The environment variable that overrides the GLES module name.
pub const GLES_LIBRARY_ENV: &str = "EGLCTX_GLES_LIBRARY";

// The largest stdcall argument size tried when looking up decorated exports.
const MAX_DECORATED_ARGUMENT_SIZE: usize = 64;

#[cfg(windows)]
const DEFAULT_EGL_LIBRARY_NAMES: &[&str] = &["libEGL.dll"];
#[cfg(windows)]
const DEFAULT_GLES_LIBRARY_NAMES: &[&str] = &["libGLESv2.dll"];
#[cfg(not(windows))]
const DEFAULT_EGL_LIBRARY_NAMES: &[&str] = &["libEGL.so.1", "libEGL.so"];
#[cfg(not(windows))]
const DEFAULT_GLES_LIBRARY_NAMES: &[&str] = &["libGLESv2.so.2", "libGLESv2.so"];

static SHARED_LIBRARY: OnceLock<Option<Arc<EglLibrary>>> = OnceLock::new();

/// An opaque handle to a loaded native module.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModuleHandle(pub *mut c_void);

unsafe impl Send for ModuleHandle {}
unsafe impl Sync for ModuleHandle {}

/// Locates native modules and looks up symbols in them.
pub trait SymbolResolver: Send + Sync {
    /// Loads the module with the given name, returning `None` if it can't be found.
    fn load(&self, module_name: &str) -> Option<ModuleHandle>;

    /// Looks up an exported symbol. Returns null if the module doesn't export it.
    fn resolve(&self, module: ModuleHandle, symbol: &CStr) -> *const c_void;
}

/// Resolves symbols with the operating system's dynamic loader.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemResolver;

#[cfg(not(windows))]
impl SymbolResolver for SystemResolver {
    fn load(&self, module_name: &str) -> Option<ModuleHandle> {
        let module_name = CString::new(module_name).ok()?;
        unsafe {
            let handle = dlopen(module_name.as_ptr(), RTLD_LAZY);
            if handle.is_null() {
                None
            } else {
                Some(ModuleHandle(handle))
            }
        }
    }

    fn resolve(&self, module: ModuleHandle, symbol: &CStr) -> *const c_void {
        unsafe { dlsym(module.0, symbol.as_ptr()).cast_const() }
    }
}

#[cfg(windows)]
impl SymbolResolver for SystemResolver {
    fn load(&self, module_name: &str) -> Option<ModuleHandle> {
        let wide_name = module_name.to_wide_null();
        unsafe {
            let module = libloaderapi::LoadLibraryW(wide_name.as_ptr());
            if module.is_null() {
                debug!("LoadLibraryW({}) failed: error {}",
                       module_name,
                       errhandlingapi::GetLastError());
                None
            } else {
                Some(ModuleHandle(module as *mut c_void))
            }
        }
    }

    fn resolve(&self, module: ModuleHandle, symbol: &CStr) -> *const c_void {
        unsafe { libloaderapi::GetProcAddress(module.0 as HMODULE, symbol.as_ptr()) as *const c_void }
    }
}

/// Looks up `name`, falling back to the stdcall-decorated forms `name@0`, `name@4`, ...,
/// `name@64`. Some 32-bit builds of the driver only export the decorated names.
pub fn resolve_decorated(resolver: &dyn SymbolResolver, module: ModuleHandle, name: &str)
                         -> *const c_void {
    let symbol = match CString::new(name) {
        Ok(symbol) => symbol,
        Err(_) => return ptr::null(),
    };
    let address = resolver.resolve(module, &symbol);
    if !address.is_null() {
        return address;
    }

    for argument_size in (0..=MAX_DECORATED_ARGUMENT_SIZE).step_by(4) {
        let symbol = match CString::new(format!("{}@{}", name, argument_size)) {
            Ok(symbol) => symbol,
            Err(_) => return ptr::null(),
        };
        let address = resolver.resolve(module, &symbol);
        if !address.is_null() {
            return address;
        }
    }
    ptr::null()
}

/// The module names tried when loading the driver, in order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LibraryNames {
    /// Candidate names of the EGL module.
    pub egl: Vec<String>,
    /// Candidate names of the GLES module.
    pub gles: Vec<String>,
}

impl Default for LibraryNames {
    fn default() -> LibraryNames {
        LibraryNames {
            egl: DEFAULT_EGL_LIBRARY_NAMES.iter().map(|name| name.to_string()).collect(),
            gles: DEFAULT_GLES_LIBRARY_NAMES.iter().map(|name| name.to_string()).collect(),
        }
    }
}

impl LibraryNames {
    /// The platform defaults, with `EGLCTX_EGL_LIBRARY` and `EGLCTX_GLES_LIBRARY` replacing the
    /// candidates for their module when set.
    pub fn from_env() -> LibraryNames {
        let mut names = LibraryNames::default();
        if let Ok(egl) = env::var(EGL_LIBRARY_ENV) {
            if !egl.is_empty() {
                names.egl = vec![egl];
            }
        }
        if let Ok(gles) = env::var(GLES_LIBRARY_ENV) {
            if !gles.is_empty() {
                names.gles = vec![gles];
            }
        }
        names
    }
}

/// The runtime binding to the EGL and GLES modules.
pub struct EglLibrary {
    resolver: Box<dyn SymbolResolver>,
    names: LibraryNames,
    egl_module: Option<ModuleHandle>,
    gles_module: Option<ModuleHandle>,
    pub(crate) egl: Option<Egl>,
    pub(crate) get_proc_address: Option<EGLGetProcAddressFn>,
    pub(crate) get_platform_display_ext: Option<EGLGetPlatformDisplayEXTFn>,
    pub(crate) gl_get_string: Option<GLGetStringFn>,
    initialized: bool,
}

// The function tables are plain pointers into modules that stay loaded for the life of the
// process.
unsafe impl Send for EglLibrary {}
unsafe impl Sync for EglLibrary {}

impl Debug for EglLibrary {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        formatter.debug_struct("EglLibrary")
                 .field("names", &self.names)
                 .field("egl_module", &self.egl_module)
                 .field("gles_module", &self.gles_module)
                 .field("initialized", &self.initialized)
                 .finish()
    }
}

impl EglLibrary {
    /// Creates a binding that hasn't loaded anything yet.
    pub fn new(resolver: Box<dyn SymbolResolver>, names: LibraryNames) -> EglLibrary {
        EglLibrary {
            resolver,
            names,
            egl_module: None,
            gles_module: None,
            egl: None,
            get_proc_address: None,
            get_platform_display_ext: None,
            gl_get_string: None,
            initialized: false,
        }
    }

    /// Returns the process-wide binding, loading it on first use with the system loader and the
    /// module names from the environment.
    ///
    /// Returns `None` if the driver couldn't be loaded. The failure is remembered.
    pub fn shared() -> Option<Arc<EglLibrary>> {
        SHARED_LIBRARY.get_or_init(|| {
            let mut library = EglLibrary::new(Box::new(SystemResolver), LibraryNames::from_env());
            match library.init() {
                Ok(()) => Some(Arc::new(library)),
                Err(err) => {
                    warn!("Failed to load the EGL driver: {:?}", err);
                    None
                }
            }
        }).clone()
    }

    /// Loads both modules and resolves the entry point tables.
    ///
    /// This isn't guarded against being called twice; a second call loads and resolves
    /// everything again.
    pub fn init(&mut self) -> Result<(), Error> {
        self.initialized = false;
        self.init_egl()?;
        self.init_gles()?;
        self.initialized = true;
        Ok(())
    }

    fn init_egl(&mut self) -> Result<(), Error> {
        let egl_module = load_first(&*self.resolver, &self.names.egl).ok_or_else(|| {
            warn!("Failed to load any of the EGL modules {:?}", self.names.egl);
            Error::NoGLLibraryFound
        })?;
        self.egl_module = Some(egl_module);

        let resolver = &*self.resolver;
        let egl = Egl::load_with(|symbol| resolve_decorated(resolver, egl_module, symbol));
        if !egl.GetError.is_loaded() ||
                !egl.GetDisplay.is_loaded() ||
                !egl.Initialize.is_loaded() ||
                !egl.GetProcAddress.is_loaded() ||
                !egl.QueryString.is_loaded() {
            warn!("The EGL module is missing mandatory entry points");
            return Err(Error::GLFunctionNotFound);
        }

        // The generated `GetProcAddress` returns a non-nullable function pointer, so lookups go
        // through a nullable copy of the entry point instead.
        let get_proc_address = unsafe {
            let address = resolve_decorated(resolver, egl_module, "eglGetProcAddress");
            mem::transmute::<*const c_void, Option<EGLGetProcAddressFn>>(address)
        };
        self.get_platform_display_ext = get_proc_address.and_then(|get_proc_address| unsafe {
            let address = get_proc_address(c"eglGetPlatformDisplayEXT".as_ptr());
            mem::transmute::<*const c_void, Option<EGLGetPlatformDisplayEXTFn>>(address)
        });
        self.get_proc_address = get_proc_address;
        self.egl = Some(egl);
        Ok(())
    }

    fn init_gles(&mut self) -> Result<(), Error> {
        let gles_module = load_first(&*self.resolver, &self.names.gles).ok_or_else(|| {
            warn!("Failed to load any of the GLES modules {:?}", self.names.gles);
            Error::NoGLLibraryFound
        })?;
        self.gles_module = Some(gles_module);

        // A module without these isn't a usable OpenGL ES 2 implementation.
        for symbol in ["glBindTexture", "glCreateShader", "glClearDepthf"] {
            if resolve_decorated(&*self.resolver, gles_module, symbol).is_null() {
                warn!("The GLES module doesn't export {}", symbol);
                return Err(Error::GLFunctionNotFound);
            }
        }

        self.gl_get_string = unsafe {
            let address = resolve_decorated(&*self.resolver, gles_module, "glGetString");
            mem::transmute::<*const c_void, Option<GLGetStringFn>>(address)
        };
        Ok(())
    }

    /// Whether `init()` has completed successfully.
    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Looks up a symbol in the EGL module, accepting decorated names.
    pub fn resolve(&self, name: &str) -> *const c_void {
        match self.egl_module {
            Some(module) => resolve_decorated(&*self.resolver, module, name),
            None => ptr::null(),
        }
    }

    /// Looks up a symbol in the GLES module, accepting decorated names.
    pub fn resolve_gl(&self, name: &str) -> *const c_void {
        match self.gles_module {
            Some(module) => resolve_decorated(&*self.resolver, module, name),
            None => ptr::null(),
        }
    }

    /// Whether the driver exposes `eglGetPlatformDisplayEXT`.
    #[inline]
    pub fn has_platform_display(&self) -> bool {
        self.get_platform_display_ext.is_some()
    }
}

fn load_first(resolver: &dyn SymbolResolver, names: &[String]) -> Option<ModuleHandle> {
    names.iter().find_map(|name| {
        debug!("Loading EGL driver module {}", name);
        resolver.load(name)
    })
}
