// eglctx/src/tests.rs
//
//! Tests of config negotiation and the context lifecycle against a mock driver.

use crate::egl;
use crate::egl::types::{EGLConfig, EGLContext, EGLDisplay, EGLNativeDisplayType};
use crate::egl::types::{EGLNativeWindowType, EGLSurface, EGLenum, EGLint};
use crate::platform::generic::egl::config::{config_attribute_values, format_from_config};
use crate::platform::generic::egl::config::print_config;
use crate::platform::generic::egl::ffi::{EGL_GL_COLORSPACE_KHR, EGL_GL_COLORSPACE_SRGB_KHR};
use crate::platform::generic::egl::ffi::EGL_PLATFORM_ANGLE_TYPE_D3D11_ANGLE;
use crate::platform::generic::egl::ffi::EGL_PLATFORM_ANGLE_TYPE_D3D9_ANGLE;
use crate::{ColorPrimaries, ColorSpace, ConfigChooser, Context, ContextState, Device, EglDriver};
use crate::{Error, FormatOptions, GLApi, NativeSurfaceProvider, Profile, RenderableType};
use crate::{Renderer, SurfaceFormat, TransferFunction, WindowSurface, WindowingApiError};

use std::cell::RefCell;
use std::collections::HashMap;
use std::ffi::CStr;
use std::os::raw::c_void;
use std::ptr;
use euclid::default::Size2D;
use std::rc::Rc;
use std::sync::Arc;

const DEFAULT_DISPLAY: usize = 0x1000;
const ANGLE_DISPLAY_BASE: usize = 0x2000;
const FIRST_HANDLE: usize = 0x10000;

fn handle(value: usize) -> *const c_void {
    value as *const c_void
}

// A config with the given channel sizes that supports windows and pbuffers for OpenGL ES 2/3.
fn config(red: EGLint, green: EGLint, blue: EGLint, alpha: EGLint, depth: EGLint, stencil: EGLint)
          -> Vec<(EGLenum, EGLint)> {
    vec![
        (egl::RED_SIZE, red),
        (egl::GREEN_SIZE, green),
        (egl::BLUE_SIZE, blue),
        (egl::ALPHA_SIZE, alpha),
        (egl::BUFFER_SIZE, red + green + blue + alpha),
        (egl::DEPTH_SIZE, depth),
        (egl::STENCIL_SIZE, stencil),
        (egl::SURFACE_TYPE, (egl::WINDOW_BIT | egl::PBUFFER_BIT) as EGLint),
        (egl::RENDERABLE_TYPE, (egl::OPENGL_ES2_BIT | egl::OPENGL_ES3_BIT) as EGLint),
    ]
}

struct MockState {
    error: EGLint,
    next_handle: usize,
    current: (EGLDisplay, EGLSurface, EGLSurface, EGLContext),

    gl_version: Option<String>,
    reject_shared_contexts: bool,
    create_context_error: Option<EGLint>,
    make_current_error: Option<EGLint>,
    swap_buffers_error: Option<EGLint>,
    failing_angle_types: Vec<EGLint>,
    failing_displays: Vec<usize>,

    choose_queries: Vec<Vec<EGLint>>,
    platform_display_requests: Vec<Vec<EGLint>>,
    created_contexts: Vec<(EGLContext, EGLContext, Vec<EGLint>)>,
    destroyed_contexts: Vec<EGLContext>,
    window_surfaces: Vec<(EGLSurface, Vec<EGLint>)>,
    pbuffers: Vec<(EGLSurface, Vec<(EGLenum, EGLint)>)>,
    destroyed_surfaces: Vec<EGLSurface>,
    terminated_displays: Vec<EGLDisplay>,
    make_current_calls: usize,
    swap_interval_calls: Vec<EGLint>,
    swap_buffers_calls: usize,
    bound_apis: Vec<EGLenum>,
}

struct MockDriver {
    configs: Vec<Vec<(EGLenum, EGLint)>>,
    extensions: String,
    vendor: String,
    module_api: GLApi,
    platform_display: bool,
    proc_addresses: HashMap<String, usize>,
    gl_symbols: HashMap<String, usize>,
    state: RefCell<MockState>,
}

impl MockDriver {
    fn new(configs: Vec<Vec<(EGLenum, EGLint)>>) -> MockDriver {
        MockDriver {
            configs,
            extensions: String::new(),
            vendor: "Mock".to_owned(),
            module_api: GLApi::GLES,
            platform_display: false,
            proc_addresses: HashMap::new(),
            gl_symbols: HashMap::new(),
            state: RefCell::new(MockState {
                error: egl::SUCCESS as EGLint,
                next_handle: FIRST_HANDLE,
                current: (egl::NO_DISPLAY, egl::NO_SURFACE, egl::NO_SURFACE, egl::NO_CONTEXT),
                gl_version: Some("OpenGL ES 2.0 (Mock 1.0)".to_owned()),
                reject_shared_contexts: false,
                create_context_error: None,
                make_current_error: None,
                swap_buffers_error: None,
                failing_angle_types: vec![],
                failing_displays: vec![],
                choose_queries: vec![],
                platform_display_requests: vec![],
                created_contexts: vec![],
                destroyed_contexts: vec![],
                window_surfaces: vec![],
                pbuffers: vec![],
                destroyed_surfaces: vec![],
                terminated_displays: vec![],
                make_current_calls: 0,
                swap_interval_calls: vec![],
                swap_buffers_calls: 0,
                bound_apis: vec![],
            }),
        }
    }

    fn with_extensions(mut self, extensions: &str) -> MockDriver {
        self.extensions = extensions.to_owned();
        self
    }

    fn into_device(self) -> (Arc<MockDriver>, Rc<Device>) {
        let mock = Arc::new(self);
        let driver: Arc<dyn EglDriver> = mock.clone();
        let device = Device::new(driver, ptr::null(), Renderer::empty()).unwrap();
        (mock, Rc::new(device))
    }

    fn allocate_handle(&self) -> *const c_void {
        let mut state = self.state.borrow_mut();
        let value = state.next_handle;
        state.next_handle += 0x10;
        handle(value)
    }

    fn fail(&self, error: EGLenum) {
        self.state.borrow_mut().error = error as EGLint;
    }

    fn config_attribute(&self, config: EGLConfig, attribute: EGLenum) -> Option<EGLint> {
        let index = (config as usize).checked_sub(1)?;
        let attributes = self.configs.get(index)?;
        Some(attributes.iter()
                       .find(|&&(key, _)| key == attribute)
                       .map_or(0, |&(_, value)| value))
    }

    fn matches(&self, config: EGLConfig, requested: &[(EGLenum, EGLint)]) -> bool {
        requested.iter().all(|&(key, value)| {
            let actual = self.config_attribute(config, key).unwrap_or(0);
            match key {
                egl::RED_SIZE | egl::GREEN_SIZE | egl::BLUE_SIZE | egl::ALPHA_SIZE |
                egl::BUFFER_SIZE | egl::DEPTH_SIZE | egl::STENCIL_SIZE | egl::SAMPLES |
                egl::SAMPLE_BUFFERS | egl::ALPHA_MASK_SIZE => actual >= value,
                egl::SURFACE_TYPE | egl::RENDERABLE_TYPE => actual & value == value,
                _ => actual == value,
            }
        })
    }

    fn context_count(&self) -> usize {
        self.state.borrow().created_contexts.len()
    }

    fn make_current_calls(&self) -> usize {
        self.state.borrow().make_current_calls
    }

    fn current_context(&self) -> EGLContext {
        self.state.borrow().current.3
    }
}

fn parse_attributes(attributes: &[EGLint]) -> Vec<(EGLenum, EGLint)> {
    attributes.chunks(2)
              .take_while(|pair| pair[0] != egl::NONE as EGLint)
              .map(|pair| (pair[0] as EGLenum, pair[1]))
              .collect()
}

impl EglDriver for MockDriver {
    unsafe fn get_error(&self) -> EGLint {
        let mut state = self.state.borrow_mut();
        let error = state.error;
        state.error = egl::SUCCESS as EGLint;
        error
    }

    unsafe fn get_display(&self, _: EGLNativeDisplayType) -> EGLDisplay {
        handle(DEFAULT_DISPLAY)
    }

    fn has_platform_display(&self) -> bool {
        self.platform_display
    }

    unsafe fn get_platform_display(&self, _: EGLenum, _: *mut c_void, attributes: &[EGLint])
                                   -> EGLDisplay {
        self.state.borrow_mut().platform_display_requests.push(attributes.to_vec());
        handle(ANGLE_DISPLAY_BASE + attributes[1] as usize)
    }

    unsafe fn initialize(&self, display: EGLDisplay, major: &mut EGLint, minor: &mut EGLint)
                         -> bool {
        let failed = {
            let state = self.state.borrow();
            let angle_type = (display as usize).wrapping_sub(ANGLE_DISPLAY_BASE) as EGLint;
            state.failing_displays.contains(&(display as usize)) ||
                (display as usize != DEFAULT_DISPLAY &&
                 state.failing_angle_types.contains(&angle_type))
        };
        if failed {
            self.fail(egl::NOT_INITIALIZED);
            return false;
        }
        *major = 1;
        *minor = 5;
        true
    }

    unsafe fn terminate(&self, display: EGLDisplay) -> bool {
        self.state.borrow_mut().terminated_displays.push(display);
        true
    }

    unsafe fn query_string(&self, _: EGLDisplay, name: EGLint) -> Option<String> {
        match name as EGLenum {
            egl::EXTENSIONS => Some(self.extensions.clone()),
            egl::VENDOR => Some(self.vendor.clone()),
            _ => None,
        }
    }

    unsafe fn choose_config(&self,
                            _: EGLDisplay,
                            attributes: &[EGLint],
                            configs: &mut [EGLConfig],
                            config_count: &mut EGLint)
                            -> bool {
        let requested = parse_attributes(attributes);
        if configs.is_empty() {
            self.state.borrow_mut().choose_queries.push(attributes.to_vec());
        }

        // Like real drivers, sort by the number of bits in the requested color channels.
        let color_bits = |config: EGLConfig| {
            [egl::RED_SIZE, egl::GREEN_SIZE, egl::BLUE_SIZE, egl::ALPHA_SIZE]
                .iter()
                .filter(|&&key| requested.iter().any(|&(k, v)| k == key && v > 0))
                .map(|&key| self.config_attribute(config, key).unwrap_or(0))
                .sum::<EGLint>()
        };
        let mut matching: Vec<EGLConfig> = (1..=self.configs.len())
            .map(handle)
            .filter(|&config| self.matches(config, &requested))
            .collect();
        matching.sort_by_key(|&config| -color_bits(config));

        if configs.is_empty() {
            *config_count = matching.len() as EGLint;
        } else {
            let count = matching.len().min(configs.len());
            configs[..count].copy_from_slice(&matching[..count]);
            *config_count = count as EGLint;
        }
        true
    }

    unsafe fn get_config_attrib(&self, _: EGLDisplay, config: EGLConfig, attribute: EGLint)
                                -> Option<EGLint> {
        self.config_attribute(config, attribute as EGLenum)
    }

    unsafe fn create_window_surface(&self,
                                    _: EGLDisplay,
                                    _: EGLConfig,
                                    native_window: EGLNativeWindowType,
                                    attributes: &[EGLint])
                                    -> EGLSurface {
        if native_window.is_null() {
            self.fail(egl::BAD_NATIVE_WINDOW);
            return egl::NO_SURFACE;
        }
        let egl_surface = self.allocate_handle();
        self.state.borrow_mut().window_surfaces.push((egl_surface, attributes.to_vec()));
        egl_surface
    }

    unsafe fn create_pbuffer_surface(&self, _: EGLDisplay, _: EGLConfig, attributes: &[EGLint])
                                     -> EGLSurface {
        let egl_surface = self.allocate_handle();
        self.state.borrow_mut().pbuffers.push((egl_surface, parse_attributes(attributes)));
        egl_surface
    }

    unsafe fn destroy_surface(&self, _: EGLDisplay, surface: EGLSurface) -> bool {
        self.state.borrow_mut().destroyed_surfaces.push(surface);
        true
    }

    unsafe fn bind_api(&self, api: EGLenum) -> bool {
        self.state.borrow_mut().bound_apis.push(api);
        true
    }

    unsafe fn swap_interval(&self, _: EGLDisplay, interval: EGLint) -> bool {
        self.state.borrow_mut().swap_interval_calls.push(interval);
        true
    }

    unsafe fn create_context(&self,
                             _: EGLDisplay,
                             _: EGLConfig,
                             share_context: EGLContext,
                             attributes: &[EGLint])
                             -> EGLContext {
        let (reject_shared, create_error) = {
            let state = self.state.borrow();
            (state.reject_shared_contexts, state.create_context_error)
        };
        if let Some(error) = create_error {
            self.state.borrow_mut().error = error;
            return egl::NO_CONTEXT;
        }
        if reject_shared && share_context != egl::NO_CONTEXT {
            self.fail(egl::BAD_MATCH);
            return egl::NO_CONTEXT;
        }
        let egl_context = self.allocate_handle();
        self.state.borrow_mut().created_contexts.push((egl_context,
                                                       share_context,
                                                       attributes.to_vec()));
        egl_context
    }

    unsafe fn destroy_context(&self, _: EGLDisplay, context: EGLContext) -> bool {
        self.state.borrow_mut().destroyed_contexts.push(context);
        true
    }

    unsafe fn make_current(&self,
                           display: EGLDisplay,
                           draw: EGLSurface,
                           read: EGLSurface,
                           context: EGLContext)
                           -> bool {
        let mut state = self.state.borrow_mut();
        state.make_current_calls += 1;
        if context == egl::NO_CONTEXT {
            state.current = (egl::NO_DISPLAY, egl::NO_SURFACE, egl::NO_SURFACE, egl::NO_CONTEXT);
            return true;
        }
        if let Some(error) = state.make_current_error {
            state.error = error;
            return false;
        }
        state.current = (display, draw, read, context);
        true
    }

    unsafe fn get_current_context(&self) -> EGLContext {
        self.state.borrow().current.3
    }

    unsafe fn get_current_surface(&self, which: EGLint) -> EGLSurface {
        let state = self.state.borrow();
        if which == egl::DRAW as EGLint {
            state.current.1
        } else {
            state.current.2
        }
    }

    unsafe fn get_current_display(&self) -> EGLDisplay {
        self.state.borrow().current.0
    }

    unsafe fn swap_buffers(&self, _: EGLDisplay, _: EGLSurface) -> bool {
        let mut state = self.state.borrow_mut();
        state.swap_buffers_calls += 1;
        if let Some(error) = state.swap_buffers_error {
            state.error = error;
            return false;
        }
        true
    }

    unsafe fn get_proc_address(&self, name: &CStr) -> *const c_void {
        let name = name.to_string_lossy();
        self.proc_addresses.get(&*name).map_or(ptr::null(), |&address| handle(address))
    }

    unsafe fn gl_version_string(&self) -> Option<String> {
        let state = self.state.borrow();
        assert_ne!(state.current.3, egl::NO_CONTEXT);
        state.gl_version.clone()
    }

    fn resolve_gl_symbol(&self, name: &str) -> *const c_void {
        self.gl_symbols.get(name).map_or(ptr::null(), |&address| handle(address))
    }

    fn module_api(&self) -> GLApi {
        self.module_api
    }
}

// A drawable that hands out a fixed surface.
struct TestDrawable {
    egl_surface: EGLSurface,
    acquire_error: Option<EGLint>,
    swap_interval: EGLint,
    invalidations: usize,
}

impl TestDrawable {
    fn new(egl_surface: usize) -> TestDrawable {
        TestDrawable {
            egl_surface: handle(egl_surface),
            acquire_error: None,
            swap_interval: -1,
            invalidations: 0,
        }
    }
}

impl NativeSurfaceProvider for TestDrawable {
    fn acquire_drawable(&mut self, _: EGLConfig) -> Result<EGLSurface, EGLint> {
        match self.acquire_error {
            Some(error) => Err(error),
            None => Ok(self.egl_surface),
        }
    }

    fn invalidate(&mut self) {
        self.invalidations += 1;
    }

    fn requested_swap_interval(&self) -> EGLint {
        self.swap_interval
    }
}

fn rgb565_and_rgb888() -> Vec<Vec<(EGLenum, EGLint)>> {
    vec![config(8, 8, 8, 0, 24, 8), config(5, 6, 5, 0, 24, 8)]
}

fn create_context(device: &Rc<Device>, share: Option<&Context>) -> Context {
    device.create_context(&SurfaceFormat::default(), share).unwrap()
}

#[test]
fn test_exact_color_match_is_preferred() {
    let (_, device) = MockDriver::new(rgb565_and_rgb888()).into_device();

    let rgb565 = SurfaceFormat::default().with_rgba_sizes(5, 6, 5, 0);
    assert_eq!(ConfigChooser::new(&device).choose(&rgb565), Ok(handle(2)));

    let rgb888 = SurfaceFormat::default().with_rgba_sizes(8, 8, 8, 0);
    assert_eq!(ConfigChooser::new(&device).choose(&rgb888), Ok(handle(1)));
}

#[test]
fn test_ignoring_color_channels_takes_the_first_match() {
    let (_, device) = MockDriver::new(rgb565_and_rgb888()).into_device();
    let rgb565 = SurfaceFormat::default().with_rgba_sizes(5, 6, 5, 0);
    let chooser = ConfigChooser::new(&device).ignore_color_channels(true);
    assert_eq!(chooser.choose(&rgb565), Ok(handle(1)));
}

#[test]
fn test_unspecified_color_takes_the_first_config() {
    let (_, device) = MockDriver::new(rgb565_and_rgb888()).into_device();
    assert_eq!(ConfigChooser::new(&device).choose(&SurfaceFormat::default()), Ok(handle(1)));
}

#[test]
fn test_relaxation_finds_a_config() {
    let (mock, device) = MockDriver::new(vec![config(8, 8, 8, 8, 16, 0)]).into_device();
    let mut format = SurfaceFormat::default().with_rgba_sizes(8, 8, 8, 8);
    format.depth_size = 24;

    assert_eq!(ConfigChooser::new(&device).choose(&format), Ok(handle(1)));

    // Samples, then sample buffers, then depth 24 -> 1.
    let state = mock.state.borrow();
    assert_eq!(state.choose_queries.len(), 4);
    let last = parse_attributes(state.choose_queries.last().unwrap());
    assert!(last.contains(&(egl::DEPTH_SIZE, 1)));
    assert!(!last.iter().any(|&(key, _)| key == egl::SAMPLES));
}

#[test]
fn test_inexact_color_falls_back_to_first_returned_config() {
    let (_, device) = MockDriver::new(vec![config(8, 8, 8, 0, 24, 8)]).into_device();
    let rgb565 = SurfaceFormat::default().with_rgba_sizes(5, 6, 5, 0);
    assert_eq!(ConfigChooser::new(&device).choose(&rgb565), Ok(handle(1)));
}

#[test]
fn test_no_config_after_relaxing_everything() {
    let (mock, device) = MockDriver::new(vec![]).into_device();
    let format = SurfaceFormat::default().with_rgba_sizes(8, 8, 8, 8);
    assert_eq!(ConfigChooser::new(&device).choose(&format), Err(Error::NoPixelFormatFound));
    assert!(mock.state.borrow().choose_queries.len() > 1);
    assert!(matches!(device.create_context(&format, None), Err(Error::NoPixelFormatFound)));
}

fn requested_renderable_type(mock: &MockDriver) -> EGLint {
    let state = mock.state.borrow();
    let request = parse_attributes(&state.choose_queries[0]);
    request.iter()
           .find(|&&(key, _)| key == egl::RENDERABLE_TYPE)
           .map(|&(_, value)| value)
           .unwrap()
}

#[test]
fn test_gles3_needs_create_context_extension() {
    let format = SurfaceFormat::default().with_version(3, 0);

    let (mock, device) = MockDriver::new(rgb565_and_rgb888()).into_device();
    ConfigChooser::new(&device).choose(&format).unwrap();
    assert_eq!(requested_renderable_type(&mock), egl::OPENGL_ES2_BIT as EGLint);

    let (mock, device) = MockDriver::new(rgb565_and_rgb888())
        .with_extensions("EGL_KHR_image EGL_KHR_create_context")
        .into_device();
    ConfigChooser::new(&device).choose(&format).unwrap();
    assert_eq!(requested_renderable_type(&mock), egl::OPENGL_ES3_BIT as EGLint);
}

#[test]
fn test_desktop_gl_is_avoided_on_nvidia() {
    let mut configs = rgb565_and_rgb888();
    for config in &mut configs {
        config.retain(|&(key, _)| key != egl::RENDERABLE_TYPE);
        config.push((egl::RENDERABLE_TYPE,
                     (egl::OPENGL_BIT | egl::OPENGL_ES2_BIT) as EGLint));
    }

    let mut driver = MockDriver::new(configs.clone());
    driver.module_api = GLApi::GL;
    driver.vendor = "Mesa Project".to_owned();
    let (mock, device) = driver.into_device();
    ConfigChooser::new(&device).choose(&SurfaceFormat::default()).unwrap();
    assert_eq!(requested_renderable_type(&mock), egl::OPENGL_BIT as EGLint);

    let mut driver = MockDriver::new(configs);
    driver.module_api = GLApi::GL;
    driver.vendor = "NVIDIA".to_owned();
    let (mock, device) = driver.into_device();
    ConfigChooser::new(&device).choose(&SurfaceFormat::default()).unwrap();
    assert_eq!(requested_renderable_type(&mock), egl::OPENGL_ES2_BIT as EGLint);
}

#[test]
fn test_format_from_config() {
    let mut attributes = config(8, 8, 8, 8, 24, 8);
    attributes.push((egl::SAMPLES, 4));
    let (_, device) = MockDriver::new(vec![attributes]).into_device();

    let mut reference = SurfaceFormat::default()
        .with_version(3, 1)
        .with_renderable_type(RenderableType::OpenVG);
    reference.options = FormatOptions::STEREO_BUFFERS | FormatOptions::DEBUG_CONTEXT;

    let format = format_from_config(&device, handle(1), &reference);
    assert_eq!((format.red_size, format.green_size, format.blue_size, format.alpha_size),
               (8, 8, 8, 8));
    assert_eq!((format.depth_size, format.stencil_size, format.samples), (24, 8, 4));
    // The config can't do OpenVG.
    assert_eq!(format.renderable_type, RenderableType::OpenGLES);
    assert_eq!((format.major_version, format.minor_version), (3, 1));
    assert_eq!(format.options, FormatOptions::DEBUG_CONTEXT);
}

#[test]
fn test_angle_d3d11_failure_retries_other_backends() {
    let mut driver = MockDriver::new(rgb565_and_rgb888());
    driver.platform_display = true;
    driver.state.borrow_mut().failing_angle_types.push(EGL_PLATFORM_ANGLE_TYPE_D3D11_ANGLE);
    let mock = Arc::new(driver);

    let device = Device::new(mock.clone(),
                             ptr::null(),
                             Renderer::ANGLE_D3D11 | Renderer::ANGLE_D3D9).unwrap();
    let d3d9_display = handle(ANGLE_DISPLAY_BASE + EGL_PLATFORM_ANGLE_TYPE_D3D9_ANGLE as usize);
    assert_eq!(device.egl_display(), d3d9_display);
    assert_eq!(device.egl_version(), (1, 5));

    let state = mock.state.borrow();
    let requested_types: Vec<EGLint> =
        state.platform_display_requests.iter().map(|attributes| attributes[1]).collect();
    assert_eq!(requested_types,
               vec![EGL_PLATFORM_ANGLE_TYPE_D3D11_ANGLE, EGL_PLATFORM_ANGLE_TYPE_D3D9_ANGLE]);
    // The failed D3D11 display was released.
    let d3d11_display = handle(ANGLE_DISPLAY_BASE + EGL_PLATFORM_ANGLE_TYPE_D3D11_ANGLE as usize);
    assert_eq!(state.terminated_displays, vec![d3d11_display]);
}

#[test]
fn test_angle_failure_falls_back_to_the_default_display() {
    let mut driver = MockDriver::new(rgb565_and_rgb888());
    driver.platform_display = true;
    driver.state.borrow_mut().failing_angle_types.push(EGL_PLATFORM_ANGLE_TYPE_D3D11_ANGLE);
    let mock = Arc::new(driver);

    let device = Device::new(mock.clone(), ptr::null(), Renderer::ANGLE_D3D11).unwrap();
    assert_eq!(device.egl_display(), handle(DEFAULT_DISPLAY));
    assert_eq!(mock.state.borrow().platform_display_requests.len(), 1);
}

#[test]
fn test_device_initialization_failure() {
    let driver = MockDriver::new(vec![]);
    driver.state.borrow_mut().failing_displays.push(DEFAULT_DISPLAY);
    let result = Device::new(Arc::new(driver), ptr::null(), Renderer::empty());
    assert!(matches!(result,
                     Err(Error::DeviceInitializationFailed(WindowingApiError::NotInitialized))));
}

#[test]
fn test_device_terminates_display_when_dropped() {
    let (mock, device) = MockDriver::new(rgb565_and_rgb888()).into_device();
    let context = create_context(&device, None);
    drop(device);
    assert!(mock.state.borrow().terminated_displays.is_empty());
    drop(context);
    assert_eq!(mock.state.borrow().terminated_displays, vec![handle(DEFAULT_DISPLAY)]);
}

#[test]
fn test_device_pbuffer_has_the_requested_size() {
    let (mock, device) = MockDriver::new(rgb565_and_rgb888()).into_device();
    let egl_surface = device.create_pbuffer_surface(handle(1), &Size2D::new(64, 32)).unwrap();

    assert_eq!(mock.state.borrow().pbuffers,
               vec![(egl_surface,
                     vec![(egl::WIDTH, 64), (egl::HEIGHT, 32), (egl::LARGEST_PBUFFER, 0)])]);

    device.destroy_surface(egl_surface);
    assert_eq!(mock.state.borrow().destroyed_surfaces, vec![egl_surface]);
}

#[test]
fn test_config_attribute_dump() {
    let (_, device) = MockDriver::new(rgb565_and_rgb888()).into_device();

    let values = config_attribute_values(&device, handle(2));
    assert_eq!(values.len(), 27);
    assert_eq!(values[0], ("EGL_BUFFER_SIZE", 16));
    assert_eq!(values[4], ("EGL_RED_SIZE", 5));
    assert_eq!(values[5], ("EGL_DEPTH_SIZE", 24));
    assert_eq!(values[18],
               ("EGL_SURFACE_TYPE", (egl::WINDOW_BIT | egl::PBUFFER_BIT) as EGLint));
    assert_eq!(values[26], ("EGL_MAX_SWAP_INTERVAL", 0));

    // Attributes the driver can't report are left out.
    assert!(config_attribute_values(&device, handle(99)).is_empty());

    print_config(&device, handle(2));
}

#[test]
fn test_color_space_support() {
    let (_, device) = MockDriver::new(vec![])
        .with_extensions("EGL_KHR_gl_colorspace EGL_EXT_gl_colorspace_scrgb_linear")
        .into_device();
    assert!(device.supports_color_space(ColorPrimaries::SRgb, TransferFunction::SRgb));
    assert!(!device.supports_color_space(ColorPrimaries::ScRgb, TransferFunction::Linear));
    assert!(!device.supports_color_space(ColorPrimaries::Bt2020, TransferFunction::St2084));

    let (_, device) = MockDriver::new(vec![])
        .with_extensions("EGL_KHR_gl_colorspace EGL_EXT_gl_colorspace_scrgb_linear \
                          EGL_EXT_pixel_format_float")
        .into_device();
    assert!(device.supports_color_space(ColorPrimaries::ScRgb, TransferFunction::Linear));
    assert!(!device.supports_color_space(ColorPrimaries::AdobeRgb, TransferFunction::Gamma));
}

#[test]
fn test_context_creation_reads_the_version() {
    let (mock, device) = MockDriver::new(rgb565_and_rgb888()).into_device();
    mock.state.borrow_mut().gl_version = Some("OpenGL ES 3.0.0 (ANGLE 2.1.0)".to_owned());

    let mut format = SurfaceFormat::default().with_version(2, 0);
    format.profile = Profile::Core;
    format.options = FormatOptions::DEBUG_CONTEXT;
    let context = device.create_context(&format, None).unwrap();

    assert_eq!((context.format().major_version, context.format().minor_version), (3, 0));
    assert_eq!(context.format().profile, Profile::NoProfile);
    assert_eq!(context.format().options, FormatOptions::empty());
    assert_eq!(context.state(), ContextState::Created);
    assert!(context.is_valid());
    assert!(!context.is_sharing());

    let state = mock.state.borrow();
    assert_eq!(state.created_contexts[0].2,
               vec![egl::CONTEXT_MAJOR_VERSION as EGLint, 2,
                    egl::CONTEXT_MINOR_VERSION as EGLint, 0,
                    egl::NONE as EGLint]);
    assert_eq!(state.bound_apis[0], egl::OPENGL_ES_API);
}

#[test]
fn test_version_check_restores_the_current_context() {
    let (mock, device) = MockDriver::new(rgb565_and_rgb888()).into_device();
    let mut first = create_context(&device, None);
    let mut drawable = TestDrawable::new(0x500);
    first.make_current(&mut drawable).unwrap();

    let second = create_context(&device, None);
    assert_ne!(second.egl_context(), first.egl_context());

    let state = mock.state.borrow();
    assert_eq!(state.current,
               (handle(DEFAULT_DISPLAY), handle(0x500), handle(0x500), first.egl_context()));
    // One 1x1 pbuffer per context, and both are gone.
    assert_eq!(state.pbuffers.len(), 2);
    for (_, attributes) in &state.pbuffers {
        assert_eq!(*attributes,
                   vec![(egl::WIDTH, 1), (egl::HEIGHT, 1), (egl::LARGEST_PBUFFER, 0)]);
    }
    let pbuffers: Vec<EGLSurface> = state.pbuffers.iter().map(|&(surface, _)| surface).collect();
    assert_eq!(state.destroyed_surfaces, pbuffers);
}

#[test]
fn test_version_check_leaves_nothing_current() {
    let (mock, device) = MockDriver::new(rgb565_and_rgb888()).into_device();
    let _context = create_context(&device, None);
    assert_eq!(mock.current_context(), egl::NO_CONTEXT);
}

#[test]
fn test_sharing() {
    let (mock, device) = MockDriver::new(rgb565_and_rgb888()).into_device();
    let first = create_context(&device, None);
    let second = create_context(&device, Some(&first));
    assert!(second.is_sharing());
    assert_eq!(second.share_context(), first.egl_context());
    assert_eq!(mock.context_count(), 2);
}

#[test]
fn test_rejected_sharing_retries_unshared() {
    let (mock, device) = MockDriver::new(rgb565_and_rgb888()).into_device();
    let first = create_context(&device, None);
    mock.state.borrow_mut().reject_shared_contexts = true;

    let second = create_context(&device, Some(&first));
    assert!(second.is_valid());
    assert!(!second.is_sharing());
    assert_eq!(mock.state.borrow().created_contexts[1].1, egl::NO_CONTEXT);
}

#[test]
fn test_context_creation_failure() {
    let (mock, device) = MockDriver::new(rgb565_and_rgb888()).into_device();
    mock.state.borrow_mut().create_context_error = Some(egl::BAD_ALLOC as EGLint);
    let result = device.create_context(&SurfaceFormat::default(), None);
    assert!(matches!(result, Err(Error::ContextCreationFailed(WindowingApiError::BadAlloc))));
}

#[test]
fn test_make_current_twice_binds_once() {
    let (mock, device) = MockDriver::new(rgb565_and_rgb888()).into_device();
    let mut context = create_context(&device, None);
    let mut drawable = TestDrawable::new(0x500);

    let calls = mock.make_current_calls();
    context.make_current(&mut drawable).unwrap();
    context.make_current(&mut drawable).unwrap();
    assert_eq!(mock.make_current_calls(), calls + 1);
    assert_eq!(context.state(), ContextState::Current);

    // A different drawable needs a real bind.
    let mut other = TestDrawable::new(0x600);
    context.make_current(&mut other).unwrap();
    assert_eq!(mock.make_current_calls(), calls + 2);
}

#[test]
fn test_done_current() {
    let (mock, device) = MockDriver::new(rgb565_and_rgb888()).into_device();
    let mut context = create_context(&device, None);
    let mut drawable = TestDrawable::new(0x500);
    context.make_current(&mut drawable).unwrap();

    context.done_current().unwrap();
    assert_eq!(mock.current_context(), egl::NO_CONTEXT);
    assert_eq!(context.state(), ContextState::Unbound);
    assert!(context.is_valid());
}

#[test]
fn test_context_lost_on_make_current() {
    let (mock, device) = MockDriver::new(rgb565_and_rgb888()).into_device();
    let mut context = create_context(&device, None);
    let egl_context = context.egl_context();
    let mut drawable = TestDrawable::new(0x500);
    mock.state.borrow_mut().make_current_error = Some(egl::CONTEXT_LOST as EGLint);

    assert_eq!(context.make_current(&mut drawable),
               Err(Error::MakeCurrentFailed(WindowingApiError::ContextLost)));
    assert!(!context.is_valid());
    assert_eq!(context.state(), ContextState::Lost);
    assert_eq!(drawable.invalidations, 1);
    assert_eq!(mock.state.borrow().destroyed_contexts, vec![egl_context]);

    // No automatic retry.
    let calls = mock.make_current_calls();
    assert_eq!(context.make_current(&mut drawable), Err(Error::ContextInvalid));
    assert_eq!(mock.make_current_calls(), calls);

    // The lost handle isn't destroyed a second time.
    drop(context);
    assert_eq!(mock.state.borrow().destroyed_contexts, vec![egl_context]);
}

#[test]
fn test_bad_match_keeps_the_context() {
    let (mock, device) = MockDriver::new(rgb565_and_rgb888()).into_device();
    let mut context = create_context(&device, None);
    let mut drawable = TestDrawable::new(0x500);
    mock.state.borrow_mut().make_current_error = Some(egl::BAD_MATCH as EGLint);

    assert_eq!(context.make_current(&mut drawable),
               Err(Error::MakeCurrentFailed(WindowingApiError::BadMatch)));
    assert!(context.is_valid());
    assert_eq!(drawable.invalidations, 0);
}

#[test]
fn test_drawable_failure_destroys_the_context() {
    let (mock, device) = MockDriver::new(rgb565_and_rgb888()).into_device();
    let mut context = create_context(&device, None);
    let egl_context = context.egl_context();
    let mut drawable = TestDrawable::new(0x500);
    drawable.acquire_error = Some(egl::BAD_ACCESS as EGLint);

    assert_eq!(context.make_current(&mut drawable),
               Err(Error::MakeCurrentFailed(WindowingApiError::BadAccess)));
    assert!(!context.is_valid());
    assert_eq!(context.state(), ContextState::Lost);
    assert_eq!(mock.state.borrow().destroyed_contexts, vec![egl_context]);
}

#[test]
fn test_swap_interval_is_applied_when_it_changes() {
    let (mock, device) = MockDriver::new(rgb565_and_rgb888()).into_device();
    let mut context = create_context(&device, None);
    let mut drawable = TestDrawable::new(0x500);

    context.make_current(&mut drawable).unwrap();
    assert!(mock.state.borrow().swap_interval_calls.is_empty());

    drawable.swap_interval = 1;
    context.done_current().unwrap();
    context.make_current(&mut drawable).unwrap();
    context.done_current().unwrap();
    context.make_current(&mut drawable).unwrap();
    assert_eq!(mock.state.borrow().swap_interval_calls, vec![1]);

    drawable.swap_interval = 0;
    context.done_current().unwrap();
    context.make_current(&mut drawable).unwrap();
    assert_eq!(mock.state.borrow().swap_interval_calls, vec![1, 0]);
}

#[test]
fn test_swap_buffers() {
    let (mock, device) = MockDriver::new(rgb565_and_rgb888()).into_device();
    let mut context = create_context(&device, None);
    let egl_context = context.egl_context();
    let mut drawable = TestDrawable::new(0x500);
    context.make_current(&mut drawable).unwrap();

    context.swap_buffers(&mut drawable).unwrap();
    assert_eq!(mock.state.borrow().swap_buffers_calls, 1);

    mock.state.borrow_mut().swap_buffers_error = Some(egl::CONTEXT_LOST as EGLint);
    assert_eq!(context.swap_buffers(&mut drawable),
               Err(Error::PresentFailed(WindowingApiError::ContextLost)));
    assert!(!context.is_valid());
    assert_eq!(context.state(), ContextState::Lost);
    assert_eq!(mock.state.borrow().destroyed_contexts, vec![egl_context]);
}

#[test]
fn test_context_lost_while_acquiring_the_drawable_to_present() {
    let (mock, device) = MockDriver::new(rgb565_and_rgb888()).into_device();
    let mut context = create_context(&device, None);
    let egl_context = context.egl_context();
    let mut drawable = TestDrawable::new(0x500);
    context.make_current(&mut drawable).unwrap();

    drawable.acquire_error = Some(egl::CONTEXT_LOST as EGLint);
    assert_eq!(context.swap_buffers(&mut drawable),
               Err(Error::PresentFailed(WindowingApiError::ContextLost)));
    assert!(!context.is_valid());
    assert_eq!(context.state(), ContextState::Lost);
    assert_eq!(mock.state.borrow().swap_buffers_calls, 0);
    assert_eq!(mock.state.borrow().destroyed_contexts, vec![egl_context]);
}

#[test]
fn test_other_drawable_failures_while_presenting_keep_the_context() {
    let (mock, device) = MockDriver::new(rgb565_and_rgb888()).into_device();
    let mut context = create_context(&device, None);
    let mut drawable = TestDrawable::new(0x500);
    context.make_current(&mut drawable).unwrap();

    drawable.acquire_error = Some(egl::BAD_NATIVE_WINDOW as EGLint);
    assert_eq!(context.swap_buffers(&mut drawable),
               Err(Error::PresentFailed(WindowingApiError::BadNativeWindow)));
    assert!(context.is_valid());
    assert!(mock.state.borrow().destroyed_contexts.is_empty());
}

#[test]
fn test_swap_buffers_on_a_destroyed_context() {
    let (mock, device) = MockDriver::new(rgb565_and_rgb888()).into_device();
    let mut context = create_context(&device, None);
    let mut drawable = TestDrawable::new(0x500);
    context.make_current(&mut drawable).unwrap();
    context.destroy();

    assert_eq!(context.swap_buffers(&mut drawable), Err(Error::ContextInvalid));
    assert_eq!(mock.state.borrow().swap_buffers_calls, 0);

    let mut invalidated = create_context(&device, None);
    invalidated.invalidate_context();
    assert_eq!(invalidated.swap_buffers(&mut drawable), Err(Error::ContextInvalid));
    assert_eq!(mock.state.borrow().swap_buffers_calls, 0);
}

#[test]
fn test_angle_aliases_for_gles2() {
    let mut driver = MockDriver::new(rgb565_and_rgb888());
    driver.proc_addresses.insert("glBlitFramebufferANGLE".to_owned(), 0x10);
    driver.proc_addresses.insert("glBlitFramebuffer".to_owned(), 0x20);
    driver.gl_symbols.insert("glClear".to_owned(), 0x30);
    let (mock, device) = driver.into_device();

    let gles2 = create_context(&device, None);
    assert_eq!(gles2.get_proc_address("glBlitFramebuffer"), handle(0x10));
    assert_eq!(gles2.get_proc_address("glClear"), handle(0x30));
    assert!(gles2.get_proc_address("glMissing").is_null());

    mock.state.borrow_mut().gl_version = Some("OpenGL ES 3.0".to_owned());
    let gles3 = create_context(&device, None);
    assert_eq!(gles3.get_proc_address("glBlitFramebuffer"), handle(0x20));
}

#[test]
fn test_destroy_is_idempotent() {
    let (mock, device) = MockDriver::new(rgb565_and_rgb888()).into_device();
    let mut context = create_context(&device, None);
    let egl_context = context.egl_context();
    let mut drawable = TestDrawable::new(0x500);
    context.make_current(&mut drawable).unwrap();

    context.destroy();
    context.destroy();
    assert_eq!(context.state(), ContextState::Destroyed);
    assert!(!context.is_valid());
    // It was released before being destroyed.
    assert_eq!(mock.current_context(), egl::NO_CONTEXT);

    drop(context);
    assert_eq!(mock.state.borrow().destroyed_contexts, vec![egl_context]);
}

#[test]
fn test_invalidated_context_refuses_to_bind() {
    let (_, device) = MockDriver::new(rgb565_and_rgb888()).into_device();
    let mut context = create_context(&device, None);
    context.invalidate_context();
    assert!(!context.is_valid());
    assert_eq!(context.make_current(&mut TestDrawable::new(0x500)), Err(Error::ContextInvalid));
}

#[test]
fn test_window_surface_is_created_lazily() {
    let (mock, device) = MockDriver::new(rgb565_and_rgb888())
        .with_extensions("EGL_KHR_gl_colorspace")
        .into_device();
    let mut format = SurfaceFormat::default();
    format.color_space = Some(ColorSpace::srgb());
    let mut surface = WindowSurface::new(&device, handle(0x42), &format);
    assert_eq!(surface.egl_surface(), egl::NO_SURFACE);

    let egl_surface = surface.acquire_drawable(handle(1)).unwrap();
    assert_eq!(surface.acquire_drawable(handle(1)), Ok(egl_surface));
    {
        let state = mock.state.borrow();
        assert_eq!(state.window_surfaces.len(), 1);
        assert_eq!(state.window_surfaces[0].1,
                   vec![EGL_GL_COLORSPACE_KHR, EGL_GL_COLORSPACE_SRGB_KHR, egl::NONE as EGLint]);
    }

    // Another config needs another surface.
    let recreated = surface.acquire_drawable(handle(2)).unwrap();
    assert_ne!(recreated, egl_surface);
    assert_eq!(mock.state.borrow().destroyed_surfaces, vec![egl_surface]);

    surface.invalidate();
    assert_eq!(surface.egl_surface(), egl::NO_SURFACE);
    drop(surface);
    assert_eq!(mock.state.borrow().destroyed_surfaces, vec![egl_surface, recreated]);
}

#[test]
fn test_unsupported_color_space_is_not_requested() {
    let (mock, device) = MockDriver::new(rgb565_and_rgb888()).into_device();
    let mut format = SurfaceFormat::default();
    format.color_space = Some(ColorSpace::bt2020_pq());
    let mut surface = WindowSurface::new(&device, handle(0x42), &format);
    surface.acquire_drawable(handle(1)).unwrap();
    assert_eq!(mock.state.borrow().window_surfaces[0].1, vec![egl::NONE as EGLint]);
}

#[test]
fn test_window_surface_failure_loses_the_context() {
    let (_, device) = MockDriver::new(rgb565_and_rgb888()).into_device();
    let mut context = create_context(&device, None);
    let mut surface = WindowSurface::new(&device, ptr::null(), &SurfaceFormat::default());
    assert_eq!(context.make_current(&mut surface),
               Err(Error::MakeCurrentFailed(WindowingApiError::BadNativeWindow)));
    assert_eq!(context.state(), ContextState::Lost);
}

#[test]
fn test_window_surface_applies_its_swap_interval() {
    let (mock, device) = MockDriver::new(rgb565_and_rgb888()).into_device();
    let mut context = create_context(&device, None);
    let format = SurfaceFormat::default();
    let mut surface = WindowSurface::new(&device, handle(0x42), &format);

    context.make_current(&mut surface).unwrap();
    assert_eq!(mock.state.borrow().swap_interval_calls, vec![format.swap_interval]);
    assert_eq!(mock.state.borrow().current.1, surface.egl_surface());
}
