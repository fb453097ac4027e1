// eglctx/src/platform/generic/egl/config.rs
//
//! Translation of surface formats into EGL configs.
//!
//! A `SurfaceFormat` is first encoded as a list of config attributes. The chooser hands that list
//! to `eglChooseConfig` and, whenever the driver has nothing that matches exactly, relaxes the
//! request one step at a time until it does.

use crate::egl;
use crate::egl::types::{EGLConfig, EGLenum, EGLint};
use crate::{Error, FormatOptions, GLApi, RenderableType, SurfaceFormat};
use super::device::Device;
use super::ffi::{EGL_COLOR_COMPONENT_TYPE_EXT, EGL_COLOR_COMPONENT_TYPE_FLOAT_EXT};

use std::ptr;

// Driver vendors whose desktop GL support over EGL is only meant for development.
const DESKTOP_GL_BLOCKLISTED_VENDOR: &str = "NVIDIA";

const MAX_SAMPLES: EGLint = 16;

/// A config attribute that this crate knows how to request and relax.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConfigAttrib {
    /// `EGL_BUFFER_SIZE`
    BufferSize,
    /// `EGL_RED_SIZE`
    RedSize,
    /// `EGL_GREEN_SIZE`
    GreenSize,
    /// `EGL_BLUE_SIZE`
    BlueSize,
    /// `EGL_ALPHA_SIZE`
    AlphaSize,
    /// `EGL_DEPTH_SIZE`
    DepthSize,
    /// `EGL_STENCIL_SIZE`
    StencilSize,
    /// `EGL_SAMPLES`
    Samples,
    /// `EGL_SAMPLE_BUFFERS`
    SampleBuffers,
    /// `EGL_ALPHA_MASK_SIZE`
    AlphaMaskSize,
    /// `EGL_SURFACE_TYPE`
    SurfaceType,
    /// `EGL_RENDERABLE_TYPE`
    RenderableType,
    /// `EGL_COLOR_COMPONENT_TYPE_EXT`
    ColorComponentType,
    /// `EGL_SWAP_BEHAVIOR`
    SwapBehavior,
    /// `EGL_BIND_TO_TEXTURE_RGB`
    BindToTextureRgb,
    /// `EGL_BIND_TO_TEXTURE_RGBA`
    BindToTextureRgba,
}

impl ConfigAttrib {
    /// The EGL token for this attribute.
    pub fn to_egl(self) -> EGLint {
        match self {
            ConfigAttrib::BufferSize => egl::BUFFER_SIZE as EGLint,
            ConfigAttrib::RedSize => egl::RED_SIZE as EGLint,
            ConfigAttrib::GreenSize => egl::GREEN_SIZE as EGLint,
            ConfigAttrib::BlueSize => egl::BLUE_SIZE as EGLint,
            ConfigAttrib::AlphaSize => egl::ALPHA_SIZE as EGLint,
            ConfigAttrib::DepthSize => egl::DEPTH_SIZE as EGLint,
            ConfigAttrib::StencilSize => egl::STENCIL_SIZE as EGLint,
            ConfigAttrib::Samples => egl::SAMPLES as EGLint,
            ConfigAttrib::SampleBuffers => egl::SAMPLE_BUFFERS as EGLint,
            ConfigAttrib::AlphaMaskSize => egl::ALPHA_MASK_SIZE as EGLint,
            ConfigAttrib::SurfaceType => egl::SURFACE_TYPE as EGLint,
            ConfigAttrib::RenderableType => egl::RENDERABLE_TYPE as EGLint,
            ConfigAttrib::ColorComponentType => EGL_COLOR_COMPONENT_TYPE_EXT,
            ConfigAttrib::SwapBehavior => egl::SWAP_BEHAVIOR as EGLint,
            ConfigAttrib::BindToTextureRgb => egl::BIND_TO_TEXTURE_RGB as EGLint,
            ConfigAttrib::BindToTextureRgba => egl::BIND_TO_TEXTURE_RGBA as EGLint,
        }
    }
}

/// An ordered list of requested config attributes.
///
/// Keys are unique. Setting a key that is already present replaces its value in place, so the
/// order in which keys were first added is kept.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConfigAttributes {
    pairs: Vec<(ConfigAttrib, EGLint)>,
}

impl ConfigAttributes {
    /// Creates an empty attribute list.
    #[inline]
    pub fn new() -> ConfigAttributes {
        ConfigAttributes::default()
    }

    /// Encodes the buffer requirements of a surface format.
    ///
    /// Unspecified channel sizes are requested as an explicit 0 rather than left out. With 0 the
    /// driver ignores the channel when sorting by color depth and falls back to sorting by
    /// smallest `EGL_BUFFER_SIZE`, so cheaper 16-bit configs come first. Leaving the key out
    /// would sort larger configs first.
    ///
    /// The surface type and renderable type are added by the chooser.
    pub fn from_format(format: &SurfaceFormat) -> ConfigAttributes {
        let mut attributes = ConfigAttributes::new();
        attributes.set(ConfigAttrib::RedSize, at_least_zero(format.red_size));
        attributes.set(ConfigAttrib::GreenSize, at_least_zero(format.green_size));
        attributes.set(ConfigAttrib::BlueSize, at_least_zero(format.blue_size));
        attributes.set(ConfigAttrib::AlphaSize, at_least_zero(format.alpha_size));

        attributes.set(ConfigAttrib::Samples, at_least_zero(format.samples));
        attributes.set(ConfigAttrib::SampleBuffers, (format.samples > 0) as EGLint);

        if format.renderable_type == RenderableType::OpenVG {
            // OpenVG clips with an alpha mask instead of a depth buffer.
            attributes.set(ConfigAttrib::AlphaMaskSize, 8);
        } else {
            attributes.set(ConfigAttrib::DepthSize, at_least_zero(format.depth_size));
            attributes.set(ConfigAttrib::StencilSize, at_least_zero(format.stencil_size));
        }

        if format.wants_float_components() {
            attributes.set(ConfigAttrib::ColorComponentType, EGL_COLOR_COMPONENT_TYPE_FLOAT_EXT);
        }

        attributes
    }

    /// Returns the value requested for `attrib`, if any.
    pub fn get(&self, attrib: ConfigAttrib) -> Option<EGLint> {
        self.position(attrib).map(|index| self.pairs[index].1)
    }

    /// Whether `attrib` is requested.
    #[inline]
    pub fn contains(&self, attrib: ConfigAttrib) -> bool {
        self.position(attrib).is_some()
    }

    /// Requests `attrib`, replacing any earlier value.
    pub fn set(&mut self, attrib: ConfigAttrib, value: EGLint) {
        match self.position(attrib) {
            Some(index) => self.pairs[index].1 = value,
            None => self.pairs.push((attrib, value)),
        }
    }

    /// Stops requesting `attrib`, returning the value it had.
    pub fn remove(&mut self, attrib: ConfigAttrib) -> Option<EGLint> {
        let index = self.position(attrib)?;
        Some(self.pairs.remove(index).1)
    }

    /// The number of requested attributes.
    #[inline]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether nothing is requested.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Iterates over the requested attributes in order.
    pub fn iter(&self) -> impl Iterator<Item = (ConfigAttrib, EGLint)> + '_ {
        self.pairs.iter().copied()
    }

    /// Flattens the list into the `EGL_NONE`-terminated form the driver takes.
    pub fn to_egl_list(&self) -> Vec<EGLint> {
        let mut list = Vec::with_capacity(self.pairs.len() * 2 + 4);
        for &(attrib, value) in &self.pairs {
            list.push(attrib.to_egl());
            list.push(value);
        }
        // Include some extra zeroes to work around broken implementations.
        list.extend_from_slice(&[egl::NONE as EGLint, 0, 0, 0]);
        list
    }

    /// Makes the request less demanding by one step.
    ///
    /// Returns false, leaving the list untouched, once there is nothing left to relax. Every step
    /// removes a key or lowers a value and no step adds a key back, so repeated calls always
    /// reach that point.
    pub fn reduce(&mut self) -> bool {
        if self.remove(ConfigAttrib::SwapBehavior).is_some() {
            return true;
        }

        if let Some(surface_type) = self.get(ConfigAttrib::SurfaceType) {
            let premultiplied = egl::VG_ALPHA_FORMAT_PRE_BIT as EGLint;
            if surface_type & premultiplied != 0 {
                self.set(ConfigAttrib::SurfaceType, surface_type & !premultiplied);
                return true;
            }
        }

        // A 16-bit buffer size trumps the color depth sort; there may be no such config though.
        if self.get(ConfigAttrib::BufferSize) == Some(16) {
            self.remove(ConfigAttrib::BufferSize);
            return true;
        }

        if let Some(samples) = self.get(ConfigAttrib::Samples) {
            if samples > 1 {
                self.set(ConfigAttrib::Samples, (samples / 2).min(MAX_SAMPLES));
            } else {
                self.remove(ConfigAttrib::Samples);
            }
            return true;
        }

        if self.remove(ConfigAttrib::SampleBuffers).is_some() {
            return true;
        }

        if let Some(depth) = self.get(ConfigAttrib::DepthSize) {
            if depth >= 32 {
                self.set(ConfigAttrib::DepthSize, 24);
            } else if depth > 1 {
                self.set(ConfigAttrib::DepthSize, 1);
            } else {
                self.remove(ConfigAttrib::DepthSize);
            }
            return true;
        }

        if self.remove(ConfigAttrib::AlphaSize).is_some() {
            if let Some(index) = self.position(ConfigAttrib::BindToTextureRgba) {
                if self.contains(ConfigAttrib::BindToTextureRgb) {
                    self.pairs.remove(index);
                } else {
                    self.pairs[index] = (ConfigAttrib::BindToTextureRgb, egl::TRUE as EGLint);
                }
            }
            return true;
        }

        if let Some(stencil) = self.get(ConfigAttrib::StencilSize) {
            if stencil > 1 {
                self.set(ConfigAttrib::StencilSize, 1);
            } else {
                self.remove(ConfigAttrib::StencilSize);
            }
            return true;
        }

        self.remove(ConfigAttrib::BindToTextureRgb).is_some()
    }

    fn position(&self, attrib: ConfigAttrib) -> Option<usize> {
        self.pairs.iter().position(|&(key, _)| key == attrib)
    }
}

#[inline]
fn at_least_zero(size: i32) -> EGLint {
    if size > 0 {
        size
    } else {
        0
    }
}

/// Picks the EGL config that best matches a surface format.
pub struct ConfigChooser<'a> {
    device: &'a Device,
    surface_type: EGLint,
    ignore_color_channels: bool,
}

// The color channel sizes a candidate config has to match. Zero means "any".
#[derive(Clone, Copy, Debug, PartialEq)]
struct ColorTargets {
    red: EGLint,
    green: EGLint,
    blue: EGLint,
    alpha: EGLint,
}

impl<'a> ConfigChooser<'a> {
    /// Creates a chooser for window surfaces on `device`.
    pub fn new(device: &'a Device) -> ConfigChooser<'a> {
        ConfigChooser {
            device,
            surface_type: egl::WINDOW_BIT as EGLint,
            ignore_color_channels: false,
        }
    }

    /// Sets the `EGL_SURFACE_TYPE` bits the config must support.
    pub fn surface_type(mut self, surface_type: EGLint) -> ConfigChooser<'a> {
        self.surface_type = surface_type;
        self
    }

    /// When set, the first config the driver returns is accepted even if its color channels are
    /// larger than requested.
    pub fn ignore_color_channels(mut self, ignore: bool) -> ConfigChooser<'a> {
        self.ignore_color_channels = ignore;
        self
    }

    /// Chooses a config, relaxing the request until the driver can satisfy it.
    ///
    /// The driver sorts configs with more color bits first whenever channel sizes are requested,
    /// so a request for 565 would get an 888 config if the first result were taken blindly.
    /// Returned configs are therefore filtered for an exact color match. If no step of the
    /// relaxation produces one, the first config the driver ever returned is used.
    pub fn choose(&self, format: &SurfaceFormat) -> Result<EGLConfig, Error> {
        let driver = self.device.driver();
        let egl_display = self.device.egl_display();

        let mut attributes = ConfigAttributes::from_format(format);
        attributes.set(ConfigAttrib::SurfaceType, self.surface_type);
        attributes.set(ConfigAttrib::RenderableType, self.renderable_type_bit(format));

        let mut fallback = None;
        loop {
            let egl_attributes = attributes.to_egl_list();
            unsafe {
                // See how many applicable configs there are.
                let mut config_count = 0;
                if driver.choose_config(egl_display, &egl_attributes, &mut [], &mut config_count) &&
                        config_count > 0 {
                    let targets = ColorTargets {
                        red: attributes.get(ConfigAttrib::RedSize).unwrap_or(0),
                        green: attributes.get(ConfigAttrib::GreenSize).unwrap_or(0),
                        blue: attributes.get(ConfigAttrib::BlueSize).unwrap_or(0),
                        alpha: attributes.get(ConfigAttrib::AlphaSize).unwrap_or(0),
                    };

                    // Enumerate all those configs.
                    let mut configs = vec![ptr::null(); config_count as usize];
                    if !driver.choose_config(egl_display,
                                             &egl_attributes,
                                             &mut configs,
                                             &mut config_count) {
                        config_count = 0;
                    }
                    configs.truncate(config_count.max(0) as usize);

                    if fallback.is_none() {
                        fallback = configs.first().copied();
                    }

                    if let Some(config) = configs.into_iter()
                                                 .find(|&config| self.filter_config(config,
                                                                                    &targets)) {
                        return Ok(config);
                    }
                }
            }

            if !attributes.reduce() {
                break;
            }
            trace!("Relaxed EGL config request to {:?}", attributes);
        }

        match fallback {
            Some(config) => Ok(config),
            None => {
                warn!("Cannot find an EGL config for {:?}", format);
                Err(Error::NoPixelFormatFound)
            }
        }
    }

    fn renderable_type_bit(&self, format: &SurfaceFormat) -> EGLint {
        match format.renderable_type {
            RenderableType::OpenVG => return egl::OPENVG_BIT as EGLint,
            RenderableType::OpenGL => return egl::OPENGL_BIT as EGLint,
            RenderableType::Default if prefers_desktop_gl(self.device) => {
                return egl::OPENGL_BIT as EGLint;
            }
            RenderableType::OpenGLES if format.major_version == 1 => {
                return egl::OPENGL_ES_BIT as EGLint;
            }
            RenderableType::Default | RenderableType::OpenGLES => {}
        }

        // Everything else needs OpenGL ES 2 or later.
        if format.major_version >= 3 && has_extension(self.device, "EGL_KHR_create_context") {
            egl::OPENGL_ES3_BIT as EGLint
        } else {
            egl::OPENGL_ES2_BIT as EGLint
        }
    }

    fn filter_config(&self, config: EGLConfig, targets: &ColorTargets) -> bool {
        if self.ignore_color_channels {
            return true;
        }

        // Only compare the channels whose size was given.
        let channel = |target: EGLint, attrib: ConfigAttrib| {
            if target == 0 {
                return 0;
            }
            get_config_attr(self.device, config, attrib.to_egl()).unwrap_or(0)
        };
        channel(targets.red, ConfigAttrib::RedSize) == targets.red &&
            channel(targets.green, ConfigAttrib::GreenSize) == targets.green &&
            channel(targets.blue, ConfigAttrib::BlueSize) == targets.blue &&
            channel(targets.alpha, ConfigAttrib::AlphaSize) == targets.alpha
    }
}

// Desktop GL is only used when the GPU module is desktop GL and the vendor isn't one whose EGL
// desktop GL support is development-only.
fn prefers_desktop_gl(device: &Device) -> bool {
    if device.module_api() != GLApi::GL {
        return false;
    }
    let vendor = unsafe {
        device.driver().query_string(device.egl_display(), egl::VENDOR as EGLint)
    };
    !vendor.map_or(false, |vendor| vendor.contains(DESKTOP_GL_BLOCKLISTED_VENDOR))
}

pub(crate) fn get_config_attr(device: &Device, config: EGLConfig, attr: EGLint) -> Option<EGLint> {
    unsafe { device.driver().get_config_attrib(device.egl_display(), config, attr) }
}

/// Reads back the surface format a config actually provides.
///
/// Buffer sizes come from the driver. The version, profile, options, color space and swap
/// interval are copied from `reference`. The renderable type is `OpenVG` or `OpenGL` only when
/// `reference` asked for it and the config supports it, and `OpenGLES` otherwise.
pub fn format_from_config(device: &Device, config: EGLConfig, reference: &SurfaceFormat)
                          -> SurfaceFormat {
    let attr = |attrib: ConfigAttrib| get_config_attr(device, config, attrib.to_egl()).unwrap_or(0);
    let renderable_bits = attr(ConfigAttrib::RenderableType);

    let renderable_type = match reference.renderable_type {
        RenderableType::OpenVG if renderable_bits & egl::OPENVG_BIT as EGLint != 0 => {
            RenderableType::OpenVG
        }
        RenderableType::OpenGL if renderable_bits & egl::OPENGL_BIT as EGLint != 0 => {
            RenderableType::OpenGL
        }
        RenderableType::Default if renderable_bits & egl::OPENGL_BIT as EGLint != 0 &&
                prefers_desktop_gl(device) => {
            RenderableType::OpenGL
        }
        _ => RenderableType::OpenGLES,
    };

    let mut format = SurfaceFormat {
        red_size: attr(ConfigAttrib::RedSize),
        green_size: attr(ConfigAttrib::GreenSize),
        blue_size: attr(ConfigAttrib::BlueSize),
        alpha_size: attr(ConfigAttrib::AlphaSize),
        depth_size: attr(ConfigAttrib::DepthSize),
        stencil_size: attr(ConfigAttrib::StencilSize),
        samples: attr(ConfigAttrib::Samples),
        renderable_type,
        ..*reference
    };
    // EGL doesn't support stereo buffers.
    format.options.remove(FormatOptions::STEREO_BUFFERS);

    // Some of the queries above fail when the attribute doesn't apply to the config's surface
    // type. Those errors don't matter, but they mustn't leak into later calls.
    unsafe {
        device.driver().get_error();
    }

    format
}

/// Whether the display advertises the named extension.
pub fn has_extension(device: &Device, name: &str) -> bool {
    let extensions = unsafe {
        device.driver().query_string(device.egl_display(), egl::EXTENSIONS as EGLint)
    };
    extensions.map_or(false, |extensions| extension_list_contains(&extensions, name))
}

pub(crate) fn extension_list_contains(extensions: &str, name: &str) -> bool {
    extensions.split_whitespace().any(|extension| extension == name)
}

static CONFIG_ATTRIBUTE_NAMES: [(EGLenum, &str); 27] = [
    (egl::BUFFER_SIZE, "EGL_BUFFER_SIZE"),
    (egl::ALPHA_SIZE, "EGL_ALPHA_SIZE"),
    (egl::BLUE_SIZE, "EGL_BLUE_SIZE"),
    (egl::GREEN_SIZE, "EGL_GREEN_SIZE"),
    (egl::RED_SIZE, "EGL_RED_SIZE"),
    (egl::DEPTH_SIZE, "EGL_DEPTH_SIZE"),
    (egl::STENCIL_SIZE, "EGL_STENCIL_SIZE"),
    (egl::CONFIG_CAVEAT, "EGL_CONFIG_CAVEAT"),
    (egl::CONFIG_ID, "EGL_CONFIG_ID"),
    (egl::LEVEL, "EGL_LEVEL"),
    (egl::MAX_PBUFFER_HEIGHT, "EGL_MAX_PBUFFER_HEIGHT"),
    (egl::MAX_PBUFFER_PIXELS, "EGL_MAX_PBUFFER_PIXELS"),
    (egl::MAX_PBUFFER_WIDTH, "EGL_MAX_PBUFFER_WIDTH"),
    (egl::NATIVE_RENDERABLE, "EGL_NATIVE_RENDERABLE"),
    (egl::NATIVE_VISUAL_ID, "EGL_NATIVE_VISUAL_ID"),
    (egl::NATIVE_VISUAL_TYPE, "EGL_NATIVE_VISUAL_TYPE"),
    (egl::SAMPLES, "EGL_SAMPLES"),
    (egl::SAMPLE_BUFFERS, "EGL_SAMPLE_BUFFERS"),
    (egl::SURFACE_TYPE, "EGL_SURFACE_TYPE"),
    (egl::TRANSPARENT_TYPE, "EGL_TRANSPARENT_TYPE"),
    (egl::TRANSPARENT_BLUE_VALUE, "EGL_TRANSPARENT_BLUE_VALUE"),
    (egl::TRANSPARENT_GREEN_VALUE, "EGL_TRANSPARENT_GREEN_VALUE"),
    (egl::TRANSPARENT_RED_VALUE, "EGL_TRANSPARENT_RED_VALUE"),
    (egl::BIND_TO_TEXTURE_RGB, "EGL_BIND_TO_TEXTURE_RGB"),
    (egl::BIND_TO_TEXTURE_RGBA, "EGL_BIND_TO_TEXTURE_RGBA"),
    (egl::MIN_SWAP_INTERVAL, "EGL_MIN_SWAP_INTERVAL"),
    (egl::MAX_SWAP_INTERVAL, "EGL_MAX_SWAP_INTERVAL"),
];

/// Returns `(name, value)` for every well-known attribute the driver reports for `config`.
pub fn config_attribute_values(device: &Device, config: EGLConfig) -> Vec<(&'static str, EGLint)> {
    CONFIG_ATTRIBUTE_NAMES.iter()
                          .filter_map(|&(attr, name)| {
                              get_config_attr(device, config, attr as EGLint)
                                  .map(|value| (name, value))
                          })
                          .collect()
}

/// Logs every well-known attribute of a config at debug level.
pub fn print_config(device: &Device, config: EGLConfig) {
    debug!("EGL config {:?}:", config);
    for (name, value) in config_attribute_values(device, config) {
        debug!("\t{}: {}", name, value);
    }
}
