// eglctx/src/format.rs
//
//! The abstract surface format an application requests.

use bitflags::bitflags;

/// Which rendering API a surface format is meant for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RenderableType {
    /// Let the platform pick: desktop OpenGL where that is usable, OpenGL ES otherwise.
    #[default]
    Default,
    /// Desktop OpenGL.
    OpenGL,
    /// OpenGL ES.
    OpenGLES,
    /// OpenVG.
    OpenVG,
}

/// The OpenGL profile requested for desktop GL contexts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Profile {
    /// No profile; the only meaningful value for EGL contexts.
    #[default]
    NoProfile,
    /// The core profile.
    Core,
    /// The compatibility profile.
    Compatibility,
}

bitflags! {
    /// Optional behaviors requested alongside a surface format.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct FormatOptions: u8 {
        /// Left and right buffers for stereoscopic rendering.
        const STEREO_BUFFERS      = 0x01;
        /// A debug context.
        const DEBUG_CONTEXT       = 0x02;
        /// Deprecated functions remain available (compatibility).
        const DEPRECATED_FUNCTIONS = 0x04;
        /// Graphics reset notifications are enabled.
        const RESET_NOTIFICATION  = 0x08;
        /// Protected content surfaces.
        const PROTECTED_CONTENT   = 0x10;
    }
}

/// The primaries of a color space.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorPrimaries {
    /// sRGB / BT.709.
    SRgb,
    /// Adobe RGB (1998).
    AdobeRgb,
    /// DCI-P3 with a D65 white point.
    DciP3D65,
    /// ProPhoto RGB.
    ProPhotoRgb,
    /// BT.2020.
    Bt2020,
    /// Extended-range linear sRGB (scRGB), which needs floating point color components.
    ScRgb,
}

/// The transfer function of a color space.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransferFunction {
    /// Linear.
    Linear,
    /// A simple gamma curve.
    Gamma,
    /// The sRGB curve.
    SRgb,
    /// The ProPhoto RGB curve.
    ProPhotoRgb,
    /// The BT.2020 curve.
    Bt2020,
    /// SMPTE ST 2084, also known as PQ.
    St2084,
    /// Hybrid log-gamma.
    Hlg,
}

/// A color space, described by its primaries and transfer function.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColorSpace {
    /// The color primaries.
    pub primaries: ColorPrimaries,
    /// The transfer function.
    pub transfer: TransferFunction,
}

impl ColorSpace {
    /// Creates a color space from its primaries and transfer function.
    #[inline]
    pub fn new(primaries: ColorPrimaries, transfer: TransferFunction) -> ColorSpace {
        ColorSpace { primaries, transfer }
    }

    /// The standard sRGB color space.
    #[inline]
    pub fn srgb() -> ColorSpace {
        ColorSpace::new(ColorPrimaries::SRgb, TransferFunction::SRgb)
    }

    /// Extended-range linear sRGB.
    #[inline]
    pub fn scrgb_linear() -> ColorSpace {
        ColorSpace::new(ColorPrimaries::ScRgb, TransferFunction::Linear)
    }

    /// BT.2020 primaries with the PQ transfer function (HDR10).
    #[inline]
    pub fn bt2020_pq() -> ColorSpace {
        ColorSpace::new(ColorPrimaries::Bt2020, TransferFunction::St2084)
    }
}

/// A partially specified description of the surface an application wants to render to.
///
/// Buffer sizes of `-1` mean "unspecified"; the config chooser treats them as "don't care".
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceFormat {
    /// Bits in the red channel.
    pub red_size: i32,
    /// Bits in the green channel.
    pub green_size: i32,
    /// Bits in the blue channel.
    pub blue_size: i32,
    /// Bits in the alpha channel.
    pub alpha_size: i32,
    /// Bits in the depth buffer.
    pub depth_size: i32,
    /// Bits in the stencil buffer.
    pub stencil_size: i32,
    /// Samples per pixel for multisampling.
    pub samples: i32,
    /// The rendering API.
    pub renderable_type: RenderableType,
    /// The major API version.
    pub major_version: i32,
    /// The minor API version.
    pub minor_version: i32,
    /// The desktop GL profile.
    pub profile: Profile,
    /// Additional options.
    pub options: FormatOptions,
    /// The color space of the window surface, if any was requested.
    pub color_space: Option<ColorSpace>,
    /// The swap interval; negative values leave the driver's setting untouched.
    pub swap_interval: i32,
}

impl Default for SurfaceFormat {
    fn default() -> SurfaceFormat {
        SurfaceFormat {
            red_size: -1,
            green_size: -1,
            blue_size: -1,
            alpha_size: -1,
            depth_size: -1,
            stencil_size: -1,
            samples: -1,
            renderable_type: RenderableType::Default,
            major_version: 2,
            minor_version: 0,
            profile: Profile::NoProfile,
            options: FormatOptions::empty(),
            color_space: None,
            swap_interval: 1,
        }
    }
}

impl SurfaceFormat {
    /// Sets the red, green, blue and alpha channel sizes at once.
    pub fn with_rgba_sizes(mut self, red: i32, green: i32, blue: i32, alpha: i32) -> SurfaceFormat {
        self.red_size = red;
        self.green_size = green;
        self.blue_size = blue;
        self.alpha_size = alpha;
        self
    }

    /// Sets the requested API version.
    pub fn with_version(mut self, major: i32, minor: i32) -> SurfaceFormat {
        self.major_version = major;
        self.minor_version = minor;
        self
    }

    /// Sets the requested rendering API.
    pub fn with_renderable_type(mut self, renderable_type: RenderableType) -> SurfaceFormat {
        self.renderable_type = renderable_type;
        self
    }

    /// Whether the color space asks for extended-range linear (floating point) components.
    #[inline]
    pub fn wants_float_components(&self) -> bool {
        matches!(self.color_space, Some(ColorSpace { primaries: ColorPrimaries::ScRgb, .. }))
    }
}
