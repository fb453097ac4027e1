// eglctx/src/renderer.rs
//
//! Renderer preferences supplied by the GPU capability policy.

use bitflags::bitflags;
use std::env;

/// The environment variable that selects an ANGLE backend.
pub const ANGLE_PLATFORM_ENV: &str = "EGLCTX_ANGLE_PLATFORM";

bitflags! {
    /// The renderers a GPU capability policy allows or prefers.
    ///
    /// Only the ANGLE backend bits influence display creation; the rest are carried through for
    /// policies that share one flag set between backends.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct Renderer: u32 {
        /// Desktop OpenGL through the system driver.
        const DESKTOP_GL                 = 0x0001;
        /// ANGLE on Direct3D 11.
        const ANGLE_D3D11                = 0x0002;
        /// ANGLE on Direct3D 9.
        const ANGLE_D3D9                 = 0x0004;
        /// ANGLE on Direct3D 11 using WARP, the software rasterizer.
        const ANGLE_D3D11_WARP           = 0x0008;
        /// OpenGL ES through ANGLE with no specific backend.
        const GLES                       = 0x0010;
        /// A software rasterizer.
        const SOFTWARE_RASTERIZER        = 0x0020;
        /// ANGLE on Direct3D 11 on 12.
        const ANGLE_D3D11_ON_12          = 0x0040;
        /// ANGLE on desktop OpenGL.
        const ANGLE_OPENGL               = 0x0080;
        /// Disable rotation support.
        const DISABLE_ROTATION           = 0x0100;
        /// Disable the program binary cache.
        const DISABLE_PROGRAM_CACHE      = 0x0200;

        /// Every ANGLE backend.
        const ANGLE_BACKEND_MASK = Self::ANGLE_D3D11.bits()
            | Self::ANGLE_D3D9.bits()
            | Self::ANGLE_D3D11_WARP.bits()
            | Self::ANGLE_D3D11_ON_12.bits()
            | Self::ANGLE_OPENGL.bits();
    }
}

impl Renderer {
    /// Reads the ANGLE backend requested through `EGLCTX_ANGLE_PLATFORM`.
    ///
    /// Recognized values are `d3d11`, `d3d9`, `warp`, `d3d11on12` and `gl`. Anything else,
    /// including an unset variable, yields an empty set.
    pub fn requested_gles_renderer() -> Renderer {
        match env::var(ANGLE_PLATFORM_ENV) {
            Ok(value) => Renderer::from_angle_platform_name(&value),
            Err(_) => Renderer::empty(),
        }
    }

    /// Maps an ANGLE platform name to its backend flag.
    pub fn from_angle_platform_name(name: &str) -> Renderer {
        match name.trim().to_ascii_lowercase().as_str() {
            "d3d11" => Renderer::ANGLE_D3D11,
            "d3d9" => Renderer::ANGLE_D3D9,
            "warp" => Renderer::ANGLE_D3D11_WARP,
            "d3d11on12" => Renderer::ANGLE_D3D11_ON_12,
            "gl" => Renderer::ANGLE_OPENGL,
            other => {
                if !other.is_empty() {
                    warn!("Unknown ANGLE platform {:?}, ignoring", other);
                }
                Renderer::empty()
            }
        }
    }
}
