// eglctx/src/info.rs
//
//! OpenGL information.

/// The API (OpenGL or OpenGL ES).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GLApi {
    /// OpenGL (full or desktop OpenGL).
    GL,
    /// OpenGL ES (embedded OpenGL).
    GLES,
}

/// An OpenGL or OpenGL ES version.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct GLVersion {
    /// The major OpenGL version (e.g. 3 in 3.1).
    pub major: u8,
    /// The minor OpenGL version (e.g. 1 in 3.1).
    pub minor: u8,
}

impl GLVersion {
    /// Creates a GL version structure with the given major and minor version numbers.
    #[inline]
    pub fn new(major: u8, minor: u8) -> GLVersion {
        GLVersion { major, minor }
    }

    /// Parses the major and minor version out of a `GL_VERSION` string.
    ///
    /// Accepts the OpenGL ES forms (`OpenGL ES 3.0 (ANGLE 2.1.0)`, `OpenGL ES-CM 1.1`) as well as
    /// desktop strings that start with the version number (`4.6.0 NVIDIA 535.54`).
    pub fn parse(version_string: &str) -> Option<GLVersion> {
        let version_string = version_string.trim_start();
        let version_string = match version_string.strip_prefix("OpenGL ES") {
            Some(rest) => rest
                .trim_start_matches("-CM")
                .trim_start_matches("-CL")
                .trim_start(),
            None => version_string,
        };

        let mut version_string_iter = version_string.split(|c| c == '.' || c == ' ');
        let major = version_string_iter.next()?.parse().ok()?;
        let minor = version_string_iter.next()?.parse().ok()?;
        Some(GLVersion { major, minor })
    }
}
