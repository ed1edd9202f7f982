//! WebGL versions and their selection.

use std::cmp::Ordering;
use std::env;
use std::error::Error;
use std::fmt;
use std::str::FromStr;

/// Environment variable that overrides the default context version of a suite.
pub const VERSION_OVERRIDE_VAR: &str = "WEBGL_VERSION";

/// Describes a version of the WebGL API.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Version(pub u8, pub u8);

impl Version {
    /// WebGL 1.0, layered on OpenGL ES 2.0.
    pub const WEBGL1: Version = Version(1, 0);

    /// WebGL 2.0, layered on OpenGL ES 3.0.
    pub const WEBGL2: Version = Version(2, 0);

    /// Returns the major version number.
    #[inline]
    pub fn major(&self) -> u8 {
        self.0
    }

    /// Returns true if the API provides the WebGL 2 entry points (sized formats, unpack skip
    /// parameters, the width/height overloads of `texImage2D` taking a source).
    #[inline]
    pub fn is_webgl2(&self) -> bool {
        self.0 >= 2
    }

    /// Returns the version of OpenGL ES this API is specified against.
    pub fn gles_version(&self) -> (u8, u8) {
        if self.is_webgl2() {
            (3, 0)
        } else {
            (2, 0)
        }
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Version) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Version) -> Ordering {
        match self.0.cmp(&other.0) {
            Ordering::Equal => self.1.cmp(&other.1),
            a => a,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        write!(formatter, "WebGL {}.{}", self.0, self.1)
    }
}

/// Error returned when a version string can't be parsed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VersionParseError(pub String);

impl fmt::Display for VersionParseError {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        write!(formatter, "Could not parse a WebGL version from {:?}", self.0)
    }
}

impl Error for VersionParseError {}

impl FromStr for Version {
    type Err = VersionParseError;

    /// Accepts `"2"`, `"2.0"`, or the string returned by `getParameter(VERSION)`, for example
    /// `"WebGL 2.0 (OpenGL ES 3.0 Chromium)"`.
    fn from_str(s: &str) -> Result<Version, VersionParseError> {
        let err = || VersionParseError(s.to_owned());

        let trimmed = s.trim();
        let version = trimmed.strip_prefix("WebGL ").unwrap_or(trimmed);
        let version = version.split_whitespace().next().ok_or_else(err)?;

        let mut iter = version.split('.');
        let major = iter.next().ok_or_else(err)?;
        let minor = iter.next().unwrap_or("0");

        let major: u8 = major.parse().map_err(|_| err())?;
        let minor: u8 = minor.parse().map_err(|_| err())?;

        if major == 0 {
            return Err(err());
        }

        Ok(Version(major, minor))
    }
}

/// Returns the version the suite should run with.
///
/// The `WEBGL_VERSION` environment variable takes precedence over `default`, the same way the
/// `webglVersion` query string overrides a test page's default. An unparsable override is
/// ignored with a warning.
pub fn resolve_context_version(default: Version) -> Version {
    match env::var(VERSION_OVERRIDE_VAR) {
        Ok(value) => match value.parse() {
            Ok(version) => version,
            Err(e) => {
                log::warn!("ignoring {}: {}", VERSION_OVERRIDE_VAR, e);
                default
            }
        },
        Err(_) => default,
    }
}
