//! Admin API version selection.

use crate::error::ConfigError;
use std::fmt;
use std::str::FromStr;

/// An Admin API version, used to build the `/admin/api/{version}` path.
///
/// Shopify releases stable versions quarterly (January, April, July,
/// October). Any well-formed quarterly version is accepted, so newer
/// releases do not require a crate update.
///
/// # Example
///
/// ```rust
/// use shopify_graphql_executor::ApiVersion;
///
/// let version: ApiVersion = "2025-04".parse().unwrap();
/// assert_eq!(version.to_string(), "2025-04");
/// assert!(version < ApiVersion::Unstable);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ApiVersion {
    /// A quarterly stable release.
    Stable {
        /// Release year, e.g. 2025.
        year: u16,
        /// Release month: 1, 4, 7 or 10.
        month: u8,
    },
    /// The unstable preview API.
    Unstable,
}

impl ApiVersion {
    /// The most recent stable version known to this crate.
    pub const LATEST: Self = Self::Stable {
        year: 2025,
        month: 10,
    };

    /// Returns the latest stable API version.
    #[must_use]
    pub const fn latest() -> Self {
        Self::LATEST
    }

    /// Returns `true` for quarterly releases.
    #[must_use]
    pub const fn is_stable(&self) -> bool {
        matches!(self, Self::Stable { .. })
    }
}

impl Default for ApiVersion {
    fn default() -> Self {
        Self::LATEST
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stable { year, month } => write!(f, "{year:04}-{month:02}"),
            Self::Unstable => f.write_str("unstable"),
        }
    }
}

impl FromStr for ApiVersion {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        if s == "unstable" {
            return Ok(Self::Unstable);
        }

        let invalid = || ConfigError::InvalidApiVersion { version: s.clone() };
        let (year, month) = s.split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }

        let year: u16 = year.parse().map_err(|_| invalid())?;
        let month: u8 = month.parse().map_err(|_| invalid())?;
        if !matches!(month, 1 | 4 | 7 | 10) {
            return Err(invalid());
        }

        Ok(Self::Stable { year, month })
    }
}
