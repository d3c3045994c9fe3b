//! Supported localization resource formats.
//!
//! Each format lives in its own module and implements
//! [`crate::traits::ResourceCodec`]. [`FormatType`] names them for generic
//! handling.

pub mod properties;

use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

pub use properties::PropertiesCodec;

use crate::Error;

/// Represents all supported resource file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatType {
    /// Java `.properties` resource bundles.
    Properties,
}

impl Display for FormatType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FormatType::Properties => write!(f, "properties"),
        }
    }
}

/// Accepts `"properties"` (case-insensitive, optional leading dot).
///
/// # Example
/// ```rust
/// use proptrans::formats::FormatType;
/// use std::str::FromStr;
/// assert_eq!(FormatType::from_str(".properties").unwrap(), FormatType::Properties);
/// assert!(FormatType::from_str("xml").is_err());
/// ```
impl FromStr for FormatType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().trim_start_matches('.').to_ascii_lowercase();
        match s.as_str() {
            "properties" => Ok(FormatType::Properties),
            other => Err(Error::InvalidPath(format!("unknown format `{}`", other))),
        }
    }
}

impl FormatType {
    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            FormatType::Properties => "properties",
        }
    }
}
