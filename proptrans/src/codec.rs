//! Character sets and codec selection.
//!
//! A resource file is read with one [`Charset`]; the codec for a file is
//! picked from its extension, the same way the format is inferred elsewhere in
//! the crate.

use std::{fmt::Display, path::Path, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    error::Error,
    formats::{FormatType, PropertiesCodec},
    traits::ResourceCodec,
};

/// Character set of a resource file on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Charset {
    /// UTF-8, the default for modern resource bundles. A BOM is accepted on
    /// input; UTF-16 files with a BOM are also read.
    #[default]
    #[serde(rename = "utf-8", alias = "utf8", alias = "UTF-8")]
    Utf8,
    /// ISO-8859-1, the classic `.properties` encoding. Characters outside
    /// Latin-1 are written as `\uXXXX` escapes.
    #[serde(rename = "iso-8859-1", alias = "latin1", alias = "ISO-8859-1")]
    Latin1,
}

impl Display for Charset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Charset::Utf8 => write!(f, "utf-8"),
            Charset::Latin1 => write!(f, "iso-8859-1"),
        }
    }
}

impl FromStr for Charset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(Charset::Utf8),
            "iso-8859-1" | "iso8859-1" | "latin1" | "latin-1" => Ok(Charset::Latin1),
            other => Err(Error::InvalidConfig(format!("unsupported charset `{}`", other))),
        }
    }
}

/// Infers the resource format from a path's extension.
///
/// # Example
/// ```rust
/// use proptrans::{codec::infer_format_from_extension, formats::FormatType};
/// assert_eq!(
///     infer_format_from_extension("i18n/messages_fr.properties"),
///     Some(FormatType::Properties)
/// );
/// assert_eq!(infer_format_from_extension("strings.xml"), None);
/// ```
pub fn infer_format_from_extension<P: AsRef<Path>>(path: P) -> Option<FormatType> {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(|ext| FormatType::from_str(ext).ok())
}

/// Returns the codec for `path`, or [`Error::InvalidPath`] when the format is
/// not supported.
pub fn codec_for_path<P: AsRef<Path>>(
    path: P,
    charset: Charset,
) -> Result<Box<dyn ResourceCodec>, Error> {
    match infer_format_from_extension(&path) {
        Some(FormatType::Properties) => Ok(Box::new(PropertiesCodec::new(charset))),
        None => Err(Error::InvalidPath(format!(
            "unsupported resource file: {}",
            path.as_ref().display()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_charset_parse() {
        assert_eq!("UTF-8".parse::<Charset>().unwrap(), Charset::Utf8);
        assert_eq!("latin1".parse::<Charset>().unwrap(), Charset::Latin1);
        assert_eq!("ISO-8859-1".parse::<Charset>().unwrap(), Charset::Latin1);
        assert!("ebcdic".parse::<Charset>().is_err());
    }

    #[test]
    fn test_charset_serde_names() {
        assert_eq!(serde_json::to_string(&Charset::Latin1).unwrap(), "\"iso-8859-1\"");
        let parsed: Charset = serde_json::from_str("\"utf8\"").unwrap();
        assert_eq!(parsed, Charset::Utf8);
    }

    #[test]
    fn test_codec_for_path() {
        assert!(codec_for_path("a/messages.properties", Charset::Utf8).is_ok());
        assert!(matches!(
            codec_for_path("a/messages.json", Charset::Utf8),
            Err(Error::InvalidPath(_))
        ));
        assert!(codec_for_path("Makefile", Charset::Utf8).is_err());
    }
}
