//! Traits for format-agnostic decoding and encoding of resource documents.

use std::path::Path;

use crate::{error::Error, types::ResourceDocument};

/// A codec that turns the bytes of one resource file into a
/// [`ResourceDocument`] and back.
///
/// Implementations must satisfy the round-trip law on parsed structure:
/// `decode(encode(decode(x))) == decode(x)` for every valid `x`.
///
/// # Example
///
/// ```rust
/// use proptrans::{Charset, formats::PropertiesCodec, traits::ResourceCodec};
///
/// let codec = PropertiesCodec::new(Charset::Utf8);
/// let doc = codec.decode_str("greeting = Hello\n")?;
/// assert_eq!(doc.value("greeting"), Some("Hello"));
/// # Ok::<(), proptrans::Error>(())
/// ```
pub trait ResourceCodec: Send + Sync {
    /// Parse raw file bytes.
    fn decode(&self, bytes: &[u8]) -> Result<ResourceDocument, Error>;

    /// Serialize a document to raw file bytes.
    fn encode(&self, document: &ResourceDocument) -> Result<Vec<u8>, Error>;

    /// Parse from an already decoded string.
    fn decode_str(&self, text: &str) -> Result<ResourceDocument, Error>;

    /// Parse from file path.
    fn read_from<P: AsRef<Path>>(&self, path: P) -> Result<ResourceDocument, Error>
    where
        Self: Sized,
    {
        let bytes = std::fs::read(path)?;
        self.decode(&bytes)
    }

    /// Write to file path (not atomic; see [`crate::fs::LocalFs`] for that).
    fn write_to<P: AsRef<Path>>(&self, document: &ResourceDocument, path: P) -> Result<(), Error>
    where
        Self: Sized,
    {
        let bytes = self.encode(document)?;
        std::fs::write(path, bytes).map_err(Error::Io)
    }
}
