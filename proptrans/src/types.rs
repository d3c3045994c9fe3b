//! Core, format-agnostic types for proptrans.
//! Codecs decode into these; the merge policy transforms them; encoders
//! serialize them back.

use std::{collections::HashMap, fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use unic_langid::LanguageIdentifier;

use crate::error::{Error, ProviderError};

/// A validated locale tag.
///
/// Accepts both BCP-47 (`fr-CA`) and the underscore form used in resource
/// bundle file names (`fr_CA`). Displays in the underscore form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LocaleTag(String);

impl LocaleTag {
    pub fn parse(tag: &str) -> Result<Self, Error> {
        let trimmed = tag.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidLocale(tag.to_string()));
        }
        let lang_id = trimmed
            .replace('_', "-")
            .parse::<LanguageIdentifier>()
            .map_err(|_| Error::InvalidLocale(tag.to_string()))?;
        Ok(LocaleTag(lang_id.to_string().replace('-', "_")))
    }

    /// The underscore form, e.g. `zh_Hant_TW`.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The BCP-47 form, e.g. `zh-Hant-TW`.
    pub fn to_bcp47(&self) -> String {
        self.0.replace('_', "-")
    }

    /// The primary language subtag.
    pub fn language(&self) -> &str {
        self.0.split('_').next().unwrap_or(&self.0)
    }
}

impl Display for LocaleTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for LocaleTag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LocaleTag::parse(s)
    }
}

impl TryFrom<String> for LocaleTag {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        LocaleTag::parse(&value)
    }
}

impl From<LocaleTag> for String {
    fn from(value: LocaleTag) -> Self {
        value.0
    }
}

/// How existing values in a target resource are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverwritePolicy {
    /// Only keys missing from the target are translated.
    #[default]
    SkipExisting,
    /// Every source key is translated again.
    OverwriteAll,
    /// Missing keys and keys whose target value is blank are translated.
    #[serde(rename = "overwrite-blank")]
    OverwriteOnlyIfBlankOrMissing,
}

impl Display for OverwritePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OverwritePolicy::SkipExisting => write!(f, "skip-existing"),
            OverwritePolicy::OverwriteAll => write!(f, "overwrite-all"),
            OverwritePolicy::OverwriteOnlyIfBlankOrMissing => write!(f, "overwrite-blank"),
        }
    }
}

impl FromStr for OverwritePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "skip" | "skip-existing" => Ok(OverwritePolicy::SkipExisting),
            "overwrite" | "overwrite-all" => Ok(OverwritePolicy::OverwriteAll),
            "overwrite-blank" | "overwrite-only-if-blank-or-missing" => {
                Ok(OverwritePolicy::OverwriteOnlyIfBlankOrMissing)
            }
            other => Err(Error::InvalidConfig(format!(
                "unknown overwrite policy `{}`",
                other
            ))),
        }
    }
}

/// Formatting details of an entry as it appeared on disk.
///
/// Only the codec interprets these; everything else carries them along.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EntryMetadata {
    /// Comment and blank lines that precede the entry, verbatim.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub leading: Vec<String>,
    /// The text between key and value, e.g. `=` or ` : `.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub separator: Option<String>,
}

/// A single key/value pair of a resource document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub key: String,
    pub value: String,
    #[serde(default)]
    pub metadata: EntryMetadata,
}

impl Entry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Entry {
            key: key.into(),
            value: value.into(),
            metadata: EntryMetadata::default(),
        }
    }

    /// Whether the value is empty or whitespace only.
    pub fn is_blank(&self) -> bool {
        self.value.trim().is_empty()
    }
}

impl Display for Entry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entry {{ key: {}, value: {} }}", self.key, self.value)
    }
}

/// An ordered key/value resource with unique keys.
///
/// Documents are values: transformations consume a document and return a new
/// one instead of mutating shared state.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "DocumentParts", into = "DocumentParts")]
pub struct ResourceDocument {
    entries: Vec<Entry>,
    /// Comment and blank lines after the last entry.
    trailer: Vec<String>,
    /// Position of each key in `entries`.
    index: HashMap<String, usize>,
}

#[derive(Serialize, Deserialize)]
struct DocumentParts {
    entries: Vec<Entry>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    trailer: Vec<String>,
}

impl From<DocumentParts> for ResourceDocument {
    fn from(parts: DocumentParts) -> Self {
        ResourceDocument::from_parts(parts.entries, parts.trailer)
    }
}

impl From<ResourceDocument> for DocumentParts {
    fn from(document: ResourceDocument) -> Self {
        DocumentParts {
            entries: document.entries,
            trailer: document.trailer,
        }
    }
}

impl ResourceDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a document from plain pairs. Later duplicates are ignored.
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        pairs
            .into_iter()
            .fold(Self::new(), |doc, (k, v)| doc.with_entry(Entry::new(k, v)))
    }

    /// Builds a document from decoded entries; later duplicates are dropped.
    pub(crate) fn from_parts(entries: Vec<Entry>, trailer: Vec<String>) -> Self {
        entries
            .into_iter()
            .fold(Self::new(), |doc, entry| doc.with_entry(entry))
            .with_trailer(trailer)
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn trailer(&self) -> &[String] {
        &self.trailer
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Entry> {
        self.index.get(key).map(|&i| &self.entries[i])
    }

    pub fn value(&self, key: &str) -> Option<&str> {
        self.get(key).map(|e| e.value.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.key.as_str())
    }

    /// Key/value pairs in document order.
    pub fn pairs(&self) -> Vec<(&str, &str)> {
        self.entries
            .iter()
            .map(|e| (e.key.as_str(), e.value.as_str()))
            .collect()
    }

    /// Appends `entry` unless its key is already present.
    pub fn with_entry(mut self, entry: Entry) -> Self {
        if !self.contains_key(&entry.key) {
            self.index.insert(entry.key.clone(), self.entries.len());
            self.entries.push(entry);
        }
        self
    }

    /// Replaces the value of `key` in place, keeping its position and
    /// metadata. Returns the document unchanged if the key is absent.
    pub fn with_value(mut self, key: &str, value: impl Into<String>) -> Self {
        if let Some(&i) = self.index.get(key) {
            self.entries[i].value = value.into();
        }
        self
    }

    pub fn with_trailer(mut self, trailer: Vec<String>) -> Self {
        self.trailer = trailer;
        self
    }
}

/// One unit of translation work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationUnit {
    pub key: String,
    pub source_text: String,
    pub source_locale: LocaleTag,
    pub target_locale: LocaleTag,
}

/// What happened to a translation unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Success { text: String },
    Failure(ProviderError),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }
}

impl From<Result<String, ProviderError>> for Outcome {
    fn from(value: Result<String, ProviderError>) -> Self {
        match value {
            Ok(text) => Outcome::Success { text },
            Err(err) => Outcome::Failure(err),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationResult {
    pub unit: TranslationUnit,
    pub outcome: Outcome,
}

/// A target resource file derived for one locale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetFileSpec {
    pub locale: LocaleTag,
    pub path: std::path::PathBuf,
    pub exists_on_disk: bool,
}
