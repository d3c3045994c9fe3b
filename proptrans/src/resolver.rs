//! Derives target resource paths from the `basename[_locale].ext` naming
//! convention of resource bundles.

use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use regex::Regex;

use crate::{
    error::Error,
    fs::FileSystem,
    types::{LocaleTag, TargetFileSpec},
};

lazy_static! {
    // lang[_Script][_REGION] at the end of a file stem
    static ref LOCALE_SUFFIX: Regex = Regex::new(
        r"^(?P<base>.+?)_(?P<locale>[a-z]{2,3}(?:_[A-Z][a-z]{3})?(?:_(?:[A-Z]{2}|[0-9]{3}))?)$"
    )
    .unwrap();
}

/// ISO 639-1 codes, plus the legacy `iw`, `in` and `ji` still used by Java
/// resource bundles. Sorted for binary search.
const ISO_639_1: &[&str] = &[
    "aa", "ab", "ae", "af", "ak", "am", "an", "ar", "as", "av", "ay", "az", "ba", "be", "bg",
    "bh", "bi", "bm", "bn", "bo", "br", "bs", "ca", "ce", "ch", "co", "cr", "cs", "cu", "cv",
    "cy", "da", "de", "dv", "dz", "ee", "el", "en", "eo", "es", "et", "eu", "fa", "ff", "fi",
    "fj", "fo", "fr", "fy", "ga", "gd", "gl", "gn", "gu", "gv", "ha", "he", "hi", "ho", "hr",
    "ht", "hu", "hy", "hz", "ia", "id", "ie", "ig", "ii", "ik", "in", "io", "is", "it", "iu",
    "iw", "ja", "ji", "jv", "jw", "ka", "kg", "ki", "kj", "kk", "kl", "km", "kn", "ko", "kr",
    "ks", "ku", "kv", "kw", "ky", "la", "lb", "lg", "li", "ln", "lo", "lt", "lu", "lv", "mg",
    "mh", "mi", "mk", "ml", "mn", "mo", "mr", "ms", "mt", "my", "na", "nb", "nd", "ne", "ng",
    "nl", "nn", "no", "nr", "nv", "ny", "oc", "oj", "om", "or", "os", "pa", "pi", "pl", "ps",
    "pt", "qu", "rm", "rn", "ro", "ru", "rw", "sa", "sc", "sd", "se", "sg", "sh", "si", "sk",
    "sl", "sm", "sn", "so", "sq", "sr", "ss", "st", "su", "sv", "sw", "ta", "te", "tg", "th",
    "ti", "tk", "tl", "tn", "to", "tr", "ts", "tt", "tw", "ty", "ug", "uk", "ur", "uz", "ve",
    "vi", "vo", "wa", "wo", "xh", "yi", "yo", "za", "zh", "zu",
];

/// Three-letter languages commonly shipped as resource bundle locales.
const COMMON_ISO_639_3: &[&str] = &[
    "ast", "bem", "ceb", "chr", "ckb", "fil", "gsw", "haw", "hsb", "kab", "kok", "mai",
    "mni", "nds", "sat", "scn", "yue",
];

/// Whether `language` is a language subtag a bundle suffix may carry.
fn is_known_language(language: &str) -> bool {
    match language.len() {
        2 => ISO_639_1.binary_search(&language).is_ok(),
        3 => COMMON_ISO_639_3.binary_search(&language).is_ok(),
        _ => false,
    }
}

/// A resource path split into its bundle parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundlePath {
    pub dir: PathBuf,
    pub base: String,
    pub locale: Option<LocaleTag>,
    pub extension: String,
}

impl BundlePath {
    /// Splits `path`, reading a trailing `_locale` as the bundle locale only
    /// when its language subtag is a known language code. `error_msg` stays
    /// a base name.
    pub fn parse<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        Self::split(path.as_ref(), |locale| is_known_language(locale.language()))
    }

    /// Splits `path` for a source whose locale is already known: only a
    /// suffix equal to `source_locale` is removed from the base name.
    pub fn parse_for_locale<P: AsRef<Path>>(
        path: P,
        source_locale: &LocaleTag,
    ) -> Result<Self, Error> {
        Self::split(path.as_ref(), |locale| locale == source_locale)
    }

    fn split(path: &Path, accept: impl Fn(&LocaleTag) -> bool) -> Result<Self, Error> {
        let invalid = || Error::InvalidPath(path.display().to_string());

        let stem = path.file_stem().and_then(|s| s.to_str()).ok_or_else(invalid)?;
        let extension = path
            .extension()
            .and_then(|s| s.to_str())
            .ok_or_else(invalid)?
            .to_string();
        let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();

        let suffix = LOCALE_SUFFIX.captures(stem).and_then(|caps| {
            LocaleTag::parse(&caps["locale"])
                .ok()
                .filter(|locale| accept(locale))
                .map(|locale| (caps["base"].to_string(), locale))
        });
        let (base, locale) = match suffix {
            Some((base, locale)) => (base, Some(locale)),
            None => (stem.to_string(), None),
        };

        Ok(BundlePath {
            dir,
            base,
            locale,
            extension,
        })
    }

    /// The sibling file for `locale`.
    pub fn path_for(&self, locale: &LocaleTag) -> PathBuf {
        self.dir
            .join(format!("{}_{}.{}", self.base, locale, self.extension))
    }
}

/// The locale segment of a resource file name, if it has one.
///
/// # Example
/// ```rust
/// use proptrans::resolver::source_locale_of;
/// assert_eq!(source_locale_of("i18n/messages_fr_CA.properties").unwrap().as_str(), "fr_CA");
/// assert!(source_locale_of("i18n/messages.properties").is_none());
/// assert!(source_locale_of("i18n/error_msg.properties").is_none());
/// ```
pub fn source_locale_of<P: AsRef<Path>>(path: P) -> Option<LocaleTag> {
    BundlePath::parse(path).ok().and_then(|b| b.locale)
}

/// Produces one [`TargetFileSpec`] per target locale for `source`.
///
/// Locales equal to `source_locale` are skipped and duplicates collapse to
/// their first occurrence; otherwise the output follows `target_locales`.
/// Only a file name suffix equal to `source_locale` is replaced, so
/// `error_msg.properties` yields `error_msg_es.properties`.
/// `exists_on_disk` is a best-effort check taken at call time.
pub fn resolve_targets(
    source: &Path,
    source_locale: &LocaleTag,
    target_locales: &[LocaleTag],
    fs: &dyn FileSystem,
) -> Result<Vec<TargetFileSpec>, Error> {
    let bundle = BundlePath::parse_for_locale(source, source_locale)?;
    let mut specs: Vec<TargetFileSpec> = Vec::with_capacity(target_locales.len());

    for locale in target_locales {
        if locale == source_locale || specs.iter().any(|s| &s.locale == locale) {
            continue;
        }
        let path = bundle.path_for(locale);
        if path == source {
            continue;
        }
        let exists_on_disk = fs.exists(&path);
        specs.push(TargetFileSpec {
            locale: locale.clone(),
            path,
            exists_on_disk,
        });
    }

    Ok(specs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFs;

    fn tags(list: &[&str]) -> Vec<LocaleTag> {
        list.iter().map(|t| LocaleTag::parse(t).unwrap()).collect()
    }

    #[test]
    fn test_parse_default_bundle() {
        let bundle = BundlePath::parse("src/i18n/messages.properties").unwrap();
        assert_eq!(bundle.base, "messages");
        assert_eq!(bundle.locale, None);
        assert_eq!(bundle.extension, "properties");
        assert_eq!(bundle.dir, PathBuf::from("src/i18n"));
    }

    #[test]
    fn test_parse_localized_bundle() {
        let bundle = BundlePath::parse("app_messages_zh_Hant_TW.properties").unwrap();
        assert_eq!(bundle.base, "app_messages");
        assert_eq!(bundle.locale.unwrap().as_str(), "zh_Hant_TW");

        let bundle = BundlePath::parse("labels_es_419.properties").unwrap();
        assert_eq!(bundle.base, "labels");
        assert_eq!(bundle.locale.unwrap().as_str(), "es_419");
    }

    #[test]
    fn test_parse_rejects_missing_extension() {
        assert!(BundlePath::parse("messages").is_err());
    }

    #[test]
    fn test_path_for_substitutes_locale() {
        let bundle = BundlePath::parse("i18n/messages_en.properties").unwrap();
        let fr_ca = LocaleTag::parse("fr-CA").unwrap();
        assert_eq!(
            bundle.path_for(&fr_ca),
            PathBuf::from("i18n/messages_fr_CA.properties")
        );
    }

    #[test]
    fn test_resolve_targets_skips_source_and_duplicates() {
        let fs = MemoryFs::new().with_file("i18n/messages_es.properties", "a=Hola\n");
        let source = Path::new("i18n/messages_en.properties");
        let en = LocaleTag::parse("en").unwrap();

        let specs = resolve_targets(source, &en, &tags(&["es", "en", "fr_CA", "es"]), &fs).unwrap();

        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].locale.as_str(), "es");
        assert_eq!(specs[0].path, PathBuf::from("i18n/messages_es.properties"));
        assert!(specs[0].exists_on_disk);
        assert_eq!(specs[1].locale.as_str(), "fr_CA");
        assert!(!specs[1].exists_on_disk);
    }

    #[test]
    fn test_resolve_targets_is_deterministic() {
        let fs = MemoryFs::new();
        let source = Path::new("messages.properties");
        let en = LocaleTag::parse("en").unwrap();
        let locales = tags(&["de", "ja", "pt_BR"]);
        let first = resolve_targets(source, &en, &locales, &fs).unwrap();
        let second = resolve_targets(source, &en, &locales, &fs).unwrap();
        assert_eq!(first, second);
        assert_eq!(first[2].path, PathBuf::from("messages_pt_BR.properties"));
    }

    #[test]
    fn test_parse_ignores_suffixes_that_are_not_languages() {
        let bundle = BundlePath::parse("i18n/error_msg.properties").unwrap();
        assert_eq!(bundle.base, "error_msg");
        assert_eq!(bundle.locale, None);
        assert!(source_locale_of("ui_btn.properties").is_none());
        assert_eq!(source_locale_of("ui_fil.properties").unwrap().as_str(), "fil");
        assert_eq!(source_locale_of("legacy_iw.properties").unwrap().as_str(), "iw");
    }

    #[test]
    fn test_resolve_targets_keeps_non_locale_suffix() {
        let fs = MemoryFs::new();
        let en = LocaleTag::parse("en").unwrap();

        let specs =
            resolve_targets(Path::new("i18n/error_msg.properties"), &en, &tags(&["es"]), &fs)
                .unwrap();

        assert_eq!(specs[0].path, PathBuf::from("i18n/error_msg_es.properties"));
    }

    #[test]
    fn test_resolve_targets_strips_only_the_source_locale() {
        let fs = MemoryFs::new();
        let en = LocaleTag::parse("en").unwrap();
        let locales = tags(&["fr"]);

        // "de" is a language, but not this bundle's locale.
        let specs = resolve_targets(Path::new("labels_de.properties"), &en, &locales, &fs).unwrap();
        assert_eq!(specs[0].path, PathBuf::from("labels_de_fr.properties"));

        let specs = resolve_targets(Path::new("labels_en.properties"), &en, &locales, &fs).unwrap();
        assert_eq!(specs[0].path, PathBuf::from("labels_fr.properties"));
    }

    #[test]
    fn test_language_tables_are_sorted() {
        assert!(ISO_639_1.windows(2).all(|w| w[0] < w[1]));
        assert!(COMMON_ISO_639_3.windows(2).all(|w| w[0] < w[1]));
    }
}
