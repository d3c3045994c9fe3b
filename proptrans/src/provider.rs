//! The translation backend seam.
//!
//! Concrete HTTP clients live outside this crate; they implement
//! [`TranslationProvider`]. [`PseudoProvider`] is an offline implementation
//! that pseudo-localizes text, useful for checking that a UI copes with
//! translated strings before real translations exist.

use std::time::Duration;

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;

use crate::{
    error::{ErrorKind, ProviderError},
    types::LocaleTag,
};

lazy_static! {
    // MessageFormat arguments and printf conversions
    static ref PLACEHOLDER_REGEX: Regex =
        Regex::new(r"\{[^{}]*\}|%(?:\d+\$)?[-#+ 0,(]*\d*(?:\.\d+)?[a-zA-Z%]").unwrap();
}

/// Given text and a locale pair, returns the translated text or a classified
/// failure.
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    /// Name used in logs and reports.
    fn name(&self) -> &str {
        "provider"
    }

    /// The most simultaneous calls this provider accepts, if it has a limit.
    /// The orchestrator never exceeds the smaller of this and its own limit.
    fn max_concurrency(&self) -> Option<usize> {
        None
    }

    /// Translates `text` from `from` to `to`.
    ///
    /// `timeout` is the budget the caller grants this call; the orchestrator
    /// enforces it independently, so providers may use it only as a hint for
    /// their own transport timeouts.
    async fn translate(
        &self,
        text: &str,
        from: &LocaleTag,
        to: &LocaleTag,
        timeout: Duration,
    ) -> Result<String, ProviderError>;
}

/// Pseudo-localization: accents Latin letters and brackets the result while
/// leaving placeholders intact.
#[derive(Debug, Clone, Copy, Default)]
pub struct PseudoProvider;

impl PseudoProvider {
    pub fn pseudo_localize(text: &str) -> String {
        let mut out = String::with_capacity(text.len() * 2 + 2);
        out.push('[');
        let mut last = 0;
        for m in PLACEHOLDER_REGEX.find_iter(text) {
            out.extend(text[last..m.start()].chars().map(accent));
            out.push_str(m.as_str());
            last = m.end();
        }
        out.extend(text[last..].chars().map(accent));
        out.push(']');
        out
    }
}

#[async_trait]
impl TranslationProvider for PseudoProvider {
    fn name(&self) -> &str {
        "pseudo"
    }

    async fn translate(
        &self,
        text: &str,
        _from: &LocaleTag,
        _to: &LocaleTag,
        _timeout: Duration,
    ) -> Result<String, ProviderError> {
        if text.is_empty() {
            return Err(ProviderError::new(ErrorKind::EmptyInput, "nothing to translate"));
        }
        Ok(Self::pseudo_localize(text))
    }
}

fn accent(c: char) -> char {
    match c {
        'a' => 'á',
        'c' => 'ç',
        'e' => 'é',
        'g' => 'ĝ',
        'h' => 'ĥ',
        'i' => 'í',
        'l' => 'ļ',
        'n' => 'ñ',
        'o' => 'ö',
        's' => 'š',
        'u' => 'ü',
        'y' => 'ý',
        'z' => 'ž',
        'A' => 'Å',
        'C' => 'Ç',
        'E' => 'É',
        'H' => 'Ĥ',
        'I' => 'Î',
        'N' => 'Ñ',
        'O' => 'Ö',
        'S' => 'Š',
        'U' => 'Û',
        'Y' => 'Ý',
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pseudo_localize_keeps_placeholders() {
        assert_eq!(
            PseudoProvider::pseudo_localize("Hello {0}, you have %d new %1$s"),
            "[Ĥéļļö {0}, ýöü ĥávé %d ñéw %1$s]"
        );
    }

    #[test]
    fn test_pseudo_localize_named_placeholder() {
        assert_eq!(
            PseudoProvider::pseudo_localize("{user} signed in"),
            "[{user} šíĝñéd íñ]"
        );
    }

    #[tokio::test]
    async fn test_pseudo_provider_rejects_empty_input() {
        let en = LocaleTag::parse("en").unwrap();
        let es = LocaleTag::parse("es").unwrap();
        let err = PseudoProvider
            .translate("", &en, &es, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::EmptyInput);

        let ok = PseudoProvider
            .translate("Save", &en, &es, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(ok, "[Šávé]");
    }
}
