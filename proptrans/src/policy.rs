//! Overwrite policy: which keys need translating, and how results land in a
//! target document.

use crate::{
    report::KeyFailure,
    types::{
        Entry, EntryMetadata, LocaleTag, Outcome, OverwritePolicy, ResourceDocument,
        TranslationResult, TranslationUnit,
    },
};

/// Computes the translation work for one target, in source-document order.
///
/// Rules, per key of `source`:
/// - absent from `target`: always translated;
/// - present with a non-blank value: translated only for
///   [`OverwritePolicy::OverwriteAll`];
/// - present with a blank value: translated unless
///   [`OverwritePolicy::SkipExisting`].
///
/// Keys only present in `target` are never touched.
pub fn plan_work(
    source: &ResourceDocument,
    target: &ResourceDocument,
    source_locale: &LocaleTag,
    target_locale: &LocaleTag,
    policy: OverwritePolicy,
) -> Vec<TranslationUnit> {
    source
        .entries()
        .iter()
        .filter(|entry| match target.get(&entry.key) {
            None => true,
            Some(existing) if existing.is_blank() => policy != OverwritePolicy::SkipExisting,
            Some(_) => policy == OverwritePolicy::OverwriteAll,
        })
        .map(|entry| TranslationUnit {
            key: entry.key.clone(),
            source_text: entry.value.clone(),
            source_locale: source_locale.clone(),
            target_locale: target_locale.clone(),
        })
        .collect()
}

/// What [`apply`] did to a target.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MergeOutcome {
    pub succeeded: Vec<String>,
    pub failed: Vec<KeyFailure>,
    /// Whether the merged document differs from the input one.
    pub changed: bool,
}

/// Applies `results` to `target` in the order given.
///
/// A success replaces an existing value in place or appends a new entry,
/// carrying over the comment block directly above the key in `source`. A
/// failure leaves the target as it was and is recorded.
pub fn apply(
    target: ResourceDocument,
    source: &ResourceDocument,
    results: &[TranslationResult],
) -> (ResourceDocument, MergeOutcome) {
    let mut outcome = MergeOutcome::default();
    let mut merged = target;

    for result in results {
        let key = &result.unit.key;
        match &result.outcome {
            Outcome::Success { text } => {
                let unchanged = merged.value(key).map(|current| current == text);
                match unchanged {
                    Some(true) => {}
                    Some(false) => {
                        merged = merged.with_value(key, text.clone());
                        outcome.changed = true;
                    }
                    None => {
                        merged = merged.with_entry(Entry {
                            key: key.clone(),
                            value: text.clone(),
                            metadata: carried_metadata(source.get(key)),
                        });
                        outcome.changed = true;
                    }
                }
                outcome.succeeded.push(key.clone());
            }
            Outcome::Failure(err) => outcome.failed.push(KeyFailure {
                key: key.clone(),
                kind: err.kind,
                message: err.message.clone(),
            }),
        }
    }

    (merged, outcome)
}

fn carried_metadata(source_entry: Option<&Entry>) -> EntryMetadata {
    let Some(entry) = source_entry else {
        return EntryMetadata::default();
    };
    let comments = entry
        .metadata
        .leading
        .iter()
        .rev()
        .take_while(|line| !line.trim().is_empty())
        .count();
    let start = entry.metadata.leading.len() - comments;
    EntryMetadata {
        leading: entry.metadata.leading[start..].to_vec(),
        separator: entry.metadata.separator.clone(),
    }
}
