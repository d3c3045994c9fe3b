//! The result of one invocation, as handed to the caller.

use std::{collections::BTreeMap, fmt::Display, path::PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    error::ErrorKind,
    types::{LocaleTag, OverwritePolicy},
};

/// Stages an invocation moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Planning,
    Dispatching,
    Merging,
    Writing,
    Done,
    PartiallyFailed,
}

impl Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Planning => "planning",
            Stage::Dispatching => "dispatching",
            Stage::Merging => "merging",
            Stage::Writing => "writing",
            Stage::Done => "done",
            Stage::PartiallyFailed => "partially_failed",
        };
        f.write_str(name)
    }
}

/// A key that did not get a translation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyFailure {
    pub key: String,
    pub kind: ErrorKind,
    pub message: String,
}

/// Per-target part of the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetReport {
    pub locale: LocaleTag,
    pub path: PathBuf,
    /// Number of units planned for this target.
    pub planned: usize,
    pub succeeded_keys: Vec<String>,
    pub failed_keys: Vec<KeyFailure>,
    /// Whether the file was rewritten.
    pub written: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub write_error: Option<String>,
    /// Set when the existing file could not be parsed and was treated as empty.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub decode_error: Option<String>,
}

impl TargetReport {
    pub fn new(locale: LocaleTag, path: PathBuf) -> Self {
        TargetReport {
            locale,
            path,
            planned: 0,
            succeeded_keys: Vec::new(),
            failed_keys: Vec::new(),
            written: false,
            write_error: None,
            decode_error: None,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failed_keys.is_empty() && self.write_error.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvocationStatus {
    Done,
    PartiallyFailed,
}

/// Aggregate report of one invocation.
///
/// Every key that was planned and not translated appears in some target's
/// `failed_keys`; nothing is left out silently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationReport {
    pub source: PathBuf,
    pub source_locale: LocaleTag,
    pub policy: OverwritePolicy,
    pub status: InvocationStatus,
    pub cancelled: bool,
    pub targets: BTreeMap<LocaleTag, TargetReport>,
}

impl InvocationReport {
    pub(crate) fn finish(
        source: PathBuf,
        source_locale: LocaleTag,
        policy: OverwritePolicy,
        targets: BTreeMap<LocaleTag, TargetReport>,
        cancelled: bool,
    ) -> Self {
        let status = if !cancelled && targets.values().all(TargetReport::is_clean) {
            InvocationStatus::Done
        } else {
            InvocationStatus::PartiallyFailed
        };
        InvocationReport {
            source,
            source_locale,
            policy,
            status,
            cancelled,
            targets,
        }
    }

    pub fn is_done(&self) -> bool {
        self.status == InvocationStatus::Done
    }

    pub fn stage(&self) -> Stage {
        match self.status {
            InvocationStatus::Done => Stage::Done,
            InvocationStatus::PartiallyFailed => Stage::PartiallyFailed,
        }
    }

    pub fn target(&self, locale: &str) -> Option<&TargetReport> {
        let locale = LocaleTag::parse(locale).ok()?;
        self.targets.get(&locale)
    }

    pub fn succeeded_count(&self) -> usize {
        self.targets.values().map(|t| t.succeeded_keys.len()).sum()
    }

    pub fn failed_count(&self) -> usize {
        self.targets.values().map(|t| t.failed_keys.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(locale: &str) -> TargetReport {
        TargetReport::new(
            LocaleTag::parse(locale).unwrap(),
            PathBuf::from(format!("messages_{}.properties", locale)),
        )
    }

    fn report(targets: Vec<TargetReport>, cancelled: bool) -> InvocationReport {
        InvocationReport::finish(
            PathBuf::from("messages.properties"),
            LocaleTag::parse("en").unwrap(),
            OverwritePolicy::SkipExisting,
            targets.into_iter().map(|t| (t.locale.clone(), t)).collect(),
            cancelled,
        )
    }

    #[test]
    fn test_clean_targets_are_done() {
        let r = report(vec![target("es"), target("fr")], false);
        assert!(r.is_done());
        assert_eq!(r.stage(), Stage::Done);
    }

    #[test]
    fn test_failed_key_or_write_is_partial() {
        let mut es = target("es");
        es.failed_keys.push(KeyFailure {
            key: "b".to_string(),
            kind: ErrorKind::NetworkError,
            message: "offline".to_string(),
        });
        assert_eq!(report(vec![es], false).status, InvocationStatus::PartiallyFailed);

        let mut fr = target("fr");
        fr.write_error = Some("disk full".to_string());
        let r = report(vec![target("es"), fr], false);
        assert_eq!(r.stage(), Stage::PartiallyFailed);
        assert_eq!(r.failed_count(), 0);
    }

    #[test]
    fn test_cancelled_is_partial() {
        let r = report(vec![target("es")], true);
        assert!(!r.is_done());
        assert!(r.cancelled);
    }

    #[test]
    fn test_report_serializes_locale_map() {
        let mut es = target("es");
        es.succeeded_keys.push("a".to_string());
        let json = serde_json::to_value(report(vec![es], false)).unwrap();
        assert_eq!(json["status"], "done");
        assert_eq!(json["targets"]["es"]["succeeded_keys"][0], "a");
        assert!(json["targets"]["es"].get("write_error").is_none());
    }

    #[test]
    fn test_target_lookup_accepts_either_form() {
        let r = report(vec![target("pt_BR")], false);
        assert!(r.target("pt-BR").is_some());
        assert!(r.target("de").is_none());
    }
}
