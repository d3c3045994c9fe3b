#![forbid(unsafe_code)]
//! Translation orchestration for key-value localization resources.
//!
//! Given a source resource bundle (a Java `.properties` file), proptrans works
//! out which per-locale sibling files should exist, asks a pluggable
//! [`TranslationProvider`] for every key that is missing or selected for
//! overwrite, merges the results into each target while keeping existing
//! entries, comments and order, and reports what failed without corrupting
//! any file.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::{path::Path, sync::Arc};
//! use proptrans::{
//!     CancelToken, LocaleTag, Orchestrator, TranslateConfig,
//!     config::StaticConfig, fs::LocalFs, provider::PseudoProvider,
//! };
//!
//! # async fn run() -> Result<(), proptrans::Error> {
//! let config = TranslateConfig::new()
//!     .with_target_locales(vec![LocaleTag::parse("es")?, LocaleTag::parse("fr_CA")?]);
//! let orchestrator = Orchestrator::new(
//!     Arc::new(PseudoProvider),
//!     Arc::new(LocalFs),
//!     Arc::new(StaticConfig(config)),
//! );
//! let report = orchestrator
//!     .translate(Path::new("i18n/messages.properties"), &CancelToken::new())
//!     .await?;
//! println!("{} keys translated", report.succeeded_count());
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`formats`]: the `.properties` codec
//! - [`resolver`]: target file paths from `basename[_locale].ext`
//! - [`policy`]: overwrite policy, work planning and merging
//! - [`orchestrator`]: bounded-concurrency dispatch and write-back
//! - [`provider`], [`fs`], [`config`]: seams to the outside world

pub mod codec;
pub mod config;
pub mod error;
pub mod formats;
pub mod fs;
pub mod lock;
pub mod orchestrator;
pub mod policy;
pub mod provider;
pub mod report;
pub mod resolver;
pub mod traits;
pub mod types;

// Re-export most used types for easy consumption
pub use crate::{
    codec::Charset,
    config::TranslateConfig,
    error::{Error, ErrorKind, ProviderError},
    orchestrator::{CancelToken, InvocationPlan, Orchestrator},
    provider::TranslationProvider,
    report::{InvocationReport, InvocationStatus, KeyFailure, Stage, TargetReport},
    types::{
        Entry, LocaleTag, Outcome, OverwritePolicy, ResourceDocument, TargetFileSpec,
        TranslationResult, TranslationUnit,
    },
};
