use std::{path::PathBuf, process, sync::Arc, time::Duration};

use clap::{Args as ClapArgs, Parser, Subcommand};
use proptrans::{
    CancelToken, Charset, InvocationStatus, LocaleTag, Orchestrator, OverwritePolicy,
    TranslateConfig,
    config::{ConfigStore, StaticConfig, TomlConfigStore},
    fs::LocalFs,
    provider::PseudoProvider,
};
use proptrans_cli::{
    parse_locale_list,
    render::{print_plan, print_report, write_report_json},
    validate_language_code, validate_source_path,
    validation::validate_output_path,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const EXIT_PARTIAL: i32 = 2;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
}

/// Supported subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate a .properties file into its sibling locale files.
    Translate {
        #[command(flatten)]
        run: RunArgs,

        /// Write the full report as JSON to this file
        #[arg(long)]
        report_json: Option<String>,
    },

    /// Show which keys would be translated, without translating or writing.
    Plan {
        #[command(flatten)]
        run: RunArgs,
    },
}

#[derive(ClapArgs, Debug)]
struct RunArgs {
    /// The source resource file, e.g. messages.properties
    #[arg(short, long)]
    source: String,

    /// Comma separated target locales (e.g. "es,fr_CA")
    #[arg(short, long)]
    locales: Option<String>,

    /// Locale of the source file; inferred from its name when omitted
    #[arg(long)]
    source_locale: Option<String>,

    /// skip-existing, overwrite-all or overwrite-blank
    #[arg(short, long)]
    policy: Option<OverwritePolicy>,

    /// Maximum number of translation requests in flight
    #[arg(long)]
    concurrency: Option<usize>,

    /// Per-request timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// File charset: utf-8 or iso-8859-1
    #[arg(long)]
    charset: Option<Charset>,

    /// TOML file with default settings; flags override it
    #[arg(short, long)]
    config: Option<String>,
}

impl RunArgs {
    fn load_config(&self) -> Result<TranslateConfig, String> {
        let mut config = match &self.config {
            Some(path) => TomlConfigStore::new(path)
                .load()
                .map_err(|e| format!("Failed to load config {}: {}", path, e))?,
            None => TranslateConfig::default(),
        };

        if let Some(list) = &self.locales {
            config.target_locales = parse_locale_list(list)?;
        }
        if let Some(locale) = &self.source_locale {
            validate_language_code(locale)?;
            let locale = locale.parse::<LocaleTag>().map_err(|e| e.to_string())?;
            config.source_locale = Some(locale);
        }
        if let Some(policy) = self.policy {
            config.policy = policy;
        }
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }
        if let Some(secs) = self.timeout_secs {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        if let Some(charset) = self.charset {
            config.charset = charset;
        }

        config.validate().map_err(|e| e.to_string())?;
        Ok(config)
    }

    fn orchestrator(&self) -> Result<Orchestrator, String> {
        validate_source_path(&self.source)?;
        let config = self.load_config()?;
        Ok(Orchestrator::new(
            Arc::new(PseudoProvider),
            Arc::new(LocalFs),
            Arc::new(StaticConfig(config)),
        ))
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run_translate(run: RunArgs, report_json: Option<String>) -> Result<i32, String> {
    let orchestrator = run.orchestrator()?;
    if let Some(path) = &report_json {
        validate_output_path(path)?;
    }

    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received, cancelling");
                cancel.cancel();
            }
        });
    }

    let source = PathBuf::from(&run.source);
    let report = orchestrator
        .translate(&source, &cancel)
        .await
        .map_err(|e| e.to_string())?;

    print_report(&report);
    if let Some(path) = report_json {
        write_report_json(&report, PathBuf::from(&path).as_path())?;
        info!(path = %path, "report written");
    }

    Ok(match report.status {
        InvocationStatus::Done => 0,
        InvocationStatus::PartiallyFailed => EXIT_PARTIAL,
    })
}

fn run_plan(run: RunArgs) -> Result<i32, String> {
    let orchestrator = run.orchestrator()?;
    let plan = orchestrator
        .plan(PathBuf::from(&run.source).as_path())
        .map_err(|e| e.to_string())?;
    print_plan(&plan);
    Ok(0)
}

#[tokio::main]
async fn main() {
    init_tracing();
    let args = Args::parse();

    let result = match args.commands {
        Commands::Translate { run, report_json } => run_translate(run, report_json).await,
        Commands::Plan { run } => run_plan(run),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("❌ {}", e);
            process::exit(1);
        }
    }
}
