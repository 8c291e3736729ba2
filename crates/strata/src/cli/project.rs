use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use strata_core::config::{LoggingConfig, StrataConfig};
use strata_core::schema::SchemaRegistry;
use strata_runtime::migrations::{
    baseline_registry, get_builtin_migrations, load_migrations_from_dir, Migration,
    MigrationRunner,
};
use strata_runtime::store::JsonFileStore;

/// Options shared by every command that touches the stored registry.
#[derive(Args, Debug, Clone)]
pub struct ProjectOptions {
    /// Configuration file path.
    #[arg(short, long, default_value = "strata.toml", global = true)]
    pub config: String,

    /// Migrations directory path (overrides config).
    #[arg(short, long, global = true)]
    pub migrations_dir: Option<String>,

    /// Skip the built-in lab migrations.
    #[arg(long, global = true)]
    pub no_builtin: bool,
}

/// Loaded configuration, runner and the full migration set.
pub struct Project {
    pub config: StrataConfig,
    pub runner: MigrationRunner<JsonFileStore>,
    pub migrations: Vec<Migration>,
    pub migrations_dir: PathBuf,
}

impl Project {
    pub fn open(options: &ProjectOptions) -> Result<Self> {
        // Load .env if present (before config, for ${VAR} substitution)
        dotenvy::dotenv().ok();

        let config = StrataConfig::from_file_or_default(&options.config)
            .with_context(|| format!("Failed to load configuration from {}", options.config))?;
        init_tracing(&config.logging);

        let migrations_dir = options
            .migrations_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| config.storage.migrations_dir.clone());

        let builtin = config.storage.builtin_migrations && !options.no_builtin;
        let (baseline, mut migrations) = if builtin {
            (baseline_registry()?, get_builtin_migrations()?)
        } else {
            (SchemaRegistry::new(), Vec::new())
        };

        let from_dir = load_migrations_from_dir(&migrations_dir)
            .with_context(|| format!("Failed to load migrations from {}", migrations_dir.display()))?;
        debug!(
            "Loaded {} built-in and {} directory migrations",
            migrations.len(),
            from_dir.len()
        );
        migrations.extend(from_dir);

        let store = JsonFileStore::new(config.storage.state_file.clone());
        let runner = MigrationRunner::new(store, baseline);

        Ok(Self {
            config,
            runner,
            migrations,
            migrations_dir,
        })
    }
}

/// Install the global subscriber. `RUST_LOG` overrides the configured level.
fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let installed = if logging.json_format {
        subscriber.json().try_init()
    } else {
        subscriber.try_init()
    };
    installed.ok();
}
