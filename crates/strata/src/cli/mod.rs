mod migrate;
mod project;
mod schema;

pub use migrate::MigrateCommand;
pub use schema::SchemaCommand;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// STRATA - reversible schema migrations for collection registries
#[derive(Parser)]
#[command(name = "strata")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Apply, revert and inspect migrations.
    Migrate(MigrateCommand),

    /// Print the current registry.
    Schema(SchemaCommand),
}

impl Cli {
    /// Execute the CLI command.
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Migrate(cmd) => cmd.execute().await,
            Commands::Schema(cmd) => cmd.execute().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use migrate::MigrateAction;

    #[test]
    fn test_cli_parse_migrate_up() {
        let cli = Cli::try_parse_from(["strata", "migrate", "up"]).unwrap();
        match cli.command {
            Commands::Migrate(cmd) => {
                assert!(matches!(cmd.action, MigrateAction::Up));
                assert_eq!(cmd.options.config, "strata.toml");
                assert!(!cmd.options.no_builtin);
            }
            _ => panic!("expected migrate"),
        }
    }

    #[test]
    fn test_cli_parse_migrate_down_defaults_to_one() {
        let cli = Cli::try_parse_from(["strata", "migrate", "down"]).unwrap();
        match cli.command {
            Commands::Migrate(cmd) => assert!(matches!(cmd.action, MigrateAction::Down { count: 1 })),
            _ => panic!("expected migrate"),
        }

        let cli = Cli::try_parse_from(["strata", "migrate", "down", "3"]).unwrap();
        match cli.command {
            Commands::Migrate(cmd) => assert!(matches!(cmd.action, MigrateAction::Down { count: 3 })),
            _ => panic!("expected migrate"),
        }
    }

    #[test]
    fn test_cli_parse_global_options() {
        let cli = Cli::try_parse_from([
            "strata",
            "migrate",
            "status",
            "--config",
            "lab.toml",
            "--migrations-dir",
            "pb_migrations",
            "--no-builtin",
        ])
        .unwrap();
        match cli.command {
            Commands::Migrate(cmd) => {
                assert!(matches!(cmd.action, MigrateAction::Status));
                assert_eq!(cmd.options.config, "lab.toml");
                assert_eq!(cmd.options.migrations_dir.as_deref(), Some("pb_migrations"));
                assert!(cmd.options.no_builtin);
            }
            _ => panic!("expected migrate"),
        }
    }

    #[test]
    fn test_cli_parse_schema() {
        let cli = Cli::try_parse_from(["strata", "schema", "inventory"]).unwrap();
        match cli.command {
            Commands::Schema(cmd) => assert_eq!(cmd.collection.as_deref(), Some("inventory")),
            _ => panic!("expected schema"),
        }
        assert!(Cli::try_parse_from(["strata", "schema"]).is_ok());
    }

    #[test]
    fn test_cli_rejects_unknown_action() {
        assert!(Cli::try_parse_from(["strata", "migrate", "sideways"]).is_err());
    }
}
