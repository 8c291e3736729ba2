use anyhow::Result;
use clap::{Parser, Subcommand};
use console::style;

use super::project::{Project, ProjectOptions};

/// Apply, revert and inspect migrations.
#[derive(Parser)]
pub struct MigrateCommand {
    #[command(subcommand)]
    pub action: MigrateAction,

    #[command(flatten)]
    pub options: ProjectOptions,
}

#[derive(Subcommand)]
pub enum MigrateAction {
    /// Run all pending migrations.
    Up,

    /// Rollback the last N migrations.
    Down {
        /// Number of migrations to rollback.
        #[arg(default_value = "1")]
        count: usize,
    },

    /// Revert every applied migration back to the baseline.
    Reset,

    /// Show migration status.
    Status,

    /// Show what `up` would apply without changing anything.
    Plan,
}

fn header(project: &str, title: &str) {
    println!();
    println!(
        "  {}  {} {} {}",
        style("⛁").bold(),
        style("STRATA").bold().cyan(),
        title,
        style(format!("({})", project)).dim()
    );
    println!();
}

impl MigrateCommand {
    pub async fn execute(self) -> Result<()> {
        let project = Project::open(&self.options)?;
        let runner = &project.runner;
        let available = &project.migrations;
        let name = project.config.project.name.as_str();

        match self.action {
            MigrateAction::Up => {
                header(name, "Migrations");

                if available.is_empty() {
                    println!(
                        "  {} No migrations found in {}",
                        style("ℹ").blue(),
                        project.migrations_dir.display()
                    );
                    return Ok(());
                }

                println!("  {} Running pending migrations...", style("→").dim());
                let applied = runner.apply_forward(available).await?;

                if applied.is_empty() {
                    println!("  {} Already up to date", style("ℹ").blue());
                } else {
                    for id in &applied {
                        println!("  {} Applied: {}", style("✓").green(), id);
                    }
                    println!();
                    println!(
                        "  {} Applied {} migration(s)",
                        style("✓").green(),
                        applied.len()
                    );
                }
                println!();
            }

            MigrateAction::Down { count } => {
                header(name, "Migrations");

                if count == 0 {
                    println!("  {} Nothing to rollback (count=0)", style("ℹ").blue());
                    return Ok(());
                }

                println!(
                    "  {} Rolling back {} migration(s)...",
                    style("→").dim(),
                    count
                );

                let rolled_back = runner.rollback(available, count).await?;
                print_reverted(&rolled_back);
            }

            MigrateAction::Reset => {
                header(name, "Migrations");

                println!("  {} Reverting all applied migrations...", style("→").dim());
                let rolled_back = runner.apply_backward(available).await?;
                print_reverted(&rolled_back);
            }

            MigrateAction::Status => {
                header(name, "Migration Status");

                let status = runner.status(available).await?;

                if status.applied.is_empty() && status.pending.is_empty() {
                    println!("  {} No migrations found", style("ℹ").blue());
                    return Ok(());
                }

                // Show applied migrations
                if !status.applied.is_empty() {
                    println!("  {} Applied:", style("✓").green());
                    for m in &status.applied {
                        let marker = if m.has_definition {
                            style("↓").green().to_string()
                        } else {
                            style("?").red().to_string()
                        };
                        println!(
                            "    {} {} {} ({})",
                            marker,
                            style(&m.id).cyan(),
                            style("at").dim(),
                            m.applied_at.format("%Y-%m-%d %H:%M:%S")
                        );
                    }
                }

                // Show pending migrations
                if !status.pending.is_empty() {
                    if !status.applied.is_empty() {
                        println!();
                    }
                    println!("  {} Pending:", style("○").yellow());
                    for id in &status.pending {
                        println!("    {} {}", style("→").dim(), style(id).yellow());
                    }
                }

                println!();
                println!(
                    "  {} {} applied, {} pending",
                    style("ℹ").blue(),
                    status.applied.len(),
                    status.pending.len()
                );
                println!();

                // Legend
                println!(
                    "  {} = revertible, {} = definition missing",
                    style("↓").green(),
                    style("?").red()
                );
                println!();
            }

            MigrateAction::Plan => {
                header(name, "Migration Plan");

                let plan = runner.plan(available).await?;

                if plan.pending.is_empty() {
                    println!("  {} Already up to date", style("ℹ").blue());
                } else {
                    for id in &plan.pending {
                        println!("    {} {}", style("→").dim(), style(id).yellow());

                        let steps = available
                            .iter()
                            .find(|m| &m.id == id)
                            .and_then(|m| m.up.steps());
                        for step in steps.unwrap_or_default() {
                            println!("        {}", style(step.describe()).dim());
                        }
                    }
                    println!();
                    println!(
                        "  {} {} migration(s) would apply, leaving {} collection(s)",
                        style("ℹ").blue(),
                        plan.pending.len(),
                        plan.registry.len()
                    );
                }
                println!();
            }
        }

        Ok(())
    }
}

fn print_reverted(rolled_back: &[String]) {
    if rolled_back.is_empty() {
        println!("  {} No migrations to rollback", style("ℹ").blue());
    } else {
        for id in rolled_back {
            println!("  {} Rolled back: {}", style("✓").green(), id);
        }
        println!();
        println!(
            "  {} Rolled back {} migration(s)",
            style("✓").green(),
            rolled_back.len()
        );
    }
    println!();
}
