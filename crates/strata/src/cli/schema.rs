use anyhow::Result;
use clap::Parser;

use super::project::{Project, ProjectOptions};

/// Print the current registry, or a single collection, as JSON.
#[derive(Parser)]
pub struct SchemaCommand {
    /// Collection id or name.
    pub collection: Option<String>,

    #[command(flatten)]
    pub options: ProjectOptions,
}

impl SchemaCommand {
    pub async fn execute(self) -> Result<()> {
        let project = Project::open(&self.options)?;
        let registry = project.runner.registry().await?;

        let output = match &self.collection {
            Some(collection) => serde_json::to_string_pretty(registry.find_collection(collection)?)?,
            None => serde_json::to_string_pretty(&registry)?,
        };
        println!("{}", output);
        Ok(())
    }
}
