use std::sync::Arc;

use anyhow::Result;

use crate::{
    app::{AppFactory, MemeBackend},
    cli::{
        commands::{
            CategoriesCommand, ConfigCommand, CuratedCommand, ListCommand, QuickCommand,
            SearchCommand, ShowCommand,
        },
        Command,
    },
    config::Config,
};

/// Run one parsed command to completion.
pub async fn dispatch(command: Command, config: Config) -> Result<()> {
    match command {
        Command::Search { query, limit, plain, json } => {
            let command = SearchCommand::new(&query, limit.unwrap_or(config.top_k), plain, json)?;
            command.execute(backend(&config)?).await?;
        }
        Command::Quick { query, limit, category, json } => {
            let command = QuickCommand::new(&query, limit.unwrap_or(config.top_k), category, json)?;
            command.execute(backend(&config)?).await?;
        }
        Command::List { limit, offset, category, json } => {
            let command = ListCommand::new(limit, offset, category, json, &config)?;
            command.execute(backend(&config)?).await?;
        }
        Command::Categories { json } => {
            CategoriesCommand { json }.execute(backend(&config)?).await?;
        }
        Command::Show { id, json } => {
            let command = ShowCommand::new(&id, json)?;
            command.execute(backend(&config)?).await?;
        }
        Command::Curated { query, json } => {
            CuratedCommand { query, json }.execute()?;
        }
        Command::Config {} => {
            ConfigCommand.execute(&config)?;
        }
    }

    Ok(())
}

fn backend(config: &Config) -> Result<Arc<dyn MemeBackend>> {
    AppFactory::create_backend(config)
}
