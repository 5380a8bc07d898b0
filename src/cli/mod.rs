//! Command-line interface module.

mod args;
pub mod edit;
pub mod query;

use anyhow::Result;

pub use args::{Cli, Commands};

use crate::config::RouteConfig;
use crate::core::Scope;
use crate::mapper::RouteTreeMapper;
use crate::store::{Repository, Session};

/// Dispatch a parsed command line.
pub fn run(cli: &Cli, config: &RouteConfig) -> Result<()> {
    let scope = scope(cli, config)?;
    let mut mapper = open_mapper(config)?;

    match &cli.command {
        Commands::Save {
            uuid,
            path,
            parent,
            unique,
        } => edit::save(&mut mapper, config, &scope, *uuid, path, *parent, *unique),
        Commands::Delete { path } => edit::delete(&mut mapper, &scope, path),
        Commands::Resolve { path } => query::resolve(&mapper, &scope, path),
        Commands::Locate { uuid } => query::locate(&mapper, &scope, *uuid),
        Commands::History { uuid, json } => query::history(&mapper, &scope, *uuid, *json),
        Commands::Parent { uuid } => query::parent(&mapper, config, &scope, *uuid),
        Commands::Unique { path } => query::unique(&mapper, &scope, path),
        Commands::Tree => query::tree(&mapper, &scope),
    }
}

/// Scope from the command line, falling back to the configured one.
fn scope(cli: &Cli, config: &RouteConfig) -> Result<Scope> {
    let workspace = cli.workspace.as_deref().unwrap_or(&config.routes.workspace);
    let locale = cli.locale.as_deref().unwrap_or(&config.routes.locale);
    Ok(Scope::new(workspace, locale)?)
}

fn open_mapper(config: &RouteConfig) -> Result<RouteTreeMapper<Session>> {
    let repo = Repository::open(config.store_path())?;
    Ok(RouteTreeMapper::with_options(
        repo.session(),
        config.mapper_options(),
    ))
}
