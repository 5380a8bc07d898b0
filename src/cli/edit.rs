//! Commands that change the route tree and commit.

use anyhow::{Context, Result, bail};

use crate::config::RouteConfig;
use crate::content::{ContentId, ContentTree};
use crate::core::Scope;
use crate::error::RouteError;
use crate::log;
use crate::mapper::RouteTreeMapper;
use crate::store::{NodeStore, Session};

/// Route `uuid` at `path` and commit.
///
/// The content parent map is written only once the route change is committed.
pub fn save(
    mapper: &mut RouteTreeMapper<Session>,
    config: &RouteConfig,
    scope: &Scope,
    uuid: ContentId,
    path: &str,
    parent: Option<ContentId>,
    unique: bool,
) -> Result<()> {
    let node = match mapper.save(uuid, path, scope) {
        Err(RouteError::AlreadyExists { .. }) if unique => {
            let free = mapper.unique_path(path, scope)?;
            log!("save"; "`{}` is taken, using `{}`", path, free);
            mapper.save(uuid, free.as_str(), scope)?
        }
        saved => saved?,
    };

    let contents = match parent {
        Some(parent) => {
            let file = config.content_path();
            let mut contents = ContentTree::load(&file)?;
            if !contents.set_parent(uuid, parent) {
                mapper.store_mut().rollback()?;
                bail!("{parent} cannot be the parent of {uuid}: it descends from it");
            }
            Some((file, contents))
        }
        None => None,
    };

    mapper.store_mut().commit()?;
    if let Some((file, contents)) = contents {
        contents
            .save(&file)
            .with_context(|| format!("route {} was saved, but not its parent", node.path))?;
    }
    log!("save"; "{} -> {} ({})", uuid, node.path, scope);
    Ok(())
}

/// Delete `path` with its subtree and commit.
pub fn delete(mapper: &mut RouteTreeMapper<Session>, scope: &Scope, path: &str) -> Result<()> {
    mapper.delete_by_path(path, scope)?;
    mapper.store_mut().commit()?;
    log!("delete"; "removed {} ({})", path, scope);
    Ok(())
}
