//! Read-only commands.

use anyhow::Result;
use owo_colors::{OwoColorize, Stream, Style};

use crate::config::RouteConfig;
use crate::content::{ContentId, ContentTree};
use crate::core::{RoutePath, Scope};
use crate::error::RouteError;
use crate::log;
use crate::mapper::{RouteKind, RouteTreeMapper, TreeEntry};
use crate::store::NodeStore;

/// Print the content routed at a request path, or where it moved.
pub fn resolve<S: NodeStore>(mapper: &RouteTreeMapper<S>, scope: &Scope, raw: &str) -> Result<()> {
    let path = RoutePath::from_request(raw)?;
    match mapper.load_by_resource_locator(path.as_str(), scope) {
        Ok(content) => println!("{content}"),
        Err(RouteError::Moved {
            path,
            location,
            content,
        }) => {
            log!("moved"; "`{}` -> `{}` ({})", path, location, content);
            println!("{location}");
        }
        Err(err) => return Err(err.into()),
    }
    Ok(())
}

pub fn locate<S: NodeStore>(mapper: &RouteTreeMapper<S>, scope: &Scope, uuid: ContentId) -> Result<()> {
    println!("{}", mapper.load_by_content_uuid(uuid, scope)?);
    Ok(())
}

pub fn history<S: NodeStore>(
    mapper: &RouteTreeMapper<S>,
    scope: &Scope,
    uuid: ContentId,
    json: bool,
) -> Result<()> {
    let entries = mapper.load_history_by_content_uuid(uuid, scope)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }
    if entries.is_empty() {
        log!("history"; "no routes for {} in {}", uuid, scope);
    }
    for entry in &entries {
        println!(
            "{}  {:<7}  {}",
            entry.created_at.to_rfc3339(),
            entry.kind,
            entry.path
        );
    }
    Ok(())
}

pub fn parent<S: NodeStore>(
    mapper: &RouteTreeMapper<S>,
    config: &RouteConfig,
    scope: &Scope,
    uuid: ContentId,
) -> Result<()> {
    let contents = ContentTree::load(&config.content_path())?;
    match mapper.parent_path(&contents, uuid, scope)? {
        Some(path) => println!("{path}"),
        None => log!("parent"; "no ancestor of {} is routed in {}", uuid, scope),
    }
    Ok(())
}

pub fn unique<S: NodeStore>(mapper: &RouteTreeMapper<S>, scope: &Scope, path: &str) -> Result<()> {
    println!("{}", mapper.unique_path(path, scope)?);
    Ok(())
}

pub fn tree<S: NodeStore>(mapper: &RouteTreeMapper<S>, scope: &Scope) -> Result<()> {
    let entries = mapper.tree(scope)?;
    if entries.is_empty() {
        log!("tree"; "{} has no routes", scope);
        return Ok(());
    }
    for entry in &entries {
        println!("{}", format_entry(entry, scope));
    }
    Ok(())
}

fn format_entry(entry: &TreeEntry, scope: &Scope) -> String {
    let indent = "  ".repeat(entry.depth);
    let name = entry
        .path
        .name()
        .map_or_else(|| format!("[{scope}]"), str::to_string);
    match &entry.route {
        None => format!("{indent}{name}"),
        Some(route) => {
            let style = match route.kind {
                RouteKind::Path => Style::new().green(),
                RouteKind::History => Style::new().dimmed(),
            };
            let kind = route
                .kind
                .if_supports_color(Stream::Stdout, |k| k.style(style))
                .to_string();
            format!("{indent}{name}  {kind} {}", route.content)
        }
    }
}
