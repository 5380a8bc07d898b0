//! Command-line interface definitions.

use std::path::PathBuf;

use clap::{ColorChoice, Parser, Subcommand};

use crate::config::CONFIG_FILE;
use crate::content::ContentId;

/// Maintain resource locator route trees
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path
    #[arg(short = 'C', long, global = true, default_value = CONFIG_FILE, value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Workspace of the route tree (default: `routes.workspace`)
    #[arg(short, long, global = true)]
    pub workspace: Option<String>,

    /// Locale of the route tree (default: `routes.locale`)
    #[arg(short, long, global = true)]
    pub locale: Option<String>,

    /// Print debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Route content at a path, turning its previous path into a redirect
    #[command(visible_alias = "s")]
    Save {
        /// Content identifier
        uuid: ContentId,

        /// Desired path, e.g. `/products/machines`
        path: String,

        /// Record the content's parent (used by `parent`)
        #[arg(short, long)]
        parent: Option<ContentId>,

        /// Pick a free path if another content owns `path`
        #[arg(short, long)]
        unique: bool,
    },

    /// Resolve a request path to its content
    #[command(visible_alias = "r")]
    Resolve {
        /// Request path; percent-encoding, query and fragment are handled
        path: String,
    },

    /// Print the current path of a content
    Locate { uuid: ContentId },

    /// List every path a content has had, newest first
    #[command(visible_alias = "h")]
    History {
        uuid: ContentId,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the path of the nearest routed ancestor of a content
    #[command(visible_alias = "p")]
    Parent { uuid: ContentId },

    /// Suggest a collision-free variant of a path
    #[command(visible_alias = "u")]
    Unique { path: String },

    /// Delete a path and everything below it
    #[command(visible_alias = "d")]
    Delete { path: String },

    /// Dump the route tree of the scope
    #[command(visible_alias = "t")]
    Tree,
}
