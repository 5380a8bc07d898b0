//! Resource locator route trees.
//!
//! Every (workspace, locale) [`Scope`] owns a tree of human readable paths
//! resolving to content identifiers. Moving content keeps its old paths
//! resolvable as redirects, and deletion never reaches beyond the requested
//! subtree.
//!
//! ```
//! use routemap::content::ContentId;
//! use routemap::core::Scope;
//! use routemap::mapper::RouteTreeMapper;
//! use routemap::store::{NodeStore, Repository};
//!
//! let repo = Repository::in_memory();
//! let mut mapper = RouteTreeMapper::new(repo.session());
//! let scope = Scope::new("default", "en").unwrap();
//! let page = ContentId::new_v4();
//!
//! mapper.save(page, "/products/machines", &scope).unwrap();
//! mapper.save(page, "/machines", &scope).unwrap();
//! mapper.store_mut().commit().unwrap();
//!
//! assert_eq!(mapper.load_by_content_uuid(page, &scope).unwrap(), "/machines");
//! assert!(mapper.load_by_resource_locator("/products/machines", &scope).unwrap_err().is_moved());
//! ```

pub mod cli;
pub mod config;
pub mod content;
pub mod core;
pub mod error;
pub mod logger;
pub mod mapper;
pub mod store;
mod utils;

pub use crate::core::{RoutePath, Scope};
pub use error::{Result, RouteError};
pub use mapper::{RouteKind, RouteNode, RouteTreeMapper};
