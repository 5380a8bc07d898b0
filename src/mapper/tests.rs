use tempfile::TempDir;

use super::*;
use crate::content::{Content, ContentTree};
use crate::error::PathIssue;
use crate::store::{Repository, Session};

fn en() -> Scope {
    Scope::new("default", "en").unwrap()
}

fn de() -> Scope {
    Scope::new("default", "de").unwrap()
}

fn mapper() -> RouteTreeMapper<Session> {
    RouteTreeMapper::new(Repository::in_memory().session())
}

fn paths(history: &[HistoryEntry]) -> Vec<&str> {
    history.iter().map(|entry| entry.path.as_str()).collect()
}

// ============================================================================
// unique / unique_path
// ============================================================================

#[test]
fn test_unique_tracks_path_nodes() {
    let mut mapper = mapper();
    let e = ContentId::new_v4();
    assert!(mapper.unique("/a", &en()).unwrap());

    mapper.save(e, "/a", &en()).unwrap();
    assert!(!mapper.unique("/a", &en()).unwrap());
    assert!(mapper.unique("/a", &de()).unwrap());

    // History nodes do not block a path
    mapper.save(e, "/b", &en()).unwrap();
    assert!(mapper.unique("/a", &en()).unwrap());
    assert!(!mapper.unique("/b", &en()).unwrap());
}

#[test]
fn test_unique_ignores_structural_nodes() {
    let mut mapper = mapper();
    mapper.save(ContentId::new_v4(), "/news/today", &en()).unwrap();
    assert!(mapper.unique("/news", &en()).unwrap());
    assert!(!mapper.unique("/news/today", &en()).unwrap());
}

#[test]
fn test_unique_path_next_free_suffix() {
    let mut mapper = mapper();
    mapper.save(ContentId::new_v4(), "/products/machines", &en()).unwrap();
    mapper.save(ContentId::new_v4(), "/products/machines-1", &en()).unwrap();

    let path = mapper.unique_path("/products/machines", &en()).unwrap();
    assert_eq!(path, "/products/machines-2");
    assert_eq!(mapper.unique_path(path.as_str(), &en()).unwrap(), path);
}

#[test]
fn test_unique_path_top_level() {
    let mut mapper = mapper();
    mapper.save(ContentId::new_v4(), "/products", &en()).unwrap();
    assert_eq!(mapper.unique_path("/products", &en()).unwrap(), "/products-1");
    assert_eq!(mapper.unique_path("/products", &de()).unwrap(), "/products");
}

#[test]
fn test_unique_path_counts_structural_siblings() {
    let mut mapper = mapper();
    mapper.save(ContentId::new_v4(), "/news/today", &en()).unwrap();
    assert_eq!(mapper.unique_path("/news", &en()).unwrap(), "/news-1");
}

#[test]
fn test_unique_path_unchanged_when_free() {
    let mapper = mapper();
    assert_eq!(mapper.unique_path("/fresh", &en()).unwrap(), "/fresh");
    assert_eq!(mapper.unique_path("/missing/parent/x/", &en()).unwrap(), "/missing/parent/x");
    assert!(mapper.unique_path("/", &en()).unwrap().is_root());
    assert!(mapper.unique_path("relative", &en()).is_err());
}

#[test]
fn test_unique_path_custom_separator() {
    let options = MapperOptions {
        separator: '_',
        ..MapperOptions::default()
    };
    let mut mapper = RouteTreeMapper::with_options(Repository::in_memory().session(), options);
    mapper.save(ContentId::new_v4(), "/news", &en()).unwrap();
    assert_eq!(mapper.unique_path("/news", &en()).unwrap(), "/news_1");
}

// ============================================================================
// save / load
// ============================================================================

#[test]
fn test_save_then_load_by_content() {
    let mut mapper = mapper();
    for path in ["/about", "/products/machines/big", "/posts/中文", "/a b"] {
        let e = Content::new(ContentId::new_v4(), path);
        let node = mapper.save_entity(&e, &en()).unwrap();
        assert_eq!(node.kind, RouteKind::Path);
        assert_eq!(mapper.load_by_content(&e, &en()).unwrap(), path);
        assert_eq!(mapper.load_by_resource_locator(path, &en()).unwrap(), e.uuid);
    }
}

#[test]
fn test_save_rejects_degenerate_paths() {
    let mut mapper = mapper();
    let e = ContentId::new_v4();
    for (path, issue) in [
        ("", PathIssue::Empty),
        ("/", PathIssue::Root),
        ("news", PathIssue::NotAbsolute),
        ("/a/../b", PathIssue::DotSegment),
    ] {
        match mapper.save(e, path, &en()) {
            Err(RouteError::InvalidPath { issue: got, .. }) => assert_eq!(got, issue),
            other => panic!("expected InvalidPath for {path:?}, got {other:?}"),
        }
    }
    assert!(!mapper.store().has_pending_changes());
}

#[test]
fn test_save_conflicting_owner() {
    let mut mapper = mapper();
    let (a, b) = (ContentId::new_v4(), ContentId::new_v4());
    mapper.save(a, "/x", &en()).unwrap();

    let err = mapper.save(b, "/x", &en()).unwrap_err();
    assert!(matches!(err, RouteError::AlreadyExists { ref path } if path == "/x"));
    assert_eq!(mapper.load_by_resource_locator("/x", &en()).unwrap(), a);
    assert!(mapper.load_by_content_uuid(b, &en()).unwrap_err().is_not_found());

    // Same path in another scope is independent
    mapper.save(b, "/x", &de()).unwrap();
    assert_eq!(mapper.load_by_resource_locator("/x", &de()).unwrap(), b);
}

#[test]
fn test_save_same_path_twice_is_noop() {
    let mut mapper = mapper();
    let e = ContentId::new_v4();
    let first = mapper.save(e, "/a", &en()).unwrap();
    let second = mapper.save(e, "/a/", &en()).unwrap();
    assert_eq!(first.id, second.id);
    assert_eq!(mapper.load_history_by_content_uuid(e, &en()).unwrap().len(), 1);
}

#[test]
fn test_move_leaves_redirect() {
    let mut mapper = mapper();
    let e = ContentId::new_v4();
    mapper.save(e, "/a", &en()).unwrap();
    mapper.save(e, "/b", &en()).unwrap();

    let err = mapper.load_by_resource_locator("/a", &en()).unwrap_err();
    assert!(err.is_moved());
    assert!(matches!(
        err,
        RouteError::Moved { ref path, ref location, content }
            if path == "/a" && location == "/b" && content == e
    ));
    assert_eq!(mapper.load_by_resource_locator("/b", &en()).unwrap(), e);
    assert_eq!(mapper.load_by_content_uuid(e, &en()).unwrap(), "/b");
}

#[test]
fn test_history_after_two_moves() {
    let mut mapper = mapper();
    let e = ContentId::new_v4();
    for path in ["/a", "/b", "/c"] {
        mapper.save(e, path, &en()).unwrap();
    }

    let history = mapper.load_history_by_content_uuid(e, &en()).unwrap();
    assert_eq!(paths(&history), vec!["/c", "/b", "/a"]);
    assert_eq!(history[0].kind, RouteKind::Path);
    assert!(history[1..].iter().all(|h| h.kind == RouteKind::History));
    assert!(history.windows(2).all(|w| w[0].created_at >= w[1].created_at));

    // Oldest history points straight at the current path
    for old in ["/a", "/b"] {
        match mapper.load_by_resource_locator(old, &en()) {
            Err(RouteError::Moved { location, .. }) => assert_eq!(location, "/c"),
            other => panic!("expected Moved for {old}, got {other:?}"),
        }
    }
}

#[test]
fn test_history_is_scoped() {
    let mut mapper = mapper();
    let e = ContentId::new_v4();
    mapper.save(e, "/a", &en()).unwrap();
    mapper.save(e, "/b", &en()).unwrap();
    mapper.save(e, "/x", &de()).unwrap();

    assert_eq!(paths(&mapper.load_history_by_content_uuid(e, &en()).unwrap()), vec!["/b", "/a"]);
    assert_eq!(paths(&mapper.load_history_by_content_uuid(e, &de()).unwrap()), vec!["/x"]);
    assert!(mapper
        .load_history_by_content_uuid(ContentId::new_v4(), &en())
        .unwrap()
        .is_empty());
}

#[test]
fn test_move_into_own_subtree() {
    let mut mapper = mapper();
    let e = ContentId::new_v4();
    mapper.save(e, "/a", &en()).unwrap();
    mapper.save(e, "/a/b", &en()).unwrap();

    assert_eq!(mapper.load_by_content_uuid(e, &en()).unwrap(), "/a/b");
    assert!(mapper.load_by_resource_locator("/a", &en()).unwrap_err().is_moved());
}

#[test]
fn test_reclaim_own_history() {
    let mut mapper = mapper();
    let e = ContentId::new_v4();
    for path in ["/a", "/b", "/a"] {
        mapper.save(e, path, &en()).unwrap();
    }

    assert_eq!(mapper.load_by_resource_locator("/a", &en()).unwrap(), e);
    match mapper.load_by_resource_locator("/b", &en()) {
        Err(RouteError::Moved { location, .. }) => assert_eq!(location, "/a"),
        other => panic!("expected Moved, got {other:?}"),
    }
    let history = mapper.load_history_by_content_uuid(e, &en()).unwrap();
    assert_eq!(paths(&history), vec!["/a", "/b"]);
}

#[test]
fn test_save_onto_foreign_history_rejected() {
    let mut mapper = mapper();
    let (e, f) = (ContentId::new_v4(), ContentId::new_v4());
    mapper.save(e, "/a", &en()).unwrap();
    mapper.save(e, "/b", &en()).unwrap();
    let before = mapper.load_history_by_content_uuid(e, &en()).unwrap();

    let err = mapper.save(f, "/a", &en()).unwrap_err();
    assert!(matches!(err, RouteError::AlreadyExists { ref path } if path == "/a"));

    let after = mapper.load_history_by_content_uuid(e, &en()).unwrap();
    assert_eq!(paths(&after), vec!["/b", "/a"]);
    assert_eq!(
        after.iter().map(|entry| entry.created_at).collect::<Vec<_>>(),
        before.iter().map(|entry| entry.created_at).collect::<Vec<_>>()
    );
    match mapper.load_by_resource_locator("/a", &en()) {
        Err(RouteError::Moved { location, .. }) => assert_eq!(location, "/b"),
        other => panic!("expected Moved, got {other:?}"),
    }
    assert!(mapper.load_by_content_uuid(f, &en()).unwrap_err().is_not_found());

    // The next free sibling is still available to the newcomer
    let free = mapper.unique_path("/a", &en()).unwrap();
    assert_eq!(free, "/a-1");
    mapper.save(f, free.as_str(), &en()).unwrap();
    assert_eq!(mapper.load_by_content_uuid(f, &en()).unwrap(), "/a-1");
}

#[test]
fn test_structural_node_is_not_a_route() {
    let mut mapper = mapper();
    mapper.save(ContentId::new_v4(), "/news/today", &en()).unwrap();
    assert!(mapper.load_by_resource_locator("/news", &en()).unwrap_err().is_not_found());

    let section = ContentId::new_v4();
    mapper.save(section, "/news", &en()).unwrap();
    assert_eq!(mapper.load_by_resource_locator("/news", &en()).unwrap(), section);
}

#[test]
fn test_lookup_misses() {
    let mapper = mapper();
    assert!(mapper.load_by_resource_locator("/nothing", &en()).unwrap_err().is_not_found());
    assert!(mapper.load_by_resource_locator("/", &en()).unwrap_err().is_not_found());
    assert!(mapper.load_by_content_uuid(ContentId::new_v4(), &en()).unwrap_err().is_not_found());
    assert!(matches!(
        mapper.load_by_resource_locator("", &en()),
        Err(RouteError::InvalidPath { .. })
    ));
}

#[test]
fn test_dangling_redirect_falls_back_to_current() {
    let mut mapper = mapper();
    let e = ContentId::new_v4();
    mapper.save(e, "/a", &en()).unwrap();
    mapper.save(e, "/b", &en()).unwrap();
    mapper.delete_by_path("/b", &en()).unwrap();

    // No current path left
    assert!(mapper.load_by_resource_locator("/a", &en()).unwrap_err().is_not_found());

    mapper.save(e, "/c", &en()).unwrap();
    match mapper.load_by_resource_locator("/a", &en()) {
        Err(RouteError::Moved { location, .. }) => assert_eq!(location, "/c"),
        other => panic!("expected Moved, got {other:?}"),
    }
}

// ============================================================================
// parent_path
// ============================================================================

#[test]
fn test_parent_path_nearest_routed_ancestor() {
    let mut mapper = mapper();
    let (site, section, page) = (ContentId::new_v4(), ContentId::new_v4(), ContentId::new_v4());
    let mut contents = ContentTree::new();
    contents.set_parent(section, site);
    contents.set_parent(page, section);

    mapper.save(site, "/home", &en()).unwrap();
    mapper.save(section, "/products", &en()).unwrap();
    mapper.save(site, "/start", &de()).unwrap();

    assert_eq!(
        mapper.parent_path(&contents, page, &en()).unwrap().unwrap(),
        "/products"
    );
    // `section` has no route in de; the next ancestor does
    assert_eq!(mapper.parent_path(&contents, page, &de()).unwrap().unwrap(), "/start");
}

#[test]
fn test_parent_path_other_scope_only() {
    let mut mapper = mapper();
    let (parent, child) = (ContentId::new_v4(), ContentId::new_v4());
    let mut contents = ContentTree::new();
    contents.set_parent(child, parent);
    mapper.save(parent, "/products", &de()).unwrap();

    assert_eq!(mapper.parent_path(&contents, child, &en()).unwrap(), None);
    assert_eq!(mapper.parent_path(&contents, parent, &de()).unwrap(), None);
}

// ============================================================================
// delete_by_path
// ============================================================================

#[test]
fn test_delete_refuses_degenerate_arguments() {
    let mut mapper = mapper();
    let e = ContentId::new_v4();
    mapper.save(e, "/a", &en()).unwrap();
    mapper.store_mut().commit().unwrap();

    for path in [Some(""), Some("   "), Some("/"), Some("//"), None] {
        let err = mapper.delete_by_path(path, &en()).unwrap_err();
        assert!(
            matches!(err, RouteError::InvalidArgument(_)),
            "expected InvalidArgument for {path:?}, got {err:?}"
        );
    }
    assert!(!mapper.store().has_pending_changes());
    assert_eq!(mapper.load_by_content_uuid(e, &en()).unwrap(), "/a");
}

#[test]
fn test_delete_removes_subtree() {
    let mut mapper = mapper();
    let (news, sub) = (ContentId::new_v4(), ContentId::new_v4());
    mapper.save(news, "/news", &en()).unwrap();
    mapper.save(sub, "/news/sub", &en()).unwrap();
    mapper.save(ContentId::new_v4(), "/other", &en()).unwrap();

    mapper.delete_by_path("/news", &en()).unwrap();
    assert!(mapper.load_by_resource_locator("/news", &en()).unwrap_err().is_not_found());
    assert!(mapper.load_by_resource_locator("/news/sub", &en()).unwrap_err().is_not_found());
    assert!(mapper.load_by_content_uuid(sub, &en()).unwrap_err().is_not_found());
    assert!(mapper.load_by_resource_locator("/other", &en()).is_ok());
}

#[test]
fn test_delete_removes_history_nodes() {
    let mut mapper = mapper();
    let e = ContentId::new_v4();
    mapper.save(e, "/old", &en()).unwrap();
    mapper.save(e, "/new", &en()).unwrap();

    mapper.delete_by_path("/old", &en()).unwrap();
    assert_eq!(paths(&mapper.load_history_by_content_uuid(e, &en()).unwrap()), vec!["/new"]);
}

#[test]
fn test_delete_missing_and_malformed() {
    let mut mapper = mapper();
    assert!(mapper.delete_by_path("/ghost", &en()).unwrap_err().is_not_found());
    assert!(matches!(
        mapper.delete_by_path("ghost", &en()),
        Err(RouteError::InvalidPath { .. })
    ));
}

// ============================================================================
// tree
// ============================================================================

#[test]
fn test_tree_listing() {
    let mut mapper = mapper();
    assert!(mapper.tree(&en()).unwrap().is_empty());

    let (a, c) = (ContentId::new_v4(), ContentId::new_v4());
    mapper.save(a, "/a/b", &en()).unwrap();
    mapper.save(c, "/c", &en()).unwrap();

    let entries = mapper.tree(&en()).unwrap();
    let listed: Vec<_> = entries.iter().map(|e| (e.path.as_str(), e.depth)).collect();
    assert_eq!(listed, vec![("/", 0), ("/a", 1), ("/a/b", 2), ("/c", 1)]);
    assert!(entries[0].route.is_none());
    assert!(entries[1].route.is_none());
    assert_eq!(entries[2].route.as_ref().unwrap().content, a);
    assert_eq!(entries[3].route.as_ref().unwrap().content, c);
}

#[test]
fn test_custom_root_template() {
    let options = MapperOptions {
        root_template: "/sites/{workspace}/{locale}".to_string(),
        ..MapperOptions::default()
    };
    let mut mapper = RouteTreeMapper::with_options(Repository::in_memory().session(), options);
    mapper.save(ContentId::new_v4(), "/a", &en()).unwrap();
    assert!(mapper.store().find_by_path("/sites/default/en/a").unwrap().is_some());
    assert!(mapper.store().find_by_path("/cmf").unwrap().is_none());
}

// ============================================================================
// Sessions
// ============================================================================

#[test]
fn test_staged_until_commit() {
    let repo = Repository::in_memory();
    let mut writer = RouteTreeMapper::new(repo.session());
    let e = ContentId::new_v4();
    writer.save(e, "/a", &en()).unwrap();

    let reader = RouteTreeMapper::new(repo.session());
    assert!(reader.load_by_resource_locator("/a", &en()).unwrap_err().is_not_found());

    writer.store_mut().commit().unwrap();
    let reader = RouteTreeMapper::new(repo.session());
    assert_eq!(reader.load_by_resource_locator("/a", &en()).unwrap(), e);
}

#[test]
fn test_rollback_discards_save() {
    let mut mapper = mapper();
    let e = ContentId::new_v4();
    mapper.save(e, "/a", &en()).unwrap();
    mapper.store_mut().rollback().unwrap();
    assert!(mapper.load_by_content_uuid(e, &en()).unwrap_err().is_not_found());
}

#[test]
fn test_concurrent_saves_same_path_conflict() {
    let repo = Repository::in_memory();
    let mut first = RouteTreeMapper::new(repo.session());
    let mut second = RouteTreeMapper::new(repo.session());
    let (a, b) = (ContentId::new_v4(), ContentId::new_v4());

    // Neither session sees the other's pending claim
    first.save(a, "/news", &en()).unwrap();
    second.save(b, "/news", &en()).unwrap();

    first.store_mut().commit().unwrap();
    let err: RouteError = second.store_mut().commit().unwrap_err().into();
    assert!(matches!(err, RouteError::AlreadyExists { ref path } if path.ends_with("/news")));

    second.store_mut().refresh(false).unwrap();
    assert_eq!(second.load_by_resource_locator("/news", &en()).unwrap(), a);
}

#[test]
fn test_concurrent_saves_distinct_paths_merge() {
    let repo = Repository::in_memory();
    let mut first = RouteTreeMapper::new(repo.session());
    let mut second = RouteTreeMapper::new(repo.session());
    let (a, b) = (ContentId::new_v4(), ContentId::new_v4());

    first.save(a, "/products/a", &en()).unwrap();
    second.save(b, "/products/b", &en()).unwrap();
    first.store_mut().commit().unwrap();
    second.store_mut().commit().unwrap();

    let reader = RouteTreeMapper::new(repo.session());
    assert_eq!(reader.load_by_resource_locator("/products/a", &en()).unwrap(), a);
    assert_eq!(reader.load_by_resource_locator("/products/b", &en()).unwrap(), b);
}

#[test]
fn test_persisted_routes_reload() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("routes.json");
    let e = ContentId::new_v4();

    let mut mapper = RouteTreeMapper::new(Repository::open(&file).unwrap().session());
    mapper.save(e, "/a", &en()).unwrap();
    mapper.save(e, "/b", &en()).unwrap();
    mapper.store_mut().commit().unwrap();

    let reopened = RouteTreeMapper::new(Repository::open(&file).unwrap().session());
    assert_eq!(reopened.load_by_content_uuid(e, &en()).unwrap(), "/b");
    assert!(reopened.load_by_resource_locator("/a", &en()).unwrap_err().is_moved());
    assert_eq!(
        reopened.load_history_by_content_uuid(e, &en()).unwrap(),
        mapper.load_history_by_content_uuid(e, &en()).unwrap()
    );
}
