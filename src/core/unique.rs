//! Collision-free segment names.

use rustc_hash::FxHashSet;

/// Computes a segment name that does not collide with any sibling.
///
/// Probing is a first-gap scan: `base`, then `base-1`, `base-2`, ... The scan
/// always restarts at 1, so a free `base-5` is never preferred over `base-2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniqueNameResolver {
    separator: char,
}

impl Default for UniqueNameResolver {
    fn default() -> Self {
        Self::new('-')
    }
}

impl UniqueNameResolver {
    pub const fn new(separator: char) -> Self {
        Self { separator }
    }

    pub const fn separator(&self) -> char {
        self.separator
    }

    /// Resolve `desired` against the names already taken under the same parent.
    pub fn resolve<S: AsRef<str>>(&self, siblings: &[S], desired: &str) -> String {
        let taken: FxHashSet<&str> = siblings.iter().map(AsRef::as_ref).collect();
        if !taken.contains(desired) {
            return desired.to_string();
        }

        let mut suffix: u64 = 1;
        loop {
            let candidate = format!("{desired}{}{suffix}", self.separator);
            if !taken.contains(candidate.as_str()) {
                return candidate;
            }
            suffix += 1;
        }
    }
}
