//! Small formatting helpers.

/// `plural_count(1, "route")` -> `"1 route"`, `plural_count(3, "route")` -> `"3 routes"`
#[inline]
pub fn plural_count(count: usize, noun: &str) -> String {
    let suffix = if count == 1 { "" } else { "s" };
    format!("{count} {noun}{suffix}")
}
