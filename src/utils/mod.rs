//! Utility modules for the static site generator.

pub mod exec;
pub mod git;
pub mod path;

/// Format count with noun: `plural_count(1, "file")` -> `"1 file"`.
#[inline]
pub fn plural_count(count: usize, noun: &str) -> String {
    let suffix = if count == 1 { "" } else { "s" };
    format!("{count} {noun}{suffix}")
}
