use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::HashSet;

use super::error::CoreError;

/// Builds a `GlobSet` from a set of `.gitignore`-style patterns.
///
/// Blank lines and `#` comments are skipped. `name/` patterns match the
/// directory and everything below it; any other pattern matches at any depth.
pub fn build_globset_from_patterns(patterns: &HashSet<String>) -> Result<GlobSet, CoreError> {
    let mut builder = GlobSetBuilder::new();

    let mut sorted: Vec<&String> = patterns.iter().collect();
    sorted.sort();

    for pattern in sorted {
        let trimmed_pattern = pattern.trim();
        if trimmed_pattern.is_empty() || trimmed_pattern.starts_with('#') {
            continue;
        }

        if let Some(dir_pattern) = trimmed_pattern.strip_suffix('/') {
            builder.add(Glob::new(&format!("**/{dir_pattern}"))?);
            builder.add(Glob::new(&format!("**/{dir_pattern}/**"))?);
        } else {
            builder.add(Glob::new(&format!("**/{trimmed_pattern}"))?);
        }
    }

    Ok(builder.build()?)
}
