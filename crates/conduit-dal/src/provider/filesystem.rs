//! Wildcard expansion for engine URLs that address local files.
//!
//! `csv:///data/*.csv` names every matching file at once. Expansion turns it
//! into one concrete engine URL per match, keeping the engine type and the
//! options of the pattern.

use std::path::Path;

use conduit_core::{Error, Result};
use globset::GlobBuilder;
use walkdir::WalkDir;

use crate::TRACING_TARGET_CONNECTOR;
use crate::url::{EngineUrl, ResolverContext};

/// Characters that open a glob construct in a path.
const GLOB_CHARACTERS: [char; 4] = ['*', '?', '[', '{'];

/// Expands a wildcard engine URL into one engine URL per matching path.
///
/// `*` and `?` never match `/`; `**` matches across directories. Matches are
/// returned sorted. A pattern without glob characters yields itself if the
/// path exists, and nothing otherwise.
///
/// Fails with `Unresolved` while the URL still holds placeholders, since
/// there is nothing concrete to match against yet.
pub fn expand_filesystem_pattern(engine_url: &str) -> Result<Vec<String>> {
    let literal = ResolverContext::new().resolve(engine_url).into_result()?;
    let url = EngineUrl::parse(&literal)?;

    let pattern = url.path();
    let Some((root, rest)) = split_pattern(pattern) else {
        return Ok(if Path::new(pattern).try_exists()? {
            vec![literal]
        } else {
            Vec::new()
        });
    };

    let matcher = GlobBuilder::new(rest)
        .literal_separator(true)
        .build()
        .map_err(|err| {
            Error::malformed_url()
                .with_message(format!("'{pattern}' is not a valid path pattern"))
                .with_source(err)
        })?
        .compile_matcher();

    let walk_root = if root.is_empty() { "." } else { root };
    let depth = if rest.contains("**") {
        usize::MAX
    } else {
        rest.split('/').filter(|part| !part.is_empty()).count()
    };

    let mut expanded: Vec<String> = WalkDir::new(walk_root)
        .min_depth(1)
        .max_depth(depth)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let relative = entry.path().strip_prefix(walk_root).ok()?;
            if !matcher.is_match(relative) {
                return None;
            }

            let matched = if root.is_empty() { relative } else { entry.path() };
            match matched.to_str() {
                Some(path) => Some(format!("{}{path}{}", url.engine_type(), url.options())),
                None => {
                    tracing::trace!(
                        target: TRACING_TARGET_CONNECTOR,
                        path = %matched.display(),
                        "skipped match that is not valid unicode"
                    );
                    None
                }
            }
        })
        .collect();
    expanded.sort();

    tracing::debug!(
        target: TRACING_TARGET_CONNECTOR,
        engine_url,
        matches = expanded.len(),
        "expanded engine url pattern"
    );
    Ok(expanded)
}

/// Splits a path pattern into the literal directory to search from and the
/// glob to match below it. `None` when the path holds no glob characters.
fn split_pattern(pattern: &str) -> Option<(&str, &str)> {
    let first = pattern.find(GLOB_CHARACTERS)?;
    Some(match pattern[..first].rfind('/') {
        Some(0) => ("/", &pattern[1..]),
        Some(slash) => (&pattern[..slash], &pattern[slash + 1..]),
        None => ("", pattern),
    })
}
