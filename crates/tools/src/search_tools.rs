//! Catalog reduction for backends that accept only a few tool definitions.
//!
//! When the offered catalog is larger than the backend's `max_tool_count`,
//! the request carries the first `max_tool_count - 1` definitions plus a
//! `search_tools` definition. Tools the model found through `search_tools`
//! are pinned to the front of the next request.

use recollect_core::tool::ToolDefinition;

pub const SEARCH_TOOLS: &str = "search_tools";

/// Hits returned by one `search_tools` call.
pub const MAX_HITS: usize = 5;

/// The definition of the built-in `search_tools` capability.
pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: SEARCH_TOOLS.to_string(),
        description: "Not every tool fits in this request. Search the full tool catalog by \
                      keywords; matching tools are offered on your next turn."
            .to_string(),
        parameters: serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Keywords describing what you want to do"
                }
            },
            "required": ["query"]
        }),
    }
}

/// Reduce `offered` to at most `max` definitions.
///
/// Order is `pinned` names first (in pin order), then the remaining
/// definitions in their offered order. Returns `offered` unchanged when it
/// already fits.
pub fn reduce(offered: &[ToolDefinition], pinned: &[String], max: usize) -> Vec<ToolDefinition> {
    if offered.len() <= max {
        return offered.to_vec();
    }
    if max == 0 {
        return Vec::new();
    }

    let pinned_defs = pinned
        .iter()
        .filter_map(|name| offered.iter().find(|d| &d.name == name));
    let rest = offered.iter().filter(|d| !pinned.contains(&d.name));

    let mut reduced: Vec<ToolDefinition> = pinned_defs.chain(rest).take(max - 1).cloned().collect();
    reduced.push(definition());
    reduced
}

/// Rank definitions by how many query terms appear in their name or
/// description. Ties keep catalog order; definitions matching no term are
/// dropped.
pub fn rank<'a>(offered: &'a [ToolDefinition], query: &str, limit: usize) -> Vec<&'a ToolDefinition> {
    let terms: Vec<String> = query
        .split_whitespace()
        .map(str::to_lowercase)
        .collect();

    let mut scored: Vec<(usize, &ToolDefinition)> = offered
        .iter()
        .filter(|d| d.name != SEARCH_TOOLS)
        .map(|d| {
            let haystack = format!("{} {}", d.name.replace('_', " "), d.description).to_lowercase();
            let score = terms.iter().filter(|t| haystack.contains(t.as_str())).count();
            (score, d)
        })
        .filter(|(score, _)| *score > 0)
        .collect();

    // Stable sort keeps catalog order among equal scores.
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().take(limit).map(|(_, d)| d).collect()
}
