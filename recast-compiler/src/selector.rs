//! Selector resolution
//!
//! A recorded step carries several candidate selectors grouped the way the
//! recorder produced them. Exactly one is chosen, preferring the most
//! specific locator style and falling back toward broader ones.

use crate::script::js_string;

/// Prefixes in order of preference
const PREFERRED_PREFIXES: [&str; 5] = ["#", "xpath/", "aria/", "pierce/", "text/"];

/// Candidates this short are taken before falling back to the first one
const SHORT_SELECTOR_MAX_LEN: usize = 4;

/// Timeout passed to every element lookup, in milliseconds
const LOOKUP_TIMEOUT_MS: u32 = 10_000;

/// Pick one selector from the candidate groups
///
/// Groups are flattened in order and empty strings are ignored. The first
/// candidate matching the highest-priority rule wins:
/// `#id` > `xpath/` > `aria/` > `pierce/` > `text/` > length ≤ 4 > first.
///
/// # Returns
/// `None` when there is no candidate at all
pub fn resolve_selector(groups: &[Vec<String>]) -> Option<&str> {
    let candidates: Vec<&str> = groups
        .iter()
        .flatten()
        .map(String::as_str)
        .filter(|candidate| !candidate.is_empty())
        .collect();

    for prefix in PREFERRED_PREFIXES {
        if let Some(found) = candidates.iter().find(|c| c.starts_with(prefix)) {
            return Some(found);
        }
    }

    candidates
        .iter()
        .find(|c| c.chars().count() <= SHORT_SELECTOR_MAX_LEN)
        .or_else(|| candidates.first())
        .copied()
}

/// Render the Cypress expression that locates `selector`
///
/// `xpath/` selectors go through `cy.xpath` with the path re-anchored at
/// `//`; everything else goes through `cy.get` verbatim.
pub fn locator_code(selector: &str) -> String {
    match selector.strip_prefix("xpath/") {
        Some(path) => format!(
            "cy.xpath({}, {{ timeout: {} }})",
            js_string(&format!("//{}", path.trim_start_matches('/'))),
            LOOKUP_TIMEOUT_MS
        ),
        None => format!(
            "cy.get({}, {{ timeout: {} }})",
            js_string(selector),
            LOOKUP_TIMEOUT_MS
        ),
    }
}
