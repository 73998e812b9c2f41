//! Candidate resolution: find one line-item's figure in a statement.
//!
//! The scan walks the statement's top-level keys in document order and stops
//! at the first key that both matches one of the candidate's patterns and
//! coerces to a number. Pattern order inside a candidate does not re-order the
//! scan: a lower-priority synonym on an earlier key beats a higher-priority
//! one on a later key. Changing this changes which figure is displayed for
//! ambiguous filings.

use crate::statement::coerce::coerce;
use crate::statement::normalize::{keys_match, normalize_key};
use crate::statement::rows::LineItemCandidate;
use serde_json::Value;
use tracing::debug;

/// Resolve `candidate` against the top-level entries of `statement`.
///
/// Returns `None` when the statement is not an object, when no key matches,
/// or when every matching key holds a non-numeric value (note references,
/// blanks). Never recurses into keys, only into values via coercion.
pub fn resolve(statement: &Value, candidate: &LineItemCandidate) -> Option<f64> {
    let entries = statement.as_object()?;
    let patterns: Vec<String> = candidate
        .patterns
        .iter()
        .map(|p| normalize_key(p))
        .collect();

    for (key, value) in entries {
        let normalized = normalize_key(key);
        if !patterns.iter().any(|p| keys_match(&normalized, p)) {
            continue;
        }
        match coerce(value) {
            Some(n) => {
                debug!("{}: resolved from key '{}' → {}", candidate.label, key, n);
                return Some(n);
            }
            None => debug!(
                "{}: key '{}' matched but value is not numeric; continuing",
                candidate.label, key
            ),
        }
    }

    debug!("{}: unresolved", candidate.label);
    None
}
