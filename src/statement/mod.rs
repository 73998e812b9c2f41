//! Field resolution: loosely-shaped parsed statements → canonical KPI rows.
//!
//! The backend's parser emits one JSON object per statement section (`PL`,
//! `BS`, `CF`). Keys vary by source document (Japanese labels, English
//! labels, abbreviations) and values may be numbers, comma-formatted strings,
//! or objects keyed by fiscal period. This module turns that into a fixed,
//! ordered list of [`Row`]s per statement.
//!
//! ## Data Flow
//!
//! ```text
//! statement ──▶ resolve ──▶ rows
//!                 │  ▲
//!       normalize ┘  └ coerce
//! ```
//!
//! 1. [`normalize`]: canonicalise keys for fuzzy comparison
//! 2. [`coerce`]   : turn a value into one finite `f64` or nothing
//! 3. [`resolve`]  : first matching key in object order wins
//! 4. [`rows`]     : apply the resolver across a statement's candidate list
//!
//! Nothing here returns an error: unresolvable fields are omitted.

pub mod coerce;
pub mod normalize;
pub mod resolve;
pub mod rows;

pub use coerce::{coerce, FieldValue};
pub use normalize::{keys_match, normalize_key};
pub use resolve::resolve;
pub use rows::{
    bs_candidates, build_rows, cf_candidates, pl_candidates, LineItemCandidate, ParsedFiling,
    Row, Statement, StatementRows,
};
