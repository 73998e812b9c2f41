//! Filing browser helpers: search queries, listing rows, sort and paging.
//!
//! The backend's `/edinet/list` endpoint returns raw EDINET document records
//! whose key spelling differs between API versions. [`FilingSummary`]
//! flattens them into the four columns a listing shows; [`sort_filings`] and
//! [`paginate`] implement the table behaviour.

use crate::error::ValidationError;
use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

/// EDINET document-type codes offered as search filters.
pub const DOC_TYPES: &[(&str, &str)] = &[
    ("120", "有価証券報告書"),
    ("130", "四半期報告書"),
    ("140", "臨時報告書"),
    ("150", "訂正報告書"),
    ("160", "内部統制報告書"),
];

/// Rows per listing page.
pub const DEFAULT_PAGE_SIZE: usize = 20;

static RE_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());

/// Label of a document-type code, if it is one of [`DOC_TYPES`].
pub fn doc_type_label(code: &str) -> Option<&'static str> {
    DOC_TYPES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, label)| *label)
}

/// Parse a strict `YYYY-MM-DD` calendar date.
pub fn validate_date(input: &str) -> Result<NaiveDate, ValidationError> {
    let invalid = || ValidationError::InvalidDate {
        input: input.to_string(),
    };
    if !RE_DATE.is_match(input) {
        return Err(invalid());
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d").map_err(|_| invalid())
}

// ── Queries ──────────────────────────────────────────────────────────────

/// The submission period a search covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilingPeriod {
    Day(NaiveDate),
    Range { start: NaiveDate, end: NaiveDate },
}

impl FilingPeriod {
    pub fn day(date: &str) -> Result<Self, ValidationError> {
        Ok(Self::Day(validate_date(date)?))
    }

    /// Inclusive range; `start` must not be after `end`.
    pub fn range(start: &str, end: &str) -> Result<Self, ValidationError> {
        let s = validate_date(start)?;
        let e = validate_date(end)?;
        if s > e {
            return Err(ValidationError::InvalidRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self::Range { start: s, end: e })
    }
}

/// A filing search for one company.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilingQuery {
    pub edinet_code: String,
    pub period: FilingPeriod,
    pub doc_type_codes: Vec<String>,
}

impl FilingQuery {
    pub fn new(edinet_code: &str, period: FilingPeriod) -> Result<Self, ValidationError> {
        let edinet_code = edinet_code.trim();
        if edinet_code.is_empty() {
            return Err(ValidationError::MissingEdinetCode);
        }
        Ok(Self {
            edinet_code: edinet_code.to_string(),
            period,
            doc_type_codes: Vec::new(),
        })
    }

    /// Filings submitted on one day.
    pub fn day(edinet_code: &str, date: &str) -> Result<Self, ValidationError> {
        Self::new(edinet_code, FilingPeriod::day(date)?)
    }

    /// Filings submitted between two days, inclusive.
    pub fn range(edinet_code: &str, start: &str, end: &str) -> Result<Self, ValidationError> {
        Self::new(edinet_code, FilingPeriod::range(start, end)?)
    }

    /// Restrict to the given document-type codes. Blank codes are dropped.
    pub fn with_doc_types<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.doc_type_codes = codes
            .into_iter()
            .map(|c| c.as_ref().trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        self
    }

    /// Query-string parameters for the list endpoint.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("edinet_code", self.edinet_code.clone())];
        match self.period {
            FilingPeriod::Day(date) => pairs.push(("date", date.format("%Y-%m-%d").to_string())),
            FilingPeriod::Range { start, end } => {
                pairs.push(("start", start.format("%Y-%m-%d").to_string()));
                pairs.push(("end", end.format("%Y-%m-%d").to_string()));
            }
        }
        if !self.doc_type_codes.is_empty() {
            pairs.push(("doc_type_codes", self.doc_type_codes.join(",")));
        }
        pairs
    }
}

// ── Listing rows ─────────────────────────────────────────────────────────

/// One row of a filing listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilingSummary {
    #[serde(rename = "docID")]
    pub doc_id: String,
    pub submitter: String,
    pub title: String,
    pub date: String,
}

impl FilingSummary {
    /// Flatten a raw filing record. Absent or empty fields fall through to
    /// their alternate spelling, then to a default.
    pub fn from_json(record: &Value) -> Self {
        Self {
            doc_id: first_text(record, &["docID", "docId"]).unwrap_or_default(),
            submitter: first_text(record, &["filerName", "submitterName"])
                .unwrap_or_else(|| "-".to_string()),
            title: first_text(record, &["docDescription", "title"])
                .unwrap_or_else(|| "-".to_string()),
            date: first_text(record, &["submitDateTime", "docSubmitDateTime"]).unwrap_or_default(),
        }
    }

    /// Submission time, if the date column parses.
    pub fn submitted_at(&self) -> Option<NaiveDateTime> {
        parse_timestamp(&self.date)
    }
}

fn first_text(record: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| match record.get(*k)? {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    })
}

fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

// ── Sorting ──────────────────────────────────────────────────────────────

/// Listing column to sort by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    DocId,
    Submitter,
    Title,
    #[default]
    Date,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

/// Stable sort of a listing.
///
/// Text columns compare case-insensitively. The date column compares
/// timestamps; rows whose date does not parse always go last.
pub fn sort_filings(rows: &mut [FilingSummary], key: SortKey, direction: SortDirection) {
    let directed = |o: Ordering| match direction {
        SortDirection::Asc => o,
        SortDirection::Desc => o.reverse(),
    };
    rows.sort_by(|a, b| match key {
        SortKey::Date => match (a.submitted_at(), b.submitted_at()) {
            (Some(x), Some(y)) => directed(x.cmp(&y)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
        SortKey::DocId => directed(cmp_text(&a.doc_id, &b.doc_id)),
        SortKey::Submitter => directed(cmp_text(&a.submitter, &b.submitter)),
        SortKey::Title => directed(cmp_text(&a.title, &b.title)),
    });
}

fn cmp_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

// ── Paging ───────────────────────────────────────────────────────────────

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageView<'a, T> {
    pub items: &'a [T],
    /// 1-based, clamped to `1..=total_pages`.
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
    /// 1-based position of the first item shown (0 when empty).
    pub first_index: usize,
    /// 1-based position of the last item shown (0 when empty).
    pub last_index: usize,
}

impl<T> PageView<'_, T> {
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Slice out page `page` (1-based). Out-of-range pages are clamped; there is
/// always at least one page.
pub fn paginate<T>(items: &[T], page: usize, page_size: usize) -> PageView<'_, T> {
    let page_size = page_size.max(1);
    let total_items = items.len();
    let total_pages = total_items.div_ceil(page_size).max(1);
    let page = page.clamp(1, total_pages);
    let start = ((page - 1) * page_size).min(total_items);
    let end = (start + page_size).min(total_items);
    let (first_index, last_index) = if start < end { (start + 1, end) } else { (0, 0) };
    PageView {
        items: &items[start..end],
        page,
        total_pages,
        total_items,
        first_index,
        last_index,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(id: &str, submitter: &str, date: &str) -> FilingSummary {
        FilingSummary {
            doc_id: id.into(),
            submitter: submitter.into(),
            title: "-".into(),
            date: date.into(),
        }
    }

    #[test]
    fn dates_must_be_real() {
        assert_eq!(
            validate_date("2024-02-29").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        for bad in ["2023-02-29", "2024-13-01", "2024-1-01", "20240101", " 2024-01-01", ""] {
            assert!(validate_date(bad).is_err(), "{bad:?}");
        }
    }

    #[test]
    fn range_must_be_ordered() {
        assert!(FilingPeriod::range("2024-01-01", "2024-01-01").is_ok());
        assert_eq!(
            FilingPeriod::range("2024-02-01", "2024-01-01"),
            Err(ValidationError::InvalidRange {
                start: "2024-02-01".into(),
                end: "2024-01-01".into()
            })
        );
    }

    #[test]
    fn query_pairs_day_and_range() {
        let q = FilingQuery::day("E02144", "2024-06-25").unwrap();
        assert_eq!(
            q.query_pairs(),
            vec![("edinet_code", "E02144".to_string()), ("date", "2024-06-25".to_string())]
        );

        let q = FilingQuery::range("E02144", "2024-01-01", "2024-03-31")
            .unwrap()
            .with_doc_types(["120", " ", "140"]);
        assert_eq!(
            q.query_pairs(),
            vec![
                ("edinet_code", "E02144".to_string()),
                ("start", "2024-01-01".to_string()),
                ("end", "2024-03-31".to_string()),
                ("doc_type_codes", "120,140".to_string()),
            ]
        );
    }

    #[test]
    fn query_needs_code() {
        assert_eq!(
            FilingQuery::day("  ", "2024-06-25"),
            Err(ValidationError::MissingEdinetCode)
        );
    }

    #[test]
    fn summary_key_fallbacks() {
        let s = FilingSummary::from_json(&json!({
            "docId": "S100ABCD",
            "submitterName": "トヨタ自動車株式会社",
            "docDescription": "",
            "title": "有価証券報告書",
            "docSubmitDateTime": "2024-06-25 15:00"
        }));
        assert_eq!(s.doc_id, "S100ABCD");
        assert_eq!(s.submitter, "トヨタ自動車株式会社");
        assert_eq!(s.title, "有価証券報告書");
        assert_eq!(s.date, "2024-06-25 15:00");

        let empty = FilingSummary::from_json(&json!({}));
        assert_eq!(empty, row("", "-", ""));
        assert_eq!(empty.title, "-");
    }

    #[test]
    fn sort_by_date_puts_unparseable_last() {
        let mut rows = vec![
            row("a", "x", "2024-06-25 15:00"),
            row("b", "x", "garbage"),
            row("c", "x", "2023-06-26 09:30"),
            row("d", "x", "2024-06-25"),
        ];
        sort_filings(&mut rows, SortKey::Date, SortDirection::Desc);
        let ids: Vec<_> = rows.iter().map(|r| r.doc_id.as_str()).collect();
        assert_eq!(ids, ["a", "d", "c", "b"]);

        sort_filings(&mut rows, SortKey::Date, SortDirection::Asc);
        let ids: Vec<_> = rows.iter().map(|r| r.doc_id.as_str()).collect();
        assert_eq!(ids, ["c", "d", "a", "b"]);
    }

    #[test]
    fn sort_text_case_insensitive_and_stable() {
        let mut rows = vec![
            row("1", "beta", ""),
            row("2", "Alpha", ""),
            row("3", "alpha", ""),
        ];
        sort_filings(&mut rows, SortKey::Submitter, SortDirection::Asc);
        let ids: Vec<_> = rows.iter().map(|r| r.doc_id.as_str()).collect();
        assert_eq!(ids, ["2", "3", "1"]);
    }

    #[test]
    fn paging_bounds() {
        let items: Vec<u32> = (1..=45).collect();
        let p = paginate(&items, 3, DEFAULT_PAGE_SIZE);
        assert_eq!(p.items, &[41, 42, 43, 44, 45]);
        assert_eq!((p.first_index, p.last_index), (41, 45));
        assert_eq!(p.total_pages, 3);
        assert!(p.has_prev() && !p.has_next());

        let clamped = paginate(&items, 99, DEFAULT_PAGE_SIZE);
        assert_eq!(clamped.page, 3);
        assert_eq!(paginate(&items, 0, DEFAULT_PAGE_SIZE).page, 1);
    }

    #[test]
    fn paging_empty_has_one_page() {
        let items: Vec<u32> = Vec::new();
        let p = paginate(&items, 1, DEFAULT_PAGE_SIZE);
        assert_eq!(p.total_pages, 1);
        assert!(p.items.is_empty());
        assert_eq!((p.first_index, p.last_index), (0, 0));
        assert!(!p.has_prev() && !p.has_next());
    }

    #[test]
    fn doc_type_labels() {
        assert_eq!(doc_type_label("120"), Some("有価証券報告書"));
        assert_eq!(doc_type_label("999"), None);
    }
}
