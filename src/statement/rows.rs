//! Row building: one canonical, ordered row list per statement.

use crate::statement::resolve::resolve;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A canonical line-item plus the raw-key substrings that identify it,
/// highest priority first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemCandidate {
    pub label: String,
    pub patterns: Vec<String>,
}

impl LineItemCandidate {
    pub fn new<I, S>(label: impl Into<String>, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            label: label.into(),
            patterns: patterns.into_iter().map(Into::into).collect(),
        }
    }
}

/// One charted data point. `value` is always finite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub x: String,
    pub value: f64,
}

/// Build rows for `candidates` in declaration order.
///
/// Candidates that do not resolve are skipped. An absent, empty or
/// non-object statement yields no rows.
pub fn build_rows(statement: Option<&Value>, candidates: &[LineItemCandidate]) -> Vec<Row> {
    let Some(statement) = statement else {
        return Vec::new();
    };
    candidates
        .iter()
        .filter_map(|c| {
            resolve(statement, c).map(|value| Row {
                x: c.label.clone(),
                value,
            })
        })
        .collect()
}

// ── Standard statements ──────────────────────────────────────────────────

static PL_CANDIDATES: Lazy<Vec<LineItemCandidate>> = Lazy::new(|| {
    vec![
        LineItemCandidate::new("売上高", ["売上高", "売上", "営業収益", "revenue", "sales"]),
        LineItemCandidate::new(
            "営業利益",
            ["営業利益", "operating income", "operating profit"],
        ),
        LineItemCandidate::new(
            "当期純利益",
            ["当期純利益", "純利益", "net income", "profit attributable", "当期利益"],
        ),
    ]
});

static BS_CANDIDATES: Lazy<Vec<LineItemCandidate>> = Lazy::new(|| {
    vec![
        LineItemCandidate::new("総資産", ["総資産", "total assets"]),
        LineItemCandidate::new("純資産", ["純資産", "net assets", "equity", "株主資本"]),
        LineItemCandidate::new("自己資本比率(%)", ["自己資本比率", "equity ratio"]),
    ]
});

static CF_CANDIDATES: Lazy<Vec<LineItemCandidate>> = Lazy::new(|| {
    vec![
        LineItemCandidate::new(
            "営業CF",
            ["営業活動によるキャッシュフロー", "営業cf", "cash flows from operating", "cfo"],
        ),
        LineItemCandidate::new(
            "投資CF",
            ["投資活動によるキャッシュフロー", "投資cf", "cash flows from investing", "cfi"],
        ),
        LineItemCandidate::new(
            "財務CF",
            ["財務活動によるキャッシュフロー", "財務cf", "cash flows from financing", "cff"],
        ),
    ]
});

/// Profit & loss candidates, in presentation order.
pub fn pl_candidates() -> &'static [LineItemCandidate] {
    &PL_CANDIDATES
}

/// Balance sheet candidates, in presentation order.
pub fn bs_candidates() -> &'static [LineItemCandidate] {
    &BS_CANDIDATES
}

/// Cash-flow candidates, in presentation order.
pub fn cf_candidates() -> &'static [LineItemCandidate] {
    &CF_CANDIDATES
}

/// The three standard statement sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Statement {
    Pl,
    Bs,
    Cf,
}

impl Statement {
    pub const ALL: [Statement; 3] = [Statement::Pl, Statement::Bs, Statement::Cf];

    /// Section key in the parsed-filing payload.
    pub fn key(self) -> &'static str {
        match self {
            Statement::Pl => "PL",
            Statement::Bs => "BS",
            Statement::Cf => "CF",
        }
    }

    /// Chart title for the section.
    pub fn title(self) -> &'static str {
        match self {
            Statement::Pl => "PL 主要項目",
            Statement::Bs => "BS 主要項目",
            Statement::Cf => "CF 主要項目",
        }
    }

    pub fn candidates(self) -> &'static [LineItemCandidate] {
        match self {
            Statement::Pl => pl_candidates(),
            Statement::Bs => bs_candidates(),
            Statement::Cf => cf_candidates(),
        }
    }
}

/// The `parsed` payload returned by the backend's parse endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedFiling {
    #[serde(rename = "PL", default, skip_serializing_if = "Option::is_none")]
    pub pl: Option<Value>,
    #[serde(rename = "BS", default, skip_serializing_if = "Option::is_none")]
    pub bs: Option<Value>,
    #[serde(rename = "CF", default, skip_serializing_if = "Option::is_none")]
    pub cf: Option<Value>,
}

impl ParsedFiling {
    pub fn section(&self, statement: Statement) -> Option<&Value> {
        match statement {
            Statement::Pl => self.pl.as_ref(),
            Statement::Bs => self.bs.as_ref(),
            Statement::Cf => self.cf.as_ref(),
        }
    }
}

/// Rows for all three statements of one filing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatementRows {
    pub pl: Vec<Row>,
    pub bs: Vec<Row>,
    pub cf: Vec<Row>,
}

impl StatementRows {
    pub fn from_filing(filing: &ParsedFiling) -> Self {
        let build = |s: Statement| build_rows(filing.section(s), s.candidates());
        Self {
            pl: build(Statement::Pl),
            bs: build(Statement::Bs),
            cf: build(Statement::Cf),
        }
    }

    pub fn get(&self, statement: Statement) -> &[Row] {
        match statement {
            Statement::Pl => &self.pl,
            Statement::Bs => &self.bs,
            Statement::Cf => &self.cf,
        }
    }

    /// True when no statement produced a row, so there is nothing to chart.
    pub fn is_empty(&self) -> bool {
        self.pl.is_empty() && self.bs.is_empty() && self.cf.is_empty()
    }
}
