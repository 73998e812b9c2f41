//! Key normalisation for fuzzy label matching.
//!
//! `"営業活動による キャッシュ・フロー"`, `"Cash_Flows-From Operating"` and
//! `"cash flows from operating"` should all land on the same comparison key.
//! Normalisation lower-cases and drops whitespace plus a fixed set of
//! separators, in both their ASCII and full-width forms.

/// Separator characters removed before comparison.
pub const SEPARATORS: &[char] = &[
    '_', '＿', // underscore
    '-', '‐', '－', // hyphen, U+2010 hyphen, full-width hyphen-minus
    '・', '･', // middle dots
    ':', '：', // colons
    '/', '／', // slashes
    '\\', '＼', // backslashes
];

/// Canonicalise a raw key for comparison.
pub fn normalize_key(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && !SEPARATORS.contains(c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Does a normalised key name the same concept as a normalised pattern?
///
/// Matching is asymmetric containment: the key must contain the pattern, so
/// a long descriptive key (`"当期純利益又は当期純損失"`) still matches a short
/// pattern (`"純利益"`). An empty pattern matches nothing.
pub fn keys_match(normalized_key: &str, normalized_pattern: &str) -> bool {
    !normalized_pattern.is_empty() && normalized_key.contains(normalized_pattern)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_strips_ascii_separators() {
        assert_eq!(normalize_key("Operating_Income"), "operatingincome");
        assert_eq!(normalize_key("net-income / loss"), "netincomeloss");
        assert_eq!(normalize_key("a:b\\c"), "abc");
    }

    #[test]
    fn strips_full_width_variants() {
        assert_eq!(normalize_key("キャッシュ・フロー"), "キャッシュフロー");
        assert_eq!(normalize_key("営業ＣＦ：連結"), "営業ｃｆ連結");
        assert_eq!(normalize_key("売上高\u{3000}（千円）"), "売上高（千円）");
        assert_eq!(normalize_key("ａ＿ｂ－ｃ／ｄ＼ｅ"), "ａｂｃｄｅ");
    }

    #[test]
    fn containment_is_asymmetric() {
        let key = normalize_key("当期純利益又は当期純損失");
        let pattern = normalize_key("純利益");
        assert!(keys_match(&key, &pattern));
        assert!(!keys_match(&pattern, &key));
    }

    #[test]
    fn equality_matches() {
        assert!(keys_match("revenue", "revenue"));
    }

    #[test]
    fn empty_pattern_never_matches() {
        assert!(!keys_match("anything", ""));
        assert!(!keys_match("", ""));
    }
}
