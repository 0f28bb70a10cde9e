//! Request parameter merging and encoding.
//!
//! `POST /json` stores every submitted parameter, not a single value. Query
//! string pairs are applied first and form body pairs second, so the body
//! wins on a duplicate key; within one source the last occurrence wins.
//! Keys are kept sorted, which makes the stored JSON deterministic.

use std::collections::BTreeMap;

pub type ParamMap = BTreeMap<String, String>;

pub fn merge_params(query: Vec<(String, String)>, form: Vec<(String, String)>) -> ParamMap {
    query.into_iter().chain(form).collect()
}

/// Serialize the parameter map as a flat JSON object.
pub fn encode_params(params: &ParamMap) -> serde_json::Result<String> {
    serde_json::to_string(params)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn encodes_form_pairs_as_object() {
        let params = merge_params(vec![], pairs(&[("a", "1"), ("b", "2")]));
        assert_eq!(encode_params(&params).unwrap(), r#"{"a":"1","b":"2"}"#);
    }

    #[test]
    fn keys_are_sorted() {
        let params = merge_params(vec![], pairs(&[("zeta", "z"), ("alpha", "a")]));
        assert_eq!(encode_params(&params).unwrap(), r#"{"alpha":"a","zeta":"z"}"#);
    }

    #[test]
    fn body_overrides_query() {
        let params = merge_params(pairs(&[("a", "query"), ("q", "1")]), pairs(&[("a", "body")]));
        assert_eq!(params.get("a").map(String::as_str), Some("body"));
        assert_eq!(params.get("q").map(String::as_str), Some("1"));
    }

    #[test]
    fn last_duplicate_wins() {
        let params = merge_params(vec![], pairs(&[("a", "1"), ("a", "2")]));
        assert_eq!(encode_params(&params).unwrap(), r#"{"a":"2"}"#);
    }

    #[test]
    fn no_params_is_empty_object() {
        assert_eq!(encode_params(&ParamMap::new()).unwrap(), "{}");
    }

    #[test]
    fn escapes_json_specials() {
        let params = merge_params(vec![], pairs(&[("quote", "say \"hi\""), ("", "")]));
        let encoded = encode_params(&params).unwrap();
        let decoded: ParamMap = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, params);
    }
}
