//! Grammar for a single filter value:
//!
//! ```text
//! value   := op ':' payload | 'null' | 'notnull' | payload
//! op      := eq | ne | gt | gte | lt | lte | in | nin
//!          | contains | starts | ends | null | notnull
//! payload := list (for in/nin) | text
//! list    := item (',' item)*
//! ```
//!
//! A prefix before the first colon that is not a known operator is part of
//! the payload, so `time=12:30` is an `eq` on `12:30`.

use super::types::FilterOp;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterPayload {
    None,
    Single(String),
    List(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterValue {
    pub op: FilterOp,
    pub payload: FilterPayload,
}

impl FilterValue {
    /// Parses one raw filter value. The error string is the reason only; the
    /// caller attaches the field name.
    pub fn parse(raw: &str, default_op: FilterOp) -> Result<Self, String> {
        let raw = raw.trim();
        if raw.is_empty() && !default_op.is_nullity() {
            return Err("empty value".to_string());
        }

        let (op, payload) = split_operator(raw, default_op);

        match op {
            FilterOp::Null | FilterOp::NotNull => Ok(Self { op, payload: FilterPayload::None }),
            FilterOp::In | FilterOp::Nin => {
                let items = sanitize_list(payload);
                if items.is_empty() {
                    return Err(format!("operator '{}' requires at least one value", op));
                }
                Ok(Self { op, payload: FilterPayload::List(items) })
            }
            _ => {
                let value = payload.trim();
                if value.is_empty() {
                    return Err("empty value".to_string());
                }
                Ok(Self { op, payload: FilterPayload::Single(value.to_string()) })
            }
        }
    }

    pub fn into_values(self) -> Vec<String> {
        match self.payload {
            FilterPayload::None => vec![],
            FilterPayload::Single(value) => vec![value],
            FilterPayload::List(values) => values,
        }
    }
}

fn split_operator(raw: &str, default_op: FilterOp) -> (FilterOp, &str) {
    match raw.split_once(':') {
        Some((prefix, rest)) => match prefix.parse::<FilterOp>() {
            Ok(op) => (op, rest),
            Err(_) => (default_op, raw),
        },
        None if raw.eq_ignore_ascii_case("null") => (FilterOp::Null, ""),
        None if raw.eq_ignore_ascii_case("notnull") => (FilterOp::NotNull, ""),
        None => (default_op, raw),
    }
}

/// Splits a comma list, trimming items and dropping empties.
pub fn sanitize_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_operator_prefix() {
        let v = FilterValue::parse("gt:18", FilterOp::Eq).unwrap();
        assert_eq!(v.op, FilterOp::Gt);
        assert_eq!(v.into_values(), vec!["18"]);

        let v = FilterValue::parse("Contains: rust ", FilterOp::Eq).unwrap();
        assert_eq!(v.op, FilterOp::Contains);
        assert_eq!(v.payload, FilterPayload::Single("rust".to_string()));
    }

    #[test]
    fn test_list_operators_sanitize_items() {
        let v = FilterValue::parse("in:ready, pending,,", FilterOp::Eq).unwrap();
        assert_eq!(v.op, FilterOp::In);
        assert_eq!(v.into_values(), vec!["ready", "pending"]);

        let err = FilterValue::parse("nin: , ,", FilterOp::Eq).unwrap_err();
        assert_eq!(err, "operator 'nin' requires at least one value");
    }

    #[test]
    fn test_bare_null_keywords() {
        let v = FilterValue::parse("NULL", FilterOp::Eq).unwrap();
        assert_eq!(v.op, FilterOp::Null);
        assert!(v.into_values().is_empty());

        let v = FilterValue::parse("notnull", FilterOp::Contains).unwrap();
        assert_eq!(v.op, FilterOp::NotNull);

        let v = FilterValue::parse("null:ignored", FilterOp::Eq).unwrap();
        assert_eq!(v.payload, FilterPayload::None);
    }

    #[test]
    fn test_unknown_prefix_stays_in_payload() {
        let v = FilterValue::parse("12:30", FilterOp::Eq).unwrap();
        assert_eq!(v.op, FilterOp::Eq);
        assert_eq!(v.into_values(), vec!["12:30"]);
    }

    #[test]
    fn test_default_operator_applies() {
        let v = FilterValue::parse("breaking", FilterOp::Contains).unwrap();
        assert_eq!(v.op, FilterOp::Contains);
    }

    #[test]
    fn test_empty_values_rejected() {
        assert!(FilterValue::parse("", FilterOp::Eq).is_err());
        assert!(FilterValue::parse("   ", FilterOp::Eq).is_err());
        assert!(FilterValue::parse("eq:", FilterOp::Eq).is_err());
        assert!(FilterValue::parse("", FilterOp::Null).is_ok());
    }
}
