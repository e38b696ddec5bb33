//! Per-parameter filter clause compilation.
//!
//! Each parameter contributes one clause. Integer and date values are first
//! checked for range syntax (`low,high`, `*` for an open end); everything
//! else is coerced per the parameter's value kind, and all values for the
//! same parameter are ORed. Values that fail coercion are dropped with a
//! diagnostic; the query degrades to "no match for this value" instead of
//! failing the request.

use std::collections::BTreeSet;
use std::collections::HashMap;

use serde_json::{json, Value};
use uuid::Uuid;

use litsearch_api::{
    Country, EnumKind, Language, LiteratureSearchParameter, LiteratureType, Relevance, Topic,
    ValueKind,
};

use crate::error::RequestError;
use crate::mapper::FieldMapper;

/// Compiles filter clauses for every mapped parameter, ANDed by the caller.
/// Unmapped parameters are skipped (permissive policy).
pub fn clauses_for_params(
    mapper: &FieldMapper,
    params: &HashMap<LiteratureSearchParameter, BTreeSet<String>>,
) -> Result<Vec<Value>, RequestError> {
    let mut clauses = Vec::new();
    for (param, values) in params {
        if let Some(clause) = clause_for_param(mapper, *param, values)? {
            clauses.push(clause);
        }
    }
    Ok(clauses)
}

/// Compiles the clause for a single parameter, or `None` when the parameter
/// is unmapped or every value was dropped.
pub fn clause_for_param(
    mapper: &FieldMapper,
    param: LiteratureSearchParameter,
    values: &BTreeSet<String>,
) -> Result<Option<Value>, RequestError> {
    let field = match mapper.field_for(param) {
        Some(field) => field,
        None => {
            tracing::debug!(parameter = %param, "parameter has no field mapping, skipping");
            return Ok(None);
        }
    };
    let is_date = mapper.is_date_field(field);
    let kind = param.value_kind();
    // only ordered kinds have range syntax; a comma anywhere else is literal
    let ranged = matches!(kind, ValueKind::Integer | ValueKind::Date);

    let mut parts: Vec<Value> = Vec::new();
    let mut literals: Vec<String> = Vec::new();

    for raw in values {
        if ranged {
            if let Some((low, high)) = parse_range(raw)? {
                parts.push(range_query(field, low.as_deref(), high.as_deref(), is_date));
                continue;
            }
        }
        if let Some(coerced) = coerce_value(kind, raw) {
            literals.push(coerced);
        } else {
            tracing::debug!(parameter = %param, value = %raw, "value failed coercion, dropped");
        }
    }

    if !literals.is_empty() {
        parts.push(terms_query(field, &literals));
    }

    let clause = match parts.len() {
        0 => return Ok(None),
        1 => parts.into_iter().next().unwrap(),
        _ => json!({
            "bool": {
                "should": parts,
                "minimum_should_match": 1
            }
        }),
    };

    Ok(Some(nest_if_needed(field, clause)))
}

/// Detects `low,high` range syntax. Returns the two bounds with `*` mapped
/// to an open end, `None` for plain literals, and an error when the value
/// contains a comma but not exactly two tokens.
pub fn parse_range(raw: &str) -> Result<Option<(Option<String>, Option<String>)>, RequestError> {
    if !raw.contains(',') {
        return Ok(None);
    }
    let tokens: Vec<&str> = raw.split(',').collect();
    if tokens.len() != 2 {
        return Err(RequestError::MalformedRange {
            value: raw.to_string(),
        });
    }
    let bound = |token: &str| -> Option<String> {
        let token = token.trim();
        if token.is_empty() || token == "*" {
            None
        } else {
            Some(token.to_string())
        }
    };
    Ok(Some((bound(tokens[0]), bound(tokens[1]))))
}

/// A range query over a numeric or date field; open ends are omitted.
pub fn range_query(field: &str, low: Option<&str>, high: Option<&str>, is_date: bool) -> Value {
    let mut bounds = serde_json::Map::new();
    if let Some(low) = low {
        bounds.insert("gte".to_string(), json!(low));
    }
    if let Some(high) = high {
        bounds.insert("lte".to_string(), json!(high));
    }
    if is_date {
        // lenient formats matching the indexed date precisions
        bounds.insert(
            "format".to_string(),
            json!("yyyy-MM-dd'T'HH:mm:ss||yyyy-MM-dd||yyyy-MM||yyyy"),
        );
    }
    json!({ "range": { field: Value::Object(bounds) } })
}

/// A single `term` or multi-value `terms` (OR) query.
fn terms_query(field: &str, values: &[String]) -> Value {
    if values.len() == 1 {
        json!({ "term": { field: values[0] } })
    } else {
        json!({ "terms": { field: values } })
    }
}

/// Wraps a clause targeting a sub-document path in a `nested` query; flat
/// term queries against nested paths silently match nothing.
fn nest_if_needed(field: &str, clause: Value) -> Value {
    match field.rsplit_once('.') {
        Some((path, _)) => json!({
            "nested": {
                "path": path,
                "query": clause
            }
        }),
        None => clause,
    }
}

/// Coerces a raw literal to the string the index stores for this value kind.
/// `None` means the value is unparseable and must be dropped.
pub fn coerce_value(kind: ValueKind, raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match kind {
        ValueKind::String => Some(raw.to_string()),
        ValueKind::Boolean => match raw.to_ascii_lowercase().as_str() {
            "true" => Some("true".to_string()),
            "false" => Some("false".to_string()),
            _ => None,
        },
        ValueKind::Integer => raw.parse::<i64>().ok().map(|n| n.to_string()),
        // single date literals keep the raw precision; the range compiler
        // declares the accepted formats to the backend
        ValueKind::Date => Some(raw.to_string()),
        ValueKind::Uuid => Uuid::parse_str(raw).ok().map(|u| u.to_string()),
        ValueKind::Country => raw.parse::<Country>().ok().map(|c| c.iso2().to_string()),
        ValueKind::Language => raw.parse::<Language>().ok().map(|l| l.iso3().to_string()),
        ValueKind::Enum(EnumKind::LiteratureType) => raw
            .parse::<LiteratureType>()
            .ok()
            .map(|v| v.as_str().to_string()),
        ValueKind::Enum(EnumKind::Topic) => {
            raw.parse::<Topic>().ok().map(|v| v.as_str().to_string())
        }
        ValueKind::Enum(EnumKind::Relevance) => raw
            .parse::<Relevance>()
            .ok()
            .map(|v| v.as_str().to_string()),
    }
}
