//! Parsing of RediSearch `FT.SEARCH` replies

use std::collections::HashMap;

use redis::Value;

use crate::domain::DomainError;

/// One document returned by `FT.SEARCH`
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub key: String,
    pub fields: HashMap<String, String>,
}

impl SearchHit {
    /// Get a returned field
    pub fn field(&self, name: &str) -> Result<&str, DomainError> {
        self.fields.get(name).map(String::as_str).ok_or_else(|| {
            DomainError::serialization(format!(
                "search hit '{}' is missing field '{}'",
                self.key, name
            ))
        })
    }
}

fn as_string(value: &Value) -> Result<String, DomainError> {
    redis::from_redis_value::<String>(value)
        .map_err(|e| DomainError::serialization(format!("unexpected search reply value: {}", e)))
}

fn parse_fields(value: &Value) -> Result<HashMap<String, String>, DomainError> {
    match value {
        Value::Array(items) => {
            if items.len() % 2 != 0 {
                return Err(DomainError::serialization(
                    "search reply field list has odd length",
                ));
            }

            items
                .chunks(2)
                .map(|pair| Ok((as_string(&pair[0])?, as_string(&pair[1])?)))
                .collect()
        }
        Value::Map(pairs) => pairs
            .iter()
            .map(|(name, val)| Ok((as_string(name)?, as_string(val)?)))
            .collect(),
        other => Err(DomainError::serialization(format!(
            "unexpected search reply field list: {:?}",
            other
        ))),
    }
}

/// Parse a RESP2 `FT.SEARCH` reply: `[total, key, [field, value, ...], ...]`
pub fn parse_search_reply(value: &Value) -> Result<Vec<SearchHit>, DomainError> {
    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(DomainError::serialization(format!(
                "unexpected search reply: {:?}",
                other
            )))
        }
    };

    let Some((_total, rest)) = items.split_first() else {
        return Ok(Vec::new());
    };

    if rest.len() % 2 != 0 {
        return Err(DomainError::serialization(
            "search reply has a key without a field list",
        ));
    }

    rest.chunks(2)
        .map(|pair| {
            Ok(SearchHit {
                key: as_string(&pair[0])?,
                fields: parse_fields(&pair[1])?,
            })
        })
        .collect()
}
