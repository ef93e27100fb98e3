//! Decoders for the store's positional-array replies.
//!
//! Search, aggregate, and time-series commands all answer with loosely typed
//! positional arrays. Each decoder here validates the array's length and
//! element types before indexing, so malformed or empty replies surface as
//! `StoreError::Decode` instead of an out-of-bounds panic.

use redis::Value;
use serde::de::DeserializeOwned;

use crate::error::store::StoreError;

/// A single time-series sample: millisecond timestamp and value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TsSample {
    pub ts_ms: i64,
    pub value: f64,
}

/// Decoded full-text-search reply.
///
/// The raw reply is a flat array: a leading total-count element, then
/// alternating document-key and field-array elements. Decoding drops the
/// count and key elements, keeping only the field arrays.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchReply {
    pub total: i64,
    docs: Vec<Vec<String>>,
}

impl SearchReply {
    /// Index of the JSON document payload within each field array. Replies to
    /// sorted searches carry `[sort_field, sort_value, "$", payload]`.
    const PAYLOAD_FIELD: usize = 3;

    pub fn decode(value: Value) -> Result<Self, StoreError> {
        const CMD: &str = "FT.SEARCH";

        let mut items = expect_array(value, CMD)?;
        // A reply shorter than two elements has no hits; not an error.
        if items.len() <= 1 {
            let total = items
                .first()
                .map(|v| expect_int(v, CMD))
                .transpose()?
                .unwrap_or(0);
            return Ok(Self { total, docs: Vec::new() });
        }

        let total = expect_int(&items[0], CMD)?;
        let rest = items.split_off(1);

        let mut docs = Vec::with_capacity(rest.len() / 2);
        let mut iter = rest.into_iter();
        while let Some(_key) = iter.next() {
            let Some(fields) = iter.next() else {
                return Err(StoreError::decode(CMD, "document key without field array"));
            };
            let fields = expect_array(fields, CMD)?
                .iter()
                .map(|v| expect_string(v, CMD))
                .collect::<Result<Vec<_>, _>>()?;
            docs.push(fields);
        }

        Ok(Self { total, docs })
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Parses the JSON payload of every hit into `T`.
    pub fn documents<T: DeserializeOwned>(&self) -> Result<Vec<T>, StoreError> {
        self.docs
            .iter()
            .map(|fields| {
                let payload = fields.get(Self::PAYLOAD_FIELD).ok_or_else(|| {
                    StoreError::decode(
                        "FT.SEARCH",
                        format!(
                            "field array has {} elements, payload expected at {}",
                            fields.len(),
                            Self::PAYLOAD_FIELD
                        ),
                    )
                })?;
                serde_json::from_str(payload).map_err(StoreError::from)
            })
            .collect()
    }

    #[cfg(test)]
    pub fn from_docs(total: i64, docs: Vec<Vec<String>>) -> Self {
        Self { total, docs }
    }
}

/// Decodes a grouped-count aggregation reply down to its single top row.
///
/// The reply is `[group_count, [field, value, reduce_name, count], ...]`;
/// only the first row is of interest since the command sorts descending with
/// limit 1. An empty reply decodes to `None`, a valid "no data yet" state.
pub fn decode_top_group(value: Value) -> Result<Option<(String, i64)>, StoreError> {
    const CMD: &str = "FT.AGGREGATE";

    let items = expect_array(value, CMD)?;
    if items.len() <= 1 {
        return Ok(None);
    }

    let row = expect_array(items[1].clone(), CMD)?;
    if row.len() < 4 {
        return Err(StoreError::decode(
            CMD,
            format!("group row has {} elements, expected 4", row.len()),
        ));
    }

    let metric = expect_string(&row[1], CMD)?;
    let hits = expect_string(&row[3], CMD)?
        .parse::<i64>()
        .map_err(|e| StoreError::decode(CMD, format!("non-numeric group count: {e}")))?;

    Ok(Some((metric, hits)))
}

/// Decodes a single `[timestamp, value]` pair; an empty array means the
/// series exists but holds no sample.
pub fn decode_sample(value: Value) -> Result<Option<TsSample>, StoreError> {
    const CMD: &str = "TS.GET";

    match value {
        Value::Nil => Ok(None),
        other => {
            let pair = expect_array(other, CMD)?;
            if pair.is_empty() {
                return Ok(None);
            }
            decode_pair(&pair, CMD).map(Some)
        }
    }
}

/// Decodes a range reply: an array of `[timestamp, value]` pairs.
pub fn decode_range(value: Value) -> Result<Vec<TsSample>, StoreError> {
    const CMD: &str = "TS.RANGE";

    expect_array(value, CMD)?
        .into_iter()
        .map(|pair| decode_pair(&expect_array(pair, CMD)?, CMD))
        .collect()
}

fn decode_pair(pair: &[Value], command: &'static str) -> Result<TsSample, StoreError> {
    if pair.len() < 2 {
        return Err(StoreError::decode(
            command,
            format!("sample has {} elements, expected 2", pair.len()),
        ));
    }
    Ok(TsSample {
        ts_ms: expect_int(&pair[0], command)?,
        value: expect_f64(&pair[1], command)?,
    })
}

fn expect_array(value: Value, command: &'static str) -> Result<Vec<Value>, StoreError> {
    match value {
        Value::Array(items) => Ok(items),
        Value::Set(items) => Ok(items),
        other => Err(StoreError::decode(
            command,
            format!("expected array, got {other:?}"),
        )),
    }
}

fn expect_string(value: &Value, command: &'static str) -> Result<String, StoreError> {
    match value {
        Value::BulkString(bytes) => String::from_utf8(bytes.clone())
            .map_err(|e| StoreError::decode(command, format!("non-utf8 string: {e}"))),
        Value::SimpleString(s) => Ok(s.clone()),
        Value::Int(n) => Ok(n.to_string()),
        Value::Double(d) => Ok(d.to_string()),
        other => Err(StoreError::decode(
            command,
            format!("expected string, got {other:?}"),
        )),
    }
}

fn expect_int(value: &Value, command: &'static str) -> Result<i64, StoreError> {
    match value {
        Value::Int(n) => Ok(*n),
        Value::BulkString(bytes) => std::str::from_utf8(bytes)
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .ok_or_else(|| StoreError::decode(command, "non-numeric integer field")),
        other => Err(StoreError::decode(
            command,
            format!("expected integer, got {other:?}"),
        )),
    }
}

fn expect_f64(value: &Value, command: &'static str) -> Result<f64, StoreError> {
    match value {
        Value::Double(d) => Ok(*d),
        Value::Int(n) => Ok(*n as f64),
        Value::BulkString(bytes) => std::str::from_utf8(bytes)
            .ok()
            .and_then(|s| s.parse::<f64>().ok())
            .ok_or_else(|| StoreError::decode(command, "non-numeric sample value")),
        other => Err(StoreError::decode(
            command,
            format!("expected float, got {other:?}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::member::MemberRecord;

    fn bulk(s: &str) -> Value {
        Value::BulkString(s.as_bytes().to_vec())
    }

    const MEMBER_JSON: &str = r#"{
        "display_name": "Nelly",
        "username": "nelly",
        "avatar": "aa",
        "created_at": "2020-03-01",
        "id": 1,
        "guild": 99,
        "joined_at": "2023-06-15",
        "join_type": "invite",
        "ts": 1686825600
    }"#;

    fn search_hit(key: &str) -> Vec<Value> {
        vec![
            bulk(key),
            Value::Array(vec![bulk("ts"), bulk("1686825600"), bulk("$"), bulk(MEMBER_JSON)]),
        ]
    }

    #[test]
    fn search_reply_drops_count_and_keys() {
        let mut items = vec![Value::Int(2)];
        items.extend(search_hit("member:1"));
        items.extend(search_hit("member:2"));

        let reply = SearchReply::decode(Value::Array(items)).unwrap();
        assert_eq!(reply.total, 2);

        let members: Vec<MemberRecord> = reply.documents().unwrap();
        assert_eq!(members.len(), 2);
        assert_eq!(members[0].username, "nelly");
    }

    #[test]
    fn empty_search_reply_yields_empty_list_not_error() {
        let reply = SearchReply::decode(Value::Array(vec![Value::Int(0)])).unwrap();
        assert!(reply.is_empty());
        let members: Vec<MemberRecord> = reply.documents().unwrap();
        assert!(members.is_empty());
    }

    #[test]
    fn search_reply_with_dangling_key_is_a_decode_error() {
        let items = vec![Value::Int(1), bulk("member:1")];
        assert!(SearchReply::decode(Value::Array(items)).is_err());
    }

    #[test]
    fn short_field_array_fails_in_documents_not_decode() {
        let items = vec![
            Value::Int(1),
            bulk("member:1"),
            Value::Array(vec![bulk("$")]),
        ];
        let reply = SearchReply::decode(Value::Array(items)).unwrap();
        let result: Result<Vec<MemberRecord>, _> = reply.documents();
        assert!(result.is_err());
    }

    #[test]
    fn top_group_decodes_first_row() {
        let value = Value::Array(vec![
            Value::Int(3),
            Value::Array(vec![
                bulk("join_type"),
                bulk("invite"),
                bulk("num_visits"),
                bulk("42"),
            ]),
        ]);

        let top = decode_top_group(value).unwrap();
        assert_eq!(top, Some(("invite".to_string(), 42)));
    }

    #[test]
    fn empty_aggregate_reply_is_none() {
        assert_eq!(decode_top_group(Value::Array(vec![Value::Int(0)])).unwrap(), None);
    }

    #[test]
    fn truncated_aggregate_row_is_a_decode_error() {
        let value = Value::Array(vec![
            Value::Int(1),
            Value::Array(vec![bulk("join_type"), bulk("invite")]),
        ]);
        assert!(decode_top_group(value).is_err());
    }

    #[test]
    fn sample_decodes_timestamp_and_value() {
        let value = Value::Array(vec![Value::Int(1_700_000_000_000), bulk("153")]);
        let sample = decode_sample(value).unwrap().unwrap();
        assert_eq!(sample.ts_ms, 1_700_000_000_000);
        assert_eq!(sample.value, 153.0);
    }

    #[test]
    fn empty_sample_reply_is_none() {
        assert_eq!(decode_sample(Value::Array(vec![])).unwrap(), None);
        assert_eq!(decode_sample(Value::Nil).unwrap(), None);
    }

    #[test]
    fn range_decodes_each_pair() {
        let value = Value::Array(vec![
            Value::Array(vec![Value::Int(1), bulk("10.5")]),
            Value::Array(vec![Value::Int(2), Value::Double(11.0)]),
        ]);

        let samples = decode_range(value).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[1].value, 11.0);
    }
}
