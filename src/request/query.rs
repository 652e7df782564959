//! Query string decoding and encoding.
//!
//! Decoding follows the bracket convention used by most JavaScript HTTP stacks:
//! repeated keys collect into arrays, `a[b]=c` nests, `a[]=x` appends and an
//! object whose keys are all integers becomes an array.

use serde_json::{Map, Value};

/// Deepest bracket nesting decoded from a query key. Brackets past this depth
/// stay in the key as one literal segment.
pub const MAX_QUERY_DEPTH: usize = 20;

/// Decode a raw query string (with or without the leading `?`).
///
/// ```rust
/// use contract_router::request::parse_query_string;
/// use serde_json::json;
///
/// let q = parse_query_string("?tag=a&tag=b&filter[author]=ada&ids[]=1&ids[]=2");
/// assert_eq!(
///     serde_json::Value::Object(q),
///     json!({ "tag": ["a", "b"], "filter": { "author": "ada" }, "ids": ["1", "2"] })
/// );
/// ```
pub fn parse_query_string(query: &str) -> Map<String, Value> {
    let query = query.strip_prefix('?').unwrap_or(query);
    let mut root = Map::new();
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        if key.is_empty() {
            continue;
        }
        let segments = split_key(&key);
        insert(&mut root, &segments, value.into_owned());
    }
    compact_map(root)
}

/// `a[b][]` becomes `["a", "b", ""]`. Unbalanced brackets keep the raw key.
///
/// At most [`MAX_QUERY_DEPTH`] bracket segments are split off; whatever
/// follows is kept verbatim as the last segment.
fn split_key(key: &str) -> Vec<String> {
    let Some(open) = key.find('[') else {
        return vec![key.to_string()];
    };
    if open == 0 {
        return vec![key.to_string()];
    }
    let mut segments = vec![key[..open].to_string()];
    let mut rest = &key[open..];
    while let Some(inner) = rest.strip_prefix('[') {
        if segments.len() > MAX_QUERY_DEPTH {
            segments.push(rest.to_string());
            return segments;
        }
        match inner.find(']') {
            Some(close) => {
                segments.push(inner[..close].to_string());
                rest = &inner[close + 1..];
            }
            None => return vec![key.to_string()],
        }
    }
    if !rest.is_empty() {
        return vec![key.to_string()];
    }
    segments
}

fn insert(target: &mut Map<String, Value>, segments: &[String], value: String) {
    let Some((first, rest)) = segments.split_first() else {
        return;
    };
    let key = if first.is_empty() {
        target.len().to_string()
    } else {
        first.clone()
    };

    if rest.is_empty() {
        match target.get_mut(&key) {
            None => {
                target.insert(key, Value::String(value));
            }
            Some(Value::Array(items)) => items.push(Value::String(value)),
            Some(Value::Object(obj)) => {
                let next = obj.len().to_string();
                obj.insert(next, Value::String(value));
            }
            Some(existing) => {
                let old = existing.take();
                *existing = Value::Array(vec![old, Value::String(value)]);
            }
        }
        return;
    }

    let child = target
        .entry(key)
        .or_insert_with(|| Value::Object(Map::new()));
    if !child.is_object() {
        *child = Value::Object(indexed(child.take()));
    }
    if let Value::Object(obj) = child {
        insert(obj, rest, value);
    }
}

/// Scalars and arrays turned into index-keyed objects so nesting can continue.
fn indexed(value: Value) -> Map<String, Value> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        Value::Null => Map::new(),
        other => Map::from_iter([("0".to_string(), other)]),
    }
}

fn compact(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let map = compact_map(map);
            if !map.is_empty() && map.keys().all(|k| k.parse::<usize>().is_ok()) {
                let mut items: Vec<(usize, Value)> = map
                    .into_iter()
                    .filter_map(|(k, v)| k.parse::<usize>().ok().map(|i| (i, v)))
                    .collect();
                items.sort_by_key(|(i, _)| *i);
                Value::Array(items.into_iter().map(|(_, v)| v).collect())
            } else {
                Value::Object(map)
            }
        }
        Value::Array(items) => Value::Array(items.into_iter().map(compact).collect()),
        other => other,
    }
}

fn compact_map(map: Map<String, Value>) -> Map<String, Value> {
    map.into_iter().map(|(k, v)| (k, compact(v))).collect()
}

/// jsonQuery decoding: every string value is parsed as JSON, falling back to
/// the raw string when it is not valid JSON. Arrays from repeated keys are
/// decoded element by element.
pub fn decode_json_query(query: Map<String, Value>) -> Map<String, Value> {
    query
        .into_iter()
        .map(|(key, value)| (key, decode_json_value(value)))
        .collect()
}

fn decode_json_value(value: Value) -> Value {
    match value {
        Value::String(raw) => serde_json::from_str(&raw).unwrap_or(Value::String(raw)),
        Value::Array(items) => Value::Array(items.into_iter().map(decode_json_value).collect()),
        other => other,
    }
}

/// Encode a query object with bracket notation (`a[b]=c`, `a[0]=x`).
///
/// Null values are skipped.
pub fn encode_query(query: &Map<String, Value>) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in query {
        append_pairs(&mut serializer, key, value);
    }
    serializer.finish()
}

fn append_pairs(
    serializer: &mut url::form_urlencoded::Serializer<'_, String>,
    key: &str,
    value: &Value,
) {
    match value {
        Value::Null => {}
        Value::String(s) => {
            serializer.append_pair(key, s);
        }
        Value::Bool(_) | Value::Number(_) => {
            serializer.append_pair(key, &value.to_string());
        }
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                append_pairs(serializer, &format!("{key}[{i}]"), item);
            }
        }
        Value::Object(map) => {
            for (k, v) in map {
                append_pairs(serializer, &format!("{key}[{k}]"), v);
            }
        }
    }
}

/// jsonQuery encoding: each top-level value is JSON encoded, except strings
/// that would not themselves parse as JSON, which are sent raw.
///
/// Keys are written as given. The decoder treats brackets in a key as
/// nesting, so only keys without `[` round-trip unchanged; `a[b]` comes back
/// as `{"a": {"b": ...}}`.
///
/// ```rust
/// use contract_router::request::{decode_json_query, encode_json_query, parse_query_string};
/// use serde_json::json;
///
/// let query = json!({ "filter": { "a": 1 }, "q": "hello", "n": "42" });
/// let encoded = encode_json_query(query.as_object().unwrap());
/// let decoded = decode_json_query(parse_query_string(&encoded));
/// assert_eq!(serde_json::Value::Object(decoded), query);
/// ```
pub fn encode_json_query(query: &Map<String, Value>) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in query {
        let encoded = match value {
            Value::String(s) if serde_json::from_str::<Value>(s).is_err() => s.clone(),
            other => other.to_string(),
        };
        serializer.append_pair(key, &encoded);
    }
    serializer.finish()
}
