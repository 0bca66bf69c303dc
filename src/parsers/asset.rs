use serde_json::{Map, Value};

use crate::model::layout::AssetFormat;
use crate::model::value::{Mapping, NestedValue};

/// Converts an on-disk language asset to and from a [`NestedValue`] tree.
pub trait AssetCodec: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<NestedValue, String>;

    fn encode(&self, value: &NestedValue, format: AssetFormat) -> Result<Vec<u8>, String>;
}

/// Stores assets as JSON documents with key order preserved.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonAssetCodec;

impl AssetCodec for JsonAssetCodec {
    fn decode(&self, bytes: &[u8]) -> Result<NestedValue, String> {
        let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
        let v: Value = serde_json::from_slice(bytes).map_err(|e| e.to_string())?;
        from_json(v, "")
    }

    fn encode(&self, value: &NestedValue, format: AssetFormat) -> Result<Vec<u8>, String> {
        let v = to_json(value);
        let out = match format {
            AssetFormat::Pretty => serde_json::to_vec_pretty(&v),
            AssetFormat::Compact => serde_json::to_vec(&v),
        };
        out.map_err(|e| e.to_string())
    }
}

pub fn to_json(value: &NestedValue) -> Value {
    match value {
        NestedValue::Mapping(m) => {
            let mut obj = Map::with_capacity(m.len());
            for (k, v) in m.iter() {
                obj.insert(k.to_string(), to_json(v));
            }
            Value::Object(obj)
        }
        NestedValue::Sequence(items) => Value::Array(items.iter().map(to_json).collect()),
        NestedValue::Scalar(Some(s)) => Value::String(s.clone()),
        NestedValue::Scalar(None) => Value::Null,
    }
}

/// Language assets only hold text, so numbers and booleans are rejected.
pub fn from_json(v: Value, at: &str) -> Result<NestedValue, String> {
    match v {
        Value::Null => Ok(NestedValue::null()),
        Value::String(s) => Ok(NestedValue::text(s)),
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for (i, item) in items.into_iter().enumerate() {
                out.push(from_json(item, &format!("{at}[{i}]"))?);
            }
            Ok(NestedValue::Sequence(out))
        }
        Value::Object(obj) => {
            let mut m = Mapping::with_capacity(obj.len());
            for (k, item) in obj {
                let child = from_json(item, &format!("{at}/{k}"))?;
                m.insert(k, child);
            }
            Ok(NestedValue::Mapping(m))
        }
        other => Err(format!("non-text scalar {other} at '{at}'")),
    }
}
