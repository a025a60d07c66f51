use base64::{Engine, engine::general_purpose::STANDARD};
use serde_json::{Map, Value, json};

use crate::{
    Binary,
    Bson,
    DateTime,
    Document,
    Long,
    bson::{Code, DbPointer, DbRef, Regex, Timestamp, number_element_type},
    error::{Error, Result},
    extjson::models,
    spec::{BinarySubtype, ElementType},
};

const MAX_SAFE_INTEGER: u64 = 1 << 53;

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::malformed_value(format!("invalid extended JSON: {error}"))
    }
}

/// Converts a JSON value into [`Bson`], reading both canonical and relaxed wrappers.
///
/// Only bare JSON numbers depend on `relaxed`: in relaxed mode they become host numbers
/// ([`Bson::Number`]) unless they are integers beyond `±2^53`, which become [`Bson::Int64`];
/// otherwise they become explicit [`Bson::Int32`], [`Bson::Int64`] or [`Bson::Double`] values.
pub(crate) fn bson_from_value(value: Value, relaxed: bool) -> Result<Bson> {
    match value {
        Value::Number(x) => {
            if let Some(i) = x.as_i64() {
                return Ok(if relaxed {
                    if i.unsigned_abs() <= MAX_SAFE_INTEGER {
                        Bson::Number(i as f64)
                    } else {
                        Bson::Int64(Long::from_i64(i))
                    }
                } else {
                    match i32::try_from(i) {
                        Ok(i) => Bson::Int32(i),
                        Err(_) => Bson::Int64(Long::from_i64(i)),
                    }
                });
            }
            let f = x.as_f64().ok_or_else(|| {
                Error::malformed_value(format!("{x} does not fit in i64 or f64"))
            })?;
            Ok(if relaxed { Bson::Number(f) } else { Bson::Double(f) })
        }
        Value::String(x) => Ok(Bson::String(x)),
        Value::Bool(x) => Ok(Bson::Boolean(x)),
        Value::Null => Ok(Bson::Null),
        Value::Array(x) => Ok(Bson::Array(
            x.into_iter()
                .enumerate()
                .map(|(i, v)| bson_from_value(v, relaxed).map_err(|e| e.with_index(i)))
                .collect::<Result<Vec<Bson>>>()?,
        )),
        Value::Object(map) => bson_from_map(map, relaxed),
    }
}

/// Dispatches on the first recognized `$` key. An object matching none of them is a document,
/// or a [`DbRef`] when it leads with `$ref`, `$id` and optionally `$db`, and has no other `$` key.
fn bson_from_map(obj: Map<String, Value>, relaxed: bool) -> Result<Bson> {
    if obj.contains_key("$oid") {
        let oid: models::ObjectId = serde_json::from_value(obj.into())?;
        return Ok(Bson::ObjectId(oid.parse()?));
    }

    if obj.contains_key("$symbol") {
        let symbol: models::Symbol = serde_json::from_value(obj.into())?;
        return Ok(Bson::Symbol(symbol.value));
    }

    if obj.contains_key("$regularExpression") {
        let regex: models::Regex = serde_json::from_value(obj.into())?;
        return Ok(regex.parse().into());
    }

    // A `$regex` holding anything but a string is a query operator, not a regex.
    if let Some(Value::String(_)) = obj.get("$regex") {
        let regex: models::LegacyRegex = serde_json::from_value(obj.into())?;
        return Ok(regex.parse().into());
    }

    if obj.contains_key("$numberInt") {
        let int: models::Int32 = serde_json::from_value(obj.into())?;
        return Ok(Bson::Int32(int.parse()?));
    }

    if obj.contains_key("$numberLong") {
        let int: models::Int64 = serde_json::from_value(obj.into())?;
        return Ok(Bson::Int64(Long::from_i64(int.parse()?)));
    }

    if obj.contains_key("$numberDouble") {
        let double: models::Double = serde_json::from_value(obj.into())?;
        return Ok(Bson::Double(double.parse()?));
    }

    if obj.contains_key("$numberDecimal") {
        let decimal: models::Decimal128 = serde_json::from_value(obj.into())?;
        return Ok(Bson::Decimal128(decimal.parse()?));
    }

    if obj.contains_key("$binary") {
        let binary: models::Binary = serde_json::from_value(obj.into())?;
        return Ok(Bson::Binary(binary.parse()?));
    }

    if obj.contains_key("$code") {
        let code: models::JavaScriptCode = serde_json::from_value(obj.into())?;
        return Ok(match code.scope {
            Some(scope) => Code::with_scope(code.code, document_from_map(scope, relaxed)?),
            None => Code::new(code.code),
        }
        .into());
    }

    if obj.contains_key("$timestamp") {
        let ts: models::Timestamp = serde_json::from_value(obj.into())?;
        return Ok(ts.parse().into());
    }

    if obj.contains_key("$date") {
        let date: models::DateTime = serde_json::from_value(obj.into())?;
        return Ok(Bson::DateTime(date.parse()?));
    }

    if obj.contains_key("$minKey") {
        let min_key: models::MinKey = serde_json::from_value(obj.into())?;
        return min_key.parse();
    }

    if obj.contains_key("$maxKey") {
        let max_key: models::MaxKey = serde_json::from_value(obj.into())?;
        return max_key.parse();
    }

    if obj.contains_key("$dbPointer") {
        let db_ptr: models::DbPointer = serde_json::from_value(obj.into())?;
        return Ok(db_ptr.parse()?.into());
    }

    if obj.contains_key("$undefined") {
        let undefined: models::Undefined = serde_json::from_value(obj.into())?;
        return undefined.parse();
    }

    let doc = document_from_map(obj, relaxed)?;
    Ok(match DbRef::from_document(&doc) {
        Some(db_ref) => Bson::DbRef(db_ref),
        None => Bson::Document(doc),
    })
}

pub(crate) fn document_from_map(obj: Map<String, Value>, relaxed: bool) -> Result<Document> {
    obj.into_iter()
        .map(|(k, v)| -> Result<(String, Bson)> {
            let value = bson_from_value(v, relaxed).map_err(|e| e.with_key(k.as_str()))?;
            Ok((k, value))
        })
        .collect()
}

/// Converts the [`serde_json::Value`] into [`Bson`]. This conversion can interpret both canonical
/// and relaxed [extended JSON](https://www.mongodb.com/docs/manual/reference/mongodb-extended-json/),
/// reading bare numbers the relaxed way.
impl TryFrom<Value> for Bson {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        bson_from_value(value, true)
    }
}

/// Converts the [`serde_json::Map`] into a [`Document`].
impl TryFrom<Map<String, Value>> for Document {
    type Error = Error;

    fn try_from(obj: Map<String, Value>) -> Result<Self> {
        document_from_map(obj, true)
    }
}

/// Converts [`Bson`] into a [`serde_json::Value`] in relaxed
/// [extended JSON](https://www.mongodb.com/docs/manual/reference/mongodb-extended-json/).
impl From<Bson> for Value {
    fn from(bson: Bson) -> Self {
        bson.into_relaxed_extjson()
    }
}

fn non_finite(f: f64) -> Option<&'static str> {
    if f.is_nan() {
        Some("NaN")
    } else if f == f64::INFINITY {
        Some("Infinity")
    } else if f == f64::NEG_INFINITY {
        Some("-Infinity")
    } else {
        None
    }
}

fn relaxed_double(f: f64) -> Value {
    match non_finite(f) {
        Some(s) => json!({ "$numberDouble": s }),
        None => json!(f),
    }
}

fn canonical_double(f: f64) -> Value {
    let s = match non_finite(f) {
        Some(s) => s.to_string(),
        None => {
            let mut s = f.to_string();
            if f.fract() == 0.0 {
                s.push_str(".0");
            }
            s
        }
    };
    json!({ "$numberDouble": s })
}

/// RFC 3339 text for dates from 1970 through 9999, which relaxed mode writes as a string.
fn relaxed_date(date: DateTime) -> Option<String> {
    if date.timestamp_millis() < 0 {
        return None;
    }
    let year = date.to_time_opt()?.year();
    if year > 9999 {
        return None;
    }
    date.try_to_rfc3339_string().ok()
}

fn binary_json(bytes: &[u8], subtype: BinarySubtype) -> Value {
    let tval: u8 = subtype.into();
    json!({
        "$binary": {
            "base64": STANDARD.encode(bytes),
            "subType": hex::encode([tval]),
        }
    })
}

impl Bson {
    /// Converts this value into a [`serde_json::Value`] in relaxed
    /// [extended JSON](https://www.mongodb.com/docs/manual/reference/mongodb-extended-json/)
    /// format.
    pub fn into_relaxed_extjson(self) -> Value {
        match self {
            Bson::Double(v) => relaxed_double(v),
            Bson::Number(v) => match number_element_type(v) {
                ElementType::Int32 => json!(v as i32),
                ElementType::Int64 => json!(v as i64),
                _ => relaxed_double(v),
            },
            Bson::String(v) => json!(v),
            Bson::Array(v) => Value::Array(v.into_iter().map(Bson::into_relaxed_extjson).collect()),
            Bson::Document(v) => Value::Object(
                v.into_iter()
                    .map(|(k, v)| (k, v.into_relaxed_extjson()))
                    .collect(),
            ),
            Bson::DbRef(v) => Bson::Document(v.to_document()).into_relaxed_extjson(),
            Bson::Boolean(v) => json!(v),
            Bson::Null => Value::Null,
            Bson::RegularExpression(Regex { pattern, options }) => json!({
                "$regularExpression": {
                    "pattern": pattern,
                    "options": options,
                }
            }),
            Bson::JavaScriptCode(code) if code.has_scope() => {
                let Code { code, scope } = code;
                json!({
                    "$code": code,
                    "$scope": scope.map(|s| Bson::Document(s).into_relaxed_extjson()),
                })
            }
            Bson::JavaScriptCode(Code { code, .. }) | Bson::Function(code) => {
                json!({ "$code": code })
            }
            Bson::Int32(v) => v.into(),
            Bson::Int64(v) => v.as_i64().into(),
            Bson::Timestamp(Timestamp { time, increment }) => json!({
                "$timestamp": {
                    "t": time,
                    "i": increment,
                }
            }),
            Bson::Binary(Binary { subtype, ref bytes }) => binary_json(bytes, subtype),
            Bson::Bytes(ref bytes) => binary_json(bytes, BinarySubtype::Generic),
            Bson::ObjectId(v) => json!({ "$oid": v.to_hex() }),
            Bson::DateTime(v) => match relaxed_date(v) {
                Some(date) => json!({ "$date": date }),
                None => json!({ "$date": { "$numberLong": v.timestamp_millis().to_string() } }),
            },
            Bson::Symbol(v) => json!({ "$symbol": v }),
            Bson::Decimal128(v) => json!({ "$numberDecimal": v.to_string() }),
            Bson::Undefined => json!({ "$undefined": true }),
            Bson::MinKey => json!({ "$minKey": 1 }),
            Bson::MaxKey => json!({ "$maxKey": 1 }),
            Bson::DbPointer(DbPointer {
                ref namespace,
                ref id,
            }) => json!({
                "$dbPointer": {
                    "$ref": namespace,
                    "$id": {
                        "$oid": id.to_hex()
                    }
                }
            }),
        }
    }

    /// Converts this value into a [`serde_json::Value`] in canonical
    /// [extended JSON](https://www.mongodb.com/docs/manual/reference/mongodb-extended-json/)
    /// format.
    pub fn into_canonical_extjson(self) -> Value {
        match self {
            Bson::Int32(i) => json!({ "$numberInt": i.to_string() }),
            Bson::Int64(i) => json!({ "$numberLong": i.as_i64().to_string() }),
            Bson::Double(f) => canonical_double(f),
            Bson::Number(f) => match number_element_type(f) {
                ElementType::Int32 => json!({ "$numberInt": (f as i32).to_string() }),
                ElementType::Int64 => json!({ "$numberLong": (f as i64).to_string() }),
                _ => canonical_double(f),
            },
            Bson::DateTime(date) => {
                json!({ "$date": { "$numberLong": date.timestamp_millis().to_string() } })
            }
            Bson::Array(arr) => {
                Value::Array(arr.into_iter().map(Bson::into_canonical_extjson).collect())
            }
            Bson::Document(doc) => Value::Object(
                doc.into_iter()
                    .map(|(k, v)| (k, v.into_canonical_extjson()))
                    .collect(),
            ),
            Bson::DbRef(v) => Bson::Document(v.to_document()).into_canonical_extjson(),
            Bson::JavaScriptCode(code) if code.has_scope() => {
                let Code { code, scope } = code;
                json!({
                    "$code": code,
                    "$scope": scope.map(|s| Bson::Document(s).into_canonical_extjson()),
                })
            }

            other => other.into_relaxed_extjson(),
        }
    }
}
