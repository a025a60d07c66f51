use crate::{
    Binary,
    bson::{Bson, Code, DbPointer, Document, Regex, number_element_type},
    de::MAX_BSON_SIZE,
    error::{Error, Result},
    ser::{SerializerOptions, resolve},
    spec::{BinarySubtype, ElementType},
};

/// Computes the exact number of bytes [`serialize`](crate::serialize) will produce for `doc`.
///
/// Every key is validated here: keys may not contain NUL, and with
/// [`check_keys`](SerializerOptions::check_keys) they may neither start with `$` nor contain `.`.
/// The fields of a [`DbRef`](crate::DbRef) are exempt from `check_keys`.
pub fn calculate_object_size(doc: &Document, options: &SerializerOptions) -> Result<usize> {
    let size = document_size(doc, options.check_keys, options)?;
    if size > MAX_BSON_SIZE as usize {
        return Err(Error::invalid_argument(format!(
            "document of {size} bytes exceeds the maximum BSON size"
        )));
    }
    Ok(size)
}

fn check_key(key: &str, check_keys: bool) -> Result<()> {
    if key.contains('\0') {
        return Err(Error::invalid_argument("key contains a null byte").with_key(key));
    }
    if check_keys {
        if key.starts_with('$') {
            return Err(Error::invalid_argument("key must not start with '$'").with_key(key));
        }
        if key.contains('.') {
            return Err(Error::invalid_argument("key must not contain '.'").with_key(key));
        }
    }
    Ok(())
}

fn cstring_size(s: &str) -> Result<usize> {
    if s.contains('\0') {
        return Err(Error::invalid_argument(format!(
            "{s:?} contains a null byte and cannot be written as a C string"
        )));
    }
    Ok(s.len() + 1)
}

fn string_size(s: &str) -> usize {
    4 + s.len() + 1
}

fn binary_size(len: usize, subtype: BinarySubtype) -> usize {
    if let BinarySubtype::BinaryOld = subtype {
        4 + 1 + 4 + len
    } else {
        4 + 1 + len
    }
}

fn index_key_len(index: usize) -> usize {
    index.checked_ilog10().map_or(1, |digits| digits as usize + 1)
}

pub(super) fn document_size(
    doc: &Document,
    check_keys: bool,
    options: &SerializerOptions,
) -> Result<usize> {
    let mut size = 4 + 1;
    for (key, value) in doc {
        if let Some(value) = resolve(value, false, options) {
            check_key(key, check_keys)?;
            let payload =
                payload_size(value, check_keys, options).map_err(|e| e.with_key(key.as_str()))?;
            size += 1 + key.len() + 1 + payload;
        }
    }
    Ok(size)
}

fn array_size(array: &[Bson], check_keys: bool, options: &SerializerOptions) -> Result<usize> {
    let mut size = 4 + 1;
    for (index, value) in array.iter().enumerate() {
        if let Some(value) = resolve(value, true, options) {
            let payload = payload_size(value, check_keys, options).map_err(|e| e.with_index(index))?;
            size += 1 + index_key_len(index) + 1 + payload;
        }
    }
    Ok(size)
}

fn payload_size(value: &Bson, check_keys: bool, options: &SerializerOptions) -> Result<usize> {
    let size = match *value {
        Bson::Double(_) => 8,
        Bson::Number(v) => match number_element_type(v) {
            ElementType::Int32 => 4,
            _ => 8,
        },
        Bson::String(ref v) | Bson::Symbol(ref v) => string_size(v),
        Bson::Array(ref v) => array_size(v, check_keys, options)?,
        Bson::Document(ref v) => document_size(v, check_keys, options)?,
        Bson::DbRef(ref v) => document_size(&v.to_document(), false, options)?,
        Bson::Boolean(_) => 1,
        Bson::Null | Bson::Undefined | Bson::MinKey | Bson::MaxKey => 0,
        Bson::RegularExpression(Regex {
            ref pattern,
            options: ref flags,
        }) => cstring_size(pattern)? + cstring_size(flags)?,
        Bson::JavaScriptCode(ref code) if code.has_scope() => {
            let Code { code, scope } = code;
            let scope_size = match scope {
                Some(scope) => document_size(scope, check_keys, options)?,
                None => 0,
            };
            4 + string_size(code) + scope_size
        }
        Bson::JavaScriptCode(Code { ref code, .. }) | Bson::Function(ref code) => {
            string_size(code)
        }
        Bson::Int32(_) => 4,
        Bson::Int64(_) | Bson::Timestamp(_) | Bson::DateTime(_) => 8,
        Bson::Binary(Binary { subtype, ref bytes }) => binary_size(bytes.len(), subtype),
        Bson::Bytes(ref bytes) => binary_size(bytes.len(), BinarySubtype::Generic),
        Bson::ObjectId(_) => 12,
        Bson::Decimal128(_) => 16,
        Bson::DbPointer(DbPointer { ref namespace, .. }) => string_size(namespace) + 12,
    };
    Ok(size)
}
