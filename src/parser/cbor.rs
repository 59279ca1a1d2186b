//! CBOR decoding of persisted contract storage
//!
//! Turns a CBOR blob into the nested [`Value`] tree used by the diff engine.

use crate::error::{Error, Result};
use crate::flatten::Value;
use minicbor::Decoder;
use minicbor::data::Type;

/// Decode a complete CBOR item; trailing bytes are an error
pub fn decode_storage(raw: &[u8]) -> Result<Value> {
    let mut decoder = Decoder::new(raw);
    let value = decode_value(&mut decoder)?;
    if decoder.position() != raw.len() {
        return Err(Error::decode(format!(
            "{} trailing bytes after storage item",
            raw.len() - decoder.position()
        )));
    }
    Ok(value)
}

fn cbor_err(err: minicbor::decode::Error) -> Error {
    Error::decode(err.to_string())
}

fn decode_value(d: &mut Decoder<'_>) -> Result<Value> {
    let value = match d.datatype().map_err(cbor_err)? {
        Type::Bool => Value::Bool(d.bool().map_err(cbor_err)?),
        Type::Null => {
            d.null().map_err(cbor_err)?;
            Value::Null
        }
        Type::Undefined => {
            d.undefined().map_err(cbor_err)?;
            Value::Undefined
        }
        Type::U8
        | Type::U16
        | Type::U32
        | Type::U64
        | Type::I8
        | Type::I16
        | Type::I32
        | Type::I64
        | Type::Int => Value::BigInt(i128::from(d.int().map_err(cbor_err)?)),
        Type::F32 => Value::Str(d.f32().map_err(cbor_err)?.to_string()),
        Type::F64 => Value::Str(d.f64().map_err(cbor_err)?.to_string()),
        Type::Bytes => Value::Str(hex::encode(d.bytes().map_err(cbor_err)?)),
        Type::String => Value::Str(d.str().map_err(cbor_err)?.to_string()),
        Type::Array => {
            let len = definite(d.array().map_err(cbor_err)?, "array")?;
            let mut items = Vec::with_capacity(len.min(1024) as usize);
            for _ in 0..len {
                items.push(decode_value(d)?);
            }
            Value::List(items)
        }
        Type::Map => {
            let len = definite(d.map().map_err(cbor_err)?, "map")?;
            let mut entries = Vec::with_capacity(len.min(1024) as usize);
            for _ in 0..len {
                let key = decode_key(d)?;
                entries.push((key, decode_value(d)?));
            }
            Value::Object(entries)
        }
        Type::Tag => {
            d.tag().map_err(cbor_err)?;
            decode_value(d)?
        }
        Type::BytesIndef | Type::StringIndef | Type::ArrayIndef | Type::MapIndef => {
            return Err(Error::decode("indefinite-length items are not supported"));
        }
        other => {
            return Err(Error::decode(format!("unsupported CBOR item: {:?}", other)));
        }
    };
    Ok(value)
}

fn definite(len: Option<u64>, kind: &str) -> Result<u64> {
    len.ok_or_else(|| Error::decode(format!("indefinite-length {} is not supported", kind)))
}

fn decode_key(d: &mut Decoder<'_>) -> Result<String> {
    match d.datatype().map_err(cbor_err)? {
        Type::String => Ok(d.str().map_err(cbor_err)?.to_string()),
        Type::U8
        | Type::U16
        | Type::U32
        | Type::U64
        | Type::I8
        | Type::I16
        | Type::I32
        | Type::I64
        | Type::Int => Ok(i128::from(d.int().map_err(cbor_err)?).to_string()),
        other => Err(Error::decode(format!("unsupported map key type: {:?}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minicbor::Encoder;

    #[test]
    fn test_decode_nested_storage() {
        let mut encoder = Encoder::new(Vec::new());
        encoder.map(3).unwrap();
        encoder.str("balance").unwrap().u64(1_000_000_000).unwrap();
        encoder.str("owner").unwrap().bytes(&[0xaa, 0xbb]).unwrap();
        encoder.str("items").unwrap().array(2).unwrap();
        encoder.i32(-5).unwrap().null().unwrap();
        let raw = encoder.into_writer();

        let value = decode_storage(&raw).unwrap();
        assert_eq!(
            value,
            Value::object([
                ("balance", Value::BigInt(1_000_000_000)),
                ("owner", Value::Str("aabb".into())),
                ("items", Value::List(vec![Value::BigInt(-5), Value::Null])),
            ])
        );
    }

    #[test]
    fn test_integer_keys_and_tags() {
        let mut encoder = Encoder::new(Vec::new());
        encoder.map(1).unwrap();
        encoder.u8(7).unwrap();
        encoder.tag(minicbor::data::Tag::new(121)).unwrap();
        encoder.bool(true).unwrap();
        let raw = encoder.into_writer();

        let value = decode_storage(&raw).unwrap();
        assert_eq!(value, Value::object([("7", Value::Bool(true))]));
    }

    #[test]
    fn test_rejects_indefinite_containers() {
        let mut encoder = Encoder::new(Vec::new());
        encoder.begin_array().unwrap();
        encoder.u8(1).unwrap();
        encoder.end().unwrap();
        let raw = encoder.into_writer();

        assert!(matches!(decode_storage(&raw), Err(Error::Decode(_))));
    }

    #[test]
    fn test_rejects_trailing_bytes() {
        let mut encoder = Encoder::new(Vec::new());
        encoder.u8(1).unwrap().u8(2).unwrap();
        let raw = encoder.into_writer();

        assert!(decode_storage(&raw).is_err());
        assert!(decode_storage(&[]).is_err());
    }
}
