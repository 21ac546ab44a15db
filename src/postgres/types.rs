//! Text-protocol value coding.
//!
//! Incoming values decode by catalog OID from their text representation;
//! outgoing binds render as SQL literals (simple protocol only).

use std::str::FromStr;

use bigdecimal::BigDecimal;
use bytes::Bytes;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use uuid::Uuid;

use crate::error::Error;
use crate::value::Value;

mod oid {
    pub(super) const BOOL: u32 = 16;
    pub(super) const BYTEA: u32 = 17;
    pub(super) const INT8: u32 = 20;
    pub(super) const INT2: u32 = 21;
    pub(super) const INT4: u32 = 23;
    pub(super) const FLOAT4: u32 = 700;
    pub(super) const FLOAT8: u32 = 701;
    pub(super) const DATE: u32 = 1082;
    pub(super) const TIMESTAMP: u32 = 1114;
    pub(super) const TIMESTAMPTZ: u32 = 1184;
    pub(super) const NUMERIC: u32 = 1700;
    pub(super) const UUID: u32 = 2950;
}

/// Decodes one text-format value. Unknown OIDs decode as strings.
pub(crate) fn decode(type_oid: u32, raw: &Bytes) -> Result<Value, Error> {
    let text = std::str::from_utf8(raw)
        .map_err(|_| err_protocol!("text-format value is not valid UTF-8"))?;

    Ok(match type_oid {
        oid::BOOL => Value::Bool(matches!(text, "t" | "true" | "1")),

        oid::INT2 => Value::SmallInt(parse(text, "int2")?),
        oid::INT4 => Value::Int(parse(text, "int4")?),
        oid::INT8 => Value::BigInt(parse(text, "int8")?),

        oid::FLOAT4 => Value::Float(parse(text, "float4")?),
        oid::FLOAT8 => Value::Double(parse(text, "float8")?),

        oid::NUMERIC => match BigDecimal::from_str(text) {
            Ok(decimal) => Value::Decimal(decimal),
            // NaN has no decimal representation
            Err(_) => Value::Text(text.to_owned()),
        },

        oid::BYTEA => {
            let hex_digits = text
                .strip_prefix("\\x")
                .ok_or_else(|| err_protocol!("bytea is not in hex format"))?;

            Value::Bytes(
                hex::decode(hex_digits).map_err(|_| err_protocol!("bytea hex is malformed"))?,
            )
        }

        oid::DATE => {
            let date = NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .map_err(|_| err_protocol!("malformed date {:?}", text))?;

            Value::Timestamp(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap()))
        }

        oid::TIMESTAMP => {
            let ts = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f")
                .map_err(|_| err_protocol!("malformed timestamp {:?}", text))?;

            Value::Timestamp(Utc.from_utc_datetime(&ts))
        }

        oid::TIMESTAMPTZ => {
            // the server sends an abbreviated zone offset, e.g. `+05` or `+05:30`
            let ts = DateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f%#z")
                .map_err(|_| err_protocol!("malformed timestamptz {:?}", text))?;

            Value::Timestamp(ts.with_timezone(&Utc))
        }

        oid::UUID => Value::Uuid(
            Uuid::parse_str(text).map_err(|_| err_protocol!("malformed uuid {:?}", text))?,
        ),

        _ => Value::Text(text.to_owned()),
    })
}

fn parse<T: FromStr>(text: &str, ty: &str) -> Result<T, Error> {
    text.parse()
        .map_err(|_| err_protocol!("malformed {} value {:?}", ty, text))
}

/// Renders a bind value as a SQL literal for substitution into the query
/// string.
pub(crate) fn literal(value: &Value) -> String {
    match value {
        Value::Null => String::from("NULL"),

        Value::Bool(true) => String::from("TRUE"),
        Value::Bool(false) => String::from("FALSE"),

        Value::TinyInt(v) => v.to_string(),
        Value::SmallInt(v) => v.to_string(),
        Value::Int(v) => v.to_string(),
        Value::BigInt(v) => v.to_string(),

        Value::Float(v) => v.to_string(),
        Value::Double(v) => v.to_string(),
        Value::Decimal(v) => v.to_string(),

        Value::Text(s) => quote(s),

        Value::Bytes(b) => format!("E'\\\\x{}'", hex::encode(b)),

        Value::Uuid(u) => format!("'{}'", u),

        Value::Timestamp(ts) => format!("'{}'", ts.format("%Y-%m-%d %H:%M:%S%.6f+00")),
    }
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');

    for ch in s.chars() {
        if ch == '\'' {
            out.push('\'');
        }
        out.push(ch);
    }

    out.push('\'');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_decodes_primitives() {
        assert_eq!(
            decode(16, &Bytes::from_static(b"t")).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            decode(23, &Bytes::from_static(b"-7")).unwrap(),
            Value::Int(-7)
        );
        assert_eq!(
            decode(701, &Bytes::from_static(b"2.5")).unwrap(),
            Value::Double(2.5)
        );
    }

    #[test]
    fn numeric_beyond_i64_stays_exact() {
        let raw = Bytes::from_static(b"123456789012345678901234567890.123456789");

        match decode(1700, &raw).unwrap() {
            Value::Decimal(decimal) => {
                assert_eq!(
                    decimal.to_string(),
                    "123456789012345678901234567890.123456789"
                );
            }

            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn it_decodes_timestamps() {
        let ts = decode(1114, &Bytes::from_static(b"2024-01-15 10:30:00")).unwrap();
        assert_eq!(
            ts,
            Value::Timestamp(Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap())
        );

        let tstz = decode(1184, &Bytes::from_static(b"2024-01-15 05:30:00-05")).unwrap();
        assert_eq!(tstz, ts);
    }

    #[test]
    fn unknown_oids_decode_as_strings() {
        assert_eq!(
            decode(600, &Bytes::from_static(b"(1,2)")).unwrap(),
            Value::Text("(1,2)".into())
        );
    }

    #[test]
    fn literals_escape_quotes() {
        assert_eq!(literal(&Value::Text("it's".into())), "'it''s'");
        assert_eq!(
            literal(&Value::Bytes(vec![0xde, 0xad, 0xbe, 0xef])),
            "E'\\\\xdeadbeef'"
        );
        assert_eq!(literal(&Value::Bool(true)), "TRUE");
    }
}
