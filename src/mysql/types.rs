//! Text-protocol value coding for MySQL.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use bytes::Bytes;
use chrono::{NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::error::Error;
use crate::mysql::protocol::column_def::{ColumnDefinition, ColumnFlags, BINARY_COLLATION};
use crate::value::Value;

// https://dev.mysql.com/doc/dev/mysql-server/8.0.12/field__types_8h.html
mod type_code {
    pub(super) const DECIMAL: u8 = 0x00;
    pub(super) const TINY: u8 = 0x01;
    pub(super) const SHORT: u8 = 0x02;
    pub(super) const LONG: u8 = 0x03;
    pub(super) const FLOAT: u8 = 0x04;
    pub(super) const DOUBLE: u8 = 0x05;
    pub(super) const NULL: u8 = 0x06;
    pub(super) const TIMESTAMP: u8 = 0x07;
    pub(super) const LONGLONG: u8 = 0x08;
    pub(super) const INT24: u8 = 0x09;
    pub(super) const DATE: u8 = 0x0a;
    pub(super) const TIME: u8 = 0x0b;
    pub(super) const DATETIME: u8 = 0x0c;
    pub(super) const YEAR: u8 = 0x0d;
    pub(super) const NEWDECIMAL: u8 = 0xf6;
    pub(super) const BLOB: u8 = 0xfc;
    pub(super) const VAR_STRING: u8 = 0xfd;
    pub(super) const STRING: u8 = 0xfe;
}

/// Decodes one text-format value against its column definition, honoring
/// the unsigned flag. Unknown type codes decode as strings.
pub(crate) fn decode(column: &ColumnDefinition, raw: &Bytes) -> Result<Value, Error> {
    let unsigned = column.flags.contains(ColumnFlags::UNSIGNED);

    let text = std::str::from_utf8(raw);
    let text = match column.type_code {
        type_code::BLOB | type_code::VAR_STRING | type_code::STRING
            if column.charset == BINARY_COLLATION =>
        {
            return Ok(Value::Bytes(raw.to_vec()));
        }

        _ => text.map_err(|_| err_protocol!("text-format value is not valid UTF-8"))?,
    };

    Ok(match column.type_code {
        type_code::NULL => Value::Null,

        type_code::TINY if unsigned => Value::SmallInt(parse::<u8>(text)? as i16),
        type_code::TINY => Value::TinyInt(parse(text)?),

        type_code::SHORT | type_code::YEAR if unsigned => Value::Int(parse::<u16>(text)? as i32),
        type_code::SHORT | type_code::YEAR => Value::SmallInt(parse(text)?),

        type_code::LONG | type_code::INT24 if unsigned => {
            Value::BigInt(parse::<u32>(text)? as i64)
        }
        type_code::LONG | type_code::INT24 => Value::Int(parse(text)?),

        type_code::LONGLONG if unsigned => {
            let v: u64 = parse(text)?;

            // a u64 beyond i64 range survives as a decimal
            match i64::try_from(v) {
                Ok(v) => Value::BigInt(v),
                Err(_) => Value::Decimal(BigDecimal::from(v)),
            }
        }
        type_code::LONGLONG => Value::BigInt(parse(text)?),

        type_code::FLOAT => Value::Float(parse(text)?),
        type_code::DOUBLE => Value::Double(parse(text)?),

        type_code::DECIMAL | type_code::NEWDECIMAL => Value::Decimal(
            BigDecimal::from_str(text)
                .map_err(|_| err_protocol!("malformed decimal {:?}", text))?,
        ),

        type_code::DATE => {
            let date = NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .map_err(|_| err_protocol!("malformed date {:?}", text))?;

            Value::Timestamp(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap()))
        }

        type_code::DATETIME | type_code::TIMESTAMP => {
            let ts = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f")
                .map_err(|_| err_protocol!("malformed datetime {:?}", text))?;

            Value::Timestamp(Utc.from_utc_datetime(&ts))
        }

        // durations have no unified variant; surface the text form
        type_code::TIME => Value::Text(text.to_owned()),

        _ => Value::Text(text.to_owned()),
    })
}

fn parse<T: FromStr>(text: &str) -> Result<T, Error> {
    text.parse()
        .map_err(|_| err_protocol!("malformed numeric value {:?}", text))
}

/// Renders a bind value as a SQL literal. Strings escape backslash first,
/// then single quotes; blobs use the hex form; booleans render `1`/`0`.
pub(crate) fn literal(value: &Value) -> String {
    match value {
        Value::Null => String::from("NULL"),

        Value::Bool(true) => String::from("1"),
        Value::Bool(false) => String::from("0"),

        Value::TinyInt(v) => v.to_string(),
        Value::SmallInt(v) => v.to_string(),
        Value::Int(v) => v.to_string(),
        Value::BigInt(v) => v.to_string(),

        Value::Float(v) => v.to_string(),
        Value::Double(v) => v.to_string(),
        Value::Decimal(v) => v.to_string(),

        Value::Text(s) => format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'")),

        Value::Bytes(b) if b.is_empty() => String::from("''"),
        Value::Bytes(b) => format!("0x{}", hex::encode_upper(b)),

        Value::Uuid(u) => format!("'{}'", u),

        Value::Timestamp(ts) => format!("'{}'", ts.format("%Y-%m-%d %H:%M:%S%.6f")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mysql::protocol::column_def::ColumnFlags;

    fn column(type_code: u8, flags: ColumnFlags, charset: u16) -> ColumnDefinition {
        ColumnDefinition {
            table: None,
            name: String::from("v"),
            charset,
            type_code,
            flags,
            decimals: 0,
        }
    }

    #[test]
    fn unsigned_flag_widens_integers() {
        let raw = Bytes::from_static(b"200");

        let signed = column(type_code::TINY, ColumnFlags::empty(), 224);
        assert!(decode(&signed, &raw).is_err()); // 200 does not fit in i8

        let unsigned = column(type_code::TINY, ColumnFlags::UNSIGNED, 224);
        assert_eq!(decode(&unsigned, &raw).unwrap(), Value::SmallInt(200));
    }

    #[test]
    fn big_unsigned_survives_as_decimal() {
        let raw = Bytes::from_static(b"18446744073709551615");
        let col = column(type_code::LONGLONG, ColumnFlags::UNSIGNED, 224);

        assert_eq!(
            decode(&col, &raw).unwrap(),
            Value::Decimal(BigDecimal::from(u64::MAX))
        );
    }

    #[test]
    fn binary_collation_yields_bytes() {
        let raw = Bytes::from_static(&[0xde, 0xad]);
        let col = column(type_code::BLOB, ColumnFlags::BINARY, BINARY_COLLATION);

        assert_eq!(decode(&col, &raw).unwrap(), Value::Bytes(vec![0xde, 0xad]));
    }

    #[test]
    fn literals_escape_backslash_then_quote() {
        assert_eq!(
            literal(&Value::Text(r"a\b'c".into())),
            r"'a\\b\'c'"
        );
        assert_eq!(
            literal(&Value::Bytes(vec![0xde, 0xad, 0xbe, 0xef])),
            "0xDEADBEEF"
        );
        assert_eq!(literal(&Value::Bool(true)), "1");
    }
}
