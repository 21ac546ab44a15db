use bigdecimal::BigDecimal;
use bytes::{Buf, Bytes};
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use num_bigint::{BigInt, Sign};
use uuid::Uuid;

use crate::error::Error;
use crate::io::{BufExt, BufMutExt};
use crate::value::Value;

// epoch of datetime/smalldatetime
fn epoch_1900() -> NaiveDate {
    NaiveDate::from_ymd_opt(1900, 1, 1).unwrap()
}

// epoch of date/datetime2/datetimeoffset
fn epoch_0001() -> NaiveDate {
    NaiveDate::from_ymd_opt(1, 1, 1).unwrap()
}

// raw collation bytes sent with character parameters (Latin1_General_CI_AS)
const DEFAULT_COLLATION: [u8; 5] = [0x09, 0x04, 0xd0, 0x00, 0x34];

const PLP_NULL: u64 = 0xffff_ffff_ffff_ffff;
const PLP_UNKNOWN_LEN: u64 = 0xffff_ffff_ffff_fffe;

/// A TDS data-type token.
///
/// <https://docs.microsoft.com/en-us/openspecs/windows_protocols/ms-tds/ce3183a6-9d89-47e8-a02f-de5a1a1303de>
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub(crate) enum DataType {
    // fixed-length
    Null = 0x1f,
    TinyInt = 0x30,
    Bit = 0x32,
    SmallInt = 0x34,
    Int = 0x38,
    SmallDateTime = 0x3a,
    Real = 0x3b,
    Money = 0x3c,
    DateTime = 0x3d,
    Float = 0x3e,
    SmallMoney = 0x7a,
    BigInt = 0x7f,

    // BYTELEN (nullable) variants
    Guid = 0x24,
    IntN = 0x26,
    Decimal = 0x37,
    Numeric = 0x3f,
    BitN = 0x68,
    DecimalN = 0x6a,
    NumericN = 0x6c,
    FloatN = 0x6d,
    MoneyN = 0x6e,
    DateTimeN = 0x6f,
    DateN = 0x28,
    TimeN = 0x29,
    DateTime2N = 0x2a,
    DateTimeOffsetN = 0x2b,

    // USHORTLEN
    BigVarBinary = 0xa5,
    BigVarChar = 0xa7,
    BigBinary = 0xad,
    BigChar = 0xaf,
    NVarChar = 0xe7,
    NChar = 0xef,

    // LONGLEN
    Text = 0x23,
    Image = 0x22,
    NText = 0x63,
}

impl DataType {
    pub(crate) fn get(buf: &mut Bytes) -> Result<Self, Error> {
        Ok(match buf.get_u8() {
            0x1f => DataType::Null,
            0x30 => DataType::TinyInt,
            0x32 => DataType::Bit,
            0x34 => DataType::SmallInt,
            0x38 => DataType::Int,
            0x3a => DataType::SmallDateTime,
            0x3b => DataType::Real,
            0x3c => DataType::Money,
            0x3d => DataType::DateTime,
            0x3e => DataType::Float,
            0x7a => DataType::SmallMoney,
            0x7f => DataType::BigInt,

            0x24 => DataType::Guid,
            0x26 => DataType::IntN,
            0x37 => DataType::Decimal,
            0x3f => DataType::Numeric,
            0x68 => DataType::BitN,
            0x6a => DataType::DecimalN,
            0x6c => DataType::NumericN,
            0x6d => DataType::FloatN,
            0x6e => DataType::MoneyN,
            0x6f => DataType::DateTimeN,
            0x28 => DataType::DateN,
            0x29 => DataType::TimeN,
            0x2a => DataType::DateTime2N,
            0x2b => DataType::DateTimeOffsetN,

            0xa5 => DataType::BigVarBinary,
            0xa7 => DataType::BigVarChar,
            0xad => DataType::BigBinary,
            0xaf => DataType::BigChar,
            0xe7 => DataType::NVarChar,
            0xef => DataType::NChar,

            0x23 => DataType::Text,
            0x22 => DataType::Image,
            0x63 => DataType::NText,

            ty => {
                return Err(err_protocol!("unknown data type 0x{:02x}", ty));
            }
        })
    }
}

/// A parsed TYPE_INFO: the token plus whatever the token class carries
/// (max length, precision/scale, collation).
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TypeInfo {
    pub(crate) ty: DataType,
    pub(crate) size: u32,
    #[allow(dead_code)]
    pub(crate) precision: u8,
    pub(crate) scale: u8,
}

impl TypeInfo {
    pub(crate) fn new(ty: DataType, size: u32) -> Self {
        Self {
            ty,
            size,
            precision: 0,
            scale: 0,
        }
    }

    pub(crate) fn get(buf: &mut Bytes) -> Result<Self, Error> {
        let ty = DataType::get(buf)?;
        let mut info = TypeInfo::new(ty, 0);

        match ty {
            // fixed-length types carry nothing extra
            DataType::Null
            | DataType::TinyInt
            | DataType::Bit
            | DataType::SmallInt
            | DataType::Int
            | DataType::SmallDateTime
            | DataType::Real
            | DataType::Money
            | DataType::DateTime
            | DataType::Float
            | DataType::SmallMoney
            | DataType::BigInt => {}

            // a 1-byte max length
            DataType::Guid
            | DataType::IntN
            | DataType::BitN
            | DataType::FloatN
            | DataType::MoneyN
            | DataType::DateTimeN => {
                info.size = buf.get_u8().into();
            }

            DataType::Decimal | DataType::Numeric | DataType::DecimalN | DataType::NumericN => {
                info.size = buf.get_u8().into();
                info.precision = buf.get_u8();
                info.scale = buf.get_u8();
            }

            // no length in TYPE_INFO; the row value is 0 or 3 bytes
            DataType::DateN => {}

            DataType::TimeN | DataType::DateTime2N | DataType::DateTimeOffsetN => {
                info.scale = buf.get_u8();
            }

            DataType::BigVarBinary | DataType::BigBinary => {
                info.size = buf.get_u16_le().into();
            }

            DataType::BigVarChar | DataType::BigChar | DataType::NVarChar | DataType::NChar => {
                info.size = buf.get_u16_le().into();

                // COLLATION
                buf.advance(5);
            }

            DataType::Text | DataType::NText => {
                info.size = buf.get_u32_le();

                // COLLATION
                buf.advance(5);
            }

            DataType::Image => {
                info.size = buf.get_u32_le();
            }
        }

        Ok(info)
    }

    pub(crate) fn is_null(&self) -> bool {
        matches!(self.ty, DataType::Null)
    }

    /// `true` for USHORTLEN character/binary types declared `(MAX)`, which
    /// use partially length-prefixed (PLP) values in rows.
    pub(crate) fn is_plp(&self) -> bool {
        self.size == 0xffff
            && matches!(
                self.ty,
                DataType::BigVarBinary
                    | DataType::BigVarChar
                    | DataType::NVarChar
            )
    }

    /// LONGLEN text types carry a multi-part table name in COLMETADATA.
    pub(crate) fn has_table_name(&self) -> bool {
        matches!(self.ty, DataType::Text | DataType::NText | DataType::Image)
    }

    /// Decodes one row value of this type.
    pub(crate) fn get_value(&self, buf: &mut Bytes) -> Result<Value, Error> {
        match self.ty {
            DataType::Null => Ok(Value::Null),

            DataType::TinyInt => Ok(Value::SmallInt(buf.get_u8().into())),
            DataType::Bit => Ok(Value::Bool(buf.get_u8() != 0)),
            DataType::SmallInt => Ok(Value::SmallInt(buf.get_i16_le())),
            DataType::Int => Ok(Value::Int(buf.get_i32_le())),
            DataType::BigInt => Ok(Value::BigInt(buf.get_i64_le())),
            DataType::Real => Ok(Value::Float(buf.get_f32_le())),
            DataType::Float => Ok(Value::Double(buf.get_f64_le())),

            DataType::SmallDateTime => decode_smalldatetime(buf),
            DataType::DateTime => decode_datetime(buf),

            DataType::SmallMoney => Ok(money_value(buf.get_i32_le().into())),
            DataType::Money => decode_money(buf),

            DataType::IntN => {
                let len = buf.get_u8();
                match len {
                    0 => Ok(Value::Null),
                    1 => Ok(Value::SmallInt(buf.get_u8().into())),
                    2 => Ok(Value::SmallInt(buf.get_i16_le())),
                    4 => Ok(Value::Int(buf.get_i32_le())),
                    8 => Ok(Value::BigInt(buf.get_i64_le())),

                    len => Err(err_protocol!("invalid INTN length {}", len)),
                }
            }

            DataType::BitN => {
                let len = buf.get_u8();
                match len {
                    0 => Ok(Value::Null),
                    1 => Ok(Value::Bool(buf.get_u8() != 0)),

                    len => Err(err_protocol!("invalid BITN length {}", len)),
                }
            }

            DataType::FloatN => {
                let len = buf.get_u8();
                match len {
                    0 => Ok(Value::Null),
                    4 => Ok(Value::Float(buf.get_f32_le())),
                    8 => Ok(Value::Double(buf.get_f64_le())),

                    len => Err(err_protocol!("invalid FLOATN length {}", len)),
                }
            }

            DataType::MoneyN => {
                let len = buf.get_u8();
                match len {
                    0 => Ok(Value::Null),
                    4 => Ok(money_value(buf.get_i32_le().into())),
                    8 => decode_money(buf),

                    len => Err(err_protocol!("invalid MONEYN length {}", len)),
                }
            }

            DataType::DateTimeN => {
                let len = buf.get_u8();
                match len {
                    0 => Ok(Value::Null),
                    4 => decode_smalldatetime(buf),
                    8 => decode_datetime(buf),

                    len => Err(err_protocol!("invalid DATETIMN length {}", len)),
                }
            }

            DataType::Guid => {
                let len = buf.get_u8();
                match len {
                    0 => Ok(Value::Null),
                    16 => decode_guid(buf),

                    len => Err(err_protocol!("invalid GUID length {}", len)),
                }
            }

            DataType::Decimal | DataType::Numeric | DataType::DecimalN | DataType::NumericN => {
                let len = buf.get_u8();
                if len == 0 {
                    return Ok(Value::Null);
                }

                decode_numeric(buf, len, self.scale)
            }

            DataType::DateN => {
                let len = buf.get_u8();
                match len {
                    0 => Ok(Value::Null),
                    3 => {
                        let days = buf.get_uint_le(3);
                        Ok(timestamp(date_from_0001(days)?.and_hms_opt(0, 0, 0).unwrap()))
                    }

                    len => Err(err_protocol!("invalid DATE length {}", len)),
                }
            }

            DataType::TimeN => {
                let len = buf.get_u8();
                if len == 0 {
                    return Ok(Value::Null);
                }

                let nanos = decode_time_nanos(buf, len, self.scale)?;
                Ok(Value::Text(format_time(nanos)))
            }

            DataType::DateTime2N => {
                let len = buf.get_u8();
                if len == 0 {
                    return Ok(Value::Null);
                }

                let nanos = decode_time_nanos(buf, len - 3, self.scale)?;
                let days = buf.get_uint_le(3);

                let date = date_from_0001(days)?;
                Ok(timestamp(
                    date.and_hms_opt(0, 0, 0).unwrap() + Duration::nanoseconds(nanos as i64),
                ))
            }

            DataType::DateTimeOffsetN => {
                let len = buf.get_u8();
                if len == 0 {
                    return Ok(Value::Null);
                }

                let nanos = decode_time_nanos(buf, len - 5, self.scale)?;
                let days = buf.get_uint_le(3);

                // the wire carries the *UTC* date and time; the offset is
                // informational and must not be applied again
                let _offset_minutes = buf.get_i16_le();

                let date = date_from_0001(days)?;
                Ok(timestamp(
                    date.and_hms_opt(0, 0, 0).unwrap() + Duration::nanoseconds(nanos as i64),
                ))
            }

            DataType::BigVarBinary | DataType::BigBinary => {
                if self.is_plp() {
                    return Ok(match get_plp(buf)? {
                        Some(data) => Value::Bytes(data),
                        None => Value::Null,
                    });
                }

                let len = buf.get_u16_le();
                if len == 0xffff {
                    return Ok(Value::Null);
                }

                Ok(Value::Bytes(buf.get_bytes(len as usize)?.to_vec()))
            }

            DataType::BigVarChar | DataType::BigChar => {
                if self.is_plp() {
                    return Ok(match get_plp(buf)? {
                        Some(data) => Value::Text(decode_legacy_text(&data)),
                        None => Value::Null,
                    });
                }

                let len = buf.get_u16_le();
                if len == 0xffff {
                    return Ok(Value::Null);
                }

                let data = buf.get_bytes(len as usize)?;
                Ok(Value::Text(decode_legacy_text(&data)))
            }

            DataType::NVarChar | DataType::NChar => {
                if self.is_plp() {
                    return Ok(match get_plp(buf)? {
                        Some(data) => Value::Text(decode_utf16le(&data)?),
                        None => Value::Null,
                    });
                }

                let len = buf.get_u16_le();
                if len == 0xffff {
                    return Ok(Value::Null);
                }

                let data = buf.get_bytes(len as usize)?;
                Ok(Value::Text(decode_utf16le(&data)?))
            }

            DataType::Text | DataType::NText | DataType::Image => {
                // 1-byte textptr length (0 = null), textptr, an 8-byte
                // timestamp, then a 4-byte data length and the data
                let textptr_len = buf.get_u8();
                if textptr_len == 0 {
                    return Ok(Value::Null);
                }

                buf.advance(textptr_len as usize);
                buf.advance(8);

                let len = buf.get_u32_le();
                let data = buf.get_bytes(len as usize)?;

                Ok(match self.ty {
                    DataType::Image => Value::Bytes(data.to_vec()),
                    DataType::NText => Value::Text(decode_utf16le(&data)?),
                    _ => Value::Text(decode_legacy_text(&data)),
                })
            }
        }
    }
}

fn timestamp(naive: chrono::NaiveDateTime) -> Value {
    Value::Timestamp(Utc.from_utc_datetime(&naive))
}

fn date_from_0001(days: u64) -> Result<NaiveDate, Error> {
    epoch_0001()
        .checked_add_signed(Duration::days(days as i64))
        .ok_or_else(|| err_protocol!("date value {} days is out of range", days))
}

// days since 1900-01-01 + minutes since midnight
fn decode_smalldatetime(buf: &mut Bytes) -> Result<Value, Error> {
    let days = buf.get_u16_le();
    let minutes = buf.get_u16_le();

    let naive = epoch_1900()
        .checked_add_signed(Duration::days(days.into()))
        .ok_or_else(|| err_protocol!("smalldatetime is out of range"))?
        .and_hms_opt(0, 0, 0)
        .unwrap()
        + Duration::minutes(minutes.into());

    Ok(timestamp(naive))
}

// days since 1900-01-01 + ticks of 1/300 second since midnight
fn decode_datetime(buf: &mut Bytes) -> Result<Value, Error> {
    let days = buf.get_i32_le();
    let ticks = buf.get_u32_le();

    let seconds = ticks / 300;
    let nanos = (u64::from(ticks % 300) * 10_000_000 / 3) as i64;

    let naive = epoch_1900()
        .checked_add_signed(Duration::days(days.into()))
        .ok_or_else(|| err_protocol!("datetime is out of range"))?
        .and_hms_opt(0, 0, 0)
        .unwrap()
        + Duration::seconds(seconds.into())
        + Duration::nanoseconds(nanos);

    Ok(timestamp(naive))
}

// a high/low int32 pair, together an i64 of 1/10000 currency units
fn decode_money(buf: &mut Bytes) -> Result<Value, Error> {
    let high = buf.get_i32_le();
    let low = buf.get_u32_le();

    Ok(money_value((i64::from(high) << 32) | i64::from(low)))
}

fn money_value(tenths_of_millis: i64) -> Value {
    Value::Decimal(BigDecimal::new(BigInt::from(tenths_of_millis), 4))
}

// sign byte (1 = positive) + little-endian magnitude
fn decode_numeric(buf: &mut Bytes, len: u8, scale: u8) -> Result<Value, Error> {
    let sign = buf.get_u8();
    let magnitude = buf.get_bytes(len as usize - 1)?;

    let mut int = BigInt::from_bytes_le(Sign::Plus, &magnitude);
    if sign == 0 {
        int = -int;
    }

    Ok(Value::Decimal(BigDecimal::new(int, scale.into())))
}

// the first three GUID groups are little-endian on the wire
fn decode_guid(buf: &mut Bytes) -> Result<Value, Error> {
    let b = buf.get_bytes(16)?;

    let d1 = u32::from_le_bytes([b[0], b[1], b[2], b[3]]);
    let d2 = u16::from_le_bytes([b[4], b[5]]);
    let d3 = u16::from_le_bytes([b[6], b[7]]);
    let mut d4 = [0_u8; 8];
    d4.copy_from_slice(&b[8..16]);

    Ok(Value::Uuid(Uuid::from_fields(d1, d2, d3, &d4)))
}

fn encode_guid(buf: &mut Vec<u8>, uuid: &Uuid) {
    let (d1, d2, d3, d4) = uuid.as_fields();

    buf.extend_from_slice(&d1.to_le_bytes());
    buf.extend_from_slice(&d2.to_le_bytes());
    buf.extend_from_slice(&d3.to_le_bytes());
    buf.extend_from_slice(d4);
}

// units of 10^-scale seconds since midnight
fn decode_time_nanos(buf: &mut Bytes, width: u8, scale: u8) -> Result<u64, Error> {
    if !(3..=5).contains(&width) {
        return Err(err_protocol!("invalid TIME width {}", width));
    }

    let units = buf.get_uint_le(width as usize);

    Ok(units * 10_u64.pow(9 - u32::from(scale.min(7))))
}

fn format_time(nanos: u64) -> String {
    let seconds = nanos / 1_000_000_000;
    let frac = nanos % 1_000_000_000;

    let (h, m, s) = (seconds / 3600, (seconds / 60) % 60, seconds % 60);

    if frac == 0 {
        format!("{:02}:{:02}:{:02}", h, m, s)
    } else {
        format!("{:02}:{:02}:{:02}.{:07}", h, m, s, frac / 100)
    }
}

fn decode_utf16le(data: &[u8]) -> Result<String, Error> {
    let units: Vec<u16> = data
        .chunks_exact(2)
        .map(|ch| u16::from_le_bytes([ch[0], ch[1]]))
        .collect();

    String::from_utf16(&units).map_err(|_| err_protocol!("string is not valid UTF-16"))
}

// non-unicode columns: UTF-8 first, Windows-1252 as the legacy fallback
fn decode_legacy_text(data: &[u8]) -> String {
    match std::str::from_utf8(data) {
        Ok(s) => s.to_owned(),
        Err(_) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(data);
            decoded.into_owned()
        }
    }
}

/// PLP (partially length-prefixed) value: an 8-byte total length, then
/// 4-byte-prefixed chunks terminated by a zero-length chunk.
fn get_plp(buf: &mut Bytes) -> Result<Option<Vec<u8>>, Error> {
    let total = buf.get_u64_le();

    if total == PLP_NULL {
        return Ok(None);
    }

    let mut data = if total == PLP_UNKNOWN_LEN {
        Vec::new()
    } else {
        Vec::with_capacity(total as usize)
    };

    loop {
        let chunk = buf.get_u32_le();
        if chunk == 0 {
            break;
        }

        data.extend_from_slice(&buf.get_bytes(chunk as usize)?);
    }

    Ok(Some(data))
}

/// The `sp_executesql` declaration fragment for a bind value.
pub(crate) fn declaration(value: &Value) -> String {
    match value {
        Value::Null => String::from("nvarchar(4000)"),
        Value::Bool(_) => String::from("bit"),
        Value::TinyInt(_) | Value::SmallInt(_) => String::from("smallint"),
        Value::Int(_) => String::from("int"),
        Value::BigInt(_) => String::from("bigint"),
        Value::Float(_) => String::from("real"),
        Value::Double(_) => String::from("float"),

        Value::Decimal(d) => {
            let (precision, scale) = numeric_precision_and_scale(d);
            format!("decimal({},{})", precision, scale)
        }

        Value::Text(s) if s.encode_utf16().count() > 4000 => String::from("nvarchar(max)"),
        Value::Text(_) => String::from("nvarchar(4000)"),

        Value::Bytes(b) if b.len() > 8000 => String::from("varbinary(max)"),
        Value::Bytes(_) => String::from("varbinary(8000)"),

        Value::Uuid(_) => String::from("uniqueidentifier"),
        Value::Timestamp(_) => String::from("datetime2(7)"),
    }
}

/// Writes TYPE_INFO followed by the value bytes, as an RPC parameter.
pub(crate) fn put_value(buf: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Null => {
            // nvarchar(4000), null
            buf.push(DataType::NVarChar as u8);
            buf.extend_from_slice(&8000_u16.to_le_bytes());
            buf.extend_from_slice(&DEFAULT_COLLATION);
            buf.extend_from_slice(&0xffff_u16.to_le_bytes());
        }

        Value::Bool(v) => {
            buf.push(DataType::BitN as u8);
            buf.push(1);
            buf.push(1);
            buf.push(u8::from(*v));
        }

        Value::TinyInt(v) => put_intn(buf, i64::from(*v), 2),
        Value::SmallInt(v) => put_intn(buf, i64::from(*v), 2),
        Value::Int(v) => put_intn(buf, i64::from(*v), 4),
        Value::BigInt(v) => put_intn(buf, *v, 8),

        Value::Float(v) => {
            buf.push(DataType::FloatN as u8);
            buf.push(4);
            buf.push(4);
            buf.extend_from_slice(&v.to_le_bytes());
        }

        Value::Double(v) => {
            buf.push(DataType::FloatN as u8);
            buf.push(8);
            buf.push(8);
            buf.extend_from_slice(&v.to_le_bytes());
        }

        Value::Decimal(d) => put_numeric(buf, d),

        Value::Text(s) => put_nvarchar(buf, s),

        Value::Bytes(b) => put_varbinary(buf, b),

        Value::Uuid(u) => {
            buf.push(DataType::Guid as u8);
            buf.push(16);
            buf.push(16);
            encode_guid(buf, u);
        }

        Value::Timestamp(ts) => put_datetime2(buf, ts),
    }
}

fn put_intn(buf: &mut Vec<u8>, v: i64, width: u8) {
    buf.push(DataType::IntN as u8);
    buf.push(width);
    buf.push(width);
    buf.extend_from_slice(&v.to_le_bytes()[..width as usize]);
}

fn numeric_precision_and_scale(d: &BigDecimal) -> (u8, u8) {
    let (_, exponent) = d.as_bigint_and_exponent();
    let scale = exponent.clamp(0, 38) as u8;

    let (int, _) = d.with_scale(scale.into()).into_bigint_and_exponent();
    let digits = int.magnitude().to_string().len() as u8;

    (digits.max(scale + 1).min(38), scale)
}

fn put_numeric(buf: &mut Vec<u8>, d: &BigDecimal) {
    let (precision, scale) = numeric_precision_and_scale(d);
    let (int, _) = d.with_scale(scale.into()).into_bigint_and_exponent();

    let magnitude = int.magnitude().to_bytes_le();

    let width: usize = match precision {
        0..=9 => 4,
        10..=19 => 8,
        20..=28 => 12,
        _ => 16,
    };

    buf.push(DataType::NumericN as u8);
    buf.push(width as u8 + 1);
    buf.push(precision);
    buf.push(scale);

    // value: length, sign (1 = positive), zero-padded magnitude
    buf.push(width as u8 + 1);
    buf.push(u8::from(int.sign() != Sign::Minus));

    let used = magnitude.len().min(width);
    buf.extend_from_slice(&magnitude[..used]);
    buf.resize(buf.len() + (width - used), 0);
}

fn put_nvarchar(buf: &mut Vec<u8>, s: &str) {
    let encoded: Vec<u8> = {
        let mut data = Vec::with_capacity(s.len() * 2);
        data.put_utf16_str(s);
        data
    };

    buf.push(DataType::NVarChar as u8);

    if encoded.len() > 8000 {
        // nvarchar(max): PLP with a single chunk
        buf.extend_from_slice(&0xffff_u16.to_le_bytes());
        buf.extend_from_slice(&DEFAULT_COLLATION);

        buf.extend_from_slice(&(encoded.len() as u64).to_le_bytes());
        buf.extend_from_slice(&(encoded.len() as u32).to_le_bytes());
        buf.extend_from_slice(&encoded);
        buf.extend_from_slice(&0_u32.to_le_bytes());
    } else {
        buf.extend_from_slice(&8000_u16.to_le_bytes());
        buf.extend_from_slice(&DEFAULT_COLLATION);
        buf.extend_from_slice(&(encoded.len() as u16).to_le_bytes());
        buf.extend_from_slice(&encoded);
    }
}

fn put_varbinary(buf: &mut Vec<u8>, b: &[u8]) {
    buf.push(DataType::BigVarBinary as u8);

    if b.len() > 8000 {
        buf.extend_from_slice(&0xffff_u16.to_le_bytes());

        buf.extend_from_slice(&(b.len() as u64).to_le_bytes());
        buf.extend_from_slice(&(b.len() as u32).to_le_bytes());
        buf.extend_from_slice(b);
        buf.extend_from_slice(&0_u32.to_le_bytes());
    } else {
        buf.extend_from_slice(&8000_u16.to_le_bytes());
        buf.extend_from_slice(&(b.len() as u16).to_le_bytes());
        buf.extend_from_slice(b);
    }
}

fn put_datetime2(buf: &mut Vec<u8>, ts: &DateTime<Utc>) {
    let naive = ts.naive_utc();
    let date = naive.date();
    let time = naive - date.and_hms_opt(0, 0, 0).unwrap();

    let days = (date - epoch_0001()).num_days() as u64;
    let units = (time.num_nanoseconds().unwrap_or(0) / 100) as u64;

    buf.push(DataType::DateTime2N as u8);
    buf.push(7);

    // scale 7: 5 time bytes + 3 date bytes
    buf.push(8);
    buf.extend_from_slice(&units.to_le_bytes()[..5]);
    buf.extend_from_slice(&days.to_le_bytes()[..3]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn datetime_zero_is_the_1900_epoch() {
        let mut buf = Bytes::from_static(&[0, 0, 0, 0, 0, 0, 0, 0]);
        let value = TypeInfo::new(DataType::DateTime, 8).get_value(&mut buf).unwrap();

        assert_eq!(
            value,
            Value::Timestamp(Utc.with_ymd_and_hms(1900, 1, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn money_preserves_four_decimal_places() {
        // 1.5000 = 15000 * 10^-4
        let mut buf = Bytes::from_static(&[0, 0, 0, 0, 0x98, 0x3a, 0, 0]);
        let value = TypeInfo::new(DataType::Money, 8).get_value(&mut buf).unwrap();

        assert_eq!(
            value,
            Value::Decimal(BigDecimal::from_str("1.5000").unwrap())
        );
    }

    #[test]
    fn guid_bytes_are_transposed() {
        // 6F9619FF-8B86-D011-B42D-00C04FC964FF stored mixed-endian
        #[rustfmt::skip]
        let mut buf = Bytes::from_static(&[
            16,
            0xff, 0x19, 0x96, 0x6f,
            0x86, 0x8b,
            0x11, 0xd0,
            0xb4, 0x2d, 0x00, 0xc0, 0x4f, 0xc9, 0x64, 0xff,
        ]);

        let value = TypeInfo::new(DataType::Guid, 16).get_value(&mut buf).unwrap();

        assert_eq!(
            value,
            Value::Uuid(Uuid::from_str("6F9619FF-8B86-D011-B42D-00C04FC964FF").unwrap())
        );
    }

    #[test]
    fn guid_round_trips_through_the_wire_layout() {
        let uuid = Uuid::from_str("6F9619FF-8B86-D011-B42D-00C04FC964FF").unwrap();

        let mut wire = vec![16];
        encode_guid(&mut wire, &uuid);

        let mut buf = Bytes::from(wire);
        let value = TypeInfo::new(DataType::Guid, 16).get_value(&mut buf).unwrap();

        assert_eq!(value, Value::Uuid(uuid));
    }

    #[test]
    fn numeric_decodes_signed_magnitudes() {
        // -12345.6789 as numeric(9,4): sign 0, magnitude 123456789
        let magnitude = 123_456_789_u32.to_le_bytes();
        let mut raw = vec![5, 0];
        raw.extend_from_slice(&magnitude[..4]);

        let mut info = TypeInfo::new(DataType::NumericN, 5);
        info.precision = 9;
        info.scale = 4;

        let mut buf = Bytes::from(raw);
        assert_eq!(
            info.get_value(&mut buf).unwrap(),
            Value::Decimal(BigDecimal::from_str("-12345.6789").unwrap())
        );
    }

    #[test]
    fn plp_reassembles_chunks() {
        // "XXXX…" (5000 chars) split into two UTF-16LE chunks
        let text: String = std::iter::repeat('X').take(5000).collect();
        let encoded: Vec<u8> = text.encode_utf16().flat_map(|u| u.to_le_bytes()).collect();

        let mut raw = Vec::new();
        raw.extend_from_slice(&(encoded.len() as u64).to_le_bytes());
        raw.extend_from_slice(&4088_u32.to_le_bytes());
        raw.extend_from_slice(&encoded[..4088]);
        raw.extend_from_slice(&((encoded.len() - 4088) as u32).to_le_bytes());
        raw.extend_from_slice(&encoded[4088..]);
        raw.extend_from_slice(&0_u32.to_le_bytes());

        let info = TypeInfo::new(DataType::NVarChar, 0xffff);
        let mut buf = Bytes::from(raw);

        assert_eq!(info.get_value(&mut buf).unwrap(), Value::Text(text));
        assert!(buf.is_empty());
    }

    #[test]
    fn plp_null_and_unknown_length() {
        let info = TypeInfo::new(DataType::NVarChar, 0xffff);

        let mut buf = Bytes::from_static(&[0xff; 8]);
        assert_eq!(info.get_value(&mut buf).unwrap(), Value::Null);

        // unknown length: chunks until the zero terminator
        let mut raw = vec![0xfe, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff];
        raw.extend_from_slice(&2_u32.to_le_bytes());
        raw.extend_from_slice(&[b'A', 0]);
        raw.extend_from_slice(&0_u32.to_le_bytes());

        let mut buf = Bytes::from(raw);
        assert_eq!(info.get_value(&mut buf).unwrap(), Value::Text("A".into()));
    }

    #[test]
    fn datetimeoffset_is_not_shifted_twice() {
        // 2024-01-15 10:30:00 UTC at offset +05:30; scale 0
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let days = (date - epoch_0001()).num_days() as u64;
        let seconds = 10 * 3600 + 30 * 60;

        let mut raw = vec![8];
        raw.extend_from_slice(&(seconds as u32).to_le_bytes()[..3]);
        raw.extend_from_slice(&days.to_le_bytes()[..3]);
        raw.extend_from_slice(&330_i16.to_le_bytes());

        let mut info = TypeInfo::new(DataType::DateTimeOffsetN, 0);
        info.scale = 0;

        let mut buf = Bytes::from(raw);
        assert_eq!(
            info.get_value(&mut buf).unwrap(),
            Value::Timestamp(Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap())
        );
    }

    #[test]
    fn declarations_match_values() {
        assert_eq!(declaration(&Value::Int(1)), "int");
        assert_eq!(
            declaration(&Value::Decimal(BigDecimal::from_str("12345.6789").unwrap())),
            "decimal(9,4)"
        );
        assert_eq!(declaration(&Value::Text("hi".into())), "nvarchar(4000)");
        assert_eq!(
            declaration(&Value::Text("X".repeat(5000))),
            "nvarchar(max)"
        );
    }
}
