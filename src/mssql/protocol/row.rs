use bytes::Bytes;

use crate::error::Error;
use crate::mssql::protocol::col_meta_data::ColumnData;
use crate::value::Value;

/// `ROW` (0xD1) and `NBCROW` (0xD2). The NBC form elides NULL values from
/// the payload and signals them in a leading bitmap of ⌈n/8⌉ bytes.
#[derive(Debug)]
pub(crate) struct Row {
    pub(crate) values: Vec<Value>,
}

impl Row {
    pub(crate) fn get(
        buf: &mut Bytes,
        nullable: bool,
        columns: &[ColumnData],
    ) -> Result<Self, Error> {
        let nulls = if nullable {
            buf.split_to((columns.len() + 7) / 8)
        } else {
            Bytes::new()
        };

        let mut values = Vec::with_capacity(columns.len());

        for (i, column) in columns.iter().enumerate() {
            if column.type_info.is_null() || (nullable && (nulls[i / 8] & (1 << (i % 8))) != 0) {
                values.push(Value::Null);
            } else {
                values.push(column.type_info.get_value(buf)?);
            }
        }

        Ok(Self { values })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mssql::protocol::col_meta_data::Flags;
    use crate::mssql::protocol::type_info::{DataType, TypeInfo};

    fn int_columns(n: usize) -> Vec<ColumnData> {
        (0..n)
            .map(|i| ColumnData {
                user_type: 0,
                flags: Flags::NULLABLE,
                type_info: TypeInfo::new(DataType::IntN, 4),
                table_name: None,
                col_name: format!("c{}", i),
            })
            .collect()
    }

    #[test]
    fn nbcrow_with_no_columns_null() {
        let columns = int_columns(3);

        // bitmap 0b000, then three intn(4) values
        #[rustfmt::skip]
        let mut buf = Bytes::from_static(&[
            0b0000_0000,
            4, 1, 0, 0, 0,
            4, 2, 0, 0, 0,
            4, 3, 0, 0, 0,
        ]);

        let row = Row::get(&mut buf, true, &columns).unwrap();
        assert_eq!(
            row.values,
            [Value::Int(1), Value::Int(2), Value::Int(3)]
        );
    }

    #[test]
    fn nbcrow_with_all_columns_null() {
        let columns = int_columns(3);

        let mut buf = Bytes::from_static(&[0b0000_0111]);

        let row = Row::get(&mut buf, true, &columns).unwrap();
        assert_eq!(row.values, [Value::Null, Value::Null, Value::Null]);
        assert!(buf.is_empty());
    }

    #[test]
    fn nbcrow_with_a_mixed_mask() {
        let columns = int_columns(3);

        // columns 0 and 2 are null; only column 1 has a payload
        #[rustfmt::skip]
        let mut buf = Bytes::from_static(&[
            0b0000_0101,
            4, 7, 0, 0, 0,
        ]);

        let row = Row::get(&mut buf, true, &columns).unwrap();
        assert_eq!(row.values, [Value::Null, Value::Int(7), Value::Null]);
    }

    #[test]
    fn nine_columns_use_a_two_byte_bitmap() {
        let columns = int_columns(9);

        let mut raw = vec![0b1111_1111, 0b0000_0000];
        raw.extend_from_slice(&[4, 9, 0, 0, 0]);

        let row = Row::get(&mut Bytes::from(raw), true, &columns).unwrap();

        assert_eq!(row.values[..8], vec![Value::Null; 8][..]);
        assert_eq!(row.values[8], Value::Int(9));
    }
}
