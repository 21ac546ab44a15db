use bitflags::bitflags;
use bytes::{Buf, Bytes};

use crate::column::Column;
use crate::error::Error;
use crate::mssql::io::MssqlBufExt;
use crate::mssql::protocol::type_info::TypeInfo;

bitflags! {
    pub(crate) struct Flags: u16 {
        const NULLABLE = 0x0001;
        const CASE_SEN = 0x0002;
        const UPDATEABLE_UNKNOWN = 0x0008;
        const IDENTITY = 0x0010;
        const COMPUTED = 0x0020;
        const FIXED_LEN_CLR_TYPE = 0x0100;
        const SPARSE_COLUMN_SET = 0x0400;
        const ENCRYPTED = 0x0800;
        const HIDDEN = 0x2000;
        const KEY = 0x4000;
        const NULLABLE_UNKNOWN = 0x8000;
    }
}

#[allow(dead_code)]
#[derive(Debug, Clone)]
pub(crate) struct ColumnData {
    pub(crate) user_type: u32,
    pub(crate) flags: Flags,
    pub(crate) type_info: TypeInfo,
    pub(crate) table_name: Option<String>,
    pub(crate) col_name: String,
}

impl ColumnData {
    pub(crate) fn to_column(&self) -> Column {
        let mut column = Column::new(self.col_name.clone(), self.type_info.ty as u32);
        column.table = self.table_name.clone();
        column.scale = self.type_info.scale;
        column
    }
}

/// `COLMETADATA` (0x81): the column layout of the rows that follow.
#[derive(Debug)]
pub(crate) struct ColMetaData;

impl ColMetaData {
    pub(crate) fn get(buf: &mut Bytes, columns: &mut Vec<ColumnData>) -> Result<(), Error> {
        columns.clear();

        let count = buf.get_u16_le();

        // NoMetaData: the column set did not change
        if count == 0xffff {
            return Ok(());
        }

        for _ in 0..count {
            let user_type = buf.get_u32_le();
            let flags = Flags::from_bits_truncate(buf.get_u16_le());
            let type_info = TypeInfo::get(buf)?;

            // LONGLEN text types carry a multi-part table name
            let table_name = if type_info.has_table_name() {
                let parts = buf.get_u8();
                let mut name = String::new();

                for i in 0..parts {
                    if i > 0 {
                        name.push('.');
                    }
                    name.push_str(&buf.get_us_varchar()?);
                }

                Some(name)
            } else {
                None
            };

            let col_name = buf.get_b_varchar()?;

            columns.push(ColumnData {
                user_type,
                flags,
                type_info,
                table_name,
                col_name,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mssql::protocol::type_info::DataType;

    #[test]
    fn it_decodes_an_int_column() {
        // one column: `answer` intn(4), nullable
        #[rustfmt::skip]
        let mut buf = Bytes::from_static(&[
            1, 0,
            0, 0, 0, 0,
            0x09, 0x00,
            0x26, 4,
            6, b'a', 0, b'n', 0, b's', 0, b'w', 0, b'e', 0, b'r', 0,
        ]);

        let mut columns = Vec::new();
        ColMetaData::get(&mut buf, &mut columns).unwrap();

        assert_eq!(columns.len(), 1);
        assert_eq!(columns[0].col_name, "answer");
        assert_eq!(columns[0].type_info.ty, DataType::IntN);
        assert_eq!(columns[0].type_info.size, 4);
        assert!(columns[0].flags.contains(Flags::NULLABLE));
        assert!(buf.is_empty());
    }
}
