use bytes::{Buf, Bytes};

use crate::error::Error;
use crate::mssql::io::MssqlBufExt;

/// `COLINFO` (0xA5): per-column browse-mode information; emitted alongside
/// TABNAME for FOR BROWSE queries.
#[derive(Debug)]
#[allow(dead_code)]
pub(crate) struct ColInfo {
    pub(crate) columns: Vec<ColInfoEntry>,
}

#[derive(Debug)]
#[allow(dead_code)]
pub(crate) struct ColInfoEntry {
    pub(crate) column: u8,
    pub(crate) table: u8,
    pub(crate) status: u8,
    pub(crate) column_name: Option<String>,
}

// Status bit: the column name follows (it differs from the select list)
const STATUS_DIFFERENT_NAME: u8 = 0x20;

impl ColInfo {
    pub(crate) fn get(buf: &mut Bytes) -> Result<Self, Error> {
        let len = buf.get_u16_le();
        let mut data = buf.split_to(len as usize);

        let mut columns = Vec::new();
        while !data.is_empty() {
            let column = data.get_u8();
            let table = data.get_u8();
            let status = data.get_u8();

            let column_name = if status & STATUS_DIFFERENT_NAME != 0 {
                Some(data.get_b_varchar()?)
            } else {
                None
            };

            columns.push(ColInfoEntry {
                column,
                table,
                status,
                column_name,
            });
        }

        Ok(Self { columns })
    }
}
