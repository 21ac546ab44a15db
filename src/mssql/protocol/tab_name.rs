use bytes::{Buf, Bytes};

use crate::error::Error;
use crate::mssql::io::MssqlBufExt;

/// `TABNAME` (0xA4): the table names referenced by a FOR BROWSE result.
#[derive(Debug)]
#[allow(dead_code)]
pub(crate) struct TabName {
    pub(crate) tables: Vec<String>,
}

impl TabName {
    pub(crate) fn get(buf: &mut Bytes) -> Result<Self, Error> {
        let len = buf.get_u16_le();
        let mut data = buf.split_to(len as usize);

        let mut tables = Vec::new();
        while !data.is_empty() {
            let parts = data.get_u8();
            let mut name = String::new();

            for i in 0..parts {
                if i > 0 {
                    name.push('.');
                }
                name.push_str(&data.get_us_varchar()?);
            }

            tables.push(name);
        }

        Ok(Self { tables })
    }
}
