use bytes::{Buf, Bytes};

use crate::column::Column;
use crate::error::Error;
use crate::mysql::io::MySqlBufExt;

// column character set 63 marks binary data
pub(crate) const BINARY_COLLATION: u16 = 63;

bitflags::bitflags! {
    // https://dev.mysql.com/doc/dev/mysql-server/8.0.12/group__group__cs__column__definition__flags.html
    pub(crate) struct ColumnFlags: u16 {
        const NOT_NULL = 1;
        const PRIMARY_KEY = 2;
        const UNIQUE_KEY = 4;
        const MULTIPLE_KEY = 8;
        const BLOB = 16;
        const UNSIGNED = 32;
        const ZEROFILL = 64;
        const BINARY = 128;
        const ENUM = 256;
        const AUTO_INCREMENT = 512;
        const TIMESTAMP = 1024;
        const SET = 2048;
        const NO_DEFAULT_VALUE = 4096;
        const ON_UPDATE_NOW = 8192;
        const NUM = 32768;
    }
}

/// Column definition packet of a result-set header.
///
/// <https://dev.mysql.com/doc/dev/mysql-server/8.0.12/page_protocol_com_query_response_text_resultset_column_definition.html>
#[derive(Debug)]
pub(crate) struct ColumnDefinition {
    pub(crate) table: Option<String>,
    pub(crate) name: String,
    pub(crate) charset: u16,
    pub(crate) type_code: u8,
    pub(crate) flags: ColumnFlags,
    pub(crate) decimals: u8,
}

impl ColumnDefinition {
    pub(crate) fn get(mut buf: Bytes) -> Result<Self, Error> {
        let _catalog = buf.get_str_lenenc()?; // always "def"
        let _schema = buf.get_str_lenenc()?;
        let table = buf.get_str_lenenc()?.filter(|t| !t.is_empty());
        let _org_table = buf.get_str_lenenc()?;
        let name = buf.get_str_lenenc()?.unwrap_or_default();
        let _org_name = buf.get_str_lenenc()?;

        // length of the fixed-length fields; always 0x0c
        let _fixed_len = buf.get_uint_lenenc()?;

        let charset = buf.get_u16_le();
        let _max_column_size = buf.get_u32_le();
        let type_code = buf.get_u8();
        let flags = ColumnFlags::from_bits_truncate(buf.get_u16_le());
        let decimals = buf.get_u8();

        Ok(Self {
            table,
            name,
            charset,
            type_code,
            flags,
            decimals,
        })
    }

    pub(crate) fn to_column(&self) -> Column {
        let mut column = Column::new(self.name.clone(), self.type_code.into());
        column.table = self.table.clone();
        column.scale = self.decimals;
        column
    }
}
