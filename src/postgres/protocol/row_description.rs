use bytes::{Buf, Bytes};

use crate::column::Column;
use crate::error::Error;
use crate::io::BufExt;

// type OID of `numeric`; its scale hides in the type modifier
const OID_NUMERIC: u32 = 1700;

/// Describes the columns of the rows that follow.
#[derive(Debug)]
pub(crate) struct RowDescription {
    pub(crate) columns: Vec<Column>,
}

impl RowDescription {
    pub(crate) fn get(mut buf: Bytes) -> Result<Self, Error> {
        let cnt = buf.get_u16();
        let mut columns = Vec::with_capacity(cnt as usize);

        for _ in 0..cnt {
            let name = buf.get_str_nul()?;
            let _relation_oid = buf.get_u32();
            let _attribute_no = buf.get_u16();
            let type_oid = buf.get_u32();
            let _type_size = buf.get_i16();
            let type_modifier = buf.get_i32();
            let _format = buf.get_u16();

            let mut column = Column::new(name, type_oid);

            if type_oid == OID_NUMERIC && type_modifier >= 4 {
                column.scale = ((type_modifier - 4) & 0xFFFF) as u8;
            }

            columns.push(column);
        }

        Ok(Self { columns })
    }
}

#[test]
fn it_decodes_row_description() {
    #[rustfmt::skip]
    let buf = Bytes::from_static(&[
        0, 2,
        b'i', b'd', 0,
        0, 0, 0x40, 1,          // relation oid
        0, 1,                   // attribute number
        0, 0, 0, 0x17,          // oid 23 (int4)
        0, 4,                   // size
        0xff, 0xff, 0xff, 0xff, // typmod -1
        0, 0,                   // text format
        b'p', b'r', b'i', b'c', b'e', 0,
        0, 0, 0x40, 1,
        0, 2,
        0, 0, 0x06, 0xa4,       // oid 1700 (numeric)
        0xff, 0xfe,
        0, 0x06, 0, 0x06,       // typmod: precision 6, scale 2 => (6 << 16) | (2 + 4)
        0, 0,
    ]);

    let rd = RowDescription::get(buf).unwrap();

    assert_eq!(rd.columns.len(), 2);
    assert_eq!(rd.columns[0].name(), "id");
    assert_eq!(rd.columns[0].type_id(), 23);
    assert_eq!(rd.columns[0].scale(), 0);
    assert_eq!(rd.columns[1].name(), "price");
    assert_eq!(rd.columns[1].type_id(), 1700);
    assert_eq!(rd.columns[1].scale(), 2);
}
