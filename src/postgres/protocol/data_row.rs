use bytes::{Buf, Bytes};

use crate::error::Error;
use crate::io::BufExt;

/// One row of data; values are text-format bytes (or NULL).
#[derive(Debug)]
pub(crate) struct DataRow {
    pub(crate) values: Vec<Option<Bytes>>,
}

impl DataRow {
    pub(crate) fn get(mut buf: Bytes) -> Result<Self, Error> {
        let cnt = buf.get_u16();
        let mut values = Vec::with_capacity(cnt as usize);

        for _ in 0..cnt {
            let len = buf.get_i32();

            if len < 0 {
                values.push(None);
            } else {
                values.push(Some(buf.get_bytes(len as usize)?));
            }
        }

        Ok(Self { values })
    }
}

#[test]
fn it_decodes_data_row() {
    // 3 columns: "1", NULL, "2"
    #[rustfmt::skip]
    let buf = Bytes::from_static(&[
        0, 3,
        0, 0, 0, 1, b'1',
        0xff, 0xff, 0xff, 0xff,
        0, 0, 0, 1, b'2',
    ]);

    let row = DataRow::get(buf).unwrap();

    assert_eq!(row.values[0].as_deref(), Some(&b"1"[..]));
    assert_eq!(row.values[1], None);
    assert_eq!(row.values[2].as_deref(), Some(&b"2"[..]));
}
