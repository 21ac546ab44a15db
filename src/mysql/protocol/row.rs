use bytes::Bytes;

use crate::error::Error;
use crate::mysql::io::MySqlBufExt;

/// One text-resultset row: a length-encoded string per column, with `0xFB`
/// standing in for NULL.
#[derive(Debug)]
pub(crate) struct TextRow {
    pub(crate) values: Vec<Option<Bytes>>,
}

impl TextRow {
    pub(crate) fn get(mut buf: Bytes, columns: usize) -> Result<Self, Error> {
        let mut values = Vec::with_capacity(columns);

        for _ in 0..columns {
            values.push(buf.get_bytes_lenenc()?);
        }

        Ok(Self { values })
    }
}

#[test]
fn it_decodes_a_text_row() {
    // "42" | NULL | "abc"
    let buf = Bytes::from_static(b"\x0242\xfb\x03abc");
    let row = TextRow::get(buf, 3).unwrap();

    assert_eq!(row.values[0].as_deref(), Some(&b"42"[..]));
    assert_eq!(row.values[1], None);
    assert_eq!(row.values[2].as_deref(), Some(&b"abc"[..]));
}
