use bytes::{Buf, Bytes};

use crate::error::Error;

/// `ORDER` (0xA9): the column ordinals an ORDER BY sorted on.
#[allow(dead_code)]
#[derive(Debug)]
pub(crate) struct Order {
    pub(crate) columns: Vec<u16>,
}

impl Order {
    pub(crate) fn get(buf: &mut Bytes) -> Result<Self, Error> {
        let len = buf.get_u16_le();
        let mut data = buf.split_to(len as usize);

        let mut columns = Vec::with_capacity(len as usize / 2);
        while data.len() >= 2 {
            columns.push(data.get_u16_le());
        }

        Ok(Self { columns })
    }
}
