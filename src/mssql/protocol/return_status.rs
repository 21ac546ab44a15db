use bytes::{Buf, Bytes};

use crate::error::Error;

/// `RETURNSTATUS` (0x79): the return code of an RPC.
#[derive(Debug)]
pub(crate) struct ReturnStatus {
    pub(crate) value: i32,
}

impl ReturnStatus {
    pub(crate) fn get(buf: &mut Bytes) -> Result<Self, Error> {
        Ok(Self {
            value: buf.get_i32_le(),
        })
    }
}
