use bitflags::bitflags;
use bytes::{Buf, Bytes};

use crate::error::Error;

bitflags! {
    pub(crate) struct Status: u16 {
        /// More response data follows this DONE.
        const DONE_MORE = 0x0001;

        /// The statement ended in error.
        const DONE_ERROR = 0x0002;

        /// A transaction is in progress.
        const DONE_INXACT = 0x0004;

        /// The row count field is valid.
        const DONE_COUNT = 0x0010;

        /// The request was killed by ATTENTION.
        const DONE_ATTN = 0x0020;

        const DONE_SRVERROR = 0x0100;
    }
}

/// `DONE` (0xFD) / `DONEPROC` (0xFE) / `DONEINPROC` (0xFF): the completion
/// of one statement (or procedure) within a response.
#[allow(dead_code)]
#[derive(Debug)]
pub(crate) struct Done {
    pub(crate) status: Status,
    pub(crate) cur_cmd: u16,
    pub(crate) affected_rows: u64,
}

impl Done {
    pub(crate) fn get(buf: &mut Bytes) -> Result<Self, Error> {
        Ok(Self {
            status: Status::from_bits_truncate(buf.get_u16_le()),
            cur_cmd: buf.get_u16_le(),
            affected_rows: buf.get_u64_le(),
        })
    }

    pub(crate) fn is_final(&self) -> bool {
        !self.status.contains(Status::DONE_MORE)
    }

    pub(crate) fn rows(&self) -> u64 {
        if self.status.contains(Status::DONE_COUNT) {
            self.affected_rows
        } else {
            0
        }
    }
}

#[test]
fn it_decodes_done() {
    // DONE_MORE | DONE_COUNT, row count 5
    let mut buf = Bytes::from_static(&[0x11, 0, 0xc1, 0, 5, 0, 0, 0, 0, 0, 0, 0]);

    let done = Done::get(&mut buf).unwrap();
    assert!(done.status.contains(Status::DONE_MORE));
    assert_eq!(done.rows(), 5);
    assert!(!done.is_final());
}
