use bytes::{Buf, Bytes};

use crate::error::Error;

/// Secret-key data the frontend must save to issue cancel requests later.
#[derive(Debug)]
pub(crate) struct BackendKeyData {
    pub(crate) process_id: u32,
    pub(crate) secret_key: u32,
}

impl BackendKeyData {
    pub(crate) fn get(mut buf: Bytes) -> Result<Self, Error> {
        if buf.len() < 8 {
            return Err(err_protocol!("BackendKeyData is too short"));
        }

        Ok(Self {
            process_id: buf.get_u32(),
            secret_key: buf.get_u32(),
        })
    }
}
