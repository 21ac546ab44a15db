use bytes::Bytes;

use crate::error::Error;
use crate::io::BufExt;

/// Reports the current setting of a backend parameter; sent at startup and
/// whenever a tracked setting changes.
#[derive(Debug)]
pub(crate) struct ParameterStatus {
    pub(crate) name: String,
    pub(crate) value: String,
}

impl ParameterStatus {
    pub(crate) fn get(mut buf: Bytes) -> Result<Self, Error> {
        Ok(Self {
            name: buf.get_str_nul()?,
            value: buf.get_str_nul()?,
        })
    }
}
