use bytes::{Buf, Bytes};

use crate::error::Error;

const TERMINATOR: u8 = 0xff;

/// `FEATUREEXTACK` (0xAE): acknowledgements of LOGIN7 feature extensions,
/// a list of (feature id, data) entries closed by 0xFF.
#[allow(dead_code)]
#[derive(Debug)]
pub(crate) struct FeatureExtAck {
    pub(crate) features: Vec<(u8, Bytes)>,
}

impl FeatureExtAck {
    pub(crate) fn get(buf: &mut Bytes) -> Result<Self, Error> {
        let mut features = Vec::new();

        loop {
            let id = buf.get_u8();
            if id == TERMINATOR {
                break;
            }

            let len = buf.get_u32_le();
            features.push((id, buf.split_to(len as usize)));
        }

        Ok(Self { features })
    }
}
