use bytes::{Buf, Bytes};

use crate::error::Error as CrateError;

pub(crate) mod token {
    pub(crate) const COL_METADATA: u8 = 0x81;
    pub(crate) const ERROR: u8 = 0xaa;
    pub(crate) const INFO: u8 = 0xab;
    pub(crate) const RETURN_VALUE: u8 = 0xac;
    pub(crate) const LOGIN_ACK: u8 = 0xad;
    pub(crate) const FEATURE_EXT_ACK: u8 = 0xae;
    pub(crate) const ROW: u8 = 0xd1;
    pub(crate) const NBC_ROW: u8 = 0xd2;
    pub(crate) const ENV_CHANGE: u8 = 0xe3;
    pub(crate) const SSPI: u8 = 0xed;
    pub(crate) const RETURN_STATUS: u8 = 0x79;
    pub(crate) const TAB_NAME: u8 = 0xa4;
    pub(crate) const COL_INFO: u8 = 0xa5;
    pub(crate) const ORDER: u8 = 0xa9;
    pub(crate) const DONE: u8 = 0xfd;
    pub(crate) const DONE_PROC: u8 = 0xfe;
    pub(crate) const DONE_IN_PROC: u8 = 0xff;
}

/// The token kinds a response stream may carry.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) enum MessageType {
    ColMetaData,
    Error,
    Info,
    ReturnValue,
    LoginAck,
    FeatureExtAck,
    Row,
    NbcRow,
    EnvChange,
    Sspi,
    ReturnStatus,
    TabName,
    ColInfo,
    Order,
    Done,
    DoneProc,
    DoneInProc,
}

impl MessageType {
    pub(crate) fn get(buf: &mut Bytes) -> Result<Self, CrateError> {
        Ok(match buf.get_u8() {
            token::COL_METADATA => MessageType::ColMetaData,
            token::ERROR => MessageType::Error,
            token::INFO => MessageType::Info,
            token::RETURN_VALUE => MessageType::ReturnValue,
            token::LOGIN_ACK => MessageType::LoginAck,
            token::FEATURE_EXT_ACK => MessageType::FeatureExtAck,
            token::ROW => MessageType::Row,
            token::NBC_ROW => MessageType::NbcRow,
            token::ENV_CHANGE => MessageType::EnvChange,
            token::SSPI => MessageType::Sspi,
            token::RETURN_STATUS => MessageType::ReturnStatus,
            token::TAB_NAME => MessageType::TabName,
            token::COL_INFO => MessageType::ColInfo,
            token::ORDER => MessageType::Order,
            token::DONE => MessageType::Done,
            token::DONE_PROC => MessageType::DoneProc,
            token::DONE_IN_PROC => MessageType::DoneInProc,

            ty => {
                return Err(err_protocol!(
                    "unknown value `0x{:02x?}` for message type in token stream",
                    ty
                ));
            }
        })
    }
}
