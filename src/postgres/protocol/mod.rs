pub(crate) mod authentication;
pub(crate) mod backend_key_data;
pub(crate) mod command_complete;
pub(crate) mod data_row;
pub(crate) mod parameter_status;
pub(crate) mod password;
pub(crate) mod query;
pub(crate) mod ready_for_query;
pub(crate) mod response;
pub(crate) mod row_description;
pub(crate) mod sasl;
pub(crate) mod ssl_request;
pub(crate) mod startup;
pub(crate) mod terminate;

use bytes::Bytes;

use crate::error::Error;

/// The tag byte of one backend message.
///
/// <https://www.postgresql.org/docs/current/protocol-message-formats.html>
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) enum MessageFormat {
    Authentication,
    BackendKeyData,
    BindComplete,
    CloseComplete,
    CommandComplete,
    CopyData,
    CopyDone,
    CopyInResponse,
    CopyOutResponse,
    DataRow,
    EmptyQueryResponse,
    ErrorResponse,
    NoData,
    NoticeResponse,
    NotificationResponse,
    ParameterDescription,
    ParameterStatus,
    ParseComplete,
    PortalSuspended,
    ReadyForQuery,
    RowDescription,
}

impl MessageFormat {
    pub(crate) fn try_from_u8(v: u8) -> Result<Self, Error> {
        Ok(match v {
            b'1' => MessageFormat::ParseComplete,
            b'2' => MessageFormat::BindComplete,
            b'3' => MessageFormat::CloseComplete,
            b'A' => MessageFormat::NotificationResponse,
            b'C' => MessageFormat::CommandComplete,
            b'D' => MessageFormat::DataRow,
            b'E' => MessageFormat::ErrorResponse,
            b'G' => MessageFormat::CopyInResponse,
            b'H' => MessageFormat::CopyOutResponse,
            b'I' => MessageFormat::EmptyQueryResponse,
            b'K' => MessageFormat::BackendKeyData,
            b'N' => MessageFormat::NoticeResponse,
            b'R' => MessageFormat::Authentication,
            b'S' => MessageFormat::ParameterStatus,
            b'T' => MessageFormat::RowDescription,
            b'Z' => MessageFormat::ReadyForQuery,
            b'c' => MessageFormat::CopyDone,
            b'd' => MessageFormat::CopyData,
            b'n' => MessageFormat::NoData,
            b's' => MessageFormat::PortalSuspended,
            b't' => MessageFormat::ParameterDescription,

            ty => {
                return Err(err_protocol!(
                    "unknown value `\\x{:02x}` for backend message tag",
                    ty
                ));
            }
        })
    }
}

/// One framed backend message: tag plus payload (length prefix stripped).
#[derive(Debug)]
pub(crate) struct Message {
    pub(crate) format: MessageFormat,
    pub(crate) contents: Bytes,
}
