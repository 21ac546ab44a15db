use bytes::{Buf, Bytes};

use crate::error::{Error, ServerError};
use crate::io::BufExt;

/// The decoded body shared by `ErrorResponse` and `NoticeResponse`: a list
/// of single-letter field codes followed by their values.
///
/// <https://www.postgresql.org/docs/current/protocol-error-fields.html>
#[derive(Debug, Clone)]
pub struct PgNotice {
    pub severity: String,
    /// SQLSTATE.
    pub code: String,
    pub message: String,
    pub detail: Option<String>,
    pub hint: Option<String>,
}

impl PgNotice {
    pub(crate) fn get(mut buf: Bytes) -> Result<Self, Error> {
        let mut severity = String::new();
        let mut code = String::new();
        let mut message = String::new();
        let mut detail = None;
        let mut hint = None;

        loop {
            let field = buf.get_u8();
            if field == 0 {
                break;
            }

            let value = buf.get_str_nul()?;

            match field {
                // 'V' is the nonlocalized severity (9.6+); prefer it
                b'V' => severity = value,
                b'S' if severity.is_empty() => severity = value,
                b'C' => code = value,
                b'M' => message = value,
                b'D' => detail = Some(value),
                b'H' => hint = Some(value),

                _ => {}
            }
        }

        Ok(Self {
            severity,
            code,
            message,
            detail,
            hint,
        })
    }

    pub(crate) fn into_server_error(self) -> ServerError {
        ServerError {
            code: 0,
            message: self.message,
            state: Some(self.code),
        }
    }
}

#[test]
fn it_decodes_error_response() {
    let buf = Bytes::from_static(
        b"SERROR\0VERROR\0C42703\0Mcolumn \"nope\" does not exist\0P8\0\
          Fparse_relation.c\0L3514\0RerrorMissingColumn\0\0",
    );

    let notice = PgNotice::get(buf).unwrap();

    assert_eq!(notice.severity, "ERROR");
    assert_eq!(notice.code, "42703");
    assert_eq!(notice.message, "column \"nope\" does not exist");
}
