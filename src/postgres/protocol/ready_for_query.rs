use bytes::Bytes;

use crate::error::Error;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) enum TransactionStatus {
    /// Not in a transaction block.
    Idle,

    /// In a transaction block.
    Transaction,

    /// In a _failed_ transaction block; queries are rejected until the
    /// block is ended.
    Error,
}

/// The terminal message of every simple-protocol response.
#[derive(Debug)]
pub(crate) struct ReadyForQuery {
    pub(crate) transaction_status: TransactionStatus,
}

impl ReadyForQuery {
    pub(crate) fn get(buf: Bytes) -> Result<Self, Error> {
        let status = match buf.first() {
            Some(b'I') => TransactionStatus::Idle,
            Some(b'T') => TransactionStatus::Transaction,
            Some(b'E') => TransactionStatus::Error,

            other => {
                return Err(err_protocol!(
                    "unknown transaction status {:?} in ReadyForQuery",
                    other
                ));
            }
        };

        Ok(Self {
            transaction_status: status,
        })
    }
}
