use bitflags::bitflags;
use bytes::{Buf, Bytes};

use crate::error::Error;
use crate::mssql::io::MssqlBufExt;
use crate::mssql::protocol::col_meta_data::Flags;
use crate::mssql::protocol::type_info::TypeInfo;
use crate::value::Value;

bitflags! {
    pub(crate) struct ReturnValueStatus: u8 {
        /// Corresponds to an OUTPUT parameter of a stored procedure.
        const OUTPUT_PARAM = 0x01;

        /// Corresponds to the return value of a user defined function.
        const USER_DEFINED = 0x02;
    }
}

/// `RETURNVALUE` (0xAC): an OUTPUT parameter coming back from an RPC.
#[allow(dead_code)]
#[derive(Debug)]
pub(crate) struct ReturnValue {
    pub(crate) param_ordinal: u16,
    pub(crate) param_name: String,
    pub(crate) status: ReturnValueStatus,
    pub(crate) user_type: u32,
    pub(crate) flags: Flags,
    pub(crate) value: Value,
}

impl ReturnValue {
    pub(crate) fn get(buf: &mut Bytes) -> Result<Self, Error> {
        let ordinal = buf.get_u16_le();
        let name = buf.get_b_varchar()?;
        let status = ReturnValueStatus::from_bits_truncate(buf.get_u8());
        let user_type = buf.get_u32_le();
        let flags = Flags::from_bits_truncate(buf.get_u16_le());
        let type_info = TypeInfo::get(buf)?;
        let value = type_info.get_value(buf)?;

        Ok(Self {
            param_ordinal: ordinal,
            param_name: name,
            status,
            user_type,
            flags,
            value,
        })
    }
}

#[test]
fn test_get() {
    #[rustfmt::skip]
    let mut buf = Bytes::from_static(&[
        0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0x26, 4, 4, 1, 0, 0, 0,
    ]);

    let return_value = ReturnValue::get(&mut buf).unwrap();

    assert_eq!(return_value.param_ordinal, 0);
    assert_eq!(return_value.param_name, "");
    assert!(return_value.status.contains(ReturnValueStatus::OUTPUT_PARAM));
    assert_eq!(return_value.value, Value::Int(1));
    assert!(buf.is_empty());
}
