use crate::io::Encode;
use crate::mssql::io::MssqlBufMutExt;
use crate::mssql::protocol::sql_batch::write_all_headers;
use crate::mssql::protocol::type_info;
use crate::value::Value;

/// Well-known procedure ids addressable without a name.
#[derive(Debug, Copy, Clone)]
pub(crate) enum ProcId {
    SpExecuteSql = 10,
}

#[derive(Debug)]
pub(crate) enum Procedure<'a> {
    Id(ProcId),
    Name(&'a str),
}

// parameter status flags
const STATUS_BY_REF: u8 = 0x01;

#[derive(Debug)]
pub(crate) struct RpcParam<'a> {
    /// TDS RPC requires `@name` form; empty for positional parameters.
    pub(crate) name: &'a str,
    pub(crate) value: Value,
    pub(crate) by_ref: bool,
}

/// An RPC request: either `sp_executesql` carrying a parameterised query,
/// or a named stored procedure.
#[derive(Debug)]
pub(crate) struct RpcRequest<'a> {
    pub(crate) transaction_descriptor: u64,
    pub(crate) procedure: Procedure<'a>,
    pub(crate) params: &'a [RpcParam<'a>],
}

impl RpcRequest<'_> {
    /// Builds the `sp_executesql` parameter list for `sql` with ordered
    /// binds: `@stmt`, `@params` (the declaration string), then the binds.
    pub(crate) fn execute_sql_params<'a>(
        sql: &'a str,
        binds: &[Value],
    ) -> Vec<RpcParam<'a>> {
        let declarations = binds
            .iter()
            .enumerate()
            .map(|(i, value)| format!("@p{} {}", i + 1, type_info::declaration(value)))
            .collect::<Vec<_>>()
            .join(",");

        let mut params = Vec::with_capacity(binds.len() + 2);

        params.push(RpcParam {
            name: "",
            value: Value::Text(sql.to_owned()),
            by_ref: false,
        });

        params.push(RpcParam {
            name: "",
            value: Value::Text(declarations),
            by_ref: false,
        });

        for value in binds {
            params.push(RpcParam {
                name: "",
                value: value.clone(),
                by_ref: false,
            });
        }

        params
    }
}

impl Encode for RpcRequest<'_> {
    fn encode(&self, buf: &mut Vec<u8>) {
        write_all_headers(buf, self.transaction_descriptor);

        match &self.procedure {
            Procedure::Id(id) => {
                // NameLenProcID: 0xFFFF selects the ProcID form
                buf.extend_from_slice(&0xffff_u16.to_le_bytes());
                buf.extend_from_slice(&(*id as u16).to_le_bytes());
            }

            Procedure::Name(name) => {
                buf.put_us_varchar(name);
            }
        }

        // OptionFlags
        buf.extend_from_slice(&0_u16.to_le_bytes());

        for param in self.params {
            buf.put_b_varchar(param.name);
            buf.push(if param.by_ref { STATUS_BY_REF } else { 0 });
            type_info::put_value(buf, &param.value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sp_executesql_request_shape() {
        let binds = vec![Value::Int(42)];
        let params = RpcRequest::execute_sql_params("SELECT @p1 AS v", &binds);

        assert_eq!(params.len(), 3);
        assert_eq!(params[1].value, Value::Text("@p1 int".into()));

        let mut buf = Vec::new();
        RpcRequest {
            transaction_descriptor: 0,
            procedure: Procedure::Id(ProcId::SpExecuteSql),
            params: &params,
        }
        .encode(&mut buf);

        // ALL_HEADERS (22) then 0xFFFF + proc id 10
        assert_eq!(&buf[22..24], &[0xff, 0xff]);
        assert_eq!(&buf[24..26], &10_u16.to_le_bytes());
    }

    #[test]
    fn declarations_cover_all_binds() {
        let binds = vec![Value::Int(1), Value::Text("x".into())];
        let params = RpcRequest::execute_sql_params("…", &binds);

        assert_eq!(
            params[1].value,
            Value::Text("@p1 int,@p2 nvarchar(4000)".into())
        );
    }
}
