pub(crate) mod col_info;
pub(crate) mod col_meta_data;
pub(crate) mod done;
pub(crate) mod env_change;
pub(crate) mod error;
pub(crate) mod feature_ext_ack;
pub(crate) mod info;
pub(crate) mod login;
pub(crate) mod login_ack;
pub(crate) mod message;
pub(crate) mod ntlm;
pub(crate) mod order;
pub(crate) mod packet;
pub(crate) mod pre_login;
pub(crate) mod return_status;
pub(crate) mod return_value;
pub(crate) mod row;
pub(crate) mod rpc;
pub(crate) mod sql_batch;
pub(crate) mod tab_name;
pub(crate) mod type_info;
