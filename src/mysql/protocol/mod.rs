pub(crate) mod auth;
pub(crate) mod column_def;
pub(crate) mod eof;
pub(crate) mod err;
pub(crate) mod handshake;
pub(crate) mod handshake_response;
pub(crate) mod ok;
pub(crate) mod row;
pub(crate) mod ssl_request;
pub(crate) mod text;

use bitflags::bitflags;

bitflags! {
    // https://dev.mysql.com/doc/dev/mysql-server/8.0.12/group__group__cs__capabilities__flags.html
    // https://mariadb.com/kb/en/connection/#capabilities
    pub(crate) struct Capabilities: u64 {
        // assumed on modern servers; doubles as MariaDB's CLIENT_MYSQL marker
        const LONG_PASSWORD = 1;

        const FOUND_ROWS = 2;

        // get all column flags
        const LONG_FLAG = 4;

        // database name can be specified on connect in the handshake response
        const CONNECT_WITH_DB = 8;

        const NO_SCHEMA = 16;
        const COMPRESS = 32;
        const ODBC = 64;
        const LOCAL_FILES = 128;
        const IGNORE_SPACE = 256;

        const PROTOCOL_41 = 512;

        const INTERACTIVE = 1024;
        const SSL = 2048;
        const TRANSACTIONS = 8192;
        const SECURE_CONNECTION = (1 << 15);

        const MULTI_STATEMENTS = (1 << 16);
        const MULTI_RESULTS = (1 << 17);
        const PS_MULTI_RESULTS = (1 << 18);

        const PLUGIN_AUTH = (1 << 19);
        const CONNECT_ATTRS = (1 << 20);
        const PLUGIN_AUTH_LENENC_DATA = (1 << 21);
        const CAN_HANDLE_EXPIRED_PASSWORDS = (1 << 22);
        const SESSION_TRACK = (1 << 23);

        // the EOF packet is gone; result sets end with an OK packet
        const DEPRECATE_EOF = (1 << 24);

        const ZSTD_COMPRESSION_ALGORITHM = (1 << 26);
        const SSL_VERIFY_SERVER_CERT = (1 << 30);
        const OPTIONAL_RESULTSET_METADATA = (1 << 25);
        const REMEMBER_OPTIONS = (1 << 31);
    }
}

bitflags! {
    // https://dev.mysql.com/doc/dev/mysql-server/8.0.12/mysql__com_8h.html
    pub(crate) struct Status: u16 {
        const SERVER_STATUS_IN_TRANS = 1;
        const SERVER_STATUS_AUTOCOMMIT = 2;

        // set when a multi-statement response has more result sets coming
        const SERVER_MORE_RESULTS_EXISTS = 8;

        const SERVER_QUERY_NO_GOOD_INDEX_USED = 16;
        const SERVER_QUERY_NO_INDEX_USED = 32;
        const SERVER_STATUS_CURSOR_EXISTS = 64;
        const SERVER_STATUS_LAST_ROW_SENT = 128;
        const SERVER_STATUS_DB_DROPPED = 256;
        const SERVER_STATUS_NO_BACKSLASH_ESCAPES = 512;
        const SERVER_SESSION_STATE_CHANGED = (1 << 14);
    }
}
