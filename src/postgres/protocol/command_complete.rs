use bytes::Bytes;

use crate::error::Error;

/// Marks the end of one SQL command within a response. The command tag
/// carries the rows-affected count.
#[derive(Debug)]
pub(crate) struct CommandComplete {
    tag: String,
}

impl CommandComplete {
    pub(crate) fn get(buf: Bytes) -> Result<Self, Error> {
        let end = buf.len().saturating_sub(1); // strip the NUL
        let tag = String::from_utf8(buf[..end].to_vec())
            .map_err(|_| err_protocol!("command tag is not valid UTF-8"))?;

        Ok(Self { tag })
    }

    /// The trailing number of the tag: `SELECT 5`, `UPDATE 2`, `DELETE 0`,
    /// and the two-number form `INSERT <oid> <rows>`. Tags with no trailing
    /// number (`CREATE TABLE`, …) count as 0.
    pub(crate) fn rows_affected(&self) -> u64 {
        self.tag
            .rsplit(' ')
            .next()
            .and_then(|count| count.parse().ok())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(s: &'static str) -> CommandComplete {
        CommandComplete::get(Bytes::from_static(s.as_bytes())).unwrap()
    }

    #[test]
    fn it_parses_rows_affected() {
        assert_eq!(tag("SELECT 5\0").rows_affected(), 5);
        assert_eq!(tag("UPDATE 2\0").rows_affected(), 2);
        assert_eq!(tag("DELETE 0\0").rows_affected(), 0);
        // INSERT carries an oid before the row count
        assert_eq!(tag("INSERT 0 50\0").rows_affected(), 50);
        assert_eq!(tag("CREATE TABLE\0").rows_affected(), 0);
    }
}
