use crate::value::Value;

/// Renders a bind value as an SQLite literal. SQLite has no boolean type;
/// booleans become the integers 1/0.
pub(super) fn literal(value: &Value) -> String {
    match value {
        Value::Null => String::from("NULL"),

        Value::Bool(true) => String::from("1"),
        Value::Bool(false) => String::from("0"),

        Value::TinyInt(v) => v.to_string(),
        Value::SmallInt(v) => v.to_string(),
        Value::Int(v) => v.to_string(),
        Value::BigInt(v) => v.to_string(),

        Value::Float(v) => v.to_string(),
        Value::Double(v) => v.to_string(),
        Value::Decimal(v) => v.to_string(),

        Value::Text(s) => quote(s),

        Value::Bytes(b) => format!("X'{}'", hex::encode_upper(b)),

        Value::Uuid(u) => format!("'{}'", u),

        Value::Timestamp(ts) => format!("'{}'", ts.format("%Y-%m-%d %H:%M:%S%.6f")),
    }
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');

    for ch in s.chars() {
        if ch == '\'' {
            out.push('\'');
        }
        out.push(ch);
    }

    out.push('\'');
    out
}

#[test]
fn literals_follow_sqlite_rules() {
    assert_eq!(literal(&Value::Bool(true)), "1");
    assert_eq!(literal(&Value::Text("it's".into())), "'it''s'");
    assert_eq!(literal(&Value::Bytes(vec![0xde, 0xad])), "X'DEAD'");
}
