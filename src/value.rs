// ABOUTME: Typed cell values read from the source database
// ABOUTME: Renders each value variant as a SQL literal for INSERT statements

use chrono::{DateTime, FixedOffset, Timelike};
use std::collections::HashMap;

/// One fetched record, keyed by column name
pub type Row = HashMap<String, SqlValue>;

/// A single cell value as handed over by a database driver
///
/// Drivers map their own types onto these variants before rows reach the
/// exporter.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    Bool(bool),
    Timestamp(DateTime<FixedOffset>),
    /// Raw bytes, emitted unquoted. Binary data containing quotes or control
    /// bytes yields invalid SQL.
    Bytes(Vec<u8>),
    /// Anything else, emitted as its quoted textual form without escaping
    Other(String),
}

impl SqlValue {
    /// Render the value as a SQL literal token
    ///
    /// # Examples
    ///
    /// ```
    /// # use sqldatadump::value::SqlValue;
    /// assert_eq!(SqlValue::Null.to_sql_literal(), "NULL");
    /// assert_eq!(SqlValue::Text("O'Brien".into()).to_sql_literal(), "'O''Brien'");
    /// assert_eq!(SqlValue::Bool(true).to_sql_literal(), "1");
    /// ```
    pub fn to_sql_literal(&self) -> String {
        match self {
            SqlValue::Null => "NULL".to_string(),
            SqlValue::Int(i) => i.to_string(),
            SqlValue::UInt(u) => u.to_string(),
            SqlValue::Float(f) => format!("{:.6}", f),
            SqlValue::Text(s) => format!("'{}'", s.replace('\'', "''")),
            SqlValue::Bool(true) => "1".to_string(),
            SqlValue::Bool(false) => "0".to_string(),
            SqlValue::Timestamp(ts) => format!("'{}'", render_timestamp(ts)),
            SqlValue::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
            SqlValue::Other(s) => format!("'{}'", s),
        }
    }
}

/// Fractional seconds as `.ddddddd` with trailing zeros dropped, or empty
///
/// Precision stops at 100ns, the finest SQL Server stores, so a value read
/// from a `datetime` column (rounded to milliseconds) keeps at most three
/// digits and anything else at most seven.
///
/// ```
/// # use sqldatadump::value::seconds_fraction;
/// assert_eq!(seconds_fraction(0), "");
/// assert_eq!(seconds_fraction(3_000_000), ".003");
/// assert_eq!(seconds_fraction(123_456_789), ".1234567");
/// ```
pub fn seconds_fraction(nanos: u32) -> String {
    // leap seconds carry nanos past 1e9
    let ticks = nanos % 1_000_000_000 / 100;
    if ticks == 0 {
        return String::new();
    }
    let digits = format!("{:07}", ticks);
    format!(".{}", digits.trim_end_matches('0'))
}

fn render_timestamp(ts: &DateTime<FixedOffset>) -> String {
    let offset = if ts.offset().local_minus_utc() == 0 {
        "Z".to_string()
    } else {
        ts.format("%:z").to_string()
    };

    format!(
        "{}{}{}",
        ts.format("%Y-%m-%dT%H:%M:%S"),
        seconds_fraction(ts.nanosecond()),
        offset
    )
}

macro_rules! impl_from_int {
    ($variant:ident, $wide:ty, $($t:ty),+) => {
        $(
            impl From<$t> for SqlValue {
                fn from(v: $t) -> Self {
                    SqlValue::$variant(v as $wide)
                }
            }
        )+
    };
}

impl_from_int!(Int, i64, i8, i16, i32, i64);
impl_from_int!(UInt, u64, u8, u16, u32, u64);

impl From<f32> for SqlValue {
    fn from(v: f32) -> Self {
        SqlValue::Float(v as f64)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::Float(v)
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(SqlValue::Null)
    }
}
