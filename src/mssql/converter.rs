// ABOUTME: SQL Server to SqlValue conversion
// ABOUTME: Maps every tiberius column type onto the exporter's value variants

use crate::value::{seconds_fraction, Row, SqlValue};
use anyhow::{Context, Result};
use chrono::{
    DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, SubsecRound, Timelike,
};
use tiberius::{ColumnData, FromSql};

/// Convert a single tiberius value to a `SqlValue`
///
/// - bit → Bool
/// - tinyint → UInt, smallint/int/bigint → Int
/// - real/float → Float
/// - char/varchar/nchar/nvarchar/text/xml → Text
/// - datetime/smalldatetime → Timestamp (UTC, rounded to milliseconds)
/// - datetime2 → Timestamp (UTC)
/// - datetimeoffset → Timestamp (with its offset)
/// - decimal/numeric → Bytes holding the exact decimal text, so it is
///   written unquoted
/// - binary/varbinary/image → Bytes
/// - uniqueidentifier/date/time → Other (quoted ISO text)
pub fn column_data_to_value(data: ColumnData<'static>) -> Result<SqlValue> {
    let value: SqlValue = match data {
        ColumnData::Bit(v) => v.into(),
        ColumnData::U8(v) => v.into(),
        ColumnData::I16(v) => v.into(),
        ColumnData::I32(v) => v.into(),
        ColumnData::I64(v) => v.into(),
        ColumnData::F32(v) => v.into(),
        ColumnData::F64(v) => v.into(),
        ColumnData::String(v) => v.map(|s| SqlValue::Text(s.into_owned())).into(),
        ColumnData::Xml(v) => v
            .map(|x| SqlValue::Text(x.into_owned().into_string()))
            .into(),
        ColumnData::Guid(v) => v.map(|g| SqlValue::Other(g.to_string())).into(),
        ColumnData::Binary(v) => v.map(|b| SqlValue::Bytes(b.into_owned())).into(),
        ColumnData::Numeric(v) => v
            .map(|n| SqlValue::Bytes(n.to_string().into_bytes()))
            .into(),
        // datetime ticks are 1/300 s; the column only takes 3 digits back
        ref data @ (ColumnData::DateTime(_) | ColumnData::SmallDateTime(_)) => {
            NaiveDateTime::from_sql(data)
                .context("Failed to decode datetime value")?
                .map(|dt| SqlValue::Timestamp(dt.round_subsecs(3).and_utc().fixed_offset()))
                .into()
        }
        ref data @ ColumnData::DateTime2(_) => NaiveDateTime::from_sql(data)
            .context("Failed to decode datetime2 value")?
            .map(|dt| SqlValue::Timestamp(dt.and_utc().fixed_offset()))
            .into(),
        ref data @ ColumnData::DateTimeOffset(_) => DateTime::<FixedOffset>::from_sql(data)
            .context("Failed to decode datetimeoffset value")?
            .map(SqlValue::Timestamp)
            .into(),
        ref data @ ColumnData::Date(_) => NaiveDate::from_sql(data)
            .context("Failed to decode date value")?
            .map(|d| SqlValue::Other(d.format("%Y-%m-%d").to_string()))
            .into(),
        ref data @ ColumnData::Time(_) => NaiveTime::from_sql(data)
            .context("Failed to decode time value")?
            .map(|t| {
                SqlValue::Other(format!(
                    "{}{}",
                    t.format("%H:%M:%S"),
                    seconds_fraction(t.nanosecond())
                ))
            })
            .into(),
    };

    Ok(value)
}

/// Convert a tiberius row into a name-keyed `Row`
///
/// `column_names` are the names reported by the result set, in column order.
pub fn row_to_values(row: tiberius::Row, column_names: &[String]) -> Result<Row> {
    let mut values = Row::with_capacity(column_names.len());

    for (name, data) in column_names.iter().zip(row.into_iter()) {
        let value = column_data_to_value(data)
            .with_context(|| format!("Failed to convert column '{}'", name))?;
        values.insert(name.clone(), value);
    }

    Ok(values)
}
