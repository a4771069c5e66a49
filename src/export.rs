//! CSV dump of normalized trades.

use std::io::Write;

use csv::Writer;

use crate::error::{Error, Result};
use crate::normalize::NormalizedTrade;

const HEADER: [&str; 14] = [
    "name",
    "wallet_address",
    "event_slug",
    "price",
    "size",
    "cost",
    "event_time_utc",
    "event_time_local",
    "transaction_hash",
    "title",
    "outcome",
    "side",
    "asset",
    "condition_id",
];

pub struct CsvSink<W: Write> {
    writer: Writer<W>,
    rows: usize,
}

impl<W: Write> CsvSink<W> {
    /// Wraps `inner` and writes the header row.
    pub fn new(inner: W) -> Result<Self> {
        let mut writer = Writer::from_writer(inner);
        writer.write_record(HEADER)?;
        Ok(Self { writer, rows: 0 })
    }

    pub fn write_records(&mut self, records: &[NormalizedTrade]) -> Result<()> {
        for record in records {
            let optional = |v: &Option<String>| v.clone().unwrap_or_default();
            self.writer.write_record(&[
                record.name.clone(),
                record.wallet_address.clone(),
                record.event_slug.clone(),
                record.price.to_string(),
                record.size.to_string(),
                record.cost.to_string(),
                record.event_time_utc.to_rfc3339(),
                record.event_time_local.to_rfc3339(),
                optional(&record.transaction_hash),
                optional(&record.title),
                optional(&record.outcome),
                optional(&record.side),
                optional(&record.asset),
                optional(&record.condition_id),
            ])?;
            self.rows += 1;
        }
        Ok(())
    }

    /// Data rows written so far.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Flushes and hands back the underlying writer.
    pub fn finish(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| Error::Io(e.into_error()))
    }
}
