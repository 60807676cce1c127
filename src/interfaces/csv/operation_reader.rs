use crate::domain::operation::{Operation, OperationRecord};
use crate::error::{LedgerError, Result};
use std::io::Read;

/// Reads ledger operations from a CSV source.
///
/// This reader wraps `csv::Reader` and provides an iterator over `Result<Operation>`.
/// It handles whitespace trimming and flexible record lengths automatically, so
/// `pay` rows may omit the trailing amount column.
pub struct OperationReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> OperationReader<R> {
    /// Creates a new `OperationReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Returns an iterator that lazily reads, deserializes and validates operations.
    pub fn operations(self) -> impl Iterator<Item = Result<Operation>> {
        self.reader.into_deserialize().map(|result| {
            let record: OperationRecord = result.map_err(LedgerError::from)?;
            Operation::try_from(record)
        })
    }
}
