use std::error::Error;
use std::io::Write;
use std::path::Path;

use super::{apply, outcome};
use crate::{dto::Operation, stores::Store, Ledger};

/// Runs a batch of operations from the given input file against `ledger` and
/// writes one outcome row per operation to the provided writer.
///
/// Rows are written as operations complete, so when a fatal error aborts the
/// run every mutation already persisted has been reported.
///
/// # Arguments
/// * `ledger` - The ledger to apply operations to
/// * `input_path` - Path to the input CSV file containing operations
/// * `writer` - Where to write the outcome rows (e.g. stdout)
///
/// # Errors
/// Returns an error if:
/// * The input file cannot be read
/// * The CSV is malformed
/// * The backing store cannot be written
/// * Writing to the output fails
pub fn run<S, P, W>(
    ledger: &mut Ledger<S>,
    input_path: P,
    writer: W,
) -> Result<(), Box<dyn Error + Send + Sync>>
where
    S: Store,
    P: AsRef<Path>,
    W: Write,
{
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(input_path)?;
    let mut outcomes = csv::Writer::from_writer(writer);

    for (index, operation) in reader.deserialize::<Operation>().enumerate() {
        // CSV parsing errors are critical - propagate them
        let operation = operation?;
        let result = apply(ledger, &operation);
        outcomes.serialize(outcome(index + 1, &operation, result)?)?;
    }

    outcomes.flush()?;
    Ok(())
}
