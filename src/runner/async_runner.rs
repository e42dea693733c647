use std::error::Error;
use std::io::Write;
use std::path::Path;

use super::{apply, outcome};
use crate::{dto::Operation, stores::Store, LedgerHandle};

use csv_async::{AsyncReaderBuilder, Error as CsvError, Trim};
use tokio::fs::File;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;

const BUFFER_SIZE: usize = 1024;

type Result<T, E = Box<dyn Error + Send + Sync>> = std::result::Result<T, E>;

/// Runs a batch of operations async through a ledger handle and writes the
/// outcome rows to the provided writer.
/// Spawns a CSV reader task that streams operations from the input file,
/// deserializes them and sends them back via channel. Each received operation
/// is submitted to the ledger task in order and its row written as soon as
/// the ledger answers.
///
/// Other holders of the same handle may interleave their own calls between
/// batch rows; each row is still applied atomically.
///
/// # Arguments
/// * `handle` - Handle to a running ledger task
/// * `input_path` - Path to the input CSV file containing operations
/// * `writer` - Where to write the outcome rows (e.g. stdout)
///
/// # Errors
/// Returns an error if:
/// * The input file cannot be read
/// * The CSV is malformed
/// * The backing store cannot be written, or the ledger task is gone
/// * Writing to the output fails
pub async fn run<S, P, W>(handle: LedgerHandle<S>, input_path: P, writer: W) -> Result<()>
where
    S: Store + Send + 'static,
    P: AsRef<Path>,
    W: Write,
{
    // Create channel for passing operations from reader to processor
    let (tx, mut rx) = mpsc::channel(BUFFER_SIZE);
    let input_path = input_path.as_ref().to_owned();

    let reader_handle = tokio::spawn(read_operations(input_path, tx));

    let mut outcomes = csv::Writer::from_writer(writer);
    let mut row = 0;
    while let Some(operation) = rx.recv().await {
        row += 1;
        let submitted = operation.clone();
        let result = handle
            .call(move |ledger| Ok(apply(ledger, &submitted)))
            .await?;
        outcomes.serialize(outcome(row, &operation, result)?)?;
    }
    outcomes.flush()?;

    // The channel closes early only if the reader failed
    reader_handle.await??;
    Ok(())
}

/// Reads and deserializes operations from a CSV file.
/// Returns them through the provided channel.
async fn read_operations(
    input_path: impl AsRef<Path> + Send,
    tx: mpsc::Sender<Operation>,
) -> Result<(), CsvError> {
    let file = File::open(input_path).await?;
    let mut csv_reader = AsyncReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .create_deserializer(file);

    let mut records = csv_reader.deserialize::<Operation>();
    while let Some(result) = records.next().await {
        match result {
            Ok(operation) => {
                if tx.send(operation).await.is_err() {
                    // Receiver dropped, exit gracefully
                    break;
                }
            }
            // CSV parsing errors are critical - propagate them
            Err(e) => return Err(e),
        }
    }
    Ok(())
}
