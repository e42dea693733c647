//! Serialized access to a [`Ledger`] from concurrent callers.
//!
//! The ledger is moved into a single task that pulls jobs off a bounded
//! channel and answers each over a oneshot. Every read-mutate-persist
//! sequence therefore runs to completion before the next one starts.

use rust_decimal::Decimal;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::stores::{Account, Store};
use crate::{Error, Ledger};

const QUEUE_SIZE: usize = 1024;

type Job<S> = Box<dyn FnOnce(&mut Ledger<S>) + Send>;

pub struct LedgerHandle<S> {
    tx: mpsc::Sender<Job<S>>,
}

impl<S> Clone for LedgerHandle<S> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<S> LedgerHandle<S>
where
    S: Store + Send + 'static,
{
    /// Moves `ledger` onto its own task. The join handle yields the ledger
    /// back once every handle has been dropped.
    pub fn spawn(ledger: Ledger<S>) -> (Self, JoinHandle<Ledger<S>>) {
        let (tx, rx) = mpsc::channel(QUEUE_SIZE);
        let task = tokio::spawn(serve(ledger, rx));
        (Self { tx }, task)
    }

    /// Runs `f` against the ledger on the owning task and waits for its result.
    pub async fn call<T, F>(&self, f: F) -> Result<T, Error>
    where
        F: FnOnce(&mut Ledger<S>) -> Result<T, Error> + Send + 'static,
        T: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        let job: Job<S> = Box::new(move |ledger| {
            // The caller may have gone away; the job has still been applied.
            let _ = reply_tx.send(f(ledger));
        });
        self.tx.send(job).await.map_err(|_| Error::Closed)?;
        reply_rx.await.map_err(|_| Error::Closed)?
    }

    pub async fn create_account(
        &self,
        name: String,
        email: String,
        phone: String,
        pin: String,
    ) -> Result<Account, Error> {
        self.call(move |ledger| ledger.create_account(&name, &email, &phone, &pin))
            .await
    }

    pub async fn view_account(&self, number: String, pin: String) -> Result<Account, Error> {
        self.call(move |ledger| ledger.view_account(&number, &pin)).await
    }

    pub async fn deposit(&self, number: String, pin: String, amount: Decimal) -> Result<Account, Error> {
        self.call(move |ledger| ledger.deposit(&number, &pin, amount)).await
    }

    pub async fn withdraw(&self, number: String, pin: String, amount: Decimal) -> Result<Account, Error> {
        self.call(move |ledger| ledger.withdraw(&number, &pin, amount)).await
    }

    pub async fn update_account(
        &self,
        number: String,
        pin: String,
        name: String,
        email: String,
        phone: String,
    ) -> Result<Account, Error> {
        self.call(move |ledger| ledger.update_account(&number, &pin, &name, &email, &phone))
            .await
    }

    pub async fn delete_account(&self, number: String, pin: String) -> Result<(), Error> {
        self.call(move |ledger| ledger.delete_account(&number, &pin)).await
    }
}

async fn serve<S: Store>(mut ledger: Ledger<S>, mut rx: mpsc::Receiver<Job<S>>) -> Ledger<S> {
    while let Some(job) = rx.recv().await {
        job(&mut ledger);
    }
    debug!("all ledger handles dropped, stopping");
    ledger
}
