//! pin-ledger CLI
//!
//! Usage:
//! ```bash
//! pin-ledger create --name Alice --email a@x.com --phone 9876543210 --pin 1234
//! pin-ledger deposit ABCD1234 100 --pin 1234
//! pin-ledger withdraw ABCD1234 40 --pin 1234
//! pin-ledger view ABCD1234 --pin 1234
//! pin-ledger batch operations.csv --async > outcomes.csv
//! ```

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::io;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

use pin_ledger::{Account, JsonFileStore, Ledger, LedgerHandle, StoreError};

/// Account ledger with PIN-gated deposits and withdrawals
#[derive(Parser)]
#[command(name = "pin-ledger")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Backing JSON document
    #[arg(long, env = "PIN_LEDGER_DATA", default_value = "data.json", global = true)]
    data: PathBuf,

    /// Write logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open a new account and print its number
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        /// 10 digits
        #[arg(long)]
        phone: String,
        /// 4 digits
        #[arg(long)]
        pin: String,
    },

    /// Deposit money into an account
    Deposit {
        account: String,
        amount: Decimal,
        #[arg(long)]
        pin: String,
    },

    /// Withdraw money from an account
    Withdraw {
        account: String,
        amount: Decimal,
        #[arg(long)]
        pin: String,
    },

    /// Show account details
    View {
        account: String,
        #[arg(long)]
        pin: String,
    },

    /// Replace name, email and phone
    Update {
        account: String,
        #[arg(long)]
        pin: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: String,
    },

    /// Close an account
    Delete {
        account: String,
        #[arg(long)]
        pin: String,
    },

    /// Apply a CSV file of operations, writing outcome rows to stdout
    Batch {
        input: PathBuf,
        /// Stream the file through the async runner
        #[arg(long = "async")]
        use_async: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    if let Err(err) = run(cli) {
        eprintln!("Error: {:#}", err);
        process::exit(exit_code(&err));
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // stdout is reserved for command output.
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false);
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

/// Corrupt or unwritable storage needs an operator; everything else is a
/// user mistake.
fn exit_code(err: &anyhow::Error) -> i32 {
    if err.chain().any(|cause| cause.is::<StoreError>()) {
        2
    } else {
        1
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut ledger = Ledger::open(JsonFileStore::new(&cli.data))
        .with_context(|| format!("cannot open ledger at {}", cli.data.display()))?;

    match cli.command {
        Commands::Create {
            name,
            email,
            phone,
            pin,
        } => {
            let account = ledger.create_account(&name, &email, &phone, &pin)?;
            println!("Account created. Your account number: {}", account.account_number);
            print_account(&account);
        }

        Commands::Deposit {
            account,
            amount,
            pin,
        } => {
            let account = ledger.deposit(&account, &pin, amount)?;
            println!("Deposit successful. Balance: {}", account.balance);
        }

        Commands::Withdraw {
            account,
            amount,
            pin,
        } => {
            let account = ledger.withdraw(&account, &pin, amount)?;
            println!("Withdrawal successful. Balance: {}", account.balance);
        }

        Commands::View { account, pin } => {
            print_account(&ledger.view_account(&account, &pin)?);
        }

        Commands::Update {
            account,
            pin,
            name,
            email,
            phone,
        } => {
            let account = ledger.update_account(&account, &pin, &name, &email, &phone)?;
            println!("Account updated.");
            print_account(&account);
        }

        Commands::Delete { account, pin } => {
            ledger.delete_account(&account, &pin)?;
            println!("Account {} deleted.", account);
        }

        Commands::Batch { input, use_async } => {
            if use_async {
                let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
                runtime.block_on(async {
                    let (handle, task) = LedgerHandle::spawn(ledger);
                    pin_ledger::run_async(handle, &input, io::stdout())
                        .await
                        .map_err(|e| anyhow!(e))?;
                    task.await?;
                    Ok::<_, anyhow::Error>(())
                })?;
            } else {
                pin_ledger::run(&mut ledger, &input, io::stdout().lock()).map_err(|e| anyhow!(e))?;
            }
        }
    }

    Ok(())
}

fn print_account(account: &Account) {
    println!("Name:    {}", account.name);
    println!("Email:   {}", account.email);
    println!("Phone:   {}", account.phone);
    println!("Account: {}", account.account_number);
    println!("Balance: {}", account.balance);
}
