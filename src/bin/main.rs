// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

use chrono::{Local, NaiveDate};
use clap::Parser;
use csv::{ReaderBuilder, Trim, Writer};
use lending_demo_rs::demo::demo_records;
use lending_demo_rs::{
    BookId, BorrowRecord, BorrowerId, Engine, FileStore, KeyValueStore, LendingPolicy,
    MemoryStore, RecordId, UserRole, policy,
};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::PathBuf;
use std::process;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Lending Engine - Replay lending event CSV files
///
/// Reads borrow/return/renew events from a CSV file, applies them to the
/// record store, and writes every borrow record to stdout.
#[derive(Parser, Debug)]
#[command(name = "lending-demo-rs")]
#[command(about = "A lending engine that replays borrow/return/renew CSVs", long_about = None)]
struct Args {
    /// Path to CSV file with lending events
    ///
    /// Expected format: op,date,borrower,role,book,record
    /// Example: cargo run -- events.csv > records.csv
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Directory holding the key-value store; in-memory when omitted
    #[arg(long, env = "LENDING_STORE_DIR", value_name = "DIR")]
    store_dir: Option<PathBuf>,

    /// Seed demo records (dated from today) when the store is empty
    #[arg(long)]
    seed: bool,

    /// Days a loan or renewal runs before it is due
    #[arg(long, env = "LENDING_LOAN_PERIOD_DAYS", default_value_t = policy::LOAN_PERIOD_DAYS)]
    loan_period_days: u32,

    /// Renewals allowed per loan
    #[arg(long, env = "LENDING_MAX_RENEWALS", default_value_t = policy::MAX_RENEWALS)]
    max_renewals: u32,
}

impl Args {
    fn policy(&self) -> LendingPolicy {
        LendingPolicy {
            loan_period_days: self.loan_period_days,
            max_renewals: self.max_renewals,
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let file = match File::open(&args.input) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error opening file '{}': {}", args.input.display(), e);
            process::exit(1);
        }
    };

    let result = match &args.store_dir {
        Some(dir) => match FileStore::open(dir) {
            Ok(store) => run(&args, store, BufReader::new(file)),
            Err(e) => {
                eprintln!("Error opening store '{}': {}", dir.display(), e);
                process::exit(1);
            }
        },
        None => run(&args, MemoryStore::new(), BufReader::new(file)),
    };

    if let Err(e) = result {
        eprintln!("Error processing events: {}", e);
        process::exit(1);
    }
}

fn run<S: KeyValueStore, R: Read>(args: &Args, store: S, reader: R) -> Result<(), csv::Error> {
    let engine = Engine::with_policy(store, args.policy());
    if args.seed && engine.store().seed_if_empty(&demo_records(Local::now().date_naive())) {
        info!("seeded demo borrow records");
    }
    process_events(&engine, reader)?;
    write_records(&engine, std::io::stdout())
}

/// Lending operation named in the `op` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Op {
    Borrow,
    Return,
    Renew,
}

/// Raw CSV row matching the input format.
///
/// Fields: `op, date, borrower, role, book, record`
#[derive(Debug, Deserialize)]
struct EventRow {
    op: Op,
    date: NaiveDate,
    #[serde(deserialize_with = "csv::invalid_option")]
    borrower: Option<String>,
    #[serde(deserialize_with = "csv::invalid_option")]
    role: Option<String>,
    #[serde(deserialize_with = "csv::invalid_option")]
    book: Option<u32>,
    #[serde(deserialize_with = "csv::invalid_option")]
    record: Option<u64>,
}

/// Apply one event row to the engine.
///
/// Returns a description of why the event was not applied.
fn apply<S: KeyValueStore>(engine: &Engine<S>, row: EventRow) -> Result<RecordId, String> {
    match row.op {
        Op::Borrow => {
            let borrower = row
                .borrower
                .filter(|b| !b.is_empty())
                .ok_or("borrow requires a borrower")?;
            let book = row.book.ok_or("borrow requires a book")?;
            let role = row.role.as_deref().map(UserRole::from).unwrap_or_default();
            engine
                .borrow(&BorrowerId::new(borrower), BookId(book), role, row.date)
                .map(|record| record.id())
                .map_err(|e| e.to_string())
        }
        Op::Return => {
            let record = row.record.ok_or("return requires a record")?;
            engine
                .return_book(RecordId(record), row.date)
                .map(|record| record.id())
                .map_err(|e| e.to_string())
        }
        Op::Renew => {
            let record = row.record.ok_or("renew requires a record")?;
            engine
                .renew(RecordId(record), row.date)
                .map(|record| record.id())
                .map_err(|e| e.to_string())
        }
    }
}

/// Process lending events from a CSV reader.
///
/// Rows are applied in order. Malformed rows and rejected events are logged
/// and skipped; they never stop processing.
///
/// # CSV Format
///
/// Expected columns: `op, date, borrower, role, book, record`
/// - `op`: `borrow`, `return`, or `renew`
/// - `date`: Event date (`YYYY-MM-DD`)
/// - `borrower`: Borrower account (borrow only)
/// - `role`: `student` or `faculty` (borrow only, defaults to student)
/// - `book`: Book ID (borrow only)
/// - `record`: Borrow record ID (return and renew)
///
/// # Example
///
/// ```csv
/// op,date,borrower,role,book,record
/// borrow,2024-01-01,U1,student,1,
/// renew,2024-01-20,,,,1
/// return,2024-02-10,,,,1
/// ```
///
/// # Errors
///
/// Returns a CSV error if the reader fails or the CSV structure is invalid.
fn process_events<S: KeyValueStore, R: Read>(
    engine: &Engine<S>,
    reader: R,
) -> Result<(), csv::Error> {
    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .has_headers(true)
        .from_reader(reader);

    for (line, result) in rdr.deserialize::<EventRow>().enumerate() {
        match result {
            Ok(row) => {
                let op = row.op;
                match apply(engine, row) {
                    Ok(record) => info!(?op, %record, "event applied"),
                    Err(reason) => warn!(?op, line = line + 2, %reason, "skipping event"),
                }
            }
            Err(e) => {
                warn!(error = %e, "skipping malformed row");
                continue;
            }
        }
    }

    Ok(())
}

/// Flat output row for one borrow record.
#[derive(Debug, Serialize)]
struct RecordRow<'a> {
    id: RecordId,
    book: BookId,
    borrower: &'a str,
    borrow_date: NaiveDate,
    due_date: NaiveDate,
    status: &'static str,
    return_date: Option<NaiveDate>,
    renewals: u32,
}

impl<'a> From<&'a BorrowRecord> for RecordRow<'a> {
    fn from(record: &'a BorrowRecord) -> Self {
        Self {
            id: record.id(),
            book: record.book_id(),
            borrower: record.borrower_id().as_str(),
            borrow_date: record.borrow_date(),
            due_date: record.due_date(),
            status: if record.is_active() { "borrowed" } else { "returned" },
            return_date: record.return_date(),
            renewals: record.renewal_count(),
        }
    }
}

/// Write every borrow record to a CSV writer.
///
/// # CSV Format
///
/// Columns: `id, book, borrower, borrow_date, due_date, status, return_date, renewals`
///
/// # Example
///
/// ```csv
/// id,book,borrower,borrow_date,due_date,status,return_date,renewals
/// 1,1,U1,2024-01-01,2024-02-19,returned,2024-02-10,1
/// ```
///
/// # Errors
///
/// Returns a CSV error if writing fails.
fn write_records<S: KeyValueStore, W: Write>(
    engine: &Engine<S>,
    writer: W,
) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);

    for record in &engine.records() {
        wtr.serialize(RecordRow::from(record))?;
    }

    wtr.flush()?;
    Ok(())
}
