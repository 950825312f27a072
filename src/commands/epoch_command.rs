use crate::{SnapshotEncoding, Transaction, TxHandler, UtxoPool};
use clap::{App, Arg, ArgMatches};
use std::error::Error;
use std::path::PathBuf;
use tracing::info;

struct EpochCliOptions {
    pool: PathBuf,
    batch: PathBuf,
    out: PathBuf,
}

impl EpochCliOptions {
    pub fn parse(matches: &ArgMatches) -> Result<Self, Box<dyn Error>> {
        let pool: PathBuf = matches.value_of("pool").ok_or("Missing --pool")?.into();
        let batch = matches.value_of("batch").ok_or("Missing --batch")?.into();
        // The advanced pool replaces the input snapshot unless told otherwise.
        let out = matches
            .value_of("out")
            .map(PathBuf::from)
            .unwrap_or_else(|| pool.clone());
        Ok(Self { pool, batch, out })
    }
}

pub fn epoch_command() -> App<'static> {
    App::new("epoch")
        .version("0.1")
        .about("Validates a batch of transactions and applies the accepted ones to the pool.")
        .arg(
            Arg::new("pool")
                .long("pool")
                .value_name("FILE")
                .help("UTXO pool snapshot at the start of the epoch.")
                .takes_value(true)
                .required(true),
        )
        .arg(
            Arg::new("batch")
                .long("batch")
                .value_name("FILE")
                .help("Candidate transactions, evaluated in the order they are stored.")
                .takes_value(true)
                .required(true),
        )
        .arg(
            Arg::new("out")
                .long("out")
                .value_name("FILE")
                .help("Where to write the advanced pool. Defaults to the --pool file.")
                .takes_value(true)
                .required(false),
        )
}

pub fn run_epoch_command(matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let options = EpochCliOptions::parse(matches)?;
    let pool = UtxoPool::read_from_file(&options.pool)?;
    let batch = Vec::<Transaction>::read_from_file(&options.batch)?;
    info!(
        "Loaded {} UTXOs and {} candidate transactions",
        pool.len(),
        batch.len()
    );

    let mut handler = TxHandler::new(&pool);
    let summary = handler.process_epoch(batch)?;
    for transaction in &summary.accepted {
        println!("accepted {}", transaction.id());
    }
    for (id, rejection) in &summary.rejected {
        println!("rejected {}: {}", id, rejection);
    }
    println!(
        "Consumed value: {}. Created value: {}. Fees: {}",
        summary.consumed_value,
        summary.created_value,
        summary.consumed_value - summary.created_value
    );

    handler.into_utxo_pool().write_to_file(&options.out)?;
    info!("Wrote the advanced pool to: {}", options.out.display());
    Ok(())
}
