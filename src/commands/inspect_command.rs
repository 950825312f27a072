use crate::{Sha256, SnapshotEncoding, TransactionId, UtxoPool};
use clap::{App, Arg, ArgMatches};
use std::error::Error;
use std::path::PathBuf;

struct InspectCliOptions {
    pool: PathBuf,
    // Only the outputs of this transaction are printed, if set.
    transaction_id: Option<TransactionId>,
}

impl InspectCliOptions {
    pub fn parse(matches: &ArgMatches) -> Result<Self, Box<dyn Error>> {
        let transaction_id = match matches.value_of("transaction") {
            None => None,
            Some(hex) => Some(TransactionId::new(Sha256::from_hex(hex)?)),
        };
        Ok(Self {
            pool: matches.value_of("pool").ok_or("Missing --pool")?.into(),
            transaction_id,
        })
    }
}

pub fn inspect_command() -> App<'static> {
    App::new("inspect")
        .version("0.1")
        .about("Prints the unspent transaction outputs of a UTXO pool snapshot.")
        .arg(
            Arg::new("pool")
                .long("pool")
                .value_name("FILE")
                .help("UTXO pool snapshot to print.")
                .takes_value(true)
                .required(true),
        )
        .arg(
            Arg::new("transaction")
                .long("transaction")
                .value_name("ID")
                .help("Hex-encoded id of the transaction whose unspent outputs are printed.")
                .takes_value(true),
        )
}

pub fn run_inspect_command(matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let options = InspectCliOptions::parse(matches)?;
    let pool = UtxoPool::read_from_file(&options.pool)?;
    let mut utxos = pool
        .iter()
        .filter(|(utxo, _)| match &options.transaction_id {
            None => true,
            Some(transaction_id) => utxo.transaction_id() == transaction_id,
        })
        .collect::<Vec<_>>();
    // Sort by UTXO so that the output is stable across runs.
    utxos.sort_by(|(lhs, _), (rhs, _)| lhs.cmp(rhs));
    for (utxo, output) in utxos {
        println!("{}: {}", utxo, output);
    }
    println!("UTXOs: {}. Total value: {}", pool.len(), pool.total_value());
    Ok(())
}
