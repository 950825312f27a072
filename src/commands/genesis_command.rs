use crate::{
    KeyPair, OutputIndex, SnapshotEncoding, Transaction, TransactionOutput, Utxo, UtxoPool,
};
use clap::{App, Arg, ArgMatches};
use std::error::Error;
use std::fs;
use std::path::PathBuf;
use tracing::info;

const MIN_ACCOUNTS: u8 = 3;

struct GenesisCliOptions {
    out_dir: PathBuf,
    accounts: u8,
    amount: i64,
}

impl GenesisCliOptions {
    pub fn parse(matches: &ArgMatches) -> Result<Self, Box<dyn Error>> {
        let accounts = matches.value_of_t::<u8>("accounts")?;
        if accounts < MIN_ACCOUNTS {
            return Err(format!("At least {} accounts are required", MIN_ACCOUNTS).into());
        }
        let amount = matches.value_of_t::<i64>("amount")?;
        if amount < 2 {
            return Err("Amount must be at least 2 so that it can be split".into());
        }
        Ok(Self {
            out_dir: matches.value_of("out-dir").ok_or("Missing --out-dir")?.into(),
            accounts,
            amount,
        })
    }
}

pub fn genesis_command() -> App<'static> {
    App::new("genesis")
        .version("0.1")
        .about("Creates a genesis UTXO pool and a sample batch of transactions.")
        .arg(
            Arg::new("out-dir")
                .long("out-dir")
                .value_name("DIR")
                .help("Directory where pool.bin and batch.bin are written.")
                .takes_value(true)
                .required(true),
        )
        .arg(
            Arg::new("accounts")
                .long("accounts")
                .value_name("N")
                .help("Number of accounts funded by the genesis transaction.")
                .takes_value(true)
                .required(false)
                .default_value("3"),
        )
        .arg(
            Arg::new("amount")
                .long("amount")
                .value_name("AMOUNT")
                .help("Amount given to each account.")
                .takes_value(true)
                .required(false)
                .default_value("50"),
        )
}

pub fn run_genesis_command(matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let options = GenesisCliOptions::parse(matches)?;
    // Seeded keys, so that the same accounts come back on every run.
    let accounts = (1..=options.accounts)
        .map(|seed| KeyPair::from_seed([seed; 32]))
        .collect::<Vec<KeyPair>>();
    for (index, account) in accounts.iter().enumerate() {
        println!("account {}: {}", index, account.public_key());
    }

    let genesis = Transaction::new(
        vec![],
        accounts
            .iter()
            .map(|account| TransactionOutput::new(options.amount, account.public_key()))
            .collect(),
    )?;
    let pool = UtxoPool::from_genesis(&genesis);
    let batch = sample_batch(&genesis, &accounts)?;

    fs::create_dir_all(&options.out_dir)?;
    pool.write_to_file(&options.out_dir.join("pool.bin"))?;
    batch.write_to_file(&options.out_dir.join("batch.bin"))?;
    info!(
        "Wrote genesis pool with {} UTXOs and a batch of {} transactions to: {}",
        pool.len(),
        batch.len(),
        options.out_dir.display()
    );
    Ok(())
}

/// A batch where the first two transactions are valid, and each of the others breaks a rule.
///
/// Preconditions:
///   - There are at least 3 accounts and the genesis transaction funds each one of them.
fn sample_batch(genesis: &Transaction, accounts: &[KeyPair]) -> Result<Vec<Transaction>, String> {
    assert!(accounts.len() >= MIN_ACCOUNTS as usize);
    let (first, second, third) = (&accounts[0], &accounts[1], &accounts[2]);
    let first_utxo = Utxo::new(*genesis.id(), OutputIndex::new(0));
    let third_utxo = Utxo::new(*genesis.id(), OutputIndex::new(2));
    let amount = genesis.output(OutputIndex::new(0)).amount();
    let half = amount / 2;

    // The first account pays half to the second one, and keeps the change.
    let payment = Transaction::signed(
        &[(first_utxo, first)],
        vec![
            TransactionOutput::new(half, second.public_key()),
            TransactionOutput::new(amount - half, first.public_key()),
        ],
    )?;
    // The second account forwards the payment within the same epoch.
    let forward = Transaction::signed(
        &[(Utxo::new(*payment.id(), OutputIndex::new(0)), second)],
        vec![TransactionOutput::new(half, third.public_key())],
    )?;
    let double_spend = Transaction::signed(
        &[(first_utxo, first)],
        vec![TransactionOutput::new(amount, third.public_key())],
    )?;
    let forged = Transaction::signed(
        &[(third_utxo, second)],
        vec![TransactionOutput::new(
            genesis.output(OutputIndex::new(2)).amount(),
            second.public_key(),
        )],
    )?;
    let counterfeit = Transaction::signed(
        &[(third_utxo, third)],
        vec![TransactionOutput::new(
            genesis.output(OutputIndex::new(2)).amount() + 1,
            third.public_key(),
        )],
    )?;
    Ok(vec![payment, forward, double_spend, forged, counterfeit])
}
