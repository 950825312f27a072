use clap::{App, AppSettings};
use std::env;
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    let filter = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let matches = App::new("coinledger")
        .about("Validates transactions and applies them to a UTXO pool, one epoch at a time.")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommand(coinledger_lib::commands::genesis_command())
        .subcommand(coinledger_lib::commands::epoch_command())
        .subcommand(coinledger_lib::commands::inspect_command())
        .get_matches();

    if let Some(matches) = matches.subcommand_matches("genesis") {
        coinledger_lib::commands::run_genesis_command(matches)
    } else if let Some(matches) = matches.subcommand_matches("epoch") {
        coinledger_lib::commands::run_epoch_command(matches)
    } else if let Some(matches) = matches.subcommand_matches("inspect") {
        coinledger_lib::commands::run_inspect_command(matches)
    } else {
        panic!("Should report help.");
    }
}
