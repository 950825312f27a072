pub mod commands;
pub mod hash;
pub mod public_key;
pub mod signature_verifier;
pub mod snapshot;
pub mod transaction;
pub mod tx_handler;
pub mod utxo_pool;

pub use self::{
    hash::*, public_key::*, signature_verifier::*, snapshot::*, transaction::*, tx_handler::*,
    utxo_pool::*,
};
