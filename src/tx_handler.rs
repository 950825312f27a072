use crate::{
    Ed25519Verifier, OutputIndex, SignatureVerifier, Transaction, TransactionId,
    TransactionOutput, Utxo, UtxoPool, VerifierError,
};
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, info, trace};

/// The reason why a transaction can't be applied to the current UTXO pool.
/// Rejections are a normal outcome of validation, not errors.
#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum Rejection {
    #[error("Transaction has no inputs")]
    NoInputs,

    #[error("UTXO: {0} is not in the pool")]
    MissingUtxo(Utxo),

    #[error("Signature of input: {input_index} doesn't match the owner of the UTXO")]
    InvalidSignature { input_index: usize },

    #[error("UTXO: {0} is claimed more than once")]
    DuplicateClaim(Utxo),

    #[error("Output: {output_index} has a negative amount: {amount}")]
    NegativeOutput {
        output_index: OutputIndex,
        amount: i64,
    },

    #[error("Outputs total: {output_total} exceeds inputs total: {input_total}")]
    ValueDeficit { input_total: i64, output_total: i64 },

    #[error("Sum of amounts overflows")]
    ValueOverflow,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Verdict {
    Valid,
    Rejected(Rejection),
}

impl Verdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, Verdict::Valid)
    }
}

/// Failures that prevent the handler from reaching a verdict.
#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum TxHandlerError {
    #[error(transparent)]
    Verifier(#[from] VerifierError),

    #[error("Failed to encode transaction: {0}. Reason: {1}")]
    Encoding(TransactionId, String),
}

/// The outcome of processing one epoch.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct EpochSummary {
    /// Accepted transactions in the order they were applied.
    pub accepted: Vec<Transaction>,
    /// Rejected transactions in the order they were evaluated.
    pub rejected: Vec<(TransactionId, Rejection)>,
    /// Total amount of the UTXOs spent by the accepted transactions.
    pub consumed_value: i128,
    /// Total amount of the UTXOs created by the accepted transactions.
    pub created_value: i128,
}

/// Validates transactions against its own copy of the UTXO pool, and applies the valid ones.
///
/// The handler exclusively owns the pool, so it can't change while an epoch is processed.
pub struct TxHandler<V = Ed25519Verifier> {
    utxo_pool: UtxoPool,
    verifier: V,
}

impl TxHandler<Ed25519Verifier> {
    /// Creates a handler that works on a copy of the given pool.
    pub fn new(utxo_pool: &UtxoPool) -> Self {
        Self::with_verifier(utxo_pool, Ed25519Verifier)
    }
}

impl<V: SignatureVerifier> TxHandler<V> {
    pub fn with_verifier(utxo_pool: &UtxoPool, verifier: V) -> Self {
        Self {
            utxo_pool: utxo_pool.clone(),
            verifier,
        }
    }

    pub fn utxo_pool(&self) -> &UtxoPool {
        &self.utxo_pool
    }

    pub fn into_utxo_pool(self) -> UtxoPool {
        self.utxo_pool
    }

    /// Returns whether the transaction can be applied to the current pool.
    /// A transaction is valid if:
    ///   - it has inputs and all UTXOs they claim are in the pool,
    ///   - the signature of each input is valid for the owner of the claimed UTXO,
    ///   - no UTXO is claimed more than once,
    ///   - no output has a negative amount,
    ///   - the claimed amounts cover the output amounts.
    pub fn is_valid_tx(&self, transaction: &Transaction) -> Result<bool, TxHandlerError> {
        Ok(self.verdict(transaction)?.is_valid())
    }

    /// Same as `is_valid_tx`, but explains the rejection.
    /// The checks run in the order listed in `is_valid_tx` and stop at the first failure.
    pub fn verdict(&self, transaction: &Transaction) -> Result<Verdict, TxHandlerError> {
        if transaction.inputs().is_empty() {
            return Ok(Verdict::Rejected(Rejection::NoInputs));
        }

        // All claimed outputs must be unspent.
        let mut claimed = Vec::with_capacity(transaction.inputs().len());
        for input in transaction.inputs() {
            let utxo = Utxo::new(*input.utxo_id(), *input.output_index());
            match self.utxo_pool.get(&utxo) {
                None => return Ok(Verdict::Rejected(Rejection::MissingUtxo(utxo))),
                Some(output) => claimed.push((utxo, output)),
            }
        }

        for (input_index, (input, (_, output))) in
            transaction.inputs().iter().zip(&claimed).enumerate()
        {
            let message = transaction
                .data_to_sign(input_index)
                .map_err(|e| TxHandlerError::Encoding(*transaction.id(), e))?;
            if !self
                .verifier
                .verify(output.public_key(), &message, input.signature())?
            {
                return Ok(Verdict::Rejected(Rejection::InvalidSignature {
                    input_index,
                }));
            }
        }

        let mut seen = HashSet::with_capacity(claimed.len());
        for (utxo, _) in &claimed {
            if !seen.insert(utxo) {
                return Ok(Verdict::Rejected(Rejection::DuplicateClaim(*utxo)));
            }
        }

        for (index, output) in transaction.outputs().iter().enumerate() {
            if output.amount() < 0 {
                return Ok(Verdict::Rejected(Rejection::NegativeOutput {
                    output_index: OutputIndex::new(index as u32),
                    amount: output.amount(),
                }));
            }
        }

        let input_total = claimed
            .iter()
            .try_fold(0i64, |total, (_, output)| total.checked_add(output.amount()));
        let output_total = transaction.total_output_amount();
        let verdict = match (input_total, output_total) {
            (Some(input_total), Some(output_total)) if input_total < output_total => {
                Verdict::Rejected(Rejection::ValueDeficit {
                    input_total,
                    output_total,
                })
            }
            (Some(_), Some(_)) => Verdict::Valid,
            _ => Verdict::Rejected(Rejection::ValueOverflow),
        };
        Ok(verdict)
    }

    /// Processes the candidate transactions in the given order, applying each valid one before
    /// the next is evaluated. Returns the accepted transactions.
    pub fn handle_txs(
        &mut self,
        candidates: Vec<Transaction>,
    ) -> Result<Vec<Transaction>, TxHandlerError> {
        Ok(self.process_epoch(candidates)?.accepted)
    }

    /// Same as `handle_txs`, but also reports rejections and the value that moved.
    ///
    /// Acceptance is greedy: when two candidates conflict, the one that comes first wins.
    /// A rejected candidate is not retried, even if a later one creates the UTXO it claims.
    /// If a verdict can't be reached for some candidate, the transactions accepted so far are
    /// rolled back and the pool is left as it was before the epoch.
    pub fn process_epoch(
        &mut self,
        candidates: Vec<Transaction>,
    ) -> Result<EpochSummary, TxHandlerError> {
        let num_candidates = candidates.len();
        let mut summary = EpochSummary::default();
        // Outputs spent by each accepted transaction, in acceptance order.
        let mut spent_outputs = Vec::new();
        for transaction in candidates {
            let verdict = match self.verdict(&transaction) {
                Ok(verdict) => verdict,
                Err(e) => {
                    self.roll_back(&summary.accepted, spent_outputs);
                    return Err(e);
                }
            };
            match verdict {
                Verdict::Valid => {
                    let spent = self.apply(&transaction);
                    summary.consumed_value += total_value(&spent);
                    summary.created_value += transaction
                        .outputs()
                        .iter()
                        .map(|output| output.amount() as i128)
                        .sum::<i128>();
                    trace!("Accepted transaction: {}", transaction);
                    spent_outputs.push(spent);
                    summary.accepted.push(transaction);
                }
                Verdict::Rejected(rejection) => {
                    debug!(
                        "Rejected transaction: {}. Reason: {}",
                        transaction.id(),
                        rejection
                    );
                    summary.rejected.push((*transaction.id(), rejection));
                }
            }
        }
        info!(
            "Epoch processed {} candidates: {} accepted, {} rejected. Pool size: {}",
            num_candidates,
            summary.accepted.len(),
            summary.rejected.len(),
            self.utxo_pool.len()
        );
        Ok(summary)
    }

    /// Spends the claimed UTXOs and adds the transaction outputs to the pool.
    /// Returns the spent outputs.
    ///
    /// Preconditions:
    ///   - The transaction is valid against the current pool.
    fn apply(&mut self, transaction: &Transaction) -> Vec<(Utxo, TransactionOutput)> {
        let mut spent = Vec::with_capacity(transaction.inputs().len());
        for input in transaction.inputs() {
            let utxo = Utxo::new(*input.utxo_id(), *input.output_index());
            let output = self.utxo_pool.remove(&utxo);
            spent.push((utxo, output));
        }
        for (index, output) in transaction.outputs().iter().enumerate() {
            self.utxo_pool.add(
                Utxo::new(*transaction.id(), OutputIndex::new(index as u32)),
                output.clone(),
            );
        }
        spent
    }

    /// Undoes the given transactions in reverse order of acceptance.
    ///
    /// Preconditions:
    ///   - `spent_outputs[i]` are the outputs returned by `apply(&accepted[i])`.
    fn roll_back(
        &mut self,
        accepted: &[Transaction],
        spent_outputs: Vec<Vec<(Utxo, TransactionOutput)>>,
    ) {
        assert_eq!(accepted.len(), spent_outputs.len());
        for (transaction, spent) in accepted.iter().zip(spent_outputs).rev() {
            for index in 0..transaction.outputs().len() {
                self.utxo_pool
                    .remove(&Utxo::new(*transaction.id(), OutputIndex::new(index as u32)));
            }
            for (utxo, output) in spent {
                self.utxo_pool.add(utxo, output);
            }
        }
        debug!("Rolled back {} transactions", accepted.len());
    }
}

fn total_value(outputs: &[(Utxo, TransactionOutput)]) -> i128 {
    outputs
        .iter()
        .map(|(_, output)| output.amount() as i128)
        .sum()
}
