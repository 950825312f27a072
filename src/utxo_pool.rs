use crate::{OutputIndex, Transaction, TransactionId, TransactionOutput};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::{Display, Formatter};

/// Identifies an unspent transaction output by the transaction that created it and its index
/// in that transaction.
#[derive(Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Copy, Clone, Serialize, Deserialize)]
pub struct Utxo {
    transaction_id: TransactionId,
    output_index: OutputIndex,
}

impl Utxo {
    pub fn new(transaction_id: TransactionId, output_index: OutputIndex) -> Self {
        Self {
            transaction_id,
            output_index,
        }
    }

    pub fn transaction_id(&self) -> &TransactionId {
        &self.transaction_id
    }

    pub fn output_index(&self) -> &OutputIndex {
        &self.output_index
    }
}

impl Display for Utxo {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.transaction_id, self.output_index)
    }
}

/// A pool of confirmed and unspent transaction outputs.
/// Cloning the pool produces an independent snapshot.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct UtxoPool {
    utxos: HashMap<Utxo, TransactionOutput>,
}

impl UtxoPool {
    pub fn new() -> Self {
        Self {
            utxos: HashMap::new(),
        }
    }

    /// Seeds the pool, e.g. from the genesis outputs or a restored snapshot.
    ///
    /// Preconditions:
    ///   - Keys are unique.
    pub fn from_outputs<I>(outputs: I) -> Self
    where
        I: IntoIterator<Item = (Utxo, TransactionOutput)>,
    {
        let mut pool = Self::new();
        for (utxo, output) in outputs {
            pool.add(utxo, output);
        }
        pool
    }

    /// Seeds the pool with all outputs of the given transaction, without validating it.
    /// Used for the genesis transaction, which has no inputs.
    pub fn from_genesis(transaction: &Transaction) -> Self {
        Self::from_outputs(
            transaction
                .outputs()
                .iter()
                .enumerate()
                .map(|(index, output)| {
                    (
                        Utxo::new(*transaction.id(), OutputIndex::new(index as u32)),
                        output.clone(),
                    )
                }),
        )
    }

    pub fn contains(&self, utxo: &Utxo) -> bool {
        self.utxos.contains_key(utxo)
    }

    pub fn get(&self, utxo: &Utxo) -> Option<&TransactionOutput> {
        self.utxos.get(utxo)
    }

    /// Adds the unspent output to the pool.
    ///
    /// Preconditions:
    ///   - The UTXO doesn't exist in the pool.
    pub fn add(&mut self, utxo: Utxo, output: TransactionOutput) {
        let previous = self.utxos.insert(utxo, output);
        assert!(previous.is_none(), "UTXO: {} already exists", utxo);
    }

    /// Removes the spent output from the pool and returns it.
    ///
    /// Preconditions:
    ///   - The UTXO exists in the pool.
    pub fn remove(&mut self, utxo: &Utxo) -> TransactionOutput {
        match self.utxos.remove(utxo) {
            None => panic!("UTXO: {} doesn't exist", utxo),
            Some(output) => output,
        }
    }

    pub fn len(&self) -> usize {
        self.utxos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.utxos.is_empty()
    }

    /// Returns all unspent outputs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&Utxo, &TransactionOutput)> {
        self.utxos.iter()
    }

    /// Total amount held by the unspent outputs.
    /// Widened to i128 so that summing many valid outputs can't overflow.
    pub fn total_value(&self) -> i128 {
        self.utxos
            .values()
            .map(|output| output.amount() as i128)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{KeyPair, Sha256};

    fn utxo(seed: &[u8], index: u32) -> Utxo {
        Utxo::new(
            TransactionId::new(Sha256::digest(seed)),
            OutputIndex::new(index),
        )
    }

    fn output(amount: i64) -> TransactionOutput {
        TransactionOutput::new(amount, KeyPair::from_seed([1; 32]).public_key())
    }

    #[test]
    fn add_get_remove() {
        let mut pool = UtxoPool::new();
        assert!(pool.is_empty());
        pool.add(utxo(b"tx0", 0), output(10));
        assert!(pool.contains(&utxo(b"tx0", 0)));
        assert!(!pool.contains(&utxo(b"tx0", 1)));
        assert_eq!(pool.get(&utxo(b"tx0", 0)), Some(&output(10)));
        assert_eq!(pool.len(), 1);

        assert_eq!(pool.remove(&utxo(b"tx0", 0)), output(10));
        assert!(!pool.contains(&utxo(b"tx0", 0)));
        assert_eq!(pool.get(&utxo(b"tx0", 0)), None);
    }

    #[test]
    #[should_panic]
    fn add_existing_utxo_panics() {
        let mut pool = UtxoPool::new();
        pool.add(utxo(b"tx0", 0), output(10));
        pool.add(utxo(b"tx0", 0), output(5));
    }

    #[test]
    #[should_panic]
    fn remove_missing_utxo_panics() {
        let mut pool = UtxoPool::new();
        pool.remove(&utxo(b"tx0", 0));
    }

    #[test]
    fn clone_is_independent() {
        let original = UtxoPool::from_outputs(vec![(utxo(b"tx0", 0), output(10))]);
        let mut copy = original.clone();
        copy.remove(&utxo(b"tx0", 0));
        copy.add(utxo(b"tx1", 0), output(3));

        assert!(original.contains(&utxo(b"tx0", 0)));
        assert!(!original.contains(&utxo(b"tx1", 0)));
        assert_eq!(original.total_value(), 10);
        assert_eq!(copy.total_value(), 3);
    }

    #[test]
    fn genesis_outputs_are_keyed_by_position() {
        let key = KeyPair::from_seed([1; 32]).public_key();
        let genesis = Transaction::new(
            vec![],
            vec![TransactionOutput::new(5, key), TransactionOutput::new(7, key)],
        )
        .unwrap();
        let pool = UtxoPool::from_genesis(&genesis);
        assert_eq!(pool.len(), 2);
        assert_eq!(
            pool.get(&Utxo::new(*genesis.id(), OutputIndex::new(1)))
                .map(TransactionOutput::amount),
            Some(7)
        );
        assert_eq!(pool.total_value(), 12);
    }

    #[test]
    fn total_value_does_not_overflow() {
        let pool = UtxoPool::from_outputs(vec![
            (utxo(b"tx0", 0), output(i64::MAX)),
            (utxo(b"tx0", 1), output(i64::MAX)),
        ]);
        assert_eq!(pool.total_value(), 2 * (i64::MAX as i128));
    }
}
