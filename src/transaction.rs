use crate::{KeyPair, PublicKey, Sha256, Signature, Utxo};
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::fmt::{Display, Formatter};

/// A double SHA-256 hash of the transaction data.
#[derive(Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Copy, Clone, Serialize, Deserialize)]
pub struct TransactionId(Sha256);

impl Display for TransactionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TransactionId {
    pub fn new(data: Sha256) -> Self {
        Self(data)
    }
}

/// The index of the transaction output.
#[derive(Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Copy, Clone, Serialize, Deserialize)]
pub struct OutputIndex(u32);

impl Display for OutputIndex {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl OutputIndex {
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct TransactionInput {
    // A pointer to the transaction containing the UTXO to be spent.
    utxo_id: TransactionId,
    // The number of UTXO to be spent, the first one is 0.
    output_index: OutputIndex,
    // Signature by the owner of the referenced output over `Transaction::data_to_sign`.
    signature: Signature,
}

impl Display for TransactionInput {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.utxo_id, self.output_index)
    }
}

impl TransactionInput {
    pub fn new(utxo_id: TransactionId, output_index: OutputIndex, signature: Signature) -> Self {
        Self {
            utxo_id,
            output_index,
            signature,
        }
    }

    /// Creates an input without a signature. It must be signed before it can be spent.
    pub fn unsigned(utxo_id: TransactionId, output_index: OutputIndex) -> Self {
        Self::new(utxo_id, output_index, Signature::default())
    }

    pub fn utxo_id(&self) -> &TransactionId {
        &self.utxo_id
    }

    pub fn output_index(&self) -> &OutputIndex {
        &self.output_index
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }
}

#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct TransactionOutput {
    // Only the owner of this key can spend the output.
    public_key: PublicKey,
    // Signed, so that a transaction declaring a negative amount can be represented and rejected.
    amount: i64,
}

impl Display for TransactionOutput {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.amount, self.public_key)
    }
}

impl TransactionOutput {
    pub fn new(amount: i64, public_key: PublicKey) -> Self {
        Self { public_key, amount }
    }

    pub fn amount(&self) -> i64 {
        self.amount
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }
}

/// Transactions are stored without their id, which is recomputed when they are loaded.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TransactionData", into = "TransactionData")]
pub struct Transaction {
    id: TransactionId,
    inputs: Vec<TransactionInput>,
    outputs: Vec<TransactionOutput>,
}

impl Transaction {
    pub fn new(
        inputs: Vec<TransactionInput>,
        outputs: Vec<TransactionOutput>,
    ) -> Result<Self, String> {
        let id = Self::hash_transaction_data(&inputs, &outputs)?;
        Ok(Self {
            id,
            inputs,
            outputs,
        })
    }

    /// Creates a transaction that spends each UTXO with the signature of the paired key.
    pub fn signed(
        spends: &[(Utxo, &KeyPair)],
        outputs: Vec<TransactionOutput>,
    ) -> Result<Self, String> {
        let inputs = spends
            .iter()
            .map(|(utxo, _)| {
                TransactionInput::unsigned(*utxo.transaction_id(), *utxo.output_index())
            })
            .collect();
        let mut transaction = Self::new(inputs, outputs)?;
        for (input_index, (_, key_pair)) in spends.iter().enumerate() {
            let signature = key_pair.sign(&transaction.data_to_sign(input_index)?);
            transaction = transaction.with_signature(input_index, signature)?;
        }
        Ok(transaction)
    }

    pub fn id(&self) -> &TransactionId {
        &self.id
    }

    pub fn inputs(&self) -> &Vec<TransactionInput> {
        &self.inputs
    }

    pub fn outputs(&self) -> &Vec<TransactionOutput> {
        &self.outputs
    }

    /// Returns the output at the given index.
    ///
    /// Preconditions:
    ///   - The index is less than the number of outputs.
    pub fn output(&self, index: OutputIndex) -> &TransactionOutput {
        match self.outputs.get(index.value() as usize) {
            None => panic!("Transaction: {} has no output at index: {}", self.id, index),
            Some(output) => output,
        }
    }

    /// Returns the data that the owner of the UTXO referenced by the input at `input_index` must
    /// sign. The data covers the input's reference and all outputs, but no signatures, so
    /// signing one input doesn't invalidate the signatures of the others.
    ///
    /// Preconditions:
    ///   - The index is less than the number of inputs.
    pub fn data_to_sign(&self, input_index: usize) -> Result<Vec<u8>, String> {
        assert!(
            input_index < self.inputs.len(),
            "Transaction: {} has no input at index: {}",
            self.id,
            input_index
        );
        let input = &self.inputs[input_index];
        bincode::serialize(&(&input.utxo_id, &input.output_index, &self.outputs))
            .map_err(|e| e.to_string())
    }

    /// Replaces the signature of the input at `input_index` and recomputes the transaction id.
    ///
    /// Preconditions:
    ///   - The index is less than the number of inputs.
    pub fn with_signature(
        mut self,
        input_index: usize,
        signature: Signature,
    ) -> Result<Self, String> {
        assert!(
            input_index < self.inputs.len(),
            "Transaction: {} has no input at index: {}",
            self.id,
            input_index
        );
        self.inputs[input_index].signature = signature;
        self.id = Self::hash_transaction_data(&self.inputs, &self.outputs)?;
        Ok(self)
    }

    /// The sum of all output amounts, or None if it overflows.
    pub fn total_output_amount(&self) -> Option<i64> {
        self.outputs
            .iter()
            .try_fold(0i64, |total, output| total.checked_add(output.amount))
    }

    fn hash_transaction_data(
        inputs: &Vec<TransactionInput>,
        outputs: &Vec<TransactionOutput>,
    ) -> Result<TransactionId, String> {
        let data = bincode::serialize(&(inputs, outputs)).map_err(|e| e.to_string())?;
        Ok(TransactionId(Sha256::double_digest(&data)))
    }
}

/// The stored form of a transaction.
#[derive(Serialize, Deserialize)]
pub struct TransactionData {
    inputs: Vec<TransactionInput>,
    outputs: Vec<TransactionOutput>,
}

impl TryFrom<TransactionData> for Transaction {
    type Error = String;

    fn try_from(data: TransactionData) -> Result<Self, Self::Error> {
        Self::new(data.inputs, data.outputs)
    }
}

impl From<Transaction> for TransactionData {
    fn from(transaction: Transaction) -> Self {
        Self {
            inputs: transaction.inputs,
            outputs: transaction.outputs,
        }
    }
}

impl Display for Transaction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] => [{}]",
            self.id,
            self.inputs
                .iter()
                .map(TransactionInput::to_string)
                .collect::<Vec<String>>()
                .join(", "),
            self.outputs
                .iter()
                .map(TransactionOutput::to_string)
                .collect::<Vec<String>>()
                .join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::KeyPair;

    fn origin_id() -> TransactionId {
        TransactionId::new(Sha256::digest(b"origin"))
    }

    fn unsigned_transaction(recipient: &KeyPair) -> Transaction {
        Transaction::new(
            vec![
                TransactionInput::unsigned(origin_id(), OutputIndex::new(0)),
                TransactionInput::unsigned(origin_id(), OutputIndex::new(1)),
            ],
            vec![TransactionOutput::new(10, recipient.public_key())],
        )
        .unwrap()
    }

    #[test]
    fn id_depends_on_signatures() {
        let owner = KeyPair::from_seed([1; 32]);
        let transaction = unsigned_transaction(&owner);
        let unsigned_id = *transaction.id();
        let signature = owner.sign(&transaction.data_to_sign(0).unwrap());
        let signed = transaction.with_signature(0, signature).unwrap();
        assert_ne!(*signed.id(), unsigned_id);
    }

    #[test]
    fn data_to_sign_excludes_signatures() {
        let owner = KeyPair::from_seed([1; 32]);
        let transaction = unsigned_transaction(&owner);
        let before = transaction.data_to_sign(1).unwrap();
        let signature = owner.sign(&transaction.data_to_sign(0).unwrap());
        let signed = transaction.with_signature(0, signature).unwrap();
        assert_eq!(signed.data_to_sign(1).unwrap(), before);
    }

    #[test]
    fn data_to_sign_differs_per_input() {
        let transaction = unsigned_transaction(&KeyPair::from_seed([1; 32]));
        assert_ne!(
            transaction.data_to_sign(0).unwrap(),
            transaction.data_to_sign(1).unwrap()
        );
    }

    #[test]
    fn data_to_sign_covers_outputs() {
        let lhs = unsigned_transaction(&KeyPair::from_seed([1; 32]));
        let rhs = unsigned_transaction(&KeyPair::from_seed([2; 32]));
        assert_ne!(lhs.data_to_sign(0).unwrap(), rhs.data_to_sign(0).unwrap());
    }

    #[test]
    fn signed_transaction_carries_one_signature_per_input() {
        let owner = KeyPair::from_seed([1; 32]);
        let spends = [
            (Utxo::new(origin_id(), OutputIndex::new(0)), &owner),
            (Utxo::new(origin_id(), OutputIndex::new(1)), &owner),
        ];
        let transaction = Transaction::signed(
            &spends,
            vec![TransactionOutput::new(10, owner.public_key())],
        )
        .unwrap();
        assert_eq!(transaction.inputs().len(), 2);
        for (input_index, input) in transaction.inputs().iter().enumerate() {
            assert_eq!(
                *input.signature(),
                owner.sign(&transaction.data_to_sign(input_index).unwrap())
            );
        }
    }

    #[test]
    #[should_panic]
    fn data_to_sign_panics_for_missing_input() {
        let transaction = unsigned_transaction(&KeyPair::from_seed([1; 32]));
        let _ = transaction.data_to_sign(2);
    }

    #[test]
    #[should_panic]
    fn output_panics_for_out_of_range_index() {
        let transaction = unsigned_transaction(&KeyPair::from_seed([1; 32]));
        transaction.output(OutputIndex::new(1));
    }

    #[test]
    fn total_output_amount_detects_overflow() {
        let key = KeyPair::from_seed([1; 32]).public_key();
        let transaction = Transaction::new(
            vec![],
            vec![
                TransactionOutput::new(i64::MAX, key),
                TransactionOutput::new(1, key),
            ],
        )
        .unwrap();
        assert_eq!(transaction.total_output_amount(), None);

        let transaction = Transaction::new(
            vec![],
            vec![TransactionOutput::new(3, key), TransactionOutput::new(4, key)],
        )
        .unwrap();
        assert_eq!(transaction.total_output_amount(), Some(7));
    }
}
