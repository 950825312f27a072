use coinledger_lib::{
    KeyPair, OutputIndex, Transaction, TransactionOutput, TxHandler, Utxo, UtxoPool,
};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};

const NUM_ACCOUNTS: u8 = 100;
const AMOUNT: i64 = 1_000;

/// Every account owns one genesis output and pays it to the next account. Then the next account
/// forwards the payment, so half of the batch spends outputs created earlier in the same batch.
fn create_epoch() -> (UtxoPool, Vec<Transaction>) {
    let accounts = (0..NUM_ACCOUNTS)
        .map(|seed| KeyPair::from_seed([seed; 32]))
        .collect::<Vec<KeyPair>>();
    let genesis = Transaction::new(
        vec![],
        accounts
            .iter()
            .map(|account| TransactionOutput::new(AMOUNT, account.public_key()))
            .collect(),
    )
    .unwrap();

    let mut batch = vec![];
    for (index, account) in accounts.iter().enumerate() {
        let next = &accounts[(index + 1) % accounts.len()];
        let payment = Transaction::signed(
            &[(Utxo::new(*genesis.id(), OutputIndex::new(index as u32)), account)],
            vec![TransactionOutput::new(AMOUNT, next.public_key())],
        )
        .unwrap();
        let forward = Transaction::signed(
            &[(Utxo::new(*payment.id(), OutputIndex::new(0)), next)],
            vec![TransactionOutput::new(AMOUNT, account.public_key())],
        )
        .unwrap();
        batch.push(payment);
        batch.push(forward);
    }
    (UtxoPool::from_genesis(&genesis), batch)
}

fn handle_txs_benchmark(c: &mut Criterion) {
    let (pool, batch) = create_epoch();

    let mut group = c.benchmark_group("Epoch");
    group.throughput(Throughput::Elements(batch.len() as u64));
    group.bench_function("handle_txs for chained transfers", |b| {
        b.iter_batched(
            || (TxHandler::new(&pool), batch.clone()),
            |(mut handler, batch)| {
                let accepted = handler.handle_txs(batch).unwrap();
                assert_eq!(accepted.len(), 2 * NUM_ACCOUNTS as usize);
                black_box(accepted);
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

criterion_group!(benches, handle_txs_benchmark);

criterion_main!(benches);
