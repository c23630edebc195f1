use common::{AccountId, Money, WalletId};
use criterion::{Criterion, criterion_group, criterion_main};
use ledger::{TransferEngine, WalletService};
use store::{InMemoryStore, MarketStore, TransactionTitle, WalletPurpose};

async fn funded_pair(store: &InMemoryStore) -> (WalletId, WalletId) {
    let service = WalletService::new(store.clone());
    let account = AccountId::new(1);
    service.open_wallets(account).await.unwrap();
    service.activate_personal(account).await.unwrap();
    service
        .top_up(account, Money::from_major(1_000_000_000))
        .await
        .unwrap();

    let personal = store
        .wallet(account, WalletPurpose::Personal)
        .await
        .unwrap()
        .unwrap();
    let escrow = store
        .wallet(account, WalletPurpose::Escrow)
        .await
        .unwrap()
        .unwrap();
    (personal.id, escrow.id)
}

fn bench_transfer(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryStore::new();
    let (personal, escrow) = rt.block_on(funded_pair(&store));
    let engine = TransferEngine::new(store);

    c.bench_function("ledger/transfer", |b| {
        b.iter(|| {
            rt.block_on(async {
                engine
                    .transfer(
                        personal,
                        escrow,
                        Money::from_major(1),
                        TransactionTitle::PaymentOrder,
                    )
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_round_trip(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryStore::new();
    let (personal, escrow) = rt.block_on(funded_pair(&store));
    let engine = TransferEngine::new(store);

    c.bench_function("ledger/escrow_round_trip", |b| {
        b.iter(|| {
            rt.block_on(async {
                let amount = Money::from_minor(12_345);
                engine
                    .transfer(personal, escrow, amount, TransactionTitle::PaymentOrder)
                    .await
                    .unwrap();
                engine
                    .transfer(escrow, personal, amount, TransactionTitle::RefundOrder)
                    .await
                    .unwrap();
            });
        });
    });
}

criterion_group!(benches, bench_transfer, bench_round_trip);
criterion_main!(benches);
