mod common;

use std::sync::Arc;

use loan_ledger_rs::{Collection, LedgerStore, MemoryStore, Money, NewBorrower, Snapshot};

use common::{assert_consistent, date, flat_reconciler, init_tracing};

#[test]
fn concurrent_payments_on_one_borrower_do_not_lose_updates() {
    init_tracing();
    let reconciler = flat_reconciler(Arc::new(MemoryStore::new()));
    let borrower = reconciler
        .register_borrower(NewBorrower::new("Ana", Money::from_major(10_000), 1, date(1, 1)))
        .unwrap();

    std::thread::scope(|s| {
        for thread in 0..8u32 {
            let reconciler = &reconciler;
            s.spawn(move || {
                for i in 0..25u32 {
                    // spread dates so inserts land mid-sequence as well as at the end
                    let day = 1 + (thread * 25 + i) % 28;
                    reconciler
                        .record_payment(borrower.id, date(2, day), Money::from_major(10))
                        .unwrap();
                }
            });
        }
    });

    let ledger = reconciler.ledger(borrower.id).unwrap();
    assert_eq!(ledger.payments.len(), 200);
    assert_eq!(ledger.borrower.remaining_balance, Money::from_major(8_000));
    assert_consistent(&reconciler, borrower.id);
}

#[test]
fn concurrent_edits_and_payments_stay_consistent() {
    init_tracing();
    let reconciler = flat_reconciler(Arc::new(MemoryStore::new()));
    let borrower = reconciler
        .register_borrower(NewBorrower::new("Ben", Money::from_major(100_000), 1, date(1, 1)))
        .unwrap();
    for day in 1..=10 {
        reconciler
            .record_payment(borrower.id, date(2, day), Money::from_major(100))
            .unwrap();
    }
    let ids: Vec<_> = reconciler.payments(borrower.id).unwrap().iter().map(|p| p.id).collect();

    std::thread::scope(|s| {
        let reconciler = &reconciler;
        let ids = &ids;
        s.spawn(move || {
            for (i, id) in ids.iter().enumerate() {
                reconciler
                    .edit_payment(*id, None, Some(Money::from_major(50 + i as i64)))
                    .unwrap();
            }
        });
        s.spawn(move || {
            for day in 1..=20 {
                reconciler
                    .record_payment(borrower.id, date(3, day), Money::from_major(25))
                    .unwrap();
            }
        });
        s.spawn(move || {
            for term in [1u32, 1, 1] {
                reconciler
                    .edit_borrower_terms(borrower.id, None, Some(term))
                    .unwrap();
            }
        });
    });

    assert_eq!(reconciler.payments(borrower.id).unwrap().len(), 30);
    assert_consistent(&reconciler, borrower.id);
}

#[test]
fn different_borrowers_proceed_in_parallel() {
    let reconciler = flat_reconciler(Arc::new(MemoryStore::new()));
    let borrowers: Vec<_> = (0..6)
        .map(|i| {
            reconciler
                .register_borrower(NewBorrower::new(format!("b{}", i), Money::from_major(1_000), 1, date(1, 1)))
                .unwrap()
        })
        .collect();

    std::thread::scope(|s| {
        for borrower in &borrowers {
            let reconciler = &reconciler;
            s.spawn(move || {
                for day in 1..=10 {
                    reconciler
                        .record_payment(borrower.id, date(2, day), Money::from_major(100))
                        .unwrap();
                }
            });
        }
    });

    for borrower in &borrowers {
        let current = reconciler.borrower(borrower.id).unwrap();
        assert!(current.fully_paid);
        assert_consistent(&reconciler, borrower.id);
    }
}

#[test]
fn readers_never_see_half_deleted_borrower() {
    let store = Arc::new(MemoryStore::new());
    let reconciler = flat_reconciler(Arc::clone(&store));
    let borrower = reconciler
        .register_borrower(NewBorrower::new("Cora", Money::from_major(5_000), 1, date(1, 1)))
        .unwrap();
    for day in 1..=20 {
        reconciler
            .record_payment(borrower.id, date(2, day), Money::from_major(10))
            .unwrap();
    }

    std::thread::scope(|s| {
        let store = &store;
        let reader = s.spawn(move || {
            for _ in 0..2_000 {
                match store.load_ledger(borrower.id) {
                    Ok((_, payments)) => assert_eq!(payments.len(), 20),
                    Err(_) => {
                        assert!(store.payments_for_borrower(borrower.id).unwrap().is_empty());
                        break;
                    }
                }
            }
        });
        reconciler.delete_borrower(borrower.id).unwrap();
        reader.join().unwrap();
    });

    assert_eq!(store.borrower_count(), 0);
    assert_eq!(store.payment_count(), 0);
}

#[test]
fn subscribers_see_each_committed_state() {
    let store = Arc::new(MemoryStore::new());
    let reconciler = flat_reconciler(Arc::clone(&store));
    let borrower = reconciler
        .register_borrower(NewBorrower::new("Dina", Money::from_major(1_000), 1, date(1, 1)))
        .unwrap();

    let payments_rx = store.subscribe(Collection::PaymentsHistory, Some(borrower.id));
    let borrowers_rx = store.subscribe(Collection::Borrowers, None);
    assert_eq!(payments_rx.recv().unwrap(), Snapshot::Payments(vec![]));
    let _ = borrowers_rx.recv().unwrap();

    reconciler
        .record_payment(borrower.id, date(2, 1), Money::from_major(250))
        .unwrap();

    // one commit carries both the payment and the borrower balance
    match payments_rx.recv().unwrap() {
        Snapshot::Payments(payments) => {
            assert_eq!(payments.len(), 1);
            assert_eq!(payments[0].remaining_balance, Money::from_major(750));
        }
        other => panic!("unexpected snapshot {:?}", other),
    }
    match borrowers_rx.recv().unwrap() {
        Snapshot::Borrowers(borrowers) => {
            assert_eq!(borrowers[0].remaining_balance, Money::from_major(750));
        }
        other => panic!("unexpected snapshot {:?}", other),
    }
}
