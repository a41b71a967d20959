use atm_core::db::open_db_in_memory;
use atm_core::{
    DenominationRecord, DenominationRepository, DepositRejection, DepositRequest,
    InMemoryDenominationRepository, LedgerError, LedgerService, SqliteDenominationRepository,
};

fn seeded(pairs: &[(u32, u32)]) -> InMemoryDenominationRepository {
    InMemoryDenominationRepository::with_records(
        pairs
            .iter()
            .map(|&(denomination, quantity)| DenominationRecord::new(denomination, quantity)),
    )
}

fn request(pairs: &[(i64, i64)]) -> DepositRequest {
    pairs.iter().copied().collect()
}

#[test]
fn deposit_increases_balance_by_deposited_value() {
    let repo = seeded(&[(100, 5), (50, 10), (20, 0)]);
    let service = LedgerService::new(&repo);
    let before = service.balance().unwrap().total_balance;

    let report = service.deposit(&request(&[(100, 2), (20, 3)])).unwrap();

    assert_eq!(report.total_balance, before + 2 * 100 + 3 * 20);
    assert_eq!(repo.quantity_of(100), Some(7));
    assert_eq!(repo.quantity_of(50), Some(10));
    assert_eq!(repo.quantity_of(20), Some(3));
}

#[test]
fn deposit_returns_full_inventory_in_descending_order() {
    let repo = seeded(&[(20, 1), (100, 1), (50, 1)]);
    let service = LedgerService::new(&repo);

    let report = service.deposit(&request(&[(50, 1)])).unwrap();

    let keys: Vec<u32> = report
        .balance_denom
        .iter()
        .map(|record| record.denomination)
        .collect();
    assert_eq!(keys, vec![100, 50, 20]);
    assert_eq!(report.balance_denom.get(50).map(|r| r.quantity), Some(2));
    assert_eq!(report.total_balance, 100 + 2 * 50 + 20);
}

#[test]
fn deposit_ignores_unknown_denominations() {
    let repo = seeded(&[(100, 1)]);
    let service = LedgerService::new(&repo);

    let report = service.deposit(&request(&[(100, 1), (500, 4)])).unwrap();

    assert_eq!(report.total_balance, 200);
    assert_eq!(report.balance_denom.len(), 1);
    assert_eq!(repo.quantity_of(500), None);
}

#[test]
fn deposit_ignores_keys_outside_the_denomination_range() {
    let repo = seeded(&[(100, 1)]);
    let service = LedgerService::new(&repo);

    let report = service
        .deposit(&request(&[(100, 2), (-5, 1), (i64::from(u32::MAX) + 1, 3)]))
        .unwrap();

    assert_eq!(report.total_balance, 300);
    assert_eq!(report.balance_denom.len(), 1);
    assert_eq!(repo.quantity_of(100), Some(3));
}

#[test]
fn deposit_of_only_unknown_denominations_changes_nothing() {
    let repo = seeded(&[(100, 1)]);
    let service = LedgerService::new(&repo);

    let report = service.deposit(&request(&[(7, 3)])).unwrap();

    assert_eq!(report.total_balance, 100);
    assert_eq!(repo.quantity_of(7), None);
}

#[test]
fn deposit_with_all_zero_values_is_rejected() {
    let repo = seeded(&[(100, 1)]);
    let service = LedgerService::new(&repo);

    let err = service.deposit(&request(&[(100, 0), (50, 0)])).unwrap_err();

    assert!(matches!(
        err,
        LedgerError::InvalidDeposit(DepositRejection::NothingToDeposit)
    ));
    assert_eq!(err.to_string(), "Deposit amount cannot be zero");
    assert_eq!(repo.quantity_of(100), Some(1));
}

#[test]
fn deposit_with_any_negative_value_is_rejected_without_mutation() {
    let repo = seeded(&[(100, 1), (50, 1)]);
    let service = LedgerService::new(&repo);

    let err = service.deposit(&request(&[(100, 5), (50, -1)])).unwrap_err();

    assert!(matches!(
        err,
        LedgerError::InvalidDeposit(DepositRejection::NegativeAmount {
            denomination: 50,
            amount: -1
        })
    ));
    assert_eq!(err.kind(), "invalid_deposit");
    assert_eq!(repo.quantity_of(100), Some(1));
    assert_eq!(repo.quantity_of(50), Some(1));
}

#[test]
fn deposit_rejects_quantity_overflow_without_mutation() {
    let repo = seeded(&[(100, u32::MAX - 1), (50, 0)]);
    let service = LedgerService::new(&repo);

    let err = service
        .deposit(&request(&[(100, 2), (50, 1)]))
        .unwrap_err();

    assert!(matches!(
        err,
        LedgerError::InvalidDeposit(DepositRejection::QuantityOverflow { denomination: 100 })
    ));
    assert_eq!(repo.quantity_of(100), Some(u32::MAX - 1));
    assert_eq!(repo.quantity_of(50), Some(0));
}

#[test]
fn deposit_persists_through_sqlite_store() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDenominationRepository::try_new(&conn).unwrap();
    repo.save(&DenominationRecord::new(100, 1)).unwrap();
    repo.save(&DenominationRecord::new(20, 0)).unwrap();
    let service = LedgerService::new(repo);

    service.deposit(&request(&[(20, 5)])).unwrap();

    let reloaded = SqliteDenominationRepository::try_new(&conn)
        .unwrap()
        .load_all()
        .unwrap();
    assert_eq!(
        reloaded,
        vec![DenominationRecord::new(100, 1), DenominationRecord::new(20, 5)]
    );
}
