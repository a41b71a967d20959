use atm_core::db::open_db_in_memory;
use atm_core::{
    DenominationRecord, InMemoryDenominationRepository, LedgerError, LedgerService,
    SqliteDenominationRepository,
};

#[test]
fn add_denomination_creates_record() {
    let repo = InMemoryDenominationRepository::new();
    let service = LedgerService::new(&repo);

    let created = service
        .add_denomination(DenominationRecord::new(100, 5))
        .unwrap();

    assert_eq!(created, DenominationRecord::new(100, 5));
    assert_eq!(repo.quantity_of(100), Some(5));
}

#[test]
fn add_existing_denomination_is_duplicate() {
    let conn = open_db_in_memory().unwrap();
    let service = LedgerService::new(SqliteDenominationRepository::try_new(&conn).unwrap());
    service
        .add_denomination(DenominationRecord::new(50, 0))
        .unwrap();

    let err = service
        .add_denomination(DenominationRecord::new(50, 3))
        .unwrap_err();

    assert!(matches!(err, LedgerError::DuplicateDenomination(50)));
    assert_eq!(err.kind(), "duplicate_denomination");
    assert_eq!(service.balance().unwrap().total_balance, 0);
}

#[test]
fn add_zero_denomination_is_rejected() {
    let repo = InMemoryDenominationRepository::new();
    let service = LedgerService::new(&repo);

    let err = service
        .add_denomination(DenominationRecord::new(0, 10))
        .unwrap_err();

    assert!(matches!(err, LedgerError::InvalidDenomination(_)));
    assert_eq!(repo.quantity_of(0), None);
}

#[test]
fn added_denominations_join_dispersal() {
    let repo = InMemoryDenominationRepository::new();
    let service = LedgerService::new(&repo);
    service
        .add_denomination(DenominationRecord::new(20, 5))
        .unwrap();
    service
        .add_denomination(DenominationRecord::new(10, 1))
        .unwrap();

    let receipt = service.withdraw(30).unwrap();

    assert_eq!(receipt.dispense.count_for(20), Some(1));
    assert_eq!(receipt.dispense.count_for(10), Some(1));
    assert_eq!(receipt.total_balance, 80);
}
