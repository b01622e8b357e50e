use engine::ledger::{LedgerError, ResourceKind, ResourceLedger};

#[test]
fn fresh_ledger_only_has_reaction() {
    let ledger = ResourceLedger::new(30);
    assert!(ledger.can_afford(ResourceKind::Reaction));
    assert!(!ledger.can_afford(ResourceKind::PrimaryAction));
    assert!(!ledger.can_afford(ResourceKind::SecondaryAction));
    assert!(!ledger.can_afford(ResourceKind::Movement));
}

#[test]
fn spend_is_all_or_nothing() {
    let mut ledger = ResourceLedger::new(30);
    ledger.refill(ResourceKind::PrimaryAction);
    assert!(ledger.spend(ResourceKind::PrimaryAction, 0).is_ok());
    assert_eq!(
        ledger.spend(ResourceKind::PrimaryAction, 0),
        Err(LedgerError::Spent(ResourceKind::PrimaryAction))
    );
    assert!(!ledger.primary_action());
}

#[test]
fn movement_budget_cannot_overdraw() {
    let mut ledger = ResourceLedger::new(30);
    ledger.refill(ResourceKind::Movement);
    ledger.spend(ResourceKind::Movement, 20).unwrap();
    assert_eq!(
        ledger.spend(ResourceKind::Movement, 15),
        Err(LedgerError::InsufficientMovement {
            remaining: 10,
            requested: 15
        })
    );
    assert_eq!(ledger.movement(), 10);
    ledger.spend(ResourceKind::Movement, 10).unwrap();
    assert!(!ledger.can_afford(ResourceKind::Movement));
}

#[test]
fn refill_restores_speed() {
    let mut ledger = ResourceLedger::new(25);
    ledger.refill(ResourceKind::Movement);
    ledger.spend(ResourceKind::Movement, 25).unwrap();
    ledger.refill(ResourceKind::Movement);
    assert_eq!(ledger.movement(), 25);
    assert_eq!(ledger.speed(), 25);
}

#[test]
fn error_messages_name_the_resource() {
    assert_eq!(
        LedgerError::Spent(ResourceKind::Reaction).to_string(),
        "reaction already spent"
    );
}
