use engine::conditions::{Condition, ConditionSet, parse_condition_list};

#[test]
fn parse_is_case_insensitive() {
    assert_eq!(Condition::parse("Prone"), Some(Condition::Prone));
    assert_eq!(Condition::parse(" UNCONSCIOUS "), Some(Condition::Unconscious));
    assert_eq!(Condition::parse("sleepy"), None);
}

#[test]
fn set_has_no_duplicates() {
    let mut set = ConditionSet::new();
    assert!(set.insert(Condition::Poisoned));
    assert!(!set.insert(Condition::Poisoned));
    assert_eq!(set.len(), 1);
    assert!(set.remove(Condition::Poisoned));
    assert!(set.is_empty());
}

#[test]
fn list_parsing_skips_unknown_names() {
    let raw = vec!["prone".to_string(), "hasted".to_string(), "Grappled".to_string()];
    assert_eq!(
        parse_condition_list(&raw),
        vec![Condition::Prone, Condition::Grappled]
    );
}

#[test]
fn set_serializes_as_names() {
    let set: ConditionSet = [Condition::Stunned, Condition::Blinded].into_iter().collect();
    let json = serde_json::to_string(&set).unwrap();
    assert_eq!(json, r#"["blinded","stunned"]"#);
}
