use engine::formula::{Formula, evaluate};
use engine::{Dice, attack_check};

#[test]
fn two_d6_plus_three_stays_in_range() {
    for seed in 0..200 {
        let mut dice = Dice::from_seed(seed);
        let total = evaluate("2d6+3", &mut dice).total;
        assert!((5..=15).contains(&total), "seed {seed} gave {total}");
    }
}

#[test]
fn same_seed_same_rolls() {
    let mut a = Dice::from_seed(99);
    let mut b = Dice::from_seed(99);
    let ra: Vec<u32> = (0..20).map(|_| a.d20()).collect();
    let rb: Vec<u32> = (0..20).map(|_| b.d20()).collect();
    assert_eq!(ra, rb);
}

#[test]
fn scripted_faces_come_first_and_are_clamped() {
    let mut dice = Dice::from_scripted(vec![4, 30, 0]);
    assert_eq!(dice.roll(6), 4);
    assert_eq!(dice.roll(20), 20);
    assert_eq!(dice.roll(8), 1);
    let next = dice.roll(6);
    assert!((1..=6).contains(&next));
}

#[test]
fn zero_sided_die_rolls_zero() {
    let mut dice = Dice::from_seed(1);
    assert_eq!(dice.roll(0), 0);
}

#[test]
fn chance_compares_percentile() {
    let mut dice = Dice::from_scripted(vec![35, 36]);
    assert!(dice.chance(0.35));
    assert!(!dice.chance(0.35));
}

#[test]
fn omitted_count_means_one_die() {
    let mut dice = Dice::from_scripted(vec![7]);
    let roll = evaluate("d8", &mut dice);
    assert_eq!(roll.total, 7);
    assert_eq!(roll.faces, vec![7]);
}

#[test]
fn malformed_formula_totals_zero() {
    let mut dice = Dice::from_seed(3);
    let roll = evaluate("see description", &mut dice);
    assert!(roll.malformed);
    assert_eq!(roll.total, 0);
    assert!(roll.faces.is_empty());
}

#[test]
fn formula_deserializes_from_string() {
    let f: Formula = serde_json::from_str(r#""3d4 + 2""#).unwrap();
    assert_eq!(f.bounds(), (5, 14));
    assert_eq!(serde_json::to_string(&f).unwrap(), r#""3d4 + 2""#);
}

#[test]
fn attack_meets_or_exceeds_hits() {
    let mut dice = Dice::from_scripted(vec![10, 9]);
    let hit = attack_check(&mut dice, 5, 15);
    assert!(hit.hit);
    assert_eq!(hit.total, 15);
    let miss = attack_check(&mut dice, 5, 15);
    assert!(!miss.hit);
}

#[test]
fn huge_constants_saturate_instead_of_overflowing() {
    let f = Formula::parse("2147483647+1");
    assert_eq!(f.bounds(), (i32::MAX, i32::MAX));
    let mut dice = Dice::from_seed(5);
    assert_eq!(f.evaluate(&mut dice).total, i32::MAX);
}

#[test]
fn oversized_dice_are_malformed() {
    let f = Formula::parse("100d4294967295");
    assert!(f.is_malformed());
    assert_eq!(f.bounds(), (0, 0));
    let mut dice = Dice::from_seed(5);
    let roll = f.evaluate(&mut dice);
    assert_eq!(roll.total, 0);
    assert!(roll.faces.is_empty());

    let largest = Formula::parse("100d1000+2147483000");
    assert_eq!(largest.bounds(), (2147483100, i32::MAX));
}

#[test]
fn minus_is_not_an_operator() {
    let f = Formula::parse("1d6-1");
    assert!(f.is_malformed());
    let with_negative = Formula::parse("1d6+-1");
    assert_eq!(with_negative.bounds(), (0, 5));
}
