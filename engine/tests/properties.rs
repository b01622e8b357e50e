use engine::conditions::ConditionSet;
use engine::formula::Formula;
use engine::life::{Vitals, apply_damage};
use engine::{Combatant, Dice, Encounter, Faction};
use proptest::prelude::*;

fn roster(inits: &[i32]) -> Vec<Combatant> {
    inits
        .iter()
        .enumerate()
        .map(|(i, &init)| {
            let faction = if i % 2 == 0 {
                Faction::Player
            } else {
                Faction::Adversary
            };
            Combatant::new(format!("c{i}"), format!("C{i}"), faction, 10, 10).with_initiative(init)
        })
        .collect()
}

fn slot(id: &str) -> usize {
    id.trim_start_matches('c').parse().unwrap()
}

proptest! {
    #[test]
    fn formula_total_within_bounds(
        count in 1u32..6,
        sides in 1u32..13,
        flat in 0i32..10,
        seed in any::<u64>(),
    ) {
        let f = Formula::parse(&format!("{count}d{sides}+{flat}"));
        let (lo, hi) = f.bounds();
        let total = f.evaluate(&mut Dice::from_seed(seed)).total;
        prop_assert!(lo <= total && total <= hi);
    }

    #[test]
    fn damage_never_heals_or_goes_negative(
        max_hp in 1i32..100,
        hp in 0i32..100,
        dmg in -20i32..200,
    ) {
        let mut v = Vitals::new(max_hp, 10).with_current(hp);
        let before = v.hp;
        apply_damage("X", &mut v, &mut ConditionSet::new(), dmg, |_| {});
        prop_assert!(v.hp <= before);
        prop_assert!(v.hp >= 0);
        prop_assert_eq!(v.hp == 0, v.is_defeated());
    }

    #[test]
    fn initiative_order_is_stable(inits in prop::collection::vec(0i32..5, 1..10)) {
        let enc = Encounter::new(roster(&inits), Dice::from_seed(0)).unwrap();
        let order: Vec<(i32, usize)> = enc
            .combatants()
            .map(|c| (c.initiative(), slot(c.id().as_str())))
            .collect();
        for pair in order.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            prop_assert!(a.0 > b.0 || (a.0 == b.0 && a.1 < b.1));
        }
    }

    #[test]
    fn a_round_visits_everyone_once(inits in prop::collection::vec(0i32..20, 2..8)) {
        let mut enc = Encounter::new(roster(&inits), Dice::from_seed(0)).unwrap();
        enc.start().unwrap();
        let mut visited = Vec::new();
        while enc.round() == 1 {
            visited.push(slot(enc.active_id().unwrap().as_str()));
            enc.end_turn().unwrap();
        }
        visited.sort_unstable();
        prop_assert_eq!(visited, (0..inits.len()).collect::<Vec<_>>());
    }
}
