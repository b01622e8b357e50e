use engine::combat::{ActionTemplate, CostClass, Target};
use engine::{Combatant, CombatantId, Dice, Encounter, Faction, Position};

#[test]
fn scripted_duel_log() {
    let hero = Combatant::new("hero", "Hero", Faction::Player, 10, 12)
        .with_initiative(15)
        .with_action(ActionTemplate::single_target("Sword", CostClass::Primary, 5, "1d4+1", 5));
    let imp = Combatant::new("imp", "Imp", Faction::Adversary, 4, 10)
        .with_initiative(5)
        .at(Position::new(0, 1));

    let mut enc = Encounter::new(vec![hero, imp], Dice::from_scripted(vec![12, 3])).unwrap();
    enc.start().unwrap();
    enc.submit_action(&CombatantId::from("hero"), "Sword", Target::combatant("imp"))
        .unwrap();

    let text = enc.log().lines().collect::<Vec<_>>().join("\n");
    insta::assert_snapshot!(text, @r"
[INIT][Hero] 15 (pre-rolled)
[INIT][Imp] 5 (pre-rolled)
[START] players: 1, adversaries: 1
[ROUND] 1
[TURN][Hero]
[ACTION][Hero] Sword → Imp
[ATTACK][Hero] d20=12 +5 = 17 vs AC 10 → HIT
[DMG][Hero] 1d4+1 = 4
[HP][Imp] 4 → 0 (−4)
[COND][Imp] gains unconscious
[DEFEAT][Imp] drops to 0 HP
[END] victory
");
}
