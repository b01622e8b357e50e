use engine::combat::director::decide;
use engine::combat::{
    ActionTemplate, CostClass, Predicate, Rule, Script, Target, TargetSelector,
};
use engine::{Combatant, CombatantId, Dice, Encounter, Faction, Position};

fn id(s: &str) -> CombatantId {
    CombatantId::from(s)
}

fn hero(name: &str, hp: i32, init: i32) -> Combatant {
    Combatant::new(name.to_lowercase(), name, Faction::Player, 40, 14)
        .with_hp(hp)
        .with_initiative(init)
        .at(Position::new(8 + init % 4, 18))
        .with_action(ActionTemplate::single_target("Sword", CostClass::Primary, 5, "1d8", 5))
}

fn larloch(hp: i32) -> Combatant {
    Combatant::new("larloch", "Larloch", Faction::Adversary, 150, 20)
        .with_hp(hp)
        .with_initiative(30)
        .at(Position::new(10, 12))
        .with_actions(Script::larloch_actions())
        .with_script(Script::larloch())
}

fn boss_fight(boss_hp: i32, party: Vec<Combatant>, dice: Dice) -> Encounter {
    let mut roster = vec![larloch(boss_hp)];
    roster.extend(party);
    let mut enc = Encounter::new(roster, dice).unwrap();
    enc.start().unwrap();
    assert_eq!(enc.active_id(), Some(&id("larloch")));
    enc
}

fn decide_for(enc: &Encounter, who: &str, dice: &mut Dice) -> Option<engine::combat::Decision> {
    // Rebuild the roster in initiative order; decide() only reads it.
    let snapshot: Vec<Combatant> = enc.combatants().cloned().collect();
    let roster = snapshot
        .into_iter()
        .map(|c| (c.id().clone(), c))
        .collect::<engine::combat::Roster>();
    let idx = roster.get_index_of(&id(who))?;
    decide(&roster, idx, dice)
}

#[test]
fn boss_below_threshold_wards_itself() {
    let party = vec![hero("Kaelen", 40, 12), hero("Lyra", 32, 18)];
    let mut enc = boss_fight(30, party, Dice::from_seed(11));

    let decision = decide_for(&enc, "larloch", &mut Dice::from_seed(0)).unwrap();
    assert_eq!(decision.action, "Shadow Ward");
    assert_eq!(decision.target, Target::Myself);
    assert_eq!(decision.rule, Some(1));

    let res = enc.play_directed_turn().unwrap().unwrap();
    assert_eq!(res.action, "Shadow Ward");
    let boss = enc.combatant(&id("larloch")).unwrap();
    assert!(boss.hp() >= 30 + 14);
    assert!(!boss.resources().secondary_action());
    assert!(boss.resources().primary_action());
    assert_ne!(enc.active_id(), Some(&id("larloch")));
}

#[test]
fn finishing_strike_picks_the_weakest() {
    let party = vec![hero("Kaelen", 40, 12), hero("Ignis", 12, 10), hero("Lyra", 15, 18)];
    let enc = boss_fight(150, party, Dice::from_seed(3));
    let decision = decide_for(&enc, "larloch", &mut Dice::from_seed(0)).unwrap();
    assert_eq!(decision.action, "Power Word Kill");
    assert_eq!(decision.target, Target::combatant("ignis"));
    assert_eq!(decision.rule, Some(0));
}

#[test]
fn fireball_depends_on_the_chance_roll() {
    let party = vec![hero("Kaelen", 40, 12), hero("Lyra", 32, 18)];
    let enc = boss_fight(150, party, Dice::from_seed(3));

    let hit = decide_for(&enc, "larloch", &mut Dice::from_scripted(vec![10])).unwrap();
    assert_eq!(hit.action, "Fireball");
    // First opponent in initiative order.
    assert_eq!(hit.target, Target::combatant("lyra"));

    let miss = decide_for(&enc, "larloch", &mut Dice::from_scripted(vec![90])).unwrap();
    assert_eq!(miss.action, "Ray of Frost");
    assert_eq!(miss.rule, Some(3));
}

fn blinking_boss_fight(party: Vec<Combatant>) -> Encounter {
    let boss = larloch(30).with_action(ActionTemplate::on_self("Blink", CostClass::Secondary, "0"));
    let mut roster = vec![boss];
    roster.extend(party);
    let mut enc = Encounter::new(roster, Dice::from_seed(11)).unwrap();
    enc.start().unwrap();
    enc
}

#[test]
fn spent_ward_falls_through_to_the_next_rule() {
    let party = vec![hero("Kaelen", 40, 12), hero("Lyra", 32, 18)];
    let mut enc = blinking_boss_fight(party);
    enc.submit_action(&id("larloch"), "Blink", Target::Myself)
        .unwrap();
    let boss = enc.combatant(&id("larloch")).unwrap();
    assert!(!boss.resources().secondary_action());
    assert_eq!(boss.hp(), 30);

    let decision = decide_for(&enc, "larloch", &mut Dice::from_scripted(vec![10])).unwrap();
    assert_eq!(decision.action, "Fireball");
    assert_eq!(decision.rule, Some(2));
}

#[test]
fn nothing_affordable_means_no_decision() {
    let party = vec![hero("Kaelen", 40, 12), hero("Lyra", 32, 18)];
    let mut enc = blinking_boss_fight(party);
    enc.submit_action(&id("larloch"), "Blink", Target::Myself)
        .unwrap();
    enc.submit_action(&id("larloch"), "Ray of Frost", Target::combatant("kaelen"))
        .unwrap();

    assert!(decide_for(&enc, "larloch", &mut Dice::from_seed(0)).is_none());
    assert!(enc.play_directed_turn().unwrap().is_none());
    assert!(
        enc.log()
            .lines()
            .any(|l| l == "[IDLE][Larloch] has nothing to do")
    );
    assert_ne!(enc.active_id(), Some(&id("larloch")));
}

#[test]
fn generic_policy_uses_first_affordable_damage_action() {
    let goblin = Combatant::new("gob", "Goblin", Faction::Adversary, 7, 15)
        .with_initiative(20)
        .with_action(ActionTemplate::single_target("Parry", CostClass::Reaction, 4, "1", 5))
        .with_action(ActionTemplate::on_self("Potion", CostClass::Secondary, "2d4"))
        .with_action(ActionTemplate::single_target("Scimitar", CostClass::Primary, 4, "1d6+2", 5));
    let down = hero("Kaelen", 0, 15);
    let up = hero("Lyra", 20, 10);
    let mut enc = Encounter::new(vec![goblin, down, up], Dice::from_seed(8)).unwrap();
    enc.start().unwrap();

    let decision = decide_for(&enc, "gob", &mut Dice::from_seed(0)).unwrap();
    assert_eq!(decision.action, "Scimitar");
    assert_eq!(decision.target, Target::combatant("lyra"));
    assert_eq!(decision.rule, None);
}

#[test]
fn nothing_to_do_is_logged_and_turn_ends() {
    let statue = Combatant::new("statue", "Statue", Faction::Adversary, 30, 17).with_initiative(20);
    let mut enc = Encounter::new(vec![statue, hero("Lyra", 20, 10)], Dice::from_seed(8)).unwrap();
    enc.start().unwrap();
    assert!(enc.play_directed_turn().unwrap().is_none());
    assert!(enc.log().lines().any(|l| l == "[IDLE][Statue] has nothing to do"));
    assert_eq!(enc.active_id(), Some(&id("lyra")));
}

#[test]
fn adversary_turns_run_until_a_player_is_up() {
    let goblin = |n: &str, init: i32| {
        Combatant::new(n, n, Faction::Adversary, 7, 15)
            .with_initiative(init)
            .at(Position::new(9, 17))
            .with_action(ActionTemplate::single_target("Scimitar", CostClass::Primary, 4, "1d6+2", 5))
    };
    let mut enc = Encounter::new(
        vec![goblin("g1", 20), goblin("g2", 19), hero("Torag", 40, 5)],
        Dice::from_seed(21),
    )
    .unwrap();
    enc.start().unwrap();
    let resolutions = enc.run_adversary_turns().unwrap();
    assert_eq!(resolutions.len(), 2);
    assert_eq!(enc.active_id(), Some(&id("torag")));
}

#[test]
fn script_rules_read_from_yaml() {
    let yaml = r#"
- when: { own_hp_below: 0.5 }
  action: Potion
  target: myself
- action: Bite
"#;
    let script: Script = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(
        script.rules(),
        &[
            Rule::new("Potion", TargetSelector::Myself).when(Predicate::OwnHpBelow(0.5)),
            Rule::new("Bite", TargetSelector::FirstOpponent),
        ]
    );
}
