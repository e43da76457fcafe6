use loco_core::{
    IndustryObjectId, MemoryStringTable, Month, Pos2, Prng, StringTable, TerrainQuery, TilePos,
};
use loco_runtime::{default_scenario, init_world, run_months, ScenarioFile, Simulation};

/// Empty 1900 map whose industries all come from the monthly founding pass.
const REFERENCE_1900: &str = include_str!("../../../assets/scenarios/reference_1900.yaml");

fn three_year_run() -> Simulation {
    let scenario = default_scenario().unwrap();
    let mut sim = init_world(&scenario).unwrap();
    sim.run_months(36).unwrap();
    sim
}

/// The full factor table given the value of each inflation rate group:
/// 20/4096 a month, 23/4096 (factors 4 and 6) and 17/4096 (27 onwards).
fn factors_by_rate(common: u32, fast: u32, slow: u32) -> [u32; 32] {
    let mut factors = [common; 32];
    factors[4] = fast;
    factors[6] = fast;
    factors[27..].fill(slow);
    factors
}

#[test]
fn start_of_scenario() {
    let scenario = default_scenario().unwrap();
    let sim = init_world(&scenario).unwrap();
    let world = &sim.world;

    assert_eq!(world.clock.date().year, 1950);
    assert_eq!(world.clock.date().month, Month::January);
    assert_eq!(world.economy.factors()[0], 17278);

    let player = world.companies.player_company().unwrap();
    assert_eq!(player.current_loan, 84300);
    assert_eq!(world.companies.active_ai_companies(), 0);

    // Map generation fully builds what it founds.
    assert!(world.industries.count() > 0);
    assert!(world.industries.industries().all(|i| i.is_complete()));
}

#[test]
fn three_years_of_inflation_match_the_reference() {
    let sim = three_year_run();
    let date = sim.world.clock.date();
    assert_eq!((date.year, date.month, date.day), (1953, Month::January, 1));
    assert_eq!(sim.months_run(), 36);
    assert_eq!(sim.world.economy.factors(), &factors_by_rate(20570, 32944, 12670));
}

#[test]
fn empty_1900_map_matches_the_reference_trace() {
    let scenario = ScenarioFile::from_yaml_str(REFERENCE_1900).unwrap();
    let mut sim = init_world(&scenario).unwrap();
    assert_eq!(sim.world.industries.count(), 0);
    assert_eq!(sim.world.economy.factors(), &[1024; 32]);
    assert_eq!(sim.world.companies.active_ai_companies(), 0);

    sim.run_months(36).unwrap();
    let world = &sim.world;
    let date = world.clock.date();
    assert_eq!((date.year, date.month, date.day), (1903, Month::January, 1));
    assert_eq!(world.clock.scenario_ticks(), 105_223);
    assert_eq!(world.economy.factors(), &factors_by_rate(1204, 1231, 1168));

    let positions: Vec<Pos2> = world.industries.industries().map(|i| i.pos).collect();
    assert_eq!(
        positions,
        vec![
            Pos2::new(2528, 1312),
            Pos2::new(1056, 2272),
            Pos2::new(672, 672),
            Pos2::new(2976, 2400),
            Pos2::new(2528, 2848),
            Pos2::new(1856, 800),
            Pos2::new(1120, 2816),
            Pos2::new(2688, 2176),
            Pos2::new(1696, 2624),
        ]
    );
    let objects: Vec<u8> = world.industries.industries().map(|i| i.object.0).collect();
    assert_eq!(objects, [0, 1, 2, 0, 1, 2, 0, 1, 0]);

    // The spawn roll includes the maximum itself, so one competitor past
    // max_competing_companies (3 here) can still join.
    let companies = &world.companies;
    assert_eq!(companies.active_ai_companies(), 4);
    let names: Vec<String> = companies
        .companies()
        .filter(|c| !companies.is_player_company(c.id))
        .map(|c| sim.env.strings.resolve(c.name))
        .collect();
    assert_eq!(
        names,
        ["Bronze Air", "Brookes Lines", "Brackwater Haulage", "Silver Carts"]
    );

    // Every draw of the run landed on the world stream in this order.
    assert_eq!(world.prng, Prng::new(2_704_768_281, 1_225_286_405));
}

#[test]
fn replays_are_bit_identical() {
    let a = three_year_run();
    let b = three_year_run();
    assert_eq!(a.digest().unwrap(), b.digest().unwrap());
    assert_eq!(a, b);
}

#[test]
fn restored_snapshot_continues_identically() {
    let scenario = default_scenario().unwrap();
    let mut original = init_world(&scenario).unwrap();
    original.run_months(12).unwrap();

    let saved = serde_json::to_string(&original).unwrap();
    let mut restored: Simulation = serde_json::from_str(&saved).unwrap();
    assert_eq!(restored.digest().unwrap(), original.digest().unwrap());

    original.run_months(24).unwrap();
    restored.run_months(24).unwrap();
    assert_eq!(restored.digest().unwrap(), original.digest().unwrap());
}

#[test]
fn industries_stay_apart_and_within_their_caps() {
    let sim = three_year_run();
    let world = &sim.world;
    let industries: Vec<_> = world.industries.industries().collect();
    assert!(!industries.is_empty());

    // Sites are drawn at least 480 apart; the building walk can then pull
    // a centre up to 14 tiles away from its site.
    for (i, a) in industries.iter().enumerate() {
        for b in &industries[i + 1..] {
            assert!(a.pos.manhattan_distance(b.pos) >= 32, "{} and {}", a.id, b.id);
        }
    }

    let mut seen: Vec<TilePos> = Vec::new();
    for industry in &industries {
        assert!(sim.env.terrain.buildings_of(industry.id) > 0);
        for building in &industry.buildings {
            for tile in building.tiles() {
                assert!(!seen.contains(&tile), "two buildings on {tile:?}");
                seen.push(tile);
                assert!(sim.env.terrain.surface(tile).map_or(false, |s| s.occupied));
            }
        }
    }

    for (idx, obj) in world.objects.industries.iter().enumerate() {
        let cap = (2 * usize::from(obj.total_of_type_in_scenario)) / 3;
        let count = world.industries.count_of_type(IndustryObjectId(idx as u8));
        assert!(count <= cap, "{}: {count} > {cap}", obj.name);
    }
}

#[test]
fn competitors_spawn_within_the_configured_limit() {
    let sim = three_year_run();
    let companies = &sim.world.companies;
    let max = usize::from(sim.world.options.max_competing_companies);
    let ai = companies.active_ai_companies();
    assert!(ai >= 1);
    // The spawn roll is inclusive of the maximum.
    assert!(ai <= max + 1);
    assert!(ai < sim.world.objects.competitors.len());

    let mut names: Vec<String> = companies
        .companies()
        .filter(|c| !companies.is_player_company(c.id))
        .map(|c| sim.env.strings.resolve(c.name))
        .collect();
    let before = names.len();
    names.sort();
    names.dedup();
    assert_eq!(names.len(), before);
    assert!(names.iter().all(|n| !n.is_empty()));
}

#[test]
fn snapshot_reports_the_run() {
    let scenario = default_scenario().unwrap();
    let sim = init_world(&scenario).unwrap();
    let expected_digest = {
        let mut copy = sim.clone();
        copy.run_months(6).unwrap();
        copy.digest().unwrap()
    };
    let snap = run_months(sim, 6).unwrap();
    assert_eq!(snap.months_run, 6);
    assert_eq!(snap.date.month, Month::July);
    assert_eq!(snap.calendar_date.map(|d| d.to_string()), Some("1950-07-01".into()));
    assert_eq!(snap.industries, snap.industries_by_type.iter().sum::<usize>());
    assert_eq!(snap.digest, expected_digest);
    assert!(snap.companies >= 1);
}

#[test]
fn editor_mode_never_reaches_a_month_end() {
    let mut scenario = default_scenario().unwrap();
    scenario.options.editor_mode = true;
    let mut sim = init_world(&scenario).unwrap();
    sim.run_months(1).unwrap();
    assert_eq!(sim.months_run(), 0);
    assert_eq!(sim.world.clock.date().day, 1);
    assert_eq!(sim.world.companies.active_ai_companies(), 0);
}

#[test]
fn scenario_names_are_registered() {
    let scenario = default_scenario().unwrap();
    let sim = init_world(&scenario).unwrap();
    let strings: &MemoryStringTable = &sim.env.strings;
    for obj in &sim.world.objects.industries {
        assert_eq!(strings.resolve(obj.name_id), obj.name);
    }
    for industry in sim.world.industries.industries() {
        assert!(!strings.resolve(industry.name).is_empty());
    }
}
