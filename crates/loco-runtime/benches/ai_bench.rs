use criterion::{black_box, criterion_group, criterion_main, Criterion};
use loco_ai::{CompanyManager, CompanyServices, CompetitorObject, IdleThinker};
use loco_core::{GameConfig, MemoryStringTable, Prng};
use loco_econ::Economy;
use loco_runtime::{
    clone_world_state, default_scenario, init_world, run_months, CompetitorSpec, SyntheticTowns,
};

fn competitors(n: usize, strings: &mut MemoryStringTable) -> Vec<CompetitorObject> {
    (0..n)
        .map(|i| CompetitorSpec {
            name: format!("Owner {i}"),
            last_name: format!("Owner{i}"),
            available_name_prefixes: 0x1FFF,
            available_playstyles: 0x1FFF,
            intelligence: 5,
            aggressiveness: 5,
            competitiveness: 5,
        })
        .map(|spec| spec.intern(strings))
        .collect()
}

fn bench_think_round(c: &mut Criterion) {
    let economy = Economy::new();
    let towns = SyntheticTowns::default();
    let config = GameConfig::default();
    let mut strings = MemoryStringTable::new();
    let objects = competitors(24, &mut strings);
    let mut prng = Prng::new(42, 7);
    let mut manager = CompanyManager::new(14, 0, 1250);
    {
        let mut svc = CompanyServices {
            prng: &mut prng,
            economy: &economy,
            strings: &mut strings,
            towns: &towns,
            competitors: &objects,
            current_day: 0,
        };
        manager.create_player_company(&mut svc);
        for _ in 0..64 {
            manager.produce_companies(&mut svc);
        }
    }
    c.bench_function("ai think 16 ticks", |b| {
        b.iter(|| {
            let mut svc = CompanyServices {
                prng: &mut prng,
                economy: &economy,
                strings: &mut strings,
                towns: &towns,
                competitors: &objects,
                current_day: 0,
            };
            for tick in 0..16 {
                manager.update(tick, false, &config, &mut IdleThinker, &mut svc);
            }
            black_box(manager.active_ai_companies());
        })
    });
}

fn bench_competitor_years(c: &mut Criterion) {
    let mut scenario = default_scenario().expect("default scenario");
    scenario.options.max_competing_companies = 5;
    let w0 = init_world(&scenario).expect("world");
    c.bench_function("ai 5 competitors x 1y", |b| {
        b.iter(|| {
            let w = clone_world_state(&w0);
            let _ = black_box(run_months(w, 12));
        })
    });
}

criterion_group!(benches, bench_think_round, bench_competitor_years);
criterion_main!(benches);
