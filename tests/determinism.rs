use bizcycle::{scenario::ScenarioLoader, City, Engine};

fn main_street() -> (City, Engine) {
    let loader = ScenarioLoader::new(env!("CARGO_MANIFEST_DIR"));
    let scenario = loader
        .load("scenarios/main_street.yaml")
        .expect("scenario should load");
    scenario.build(&loader).expect("scenario builds")
}

fn fingerprint(city: &City) -> serde_json::Value {
    let needs: Vec<Vec<f64>> = city.people().iter().map(|p| p.needs().to_vec()).collect();
    serde_json::json!({
        "report": city.report(),
        "needs": needs,
    })
}

#[test]
fn split_runs_match_a_single_run() {
    let (mut split, mut split_engine) = main_street();
    split_engine.run(&mut split, 10).unwrap();
    split_engine.run(&mut split, 15).unwrap();

    let (mut whole, mut whole_engine) = main_street();
    whole_engine.run(&mut whole, 25).unwrap();

    assert_eq!(split.age(), 25);
    assert_eq!(fingerprint(&split), fingerprint(&whole));
}

#[test]
fn stepping_matches_running() {
    let (mut stepped, mut stepped_engine) = main_street();
    for expected in 1..=8 {
        assert_eq!(stepped_engine.step(&mut stepped).unwrap(), expected);
    }

    let (mut run, mut run_engine) = main_street();
    run_engine.run(&mut run, 8).unwrap();

    assert_eq!(fingerprint(&stepped), fingerprint(&run));
}

#[test]
fn long_run_keeps_occupancy_and_lifespans_consistent() {
    let (mut city, mut engine) = main_street();
    let mut last_failed = 0;
    engine
        .run_with_hook(&mut city, 60, |report| {
            assert_eq!(
                report.occupied_locations, report.active_businesses,
                "cycle {}",
                report.cycle
            );
            assert!(report.failed_businesses >= last_failed);
            last_failed = report.failed_businesses;
            for business in &report.businesses {
                assert!(business.cash >= 0.0, "{} has {}", business.name, business.cash);
            }
            for failed in &report.failed {
                assert_eq!(failed.death_cycle - failed.birth_cycle, failed.lifespan);
                assert!(failed.death_cycle <= report.cycle);
            }
            for (demand, unmet) in &report.unmet_need {
                assert!(*unmet >= 0.0, "{demand} unmet need {unmet}");
            }
        })
        .unwrap();
    city.check_invariants().unwrap();
}
