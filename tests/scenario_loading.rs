use bizcycle::{scenario::ScenarioLoader, SimError};
use tempfile::tempdir;

fn scenario_loader() -> ScenarioLoader {
    ScenarioLoader::new(env!("CARGO_MANIFEST_DIR"))
}

#[test]
fn scenario_loader_reads_fixture() {
    let loader = scenario_loader();
    let scenario = loader
        .load("scenarios/main_street.yaml")
        .expect("scenario parses");
    assert_eq!(scenario.name, "main_street");
    assert_eq!(scenario.people, 400);
    assert_eq!(scenario.cycles(None), 104);

    let catalog = loader.load_catalog(&scenario).expect("catalog loads");
    let names: Vec<_> = catalog
        .business_types()
        .iter()
        .map(|b| b.name.as_str())
        .collect();
    assert_eq!(
        names,
        ["barber", "cafe", "general_store", "grocer", "hardware_store"]
    );
    let general = catalog.business_type(catalog.business_type_id("general_store").unwrap());
    assert_eq!(general.served().len(), 2);
}

#[test]
fn built_city_matches_scenario() {
    let loader = scenario_loader();
    let scenario = loader.load("scenarios/main_street.yaml").unwrap();
    let (city, _engine) = scenario.build(&loader).unwrap();

    assert_eq!(city.people().len(), 400);
    let locations = city.business_locations().len();
    assert_eq!(city.businesses().len(), locations * 3 / 4);
    assert_eq!(city.age(), 0);
    city.check_invariants().unwrap();
}

#[test]
fn bad_catalog_stops_the_build() {
    let dir = tempdir().unwrap();
    std::fs::write(
        dir.path().join("town.yaml"),
        "name: broken\nseed: 1\nsize: 2\npeople: 3\ncatalog:\n  demand_types: d.json\n  business_types: b.json\n",
    )
    .unwrap();
    std::fs::write(dir.path().join("d.json"), r#"{ "bread": { "rate": -1, "price": 2 } }"#)
        .unwrap();
    std::fs::write(dir.path().join("b.json"), "{}").unwrap();

    let loader = ScenarioLoader::new(dir.path());
    let scenario = loader.load("town.yaml").unwrap();
    let err = scenario.build(&loader).err().expect("negative rate rejected");
    let config = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<SimError>())
        .expect("SimError in chain");
    assert!(matches!(config, SimError::Configuration(_)));
}

#[test]
fn missing_scenario_file_names_the_path() {
    let dir = tempdir().unwrap();
    let err = ScenarioLoader::new(dir.path())
        .load("nowhere.yaml")
        .unwrap_err();
    assert!(format!("{err:#}").contains("nowhere.yaml"));
}

#[test]
fn invalid_occupancy_is_rejected_on_load() {
    let dir = tempdir().unwrap();
    std::fs::write(
        dir.path().join("town.yaml"),
        "name: crowded\nseed: 1\nsize: 2\npeople: 3\ninitial_occupancy: 2.0\ncatalog:\n  demand_types: d.json\n  business_types: b.json\n",
    )
    .unwrap();
    let err = ScenarioLoader::new(dir.path()).load("town.yaml").unwrap_err();
    assert!(format!("{err:#}").contains("initial_occupancy"));
}
