use std::io::Write;

use progressive_tracer_lib::{
    scene::{Scene, ScenePlacement},
    TracerConfig, TracerError,
};

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn loads_recognized_options() {
    let file = write_config(
        r#"{
            "seed": 42,
            "sphereCountMax": 10,
            "radiusRange": { "min": 3.0, "max": 8.0 },
            "placementRadius": 50.0,
            "maxBounces": 4
        }"#,
    );
    let config = TracerConfig::load(Some(file.path())).unwrap();
    assert_eq!(config.seed, 42);
    assert_eq!(config.sphere_count_max, 10);
    assert_eq!(config.placement_radius, 50.0);
    assert_eq!(config.bounces(), 4);
}

#[test]
fn negative_seed_loads_and_generates_deterministically() {
    let file = write_config(r#"{ "seed": -5, "sphereCountMax": 30 }"#);
    let config = TracerConfig::load(Some(file.path())).unwrap();
    assert_eq!(config.seed, -5);

    let placement = ScenePlacement::from(&config);
    assert_eq!(placement.seed, (-5i64) as u64);
    let scene = Scene::generate(&placement);
    assert!(!scene.is_empty());
    assert_eq!(scene, Scene::generate(&ScenePlacement::from(&config)));
}

#[test]
fn missing_path_uses_defaults() {
    let config = TracerConfig::load(None).unwrap();
    assert_eq!(config, TracerConfig::default());
}

#[test]
fn out_of_range_bounces_are_clamped_on_load() {
    let file = write_config(r#"{ "maxBounces": 0 }"#);
    assert_eq!(TracerConfig::load(Some(file.path())).unwrap().bounces(), 1);

    let file = write_config(r#"{ "maxBounces": 99 }"#);
    assert_eq!(TracerConfig::load(Some(file.path())).unwrap().bounces(), 16);
}

#[test]
fn inverted_radius_range_fails_to_load() {
    let file = write_config(r#"{ "radiusRange": { "min": 9.0, "max": 2.0 } }"#);
    assert!(matches!(
        TracerConfig::load(Some(file.path())),
        Err(TracerError::Config(_))
    ));
}

#[test]
fn malformed_json_is_reported() {
    let file = write_config("{ seed: ");
    assert!(matches!(
        TracerConfig::load(Some(file.path())),
        Err(TracerError::Json(_))
    ));
}
