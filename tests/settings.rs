use lpmodel::engine::*;
use lpmodel::model::*;

#[test]
fn test_engine_settings_setters() {
    let mut model = Model::new();
    model
        .verbose(2)
        .max_iterations(30)
        .presolve(false)
        .scaling(Scaling::Off);
    model.max_seconds(10.).unwrap().primal_tolerance(1e-6).unwrap();

    let settings = model.engine_settings();
    assert_eq!(settings.log_level, 2);
    assert_eq!(settings.max_iterations, 30);
    assert_eq!(settings.max_seconds, 10.);
    assert_eq!(settings.primal_tolerance, 1e-6);
    assert!(!settings.presolve);
    assert_eq!(settings.scaling, Scaling::Off);
}

#[test]
fn test_invalid_settings_are_reverted() {
    let mut model = Model::new();
    model.dual_tolerance(1e-5).unwrap();

    assert!(matches!(
        model.dual_tolerance(-1.),
        Err(ModelError::Settings(SettingsError::BadFieldValue("dual_tolerance")))
    ));
    assert_eq!(model.engine_settings().dual_tolerance, 1e-5);

    assert!(model.max_seconds(f64::NAN).is_err());
    assert!(model.engine_settings().max_seconds.is_infinite());
}

#[test]
fn test_custom_settings() {
    let settings = ModelSettingsBuilder::default()
        .buffer_size(3)
        .smallest_element(1e-3)
        .build()
        .unwrap();
    let engine_settings = EngineSettingsBuilder::default()
        .max_iterations(100)
        .build()
        .unwrap();

    let mut model: Model<MemoryEngine> = Model::with_settings(settings, engine_settings);
    assert_eq!(model.settings().buffer_size, 3);
    assert_eq!(model.engine_settings().max_iterations, 100);

    let x = model.add_variable();
    model.set_variable_upper_bound(x, 1e-4);
    assert_eq!(model.variable_upper_bound(x), 0.);
}
