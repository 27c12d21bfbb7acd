use ellipt2d::error::SettingsError;
use ellipt2d::settings::ProblemSettings;
use ellipt2d::solver::{SolverKind, SolverSettings};

#[test]
fn default_settings() {
    let settings = ProblemSettings::default();
    assert_eq!(settings.initial_degree, 2);
    assert_eq!(settings.initial_refinements, 3);
    assert_eq!(settings.matrix_solver, SolverKind::Cholesky);
    assert!(settings.parallel_assembly);
    assert_eq!(settings.solver, SolverSettings::default());
    assert!(settings.validate().is_ok());

    assert_eq!(ProblemSettings::from_json_str("{}").unwrap(), settings);
}

#[test]
fn partial_settings_from_json() {
    let json = r#"
        {
            "initial_degree": 4,
            "matrix_solver": "cg",
            "solver": { "tolerance": 1e-8, "max_iterations": 250 }
        }"#;
    let settings = ProblemSettings::from_json_str(json).unwrap();
    assert_eq!(settings.initial_degree, 4);
    assert_eq!(settings.initial_refinements, 3);
    assert_eq!(settings.matrix_solver, SolverKind::Cg);
    assert_eq!(settings.solver.tolerance, 1e-8);
    assert_eq!(settings.solver.max_iterations, 250);
    assert_eq!(settings.create_solver().name(), "cg");
}

#[test]
fn invalid_settings_are_rejected() {
    let result = ProblemSettings::from_json_str(r#"{ "initial_degree": 0 }"#);
    assert!(matches!(result, Err(SettingsError::InvalidValue { field: "initial_degree", .. })));

    let result = ProblemSettings::from_json_str(r#"{ "solver": { "tolerance": -1.0 } }"#);
    assert!(matches!(result, Err(SettingsError::InvalidValue { field: "solver.tolerance", .. })));

    let result = ProblemSettings::from_json_str(r#"{ "matrix_solver": "umfpack" }"#);
    assert!(matches!(result, Err(SettingsError::Parse(_))));

    let result = ProblemSettings::from_json_str("not json");
    assert!(matches!(result, Err(SettingsError::Parse(_))));
}

#[test]
fn missing_settings_file() {
    let result = ProblemSettings::from_json_file("this/file/does/not/exist.json");
    assert!(matches!(result, Err(SettingsError::Io(_))));
}
