//! Integration tests for value functions, training methods and weight files.

use pitch_learn::core::{Side, TrainError, TrainRng};
use pitch_learn::features::NUM_FEATURES;
use pitch_learn::policy::{load_combined, save_combined, PolicyTrainer};
use pitch_learn::records::{GameLog, ResultRecord};
use pitch_learn::value::{
    monte_carlo, monte_carlo_shaped, td0, td_lambda, train_log, LinearValue, ModelKind,
    NeuralValue, ShapingWeights, TrainParams, TrainingMethod, ValueFunction, ValueModel,
    WeightFile,
};

fn result(winner: Option<Side>) -> ResultRecord {
    ResultRecord {
        home_score: i32::from(winner == Some(Side::Home)),
        away_score: i32::from(winner == Some(Side::Away)),
        winner,
    }
}

/// The two-state home log from the training walkthrough.
fn walkthrough_log(winner: Option<Side>) -> GameLog {
    GameLog::new()
        .with_state(vec![1.0, 0.0, 0.5, 0.0, 1.0], Side::Home)
        .with_state(vec![1.0, 0.0, 0.6, 0.0, 1.0], Side::Home)
        .with_result(result(winner))
}

fn random_features(rng: &mut TrainRng) -> Vec<f64> {
    let mut f: Vec<f64> = (0..NUM_FEATURES).map(|_| rng.uniform(-1.0, 1.0)).collect();
    f[29] = 1.0;
    f
}

/// Interleaved home and away turns, three each.
fn two_sided_log(seed: u64, winner: Option<Side>) -> GameLog {
    let mut rng = TrainRng::new(seed);
    let mut log = GameLog::new();
    for _ in 0..3 {
        log = log
            .with_state(random_features(&mut rng), Side::Home)
            .with_state(random_features(&mut rng), Side::Away);
    }
    log.with_result(result(winner))
}

fn probe() -> Vec<f64> {
    let mut rng = TrainRng::new(99);
    random_features(&mut rng)
}

fn assert_close(a: &[f64], b: &[f64], tol: f64) {
    assert_eq!(a.len(), b.len());
    for (i, (x, y)) in a.iter().zip(b).enumerate() {
        assert!((x - y).abs() < tol, "index {i}: {x} vs {y}");
    }
}

// =============================================================================
// Walkthrough Scenarios
// =============================================================================

#[test]
fn test_mc_win_increases_bias_weight() {
    let mut model = LinearValue::new(5, 0.1);
    monte_carlo(&mut model, &walkthrough_log(Some(Side::Home)));
    // First step: 0.1 * 1.0. Second: V = 0.23, so 0.1 * 0.77 more.
    assert!((model.weights()[0] - 0.177).abs() < 1e-12);
    assert_eq!(model.weights()[1], 0.0);
}

#[test]
fn test_mc_loss_decreases_bias_weight() {
    let mut model = LinearValue::new(5, 0.1);
    monte_carlo(&mut model, &walkthrough_log(Some(Side::Away)));
    assert!(model.weights()[0] < 0.0);
}

#[test]
fn test_mc_draw_from_zero_changes_nothing() {
    let mut model = LinearValue::new(5, 0.1);
    monte_carlo(&mut model, &walkthrough_log(None));
    assert!(model.weights().iter().all(|w| *w == 0.0));
}

#[test]
fn test_incomplete_log_is_a_no_op_for_every_method() {
    let mut log = two_sided_log(1, Some(Side::Home));
    log.result = None;
    let start: Vec<f64> = (0..NUM_FEATURES).map(|i| i as f64 * 0.01).collect();

    for method in TrainingMethod::ALL {
        let mut model = LinearValue::from_weights(start.clone(), 0.1);
        train_log(&mut model, &log, method, &TrainParams::default());
        assert_eq!(model.weights(), &start[..], "{method}");
    }
}

// =============================================================================
// Method Equivalences
// =============================================================================

#[test]
fn test_td_lambda_zero_matches_td0_linear() {
    for (seed, winner) in [(3, Some(Side::Home)), (4, Some(Side::Away)), (5, None)] {
        let log = two_sided_log(seed, winner);
        let start: Vec<f64> = probe().iter().map(|v| v * 0.1).collect();

        let mut a = LinearValue::from_weights(start.clone(), 0.05);
        let mut b = LinearValue::from_weights(start, 0.05);
        td0(&mut a, &log, 0.99);
        td_lambda(&mut b, &log, 0.99, 0.0);
        assert_close(a.weights(), b.weights(), 1e-5);
    }
}

#[test]
fn test_td_lambda_zero_matches_td0_neural() {
    let log = two_sided_log(8, Some(Side::Home));
    let mut a = NeuralValue::new(NUM_FEATURES, 8, 0.05, &mut TrainRng::new(21));
    let mut b = NeuralValue::new(NUM_FEATURES, 8, 0.05, &mut TrainRng::new(21));
    td0(&mut a, &log, 0.99);
    td_lambda(&mut b, &log, 0.99, 0.0);

    assert_close(&a.params().w1, &b.params().w1, 1e-5);
    assert_close(&a.params().b1, &b.params().b1, 1e-5);
    assert_close(&a.params().w2, &b.params().w2, 1e-5);
    assert!((a.params().b2 - b.params().b2).abs() < 1e-5);
}

#[test]
fn test_td_lambda_differs_from_td0_when_traces_matter() {
    let log = two_sided_log(9, Some(Side::Home));
    let mut a = LinearValue::new(NUM_FEATURES, 0.05);
    let mut b = LinearValue::new(NUM_FEATURES, 0.05);
    td0(&mut a, &log, 0.99);
    td_lambda(&mut b, &log, 0.99, 0.9);
    let diff: f64 = a.weights().iter().zip(b.weights()).map(|(x, y)| (x - y).abs()).sum();
    assert!(diff > 1e-6);
}

#[test]
fn test_empty_shaping_matches_plain_mc() {
    for seed in [11, 12] {
        let log = two_sided_log(seed, Some(Side::Away));

        let mut a = LinearValue::new(NUM_FEATURES, 0.05);
        let mut b = LinearValue::new(NUM_FEATURES, 0.05);
        monte_carlo(&mut a, &log);
        monte_carlo_shaped(&mut b, &log, 0.99, &ShapingWeights::none());
        assert_close(a.weights(), b.weights(), 1e-12);

        let mut a = NeuralValue::new(NUM_FEATURES, 6, 0.05, &mut TrainRng::new(seed));
        let mut b = NeuralValue::new(NUM_FEATURES, 6, 0.05, &mut TrainRng::new(seed));
        monte_carlo(&mut a, &log);
        monte_carlo_shaped(&mut b, &log, 0.99, &ShapingWeights::none());
        assert_close(&a.params().w1, &b.params().w1, 1e-12);
    }
}

#[test]
fn test_default_shaping_changes_the_update() {
    let log = two_sided_log(13, Some(Side::Home));
    let mut a = LinearValue::new(NUM_FEATURES, 0.05);
    let mut b = LinearValue::new(NUM_FEATURES, 0.05);
    monte_carlo(&mut a, &log);
    monte_carlo_shaped(&mut b, &log, 0.99, &ShapingWeights::default());
    assert_ne!(a.weights(), b.weights());
}

// =============================================================================
// Persistence
// =============================================================================

fn trained_model(kind: ModelKind) -> ValueModel {
    let mut rng = TrainRng::new(31);
    let mut model = ValueModel::create(kind, NUM_FEATURES, 8, 0.05, &mut rng);
    model.train(
        &two_sided_log(32, Some(Side::Home)),
        TrainingMethod::TdLambda,
        &TrainParams::default(),
    );
    model
}

#[test]
fn test_value_only_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    for kind in [ModelKind::Linear, ModelKind::Neural] {
        let path = dir.path().join(format!("{kind}.json"));
        let model = trained_model(kind);
        model.save(&path).unwrap();

        let loaded = ValueModel::load(&path, 0.05).unwrap();
        assert_eq!(loaded.kind(), kind);
        assert_eq!(loaded.evaluate(&probe()), model.evaluate(&probe()));
    }
}

#[test]
fn test_combined_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    for kind in [ModelKind::Linear, ModelKind::Neural] {
        let path = dir.path().join(format!("combined_{kind}.json"));
        let model = trained_model(kind);
        let policy = PolicyTrainer::from_parts(vec![0.25; 85], -0.5, 0.01, 0.7);
        save_combined(&model, &policy, &path).unwrap();

        let file = WeightFile::read(&path).unwrap();
        assert!(file.is_combined());

        let (value, loaded_policy) = load_combined(&path, 0.05, 0.01).unwrap();
        assert_eq!(value.evaluate(&probe()), model.evaluate(&probe()));
        assert_eq!(loaded_policy.weights(), policy.weights());
        assert_eq!(loaded_policy.bias(), -0.5);
        assert_eq!(loaded_policy.temperature(), 0.7);

        // The value half is readable on its own.
        let value_only = ValueModel::load(&path, 0.05).unwrap();
        assert_eq!(value_only.evaluate(&probe()), model.evaluate(&probe()));
    }
}

#[test]
fn test_value_only_file_loads_as_combined_with_fresh_policy() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("w.json");
    trained_model(ModelKind::Linear).save(&path).unwrap();

    let (_, policy) = load_combined(&path, 0.05, 0.02).unwrap();
    assert!(policy.weights().iter().all(|w| *w == 0.0));
    assert_eq!(policy.bias(), 0.0);
    assert_eq!(policy.learning_rate(), 0.02);
}

#[test]
fn test_linear_file_is_padded_or_truncated() {
    let dir = tempfile::tempdir().unwrap();
    let short = dir.path().join("short.json");
    std::fs::write(&short, "[0.5, 0.25]").unwrap();
    let model = LinearValue::load(&short, 0.01).unwrap();
    assert_eq!(model.weights().len(), NUM_FEATURES);
    assert_eq!(model.weights()[1], 0.25);
    assert_eq!(model.weights()[2], 0.0);

    let long = dir.path().join("long.json");
    let values = vec![1.0; NUM_FEATURES + 10];
    std::fs::write(&long, serde_json::to_string(&values).unwrap()).unwrap();
    assert_eq!(LinearValue::load(&long, 0.01).unwrap().weights().len(), NUM_FEATURES);
}

#[test]
fn test_neural_file_rejected_by_linear_loader() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("net.json");
    trained_model(ModelKind::Neural).save(&path).unwrap();

    let err = LinearValue::load(&path, 0.01).unwrap_err();
    assert!(matches!(
        err,
        TrainError::ModelMismatch {
            expected: "linear",
            ..
        }
    ));

    let flat = dir.path().join("flat.json");
    trained_model(ModelKind::Linear).save(&flat).unwrap();
    assert!(NeuralValue::load(&flat, 0.01).is_err());
}

#[test]
fn test_neural_file_carries_type_tag() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("net.json");
    trained_model(ModelKind::Neural).save(&path).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(json["type"], "neural");
    assert_eq!(json["hidden_size"], 8);
    assert_eq!(json["W1"].as_array().unwrap().len(), NUM_FEATURES);
}

#[test]
fn test_trait_evaluate_matches_model_dispatch() {
    let model = trained_model(ModelKind::Linear);
    if let ValueModel::Linear(inner) = &model {
        assert_eq!(inner.evaluate(&probe()), model.evaluate(&probe()));
    } else {
        panic!("expected a linear model");
    }
}
