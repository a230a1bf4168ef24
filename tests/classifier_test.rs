use std::path::Path;

use taxoclass::{Classifier, Module, Row, TextConfig, Trainer, TrainingParams};

const TECHNOLOGY_TITLES: [&str; 5] = [
    "quantum processors reach record coherence times",
    "silicon chips accelerate neural network training",
    "startup ships faster graphics processors",
    "compilers learn to optimise vector instructions",
    "datacenter hardware cuts energy usage",
];

const MARINE_TITLES: [&str; 5] = [
    "coral reefs recover after bleaching events",
    "whale migration patterns shift northwards",
    "plankton blooms feed coastal fish populations",
    "seagrass meadows store surprising amounts of carbon",
    "octopus camouflage fools hungry predators",
];

fn write_training_csv(path: &Path) {
    let mut writer = csv::Writer::from_path(path).unwrap();
    writer
        .write_record(["item_title", "abstract_description", "module_id_for_all"])
        .unwrap();
    for round in 0..4 {
        for (i, title) in TECHNOLOGY_TITLES.iter().enumerate() {
            let abstract_text = format!("hardware engineering report number {}{}", round, i);
            writer
                .write_record([*title, abstract_text.as_str(), "s1.m1"])
                .unwrap();
        }
        for (i, title) in MARINE_TITLES.iter().enumerate() {
            let abstract_text = format!("ocean ecology survey number {}{}", round, i);
            writer
                .write_record([*title, abstract_text.as_str(), "s2.m7"])
                .unwrap();
        }
    }
    writer.flush().unwrap();
}

fn article_config() -> TextConfig {
    TextConfig::default().with_text_fields(["item_title", "abstract_description"])
}

fn quick_trainer() -> Trainer {
    let params = TrainingParams {
        dim: 25,
        thread: Some(1),
        ..TrainingParams::default()
    };
    Trainer::new()
        .with_params(params)
        .with_config(article_config())
        .without_quantization()
}

#[test]
fn test_train_predict_evaluate_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("articles.csv");
    let model_path = dir.path().join("classifier.model.bin");
    write_training_csv(&csv_path);

    let trainer = quick_trainer();
    trainer.train(&csv_path, &model_path).unwrap();
    assert!(model_path.exists());

    let classifier = Classifier::with_config(&model_path, article_config()).unwrap();

    // Text drawn from the technology vocabulary
    let predictions = classifier
        .predict_text("quantum processors and silicon chips", 2)
        .unwrap();
    assert!(!predictions.is_empty());
    assert_eq!(predictions[0].module, Module::new(1, 1).unwrap());
    for pair in predictions.windows(2) {
        assert!(pair[0].prob >= pair[1].prob);
    }

    // Rows go through line assembly before prediction
    let row = Row::from_iter([
        ("item_title", "coral reefs and whale migration"),
        ("abstract_description", "ocean ecology survey"),
    ]);
    let predictions = classifier.predict_row(&row, 1).unwrap();
    assert_eq!(predictions[0].module, Module::new(2, 7).unwrap());

    // The model should at least fit its own training data
    let evaluation = trainer.evaluate(&csv_path, &model_path, 1).unwrap();
    assert_eq!(evaluation.examples, 40);
    assert!(
        evaluation.precision() >= 0.9,
        "precision was {}",
        evaluation.precision()
    );
}

#[test]
fn test_empty_input_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("articles.csv");
    let model_path = dir.path().join("classifier.model.bin");
    write_training_csv(&csv_path);
    quick_trainer().train(&csv_path, &model_path).unwrap();

    let classifier = Classifier::with_config(&model_path, article_config()).unwrap();
    assert!(classifier.predict_text("   ", 1).is_err());

    let row = Row::from_iter([("item_title", "no abstract here")]);
    assert!(classifier.predict_row(&row, 1).is_err());
}

#[test]
fn test_missing_model_file() {
    assert!(Classifier::from_file("/no/such/model.bin").is_err());
}
