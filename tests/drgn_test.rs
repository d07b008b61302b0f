//! Integration tests for cryoDRGN job preparation against a training directory

use std::fs;

use cryodrgn_io::drgn::{
    prepare, read_indices, Analyze, DrgnError, DrgnVersion, EvalVol, GraphTraversal, Launcher,
    TrainingOutput,
};
use tempfile::tempdir;

fn fake_training(dir: &std::path::Path, epochs: u32) {
    for epoch in 0..epochs {
        fs::write(dir.join(format!("z.{}.pkl", epoch)), b"").unwrap();
        fs::write(dir.join(format!("weights.{}.pkl", epoch)), b"").unwrap();
    }
    fs::write(dir.join("config.yaml"), b"").unwrap();
}

fn analyze(output: &TrainingOutput, epoch: u32, last: Option<u32>) -> Analyze {
    Analyze {
        train_dir: output.dir.clone(),
        epoch,
        output_dir: output.analyze_dir(epoch),
        apix: 1.7,
        device: "0".into(),
        downsample: None,
        input_box: 128,
        flip: false,
        invert: false,
        zdim: output.zdim,
        ksample: 20,
        pc: 2,
        last_epoch: last,
    }
}

/// Test analysis of the last epoch found on disk
#[test]
fn test_analyze_last_epoch() {
    let dir = tempdir().unwrap();
    fake_training(dir.path(), 12);
    let version = DrgnVersion::parse("3.4.0").unwrap();
    let output = TrainingOutput::new(dir.path(), 8, version.clone());

    let last = output.last_epoch().unwrap();
    assert_eq!(last, Some(11));

    let job = analyze(&output, 11, last);
    let args = prepare(&job, &version).unwrap();
    assert_eq!(args[1], "11");
    assert!(args.windows(2).any(|w| w == ["--ksample", "20"]));

    let launcher = Launcher::default().with_gpus(vec![1, 3]);
    let line = launcher.shell_line("analyze", &args);
    assert!(line.contains("CUDA_VISIBLE_DEVICES=1,3 cryodrgn analyze "));

    // nothing has been analyzed yet
    assert!(matches!(
        output.volumes(11, 20),
        Err(DrgnError::ArtifactNotFound { .. })
    ));
}

/// Test that an epoch beyond the training is refused before launch
#[test]
fn test_analyze_rejects_future_epoch() {
    let dir = tempdir().unwrap();
    fake_training(dir.path(), 5);
    let version = DrgnVersion::default();
    let output = TrainingOutput::new(dir.path(), 8, version.clone());

    let job = analyze(&output, 9, output.last_epoch().unwrap());
    let err = prepare(&job, &version).unwrap_err();
    assert!(err.to_string().contains("You can analyse only epochs 1-5"));
}

/// Test the graph traversal then volume evaluation chain
#[test]
fn test_graph_traversal_then_eval_vol() {
    let dir = tempdir().unwrap();
    fake_training(dir.path(), 3);
    let version = DrgnVersion::parse("2.3.0").unwrap();
    let output = TrainingOutput::new(dir.path(), 4, version.clone());

    let anchors_file = dir.path().join("anchors.txt");
    fs::write(&anchors_file, "10\n250\n31\n").unwrap();

    let traversal = GraphTraversal {
        z_file: output.z_file(2),
        anchors: read_indices(&anchors_file).unwrap(),
        output: output.graph_path_file(2),
        output_z: output.graph_z_file(2),
    };
    let args = prepare(&traversal, &version).unwrap();
    assert_eq!(&args[1..5], ["--anchors", "10", "250", "31"]);

    let eval = EvalVol {
        weights: output.weights_file(2),
        config: output.config_file(),
        z_file: output.graph_z_file(2),
        output_dir: output.graph_dir(2),
    };
    let args = prepare(&eval, &version).unwrap();
    assert_eq!(args[2], output.config_file().display().to_string());
    assert!(args[2].ends_with("config.yaml"));
}
