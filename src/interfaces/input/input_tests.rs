use std::fs;
use std::path::{Path, PathBuf};

use serial_test::serial;

use crate::basis::ao::AngularCounting;
use crate::errors::SharpoError;
use crate::interfaces::InputHandle;
use crate::io::read_sharpo_yaml;

use super::{Input, WavefunctionSource};

const ROOT: &str = env!("CARGO_MANIFEST_DIR");

#[test]
fn test_interfaces_input_inline() {
    let name = format!("{ROOT}/tests/input/test_input_inline.yml");
    let inp = read_sharpo_yaml::<Input, _>(&name).unwrap();

    assert_eq!(inp.selection, Some(vec![2]));
    assert_eq!(inp.output_directory(), Path::new("pdos_inline"));

    let params = &inp.projected_dos;
    assert_eq!(params.sigma, 0.2);
    assert_eq!(params.points_per_ev, 20.0);
    assert_eq!(params.energy_window, Some((-15.0, -5.0)));
    assert!(!params.fermi_shift);
    assert!(params.spin_polarised);
    assert!(params.write_discrete);
    assert!(params.write_smeared);
    assert!(params.truncation.is_none());

    let model = inp.wavefunction.load().unwrap();
    assert_eq!(model.n_orbitals(), 2);
    assert_eq!(model.n_atoms(), 2);
    assert_eq!(model.bao().counting(), AngularCounting::Pure);
    assert_eq!(model.orbital(2).unwrap().coefficients, vec![0.5, -0.25, 0.25, 0.0]);
}

#[test]
fn test_interfaces_input_from_file() {
    let name = format!("{ROOT}/tests/input/test_input_from_file.yml");
    let inp = read_sharpo_yaml::<Input, _>(&name).unwrap();

    assert!(inp.selection.is_none());
    assert_eq!(inp.output_directory(), Path::new("sharpo_tables"));
    assert_eq!(inp.projected_dos.energy_window, Some((-3.0, 1.0)));
    assert!(inp.projected_dos.fermi_shift);
    assert!(!inp.projected_dos.write_discrete);
    assert_eq!(inp.projected_dos.truncation, Some(8.0));

    let path = match &inp.wavefunction {
        WavefunctionSource::FromFile(path) => path.clone(),
        WavefunctionSource::Inline(_) => panic!("Expected a wavefunction file."),
    };
    assert_eq!(path, PathBuf::from("tests/input/h2o_model.yml"));

    let model = WavefunctionSource::FromFile(Path::new(ROOT).join(path))
        .load()
        .unwrap();
    assert_eq!(model.n_orbitals(), 5);
    assert_eq!(model.n_atoms(), 3);
    assert_eq!(model.homo().unwrap().index, 4);
    assert!(!model.is_spin_labelled());

    let missing = WavefunctionSource::FromFile(PathBuf::from(format!(
        "{ROOT}/tests/input/does_not_exist.yml"
    )));
    assert!(missing.load().is_err());
}

#[test]
fn test_interfaces_input_inconsistent_model() {
    let name = format!("{ROOT}/tests/input/test_input_inconsistent.yml");
    let inp = read_sharpo_yaml::<Input, _>(&name).unwrap();
    let err = inp.wavefunction.load().unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SharpoError>(),
        Some(SharpoError::ModelConsistency(_))
    ));
    assert!(inp.handle().is_err());
}

#[test]
fn test_interfaces_input_template_round_trip() {
    let template = Input::default();
    let text = serde_yaml::to_string(&template).unwrap();
    let read_back: Input = serde_yaml::from_str(&text).unwrap();
    assert_eq!(read_back, template);
    assert!(read_back.wavefunction.load().is_ok());
}

#[test]
#[serial]
fn test_interfaces_input_handle() {
    let directory = std::env::temp_dir().join("sharpo_input_handle");
    let _ = fs::remove_dir_all(&directory);

    let name = format!("{ROOT}/tests/input/test_input_from_file.yml");
    let mut inp = read_sharpo_yaml::<Input, _>(&name).unwrap();
    if let WavefunctionSource::FromFile(path) = &inp.wavefunction {
        inp.wavefunction = WavefunctionSource::FromFile(Path::new(ROOT).join(path));
    }
    inp.output_directory = directory.clone();
    inp.handle().unwrap();

    let mut written = fs::read_dir(&directory)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
        .collect::<Vec<_>>();
    written.sort();
    assert_eq!(
        written,
        vec![
            "0.smeared.dat",
            "1.smeared.dat",
            "2.smeared.dat",
            "all_atoms.smeared.dat"
        ]
    );

    // The only orbital in the window is the HOMO, whose peak sits at zero.
    let contents = fs::read_to_string(directory.join("0.smeared.dat")).unwrap();
    let mut lines = contents.lines();
    assert!(lines.next().unwrap().starts_with("#  Energy [eV]"));
    let first = lines
        .next()
        .unwrap()
        .split_whitespace()
        .map(|v| v.parse::<f64>().unwrap())
        .collect::<Vec<_>>();
    assert_eq!(first.len(), 6);
    approx::assert_relative_eq!(first[0], -3.0, epsilon = 1e-8);
    fs::remove_dir_all(&directory).unwrap();
}
