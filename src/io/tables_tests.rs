use std::fs;

use serial_test::serial;

use crate::auxiliary::constants::PhysicalConstants;
use crate::basis::ao::{AngularCounting, BasisAngularOrder, ShellType};
use crate::io::tables::{DirectorySink, MemorySink, TableEmitter, TableKind};
use crate::projection::ShellCoefficientProjector;
use crate::smearing::{SpectralSmearer, SpinChannel};
use crate::target::orbital::selection::SelectedOrbitalSet;
use crate::target::orbital::{MolecularOrbital, WavefunctionModel};

fn model() -> WavefunctionModel {
    let bao = BasisAngularOrder::from_shells(
        &[(ShellType::S, 0), (ShellType::P, 1)],
        AngularCounting::Pure,
    )
    .unwrap();
    let mos = [
        (-0.5, "1.1_a", [1.0, 0.0, 0.0, 0.0]),
        (-0.3, "1.1_b", [0.5, -0.25, 0.25, 0.0]),
    ]
    .iter()
    .enumerate()
    .map(|(i, (e, sym, cs))| {
        MolecularOrbital::builder()
            .index(i + 1)
            .energy(*e)
            .occupation(1.0)
            .symmetry(*sym)
            .coefficients(cs)
            .build()
            .unwrap()
    })
    .collect::<Vec<_>>();
    WavefunctionModel::builder()
        .bao(bao)
        .orbitals(&mos)
        .build()
        .unwrap()
}

#[test]
fn test_tables_discrete_formatting() {
    let model = model();
    let tensor = ShellCoefficientProjector::default()
        .project(&model, &SelectedOrbitalSet::all(&model))
        .unwrap();
    let emitter = TableEmitter::new(PhysicalConstants::default());
    let tables = emitter.discrete_tables(&model, &tensor).unwrap();
    let names = tables.iter().map(|t| t.name()).collect::<Vec<_>>();
    assert_eq!(names, vec!["0.dat", "1.dat", "all_atoms.dat"]);
    assert!(tables.iter().all(|t| t.kind() == TableKind::Discrete));

    let text = tables[0].to_string();
    let lines = text.lines().collect::<Vec<_>>();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("#     E / a.u.         E / eV"));
    assert_eq!(
        lines[1],
        "     -0.50000000      -13.60569300     1.00000000     0.00000000     0.00000000     0.00000000     0.00000000"
    );

    let all_atoms = tables[2].to_string();
    let row = all_atoms.lines().nth(2).unwrap();
    assert_eq!(
        row,
        "     -0.30000000       -8.16341580     0.50000000     0.50000000     0.00000000     0.00000000     0.00000000"
    );
}

#[test]
fn test_tables_smeared_formatting() {
    let model = model();
    let tensor = ShellCoefficientProjector::default()
        .project(&model, &SelectedOrbitalSet::all(&model))
        .unwrap();
    let spectrum = SpectralSmearer::builder()
        .sigma(0.1)
        .points_per_ev(1.0)
        .emin(-14.0)
        .emax(-12.0)
        .spin_polarised(true)
        .build()
        .unwrap()
        .smear(&model, &tensor)
        .unwrap();
    let emitter = TableEmitter::default();
    let tables = emitter.smeared_tables(&spectrum, -1.0);
    let names = tables.iter().map(|t| t.name()).collect::<Vec<_>>();
    assert_eq!(
        names,
        vec![
            "0.smeared.a.dat",
            "1.smeared.a.dat",
            "all_atoms.smeared.a.dat",
            "0.smeared.b.dat",
            "1.smeared.b.dat",
            "all_atoms.smeared.b.dat",
        ]
    );
    assert_eq!(tables[0].kind(), TableKind::Smeared(SpinChannel::Alpha));

    // Grid of 4 points over [-14, -12] shifted by -1 eV.
    let text = tables[0].to_string();
    let lines = text.lines().collect::<Vec<_>>();
    assert_eq!(lines.len(), 5);
    assert_eq!(
        lines[0],
        "#  Energy [eV]      C-s         C-p         C-d         C-f         C-g"
    );
    assert!(lines[1].starts_with("    -13.00000000  "));
    assert!(lines[1].ends_with("  0.00000000  0.00000000  0.00000000  0.00000000"));
    assert_eq!(tables[0].rows().len(), 4);
    assert!(tables.iter().all(|t| t.rows().iter().all(|r| r.len() == t.width())));
}

#[test]
fn test_tables_memory_sink() {
    let model = model();
    let tensor = ShellCoefficientProjector::default()
        .project(&model, &SelectedOrbitalSet::all(&model))
        .unwrap();
    let emitter = TableEmitter::default();
    let tables = emitter.discrete_tables(&model, &tensor).unwrap();
    let mut sink = MemorySink::new();
    emitter.emit(&tables, &mut sink).unwrap();
    assert_eq!(sink.tables().len(), 3);
    assert_eq!(sink.get("1.dat").unwrap().rows()[1][3], 0.5);
    assert!(sink.get("2.dat").is_none());

    let duplicated = [tables[0].clone(), tables[0].clone()];
    assert!(emitter.emit(&duplicated, &mut MemorySink::new()).is_err());
}

#[test]
#[serial]
fn test_tables_directory_sink() {
    let directory = std::env::temp_dir().join("sharpo_tables_directory_sink");
    let _ = fs::remove_dir_all(&directory);

    let model = model();
    let tensor = ShellCoefficientProjector::default()
        .project(&model, &SelectedOrbitalSet::all(&model))
        .unwrap();
    let emitter = TableEmitter::default();
    let tables = emitter.discrete_tables(&model, &tensor).unwrap();
    let mut sink = DirectorySink::new(&directory).unwrap();
    emitter.emit(&tables, &mut sink).unwrap();

    for table in tables.iter() {
        let contents = fs::read_to_string(directory.join(table.name())).unwrap();
        assert_eq!(contents, table.to_string());
    }
    fs::remove_dir_all(&directory).unwrap();
}
