use approx::assert_abs_diff_eq;
use ndarray::array;
use proptest::prelude::*;

use crate::basis::ao::{AngularCounting, BasisAngularOrder, ShellCountPolicy, ShellType};
use crate::errors::SharpoError;
use crate::projection::ShellCoefficientProjector;
use crate::target::orbital::selection::SelectedOrbitalSet;
use crate::target::orbital::{MolecularOrbital, WavefunctionModel};

fn model_from(
    shells: &[(ShellType, usize)],
    counting: AngularCounting,
    coefficients: &[Vec<f64>],
) -> WavefunctionModel {
    let bao = BasisAngularOrder::from_shells(shells, counting).unwrap();
    let mos = coefficients
        .iter()
        .enumerate()
        .map(|(i, cs)| {
            MolecularOrbital::builder()
                .index(i + 1)
                .energy(-0.5 + 0.1 * i as f64)
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
fn test_shell_projection_pure() {
    // s(0) p(0) d(1) s(1): 1 + 3 + 5 + 1 coefficients.
    let cs = vec![
        0.5, 0.1, -0.2, 0.3, -0.4, 0.05, 0.06, -0.07, 0.08, -0.9,
    ];
    let model = model_from(
        &[
            (ShellType::S, 0),
            (ShellType::P, 0),
            (ShellType::D, 1),
            (ShellType::S, 1),
        ],
        AngularCounting::Pure,
        &[cs],
    );
    let projector = ShellCoefficientProjector::default();
    let tensor = projector
        .project(&model, &SelectedOrbitalSet::all(&model))
        .unwrap();
    assert_eq!(tensor.magnitudes().shape(), &[1, 2, 5]);
    assert_abs_diff_eq!(tensor.magnitude(0, 0, ShellType::S), 0.5);
    assert_abs_diff_eq!(tensor.magnitude(0, 0, ShellType::P), 0.6, epsilon = 1e-15);
    assert_abs_diff_eq!(tensor.magnitude(0, 0, ShellType::D), 0.0);
    assert_abs_diff_eq!(tensor.magnitude(0, 1, ShellType::D), 0.66, epsilon = 1e-15);
    assert_abs_diff_eq!(tensor.magnitude(0, 1, ShellType::S), 0.9);
    assert_abs_diff_eq!(
        tensor.shell_magnitudes(0, 1).sum(),
        0.4 + 0.05 + 0.06 + 0.07 + 0.08 + 0.9,
        epsilon = 1e-14
    );

    let all_atoms = tensor.all_atoms();
    assert_eq!(all_atoms.shape(), &[1, 5]);
    for (&actual, &expected) in all_atoms.iter().zip(array![1.4, 0.6, 0.66, 0.0, 0.0].iter()) {
        assert_abs_diff_eq!(actual, expected, epsilon = 1e-14);
    }
}

#[test]
fn test_shell_projection_cartesian_tails() {
    // d(0) f(0) g(1) under Cartesian counting: 6 + 10 + 14 coefficients.
    let cs = (0..30).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect::<Vec<_>>();
    let model = model_from(
        &[(ShellType::D, 0), (ShellType::F, 0), (ShellType::G, 1)],
        AngularCounting::Cart,
        &[cs],
    );
    let tensor = ShellCoefficientProjector::default()
        .project(&model, &SelectedOrbitalSet::all(&model))
        .unwrap();
    assert_abs_diff_eq!(tensor.magnitude(0, 0, ShellType::D), 6.0);
    assert_abs_diff_eq!(tensor.magnitude(0, 0, ShellType::F), 10.0);
    assert_abs_diff_eq!(tensor.magnitude(0, 1, ShellType::G), 14.0);

    // Conventional counting consumes 15 Cartesian g functions.
    let err = ShellCoefficientProjector::new(ShellCountPolicy::conventional())
        .project(&model, &SelectedOrbitalSet::all(&model))
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SharpoError>(),
        Some(SharpoError::ModelConsistency(_))
    ));
}

#[test]
fn test_shell_projection_short_coefficients() {
    // Pure d needs 5 coefficients, Cartesian d needs 6.
    let model = model_from(
        &[(ShellType::S, 0), (ShellType::D, 0)],
        AngularCounting::Cart,
        &[vec![1.0; 6], vec![1.0; 6]],
    );
    let err = ShellCoefficientProjector::default()
        .project(&model, &SelectedOrbitalSet::all(&model))
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SharpoError>(),
        Some(SharpoError::ModelConsistency(_))
    ));

    let model_pure = model_from(
        &[(ShellType::S, 0), (ShellType::D, 0)],
        AngularCounting::Pure,
        &[vec![1.0; 6], vec![1.0; 6]],
    );
    assert!(ShellCoefficientProjector::default()
        .project(&model_pure, &SelectedOrbitalSet::all(&model_pure))
        .is_ok());

    // Surplus coefficients are rejected rather than dropped.
    let model_long = model_from(&[(ShellType::S, 0)], AngularCounting::Pure, &[vec![1.0, 5.0, 7.0]]);
    let err = ShellCoefficientProjector::default()
        .project(&model_long, &SelectedOrbitalSet::all(&model_long))
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SharpoError>(),
        Some(SharpoError::ModelConsistency(_))
    ));
}

#[test]
fn test_shell_projection_accumulation_order() {
    // Two p shells share one bucket; each coefficient is folded in basis order, so the two unit
    // contributions of the second shell are each absorbed by the large first one.
    let cs = vec![1.0e16, 0.0, 0.0, 1.0, 1.0, 0.0];
    let model = model_from(
        &[(ShellType::P, 0), (ShellType::P, 0)],
        AngularCounting::Pure,
        &[cs.clone()],
    );
    let tensor = ShellCoefficientProjector::default()
        .project(&model, &SelectedOrbitalSet::all(&model))
        .unwrap();
    let expected = cs.iter().fold(0.0, |acc, c: &f64| acc + c.abs());
    assert_eq!(tensor.magnitude(0, 0, ShellType::P), expected);
    assert_eq!(expected, 1.0e16);
}

#[test]
fn test_shell_projection_selection_order_and_range() {
    let model = model_from(
        &[(ShellType::S, 0), (ShellType::S, 1)],
        AngularCounting::Pure,
        &[vec![1.0, 0.0], vec![0.0, -2.0], vec![0.5, 0.5]],
    );
    let projector = ShellCoefficientProjector::default();
    let selection = SelectedOrbitalSet::new(&[2, 1], &model).unwrap();
    let tensor = projector.project(&model, &selection).unwrap();
    assert_eq!(tensor.selection().indices(), &[2, 1]);
    assert_abs_diff_eq!(tensor.magnitude(0, 1, ShellType::S), 2.0);
    assert_abs_diff_eq!(tensor.magnitude(1, 0, ShellType::S), 1.0);

    let small = model_from(&[(ShellType::S, 0)], AngularCounting::Pure, &[vec![1.0]]);
    let selection_3 = SelectedOrbitalSet::new(&[3], &model).unwrap();
    let err = projector.project(&small, &selection_3).unwrap_err();
    assert_eq!(
        err.downcast_ref::<SharpoError>(),
        Some(&SharpoError::IndexOutOfRange {
            index: 3,
            n_orbitals: 1
        })
    );
}

proptest! {
    #[test]
    fn test_shell_projection_per_atom_exactness(
        cs in proptest::collection::vec(-2.0..2.0f64, 18),
    ) {
        // s(0) p(1) d(0) s(2) p(2) s(1) s(0) s(2) s(1) s(0): 1+3+5+1+3+1+1+1+1+1 = 18
        let shells = [
            (ShellType::S, 0),
            (ShellType::P, 1),
            (ShellType::D, 0),
            (ShellType::S, 2),
            (ShellType::P, 2),
            (ShellType::S, 1),
            (ShellType::S, 0),
            (ShellType::S, 2),
            (ShellType::S, 1),
            (ShellType::S, 0),
        ];
        let model = model_from(&shells, AngularCounting::Pure, &[cs.clone()]);
        let policy = ShellCountPolicy::default();
        let tensor = ShellCoefficientProjector::default()
            .project(&model, &SelectedOrbitalSet::all(&model))
            .unwrap();
        let boundaries = model.bao().shell_boundary_indices(&policy);
        for atom in 0..3 {
            let expected = model
                .bao()
                .iter()
                .zip(boundaries.iter())
                .filter(|(ao, _)| ao.atom == atom)
                .map(|(_, &(start, end))| cs[start..end].iter().map(|c| c.abs()).sum::<f64>())
                .sum::<f64>();
            let actual = tensor.shell_magnitudes(0, atom).sum();
            prop_assert!((expected - actual).abs() < 1e-12);
        }
        let total = cs.iter().map(|c| c.abs()).sum::<f64>();
        prop_assert!((tensor.magnitudes().sum() - total).abs() < 1e-12);
    }
}
