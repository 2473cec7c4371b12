use super::*;
use crate::primitives::Matrix;

fn sample_4x3() -> Matrix<f64> {
    Matrix::from_vec(
        4,
        3,
        vec![
            2.0, 0.0, 1.0, //
            0.0, 1.0, 3.0, //
            1.0, 3.0, 0.0, //
            4.0, 2.0, 2.0,
        ],
    )
    .expect("valid matrix")
}

/// Points close to a 2D plane inside 5D space.
fn low_rank_data() -> Matrix<f64> {
    let mut data = Vec::new();
    for i in 0..30 {
        let a = (i as f64 * 0.37).sin() * 3.0;
        let b = (i as f64 * 0.91).cos() * 2.0;
        let noise = ((i * 7919) % 13) as f64 * 1e-3;
        data.extend_from_slice(&[
            a + b,
            a - b,
            2.0 * a + noise,
            0.5 * b - noise,
            a + 0.1 * b + 1.0,
        ]);
    }
    Matrix::from_vec(30, 5, data).expect("valid matrix")
}

fn reconstruction_error(pca: &PCA, x: &Matrix<f64>) -> f64 {
    let z = pca.transform(x).expect("transform");
    let back = pca.inverse_transform(&z).expect("inverse");
    x.as_slice()
        .iter()
        .zip(back.as_slice())
        .map(|(a, b)| (a - b) * (a - b))
        .sum::<f64>()
}

#[test]
fn test_fit_4_samples_3_dims() {
    let x = sample_4x3();
    let mut pca = PCA::new(2);
    pca.fit(&x).expect("fit succeeds");

    assert_eq!(pca.mean().expect("fitted").len(), 3);
    assert_eq!(pca.projection_basis().expect("fitted").shape(), (3, 2));
    assert_eq!(pca.transform(&x).expect("transform").shape(), (4, 2));
}

#[test]
fn test_mean_vector_values() {
    let mut pca = PCA::new(1);
    pca.fit(&sample_4x3()).expect("fit");
    let mean = pca.mean().expect("fitted");
    assert!((mean[0] - 1.75).abs() < 1e-12);
    assert!((mean[1] - 1.5).abs() < 1e-12);
    assert!((mean[2] - 1.5).abs() < 1e-12);
}

#[test]
fn test_basis_is_orthonormal() {
    let mut pca = PCA::new(3);
    pca.fit(&low_rank_data()).expect("fit");
    let basis = pca.projection_basis().expect("fitted");

    for a in 0..3 {
        let ca = basis.column(a);
        assert!((ca.norm() - 1.0).abs() < 1e-6, "column {a} not unit length");
        for b in (a + 1)..3 {
            let dot = ca.dot(&basis.column(b));
            assert!(dot.abs() < 1e-6, "columns {a},{b} not orthogonal: {dot}");
        }
    }
}

#[test]
fn test_eigenvalues_descending() {
    let mut pca = PCA::new(2);
    pca.fit(&low_rank_data()).expect("fit");
    let ev = pca.sorted_eigenvalues().expect("fitted");
    assert_eq!(ev.len(), 5);
    for w in ev.windows(2) {
        assert!(w[0] >= w[1], "eigenvalues not sorted: {ev:?}");
    }
}

#[test]
fn test_population_covariance_divisor() {
    // Two points at ±1 on a single axis: variance with divisor N is exactly 1
    let x = Matrix::from_vec(2, 1, vec![-1.0, 1.0]).expect("valid");
    let mut pca = PCA::new(1);
    pca.fit(&x).expect("fit");
    let ev = pca.sorted_eigenvalues().expect("fitted");
    assert!((ev[0] - 1.0).abs() < 1e-12);
}

#[test]
fn test_explained_variance_ratio_bounded() {
    let mut pca = PCA::new(2);
    pca.fit(&low_rank_data()).expect("fit");
    let ratio = pca.explained_variance_ratio().expect("fitted");
    assert_eq!(ratio.len(), 2);
    assert!(ratio.iter().all(|&r| (0.0..=1.0).contains(&r)));
    assert!(ratio.iter().sum::<f64>() > 0.99, "2 components cover a rank-2 cloud");
}

#[test]
fn test_reconstruction_error_decreases_with_components() {
    let x = low_rank_data();
    let mut errors = Vec::new();
    for k in 1..=5 {
        let mut pca = PCA::new(k);
        pca.fit(&x).expect("fit");
        errors.push(reconstruction_error(&pca, &x));
    }
    for w in errors.windows(2) {
        assert!(w[1] <= w[0] + 1e-9, "error grew: {errors:?}");
    }
    assert!(errors[4] < 1e-9, "full basis reconstructs exactly");
}

#[test]
fn test_transform_not_fitted() {
    let pca = PCA::new(1);
    let err = pca.transform(&sample_4x3()).expect_err("must fail before fit");
    assert!(matches!(err, EigenError::NotFitted { model: "PCA" }));
}

#[test]
fn test_transform_wrong_width() {
    let mut pca = PCA::new(1);
    pca.fit(&sample_4x3()).expect("fit");
    let wrong = Matrix::zeros(2, 4);
    assert!(matches!(
        pca.transform(&wrong),
        Err(EigenError::ShapeError { .. })
    ));
}

#[test]
fn test_invalid_n_components() {
    let x = sample_4x3();
    assert!(matches!(
        PCA::new(4).fit(&x),
        Err(EigenError::InvalidHyperparameter { .. })
    ));
    assert!(PCA::new(0).fit(&x).is_err());
}

#[test]
fn test_empty_input() {
    let x = Matrix::zeros(0, 3);
    assert!(matches!(
        PCA::new(1).fit(&x),
        Err(EigenError::EmptyInput { .. })
    ));
}

#[test]
fn test_refit_replaces_state() {
    let mut pca = PCA::new(1);
    pca.fit(&sample_4x3()).expect("fit");
    let other = Matrix::from_vec(3, 3, vec![10.0; 9]).expect("valid");
    pca.fit(&other).expect("refit");
    let mean = pca.mean().expect("fitted");
    assert!(mean.iter().all(|&m| (m - 10.0).abs() < 1e-12));
}

#[test]
fn test_single_sample_fit() {
    let x = Matrix::from_vec(1, 2, vec![3.0, 4.0]).expect("valid");
    let mut pca = PCA::new(2);
    let z = pca.fit_transform(&x).expect("a single sample is valid input");
    assert!(z.as_slice().iter().all(|v| v.abs() < 1e-12));
}

#[test]
fn test_from_parameters_matches_fitted() {
    let x = sample_4x3();
    let mut pca = PCA::new(2);
    pca.fit(&x).expect("fit");

    let loaded = PCA::from_parameters(
        pca.mean().expect("fitted").to_vec(),
        pca.projection_basis().expect("fitted").clone(),
    )
    .expect("consistent shapes");
    assert_eq!(loaded.n_components(), 2);
    assert_eq!(
        loaded.transform(&x).expect("transform"),
        pca.transform(&x).expect("transform")
    );
    assert!(loaded.sorted_eigenvalues().is_none());
}

#[test]
fn test_from_parameters_shape_mismatch() {
    let result = PCA::from_parameters(vec![0.0; 4], Matrix::zeros(3, 2));
    assert!(matches!(result, Err(EigenError::ShapeError { .. })));
}
