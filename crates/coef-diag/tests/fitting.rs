use std::io::Cursor;

use coef_diag::{cooling_curve, parse_species, polyfit, ParseOptions, Polynomial};

fn close(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol * (1.0 + b.abs())
}

#[test]
fn recovers_a_known_quadratic() {
    let truth = Polynomial::new(vec![2.0, -0.5, 0.25]);
    let x: Vec<f64> = (0..20).map(|i| i as f64 * 0.5).collect();
    let y: Vec<f64> = x.iter().map(|&x| truth.eval(x)).collect();

    let fit = polyfit(&x, &y, 2).unwrap();
    assert_eq!(fit.degree(), 2);
    for (got, want) in fit.coefficients().iter().zip(truth.coefficients()) {
        assert!(close(*got, *want, 1e-9), "{got} vs {want}");
    }
}

#[test]
fn large_time_values_stay_well_conditioned() {
    let truth = Polynomial::new(vec![1.0e4, -3.0e-3]);
    let x: Vec<f64> = (0..50).map(|i| 1.0e5 + i as f64 * 100.0).collect();
    let y: Vec<f64> = x.iter().map(|&x| truth.eval(x)).collect();
    let fit = polyfit(&x, &y, 1).unwrap();
    assert!(close(fit.coefficients()[1], -3.0e-3, 1e-8));
}

#[test]
fn rejects_underdetermined_and_mismatched_input() {
    assert!(polyfit(&[1.0, 2.0], &[1.0, 2.0], 2).is_err());
    assert!(polyfit(&[1.0, 2.0, 3.0], &[1.0, 2.0], 1).is_err());
    assert!(polyfit(&[1.0, f64::NAN, 3.0], &[1.0, 2.0, 3.0], 1).is_err());
}

#[test]
fn cooling_curve_scales_time_and_reports_slope() {
    let text = "\
# Time Temp Etot
0.0 100.0 1.0
1.0 90.0 1.0
2.0 80.0 1.0
3.0 70.0 1.0
";
    let series = parse_species(Cursor::new(text), &ParseOptions::flat()).unwrap();
    let curve = cooling_curve(&series, "Temp", 1, 1.0e3).unwrap();
    assert_eq!(curve.rows.len(), 4);
    let last = curve.rows[3];
    assert!(close(last.time, 3.0e3, 1e-12));
    assert!(close(last.fitted, 70.0, 1e-9));
    assert!(close(last.slope, -10.0, 1e-9));

    assert!(cooling_curve(&series, "Dens", 1, 1.0).is_err());
}
