use tactus::Curve;

fn approx(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol
}

#[test]
fn catalog_curves_span_zero_to_one() {
    for curve in Curve::catalog() {
        if *curve != Curve::INSTANT {
            assert!(approx(curve.eval(0.0), 0.0, 1e-3), "{curve} at 0: {}", curve.eval(0.0));
        }
        assert!(approx(curve.eval(1.0), 1.0, 1e-3), "{curve} at 1: {}", curve.eval(1.0));
    }
}

#[test]
fn step_curves() {
    assert_eq!(Curve::INSTANT.eval(0.0), 1.0);
    assert_eq!(Curve::DELAYED.eval(0.999), 0.0);
    assert_eq!(Curve::DELAYED.eval(1.0), 1.0);
}

#[test]
fn symmetric_curves_cross_at_half() {
    for curve in [
        Curve::LINEAR,
        Curve::SMOOTHSTEP,
        Curve::SMOOTHERSTEP,
        Curve::SMOOTHESTSTEP,
        Curve::CUBIC_IN_OUT,
        Curve::SINUSOIDAL_IN_OUT,
    ] {
        assert!(approx(curve.eval(0.5), 0.5, 1e-12), "{curve}");
    }
}

#[test]
fn inputs_are_not_clamped() {
    assert_eq!(Curve::LINEAR.eval(2.0), 2.0);
    assert_eq!(Curve::QUADRATIC_IN.eval(-1.0), 1.0);
}

#[test]
fn lerp_applies_the_curve() {
    assert_eq!(Curve::LINEAR.lerp(2.0, 4.0, 0.25), 2.5);
    assert_eq!(Curve::QUADRATIC_IN.lerp(0.0, 8.0, 0.5), 2.0);
    assert_eq!(Curve::INSTANT.lerp(3.0, 7.0, 0.0), 7.0);
}

#[test]
fn curves_are_found_by_name() {
    assert_eq!(Curve::by_name("Bounce::InOut"), Some(Curve::BOUNCE_IN_OUT));
    assert_eq!(Curve::by_name("Linear").map(|c| c.name()), Some("Linear"));
    assert_eq!(Curve::by_name("Nope"), None);
    assert_eq!(Curve::default(), Curve::LINEAR);
    assert_eq!(Curve::catalog().len(), 36);
}

#[test]
fn custom_curves() {
    fn half(t: f64) -> f64 {
        t * 0.5
    }
    let curve = Curve::new("Half", half);
    assert_eq!(curve.eval(1.0), 0.5);
    assert_eq!(curve.to_string(), "Half");
}
