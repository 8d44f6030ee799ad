//! Unit tests for signed bearing differences.

use headwind::geo::signed_angle_difference;

fn bearings() -> impl Iterator<Item = f64> {
    (-24..=48).map(|step| step as f64 * 15.0)
}

/// The difference is antisymmetric except for antipodal bearings.
#[test]
fn test_difference_is_antisymmetric() {
    for a in bearings() {
        for b in bearings() {
            let forward = signed_angle_difference(a, b);
            let backward = signed_angle_difference(b, a);

            assert!(forward.abs() <= 180.0, "{} -> {} gave {}", a, b, forward);
            if forward.abs() != 180.0 {
                assert_eq!(forward, -backward, "{} <-> {}", a, b);
            }
        }
    }
}

/// A bearing compared with itself, in any turn, differs by zero.
#[test]
fn test_same_bearing_is_zero() {
    for a in bearings() {
        assert_eq!(signed_angle_difference(a, a), 0.0);
        assert_eq!(signed_angle_difference(a, a + 360.0), 0.0);
    }
}

/// Clockwise is positive and the short way round wins.
#[test]
fn test_sign_and_short_arc() {
    assert_eq!(signed_angle_difference(0.0, 90.0), 90.0);
    assert_eq!(signed_angle_difference(90.0, 0.0), -90.0);
    assert_eq!(signed_angle_difference(350.0, 10.0), 20.0);
    assert_eq!(signed_angle_difference(10.0, 350.0), -20.0);
}

/// Antipodal bearings always resolve to +180.
#[test]
fn test_antipodal_tie_break() {
    assert_eq!(signed_angle_difference(0.0, 180.0), 180.0);
    assert_eq!(signed_angle_difference(180.0, 0.0), 180.0);
    assert_eq!(signed_angle_difference(-90.0, 90.0), 180.0);
}
