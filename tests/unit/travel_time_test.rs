//! Unit tests for ride distance estimation.

use headwind::integrations::elevation::ElevationProfile;
use headwind::physics::TravelTimeEstimator;

const ONE_HOUR: f64 = 3600.0;

fn climb(grade: f64, samples: usize) -> ElevationProfile {
    ElevationProfile {
        interval: 100.0,
        elevations: (0..samples).map(|i| i as f64 * 100.0 * grade).collect(),
    }
}

/// More power covers more ground on the flat.
#[test]
fn test_higher_ftp_travels_further() {
    let weaker = TravelTimeEstimator::new(180.0, 75.0);
    let stronger = TravelTimeEstimator::new(280.0, 75.0);

    assert!(stronger.estimate_distance(ONE_HOUR, None, 0) > weaker.estimate_distance(ONE_HOUR, None, 0));

    let hills = climb(0.04, 400);
    assert!(
        stronger.estimate_distance(ONE_HOUR, Some(&hills), 0)
            > weaker.estimate_distance(ONE_HOUR, Some(&hills), 0)
    );
}

/// A profile without elevation change matches the flat estimate.
#[test]
fn test_zero_profile_matches_flat() {
    let estimator = TravelTimeEstimator::new(220.0, 72.0);
    let flat = ElevationProfile::flat(100.0, 1000);

    for time in [60.0, 1800.0, ONE_HOUR] {
        let without = estimator.estimate_distance(time, None, 0);
        let with = estimator.estimate_distance(time, Some(&flat), 0);
        assert!(
            (without - with).abs() < without * 1e-9,
            "{}s: {} vs {}",
            time,
            without,
            with
        );
    }
}

/// A profile shorter than the ride continues on flat ground.
#[test]
fn test_short_profile_falls_back_to_flat() {
    let estimator = TravelTimeEstimator::new(200.0, 75.0);
    let flat = ElevationProfile::flat(100.0, 5);

    let without = estimator.estimate_distance(ONE_HOUR, None, 0);
    let with = estimator.estimate_distance(ONE_HOUR, Some(&flat), 0);
    assert!((without - with).abs() < without * 1e-9);
}

/// Climbing is slower than riding on the flat; descending is faster.
#[test]
fn test_grade_changes_distance() {
    let estimator = TravelTimeEstimator::new(200.0, 75.0);
    let flat = estimator.estimate_distance(ONE_HOUR, None, 0);

    let up = estimator.estimate_distance(ONE_HOUR, Some(&climb(0.08, 500)), 0);
    let down = estimator.estimate_distance(ONE_HOUR, Some(&climb(-0.05, 1000)), 0);

    assert!(up < flat, "climb {} vs flat {}", up, flat);
    assert!(down > flat, "descent {} vs flat {}", down, flat);
}

/// The walk starts at the given sample.
#[test]
fn test_start_index_skips_climb() {
    let estimator = TravelTimeEstimator::new(200.0, 75.0);
    let mut elevations: Vec<f64> = (0..50).map(|i| i as f64 * 8.0).collect();
    elevations.extend(std::iter::repeat(392.0).take(500));
    let profile = ElevationProfile {
        interval: 100.0,
        elevations,
    };

    let from_start = estimator.estimate_distance(ONE_HOUR, Some(&profile), 0);
    let after_climb = estimator.estimate_distance(ONE_HOUR, Some(&profile), 49);
    assert!(after_climb > from_start);
}

/// No time, no distance.
#[test]
fn test_zero_time() {
    let estimator = TravelTimeEstimator::new(200.0, 75.0);
    assert_eq!(estimator.estimate_distance(0.0, Some(&climb(0.05, 10)), 0), 0.0);
}
