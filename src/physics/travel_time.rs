//! Ride distance estimation from power, mass and elevation.
//!
//! The rider is assumed to hold 70% of FTP through a 95% efficient
//! drivetrain. Speed on each segment solves the steady-state power balance
//!
//! ```text
//! P = k·v³ + c·v
//! ```
//!
//! where `k` is the aerodynamic term and `c` collects rolling resistance and
//! the gravity component of the local grade.

use crate::integrations::elevation::ElevationProfile;

/// Physics constants
const GRAVITY: f64 = 9.81; // m/s²
const AIR_DENSITY: f64 = 1.225; // kg/m³ at sea level
const DEFAULT_CDA: f64 = 0.3; // m² (hoods position)
const DEFAULT_CRR: f64 = 0.004; // Rolling resistance for road tires
const BIKE_MASS: f64 = 9.5; // kg

/// Fraction of the effective FTP that can be sustained for a whole ride.
pub const SUSTAINABLE_POWER_FACTOR: f64 = 0.70;
pub const DRIVETRAIN_EFFICIENCY: f64 = 0.95;

/// Grade above which short power bursts are allowed.
const STEEP_GRADE: f64 = 0.06;
/// Burst power relative to sustainable power.
const BURST_FACTOR: f64 = 1.2;
/// Anaerobic work capacity available for a one-hour ride, in joules.
const BASE_ENERGY_RESERVE: f64 = 20_000.0;
/// Share of the threshold headroom that refills the reserve.
const RESERVE_RECOVERY_RATE: f64 = 0.5;

const NEWTON_ITERATIONS: usize = 10;
const INITIAL_VELOCITY: f64 = 7.0; // m/s, ~25 km/h
/// Velocity floor so a degenerate solve never stalls the walk.
const MIN_VELOCITY: f64 = 0.5;

/// Distance estimator for a given rider.
#[derive(Debug, Clone)]
pub struct TravelTimeEstimator {
    /// Functional Threshold Power in watts
    pub ftp: f64,
    /// Rider mass in kilograms
    pub rider_mass_kg: f64,
    /// Bike mass in kilograms
    pub bike_mass_kg: f64,
    /// Drag coefficient times frontal area (CdA)
    pub cda: f64,
    /// Rolling resistance coefficient
    pub crr: f64,
}

impl TravelTimeEstimator {
    /// Create an estimator with default bike and aerodynamics.
    pub fn new(ftp: f64, rider_mass_kg: f64) -> Self {
        Self {
            ftp,
            rider_mass_kg,
            bike_mass_kg: BIKE_MASS,
            cda: DEFAULT_CDA,
            crr: DEFAULT_CRR,
        }
    }

    /// Total system mass (rider + bike)
    fn total_mass(&self) -> f64 {
        self.rider_mass_kg + self.bike_mass_kg
    }

    /// Power at the wheel the rider can hold for the whole ride.
    pub fn sustainable_power(&self) -> f64 {
        self.ftp * SUSTAINABLE_POWER_FACTOR * DRIVETRAIN_EFFICIENCY
    }

    /// Power at the wheel at threshold.
    fn threshold_power(&self) -> f64 {
        self.ftp * DRIVETRAIN_EFFICIENCY
    }

    fn aero_coefficient(&self) -> f64 {
        0.5 * AIR_DENSITY * self.cda
    }

    /// Linear resistance coefficient on `grade` (rise over run).
    fn resistance_coefficient(&self, grade: f64) -> f64 {
        let angle = grade.atan();
        self.total_mass() * GRAVITY * (self.crr * angle.cos() + angle.sin())
    }

    /// Steady-state velocity on `grade` at `power` watts.
    pub fn velocity(&self, power: f64, grade: f64) -> f64 {
        solve_velocity(power, self.aero_coefficient(), self.resistance_coefficient(grade))
    }

    /// Distance in metres covered in `time_secs` seconds.
    ///
    /// Without a profile the ride is assumed flat. With a profile the walk
    /// starts at sample `start_index` and falls back to flat ground once the
    /// profile is exhausted.
    pub fn estimate_distance(
        &self,
        time_secs: f64,
        profile: Option<&ElevationProfile>,
        start_index: usize,
    ) -> f64 {
        if time_secs <= 0.0 {
            return 0.0;
        }

        match profile {
            Some(profile) => self.estimate_with_elevation(time_secs, profile, start_index),
            None => self.velocity(self.sustainable_power(), 0.0) * time_secs,
        }
    }

    fn estimate_with_elevation(
        &self,
        time_secs: f64,
        profile: &ElevationProfile,
        start_index: usize,
    ) -> f64 {
        let sustainable = self.sustainable_power();
        let max_reserve = energy_reserve(time_secs);
        let recovery_power = (self.threshold_power() - sustainable).max(0.0) * RESERVE_RECOVERY_RATE;

        let mut distance = 0.0;
        let mut remaining = time_secs;
        let mut reserve = max_reserve;
        let mut index = start_index;

        while remaining > 0.0 && index + 1 < profile.elevations.len() && profile.interval > 0.0 {
            let grade = (profile.elevations[index + 1] - profile.elevations[index]) / profile.interval;
            let steep = grade > STEEP_GRADE;

            let power = if steep {
                (sustainable * BURST_FACTOR).min(sustainable + reserve / remaining)
            } else {
                sustainable
            };

            let velocity = self.velocity(power, grade);
            let segment_time = profile.interval / velocity;

            if segment_time > remaining {
                distance += velocity * remaining;
                remaining = 0.0;
                break;
            }

            distance += profile.interval;
            remaining -= segment_time;
            index += 1;

            if steep {
                reserve = (reserve - (power - sustainable) * segment_time).max(0.0);
            } else {
                reserve = (reserve + recovery_power * segment_time).min(max_reserve);
            }
        }

        if remaining > 0.0 {
            distance += self.velocity(sustainable, 0.0) * remaining;
        }

        distance
    }
}

/// Anaerobic reserve for a ride of `time_secs`, scaled down for short rides.
fn energy_reserve(time_secs: f64) -> f64 {
    BASE_ENERGY_RESERVE * (time_secs / 3600.0).min(1.0)
}

/// Solve `k·v³ + c·v = power` with a fixed number of Newton steps.
///
/// On descents `c` is negative and the cubic is not monotonic near zero, so
/// the iteration is seeded right of the inflection where it converges from
/// above. The result is an approximation; it is not checked for convergence.
fn solve_velocity(power: f64, k: f64, c: f64) -> f64 {
    let mut v = if c < 0.0 {
        INITIAL_VELOCITY.max(2.0 * (-c / k).sqrt())
    } else {
        INITIAL_VELOCITY
    };

    for _ in 0..NEWTON_ITERATIONS {
        let f = k * v.powi(3) + c * v - power;
        let f_prime = 3.0 * k * v.powi(2) + c;
        if f_prime.abs() < 1e-10 {
            break;
        }
        v -= f / f_prime;
    }

    if v.is_finite() {
        v.max(MIN_VELOCITY)
    } else {
        MIN_VELOCITY
    }
}
