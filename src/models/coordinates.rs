use serde::{Deserialize, Serialize};

use crate::constants::EARTH_RADIUS_M;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Result<Self, String> {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(format!("Invalid latitude: {} (must be between -90 and 90)", lat));
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(format!("Invalid longitude: {} (must be between -180 and 180)", lng));
        }
        Ok(Coordinates { lat, lng })
    }

    /// Great-circle distance to `other` using the Haversine formula.
    /// Returns distance in meters.
    ///
    /// Never exceeds the length of any road path between the two points,
    /// which makes it an admissible A* heuristic.
    pub fn distance_to(&self, other: &Coordinates) -> f64 {
        let lat1_rad = self.lat.to_radians();
        let lat2_rad = other.lat.to_radians();
        let delta_lat = (other.lat - self.lat).to_radians();
        let delta_lng = (other.lng - self.lng).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_M * c
    }

    /// Point displaced by `north_m` / `east_m` meters (flat-earth
    /// approximation, fine for the few hundred meters fixtures use).
    pub fn offset_m(&self, north_m: f64, east_m: f64) -> Self {
        let meters_per_deg_lat = EARTH_RADIUS_M.to_radians();
        let meters_per_deg_lng = meters_per_deg_lat * self.lat.to_radians().cos();
        Coordinates {
            lat: self.lat + north_m / meters_per_deg_lat,
            lng: self.lng + east_m / meters_per_deg_lng,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinates_validation() {
        assert!(Coordinates::new(51.7592, 19.4560).is_ok());
        assert!(Coordinates::new(91.0, 0.0).is_err()); // Invalid lat
        assert!(Coordinates::new(0.0, 181.0).is_err()); // Invalid lng
    }

    #[test]
    fn test_distance_calculation() {
        let paris = Coordinates::new(48.8566, 2.3522).unwrap();
        let london = Coordinates::new(51.5074, -0.1278).unwrap();

        let distance = paris.distance_to(&london);
        // Paris to London is approximately 344 km
        assert!((distance - 344_000.0).abs() < 10_000.0);
    }

    #[test]
    fn test_distance_is_symmetric_and_zero_on_self() {
        let a = Coordinates::new(51.7592, 19.4560).unwrap();
        let b = Coordinates::new(51.7700, 19.4700).unwrap();

        assert_eq!(a.distance_to(&a), 0.0);
        assert!((a.distance_to(&b) - b.distance_to(&a)).abs() < 1e-9);
    }

    #[test]
    fn test_offset_roughly_matches_haversine() {
        let origin = Coordinates::new(51.7592, 19.4560).unwrap();
        let north = origin.offset_m(100.0, 0.0);
        let east = origin.offset_m(0.0, 100.0);

        assert!((origin.distance_to(&north) - 100.0).abs() < 0.5);
        assert!((origin.distance_to(&east) - 100.0).abs() < 0.5);
    }
}
