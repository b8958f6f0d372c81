use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// Great-circle distance in kilometers between two WGS-84 points,
/// via the haversine formula.
pub fn haversine_km(start: GeoPoint, end: GeoPoint) -> f64 {
    let lat1 = start.latitude.to_radians();
    let lat2 = end.latitude.to_radians();
    let d_lat = (end.latitude - start.latitude).to_radians();
    let d_lon = (end.longitude - start.longitude).to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paris_to_lyon_is_about_392_km() {
        let paris = GeoPoint {
            latitude: 48.8566,
            longitude: 2.3522,
        };
        let lyon = GeoPoint {
            latitude: 45.7640,
            longitude: 4.8357,
        };
        let d = haversine_km(paris, lyon);
        assert!((d - 392.0).abs() < 2.0, "got {d}");
    }

    #[test]
    fn zero_distance_for_identical_points() {
        let p = GeoPoint {
            latitude: 12.34,
            longitude: -56.78,
        };
        assert_eq!(haversine_km(p, p), 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = GeoPoint {
            latitude: 40.7128,
            longitude: -74.0060,
        };
        let b = GeoPoint {
            latitude: 51.5074,
            longitude: -0.1278,
        };
        let ab = haversine_km(a, b);
        let ba = haversine_km(b, a);
        assert!((ab - ba).abs() < 1e-9);
    }
}
