use crate::models::order::GeoPoint;

const EARTH_RADIUS_KM: f64 = 6_371.0;

pub fn haversine_km(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lng = (b.lng - a.lng).to_radians();

    let sin_lat = (delta_lat / 2.0).sin();
    let sin_lng = (delta_lng / 2.0).sin();

    let haversine = sin_lat * sin_lat + lat1.cos() * lat2.cos() * sin_lng * sin_lng;
    let central_angle = 2.0 * haversine.sqrt().asin();

    EARTH_RADIUS_KM * central_angle
}

/// Straight-line distance between two legs, rounded to 0.1 km.
pub fn leg_distance_km(from: Option<&GeoPoint>, to: Option<&GeoPoint>) -> Option<f64> {
    let (from, to) = (from?, to?);
    Some((haversine_km(from, to) * 10.0).round() / 10.0)
}

#[cfg(test)]
mod tests {
    use super::{haversine_km, leg_distance_km};
    use crate::models::order::GeoPoint;

    #[test]
    fn zero_distance_for_same_point() {
        let p = GeoPoint {
            lat: 6.4541,
            lng: 3.3947,
        };
        let distance = haversine_km(&p, &p);
        assert!(distance < 1e-9);
    }

    #[test]
    fn lagos_to_ibadan_is_around_113_km() {
        let lagos = GeoPoint {
            lat: 6.5244,
            lng: 3.3792,
        };
        let ibadan = GeoPoint {
            lat: 7.3775,
            lng: 3.9470,
        };
        let distance = haversine_km(&lagos, &ibadan);
        assert!((distance - 113.0).abs() < 5.0);
    }

    #[test]
    fn missing_coordinates_yield_no_distance() {
        let p = GeoPoint { lat: 6.5, lng: 3.3 };
        assert_eq!(leg_distance_km(Some(&p), None), None);
        assert_eq!(leg_distance_km(Some(&p), Some(&p)), Some(0.0));
    }
}
