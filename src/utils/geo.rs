const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Great-circle distance in meters between two (latitude, longitude) points.
pub fn haversine_distance_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_distance() {
        assert!(haversine_distance_m(-23.5505, -46.6333, -23.5505, -46.6333) < 1e-6);
    }

    #[test]
    fn test_one_degree_longitude_at_equator() {
        // One degree of longitude at the equator is about 111.19 km
        let d = haversine_distance_m(0.0, 0.0, 0.0, 1.0);
        assert!((d - 111_195.0).abs() < 100.0);
    }

    #[test]
    fn test_short_campus_scale_distance() {
        // Two points ~150 m apart in São Paulo
        let d = haversine_distance_m(-23.5505, -46.6333, -23.5505, -46.63183);
        assert!(d > 100.0 && d < 200.0);
    }
}
