//! Great-circle distance between coordinates.

/// Mean Earth radius used by the haversine formula, in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Haversine distance in meters between two latitude/longitude pairs
/// given in degrees.
///
/// Symmetric, and exactly zero for identical inputs. Coordinates are not
/// range-checked; that happens when records are decoded.
///
/// ```
/// use station_tracker::distance::distance_meters;
///
/// let d = distance_meters(0.0, 0.0, 0.001, 0.0);
/// assert!((100.0..=120.0).contains(&d));
/// ```
pub fn distance_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    // Clamp guards against a creeping just above 1 for near-antipodal points
    let c = 2.0 * a.sqrt().min(1.0).asin();

    EARTH_RADIUS_M * c
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn lat() -> impl Strategy<Value = f64> {
        -90.0f64..=90.0
    }

    fn lon() -> impl Strategy<Value = f64> {
        -180.0f64..=180.0
    }

    proptest! {
        /// distance(A, B) == distance(B, A)
        #[test]
        fn symmetric(lat1 in lat(), lon1 in lon(), lat2 in lat(), lon2 in lon()) {
            let ab = distance_meters(lat1, lon1, lat2, lon2);
            let ba = distance_meters(lat2, lon2, lat1, lon1);
            prop_assert!((ab - ba).abs() < 1e-6);
        }

        /// distance(P, P) == 0
        #[test]
        fn identity(lat1 in lat(), lon1 in lon()) {
            prop_assert_eq!(distance_meters(lat1, lon1, lat1, lon1), 0.0);
        }

        /// Never negative, never more than half the circumference
        #[test]
        fn bounded(lat1 in lat(), lon1 in lon(), lat2 in lat(), lon2 in lon()) {
            let d = distance_meters(lat1, lon1, lat2, lon2);
            prop_assert!(d >= 0.0);
            prop_assert!(d <= std::f64::consts::PI * EARTH_RADIUS_M + 1e-6);
        }

        /// Moving further north along a meridian never gets closer
        #[test]
        fn monotonic_along_meridian(lat1 in -45.0f64..45.0, step in 0.0001f64..1.0, extra in 0.0001f64..1.0) {
            let near = distance_meters(lat1, 0.0, lat1 + step, 0.0);
            let far = distance_meters(lat1, 0.0, lat1 + step + extra, 0.0);
            prop_assert!(far > near);
        }
    }
}
