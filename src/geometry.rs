//! Geodesic helpers.
//!
//! Great-circle distance for the heuristic provider and a bounding box used
//! to frame an optimized tour on a map.

use crate::domain::GeoPoint;

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance in kilometers using the haversine formula.
///
/// # Examples
///
/// ```
/// use tour_routing::domain::GeoPoint;
/// use tour_routing::geometry::distance_km;
///
/// let marienplatz = GeoPoint::new(48.1372, 11.5755);
/// let stachus = GeoPoint::new(48.1402, 11.5595);
///
/// let d = distance_km(marienplatz, stachus);
/// assert!(d > 1.0 && d < 2.0);
/// ```
pub fn distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    if a == b {
        return 0.0;
    }

    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlng = (b.lng - a.lng).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().asin();

    EARTH_RADIUS_KM * c
}

/// Axis-aligned bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub min_lng: f64,
    pub max_lat: f64,
    pub max_lng: f64,
}

impl BoundingBox {
    /// Smallest box containing every point, or `None` for an empty slice.
    ///
    /// # Examples
    ///
    /// ```
    /// use tour_routing::domain::GeoPoint;
    /// use tour_routing::geometry::BoundingBox;
    ///
    /// let bbox = BoundingBox::around(&[GeoPoint::new(1.0, 5.0), GeoPoint::new(-2.0, 7.0)]).unwrap();
    /// assert_eq!(bbox.south_west(), [-2.0, 5.0]);
    /// assert_eq!(bbox.north_east(), [1.0, 7.0]);
    /// assert!(BoundingBox::around(&[]).is_none());
    /// ```
    pub fn around(points: &[GeoPoint]) -> Option<Self> {
        let first = points.first()?;
        let init = Self {
            min_lat: first.lat,
            min_lng: first.lng,
            max_lat: first.lat,
            max_lng: first.lng,
        };
        Some(points.iter().skip(1).fold(init, |b, p| Self {
            min_lat: b.min_lat.min(p.lat),
            min_lng: b.min_lng.min(p.lng),
            max_lat: b.max_lat.max(p.lat),
            max_lng: b.max_lng.max(p.lng),
        }))
    }

    /// Expands the box by a factor of its span on each side (0.1 = 10%).
    pub fn expand(&self, factor: f64) -> Self {
        let lat_pad = (self.max_lat - self.min_lat) * factor;
        let lng_pad = (self.max_lng - self.min_lng) * factor;

        Self {
            min_lat: (self.min_lat - lat_pad).max(-90.0),
            min_lng: (self.min_lng - lng_pad).max(-180.0),
            max_lat: (self.max_lat + lat_pad).min(90.0),
            max_lng: (self.max_lng + lng_pad).min(180.0),
        }
    }

    /// South-west corner as `[lat, lng]`.
    pub fn south_west(&self) -> [f64; 2] {
        [self.min_lat, self.min_lng]
    }

    /// North-east corner as `[lat, lng]`.
    pub fn north_east(&self) -> [f64; 2] {
        [self.max_lat, self.max_lng]
    }
}
