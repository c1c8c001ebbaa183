//! Planar geometry on (lng, lat) degrees. Good enough at the scale of one
//! town around one hub; nothing here projects coordinates.

use geo::{HaversineDistance, LineString, Point, Polygon};

/// Even-odd ray casting against the exterior ring.
///
/// A ray is cast from the point towards increasing longitude and every edge
/// that straddles the point's latitude with its crossing strictly east of
/// the point toggles the result. Horizontal edges never straddle, so they
/// never count. Each edge is evaluated from its lower endpoint, which makes
/// the result independent of winding direction, and points on an edge get
/// the same answer on every call.
pub fn polygon_contains(polygon: &Polygon<f64>, point: &Point<f64>) -> bool {
    let (x, y) = (point.x(), point.y());
    let mut inside = false;
    for line in polygon.exterior().lines() {
        let (low, high) = if line.start.y <= line.end.y {
            (line.start, line.end)
        } else {
            (line.end, line.start)
        };
        if low.y == high.y {
            continue;
        }
        if (low.y > y) != (high.y > y) {
            let crossing_x = low.x + (y - low.y) * (high.x - low.x) / (high.y - low.y);
            if crossing_x > x {
                inside = !inside;
            }
        }
    }
    inside
}

/// Axis aligned square of ±`radius` degrees around `center`.
pub fn square_around(center: &Point<f64>, radius: f64) -> Polygon<f64> {
    let (x, y) = (center.x(), center.y());
    Polygon::new(
        LineString::from(vec![
            (x - radius, y - radius),
            (x + radius, y - radius),
            (x + radius, y + radius),
            (x - radius, y + radius),
        ]),
        vec![],
    )
}

/// Great-circle distance in kilometres, rounded to 2 decimals.
pub fn haversine_km(from: &Point<f64>, to: &Point<f64>) -> f64 {
    let km = from.haversine_distance(to) / 1000.0;
    (km * 100.0).round() / 100.0
}
