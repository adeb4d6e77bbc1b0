use glam::{dvec2, DVec2};
use std::f64::consts::PI;

/// Spherical web mercator. Coordinates in "meters" span `[-HALF_CIRCUMFERENCE, HALF_CIRCUMFERENCE]` on both axes.
pub struct MapProjection;

impl MapProjection {
    pub const EARTH_RADIUS: f64 = 6_378_137.0;
    pub const HALF_CIRCUMFERENCE: f64 = PI * Self::EARTH_RADIUS;
    /// mercator is undefined at the poles. clamp latitude, so that we never get infinities.
    pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

    /// x -> longitude in degrees, y -> latitude in degrees
    pub fn lon_lat_to_meters(lon_lat: DVec2) -> DVec2 {
        let lat = lon_lat.y.clamp(-Self::MAX_LATITUDE, Self::MAX_LATITUDE);
        let x = lon_lat.x * Self::HALF_CIRCUMFERENCE / 180.0;
        let y = ((90.0 + lat) * PI / 360.0).tan().ln() * Self::EARTH_RADIUS;
        dvec2(x, y)
    }

    pub fn meters_to_lon_lat(meters: DVec2) -> DVec2 {
        let lon = meters.x * 180.0 / Self::HALF_CIRCUMFERENCE;
        let lat = (2.0 * (meters.y / Self::EARTH_RADIUS).exp().atan() - PI * 0.5).to_degrees();
        dvec2(lon, lat)
    }

    /// edge length of a single tile at this zoom. At zoom 0, one tile covers the whole world.
    pub fn tile_size_meters(zoom: u32) -> f64 {
        Self::HALF_CIRCUMFERENCE * 2.0 / 2f64.powi(zoom as i32)
    }
}
