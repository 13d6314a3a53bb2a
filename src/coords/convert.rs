/// Maps an apparent magnitude to a scene distance.
///
/// This is a monotonic display heuristic, not a calibrated distance modulus:
/// magnitude 5 sits at distance 1 and every 5 magnitudes scale it by 10.
pub fn magnitude_to_distance(magnitude: f64) -> f64 {
    10f64.powf((magnitude - 5.0) / 5.0)
}

/// Converts right ascension / declination (degrees) and magnitude to a
/// Cartesian scene position.
///
/// X points at ra = 0, dec = 0, Y at ra = 90, dec = 0 and Z at the north
/// celestial pole. Angles are not range-checked.
pub fn equatorial_to_cartesian(ra_deg: f64, dec_deg: f64, magnitude: f64) -> [f32; 3] {
    let ra = ra_deg.to_radians();
    let dec = dec_deg.to_radians();
    let distance = magnitude_to_distance(magnitude);

    let x = distance * dec.cos() * ra.cos();
    let y = distance * dec.cos() * ra.sin();
    let z = distance * dec.sin();
    [x as f32, y as f32, z as f32]
}
