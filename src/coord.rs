use std::fmt;
use std::hash::{Hash, Hasher};

/// A 2D coordinate in degrees latitude and longitude.
///
/// Equality is componentwise. The display form rounds to 6 decimal
/// places; the full precision is preserved and used on the wire.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Coord {
    lat: f64,
    lng: f64,
}

impl Coord {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lng(&self) -> f64 {
        self.lng
    }

    /// Return this coordinate in the zinc literal form `C(lat,lng)`.
    pub fn to_zinc_string(&self) -> String {
        format!("C({},{})", self.lat, self.lng)
    }

    pub(crate) fn hash_into<H: Hasher>(&self, state: &mut H) {
        fn bits(f: f64) -> u64 {
            // Normalize -0.0 so that equal values hash equally.
            if f == 0.0 {
                0.0f64.to_bits()
            } else {
                f.to_bits()
            }
        }
        // hash(lat) XOR hash(lng), per the model's hashing contract.
        (bits(self.lat) ^ bits(self.lng)).hash(state);
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}° lat {:.6}° long", self.lat, self.lng)
    }
}

#[cfg(test)]
mod test {
    use super::Coord;

    #[test]
    fn accessors() {
        let coord = Coord::new(37.545, -77.449);
        assert_eq!(coord.lat(), 37.545);
        assert_eq!(coord.lng(), -77.449);
    }

    #[test]
    fn display_rounds_to_six_decimals() {
        let coord = Coord::new(37.5451234567, -77.449);
        assert_eq!(coord.to_string(), "37.545123° lat -77.449000° long");
    }

    #[test]
    fn zinc_form_keeps_full_precision() {
        let coord = Coord::new(37.5451234567, -77.449);
        assert_eq!(coord.to_zinc_string(), "C(37.5451234567,-77.449)");
    }
}
