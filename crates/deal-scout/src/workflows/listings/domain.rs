use serde::{Deserialize, Serialize};

/// WGS84 point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);
        valid.then_some(Self {
            latitude,
            longitude,
        })
    }
}

/// Street address fragments as exported by the MLS, any of which may be blank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreetAddress {
    pub street_number: String,
    pub street_dir_prefix: String,
    pub street_name: String,
    pub street_suffix: String,
    pub street_dir_suffix: String,
}

impl StreetAddress {
    /// Joins the non-empty parts, e.g. `2622 S Cochran Ave`.
    pub fn display(&self) -> Option<String> {
        let joined = [
            &self.street_number,
            &self.street_dir_prefix,
            &self.street_name,
            &self.street_suffix,
            &self.street_dir_suffix,
        ]
        .iter()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        (!joined.is_empty()).then_some(joined)
    }
}

/// Normalized view of one listing row. Numeric fields are `None` when the
/// source cell was blank or could not be read as a positive number.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingRecord {
    pub price: Option<f64>,
    pub lot_size_sq_ft: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub address: StreetAddress,
}

impl ListingRecord {
    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Coordinates::new(latitude, longitude),
            _ => None,
        }
    }

    pub fn display_address(&self) -> Option<String> {
        self.address.display()
    }
}
