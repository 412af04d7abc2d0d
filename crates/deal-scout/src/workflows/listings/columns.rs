use super::parser::normalize_header;

/// Square feet per acre, used when only `LotSizeAcres` is exported.
pub(crate) const SQ_FT_PER_ACRE: f64 = 43_560.0;

// Spreadsheet column letters (`EC`, `KZ`, ...) come last: some exports are saved
// with the letter row as their header.
const PRICE: &[&str] = &["CurrentPrice", "price", "ListPrice", "EC"];
const LOT_SQ_FT: &[&str] = &["LotSizeSquareFeet", "lot_sqft"];
const LOT_ACRES: &[&str] = &["LotSizeAcres"];
const LATITUDE: &[&str] = &["Latitude", "lat", "KZ"];
const LONGITUDE: &[&str] = &["Longitude", "lon", "lng", "IU"];
const STREET_NUMBER: &[&str] = &["StreetNumber", "TC"];
const STREET_DIR_PREFIX: &[&str] = &["StreetDirPrefix"];
const STREET_NAME: &[&str] = &["StreetName", "TA"];
const STREET_SUFFIX: &[&str] = &["StreetSuffix", "TD"];
const STREET_DIR_SUFFIX: &[&str] = &["StreetDirSuffix"];

/// How the lot size column of a given export is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LotSizeColumn {
    SquareFeet(usize),
    Acres(usize),
}

/// Positions of the recognized columns within one export's header row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ColumnLayout {
    pub(crate) price: Option<usize>,
    pub(crate) lot_size: Option<LotSizeColumn>,
    pub(crate) latitude: Option<usize>,
    pub(crate) longitude: Option<usize>,
    pub(crate) street_number: Option<usize>,
    pub(crate) street_dir_prefix: Option<usize>,
    pub(crate) street_name: Option<usize>,
    pub(crate) street_suffix: Option<usize>,
    pub(crate) street_dir_suffix: Option<usize>,
}

impl ColumnLayout {
    pub(crate) fn resolve(headers: &[String]) -> Self {
        let lot_size = find_column(headers, LOT_SQ_FT)
            .map(LotSizeColumn::SquareFeet)
            .or_else(|| find_column(headers, LOT_ACRES).map(LotSizeColumn::Acres));

        Self {
            price: find_column(headers, PRICE),
            lot_size,
            latitude: find_column(headers, LATITUDE),
            longitude: find_column(headers, LONGITUDE),
            street_number: find_column(headers, STREET_NUMBER),
            street_dir_prefix: find_column(headers, STREET_DIR_PREFIX),
            street_name: find_column(headers, STREET_NAME),
            street_suffix: find_column(headers, STREET_SUFFIX),
            street_dir_suffix: find_column(headers, STREET_DIR_SUFFIX),
        }
    }

    /// Labels of the core columns this export does not provide.
    pub(crate) fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.price.is_none() {
            missing.push("CurrentPrice");
        }
        if self.lot_size.is_none() {
            missing.push("LotSizeSquareFeet");
        }
        if self.latitude.is_none() {
            missing.push("Latitude");
        }
        if self.longitude.is_none() {
            missing.push("Longitude");
        }
        missing
    }
}

/// First header matching any candidate, compared case-insensitively.
/// Candidates are tried in order so the canonical name wins over aliases.
pub(crate) fn find_column(headers: &[String], candidates: &[&str]) -> Option<usize> {
    let normalized: Vec<String> = headers.iter().map(|h| normalize_header(h)).collect();
    candidates.iter().find_map(|candidate| {
        let wanted = normalize_header(candidate);
        normalized.iter().position(|header| *header == wanted)
    })
}
