use crate::workflows::pipeline::EnrichedRow;
use std::io::Write;

/// Appended after the original columns, in this order.
pub const DERIVED_COLUMNS: [&str; 5] = [
    "zoningCode",
    "pricePerUnit",
    "maxUnits",
    "sb9Eligible",
    "exclusionReason",
];

/// Writes the original cells followed by the derived columns. Absent values are blank.
pub fn write_csv<W: Write>(
    writer: W,
    headers: &[String],
    rows: &[EnrichedRow],
) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    let header_row = headers
        .iter()
        .map(String::as_str)
        .chain(DERIVED_COLUMNS.iter().copied());
    csv_writer.write_record(header_row)?;

    for row in rows {
        let listing = &row.listing;
        let mut record: Vec<String> = (0..headers.len())
            .map(|index| row.values.get(index).cloned().unwrap_or_default())
            .collect();

        record.push(
            listing
                .zoning_code
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
        );
        record.push(
            listing
                .price_per_unit
                .map(|value| format!("{value:.2}"))
                .unwrap_or_default(),
        );
        record.push(listing.max_units.map(|units| units.to_string()).unwrap_or_default());
        record.push(listing.sb9_eligible.to_string());
        record.push(
            listing
                .exclusion_reason
                .map(|reason| reason.label().to_string())
                .unwrap_or_default(),
        );

        csv_writer.write_record(&record)?;
    }

    csv_writer.flush()?;
    Ok(())
}
