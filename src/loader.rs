use crate::error::Result;
use crate::types::{PermitRecord, RawRow};
use crate::util::{parse_bool_safe, parse_date_safe};
use csv::ReaderBuilder;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub loaded_rows: usize,
    pub parse_errors: usize,
    pub missing_contractor: usize,
}

pub fn load_permits(path: impl AsRef<Path>) -> Result<(Vec<PermitRecord>, LoadReport)> {
    let file = std::fs::File::open(path.as_ref())?;
    load_permits_from_reader(file)
}

/// Reads dig tickets from any CSV source. Rows without a usable request
/// date cannot be placed on a day and are skipped; a missing contractor is
/// kept, since the ticket still counts toward the daily totals.
pub fn load_permits_from_reader<R: Read>(reader: R) -> Result<(Vec<PermitRecord>, LoadReport)> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
    let mut report = LoadReport::default();
    let mut records = Vec::new();

    for result in rdr.deserialize::<RawRow>() {
        report.total_rows += 1;
        let row = match result {
            Ok(r) => r,
            Err(e) => {
                log::debug!("Row {}: {}", report.total_rows, e);
                report.parse_errors += 1;
                continue;
            }
        };

        let Some(request_date) = parse_date_safe(row.request_date.as_deref()) else {
            report.parse_errors += 1;
            continue;
        };
        let is_emergency = match parse_bool_safe(row.is_emergency.as_deref()) {
            Some(b) => b,
            None => {
                log::warn!(
                    "Row {}: unrecognized is_emergency value {:?}, treating as regular",
                    report.total_rows,
                    row.is_emergency
                );
                false
            }
        };

        let contractor = row
            .contact_last_name
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        if contractor.is_none() {
            report.missing_contractor += 1;
        }

        records.push(PermitRecord {
            ticket: row.dig_ticket_number.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
            request_date,
            dig_date: parse_date_safe(row.dig_date.as_deref()),
            is_emergency,
            street: row.street_name.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
            contractor,
        });
    }

    report.loaded_rows = records.len();
    log::info!(
        "Loaded {} of {} rows ({} skipped)",
        report.loaded_rows,
        report.total_rows,
        report.parse_errors
    );
    Ok((records, report))
}
