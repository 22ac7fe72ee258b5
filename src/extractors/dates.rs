// src/extractors/dates.rs
use chrono::{Datelike, NaiveDate};

use crate::document::adapter::{matrix_cell, section_table};
use crate::document::{locate, Document, Schema};
use crate::utils::diag::Diagnostics;
use crate::utils::error::StructuralError;

/// A disclosed reporting period must cover close to a calendar year.
pub const MIN_PERIOD_DAYS: i64 = 361;
pub const MAX_PERIOD_DAYS: i64 = 369;

/// "January 1 2019", as printed by new-schema responses.
pub const NEW_DATE_FORMAT: &str = "%B %d %Y";
/// "Fri 01 Jan 2016", as printed by old-schema responses.
pub const OLD_DATE_FORMAT: &str = "%a %d %b %Y";

/// Validates that two dates span roughly one year and names the calendar
/// year the period mostly covers: the start year when the period begins
/// before July, the end year otherwise. A period outside the allowed
/// window is a recoverable finding and yields `None`; an unparseable date
/// is structural.
pub fn year_for_period(
    start: &str,
    end: &str,
    label: &str,
    format: &str,
    diag: &mut Diagnostics,
) -> Result<Option<i32>, StructuralError> {
    let parse = |value: &str| {
        NaiveDate::parse_from_str(value, format).map_err(|_| StructuralError::InvalidDate {
            label: label.to_string(),
            value: value.to_string(),
        })
    };
    let start_date = parse(start)?;
    let end_date = parse(end)?;

    let days = (end_date - start_date).num_days();
    if days < MIN_PERIOD_DAYS {
        diag.warn(
            label,
            format!("submitted dates are less than a full year apart ({} days)", days),
        );
        return Ok(None);
    }
    if days > MAX_PERIOD_DAYS {
        diag.warn(
            label,
            format!("submitted dates are more than a full year apart ({} days)", days),
        );
        return Ok(None);
    }

    let year = if start_date.month() < 7 {
        start_date.year()
    } else {
        end_date.year()
    };
    Ok(Some(year))
}

/// Cross-checks the C0.2 reporting period against the questionnaire
/// version and returns how many years the response discloses (1 to 4).
/// Old-schema responses always disclose a single year.
pub fn reported_years(doc: &Document, diag: &mut Diagnostics) -> Result<usize, StructuralError> {
    match doc.schema {
        Schema::Old => {
            let question = locate::question_old(doc, "ORSMENU_0", "CC0.2")?;
            let table = section_table(question, Schema::Old, "CC0.2")?;
            let period = matrix_cell(&table, 1, 0, "CC0.2")?;
            let (start, end) =
                period
                    .split_once(" - ")
                    .ok_or_else(|| StructuralError::InvalidDate {
                        label: "CC0.2 reporting start/end".to_string(),
                        value: period.to_string(),
                    })?;
            if let Some(year) =
                year_for_period(start, end, "CC0.2 reporting start/end", OLD_DATE_FORMAT, diag)?
            {
                if year + 1 != doc.version {
                    diag.warn(
                        "CC0.2",
                        "the reporting start/end does not match the questionnaire version",
                    );
                }
            }
            Ok(1)
        }
        Schema::New => {
            let question =
                locate::require_section(doc, "formatted_responses_matrix_set_grid_11995")?;
            let table = section_table(question, Schema::New, "C0.2")?;
            let header = matrix_cell(&table, 0, 1, "C0.2")?;
            if header != "Start date" {
                return Err(StructuralError::UnexpectedLabel {
                    context: "C0.2",
                    label: header.to_string(),
                });
            }

            let start = matrix_cell(&table, 1, 1, "C0.2")?;
            let end = matrix_cell(&table, 1, 2, "C0.2")?;
            if let Some(year) =
                year_for_period(start, end, "C0.2 reporting start/end", NEW_DATE_FORMAT, diag)?
            {
                if year + 1 != doc.version {
                    diag.warn(
                        "C0.2",
                        "the reporting start/end does not match the questionnaire version",
                    );
                }
            }

            let years = if matrix_cell(&table, 1, 3, "C0.2")? == "Yes"
                && matrix_cell(&table, 1, 4, "C0.2")? != "Please select"
            {
                let extra = matrix_cell(&table, 1, 4, "C0.2")?;
                let first = extra
                    .chars()
                    .next()
                    .and_then(|c| c.to_digit(10))
                    .ok_or_else(|| StructuralError::InvalidNumber {
                        context: "C0.2 past years",
                        value: extra.to_string(),
                    })?;
                first as usize + 1
            } else {
                1
            };
            if (1..=4).contains(&years) {
                Ok(years)
            } else {
                Err(StructuralError::Inconsistent {
                    context: "C0.2",
                    detail: format!("invalid number of reported years: {}", years),
                })
            }
        }
    }
}
