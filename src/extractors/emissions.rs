// src/extractors/emissions.rs
use crate::document::adapter::section_tokens;
use crate::document::{locate, Document, Schema};
use crate::extractors::dates::{year_for_period, NEW_DATE_FORMAT};
use crate::extractors::{parse_float, token_at};
use crate::sheet::{cell_ref, Sheet};
use crate::utils::diag::Diagnostics;
use crate::utils::error::StructuralError;

/// Base-year emissions per scope (C5.1), new schema only. Old responses do
/// not disclose them in an extractable form. Base year data does not vary
/// across responses, so the first processed response wins and later ones
/// leave the cells alone.
pub fn base_emissions(
    doc: &Document,
    sheet: &mut Sheet,
    diag: &mut Diagnostics,
) -> Result<(), StructuralError> {
    if doc.schema == Schema::Old {
        return Ok(());
    }
    if sheet.any_populated(&[('E', 3), ('F', 3)]) {
        return Ok(());
    }

    const QUESTION_IDS: [&str; 3] = [
        "formatted_responses_question_2723",
        "formatted_responses_question_2727",
        "formatted_responses_question_2731",
    ];
    for id in QUESTION_IDS {
        let section = locate::require_section(doc, id)?;
        let info = section_tokens(section);
        let first = info.first().map(String::as_str).unwrap_or_default();
        let column = if first.contains("Scope 1") {
            'E'
        } else if first.contains("Scope 2 (location-based)") {
            'F'
        } else if first.contains("Scope 2 (market-based)") {
            'G'
        } else {
            return Err(StructuralError::UnexpectedLabel {
                context: "C5.1 base emissions",
                label: first.to_string(),
            });
        };

        let tco2e = match info.get(6).and_then(|v| parse_float(v)) {
            Some(value) => value,
            None => {
                diag.warn(
                    "C5.1 base emissions",
                    format!("{} base emissions not given (version {})", first, doc.version),
                );
                continue;
            }
        };
        sheet.set_number(cell_ref(column, 3), tco2e);

        let start = token_at(&info, 2, "C5.1 base emissions")?;
        let end = token_at(&info, 4, "C5.1 base emissions")?;
        if let Some(year) = year_for_period(start, end, "C5.1 base emissions", NEW_DATE_FORMAT, diag)?
        {
            sheet.set_number(cell_ref(column, 4), year as f64);
        }
    }
    Ok(())
}

/// Reporting standard used (C5.2), new schema only. Takes the first
/// recognized standard; anything exotic lands as `Other` with a finding.
pub fn methodology(
    doc: &Document,
    sheet: &mut Sheet,
    diag: &mut Diagnostics,
) -> Result<(), StructuralError> {
    if doc.schema == Schema::Old {
        return Ok(());
    }
    if sheet.is_populated("B16") {
        return Ok(());
    }

    let section = locate::require_section(doc, "formatted_responses_question_12033")?;
    let info = section_tokens(section);
    let mut method = None;
    for text in &info {
        if text.contains("The Greenhouse Gas Protocol") {
            method = Some("GHG Protocol");
            break;
        } else if text.contains("ISO 14064-1") {
            method = Some("ISO14064-1");
            break;
        } else if text.contains("The Climate Registry") {
            method = Some("The Climate Registry (TCR)");
            break;
        }
    }
    let method = match method {
        Some(found) => found,
        None => {
            diag.warn(
                "C5.2 Methodology",
                "common standard could not be found, setting as 'Other'",
            );
            "Other"
        }
    };
    sheet.set_text("B16", method);
    Ok(())
}

/// Verification status per scope (C10.1), new schema only. The three
/// disclosed statuses map onto fixed workbook phrasing; any other wording
/// means the questionnaire changed shape underneath us.
pub fn verification(doc: &Document, sheet: &mut Sheet) -> Result<(), StructuralError> {
    if doc.schema == Schema::Old {
        return Ok(());
    }
    if sheet.any_populated(&[('B', 19), ('B', 20), ('B', 21)]) {
        return Ok(());
    }

    let section = locate::require_section(doc, "formatted_responses_matrix_set_grid_11582")?;
    let info = section_tokens(section);
    for (i, offset) in [3usize, 5, 7].into_iter().enumerate() {
        let text = token_at(&info, offset, "C10.1 verification")?;
        let verification = match text {
            "No emissions data provided" => "No data given",
            "No third-party verification or assurance" => "No external verification",
            "Third-party verification or assurance process in place" => "Third party verification",
            other => {
                return Err(StructuralError::UnexpectedLabel {
                    context: "C10.1 verification",
                    label: other.to_string(),
                });
            }
        };
        sheet.set_text(cell_ref('B', 19 + i as u32), verification);
    }
    Ok(())
}
