// src/extractors/scopes.rs
use std::collections::HashMap;

use crate::document::adapter::{matrix_cell, section_table, section_tokens};
use crate::document::{locate, Document, Schema};
use crate::extractors::dates::{year_for_period, NEW_DATE_FORMAT};
use crate::extractors::{parse_float, token_at};
use crate::sheet::{cell_ref, version_column, Sheet};
use crate::utils::diag::Diagnostics;
use crate::utils::error::StructuralError;

/// Questionnaire wording to short category names. Two spellings of the
/// investments category map onto C15.
const CATEGORIES: &[(&str, &str)] = &[
    ("Purchased goods and services", "C1"),
    ("Capital goods", "C2"),
    (
        "Fuel-and-energy-related activities (not included in Scope 1 or 2)",
        "C3",
    ),
    ("Upstream transportation and distribution", "C4"),
    ("Waste generated in operations", "C5"),
    ("Business travel", "C6"),
    ("Employee commuting", "C7"),
    ("Upstream leased assets", "C8"),
    ("Downstream transportation and distribution", "C9"),
    ("Processing of sold products", "C10"),
    ("Use of sold products", "C11"),
    ("End of life treatment of sold products", "C12"),
    ("Downstream leased assets", "C13"),
    ("Franchises", "C14"),
    ("Investments", "C15"),
    ("Category 15 (Investments)", "C15"),
    ("Other (upstream)", "Other (upstream)"),
    ("Other (downstream)", "Other (downstream)"),
];

/// Workbook row order for Scope 3: rows 24 through 40.
const CATEGORY_ROWS: &[&str] = &[
    "C1",
    "C2",
    "C3",
    "C4",
    "C5",
    "C6",
    "C7",
    "C8",
    "C9",
    "C10",
    "C11",
    "C12",
    "C13",
    "C14",
    "C15",
    "Other (upstream)",
    "Other (downstream)",
];

enum CategoryValue {
    /// Disclosed but not calculated; the cell stays untouched.
    Omitted,
    Reported(f64),
}

fn category_for(label: &str) -> Option<&'static str> {
    CATEGORIES
        .iter()
        .find(|(wording, _)| *wording == label)
        .map(|&(_, short)| short)
}

/// Gross global Scope 1 emissions (C6.1 / CC8.2). New-schema responses may
/// disclose several past years; year `i` back lands `i` columns left of
/// the version column, all in row 19.
pub fn scope1(
    doc: &Document,
    sheet: &mut Sheet,
    n_years: usize,
    diag: &mut Diagnostics,
) -> Result<(), StructuralError> {
    let column = version_column('E', doc.version);
    if sheet.is_populated(&cell_ref(column, 19)) {
        return Ok(());
    }

    let mut emissions: Vec<f64> = Vec::new();
    match doc.schema {
        Schema::Old => {
            let section = locate::question_old(doc, "ORSMENU_3", "CC8.2")?;
            let info = section_tokens(section);
            let value = token_at(&info, 2, "CC8.2 Scope 1")?;
            match parse_float(value) {
                Some(tco2e) => emissions.push(tco2e),
                None => diag.warn(
                    "CC8.2 Scope 1",
                    format!(
                        "no emissions could be found in version {}, probably empty",
                        doc.version
                    ),
                ),
            }
        }
        Schema::New => {
            let section = locate::require_section(doc, "formatted_responses_question_18615")?;
            let info = section_tokens(section);
            let mut dates: Vec<Vec<String>> = Vec::new();

            for (i, txt) in info.iter().enumerate() {
                let txt = txt.as_str();
                if txt == "Gross global Scope 1 emissions (metric tons CO2e)" {
                    let value = token_at(&info, i + 1, "C6.1 Scope 1")?;
                    match parse_float(value) {
                        Some(tco2e) => emissions.push(tco2e),
                        None => {
                            // An empty disclosure makes the next label bleed
                            // into the value position.
                            if value == "End-year of reporting period" || value == "Start date" {
                                diag.warn(
                                    "C6.1 Scope 1",
                                    format!("emissions value was empty (version {})", doc.version),
                                );
                                break;
                            }
                            return Err(StructuralError::InvalidNumber {
                                context: "C6.1 Scope 1",
                                value: value.to_string(),
                            });
                        }
                    }
                }
                if doc.version == 2018 {
                    if txt == "End-year of reporting period" {
                        dates.push(vec![token_at(&info, i + 1, "C6.1 Scope 1")?.to_string()]);
                    }
                } else if txt == "Start date" {
                    dates.push(vec![token_at(&info, i + 1, "C6.1 Scope 1")?.to_string()]);
                } else if txt == "End date" {
                    let last =
                        dates
                            .last_mut()
                            .ok_or_else(|| StructuralError::Inconsistent {
                                context: "C6.1 Scope 1",
                                detail: "end date before any start date".to_string(),
                            })?;
                    last.push(token_at(&info, i + 1, "C6.1 Scope 1")?.to_string());
                }
            }

            if dates.len() != n_years || emissions.len() != n_years {
                diag.warn(
                    "C6.1 Scope 1",
                    "number of reported years does not match section C0.2",
                );
            }
            for (count, date) in (1..).zip(&dates) {
                let expected = doc.version - count;
                if doc.version == 2018 {
                    let end_year = date[0].as_str();
                    if end_year != "<Not Applicable>" {
                        let year: i32 =
                            end_year
                                .parse()
                                .map_err(|_| StructuralError::InvalidNumber {
                                    context: "C6.1 Scope 1 end year",
                                    value: end_year.to_string(),
                                })?;
                        if year != expected {
                            diag.warn(
                                "C6.1 Scope 1",
                                format!(
                                    "dates do not match: expected {} but found {}",
                                    expected, year
                                ),
                            );
                        }
                    }
                } else if date.len() == 2
                    && date[0] != "<Not Applicable>"
                    && date[1] != "<Not Applicable>"
                {
                    let year =
                        year_for_period(&date[0], &date[1], "C6.1 Scope 1", NEW_DATE_FORMAT, diag)?;
                    if year != Some(expected) {
                        diag.warn(
                            "C6.1 Scope 1",
                            format!(
                                "dates do not match: expected {} but found {}",
                                expected,
                                display_year(year)
                            ),
                        );
                    }
                }
            }
        }
    }

    if emissions.is_empty() {
        diag.warn(
            "C6.1 Scope 1",
            format!("parsed emissions are empty (version {})", doc.version),
        );
        return Ok(());
    }
    if doc.schema == Schema::Old && emissions.len() > 1 {
        return Err(StructuralError::Inconsistent {
            context: "CC8.2 Scope 1",
            detail: "old questionnaires cannot give emissions for more than one year".to_string(),
        });
    }
    // At most `n_years` cells; extra series entries would walk left
    // into columns that belong to other data.
    for (i, value) in emissions.iter().take(n_years).enumerate() {
        let col = (column as u8 - i as u8) as char;
        sheet.set_number(cell_ref(col, 19), *value);
    }
    Ok(())
}

/// Scope 2 location-based and market-based emissions (C6.3 / CC8.3a),
/// rows 20 and 21. The two series must stay in lockstep; a length mismatch
/// means the section layout drifted.
pub fn scope2(
    doc: &Document,
    sheet: &mut Sheet,
    n_years: usize,
    diag: &mut Diagnostics,
) -> Result<(), StructuralError> {
    let column = version_column('E', doc.version);
    if sheet.any_populated(&[(column, 20), (column, 21)]) {
        return Ok(());
    }

    let mut lb: Vec<Option<f64>> = Vec::new();
    let mut mb: Vec<Option<f64>> = Vec::new();
    match doc.schema {
        Schema::Old => {
            let section = locate::question_old(doc, "ORSMENU_3", "CC8.3a")?;
            let table = section_table(section, Schema::Old, "CC8.3a")?;
            match parse_float(matrix_cell(&table, 1, 0, "CC8.3a Scope 2")?) {
                Some(value) => lb.push(Some(value)),
                None => {
                    diag.warn(
                        "CC8.3a Scope 2",
                        format!("no LB emissions could be found in version {}", doc.version),
                    );
                    lb.push(None);
                }
            }
            match parse_float(matrix_cell(&table, 1, 1, "CC8.3a Scope 2")?) {
                Some(value) => mb.push(Some(value)),
                None => {
                    diag.warn(
                        "CC8.3a Scope 2",
                        format!("no MB emissions could be found in version {}", doc.version),
                    );
                    mb.push(None);
                }
            }
        }
        Schema::New => {
            let section = locate::require_section(doc, "formatted_responses_question_2816")?;
            let info = section_tokens(section);
            let mut dates: Vec<Vec<String>> = Vec::new();

            for (i, txt) in info.iter().enumerate() {
                let txt = txt.as_str();
                if txt == "Scope 2, location-based" {
                    match parse_float(token_at(&info, i + 1, "C6.3 Scope 2")?) {
                        Some(value) => lb.push(Some(value)),
                        None => {
                            diag.warn(
                                "C6.3 Scope 2",
                                format!("LB info missing in response version {}", doc.version),
                            );
                            lb.push(None);
                        }
                    }
                } else if txt == "Scope 2, market-based (if applicable)" {
                    match parse_float(token_at(&info, i + 1, "C6.3 Scope 2")?) {
                        Some(value) => mb.push(Some(value)),
                        None => {
                            diag.warn(
                                "C6.3 Scope 2",
                                format!("MB info missing from response version {}", doc.version),
                            );
                            mb.push(None);
                        }
                    }
                } else if doc.version == 2018 && txt == "End-year of reporting period" {
                    dates.push(vec![token_at(&info, i + 1, "C6.3 Scope 2")?.to_string()]);
                } else if txt == "Start date" {
                    dates.push(vec![token_at(&info, i + 1, "C6.3 Scope 2")?.to_string()]);
                } else if txt == "End date" {
                    let last =
                        dates
                            .last_mut()
                            .ok_or_else(|| StructuralError::Inconsistent {
                                context: "C6.3 Scope 2",
                                detail: "end date before any start date".to_string(),
                            })?;
                    last.push(token_at(&info, i + 1, "C6.3 Scope 2")?.to_string());
                }
            }

            if dates.len() != n_years || lb.len() != n_years || mb.len() != n_years {
                diag.warn(
                    "C6.3 Scope 2",
                    format!(
                        "reported years do not match section C0.2 (version {})",
                        doc.version
                    ),
                );
            }
            for (count, date) in (1..).zip(&dates) {
                let expected = doc.version - count;
                if doc.version == 2018 {
                    let end_year = date[0].as_str();
                    if end_year != "<Not Applicable>" && !end_year.contains("Comment") {
                        let year: i32 =
                            end_year
                                .parse()
                                .map_err(|_| StructuralError::InvalidNumber {
                                    context: "C6.3 Scope 2 end year",
                                    value: end_year.to_string(),
                                })?;
                        if year != expected {
                            diag.warn(
                                "C6.3 Scope 2",
                                format!(
                                    "dates do not match: expected {} but found {} (version {})",
                                    expected, year, doc.version
                                ),
                            );
                        }
                    }
                } else if date.len() == 2
                    && date[0] != "<Not Applicable>"
                    && date[1] != "<Not Applicable>"
                {
                    // Malformed period dates are only a finding here, unlike
                    // the same check in Scope 1.
                    match year_for_period(&date[0], &date[1], "C6.3 Scope 2", NEW_DATE_FORMAT, diag)
                    {
                        Ok(year) => {
                            if year != Some(expected) {
                                diag.warn(
                                    "C6.3 Scope 2",
                                    format!(
                                        "dates do not match: expected {} but found {} (version {})",
                                        expected,
                                        display_year(year),
                                        doc.version
                                    ),
                                );
                            }
                        }
                        Err(_) => diag.warn(
                            "C6.3 Scope 2",
                            format!(
                                "invalid date given (version {}, year {})",
                                doc.version, expected
                            ),
                        ),
                    }
                }
            }
        }
    }

    if lb.len() != mb.len() {
        return Err(StructuralError::Inconsistent {
            context: "C6.3 Scope 2",
            detail: format!(
                "LB and MB series length mismatch ({} vs {}, version {})",
                lb.len(),
                mb.len(),
                doc.version
            ),
        });
    }
    if lb.is_empty() {
        diag.warn(
            "C6.3 Scope 2",
            format!("parsed emissions are empty (version {})", doc.version),
        );
        return Ok(());
    }

    // Capped at `n_years`, as in Scope 1.
    for (i, value) in lb.iter().take(n_years).enumerate() {
        let col = (column as u8 - i as u8) as char;
        if let Some(v) = value {
            sheet.set_number(cell_ref(col, 20), *v);
        }
        if let Some(v) = mb.get(i).copied().flatten() {
            sheet.set_number(cell_ref(col, 21), v);
        }
    }
    Ok(())
}

/// Scope 3 emissions by category (C6.5 / CC14.1), rows 24-40 in the
/// version column. Categories marked calculated get their value; others
/// stay blank. Uncovered categories are findings. Financial-sector 2020
/// responses split investments into a separate section that is appended
/// when present.
pub fn scope3(doc: &Document, sheet: &mut Sheet, diag: &mut Diagnostics) -> Result<(), StructuralError> {
    let column = version_column('E', doc.version);
    let guard: Vec<(char, u32)> = (24..=40).map(|row| (column, row)).collect();
    if sheet.any_populated(&guard) {
        return Ok(());
    }

    let mut values: HashMap<&'static str, CategoryValue> = HashMap::new();
    match doc.schema {
        Schema::Old => {
            let question = locate::question_old(doc, "ORSMENU_3", "CC14.1")?;
            let table = section_table(question, Schema::Old, "CC14.1")?;
            for row in table.iter().skip(1) {
                let label = row.first().map(String::as_str).unwrap_or_default();
                let cat = match category_for(label) {
                    Some(cat) => cat,
                    None => continue,
                };
                let status = row.get(1).map(String::as_str).unwrap_or_default();
                let entry = if status == "Relevant, calculated"
                    || status == "Not relevant, calculated"
                {
                    match row.get(2).and_then(|v| parse_float(v)) {
                        Some(value) => CategoryValue::Reported(value),
                        None => {
                            diag.warn(
                                "CC14.1 Scope 3",
                                format!(
                                    "empty value in category {} marked as calculated (version {})",
                                    cat, doc.version
                                ),
                            );
                            CategoryValue::Omitted
                        }
                    }
                } else {
                    CategoryValue::Omitted
                };
                values.insert(cat, entry);
            }
        }
        Schema::New => {
            let section = locate::require_section(doc, "formatted_responses_question_2325")?;
            let mut info = section_tokens(section);
            // Financial companies disclose investments separately in 2020.
            if doc.version == 2020 {
                if let Some(extra) = locate::find_section(doc, "formatted_responses_question_87916")
                {
                    info.extend(section_tokens(extra));
                }
            }

            let mut cat: Option<&'static str> = None;
            let mut calculated = false;
            for (i, txt) in info.iter().enumerate() {
                let txt = txt.as_str();
                if let Some(matched) = category_for(txt) {
                    cat = Some(matched);
                } else if txt == "Evaluation status" {
                    let status = token_at(&info, i + 1, "C6.5 Scope 3")?;
                    if status == "Relevant, calculated" || status == "Not relevant, calculated" {
                        calculated = true;
                    }
                } else if txt == "Metric tonnes CO2e"
                    || txt == "Scope 3 portfolio emissions (metric tons CO2e)"
                {
                    let current = match cat {
                        Some(current) => current,
                        None => continue,
                    };
                    let value = token_at(&info, i + 1, "C6.5 Scope 3")?;
                    if calculated {
                        match parse_float(value) {
                            Some(parsed) => {
                                values.insert(current, CategoryValue::Reported(parsed));
                            }
                            None => {
                                diag.warn(
                                    "C6.5 Scope 3",
                                    format!(
                                        "empty value in category {} marked as calculated (version {})",
                                        current, doc.version
                                    ),
                                );
                                values.insert(current, CategoryValue::Omitted);
                            }
                        }
                        calculated = false;
                    } else {
                        values.insert(current, CategoryValue::Omitted);
                    }
                }
            }
        }
    }

    for (i, cat) in CATEGORY_ROWS.iter().copied().enumerate() {
        match values.get(cat) {
            None => diag.warn(
                "Scope 3",
                format!("could not find {} in version {}", cat, doc.version),
            ),
            Some(CategoryValue::Omitted) => {}
            Some(CategoryValue::Reported(value)) => {
                sheet.set_number(cell_ref(column, 24 + i as u32), *value);
            }
        }
    }
    Ok(())
}

fn display_year(year: Option<i32>) -> String {
    match year {
        Some(year) => year.to_string(),
        None => "none".to_string(),
    }
}
