// src/extractors/energy.rs
use crate::document::adapter::{matrix_cell, section_table, section_tokens};
use crate::document::{locate, Document, Schema};
use crate::extractors::{parse_float, token_at};
use crate::sheet::{cell_ref, version_column, Sheet};
use crate::utils::diag::Diagnostics;
use crate::utils::error::StructuralError;

/// Fuel names the questionnaire treats as biofuels. Used to cross-check
/// renewable fuel consumption against the per-fuel breakdown.
const BIOFUELS: &[&str] = &[
    "Agricultural Waste",
    "Animal Fat",
    "Animal/Bone Meal",
    "Bagasse",
    "Bamboo",
    "Biodiesel",
    "Biodiesel Tallow",
    "Biodiesel Waste Cooking Oil",
    "Bioethanol",
    "Biogas",
    "Biogasoline",
    "Biomass Municipal Waste",
    "Biomethane",
    "Charcoal",
    "Grass",
    "Hardwood",
    "Landfill Gas",
    "Liquid Biofuel",
    "Primary Solid Biomass",
    "Softwood",
    "Solid Biomass Waste",
    "Vegetable Oil",
    "Waste Paper and Card",
    "Wood",
    "Wood Chips",
    "Wood Logs",
    "Wood Pellets",
    "Wood Waste",
    "Turpentine",
];

/// Energy consumption totals (C8.2a / CC11.2, CC11.3 and CC11.5), rows
/// 12-24 in the version column of the energy sheet. New-schema rows carry
/// renewable, non-renewable and total MWh; heat and steam fold into the
/// cooling row so old and new responses land on the same cells.
pub fn energy_use(
    doc: &Document,
    sheet: &mut Sheet,
    validate: bool,
    diag: &mut Diagnostics,
) -> Result<(), StructuralError> {
    let year = version_column('E', doc.version);
    let guard: Vec<(char, u32)> = (12..=24).map(|row| (year, row)).collect();
    if sheet.any_populated(&guard) {
        return Ok(());
    }

    match doc.schema {
        Schema::Old => {
            let question = locate::question_old(doc, "ORSMENU_3", "CC11.2")?;
            let table = section_table(question, Schema::Old, "CC11.2")?;
            let mut hsc = 0.0;
            let mut n_empty = 0;
            for i in 1..table.len() {
                let cell = matrix_cell(&table, i, 1, "CC11.2 purchased energy")?;
                if cell.is_empty() {
                    n_empty += 1;
                } else {
                    hsc += parse_float(cell).ok_or_else(|| StructuralError::InvalidNumber {
                        context: "CC11.2 purchased energy",
                        value: cell.to_string(),
                    })?;
                }
            }
            if n_empty < 3 {
                sheet.set_number(cell_ref(year, 20), hsc);
            } else {
                diag.warn(
                    "CC11.2",
                    format!(
                        "no heat, steam or cooling consumption given in version {}",
                        doc.version
                    ),
                );
            }

            let question = locate::question_old(doc, "ORSMENU_3", "CC11.3")?;
            let info = section_tokens(question);
            match parse_float(token_at(&info, 2, "CC11.3 fuel consumption")?) {
                Some(value) => sheet.set_number(cell_ref(year, 14), value),
                None => diag.warn(
                    "CC11.3",
                    format!("no fuel consumption given in version {}", doc.version),
                ),
            }

            let question = locate::question_old(doc, "ORSMENU_3", "CC11.5")?;
            let table = section_table(question, Schema::Old, "CC11.5")?;
            match parse_float(matrix_cell(&table, 1, 1, "CC11.5 electricity")?) {
                Some(value) => sheet.set_number(cell_ref(year, 17), value),
                None => diag.warn(
                    "CC11.5",
                    format!("no purchased electricity given in version {}", doc.version),
                ),
            }
        }
        Schema::New => {
            let section =
                locate::require_section(doc, "formatted_responses_matrix_set_grid_10823")?;
            let table = section_table(section, Schema::New, "C8.2a")?;
            let mut hsc = [0.0f64; 3];
            let mut accumulated = [0.0f64; 3];

            for row in table.iter().skip(1) {
                let label = row.first().map(String::as_str).unwrap_or_default();
                let mut consumption = row
                    .iter()
                    .skip(2)
                    .map(|cell| consumption_value(cell, "C8.2a energy consumption"))
                    .collect::<Result<Vec<f64>, _>>()?;
                if consumption.len() != 3 {
                    return Err(StructuralError::Inconsistent {
                        context: "C8.2a energy consumption",
                        detail: format!("expected three MWh columns, found {}", consumption.len()),
                    });
                }

                let xl_row = match label {
                    "Consumption of fuel (excluding feedstock)" => Some(12),
                    "Consumption of purchased or acquired electricity" => Some(15),
                    "Consumption of purchased or acquired heat"
                    | "Consumption of purchased or acquired steam" => None,
                    "Consumption of purchased or acquired cooling" => Some(18),
                    "Consumption of self-generated non-fuel renewable energy" => Some(21),
                    "Total energy consumption" => Some(22),
                    other => {
                        return Err(StructuralError::UnexpectedLabel {
                            context: "C8.2a energy consumption",
                            label: other.to_string(),
                        })
                    }
                };

                let xl_row = match xl_row {
                    Some(xl_row) => xl_row,
                    None => {
                        // Heat and steam have no rows of their own; they
                        // surface through the cooling row.
                        for (slot, value) in hsc.iter_mut().zip(&consumption) {
                            *slot += value;
                        }
                        continue;
                    }
                };

                if label == "Consumption of purchased or acquired cooling" {
                    for (value, folded) in consumption.iter_mut().zip(hsc) {
                        *value += folded;
                    }
                }
                if label == "Consumption of fuel (excluding feedstock)" {
                    if !sheet.is_populated("J12") {
                        let basis = row.get(1).map(String::as_str).unwrap_or_default();
                        match basis {
                            "LHV (lower heating value)" => sheet.set_text("J12", "LHV"),
                            "HHV (higher heating value)" => sheet.set_text("J12", "HHV"),
                            "Unable to confirm heating value" => sheet.set_text("J12", "Unknown"),
                            other => diag.warn(
                                "C8.2a",
                                format!(
                                    "unrecognized heating value basis {:?} (version {})",
                                    other, doc.version
                                ),
                            ),
                        }
                    }
                    // Not gated behind `validate`: the C8.2c breakdown
                    // is checked whenever it is present.
                    if let Some(bio) = biofuel(doc)? {
                        if bio > 0.0 && bio > consumption[0] {
                            diag.warn(
                                "C8.2a",
                                format!(
                                    "biofuel consumption {} exceeds renewable fuel consumption {} (version {})",
                                    bio, consumption[0], doc.version
                                ),
                            );
                        }
                    }
                }

                if validate && consumption[2] != consumption[0] + consumption[1] {
                    diag.warn(
                        "C8.2a",
                        format!(
                            "{}: renewable and non-renewable MWh do not add up to the total (version {})",
                            label, doc.version
                        ),
                    );
                }

                if label == "Total energy consumption" {
                    if validate {
                        for (i, (reported, summed)) in
                            consumption.iter().zip(accumulated).enumerate()
                        {
                            if *reported != summed {
                                let header =
                                    table[0].get(2 + i).map(String::as_str).unwrap_or_default();
                                diag.warn(
                                    "C8.2a",
                                    format!(
                                        "{} total {} does not match the sum of the rows {} (version {})",
                                        header, reported, summed, doc.version
                                    ),
                                );
                            }
                        }
                    }
                } else {
                    for (slot, value) in accumulated.iter_mut().zip(&consumption) {
                        *slot += value;
                    }
                }

                if label == "Consumption of self-generated non-fuel renewable energy" {
                    sheet.set_number(cell_ref(year, xl_row), consumption[2]);
                } else {
                    for (i, value) in consumption.iter().enumerate() {
                        sheet.set_number(cell_ref(year, xl_row + i as u32), *value);
                    }
                }
            }
        }
    }
    Ok(())
}

/// Sums MWh consumed across the biofuel rows of the per-fuel breakdown
/// (C8.2c). `None` when the question was not answered.
fn biofuel(doc: &Document) -> Result<Option<f64>, StructuralError> {
    let section = match locate::find_section(doc, "formatted_responses_question_10853") {
        Some(section) => section,
        None => return Ok(None),
    };
    let info = section_tokens(section);
    let mut total = 0.0;
    let mut bio = false;
    for (i, txt) in info.iter().enumerate() {
        let txt = txt.as_str();
        if txt == "Fuels (excluding feedstocks)" {
            bio = BIOFUELS.contains(&token_at(&info, i + 1, "C8.2c biofuels")?);
        } else if bio && txt == "Total fuel MWh consumed by the organization" {
            if let Some(value) = parse_float(token_at(&info, i + 1, "C8.2c biofuels")?) {
                total += value;
            }
        }
    }
    Ok(Some(total))
}

/// Electricity, heat, steam and cooling generation (C8.2d / CC11.5).
/// Electricity lands on rows 28-31, the heat/steam/cooling aggregate on
/// rows 34-37. Old-schema responses only disclose three of the
/// electricity figures.
pub fn energy_production(
    doc: &Document,
    sheet: &mut Sheet,
    validate: bool,
    diag: &mut Diagnostics,
) -> Result<(), StructuralError> {
    let year = version_column('E', doc.version);
    let guard: Vec<(char, u32)> = (28..=31).chain(34..=37).map(|row| (year, row)).collect();
    if sheet.any_populated(&guard) {
        return Ok(());
    }

    match doc.schema {
        Schema::Old => {
            let question = locate::question_old(doc, "ORSMENU_3", "CC11.5")?;
            let table = section_table(question, Schema::Old, "CC11.5")?;
            let row: Vec<f64> = (0..5)
                .map(|col| {
                    blank_zero(
                        matrix_cell(&table, 1, col, "CC11.5 electricity")?,
                        "CC11.5 electricity",
                    )
                })
                .collect::<Result<_, _>>()?;
            let (total, purchased, produced) = (row[0], row[1], row[2]);
            let (re_produced, re_consumed) = (row[3], row[4]);

            // Not gated behind `validate`: old responses always get
            // these four checks.
            if produced < re_produced {
                diag.warn(
                    "CC11.5",
                    format!(
                        "renewable production exceeds total production (version {})",
                        doc.version
                    ),
                );
            }
            if re_produced < re_consumed {
                diag.warn(
                    "CC11.5",
                    format!(
                        "consumed renewable production exceeds renewable production (version {})",
                        doc.version
                    ),
                );
            }
            if total < re_consumed {
                diag.warn(
                    "CC11.5",
                    format!(
                        "consumed renewable production exceeds total consumption (version {})",
                        doc.version
                    ),
                );
            }
            if total < purchased {
                diag.warn(
                    "CC11.5",
                    format!(
                        "purchased electricity exceeds total consumption (version {})",
                        doc.version
                    ),
                );
            }

            sheet.set_number(cell_ref(year, 28), produced);
            sheet.set_number(cell_ref(year, 30), re_produced);
            sheet.set_number(cell_ref(year, 31), re_consumed);
        }
        Schema::New => {
            let section = match locate::find_section(doc, "formatted_responses_matrix_set_grid_11555")
            {
                Some(section) => section,
                None => {
                    tracing::info!(
                        "no energy production disclosed in version {}, skipping C8.2d",
                        doc.version
                    );
                    return Ok(());
                }
            };
            let table = section_table(section, Schema::New, "C8.2d")?;
            let mut electricity: Option<Vec<f64>> = None;
            let mut hsc = [0.0f64; 4];
            let mut hsc_seen = false;

            for row in table.iter().skip(1) {
                let label = row.first().map(String::as_str).unwrap_or_default();
                let values = generation_values(row, "C8.2d generation")?;
                match label {
                    "Electricity" => electricity = Some(values),
                    "Heat" | "Steam" | "Cooling" => {
                        hsc_seen = true;
                        for (slot, value) in hsc.iter_mut().zip(&values) {
                            *slot += value;
                        }
                    }
                    other => {
                        return Err(StructuralError::UnexpectedLabel {
                            context: "C8.2d generation",
                            label: other.to_string(),
                        })
                    }
                }
            }

            if let Some(values) = &electricity {
                if validate
                    && (values[0] < values[1] || values[0] < values[2] || values[2] < values[3])
                {
                    diag.warn(
                        "C8.2d",
                        format!(
                            "electricity generation figures are inconsistent (version {})",
                            doc.version
                        ),
                    );
                }
                for (i, value) in values.iter().enumerate() {
                    sheet.set_number(cell_ref(year, 28 + i as u32), *value);
                }
            }
            if hsc_seen {
                if validate && (hsc[0] < hsc[1] || hsc[0] < hsc[2] || hsc[2] < hsc[3]) {
                    diag.warn(
                        "C8.2d",
                        format!(
                            "heat, steam and cooling generation figures are inconsistent (version {})",
                            doc.version
                        ),
                    );
                }
                for (i, value) in hsc.iter().enumerate() {
                    sheet.set_number(cell_ref(year, 34 + i as u32), *value);
                }
            }
        }
    }
    Ok(())
}

fn consumption_value(cell: &str, context: &'static str) -> Result<f64, StructuralError> {
    let cell = cell.trim();
    if cell.is_empty() || cell == "<Not Applicable>" || cell == "N/A" {
        return Ok(0.0);
    }
    parse_float(cell).ok_or_else(|| StructuralError::InvalidNumber {
        context,
        value: cell.to_string(),
    })
}

fn blank_zero(cell: &str, context: &'static str) -> Result<f64, StructuralError> {
    if cell.trim().is_empty() {
        return Ok(0.0);
    }
    parse_float(cell).ok_or_else(|| StructuralError::InvalidNumber {
        context,
        value: cell.to_string(),
    })
}

/// Four generation figures: total, consumed by the organization,
/// renewable, renewable consumed by the organization.
fn generation_values(row: &[String], context: &'static str) -> Result<Vec<f64>, StructuralError> {
    let cells = row.get(1..5).ok_or_else(|| StructuralError::Inconsistent {
        context,
        detail: format!("expected five columns, found {}", row.len()),
    })?;
    cells.iter().map(|cell| blank_zero(cell, context)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::CellValue;

    fn new_doc(version: i32, body: &str) -> Document {
        let html = format!(
            r#"<div id="formatted_responses_ndp__container"><div>a</div><div>b</div><div>c</div><div>Acme - Climate Change {}</div></div>{}"#,
            version, body
        );
        Document::parse(&html).unwrap()
    }

    fn old_doc(version: i32, module: &str) -> Document {
        let html = format!(
            r#"<div id="formatted_response__container"><div>nav</div><div>Investor CDP {} - Acme Corp</div></div>{}"#,
            version, module
        );
        Document::parse(&html).unwrap()
    }

    fn new_table(id: &str, header: &[&str], rows: &[&[&str]]) -> String {
        let ths: String = header
            .iter()
            .map(|h| format!("<th><span>{}</span></th>", h))
            .collect();
        let trs: String = rows
            .iter()
            .map(|row| {
                let tds: String = row
                    .iter()
                    .map(|c| format!("<td><span>{}</span></td>", c))
                    .collect();
                format!("<tr>{}</tr>", tds)
            })
            .collect();
        format!(
            r#"<div id="{}"><table class="ndp_formatted_response__table"><thead><tr>{}</tr></thead><tbody>{}</tbody></table></div>"#,
            id, ths, trs
        )
    }

    const CONSUMPTION_HEADER: &[&str] = &[
        "",
        "Heating value",
        "MWh from renewable sources",
        "MWh from non-renewable sources",
        "Total MWh",
    ];

    fn consumption_rows<'a>() -> Vec<&'a [&'a str]> {
        vec![
            &[
                "Consumption of fuel (excluding feedstock)",
                "LHV (lower heating value)",
                "10",
                "20",
                "30",
            ][..],
            &[
                "Consumption of purchased or acquired electricity",
                "<Not Applicable>",
                "5",
                "5",
                "10",
            ][..],
            &[
                "Consumption of purchased or acquired heat",
                "<Not Applicable>",
                "1",
                "1",
                "2",
            ][..],
            &[
                "Consumption of purchased or acquired steam",
                "<Not Applicable>",
                "2",
                "2",
                "4",
            ][..],
            &[
                "Consumption of purchased or acquired cooling",
                "<Not Applicable>",
                "3",
                "3",
                "6",
            ][..],
            &[
                "Consumption of self-generated non-fuel renewable energy",
                "<Not Applicable>",
                "4",
                "<Not Applicable>",
                "4",
            ][..],
            &["Total energy consumption", "<Not Applicable>", "25", "31", "56"][..],
        ]
    }

    #[test]
    fn energy_use_new_schema_folds_heat_and_steam_into_cooling() {
        let rows = consumption_rows();
        let body = new_table(
            "formatted_responses_matrix_set_grid_10823",
            CONSUMPTION_HEADER,
            &rows,
        );
        let doc = new_doc(2019, &body);
        let mut sheet = Sheet::default();
        let mut diag = Diagnostics::new();
        energy_use(&doc, &mut sheet, true, &mut diag).unwrap();

        assert_eq!(sheet.get("H12"), Some(&CellValue::Number(10.0)));
        assert_eq!(sheet.get("H14"), Some(&CellValue::Number(30.0)));
        assert_eq!(sheet.get("H17"), Some(&CellValue::Number(10.0)));
        // Cooling carries heat and steam: 3+1+2 renewable, 6+2+4 total.
        assert_eq!(sheet.get("H18"), Some(&CellValue::Number(6.0)));
        assert_eq!(sheet.get("H20"), Some(&CellValue::Number(12.0)));
        // Self-generated renewables only disclose a total.
        assert_eq!(sheet.get("H21"), Some(&CellValue::Number(4.0)));
        assert!(sheet.get("H23").is_some());
        assert_eq!(sheet.text("J12"), Some("LHV"));
        assert!(diag.is_empty());
    }

    #[test]
    fn energy_use_flags_totals_that_do_not_add_up() {
        let mut rows = consumption_rows();
        rows[6] = &["Total energy consumption", "<Not Applicable>", "25", "31", "57"][..];
        let body = new_table(
            "formatted_responses_matrix_set_grid_10823",
            CONSUMPTION_HEADER,
            &rows,
        );
        let doc = new_doc(2019, &body);
        let mut sheet = Sheet::default();
        let mut diag = Diagnostics::new();
        energy_use(&doc, &mut sheet, true, &mut diag).unwrap();
        // Internal row check plus the column reconciliation.
        assert_eq!(diag.len(), 2);
    }

    #[test]
    fn energy_use_checks_are_opt_in() {
        let mut rows = consumption_rows();
        rows[6] = &["Total energy consumption", "<Not Applicable>", "25", "31", "57"][..];
        let body = new_table(
            "formatted_responses_matrix_set_grid_10823",
            CONSUMPTION_HEADER,
            &rows,
        );
        let doc = new_doc(2019, &body);
        let mut sheet = Sheet::default();
        let mut diag = Diagnostics::new();
        energy_use(&doc, &mut sheet, false, &mut diag).unwrap();
        assert!(diag.is_empty());
    }

    #[test]
    fn energy_use_rejects_unknown_consumption_rows() {
        let rows: Vec<&[&str]> = vec![&[
            "Consumption of bottled lightning",
            "<Not Applicable>",
            "1",
            "2",
            "3",
        ][..]];
        let body = new_table(
            "formatted_responses_matrix_set_grid_10823",
            CONSUMPTION_HEADER,
            &rows,
        );
        let doc = new_doc(2019, &body);
        let mut sheet = Sheet::default();
        let mut diag = Diagnostics::new();
        assert!(matches!(
            energy_use(&doc, &mut sheet, false, &mut diag),
            Err(StructuralError::UnexpectedLabel { .. })
        ));
    }

    #[test]
    fn energy_use_counts_biofuels_against_renewable_fuel() {
        let rows: Vec<&[&str]> = vec![&[
            "Consumption of fuel (excluding feedstock)",
            "LHV (lower heating value)",
            "10",
            "20",
            "30",
        ][..]];
        let fuels = [
            "Fuels (excluding feedstocks)",
            "Wood",
            "Total fuel MWh consumed by the organization",
            "50.0",
        ]
        .iter()
        .map(|t| format!("<span>{}</span>", t))
        .collect::<String>();
        let body = format!(
            "{}<div id=\"formatted_responses_question_10853\">{}</div>",
            new_table(
                "formatted_responses_matrix_set_grid_10823",
                CONSUMPTION_HEADER,
                &rows,
            ),
            fuels
        );
        let doc = new_doc(2020, &body);
        let mut sheet = Sheet::default();
        let mut diag = Diagnostics::new();
        energy_use(&doc, &mut sheet, true, &mut diag).unwrap();
        assert_eq!(diag.len(), 1);
        assert!(diag.warnings()[0].message.contains("biofuel"));
    }

    #[test]
    fn energy_use_biofuel_check_runs_unconditionally() {
        // 50 MWh of biodiesel against 10 MWh of renewable fuel, with
        // validation off.
        let rows: Vec<&[&str]> = vec![&[
            "Consumption of fuel (excluding feedstock)",
            "LHV (lower heating value)",
            "10",
            "20",
            "30",
        ][..]];
        let fuels = [
            "Fuels (excluding feedstocks)",
            "Biodiesel",
            "Total fuel MWh consumed by the organization",
            "50.0",
        ]
        .iter()
        .map(|t| format!("<span>{}</span>", t))
        .collect::<String>();
        let body = format!(
            "{}<div id=\"formatted_responses_question_10853\">{}</div>",
            new_table(
                "formatted_responses_matrix_set_grid_10823",
                CONSUMPTION_HEADER,
                &rows,
            ),
            fuels
        );
        let doc = new_doc(2019, &body);
        let mut sheet = Sheet::default();
        let mut diag = Diagnostics::new();
        energy_use(&doc, &mut sheet, false, &mut diag).unwrap();
        assert_eq!(diag.len(), 1);
        assert!(diag.warnings()[0].message.contains("biofuel"));
        assert_eq!(sheet.get("H12"), Some(&CellValue::Number(10.0)));
    }

    fn energy_module_old(cc112_cells: &[&str]) -> String {
        let cc112: String = cc112_cells
            .iter()
            .map(|c| format!("<td><span>{}</span></td>", c))
            .collect();
        format!(
            r#"<div id="ORSMENU_3"><div class="cdp-module-body"><div class="cdp-page"><div class="cdp-page-header"><span>Page: CC11. Energy</span></div><div class="cdp-page-body"><div class="cdp-question"><div class="cdp-question-header"><span>CC11.2 Purchased heat, steam and cooling</span></div><div class="cdp-question-body"><table class="cdp-question-body-table"><thead><tr><th><span>Energy type</span></th><th><span>MWh</span></th></tr></thead><tbody><tr>{}</tr></tbody></table></div></div><div class="cdp-question"><div class="cdp-question-header"><span>CC11.3 Fuel consumption</span></div><div class="cdp-question-body"><span>MWh</span><span>340.0</span></div></div><div class="cdp-question"><div class="cdp-question-header"><span>CC11.5 Electricity accounting</span></div><div class="cdp-question-body"><table class="cdp-question-body-table"><thead><tr><th><span>Total consumed</span></th><th><span>Purchased</span></th><th><span>Produced</span></th><th><span>Renewable produced</span></th><th><span>Renewable consumed</span></th></tr></thead><tbody><tr><td><span>1000</span></td><td><span>600</span></td><td><span>400</span></td><td><span>150</span></td><td><span>100</span></td></tr></tbody></table></div></div></div></div></div></div>"#,
            cc112
        )
    }

    #[test]
    fn energy_use_old_schema_fills_the_total_cells() {
        let module = energy_module_old(&[
            "Heat", "100", "Steam", "50", "Cooling", "25",
        ]);
        let doc = old_doc(2016, &module);
        let mut sheet = Sheet::default();
        let mut diag = Diagnostics::new();
        energy_use(&doc, &mut sheet, false, &mut diag).unwrap();

        assert_eq!(sheet.get("E20"), Some(&CellValue::Number(175.0)));
        assert_eq!(sheet.get("E14"), Some(&CellValue::Number(340.0)));
        assert_eq!(sheet.get("E17"), Some(&CellValue::Number(600.0)));
        assert!(diag.is_empty());
    }

    #[test]
    fn energy_use_old_schema_treats_three_blanks_as_no_answer() {
        let module = energy_module_old(&["Heat", "", "Steam", "", "Cooling", ""]);
        let doc = old_doc(2016, &module);
        let mut sheet = Sheet::default();
        let mut diag = Diagnostics::new();
        energy_use(&doc, &mut sheet, false, &mut diag).unwrap();

        assert!(sheet.get("E20").is_none());
        assert!(diag
            .warnings()
            .iter()
            .any(|w| w.context == "CC11.2"));
    }

    const GENERATION_HEADER: &[&str] = &[
        "",
        "Total Generation (MWh)",
        "Generation that is consumed by the organization (MWh)",
        "Generation from renewable sources (MWh)",
        "Generation from renewable sources that is consumed by the organization (MWh)",
    ];

    #[test]
    fn energy_production_new_schema_aggregates_heat_steam_cooling() {
        let rows: Vec<&[&str]> = vec![
            &["Electricity", "100", "40", "60", "20"][..],
            &["Heat", "10", "5", "0", "0"][..],
            &["Steam", "5", "5", "0", "0"][..],
        ];
        let body = new_table(
            "formatted_responses_matrix_set_grid_11555",
            GENERATION_HEADER,
            &rows,
        );
        let doc = new_doc(2019, &body);
        let mut sheet = Sheet::default();
        let mut diag = Diagnostics::new();
        energy_production(&doc, &mut sheet, true, &mut diag).unwrap();

        assert_eq!(sheet.get("H28"), Some(&CellValue::Number(100.0)));
        assert_eq!(sheet.get("H31"), Some(&CellValue::Number(20.0)));
        assert_eq!(sheet.get("H34"), Some(&CellValue::Number(15.0)));
        assert_eq!(sheet.get("H35"), Some(&CellValue::Number(10.0)));
        assert!(diag.is_empty());
    }

    #[test]
    fn energy_production_is_optional_in_the_new_schema() {
        let doc = new_doc(2019, "");
        let mut sheet = Sheet::default();
        let mut diag = Diagnostics::new();
        energy_production(&doc, &mut sheet, true, &mut diag).unwrap();
        assert!(sheet.is_empty());
        assert!(diag.is_empty());
    }

    #[test]
    fn energy_production_old_schema_writes_three_figures() {
        let module = energy_module_old(&["Heat", "100"]);
        let doc = old_doc(2016, &module);
        let mut sheet = Sheet::default();
        let mut diag = Diagnostics::new();
        energy_production(&doc, &mut sheet, true, &mut diag).unwrap();

        assert_eq!(sheet.get("E28"), Some(&CellValue::Number(400.0)));
        assert_eq!(sheet.get("E30"), Some(&CellValue::Number(150.0)));
        assert_eq!(sheet.get("E31"), Some(&CellValue::Number(100.0)));
        assert!(diag.is_empty());
    }

    #[test]
    fn energy_production_old_schema_checks_run_unconditionally() {
        // Produced 120 vs 150 renewable-produced, with validation off.
        let module = energy_module_old(&["Heat", "100"])
            .replace("<td><span>400</span></td>", "<td><span>120</span></td>");
        let doc = old_doc(2016, &module);
        let mut sheet = Sheet::default();
        let mut diag = Diagnostics::new();
        energy_production(&doc, &mut sheet, false, &mut diag).unwrap();

        assert_eq!(diag.len(), 1);
        assert_eq!(sheet.get("E28"), Some(&CellValue::Number(120.0)));
    }

    #[test]
    fn energy_production_flags_impossible_generation_when_asked() {
        let rows: Vec<&[&str]> = vec![&["Electricity", "100", "40", "120", "20"][..]];
        let body = new_table(
            "formatted_responses_matrix_set_grid_11555",
            GENERATION_HEADER,
            &rows,
        );
        let doc = new_doc(2019, &body);
        let mut sheet = Sheet::default();
        let mut diag = Diagnostics::new();
        energy_production(&doc, &mut sheet, true, &mut diag).unwrap();
        assert_eq!(diag.len(), 1);

        let mut sheet = Sheet::default();
        let mut diag = Diagnostics::new();
        let doc = new_doc(2019, &body);
        energy_production(&doc, &mut sheet, false, &mut diag).unwrap();
        assert!(diag.is_empty());
    }
}
