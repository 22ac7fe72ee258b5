// src/extractors/sourcing.rs
use crate::document::adapter::{section_table, section_tokens};
use crate::document::{locate, Document, Schema};
use crate::extractors::{parse_float, token_at};
use crate::sheet::{cell_ref, column_offset, Sheet};
use crate::utils::diag::Diagnostics;
use crate::utils::error::StructuralError;

/// Sourcing instruments by the exact questionnaire phrasings used across
/// 2016-2020. Wordings drifted every year, including a misprint that
/// drops the hyphen from "grid-connected".
const INSTRUMENTS: &[(&str, &[&str])] = &[
    (
        "PPA direct line",
        &[
            "Power purchase agreement (PPA) with on-site/off-site generator owned by a third party with no grid transfers (direct line)",
            "Off-grid energy consumption from an on-site installation or through a direct line to an off-site generator owned by another company",
        ],
    ),
    (
        "PPA w/EAC",
        &[
            "Power purchase agreement (PPA) with a grid-connected generator with energy attribute certificates",
            "Power Purchase Agreement (PPA) with energy attribute certificates",
            "Direct procurement contract with a grid-connected generator or Power Purchase Agreement (PPA), supported by energy attribute certificates",
            "Direct procurement contract with a gridconnected generator or Power Purchase Agreement (PPA), supported by energy attribute certificates",
        ],
    ),
    (
        "PPA no EAC",
        &[
            "Power purchase agreement (PPA) with a grid-connected generator without energy attribute certificates",
            "Power Purchase Agreement (PPA) without energy attribute certificates",
            "Direct procurement contract with a grid-connected generator or Power Purchase Agreement (PPA), where electricity attribute certificates do not exist or are not required for a usage claim",
            "Direct procurement contract with a gridconnected generator or Power Purchase Agreement (PPA), where electricity attribute certificates do not exist or are not required for a usage claim",
        ],
    ),
    (
        "Energy product w/EAC",
        &[
            "Green electricity products (e.g. green tariffs) from an energy supplier, supported by energy attribute certificates",
            "Contract with suppliers or utilities ( e.g. green tariff), supported by energy attribute certificates",
            "Contract with suppliers or utilities, supported by energy attribute certificates",
        ],
    ),
    (
        "Energy product no EAC",
        &[
            "Green electricity products (e.g. green tariffs) from an energy supplier, not supported by energy attribute certificates",
            "Contract with suppliers or utilities (e.g. green tariff), not supported by energy attribute certificates",
            "Contract with suppliers or utilities (e.g. green tariff), not backed by electricity attribute certificates",
            "Contract with suppliers or utilities, with a supplier-specific emission rate, not backed by electricity attribute certificates",
        ],
    ),
    (
        "Unbundled EAC",
        &[
            "Unbundled energy attribute certificates, Guarantees of Origin",
            "Unbundled energy attribute certificates, Renewable Energy Certificates (RECs)",
            "Unbundled energy attribute certificates, International REC Standard (I-RECs)",
            "Unbundled energy attribute certificates, other - please specify",
            "Energy attribute certificates, Guarantees of Origin",
            "Energy attribute certificates, Renewable Energy Certificates (RECs)",
            "Energy attribute certificates, I-RECs",
        ],
    ),
    ("HSC agreement", &["Heat/steam/cooling supply agreement"]),
    ("Grid mix", &["Grid mix of renewable electricity"]),
    (
        "Self owned",
        &[
            "Grid-connected electricity generation owned, operated or hosted by the company, where electricity attribute certificates do not exist or are not required for a usage claim",
            "Grid-connected generation owned, operated or hosted by the company, with energy attribute certificates created and retired by company",
        ],
    ),
];

/// Generation technologies grouped the way the sourcing sheet reports
/// them.
const TECHNOLOGIES: &[(&str, &[&str])] = &[
    ("Solar", &["Solar", "Solar PV", "Concentrated solar power (CSP)"]),
    ("Wind", &["Wind"]),
    ("Hydro", &["Hydropower"]),
    ("Nuclear", &["Nuclear"]),
    ("Biomass", &["Biomass", "Biomass (including biogas)"]),
    ("Other tech", &["Marine", "Geothermal", "Tidal"]),
    ("Unspecified", &["Low-carbon energy mix"]),
];

fn instrument_for(label: &str) -> Option<&'static str> {
    INSTRUMENTS
        .iter()
        .find(|(_, phrasings)| phrasings.contains(&label))
        .map(|&(short, _)| short)
}

fn technology_for(label: &str) -> Option<&'static str> {
    TECHNOLOGIES
        .iter()
        .find(|(_, phrasings)| phrasings.contains(&label))
        .map(|&(group, _)| group)
}

/// Exports sometimes carry a single trailing space on a cell.
fn trim_one(value: &str) -> &str {
    value.strip_suffix(' ').unwrap_or(value)
}

/// Low-carbon electricity sourcing (C8.2e/C8.2f / CC11.4) on the
/// market-based sourcing sheet. Each version owns three columns starting
/// at row 3: instrument, technologies, MWh. Free-text instruments and
/// technologies are marked `Check` and surface as a single finding at
/// the end.
pub fn low_carbon_sourcing(
    doc: &Document,
    sheet: &mut Sheet,
    diag: &mut Diagnostics,
) -> Result<(), StructuralError> {
    let column = match doc.version {
        2016 => 'A',
        2017 => 'D',
        2018 => 'G',
        2019 => 'J',
        2020 => 'M',
        other => return Err(StructuralError::UnsupportedVersion(other)),
    };
    if sheet.is_populated(&cell_ref(column, 3)) {
        return Ok(());
    }

    let mut needs_check = false;
    match doc.schema {
        Schema::Old => {
            let question = locate::question_old(doc, "ORSMENU_3", "CC11.4")?;
            let table = section_table(question, Schema::Old, "CC11.4")?;
            let data_rows = table.len() - 1;
            let mut offset: u32 = 0;
            for (i, row_cells) in table.iter().enumerate().skip(1) {
                let label = trim_one(row_cells.first().map(String::as_str).unwrap_or_default());
                if label.is_empty() {
                    offset += 1;
                    continue;
                }
                if label.contains("No purchases or generation of low carbon") {
                    if data_rows > 1 {
                        diag.warn(
                            "CC11.4",
                            format!(
                                "no-sourcing row mixed with other rows (version {})",
                                doc.version
                            ),
                        );
                        offset += 1;
                        continue;
                    }
                    break;
                }
                let target = 3 + (i as u32 - 1) - offset;
                match instrument_for(label) {
                    Some(short) => sheet.set_text(cell_ref(column, target), short),
                    None if label.contains("Other")
                        || label == "Off-grid energy consumption from an onsite installation or through a direct line to an off-site generator" =>
                    {
                        sheet.set_check(cell_ref(column, target));
                        needs_check = true;
                    }
                    None => {
                        return Err(StructuralError::UnexpectedLabel {
                            context: "CC11.4 sourcing",
                            label: label.to_string(),
                        })
                    }
                }
                let mwh = trim_one(row_cells.get(1).map(String::as_str).unwrap_or_default());
                let value = parse_float(mwh).ok_or_else(|| StructuralError::InvalidNumber {
                    context: "CC11.4 sourcing",
                    value: mwh.to_string(),
                })?;
                sheet.set_number(cell_ref(column_offset(column, 2), target), value);
            }
        }
        Schema::New => {
            let section = match locate::find_section(doc, "formatted_responses_question_11576") {
                Some(section) => section,
                None => {
                    tracing::info!(
                        "no low-carbon sourcing disclosed in version {}, skipping C8.2e",
                        doc.version
                    );
                    return Ok(());
                }
            };
            let info = section_tokens(section);
            let mut row: u32 = 3;
            let mut tech = false;

            for (i, txt) in info.iter().enumerate() {
                let txt = txt.as_str();
                match txt {
                    "Sourcing method" | "Basis for applying a low-carbon emission factor" => {
                        let data = trim_one(token_at(&info, i + 1, "C8.2e sourcing")?);
                        match instrument_for(data) {
                            Some(short) => sheet.set_text(cell_ref(column, row), short),
                            None if data.contains("Other, please specify")
                                || data.contains("Other low-carbon technology, please specify")
                                || data.contains("other - please specify") =>
                            {
                                sheet.set_check(cell_ref(column, row));
                                needs_check = true;
                            }
                            None if data.contains("None") || data.contains("No purchases") => {
                                if info.len() > 13 {
                                    return Err(StructuralError::Inconsistent {
                                        context: "C8.2e sourcing",
                                        detail: format!(
                                            "declared no low-carbon sourcing but the section carries {} tokens",
                                            info.len()
                                        ),
                                    });
                                }
                                break;
                            }
                            None => {
                                return Err(StructuralError::UnexpectedLabel {
                                    context: "C8.2e sourcing",
                                    label: data.to_string(),
                                })
                            }
                        }
                    }
                    "MWh consumed accounted for at a zero emission factor"
                    | "MWh consumed associated with low-carbon electricity, heat, steam or cooling" => {
                        tech = false;
                        let data = trim_one(token_at(&info, i + 1, "C8.2e sourcing")?);
                        let value =
                            parse_float(data).ok_or_else(|| StructuralError::InvalidNumber {
                                context: "C8.2e sourcing",
                                value: data.to_string(),
                            })?;
                        sheet.set_number(cell_ref(column_offset(column, 2), row), value);
                        row += 1;
                    }
                    "Region of consumption of low-carbon electricity, heat, steam or cooling"
                    | "Country/region of consumption of low-carbon electricity, heat, steam or cooling" => {
                        tech = false;
                    }
                    "Low-carbon technology type" => {
                        tech = true;
                        sheet.set_text(cell_ref(column_offset(column, 1), row), "");
                    }
                    value if tech => {
                        let value = trim_one(value);
                        match technology_for(value) {
                            Some(group) => sheet.append_text(
                                &cell_ref(column_offset(column, 1), row),
                                &format!("{};", group),
                            ),
                            None if value.contains("Other, please specify")
                                || value.contains("Other low-carbon technology, please specify")
                                || value == "Please select" =>
                            {
                                sheet.set_check(cell_ref(column_offset(column, 1), row));
                                needs_check = true;
                            }
                            None => {
                                return Err(StructuralError::UnexpectedLabel {
                                    context: "C8.2e technology",
                                    label: value.to_string(),
                                })
                            }
                        }
                    }
                    _ => {}
                }
            }
        }
    }

    if needs_check {
        let context = match doc.schema {
            Schema::Old => "CC11.4",
            Schema::New => "C8.2e/f",
        };
        diag.warn(
            context,
            format!(
                "some sourcing entries need manual checking (version {})",
                doc.version
            ),
        );
    }
    Ok(())
}
