// src/extractors/utilities.rs
use crate::document::adapter::section_tokens;
use crate::document::{locate, Document, Schema};
use crate::extractors::parse_float;
use crate::sheet::{cell_ref, column_offset, version_column, Sheet};
use crate::utils::diag::Diagnostics;

/// Generation technology to utility-sheet row. Some exports mangle the
/// en-dash in the hard-coal label; both spellings are kept. Hydropower,
/// marine and the residual categories share rows, so figures accumulate.
const TECHNOLOGY_ROWS: &[(&str, u32)] = &[
    ("Coal â€“ hard", 3),
    ("Coal – hard", 3),
    ("Lignite", 4),
    ("Oil", 5),
    ("Gas", 6),
    ("Biomass", 7),
    ("Waste (non-biomass)", 8),
    ("Nuclear", 9),
    ("Geothermal", 10),
    ("Hydropower", 11),
    ("Hydroelectric", 11),
    ("Wind", 12),
    ("Solar", 13),
    ("Marine", 14),
    ("Other renewable", 14),
    ("Fossil-fuel plants fitted with CCS", 15),
    ("Other non-renewable", 15),
];

fn technology_row(label: &str) -> Option<u32> {
    TECHNOLOGY_ROWS
        .iter()
        .find(|(known, _)| *known == label)
        .map(|&(_, row)| row)
}

#[derive(Clone, Copy)]
enum Figure {
    Capacity,
    Gross,
    Net,
    Emissions,
}

#[derive(Default)]
struct TechFigures {
    capacity: Option<f64>,
    gross: Option<f64>,
    net: Option<f64>,
}

/// Per-technology capacity, generation and emissions of electric
/// utilities (C-EU8.2d). Capacity lands on rows 3-15, gross generation 17
/// rows below, net generation 34 rows below, scope 1 emissions seven
/// columns to the right. Returns whether the question was answered at
/// all, which [`reconcile_utility_flag`] compares against the sector.
///
/// Values are lenient: a missing figure counts as zero, since utilities
/// routinely leave retired technologies blank.
pub fn utility_generation(
    doc: &Document,
    sheet: &mut Sheet,
    validate: bool,
    diag: &mut Diagnostics,
) -> bool {
    if doc.schema == Schema::Old {
        return false;
    }
    let section = match locate::find_section(doc, "formatted_responses_question_8602") {
        Some(section) => section,
        None => return false,
    };

    let year = version_column('B', doc.version);
    let emissions = column_offset(year, 7);
    // The guard spans all four bands: a section may disclose generation
    // or emissions without any capacity, and the writes accumulate.
    let guard: Vec<(char, u32)> = (3..=15)
        .flat_map(|row| [(year, row), (year, row + 17), (year, row + 34), (emissions, row)])
        .collect();
    if sheet.any_populated(&guard) {
        return true;
    }

    let info = section_tokens(section);
    let mut row: Option<u32> = None;
    let mut technology: &str = "";
    let mut pending: Option<(String, Figure)> = None;
    let mut figures = TechFigures::default();

    for txt in info.iter().skip(1) {
        let txt = txt.as_str();
        if let Some(tech_row) = technology_row(txt) {
            row = Some(tech_row);
            technology = txt;
            figures = TechFigures::default();
            continue;
        }
        let current = match row {
            Some(current) => current,
            None => continue,
        };
        match txt {
            "Nameplate capacity (MW)" => {
                pending = Some((cell_ref(year, current), Figure::Capacity));
            }
            "Gross electricity generation (GWh)" => {
                pending = Some((cell_ref(year, current + 17), Figure::Gross));
            }
            "Net electricity generation (GWh)" => {
                pending = Some((cell_ref(year, current + 34), Figure::Net));
            }
            "Absolute scope 1 emissions (metric tons CO2e)" => {
                pending = Some((cell_ref(emissions, current), Figure::Emissions));
            }
            "Scope 1 emissions intensity (metric tons CO2e per GWh)" => {
                // Intensity closes out a technology block and is not kept.
                row = None;
            }
            value => {
                if let Some((cell, figure)) = pending.take() {
                    let value = parse_float(value).unwrap_or(0.0);
                    sheet.add_number(&cell, value);
                    match figure {
                        Figure::Capacity => figures.capacity = Some(value),
                        Figure::Gross => figures.gross = Some(value),
                        Figure::Net => figures.net = Some(value),
                        Figure::Emissions => {
                            if validate {
                                check_technology(technology, &figures, doc.version, diag);
                            }
                        }
                    }
                }
            }
        }
    }
    true
}

/// Plausibility checks for one technology, run when its emissions figure
/// closes the block. Figures that were never disclosed skip their
/// comparisons.
fn check_technology(
    technology: &str,
    figures: &TechFigures,
    version: i32,
    diag: &mut Diagnostics,
) {
    if let (Some(net), Some(gross)) = (figures.net, figures.gross) {
        if net > gross {
            diag.warn(
                "C-EU8.2d",
                format!(
                    "{}: net generation exceeds gross generation (version {})",
                    technology, version
                ),
            );
        }
    }
    if let Some(capacity) = figures.capacity {
        // GWh a plant produces running at nameplate capacity all year.
        let max_generation = capacity * 365.0 * 24.0 / 1000.0;
        if let Some(gross) = figures.gross {
            if gross > max_generation {
                diag.warn(
                    "C-EU8.2d",
                    format!(
                        "{}: gross generation exceeds what the nameplate capacity can produce (version {})",
                        technology, version
                    ),
                );
            }
        }
        if let Some(net) = figures.net {
            if net > max_generation {
                diag.warn(
                    "C-EU8.2d",
                    format!(
                        "{}: net generation exceeds what the nameplate capacity can produce (version {})",
                        technology, version
                    ),
                );
            }
        }
        if capacity > 50_000.0 {
            diag.warn(
                "C-EU8.2d",
                format!(
                    "{}: implausible nameplate capacity {} MW (version {})",
                    technology, capacity, version
                ),
            );
        }
    }
}

/// Keeps the utility marker in B28 of the energy sheet in line with what
/// the responses disclose, and checks it against the industry in B6 of
/// the emissions sheet. B6 is maintained by hand in the workbook; when it
/// is blank the industry comparison is skipped. The marker is written
/// once; later responses only compare against it.
pub fn reconcile_utility_flag(
    doc: &Document,
    answered: bool,
    energy: &mut Sheet,
    emissions: &Sheet,
    diag: &mut Diagnostics,
) {
    if doc.schema == Schema::Old {
        return;
    }
    let industry = emissions.text("B6");
    let existing = energy.text("B28").map(str::to_owned);
    match existing.as_deref() {
        None => {
            if answered {
                energy.set_text("B28", "yes");
                if industry.is_some_and(|i| i != "Utilities") {
                    diag.warn(
                        "C-EU8.2d",
                        format!(
                            "utility figures disclosed but the company is not marked as a utility (version {})",
                            doc.version
                        ),
                    );
                }
            } else {
                energy.set_text("B28", "no");
                if industry == Some("Utilities") {
                    diag.warn(
                        "C-EU8.2d",
                        format!(
                            "company is marked as a utility but disclosed no utility figures (version {})",
                            doc.version
                        ),
                    );
                }
            }
        }
        Some("no") if answered => diag.warn(
            "C-EU8.2d",
            format!(
                "utility figures disclosed but an earlier response had none (version {})",
                doc.version
            ),
        ),
        Some("yes") if !answered => diag.warn(
            "C-EU8.2d",
            format!(
                "no utility figures disclosed but an earlier response had them (version {})",
                doc.version
            ),
        ),
        Some(_) => {}
    }
}
