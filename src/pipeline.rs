// src/pipeline.rs
use std::path::PathBuf;

use crate::document::Document;
use crate::extractors::{dates, emissions, energy, scopes, sourcing, utilities};
use crate::sheet::Workbook;
use crate::utils::diag::Diagnostics;
use crate::utils::error::{AppError, StructuralError};

/// One response per questionnaire version 2016-2020.
pub const MAX_RESPONSES: usize = 5;

pub struct OrderedResponse {
    pub version: i32,
    pub path: PathBuf,
    pub document: Document,
}

/// Loads the given responses and orders them newest first. Later versions
/// carry the freshest restatements, so they get first claim on shared
/// cells like the base year; older responses then only fill what is still
/// empty. Two responses for the same version would race for the same
/// cells and are rejected.
pub fn order_responses(paths: &[String]) -> Result<Vec<OrderedResponse>, AppError> {
    if paths.len() > MAX_RESPONSES {
        return Err(AppError::TooManyResponses(paths.len()));
    }
    let mut ordered: Vec<OrderedResponse> = Vec::with_capacity(paths.len());
    for path in paths {
        let document = Document::load(path)?;
        if let Some(existing) = ordered.iter().find(|r| r.version == document.version) {
            return Err(AppError::DuplicateVersion {
                version: document.version,
                first: existing.path.clone(),
                second: PathBuf::from(path),
            });
        }
        ordered.push(OrderedResponse {
            version: document.version,
            path: PathBuf::from(path),
            document,
        });
    }
    ordered.sort_by(|a, b| b.version.cmp(&a.version));
    Ok(ordered)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractOptions {
    /// Run the numeric plausibility checks on top of extraction.
    pub validate: bool,
}

/// Runs every extractor over one response and collects the findings.
/// Writing is idempotent per version: cells already populated are left
/// alone, so processing the same response again changes nothing, and a
/// rerun over an existing workbook only fills gaps.
pub fn process_response(
    doc: &Document,
    book: &mut Workbook,
    options: ExtractOptions,
) -> Result<Diagnostics, StructuralError> {
    let mut diag = Diagnostics::new();
    let n_years = dates::reported_years(doc, &mut diag)?;

    emissions::base_emissions(doc, &mut book.emissions, &mut diag)?;
    emissions::methodology(doc, &mut book.emissions, &mut diag)?;
    emissions::verification(doc, &mut book.emissions)?;
    scopes::scope1(doc, &mut book.emissions, n_years, &mut diag)?;
    scopes::scope2(doc, &mut book.emissions, n_years, &mut diag)?;
    scopes::scope3(doc, &mut book.emissions, &mut diag)?;

    let answered = utilities::utility_generation(doc, &mut book.utilities, options.validate, &mut diag);
    energy::energy_use(doc, &mut book.energy, options.validate, &mut diag)?;
    energy::energy_production(doc, &mut book.energy, options.validate, &mut diag)?;
    utilities::reconcile_utility_flag(doc, answered, &mut book.energy, &book.emissions, &mut diag);

    sourcing::low_carbon_sourcing(doc, &mut book.sourcing, &mut diag)?;
    Ok(diag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::CellValue;

    fn section(id: &str, tokens: &[&str]) -> String {
        let spans: String = tokens
            .iter()
            .map(|t| format!("<span>{}</span>", t))
            .collect();
        format!(r#"<div id="formatted_responses_{}">{}</div>"#, id, spans)
    }

    fn grid(id: &str, header: &[&str], rows: &[&[&str]]) -> String {
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
            r#"<div id="formatted_responses_{}"><table class="ndp_formatted_response__table"><thead><tr>{}</tr></thead><tbody>{}</tbody></table></div>"#,
            id, ths, trs
        )
    }

    fn base_year_sections(s1: &str, s2_lb: &str, s2_mb: &str) -> String {
        let mut html = String::new();
        for (id, title, value) in [
            ("question_2723", "Scope 1 base year", s1),
            ("question_2727", "Scope 2 (location-based) base year", s2_lb),
            ("question_2731", "Scope 2 (market-based) base year", s2_mb),
        ] {
            html.push_str(&section(
                id,
                &[
                    title,
                    "Base year start",
                    "January 1 2015",
                    "Base year end",
                    "December 31 2015",
                    "Base year emissions (metric tons CO2e)",
                    value,
                ],
            ));
        }
        html
    }

    fn consumption_grid() -> String {
        grid(
            "matrix_set_grid_10823",
            &[
                "",
                "Heating value",
                "MWh from renewable sources",
                "MWh from non-renewable sources",
                "Total MWh",
            ],
            &[
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
                    "Consumption of purchased or acquired cooling",
                    "<Not Applicable>",
                    "3",
                    "3",
                    "6",
                ][..],
                &["Total energy consumption", "<Not Applicable>", "18", "28", "46"][..],
            ],
        )
    }

    fn response(version: i32, period: i32, base_s1: &str) -> String {
        let mut html = format!(
            r#"<div id="formatted_responses_ndp__container"><div>a</div><div>b</div><div>c</div><div>Acme - Climate Change {}</div></div>"#,
            version
        );
        html.push_str(&grid(
            "matrix_set_grid_11995",
            &[
                "",
                "Start date",
                "End date",
                "Indicate if you are providing emissions data for past reporting years",
                "Select the number of past reporting years",
            ],
            &[&[
                "Reporting year",
                &format!("January 1 {}", period),
                &format!("December 31 {}", period),
                "No",
                "Please select",
            ][..]],
        ));
        html.push_str(&base_year_sections(base_s1, "700.0", "650.0"));
        html.push_str(&section(
            "question_12033",
            &[
                "C5.2",
                "The Greenhouse Gas Protocol: A Corporate Accounting and Reporting Standard (Revised Edition)",
            ],
        ));
        html.push_str(&section(
            "matrix_set_grid_11582",
            &[
                "C10.1",
                "Scope 1",
                "Status",
                "Third-party verification or assurance process in place",
                "Scope 2",
                "No third-party verification or assurance",
                "Scope 3",
                "No emissions data provided",
            ],
        ));
        if version == 2018 {
            html.push_str(&section(
                "question_18615",
                &[
                    "C6.1",
                    "Gross global Scope 1 emissions (metric tons CO2e)",
                    "950.0",
                    "End-year of reporting period",
                    &period.to_string(),
                ],
            ));
            html.push_str(&section(
                "question_2816",
                &[
                    "C6.3",
                    "Scope 2, location-based",
                    "480.0",
                    "Scope 2, market-based (if applicable)",
                    "430.0",
                    "End-year of reporting period",
                    &period.to_string(),
                ],
            ));
        } else {
            html.push_str(&section(
                "question_18615",
                &[
                    "C6.1",
                    "Gross global Scope 1 emissions (metric tons CO2e)",
                    "1000.0",
                    "Start date",
                    &format!("January 1 {}", period),
                    "End date",
                    &format!("December 31 {}", period),
                ],
            ));
            html.push_str(&section(
                "question_2816",
                &[
                    "C6.3",
                    "Scope 2, location-based",
                    "500.0",
                    "Scope 2, market-based (if applicable)",
                    "450.0",
                    "Start date",
                    &format!("January 1 {}", period),
                    "End date",
                    &format!("December 31 {}", period),
                ],
            ));
        }
        html.push_str(&section(
            "question_2325",
            &[
                "Business travel",
                "Evaluation status",
                "Relevant, calculated",
                "Metric tonnes CO2e",
                "1500.0",
            ],
        ));
        html.push_str(&consumption_grid());
        html
    }

    fn book_json(book: &Workbook) -> String {
        serde_json::to_string(book).unwrap()
    }

    #[test]
    fn extracts_one_response_across_all_sheets() {
        let doc = Document::parse(&response(2019, 2018, "823.5")).unwrap();
        let mut book = Workbook::new();
        let diag = process_response(&doc, &mut book, ExtractOptions::default()).unwrap();

        assert_eq!(book.emissions.get("E3"), Some(&CellValue::Number(823.5)));
        assert_eq!(book.emissions.get("E4"), Some(&CellValue::Number(2015.0)));
        assert_eq!(book.emissions.text("B16"), Some("GHG Protocol"));
        assert_eq!(book.emissions.text("B19"), Some("Third party verification"));
        assert_eq!(book.emissions.get("H19"), Some(&CellValue::Number(1000.0)));
        assert_eq!(book.emissions.get("H20"), Some(&CellValue::Number(500.0)));
        assert_eq!(book.emissions.get("H29"), Some(&CellValue::Number(1500.0)));
        assert_eq!(book.energy.get("H12"), Some(&CellValue::Number(10.0)));
        assert_eq!(book.energy.get("H20"), Some(&CellValue::Number(6.0)));
        assert_eq!(book.energy.text("J12"), Some("LHV"));
        // No utility question in the response.
        assert_eq!(book.energy.text("B28"), Some("no"));
        assert!(book.utilities.is_empty());
        // The scope 3 table only covers one category.
        assert!(diag.warnings().iter().all(|w| w.context == "Scope 3"));
    }

    #[test]
    fn processing_a_response_twice_changes_nothing() {
        let doc = Document::parse(&response(2019, 2018, "823.5")).unwrap();
        let mut book = Workbook::new();
        process_response(&doc, &mut book, ExtractOptions::default()).unwrap();
        let first = book_json(&book);
        process_response(&doc, &mut book, ExtractOptions::default()).unwrap();
        assert_eq!(first, book_json(&book));
    }

    #[test]
    fn responses_are_processed_newest_first_regardless_of_input_order() {
        let dir = tempfile::tempdir().unwrap();
        let newer = dir.path().join("acme_2019.html");
        let older = dir.path().join("acme_2018.html");
        std::fs::write(&newer, response(2019, 2018, "823.5")).unwrap();
        std::fs::write(&older, response(2018, 2017, "999.0")).unwrap();

        let mut books = Vec::new();
        for paths in [
            [newer.clone(), older.clone()],
            [older.clone(), newer.clone()],
        ] {
            let paths: Vec<String> = paths
                .iter()
                .map(|p| p.to_string_lossy().into_owned())
                .collect();
            let ordered = order_responses(&paths).unwrap();
            assert_eq!(
                ordered.iter().map(|r| r.version).collect::<Vec<_>>(),
                [2019, 2018]
            );
            let mut book = Workbook::new();
            for response in &ordered {
                process_response(&response.document, &mut book, ExtractOptions::default())
                    .unwrap();
            }
            // The newer restatement keeps the base year cells.
            assert_eq!(book.emissions.get("E3"), Some(&CellValue::Number(823.5)));
            assert_eq!(book.emissions.get("G19"), Some(&CellValue::Number(950.0)));
            assert_eq!(book.emissions.get("H19"), Some(&CellValue::Number(1000.0)));
            books.push(book_json(&book));
        }
        assert_eq!(books[0], books[1]);
    }

    #[test]
    fn processing_out_of_order_surrenders_shared_cells_to_the_older_response() {
        // Feeding the documents to process_response oldest-first lets the
        // 2018 restatement claim the base year cells, which is exactly what
        // order_responses exists to prevent.
        let older = Document::parse(&response(2018, 2017, "999.0")).unwrap();
        let newer = Document::parse(&response(2019, 2018, "823.5")).unwrap();
        let mut book = Workbook::new();
        process_response(&older, &mut book, ExtractOptions::default()).unwrap();
        process_response(&newer, &mut book, ExtractOptions::default()).unwrap();
        assert_eq!(book.emissions.get("E3"), Some(&CellValue::Number(999.0)));
    }

    #[test]
    fn rejects_more_than_five_responses() {
        let paths: Vec<String> = (0..6).map(|i| format!("resp_{}.html", i)).collect();
        assert!(matches!(
            order_responses(&paths),
            Err(AppError::TooManyResponses(6))
        ));
    }

    #[test]
    fn rejects_two_responses_for_the_same_version() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("acme_a.html");
        let second = dir.path().join("acme_b.html");
        std::fs::write(&first, response(2019, 2018, "823.5")).unwrap();
        std::fs::write(&second, response(2019, 2018, "823.5")).unwrap();

        let paths = vec![
            first.to_string_lossy().into_owned(),
            second.to_string_lossy().into_owned(),
        ];
        assert!(matches!(
            order_responses(&paths),
            Err(AppError::DuplicateVersion { version: 2019, .. })
        ));
    }
}
