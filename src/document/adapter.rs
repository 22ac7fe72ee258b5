// src/document/adapter.rs
use once_cell::sync::Lazy;
use scraper::{ElementRef, Selector};

use super::Schema;
use crate::utils::error::StructuralError;

/// A question table as rows of cell text, headers in row zero.
pub type Matrix = Vec<Vec<String>>;

static OLD_TABLE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("table.cdp-question-body-table").expect("Invalid old table selector")
});
static NEW_TABLE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("table.ndp_formatted_response__table").expect("Invalid new table selector")
});
static THEAD_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("thead").expect("Invalid thead selector"));
static TBODY_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("tbody").expect("Invalid tbody selector"));
static TH_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("th").expect("Invalid th selector"));
static TD_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("td").expect("Invalid td selector"));

/// Flattens a section into its visible text fragments, depth first.
/// Newlines are stripped and empty fragments dropped, which leaves the
/// label/value stream the extractors scan. Only meant for single question
/// sections, not whole documents.
pub fn section_tokens(section: ElementRef<'_>) -> Vec<String> {
    section
        .text()
        .map(|fragment| fragment.replace('\n', ""))
        .filter(|fragment| !fragment.is_empty())
        .collect()
}

/// Finds the question's data table by schema-specific class and converts
/// it to a matrix. `context` names the section for error reporting.
pub fn section_table(
    section: ElementRef<'_>,
    schema: Schema,
    context: &str,
) -> Result<Matrix, StructuralError> {
    let (selector, class) = match schema {
        Schema::Old => (&*OLD_TABLE_SELECTOR, "cdp-question-body-table"),
        Schema::New => (&*NEW_TABLE_SELECTOR, "ndp_formatted_response__table"),
    };
    let table = section
        .select(selector)
        .next()
        .ok_or_else(|| StructuralError::TableNotFound {
            section: context.to_string(),
            class,
        })?;
    table_matrix(table, schema)
}

/// Converts an html table into rows of cell text, headers first. Old-schema
/// tables run every body cell through a single row wrapper, so logical rows
/// are rebuilt by chunking the cells at the header width. The body cell
/// count must divide evenly by the header count.
pub fn table_matrix(table: ElementRef<'_>, schema: Schema) -> Result<Matrix, StructuralError> {
    let thead = table
        .select(&THEAD_SELECTOR)
        .next()
        .ok_or_else(|| StructuralError::Inconsistent {
            context: "table",
            detail: "missing thead".to_string(),
        })?;
    let tbody = table
        .select(&TBODY_SELECTOR)
        .next()
        .ok_or_else(|| StructuralError::Inconsistent {
            context: "table",
            detail: "missing tbody".to_string(),
        })?;

    // Old tables add one wrapper level between thead/tbody and the cells.
    let (header_root, body_root) = match schema {
        Schema::Old => (
            first_element_child(thead).ok_or_else(|| StructuralError::Inconsistent {
                context: "table",
                detail: "empty thead".to_string(),
            })?,
            first_element_child(tbody).ok_or_else(|| StructuralError::Inconsistent {
                context: "table",
                detail: "empty tbody".to_string(),
            })?,
        ),
        Schema::New => (thead, tbody),
    };

    let headers: Vec<String> = header_root
        .select(&TH_SELECTOR)
        .map(|th| cell_text(th, schema))
        .collect();
    let body_cells: Vec<String> = body_root
        .select(&TD_SELECTOR)
        .map(|td| cell_text(td, schema))
        .collect();

    if headers.is_empty() || body_cells.len() % headers.len() != 0 {
        return Err(StructuralError::TableShape {
            header: headers.len(),
            body: body_cells.len(),
        });
    }

    let width = headers.len();
    let mut matrix = vec![headers];
    for chunk in body_cells.chunks(width) {
        matrix.push(chunk.to_vec());
    }
    Ok(matrix)
}

/// Bounds-checked matrix access for extractors addressing fixed cells.
pub fn matrix_cell<'m>(
    matrix: &'m Matrix,
    row: usize,
    col: usize,
    context: &'static str,
) -> Result<&'m str, StructuralError> {
    matrix
        .get(row)
        .and_then(|r| r.get(col))
        .map(String::as_str)
        .ok_or_else(|| StructuralError::Inconsistent {
            context,
            detail: format!("missing table cell ({}, {})", row, col),
        })
}

fn first_element_child(el: ElementRef<'_>) -> Option<ElementRef<'_>> {
    el.children().filter_map(ElementRef::wrap).next()
}

fn cell_text(cell: ElementRef<'_>, schema: Schema) -> String {
    match schema {
        Schema::Old => {
            // Old cells wrap their content in an inner element; take the
            // first child's text and strip the zero-width spaces used as
            // line separators.
            let raw = match cell.children().next() {
                Some(node) => match ElementRef::wrap(node) {
                    Some(inner) => inner.text().collect::<String>(),
                    None => node
                        .value()
                        .as_text()
                        .map(|t| t.to_string())
                        .unwrap_or_default(),
                },
                None => String::new(),
            };
            raw.replace('\u{200b}', "")
        }
        Schema::New => cell.text().collect::<String>().replace('\n', ""),
    }
}
