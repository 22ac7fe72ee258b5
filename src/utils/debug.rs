// src/utils/debug.rs
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::document::adapter::section_tokens;
use crate::document::locate;
use crate::document::{Document, Schema};
use crate::utils::error::AppError;

/// Section ids probed on new-schema documents, in extraction order.
const NEW_SECTION_IDS: &[&str] = &[
    "formatted_responses_matrix_set_grid_11995",
    "formatted_responses_question_2723",
    "formatted_responses_question_2727",
    "formatted_responses_question_2731",
    "formatted_responses_question_12033",
    "formatted_responses_matrix_set_grid_11582",
    "formatted_responses_question_18615",
    "formatted_responses_question_2816",
    "formatted_responses_question_2325",
    "formatted_responses_question_87916",
    "formatted_responses_matrix_set_grid_10823",
    "formatted_responses_question_10853",
    "formatted_responses_matrix_set_grid_11555",
    "formatted_responses_question_8602",
    "formatted_responses_question_11576",
];

/// Module/question pairs probed on old-schema documents.
const OLD_QUESTIONS: &[(&str, &str)] = &[
    ("ORSMENU_0", "CC0.2"),
    ("ORSMENU_3", "CC8.2"),
    ("ORSMENU_3", "CC8.3a"),
    ("ORSMENU_3", "CC14.1"),
    ("ORSMENU_3", "CC11.2"),
    ("ORSMENU_3", "CC11.3"),
    ("ORSMENU_3", "CC11.5"),
    ("ORSMENU_3", "CC11.4"),
];

/// Saves the flattened token list of every section the extractors probe,
/// one block per section. Sections absent from the document are marked
/// instead of skipped so gaps are visible at a glance.
pub fn dump_section_tokens(doc: &Document, filename: &str) -> Result<(), AppError> {
    let path = Path::new(filename);
    let mut file = File::create(path)?;

    let mut dump = format!("version: {}\nschema: {:?}\n", doc.version, doc.schema);
    match doc.schema {
        Schema::New => {
            for &id in NEW_SECTION_IDS {
                match locate::find_section(doc, id) {
                    Some(section) => push_block(&mut dump, id, &section_tokens(section)),
                    None => push_missing(&mut dump, id),
                }
            }
        }
        Schema::Old => {
            for &(module_id, code) in OLD_QUESTIONS {
                let label = format!("{}/{}", module_id, code);
                match locate::question_old(doc, module_id, code) {
                    Ok(section) => push_block(&mut dump, &label, &section_tokens(section)),
                    Err(_) => push_missing(&mut dump, &label),
                }
            }
        }
    }

    file.write_all(dump.as_bytes())?;
    tracing::info!("Saved section token dump to {}", path.display());
    Ok(())
}

fn push_block(dump: &mut String, name: &str, tokens: &[String]) {
    dump.push_str(&format!("\n== {} ({} tokens) ==\n", name, tokens.len()));
    for (i, token) in tokens.iter().enumerate() {
        dump.push_str(&format!("[{:>3}] {}\n", i, token));
    }
}

fn push_missing(dump: &mut String, name: &str) {
    dump.push_str(&format!("\n== {} == (not present)\n", name));
}
