// src/document/locate.rs
use once_cell::sync::Lazy;
use scraper::{ElementRef, Selector};

use super::adapter::section_tokens;
use super::Document;
use crate::utils::error::StructuralError;

static MODULE_BODY_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.cdp-module-body").expect("Invalid module body selector"));
static PAGE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.cdp-page").expect("Invalid page selector"));
static PAGE_BODY_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.cdp-page-body").expect("Invalid page body selector"));

/// Looks up a new-schema section by its html id. Absence is left to the
/// caller: optional sections map `None` to "skip", required ones go
/// through [`require_section`].
pub fn find_section<'a>(doc: &'a Document, id: &str) -> Option<ElementRef<'a>> {
    doc.element_by_id(id)
}

/// Required-section variant of [`find_section`].
pub fn require_section<'a>(doc: &'a Document, id: &str) -> Result<ElementRef<'a>, StructuralError> {
    find_section(doc, id).ok_or_else(|| StructuralError::SectionNotFound(id.to_string()))
}

/// Descends module -> page -> question in an old-schema document using a
/// question code like `CC8.3a`. Page `CC0` has no page wrapper of its own,
/// so its questions are searched directly under the module.
pub fn question_old<'a>(
    doc: &'a Document,
    module_id: &str,
    question_code: &str,
) -> Result<ElementRef<'a>, StructuralError> {
    let (page_id, _) = question_code
        .split_once('.')
        .ok_or_else(|| StructuralError::InvalidQuestionCode(question_code.to_string()))?;
    let module = doc
        .element_by_id(module_id)
        .ok_or_else(|| StructuralError::SectionNotFound(module_id.to_string()))?;

    if page_id == "CC0" {
        question_in_page(module, page_id, question_code)
    } else {
        let page = page_in_module(module, module_id, page_id)?;
        question_in_page(page, page_id, question_code)
    }
}

fn page_in_module<'a>(
    module: ElementRef<'a>,
    module_id: &str,
    page_id: &str,
) -> Result<ElementRef<'a>, StructuralError> {
    let not_found = || StructuralError::PageNotFound {
        module: module_id.to_string(),
        page: page_id.to_string(),
    };

    let module_body = module
        .select(&MODULE_BODY_SELECTOR)
        .next()
        .ok_or_else(not_found)?;
    // "CC8." rather than "CC8", so CC8 cannot swallow a CC8x sibling.
    let dotted = format!("{}.", page_id);
    for child in module_body.children().filter_map(ElementRef::wrap) {
        if let Some(title) = header_title(child) {
            if title.contains(&dotted) {
                return Ok(child);
            }
        }
    }

    // Some responses glitch and render later pages inside the body of the
    // last page. Rescan every page wrapper for an explicit page heading.
    let marker = format!("Page: {}", page_id);
    for page in module.select(&PAGE_SELECTOR) {
        for child in page.children().filter_map(ElementRef::wrap) {
            if let Some(title) = header_title(child) {
                if title.contains(&marker) {
                    if child.value().classes().any(|c| c == "cdp-page") {
                        return Ok(child);
                    }
                    return Ok(page);
                }
            }
        }
    }

    Err(not_found())
}

fn question_in_page<'a>(
    page: ElementRef<'a>,
    page_id: &str,
    question_code: &str,
) -> Result<ElementRef<'a>, StructuralError> {
    let not_found = || StructuralError::QuestionNotFound {
        page: page_id.to_string(),
        question: question_code.to_string(),
    };

    let page_body = page
        .select(&PAGE_BODY_SELECTOR)
        .next()
        .ok_or_else(not_found)?;
    // Full-code prefix match: question texts routinely mention other
    // question numbers, so a contains() check picks the wrong block.
    for child in page_body.children().filter_map(ElementRef::wrap) {
        if let Some(title) = header_title(child) {
            if title.starts_with(question_code) {
                return Ok(child);
            }
        }
    }
    Err(not_found())
}

/// First text token of a wrapper's leading child element, which is how page
/// and question blocks carry their heading. Wrappers without one are
/// skipped by the callers.
fn header_title(wrapper: ElementRef<'_>) -> Option<String> {
    let head = wrapper.children().filter_map(ElementRef::wrap).next()?;
    section_tokens(head).into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMISSIONS_MODULE: &str = r#"<div id="formatted_response__container"><div>nav</div><div>Investor CDP 2016 - Acme Corp</div></div><div id="ORSMENU_3"><div class="cdp-module-header"><span>Module 3</span></div><div class="cdp-module-body"><div class="cdp-page"><div class="cdp-page-header"><span>Page: CC8. Emissions Data</span></div><div class="cdp-page-body"><div class="cdp-question"><div class="cdp-question-header"><span>CC8.1 Boundary for your Scope 1 and 2 inventory</span></div><div class="cdp-question-body"><span>Operational control</span></div></div><div class="cdp-question"><div class="cdp-question-header"><span>CC8.2 Gross global Scope 1 emissions</span></div><div class="cdp-question-body"><span>823.5</span></div></div></div></div></div></div>"#;

    fn doc(html: &str) -> Document {
        Document::parse(html).unwrap()
    }

    #[test]
    fn descends_module_page_question() {
        // CC8.1's text mentions "2"; only the CC8.2 block may match.
        let doc = doc(EMISSIONS_MODULE);
        let question = question_old(&doc, "ORSMENU_3", "CC8.2").unwrap();
        let tokens = section_tokens(question);
        assert!(tokens.iter().any(|t| t == "823.5"));
    }

    #[test]
    fn cc0_questions_skip_the_page_level() {
        let html = r#"<div id="formatted_response__container"><div>nav</div><div>Investor CDP 2017 - Acme Corp</div></div><div id="ORSMENU_0"><div class="cdp-module-body"><div class="cdp-page"><div class="cdp-page-header"><span>Introduction</span></div><div class="cdp-page-body"><div class="cdp-question"><div class="cdp-question-header"><span>CC0.2 Reporting period</span></div><div class="cdp-question-body"><span>Fri 01 Jan 2016 - Sat 31 Dec 2016</span></div></div></div></div></div></div>"#;
        let doc = doc(html);
        let question = question_old(&doc, "ORSMENU_0", "CC0.2").unwrap();
        assert!(section_tokens(question)
            .iter()
            .any(|t| t.contains("01 Jan 2016")));
    }

    #[test]
    fn finds_pages_nested_inside_the_previous_page() {
        let html = r#"<div id="formatted_response__container"><div>nav</div><div>Investor CDP 2016 - Acme Corp</div></div><div id="ORSMENU_3"><div class="cdp-module-body"><div class="cdp-page"><div class="cdp-page-header"><span>Page: CC10. Verification</span></div><div class="cdp-page-body"><div class="cdp-question"><div class="cdp-question-header"><span>CC10.1 Verification status</span></div><div class="cdp-question-body"><span>None</span></div></div><div class="cdp-page"><div class="cdp-page-header"><span>Page: CC11. Energy</span></div><div class="cdp-page-body"><div class="cdp-question"><div class="cdp-question-header"><span>CC11.2 Purchased heat</span></div><div class="cdp-question-body"><span>412.0</span></div></div></div></div></div></div></div></div>"#;
        let doc = doc(html);
        let question = question_old(&doc, "ORSMENU_3", "CC11.2").unwrap();
        assert!(section_tokens(question).iter().any(|t| t == "412.0"));
    }

    #[test]
    fn rejects_question_codes_without_a_page_part() {
        let doc = doc(EMISSIONS_MODULE);
        assert!(matches!(
            question_old(&doc, "ORSMENU_3", "CC82"),
            Err(StructuralError::InvalidQuestionCode(_))
        ));
    }

    #[test]
    fn missing_page_is_reported_with_module_and_page() {
        let doc = doc(EMISSIONS_MODULE);
        assert!(matches!(
            question_old(&doc, "ORSMENU_3", "CC9.1"),
            Err(StructuralError::PageNotFound { .. })
        ));
    }

    #[test]
    fn require_section_names_the_missing_id() {
        let html = r#"<div id="formatted_responses_ndp__container"><div>a</div><div>b</div><div>c</div><div>Acme - Climate Change 2019</div></div>"#;
        let doc = doc(html);
        let err = require_section(&doc, "formatted_responses_question_2816").unwrap_err();
        assert!(err
            .to_string()
            .contains("formatted_responses_question_2816"));
    }
}
