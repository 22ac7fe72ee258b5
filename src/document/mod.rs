// src/document/mod.rs
pub mod adapter;
pub mod locate;

use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html};

use crate::utils::error::{AppError, StructuralError};

/// Trailing four-digit year in a questionnaire title segment.
static TITLE_YEAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{4})\s*$").expect("Invalid title year regex"));

/// Two generations of questionnaire markup. 2016-2017 responses use the
/// module/page/question layout (`cdp-*` classes); 2018-2020 responses use
/// flat `formatted_responses_*` section ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schema {
    Old,
    New,
}

impl Schema {
    pub fn for_version(version: i32) -> Result<Self, StructuralError> {
        match version {
            2016..=2017 => Ok(Schema::Old),
            2018..=2020 => Ok(Schema::New),
            other => Err(StructuralError::UnsupportedVersion(other)),
        }
    }
}

/// A parsed questionnaire response, with version and schema resolved once
/// at load time so every extractor can branch on them cheaply.
pub struct Document {
    pub html: Html,
    pub version: i32,
    pub schema: Schema,
}

impl Document {
    /// Reads and parses a response file. Accepts `file://` prefixed paths
    /// since response lists are often copied straight out of a browser.
    pub fn load(path: &str) -> Result<Self, AppError> {
        let path = path.strip_prefix("file://").unwrap_or(path);
        let raw = fs::read_to_string(Path::new(path))?;
        Ok(Self::parse(&raw)?)
    }

    pub fn parse(raw: &str) -> Result<Self, StructuralError> {
        let html = Html::parse_document(raw);
        let version = resolve_version(&html)?;
        let schema = Schema::for_version(version)?;
        Ok(Document {
            html,
            version,
            schema,
        })
    }

    /// First element in document order carrying the given id.
    pub fn element_by_id(&self, id: &str) -> Option<ElementRef<'_>> {
        element_by_id(&self.html, id)
    }
}

fn element_by_id<'a>(html: &'a Html, id: &str) -> Option<ElementRef<'a>> {
    html.root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().attr("id") == Some(id))
}

/// Determines the questionnaire version from the response title line.
/// New-schema documents end the title with the year ("... - Climate Change
/// 2019"); old-schema documents carry it in the first segment ("Investor
/// CDP 2016 - ...").
fn resolve_version(html: &Html) -> Result<i32, StructuralError> {
    let (title, last_segment) =
        if let Some(container) = element_by_id(html, "formatted_responses_ndp__container") {
            (title_text(container, 3), true)
        } else if let Some(container) = element_by_id(html, "formatted_response__container") {
            (title_text(container, 1), false)
        } else {
            return Err(StructuralError::UnrecognizedDocument);
        };
    let title = title.ok_or(StructuralError::UnrecognizedDocument)?;

    let segment = if last_segment {
        title.rsplit(" - ").next().unwrap_or_default()
    } else {
        title.split(" - ").next().unwrap_or_default()
    };

    let year: i32 = TITLE_YEAR_RE
        .captures(segment)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .ok_or(StructuralError::UnrecognizedDocument)?;

    if (2016..=2020).contains(&year) {
        Ok(year)
    } else {
        Err(StructuralError::UnsupportedVersion(year))
    }
}

/// Text of the first child node of the `index`-th child of `container`.
/// The title line sits at a fixed child position inside both containers.
fn title_text(container: ElementRef<'_>, index: usize) -> Option<String> {
    let child = container.children().nth(index)?;
    let first = child.children().next()?;
    let text = first.value().as_text()?;
    Some(text.to_string())
}
