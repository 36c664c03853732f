//! HTML extraction for the curriculum pages
//!
//! Pure functions over page HTML. Nothing in here performs I/O: elective
//! triggers are returned as links for the caller to follow.
//!
//! Page shapes:
//! - form / option fragments: `<option value="..">label</option>`
//! - iteration listing: `tbody tr` rows, link in the first cell, label in the second
//! - iteration page: one `table` per semester, one slot per body row
//! - elective page: a single `table`, header row first, one option link per row

use crate::session::SelectOption;
use crate::url::resolve_link;
use crate::HarvestError;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// One row of the iteration listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    /// Composite label, e.g. "Fizik Mühendisliği Lisans Programı (%100 İngilizce) 2010-2011 ..."
    pub label: String,
    pub url: Url,
}

/// A semester slot as it appears on the iteration page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawSlot {
    Course(String),
    /// Link to a secondary page listing the group's options
    ElectiveTrigger { title: String, url: Url },
}

fn selector(css: &str) -> Selector {
    // Only called with the literal selectors below
    Selector::parse(css).expect("static selector must parse")
}

/// Element text with whitespace runs (including newlines) collapsed
fn clean_text(element: &ElementRef) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn shape_error(url: &Url, message: impl Into<String>) -> HarvestError {
    HarvestError::UnexpectedPageShape {
        url: url.to_string(),
        message: message.into(),
    }
}

/// Extracts `<option>` elements from a page or fragment
///
/// With `skip_placeholder` the first option is dropped; it is the
/// "please select" entry on dropdowns that have one.
pub fn parse_options(html: &str, skip_placeholder: bool) -> Vec<SelectOption> {
    let document = Html::parse_document(html);
    collect_options(document.select(&selector("option")), skip_placeholder)
}

/// Extracts the options of the `<select>` named `field_name` from the form page
pub fn parse_form_options(html: &str, field_name: &str, skip_placeholder: bool) -> Vec<SelectOption> {
    let document = Html::parse_document(html);
    let css = format!("select[name~=\"{}\"] option", field_name);
    let options = match Selector::parse(&css) {
        Ok(option_selector) => collect_options(document.select(&option_selector), skip_placeholder),
        Err(_) => Vec::new(),
    };
    options
}

fn collect_options<'a>(
    elements: impl Iterator<Item = ElementRef<'a>>,
    skip_placeholder: bool,
) -> Vec<SelectOption> {
    elements
        .skip(usize::from(skip_placeholder))
        .map(|element| {
            let label = clean_text(&element);
            let value = element
                .value()
                .attr("value")
                .map(|v| v.trim().to_string())
                .unwrap_or_else(|| label.clone());
            SelectOption::new(value, label)
        })
        .collect()
}

/// Returns true if any element matches the placeholder selector
pub fn has_placeholder(html: &str, placeholder_selector: &str) -> bool {
    let Ok(placeholder) = Selector::parse(placeholder_selector) else {
        return false;
    };
    Html::parse_document(html).select(&placeholder).next().is_some()
}

/// Parses the iteration listing reached by submitting the form
pub fn parse_iteration_listing(html: &str, page_url: &Url) -> Result<Vec<ListingEntry>, HarvestError> {
    let document = Html::parse_document(html);
    let cell_selector = selector("td");
    let link_selector = selector("a[href]");

    let mut entries = Vec::new();
    for row in document.select(&selector("tbody tr")) {
        let cells: Vec<ElementRef> = row.select(&cell_selector).collect();
        if cells.is_empty() {
            continue;
        }
        if cells.len() < 2 {
            return Err(shape_error(page_url, "listing row has fewer than two cells"));
        }

        let href = cells[0]
            .select(&link_selector)
            .next()
            .and_then(|a| a.value().attr("href"))
            .ok_or_else(|| shape_error(page_url, "listing row without an iteration link"))?;
        let url = resolve_link(href, page_url)
            .ok_or_else(|| shape_error(page_url, format!("unusable iteration link '{}'", href)))?;

        entries.push(ListingEntry {
            label: clean_text(&cells[1]),
            url,
        });
    }

    Ok(entries)
}

/// Parses every semester table on an iteration page
///
/// A row whose first-cell link text contains one of `elective_markers` is an
/// elective trigger; its title is the adjacent cell.
pub fn parse_semesters(
    html: &str,
    page_url: &Url,
    elective_markers: &[String],
) -> Result<Vec<Vec<RawSlot>>, HarvestError> {
    let document = Html::parse_document(html);
    let row_selector = selector("tbody tr");
    let cell_selector = selector("td");
    let link_selector = selector("a");

    let mut semesters = Vec::new();
    for table in document.select(&selector("table")) {
        let mut slots = Vec::new();

        for row in table.select(&row_selector) {
            let cells: Vec<ElementRef> = row.select(&cell_selector).collect();
            // Header rows carry only <th>
            let Some(first) = cells.first() else {
                continue;
            };

            let link = first
                .select(&link_selector)
                .next()
                .ok_or_else(|| shape_error(page_url, "semester row without a course link"))?;
            let text = clean_text(&link);

            if elective_markers.iter().any(|marker| text.contains(marker.as_str())) {
                let title = cells
                    .get(1)
                    .map(clean_text)
                    .ok_or_else(|| shape_error(page_url, "elective row without a title cell"))?;
                let href = link
                    .value()
                    .attr("href")
                    .ok_or_else(|| shape_error(page_url, "elective trigger without a link"))?;
                let url = resolve_link(href, page_url).ok_or_else(|| {
                    shape_error(page_url, format!("unusable elective link '{}'", href))
                })?;
                slots.push(RawSlot::ElectiveTrigger { title, url });
            } else {
                slots.push(RawSlot::Course(text));
            }
        }

        semesters.push(slots);
    }

    if semesters.is_empty() {
        return Err(shape_error(page_url, "no semester tables"));
    }

    Ok(semesters)
}

/// Parses the option codes of an elective page
///
/// Returns `None` when the page has no table, which is how the legacy
/// elective layout shows up.
pub fn parse_elective_options(html: &str) -> Option<Vec<String>> {
    let document = Html::parse_document(html);
    let table = document.select(&selector("table")).next()?;
    let link_selector = selector("a");

    let options = table
        .select(&selector("tr"))
        .skip(1)
        .filter_map(|row| row.select(&link_selector).next())
        .map(|link| clean_text(&link))
        .filter(|code| !code.is_empty())
        .collect();

    Some(options)
}
