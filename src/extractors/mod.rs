use crate::model::{ContentType, NutrientRecord};
use log::debug;
use scraper::{ElementRef, Html};

pub mod anchors;
mod energy;
mod nutrients;

pub use self::anchors::{AnchorSpec, AttrPredicate};
pub use self::energy::{EnergyAnchors, EnergyExtractor};
pub use self::nutrients::{
    NutrientEntry, NutrientTableAnchors, NutrientTableExtractor, NUTRIENT_LABELS,
};

pub struct ParsingContext {
    pub url: String,
    pub document: Html,
    pub content_type: ContentType,
}

impl ParsingContext {
    pub fn new(url: impl Into<String>, html: &str, content_type: ContentType) -> Self {
        Self {
            url: url.into(),
            document: Html::parse_document(html),
            content_type,
        }
    }
}

/// Fills the fields it knows about; anything it cannot find stays `N/A`.
pub trait Extractor {
    fn name(&self) -> &'static str;
    fn extract(&self, context: &ParsingContext, record: &mut NutrientRecord);
}

/// The energy and nutrient-table extractors, configured with their anchors.
#[derive(Debug, Clone, Default)]
pub struct RecordExtractor {
    energy: EnergyExtractor,
    table: NutrientTableExtractor,
}

impl RecordExtractor {
    pub fn new(energy: EnergyAnchors, table: NutrientTableAnchors) -> Self {
        Self {
            energy: EnergyExtractor::new(energy),
            table: NutrientTableExtractor::new(table),
        }
    }

    /// Runs every extractor over one fetched page.
    pub fn extract(&self, context: &ParsingContext) -> NutrientRecord {
        let extractors: [&dyn Extractor; 2] = [&self.energy, &self.table];

        let mut record = NutrientRecord::new();
        for extractor in extractors {
            debug!("Running {} extractor on {}", extractor.name(), context.url);
            extractor.extract(context, &mut record);
        }
        record
    }
}

/// Extracts a record with the default anchors.
pub fn extract_record(context: &ParsingContext) -> NutrientRecord {
    RecordExtractor::default().extract(context)
}

/// Text of `element` with every text node trimmed and empty ones dropped,
/// concatenated without a separator.
pub(crate) fn stripped_text(element: ElementRef) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Like [`stripped_text`] but skips the subtrees of elements matching `skip`.
pub(crate) fn stripped_text_without(element: ElementRef, skip: &AnchorSpec) -> String {
    let mut out = String::new();
    collect_text(element, skip, &mut out);
    out
}

fn collect_text(element: ElementRef, skip: &AnchorSpec, out: &mut String) {
    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            if !skip.matches(&child_element) {
                collect_text(child_element, skip, out);
            }
        } else if let Some(text) = child.value().as_text() {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                out.push_str(trimmed);
            }
        }
    }
}
