use super::anchors::AnchorSpec;
use super::{stripped_text, stripped_text_without, Extractor, ParsingContext};
use crate::model::{NutrientKey, NutrientRecord, NOT_AVAILABLE};
use crate::normalize::parse_quantity;
use log::debug;
use scraper::{ElementRef, Html};

/// Label substring → record key (and RDI key for main nutrients).
///
/// Evaluated top to bottom, case-sensitive, first hit wins. Compound terms
/// sit above the generic label they could be mistaken for (`Cukry` above
/// `Sacharidy`, the fatty-acid rows above `Tuky`).
pub const NUTRIENT_LABELS: &[(&str, NutrientKey, Option<NutrientKey>)] = &[
    ("Bílkoviny", NutrientKey::Protein, Some(NutrientKey::ProteinRdi)),
    ("Cukry", NutrientKey::Sugar, None),
    ("Sacharidy", NutrientKey::Carbs, Some(NutrientKey::CarbsRdi)),
    ("Nasycené mastné kyseliny", NutrientKey::SaturatedFat, None),
    ("Trans mastné kyseliny", NutrientKey::TransFat, None),
    ("Mononenasycené", NutrientKey::MonounsaturatedFat, None),
    ("Polynenasycené", NutrientKey::PolyunsaturatedFat, None),
    ("Tuky", NutrientKey::Fat, Some(NutrientKey::FatRdi)),
    ("Cholesterol", NutrientKey::Cholesterol, None),
    ("Vláknina", NutrientKey::Fiber, Some(NutrientKey::FiberRdi)),
    ("Sůl", NutrientKey::Salt, None),
    ("Vápník", NutrientKey::Calcium, None),
    ("Sodík", NutrientKey::Sodium, None),
    ("Voda", NutrientKey::Water, None),
    ("PHE", NutrientKey::Phe, None),
];

/// Looks up the record keys for a row label.
pub fn classify_label(label: &str) -> Option<(NutrientKey, Option<NutrientKey>)> {
    NUTRIENT_LABELS
        .iter()
        .find(|(name, _, _)| label.contains(name))
        .map(|(_, key, rdi)| (*key, *rdi))
}

/// Markers of the nutrient table on both page families
#[derive(Debug, Clone)]
pub struct NutrientTableAnchors {
    pub block: AnchorSpec,
    pub subtitle_class: String,
    pub nutrient_class: String,
    pub desc_class: String,
    pub label: AnchorSpec,
    pub icon: AnchorSpec,
    /// Subtitle rows are main nutrients only when the label contains one of these
    pub main_nutrients: Vec<String>,
    pub rdi_phrase: String,
}

impl Default for NutrientTableAnchors {
    fn default() -> Self {
        Self {
            block: AnchorSpec::tag("div")
                .class("block-background")
                .attr_eq("flex", "50"),
            subtitle_class: "text-subtitle".to_string(),
            nutrient_class: "text-nutrient".to_string(),
            desc_class: "text-desc".to_string(),
            label: AnchorSpec::tag("div").class("flex-auto"),
            icon: AnchorSpec::tag("md-icon").class("material-icons"),
            main_nutrients: [
                "Bílkoviny",
                "Sacharidy",
                "Tuky",
                "Vláknina",
                "Sůl",
                "Vápník",
                "Sodík",
                "Voda",
                "PHE",
            ]
            .iter()
            .map(|name| name.to_string())
            .collect(),
            rdi_phrase: "Doporučený denní příjem".to_string(),
        }
    }
}

/// Raw texts collected for one labelled row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NutrientEntry {
    pub label: String,
    pub value: String,
    pub rdi: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowKind {
    Subtitle,
    Nutrient,
    Desc,
}

#[derive(Debug, Clone, Default)]
pub struct NutrientTableExtractor {
    anchors: NutrientTableAnchors,
}

impl NutrientTableExtractor {
    pub fn new(anchors: NutrientTableAnchors) -> Self {
        Self { anchors }
    }

    fn row_kind(&self, row: &ElementRef) -> Option<RowKind> {
        let classes: Vec<&str> = row.value().classes().collect();
        let has = |name: &str| classes.iter().any(|class| *class == name);
        let candidate = [
            &self.anchors.subtitle_class,
            &self.anchors.nutrient_class,
            &self.anchors.desc_class,
        ]
        .iter()
        .any(|kind| classes.iter().any(|class| class.contains(kind.as_str())));
        if !candidate {
            return None;
        }

        if has(self.anchors.subtitle_class.as_str()) {
            Some(RowKind::Subtitle)
        } else if has(self.anchors.nutrient_class.as_str()) {
            Some(RowKind::Nutrient)
        } else if has(self.anchors.desc_class.as_str()) {
            Some(RowKind::Desc)
        } else {
            None
        }
    }

    /// Walks the nutrient table and returns label → raw value/RDI texts in
    /// page order. `None` when the page has no nutrient table at all.
    pub fn collect_entries(&self, document: &Html) -> Option<Vec<NutrientEntry>> {
        let block = self.anchors.block.find_first(document.root_element())?;

        let mut entries: Vec<NutrientEntry> = Vec::new();
        let mut current_main: Option<String> = None;

        let rows = block
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|child| child.value().name() == "div");

        for row in rows {
            match self.row_kind(&row) {
                Some(RowKind::Subtitle) => {
                    let label = self
                        .anchors
                        .label
                        .find_first(row)
                        .map(|label| stripped_text_without(label, &self.anchors.icon))
                        .unwrap_or_else(|| stripped_text_without(row, &self.anchors.icon));

                    if !self
                        .anchors
                        .main_nutrients
                        .iter()
                        .any(|name| label.contains(name.as_str()))
                    {
                        debug!("Skipping subtitle row '{}'", label);
                        continue;
                    }

                    // the value sits in the last div of the row, wherever it is nested
                    let value = row
                        .descendants()
                        .skip(1)
                        .filter_map(ElementRef::wrap)
                        .filter(|el| el.value().name() == "div" && !self.anchors.icon.matches(el))
                        .last()
                        .map(|el| stripped_text_without(el, &self.anchors.icon))
                        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

                    upsert(&mut entries, label.clone(), value);
                    current_main = Some(label);
                }
                Some(RowKind::Nutrient) => {
                    let cells: Vec<ElementRef> = row
                        .children()
                        .filter_map(ElementRef::wrap)
                        .filter(|child| child.value().name() == "div")
                        .collect();
                    if cells.len() < 2 {
                        continue;
                    }
                    let label = stripped_text(cells[0]);
                    let value = stripped_text(cells[cells.len() - 1]);
                    if !label.is_empty() {
                        upsert(&mut entries, label, value);
                    }
                }
                Some(RowKind::Desc) => {
                    let text = stripped_text(row);
                    if !text.contains(self.anchors.rdi_phrase.as_str()) {
                        continue;
                    }
                    let Some(main) = current_main.as_deref() else {
                        debug!("RDI row without a main nutrient: '{}'", text);
                        continue;
                    };
                    let prefix = format!("{}:", self.anchors.rdi_phrase);
                    let rdi = text.replace(prefix.as_str(), "").trim().to_string();
                    if rdi.is_empty() {
                        continue;
                    }
                    if let Some(entry) = entries.iter_mut().find(|entry| entry.label == main) {
                        entry.rdi = Some(rdi);
                    }
                }
                None => {}
            }
        }

        Some(entries)
    }

    /// Normalizes collected entries onto the fixed record keys.
    pub fn apply(&self, entries: &[NutrientEntry], record: &mut NutrientRecord) {
        for entry in entries {
            let Some((key, rdi_key)) = classify_label(&entry.label) else {
                debug!("Unmapped nutrient row '{}'", entry.label);
                continue;
            };
            record.set(key, parse_quantity(&entry.value).display());
            if let Some(rdi_key) = rdi_key {
                let rdi = entry
                    .rdi
                    .as_deref()
                    .map(parse_quantity)
                    .map(|quantity| quantity.display())
                    .unwrap_or_else(|| NOT_AVAILABLE.to_string());
                record.set(rdi_key, rdi);
            }
        }
    }
}

/// Inserts a new entry or overwrites the value of an existing one in place.
fn upsert(entries: &mut Vec<NutrientEntry>, label: String, value: String) {
    match entries.iter_mut().find(|entry| entry.label == label) {
        Some(entry) => {
            entry.value = value;
            entry.rdi = None;
        }
        None => entries.push(NutrientEntry {
            label,
            value,
            rdi: None,
        }),
    }
}

impl Extractor for NutrientTableExtractor {
    fn name(&self) -> &'static str {
        "nutrient_table"
    }

    fn extract(&self, context: &ParsingContext, record: &mut NutrientRecord) {
        match self.collect_entries(&context.document) {
            Some(entries) => {
                debug!("{}: {} nutrient rows", context.url, entries.len());
                self.apply(&entries, record);
            }
            None => debug!("{}: no nutrient table", context.url),
        }
    }
}
