use super::anchors::{enclosing, AnchorSpec, AttrPredicate};
use super::{stripped_text, Extractor, ParsingContext};
use crate::model::{ContentType, NutrientKey, NutrientRecord, NOT_AVAILABLE};
use crate::normalize::{format_energy, Unit};
use log::debug;
use scraper::ElementRef;

/// Where total energy lives on each page family.
///
/// Recipe pages render kcal and kJ as two unrelated Angular widgets, each
/// marked by a placeholder span; food pages carry kcal in a hidden input
/// (or a summary block) and kJ in one of the subtitle rows.
#[derive(Debug, Clone)]
pub struct EnergyAnchors {
    pub recipe_kcal: AnchorSpec,
    pub recipe_kj: AnchorSpec,
    pub food_kcal_carrier: AnchorSpec,
    /// Matches both the `text-sum` and the `text-sum-xs` layouts
    pub food_kcal_summary: AnchorSpec,
    pub food_kj_rows: AnchorSpec,
    /// A kJ row must contain one of these
    pub kj_markers: Vec<String>,
}

impl Default for EnergyAnchors {
    fn default() -> Self {
        Self {
            recipe_kcal: AnchorSpec::tag("span").attr_eq("ng-if", "data.energy==null"),
            recipe_kj: AnchorSpec::tag("span").attr_eq("ng-if", "data.energyAlt==null"),
            food_kcal_carrier: AnchorSpec::tag("input")
                .attr_eq("id", "calculatedEnergyValueInit")
                .attr("value", AttrPredicate::NonEmpty),
            food_kcal_summary: AnchorSpec::tag("div").class_containing("text-sum"),
            food_kj_rows: AnchorSpec::tag("div").class("text-subtitle"),
            kj_markers: vec!["kJ".to_string(), "Energetická hodnota".to_string()],
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EnergyExtractor {
    anchors: EnergyAnchors,
}

impl EnergyExtractor {
    pub fn new(anchors: EnergyAnchors) -> Self {
        Self { anchors }
    }

    /// Total energy as `(kcal, kJ)` display strings, each possibly `N/A`.
    pub fn energy(&self, root: ElementRef, content_type: ContentType) -> (String, String) {
        match content_type {
            ContentType::Recipe => (
                self.recipe_field(root, &self.anchors.recipe_kcal, Unit::Kilocalorie),
                self.recipe_field(root, &self.anchors.recipe_kj, Unit::Kilojoule),
            ),
            ContentType::FoodItem => (self.food_kcal(root), self.food_kj(root)),
        }
    }

    fn recipe_field(&self, root: ElementRef, marker: &AnchorSpec, unit: Unit) -> String {
        let Some(block) = marker
            .find_first(root)
            .and_then(|span| enclosing(span, "div"))
        else {
            debug!("No {} widget on recipe page", unit);
            return NOT_AVAILABLE.to_string();
        };
        format_energy(&stripped_text(block), unit)
    }

    fn food_kcal(&self, root: ElementRef) -> String {
        if let Some(value) = self
            .anchors
            .food_kcal_carrier
            .find_first(root)
            .and_then(|input| input.value().attr("value"))
        {
            return format!("{} kcal", value.trim());
        }

        match self.anchors.food_kcal_summary.find_first(root).map(stripped_text) {
            Some(text) if !text.is_empty() => text,
            _ => {
                debug!("No kcal carrier or summary block on food page");
                NOT_AVAILABLE.to_string()
            }
        }
    }

    fn food_kj(&self, root: ElementRef) -> String {
        let row = self.anchors.food_kj_rows.find_all(root).find(|row| {
            let text: String = row.text().collect();
            self.anchors
                .kj_markers
                .iter()
                .any(|marker| text.contains(marker.as_str()))
        });

        match row {
            Some(row) => format_energy(&stripped_text(row), Unit::Kilojoule),
            None => NOT_AVAILABLE.to_string(),
        }
    }
}

impl Extractor for EnergyExtractor {
    fn name(&self) -> &'static str {
        "energy"
    }

    fn extract(&self, context: &ParsingContext, record: &mut NutrientRecord) {
        let (kcal, kj) = self.energy(context.document.root_element(), context.content_type);
        debug!("{}: kcal={} kJ={} ({})", context.url, kcal, kj, context.content_type);
        record.set(NutrientKey::TotalKcal, kcal);
        record.set(NutrientKey::TotalKj, kj);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn energy_of(html: &str, content_type: ContentType) -> (String, String) {
        let document = Html::parse_document(html);
        EnergyExtractor::default().energy(document.root_element(), content_type)
    }

    #[test]
    fn test_food_hidden_carrier() {
        let html = r#"
            <input type="hidden" id="calculatedEnergyValueInit" value="18,0">
            <div class="text-subtitle"><div>Energetická hodnota</div><div>75 kJ</div></div>
        "#;
        let (kcal, kj) = energy_of(html, ContentType::FoodItem);
        assert_eq!(kcal, "18,0 kcal");
        assert_eq!(kj, "75 kJ");
    }

    #[test]
    fn test_food_summary_fallback_when_carrier_empty() {
        let html = r#"
            <input type="hidden" id="calculatedEnergyValueInit" value="">
            <div class="text-sum-xs"> 250 kcal </div>
        "#;
        let (kcal, kj) = energy_of(html, ContentType::FoodItem);
        assert_eq!(kcal, "250 kcal");
        assert_eq!(kj, "N/A");
    }

    #[test]
    fn test_food_summary_takes_first_block_in_page_order() {
        let html = r#"
            <div class="card text-sum-xs">120 kcal</div>
            <div class="text-sum">480 kcal</div>
        "#;
        let (kcal, _) = energy_of(html, ContentType::FoodItem);
        assert_eq!(kcal, "120 kcal");
    }

    #[test]
    fn test_food_kj_picks_first_marked_subtitle() {
        let html = r#"
            <div class="text-subtitle">Bílkoviny 3 g</div>
            <div class="text-subtitle">1 046,5 kJ</div>
            <div class="text-subtitle">Energetická hodnota 2 000 kJ</div>
        "#;
        let (kcal, kj) = energy_of(html, ContentType::FoodItem);
        assert_eq!(kcal, "N/A");
        assert_eq!(kj, "1046,5 kJ");
    }

    #[test]
    fn test_recipe_widgets_are_independent() {
        let html = r#"
            <div class="energy">
                <span ng-if="data.energy==null"></span>
                412,3 <span>kcal</span>
            </div>
            <section>
                <div>1 725 kJ<span ng-if="data.energyAlt==null"></span></div>
            </section>
        "#;
        let (kcal, kj) = energy_of(html, ContentType::Recipe);
        assert_eq!(kcal, "412,3 kcal");
        assert_eq!(kj, "1725 kJ");
    }

    #[test]
    fn test_recipe_anchors_ignored_on_food_page() {
        let html = r#"<div><span ng-if="data.energy==null"></span>300 kcal</div>"#;
        assert_eq!(energy_of(html, ContentType::FoodItem).0, "N/A");
        assert_eq!(energy_of(html, ContentType::Recipe).0, "300 kcal");
    }

    #[test]
    fn test_recipe_widget_without_number() {
        let html = r#"<div><span ng-if="data.energy==null"></span>-- kcal</div>"#;
        let (kcal, kj) = energy_of(html, ContentType::Recipe);
        assert_eq!(kcal, "N/A");
        assert_eq!(kj, "N/A");
    }
}
