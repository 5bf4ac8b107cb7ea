use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Sentinel shown for every nutrient the page did not yield
pub const NOT_AVAILABLE: &str = "N/A";

/// Which page family governs anchor selection and the candidate URL shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentType {
    #[serde(rename = "potravina")]
    FoodItem,
    #[serde(rename = "recept")]
    Recipe,
}

impl ContentType {
    /// Wire name used by the front end and the search relay output
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::FoodItem => "potravina",
            ContentType::Recipe => "recept",
        }
    }

    /// Site path segment under which pages of this family live
    pub fn path_segment(&self) -> &'static str {
        match self {
            ContentType::FoodItem => "potraviny",
            ContentType::Recipe => "recepty",
        }
    }

    pub fn other(&self) -> ContentType {
        match self {
            ContentType::FoodItem => ContentType::Recipe,
            ContentType::Recipe => ContentType::FoodItem,
        }
    }

    /// Parses a caller-supplied type; anything unrecognized counts as "not asserted".
    pub fn from_wire(value: &str) -> Option<ContentType> {
        match value.trim() {
            "potravina" => Some(ContentType::FoodItem),
            "recept" => Some(ContentType::Recipe),
            _ => None,
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The fixed set of fields every nutrient record carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NutrientKey {
    TotalKcal,
    TotalKj,
    Protein,
    ProteinRdi,
    Carbs,
    CarbsRdi,
    Sugar,
    Fat,
    FatRdi,
    SaturatedFat,
    TransFat,
    MonounsaturatedFat,
    PolyunsaturatedFat,
    Cholesterol,
    Fiber,
    FiberRdi,
    Salt,
    Calcium,
    Sodium,
    Water,
    Phe,
}

impl NutrientKey {
    pub const ALL: [NutrientKey; 21] = [
        NutrientKey::TotalKcal,
        NutrientKey::TotalKj,
        NutrientKey::Protein,
        NutrientKey::ProteinRdi,
        NutrientKey::Carbs,
        NutrientKey::CarbsRdi,
        NutrientKey::Sugar,
        NutrientKey::Fat,
        NutrientKey::FatRdi,
        NutrientKey::SaturatedFat,
        NutrientKey::TransFat,
        NutrientKey::MonounsaturatedFat,
        NutrientKey::PolyunsaturatedFat,
        NutrientKey::Cholesterol,
        NutrientKey::Fiber,
        NutrientKey::FiberRdi,
        NutrientKey::Salt,
        NutrientKey::Calcium,
        NutrientKey::Sodium,
        NutrientKey::Water,
        NutrientKey::Phe,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NutrientKey::TotalKcal => "total_kcal",
            NutrientKey::TotalKj => "total_kj",
            NutrientKey::Protein => "protein",
            NutrientKey::ProteinRdi => "protein_rdi",
            NutrientKey::Carbs => "carbs",
            NutrientKey::CarbsRdi => "carbs_rdi",
            NutrientKey::Sugar => "sugar",
            NutrientKey::Fat => "fat",
            NutrientKey::FatRdi => "fat_rdi",
            NutrientKey::SaturatedFat => "saturated_fat",
            NutrientKey::TransFat => "trans_fat",
            NutrientKey::MonounsaturatedFat => "monounsaturated_fat",
            NutrientKey::PolyunsaturatedFat => "polyunsaturated_fat",
            NutrientKey::Cholesterol => "cholesterol",
            NutrientKey::Fiber => "fiber",
            NutrientKey::FiberRdi => "fiber_rdi",
            NutrientKey::Salt => "salt",
            NutrientKey::Calcium => "calcium",
            NutrientKey::Sodium => "sodium",
            NutrientKey::Water => "water",
            NutrientKey::Phe => "phe",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Display strings for every [`NutrientKey`]; a key can never be missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NutrientRecord {
    values: [String; 21],
}

impl Default for NutrientRecord {
    fn default() -> Self {
        Self {
            values: std::array::from_fn(|_| NOT_AVAILABLE.to_string()),
        }
    }
}

impl NutrientRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: NutrientKey) -> &str {
        &self.values[key.index()]
    }

    pub fn set(&mut self, key: NutrientKey, value: impl Into<String>) {
        self.values[key.index()] = value.into();
    }

    pub fn is_available(&self, key: NutrientKey) -> bool {
        self.get(key) != NOT_AVAILABLE
    }

    /// A page counts as resolved once it yielded a total energy in kcal.
    pub fn has_energy(&self) -> bool {
        self.is_available(NutrientKey::TotalKcal)
    }

    pub fn iter(&self) -> impl Iterator<Item = (NutrientKey, &str)> {
        NutrientKey::ALL
            .iter()
            .map(move |key| (*key, self.values[key.index()].as_str()))
    }
}

impl Serialize for NutrientRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(NutrientKey::ALL.len()))?;
        for (key, value) in self.iter() {
            map.serialize_entry(key.as_str(), value)?;
        }
        map.end()
    }
}

/// One address the detail resolver may try, paired with how to read it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateLocation {
    pub url: String,
    pub content_type: ContentType,
}

/// A resolved detail request: the record plus where it came from
#[derive(Debug, Clone, Serialize)]
pub struct NutrientDetails {
    #[serde(flatten)]
    pub record: NutrientRecord,
    pub source_url: String,
    pub food_type: ContentType,
}

/// One entry of the autocomplete endpoint response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AutocompleteItem {
    #[serde(default, deserialize_with = "lenient_text")]
    pub title: Option<String>,
    /// Energy per 100 g/ml; the site sends either a number or a string
    #[serde(default)]
    pub value: Option<serde_json::Value>,
    /// `null` and other non-boolean values count as "no image"
    #[serde(default, rename = "hasImage", deserialize_with = "lenient_flag")]
    pub has_image: bool,
    #[serde(default, deserialize_with = "lenient_text")]
    pub url: Option<String>,
}

fn lenient_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Bool(flag) => flag,
        serde_json::Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        serde_json::Value::String(text) => !text.is_empty(),
        _ => false,
    })
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(text) => Some(text),
        serde_json::Value::Number(number) => Some(number.to_string()),
        _ => None,
    })
}

/// One line of the search relay output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub name: String,
    pub calories: String,
    pub image_url: Option<String>,
    pub slug: Option<String>,
    pub food_type: Option<ContentType>,
}
