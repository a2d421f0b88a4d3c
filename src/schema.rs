use serde::{Deserialize, Serialize};

/// Required fields for the combined-vaccine questionnaire, in form order.
const COMBINED_FIELDS: &[&str] = &[
    "age_group",
    "gender",
    "education",
    "district",
    "vaccines_received",
    "vaccination_place",
    "satisfaction",
    "would_recommend",
    "consent",
];

/// Required fields for the HPV questionnaire, in form order.
const HPV_FIELDS: &[&str] = &[
    "age_group",
    "gender",
    "education",
    "district",
    "heard_of_hpv",
    "knows_hpv_cancer_link",
    "hpv_dose_count",
    "willing_to_vaccinate",
    "consent",
];

/// Which questionnaire this deployment serves
///
/// Selected once at startup via the `SURVEY_VARIANT` environment variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurveyVariant {
    Combined,
    Hpv,
}

impl SurveyVariant {
    /// Parse a variant name as it appears in configuration
    ///
    /// # Arguments
    /// * `name` - Variant name, case-insensitive ("combined" or "hpv")
    ///
    /// # Returns
    /// * `Option<SurveyVariant>` - The variant, or None for an unknown name
    pub fn parse(name: &str) -> Option<SurveyVariant> {
        match name.to_ascii_lowercase().as_str() {
            "combined" => Some(SurveyVariant::Combined),
            "hpv" => Some(SurveyVariant::Hpv),
            _ => None,
        }
    }
}

/// Fixed, ordered list of required field names for one questionnaire
///
/// Pure data: validation reports missing fields in this order, and optional
/// fields (multi-select checkbox groups) are deliberately not listed here.
#[derive(Debug, Clone, Copy)]
pub struct FieldSchema {
    variant: SurveyVariant,
    required: &'static [&'static str],
}

impl FieldSchema {
    /// Get the schema for a questionnaire variant
    pub fn for_variant(variant: SurveyVariant) -> FieldSchema {
        let required = match variant {
            SurveyVariant::Combined => COMBINED_FIELDS,
            SurveyVariant::Hpv => HPV_FIELDS,
        };
        FieldSchema { variant, required }
    }

    pub fn variant(&self) -> SurveyVariant {
        self.variant
    }

    /// Required field names, in schema order
    pub fn required_fields(&self) -> &'static [&'static str] {
        self.required
    }
}
