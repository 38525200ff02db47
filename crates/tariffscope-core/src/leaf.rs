//! Schedule entries and analysis requests.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One leaf entry of the tariff schedule, as returned by a candidate source.
///
/// Supplied fresh for every analysis and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeafEntry {
    /// Canonical, dot-free code (e.g. "8211915000").
    pub code: String,
    /// Official legal text of the entry.
    pub legal_description: String,
    /// Base duty-rate text, e.g. "5.3%", "Free", "0.4¢/kg + 3%".
    pub base_duty_rate_text: String,
}

impl LeafEntry {
    pub fn new(
        code: impl Into<String>,
        legal_description: impl Into<String>,
        base_duty_rate_text: impl Into<String>,
    ) -> Self {
        Self {
            code: crate::canonical_code(&code.into()),
            legal_description: legal_description.into(),
            base_duty_rate_text: base_duty_rate_text.into(),
        }
    }
}

/// Caller-supplied input for one analysis call.
///
/// The engine is stateless between calls: answers the user gave earlier are
/// re-supplied here through `previous_answers` (variable id → option value).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub branch_prefix: String,
    pub free_text: String,
    pub explicit_material: Option<String>,
    pub explicit_numeric_value: Option<f64>,
    /// Basis the explicit number is expressed in (e.g. "per dozen", "cm").
    /// Without it the number is read as a monetary unit value.
    pub explicit_numeric_unit: Option<String>,
    /// ISO 3166 alpha-2 country of origin.
    pub country_of_origin: Option<String>,
    #[serde(default)]
    pub previous_answers: BTreeMap<String, String>,
}

impl AnalysisRequest {
    pub fn new(branch_prefix: impl Into<String>, free_text: impl Into<String>) -> Self {
        Self {
            branch_prefix: crate::canonical_code(&branch_prefix.into()),
            free_text: free_text.into(),
            ..Self::default()
        }
    }

    pub fn with_material(mut self, material: impl Into<String>) -> Self {
        self.explicit_material = Some(material.into());
        self
    }

    pub fn with_numeric_value(mut self, value: f64, unit: Option<&str>) -> Self {
        self.explicit_numeric_value = Some(value);
        self.explicit_numeric_unit = unit.map(str::to_string);
        self
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country_of_origin = Some(country.into());
        self
    }

    pub fn with_answer(mut self, variable_id: impl Into<String>, value: impl Into<String>) -> Self {
        self.previous_answers
            .insert(variable_id.into(), value.into());
        self
    }

    /// Free text and explicit material hint joined and lower-cased, the
    /// haystack every textual match runs against.
    pub fn combined_text(&self) -> String {
        let mut text = self.free_text.to_lowercase();
        if let Some(material) = &self.explicit_material {
            text.push(' ');
            text.push_str(&material.to_lowercase());
        }
        text
    }
}
