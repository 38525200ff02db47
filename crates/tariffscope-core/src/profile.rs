//! Validated output of the product-understanding step.
//!
//! The upstream model returns JSON. It is parsed into [`ProductProfile`] with
//! unknown fields denied and then validated; anything malformed is rejected
//! here instead of reaching the engine with silently defaulted fields.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::AnalysisRequest;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("malformed product profile: {0}")]
    Json(#[from] serde_json::Error),
    #[error("product description is empty")]
    EmptyDescription,
    #[error("unit value must be finite and non-negative, got {0}")]
    InvalidValue(f64),
    #[error("country of origin must be an ISO 3166 alpha-2 code, got {0:?}")]
    InvalidCountry(String),
}

/// Product facts produced upstream of the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductProfile {
    pub description: String,
    #[serde(default)]
    pub material: Option<String>,
    #[serde(default)]
    pub unit_value: Option<f64>,
    /// Basis of `unit_value`, e.g. "each" or "per dozen".
    #[serde(default)]
    pub value_unit: Option<String>,
    #[serde(default)]
    pub country_of_origin: Option<String>,
}

impl ProductProfile {
    /// Parse and validate a profile from JSON.
    pub fn from_json(json: &str) -> Result<Self, ProfileError> {
        let profile: Self = serde_json::from_str(json)?;
        profile.validate()?;
        Ok(profile)
    }

    pub fn validate(&self) -> Result<(), ProfileError> {
        if self.description.trim().is_empty() {
            return Err(ProfileError::EmptyDescription);
        }
        if let Some(v) = self.unit_value
            && (!v.is_finite() || v < 0.0)
        {
            return Err(ProfileError::InvalidValue(v));
        }
        if let Some(c) = &self.country_of_origin
            && !(c.len() == 2 && c.chars().all(|ch| ch.is_ascii_alphabetic()))
        {
            return Err(ProfileError::InvalidCountry(c.clone()));
        }
        Ok(())
    }

    /// Build the analysis request for one branch from this profile.
    pub fn into_request(self, branch_prefix: &str) -> AnalysisRequest {
        let mut request = AnalysisRequest::new(branch_prefix, self.description);
        request.explicit_material = self.material;
        request.explicit_numeric_value = self.unit_value;
        request.explicit_numeric_unit = self.value_unit;
        request.country_of_origin = self.country_of_origin.map(|c| c.to_ascii_uppercase());
        request
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_profile() {
        let json = r#"{
            "description": "Stainless steel steak knife with wooden handle",
            "material": "stainless steel",
            "unit_value": 4.5,
            "value_unit": "each",
            "country_of_origin": "cn"
        }"#;
        let profile = ProductProfile::from_json(json).unwrap();
        let req = profile.into_request("8211.91");
        assert_eq!(req.branch_prefix, "821191");
        assert_eq!(req.explicit_material.as_deref(), Some("stainless steel"));
        assert_eq!(req.explicit_numeric_value, Some(4.5));
        assert_eq!(req.country_of_origin.as_deref(), Some("CN"));
    }

    #[test]
    fn optional_fields_may_be_absent() {
        let profile = ProductProfile::from_json(r#"{"description": "cotton t-shirt"}"#).unwrap();
        assert!(profile.material.is_none());
        assert!(profile.unit_value.is_none());
    }

    #[test]
    fn rejects_unknown_fields() {
        let result = ProductProfile::from_json(r#"{"description": "knife", "hts": "8211"}"#);
        assert!(matches!(result, Err(ProfileError::Json(_))));
    }

    #[test]
    fn rejects_wrong_shape() {
        let result = ProductProfile::from_json(r#"{"description": ["knife"]}"#);
        assert!(matches!(result, Err(ProfileError::Json(_))));
    }

    #[test]
    fn rejects_empty_description() {
        let result = ProductProfile::from_json(r#"{"description": "   "}"#);
        assert!(matches!(result, Err(ProfileError::EmptyDescription)));
    }

    #[test]
    fn rejects_negative_value() {
        let result = ProductProfile::from_json(r#"{"description": "knife", "unit_value": -1.0}"#);
        assert!(matches!(result, Err(ProfileError::InvalidValue(_))));
    }

    #[test]
    fn rejects_country_name() {
        let result =
            ProductProfile::from_json(r#"{"description": "knife", "country_of_origin": "China"}"#);
        assert!(matches!(result, Err(ProfileError::InvalidCountry(_))));
    }
}
