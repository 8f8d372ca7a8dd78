//! Value-set wire model.
//!
//! ```yaml
//! disease_or_agent_targeted:
//!   "840539006": COVID-19
//! vaccine_medicinal_product:
//!   EU/1/20/1528: Comirnaty
//! ```
//!
//! Every category is optional. An empty file yields an empty lookup.

use crate::{parse_strict, WireResult};
use certview_types::{ValueSetCategory, ValueSetLookup};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Value-set file operations.
pub struct ValueSets;

impl ValueSets {
    /// Parse a value-set file from YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`crate::WireError::Translation`] for unknown categories or non-string entries.
    pub fn parse(yaml_text: &str) -> WireResult<ValueSetLookup> {
        if yaml_text.trim().is_empty() {
            return Ok(ValueSetLookup::new());
        }
        let wire: ValueSetsWire = parse_strict(yaml_text, "Value sets")?;
        Ok(wire_to_domain(wire))
    }

    pub fn read(path: &Path) -> WireResult<ValueSetLookup> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
struct ValueSetsWire {
    #[serde(default)]
    disease_or_agent_targeted: BTreeMap<String, String>,
    #[serde(default)]
    vaccine_or_prophylaxis: BTreeMap<String, String>,
    #[serde(default)]
    vaccine_medicinal_product: BTreeMap<String, String>,
    #[serde(default)]
    marketing_authorization_holder: BTreeMap<String, String>,
}

fn wire_to_domain(wire: ValueSetsWire) -> ValueSetLookup {
    let mut lookup = ValueSetLookup::new();
    let tables = [
        (
            ValueSetCategory::DiseaseOrAgentTargeted,
            wire.disease_or_agent_targeted,
        ),
        (
            ValueSetCategory::VaccineOrProphylaxis,
            wire.vaccine_or_prophylaxis,
        ),
        (
            ValueSetCategory::VaccineMedicinalProduct,
            wire.vaccine_medicinal_product,
        ),
        (
            ValueSetCategory::MarketingAuthorizationHolder,
            wire.marketing_authorization_holder,
        ),
    ];

    for (category, table) in tables {
        for (code, display_text) in table {
            lookup.insert(category, code, display_text);
        }
    }

    lookup
}
