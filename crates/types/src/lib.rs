//! # Certview Types
//!
//! Domain model for health certificates as handed over by the certificate store.
//!
//! Everything here is plain data: certificates arrive already parsed and trusted, and the
//! derivation code in `certview-core` only ever reads these values.
//!
//! - [`HealthCertificate`] carries an identity, the opaque encoded payload and a typed [`Entry`].
//! - [`VaccinationState`] is the aggregate state of one person.
//! - [`ValueSetLookup`] maps value-set codes to display text.
//! - [`HealthCertifiedPerson`] groups a person's certificates in store order.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use uuid::Uuid;

/// Errors that can occur when constructing validated identifiers.
#[derive(Debug, thiserror::Error)]
pub enum TypesError {
    /// The input text was empty or contained only whitespace
    #[error("identifier cannot be empty")]
    EmptyIdentifier,
    /// The input is not a valid UUID
    #[error("invalid certificate id: {0}")]
    InvalidCertificateId(String),
}

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identity of a single health certificate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CertificateId(Uuid);

impl CertificateId {
    /// Generates a fresh random identity.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses a hyphenated or simple UUID string.
    pub fn parse(input: &str) -> Result<Self, TypesError> {
        Uuid::parse_str(input.trim())
            .map(Self)
            .map_err(|_| TypesError::InvalidCertificateId(input.to_owned()))
    }
}

impl std::fmt::Display for CertificateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Store-level key of a certified person.
///
/// The key is trimmed on construction and guaranteed to be non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PersonId(String);

impl PersonId {
    pub fn new(input: impl AsRef<str>) -> Result<Self, TypesError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TypesError::EmptyIdentifier);
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PersonId {
    type Error = TypesError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PersonId> for String {
    fn from(value: PersonId) -> Self {
        value.0
    }
}

impl std::fmt::Display for PersonId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Certificates
// ============================================================================

/// One parsed, trusted health certificate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCertificate {
    pub id: CertificateId,
    /// Raw encoded payload (for example the base45 `HC1:` string). Never reparsed here.
    pub payload: String,
    pub entry: Entry,
}

impl HealthCertificate {
    pub fn new(id: CertificateId, payload: impl Into<String>, entry: Entry) -> Self {
        Self {
            id,
            payload: payload.into(),
            entry,
        }
    }

    /// Identity comparison, ignoring payload and entry contents.
    pub fn is_same_certificate(&self, other: &HealthCertificate) -> bool {
        self.id == other.id
    }
}

/// The typed medical payload of a certificate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Entry {
    Vaccination(VaccinationEntry),
    Test(TestEntry),
    Recovery(RecoveryEntry),
}

/// A vaccination record.
///
/// `dose_number <= total_series_of_doses` is guaranteed upstream and not checked here.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaccinationEntry {
    pub dose_number: u32,
    pub total_series_of_doses: u32,
    /// ISO calendar date (`YYYY-MM-DD`); may be malformed.
    pub date_of_vaccination: String,
    pub disease_or_agent_targeted: String,
    pub vaccine_or_prophylaxis: String,
    pub vaccine_medicinal_product: String,
    pub marketing_authorization_holder: String,
    pub country_of_vaccination: String,
    pub certificate_issuer: String,
    pub unique_certificate_identifier: String,
}

impl VaccinationEntry {
    pub fn is_last_dose_in_series(&self) -> bool {
        self.dose_number == self.total_series_of_doses
    }

    /// Raw code of a coded field.
    pub fn code(&self, category: ValueSetCategory) -> &str {
        match category {
            ValueSetCategory::DiseaseOrAgentTargeted => &self.disease_or_agent_targeted,
            ValueSetCategory::VaccineOrProphylaxis => &self.vaccine_or_prophylaxis,
            ValueSetCategory::VaccineMedicinalProduct => &self.vaccine_medicinal_product,
            ValueSetCategory::MarketingAuthorizationHolder => &self.marketing_authorization_holder,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestType {
    Pcr,
    Antigen,
    /// The test type could not be determined from the certificate.
    Unknown,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestEntry {
    pub test_type: TestType,
    /// RFC 3339 timestamp of sample collection.
    pub sample_collection: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryEntry {
    /// ISO calendar date (`YYYY-MM-DD`).
    pub certificate_validity_end: Option<String>,
}

// ============================================================================
// Person
// ============================================================================

/// Aggregate vaccination state of one person.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VaccinationState {
    NotVaccinated,
    Incomplete,
    FullyVaccinated { days_until_complete_protection: u32 },
    CompletelyProtected,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonName {
    pub given: Option<String>,
    pub family: Option<String>,
}

impl PersonName {
    /// Given and family name joined by a space, skipping absent or blank parts.
    pub fn full_name(&self) -> String {
        [self.given.as_deref(), self.family.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A person together with their certificates.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCertifiedPerson {
    pub name: Option<PersonName>,
    /// ISO calendar date (`YYYY-MM-DD`).
    pub date_of_birth: Option<String>,
    /// Certificates in store order, oldest first.
    ///
    /// The store keeps this sequence in recency order; the last element is treated as the
    /// most relevant certificate and is never re-sorted by the derivation code.
    pub certificates: Vec<HealthCertificate>,
    pub vaccination_state: VaccinationState,
}

// ============================================================================
// Value sets
// ============================================================================

/// Value-set categories used by vaccination entries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueSetCategory {
    DiseaseOrAgentTargeted,
    VaccineOrProphylaxis,
    VaccineMedicinalProduct,
    MarketingAuthorizationHolder,
}

impl ValueSetCategory {
    pub const ALL: [ValueSetCategory; 4] = [
        ValueSetCategory::DiseaseOrAgentTargeted,
        ValueSetCategory::VaccineOrProphylaxis,
        ValueSetCategory::VaccineMedicinalProduct,
        ValueSetCategory::MarketingAuthorizationHolder,
    ];
}

/// Code-to-display-text tables, keyed by category.
///
/// A lookup may be partially populated; missing categories or codes are not an error.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueSetLookup {
    sets: HashMap<ValueSetCategory, HashMap<String, String>>,
}

impl ValueSetLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a single code's display text.
    pub fn insert(
        &mut self,
        category: ValueSetCategory,
        code: impl Into<String>,
        display_text: impl Into<String>,
    ) {
        self.sets
            .entry(category)
            .or_default()
            .insert(code.into(), display_text.into());
    }

    /// Builder-style variant of [`ValueSetLookup::insert`].
    pub fn with(
        mut self,
        category: ValueSetCategory,
        code: impl Into<String>,
        display_text: impl Into<String>,
    ) -> Self {
        self.insert(category, code, display_text);
        self
    }

    pub fn value_set(&self, category: ValueSetCategory) -> Option<&HashMap<String, String>> {
        self.sets.get(&category)
    }

    pub fn display_text(&self, category: ValueSetCategory, code: &str) -> Option<&str> {
        self.sets
            .get(&category)
            .and_then(|set| set.get(code))
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.sets.values().all(HashMap::is_empty)
    }
}
