//! Person snapshot wire models and translation helpers.
//!
//! A snapshot file describes one certified person as the certificate store last saw them:
//!
//! ```yaml
//! person_id: erika
//! name:
//!   given: Erika
//!   family: Mustermann
//! date_of_birth: "1964-08-12"
//! vaccination_state:
//!   status: fully_vaccinated
//!   days_until_complete_protection: 5
//! certificates:
//!   - id: "7f4c2e9d-4b0a-4f3a-9a2c-0e9a6b5d1c88"
//!     payload: "HC1:..."
//!     vaccination:
//!       dose_number: 1
//!       total_series_of_doses: 2
//!       date_of_vaccination: "2021-04-21"
//!       disease_or_agent_targeted: "840539006"
//!       vaccine_or_prophylaxis: "1119349007"
//!       vaccine_medicinal_product: "EU/1/20/1528"
//!       marketing_authorization_holder: "ORG-100030215"
//!       country_of_vaccination: DE
//!       certificate_issuer: Robert Koch-Institut
//!       unique_certificate_identifier: "01DE/84503/1119349007/DXSGWLWL40SU8ZFKIYIBK39A3#S"
//! ```
//!
//! Notes:
//! - Each certificate carries exactly one of `vaccination`, `test` or `recovery`.
//! - Certificate order in the file is store order (oldest first) and is preserved.

use crate::{parse_strict, WireError, WireResult};
use certview_types::{
    CertificateId, Entry, HealthCertificate, HealthCertifiedPerson, PersonId, PersonName,
    RecoveryEntry, TestEntry, TestType, VaccinationEntry, VaccinationState,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

// ============================================================================
// Public domain-level types
// ============================================================================

/// Domain-level carrier for one snapshot file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PersonSnapshotData {
    pub person_id: PersonId,
    pub person: HealthCertifiedPerson,
}

// ============================================================================
// Public PersonSnapshot operations
// ============================================================================

/// Person snapshot operations.
///
/// Zero-sized type used for namespacing snapshot-related operations.
pub struct PersonSnapshot;

impl PersonSnapshot {
    /// Parse a person snapshot from YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`WireError`] if:
    /// - the YAML does not match the snapshot schema (the message names the failing path),
    /// - any unknown keys are present,
    /// - a certificate id is not a valid UUID or repeats an earlier one,
    /// - a certificate has zero or more than one entry kind,
    /// - the person id is blank.
    pub fn parse(yaml_text: &str) -> WireResult<PersonSnapshotData> {
        let wire: PersonSnapshotWire = parse_strict(yaml_text, "Person snapshot")?;
        wire_to_domain(wire)
    }

    /// Read and parse a snapshot file.
    pub fn read(path: &Path) -> WireResult<PersonSnapshotData> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Render a snapshot as YAML text.
    pub fn render(data: &PersonSnapshotData) -> WireResult<String> {
        let wire = domain_to_wire(data);
        Ok(serde_yaml::to_string(&wire)?)
    }

    /// Render and write a snapshot file, replacing any existing content.
    pub fn write(path: &Path, data: &PersonSnapshotData) -> WireResult<()> {
        let text = Self::render(data)?;
        std::fs::write(path, text)?;
        Ok(())
    }
}

// ============================================================================
// Wire types (internal)
// ============================================================================

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
struct PersonSnapshotWire {
    person_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<NameWire>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    date_of_birth: Option<String>,
    vaccination_state: VaccinationStateWire,
    #[serde(default)]
    certificates: Vec<CertificateWire>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
struct NameWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    given: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    family: Option<String>,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
enum VaccinationStatusWire {
    NotVaccinated,
    Incomplete,
    FullyVaccinated,
    CompletelyProtected,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
struct VaccinationStateWire {
    status: VaccinationStatusWire,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    days_until_complete_protection: Option<u32>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
struct CertificateWire {
    id: String,
    payload: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    vaccination: Option<VaccinationWire>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    test: Option<TestWire>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    recovery: Option<RecoveryWire>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
struct VaccinationWire {
    dose_number: u32,
    total_series_of_doses: u32,
    date_of_vaccination: String,
    disease_or_agent_targeted: String,
    vaccine_or_prophylaxis: String,
    vaccine_medicinal_product: String,
    marketing_authorization_holder: String,
    country_of_vaccination: String,
    certificate_issuer: String,
    unique_certificate_identifier: String,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
struct TestWire {
    #[serde(default = "unknown_test_type")]
    test_type: TestType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sample_collection: Option<String>,
}

fn unknown_test_type() -> TestType {
    TestType::Unknown
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
struct RecoveryWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    certificate_validity_end: Option<String>,
}

// ============================================================================
// Helper functions (internal)
// ============================================================================

fn wire_to_domain(wire: PersonSnapshotWire) -> WireResult<PersonSnapshotData> {
    let person_id = PersonId::new(&wire.person_id)
        .map_err(|_| WireError::InvalidInput("person_id cannot be empty".into()))?;

    let vaccination_state = state_to_domain(&wire.vaccination_state)?;

    let certificates = wire
        .certificates
        .into_iter()
        .enumerate()
        .map(|(index, certificate)| certificate_to_domain(index, certificate))
        .collect::<WireResult<Vec<_>>>()?;

    let mut seen = HashSet::new();
    for (index, certificate) in certificates.iter().enumerate() {
        if !seen.insert(certificate.id) {
            return Err(WireError::Translation(format!(
                "certificates[{index}].id duplicates an earlier certificate: {}",
                certificate.id
            )));
        }
    }

    Ok(PersonSnapshotData {
        person_id,
        person: HealthCertifiedPerson {
            name: wire.name.map(|name| PersonName {
                given: name.given,
                family: name.family,
            }),
            date_of_birth: wire.date_of_birth,
            certificates,
            vaccination_state,
        },
    })
}

fn state_to_domain(wire: &VaccinationStateWire) -> WireResult<VaccinationState> {
    let days = wire.days_until_complete_protection;
    match (wire.status, days) {
        (VaccinationStatusWire::FullyVaccinated, Some(days)) => {
            Ok(VaccinationState::FullyVaccinated {
                days_until_complete_protection: days,
            })
        }
        (VaccinationStatusWire::FullyVaccinated, None) => Err(WireError::Translation(
            "vaccination_state.days_until_complete_protection is required for fully_vaccinated"
                .into(),
        )),
        (_, Some(_)) => Err(WireError::Translation(
            "vaccination_state.days_until_complete_protection is only allowed for fully_vaccinated"
                .into(),
        )),
        (VaccinationStatusWire::NotVaccinated, None) => Ok(VaccinationState::NotVaccinated),
        (VaccinationStatusWire::Incomplete, None) => Ok(VaccinationState::Incomplete),
        (VaccinationStatusWire::CompletelyProtected, None) => {
            Ok(VaccinationState::CompletelyProtected)
        }
    }
}

fn certificate_to_domain(index: usize, wire: CertificateWire) -> WireResult<HealthCertificate> {
    let id = CertificateId::parse(&wire.id)
        .map_err(|e| WireError::InvalidUuid(format!("certificates[{index}].id: {e}")))?;

    let entry = match (wire.vaccination, wire.test, wire.recovery) {
        (Some(v), None, None) => Entry::Vaccination(VaccinationEntry {
            dose_number: v.dose_number,
            total_series_of_doses: v.total_series_of_doses,
            date_of_vaccination: v.date_of_vaccination,
            disease_or_agent_targeted: v.disease_or_agent_targeted,
            vaccine_or_prophylaxis: v.vaccine_or_prophylaxis,
            vaccine_medicinal_product: v.vaccine_medicinal_product,
            marketing_authorization_holder: v.marketing_authorization_holder,
            country_of_vaccination: v.country_of_vaccination,
            certificate_issuer: v.certificate_issuer,
            unique_certificate_identifier: v.unique_certificate_identifier,
        }),
        (None, Some(t), None) => Entry::Test(TestEntry {
            test_type: t.test_type,
            sample_collection: t.sample_collection,
        }),
        (None, None, Some(r)) => Entry::Recovery(RecoveryEntry {
            certificate_validity_end: r.certificate_validity_end,
        }),
        _ => {
            return Err(WireError::Translation(format!(
                "certificates[{index}] must contain exactly one of vaccination, test or recovery"
            )))
        }
    };

    Ok(HealthCertificate {
        id,
        payload: wire.payload,
        entry,
    })
}

fn domain_to_wire(data: &PersonSnapshotData) -> PersonSnapshotWire {
    let person = &data.person;

    let vaccination_state = match person.vaccination_state {
        VaccinationState::NotVaccinated => VaccinationStateWire {
            status: VaccinationStatusWire::NotVaccinated,
            days_until_complete_protection: None,
        },
        VaccinationState::Incomplete => VaccinationStateWire {
            status: VaccinationStatusWire::Incomplete,
            days_until_complete_protection: None,
        },
        VaccinationState::FullyVaccinated {
            days_until_complete_protection,
        } => VaccinationStateWire {
            status: VaccinationStatusWire::FullyVaccinated,
            days_until_complete_protection: Some(days_until_complete_protection),
        },
        VaccinationState::CompletelyProtected => VaccinationStateWire {
            status: VaccinationStatusWire::CompletelyProtected,
            days_until_complete_protection: None,
        },
    };

    PersonSnapshotWire {
        person_id: data.person_id.to_string(),
        name: person.name.as_ref().map(|name| NameWire {
            given: name.given.clone(),
            family: name.family.clone(),
        }),
        date_of_birth: person.date_of_birth.clone(),
        vaccination_state,
        certificates: person.certificates.iter().map(certificate_to_wire).collect(),
    }
}

fn certificate_to_wire(certificate: &HealthCertificate) -> CertificateWire {
    let mut wire = CertificateWire {
        id: certificate.id.to_string(),
        payload: certificate.payload.clone(),
        vaccination: None,
        test: None,
        recovery: None,
    };

    match &certificate.entry {
        Entry::Vaccination(v) => {
            wire.vaccination = Some(VaccinationWire {
                dose_number: v.dose_number,
                total_series_of_doses: v.total_series_of_doses,
                date_of_vaccination: v.date_of_vaccination.clone(),
                disease_or_agent_targeted: v.disease_or_agent_targeted.clone(),
                vaccine_or_prophylaxis: v.vaccine_or_prophylaxis.clone(),
                vaccine_medicinal_product: v.vaccine_medicinal_product.clone(),
                marketing_authorization_holder: v.marketing_authorization_holder.clone(),
                country_of_vaccination: v.country_of_vaccination.clone(),
                certificate_issuer: v.certificate_issuer.clone(),
                unique_certificate_identifier: v.unique_certificate_identifier.clone(),
            })
        }
        Entry::Test(t) => {
            wire.test = Some(TestWire {
                test_type: t.test_type,
                sample_collection: t.sample_collection.clone(),
            })
        }
        Entry::Recovery(r) => {
            wire.recovery = Some(RecoveryWire {
                certificate_validity_end: r.certificate_validity_end.clone(),
            })
        }
    }

    wire
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"person_id: erika
name:
  given: Erika
  family: Mustermann
date_of_birth: "1964-08-12"
vaccination_state:
  status: fully_vaccinated
  days_until_complete_protection: 5
certificates:
  - id: "7f4c2e9d-4b0a-4f3a-9a2c-0e9a6b5d1c88"
    payload: "HC1:first"
    vaccination:
      dose_number: 1
      total_series_of_doses: 2
      date_of_vaccination: "2021-04-21"
      disease_or_agent_targeted: "840539006"
      vaccine_or_prophylaxis: "1119349007"
      vaccine_medicinal_product: "EU/1/20/1528"
      marketing_authorization_holder: "ORG-100030215"
      country_of_vaccination: DE
      certificate_issuer: Robert Koch-Institut
      unique_certificate_identifier: "01DE/84503/1119349007/DXSGWLWL40SU8ZFKIYIBK39A3#S"
  - id: "a4f91c6d-3b2e-4c5f-9d7a-1e8b6c0a9f12"
    payload: "HC1:second"
    test:
      test_type: pcr
      sample_collection: "2021-05-29T22:34:17Z"
  - id: "0b1e9d52-5c0e-4a3b-8f3f-2f8a1c9d7e64"
    payload: "HC1:third"
    recovery:
      certificate_validity_end: "2021-11-30"
"#;

    #[test]
    fn parses_sample_snapshot_in_file_order() {
        let data = PersonSnapshot::parse(SAMPLE).expect("parse snapshot");
        assert_eq!(data.person_id.as_str(), "erika");
        assert_eq!(
            data.person.vaccination_state,
            VaccinationState::FullyVaccinated {
                days_until_complete_protection: 5
            }
        );

        let payloads: Vec<_> = data
            .person
            .certificates
            .iter()
            .map(|c| c.payload.as_str())
            .collect();
        assert_eq!(payloads, ["HC1:first", "HC1:second", "HC1:third"]);

        match &data.person.certificates[1].entry {
            Entry::Test(t) => assert_eq!(t.test_type, TestType::Pcr),
            other => panic!("expected test entry, got {other:?}"),
        }
    }

    #[test]
    fn round_trips_sample_yaml() {
        let data = PersonSnapshot::parse(SAMPLE).expect("parse yaml");
        let output = PersonSnapshot::render(&data).expect("render snapshot");
        let reparsed = PersonSnapshot::parse(&output).expect("reparse yaml");
        assert_eq!(data, reparsed);
    }

    #[test]
    fn strict_validation_rejects_unknown_keys() {
        let input = SAMPLE.replace("date_of_birth:", "unexpected_key: 1\ndate_of_birth:");
        let err = PersonSnapshot::parse(&input).expect_err("should reject unknown key");
        match err {
            WireError::Translation(msg) => assert!(msg.contains("unexpected_key")),
            other => panic!("expected Translation error, got {other:?}"),
        }
    }

    #[test]
    fn strict_validation_names_failing_path() {
        let input = SAMPLE.replace("dose_number: 1", "dose_number: first");
        let err = PersonSnapshot::parse(&input).expect_err("should reject wrong type");
        match err {
            WireError::Translation(msg) => assert!(msg.contains("dose_number")),
            other => panic!("expected Translation error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_invalid_certificate_id() {
        let input = SAMPLE.replace("7f4c2e9d-4b0a-4f3a-9a2c-0e9a6b5d1c88", "not-a-valid-uuid");
        let err = PersonSnapshot::parse(&input).expect_err("should reject invalid id");
        match err {
            WireError::InvalidUuid(msg) => assert!(msg.contains("certificates[0]")),
            other => panic!("expected InvalidUuid error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_duplicate_certificate_ids() {
        let input = r#"person_id: erika
vaccination_state:
  status: incomplete
certificates:
  - id: "7f4c2e9d-4b0a-4f3a-9a2c-0e9a6b5d1c88"
    payload: "HC1:first"
    test:
      test_type: pcr
  - id: "7f4c2e9d-4b0a-4f3a-9a2c-0e9a6b5d1c88"
    payload: "HC1:second"
    test:
      test_type: antigen
"#;
        let err = PersonSnapshot::parse(input).expect_err("should reject duplicate ids");
        assert!(matches!(err, WireError::Translation(msg) if msg.contains("certificates[1].id")));
    }

    #[test]
    fn rejects_certificate_without_entry() {
        let input = r#"person_id: erika
vaccination_state:
  status: incomplete
certificates:
  - id: "7f4c2e9d-4b0a-4f3a-9a2c-0e9a6b5d1c88"
    payload: "HC1:first"
"#;
        let err = PersonSnapshot::parse(input).expect_err("should reject missing entry");
        assert!(matches!(err, WireError::Translation(msg) if msg.contains("exactly one")));
    }

    #[test]
    fn rejects_days_outside_fully_vaccinated() {
        let input = r#"person_id: erika
vaccination_state:
  status: completely_protected
  days_until_complete_protection: 3
"#;
        assert!(PersonSnapshot::parse(input).is_err());

        let input = r#"person_id: erika
vaccination_state:
  status: fully_vaccinated
"#;
        assert!(PersonSnapshot::parse(input).is_err());
    }

    #[test]
    fn missing_test_type_defaults_to_unknown() {
        let input = r#"person_id: erika
vaccination_state:
  status: not_vaccinated
certificates:
  - id: "7f4c2e9d-4b0a-4f3a-9a2c-0e9a6b5d1c88"
    payload: "HC1:first"
    test: {}
"#;
        let data = PersonSnapshot::parse(input).expect("parse");
        match &data.person.certificates[0].entry {
            Entry::Test(t) => {
                assert_eq!(t.test_type, TestType::Unknown);
                assert!(t.sample_collection.is_none());
            }
            other => panic!("expected test entry, got {other:?}"),
        }
    }

    #[test]
    fn write_then_read_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("erika.yaml");
        let data = PersonSnapshot::parse(SAMPLE).expect("parse");

        PersonSnapshot::write(&path, &data).expect("write");
        let read_back = PersonSnapshot::read(&path).expect("read");
        assert_eq!(data, read_back);
    }
}
