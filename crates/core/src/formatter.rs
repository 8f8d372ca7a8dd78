//! Field formatter for vaccination entries.
//!
//! Every displayable field of a [`VaccinationEntry`] has an explicit [`VaccinationField`]
//! identifier with two total mappings:
//! - [`label`]: a fixed bilingual caption (German / English), independent of the display locale
//! - [`format`]: the human-readable value
//!
//! Formatting never fails. Coded fields degrade to the raw code when no value-set entry is
//! available; the only absent value is an unparsable vaccination date.

use crate::countries;
use crate::locale::{parse_calendar_date, DisplayContext};
use certview_types::{ValueSetCategory, ValueSetLookup, VaccinationEntry};
use serde::Serialize;

/// Displayable fields of a vaccination entry, in detail-screen order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum VaccinationField {
    DiseaseOrAgentTargeted,
    VaccineOrProphylaxis,
    VaccineMedicinalProduct,
    MarketingAuthorizationHolder,
    DoseNumber,
    TotalSeriesOfDoses,
    DoseNumberAndTotalSeriesOfDoses,
    DateOfVaccination,
    CountryOfVaccination,
    CertificateIssuer,
    UniqueCertificateIdentifier,
}

impl VaccinationField {
    pub const ALL: [VaccinationField; 11] = [
        VaccinationField::DiseaseOrAgentTargeted,
        VaccinationField::VaccineOrProphylaxis,
        VaccinationField::VaccineMedicinalProduct,
        VaccinationField::MarketingAuthorizationHolder,
        VaccinationField::DoseNumber,
        VaccinationField::TotalSeriesOfDoses,
        VaccinationField::DoseNumberAndTotalSeriesOfDoses,
        VaccinationField::DateOfVaccination,
        VaccinationField::CountryOfVaccination,
        VaccinationField::CertificateIssuer,
        VaccinationField::UniqueCertificateIdentifier,
    ];

    /// Fields shown on the certificate detail screen. The separate dose and total fields are
    /// replaced by the combined one there.
    pub const DETAILS: [VaccinationField; 9] = [
        VaccinationField::DiseaseOrAgentTargeted,
        VaccinationField::VaccineOrProphylaxis,
        VaccinationField::VaccineMedicinalProduct,
        VaccinationField::MarketingAuthorizationHolder,
        VaccinationField::DoseNumberAndTotalSeriesOfDoses,
        VaccinationField::DateOfVaccination,
        VaccinationField::CountryOfVaccination,
        VaccinationField::CertificateIssuer,
        VaccinationField::UniqueCertificateIdentifier,
    ];

    /// Stable snake_case identifier.
    pub fn key(&self) -> &'static str {
        match self {
            VaccinationField::DiseaseOrAgentTargeted => "disease_or_agent_targeted",
            VaccinationField::VaccineOrProphylaxis => "vaccine_or_prophylaxis",
            VaccinationField::VaccineMedicinalProduct => "vaccine_medicinal_product",
            VaccinationField::MarketingAuthorizationHolder => "marketing_authorization_holder",
            VaccinationField::DoseNumber => "dose_number",
            VaccinationField::TotalSeriesOfDoses => "total_series_of_doses",
            VaccinationField::DoseNumberAndTotalSeriesOfDoses => {
                "dose_number_and_total_series_of_doses"
            }
            VaccinationField::DateOfVaccination => "date_of_vaccination",
            VaccinationField::CountryOfVaccination => "country_of_vaccination",
            VaccinationField::CertificateIssuer => "certificate_issuer",
            VaccinationField::UniqueCertificateIdentifier => "unique_certificate_identifier",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.key() == key)
    }

    /// Value-set category for coded fields.
    pub fn value_set_category(&self) -> Option<ValueSetCategory> {
        match self {
            VaccinationField::DiseaseOrAgentTargeted => {
                Some(ValueSetCategory::DiseaseOrAgentTargeted)
            }
            VaccinationField::VaccineOrProphylaxis => Some(ValueSetCategory::VaccineOrProphylaxis),
            VaccinationField::VaccineMedicinalProduct => {
                Some(ValueSetCategory::VaccineMedicinalProduct)
            }
            VaccinationField::MarketingAuthorizationHolder => {
                Some(ValueSetCategory::MarketingAuthorizationHolder)
            }
            _ => None,
        }
    }
}

/// Bilingual caption of a field.
pub fn label(field: VaccinationField) -> &'static str {
    match field {
        VaccinationField::DiseaseOrAgentTargeted => {
            "Zielkrankheit oder -erreger / Disease or Agent Targeted"
        }
        VaccinationField::VaccineOrProphylaxis => "Art des Impfstoffs / Vaccine Type",
        VaccinationField::VaccineMedicinalProduct => "Impfstoff / Vaccine",
        VaccinationField::MarketingAuthorizationHolder => "Hersteller / Manufacturer",
        VaccinationField::DoseNumber => "Nummer der Impfung / Number in a series of vaccinations",
        VaccinationField::TotalSeriesOfDoses => {
            "Gesamtzahl an Impfdosen / Total number of vaccination doses"
        }
        VaccinationField::DoseNumberAndTotalSeriesOfDoses => {
            "Nummer der Impfung / Number in a series of vaccinations"
        }
        VaccinationField::DateOfVaccination => "Datum der Impfung / Date of Vaccination (YYYY-MM-DD)",
        VaccinationField::CountryOfVaccination => "Land der Impfung / Member State of Vaccination",
        VaccinationField::CertificateIssuer => "Zertifikataussteller / Certificate Issuer",
        VaccinationField::UniqueCertificateIdentifier => {
            "Zertifikatkennung / Unique Certificate Identifier"
        }
    }
}

/// Caption for a snake_case field key; `None` for unrecognized keys.
pub fn label_for_key(key: &str) -> Option<&'static str> {
    VaccinationField::from_key(key).map(label)
}

/// `"{dose} of {total}"`
pub fn dose_number_and_total(entry: &VaccinationEntry) -> String {
    format!("{} of {}", entry.dose_number, entry.total_series_of_doses)
}

/// Display text for a coded value, falling back to the raw code.
pub fn coded_value(
    category: ValueSetCategory,
    code: &str,
    value_sets: Option<&ValueSetLookup>,
) -> String {
    value_sets
        .and_then(|sets| sets.display_text(category, code))
        .unwrap_or(code)
        .to_owned()
}

/// Human-readable value of `field`.
///
/// Returns `None` only for [`VaccinationField::DateOfVaccination`] when the stored date is not
/// a valid `YYYY-MM-DD` calendar date.
pub fn format(
    field: VaccinationField,
    entry: &VaccinationEntry,
    value_sets: Option<&ValueSetLookup>,
    ctx: &DisplayContext,
) -> Option<String> {
    if let Some(category) = field.value_set_category() {
        return Some(coded_value(category, entry.code(category), value_sets));
    }

    match field {
        VaccinationField::DoseNumber => Some(entry.dose_number.to_string()),
        VaccinationField::TotalSeriesOfDoses => Some(entry.total_series_of_doses.to_string()),
        VaccinationField::DoseNumberAndTotalSeriesOfDoses => Some(dose_number_and_total(entry)),
        VaccinationField::DateOfVaccination => {
            parse_calendar_date(&entry.date_of_vaccination).map(|date| ctx.medium_date(date))
        }
        VaccinationField::CountryOfVaccination => Some(
            countries::localized_name(&entry.country_of_vaccination, ctx.locale)
                .map(str::to_owned)
                .unwrap_or_else(|| entry.country_of_vaccination.clone()),
        ),
        VaccinationField::CertificateIssuer => Some(entry.certificate_issuer.clone()),
        VaccinationField::UniqueCertificateIdentifier => {
            Some(entry.unique_certificate_identifier.clone())
        }
        VaccinationField::DiseaseOrAgentTargeted
        | VaccinationField::VaccineOrProphylaxis
        | VaccinationField::VaccineMedicinalProduct
        | VaccinationField::MarketingAuthorizationHolder => None,
    }
}

/// One labelled line of the certificate detail screen.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct FieldLine {
    pub field: VaccinationField,
    #[schema(value_type = String)]
    pub label: &'static str,
    pub value: String,
}

/// Every detail-screen field with a present value, in display order.
pub fn details(
    entry: &VaccinationEntry,
    value_sets: Option<&ValueSetLookup>,
    ctx: &DisplayContext,
) -> Vec<FieldLine> {
    if value_sets.is_none() {
        tracing::debug!("no value sets available, coded fields show raw codes");
    }

    VaccinationField::DETAILS
        .into_iter()
        .filter_map(|field| {
            format(field, entry, value_sets, ctx).map(|value| FieldLine {
                field,
                label: label(field),
                value,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::Locale;

    fn entry() -> VaccinationEntry {
        VaccinationEntry {
            dose_number: 1,
            total_series_of_doses: 2,
            date_of_vaccination: "2021-04-21".into(),
            disease_or_agent_targeted: "840539006".into(),
            vaccine_or_prophylaxis: "1119349007".into(),
            vaccine_medicinal_product: "EU/1/20/1528".into(),
            marketing_authorization_holder: "ORG-100030215".into(),
            country_of_vaccination: "DE".into(),
            certificate_issuer: "Robert Koch-Institut".into(),
            unique_certificate_identifier: "01DE/84503/1119349007/DXSGWLWL40SU8ZFKIYIBK39A3#S"
                .into(),
        }
    }

    fn value_sets() -> ValueSetLookup {
        ValueSetLookup::new()
            .with(ValueSetCategory::DiseaseOrAgentTargeted, "840539006", "COVID-19")
            .with(
                ValueSetCategory::VaccineOrProphylaxis,
                "1119349007",
                "SARS-CoV-2 mRNA vaccine",
            )
            .with(
                ValueSetCategory::VaccineMedicinalProduct,
                "EU/1/20/1528",
                "Comirnaty",
            )
            .with(
                ValueSetCategory::MarketingAuthorizationHolder,
                "ORG-100030215",
                "Biontech Manufacturing GmbH",
            )
    }

    #[test]
    fn coded_fields_use_value_set_display_text() {
        let ctx = DisplayContext::default();
        let sets = value_sets();
        let e = entry();

        assert_eq!(
            format(VaccinationField::DiseaseOrAgentTargeted, &e, Some(&sets), &ctx).as_deref(),
            Some("COVID-19")
        );
        assert_eq!(
            format(VaccinationField::VaccineMedicinalProduct, &e, Some(&sets), &ctx).as_deref(),
            Some("Comirnaty")
        );
        assert_eq!(
            format(VaccinationField::MarketingAuthorizationHolder, &e, Some(&sets), &ctx)
                .as_deref(),
            Some("Biontech Manufacturing GmbH")
        );
    }

    #[test]
    fn coded_fields_pass_raw_code_through_without_lookup() {
        let ctx = DisplayContext::default();
        let e = entry();

        for field in [
            VaccinationField::DiseaseOrAgentTargeted,
            VaccinationField::VaccineOrProphylaxis,
            VaccinationField::VaccineMedicinalProduct,
            VaccinationField::MarketingAuthorizationHolder,
        ] {
            let category = field.value_set_category().expect("coded field");
            let raw = e.code(category).to_owned();

            assert_eq!(format(field, &e, None, &ctx), Some(raw.clone()));
            assert_eq!(
                format(field, &e, Some(&ValueSetLookup::new()), &ctx),
                Some(raw.clone())
            );

            let other_codes = ValueSetLookup::new().with(category, "other", "Other");
            assert_eq!(format(field, &e, Some(&other_codes), &ctx), Some(raw));
        }
    }

    #[test]
    fn dose_fields_render_as_decimal_text() {
        let ctx = DisplayContext::default();
        let e = entry();
        assert_eq!(
            format(VaccinationField::DoseNumber, &e, None, &ctx).as_deref(),
            Some("1")
        );
        assert_eq!(
            format(VaccinationField::TotalSeriesOfDoses, &e, None, &ctx).as_deref(),
            Some("2")
        );
        assert_eq!(
            format(VaccinationField::DoseNumberAndTotalSeriesOfDoses, &e, None, &ctx).as_deref(),
            Some("1 of 2")
        );
    }

    #[test]
    fn vaccination_date_uses_medium_style() {
        let e = entry();
        let en = DisplayContext::default();
        assert_eq!(
            format(VaccinationField::DateOfVaccination, &e, None, &en).as_deref(),
            Some("Apr 21, 2021")
        );

        let de = DisplayContext::new(Locale::De, en.utc_offset);
        assert_eq!(
            format(VaccinationField::DateOfVaccination, &e, None, &de).as_deref(),
            Some("21.04.2021")
        );
    }

    #[test]
    fn invalid_vaccination_date_is_absent() {
        let mut e = entry();
        e.date_of_vaccination = "2021-13-40".into();
        let ctx = DisplayContext::default();
        assert_eq!(
            format(VaccinationField::DateOfVaccination, &e, None, &ctx),
            None
        );

        let lines = details(&e, None, &ctx);
        assert!(lines
            .iter()
            .all(|line| line.field != VaccinationField::DateOfVaccination));
        assert_eq!(lines.len(), VaccinationField::DETAILS.len() - 1);
    }

    #[test]
    fn country_code_resolves_or_passes_through() {
        let ctx = DisplayContext::default();
        let mut e = entry();
        assert_eq!(
            format(VaccinationField::CountryOfVaccination, &e, None, &ctx).as_deref(),
            Some("Germany")
        );

        e.country_of_vaccination = "XK".into();
        assert_eq!(
            format(VaccinationField::CountryOfVaccination, &e, None, &ctx).as_deref(),
            Some("XK")
        );
    }

    #[test]
    fn issuer_and_identifier_are_verbatim() {
        let ctx = DisplayContext::default();
        let e = entry();
        assert_eq!(
            format(VaccinationField::CertificateIssuer, &e, None, &ctx),
            Some(e.certificate_issuer.clone())
        );
        assert_eq!(
            format(VaccinationField::UniqueCertificateIdentifier, &e, None, &ctx),
            Some(e.unique_certificate_identifier.clone())
        );
    }

    #[test]
    fn every_field_has_a_label_and_round_trips_its_key() {
        for field in VaccinationField::ALL {
            assert!(!label(field).is_empty());
            assert_eq!(VaccinationField::from_key(field.key()), Some(field));
            assert_eq!(label_for_key(field.key()), Some(label(field)));
        }
        assert_eq!(label_for_key("name"), None);
        assert_eq!(
            label(VaccinationField::VaccineMedicinalProduct),
            "Impfstoff / Vaccine"
        );
    }

    #[test]
    fn details_follow_display_order() {
        let ctx = DisplayContext::default();
        let lines = details(&entry(), Some(&value_sets()), &ctx);
        let fields: Vec<_> = lines.iter().map(|line| line.field).collect();
        assert_eq!(fields, VaccinationField::DETAILS.to_vec());
        assert_eq!(lines[2].value, "Comirnaty");
        assert_eq!(lines[4].value, "1 of 2");
    }
}
