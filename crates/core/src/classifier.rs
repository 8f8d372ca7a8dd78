//! Entry classifier.
//!
//! Maps a certificate entry to its headline, subheadline, detail line and icon key. The
//! classification is total over [`Entry`]; adding a certificate kind is a compile error here
//! until it is handled.

use crate::locale::{fill, parse_calendar_date, parse_timestamp, DisplayContext};
use certview_types::{Entry, TestType, VaccinationEntry, VaccinationState};
use serde::Serialize;

/// Icon shown next to a certificate. Resolving the key to an asset is up to the view layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum IconKey {
    CompletelyProtected,
    FullyVaccinated,
    PartiallyVaccinated,
    Test,
    Recovery,
}

impl IconKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            IconKey::CompletelyProtected => "completely-protected",
            IconKey::FullyVaccinated => "fully-vaccinated",
            IconKey::PartiallyVaccinated => "partially-vaccinated",
            IconKey::Test => "test",
            IconKey::Recovery => "recovery",
        }
    }
}

impl std::fmt::Display for IconKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display strings and icon of a single entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EntryPresentation {
    pub headline: String,
    pub subheadline: Option<String>,
    pub detail: Option<String>,
    pub icon: IconKey,
}

pub fn classify(
    entry: &Entry,
    vaccination_state: &VaccinationState,
    ctx: &DisplayContext,
) -> EntryPresentation {
    let captions = ctx.captions();

    match entry {
        Entry::Vaccination(vaccination) => EntryPresentation {
            headline: captions.vaccination_headline.to_owned(),
            subheadline: Some(vaccination_count(vaccination, ctx)),
            detail: vaccination_date_line(vaccination, ctx),
            icon: icon(entry, vaccination_state),
        },
        Entry::Test(test) => EntryPresentation {
            headline: captions.test_headline.to_owned(),
            subheadline: match test.test_type {
                TestType::Pcr => Some(captions.pcr_test.to_owned()),
                TestType::Antigen => Some(captions.antigen_test.to_owned()),
                TestType::Unknown => None,
            },
            detail: sample_collection_line(test.sample_collection.as_deref(), ctx),
            icon: IconKey::Test,
        },
        Entry::Recovery(recovery) => EntryPresentation {
            headline: captions.recovery_headline.to_owned(),
            subheadline: None,
            detail: validity_line(recovery.certificate_validity_end.as_deref(), ctx),
            icon: IconKey::Recovery,
        },
    }
}

/// Icon for an entry given the person's aggregate state.
///
/// The last dose of a series shows as completely protected only once the person has reached
/// that state; earlier doses always show as partial.
pub fn icon(entry: &Entry, vaccination_state: &VaccinationState) -> IconKey {
    match entry {
        Entry::Vaccination(vaccination) if vaccination.is_last_dose_in_series() => {
            if matches!(vaccination_state, VaccinationState::CompletelyProtected) {
                IconKey::CompletelyProtected
            } else {
                IconKey::FullyVaccinated
            }
        }
        Entry::Vaccination(_) => IconKey::PartiallyVaccinated,
        Entry::Test(_) => IconKey::Test,
        Entry::Recovery(_) => IconKey::Recovery,
    }
}

/// Title and subtitle of the QR-code cell.
///
/// Same headlines as [`classify`]; the test subtitle carries the collection time as well.
pub fn qr_code_titles(entry: &Entry, ctx: &DisplayContext) -> (String, Option<String>) {
    let captions = ctx.captions();
    match entry {
        Entry::Vaccination(vaccination) => (
            captions.vaccination_headline.to_owned(),
            vaccination_date_line(vaccination, ctx),
        ),
        Entry::Test(test) => (
            captions.test_headline.to_owned(),
            sample_collection_line(test.sample_collection.as_deref(), ctx),
        ),
        Entry::Recovery(recovery) => (
            captions.recovery_headline.to_owned(),
            validity_line(recovery.certificate_validity_end.as_deref(), ctx),
        ),
    }
}

fn vaccination_count(vaccination: &VaccinationEntry, ctx: &DisplayContext) -> String {
    let text = fill(
        ctx.captions().vaccination_count,
        "dose",
        &vaccination.dose_number.to_string(),
    );
    fill(&text, "total", &vaccination.total_series_of_doses.to_string())
}

fn vaccination_date_line(vaccination: &VaccinationEntry, ctx: &DisplayContext) -> Option<String> {
    let date = parse_calendar_date(&vaccination.date_of_vaccination)?;
    Some(fill(
        ctx.captions().vaccination_date,
        "date",
        &ctx.short_date(date),
    ))
}

fn sample_collection_line(sample_collection: Option<&str>, ctx: &DisplayContext) -> Option<String> {
    let timestamp = parse_timestamp(sample_collection?)?;
    Some(fill(
        ctx.captions().sample_collection_date,
        "date",
        &ctx.short_date_time(timestamp),
    ))
}

fn validity_line(validity_end: Option<&str>, ctx: &DisplayContext) -> Option<String> {
    let date = parse_calendar_date(validity_end?)?;
    Some(fill(ctx.captions().validity_date, "date", &ctx.short_date(date)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::Locale;
    use certview_types::{RecoveryEntry, TestEntry};

    fn vaccination(dose: u32, total: u32, date: &str) -> Entry {
        Entry::Vaccination(VaccinationEntry {
            dose_number: dose,
            total_series_of_doses: total,
            date_of_vaccination: date.into(),
            disease_or_agent_targeted: "840539006".into(),
            vaccine_or_prophylaxis: "1119349007".into(),
            vaccine_medicinal_product: "EU/1/20/1528".into(),
            marketing_authorization_holder: "ORG-100030215".into(),
            country_of_vaccination: "DE".into(),
            certificate_issuer: "Robert Koch-Institut".into(),
            unique_certificate_identifier: "URN:UVCI:01DE/IZ12345A/5CWLU12RNOB9RXSEOP6FG8#W".into(),
        })
    }

    fn test(test_type: TestType, sample_collection: Option<&str>) -> Entry {
        Entry::Test(TestEntry {
            test_type,
            sample_collection: sample_collection.map(str::to_owned),
        })
    }

    const ALL_STATES: [VaccinationState; 4] = [
        VaccinationState::NotVaccinated,
        VaccinationState::Incomplete,
        VaccinationState::FullyVaccinated {
            days_until_complete_protection: 5,
        },
        VaccinationState::CompletelyProtected,
    ];

    #[test]
    fn last_dose_icon_depends_on_aggregate_state() {
        let entry = vaccination(2, 2, "2021-05-01");
        for state in ALL_STATES {
            let expected = if state == VaccinationState::CompletelyProtected {
                IconKey::CompletelyProtected
            } else {
                IconKey::FullyVaccinated
            };
            assert_eq!(icon(&entry, &state), expected, "state {state:?}");
        }
    }

    #[test]
    fn earlier_doses_are_partially_vaccinated() {
        let entry = vaccination(1, 2, "2021-04-01");
        for state in ALL_STATES {
            assert_eq!(icon(&entry, &state), IconKey::PartiallyVaccinated);
        }
    }

    #[test]
    fn vaccination_presentation() {
        let ctx = DisplayContext::default();
        let p = classify(
            &vaccination(2, 2, "2021-05-01"),
            &VaccinationState::FullyVaccinated {
                days_until_complete_protection: 5,
            },
            &ctx,
        );
        assert_eq!(p.headline, ctx.captions().vaccination_headline);
        assert_eq!(p.subheadline.as_deref(), Some("2 of 2"));
        assert_eq!(p.detail.as_deref(), Some("Vaccinated on 5/1/21"));
        assert_eq!(p.icon, IconKey::FullyVaccinated);
    }

    #[test]
    fn vaccination_with_invalid_date_has_no_detail() {
        let ctx = DisplayContext::default();
        let p = classify(
            &vaccination(1, 2, "2021-13-40"),
            &VaccinationState::Incomplete,
            &ctx,
        );
        assert_eq!(p.detail, None);
        assert_eq!(p.subheadline.as_deref(), Some("1 of 2"));
    }

    #[test]
    fn german_subheadline_uses_localized_connector() {
        let ctx = DisplayContext::new(Locale::De, DisplayContext::default().utc_offset);
        let p = classify(
            &vaccination(1, 2, "2021-04-01"),
            &VaccinationState::Incomplete,
            &ctx,
        );
        assert_eq!(p.headline, "Impfzertifikat");
        assert_eq!(p.subheadline.as_deref(), Some("1 von 2"));
        assert_eq!(p.detail.as_deref(), Some("Geimpft am 01.04.21"));
    }

    #[test]
    fn test_subheadline_by_test_type() {
        let ctx = DisplayContext::default();
        let state = VaccinationState::NotVaccinated;

        let pcr = classify(&test(TestType::Pcr, None), &state, &ctx);
        assert_eq!(pcr.subheadline.as_deref(), Some(ctx.captions().pcr_test));

        let antigen = classify(&test(TestType::Antigen, None), &state, &ctx);
        assert_eq!(
            antigen.subheadline.as_deref(),
            Some(ctx.captions().antigen_test)
        );

        let unknown = classify(&test(TestType::Unknown, None), &state, &ctx);
        assert_eq!(unknown.subheadline, None);
        assert_eq!(unknown.headline, ctx.captions().test_headline);
        assert_eq!(unknown.icon, IconKey::Test);
    }

    #[test]
    fn test_detail_has_date_and_time() {
        let ctx = DisplayContext::default();
        let p = classify(
            &test(TestType::Pcr, Some("2021-05-29T22:34:17Z")),
            &VaccinationState::NotVaccinated,
            &ctx,
        );
        assert_eq!(p.detail.as_deref(), Some("Sample taken on 5/29/21, 10:34 PM"));

        let missing = classify(
            &test(TestType::Pcr, None),
            &VaccinationState::NotVaccinated,
            &ctx,
        );
        assert_eq!(missing.detail, None);
    }

    #[test]
    fn recovery_presentation() {
        let ctx = DisplayContext::default();
        let entry = Entry::Recovery(RecoveryEntry {
            certificate_validity_end: Some("2021-11-30".into()),
        });
        let p = classify(&entry, &VaccinationState::CompletelyProtected, &ctx);
        assert_eq!(p.headline, ctx.captions().recovery_headline);
        assert_eq!(p.subheadline, None);
        assert_eq!(p.detail.as_deref(), Some("Valid until 11/30/21"));
        assert_eq!(p.icon, IconKey::Recovery);

        let open_ended = Entry::Recovery(RecoveryEntry {
            certificate_validity_end: None,
        });
        assert_eq!(
            classify(&open_ended, &VaccinationState::CompletelyProtected, &ctx).detail,
            None
        );
    }

    #[test]
    fn qr_code_titles_match_headlines() {
        let ctx = DisplayContext::default();
        let (title, subtitle) = qr_code_titles(&vaccination(1, 2, "2021-04-01"), &ctx);
        assert_eq!(title, ctx.captions().vaccination_headline);
        assert_eq!(subtitle.as_deref(), Some("Vaccinated on 4/1/21"));

        let (title, subtitle) =
            qr_code_titles(&test(TestType::Antigen, Some("2021-05-29T08:05:00Z")), &ctx);
        assert_eq!(title, ctx.captions().test_headline);
        assert_eq!(subtitle.as_deref(), Some("Sample taken on 5/29/21, 8:05 AM"));
    }

    #[test]
    fn icon_keys_serialise_kebab_case() {
        let json = serde_json::to_string(&IconKey::CompletelyProtected).expect("serialise");
        assert_eq!(json, "\"completely-protected\"");
        assert_eq!(IconKey::PartiallyVaccinated.to_string(), "partially-vaccinated");
    }

    #[test]
    fn english_subheadline_matches_combined_dose_field() {
        if let Entry::Vaccination(v) = vaccination(3, 3, "2021-12-01") {
            assert_eq!(
                vaccination_count(&v, &DisplayContext::default()),
                crate::formatter::dose_number_and_total(&v)
            );
        }
    }
}
