//! Person aggregator.
//!
//! Derives the list layout of a certified person's screen: which sections are shown, how many
//! rows each one has, which certificate a row refers to and how each row is presented.
//!
//! Section order is fixed:
//!
//! | Section | Rows |
//! |---|---|
//! | header | 1 |
//! | QR code | 1 if there is at least one certificate |
//! | fully vaccinated hint | 1 in state `FullyVaccinated`, else 0 |
//! | person | 1 |
//! | certificates | one per certificate |
//!
//! The most relevant certificate is the **last** element of the person's certificate sequence.
//! The store is responsible for keeping that sequence in recency order; nothing here re-sorts.
//!
//! All functions are pure: they read the snapshot they are given and return fresh values.

use crate::classifier::{self, IconKey};
use crate::error::DerivationError;
use crate::formatter::{self, FieldLine};
use crate::locale::{fill, parse_calendar_date, DisplayContext};
use certview_types::{
    CertificateId, Entry, HealthCertificate, HealthCertifiedPerson, ValueSetLookup,
    VaccinationState,
};
use serde::Serialize;

// ============================================================================
// Sections and index paths
// ============================================================================

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, utoipa::ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Header,
    QrCode,
    FullyVaccinatedHint,
    Person,
    Certificates,
}

impl Section {
    pub const ALL: [Section; 5] = [
        Section::Header,
        Section::QrCode,
        Section::FullyVaccinatedHint,
        Section::Person,
        Section::Certificates,
    ];

    pub fn index(&self) -> usize {
        match self {
            Section::Header => 0,
            Section::QrCode => 1,
            Section::FullyVaccinatedHint => 2,
            Section::Person => 3,
            Section::Certificates => 4,
        }
    }

    pub fn from_index(index: usize) -> Option<Section> {
        Self::ALL.get(index).copied()
    }
}

/// Position of a row in the list, as reported by a list widget.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct IndexPath {
    pub section: usize,
    pub row: usize,
}

impl IndexPath {
    pub fn new(section: usize, row: usize) -> Self {
        Self { section, row }
    }
}

// ============================================================================
// Row counts and certificate mapping
// ============================================================================

pub fn number_of_rows(
    section: Section,
    certificates: &[HealthCertificate],
    vaccination_state: &VaccinationState,
) -> usize {
    match section {
        Section::Header | Section::Person => 1,
        Section::QrCode => usize::from(!certificates.is_empty()),
        Section::FullyVaccinatedHint => usize::from(is_fully_vaccinated(vaccination_state)),
        Section::Certificates => certificates.len(),
    }
}

/// Row count of every section, in section order.
pub fn section_row_counts(
    certificates: &[HealthCertificate],
    vaccination_state: &VaccinationState,
) -> Vec<(Section, usize)> {
    Section::ALL
        .into_iter()
        .map(|section| {
            (
                section,
                number_of_rows(section, certificates, vaccination_state),
            )
        })
        .collect()
}

fn is_fully_vaccinated(state: &VaccinationState) -> bool {
    matches!(state, VaccinationState::FullyVaccinated { .. })
}

/// The certificate currently in use: the last one in store order.
pub fn most_relevant(certificates: &[HealthCertificate]) -> Option<&HealthCertificate> {
    certificates.last()
}

/// Whether `certificate` is the most relevant one of `certificates`, compared by identity.
pub fn is_emphasized(certificate: &HealthCertificate, certificates: &[HealthCertificate]) -> bool {
    most_relevant(certificates).is_some_and(|relevant| relevant.is_same_certificate(certificate))
}

/// Certificate shown at `row` of `section`; `None` outside the certificates section or for an
/// out-of-range row.
pub fn certificate_at(
    certificates: &[HealthCertificate],
    section: Section,
    row: usize,
) -> Option<&HealthCertificate> {
    if section != Section::Certificates {
        return None;
    }
    certificates.get(row)
}

/// Like [`certificate_at`], for a raw index path. Unknown section indices yield `None`.
pub fn certificate_at_index_path(
    certificates: &[HealthCertificate],
    index_path: IndexPath,
) -> Option<&HealthCertificate> {
    let section = Section::from_index(index_path.section)?;
    certificate_at(certificates, section, index_path.row)
}

/// Only certificate rows can be swiped away. Deleting is left to the certificate store.
pub fn is_removable(section: Section) -> bool {
    section == Section::Certificates
}

// ============================================================================
// View state
// ============================================================================

/// Background style of a cell. Mapping a gradient to colours is up to the view layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Gradient {
    SolidGrey,
    LightBlue { with_stars: bool },
}

impl Gradient {
    /// Person-level background for a vaccination state.
    pub fn for_state(state: &VaccinationState) -> Gradient {
        match state {
            VaccinationState::CompletelyProtected => Gradient::LightBlue { with_stars: true },
            VaccinationState::FullyVaccinated { .. } => Gradient::LightBlue { with_stars: false },
            VaccinationState::NotVaccinated | VaccinationState::Incomplete => Gradient::SolidGrey,
        }
    }
}

/// Presentation of one certificate row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct RowViewState {
    #[schema(value_type = String)]
    pub certificate_id: CertificateId,
    pub headline: String,
    pub subheadline: Option<String>,
    pub detail: Option<String>,
    pub icon: IconKey,
    pub emphasized: bool,
    #[schema(value_type = Object)]
    pub gradient: Gradient,
    pub currently_used_hint_visible: bool,
}

/// Row presentation of `certificate` within `person`'s certificate list.
///
/// `value_sets` is accepted so callers can pass the same snapshot to every row derivation;
/// row headlines do not contain coded values.
pub fn row_view_state(
    certificate: &HealthCertificate,
    person: &HealthCertifiedPerson,
    _value_sets: Option<&ValueSetLookup>,
    ctx: &DisplayContext,
) -> RowViewState {
    let presentation = classifier::classify(&certificate.entry, &person.vaccination_state, ctx);
    let emphasized = is_emphasized(certificate, &person.certificates);

    RowViewState {
        certificate_id: certificate.id,
        headline: presentation.headline,
        subheadline: presentation.subheadline,
        detail: presentation.detail,
        icon: presentation.icon,
        emphasized,
        gradient: if emphasized {
            Gradient::LightBlue { with_stars: false }
        } else {
            Gradient::SolidGrey
        },
        currently_used_hint_visible: emphasized,
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct HeaderViewState {
    #[schema(value_type = String)]
    pub title: &'static str,
    #[schema(value_type = String)]
    pub subtitle: &'static str,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct QrCodeViewState {
    #[schema(value_type = String)]
    pub certificate_id: CertificateId,
    /// Encoded payload to render as QR code.
    pub payload: String,
    pub title: String,
    pub subtitle: Option<String>,
    #[schema(value_type = String)]
    pub accessibility_text: &'static str,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct PersonCellViewState {
    pub name: String,
    pub date_of_birth: Option<String>,
}

/// Row counts for one section, as serialised for view layers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct SectionRows {
    pub section: Section,
    pub rows: usize,
}

/// Everything needed to render a person's screen in one serialisable value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct PersonViewSnapshot {
    #[schema(value_type = Object)]
    pub gradient: Gradient,
    pub sections: Vec<SectionRows>,
    pub header: HeaderViewState,
    pub qr_code: Option<QrCodeViewState>,
    pub fully_vaccinated_hint: Option<String>,
    pub person: PersonCellViewState,
    pub certificates: Vec<RowViewState>,
}

/// Derivation over one person snapshot.
///
/// Borrowing keeps the snapshot immutable for the duration of one render pass; build a new view
/// after the store reports a change.
#[derive(Clone, Copy, Debug)]
pub struct PersonView<'a> {
    person: &'a HealthCertifiedPerson,
    value_sets: Option<&'a ValueSetLookup>,
    ctx: &'a DisplayContext,
}

impl<'a> PersonView<'a> {
    pub fn new(
        person: &'a HealthCertifiedPerson,
        value_sets: Option<&'a ValueSetLookup>,
        ctx: &'a DisplayContext,
    ) -> Self {
        Self {
            person,
            value_sets,
            ctx,
        }
    }

    pub fn person(&self) -> &'a HealthCertifiedPerson {
        self.person
    }

    pub fn section_row_counts(&self) -> Vec<(Section, usize)> {
        section_row_counts(&self.person.certificates, &self.person.vaccination_state)
    }

    pub fn number_of_rows(&self, section: Section) -> usize {
        number_of_rows(
            section,
            &self.person.certificates,
            &self.person.vaccination_state,
        )
    }

    pub fn gradient(&self) -> Gradient {
        Gradient::for_state(&self.person.vaccination_state)
    }

    pub fn header(&self) -> HeaderViewState {
        let captions = self.ctx.captions();
        HeaderViewState {
            title: captions.person_title,
            subtitle: captions.person_subtitle,
        }
    }

    /// QR-code cell for the most relevant certificate.
    ///
    /// # Errors
    ///
    /// [`DerivationError::NoCertificates`] if the person has no certificates. The QR-code
    /// section has zero rows in that case, so a caller following the row counts never gets here.
    pub fn qr_code(&self) -> Result<QrCodeViewState, DerivationError> {
        let certificate =
            most_relevant(&self.person.certificates).ok_or(DerivationError::NoCertificates)?;
        let (title, subtitle) = classifier::qr_code_titles(&certificate.entry, self.ctx);

        Ok(QrCodeViewState {
            certificate_id: certificate.id,
            payload: certificate.payload.clone(),
            title,
            subtitle,
            accessibility_text: self.ctx.captions().qr_code_image_description,
        })
    }

    /// Text of the hint shown while full protection is still building up.
    ///
    /// # Errors
    ///
    /// [`DerivationError::HintNotApplicable`] in any state other than `FullyVaccinated`.
    pub fn fully_vaccinated_hint(&self) -> Result<String, DerivationError> {
        match self.person.vaccination_state {
            VaccinationState::FullyVaccinated {
                days_until_complete_protection,
            } => Ok(fill(
                self.ctx.captions().days_until_complete_protection,
                "days",
                &days_until_complete_protection.to_string(),
            )),
            other => Err(DerivationError::HintNotApplicable(other)),
        }
    }

    pub fn person_cell(&self) -> PersonCellViewState {
        let name = self
            .person
            .name
            .as_ref()
            .map(|name| name.full_name())
            .unwrap_or_default();

        let date_of_birth = self
            .person
            .date_of_birth
            .as_deref()
            .and_then(parse_calendar_date)
            .map(|date| {
                fill(
                    self.ctx.captions().date_of_birth,
                    "date",
                    &self.ctx.medium_date(date),
                )
            });

        PersonCellViewState {
            name,
            date_of_birth,
        }
    }

    pub fn certificate_at(&self, section: Section, row: usize) -> Option<&'a HealthCertificate> {
        certificate_at(&self.person.certificates, section, row)
    }

    pub fn certificate_at_index_path(&self, index_path: IndexPath) -> Option<&'a HealthCertificate> {
        certificate_at_index_path(&self.person.certificates, index_path)
    }

    /// View state of the certificate row at `row`; `None` for an out-of-range row.
    pub fn row(&self, row: usize) -> Option<RowViewState> {
        self.person
            .certificates
            .get(row)
            .map(|certificate| row_view_state(certificate, self.person, self.value_sets, self.ctx))
    }

    pub fn rows(&self) -> Vec<RowViewState> {
        self.person
            .certificates
            .iter()
            .map(|certificate| row_view_state(certificate, self.person, self.value_sets, self.ctx))
            .collect()
    }

    /// Labelled field lines of the certificate at `row`.
    ///
    /// Only vaccination certificates have a field breakdown; other kinds and out-of-range rows
    /// yield `None`.
    pub fn certificate_details(&self, row: usize) -> Option<Vec<FieldLine>> {
        match &self.person.certificates.get(row)?.entry {
            Entry::Vaccination(vaccination) => {
                Some(formatter::details(vaccination, self.value_sets, self.ctx))
            }
            Entry::Test(_) | Entry::Recovery(_) => None,
        }
    }

    pub fn snapshot(&self) -> PersonViewSnapshot {
        tracing::debug!(
            certificates = self.person.certificates.len(),
            value_sets = self.value_sets.is_some(),
            "deriving person view"
        );

        PersonViewSnapshot {
            gradient: self.gradient(),
            sections: self
                .section_row_counts()
                .into_iter()
                .map(|(section, rows)| SectionRows { section, rows })
                .collect(),
            header: self.header(),
            qr_code: self.qr_code().ok(),
            fully_vaccinated_hint: self.fully_vaccinated_hint().ok(),
            person: self.person_cell(),
            certificates: self.rows(),
        }
    }
}
