//! # Certview Core
//!
//! Presentation derivation for a person's health certificates.
//!
//! This crate turns already-parsed certificates into display-ready state:
//! - [`formatter`]: human-readable values and captions of vaccination fields
//! - [`classifier`]: headline, subheadline, detail line and icon of an entry
//! - [`person`]: sections, row counts, row-to-certificate mapping and row view-state
//!
//! Derivation is synchronous and pure. Certificates and value sets come in through the
//! [`store`] interfaces, and the caller re-derives whenever [`watcher::PersonWatcher`] reports a
//! change.
//!
//! **No transport concerns**: HTTP and command-line front-ends live in the `certview-run` and
//! `certview-cli` binaries.

pub mod classifier;
pub mod config;
pub mod constants;
pub mod countries;
pub mod error;
pub mod formatter;
pub mod locale;
pub mod person;
pub mod store;
pub mod watcher;

pub use classifier::{classify, EntryPresentation, IconKey};
pub use config::CoreConfig;
pub use constants::DEFAULT_DATA_DIR;
pub use error::{CoreError, CoreResult, DerivationError};
pub use formatter::{FieldLine, VaccinationField};
pub use locale::{DisplayContext, Locale};
pub use person::{
    is_removable, most_relevant, row_view_state, section_row_counts, IndexPath, PersonView,
    PersonViewSnapshot, RowViewState, Section,
};
pub use store::{
    CertificateStore, InMemoryCertificateStore, StaticValueSets, StoreEvent, ValueSetProvider,
};
pub use watcher::{PersonWatcher, ViewUpdate};
