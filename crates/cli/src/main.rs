use anyhow::Context;
use certview_core::{
    config::{locale_from_env_value, utc_offset_from_env_value},
    formatter, is_removable, DisplayContext, PersonView, Section,
};
use certview_wire::{PersonSnapshot, PersonSnapshotData, ValueSets};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "certview")]
#[command(about = "Inspect how a person's health certificates are presented")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct DisplayArgs {
    /// Value-set file used to resolve coded fields
    #[arg(long)]
    value_sets: Option<PathBuf>,
    /// Display locale (en, de)
    #[arg(long)]
    locale: Option<String>,
    /// UTC offset for timestamps, e.g. +02:00
    #[arg(long)]
    utc_offset: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the row count of every section
    Sections {
        /// Person snapshot file
        snapshot: PathBuf,
    },
    /// Print every certificate row
    Rows {
        /// Person snapshot file
        snapshot: PathBuf,
        #[command(flatten)]
        display: DisplayArgs,
    },
    /// Print the field breakdown of one vaccination certificate
    Details {
        /// Person snapshot file
        snapshot: PathBuf,
        /// Row in the certificates section
        row: usize,
        #[command(flatten)]
        display: DisplayArgs,
    },
    /// Print the whole derived view as JSON
    View {
        /// Person snapshot file
        snapshot: PathBuf,
        #[command(flatten)]
        display: DisplayArgs,
    },
    /// Remove a certificate row and write the snapshot back
    Remove {
        /// Person snapshot file
        snapshot: PathBuf,
        /// Row in the certificates section
        row: usize,
    },
    /// List the captions of all vaccination fields
    Labels,
}

struct Loaded {
    data: PersonSnapshotData,
    value_sets: Option<certview_types::ValueSetLookup>,
    ctx: DisplayContext,
}

fn load(snapshot: &Path, display: DisplayArgs) -> anyhow::Result<Loaded> {
    let data = PersonSnapshot::read(snapshot)
        .with_context(|| format!("reading snapshot {}", snapshot.display()))?;
    let value_sets = display
        .value_sets
        .as_deref()
        .map(ValueSets::read)
        .transpose()
        .context("reading value sets")?;
    let ctx = DisplayContext::new(
        locale_from_env_value(display.locale)?,
        utc_offset_from_env_value(display.utc_offset)?,
    );

    Ok(Loaded {
        data,
        value_sets,
        ctx,
    })
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("certview=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Sections { snapshot }) => {
            let data = PersonSnapshot::read(&snapshot)?;
            let ctx = DisplayContext::default();
            let view = PersonView::new(&data.person, None, &ctx);
            for (section, rows) in view.section_row_counts() {
                let marker = if is_removable(section) { " (removable)" } else { "" };
                println!("{:?}: {}{}", section, rows, marker);
            }
        }
        Some(Commands::Rows { snapshot, display }) => {
            let loaded = load(&snapshot, display)?;
            let view = PersonView::new(&loaded.data.person, loaded.value_sets.as_ref(), &loaded.ctx);
            let rows = view.rows();
            if rows.is_empty() {
                println!("No certificates found.");
            }
            for (index, row) in rows.iter().enumerate() {
                let marker = if row.emphasized { "*" } else { " " };
                println!(
                    "{marker} [{index}] {} | {} | {} | {}",
                    row.headline,
                    row.subheadline.as_deref().unwrap_or("-"),
                    row.detail.as_deref().unwrap_or("-"),
                    row.icon
                );
            }
        }
        Some(Commands::Details {
            snapshot,
            row,
            display,
        }) => {
            let loaded = load(&snapshot, display)?;
            let view = PersonView::new(&loaded.data.person, loaded.value_sets.as_ref(), &loaded.ctx);
            match view.certificate_details(row) {
                Some(lines) => {
                    for line in lines {
                        println!("{}: {}", line.label, line.value);
                    }
                }
                None => eprintln!("Row {} is not a vaccination certificate", row),
            }
        }
        Some(Commands::View { snapshot, display }) => {
            let loaded = load(&snapshot, display)?;
            let view = PersonView::new(&loaded.data.person, loaded.value_sets.as_ref(), &loaded.ctx);
            println!("{}", serde_json::to_string_pretty(&view.snapshot())?);
        }
        Some(Commands::Remove { snapshot, row }) => {
            let mut data = PersonSnapshot::read(&snapshot)?;
            let ctx = DisplayContext::default();
            let removed = PersonView::new(&data.person, None, &ctx)
                .certificate_at(Section::Certificates, row)
                .map(|certificate| certificate.id);

            match removed {
                Some(id) => {
                    data.person.certificates.retain(|c| c.id != id);
                    PersonSnapshot::write(&snapshot, &data)?;
                    println!("Removed certificate {}", id);
                    if data.person.certificates.is_empty() {
                        println!("No certificates left for {}", data.person_id);
                    }
                }
                None => eprintln!("No certificate at row {}", row),
            }
        }
        Some(Commands::Labels) => {
            for field in certview_core::VaccinationField::ALL {
                println!("{}: {}", field.key(), formatter::label(field));
            }
        }
        None => {
            println!("Use 'certview --help' for commands");
        }
    }

    Ok(())
}
