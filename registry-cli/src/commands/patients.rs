use anyhow::{Context as _, Result, bail};
use chrono::NaiveDate;
use clap::{Args, Subcommand};
use registry_client::patients::{
    PAGE_SIZE, PatientLookup, format_registration_number, is_valid_registration_number,
    validate_new_patient,
};
use shared::models::{NewPatient, PatientUpdate};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::info;

use super::{Context, confirm, output};

#[derive(Subcommand, Debug)]
pub enum PatientsCommand {
    /// List patients, optionally narrowed by name, address, or initial letter
    List(ListArgs),
    /// Show one patient
    Show {
        /// Patient id
        id: String,
    },
    /// Register a new patient
    Create(CreateArgs),
    /// Change fields of a patient
    Update(UpdateArgs),
    /// Delete a patient
    Delete {
        /// Patient id
        id: String,

        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
    /// Download every patient as an Excel workbook
    Export {
        #[arg(long, short, default_value = "patients.xlsx")]
        output: PathBuf,
    },
    /// Upload patients from an Excel workbook
    Import {
        /// .xlsx or .xls file
        file: PathBuf,
    },
    /// Download the empty import workbook
    Template {
        #[arg(long, short, default_value = "patient-template.xlsx")]
        output: PathBuf,
    },
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Page number, starting at 1
    #[arg(long, short, default_value_t = 1)]
    pub page: u32,

    /// Search by name
    #[arg(long, short, conflicts_with_all = ["address", "letter", "search"])]
    pub name: Option<String>,

    /// Search by address
    #[arg(long, short, conflicts_with_all = ["letter", "search"])]
    pub address: Option<String>,

    /// Names starting with this letter
    #[arg(long, short, conflicts_with = "search")]
    pub letter: Option<char>,

    /// Free-text search across all fields
    #[arg(long, short)]
    pub search: Option<String>,
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub address: String,

    /// Registration number, e.g. 01.02.03.04 (digits are regrouped automatically)
    #[arg(long)]
    pub registration_number: String,

    #[arg(long)]
    pub birth_place: String,

    /// Date of birth as YYYY-MM-DD
    #[arg(long)]
    pub birth_day: NaiveDate,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Patient id
    pub id: String,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub address: Option<String>,

    #[arg(long)]
    pub registration_number: Option<String>,

    #[arg(long)]
    pub birth_place: Option<String>,

    /// Date of birth as YYYY-MM-DD
    #[arg(long)]
    pub birth_day: Option<NaiveDate>,
}

pub async fn run(ctx: &Context, command: PatientsCommand) -> Result<()> {
    ctx.require_session().await?;
    match command {
        PatientsCommand::List(args) => list(ctx, args).await,
        PatientsCommand::Show { id } => show(ctx, &id).await,
        PatientsCommand::Create(args) => create(ctx, args).await,
        PatientsCommand::Update(args) => update(ctx, args).await,
        PatientsCommand::Delete { id, yes } => delete(ctx, &id, yes).await,
        PatientsCommand::Export { output } => export(ctx, &output).await,
        PatientsCommand::Import { file } => import(ctx, &file).await,
        PatientsCommand::Template { output } => template(ctx, &output).await,
    }
}

fn lookup_for(args: &ListArgs) -> PatientLookup {
    if let Some(name) = &args.name {
        PatientLookup::Name(name.clone())
    } else if let Some(address) = &args.address {
        PatientLookup::Address(address.clone())
    } else if let Some(letter) = args.letter {
        PatientLookup::Alphabet(letter.to_ascii_uppercase())
    } else {
        PatientLookup::All
    }
}

async fn list(ctx: &Context, args: ListArgs) -> Result<()> {
    let page = args.page.max(1);
    let result = match &args.search {
        Some(search) => {
            ctx.call(|gateway| {
                gateway.search_patients(Some(search.as_str()), Some(page), Some(PAGE_SIZE))
            })
            .await?
        }
        None => {
            let lookup = lookup_for(&args);
            ctx.call(|gateway| gateway.lookup_patients(&lookup, page, PAGE_SIZE))
                .await?
        }
    };

    if ctx.json {
        return output::print_json(&result);
    }
    output::print_patient_page(&result);
    Ok(())
}

async fn show(ctx: &Context, id: &str) -> Result<()> {
    let patient = ctx.call(|gateway| gateway.get_patient(id)).await?;
    if ctx.json {
        return output::print_json(&patient);
    }
    output::print_patient(&patient);
    Ok(())
}

async fn create(ctx: &Context, args: CreateArgs) -> Result<()> {
    let patient = NewPatient {
        name: args.name.trim().to_string(),
        address: args.address.trim().to_string(),
        registration_number: format_registration_number(&args.registration_number),
        birth_place: args.birth_place.trim().to_string(),
        birth_day: Some(args.birth_day),
    };
    let problems = validate_new_patient(&patient);
    if !problems.is_empty() {
        bail!("invalid patient:\n  {}", problems.join("\n  "));
    }

    let created = ctx.call(|gateway| gateway.create_patient(&patient)).await?;
    info!(patient_id = %created.id, "patient created");
    println!("Patient created.");
    output::print_patient(&created);
    Ok(())
}

async fn update(ctx: &Context, args: UpdateArgs) -> Result<()> {
    let registration_number = args
        .registration_number
        .as_deref()
        .map(format_registration_number);
    if let Some(number) = &registration_number {
        if !is_valid_registration_number(number) {
            bail!(
                "registration number must look like XX.XX.XX.XX or XX.XX.XX.XXX, optionally followed by a capital letter"
            );
        }
    }

    let update = PatientUpdate {
        name: args.name.map(|value| value.trim().to_string()),
        address: args.address.map(|value| value.trim().to_string()),
        registration_number,
        birth_place: args.birth_place.map(|value| value.trim().to_string()),
        birth_day: args.birth_day,
    };
    if update.is_empty() {
        bail!("nothing to update; pass at least one field");
    }

    let updated = ctx
        .call(|gateway| gateway.update_patient(&args.id, &update))
        .await?;
    println!("Patient updated.");
    output::print_patient(&updated);
    Ok(())
}

async fn delete(ctx: &Context, id: &str, yes: bool) -> Result<()> {
    if !yes && !confirm(&format!("Delete patient {id}?"))? {
        println!("Cancelled.");
        return Ok(());
    }
    ctx.call(|gateway| gateway.delete_patient(id)).await?;
    println!("Patient {id} deleted.");
    Ok(())
}

async fn export(ctx: &Context, output: &Path) -> Result<()> {
    let bytes = ctx.call(|gateway| gateway.export_patients()).await?;
    write_file(output, &bytes)?;
    println!("Exported patients to {}", output.display());
    Ok(())
}

async fn import(ctx: &Context, file: &Path) -> Result<()> {
    let file_name = workbook_name(file)?;
    let contents = fs::read(file).with_context(|| format!("failed to read {}", file.display()))?;
    let message = ctx
        .call(|gateway| gateway.import_patients(&file_name, contents.clone()))
        .await?;
    println!("{message}");
    Ok(())
}

async fn template(ctx: &Context, output: &Path) -> Result<()> {
    let bytes = ctx.call(|gateway| gateway.download_template()).await?;
    write_file(output, &bytes)?;
    println!("Saved import template to {}", output.display());
    Ok(())
}

/// File name of an Excel workbook, rejecting anything else.
fn workbook_name(path: &Path) -> Result<String> {
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("{} has no file name", path.display()))?;
    let lower = name.to_ascii_lowercase();
    if !(lower.ends_with(".xlsx") || lower.ends_with(".xls")) {
        bail!("{name} is not an Excel workbook (.xlsx or .xls)");
    }
    Ok(name.to_string())
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(path, bytes).with_context(|| format!("failed to write {}", path.display()))
}
