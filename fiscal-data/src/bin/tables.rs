use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use fiscal_core::{Country, YearTables};
use fiscal_data::{BracketLoader, TableRegistry};
use tracing_subscriber::EnvFilter;

/// Validate a rate-table file and print what it contains.
///
/// A `.toml` file is read as `[[year]]` sections of rate tables. A `.csv`
/// file is read as bracket overrides with the columns
/// `country,tax_year,schedule,lower_bound,upper_bound,rate`, checked both on
/// its own and against the bundled years it targets.
#[derive(Parser, Debug)]
#[command(name = "fiscal-tables")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to a TOML table file or a CSV bracket file
    #[arg(short, long)]
    file: PathBuf,

    /// Only show this country (FR, DE, IT, UK)
    #[arg(short, long, value_parser = parse_country)]
    country: Option<Country>,

    /// Only show this tax year
    #[arg(short, long)]
    year: Option<i32>,
}

fn parse_country(s: &str) -> Result<Country, String> {
    Country::parse(s).ok_or_else(|| format!("unknown country code '{s}'"))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match args.file.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => summarize_toml(&args),
        Some("csv") => summarize_csv(&args),
        _ => bail!(
            "{} is neither a .toml nor a .csv file",
            args.file.display()
        ),
    }
}

fn wanted(
    args: &Args,
    tables: &YearTables,
) -> bool {
    args.country.is_none_or(|c| c == tables.country)
        && args.year.is_none_or(|y| y == tables.tax_year)
}

fn summarize_toml(args: &Args) -> Result<()> {
    let registry = TableRegistry::from_file(&args.file)
        .with_context(|| format!("Invalid table file: {}", args.file.display()))?;

    println!("{}: {} tax year(s), all valid", args.file.display(), registry.len());

    for key in registry.keys() {
        let tables = registry.get(key)?;
        if !wanted(args, tables) {
            continue;
        }
        println!();
        println!("{key}");
        print_names("  VAT rates", tables.vat.keys());
        print_names("  brackets", tables.brackets.keys());
        print_names("  allowances", tables.allowances.keys());
        print_names("  rates", tables.rates.keys());
        print_names("  amounts", tables.amounts.keys());
        print_names("  multipliers", tables.multipliers.keys());
        print_names("  factors", tables.factors.keys());
        if tables.income_tariff.is_some() {
            println!("  income tariff: yes");
        }
    }

    Ok(())
}

fn print_names<'a>(
    label: &str,
    names: impl Iterator<Item = &'a String>,
) {
    let names: Vec<&str> = names.map(String::as_str).collect();
    if !names.is_empty() {
        println!("{label}: {}", names.join(", "));
    }
}

fn summarize_csv(args: &Args) -> Result<()> {
    let records = open_csv(&args.file)?;
    println!("Parsed {} records from CSV", records.len());

    let schedules = BracketLoader::group(&records)
        .with_context(|| format!("Invalid bracket schedule in: {}", args.file.display()))?;

    let mut registry = TableRegistry::bundled().context("Failed to load bundled tables")?;
    let applied = registry
        .apply_brackets(schedules.clone())
        .context("Bracket file targets a year with no bundled tables")?;

    for (key, by_name) in &schedules {
        if args.country.is_some_and(|c| c != key.country)
            || args.year.is_some_and(|y| y != key.tax_year)
        {
            continue;
        }
        for (name, table) in by_name {
            println!();
            println!("{key} {name}");
            for bracket in table.brackets() {
                let upper = bracket
                    .upper_bound
                    .map_or_else(|| "and above".to_string(), |u| format!("to {u}"));
                println!("  from {} {upper}: {}", bracket.lower_bound, bracket.rate);
            }
        }
    }

    println!();
    println!("{applied} schedule(s) valid against the bundled tables.");
    Ok(())
}

fn open_csv(path: &Path) -> Result<Vec<fiscal_data::BracketRecord>> {
    let file = File::open(path).with_context(|| format!("Failed to open: {}", path.display()))?;
    BracketLoader::parse(file).with_context(|| format!("Failed to parse CSV: {}", path.display()))
}
