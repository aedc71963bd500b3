//! Command-line definition and the calculator behind each subcommand.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use fiscal_core::calculations::common::round_half_up;
use fiscal_core::calculations::{Direction, MultiplierSpec, compute_bracket_tax, marginal_rate};
use fiscal_core::jurisdictions::{
    VatCalculator, VatConfig, VatInput, VatRateSelection, france, germany, italy, uk,
};
use fiscal_core::{
    BracketTable, CalculationError, Country, Holding, HoldingPeriod, Percent, YearTables,
};
use fiscal_data::TableRegistry;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info};

use crate::amount::{amount_arg, optional_amount, percent_arg};
use crate::csv_loader;
use crate::output::{OutputFormat, Report, render, render_all};
use crate::settings::Settings;

// ─── CLI definition ──────────────────────────────────────────────────────────

const GLOBAL_OPTIONS: &str = "Global options";

/// Tax calculators for France, Germany, Italy and the United Kingdom.
///
/// Rates and thresholds come from the bundled tables for each tax year,
/// optionally extended with TOML tables from `--tables`.
#[derive(Debug, Parser)]
#[command(name = "fiscal", version, about)]
pub struct Cli {
    /// Settings file (TOML)
    #[arg(long, global = true, help_heading = GLOBAL_OPTIONS)]
    pub config: Option<PathBuf>,

    /// Directory of extra rate tables (TOML)
    #[arg(long, global = true, help_heading = GLOBAL_OPTIONS)]
    pub tables: Option<PathBuf>,

    /// Tax year; defaults to the newest loaded year
    #[arg(long, global = true, help_heading = GLOBAL_OPTIONS)]
    pub year: Option<i32>,

    /// Output format
    #[arg(long, global = true, help_heading = GLOBAL_OPTIONS, value_enum)]
    pub format: Option<OutputFormat>,

    /// Log level or filter directive, e.g. `debug` or `fiscal_core=debug`
    #[arg(long, global = true, help_heading = GLOBAL_OPTIONS)]
    pub log_level: Option<String>,

    /// Append log output to this file
    #[arg(long, global = true, help_heading = GLOBAL_OPTIONS)]
    pub log_file: Option<PathBuf>,

    /// Do not print log output on stderr
    #[arg(short, long, global = true, help_heading = GLOBAL_OPTIONS)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Add VAT to a net amount or take it out of a gross amount
    Vat(VatArgs),
    /// Run VAT calculations for every row of a CSV file
    VatBatch(VatBatchArgs),
    /// French income tax with the family quotient
    FrIncome(FrIncomeArgs),
    /// French capital gains on real estate
    FrPropertyGains(FrPropertyGainsArgs),
    /// French capital gains on securities
    FrSecurities(FrSecuritiesArgs),
    /// German income tax with solidarity surcharge and church tax
    DeIncome(DeIncomeArgs),
    /// German capital gains on securities or real estate
    DeCapitalGains(DeCapitalGainsArgs),
    /// German inheritance and gift tax
    DeInheritance(DeInheritanceArgs),
    /// German trade tax
    DeTradeTax(DeTradeTaxArgs),
    /// German property tax
    DePropertyTax(DePropertyTaxArgs),
    /// Italian personal income tax with regional and municipal surcharges
    ItIrpef(ItIrpefArgs),
    /// Italian municipal property tax
    ItImu(ItImuArgs),
    /// UK income tax and National Insurance
    UkIncome(UkIncomeArgs),
    /// UK capital gains tax
    UkCapitalGains(UkCapitalGainsArgs),
    /// UK stamp duty land tax
    UkStampDuty(UkStampDutyArgs),
    /// Compose a base rate with a municipal multiplier
    Multiplier(MultiplierArgs),
    /// Show a bracket schedule, optionally applied to an amount
    Brackets(BracketsArgs),
}

// ─── shared arguments ────────────────────────────────────────────────────────

/// How long an asset was held: completed years, or both dates.
#[derive(Debug, Args)]
pub struct HoldingArgs {
    /// Completed years of ownership
    #[arg(long, conflicts_with_all = ["acquired", "sold"])]
    pub years: Option<u32>,

    /// Purchase date (YYYY-MM-DD)
    #[arg(long, requires = "sold")]
    pub acquired: Option<NaiveDate>,

    /// Sale date (YYYY-MM-DD)
    #[arg(long, requires = "acquired")]
    pub sold: Option<NaiveDate>,
}

impl HoldingArgs {
    fn holding(&self) -> Result<Option<Holding>, CalculationError> {
        match (self.years, self.acquired, self.sold) {
            (Some(years), _, _) => Ok(Some(Holding::Years(years))),
            (None, Some(acquired), Some(sold)) => {
                Ok(Some(Holding::Dates(HoldingPeriod::new(acquired, sold)?)))
            }
            _ => Ok(None),
        }
    }

    fn required(&self) -> Result<Holding, CalculationError> {
        self.holding()?.ok_or_else(|| {
            CalculationError::invalid("holding", "give --years or --acquired with --sold")
        })
    }
}

/// Where a German municipal multiplier comes from.
#[derive(Debug, Args)]
pub struct MunicipalityArgs {
    /// Multiplier (Hebesatz) in percent, e.g. 490
    #[arg(long, value_parser = percent_arg, conflicts_with = "municipality")]
    pub multiplier: Option<Percent>,

    /// Municipality to look the multiplier up for, e.g. munich
    #[arg(long)]
    pub municipality: Option<String>,
}

impl MunicipalityArgs {
    fn resolve(
        &self,
        settings: &Settings,
    ) -> Result<germany::MunicipalMultiplier, CalculationError> {
        if let Some(multiplier) = self.multiplier {
            return Ok(germany::MunicipalMultiplier::Explicit(multiplier));
        }
        self.municipality
            .clone()
            .or_else(|| settings.germany.municipality.clone())
            .map(germany::MunicipalMultiplier::Municipality)
            .ok_or_else(|| {
                CalculationError::invalid("multiplier", "give --multiplier or --municipality")
            })
    }
}

fn country_arg(s: &str) -> Result<Country, String> {
    Country::parse(s).ok_or_else(|| format!("unknown country '{s}' (expected FR, DE, IT or UK)"))
}

fn direction_arg(s: &str) -> Result<Direction, String> {
    Direction::parse(s).ok_or_else(|| format!("unknown direction '{s}' (expected add or remove)"))
}

fn relationship_arg(s: &str) -> Result<germany::Relationship, String> {
    germany::Relationship::parse(s).ok_or_else(|| {
        let known: Vec<_> = germany::Relationship::ALL.iter().map(|r| r.as_str()).collect();
        format!("unknown relationship '{s}' (expected one of {})", known.join(", "))
    })
}

fn legal_form_arg(s: &str) -> Result<germany::LegalForm, String> {
    germany::LegalForm::parse(s).ok_or_else(|| {
        format!("unknown legal form '{s}' (expected sole-proprietor, partnership or corporation)")
    })
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

// ─── context ─────────────────────────────────────────────────────────────────

/// Loaded tables and defaults shared by every subcommand.
pub struct Context {
    registry: TableRegistry,
    year: Option<i32>,
    settings: Settings,
}

impl Context {
    /// Bundled tables, extended with `--tables` (or the settings' `tables`).
    pub fn new(
        cli: &Cli,
        settings: Settings,
    ) -> Result<Self> {
        let mut registry = TableRegistry::bundled().context("loading bundled rate tables")?;
        if let Some(dir) = cli.tables.as_ref().or(settings.tables.as_ref()) {
            let extra = TableRegistry::from_dir(dir)
                .with_context(|| format!("loading rate tables from {}", dir.display()))?;
            info!(dir = %dir.display(), years = extra.len(), "loaded extra rate tables");
            registry.extend(extra);
        }

        Ok(Self::with_registry(registry, cli.year.or(settings.year), settings))
    }

    pub fn with_registry(
        registry: TableRegistry,
        year: Option<i32>,
        settings: Settings,
    ) -> Self {
        Self {
            registry,
            year,
            settings,
        }
    }

    fn tables(
        &self,
        country: Country,
    ) -> Result<&YearTables> {
        let tables = self.registry.resolve(country, self.year)?;
        debug!(key = %tables.key(), "using rate tables");
        Ok(tables)
    }
}

// ─── dispatch ────────────────────────────────────────────────────────────────

/// What a subcommand produced.
pub enum Output {
    Single(Report),
    Batch(Vec<Report>),
}

impl Output {
    pub fn render(
        &self,
        format: OutputFormat,
    ) -> Result<String, serde_json::Error> {
        match self {
            Self::Single(report) => render(report, format),
            Self::Batch(reports) => render_all(reports, format),
        }
    }
}

impl Command {
    pub fn run(
        &self,
        ctx: &Context,
    ) -> Result<Output> {
        let report = match self {
            Self::Vat(args) => args.run(ctx)?,
            Self::VatBatch(args) => return Ok(Output::Batch(args.run(ctx)?)),
            Self::FrIncome(args) => args.run(ctx)?,
            Self::FrPropertyGains(args) => args.run(ctx)?,
            Self::FrSecurities(args) => args.run(ctx)?,
            Self::DeIncome(args) => args.run(ctx)?,
            Self::DeCapitalGains(args) => args.run(ctx)?,
            Self::DeInheritance(args) => args.run(ctx)?,
            Self::DeTradeTax(args) => args.run(ctx)?,
            Self::DePropertyTax(args) => args.run(ctx)?,
            Self::ItIrpef(args) => args.run(ctx)?,
            Self::ItImu(args) => args.run(ctx)?,
            Self::UkIncome(args) => args.run(ctx)?,
            Self::UkCapitalGains(args) => args.run(ctx)?,
            Self::UkStampDuty(args) => args.run(ctx)?,
            Self::Multiplier(args) => args.run()?,
            Self::Brackets(args) => args.run(ctx)?,
        };
        Ok(Output::Single(report))
    }
}

/// Runs the parsed command line and returns what should be printed.
pub fn execute(
    cli: &Cli,
    settings: Settings,
) -> Result<String> {
    let format = cli.format.or(settings.format).unwrap_or_default();
    let ctx = Context::new(cli, settings)?;
    let output = cli.command.run(&ctx)?;
    Ok(output.render(format)?)
}

// ─── VAT ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct VatArgs {
    /// Country whose VAT table applies (FR, DE, IT, UK)
    #[arg(long, value_parser = country_arg)]
    pub country: Country,

    /// Net amount to add VAT to, or gross amount to take it out of
    #[arg(long, value_parser = amount_arg)]
    pub amount: Decimal,

    /// Rate kind from the country's table: standard, reduced, ...
    #[arg(long, default_value = "standard")]
    pub rate_kind: String,

    /// Explicit rate; overrides --rate-kind
    #[arg(long, value_parser = percent_arg)]
    pub rate: Option<Percent>,

    /// add: the amount is net; remove: the amount is gross
    #[arg(long, default_value = "add", value_parser = direction_arg)]
    pub direction: Direction,
}

impl VatArgs {
    fn run(
        &self,
        ctx: &Context,
    ) -> Result<Report> {
        let rate = match self.rate {
            Some(rate) => VatRateSelection::Explicit(rate),
            None => VatRateSelection::Kind(self.rate_kind.trim().to_ascii_lowercase()),
        };
        vat_report(
            ctx,
            "VAT",
            self.country,
            &VatInput {
                amount: self.amount,
                rate,
                direction: self.direction,
            },
        )
    }
}

fn vat_report(
    ctx: &Context,
    title: &str,
    country: Country,
    input: &VatInput,
) -> Result<Report> {
    let tables = ctx.tables(country)?;
    let vat = VatCalculator::new(VatConfig::from_year_tables(tables)?).calculate(input)?;

    Ok(Report::new(title, &vat)?
        .jurisdiction(tables.key())
        .detail("direction", input.direction)
        .detail("rate", vat.rate)
        .amount("net", vat.net)
        .amount("VAT", vat.vat)
        .amount("gross", vat.gross))
}

#[derive(Debug, Args)]
pub struct VatBatchArgs {
    /// CSV file with country,amount,rate_kind,direction[,rate] columns
    #[arg(long)]
    pub file: PathBuf,
}

impl VatBatchArgs {
    fn run(
        &self,
        ctx: &Context,
    ) -> Result<Vec<Report>> {
        let lines = csv_loader::load_from_file(&self.file)?;
        info!(file = %self.file.display(), rows = lines.len(), "loaded VAT lines");

        lines
            .iter()
            .map(|line| {
                vat_report(ctx, &format!("VAT, row {}", line.row), line.country, &line.input)
                    .with_context(|| format!("row {}", line.row))
            })
            .collect()
    }
}

// ─── France ──────────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct FrIncomeArgs {
    /// Net taxable income of the household
    #[arg(long, value_parser = amount_arg)]
    pub income: Decimal,

    /// Married or in a civil partnership, taxed jointly
    #[arg(long)]
    pub couple: bool,

    /// Dependent children
    #[arg(long, default_value_t = 0)]
    pub children: u32,

    /// Parent raising the children alone
    #[arg(long)]
    pub single_parent: bool,
}

impl FrIncomeArgs {
    fn run(
        &self,
        ctx: &Context,
    ) -> Result<Report> {
        let tables = ctx.tables(Country::France)?;
        let assessment = france::FrenchIncomeTax::new(france::IncomeTaxConfig::from_year_tables(
            tables,
        )?)
        .calculate(&france::IncomeTaxInput {
            net_taxable_income: self.income,
            household: france::Household {
                couple: self.couple,
                children: self.children,
                single_parent: self.single_parent,
            },
        })?;

        Ok(Report::new("French income tax", &assessment)?
            .jurisdiction(tables.key())
            .detail("household parts", assessment.parts.normalize())
            .amount("income per part", assessment.quotient)
            .detail("marginal rate", assessment.marginal_rate)
            .detail("family quotient capped", yes_no(assessment.capped))
            .result(&assessment.result))
    }
}

#[derive(Debug, Args)]
pub struct FrPropertyGainsArgs {
    /// Price stated in the deed of sale
    #[arg(long, value_parser = amount_arg)]
    pub sale_price: Decimal,

    /// Price paid for the property
    #[arg(long, value_parser = amount_arg)]
    pub purchase_price: Decimal,

    /// Agency fees and other selling costs
    #[arg(long)]
    pub sale_costs: Option<String>,

    /// Notary fees and duties; empty means the flat 7.5%
    #[arg(long)]
    pub acquisition_costs: Option<String>,

    /// Improvement works; empty means the flat 15% after five years
    #[arg(long)]
    pub works: Option<String>,

    #[command(flatten)]
    pub holding: HoldingArgs,

    /// The property is the seller's main residence
    #[arg(long)]
    pub main_residence: bool,
}

impl FrPropertyGainsArgs {
    fn run(
        &self,
        ctx: &Context,
    ) -> Result<Report> {
        let tables = ctx.tables(Country::France)?;
        let input = france::PropertyGainsInput {
            sale_price: self.sale_price,
            sale_costs: optional_amount(self.sale_costs.as_deref(), "sale-costs")?,
            purchase_price: self.purchase_price,
            acquisition_costs: optional_amount(
                self.acquisition_costs.as_deref(),
                "acquisition-costs",
            )?,
            works: optional_amount(self.works.as_deref(), "works")?,
            holding: self.holding.required()?,
            main_residence: self.main_residence,
        };
        let assessment =
            france::PropertyGains::new(france::PropertyGainsConfig::from_year_tables(tables)?)
                .calculate(&input)?;

        Ok(Report::new("French property gains", &assessment)?
            .jurisdiction(tables.key())
            .amount("gain", assessment.gain)
            .detail("years held", assessment.holding_years)
            .detail("income tax allowance", assessment.income_tax_allowance)
            .detail("social allowance", assessment.social_allowance)
            .result(&assessment.result))
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RegimeArg {
    /// 12.8% flat income tax (PFU)
    FlatTax,
    /// Progressive scale after the holding-period allowance
    Progressive,
}

impl RegimeArg {
    fn label(self) -> &'static str {
        match self {
            Self::FlatTax => "flat tax",
            Self::Progressive => "progressive",
        }
    }
}

impl From<RegimeArg> for france::SecuritiesRegime {
    fn from(arg: RegimeArg) -> Self {
        match arg {
            RegimeArg::FlatTax => Self::FlatTax,
            RegimeArg::Progressive => Self::Progressive,
        }
    }
}

#[derive(Debug, Args)]
pub struct FrSecuritiesArgs {
    /// Net gain; negative for a loss
    #[arg(long, value_parser = amount_arg, allow_hyphen_values = true)]
    pub gain: Decimal,

    /// Taxation option for the gain
    #[arg(long, value_enum, default_value_t = RegimeArg::FlatTax)]
    pub regime: RegimeArg,

    #[command(flatten)]
    pub holding: HoldingArgs,

    /// Household marginal rate, for the progressive option
    #[arg(long, value_parser = percent_arg)]
    pub marginal_rate: Option<Percent>,
}

impl FrSecuritiesArgs {
    fn run(
        &self,
        ctx: &Context,
    ) -> Result<Report> {
        let tables = ctx.tables(Country::France)?;
        let regime = france::SecuritiesRegime::from(self.regime);
        let result =
            france::SecuritiesGains::new(france::SecuritiesConfig::from_year_tables(tables)?)
                .calculate(&france::SecuritiesInput {
                    gain: self.gain,
                    regime,
                    holding: self.holding.holding()?,
                    marginal_rate: self.marginal_rate,
                })?;

        Ok(Report::new("French securities gains", &result)?
            .jurisdiction(tables.key())
            .detail("regime", self.regime.label())
            .result(&result))
    }
}

// ─── Germany ─────────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DeIncomeArgs {
    /// Taxable income (zu versteuerndes Einkommen)
    #[arg(long, value_parser = amount_arg)]
    pub income: Decimal,

    /// Married couple assessed jointly
    #[arg(long)]
    pub joint: bool,

    /// Church tax rate, 8 or 9
    #[arg(long, value_parser = percent_arg)]
    pub church_tax: Option<Percent>,
}

impl DeIncomeArgs {
    fn run(
        &self,
        ctx: &Context,
    ) -> Result<Report> {
        let tables = ctx.tables(Country::Germany)?;
        let result =
            germany::GermanIncomeTax::new(germany::IncomeTaxConfig::from_year_tables(tables)?)
                .calculate(&germany::IncomeTaxInput {
                    taxable_income: self.income,
                    joint_assessment: self.joint,
                    church_tax_rate: self.church_tax.or(ctx.settings.germany.church_tax_rate),
                })?;

        Ok(Report::new("German income tax", &result)?
            .jurisdiction(tables.key())
            .detail("joint assessment", yes_no(self.joint))
            .result(&result))
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum AssetArg {
    Securities,
    RealEstate,
}

impl From<AssetArg> for germany::GermanAsset {
    fn from(arg: AssetArg) -> Self {
        match arg {
            AssetArg::Securities => Self::Securities,
            AssetArg::RealEstate => Self::RealEstate,
        }
    }
}

#[derive(Debug, Args)]
pub struct DeCapitalGainsArgs {
    /// Kind of asset sold
    #[arg(long, value_enum)]
    pub asset: AssetArg,

    /// Sale proceeds minus acquisition cost; negative for a loss
    #[arg(long, value_parser = amount_arg, allow_hyphen_values = true)]
    pub gain: Decimal,

    /// Unused saver allowance to offset against a securities gain
    #[arg(long)]
    pub saver_allowance: Option<String>,

    /// Church tax rate, 8 or 9
    #[arg(long, value_parser = percent_arg)]
    pub church_tax: Option<Percent>,

    #[command(flatten)]
    pub holding: HoldingArgs,

    /// Real estate lived in by the seller
    #[arg(long)]
    pub owner_occupied: bool,

    /// Personal marginal income tax rate, for taxable real estate
    #[arg(long, value_parser = percent_arg)]
    pub marginal_rate: Option<Percent>,
}

impl DeCapitalGainsArgs {
    fn run(
        &self,
        ctx: &Context,
    ) -> Result<Report> {
        let tables = ctx.tables(Country::Germany)?;
        let result = germany::GermanCapitalGains::new(
            germany::CapitalGainsConfig::from_year_tables(tables)?,
        )
        .calculate(&germany::CapitalGainsInput {
            asset: self.asset.into(),
            gain: self.gain,
            saver_allowance: optional_amount(self.saver_allowance.as_deref(), "saver-allowance")?,
            church_tax_rate: self.church_tax.or(ctx.settings.germany.church_tax_rate),
            holding: self.holding.holding()?,
            owner_occupied: self.owner_occupied,
            marginal_rate: self.marginal_rate,
        })?;

        Ok(Report::new("German capital gains", &result)?
            .jurisdiction(tables.key())
            .result(&result))
    }
}

#[derive(Debug, Args)]
pub struct DeInheritanceArgs {
    /// Value received after debts and funeral costs
    #[arg(long, value_parser = amount_arg)]
    pub value: Decimal,

    /// Recipient's relationship, e.g. child, sibling, other
    #[arg(long, value_parser = relationship_arg)]
    pub relationship: germany::Relationship,

    /// A lifetime gift rather than an inheritance
    #[arg(long)]
    pub gift: bool,

    /// Gifts from the same person within the last ten years
    #[arg(long)]
    pub prior_gifts: Option<String>,
}

impl DeInheritanceArgs {
    fn run(
        &self,
        ctx: &Context,
    ) -> Result<Report> {
        let tables = ctx.tables(Country::Germany)?;
        let kind = if self.gift {
            germany::TransferKind::Gift
        } else {
            germany::TransferKind::Inheritance
        };
        let assessment =
            germany::InheritanceTax::new(germany::InheritanceConfig::from_year_tables(tables)?)
                .calculate(&germany::InheritanceInput {
                    value: self.value,
                    relationship: self.relationship,
                    kind,
                    prior_gifts: optional_amount(self.prior_gifts.as_deref(), "prior-gifts")?,
                })?;

        let tax_class = assessment
            .tax_class
            .map_or_else(|| "none".to_string(), |class| format!("{class:?}"));
        Ok(Report::new("German inheritance tax", &assessment)?
            .jurisdiction(tables.key())
            .detail("relationship", self.relationship)
            .detail("tax class", tax_class)
            .amount("allowance", assessment.allowance)
            .result(&assessment.result))
    }
}

#[derive(Debug, Args)]
pub struct DeTradeTaxArgs {
    /// Trade profit; negative for a loss
    #[arg(long, value_parser = amount_arg, allow_hyphen_values = true)]
    pub profit: Decimal,

    /// sole-proprietor, partnership or corporation
    #[arg(long, value_parser = legal_form_arg)]
    pub legal_form: germany::LegalForm,

    #[command(flatten)]
    pub municipality: MunicipalityArgs,

    /// Additions (Hinzurechnungen)
    #[arg(long)]
    pub additions: Option<String>,

    /// Deductions (Kürzungen)
    #[arg(long)]
    pub deductions: Option<String>,
}

impl DeTradeTaxArgs {
    fn run(
        &self,
        ctx: &Context,
    ) -> Result<Report> {
        let tables = ctx.tables(Country::Germany)?;
        let assessment = germany::TradeTax::new(germany::TradeTaxConfig::from_year_tables(tables)?)
            .calculate(&germany::TradeTaxInput {
                profit: self.profit,
                legal_form: self.legal_form,
                multiplier: self.municipality.resolve(&ctx.settings)?,
                additions: optional_amount(self.additions.as_deref(), "additions")?,
                deductions: optional_amount(self.deductions.as_deref(), "deductions")?,
            })?;

        Ok(Report::new("German trade tax", &assessment)?
            .jurisdiction(tables.key())
            .detail("legal form", assessment.legal_form)
            .amount("trade income", assessment.trade_income)
            .amount("allowance", assessment.allowance)
            .amount("base amount", assessment.base_amount)
            .detail("multiplier", assessment.multiplier)
            .amount("income tax credit", assessment.income_tax_credit)
            .result(&assessment.result))
    }
}

#[derive(Debug, Args)]
pub struct DePropertyTaxArgs {
    /// Assessed value (Grundsteuerwert)
    #[arg(long, value_parser = amount_arg)]
    pub assessed_value: Decimal,

    /// Commercial or other non-residential property
    #[arg(long)]
    pub non_residential: bool,

    #[command(flatten)]
    pub municipality: MunicipalityArgs,
}

impl DePropertyTaxArgs {
    fn run(
        &self,
        ctx: &Context,
    ) -> Result<Report> {
        let tables = ctx.tables(Country::Germany)?;
        let property_use = if self.non_residential {
            germany::PropertyUse::NonResidential
        } else {
            germany::PropertyUse::Residential
        };
        let result =
            germany::PropertyTax::new(germany::PropertyTaxConfig::from_year_tables(tables)?)
                .calculate(&germany::PropertyTaxInput {
                    assessed_value: self.assessed_value,
                    property_use,
                    multiplier: self.municipality.resolve(&ctx.settings)?,
                })?;

        Ok(Report::new("German property tax", &result)?
            .jurisdiction(tables.key())
            .detail("residential", yes_no(!self.non_residential))
            .result(&result))
    }
}

// ─── Italy ───────────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ItIrpefArgs {
    /// Taxable income for the year
    #[arg(long, value_parser = amount_arg)]
    pub income: Decimal,

    /// Addizionale regionale in percent
    #[arg(long, value_parser = percent_arg)]
    pub regional_surcharge: Option<Percent>,

    /// Addizionale comunale in percent
    #[arg(long, value_parser = percent_arg)]
    pub municipal_surcharge: Option<Percent>,
}

impl ItIrpefArgs {
    fn run(
        &self,
        ctx: &Context,
    ) -> Result<Report> {
        let tables = ctx.tables(Country::Italy)?;
        let defaults = &ctx.settings.italy;
        let result = italy::Irpef::new(italy::IrpefConfig::from_year_tables(tables)?).calculate(
            &italy::IrpefInput {
                taxable_income: self.income,
                regional_surcharge: self.regional_surcharge.or(defaults.regional_surcharge),
                municipal_surcharge: self.municipal_surcharge.or(defaults.municipal_surcharge),
            },
        )?;

        Ok(Report::new("Italian IRPEF", &result)?
            .jurisdiction(tables.key())
            .result(&result))
    }
}

#[derive(Debug, Args)]
pub struct ItImuArgs {
    /// Rendita catastale
    #[arg(long, value_parser = amount_arg)]
    pub cadastral_income: Decimal,

    /// Cadastral category, e.g. A/2
    #[arg(long)]
    pub category: String,

    /// Rate set by the municipality
    #[arg(long, value_parser = percent_arg)]
    pub municipal_rate: Option<Percent>,

    /// Ownership share in percent
    #[arg(long, value_parser = percent_arg)]
    pub share: Option<Percent>,

    /// Months of ownership in the year
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=12))]
    pub months: Option<u32>,

    /// Main residence; exempt unless the category is a luxury one
    #[arg(long)]
    pub main_residence: bool,
}

impl ItImuArgs {
    fn run(
        &self,
        ctx: &Context,
    ) -> Result<Report> {
        let tables = ctx.tables(Country::Italy)?;
        let assessment = italy::Imu::new(italy::ImuConfig::from_year_tables(tables)?).calculate(
            &italy::ImuInput {
                cadastral_income: self.cadastral_income,
                category: self.category.clone(),
                municipal_rate: self.municipal_rate,
                ownership_share: self.share,
                months: self.months,
                main_residence: self.main_residence,
            },
        )?;

        Ok(Report::new("Italian IMU", &assessment)?
            .jurisdiction(tables.key())
            .detail("coefficient", assessment.coefficient.normalize())
            .amount("taxable value", assessment.taxable_value)
            .detail("rate", assessment.rate)
            .result(&assessment.result))
    }
}

// ─── United Kingdom ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct UkIncomeArgs {
    /// Total income before the personal allowance
    #[arg(long, value_parser = amount_arg)]
    pub income: Decimal,

    /// Earnings subject to National Insurance; defaults to all income
    #[arg(long)]
    pub employment_income: Option<String>,
}

impl UkIncomeArgs {
    fn run(
        &self,
        ctx: &Context,
    ) -> Result<Report> {
        let tables = ctx.tables(Country::UnitedKingdom)?;
        let assessment = uk::UkIncomeTax::new(uk::IncomeTaxConfig::from_year_tables(tables)?)
            .calculate(&uk::IncomeTaxInput {
                gross_income: self.income,
                employment_income: optional_amount(
                    self.employment_income.as_deref(),
                    "employment-income",
                )?,
            })?;

        Ok(Report::new("UK income tax", &assessment)?
            .jurisdiction(tables.key())
            .amount("personal allowance", assessment.personal_allowance)
            .amount("taxable income", assessment.taxable_income)
            .detail("marginal rate", assessment.marginal_rate)
            .result(&assessment.result))
    }
}

#[derive(Debug, Args)]
pub struct UkCapitalGainsArgs {
    /// Total gains for the year; negative for a net loss
    #[arg(long, value_parser = amount_arg, allow_hyphen_values = true)]
    pub gain: Decimal,

    /// Income after the personal allowance, which decides the rate band
    #[arg(long)]
    pub taxable_income: Option<String>,

    /// The gain is on residential property
    #[arg(long)]
    pub residential: bool,
}

impl UkCapitalGainsArgs {
    fn run(
        &self,
        ctx: &Context,
    ) -> Result<Report> {
        let tables = ctx.tables(Country::UnitedKingdom)?;
        let result = uk::UkCapitalGains::new(uk::CapitalGainsConfig::from_year_tables(tables)?)
            .calculate(&uk::CapitalGainsInput {
                gain: self.gain,
                taxable_income: optional_amount(
                    self.taxable_income.as_deref(),
                    "taxable-income",
                )?,
                residential_property: self.residential,
            })?;

        Ok(Report::new("UK capital gains tax", &result)?
            .jurisdiction(tables.key())
            .result(&result))
    }
}

#[derive(Debug, Args)]
pub struct UkStampDutyArgs {
    /// Purchase price of the property
    #[arg(long, value_parser = amount_arg)]
    pub price: Decimal,

    /// Every buyer is buying a first home
    #[arg(long)]
    pub first_time_buyer: bool,

    /// The buyer will own more than one dwelling
    #[arg(long, conflicts_with = "first_time_buyer")]
    pub additional_property: bool,
}

impl UkStampDutyArgs {
    fn run(
        &self,
        ctx: &Context,
    ) -> Result<Report> {
        let tables = ctx.tables(Country::UnitedKingdom)?;
        let assessment = uk::StampDuty::new(uk::StampDutyConfig::from_year_tables(tables)?)
            .calculate(&uk::StampDutyInput {
                price: self.price,
                first_time_buyer: self.first_time_buyer,
                additional_property: self.additional_property,
            })?;

        Ok(Report::new("UK stamp duty", &assessment)?
            .jurisdiction(tables.key())
            .detail("first-time buyer relief", yes_no(assessment.first_time_buyer_relief))
            .detail("surcharge", yes_no(assessment.surcharge_applied))
            .result(&assessment.result))
    }
}

// ─── primitives ──────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct MultiplierArgs {
    /// Amount the base rate applies to
    #[arg(long, value_parser = amount_arg)]
    pub base: Decimal,

    /// Base rate in percent, e.g. 3.5
    #[arg(long, value_parser = percent_arg)]
    pub base_rate: Percent,

    /// Multiplier in percent, e.g. 490
    #[arg(long, value_parser = percent_arg)]
    pub multiplier: Percent,
}

#[derive(Debug, Serialize)]
struct MultiplierOutcome {
    base: Decimal,
    spec: MultiplierSpec,
    effective_rate: Percent,
    tax: Decimal,
}

impl MultiplierArgs {
    fn run(&self) -> Result<Report> {
        let spec = MultiplierSpec::new(self.base_rate, self.multiplier);
        spec.validate()?;
        let outcome = MultiplierOutcome {
            base: self.base,
            spec,
            effective_rate: spec.effective_rate(),
            tax: round_half_up(spec.apply(self.base)),
        };

        Ok(Report::new("Multiplier composition", &outcome)?
            .amount("base", outcome.base)
            .detail("base rate", spec.base_rate)
            .detail("multiplier", spec.multiplier)
            .detail("effective rate", outcome.effective_rate)
            .amount("tax", outcome.tax))
    }
}

#[derive(Debug, Args)]
pub struct BracketsArgs {
    /// Country whose tables hold the schedule (FR, DE, IT, UK)
    #[arg(long, value_parser = country_arg)]
    pub country: Country,

    /// Schedule name, e.g. income_tax; lists the schedules when omitted
    #[arg(long)]
    pub schedule: Option<String>,

    /// Amount to run through the schedule
    #[arg(long, value_parser = amount_arg)]
    pub amount: Option<Decimal>,
}

#[derive(Debug, Serialize)]
struct BracketsOutcome<'a> {
    schedule: &'a str,
    brackets: &'a BracketTable,
    amount: Option<Decimal>,
    tax: Option<Decimal>,
    marginal_rate: Option<Percent>,
}

impl BracketsArgs {
    fn run(
        &self,
        ctx: &Context,
    ) -> Result<Report> {
        let tables = ctx.tables(self.country)?;
        let Some(schedule) = self.schedule.as_deref() else {
            return list_schedules(tables);
        };

        let table = tables.bracket_table(schedule)?;
        let outcome = BracketsOutcome {
            schedule,
            brackets: table,
            amount: self.amount,
            tax: self
                .amount
                .map(|amount| round_half_up(compute_bracket_tax(amount, table.brackets()))),
            marginal_rate: self.amount.map(|amount| marginal_rate(amount, table.brackets())),
        };

        let mut report = Report::new(format!("Brackets: {schedule}"), &outcome)?
            .jurisdiction(tables.key());
        for bracket in table.brackets() {
            let band = match bracket.upper_bound {
                Some(upper) => format!("{} to {}", bracket.lower_bound.normalize(), upper.normalize()),
                None => format!("above {}", bracket.lower_bound.normalize()),
            };
            report = report.detail(band, bracket.rate);
        }
        if let (Some(amount), Some(tax), Some(rate)) =
            (outcome.amount, outcome.tax, outcome.marginal_rate)
        {
            report = report
                .amount("amount", amount)
                .amount("tax", tax)
                .detail("marginal rate", rate);
        }
        Ok(report)
    }
}

fn list_schedules(tables: &YearTables) -> Result<Report> {
    let names: Vec<&String> = tables.brackets.keys().collect();
    let mut report = Report::new("Bracket schedules", &names)?.jurisdiction(tables.key());
    for (name, table) in &tables.brackets {
        report = report.detail(name.as_str(), format!("{} bands", table.len()));
    }
    Ok(report)
}
