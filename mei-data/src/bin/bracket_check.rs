use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use mei_core::Annex;
use mei_core::calculations::{BracketTable, DasCalculator};
use mei_data::BracketLoader;
use rust_decimal::Decimal;

/// Validate a bracket data file against the built-in table before deploying it.
///
/// The CSV file should have the following columns:
/// - tax_year: The tax year (e.g., 2026)
/// - minimum_wage: National minimum wage for that year
/// - revenue_ceiling: Annual MEI revenue ceiling
/// - annex: Simples Nacional annex (I, III or V)
/// - aliquota: Nominal rate as a fraction (e.g., 0.048)
/// - deducao: Fixed deduction in reais
#[derive(Parser, Debug)]
#[command(name = "mei-bracket-check")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the CSV file with the new tax years
    #[arg(short, long)]
    file: PathBuf,

    /// Also compute the DAS for this monthly revenue in every loaded year
    #[arg(short, long)]
    revenue: Option<Decimal>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let file = File::open(&args.file)
        .with_context(|| format!("Failed to open: {}", args.file.display()))?;

    let records = BracketLoader::parse(file)
        .with_context(|| format!("Failed to parse CSV: {}", args.file.display()))?;

    println!("Parsed {} records from CSV", records.len());

    let table = BracketLoader::load(BracketTable::builtin(), &records)
        .context("Bracket data does not extend the built-in table")?;

    println!("Table is valid. Known years: {:?}", table.years());

    for config in BracketLoader::assemble(&records)? {
        println!(
            "{}: minimum wage {}, ceiling {}",
            config.year, config.minimum_wage, config.revenue_ceiling
        );
        for &annex in Annex::all() {
            let rate = config.annexes.get(annex);
            println!("  annex {annex:<3} aliquota {} deducao {}", rate.aliquota, rate.deducao);
        }

        if let Some(revenue) = args.revenue {
            let calculator = DasCalculator::new(&table);
            for &annex in Annex::all() {
                let result = calculator
                    .compute(revenue, annex, config.year)
                    .with_context(|| format!("Failed to compute DAS for {revenue}"))?;
                println!(
                    "  DAS on {revenue} under annex {annex}: {} (effective {})",
                    result.tax_due, result.effective_rate
                );
            }
        }
    }

    Ok(())
}
