use std::collections::BTreeMap;
use std::io::Read;

use mei_core::calculations::{BracketTable, BracketTableBuilder, BracketTableError};
use mei_core::{Annex, AnnexRate, AnnexTable, BracketConfig};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BracketLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("tax year {year}: unknown annex '{annex}', expected one of I, III, V")]
    UnknownAnnex { year: i32, annex: String },

    #[error("tax year {year}: annex {annex} appears more than once")]
    DuplicateAnnex { year: i32, annex: Annex },

    #[error("tax year {year}: annex {annex} is missing")]
    MissingAnnex { year: i32, annex: Annex },

    #[error("tax year {year}: rows disagree on {field}")]
    InconsistentYear { year: i32, field: &'static str },

    #[error(transparent)]
    Table(#[from] BracketTableError),
}

impl From<csv::Error> for BracketLoaderError {
    fn from(err: csv::Error) -> Self {
        BracketLoaderError::CsvParse(err.to_string())
    }
}

/// One row of a bracket data file. A tax year takes three rows, one per annex,
/// repeating the year-wide minimum wage and revenue ceiling:
///
/// ```text
/// tax_year,minimum_wage,revenue_ceiling,annex,aliquota,deducao
/// 2026,1621.00,81000.00,I,0.04,10.00
/// 2026,1621.00,81000.00,III,0.048,15.50
/// 2026,1621.00,81000.00,V,0.155,31.00
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct BracketRecord {
    pub tax_year: i32,
    pub minimum_wage: Decimal,
    pub revenue_ceiling: Decimal,
    pub annex: String,
    pub aliquota: Decimal,
    pub deducao: Decimal,
}

/// Reads additional tax years from CSV and appends them to a bracket table.
pub struct BracketLoader;

impl BracketLoader {
    pub fn parse<R: Read>(reader: R) -> Result<Vec<BracketRecord>, BracketLoaderError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: BracketRecord = result?;
            records.push(record);
        }

        Ok(records)
    }

    /// Groups rows into one [`BracketConfig`] per year, oldest first.
    ///
    /// Every year must list each of the annexes I, III and V exactly once, and
    /// all of its rows must agree on the minimum wage and ceiling.
    pub fn assemble(records: &[BracketRecord]) -> Result<Vec<BracketConfig>, BracketLoaderError> {
        let mut by_year: BTreeMap<i32, Vec<&BracketRecord>> = BTreeMap::new();
        for record in records {
            by_year.entry(record.tax_year).or_default().push(record);
        }

        by_year
            .into_iter()
            .map(|(year, rows)| assemble_year(year, &rows))
            .collect()
    }

    /// Returns `base` extended with the years in `records`.
    ///
    /// # Errors
    /// A year already in `base` is rejected with
    /// [`BracketTableError::DuplicateYear`]; published years are never
    /// overwritten.
    pub fn load(
        base: &BracketTable,
        records: &[BracketRecord],
    ) -> Result<BracketTable, BracketLoaderError> {
        let configs = Self::assemble(records)?;
        let mut builder = BracketTableBuilder::from_table(base);
        for config in configs {
            let year = config.year;
            builder.append(config)?;
            info!(year, "loaded bracket year");
        }
        Ok(builder.build()?)
    }
}

fn assemble_year(
    year: i32,
    rows: &[&BracketRecord],
) -> Result<BracketConfig, BracketLoaderError> {
    // `rows` is never empty: it comes from grouping at least one record.
    let first = rows[0];
    let mut slots: BTreeMap<Annex, AnnexRate> = BTreeMap::new();

    for row in rows {
        if row.minimum_wage != first.minimum_wage {
            return Err(BracketLoaderError::InconsistentYear {
                year,
                field: "minimum_wage",
            });
        }
        if row.revenue_ceiling != first.revenue_ceiling {
            return Err(BracketLoaderError::InconsistentYear {
                year,
                field: "revenue_ceiling",
            });
        }

        let annex = Annex::parse(&row.annex).ok_or_else(|| BracketLoaderError::UnknownAnnex {
            year,
            annex: row.annex.clone(),
        })?;
        let rate = AnnexRate {
            aliquota: row.aliquota,
            deducao: row.deducao,
        };
        if slots.insert(annex, rate).is_some() {
            return Err(BracketLoaderError::DuplicateAnnex { year, annex });
        }
    }

    let take = |annex: Annex| {
        slots
            .get(&annex)
            .copied()
            .ok_or(BracketLoaderError::MissingAnnex { year, annex })
    };

    Ok(BracketConfig {
        year,
        minimum_wage: first.minimum_wage,
        revenue_ceiling: first.revenue_ceiling,
        annexes: AnnexTable {
            i: take(Annex::I)?,
            iii: take(Annex::III)?,
            v: take(Annex::V)?,
        },
    })
}
