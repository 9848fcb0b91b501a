// src/query.rs

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::process::{date_parser::from_date32, utils};
use crate::processor::Strategy;
use crate::schema::HousingTable;

/// Monthly averages for one town.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TownMonth {
    pub month: NaiveDate,
    pub resale_price: f64,
    pub price_per_sqm: f64,
    /// `None` when no transaction that month has a known lease.
    pub lease_remaining: Option<f64>,
}

/// Median price per square metre for one (town, flat type) pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapCell {
    pub town: String,
    pub flat_type: String,
    pub price_per_sqm_median: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub rows: usize,
    pub towns: usize,
    pub flat_types: usize,
    pub first_month: Option<NaiveDate>,
    pub last_month: Option<NaiveDate>,
    /// Which load strategy produced the table.
    pub source: Option<Strategy>,
}

pub fn list_towns(table: &HousingTable) -> Vec<String> {
    let c = table.columns();
    let towns: BTreeSet<&str> = (0..table.num_rows()).filter_map(|i| c.town_at(i)).collect();
    towns.into_iter().map(str::to_string).collect()
}

pub fn list_flat_types(table: &HousingTable) -> Vec<String> {
    let c = table.columns();
    let types: BTreeSet<&str> = (0..table.num_rows())
        .filter_map(|i| c.flat_type_at(i))
        .collect();
    types.into_iter().map(str::to_string).collect()
}

#[derive(Default)]
struct MonthAcc {
    resale_price: Vec<f64>,
    price_per_sqm: Vec<f64>,
    lease_remaining: Vec<f64>,
}

/// Per-month means for `town` (matched after title-casing), oldest first.
/// Rows without a month are left out.
pub fn town_series(table: &HousingTable, town: &str) -> Vec<TownMonth> {
    let target = utils::title_case(town);
    let c = table.columns();

    let mut by_month: BTreeMap<i32, MonthAcc> = BTreeMap::new();
    for i in 0..table.num_rows() {
        if c.town_at(i) != Some(target.as_str()) {
            continue;
        }
        let Some(month) = c.month_at(i) else {
            continue;
        };
        let acc = by_month.entry(month).or_default();
        acc.resale_price.push(c.resale_price.value(i));
        acc.price_per_sqm.push(c.price_per_sqm.value(i));
        if let Some(lease) = c.lease_remaining_at(i) {
            acc.lease_remaining.push(lease as f64);
        }
    }

    by_month
        .into_iter()
        .filter_map(|(month, acc)| {
            Some(TownMonth {
                month: from_date32(month)?,
                resale_price: utils::mean(&acc.resale_price)?,
                price_per_sqm: utils::mean(&acc.price_per_sqm)?,
                lease_remaining: utils::mean(&acc.lease_remaining),
            })
        })
        .collect()
}

/// Median `price_per_sqm` per (town, flat type), ordered by key. Rows missing
/// either key are left out.
pub fn heatmap(table: &HousingTable) -> Vec<HeatmapCell> {
    let c = table.columns();
    let mut groups: BTreeMap<(&str, &str), Vec<f64>> = BTreeMap::new();
    for i in 0..table.num_rows() {
        if let (Some(town), Some(flat_type)) = (c.town_at(i), c.flat_type_at(i)) {
            groups
                .entry((town, flat_type))
                .or_default()
                .push(c.price_per_sqm.value(i));
        }
    }

    groups
        .into_iter()
        .filter_map(|((town, flat_type), values)| {
            Some(HeatmapCell {
                town: town.to_string(),
                flat_type: flat_type.to_string(),
                price_per_sqm_median: utils::median(&values)?,
            })
        })
        .collect()
}

pub fn summary(table: &HousingTable) -> Summary {
    let c = table.columns();
    let months: BTreeSet<i32> = (0..table.num_rows()).filter_map(|i| c.month_at(i)).collect();
    Summary {
        rows: table.num_rows(),
        towns: list_towns(table).len(),
        flat_types: list_flat_types(table).len(),
        first_month: months.first().copied().and_then(from_date32),
        last_month: months.last().copied().and_then(from_date32),
        source: None,
    }
}
