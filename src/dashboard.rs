//! Monthly revenue and expense report

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::fetch::Api;
use crate::resources::Expense;
use crate::sequencing::Product;

const DASHBOARD_PATH: &str = "/dashboard";

/// Inclusive date range a report covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardPeriod {
    #[serde(with = "crate::dates::lenient")]
    pub start_date: NaiveDate,
    #[serde(with = "crate::dates::lenient")]
    pub end_date: NaiveDate,
}

impl DashboardPeriod {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Result<Self> {
        if end_date < start_date {
            return Err(Error::validation("period ends before it starts"));
        }
        Ok(Self {
            start_date,
            end_date,
        })
    }

    /// First to last day of the month containing `date`
    pub fn month_of(date: NaiveDate) -> Self {
        let start_date = date.with_day(1).unwrap_or(date);
        let next_month = if date.month() == 12 {
            NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1)
        };
        let end_date = next_month.and_then(|d| d.pred_opt()).unwrap_or(date);

        Self {
            start_date,
            end_date,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardReport {
    #[serde(default)]
    pub expenses: Vec<Expense>,
    #[serde(default)]
    pub products: Vec<Product>,
    /// Revenue per calendar month, January first
    #[serde(default)]
    pub annual_billing: Vec<f64>,
}

impl DashboardReport {
    pub fn total_expenses(&self) -> f64 {
        self.expenses.iter().map(|e| e.value).sum()
    }

    pub fn total_revenue(&self) -> f64 {
        self.products.iter().map(Product::amount).sum()
    }

    pub fn balance(&self) -> f64 {
        self.total_revenue() - self.total_expenses()
    }

    /// Billing for a month (1 = January); zero when the server sent none
    pub fn billing_for_month(&self, month: u32) -> f64 {
        month
            .checked_sub(1)
            .and_then(|i| self.annual_billing.get(i as usize))
            .copied()
            .unwrap_or(0.0)
    }
}

#[derive(Clone)]
pub struct DashboardClient {
    api: Api,
}

impl DashboardClient {
    pub(crate) fn new(api: Api) -> Self {
        Self { api }
    }

    pub async fn report(&self, period: DashboardPeriod) -> Result<DashboardReport> {
        self.api.put(DASHBOARD_PATH).json(&period)?.execute().await
    }
}
