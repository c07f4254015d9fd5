//! Records managed through the generic resource client

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Resource;
use crate::auth::Role;
use crate::sequencing::Product;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    /// Company registration number
    #[serde(default)]
    pub cnpj: String,
    #[serde(default)]
    pub initials: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    /// Personal taxpayer number
    #[serde(default)]
    pub cpf: String,
    #[serde(default, with = "crate::dates::lenient_option")]
    pub birth_date: Option<NaiveDate>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub value: f64,
    #[serde(with = "crate::dates::lenient")]
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payroll {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(alias = "idEmployee")]
    pub employee_id: String,
    pub salary: f64,
    #[serde(default)]
    pub attendance_award: f64,
    #[serde(default)]
    pub production_award: f64,
    /// Recorded for reference; not part of the amount paid
    #[serde(default)]
    pub overtime: f64,
    #[serde(with = "crate::dates::lenient")]
    pub date: NaiveDate,
}

impl Payroll {
    pub fn salary_to_be_paid(&self) -> f64 {
        self.salary + self.attendance_award + self.production_award
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub expected_quantity: f64,
    #[serde(default)]
    pub current_quantity: f64,
}

impl Goal {
    /// Share of the goal reached; 0 when nothing is expected
    pub fn progress(&self) -> f64 {
        if self.expected_quantity <= 0.0 {
            0.0
        } else {
            self.current_quantity / self.expected_quantity
        }
    }

    pub fn is_met(&self) -> bool {
        self.expected_quantity > 0.0 && self.current_quantity >= self.expected_quantity
    }
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub username: String,
    pub role: Role,
    /// Only sent when creating the account or changing its password
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl std::fmt::Debug for UserAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserAccount")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("role", &self.role)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Resource for Customer {
    const PATH: &'static str = "/customers";
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

impl Resource for Employee {
    const PATH: &'static str = "/employees";
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

impl Resource for Expense {
    const PATH: &'static str = "/expenses";
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

impl Resource for Payroll {
    const PATH: &'static str = "/payrolls";
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

impl Resource for Goal {
    const PATH: &'static str = "/goals";
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

impl Resource for UserAccount {
    const PATH: &'static str = "/users";
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

impl Resource for Product {
    const PATH: &'static str = "/products";
    fn id(&self) -> Option<&str> {
        Some(self.id.as_str()).filter(|id| !id.is_empty())
    }
}
