//! Default accounts created on first start.
//!
//! Seeding is idempotent: an account whose login identifier already exists
//! is left untouched, including its password.

use tracing::info;

use crate::admin::AdminStore;
use crate::db::Database;
use crate::driver::{DriverStore, NewDriver};
use crate::error::StoreResult;
use crate::student::{NewStudent, StudentStore};

const DEFAULT_ADMINS: &[(&str, &str, &str)] = &[
    ("admin", "admin123", "Administrator"),
    ("tceeduride", "tce@2025", "TCE Admin"),
];

/// Identifiers of the accounts a seeding run actually created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub created: Vec<String>,
}

impl SeedReport {
    pub fn is_empty(&self) -> bool {
        self.created.is_empty()
    }
}

/// Create the default admin, student and driver accounts that are missing.
pub async fn seed_defaults(db: &Database) -> StoreResult<SeedReport> {
    let mut report = SeedReport::default();

    let admins = AdminStore::new(db.clone());
    for &(username, password, name) in DEFAULT_ADMINS {
        if admins.get_by_username(username).await?.is_none() {
            admins.create(username, password, name).await?;
            info!(username, "seeded admin account");
            report.created.push(username.to_string());
        }
    }

    let students = StudentStore::new(db.clone());
    if students.get_by_email("student@tce.edu").await?.is_none() {
        students
            .create(NewStudent {
                name: "Test Student".into(),
                email: "student@tce.edu".into(),
                roll_number: "TCE2025001".into(),
                phone: "9876543210".into(),
                password: "student123".into(),
                route_id: None,
            })
            .await?;
        info!(email = "student@tce.edu", "seeded student account");
        report.created.push("student@tce.edu".into());
    }

    let drivers = DriverStore::new(db.clone());
    if drivers.get_by_email("driver@tce.edu").await?.is_none() {
        drivers
            .create(NewDriver {
                name: "Test Driver".into(),
                email: "driver@tce.edu".into(),
                phone: "9876543211".into(),
                license_number: "DL123456789".into(),
                password: "driver123".into(),
                bus_id: None,
            })
            .await?;
        info!(email = "driver@tce.edu", "seeded driver account");
        report.created.push("driver@tce.edu".into());
    }

    Ok(report)
}
