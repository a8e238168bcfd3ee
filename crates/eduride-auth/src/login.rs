//! Credential checks and the login response projections.

use eduride_store::{
    ACTIVE, AdminStore, BusStore, Database, DriverStore, StoreError, StudentStore,
    verify_password_async,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::error::{AuthError, Result};
use crate::token::{Claims, Role, TokenIssuer};

/// `token_type` of every login response.
pub const TOKEN_TYPE: &str = "bearer";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminProfile {
    pub id: i64,
    pub username: String,
    pub name: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentProfile {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub roll_number: String,
    pub phone: String,
    pub route_id: Option<i64>,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverProfile {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub license_number: String,
    pub phone: String,
    /// Bus number of the assigned bus, if any.
    pub bus_assigned: Option<String>,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminLogin {
    pub access_token: String,
    pub token_type: String,
    pub user: AdminProfile,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentLogin {
    pub access_token: String,
    pub token_type: String,
    pub student: StudentProfile,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverLogin {
    pub access_token: String,
    pub token_type: String,
    pub driver: DriverProfile,
}

/// Verifies credentials against the stores and issues tokens.
#[derive(Clone)]
pub struct Authenticator {
    admins: AdminStore,
    students: StudentStore,
    drivers: DriverStore,
    buses: BusStore,
    tokens: TokenIssuer,
}

impl Authenticator {
    pub fn new(db: Database, tokens: TokenIssuer) -> Self {
        Self {
            admins: AdminStore::new(db.clone()),
            students: StudentStore::new(db.clone()),
            drivers: DriverStore::new(db.clone()),
            buses: BusStore::new(db),
            tokens,
        }
    }

    /// Log an admin in by username.
    #[instrument(skip(self, password))]
    pub async fn login_admin(&self, username: &str, password: &str) -> Result<AdminLogin> {
        let (admin, hash) = self.admins.credentials(username).await?.unzip();
        check_password("admin", password, hash).await?;
        let Some(admin) = admin else {
            return Err(rejected("admin"));
        };

        let access_token = self.tokens.issue(Role::Admin, admin.id, &admin.username)?;
        info!(admin_id = admin.id, "admin logged in");
        Ok(AdminLogin {
            access_token,
            token_type: TOKEN_TYPE.to_string(),
            user: AdminProfile {
                id: admin.id,
                username: admin.username,
                name: admin.name,
                role: Role::Admin,
            },
        })
    }

    /// Log a student in by email. Inactive students are refused.
    #[instrument(skip(self, password))]
    pub async fn login_student(&self, email: &str, password: &str) -> Result<StudentLogin> {
        let (student, hash) = self.students.credentials(email).await?.unzip();
        check_password("student", password, hash).await?;
        let Some(student) = student else {
            return Err(rejected("student"));
        };
        if student.status != ACTIVE {
            return Err(rejected("student"));
        }

        let access_token = self
            .tokens
            .issue(Role::Student, student.id, &student.email)?;
        info!(student_id = student.id, "student logged in");
        Ok(StudentLogin {
            access_token,
            token_type: TOKEN_TYPE.to_string(),
            student: StudentProfile {
                id: student.id,
                email: student.email,
                name: student.name,
                roll_number: student.roll_number,
                phone: student.phone,
                route_id: student.route_id,
                role: Role::Student,
            },
        })
    }

    /// Log a driver in by email, resolving the assigned bus number.
    #[instrument(skip(self, password))]
    pub async fn login_driver(&self, email: &str, password: &str) -> Result<DriverLogin> {
        let (driver, hash) = self.drivers.credentials(email).await?.unzip();
        check_password("driver", password, hash).await?;
        let Some(driver) = driver else {
            return Err(rejected("driver"));
        };
        if driver.status != ACTIVE {
            return Err(rejected("driver"));
        }

        let bus_assigned = match driver.bus_id {
            Some(bus_id) => self.buses.get(bus_id).await?.map(|bus| bus.bus_number),
            None => None,
        };

        let access_token = self.tokens.issue(Role::Driver, driver.id, &driver.email)?;
        info!(driver_id = driver.id, "driver logged in");
        Ok(DriverLogin {
            access_token,
            token_type: TOKEN_TYPE.to_string(),
            driver: DriverProfile {
                id: driver.id,
                email: driver.email,
                name: driver.name,
                license_number: driver.license_number,
                phone: driver.phone,
                bus_assigned,
                role: Role::Driver,
            },
        })
    }

    /// Validate a bearer token.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        self.tokens.verify(token)
    }
}

fn rejected(kind: &'static str) -> AuthError {
    warn!(kind, "login rejected");
    AuthError::InvalidCredentials
}

/// Verify off the async workers. An unknown account (`hash = None`) pays
/// for the same derivation as a wrong password and then fails.
async fn check_password(kind: &'static str, password: &str, hash: Option<String>) -> Result<()> {
    match verify_password_async(password.to_string(), hash).await {
        Ok(true) => Ok(()),
        Ok(false) => Err(rejected(kind)),
        Err(StoreError::PasswordHash(e)) => {
            warn!(error = %e, "stored password hash is unreadable");
            Err(AuthError::InvalidCredentials)
        }
        Err(e) => Err(e.into()),
    }
}
