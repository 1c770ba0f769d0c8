//! Address lookups against two SQLite databases.
//!
//! - manual DB: addresses the user typed in, keyed case-insensitively by company name
//! - register DB: a public company register export (`company` table), read-only
//!
//! Lookups go manual first, then register; the interactive prompt stores what
//! the user enters in the manual DB so the next run finds it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;

use crate::address::enrich::AddressLookup;
use crate::db::{open_sqlite, OpenMode};
use crate::models::address::ManualPostalAddress;
use crate::prompt::Prompter;

#[derive(Debug, Error)]
pub enum AddressError {
    #[error("{0} is missing")]
    MissingSetting(&'static str),

    #[error("OpenRegister DB file not found: {0}")]
    RegisterNotFound(PathBuf),

    #[error("Address database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Address prompt failed: {0}")]
    Prompt(String),
}

pub struct AddressResolver {
    manual: SqlitePool,
    register: SqlitePool,
    prompter: Arc<dyn Prompter>,
}

impl AddressResolver {
    /// Opens both databases and makes sure the manual schema exists.
    pub async fn open(
        manual_db_path: Option<&str>,
        register_db_path: Option<&str>,
        prompter: Arc<dyn Prompter>,
    ) -> Result<Self, AddressError> {
        let manual_db_path = non_blank_path(manual_db_path)
            .ok_or(AddressError::MissingSetting("MANUAL_ADDR_DB"))?;
        let register_db_path = non_blank_path(register_db_path)
            .ok_or(AddressError::MissingSetting("OPENREGISTER_DB"))?;

        if !register_db_path.exists() {
            return Err(AddressError::RegisterNotFound(register_db_path));
        }

        let manual = open_sqlite(&manual_db_path, OpenMode::Create).await?;
        let register = open_sqlite(&register_db_path, OpenMode::ReadOnly).await?;

        let resolver = Self {
            manual,
            register,
            prompter,
        };
        resolver.ensure_manual_schema().await?;
        Ok(resolver)
    }

    pub async fn close(self) {
        self.manual.close().await;
        self.register.close().await;
    }

    async fn ensure_manual_schema(&self) -> Result<(), AddressError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS manual_addresses (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                company_name TEXT NOT NULL,
                street TEXT NOT NULL,
                postal_code TEXT NOT NULL,
                city TEXT NOT NULL,
                created_at TEXT DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.manual)
        .await?;

        sqlx::query(
            r#"
            CREATE UNIQUE INDEX IF NOT EXISTS ux_manual_company_name_nocase
            ON manual_addresses(company_name COLLATE NOCASE)
            "#,
        )
        .execute(&self.manual)
        .await?;

        Ok(())
    }

    /// Manual address for `company_name`, matched case-insensitively.
    pub async fn find_manual(
        &self,
        company_name: &str,
    ) -> Result<Option<ManualPostalAddress>, AddressError> {
        let name = company_name.trim();
        if name.is_empty() {
            return Ok(None);
        }

        let row: Option<ManualPostalAddress> = sqlx::query_as(
            r#"
            SELECT street, postal_code, city
            FROM manual_addresses
            WHERE company_name = ? COLLATE NOCASE
            LIMIT 1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.manual)
        .await?;

        Ok(row)
    }

    /// Inserts or updates a manual address. Any blank part makes this a no-op.
    pub async fn save_manual(
        &self,
        company_name: &str,
        street: &str,
        postal_code: &str,
        city: &str,
    ) -> Result<(), AddressError> {
        let (name, street, postal_code, city) =
            (company_name.trim(), street.trim(), postal_code.trim(), city.trim());
        if name.is_empty() || street.is_empty() || postal_code.is_empty() || city.is_empty() {
            return Ok(());
        }

        let updated = sqlx::query(
            r#"
            UPDATE manual_addresses
            SET street      = ?,
                postal_code = ?,
                city        = ?
            WHERE company_name = ? COLLATE NOCASE
            "#,
        )
        .bind(street)
        .bind(postal_code)
        .bind(city)
        .bind(name)
        .execute(&self.manual)
        .await?;

        if updated.rows_affected() == 0 {
            sqlx::query(
                r#"
                INSERT INTO manual_addresses (company_name, street, postal_code, city)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(name)
            .bind(street)
            .bind(postal_code)
            .bind(city)
            .execute(&self.manual)
            .await?;
        }

        info!("Stored manual address for '{name}'");
        Ok(())
    }

    /// Registered address from the company register, verbatim.
    pub async fn find_register(&self, company_name: &str) -> Result<Option<String>, AddressError> {
        let name = company_name.trim();
        if name.is_empty() {
            return Ok(None);
        }

        let address: Option<String> = sqlx::query_scalar(
            r#"
            SELECT registered_address
            FROM company
            WHERE name = ? COLLATE NOCASE
              AND registered_address IS NOT NULL
              AND TRIM(registered_address) != ''
            LIMIT 1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.register)
        .await?;

        Ok(address)
    }

    /// Asks the user for street, postal code and city, stores them and
    /// returns the one-line address. Any blank answer skips.
    pub async fn prompt_and_save(&self, company_name: &str) -> Result<Option<String>, AddressError> {
        let name = company_name.trim().to_string();
        if name.is_empty() {
            return Ok(None);
        }

        let prompter = Arc::clone(&self.prompter);
        let prompt_name = name.clone();
        let answer = tokio::task::spawn_blocking(move || ask_address(prompter.as_ref(), &prompt_name))
            .await
            .map_err(|e| AddressError::Prompt(e.to_string()))?;

        let Some(address) = answer else {
            return Ok(None);
        };

        self.save_manual(&name, &address.street, &address.postal_code, &address.city)
            .await?;
        Ok(Some(address.to_one_line()))
    }
}

fn non_blank_path(path: Option<&str>) -> Option<PathBuf> {
    path.map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| Path::new(p).to_path_buf())
}

fn ask_address(prompter: &dyn Prompter, company_name: &str) -> Option<ManualPostalAddress> {
    prompter.notice("");
    prompter.notice(&format!("Address not found for: {company_name}"));
    prompter.notice("Please enter the address (leave empty to skip).");

    let street = prompter.ask("Street: ")?;
    let postal_code = prompter.ask("Postal code: ")?;
    let city = prompter.ask("City: ")?;

    Some(ManualPostalAddress {
        street,
        postal_code,
        city,
    })
}

#[async_trait]
impl AddressLookup for AddressResolver {
    async fn find_stored(&self, employer: &str) -> Result<Option<String>, AddressError> {
        Ok(self.find_manual(employer).await?.map(|a| a.to_one_line()))
    }

    async fn find_external(&self, employer: &str) -> Result<Option<String>, AddressError> {
        Ok(self
            .find_register(employer)
            .await?
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty()))
    }

    async fn prompt_and_store(&self, employer: &str) -> Result<Option<String>, AddressError> {
        self.prompt_and_save(employer).await
    }
}
