use serde::Deserialize;
use std::path::PathBuf;

use crate::calendar::{HolidayProvider, HolidayTable, Layered, MexicanCalendar};
use crate::policy::DEFAULT_KPI_DAYS;

const DEFAULT_MAX_BODY_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    /// Business days allowed between milestones before an exception code is required.
    pub kpi_max_business_days: u32,
    /// Optional JSON holiday table layered over the statutory calendar.
    pub holidays_file: Option<PathBuf>,
    pub max_body_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            kpi_max_business_days: DEFAULT_KPI_DAYS,
            holidays_file: None,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            kpi_max_business_days: match std::env::var("KPI_MAX_BUSINESS_DAYS") {
                Ok(raw) => raw.trim().parse().map_err(|_| {
                    anyhow::anyhow!("KPI_MAX_BUSINESS_DAYS must be a non-negative integer")
                })?,
                Err(_) => DEFAULT_KPI_DAYS,
            },
            holidays_file: std::env::var("HOLIDAYS_FILE")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
            max_body_bytes: match std::env::var("MAX_BODY_BYTES") {
                Ok(raw) => raw
                    .trim()
                    .parse()
                    .map_err(|_| anyhow::anyhow!("MAX_BODY_BYTES must be a byte count"))
                    .and_then(|bytes: usize| {
                        if bytes == 0 {
                            anyhow::bail!("MAX_BODY_BYTES cannot be zero");
                        }
                        Ok(bytes)
                    })?,
                Err(_) => DEFAULT_MAX_BODY_BYTES,
            },
        };

        tracing::debug!("Server Port: {}", config.port);
        tracing::debug!("KPI threshold: {} business day(s)", config.kpi_max_business_days);
        if let Some(ref path) = config.holidays_file {
            tracing::info!("Holiday file configured: {}", path.display());
        }

        Ok(config)
    }

    /// Builds the holiday calendar: statutory rules, plus the configured file if any.
    pub fn holiday_provider(&self) -> anyhow::Result<Box<dyn HolidayProvider>> {
        match &self.holidays_file {
            Some(path) => {
                let table = HolidayTable::load(path)?;
                Ok(Box::new(Layered::new(MexicanCalendar, table)))
            }
            None => Ok(Box::new(MexicanCalendar)),
        }
    }
}
