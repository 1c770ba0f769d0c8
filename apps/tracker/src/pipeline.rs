//! End-to-end run: mails -> observations -> canonical records -> addresses -> report workbooks.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use tracing::{info, warn};

use crate::address::enrich::{enrich_missing_addresses, EnrichSummary};
use crate::address::resolver::AddressResolver;
use crate::export::{write_report_pages, ReportHeader};
use crate::extraction::{format_email, Extractor};
use crate::mail::{fetch_mails, SearchFilter};
use crate::models::observation::Observation;
use crate::models::record::{CanonicalRecord, DATE_FORMAT};
use crate::prompt::Prompter;
use crate::reconcile::title::{NoTitlePrompt, PromptTitle};
use crate::reconcile::{reconcile, ReconcileOptions};

/// Everything one run needs, resolved from config and CLI flags up front.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub mails_path: PathBuf,
    pub filter: SearchFilter,
    pub reconcile: ReconcileOptions,
    pub interactive: bool,
    pub manual_addr_db: Option<String>,
    pub openregister_db: Option<String>,
    pub template: PathBuf,
    pub report_dir: PathBuf,
    pub json_out: Option<PathBuf>,
    pub agreed_count: Option<u32>,
    pub customer_number: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub mails: usize,
    pub failed_extractions: usize,
    pub records: Vec<CanonicalRecord>,
    pub addresses: Option<EnrichSummary>,
    pub pages: Vec<PathBuf>,
}

pub async fn run(
    options: &RunOptions,
    extractor: &dyn Extractor,
    prompter: Arc<dyn Prompter>,
) -> Result<RunSummary> {
    let mails = fetch_mails(&options.mails_path, &options.filter)?;

    let mut observations = Vec::with_capacity(mails.len());
    for mail in &mails {
        let email_text = format_email(&mail.sender, &mail.subject, &mail.msg_date, &mail.body);
        let observation = extractor
            .extract(&email_text, &mail.subject, mail.received_local())
            .await;
        observations.push(observation);
    }
    let failed_extractions = observations.iter().filter(|o| o.is_empty()).count();
    info!(
        "Extracted {} observations ({} without any fields)",
        observations.len(),
        failed_extractions
    );

    let titles_prompter = options.interactive.then(|| Arc::clone(&prompter));
    let mut records = reconcile_blocking(observations, options.reconcile, titles_prompter).await?;

    let addresses = enrich_addresses(options, &mut records, prompter).await;

    let today = Local::now().date_naive();
    let header = ReportHeader {
        period_start: period_start(options.filter.since, &records, today),
        period_end: today,
        agreed_count: options.agreed_count,
        customer_number: options.customer_number.clone(),
        first_name: options.first_name.clone(),
        last_name: options.last_name.clone(),
    };
    let pages = write_report_pages(
        &options.template,
        &options.report_dir,
        &records,
        &header,
        Local::now().naive_local(),
    )?;

    if let Some(path) = &options.json_out {
        write_records_json(path, &records)?;
    }

    info!(
        "Run finished: {} mails, {} records, {} report pages",
        mails.len(),
        records.len(),
        pages.len()
    );

    Ok(RunSummary {
        mails: mails.len(),
        failed_extractions,
        records,
        addresses,
        pages,
    })
}

/// Runs reconciliation off the async runtime, since the title prompt blocks on stdin.
pub async fn reconcile_blocking(
    observations: Vec<Observation>,
    options: ReconcileOptions,
    prompter: Option<Arc<dyn Prompter>>,
) -> Result<Vec<CanonicalRecord>> {
    tokio::task::spawn_blocking(move || match prompter {
        Some(prompter) => reconcile(&observations, options, &PromptTitle::new(prompter)),
        None => reconcile(&observations, options, &NoTitlePrompt),
    })
    .await
    .context("Reconciliation task failed")
}

async fn enrich_addresses(
    options: &RunOptions,
    records: &mut [CanonicalRecord],
    prompter: Arc<dyn Prompter>,
) -> Option<EnrichSummary> {
    if options.manual_addr_db.is_none() && options.openregister_db.is_none() {
        info!("No address databases configured, skipping address enrichment");
        return None;
    }

    let resolver = match AddressResolver::open(
        options.manual_addr_db.as_deref(),
        options.openregister_db.as_deref(),
        prompter,
    )
    .await
    {
        Ok(resolver) => resolver,
        Err(e) => {
            warn!("Address resolver unavailable, skipping address enrichment: {e}");
            return None;
        }
    };

    let summary = enrich_missing_addresses(records, &resolver, options.interactive).await;
    resolver.close().await;
    Some(summary)
}

/// Report period start: the configured since date, else the earliest first contact, else today.
fn period_start(since: Option<NaiveDate>, records: &[CanonicalRecord], today: NaiveDate) -> NaiveDate {
    since
        .or_else(|| {
            records
                .iter()
                .filter_map(|r| r.first_contact_date.as_deref())
                .filter_map(|d| NaiveDate::parse_from_str(d, DATE_FORMAT).ok())
                .min()
        })
        .unwrap_or(today)
}

pub fn read_observations(path: &Path) -> Result<Vec<Observation>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read observations {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a JSON list of observations", path.display()))
}

pub fn write_records_json(path: &Path, records: &[CanonicalRecord]) -> Result<()> {
    let json = serde_json::to_string_pretty(records)?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write records to {}", path.display()))?;
    info!("Wrote {} records to {}", records.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::tests::write_template;
    use crate::models::observation::Outcome;
    use crate::prompt::ScriptedPrompter;
    use async_trait::async_trait;
    use chrono::NaiveDateTime;
    use std::io::Write;

    /// Pretends to be the model: reads the employer from the subject line.
    struct SubjectExtractor;

    #[async_trait]
    impl Extractor for SubjectExtractor {
        async fn extract(
            &self,
            email_text: &str,
            label: &str,
            received_at: Option<NaiveDateTime>,
        ) -> Observation {
            assert!(email_text.contains(&format!("Subject: {label}")));
            if label.contains("garbled") {
                return Observation::empty(received_at);
            }
            let employer = label.split(" - ").nth(1).map(str::to_string);
            let result = if label.contains("Absage") {
                Some(Outcome::Rejection)
            } else {
                Some(Outcome::InProgress)
            };
            Observation {
                employer_name: employer,
                applied_position: label.contains("Dev").then(|| "Developer".to_string()),
                result,
                observed_at: received_at,
                ..Observation::default()
            }
        }
    }

    fn options(dir: &Path, mails_path: PathBuf) -> RunOptions {
        RunOptions {
            mails_path,
            filter: SearchFilter {
                terms: vec!["bewerbung".to_string()],
                since: None,
            },
            reconcile: ReconcileOptions::default(),
            interactive: false,
            manual_addr_db: None,
            openregister_db: None,
            template: write_template(dir),
            report_dir: dir.join("reports"),
            json_out: Some(dir.join("records.json")),
            agreed_count: None,
            customer_number: None,
            first_name: None,
            last_name: None,
        }
    }

    fn write_mails(dir: &Path) -> PathBuf {
        let path = dir.join("mails.json");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            r#"[
                {{"msg_id": 1, "subject": "Bewerbung Dev - ABC GmbH", "body": "x", "received_at": "2026-01-06T09:00:00Z"}},
                {{"msg_id": 2, "subject": "Newsletter - ABC GmbH", "body": "x", "received_at": "2026-01-07T09:00:00Z"}},
                {{"msg_id": 3, "subject": "Bewerbung Absage - ABC GmbH", "body": "x", "received_at": "2026-01-10T12:00:00Z"}},
                {{"msg_id": 4, "subject": "Bewerbung garbled", "body": "x"}}
            ]"#
        )
        .unwrap();
        path
    }

    #[tokio::test]
    async fn test_run_end_to_end_without_address_dbs() {
        let dir = tempfile::TempDir::new().unwrap();
        let mails_path = write_mails(dir.path());
        let opts = options(dir.path(), mails_path);
        let prompter: Arc<dyn Prompter> = Arc::new(ScriptedPrompter::new(Vec::<String>::new()));

        let summary = run(&opts, &SubjectExtractor, prompter).await.unwrap();

        assert_eq!(summary.mails, 3);
        assert_eq!(summary.failed_extractions, 1);
        assert_eq!(summary.records.len(), 2);
        let abc = &summary.records[0];
        assert_eq!(abc.employer_name.as_deref(), Some("ABC GmbH"));
        assert_eq!(abc.applied_position.as_deref(), Some("Developer"));
        assert_eq!(abc.result, Some(Outcome::Rejection));
        assert!(abc.first_contact_date.is_some());
        assert_eq!(summary.records[1].employer_name, None);
        assert!(summary.addresses.is_none());
        assert_eq!(summary.pages.len(), 1);

        let dumped: Vec<CanonicalRecord> =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join("records.json")).unwrap())
                .unwrap();
        assert_eq!(dumped, summary.records);
    }

    #[tokio::test]
    async fn test_run_skips_enrichment_when_resolver_unavailable() {
        let dir = tempfile::TempDir::new().unwrap();
        let mails_path = write_mails(dir.path());
        let mut opts = options(dir.path(), mails_path);
        opts.manual_addr_db = Some(dir.path().join("manual.db").display().to_string());
        opts.openregister_db = Some(dir.path().join("missing.db").display().to_string());
        let prompter: Arc<dyn Prompter> = Arc::new(ScriptedPrompter::new(Vec::<String>::new()));

        let summary = run(&opts, &SubjectExtractor, prompter).await.unwrap();

        assert!(summary.addresses.is_none());
        assert_eq!(summary.records.len(), 2);
        assert!(summary.records.iter().all(|r| r.postal_address.is_none()));
    }

    #[tokio::test]
    async fn test_reconcile_blocking_uses_prompter_for_titles() {
        let observations = vec![Observation {
            employer_name: Some("ABC GmbH".to_string()),
            ..Observation::default()
        }];
        let prompter: Arc<dyn Prompter> = Arc::new(ScriptedPrompter::new(["Data Engineer"]));

        let records = reconcile_blocking(observations, ReconcileOptions::default(), Some(prompter))
            .await
            .unwrap();

        assert_eq!(records[0].applied_position.as_deref(), Some("Data Engineer"));
    }

    #[test]
    fn test_period_start_fallbacks() {
        let today = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
        let since = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let records = vec![
            CanonicalRecord {
                first_contact_date: Some("10.01.2026".to_string()),
                ..CanonicalRecord::default()
            },
            CanonicalRecord {
                first_contact_date: Some("07.01.2026".to_string()),
                ..CanonicalRecord::default()
            },
            CanonicalRecord {
                first_contact_date: Some("garbage".to_string()),
                ..CanonicalRecord::default()
            },
        ];

        assert_eq!(period_start(Some(since), &records, today), since);
        assert_eq!(
            period_start(None, &records, today),
            NaiveDate::from_ymd_opt(2026, 1, 7).unwrap()
        );
        assert_eq!(period_start(None, &[], today), today);
    }

    #[test]
    fn test_read_observations_roundtrips_dump() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("obs.json");
        std::fs::write(
            &path,
            r#"[{"employer_name": "ABC GmbH", "result": "Absage", "observed_at": "2026-01-10T12:00:00"}, {}]"#,
        )
        .unwrap();

        let observations = read_observations(&path).unwrap();
        assert_eq!(observations.len(), 2);
        assert_eq!(observations[0].result, Some(Outcome::Rejection));
        assert!(observations[1].is_empty());
    }
}
