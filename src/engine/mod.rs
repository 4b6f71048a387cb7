//! Scrape-job reconciliation.
//!
//! # Invariants
//! - Job names are unique within the document
//! - A target belongs to at most one job
//! - The protected job is never listed, edited or removed
//!
//! Every operation validates fully before touching the document, so a
//! rejected call leaves it exactly as it was.

use std::net::Ipv6Addr;

use thiserror::Error;

use crate::store::{JobSummary, PrometheusDocument, ScrapeConfig};

/// Rejections raised by the engine. All are request-local.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("job '{0}' already exists")]
    DuplicateName(String),

    #[error("target {target} is already scraped by job '{job}'")]
    DuplicateAddress { target: String, job: String },

    #[error("job '{0}' not found")]
    JobNotFound(String),

    #[error("no job found with address matching '{0}'")]
    AddressNotFound(String),
}

/// Pure add/remove/list/search logic over a loaded document.
#[derive(Debug, Clone)]
pub struct ReconcileEngine {
    ports: [u16; 2],
}

impl ReconcileEngine {
    pub fn new(ports: [u16; 2]) -> Self {
        Self { ports }
    }

    /// Build from configured ports, falling back to the defaults when the
    /// list is not exactly two long.
    pub fn from_ports(ports: &[u16]) -> Self {
        match ports {
            [a, b] => Self::new([*a, *b]),
            _ => Self::default(),
        }
    }

    /// The two targets derived from one address.
    pub fn targets_for(&self, address: &str) -> [String; 2] {
        let host = match address.parse::<Ipv6Addr>() {
            Ok(_) => format!("[{}]", address),
            Err(_) => address.to_string(),
        };
        self.ports.map(|port| format!("{}:{}", host, port))
    }

    /// Jobs open to management, in document order.
    pub fn list_jobs(&self, doc: &PrometheusDocument) -> Vec<JobSummary> {
        doc.scrape_configs
            .iter()
            .filter(|job| !job.protected && !job.is_foreign())
            .map(JobSummary::from)
            .collect()
    }

    /// Append a job scraping `address` on both ports.
    pub fn add_job(
        &self,
        doc: &mut PrometheusDocument,
        name: &str,
        address: &str,
    ) -> Result<JobSummary, JobError> {
        let name = name.trim();
        let address = address.trim();
        validate_name(name)?;
        validate_address(address)?;

        if doc.job(name).is_some() {
            return Err(JobError::DuplicateName(name.to_string()));
        }

        let targets = self.targets_for(address);
        for target in &targets {
            if let Some(owner) = doc.owner_of(target) {
                return Err(JobError::DuplicateAddress {
                    target: target.clone(),
                    job: owner.to_string(),
                });
            }
        }

        let job = ScrapeConfig::with_targets(name, targets.to_vec());
        let summary = JobSummary::from(&job);
        doc.scrape_configs.push(job);

        tracing::debug!(job = %name, address = %address, "Job appended");
        Ok(summary)
    }

    /// Remove the first job called `name`. The protected job never matches.
    pub fn remove_job(&self, doc: &mut PrometheusDocument, name: &str) -> Result<String, JobError> {
        let index = doc
            .scrape_configs
            .iter()
            .position(|job| job.job_name == name && !job.protected)
            .ok_or_else(|| JobError::JobNotFound(name.to_string()))?;

        let removed = doc.scrape_configs.remove(index);
        tracing::debug!(job = %removed.job_name, "Job removed");
        Ok(removed.job_name)
    }

    /// Every job, protected one included, with a target containing `needle`.
    pub fn search_by_address(&self, doc: &PrometheusDocument, needle: &str) -> Result<Vec<JobSummary>, JobError> {
        let needle = needle.trim();
        if needle.is_empty() {
            return Err(JobError::InvalidRequest("IP address is required".into()));
        }

        let found: Vec<JobSummary> = doc
            .scrape_configs
            .iter()
            .filter(|job| job.targets().any(|target| target.contains(needle)))
            .map(JobSummary::from)
            .collect();

        if found.is_empty() {
            return Err(JobError::AddressNotFound(needle.to_string()));
        }
        Ok(found)
    }
}

impl Default for ReconcileEngine {
    fn default() -> Self {
        Self::new([26, 27])
    }
}

fn validate_name(name: &str) -> Result<(), JobError> {
    if name.is_empty() {
        return Err(JobError::InvalidRequest("job_name is required".into()));
    }
    if name.chars().any(char::is_whitespace) {
        return Err(JobError::InvalidRequest("job_name must not contain whitespace".into()));
    }
    Ok(())
}

fn validate_address(address: &str) -> Result<(), JobError> {
    if address.is_empty() {
        return Err(JobError::InvalidRequest("ip_address is required".into()));
    }
    if address.chars().any(char::is_whitespace) || address.contains('/') {
        return Err(JobError::InvalidRequest(format!("'{}' is not a host address", address)));
    }
    // A lone colon means a port was supplied; IPv6 literals carry several.
    if address.parse::<Ipv6Addr>().is_err() && address.contains(':') {
        return Err(JobError::InvalidRequest(format!(
            "'{}' must not include a port",
            address
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StaticConfig;

    fn document() -> PrometheusDocument {
        let mut doc: PrometheusDocument = serde_yaml::from_str(
            r#"
scrape_configs:
  - job_name: prometheus
    static_configs:
      - targets: ["localhost:9090"]
  - job_name: edge-1
    static_configs:
      - targets: ["192.168.1.10:26", "192.168.1.10:27"]
  - job_name: probe
    metrics_path: /probe
    static_configs:
      - targets: ["192.168.1.99:9115"]
"#,
        )
        .unwrap();
        doc.mark_protected(None);
        doc
    }

    fn names(jobs: &[JobSummary]) -> Vec<&str> {
        jobs.iter().map(|j| j.job_name.as_str()).collect()
    }

    #[test]
    fn test_list_excludes_protected_and_foreign() {
        let engine = ReconcileEngine::default();
        assert_eq!(names(&engine.list_jobs(&document())), vec!["edge-1"]);
    }

    #[test]
    fn test_list_excludes_plain_first_entry() {
        let engine = ReconcileEngine::default();
        let doc = document();
        assert!(!doc.scrape_configs[0].is_foreign());
        assert!(!names(&engine.list_jobs(&doc)).contains(&"prometheus"));
    }

    #[test]
    fn test_add_then_list() {
        let engine = ReconcileEngine::default();
        let mut doc = document();

        let created = engine.add_job(&mut doc, "n1", "10.0.0.5").unwrap();
        assert_eq!(
            created.static_configs,
            vec![StaticConfig {
                targets: vec!["10.0.0.5:26".into(), "10.0.0.5:27".into()],
                labels: None,
            }]
        );

        let listed = engine.list_jobs(&doc);
        assert_eq!(names(&listed), vec!["edge-1", "n1"]);
        assert_eq!(listed[1].static_configs[0].targets.len(), 2);
        assert_eq!(doc.scrape_configs.last().unwrap().job_name, "n1");
    }

    #[test]
    fn test_add_duplicate_name_leaves_document_unchanged() {
        let engine = ReconcileEngine::default();
        let mut doc = document();
        let before = doc.clone();

        let err = engine.add_job(&mut doc, "edge-1", "10.0.0.9").unwrap_err();
        assert_eq!(err, JobError::DuplicateName("edge-1".into()));
        assert_eq!(doc, before);
    }

    #[test]
    fn test_add_duplicate_name_of_protected_job() {
        let engine = ReconcileEngine::default();
        let mut doc = document();
        let err = engine.add_job(&mut doc, "prometheus", "10.0.0.9").unwrap_err();
        assert!(matches!(err, JobError::DuplicateName(_)));
    }

    #[test]
    fn test_add_duplicate_address_leaves_document_unchanged() {
        let engine = ReconcileEngine::default();
        let mut doc = document();
        let before = doc.clone();

        let err = engine.add_job(&mut doc, "edge-2", "192.168.1.10").unwrap_err();
        assert_eq!(
            err,
            JobError::DuplicateAddress {
                target: "192.168.1.10:26".into(),
                job: "edge-1".into(),
            }
        );
        assert_eq!(doc, before);
    }

    #[test]
    fn test_add_address_prefix_is_not_a_collision() {
        let engine = ReconcileEngine::default();
        let mut doc = document();
        assert!(engine.add_job(&mut doc, "edge-2", "192.168.1.1").is_ok());
    }

    #[test]
    fn test_add_rejects_bad_input() {
        let engine = ReconcileEngine::default();
        let mut doc = document();
        let before = doc.clone();

        for (name, address) in [("", "10.0.0.1"), ("a b", "10.0.0.1"), ("x", ""), ("x", "10.0.0.1:80"), ("x", "10.0.0.0/24")] {
            let err = engine.add_job(&mut doc, name, address).unwrap_err();
            assert!(matches!(err, JobError::InvalidRequest(_)), "{name:?} {address:?}");
        }
        assert_eq!(doc, before);
    }

    #[test]
    fn test_add_ipv6_brackets_targets() {
        let engine = ReconcileEngine::new([9100, 9101]);
        assert_eq!(
            engine.targets_for("fd00::5"),
            ["[fd00::5]:9100".to_string(), "[fd00::5]:9101".to_string()]
        );
        let mut doc = document();
        assert!(engine.add_job(&mut doc, "v6", "fd00::5").is_ok());
    }

    #[test]
    fn test_remove_exactly_one_job() {
        let engine = ReconcileEngine::default();
        let mut doc = document();
        engine.add_job(&mut doc, "n1", "10.0.0.5").unwrap();

        assert_eq!(engine.remove_job(&mut doc, "n1").unwrap(), "n1");
        assert_eq!(names(&engine.list_jobs(&doc)), vec!["edge-1"]);
        assert_eq!(doc.scrape_configs.len(), 3);
    }

    #[test]
    fn test_remove_missing_job() {
        let engine = ReconcileEngine::default();
        let mut doc = document();
        let before = doc.clone();
        assert_eq!(
            engine.remove_job(&mut doc, "ghost").unwrap_err(),
            JobError::JobNotFound("ghost".into())
        );
        assert_eq!(doc, before);
    }

    #[test]
    fn test_remove_never_touches_protected_job() {
        let engine = ReconcileEngine::default();
        let mut doc = document();

        assert!(matches!(engine.remove_job(&mut doc, "prometheus"), Err(JobError::JobNotFound(_))));

        // Shifting indices must not unprotect anything.
        engine.remove_job(&mut doc, "edge-1").unwrap();
        assert!(matches!(engine.remove_job(&mut doc, "prometheus"), Err(JobError::JobNotFound(_))));
        assert_eq!(doc.scrape_configs[0].job_name, "prometheus");
    }

    #[test]
    fn test_search_by_substring() {
        let engine = ReconcileEngine::default();
        let mut doc = document();
        engine.add_job(&mut doc, "j1", "192.168.1.1").unwrap();

        let found = engine.search_by_address(&doc, "192.168.1.1").unwrap();
        assert_eq!(names(&found), vec!["edge-1", "j1"]);

        let exact = engine.search_by_address(&doc, "192.168.1.1:26").unwrap();
        assert_eq!(names(&exact), vec!["j1"]);
    }

    #[test]
    fn test_search_includes_protected_job() {
        let engine = ReconcileEngine::default();
        let found = engine.search_by_address(&document(), "localhost").unwrap();
        assert_eq!(names(&found), vec!["prometheus"]);
    }

    #[test]
    fn test_search_reports_each_job_once() {
        let engine = ReconcileEngine::default();
        let mut doc = document();
        doc.scrape_configs[1].static_configs.push(StaticConfig {
            targets: vec!["192.168.1.10:28".into()],
            labels: None,
        });
        let found = engine.search_by_address(&doc, "192.168.1.10").unwrap();
        assert_eq!(names(&found), vec!["edge-1"]);
    }

    #[test]
    fn test_search_without_match() {
        let engine = ReconcileEngine::default();
        assert_eq!(
            engine.search_by_address(&document(), "172.16.0.1").unwrap_err(),
            JobError::AddressNotFound("172.16.0.1".into())
        );
    }
}
