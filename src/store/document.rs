//! Prometheus document model.
//!
//! Only `scrape_configs` is interpreted. Everything else, at the top level and
//! inside each job, is carried as raw YAML so a load/save cycle re-emits it
//! untouched. Optional fields that are absent on input stay absent on output.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_yaml::Mapping;

/// The whole Prometheus configuration file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PrometheusDocument {
    /// Top-level sections this service does not own (`global`, `rule_files`, ...).
    #[serde(flatten)]
    pub settings: Mapping,

    #[serde(default)]
    pub scrape_configs: Vec<ScrapeConfig>,
}

/// One scrape job.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScrapeConfig {
    pub job_name: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub static_configs: Vec<StaticConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scrape_interval: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scrape_timeout: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<IndexMap<String, Vec<String>>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relabel_configs: Option<Vec<RelabelConfig>>,

    /// Keys without a dedicated field (`honor_labels`, `file_sd_configs`, ...).
    #[serde(flatten)]
    pub extra: Mapping,

    /// Set at load time, never persisted.
    #[serde(skip)]
    pub protected: bool,
}

/// A group of static targets.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StaticConfig {
    pub targets: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<IndexMap<String, String>>,
}

/// A relabeling rule. Carried verbatim, never edited.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RelabelConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_labels: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub separator: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modulus: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replacement: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,

    #[serde(flatten)]
    pub extra: Mapping,
}

/// The public view of a job: name and targets only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSummary {
    pub job_name: String,
    pub static_configs: Vec<StaticConfig>,
}

impl From<&ScrapeConfig> for JobSummary {
    fn from(job: &ScrapeConfig) -> Self {
        Self {
            job_name: job.job_name.clone(),
            static_configs: job.static_configs.clone(),
        }
    }
}

fn is_set(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.is_empty())
}

impl ScrapeConfig {
    /// A plain job managed by this service.
    pub fn with_targets(job_name: impl Into<String>, targets: Vec<String>) -> Self {
        Self {
            job_name: job_name.into(),
            static_configs: vec![StaticConfig { targets, labels: None }],
            ..Default::default()
        }
    }

    /// Whether the job carries configuration this service does not manage.
    ///
    /// Such jobs are hidden from listings.
    pub fn is_foreign(&self) -> bool {
        is_set(&self.scrape_interval)
            || is_set(&self.scrape_timeout)
            || is_set(&self.metrics_path)
            || self.params.as_ref().is_some_and(|p| !p.is_empty())
            || self.relabel_configs.as_ref().is_some_and(|r| !r.is_empty())
            || !self.extra.is_empty()
    }

    /// Every target across all static groups.
    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.static_configs
            .iter()
            .flat_map(|group| group.targets.iter().map(String::as_str))
    }
}

impl PrometheusDocument {
    /// Flag the protected job.
    ///
    /// With an explicit name, the job carrying it is protected wherever it
    /// sits. Without one, or when no job carries that name, the first entry
    /// is. Returns the protected job's name.
    pub fn mark_protected(&mut self, explicit: Option<&str>) -> Option<&str> {
        for job in &mut self.scrape_configs {
            job.protected = false;
        }

        let index = explicit
            .and_then(|name| self.scrape_configs.iter().position(|job| job.job_name == name))
            .or_else(|| (!self.scrape_configs.is_empty()).then_some(0))?;
        let protected = &mut self.scrape_configs[index];
        protected.protected = true;
        Some(protected.job_name.as_str())
    }

    /// Look up a job by name.
    pub fn job(&self, name: &str) -> Option<&ScrapeConfig> {
        self.scrape_configs.iter().find(|job| job.job_name == name)
    }

    /// Name of the job already scraping `target`, if any.
    pub fn owner_of(&self, target: &str) -> Option<&str> {
        self.scrape_configs
            .iter()
            .find(|job| job.targets().any(|t| t == target))
            .map(|job| job.job_name.as_str())
    }
}
