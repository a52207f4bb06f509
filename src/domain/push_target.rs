use crate::domain::errors::PushFailure;
use url::Url;

/// Gateway grouping key: `<base>/metrics/job/<job>/instance/<instance>[/<label>/<value>...]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushTarget {
    base_url: Url,
    job: String,
    instance: String,
    extra_labels: Vec<(String, String)>,
}

impl PushTarget {
    pub fn new(base_url: Url, job: impl Into<String>, instance: impl Into<String>) -> Self {
        Self {
            base_url,
            job: job.into(),
            instance: instance.into(),
            extra_labels: Vec::new(),
        }
    }

    pub fn job(&self) -> &str {
        &self.job
    }

    pub fn instance(&self) -> &str {
        &self.instance
    }

    /// Grouping key scoped to a single unit, so a single-unit payload only
    /// replaces that unit's series on the gateway.
    pub fn for_unit(&self, unit_name: &str) -> Self {
        let mut scoped = self.clone();
        scoped
            .extra_labels
            .push(("service".to_string(), unit_name.to_string()));
        scoped
    }

    /// Build the push URL. Label values are percent-encoded as path segments.
    pub fn endpoint(&self) -> Result<Url, PushFailure> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| PushFailure::InvalidTarget {
                reason: format!("{} cannot be used as a base URL", self.base_url),
            })?;
            segments
                .pop_if_empty()
                .extend([
                    "metrics",
                    "job",
                    self.job.as_str(),
                    "instance",
                    self.instance.as_str(),
                ]);
            for (label, value) in &self.extra_labels {
                segments.extend([label.as_str(), value.as_str()]);
            }
        }
        Ok(url)
    }
}
