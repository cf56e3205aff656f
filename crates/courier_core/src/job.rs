use thiserror::Error;
use url::Url;

use crate::phone::{normalize, NumberPolicy};

pub type JobId = u64;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JobError {
    #[error("invalid attachment uri {uri:?}: {reason}")]
    InvalidAttachment { uri: String, reason: String },
}

/// One broadcast request. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    recipients: Vec<String>,
    message_text: String,
    attachments: Vec<Url>,
}

impl Job {
    /// Normalizes and deduplicates `raw_numbers` (first occurrence wins) and
    /// parses the attachment URIs. Numbers that cannot be normalized are
    /// dropped.
    pub fn new<S: AsRef<str>>(
        raw_numbers: &[S],
        message_text: impl Into<String>,
        attachment_uris: &[S],
        policy: &NumberPolicy,
    ) -> Result<Self, JobError> {
        let mut recipients: Vec<String> = Vec::with_capacity(raw_numbers.len());
        for raw in raw_numbers {
            if let Some(number) = normalize(raw.as_ref(), policy) {
                if !recipients.contains(&number) {
                    recipients.push(number);
                }
            }
        }

        let attachments = attachment_uris
            .iter()
            .map(|uri| {
                let uri = uri.as_ref();
                Url::parse(uri).map_err(|err| JobError::InvalidAttachment {
                    uri: uri.to_string(),
                    reason: err.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            recipients,
            message_text: message_text.into(),
            attachments,
        })
    }

    pub fn recipients(&self) -> &[String] {
        &self.recipients
    }

    pub fn message_text(&self) -> &str {
        &self.message_text
    }

    pub fn attachments(&self) -> &[Url] {
        &self.attachments
    }
}
