use serde::{Deserialize, Serialize};
use url::Url;

use crate::Job;

/// Identity of the target application on the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppIdentity {
    pub package: String,
    /// Scheme of the app's send deep link (`whatsapp://send`).
    pub deep_link_base: String,
    /// Suffix appended to bare digits to address a chat directly.
    pub jid_suffix: String,
}

impl Default for AppIdentity {
    fn default() -> Self {
        Self::whatsapp()
    }
}

impl AppIdentity {
    pub fn whatsapp() -> Self {
        Self {
            package: "com.whatsapp".to_string(),
            deep_link_base: "whatsapp://send".to_string(),
            jid_suffix: "@s.whatsapp.net".to_string(),
        }
    }
}

/// How the host should open the target application for a recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchIntent {
    /// Text-only: a view intent on the app's send deep link.
    View { uri: Url },
    /// With media: a share intent addressed at the recipient's chat id.
    Share {
        jid: String,
        text: String,
        attachments: Vec<Url>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchRequest {
    pub package: String,
    pub recipient: String,
    pub message_text: String,
    pub attachments: Vec<Url>,
    pub intent: LaunchIntent,
}

impl LaunchRequest {
    /// Builds the launch for one recipient of `job`. Fails only when the
    /// configured deep-link base is not a valid URL.
    pub fn for_recipient(
        identity: &AppIdentity,
        job: &Job,
        recipient: &str,
    ) -> Result<Self, url::ParseError> {
        let intent = if job.attachments().is_empty() {
            LaunchIntent::View {
                uri: Url::parse_with_params(
                    &identity.deep_link_base,
                    &[("phone", recipient), ("text", job.message_text())],
                )?,
            }
        } else {
            let digits: String = recipient.chars().filter(char::is_ascii_digit).collect();
            LaunchIntent::Share {
                jid: format!("{digits}{}", identity.jid_suffix),
                text: job.message_text().to_string(),
                attachments: job.attachments().to_vec(),
            }
        };
        Ok(Self {
            package: identity.package.clone(),
            recipient: recipient.to_string(),
            message_text: job.message_text().to_string(),
            attachments: job.attachments().to_vec(),
            intent,
        })
    }
}
