use serde::{Deserialize, Serialize};

/// Opaque handle the host uses to address a node in its live UI tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeHandle(pub String);

impl NodeHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One node of the introspected UI tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiNode {
    pub handle: NodeHandle,
    #[serde(default)]
    pub view_id: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub content_description: Option<String>,
    #[serde(default)]
    pub class_name: Option<String>,
    #[serde(default)]
    pub clickable: bool,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub children: Vec<UiNode>,
}

fn default_true() -> bool {
    true
}

impl UiNode {
    /// A plain, enabled, visible, non-clickable container.
    pub fn new(handle: impl Into<String>) -> Self {
        Self {
            handle: NodeHandle::new(handle),
            view_id: None,
            text: None,
            content_description: None,
            class_name: None,
            clickable: false,
            enabled: true,
            visible: true,
            children: Vec::new(),
        }
    }

    pub fn with_view_id(mut self, view_id: impl Into<String>) -> Self {
        self.view_id = Some(view_id.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.content_description = Some(description.into());
        self
    }

    pub fn clickable(mut self) -> Self {
        self.clickable = true;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn with_child(mut self, child: UiNode) -> Self {
        self.children.push(child);
        self
    }

    /// Enabled, clickable and on screen.
    pub fn is_actionable(&self) -> bool {
        self.clickable && self.enabled && self.visible
    }

    /// Enabled and on screen; clickability is not required (text fields).
    pub fn is_interactable(&self) -> bool {
        self.enabled && self.visible
    }

    /// Depth-first, pre-order walk over this node and its descendants.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }
}

pub struct Descendants<'a> {
    stack: Vec<&'a UiNode>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a UiNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        // Reverse so the leftmost child is visited first.
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// Point-in-time read of the target application's UI tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenSnapshot {
    pub package: String,
    pub root: UiNode,
}

impl ScreenSnapshot {
    pub fn new(package: impl Into<String>, root: UiNode) -> Self {
        Self {
            package: package.into(),
            root,
        }
    }

    pub fn nodes(&self) -> Descendants<'_> {
        self.root.descendants()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScreenKind {
    /// The app is about to open a specific chat (contact picker, FAB prompt).
    RecipientConfirmation,
    /// Attachment staged and waiting for the send confirmation.
    MediaPreview,
    /// Message entry and send control visible.
    ChatThread,
    /// Transient dialog unrelated to the main flow.
    BlockingPopup,
    Unrecognized,
}

/// Stable element keys for one logical control. Lookup order is view id,
/// then exact text, then case-insensitive content description.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlMatcher {
    pub view_ids: Vec<String>,
    pub texts: Vec<String>,
    pub descriptions: Vec<String>,
}

impl ControlMatcher {
    pub fn by_view_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            view_ids: ids.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.view_ids.is_empty() && self.texts.is_empty() && self.descriptions.is_empty()
    }

    /// First node satisfying `accept` in lookup-order precedence.
    pub fn find<'a>(
        &self,
        snapshot: &'a ScreenSnapshot,
        accept: impl Fn(&UiNode) -> bool,
    ) -> Option<&'a UiNode> {
        for id in &self.view_ids {
            if let Some(node) = snapshot
                .nodes()
                .find(|n| n.view_id.as_deref() == Some(id.as_str()) && accept(*n))
            {
                return Some(node);
            }
        }
        for text in &self.texts {
            if let Some(node) = snapshot
                .nodes()
                .find(|n| n.text.as_deref() == Some(text.as_str()) && accept(*n))
            {
                return Some(node);
            }
        }
        for description in &self.descriptions {
            if let Some(node) = snapshot.nodes().find(|n| {
                n.content_description
                    .as_deref()
                    .is_some_and(|d| d.eq_ignore_ascii_case(description))
                    && accept(*n)
            }) {
                return Some(node);
            }
        }
        None
    }

    /// Any matching node, regardless of state.
    pub fn is_present(&self, snapshot: &ScreenSnapshot) -> bool {
        self.find(snapshot, |_| true).is_some()
    }
}

/// Element keys for every control the automation cares about in one
/// version/locale of the target application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenProfile {
    pub send: ControlMatcher,
    pub message_entry: ControlMatcher,
    pub recipient_confirmation: ControlMatcher,
    pub popup_dismiss: ControlMatcher,
    pub back: ControlMatcher,
}

impl Default for ScreenProfile {
    fn default() -> Self {
        Self::whatsapp()
    }
}

impl ScreenProfile {
    pub fn whatsapp() -> Self {
        Self {
            send: ControlMatcher {
                view_ids: vec![
                    "com.whatsapp:id/send".to_string(),
                    "com.whatsapp:id/entry_send".to_string(),
                ],
                texts: vec!["Send".to_string(), "SEND".to_string()],
                descriptions: vec!["Send".to_string(), "Enviar".to_string()],
            },
            message_entry: ControlMatcher::by_view_ids(["com.whatsapp:id/entry"]),
            recipient_confirmation: ControlMatcher {
                view_ids: vec!["com.whatsapp:id/fab".to_string()],
                texts: Vec::new(),
                descriptions: vec!["Continue to chat".to_string()],
            },
            popup_dismiss: ControlMatcher {
                view_ids: vec![
                    "android:id/button2".to_string(),
                    "com.whatsapp:id/cancel".to_string(),
                ],
                texts: vec!["Cancel".to_string(), "CANCEL".to_string(), "Not now".to_string()],
                descriptions: Vec::new(),
            },
            back: ControlMatcher {
                view_ids: vec!["com.whatsapp:id/back".to_string()],
                texts: Vec::new(),
                descriptions: vec!["Navigate up".to_string(), "Back".to_string()],
            },
        }
    }
}
