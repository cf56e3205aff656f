use crate::{ControlMatcher, ScreenKind, ScreenProfile, ScreenSnapshot, UiNode};

/// The one control that advances the flow on a given screen, if that screen
/// has one.
pub fn target_matcher(kind: ScreenKind, profile: &ScreenProfile) -> Option<&ControlMatcher> {
    match kind {
        ScreenKind::RecipientConfirmation => Some(&profile.recipient_confirmation),
        // Media preview reuses the chat screen's send control id.
        ScreenKind::MediaPreview | ScreenKind::ChatThread => Some(&profile.send),
        ScreenKind::BlockingPopup | ScreenKind::Unrecognized => None,
    }
}

/// Looks up the actionable control for `kind`. Always a fresh lookup; nodes
/// are never cached across snapshots.
pub fn resolve<'a>(
    kind: ScreenKind,
    snapshot: &'a ScreenSnapshot,
    profile: &ScreenProfile,
) -> Option<&'a UiNode> {
    target_matcher(kind, profile)?.find(snapshot, UiNode::is_actionable)
}

/// Same lookup as an action without invoking anything. Used for
/// post-conditions such as "has the send control gone away".
pub fn probe(kind: ScreenKind, snapshot: &ScreenSnapshot, profile: &ScreenProfile) -> bool {
    resolve(kind, snapshot, profile).is_some()
}

/// Toolbar/back affordance for the recovery navigation, if one is on screen.
pub fn resolve_back<'a>(snapshot: &'a ScreenSnapshot, profile: &ScreenProfile) -> Option<&'a UiNode> {
    profile.back.find(snapshot, UiNode::is_actionable)
}
