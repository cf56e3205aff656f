use crate::{ScreenKind, ScreenProfile, ScreenSnapshot, UiNode};

/// Labels a snapshot with the screen it shows. First matching rule wins.
///
/// A dialog drawn over a chat keeps the entry field in the tree but makes it
/// non-interactable, so a popup only needs the entry to be unusable, not gone.
/// The dismiss control itself must be actionable; a plain "Cancel" label is
/// not a dialog.
pub fn classify(snapshot: &ScreenSnapshot, target_package: &str, profile: &ScreenProfile) -> ScreenKind {
    if snapshot.package != target_package {
        return ScreenKind::Unrecognized;
    }

    let entry_present = profile.message_entry.is_present(snapshot);
    let entry_usable = profile
        .message_entry
        .find(snapshot, |n| n.is_interactable())
        .is_some();

    let dismissable = profile
        .popup_dismiss
        .find(snapshot, UiNode::is_actionable)
        .is_some();

    if dismissable && !entry_usable {
        return ScreenKind::BlockingPopup;
    }
    if profile.send.is_present(snapshot) && !entry_present {
        return ScreenKind::MediaPreview;
    }
    if entry_present {
        return ScreenKind::ChatThread;
    }
    if profile.recipient_confirmation.is_present(snapshot) {
        return ScreenKind::RecipientConfirmation;
    }
    ScreenKind::Unrecognized
}
