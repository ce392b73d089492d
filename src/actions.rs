// ============================================================================
// ACTION TABLE — named menu actions → session handlers
// ============================================================================
//
// Handlers never touch the UI. They mutate the session, talk to storage
// through `StorageAccess`, and return a `Redraw` telling the shell what to
// refresh.

use crate::error::EditorError;
use crate::io::{OPEN_FILTER, SAVE_CHOICES, SaveFormat, StorageAccess};
use crate::session::{EditSession, Redraw};

pub type Handler = fn(&mut EditSession, &mut dyn StorageAccess) -> Result<Redraw, EditorError>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    Open,
    Save,
    Grayscale,
}

/// One row of the dispatch table.
pub struct ActionEntry {
    pub action: Action,
    /// Stable identifier used by the CLI and the logs
    pub name: &'static str,
    /// Menu label
    pub label: &'static str,
    pub handler: Handler,
}

pub const ACTIONS: &[ActionEntry] = &[
    ActionEntry { action: Action::Open, name: "open", label: "Open…", handler: open_image },
    ActionEntry { action: Action::Save, name: "save", label: "Save As…", handler: save_image },
    ActionEntry { action: Action::Grayscale, name: "grayscale", label: "Grayscale", handler: grayscale },
];

impl Action {
    pub fn entry(self) -> &'static ActionEntry {
        match self {
            Action::Open => &ACTIONS[0],
            Action::Save => &ACTIONS[1],
            Action::Grayscale => &ACTIONS[2],
        }
    }

    pub fn name(self) -> &'static str {
        self.entry().name
    }

    pub fn label(self) -> &'static str {
        self.entry().label
    }

    pub fn from_name(name: &str) -> Option<Action> {
        ACTIONS
            .iter()
            .find(|e| e.name.eq_ignore_ascii_case(name))
            .map(|e| e.action)
    }
}

/// Run `action` against the session.
pub fn dispatch(
    action: Action,
    session: &mut EditSession,
    storage: &mut dyn StorageAccess,
) -> Result<Redraw, EditorError> {
    log::debug!("Dispatching '{}'", action.name());
    let result = (action.entry().handler)(session, storage);
    if let Err(e) = &result {
        log::error!("Action '{}' failed: {}", action.name(), e);
    }
    result
}

fn open_image(session: &mut EditSession, storage: &mut dyn StorageAccess) -> Result<Redraw, EditorError> {
    match storage.open_file_picker(&OPEN_FILTER)? {
        Some(reader) => session.open(reader),
        None => Ok(Redraw::None),
    }
}

fn save_image(session: &mut EditSession, storage: &mut dyn StorageAccess) -> Result<Redraw, EditorError> {
    // No image: don't even show the dialog.
    if !session.store().has_image() {
        return Ok(Redraw::None);
    }
    let Some(mut target) = storage.save_file_picker(SaveFormat::Png.extension(), SAVE_CHOICES)? else {
        return Ok(Redraw::None);
    };
    let format = SaveFormat::from_path(&target.path);
    session.save(&mut *target.writer, format)?;
    Ok(Redraw::None)
}

fn grayscale(session: &mut EditSession, _storage: &mut dyn StorageAccess) -> Result<Redraw, EditorError> {
    Ok(session.apply_grayscale())
}
