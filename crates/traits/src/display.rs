//! The display collaborator: selection lookup, focus and scaling.

use folio_types::NodeKey;

/// What the engine needs from the window that shows it.
pub trait DisplayHost {
    /// How many times the drawable with this key is currently selected.
    fn selected(&self, key: NodeKey) -> u32;

    /// Asks the host to route keyboard input to embedded interactive content.
    fn request_focus(&mut self, key: NodeKey);

    /// Zoom factor applied to font sizes on screen.
    fn font_scaling(&self) -> f32 {
        1.0
    }

    /// Resolution factor applied while printing.
    fn printer_scaling(&self) -> f32 {
        1.0
    }
}

/// A host with nothing selected and no focus handling.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDisplay;

impl DisplayHost for NullDisplay {
    fn selected(&self, _key: NodeKey) -> u32 {
        0
    }

    fn request_focus(&mut self, _key: NodeKey) {}
}
