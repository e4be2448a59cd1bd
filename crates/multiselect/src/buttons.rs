//! Button state derivation.
//!
//! Button states are a pure function of the two visible lists and the
//! configuration. They are recomputed after every mutating operation.

use crate::config::PaletteConfig;

/// Enabled state of every palette button.
///
/// Buttons hidden by the configuration are always reported disabled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonStates {
    pub add: bool,
    pub remove: bool,
    pub add_all: bool,
    pub remove_all: bool,
    pub move_up: bool,
    pub move_down: bool,
}

impl ButtonStates {
    /// Derives the states from the highlight flags of each visible list, in
    /// visual order.
    pub fn derive(choices: &[bool], selection: &[bool], config: &PaletteConfig) -> Self {
        let ordering = config.allow_order;
        let move_all = config.allow_move_all;
        Self {
            add: choices.contains(&true),
            remove: selection.contains(&true),
            add_all: move_all && !choices.is_empty(),
            remove_all: move_all && !selection.is_empty(),
            move_up: ordering && can_move(selection, Edge::Top),
            move_down: ordering && can_move(selection, Edge::Bottom),
        }
    }

    /// Whether every button is disabled.
    pub fn all_disabled(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Clone, Copy)]
enum Edge {
    Top,
    Bottom,
}

/// Whether some highlighted entry is outside the `N` slots at `edge`, where
/// `N` is the highlighted count.
fn can_move(highlights: &[bool], edge: Edge) -> bool {
    let count = highlights.iter().filter(|&&highlighted| highlighted).count();
    if count == 0 {
        return false;
    }
    let packed = match edge {
        Edge::Top => &highlights[..count],
        Edge::Bottom => &highlights[highlights.len() - count..],
    };
    !packed.iter().all(|&highlighted| highlighted)
}
