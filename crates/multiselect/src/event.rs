//! User interaction events.
//!
//! A renderer translates its input into [`PaletteEvent`]s and feeds them to
//! [`Palette::handle_event`]. Events for buttons that are hidden or
//! disabled are ignored, as a disabled button would never fire.

use multiselect_core::logging::targets;

use crate::host::NativeControl;
use crate::model::ListSide;
use crate::palette::Palette;

/// Keyboard modifiers held during a click.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyboardModifiers {
    /// The Control key is held. Adds to the current highlight.
    pub control: bool,
    /// The Shift key is held. Currently treated like a plain click.
    pub shift: bool,
}

impl KeyboardModifiers {
    /// No modifiers pressed.
    pub const NONE: Self = Self {
        control: false,
        shift: false,
    };

    /// Only Control pressed.
    pub const CONTROL: Self = Self {
        control: true,
        shift: false,
    };
}

/// Keys the lists respond to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Moves the highlighted entries of the focused list.
    Space,
    /// Any other key.
    Other,
}

/// The palette buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteButton {
    Add,
    Remove,
    AddAll,
    RemoveAll,
    MoveUp,
    MoveDown,
    /// Clears the filter box of one list.
    ClearFilter(ListSide),
}

/// An interaction with the palette.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaletteEvent {
    /// An entry was clicked.
    Click {
        value: String,
        modifiers: KeyboardModifiers,
    },
    /// An entry was double-clicked.
    DoubleClick { value: String },
    /// A key was pressed while a list had focus.
    KeyDown { side: ListSide, key: Key },
    /// A button was clicked.
    ButtonClicked(PaletteButton),
    /// The text of a filter box changed.
    FilterInput { side: ListSide, text: String },
}

impl<C: NativeControl> Palette<C> {
    /// Dispatches an interaction to the matching operation.
    pub fn handle_event(&mut self, event: PaletteEvent) {
        tracing::trace!(target: targets::RECONCILE, ?event, "handling event");
        match event {
            PaletteEvent::Click { value, modifiers } => self.toggle_highlight(&value, !modifiers.control),
            PaletteEvent::DoubleClick { value } => self.activate(&value),
            PaletteEvent::KeyDown { side, key: Key::Space } => match side {
                ListSide::Choices => self.add_selected_choices(),
                ListSide::Selection => self.remove_selection(),
            },
            PaletteEvent::KeyDown { key: Key::Other, .. } => {}
            PaletteEvent::ButtonClicked(button) => self.click_button(button),
            PaletteEvent::FilterInput { side, text } => self.filter(side, &text),
        }
    }

    fn click_button(&mut self, button: PaletteButton) {
        let buttons = self.buttons();
        let enabled = match button {
            PaletteButton::Add => buttons.add,
            PaletteButton::Remove => buttons.remove,
            PaletteButton::AddAll => buttons.add_all,
            PaletteButton::RemoveAll => buttons.remove_all,
            PaletteButton::MoveUp => buttons.move_up,
            PaletteButton::MoveDown => buttons.move_down,
            PaletteButton::ClearFilter(_) => self.config().filter,
        };
        if !enabled {
            tracing::debug!(target: targets::RECONCILE, ?button, "button disabled, ignoring click");
            return;
        }

        match button {
            PaletteButton::Add => self.add_selected_choices(),
            PaletteButton::Remove => self.remove_selection(),
            PaletteButton::AddAll => self.add_all(),
            PaletteButton::RemoveAll => self.remove_all(),
            PaletteButton::MoveUp => self.move_selection_up(),
            PaletteButton::MoveDown => self.move_selection_down(),
            PaletteButton::ClearFilter(side) => self.clear_filter(side),
        }
    }
}
