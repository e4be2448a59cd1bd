//! The bridge to the host's native selection control.
//!
//! The palette mirrors its selection into a [`NativeControl`] so that form
//! submission and change listeners of the host keep working. The bridge
//! only ever writes selected flags, option order and change notifications;
//! it never reads state back after initialization.

use multiselect_core::Signal;
use multiselect_core::logging::targets;

use crate::filter::filter_text_from_words;
use crate::model::{ListSide, OptionModel, PaletteOption};

/// One option of a native control, as read at initialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeOption {
    /// Display text.
    pub text: String,
    /// Unique value.
    pub value: String,
    /// Whether the option is part of the current selection.
    pub selected: bool,
    /// Explicit position; the option's position in the control when absent.
    pub data_index: Option<usize>,
    /// Filter text override.
    pub data_filter_text: Option<String>,
}

impl NativeOption {
    /// Creates an unselected option.
    pub fn new(value: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            value: value.into(),
            selected: false,
            data_index: None,
            data_filter_text: None,
        }
    }

    /// Sets the selected flag.
    pub fn with_selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    /// Sets an explicit index.
    pub fn with_index(mut self, index: usize) -> Self {
        self.data_index = Some(index);
        self
    }

    /// Sets the filter text from a list of filter words.
    pub fn with_filter_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.data_filter_text = filter_text_from_words(words);
        self
    }

    fn to_palette_option(&self, position: usize) -> PaletteOption {
        PaletteOption::new(self.data_index.unwrap_or(position), &self.value, &self.text)
            .with_filter_text(self.data_filter_text.clone())
            .with_in_selection(self.selected)
    }
}

/// The host-side multi-selection control the palette mirrors into.
pub trait NativeControl {
    /// Identifier of the control, reported in change notifications.
    fn id(&self) -> &str;

    /// Current options in control order.
    fn options(&self) -> Vec<NativeOption>;

    /// Clears the selected flag on every option.
    fn clear_selected(&mut self);

    /// Marks the option with `value` as selected. Returns `false` if unknown.
    fn set_selected(&mut self, value: &str) -> bool;

    /// Moves the option with `value` to the front. Returns `false` if unknown.
    fn move_to_front(&mut self, value: &str) -> bool;

    /// Notifies host listeners that the selection changed.
    fn dispatch_change(&self);
}

/// Payload of [`NativeSelect::changed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Id of the control that changed.
    pub id: String,
    /// Selected values in control order.
    pub selected: Vec<String>,
}

/// An in-memory native control.
///
/// Host listeners connect to [`changed`](Self::changed).
///
/// ```
/// use multiselect::{NativeControl, NativeOption, NativeSelect};
///
/// let mut select = NativeSelect::new(
///     "fruit",
///     vec![NativeOption::new("a", "Apple"), NativeOption::new("b", "Banana")],
/// );
/// select.set_selected("b");
/// assert_eq!(select.selected_values(), vec!["b"]);
/// ```
pub struct NativeSelect {
    id: String,
    options: Vec<NativeOption>,
    /// Emitted on every change notification.
    pub changed: Signal<ChangeEvent>,
}

impl NativeSelect {
    /// Creates a control with the given options.
    pub fn new(id: impl Into<String>, options: Vec<NativeOption>) -> Self {
        Self {
            id: id.into(),
            options,
            changed: Signal::new(),
        }
    }

    /// Values in control order.
    pub fn values(&self) -> Vec<&str> {
        self.options.iter().map(|option| option.value.as_str()).collect()
    }

    /// Selected values in control order, as a form submission would send them.
    pub fn selected_values(&self) -> Vec<&str> {
        self.options
            .iter()
            .filter(|option| option.selected)
            .map(|option| option.value.as_str())
            .collect()
    }
}

impl std::fmt::Debug for NativeSelect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeSelect")
            .field("id", &self.id)
            .field("options", &self.options)
            .field("listeners", &self.changed.connection_count())
            .finish()
    }
}

impl NativeControl for NativeSelect {
    fn id(&self) -> &str {
        &self.id
    }

    fn options(&self) -> Vec<NativeOption> {
        self.options.clone()
    }

    fn clear_selected(&mut self) {
        for option in &mut self.options {
            option.selected = false;
        }
    }

    fn set_selected(&mut self, value: &str) -> bool {
        match self.options.iter_mut().find(|option| option.value == value) {
            Some(option) => {
                option.selected = true;
                true
            }
            None => false,
        }
    }

    fn move_to_front(&mut self, value: &str) -> bool {
        match self.options.iter().position(|option| option.value == value) {
            Some(position) => {
                let option = self.options.remove(position);
                self.options.insert(0, option);
                true
            }
            None => false,
        }
    }

    fn dispatch_change(&self) {
        self.changed.emit(ChangeEvent {
            id: self.id.clone(),
            selected: self.selected_values().into_iter().map(str::to_owned).collect(),
        });
    }
}

/// Builds the option model from a native control's options.
pub(crate) fn read_options(control: &impl NativeControl) -> OptionModel {
    OptionModel::new(
        control
            .options()
            .iter()
            .enumerate()
            .map(|(position, option)| option.to_palette_option(position)),
    )
}

/// Marks exactly the selection list's options as selected on the control.
pub(crate) fn sync_selection(control: &mut impl NativeControl, model: &OptionModel) {
    control.clear_selected();
    for option in model.list(ListSide::Selection) {
        if !control.set_selected(option.value()) {
            tracing::debug!(target: targets::HOST, value = option.value(), "value missing from native control");
        }
    }
}

/// Rewrites the control's option order so the selection comes first, in
/// visual order.
pub(crate) fn sync_order(control: &mut impl NativeControl, model: &OptionModel) {
    let selection: Vec<&PaletteOption> = model.list(ListSide::Selection).collect();
    for option in selection.into_iter().rev() {
        control.move_to_front(option.value());
    }
}

pub(crate) fn notify_change(control: &impl NativeControl) {
    tracing::trace!(target: targets::HOST, id = control.id(), "dispatching change");
    control.dispatch_change();
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn select() -> NativeSelect {
        NativeSelect::new(
            "colors",
            vec![
                NativeOption::new("r", "Red"),
                NativeOption::new("g", "Green").with_selected(true),
                NativeOption::new("b", "Blue").with_index(7),
                NativeOption::new("y", "Yellow").with_selected(true),
            ],
        )
    }

    #[test]
    fn test_read_options_uses_position_or_data_index() {
        let model = read_options(&select());
        assert_eq!(model.find_by_value("g").map(PaletteOption::index), Some(1));
        assert_eq!(model.find_by_value("b").map(PaletteOption::index), Some(7));
        assert_eq!(model.values(ListSide::Choices), vec!["r", "b"]);
        assert_eq!(model.values(ListSide::Selection), vec!["g", "y"]);
    }

    #[test]
    fn test_filter_words_become_filter_text() {
        let option = NativeOption::new("x", "X").with_filter_words(["Alpha", " ", "BETA "]);
        assert_eq!(option.data_filter_text.as_deref(), Some("alpha beta"));
    }

    #[test]
    fn test_sync_selection_and_order() {
        let mut control = select();
        let model = OptionModel::new([
            PaletteOption::new(0, "r", "Red"),
            PaletteOption::new(1, "g", "Green"),
            PaletteOption::new(2, "b", "Blue").with_in_selection(true),
            PaletteOption::new(3, "y", "Yellow").with_in_selection(true),
        ]);

        sync_selection(&mut control, &model);
        assert_eq!(control.selected_values(), vec!["b", "y"]);

        sync_order(&mut control, &model);
        assert_eq!(control.values(), vec!["b", "y", "r", "g"]);
    }

    #[test]
    fn test_dispatch_change_emits_selected_values() {
        let control = select();
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();
        control.changed.connect(move |event: &ChangeEvent| {
            assert_eq!(event.id, "colors");
            assert_eq!(event.selected, vec!["g".to_string(), "y".to_string()]);
            count_clone.fetch_add(1, Ordering::SeqCst);
        });

        notify_change(&control);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unknown_values_are_reported() {
        let mut control = select();
        assert!(!control.set_selected("missing"));
        assert!(!control.move_to_front("missing"));
    }
}
