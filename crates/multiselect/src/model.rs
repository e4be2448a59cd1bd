//! The option model: the authoritative record of every selectable item.
//!
//! [`OptionModel`] owns one [`PaletteOption`] per item plus the two ordered
//! lists (choices and selection). List membership is stored twice, as the
//! option's `in_selection` flag and as an entry in exactly one list, and every
//! mutation here keeps the two in agreement.
//!
//! Renderers never query anything else for state: the visible content of a
//! list is derived from this model and the active filter.

use std::collections::HashMap;

use multiselect_core::logging::targets;
use serde::{Deserialize, Serialize};

/// One of the two lists of the palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListSide {
    /// The not-yet-selected options.
    Choices,
    /// The selected options, in user-defined order.
    Selection,
}

impl ListSide {
    /// The side an option with the given membership flag belongs to.
    pub fn from_in_selection(in_selection: bool) -> Self {
        if in_selection {
            Self::Selection
        } else {
            Self::Choices
        }
    }

    /// Whether this is the selection list.
    pub fn is_selection(self) -> bool {
        self == Self::Selection
    }

    /// The opposite list.
    pub fn other(self) -> Self {
        match self {
            Self::Choices => Self::Selection,
            Self::Selection => Self::Choices,
        }
    }
}

/// A single selectable item.
///
/// Serialized with the field names of the worker protocol, so a snapshot of
/// the model can be handed to the filter worker as is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaletteOption {
    index: usize,
    order: usize,
    value: String,
    label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    filter_text: Option<String>,
    in_selection: bool,
    selected: bool,
}

impl PaletteOption {
    /// Creates an option in the choices list with `order` equal to `index`.
    pub fn new(index: usize, value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            index,
            order: index,
            value: value.into(),
            label: label.into(),
            filter_text: None,
            in_selection: false,
            selected: false,
        }
    }

    /// Sets the text used for filter matching instead of the label.
    pub fn with_filter_text(mut self, filter_text: Option<String>) -> Self {
        self.filter_text = filter_text.filter(|text| !text.is_empty());
        self
    }

    /// Places the option in the selection list.
    pub fn with_in_selection(mut self, in_selection: bool) -> Self {
        self.in_selection = in_selection;
        self
    }

    /// Immutable original position, used as the choices sort key.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Position key within the selection list.
    pub fn order(&self) -> usize {
        self.order
    }

    /// The unique value identifying this option.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// The display text.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The filter text override, if any.
    pub fn filter_text(&self) -> Option<&str> {
        self.filter_text.as_deref()
    }

    /// The text filter queries are matched against: the override, or the
    /// lowercased label.
    pub fn match_text(&self) -> String {
        match &self.filter_text {
            Some(text) => text.clone(),
            None => self.label.to_lowercase(),
        }
    }

    /// Whether the option is in the selection list.
    pub fn in_selection(&self) -> bool {
        self.in_selection
    }

    /// The list currently owning this option.
    pub fn side(&self) -> ListSide {
        ListSide::from_in_selection(self.in_selection)
    }

    /// Whether the option is highlighted.
    pub fn is_selected(&self) -> bool {
        self.selected
    }

    fn sort_key(&self, side: ListSide) -> usize {
        match side {
            ListSide::Choices => self.index,
            ListSide::Selection => self.order,
        }
    }
}

/// Position of an option inside [`OptionModel`]'s storage.
pub(crate) type Slot = usize;

/// The authoritative option store plus both ordered lists.
#[derive(Debug, Clone, Default)]
pub struct OptionModel {
    options: Vec<PaletteOption>,
    by_value: HashMap<String, Slot>,
    choices: Vec<Slot>,
    selection: Vec<Slot>,
}

impl OptionModel {
    /// Builds the model from options in native order.
    ///
    /// An option whose value repeats an earlier one is dropped. The choices
    /// list is ordered by `index` and the selection list by `order`.
    pub fn new(options: impl IntoIterator<Item = PaletteOption>) -> Self {
        let mut model = Self::default();
        for option in options {
            if model.by_value.contains_key(&option.value) {
                tracing::debug!(target: targets::RECONCILE, value = %option.value, "dropping option with duplicate value");
                continue;
            }
            let slot = model.options.len();
            model.by_value.insert(option.value.clone(), slot);
            model.options.push(option);
        }

        for (slot, option) in model.options.iter().enumerate() {
            if option.in_selection {
                model.selection.push(slot);
            } else {
                model.choices.push(slot);
            }
        }
        let options = &model.options;
        model.choices.sort_by_key(|&slot| options[slot].index);
        model.selection.sort_by_key(|&slot| options[slot].order);
        model
    }

    /// Number of options.
    pub fn len(&self) -> usize {
        self.options.len()
    }

    /// Whether the model holds no options.
    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// All options in native order.
    pub fn options(&self) -> &[PaletteOption] {
        &self.options
    }

    /// Looks up an option by value.
    pub fn find_by_value(&self, value: &str) -> Option<&PaletteOption> {
        self.slot_of(value).map(|slot| &self.options[slot])
    }

    /// Options of one list in visual order.
    pub fn list(&self, side: ListSide) -> impl Iterator<Item = &PaletteOption> + '_ {
        self.slots(side).iter().map(|&slot| &self.options[slot])
    }

    /// Values of one list in visual order.
    pub fn values(&self, side: ListSide) -> Vec<&str> {
        self.list(side).map(PaletteOption::value).collect()
    }

    /// Values of the highlighted options of one list in visual order.
    pub fn highlighted_values(&self, side: ListSide) -> Vec<&str> {
        self.list(side)
            .filter(|option| option.selected)
            .map(PaletteOption::value)
            .collect()
    }

    /// Copies every option for hand-off to the filter worker.
    pub fn snapshot(&self) -> Vec<PaletteOption> {
        self.options.clone()
    }

    pub(crate) fn slot_of(&self, value: &str) -> Option<Slot> {
        self.by_value.get(value).copied()
    }

    pub(crate) fn option(&self, slot: Slot) -> &PaletteOption {
        &self.options[slot]
    }

    pub(crate) fn slots(&self, side: ListSide) -> &[Slot] {
        match side {
            ListSide::Choices => &self.choices,
            ListSide::Selection => &self.selection,
        }
    }

    pub(crate) fn slots_mut(&mut self, side: ListSide) -> &mut Vec<Slot> {
        match side {
            ListSide::Choices => &mut self.choices,
            ListSide::Selection => &mut self.selection,
        }
    }

    pub(crate) fn set_selected(&mut self, slot: Slot, selected: bool) {
        self.options[slot].selected = selected;
    }

    pub(crate) fn toggle_selected(&mut self, slot: Slot) -> bool {
        let option = &mut self.options[slot];
        option.selected = !option.selected;
        option.selected
    }

    /// Clears the highlight on every option of one list.
    pub(crate) fn clear_highlight(&mut self, side: ListSide) {
        let in_selection = side.is_selection();
        for option in &mut self.options {
            if option.in_selection == in_selection {
                option.selected = false;
            }
        }
    }

    /// Highlighted slots of one list in visual order.
    pub(crate) fn highlighted(&self, side: ListSide) -> Vec<Slot> {
        self.slots(side)
            .iter()
            .copied()
            .filter(|&slot| self.options[slot].selected)
            .collect()
    }

    /// Moves an option into the `to` list at its ordered-insert position.
    ///
    /// Does nothing if the option is already there.
    pub(crate) fn move_to(&mut self, slot: Slot, to: ListSide) {
        let from = self.options[slot].side();
        if from == to {
            return;
        }

        self.slots_mut(from).retain(|&s| s != slot);
        self.options[slot].in_selection = to.is_selection();

        let key = self.options[slot].sort_key(to);
        let options = &self.options;
        let target = match to {
            ListSide::Choices => &mut self.choices,
            ListSide::Selection => &mut self.selection,
        };
        let position = target
            .iter()
            .position(|&s| options[s].sort_key(to) > key)
            .unwrap_or(target.len());
        target.insert(position, slot);
    }

    /// Puts every option in the `to` list, resetting `order` and highlights.
    pub(crate) fn move_all(&mut self, to: ListSide) {
        let in_selection = to.is_selection();
        for option in &mut self.options {
            option.in_selection = in_selection;
            option.selected = false;
            option.order = option.index;
        }

        let mut all: Vec<Slot> = (0..self.options.len()).collect();
        let options = &self.options;
        all.sort_by_key(|&slot| options[slot].index);
        *self.slots_mut(to) = all;
        self.slots_mut(to.other()).clear();
    }

    pub(crate) fn swap_order(&mut self, a: Slot, b: Slot) {
        let order_a = self.options[a].order;
        self.options[a].order = self.options[b].order;
        self.options[b].order = order_a;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(selected: &[&str]) -> OptionModel {
        OptionModel::new(["a", "b", "c", "d", "e"].iter().enumerate().map(|(i, v)| {
            PaletteOption::new(i, *v, v.to_uppercase()).with_in_selection(selected.contains(v))
        }))
    }

    #[test]
    fn test_initial_lists_follow_membership() {
        let model = model(&["b", "d"]);
        assert_eq!(model.values(ListSide::Choices), vec!["a", "c", "e"]);
        assert_eq!(model.values(ListSide::Selection), vec!["b", "d"]);
        assert!(model.find_by_value("d").unwrap().in_selection());
        assert!(model.find_by_value("zzz").is_none());
    }

    #[test]
    fn test_duplicate_values_are_dropped() {
        let model = OptionModel::new(vec![
            PaletteOption::new(0, "x", "First"),
            PaletteOption::new(1, "x", "Second"),
        ]);
        assert_eq!(model.len(), 1);
        assert_eq!(model.find_by_value("x").unwrap().label(), "First");
    }

    #[test]
    fn test_initial_lists_are_sorted_by_key() {
        let model = OptionModel::new(vec![
            PaletteOption::new(2, "c", "C"),
            PaletteOption::new(0, "a", "A"),
            PaletteOption::new(1, "b", "B").with_in_selection(true),
        ]);
        assert_eq!(model.values(ListSide::Choices), vec!["a", "c"]);
    }

    #[test]
    fn test_ordered_insert_into_choices_uses_index() {
        let mut model = model(&["a", "c", "e"]);
        let slot = model.slot_of("c").unwrap();
        model.move_to(slot, ListSide::Choices);
        assert_eq!(model.values(ListSide::Choices), vec!["b", "c", "d"]);
        assert_eq!(model.values(ListSide::Selection), vec!["a", "e"]);
        assert!(!model.find_by_value("c").unwrap().in_selection());
    }

    #[test]
    fn test_ordered_insert_into_selection_uses_order() {
        let mut model = model(&["a", "b"]);
        let (a, b) = (model.slot_of("a").unwrap(), model.slot_of("b").unwrap());
        model.swap_order(a, b);
        model.slots_mut(ListSide::Selection).swap(0, 1);

        let e = model.slot_of("e").unwrap();
        model.move_to(e, ListSide::Selection);
        let c = model.slot_of("c").unwrap();
        model.move_to(c, ListSide::Selection);

        assert_eq!(model.values(ListSide::Selection), vec!["b", "a", "c", "e"]);
    }

    #[test]
    fn test_move_all_resets_order_and_highlight() {
        let mut model = model(&["a", "b"]);
        let (a, b) = (model.slot_of("a").unwrap(), model.slot_of("b").unwrap());
        model.swap_order(a, b);
        model.set_selected(a, true);

        model.move_all(ListSide::Choices);

        assert!(model.values(ListSide::Selection).is_empty());
        assert_eq!(model.values(ListSide::Choices), vec!["a", "b", "c", "d", "e"]);
        for option in model.options() {
            assert_eq!(option.order(), option.index());
            assert!(!option.is_selected());
        }
    }

    #[test]
    fn test_clear_highlight_is_per_side() {
        let mut model = model(&["a"]);
        let (a, b) = (model.slot_of("a").unwrap(), model.slot_of("b").unwrap());
        model.set_selected(a, true);
        model.set_selected(b, true);

        model.clear_highlight(ListSide::Choices);

        assert_eq!(model.highlighted_values(ListSide::Selection), vec!["a"]);
        assert!(model.highlighted(ListSide::Choices).is_empty());
    }

    #[test]
    fn test_match_text_falls_back_to_lowercased_label() {
        let plain = PaletteOption::new(0, "1", "Red Apple");
        assert_eq!(plain.match_text(), "red apple");

        let custom = PaletteOption::new(1, "2", "Pear").with_filter_text(Some("fruit green".into()));
        assert_eq!(custom.match_text(), "fruit green");

        let empty = PaletteOption::new(2, "3", "Plum").with_filter_text(Some(String::new()));
        assert_eq!(empty.filter_text(), None);
    }
}
