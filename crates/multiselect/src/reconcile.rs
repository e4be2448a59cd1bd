//! List reconciliation: every operation that moves or reorders options.
//!
//! Each operation mutates the option model, then writes the selection back
//! into the native control through a single commit, so bulk operations
//! notify the host once.

use multiselect_core::PerfSpan;
use multiselect_core::logging::{span_names, targets};

use crate::host::NativeControl;
use crate::model::{ListSide, OptionModel, Slot};
use crate::palette::Palette;

impl<C: NativeControl> Palette<C> {
    fn visible_slot(&self, value: &str) -> Option<Slot> {
        let Some(slot) = self.model.slot_of(value) else {
            tracing::debug!(target: targets::RECONCILE, value, "unknown option");
            return None;
        };
        if !self.is_visible(slot) {
            tracing::debug!(target: targets::RECONCILE, value, "option is filtered out");
            return None;
        }
        Some(slot)
    }

    /// Moves `slot` into `to` and shows it there.
    fn move_option(&mut self, slot: Slot, to: ListSide) {
        self.model.move_to(slot, to);
        self.model.set_selected(slot, true);
        self.list_filter_mut(to).reveal(slot);
    }

    /// Flips the highlight of an option.
    ///
    /// When `exclusive`, every other highlight in the option's list is
    /// cleared first. Filtered-out options are ignored.
    pub fn toggle_highlight(&mut self, value: &str, exclusive: bool) {
        let Some(slot) = self.visible_slot(value) else {
            return;
        };
        if exclusive {
            self.model.clear_highlight(self.model.option(slot).side());
        }
        let selected = self.model.toggle_selected(slot);
        tracing::trace!(target: targets::RECONCILE, value, selected, "highlight toggled");
        self.refresh_buttons();
    }

    /// Moves one option to the other list, as on double-click.
    ///
    /// The option stays highlighted in its new list; other highlights there
    /// are cleared.
    pub fn activate(&mut self, value: &str) {
        let Some(slot) = self.visible_slot(value) else {
            return;
        };
        let to = self.model.option(slot).side().other();
        self.model.clear_highlight(to);
        self.move_option(slot, to);
        tracing::debug!(target: targets::RECONCILE, value, ?to, "option activated");
        self.commit(true, false);
    }

    /// Moves every highlighted choice into the selection.
    pub fn add_selected_choices(&mut self) {
        self.move_highlighted(ListSide::Choices);
    }

    /// Moves every highlighted selection entry back into the choices.
    pub fn remove_selection(&mut self) {
        self.move_highlighted(ListSide::Selection);
    }

    fn move_highlighted(&mut self, from: ListSide) {
        let _span = PerfSpan::new(span_names::BATCH_MOVE);
        let to = from.other();
        self.model.clear_highlight(to);

        let moving = self.model.highlighted(from);
        for &slot in &moving {
            self.move_option(slot, to);
        }
        tracing::debug!(target: targets::RECONCILE, ?from, moved = moving.len(), "highlighted options moved");
        self.commit(!moving.is_empty(), false);
    }

    /// Moves every option into the selection.
    pub fn add_all(&mut self) {
        self.move_all(ListSide::Selection);
    }

    /// Moves every option back into the choices.
    pub fn remove_all(&mut self) {
        self.move_all(ListSide::Choices);
    }

    fn move_all(&mut self, to: ListSide) {
        let changed = !self.model.slots(to.other()).is_empty();
        self.reset_filter(ListSide::Choices);
        self.reset_filter(ListSide::Selection);
        self.model.move_all(to);
        tracing::debug!(target: targets::RECONCILE, ?to, changed, "all options moved");
        self.commit(changed, false);
    }

    /// Moves each highlighted run of the selection up by one slot.
    pub fn move_selection_up(&mut self) {
        self.reorder_selection(Direction::Up);
    }

    /// Moves each highlighted run of the selection down by one slot.
    pub fn move_selection_down(&mut self) {
        self.reorder_selection(Direction::Down);
    }

    fn reorder_selection(&mut self, direction: Direction) {
        self.reset_filter(ListSide::Selection);

        let mut list = self.model.slots(ListSide::Selection).to_vec();
        let highlighted = |model: &OptionModel, slot: Slot| model.option(slot).is_selected();
        let mut swaps = 0usize;

        // An entry that moved past its neighbour keeps that neighbour as the
        // next comparison point, so a highlighted run shifts as a block.
        match direction {
            Direction::Up => {
                for i in 1..list.len() {
                    if !highlighted(&self.model, list[i - 1]) && highlighted(&self.model, list[i]) {
                        self.model.swap_order(list[i - 1], list[i]);
                        list.swap(i - 1, i);
                        swaps += 1;
                    }
                }
            }
            Direction::Down => {
                for i in (0..list.len().saturating_sub(1)).rev() {
                    if !highlighted(&self.model, list[i + 1]) && highlighted(&self.model, list[i]) {
                        self.model.swap_order(list[i], list[i + 1]);
                        list.swap(i, i + 1);
                        swaps += 1;
                    }
                }
            }
        }

        tracing::debug!(target: targets::RECONCILE, ?direction, swaps, "selection reordered");
        *self.model.slots_mut(ListSide::Selection) = list;
        self.commit(false, swaps > 0);
    }
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Up,
    Down,
}
