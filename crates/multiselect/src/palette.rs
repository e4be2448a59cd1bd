//! The per-instance palette context.

use std::time::{Duration, Instant};

use multiselect_core::Signal;
use multiselect_core::logging::targets;

use crate::buttons::ButtonStates;
use crate::config::PaletteConfig;
use crate::filter::{FilterDispatcher, ListFilter, WorkerRequest, WorkerResponse};
use crate::host::{self, NativeControl, NativeSelect};
use crate::model::{ListSide, OptionModel, PaletteOption, Slot};

/// A dual-list selection widget bound to one native control.
///
/// The palette owns the option model, both list filters, the filter
/// dispatcher and the native control. User interaction goes through the
/// reconciler operations (or [`handle_event`](Self::handle_event)); every
/// operation keeps the native control in sync and recomputes button states.
///
/// Filtering is asynchronous when a worker is configured. Results are
/// applied by [`process_filter_messages`](Self::process_filter_messages),
/// which the host calls from its event loop.
///
/// # Example
///
/// ```
/// use multiselect::{ListSide, NativeOption, NativeSelect, Palette, PaletteConfig};
///
/// let select = NativeSelect::new(
///     "fruit",
///     vec![
///         NativeOption::new("a", "Apple"),
///         NativeOption::new("b", "Banana"),
///         NativeOption::new("c", "Cherry").with_selected(true),
///     ],
/// );
/// let mut palette = Palette::new(select, PaletteConfig::default().with_filter(true));
///
/// palette.activate("a");
/// assert_eq!(palette.control().selected_values(), vec!["a", "c"]);
///
/// palette.filter(ListSide::Choices, "ban");
/// let visible: Vec<&str> = palette.visible_choices().iter().map(|o| o.value()).collect();
/// assert_eq!(visible, vec!["b"]);
/// ```
pub struct Palette<C: NativeControl = NativeSelect> {
    pub(crate) config: PaletteConfig,
    pub(crate) model: OptionModel,
    pub(crate) control: C,
    choices_filter: ListFilter,
    selection_filter: ListFilter,
    dispatcher: FilterDispatcher,
    buttons: ButtonStates,
    /// Emitted when the derived button states change.
    pub buttons_changed: Signal<ButtonStates>,
    /// Emitted when a filter run for a list completes.
    pub filter_finished: Signal<ListSide>,
}

impl<C: NativeControl> Palette<C> {
    /// Builds a palette from the options of `control`.
    pub fn new(control: C, config: PaletteConfig) -> Self {
        let model = host::read_options(&control);
        let dispatcher = FilterDispatcher::new(config.worker_script.as_deref());
        tracing::debug!(
            target: targets::HOST,
            id = control.id(),
            options = model.len(),
            background = dispatcher.is_background(),
            "palette attached"
        );

        let mut palette = Self {
            config,
            model,
            control,
            choices_filter: ListFilter::default(),
            selection_filter: ListFilter::default(),
            dispatcher,
            buttons: ButtonStates::default(),
            buttons_changed: Signal::new(),
            filter_finished: Signal::new(),
        };
        palette.buttons = palette.derive_buttons();
        palette
    }

    /// The configuration the palette was created with.
    pub fn config(&self) -> &PaletteConfig {
        &self.config
    }

    /// The option model.
    pub fn model(&self) -> &OptionModel {
        &self.model
    }

    /// The native control the palette mirrors into.
    pub fn control(&self) -> &C {
        &self.control
    }

    /// Current button states.
    pub fn buttons(&self) -> ButtonStates {
        self.buttons
    }

    /// Every option of the choices list in visual order, ignoring filters.
    pub fn choices(&self) -> Vec<&PaletteOption> {
        self.model.list(ListSide::Choices).collect()
    }

    /// Every option of the selection list in visual order, ignoring filters.
    pub fn selection(&self) -> Vec<&PaletteOption> {
        self.model.list(ListSide::Selection).collect()
    }

    /// The choices a renderer would display.
    pub fn visible_choices(&self) -> Vec<&PaletteOption> {
        self.visible(ListSide::Choices)
    }

    /// The selection entries a renderer would display.
    pub fn visible_selection(&self) -> Vec<&PaletteOption> {
        self.visible(ListSide::Selection)
    }

    /// Filter state of one list.
    pub fn list_filter(&self, side: ListSide) -> &ListFilter {
        match side {
            ListSide::Choices => &self.choices_filter,
            ListSide::Selection => &self.selection_filter,
        }
    }

    /// Classes of the palette container.
    pub fn container_classes(&self) -> Vec<String> {
        let orientation = if self.config.vertical {
            "multi-select-vertical"
        } else {
            "multi-select-horizontal"
        };
        let mut classes = vec!["multi-select".to_string(), orientation.to_string()];
        classes.extend(self.config.custom_class.iter().cloned());
        classes
    }

    /// Filters one list by `text`.
    ///
    /// The list is emptied right away and repopulated as matches arrive.
    /// Text equal to the previous query of that list is ignored.
    pub fn filter(&mut self, side: ListSide, text: &str) {
        if !self.config.filter {
            tracing::debug!(target: targets::FILTER, "filtering disabled, ignoring input");
            return;
        }
        if !self.list_filter_mut(side).set_query(text) {
            tracing::trace!(target: targets::FILTER, ?side, "query unchanged");
            return;
        }

        self.begin_filter(side);
        self.dispatcher
            .submit(WorkerRequest::filter(self.model.snapshot(), side, text));

        if self.dispatcher.is_background() {
            self.dispatch_pending();
        } else {
            self.process_filter_messages();
        }
        self.refresh_buttons();
    }

    /// Empties the query of one list and shows it unfiltered again.
    pub fn clear_filter(&mut self, side: ListSide) {
        self.filter(side, "");
    }

    /// Applies every filter result that has arrived and dispatches queued
    /// filters. Returns the number of messages handled.
    pub fn process_filter_messages(&mut self) -> usize {
        let mut handled = 0;
        loop {
            self.dispatch_pending();
            let in_flight = self.dispatcher.in_flight();
            match self.dispatcher.poll() {
                Some(response) => {
                    self.apply_response(response, in_flight);
                    handled += 1;
                }
                None => break,
            }
        }
        if handled > 0 {
            self.refresh_buttons();
        }
        handled
    }

    /// Processes filter messages until nothing is queued or in flight, or
    /// `timeout` elapses. Returns `true` when every filter completed.
    pub fn wait_for_filters(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut handled = 0;
        loop {
            self.dispatch_pending();
            if self.dispatcher.is_idle() {
                break;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            let in_flight = self.dispatcher.in_flight();
            if let Some(response) = self.dispatcher.poll_timeout(remaining) {
                self.apply_response(response, in_flight);
                handled += 1;
            }
        }
        if handled > 0 {
            self.refresh_buttons();
        }
        self.dispatcher.is_idle()
    }

    /// Links the palette to a replacement native control and returns the
    /// previous one.
    ///
    /// The options of the new control are not read: choices and selection
    /// are assumed unchanged. A host that changes them must build a new
    /// palette.
    pub fn reattach(&mut self, control: C) -> C {
        tracing::debug!(target: targets::HOST, id = control.id(), "reattaching native control");
        std::mem::replace(&mut self.control, control)
    }

    /// Stops the filter worker and hands the native control back.
    pub fn teardown(self) -> C {
        let Self {
            mut dispatcher,
            control,
            ..
        } = self;
        dispatcher.shutdown();
        tracing::debug!(target: targets::HOST, id = control.id(), "palette torn down");
        control
    }

    pub(crate) fn list_filter_mut(&mut self, side: ListSide) -> &mut ListFilter {
        match side {
            ListSide::Choices => &mut self.choices_filter,
            ListSide::Selection => &mut self.selection_filter,
        }
    }

    pub(crate) fn is_visible(&self, slot: Slot) -> bool {
        self.list_filter(self.model.option(slot).side()).is_visible(slot)
    }

    pub(crate) fn visible_slots(&self, side: ListSide) -> Vec<Slot> {
        let filter = self.list_filter(side);
        self.model
            .slots(side)
            .iter()
            .copied()
            .filter(|&slot| filter.is_visible(slot))
            .collect()
    }

    fn visible(&self, side: ListSide) -> Vec<&PaletteOption> {
        self.visible_slots(side)
            .into_iter()
            .map(|slot| self.model.option(slot))
            .collect()
    }

    /// Drops the filter of one list without a worker round trip.
    pub(crate) fn reset_filter(&mut self, side: ListSide) {
        let discarded = self.dispatcher.discard_queued(side);
        self.list_filter_mut(side).reset();
        tracing::trace!(target: targets::FILTER, ?side, discarded, "filter reset");
    }

    /// Empties the visible list of `side`. Highlights go with the entries.
    fn begin_filter(&mut self, side: ListSide) {
        self.model.clear_highlight(side);
        self.list_filter_mut(side).begin();
    }

    fn dispatch_pending(&mut self) {
        if let Some(side) = self.dispatcher.dispatch_next() {
            self.begin_filter(side);
        }
    }

    fn apply_response(&mut self, response: WorkerResponse, in_flight: Option<ListSide>) {
        match response {
            WorkerResponse::AddOption { option } => match self.model.slot_of(option.value()) {
                Some(slot) => self.list_filter_mut(option.side()).reveal(slot),
                None => {
                    tracing::debug!(target: targets::FILTER, value = option.value(), "match for unknown option")
                }
            },
            WorkerResponse::Ready => {
                if let Some(side) = in_flight {
                    tracing::trace!(target: targets::FILTER, ?side, "filter finished");
                    self.filter_finished.emit(side);
                }
            }
        }
    }

    fn derive_buttons(&self) -> ButtonStates {
        let highlights = |side| -> Vec<bool> {
            self.visible_slots(side)
                .into_iter()
                .map(|slot| self.model.option(slot).is_selected())
                .collect()
        };
        ButtonStates::derive(
            &highlights(ListSide::Choices),
            &highlights(ListSide::Selection),
            &self.config,
        )
    }

    pub(crate) fn refresh_buttons(&mut self) {
        let buttons = self.derive_buttons();
        if buttons != self.buttons {
            self.buttons = buttons;
            self.buttons_changed.emit(buttons);
        }
    }

    /// Writes the selection into the native control and recomputes buttons.
    ///
    /// The host is notified only if membership or order changed.
    pub(crate) fn commit(&mut self, membership_changed: bool, order_changed: bool) {
        host::sync_selection(&mut self.control, &self.model);
        if order_changed {
            host::sync_order(&mut self.control, &self.model);
        }
        if membership_changed || order_changed {
            host::notify_change(&self.control);
        }
        self.refresh_buttons();
    }
}

impl<C: NativeControl + std::fmt::Debug> std::fmt::Debug for Palette<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Palette")
            .field("config", &self.config)
            .field("model", &self.model)
            .field("control", &self.control)
            .field("choices_filter", &self.choices_filter)
            .field("selection_filter", &self.selection_filter)
            .field("buttons", &self.buttons)
            .finish_non_exhaustive()
    }
}

static_assertions::assert_impl_all!(Palette: Send);

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;
    use crate::host::NativeOption;

    fn fruit(config: PaletteConfig) -> Palette {
        let select = NativeSelect::new(
            "fruit",
            vec![
                NativeOption::new("apple", "Red Apple"),
                NativeOption::new("pear", "Green Pear"),
                NativeOption::new("cherry", "Red Cherry").with_selected(true),
                NativeOption::new("lime", "Green Lime"),
            ],
        );
        Palette::new(select, config)
    }

    fn values(options: Vec<&PaletteOption>) -> Vec<&str> {
        options.into_iter().map(PaletteOption::value).collect()
    }

    #[test]
    fn test_initial_state_follows_native_control() {
        let palette = fruit(PaletteConfig::default().with_move_all(true));
        assert_eq!(values(palette.choices()), vec!["apple", "pear", "lime"]);
        assert_eq!(values(palette.selection()), vec!["cherry"]);
        let buttons = palette.buttons();
        assert!(buttons.add_all);
        assert!(buttons.remove_all);
        assert!(!buttons.add);
    }

    #[test]
    fn test_inline_filter_applies_immediately() {
        let mut palette = fruit(PaletteConfig::default().with_filter(true));
        let finished = Arc::new(Mutex::new(Vec::new()));
        let finished_clone = finished.clone();
        palette.filter_finished.connect(move |side: &ListSide| {
            finished_clone.lock().push(*side);
        });

        palette.filter(ListSide::Choices, "green");
        assert_eq!(values(palette.visible_choices()), vec!["pear", "lime"]);
        assert_eq!(values(palette.visible_selection()), vec!["cherry"]);
        assert_eq!(*finished.lock(), vec![ListSide::Choices]);

        palette.filter(ListSide::Choices, "green");
        assert_eq!(finished.lock().len(), 1);

        palette.clear_filter(ListSide::Choices);
        assert_eq!(values(palette.visible_choices()), vec!["apple", "pear", "lime"]);
        assert!(palette.list_filter(ListSide::Choices).is_active());
        assert_eq!(palette.list_filter(ListSide::Choices).query(), "");
    }

    #[test]
    fn test_invalid_worker_name_filters_inline() {
        let config =
            PaletteConfig::from_json(r#"{"filter":true,"workerScript":"filter\u0000worker"}"#).unwrap();
        let mut palette = fruit(config);

        palette.filter(ListSide::Choices, "red");
        assert_eq!(values(palette.visible_choices()), vec!["apple"]);
    }

    #[test]
    fn test_filter_ignored_when_disabled() {
        let mut palette = fruit(PaletteConfig::default());
        palette.filter(ListSide::Choices, "green");
        assert_eq!(palette.visible_choices().len(), 3);
        assert!(!palette.list_filter(ListSide::Choices).is_active());
    }

    #[test]
    fn test_filter_clears_highlights_on_that_side() {
        let mut palette = fruit(PaletteConfig::default().with_filter(true));
        palette.toggle_highlight("pear", true);
        palette.toggle_highlight("cherry", true);

        palette.filter(ListSide::Choices, "pear");
        assert!(palette.choices().iter().all(|option| !option.is_selected()));
        assert!(palette.model().find_by_value("cherry").is_some_and(PaletteOption::is_selected));
        assert!(!palette.buttons().add);
    }

    #[test]
    fn test_container_classes() {
        let palette = fruit(PaletteConfig::default());
        assert_eq!(palette.container_classes(), vec!["multi-select", "multi-select-horizontal"]);

        let palette = fruit(PaletteConfig::default().with_vertical(true).with_custom_class("wide"));
        assert_eq!(
            palette.container_classes(),
            vec!["multi-select", "multi-select-vertical", "wide"]
        );
    }

    #[test]
    fn test_reattach_keeps_lists() {
        let mut palette = fruit(PaletteConfig::default());
        let replacement = NativeSelect::new("fruit-2", vec![NativeOption::new("other", "Other")]);
        let previous = palette.reattach(replacement);
        assert_eq!(previous.values(), vec!["apple", "pear", "cherry", "lime"]);
        assert_eq!(palette.control().values(), vec!["other"]);
        assert_eq!(values(palette.selection()), vec!["cherry"]);

        let control = palette.teardown();
        assert_eq!(control.values(), vec!["other"]);
    }
}
