//! Text filtering and the filter worker protocol.
//!
//! Filtering runs away from the UI thread. The palette queues a
//! [`WorkerRequest::Filter`] carrying a copy of every option; the worker
//! answers with one [`WorkerResponse::AddOption`] per match, in native
//! order, followed by exactly one [`WorkerResponse::Ready`].
//!
//! # Matching
//!
//! The query is lowercased and split on whitespace. An option matches when
//! every query word is a substring of at least one word of the option's
//! match text (its filter text, or its lowercased label).
//!
//! ```
//! use multiselect::filter::matches_query;
//! use multiselect::PaletteOption;
//!
//! let apple = PaletteOption::new(0, "1", "Red Apple");
//! let pear = PaletteOption::new(1, "2", "Green Pear");
//!
//! assert!(matches_query(&apple, "re ap"));
//! assert!(!matches_query(&pear, "re ap"));
//! ```

use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use multiselect_core::logging::{PerfSpan, span_names, targets};
use multiselect_core::{Outbox, QueuedTask, TaskQueue, Worker, WorkerConfig};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{ListSide, PaletteOption, Slot};

/// Messages sent to the filter worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum WorkerRequest {
    /// Report every option of one list matching `filter_input`.
    Filter {
        /// Copy of the whole option set.
        options: Vec<PaletteOption>,
        /// `true` to filter the selection list, `false` for the choices list.
        selected: bool,
        /// The raw query text.
        #[serde(rename = "filterInput")]
        filter_input: String,
    },
}

impl WorkerRequest {
    /// Creates a filter request for one list.
    pub fn filter(options: Vec<PaletteOption>, side: ListSide, filter_input: impl Into<String>) -> Self {
        Self::Filter {
            options,
            selected: side.is_selection(),
            filter_input: filter_input.into(),
        }
    }

    /// The list this request targets.
    pub fn side(&self) -> ListSide {
        match self {
            Self::Filter { selected, .. } => ListSide::from_in_selection(*selected),
        }
    }

    /// Encodes the request as a JSON message.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decodes a JSON message.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl QueuedTask for WorkerRequest {
    fn coalesces(&self) -> bool {
        matches!(self, Self::Filter { .. })
    }

    /// Coalescing is per list: a queued filter is dropped only by a newer
    /// filter for the same list, so a pending filter for the other list
    /// still runs.
    fn supersedes(&self, queued: &Self) -> bool {
        match (self, queued) {
            (Self::Filter { selected: a, .. }, Self::Filter { selected: b, .. }) => a == b,
        }
    }
}

/// Messages posted back by the filter worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum WorkerResponse {
    /// One matching option, as it was in the request's snapshot.
    AddOption { option: PaletteOption },
    /// The request is finished; the worker can take the next task.
    Ready,
}

impl WorkerResponse {
    /// Encodes the response as a JSON message.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decodes a JSON message.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Lowercased query words; empty words are dropped.
pub fn query_words(query: &str) -> Vec<String> {
    query.to_lowercase().split_whitespace().map(str::to_owned).collect()
}

fn matches_words(option: &PaletteOption, words: &[String]) -> bool {
    let text = option.match_text();
    let option_words: Vec<&str> = text.split_whitespace().collect();
    words
        .iter()
        .all(|word| option_words.iter().any(|candidate| candidate.contains(word.as_str())))
}

/// Whether `option` matches the query text.
pub fn matches_query(option: &PaletteOption, query: &str) -> bool {
    matches_words(option, &query_words(query))
}

/// Builds a filter text from a set of filter words.
///
/// Each word is trimmed and lowercased; empty words are skipped. Returns
/// `None` when no word remains, meaning the label should be used instead.
pub fn filter_text_from_words<I, S>(words: I) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let cleaned: Vec<String> = words
        .into_iter()
        .map(|word| word.as_ref().trim().to_lowercase())
        .filter(|word| !word.is_empty())
        .collect();
    (!cleaned.is_empty()).then(|| cleaned.join(" "))
}

/// Executes one request, posting results through `post`.
///
/// Runs on the worker thread, or inline when no worker is available.
pub fn execute(request: WorkerRequest, mut post: impl FnMut(WorkerResponse)) {
    match request {
        WorkerRequest::Filter {
            options,
            selected,
            filter_input,
        } => {
            let _span = PerfSpan::new(span_names::FILTER_RUN);
            let words = query_words(&filter_input);
            let mut matched = 0usize;
            for option in options {
                if option.in_selection() == selected && matches_words(&option, &words) {
                    matched += 1;
                    post(WorkerResponse::AddOption { option });
                }
            }
            tracing::trace!(target: targets::FILTER, query = %filter_input, selected, matched, "filter executed");
            post(WorkerResponse::Ready);
        }
    }
}

/// Filter state of one list.
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    previous: String,
    matches: Option<HashSet<Slot>>,
}

impl ListFilter {
    /// The last query text submitted for this list.
    pub fn query(&self) -> &str {
        &self.previous
    }

    /// Whether the list currently shows a filtered subset.
    pub fn is_active(&self) -> bool {
        self.matches.is_some()
    }

    pub(crate) fn is_visible(&self, slot: Slot) -> bool {
        self.matches.as_ref().is_none_or(|matches| matches.contains(&slot))
    }

    /// Records `query`; returns `false` if it equals the previous one.
    pub(crate) fn set_query(&mut self, query: &str) -> bool {
        if self.previous == query {
            return false;
        }
        self.previous = query.to_owned();
        true
    }

    /// Empties the visible list until results arrive.
    pub(crate) fn begin(&mut self) {
        self.matches = Some(HashSet::new());
    }

    /// Makes `slot` visible if a filter is active.
    pub(crate) fn reveal(&mut self, slot: Slot) {
        if let Some(matches) = &mut self.matches {
            matches.insert(slot);
        }
    }

    pub(crate) fn reset(&mut self) {
        self.previous.clear();
        self.matches = None;
    }
}

enum Executor {
    Background(Worker<WorkerRequest, WorkerResponse>),
    Inline(VecDeque<WorkerResponse>),
}

/// Serializes filter tasks onto a single execution slot.
///
/// Holds the task queue, the worker and the busy flag. At most one request
/// is in flight; the next is dispatched only after `Ready` arrives.
pub struct FilterDispatcher {
    queue: TaskQueue<WorkerRequest>,
    executor: Executor,
    in_flight: Option<ListSide>,
}

impl FilterDispatcher {
    /// Creates a dispatcher backed by a worker thread named `worker_name`.
    ///
    /// Without a name, or when the thread cannot be spawned, requests are
    /// executed inline on the calling thread.
    pub fn new(worker_name: Option<&str>) -> Self {
        match worker_name {
            Some(name) => Self::try_new(name).unwrap_or_else(|err| {
                tracing::warn!(target: targets::FILTER, error = %err, "filter worker unavailable, filtering inline");
                Self::inline()
            }),
            None => Self::inline(),
        }
    }

    /// Creates a dispatcher backed by a worker thread, failing if the
    /// thread cannot be spawned.
    pub fn try_new(worker_name: &str) -> Result<Self> {
        let worker = Worker::spawn(WorkerConfig::with_name(worker_name), run_worker_request)?;
        Ok(Self::with_executor(Executor::Background(worker)))
    }

    /// Creates a dispatcher that always filters on the calling thread.
    pub fn inline() -> Self {
        Self::with_executor(Executor::Inline(VecDeque::new()))
    }

    fn with_executor(executor: Executor) -> Self {
        Self {
            queue: TaskQueue::new(),
            executor,
            in_flight: None,
        }
    }

    /// Whether requests run on a background thread.
    pub fn is_background(&self) -> bool {
        matches!(self.executor, Executor::Background(_))
    }

    /// Whether a request is in flight.
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// The list targeted by the in-flight request.
    pub fn in_flight(&self) -> Option<ListSide> {
        self.in_flight
    }

    /// Number of queued, not yet dispatched requests.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Whether nothing is queued or in flight.
    pub fn is_idle(&self) -> bool {
        self.in_flight.is_none() && self.queue.is_empty()
    }

    /// Queues a request, superseding any queued filter for the same list.
    pub fn submit(&mut self, request: WorkerRequest) {
        let side = request.side();
        let submitted = self.queue.submit(request);
        tracing::debug!(
            target: targets::FILTER,
            ?side,
            task = submitted.id.as_u64(),
            superseded = submitted.superseded.len(),
            "filter queued"
        );
    }

    /// Drops queued requests for one list. The in-flight one still completes.
    pub fn discard_queued(&mut self, side: ListSide) -> usize {
        self.queue.discard(|request| request.side() == side)
    }

    /// Dispatches the tail of the queue if the slot is free.
    ///
    /// Returns the list targeted by the dispatched request.
    pub fn dispatch_next(&mut self) -> Option<ListSide> {
        if self.in_flight.is_some() {
            return None;
        }
        let (id, request) = self.queue.take_next()?;
        let side = request.side();
        self.in_flight = Some(side);
        tracing::trace!(target: targets::FILTER, task = id.as_u64(), ?side, "filter dispatched");

        match &mut self.executor {
            Executor::Background(worker) => {
                if let Err(rejected) = worker.send(request) {
                    tracing::warn!(target: targets::FILTER, error = %rejected.error, "worker rejected filter, filtering inline");
                    let mut buffered = VecDeque::new();
                    execute(rejected.request, |response| buffered.push_back(response));
                    self.executor = Executor::Inline(buffered);
                }
            }
            Executor::Inline(buffered) => execute(request, |response| buffered.push_back(response)),
        }
        Some(side)
    }

    /// Takes the next response without blocking.
    pub fn poll(&mut self) -> Option<WorkerResponse> {
        let response = match &mut self.executor {
            Executor::Background(worker) => worker.try_recv(),
            Executor::Inline(buffered) => buffered.pop_front(),
        };
        self.observe(response)
    }

    /// Waits up to `timeout` for the next response.
    pub fn poll_timeout(&mut self, timeout: Duration) -> Option<WorkerResponse> {
        let response = match &mut self.executor {
            Executor::Background(worker) => worker.recv_timeout(timeout),
            Executor::Inline(_) => return self.poll(),
        };
        self.observe(response)
    }

    fn observe(&mut self, response: Option<WorkerResponse>) -> Option<WorkerResponse> {
        if matches!(response, Some(WorkerResponse::Ready)) {
            self.in_flight = None;
        }
        response
    }

    /// Stops the worker thread and waits for it.
    pub fn shutdown(&mut self) {
        self.queue.clear();
        if let Executor::Background(worker) = &self.executor {
            worker.stop_and_join();
        }
    }
}

fn run_worker_request(request: WorkerRequest, outbox: &Outbox<WorkerResponse>) {
    execute(request, |response| {
        outbox.post(response);
    });
}

#[cfg(test)]
mod tests {
    use multiselect_core::CoreError;

    use super::*;
    use crate::error::PaletteError;

    fn fruit() -> Vec<PaletteOption> {
        vec![
            PaletteOption::new(0, "apple", "Red Apple"),
            PaletteOption::new(1, "pear", "Green Pear"),
            PaletteOption::new(2, "grape", "Grape").with_filter_text(Some("vine purple".into())),
            PaletteOption::new(3, "cherry", "Red Cherry").with_in_selection(true),
        ]
    }

    fn run(request: WorkerRequest) -> Vec<WorkerResponse> {
        let mut responses = Vec::new();
        execute(request, |response| responses.push(response));
        responses
    }

    fn matched_values(responses: &[WorkerResponse]) -> Vec<&str> {
        responses
            .iter()
            .filter_map(|response| match response {
                WorkerResponse::AddOption { option } => Some(option.value()),
                WorkerResponse::Ready => None,
            })
            .collect()
    }

    #[test]
    fn test_every_query_word_must_match() {
        let options = fruit();
        assert!(matches_query(&options[0], "re ap"));
        assert!(!matches_query(&options[1], "re ap"));
        assert!(matches_query(&options[1], "EE"));
        assert!(matches_query(&options[0], "  "));
    }

    #[test]
    fn test_filter_text_overrides_label() {
        let options = fruit();
        assert!(matches_query(&options[2], "purp"));
        assert!(!matches_query(&options[2], "grape"));
    }

    #[test]
    fn test_execute_reports_matches_then_ready() {
        let responses = run(WorkerRequest::filter(fruit(), ListSide::Choices, "red"));
        assert_eq!(matched_values(&responses), vec!["apple"]);
        assert_eq!(responses.last(), Some(&WorkerResponse::Ready));

        let responses = run(WorkerRequest::filter(fruit(), ListSide::Selection, "red"));
        assert_eq!(matched_values(&responses), vec!["cherry"]);
    }

    #[test]
    fn test_empty_query_matches_whole_side_in_index_order() {
        let responses = run(WorkerRequest::filter(fruit(), ListSide::Choices, ""));
        assert_eq!(matched_values(&responses), vec!["apple", "pear", "grape"]);
        assert_eq!(responses.len(), 4);
    }

    #[test]
    fn test_filter_text_from_words() {
        assert_eq!(
            filter_text_from_words([" Fruit ", "", "RED", "   "]),
            Some("fruit red".to_string())
        );
        assert_eq!(filter_text_from_words(Vec::<String>::new()), None);
        assert_eq!(filter_text_from_words(["  "]), None);
    }

    #[test]
    fn test_protocol_json_shape() {
        let request = WorkerRequest::filter(vec![PaletteOption::new(0, "v", "Label")], ListSide::Selection, "la");
        let json: serde_json::Value = serde_json::from_str(&request.to_json().unwrap()).unwrap();
        assert_eq!(json["command"], "filter");
        assert_eq!(json["selected"], true);
        assert_eq!(json["filterInput"], "la");
        assert_eq!(json["options"][0]["inSelection"], false);
        assert!(json["options"][0].get("filterText").is_none());

        let ready = WorkerResponse::from_json(r#"{"command":"ready"}"#).unwrap();
        assert_eq!(ready, WorkerResponse::Ready);

        let add = WorkerResponse::from_json(
            r#"{"command":"addOption","option":{"index":3,"order":1,"value":"x","label":"X","inSelection":true,"selected":false}}"#,
        )
        .unwrap();
        match add {
            WorkerResponse::AddOption { option } => {
                assert_eq!(option.order(), 1);
                assert!(option.in_selection());
            }
            WorkerResponse::Ready => panic!("expected addOption"),
        }
    }

    #[test]
    fn test_inline_dispatcher_runs_one_request_at_a_time() {
        let mut dispatcher = FilterDispatcher::inline();
        assert!(!dispatcher.is_background());

        dispatcher.submit(WorkerRequest::filter(fruit(), ListSide::Choices, "a"));
        assert_eq!(dispatcher.dispatch_next(), Some(ListSide::Choices));
        dispatcher.submit(WorkerRequest::filter(fruit(), ListSide::Choices, "ap"));
        assert_eq!(dispatcher.dispatch_next(), None);

        let mut seen = Vec::new();
        while let Some(response) = dispatcher.poll() {
            seen.push(response);
        }
        assert_eq!(seen.last(), Some(&WorkerResponse::Ready));
        assert!(!dispatcher.is_busy());
        assert_eq!(dispatcher.pending(), 1);
        assert_eq!(dispatcher.dispatch_next(), Some(ListSide::Choices));
    }

    #[test]
    fn test_coalescing_keeps_other_list() {
        let mut dispatcher = FilterDispatcher::inline();
        dispatcher.submit(WorkerRequest::filter(fruit(), ListSide::Choices, "a"));
        dispatcher.submit(WorkerRequest::filter(fruit(), ListSide::Selection, "z"));
        dispatcher.submit(WorkerRequest::filter(fruit(), ListSide::Choices, "ap"));
        assert_eq!(dispatcher.pending(), 2);

        assert_eq!(dispatcher.dispatch_next(), Some(ListSide::Choices));
        while dispatcher.poll().is_some() {}
        assert_eq!(dispatcher.dispatch_next(), Some(ListSide::Selection));
    }

    #[test]
    fn test_unspawnable_worker_falls_back_to_inline() {
        assert!(matches!(
            FilterDispatcher::try_new("filter\0worker"),
            Err(PaletteError::Core(CoreError::WorkerSpawn { .. }))
        ));

        let mut dispatcher = FilterDispatcher::new(Some("filter\0worker"));
        assert!(!dispatcher.is_background());
        dispatcher.submit(WorkerRequest::filter(fruit(), ListSide::Choices, "red"));
        dispatcher.dispatch_next();

        let responses: Vec<_> = std::iter::from_fn(|| dispatcher.poll()).collect();
        assert_eq!(matched_values(&responses), vec!["apple"]);
        assert!(dispatcher.is_idle());
    }

    #[test]
    fn test_rejected_request_runs_inline() {
        let mut dispatcher = FilterDispatcher::try_new("filter-rejecting").unwrap();
        assert!(dispatcher.is_background());
        dispatcher.shutdown();

        dispatcher.submit(WorkerRequest::filter(fruit(), ListSide::Choices, "pear"));
        assert_eq!(dispatcher.dispatch_next(), Some(ListSide::Choices));
        assert!(!dispatcher.is_background());

        let responses: Vec<_> = std::iter::from_fn(|| dispatcher.poll()).collect();
        assert_eq!(matched_values(&responses), vec!["pear"]);
        assert_eq!(responses.last(), Some(&WorkerResponse::Ready));
        assert!(!dispatcher.is_busy());
    }

    #[test]
    fn test_list_filter_visibility() {
        let mut filter = ListFilter::default();
        assert!(filter.is_visible(3));

        assert!(filter.set_query("ab"));
        assert!(!filter.set_query("ab"));
        filter.begin();
        assert!(!filter.is_visible(3));
        filter.reveal(3);
        assert!(filter.is_visible(3));

        filter.reset();
        assert!(!filter.is_active());
        assert_eq!(filter.query(), "");
    }
}
