//! A dual-list ("palette") selection widget model.
//!
//! A palette presents two ordered lists, the available choices and the
//! current selection, with operations to move options between them,
//! reorder the selection and filter either list by text. Its state is
//! mirrored into a host's native multi-selection control so form
//! submission and change listeners keep working unmodified.
//!
//! Rendering is left to the host: it reads [`Palette::visible_choices`],
//! [`Palette::visible_selection`] and [`Palette::buttons`], and feeds user
//! input back as [`PaletteEvent`]s.
//!
//! # Example
//!
//! ```
//! use multiselect::{
//!     KeyboardModifiers, NativeOption, NativeSelect, Palette, PaletteButton, PaletteConfig,
//!     PaletteEvent,
//! };
//!
//! let select = NativeSelect::new(
//!     "colors",
//!     vec![
//!         NativeOption::new("r", "Red"),
//!         NativeOption::new("g", "Green"),
//!         NativeOption::new("b", "Blue"),
//!     ],
//! );
//! select.changed.connect(|event| println!("{} -> {:?}", event.id, event.selected));
//!
//! let mut palette = Palette::new(select, PaletteConfig::default().with_order(true));
//! palette.handle_event(PaletteEvent::Click {
//!     value: "b".into(),
//!     modifiers: KeyboardModifiers::NONE,
//! });
//! palette.handle_event(PaletteEvent::ButtonClicked(PaletteButton::Add));
//!
//! assert_eq!(palette.control().selected_values(), vec!["b"]);
//! assert!(palette.buttons().remove);
//! ```
//!
//! # Filtering
//!
//! With [`PaletteConfig::worker_script`] set, filtering runs on a dedicated
//! background thread and the host applies results by calling
//! [`Palette::process_filter_messages`]. Without it, filtering runs inline.

pub mod buttons;
pub mod config;
mod error;
pub mod event;
pub mod filter;
pub mod host;
pub mod model;
mod palette;
mod reconcile;

pub use buttons::ButtonStates;
pub use config::{LocalizedText, PaletteConfig};
pub use error::{PaletteError, Result};
pub use event::{Key, KeyboardModifiers, PaletteButton, PaletteEvent};
pub use filter::{FilterDispatcher, ListFilter, WorkerRequest, WorkerResponse};
pub use host::{ChangeEvent, NativeControl, NativeOption, NativeSelect};
pub use model::{ListSide, OptionModel, PaletteOption};
pub use palette::Palette;

pub use multiselect_core::{ConnectionId, Signal};
