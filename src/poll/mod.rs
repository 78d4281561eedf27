//! Polling data views.
//!
//! Every screen of the dashboard follows the same lifecycle: fetch on start,
//! fetch again on a fixed interval, and publish the outcome as a
//! [`ViewState`]. [`PollingController`] owns that lifecycle for one
//! [`Resource`].
//!
//! # Ordering
//!
//! Fetches are independent tasks with variable latency, so responses can
//! arrive out of order. Each `start()`/`stop()` opens a new *generation*,
//! and each fetch captures `(generation, sequence)` when it is issued. A
//! result is committed only if its generation is still current and no
//! later-issued fetch has already been committed. A response can therefore
//! never move the view backwards in time, and nothing lands after `stop()`.
//!
//! # Example
//!
//! ```ignore
//! let mut view = PollingController::new(views::top_artists(), api, session, StaleDataPolicy::Retain);
//! view.start(TimeRange::ShortTerm, PollConfig::every(Duration::from_secs(300))?);
//! let mut updates = view.subscribe();
//! while updates.changed().await.is_ok() {
//!     render(&*updates.borrow());
//! }
//! ```

mod config;
mod controller;
mod state;

pub use config::{PollConfig, PollConfigError};
pub use controller::{PollingController, Resource};
pub use state::{StaleDataPolicy, ViewState};
