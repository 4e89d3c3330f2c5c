//! State core of the Nexus dashboard.
//!
//! Holds the crypto, weather and news stores fed by a [`source::DataSource`],
//! the persisted favorites and notification log, and the background tasks
//! (simulated push feed, periodic refresh) that keep them moving.  Hosts
//! build a [`Dashboard`], call [`Dashboard::start`], and read the stores or
//! subscribe to [`DashboardEvent`]s.

pub mod catalog;
pub mod events;
pub mod feed;
mod persist;
pub mod poller;
pub mod source;
pub mod state;
pub mod status;
pub mod stores;

pub use events::{DashboardEvent, EventBus};
pub use feed::{FeedConfig, PriceBasis};
pub use persist::SharedDatabase;
pub use poller::PollConfig;
pub use state::{BackgroundTasks, Dashboard, DashboardConfig};
pub use status::{FetchKind, TargetStatus};
