//! # relay-status-feed
//!
//! Synthetic status feed for the DERP relay subscription landing page.
//!
//! A [`StatusFeed`] owns a fixed [`Roster`] of relay points of presence and
//! republishes it on a timer with a small random jitter added to each node's
//! base latency. No measurement or networking takes place; the numbers only
//! drive a read-only display list.

pub mod config;
pub mod error;
pub mod feed;
pub mod logging;
pub mod render;
pub mod roster;

pub use config::FeedConfig;
pub use error::{Error, Result};
pub use feed::{FeedOptions, FeedSubscription, NodeStatus, StatusFeed, StatusSnapshot};
pub use roster::{NodeDescriptor, Roster, Tier};
