//! 擬似ノードステータスフィード
//!
//! 固定名簿の各ノードに揺らぎを加えたレイテンシを周期的に公開します。
//! 実際の計測は行いません。

pub mod jitter;
pub mod snapshot;
pub mod status_feed;

pub use jitter::{FixedJitter, JitterSource, RandomJitter};
pub use snapshot::{next_snapshot, NodeStatus, StatusSnapshot};
pub use status_feed::{
    FeedOptions, FeedSubscription, StatusFeed, DEFAULT_INTERVAL, DEFAULT_MAX_JITTER_MS,
};
