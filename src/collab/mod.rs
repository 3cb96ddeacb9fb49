//! Collaboration
//!
//! Marker events exchanged between replicas of one editing session and the
//! rules for folding them into local state. Transport is abstract.

mod event;
mod merge;
mod port;

pub use event::{CollabEvent, RemoteMarkerUpdate};
pub use merge::MergeOutcome;
pub use port::{ChannelPort, CollabPort};
