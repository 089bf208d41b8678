pub mod compose;
pub mod counts;
pub mod feed;
pub mod membership;
pub mod reactions;

pub use compose::{compose, ComposeOptions, FeedFilter, FeedSort};
pub use counts::CountAggregator;
pub use feed::{FeedCoordinator, FeedService, FeedSnapshot};
pub use membership::MembershipOracle;
pub use reactions::{Applied, PostReactionView, ReactionEngine, ToggleOutcome};
