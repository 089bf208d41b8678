pub mod comments;
pub mod communities;
pub mod media;
pub mod memberships;
pub mod polls;
pub mod posts;
pub mod profiles;
pub mod reactions;

pub use comments::CommentRepository;
pub use communities::CommunityRepository;
pub use media::MediaRepository;
pub use memberships::{MembershipSource, TableMembershipSource};
pub use polls::PollRepository;
pub use posts::PostRepository;
pub use profiles::ProfileRepository;
pub use reactions::{PostReaction, ReactionRepository};
