mod member;
mod membership;

pub use member::MemberId;
pub use membership::cluster_membership;
pub use membership::ClusterMembership;
pub use membership::MembershipChangeListener;
pub use membership::MembershipProvider;
