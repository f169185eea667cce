pub mod broadcast_traits;
pub mod profile_traits;

pub use broadcast_traits::StateBroadcaster;
pub use profile_traits::ProfileStore;
