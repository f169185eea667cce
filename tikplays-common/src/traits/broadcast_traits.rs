use crate::models::OverlayEvent;

/// Outbound side of the excluded transport layer. Implementations must not
/// block: subsystems call this synchronously while handling live events.
pub trait StateBroadcaster: Send + Sync {
    fn broadcast(&self, event: OverlayEvent);
}
