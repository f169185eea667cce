// File: tikplays-common/src/models/mod.rs
pub mod battle;
pub mod countdown;
pub mod gift;
pub mod goals;
pub mod leaderboard;
pub mod overlay;
pub mod prefs;
pub mod profile;
pub mod rule;
pub mod top_gift;
pub mod wins;

pub use battle::{BattleConfig, BattleSnapshot, BattleState};
pub use countdown::{AddSource, CountdownAction, CountdownAdded, CountdownConfig, CountdownState};
pub use gift::{AvailableGift, GiftCatalog, GiftEvent, GiftInfo, LiveEvent, RawGift};
pub use goals::{Goal, GoalState};
pub use leaderboard::{CoinBoardSnapshot, CoinBoardState, LeaderboardConfig, LeaderboardConfigPatch, LeaderboardEntry};
pub use overlay::OverlayEvent;
pub use prefs::Prefs;
pub use profile::{ProfileBundle, ProfileEntry, ProfileIndex};
pub use rule::{ActionRule, Capability, MAX_REPEAT, RawRuleMap, RuleTarget};
pub use top_gift::TopGiftRecord;
pub use wins::{WinCounterState, WinsConfig};
