pub mod battle;
pub mod coin_board;
pub mod countdown;
pub mod goals;
pub mod top_gift;
pub mod wins;

pub use battle::BattleScorer;
pub use coin_board::CoinLeaderboard;
pub use countdown::{CountdownPhase, CountdownTimer};
pub use goals::GoalTracker;
pub use top_gift::TopGiftTracker;
pub use wins::WinCounter;
