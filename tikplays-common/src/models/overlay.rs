//! Broadcast payloads pushed to observers, one variant per logical channel.

use serde::{Deserialize, Serialize};

use super::{
    BattleSnapshot, CoinBoardSnapshot, CountdownAdded, CountdownState, GiftCatalog, Goal, GoalState,
    TopGiftRecord, WinCounterState,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundCue {
    pub url: String,
    pub volume: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoCue {
    pub url: String,
    pub volume: f64,
    #[serde(rename = "loop")]
    pub looped: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGift {
    pub gift_id: String,
    pub username: String,
    pub quantity: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "channel", content = "payload")]
pub enum OverlayEvent {
    #[serde(rename = "countdown")]
    Countdown(CountdownState),
    #[serde(rename = "countdown:add")]
    CountdownAdd(CountdownAdded),
    #[serde(rename = "giftBattle")]
    GiftBattle(BattleSnapshot),
    #[serde(rename = "coinBoard")]
    CoinBoard(CoinBoardSnapshot),
    #[serde(rename = "wins")]
    Wins(WinCounterState),
    #[serde(rename = "goals")]
    Goals(GoalState),
    #[serde(rename = "likeProgress")]
    LikeProgress(Goal),
    #[serde(rename = "followersProgress")]
    FollowersProgress(Goal),
    #[serde(rename = "topGiftUpdate")]
    TopGiftUpdate(TopGiftRecord),
    #[serde(rename = "playSound")]
    PlaySound(SoundCue),
    #[serde(rename = "playVideo")]
    PlayVideo(VideoCue),
    #[serde(rename = "newGift")]
    NewGift(NewGift),
    #[serde(rename = "giftCatalog")]
    GiftCatalog(GiftCatalog),
    /// Human-readable activity line for the operator console.
    #[serde(rename = "log")]
    Log(String),
}

impl OverlayEvent {
    pub fn channel(&self) -> &'static str {
        match self {
            OverlayEvent::Countdown(_) => "countdown",
            OverlayEvent::CountdownAdd(_) => "countdown:add",
            OverlayEvent::GiftBattle(_) => "giftBattle",
            OverlayEvent::CoinBoard(_) => "coinBoard",
            OverlayEvent::Wins(_) => "wins",
            OverlayEvent::Goals(_) => "goals",
            OverlayEvent::LikeProgress(_) => "likeProgress",
            OverlayEvent::FollowersProgress(_) => "followersProgress",
            OverlayEvent::TopGiftUpdate(_) => "topGiftUpdate",
            OverlayEvent::PlaySound(_) => "playSound",
            OverlayEvent::PlayVideo(_) => "playVideo",
            OverlayEvent::NewGift(_) => "newGift",
            OverlayEvent::GiftCatalog(_) => "giftCatalog",
            OverlayEvent::Log(_) => "log",
        }
    }
}
