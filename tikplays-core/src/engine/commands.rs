//! Operator commands and their replies.
//!
//! Commands arrive as JSON objects carrying a `command` name; every other
//! field is sanitized the same way the persisted documents are.

use serde::Serialize;
use serde_json::Value;

use tikplays_common::Error;
use tikplays_common::models::{
    AvailableGift, BattleConfig, BattleSnapshot, CoinBoardSnapshot, CountdownAction, CountdownConfig, CountdownState,
    GiftCatalog, GoalState, LeaderboardConfigPatch, Prefs, ProfileBundle, ProfileEntry, ProfileIndex, RawRuleMap,
    WinCounterState, WinsConfig,
};
use tikplays_common::sanitize::{as_int, as_text, field};

use crate::engine::bundle::EngineSnapshot;

#[derive(Debug, Clone, PartialEq)]
pub enum BattleCommand {
    Reset,
    Configure(BattleConfig),
}

#[derive(Debug, Clone, PartialEq)]
pub enum CoinBoardCommand {
    Reset,
    Configure(LeaderboardConfigPatch),
}

#[derive(Debug, Clone, PartialEq)]
pub enum WinsCommand {
    Inc,
    Dec,
    Reset,
    Set(i64),
    Configure(WinsConfig),
}

/// A gift injected by the operator. Goes through the regular gift path as a
/// single (non-streak) gift.
#[derive(Debug, Clone, PartialEq)]
pub struct TestGift {
    pub gift_id: String,
    pub username: String,
    pub quantity: u64,
    pub display_name: Option<String>,
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OperatorCommand {
    Countdown {
        action: Option<CountdownAction>,
        config: Option<CountdownConfig>,
    },
    Battle(BattleCommand),
    CoinBoard(CoinBoardCommand),
    Wins(WinsCommand),
    SetGoals(Value),
    SetPrefs(Value),
    SetRules(RawRuleMap),
    GetRules,
    SetGiftCatalog(Vec<AvailableGift>),
    TestGift(TestGift),
    Snapshot,
    ListProfiles,
    CreateProfile { name: String },
    RenameProfile { id: String, name: String },
    SwitchProfile { id: String },
    DeleteProfile { id: String },
    /// `None` exports the active profile.
    ExportProfile { id: Option<String> },
    ImportProfile(ProfileBundle),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CommandReply {
    Countdown(CountdownState),
    Battle(BattleSnapshot),
    CoinBoard(CoinBoardSnapshot),
    Wins(WinCounterState),
    Goals(GoalState),
    Prefs(Prefs),
    Rules(RawRuleMap),
    Catalog(GiftCatalog),
    Snapshot(Box<EngineSnapshot>),
    Profiles(ProfileIndex),
    Profile(ProfileEntry),
    Bundle(ProfileBundle),
}

fn text(raw: &Value, key: &str) -> Result<String, Error> {
    field(raw, key)
        .and_then(as_text)
        .ok_or_else(|| Error::Parse(format!("missing '{}'", key)))
}

fn object(raw: &Value, key: &str) -> Value {
    field(raw, key)
        .filter(|v| v.is_object())
        .cloned()
        .unwrap_or_else(|| Value::Object(Default::default()))
}

fn action_of(raw: &Value) -> Option<&str> {
    field(raw, "action").and_then(Value::as_str)
}

impl OperatorCommand {
    pub fn from_value(raw: &Value) -> Result<Self, Error> {
        let name = field(raw, "command")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::Parse("missing 'command'".into()))?;

        let cmd = match name {
            "countdown" => {
                let action = match field(raw, "action") {
                    Some(_) => Some(
                        CountdownAction::from_value(raw).ok_or_else(|| Error::Parse("unknown countdown action".into()))?,
                    ),
                    None => None,
                };
                OperatorCommand::Countdown {
                    action,
                    config: field(raw, "config").map(CountdownConfig::from_value),
                }
            }
            "battle" => match action_of(raw) {
                Some("reset") => OperatorCommand::Battle(BattleCommand::Reset),
                _ => OperatorCommand::Battle(BattleCommand::Configure(BattleConfig::from_value(&object(raw, "config")))),
            },
            "coinBoard" => match action_of(raw) {
                Some("reset") => OperatorCommand::CoinBoard(CoinBoardCommand::Reset),
                _ => OperatorCommand::CoinBoard(CoinBoardCommand::Configure(LeaderboardConfigPatch::from_value(
                    &object(raw, "config"),
                ))),
            },
            "wins" => OperatorCommand::Wins(match action_of(raw) {
                Some("inc") => WinsCommand::Inc,
                Some("dec") => WinsCommand::Dec,
                Some("reset") => WinsCommand::Reset,
                Some("set") => WinsCommand::Set(field(raw, "value").and_then(as_int).unwrap_or(0)),
                Some(other) => return Err(Error::Parse(format!("unknown wins action '{}'", other))),
                None => WinsCommand::Configure(WinsConfig::from_value(&object(raw, "config"))),
            }),
            "setGoals" => OperatorCommand::SetGoals(object(raw, "goals")),
            "setPrefs" => OperatorCommand::SetPrefs(object(raw, "prefs")),
            "setRules" => {
                let rules = field(raw, "rules")
                    .and_then(Value::as_object)
                    .ok_or_else(|| Error::Parse("'rules' must be an object".into()))?;
                OperatorCommand::SetRules(rules.clone().into_iter().collect())
            }
            "getRules" => OperatorCommand::GetRules,
            "setGiftCatalog" => {
                let gifts = field(raw, "gifts")
                    .and_then(Value::as_array)
                    .map(|list| {
                        list.iter()
                            .filter_map(|g| serde_json::from_value::<AvailableGift>(g.clone()).ok())
                            .collect()
                    })
                    .unwrap_or_default();
                OperatorCommand::SetGiftCatalog(gifts)
            }
            "testGift" => OperatorCommand::TestGift(TestGift {
                gift_id: text(raw, "giftId")?,
                username: field(raw, "username").and_then(as_text).unwrap_or_else(|| "tester".into()),
                quantity: field(raw, "quantity")
                    .and_then(as_int)
                    .filter(|n| *n >= 1)
                    .map(|n| n as u64)
                    .unwrap_or(1),
                display_name: field(raw, "displayName").and_then(as_text),
                avatar: field(raw, "avatar").and_then(as_text),
            }),
            "snapshot" => OperatorCommand::Snapshot,
            "listProfiles" => OperatorCommand::ListProfiles,
            "createProfile" => OperatorCommand::CreateProfile {
                name: field(raw, "name").and_then(Value::as_str).unwrap_or_default().to_string(),
            },
            "renameProfile" => OperatorCommand::RenameProfile {
                id: text(raw, "id")?,
                name: field(raw, "name").and_then(Value::as_str).unwrap_or_default().to_string(),
            },
            "switchProfile" => OperatorCommand::SwitchProfile { id: text(raw, "id")? },
            "deleteProfile" => OperatorCommand::DeleteProfile { id: text(raw, "id")? },
            "exportProfile" => OperatorCommand::ExportProfile {
                id: field(raw, "id").and_then(as_text),
            },
            "importProfile" => {
                let bundle = field(raw, "bundle").ok_or_else(|| Error::Parse("missing 'bundle'".into()))?;
                OperatorCommand::ImportProfile(serde_json::from_value(bundle.clone())?)
            }
            other => return Err(Error::Parse(format!("unknown command '{}'", other))),
        };
        Ok(cmd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn countdown_command_carries_action_and_config() {
        let cmd = OperatorCommand::from_value(&json!({
            "command": "countdown", "action": "add", "seconds": "15", "config": {"maxSeconds": 600}
        }))
        .unwrap();
        match cmd {
            OperatorCommand::Countdown { action, config } => {
                assert_eq!(action, Some(CountdownAction::Add { seconds: 15 }));
                assert_eq!(config.unwrap().max_seconds, Some(600));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_gift_defaults() {
        let cmd = OperatorCommand::from_value(&json!({"command": "testGift", "giftId": 5655, "quantity": 0})).unwrap();
        assert_eq!(
            cmd,
            OperatorCommand::TestGift(TestGift {
                gift_id: "5655".into(),
                username: "tester".into(),
                quantity: 1,
                display_name: None,
                avatar: None,
            })
        );
    }

    #[test]
    fn malformed_commands_are_parse_errors() {
        for raw in [
            json!({}),
            json!({"command": "explode"}),
            json!({"command": "switchProfile"}),
            json!({"command": "setRules", "rules": []}),
            json!({"command": "wins", "action": "double"}),
            json!({"command": "countdown", "action": "rewind"}),
        ] {
            let err = OperatorCommand::from_value(&raw).unwrap_err();
            assert_eq!(err.code(), "BAD_REQUEST", "{}", raw);
        }
    }

    #[test]
    fn wins_set_accepts_negative_values() {
        let cmd = OperatorCommand::from_value(&json!({"command": "wins", "action": "set", "value": "-4"})).unwrap();
        assert_eq!(cmd, OperatorCommand::Wins(WinsCommand::Set(-4)));
    }
}
