// tests/engine_tests.rs
mod test_utils;

use serde_json::{Value, json};

use tikplays_common::models::{CountdownState, LiveEvent, OverlayEvent, RawGift};
use tikplays_core::engine::OperatorCommand;
use tikplays_core::persistence;
use tikplays_core::services::dispatch::KeyToken;

use test_utils::*;

fn live(raw: Value) -> LiveEvent {
    serde_json::from_value(raw).expect("live event")
}

fn gift(raw: Value) -> LiveEvent {
    LiveEvent::Gift(serde_json::from_value::<RawGift>(raw).expect("gift"))
}

async fn settle(started: Vec<tikplays_core::services::Dispatched>) {
    for d in started {
        d.settled().await;
    }
}

#[tokio::test]
async fn test_gift_feeds_every_subsystem_in_order() {
    let mut rig = TestRig::new();
    seed(&rig.store, persistence::RULES_FILE, &json!({"5001": {"key": "up", "repeat": 1}}));
    seed(&rig.store, persistence::GIFT_CATALOG_FILE, &json!({"5001": {"name": "Rosa", "image": "/r.png", "diamondCount": 50}}));
    seed(&rig.store, persistence::BATTLE_FILE, &json!({"pointsPerCoin": 2, "left": {"gifts": ["5001"]}}));
    seed(&rig.store, persistence::COUNTDOWN_FILE, &json!({"secondsPerCoin": 0.1}));

    let mut engine = rig.engine();
    rig.drain();

    let started = engine.handle_live(gift(json!({
        "giftId": 5001, "uniqueId": "alice", "nickname": "Alice", "repeatCount": 3
    })));
    settle(started).await;

    let events = rig.drain();
    let order: Vec<&str> = channels(&events).into_iter().filter(|c| *c != "log").collect();
    assert_eq!(
        order,
        vec!["newGift", "countdown", "countdown:add", "giftBattle", "coinBoard", "topGiftUpdate"]
    );

    let snap = engine.bundle().snapshot();
    assert_eq!(snap.countdown.seconds_left, 15);
    assert_eq!(snap.gift_battle.left_points, 300.0);
    assert_eq!(snap.coin_board.rows[0].coins, 150);
    assert_eq!(snap.coin_board.rows[0].name, "Alice");
    assert_eq!(snap.top_gift.coins, 50);
    assert_eq!(snap.top_gift.gift_name, "Rosa");
    assert_eq!(rig.keys.pressed(), vec![KeyToken::Up; 3]);
}

#[tokio::test]
async fn test_streak_gift_credits_final_count_once() {
    let mut rig = TestRig::new();
    seed(&rig.store, persistence::GIFT_CATALOG_FILE, &json!({"5655": {"name": "Rose", "diamondCount": 1}}));
    let mut engine = rig.engine();
    rig.drain();

    for (count, end) in [(1, false), (3, false), (3, false), (7, true)] {
        settle(engine.handle_live(gift(json!({
            "giftId": 5655, "uniqueId": "alice", "giftType": 1, "repeatCount": count, "repeatEnd": end
        }))))
        .await;
    }

    let new_gifts: Vec<u64> = rig
        .drain()
        .into_iter()
        .filter_map(|e| match e {
            OverlayEvent::NewGift(g) => Some(g.quantity),
            _ => None,
        })
        .collect();
    assert_eq!(new_gifts, vec![1, 2, 4]);
    assert_eq!(engine.bundle().coin_board.state().users["alice"].coins, 7);
    assert_eq!(engine.tracked_streaks(), 0);
}

#[tokio::test]
async fn test_like_burst_fires_each_crossed_step() {
    let mut rig = TestRig::new();
    seed(&rig.store, persistence::RULES_FILE, &json!({"LIKES:100": "http://hooks.local/likes"}));
    seed(&rig.store, persistence::GOALS_FILE, &json!({"likes": {"target": 1000, "current": 95}}));
    let mut engine = rig.engine();
    rig.drain();

    settle(engine.handle_live(live(json!({"type": "like", "likeCount": 145})))).await;

    let calls = rig.http.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls.iter().all(|c| matches!(c, HttpCall::Json { body, .. } if *body == json!({"trigger": "special"}))));

    let progress: Vec<u64> = rig
        .drain()
        .into_iter()
        .filter_map(|e| match e {
            OverlayEvent::LikeProgress(g) => Some(g.current),
            _ => None,
        })
        .collect();
    assert_eq!(progress, vec![240]);

    // A like event without a count adds one and crosses nothing new.
    settle(engine.handle_live(live(json!({"type": "like"})))).await;
    assert_eq!(engine.bundle().goals.state().likes.current, 241);
    assert_eq!(rig.http.calls().len(), 2);
}

#[tokio::test]
async fn test_follow_updates_goal_and_fires_follow_rule() {
    let mut rig = TestRig::new();
    seed(&rig.store, persistence::RULES_FILE, &json!({"FOLLOW": {"key": "f", "soundUrl": "/follow.mp3"}}));
    let mut engine = rig.engine();
    rig.drain();

    settle(engine.handle_live(live(json!({"type": "follow"})))).await;

    assert_eq!(engine.bundle().goals.state().followers.current, 1);
    assert_eq!(rig.keys.pressed(), vec![KeyToken::Char('f')]);
    let chans = channels(&rig.drain()).join(",");
    assert!(chans.contains("followersProgress"));
    assert!(chans.contains("playSound"));
}

#[tokio::test]
async fn test_disconnect_drops_streaks_and_honours_board_reset() {
    let mut rig = TestRig::new();
    seed(&rig.store, persistence::COIN_BOARD_FILE, &json!({"resetOnDisconnect": true}));
    let mut engine = rig.engine();

    engine.handle_live(gift(json!({
        "giftId": 1, "uniqueId": "bob", "giftType": 1, "repeatCount": 2, "diamondCount": 5
    })));
    assert_eq!(engine.tracked_streaks(), 1);
    assert_eq!(engine.bundle().coin_board.state().users["bob"].coins, 10);

    engine.handle_live(LiveEvent::Disconnected);
    assert_eq!(engine.tracked_streaks(), 0);
    assert!(engine.bundle().coin_board.state().users.is_empty());

    // The same combo after reconnecting starts from zero again.
    engine.handle_live(gift(json!({
        "giftId": 1, "uniqueId": "bob", "giftType": 1, "repeatCount": 3, "diamondCount": 5
    })));
    assert_eq!(engine.bundle().coin_board.state().users["bob"].coins, 15);
}

#[tokio::test]
async fn test_operator_commands_persist_and_reply() {
    let rig = TestRig::new();
    let mut engine = rig.engine();

    let cmd = OperatorCommand::from_value(&json!({"command": "wins", "action": "set", "value": -2})).unwrap();
    engine.execute(cmd).unwrap();
    let doc = persistence::read_document(&rig.store.root().join("profiles/default/wins.json")).unwrap();
    assert_eq!(doc["wins"], -2);

    let cmd = OperatorCommand::from_value(&json!({
        "command": "setRules",
        "rules": {"5655": "https://hooks.local/rose", "": "x", "9": {}}
    }))
    .unwrap();
    let reply = serde_json::to_value(engine.execute(cmd).unwrap()).unwrap();
    assert_eq!(reply, json!({"5655": {"webhook": "https://hooks.local/rose", "repeat": 1}}));

    let cmd = OperatorCommand::from_value(&json!({
        "command": "setPrefs", "prefs": {"serverTapHost": "mc.lan", "serverTapPort": 25580}
    }))
    .unwrap();
    engine.execute(cmd).unwrap();
    assert_eq!(engine.dispatcher().command_base(), "http://mc.lan:25580");
}

#[tokio::test]
async fn test_test_gift_runs_normal_gift_path() {
    let mut rig = TestRig::new();
    seed(&rig.store, persistence::GIFT_CATALOG_FILE, &json!({"7934": {"name": "Heart", "diamondCount": 10}}));
    let mut engine = rig.engine();
    rig.drain();

    let cmd = OperatorCommand::from_value(&json!({
        "command": "testGift", "giftId": "7934", "username": "op", "quantity": 2
    }))
    .unwrap();
    engine.execute(cmd).unwrap();

    assert_eq!(engine.bundle().coin_board.state().users["op"].coins, 20);
    assert!(channels(&rig.drain()).contains(&"newGift"));
}

#[tokio::test]
async fn test_profile_errors_surface_codes() {
    let rig = TestRig::new();
    let mut engine = rig.engine();

    let err = engine
        .execute(OperatorCommand::SwitchProfile { id: "ghost".into() })
        .unwrap_err();
    assert_eq!(err.code(), "PROFILE_NOT_FOUND");

    let err = engine
        .execute(OperatorCommand::DeleteProfile { id: "default".into() })
        .unwrap_err();
    assert_eq!(err.code(), "CANT_DELETE_DEFAULT");

    engine.execute(OperatorCommand::CreateProfile { name: "Noche".into() }).unwrap();
    let err = engine
        .execute(OperatorCommand::CreateProfile { name: "noche".into() })
        .unwrap_err();
    assert_eq!(err.code(), "PROFILE_ID_EXISTS");
}

#[tokio::test]
async fn test_deleting_active_profile_reloads_default() {
    let rig = TestRig::new();
    seed(&rig.store, persistence::WINS_FILE, &json!({"wins": 9}));
    let mut engine = rig.engine();

    engine.execute(OperatorCommand::CreateProfile { name: "b".into() }).unwrap();
    engine.execute(OperatorCommand::SwitchProfile { id: "b".into() }).unwrap();
    assert_eq!(engine.bundle().wins.state().count, 0);

    engine.execute(OperatorCommand::DeleteProfile { id: "b".into() }).unwrap();
    assert_eq!(engine.bundle().profile_id, "default");
    assert_eq!(engine.bundle().wins.state().count, 9);
}

#[tokio::test]
async fn test_streaks_survive_profile_switch() {
    let rig = TestRig::new();
    let mut engine = rig.engine();
    engine.handle_live(gift(json!({"giftId": 1, "uniqueId": "a", "giftType": 1, "repeatCount": 4})));
    engine.execute(OperatorCommand::CreateProfile { name: "b".into() }).unwrap();
    engine.execute(OperatorCommand::SwitchProfile { id: "b".into() }).unwrap();
    assert_eq!(engine.tracked_streaks(), 1);
    assert_eq!(CountdownState::default(), *engine.bundle().countdown.state());
}
