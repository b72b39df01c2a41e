use glam::Vec3;
use serde_json::json;
use tokio::sync::mpsc::UnboundedReceiver;

use lightball_client::engine::{Engine, EngineSettings};
use lightball_client::game::combat::SHOOT_COOLDOWN_TICKS;
use lightball_client::game::{MatchPhase, ShotOutcome};
use lightball_client::ws::protocol::GameOverReason;
use lightball_client::ws::{parse_server_message, ClientMessage, TransportHandle};

fn feed(engine: &mut Engine, value: serde_json::Value) {
    let msg = parse_server_message(&value.to_string()).unwrap();
    engine.handle_server_message(msg).unwrap();
}

fn drain(rx: &mut UnboundedReceiver<ClientMessage>) -> Vec<ClientMessage> {
    let mut out = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        out.push(msg);
    }
    out
}

fn started_engine() -> (Engine, UnboundedReceiver<ClientMessage>) {
    let (transport, rx) = TransportHandle::channel();
    let mut engine = Engine::new(EngineSettings::new("Alice"), transport);
    engine.connection_established();

    feed(
        &mut engine,
        json!({
            "type": "game_started",
            "data": {
                "players": [
                    {
                        "username": "Alice",
                        "health": 100,
                        "score": 0,
                        "position": {"x": 0.0, "y": 0.0, "z": 0.0},
                        "rotation": {"x": 0.0, "y": 0.0, "z": 0.0}
                    },
                    {
                        "username": "Bob",
                        "health": 100,
                        "score": 0,
                        "position": {"x": -4.0, "y": 0.0, "z": 0.0},
                        "rotation": {"x": 0.0, "y": 3.14159, "z": 0.0}
                    }
                ]
            }
        }),
    );
    (engine, rx)
}

#[test]
fn test_shoot_stationary_enemy_end_to_end() {
    let (mut engine, mut rx) = started_engine();
    assert_eq!(engine.phase(), MatchPhase::Playing);

    feed(
        &mut engine,
        json!({
            "type": "enemy_added",
            "data": {
                "id": 1,
                "color": 0xFF0000,
                "health": 1,
                "source": {"x": 0.0, "y": 0.0, "z": 0.0},
                "target": {"x": 0.0, "y": 0.0, "z": 0.0},
                "startTime": 0,
                "speed": 0.0
            }
        }),
    );

    let game = engine.game_mut().unwrap();
    game.set_camera(Vec3::new(0.0, 0.0, 3.0), Vec3::new(0.0, 0.0, -3.0));

    assert_eq!(engine.shoot(), Some(ShotOutcome::Hit(1)));
    assert_eq!(engine.game().unwrap().cooldown(), SHOOT_COOLDOWN_TICKS);
    assert_eq!(drain(&mut rx), vec![ClientMessage::EnemyShot { id: 1 }]);

    // Still cooling down: nothing changes and nothing is sent
    assert_eq!(engine.shoot(), None);
    assert!(drain(&mut rx).is_empty());

    let frame = engine.render_tick();
    assert_eq!(frame.last_shot, Some(ShotOutcome::Hit(1)));
    assert_eq!(frame.cooldown, SHOOT_COOLDOWN_TICKS - 1);
}

#[test]
fn test_enemy_removal_is_idempotent() {
    let (mut engine, _rx) = started_engine();
    feed(
        &mut engine,
        json!({
            "type": "enemy_added",
            "data": {
                "id": 7,
                "color": 0x00FF00,
                "health": 3,
                "source": {"x": 1.0, "y": 1.0, "z": 1.0},
                "target": {"x": 0.0, "y": 0.0, "z": 0.0},
                "start_time": 0,
                "speed": 0.0005
            }
        }),
    );

    feed(&mut engine, json!({"type": "enemy_removed", "data": {"id": 99}}));
    assert_eq!(engine.game().unwrap().enemy_count(), 1);

    feed(&mut engine, json!({"type": "enemy_removed", "data": 7}));
    feed(&mut engine, json!({"type": "enemy_removed", "data": 7}));
    assert_eq!(engine.game().unwrap().enemy_count(), 0);
}

#[test]
fn test_clock_drives_enemy_motion() {
    let (mut engine, _rx) = started_engine();
    feed(
        &mut engine,
        json!({
            "type": "enemy_added",
            "data": {
                "id": 2,
                "color": 0xFFFFFF,
                "health": 1,
                "source": {"x": 0.0, "y": 0.0, "z": 0.0},
                "target": {"x": 10.0, "y": 0.0, "z": 0.0},
                "startTime": 1000,
                "speed": 0.001
            }
        }),
    );
    feed(&mut engine, json!({"type": "time_sync", "data": {"time": 1000}}));

    for _ in 0..25 {
        engine.clock_tick(20);
    }

    let frame = engine.render_tick();
    assert_eq!(frame.time, 1500);
    assert!((frame.enemies[0].position.x - 5.0).abs() < 1e-4);
}

#[test]
fn test_unknown_player_surfaces_error() {
    let (mut engine, _rx) = started_engine();
    let msg = parse_server_message(
        &json!({"type": "player_damaged", "data": {"username": "Eve", "health": 1}}).to_string(),
    )
    .unwrap();
    assert!(engine.handle_server_message(msg).is_err());

    // State for known players is untouched
    let game = engine.game().unwrap();
    assert_eq!(game.player("Alice").unwrap().health(), 100);
    assert_eq!(game.player("Bob").unwrap().health(), 100);
}

#[test]
fn test_game_over_is_terminal() {
    let (mut engine, mut rx) = started_engine();
    feed(&mut engine, json!({"type": "game_over", "data": "tied:Alice"}));
    feed(&mut engine, json!({"type": "game_over", "data": "won:Alice"}));

    assert_eq!(engine.phase(), MatchPhase::GameOver);
    let frame = engine.render_tick();
    assert_eq!(frame.game_over, Some(GameOverReason::Tied));

    // No more shots or rotation updates once the match is over
    assert_eq!(engine.shoot(), None);
    engine.handle_sensor_sample(&[0.1, 0.0, 0.0]).unwrap();
    assert!(drain(&mut rx).is_empty());
}

#[test]
fn test_malformed_message_is_not_applied() {
    let (mut engine, _rx) = started_engine();
    let text = json!({"type": "player_score_updated", "data": {"username": "Bob"}}).to_string();
    assert!(parse_server_message(&text).is_err());
    assert_eq!(engine.game().unwrap().player("Bob").unwrap().score(), 0);
}
