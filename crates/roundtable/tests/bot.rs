//! Integration tests for the bot facade: intake loop, dispatcher, and
//! sessions together.

use std::time::Duration;

use roundtable::prelude::*;
use tokio::sync::mpsc;
use tokio::time::timeout;

// =========================================================================
// Helpers
// =========================================================================

const BOT: &str = "quizbot";

fn questions() -> Vec<Question> {
    vec![
        Question::new(
            1,
            "Name a flower",
            vec![AnswerSlot::new("rose", 50), AnswerSlot::new("tulip", 50)],
        ),
        Question::new(
            2,
            "Name a planet",
            vec![
                AnswerSlot::new("mars", 40),
                AnswerSlot::new("venus", 30),
                AnswerSlot::new("jupiter", 30),
            ],
        ),
        Question::new(3, "Name an ocean", vec![AnswerSlot::new("pacific", 100)]),
    ]
}

fn answers_for(prompt: &str) -> Vec<&'static str> {
    match prompt {
        "Name a flower" => vec!["rose", "tulip"],
        "Name a planet" => vec!["mars", "venus", "jupiter"],
        "Name an ocean" => vec!["pacific"],
        other => panic!("unknown prompt {other}"),
    }
}

fn join(room: &str, user: &str) -> InboundMessage {
    InboundMessage::group(room, Participant::new(user, format!("Player {user}")), format!("/join@{BOT}"))
}

fn say(room: &str, user: &str, text: &str) -> InboundMessage {
    InboundMessage::group(room, Participant::new(user, format!("Player {user}")), text)
}

async fn next(events: &mut mpsc::UnboundedReceiver<Outbound>) -> Outbound {
    timeout(Duration::from_secs(1), events.recv())
        .await
        .expect("timeout waiting for message")
        .expect("outbound channel closed")
}

fn config() -> GameConfig {
    GameConfig {
        min_quorum: 2,
        rounds_per_game: 3,
        inter_round_delay: Duration::ZERO,
        bot_name: Some(BOT.into()),
        ..GameConfig::default()
    }
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_quorum_should_start_game() {
    let (bot, mut events) =
        TriviaBot::start(config(), StaticQuestionBank::in_order(questions())).unwrap();
    let room = RoomId::new("1");

    // The same person joining three times counts once.
    for _ in 0..3 {
        bot.submit(join("1", "ID1")).await.unwrap();
    }
    let reply = next(&mut events).await;
    assert_eq!(reply.room_id, room);
    assert!(matches!(reply.event, OutboundEvent::QuorumProgress { joined: 1, needed: 1, .. }));

    let info = bot.dispatcher().session_info(&room).await.unwrap();
    assert_eq!(info.quorum_count, 1);
    assert_eq!(info.state, SessionState::QuorumGathering);

    // A join in another room doesn't touch this one.
    bot.submit(join("2", "ID2")).await.unwrap();
    let reply = next(&mut events).await;
    assert_eq!(reply.room_id, RoomId::new("2"));
    let info = bot.dispatcher().session_info(&room).await.unwrap();
    assert_eq!(info.quorum_count, 1);
    assert_eq!(info.state, SessionState::QuorumGathering);

    // The second distinct joiner starts the game.
    bot.submit(join("1", "4")).await.unwrap();
    let reply = next(&mut events).await;
    match reply.event {
        OutboundEvent::GameStarted { participants, rounds } => {
            assert_eq!(participants.len(), 2);
            assert_eq!(rounds, 3);
        }
        other => panic!("expected GameStarted, got {other:?}"),
    }

    let players = ["ID1", "4"];
    for round in 1..=3 {
        let prompt = match next(&mut events).await.event {
            OutboundEvent::RoundStarted { round: r, prompt, .. } => {
                assert_eq!(r, round);
                prompt
            }
            other => panic!("expected RoundStarted, got {other:?}"),
        };

        for (i, answer) in answers_for(&prompt).into_iter().enumerate() {
            bot.submit(say("1", players[i % 2], answer)).await.unwrap();
            let reply = next(&mut events).await;
            assert!(
                matches!(reply.event, OutboundEvent::SlotScored { round: r, .. } if r == round),
                "expected SlotScored, got {:?}",
                reply.event
            );
        }

        let reply = next(&mut events).await;
        assert!(matches!(
            reply.event,
            OutboundEvent::Standings { outcome: RoundOutcome::AllSlotsClaimed, .. }
        ));
    }

    match next(&mut events).await.event {
        OutboundEvent::Finished { standings, reason } => {
            assert_eq!(reason, FinishReason::Completed);
            assert_eq!(standings.total(), 300);
        }
        other => panic!("expected Finished, got {other:?}"),
    }
    let info = bot.dispatcher().session_info(&room).await.unwrap();
    assert_eq!(info.state, SessionState::Finished);

    bot.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_private_chat_never_starts_a_game() {
    let (bot, mut events) =
        TriviaBot::start(config(), StaticQuestionBank::in_order(questions())).unwrap();

    let mut dm = join("dm-1", "ID1");
    dm.room_kind = RoomKind::Private;
    bot.submit(dm).await.unwrap();

    assert!(timeout(Duration::from_secs(1), events.recv()).await.is_err());
    assert_eq!(bot.dispatcher().room_count().await, 0);
}

#[tokio::test(start_paused = true)]
async fn test_events_encode_as_tagged_json() {
    let (bot, mut events) =
        TriviaBot::start(config(), StaticQuestionBank::in_order(questions())).unwrap();
    bot.submit(join("1", "ID1")).await.unwrap();

    let out = next(&mut events).await;
    let bytes = JsonCodec.encode(&out).unwrap();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["room_id"], "1");
    assert_eq!(json["event"]["type"], "QuorumProgress");
    assert_eq!(json["event"]["joined"], 1);
}

#[tokio::test(start_paused = true)]
async fn test_submit_after_shutdown_fails() {
    let (bot, _events) =
        TriviaBot::start(config(), StaticQuestionBank::in_order(questions())).unwrap();
    let intake = bot.intake();
    bot.shutdown().await;

    assert!(intake.send(join("1", "ID1")).await.is_err());
}

#[test]
fn test_invalid_config_is_rejected() {
    let cfg = GameConfig {
        rounds_per_game: 0,
        ..GameConfig::default()
    };
    let result = TriviaBot::start(cfg, StaticQuestionBank::in_order(questions()));
    assert!(matches!(result, Err(RoundtableError::Room(_))));
}
