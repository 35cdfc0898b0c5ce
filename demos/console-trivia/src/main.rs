//! Plays the transport role on a terminal.
//!
//! Each stdin line is `room|user|text`, e.g. `lobby|ana|/join`. Events come
//! back on stdout as one JSON object per line. Pass a JSON file holding an
//! array of questions to replace the built-in set.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use roundtable::prelude::*;
use roundtable::telemetry::init_tracing;
use tokio::io::{AsyncBufReadExt, BufReader};

// ---------------------------------------------------------------------------
// Questions
// ---------------------------------------------------------------------------

fn builtin_questions() -> Vec<Question> {
    vec![
        Question::new(
            1,
            "Name a flower",
            vec![
                AnswerSlot::new("rose", 30).with_variants(["roses"]),
                AnswerSlot::new("tulip", 25).with_variants(["tulips"]),
                AnswerSlot::new("sunflower", 20),
                AnswerSlot::new("orchid", 15),
                AnswerSlot::new("jasmine", 10),
            ],
        ),
        Question::new(
            2,
            "Name a planet in the solar system",
            vec![
                AnswerSlot::new("mars", 30),
                AnswerSlot::new("jupiter", 25),
                AnswerSlot::new("venus", 20),
                AnswerSlot::new("saturn", 15),
                AnswerSlot::new("mercury", 10),
            ],
        ),
        Question::new(
            3,
            "Name something you take to the beach",
            vec![
                AnswerSlot::new("towel", 35),
                AnswerSlot::new("sunscreen", 30).with_variants(["sunblock"]),
                AnswerSlot::new("umbrella", 20),
                AnswerSlot::new("sunglasses", 15),
            ],
        ),
        Question::new(
            4,
            "Name a primary color",
            vec![
                AnswerSlot::new("red", 40),
                AnswerSlot::new("blue", 35),
                AnswerSlot::new("yellow", 25),
            ],
        ),
    ]
}

fn load_questions() -> Result<Vec<Question>, Box<dyn std::error::Error>> {
    match std::env::args().nth(1) {
        Some(path) => {
            let raw = std::fs::read_to_string(&path)?;
            let questions: Vec<Question> = serde_json::from_str(&raw)?;
            tracing::info!(%path, count = questions.len(), "questions loaded");
            Ok(questions)
        }
        None => Ok(builtin_questions()),
    }
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

/// Parses `room|user|text`. The user id doubles as the display name.
fn parse_line(line: &str) -> Option<InboundMessage> {
    let mut parts = line.splitn(3, '|');
    let room = parts.next()?.trim();
    let user = parts.next()?.trim();
    let text = parts.next()?;
    if room.is_empty() || user.is_empty() {
        return None;
    }
    let mut msg = InboundMessage::group(room, Participant::new(user, user), text);
    msg.received_at = now_millis();
    Some(msg)
}

// ---------------------------------------------------------------------------
// Bootstrap
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing("info");

    let config = GameConfig {
        min_quorum: 2,
        round_timeout: Duration::from_secs(30),
        inter_round_delay: Duration::from_secs(3),
        ..GameConfig::default()
    };
    let bank = StaticQuestionBank::seeded(load_questions()?, now_millis());
    let (bot, mut events) = TriviaBot::start(config, bank)?;

    let printer = tokio::spawn(async move {
        while let Some(out) = events.recv().await {
            match JsonCodec.encode(&out) {
                Ok(bytes) => println!("{}", String::from_utf8_lossy(&bytes)),
                Err(e) => tracing::error!(error = %e, "event not printable"),
            }
        }
    });

    eprintln!("type room|user|text, e.g. lobby|ana|/join");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_line(&line) {
            Some(msg) => bot.submit(msg).await?,
            None if line.trim().is_empty() => {}
            None => eprintln!("expected room|user|text"),
        }
    }

    bot.shutdown().await;
    printer.abort();
    Ok(())
}
