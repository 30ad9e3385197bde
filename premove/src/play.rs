//! The interactive play loop.
//!
//! One task owns the engine client and the table. Player input and a frame
//! tick wake it through `select!`; engine output is only ever applied during a
//! frame, so the session is never touched from two places.

use std::time::{Duration, Instant};

use anyhow::Context;
use engine::EngineClient;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{self, MissedTickBehavior};
use tokio_stream::wrappers::LinesStream;
use tokio_stream::StreamExt;

use crate::config::STUCK_SEARCH_GRACE;
use crate::input::{parse_input, Input, HELP};
use crate::table::{Reply, Table};

#[derive(Debug, Clone)]
pub struct Settings {
    pub move_time: Duration,
    pub frame_interval: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

pub async fn run(client: &mut EngineClient, table: &mut Table, settings: &Settings) -> anyhow::Result<()> {
    start_game(client, table, settings)?;
    println!("{}", HELP);
    announce_position(table);

    let mut input = LinesStream::new(BufReader::new(tokio::io::stdin()).lines());
    let mut frame = time::interval(settings.frame_interval);
    frame.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            line = input.next() => {
                let Some(line) = line else {
                    tracing::info!("stdin closed");
                    break;
                };
                let line = line.context("failed to read stdin")?;
                if handle_input(client, table, settings, &line)? == Flow::Quit {
                    break;
                }
            }

            _ = frame.tick() => {
                on_frame(client, table, settings, Instant::now())?;
            }
        }
    }

    Ok(())
}

/// Configure the engine for the table's starting position and arm it.
fn start_game(client: &mut EngineClient, table: &mut Table, settings: &Settings) -> anyhow::Result<()> {
    table.reset();
    client
        .configure(table.game().start_fen(), settings.move_time)
        .context("failed to configure engine")?;
    client.newgame().context("failed to start a new game")?;
    tracing::info!("Game started from {}", table.game().start_fen());
    Ok(())
}

fn handle_input(
    client: &mut EngineClient,
    table: &mut Table,
    settings: &Settings,
    line: &str,
) -> anyhow::Result<Flow> {
    let input = match parse_input(line) {
        Ok(input) => input,
        Err(e) => {
            println!("{}", e);
            return Ok(Flow::Continue);
        }
    };
    tracing::debug!("Input: {:?}", input);

    match input {
        Input::Moves(moves) => {
            if table.is_over() {
                println!("The game is over. Type `new` to play again.");
                return Ok(Flow::Continue);
            }
            if !client.is_armed() {
                println!("The engine is stopped. Type `new` or `fen <FEN>` first.");
                return Ok(Flow::Continue);
            }
            for mv in moves {
                table.premoves_mut().push(mv);
            }
            send_premove(client, table, Instant::now())?;
            if !table.premoves().is_empty() {
                let queued: Vec<&str> = table.premoves().iter().collect();
                println!("premoves: {}", queued.join(" "));
            }
        }
        Input::NewGame => {
            start_game(client, table, settings)?;
            announce_position(table);
        }
        Input::Fen(fen) => match table.load(&fen) {
            Ok(()) => {
                start_game(client, table, settings)?;
                announce_position(table);
            }
            Err(e) => println!("{}", e),
        },
        Input::Stop => {
            client.stop().context("failed to stop engine")?;
            table.premoves_mut().clear();
            println!("Engine stopped. Type `new` or `fen <FEN>` to play again.");
        }
        Input::Status => {
            let snapshot = serde_json::to_string_pretty(&client.snapshot())
                .context("failed to encode session snapshot")?;
            println!("{}", snapshot);
        }
        Input::Help => println!("{}", HELP),
        Input::Quit => return Ok(Flow::Quit),
        Input::Empty => {}
    }

    Ok(Flow::Continue)
}

fn on_frame(
    client: &mut EngineClient,
    table: &mut Table,
    settings: &Settings,
    now: Instant,
) -> anyhow::Result<()> {
    client.pump().context("lost connection to engine")?;

    if let Some(elapsed) = client.thinking_for() {
        if client.is_stopping() && elapsed > STUCK_SEARCH_GRACE {
            anyhow::bail!("engine did not acknowledge stop after {:?}", elapsed);
        }
        if client.is_thinking() && elapsed > settings.move_time + STUCK_SEARCH_GRACE {
            tracing::warn!("Search stuck for {:?}, restarting the game", elapsed);
            println!("The engine stopped answering. Starting over.");
            start_game(client, table, settings)?;
            announce_position(table);
            return Ok(());
        }
    }

    if let Some(best) = client.take_best_move()? {
        match table.accept_reply(&best, now) {
            Reply::Moved { mv, depth } => {
                println!("engine: {} (depth {})", mv, depth);
                announce_position(table);
            }
            Reply::NoMove { depth } => {
                println!("engine: no legal move (depth {})", depth);
                announce_position(table);
            }
            Reply::Desync { mv, error } => {
                tracing::warn!("Engine move {} rejected by the board: {}", mv, error);
                println!("The engine played {}, which does not fit the board. Starting over.", mv);
                start_game(client, table, settings)?;
                announce_position(table);
                return Ok(());
            }
        }
    }

    send_premove(client, table, now)
}

/// Play the next due premove if it is the player's turn and the engine is
/// free. A premove that is illegal by now clears the whole queue.
fn send_premove(client: &mut EngineClient, table: &mut Table, now: Instant) -> anyhow::Result<()> {
    if !table.human_to_move() || !client.is_armed() || client.is_thinking() {
        return Ok(());
    }
    let Some(candidate) = table.premoves_mut().pop_due(now) else {
        return Ok(());
    };

    match table.play_human(&candidate) {
        Ok(mv) => {
            println!("you: {}", mv);
            if table.is_over() {
                announce_position(table);
                return Ok(());
            }
            client.play(&mv).context("failed to send move to engine")?;
        }
        Err(e) => {
            let dropped = table.premoves().len();
            table.premoves_mut().clear();
            tracing::debug!("Premove {} rejected: {}", candidate, e);
            if dropped > 0 {
                println!("{} ({} queued premoves cleared)", e, dropped);
            } else {
                println!("{}", e);
            }
        }
    }
    Ok(())
}

fn announce_position(table: &Table) {
    println!("position: {}", table.game().to_fen());
    if let Some(result) = table.result_text() {
        println!("{}", result);
    } else if table.human_to_move() {
        println!("your move ({:?})", table.human());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncWriteExt, DuplexStream};

    const SCENARIO_FEN: &str = "4k3/8/8/8/8/8/8/RNBQKBNR w - - 1 1";

    fn settings() -> Settings {
        Settings {
            move_time: Duration::from_millis(100),
            frame_interval: Duration::from_millis(10),
        }
    }

    async fn ready_game() -> (EngineClient, Table, DuplexStream) {
        let (mut engine_side, client_side) = tokio::io::duplex(64 * 1024);
        let (read, write) = tokio::io::split(client_side);
        let mut client = EngineClient::from_io(read, write, Vec::new()).unwrap();
        engine_side.write_all(b"uciok\nreadyok\n").await.unwrap();
        crate::wait::wait_for_ready(&mut client, Duration::from_secs(5))
            .await
            .unwrap();

        let mut table = Table::new(SCENARIO_FEN, Duration::ZERO).unwrap();
        start_game(&mut client, &mut table, &settings()).unwrap();
        (client, table, engine_side)
    }

    async fn frames_until(client: &mut EngineClient, table: &mut Table, done: impl Fn(&Table) -> bool) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !done(table) {
                on_frame(client, table, &settings(), Instant::now()).unwrap();
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("timed out running frames");
    }

    #[tokio::test]
    async fn test_reply_then_premove_goes_out() {
        let (mut client, mut table, mut engine) = ready_game().await;

        handle_input(&mut client, &mut table, &settings(), "b1c3 g1f3").unwrap();
        assert!(client.is_thinking());
        assert_eq!(table.premoves().len(), 1);

        engine.write_all(b"info depth 6\nbestmove e8f8\n").await.unwrap();
        frames_until(&mut client, &mut table, |t| t.game().history().len() == 3).await;

        assert_eq!(table.game().history(), ["b1c3", "e8f8", "g1f3"]);
        assert_eq!(client.move_history(), ["b1c3", "e8f8", "g1f3"]);
        assert!(client.is_thinking());
        assert!(table.premoves().is_empty());
    }

    #[tokio::test]
    async fn test_illegal_premove_clears_the_queue() {
        let (mut client, mut table, mut engine) = ready_game().await;

        handle_input(&mut client, &mut table, &settings(), "b1c3 e2e5 g1f3").unwrap();
        engine.write_all(b"bestmove e8f8\n").await.unwrap();
        frames_until(&mut client, &mut table, |t| t.premoves().is_empty()).await;

        assert_eq!(table.game().history(), ["b1c3", "e8f8"]);
        assert!(!client.is_thinking());
        assert!(table.human_to_move());
    }

    #[tokio::test]
    async fn test_desync_restarts_the_game() {
        let (mut client, mut table, mut engine) = ready_game().await;

        handle_input(&mut client, &mut table, &settings(), "b1c3").unwrap();
        assert_eq!(table.game().history(), ["b1c3"]);
        assert!(client.is_thinking());

        engine.write_all(b"bestmove e7e5\n").await.unwrap();
        frames_until(&mut client, &mut table, |t| t.game().history().is_empty()).await;

        assert!(client.move_history().is_empty());
        assert!(client.is_armed());
        assert!(!client.is_thinking());
    }

    #[tokio::test]
    async fn test_stop_disarms_until_new() {
        let (mut client, mut table, _engine) = ready_game().await;

        handle_input(&mut client, &mut table, &settings(), "b1c3 g1f3").unwrap();
        handle_input(&mut client, &mut table, &settings(), "stop").unwrap();
        assert!(client.is_stopping());
        assert!(!client.is_armed());
        assert!(table.premoves().is_empty());

        handle_input(&mut client, &mut table, &settings(), "new").unwrap();
        assert!(client.is_armed());
        assert!(table.game().history().is_empty());
    }

    #[tokio::test]
    async fn test_quit_and_bad_input() {
        let (mut client, mut table, _engine) = ready_game().await;

        assert_eq!(
            handle_input(&mut client, &mut table, &settings(), "castle").unwrap(),
            Flow::Continue
        );
        assert_eq!(
            handle_input(&mut client, &mut table, &settings(), "quit").unwrap(),
            Flow::Quit
        );
    }
}
