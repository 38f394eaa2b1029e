//! Two editors sharing one document through an in-process relay.
//!
//! Run with: cargo run --example two_editors

use codesync::protocol::Message;
use codesync::{ChangeEmitter, RoomHub, SessionConfig};
use std::time::Duration;

const ROOM: &str = "demo";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("Codesync Two Editors Example");
    println!("============================\n");

    let hub = RoomHub::new();
    let (ana_id, mut ana_inbox) = hub.connect(ROOM, Some("ana"))?;
    let (ben_id, mut ben_inbox) = hub.connect(ROOM, Some("ben"))?;

    let initial = "fn main() {\n}\n";
    let (ana, mut ana_out) = ChangeEmitter::new(initial, SessionConfig::default());
    let (ben, mut ben_out) = ChangeEmitter::new(initial, SessionConfig::default());

    // Ana types a line, one keystroke at a time.
    let line = "    println!(\"hi\");\n";
    let mut text = String::from("fn main() {\n");
    for ch in line.chars() {
        text.push(ch);
        ana.on_local_change(format!("{text}}}\n"));
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    tokio::time::sleep(Duration::from_millis(150)).await;

    pump(&hub, &ana_id, &mut ana_out)?;
    while let Some(msg) = ben_inbox.try_next() {
        if let Some(outcome) = ben.on_remote(&msg)? {
            println!("ben applied a change, conflict: {}", outcome.conflict.has_conflict);
        }
    }

    // Ben adds a header comment.
    ben.on_local_change(format!("// demo\n{}", ben.document()));
    pump(&hub, &ben_id, &mut ben_out)?;
    while let Some(msg) = ana_inbox.try_next() {
        if let Message::UserJoined { username, .. } = &msg {
            println!("ana sees {username} join");
        }
        ana.on_remote(&msg)?;
    }

    println!("\nana:\n{}", ana.document());
    println!("ben:\n{}", ben.document());
    anyhow::ensure!(ana.document() == ben.document(), "editors diverged");

    hub.handle_message(ROOM, &ben_id, Message::Leave)?;
    hub.handle_message(ROOM, &ana_id, Message::Leave)?;
    println!("rooms left open: {}", hub.rooms().len());
    Ok(())
}

fn pump(
    hub: &RoomHub,
    user_id: &str,
    outbound: &mut tokio::sync::mpsc::UnboundedReceiver<Message>,
) -> codesync::Result<()> {
    while let Ok(msg) = outbound.try_recv() {
        println!("{} -> {}", user_id, msg.to_json()?);
        hub.handle_message(ROOM, user_id, msg)?;
    }
    Ok(())
}
