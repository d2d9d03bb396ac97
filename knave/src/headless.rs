//! Line-oriented front end.
//!
//! Reads one command per line from stdin and prints the reply to stdout.
//! Diagnostics go to stderr through `tracing`.

use std::io::{self, BufRead, Write};

use knave_core::KeyValueStore;

use crate::commands::{Command, Reply, Session};

/// Run the command loop until `quit` or end of input.
pub async fn run_headless<S: KeyValueStore>(mut session: Session<S>) -> io::Result<()> {
    let store = session.store();
    println!("=== Knave Character Keeper ({}) ===", store.rules().edition);
    println!(
        "{} character(s) loaded. Active: {}",
        store.roster().len(),
        store.active().display_name()
    );
    println!("Type help for commands.");
    println!();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                tracing::error!(error = %e, "Error reading input");
                break;
            }
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let result = match Command::parse(line) {
            Ok(command) => session.execute(command).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(Reply::Text(text)) => println!("{text}"),
            Ok(Reply::Quit) => {
                println!("Goodbye!");
                break;
            }
            Err(e) => println!("[ERROR] {e}"),
        }
        stdout.flush()?;
    }

    Ok(())
}
