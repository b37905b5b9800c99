//! Interactive loop.

use std::io::Write;

use switchboard_coordinator::IntentRouter;
use tokio::io::{AsyncBufReadExt, BufReader};

const EXIT_WORDS: &[&str] = &["exit", "quit"];

/// Read questions until `exit`, `quit`, EOF or Ctrl-C at the prompt.
///
/// Ctrl-C while a request is in flight drops the routing future, which
/// abandons the outstanding external call, and returns to the prompt.
pub async fn run(router: &IntentRouter) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("Switchboard. Ask a question, or type 'exit' to quit.");

    loop {
        print!("You: ");
        std::io::stdout().flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };

        let Some(line) = line else {
            println!();
            println!("Bye!");
            return Ok(());
        };

        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if is_exit(input) {
            println!("Bye!");
            return Ok(());
        }

        tokio::select! {
            result = router.route(input) => match result {
                Ok(response) => println!("{response}\n"),
                Err(e) => {
                    crate::report(&e);
                }
            },
            _ = tokio::signal::ctrl_c() => {
                eprintln!("\nRequest cancelled.");
            }
        }
    }
}

fn is_exit(input: &str) -> bool {
    EXIT_WORDS.iter().any(|w| input.eq_ignore_ascii_case(w))
}
