//! Interactive login prompt and chat loop.

use std::io::Write as _;

use sahayogi_auth::SessionManager;
use sahayogi_common::{Message, Role};
use sahayogi_tutor::{Conversation, SendOutcome};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

enum Command {
    Quit,
    Clear,
    Ask(String),
}

impl Command {
    fn parse(line: &str) -> Self {
        match line.trim() {
            "/quit" | "/exit" => Command::Quit,
            "/clear" => Command::Clear,
            other => Command::Ask(other.to_string()),
        }
    }
}

fn stdin_lines() -> Lines<BufReader<Stdin>> {
    BufReader::new(tokio::io::stdin()).lines()
}

fn prompt(label: &str) {
    print!("{label}");
    let _ = std::io::stdout().flush();
}

fn print_message(message: &Message) {
    let speaker = match message.role {
        Role::User => "you",
        Role::Ai => "sahayogi",
    };
    println!("{speaker}> {}", message.content);
}

/// Prompt for credentials until sign-in succeeds. Returns `false` when
/// the user gives up (EOF or too many failures).
pub async fn login(auth: &SessionManager) -> bool {
    println!("Sign in to Sahayogi.");
    let mut lines = stdin_lines();

    for _ in 0..3 {
        prompt("email: ");
        let Ok(Some(email)) = lines.next_line().await else {
            return false;
        };
        prompt("password: ");
        let Ok(Some(password)) = lines.next_line().await else {
            return false;
        };

        match auth.sign_in(email.trim(), password.trim()).await {
            Ok(session) => {
                println!("Signed in as {}.", session.email.as_deref().unwrap_or(&session.user_id));
                return true;
            }
            Err(e) => println!("Sign-in failed: {e}"),
        }
    }

    println!("Too many failed attempts.");
    false
}

/// Chat loop. Prints the seeded greeting, then relays each line through
/// the conversation controller.
pub async fn run(mut conversation: Conversation, auth: &SessionManager) {
    for message in conversation.transcript() {
        print_message(message);
    }
    println!("(ask a question, /clear to restart, /quit to exit)");

    let mut lines = stdin_lines();
    loop {
        prompt("you> ");
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            _ => break,
        };

        match Command::parse(&line) {
            Command::Quit => break,
            Command::Clear => {
                conversation.clear();
                if let Some(greeting) = conversation.last() {
                    print_message(greeting);
                }
            }
            Command::Ask(text) => {
                let outcome = conversation.send(&text).await;
                if outcome == SendOutcome::Rejected {
                    if auth.access_token().is_none() {
                        println!("Your session has ended; restart to sign in again.");
                        break;
                    }
                    continue;
                }
                if let Some(reply) = conversation.last() {
                    print_message(reply);
                }
            }
        }
    }
}
