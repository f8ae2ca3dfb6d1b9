use std::io;
use std::io::IsTerminal;

use console::{style, Key, Term};
use dialoguer::{Confirm, Input};

/// Source of interactive answers for superuser creation.
pub trait Prompter: Send + Sync {
    /// Ask for a username, offering `default` when present.
    fn username(&self, default: Option<&str>) -> io::Result<String>;

    /// Ask for an optional email address.
    fn email(&self) -> io::Result<String>;

    /// Ask for a password, entered twice.
    fn password(&self) -> io::Result<String>;

    /// Ask whether to accept a password that failed validation.
    fn confirm_bypass(&self) -> io::Result<bool>;

    /// Show a validation problem to the operator.
    fn error(&self, message: &str);
}

/// Prompts on the controlling terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompter;

impl TerminalPrompter {
    /// Whether both stdin and stdout are attached to a terminal.
    pub fn is_available() -> bool {
        console::user_attended() && io::stdin().is_terminal()
    }
}

impl Prompter for TerminalPrompter {
    fn username(&self, default: Option<&str>) -> io::Result<String> {
        let mut input = Input::<String>::new().with_prompt("Username");
        if let Some(default) = default {
            input = input.default(default.to_string());
        }
        on_interrupt_newline(input.interact_text().map_err(io::Error::from))
    }

    fn email(&self) -> io::Result<String> {
        let email = Input::<String>::new()
            .with_prompt("Email address")
            .allow_empty(true)
            .interact_text()
            .map(|email| email.trim().to_string())
            .map_err(io::Error::from);
        on_interrupt_newline(email)
    }

    fn password(&self) -> io::Result<String> {
        let term = Term::stderr();
        loop {
            let password = read_password(&term, "Password")?;
            let confirmation = read_password(&term, "Password (again)")?;
            if password == confirmation {
                return Ok(password);
            }
            self.error("Error: Your passwords didn't match.");
        }
    }

    fn confirm_bypass(&self) -> io::Result<bool> {
        let answer = Confirm::new()
            .with_prompt("Bypass password validation and create user anyway?")
            .default(false)
            .interact()
            .map_err(io::Error::from);
        on_interrupt_newline(answer)
    }

    fn error(&self, message: &str) {
        eprintln!("  {} {}", style("✗").red(), message);
    }
}

/// Keeps Ctrl+C from terminating the process while alive.
///
/// Dialoguer prompts re-raise SIGINT when Ctrl+C is pressed. With this
/// handler installed the process survives and the prompt returns
/// `io::ErrorKind::Interrupted`.
pub struct InterruptGuard {
    #[cfg(unix)]
    signal: tokio::signal::unix::Signal,
    #[cfg(windows)]
    signal: tokio::signal::windows::CtrlC,
}

impl InterruptGuard {
    /// Install the handler. Must be called inside a Tokio runtime.
    pub fn install() -> io::Result<Self> {
        #[cfg(unix)]
        let signal = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt())?;
        #[cfg(windows)]
        let signal = tokio::signal::windows::ctrl_c()?;
        Ok(Self { signal })
    }

    /// Wait for the next Ctrl+C.
    pub async fn interrupted(&mut self) {
        self.signal.recv().await;
    }
}

fn read_password(term: &Term, prompt: &str) -> io::Result<String> {
    term.write_str(&format!("{}: ", prompt))?;
    let password = read_masked(|| term.read_key_raw());
    term.write_line("")?;
    password
}

/// Collect keys up to Enter without echoing them. Ctrl+C interrupts.
fn read_masked<F>(mut next_key: F) -> io::Result<String>
where
    F: FnMut() -> io::Result<Key>,
{
    let mut password = String::new();
    loop {
        match next_key()? {
            Key::Enter => return Ok(password),
            Key::CtrlC => return Err(io::Error::from(io::ErrorKind::Interrupted)),
            Key::Backspace => {
                password.pop();
            }
            Key::Char(c) if !c.is_control() => password.push(c),
            Key::Unknown => {
                return Err(io::Error::new(io::ErrorKind::NotConnected, "not a terminal"))
            }
            _ => {}
        }
    }
}

fn on_interrupt_newline<T>(answer: io::Result<T>) -> io::Result<T> {
    if matches!(&answer, Err(e) if e.kind() == io::ErrorKind::Interrupted) {
        eprintln!();
    }
    answer
}


#[cfg(test)]
pub(crate) mod scripted {
    use std::collections::VecDeque;
    use std::io;
    use std::sync::Mutex;

    use super::Prompter;

    /// Replays canned answers in order and records shown errors.
    #[derive(Default)]
    pub struct ScriptedPrompter {
        answers: Mutex<VecDeque<Answer>>,
        pub errors: Mutex<Vec<String>>,
        pub offered_defaults: Mutex<Vec<Option<String>>>,
    }

    pub enum Answer {
        Text(&'static str),
        Yes,
        No,
        Interrupt,
    }

    impl ScriptedPrompter {
        pub fn new(answers: Vec<Answer>) -> Self {
            Self {
                answers: Mutex::new(answers.into()),
                errors: Mutex::new(Vec::new()),
                offered_defaults: Mutex::new(Vec::new()),
            }
        }

        pub fn remaining(&self) -> usize {
            self.answers.lock().unwrap().len()
        }

        fn next(&self) -> io::Result<Answer> {
            self.answers
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "script exhausted"))
        }

        fn text(&self) -> io::Result<String> {
            match self.next()? {
                Answer::Text(text) => Ok(text.to_string()),
                Answer::Interrupt => Err(io::Error::from(io::ErrorKind::Interrupted)),
                _ => Err(io::Error::new(io::ErrorKind::InvalidInput, "expected text")),
            }
        }
    }

    impl Prompter for ScriptedPrompter {
        fn username(&self, default: Option<&str>) -> io::Result<String> {
            self.offered_defaults
                .lock()
                .unwrap()
                .push(default.map(str::to_string));
            match (self.text()?, default) {
                (text, Some(default)) if text.is_empty() => Ok(default.to_string()),
                (text, _) => Ok(text),
            }
        }

        fn email(&self) -> io::Result<String> {
            self.text()
        }

        fn password(&self) -> io::Result<String> {
            self.text()
        }

        fn confirm_bypass(&self) -> io::Result<bool> {
            match self.next()? {
                Answer::Yes => Ok(true),
                Answer::No => Ok(false),
                Answer::Interrupt => Err(io::Error::from(io::ErrorKind::Interrupted)),
                Answer::Text(_) => Err(io::Error::new(io::ErrorKind::InvalidInput, "expected yes/no")),
            }
        }

        fn error(&self, message: &str) {
            self.errors.lock().unwrap().push(message.to_string());
        }
    }
}
