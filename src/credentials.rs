//! Sources for the login credentials that were not configured up front.

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use std::io::{self, BufRead, IsTerminal, Write};

pub trait CredentialProvider {
    fn username(&mut self) -> io::Result<String>;
    fn password(&mut self) -> io::Result<String>;
}

/// Asks the operator on the controlling terminal. The password is not echoed.
#[derive(Debug, Default)]
pub struct TerminalPrompt;

impl CredentialProvider for TerminalPrompt {
    fn username(&mut self) -> io::Result<String> {
        prompt("Username: ")?;
        read_line()
    }

    fn password(&mut self) -> io::Result<String> {
        prompt("Password: ")?;
        if !io::stdin().is_terminal() {
            return read_line();
        }
        terminal::enable_raw_mode()?;
        let password = read_hidden();
        terminal::disable_raw_mode()?;
        println!();
        password
    }
}

fn prompt(label: &str) -> io::Result<()> {
    let mut stdout = io::stdout();
    stdout.write_all(label.as_bytes())?;
    stdout.flush()
}

fn read_line() -> io::Result<String> {
    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "input closed before a line was entered",
        ));
    }
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

// Raw mode turns off echo and line buffering, so keys are collected one by one.
fn read_hidden() -> io::Result<String> {
    let mut password = String::new();
    loop {
        let Event::Key(KeyEvent {
            code,
            modifiers,
            kind,
            ..
        }) = event::read()?
        else {
            continue;
        };
        if kind == KeyEventKind::Release {
            continue;
        }
        match hidden_key(&mut password, code, modifiers) {
            HiddenKey::Pending => {}
            HiddenKey::Done => return Ok(password),
            HiddenKey::Interrupted => {
                return Err(io::Error::new(
                    io::ErrorKind::Interrupted,
                    "password prompt interrupted",
                ));
            }
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum HiddenKey {
    Pending,
    Done,
    Interrupted,
}

fn hidden_key(password: &mut String, code: KeyCode, modifiers: KeyModifiers) -> HiddenKey {
    let control = modifiers.contains(KeyModifiers::CONTROL);
    match code {
        KeyCode::Enter => HiddenKey::Done,
        KeyCode::Char('c') if control => HiddenKey::Interrupted,
        KeyCode::Char(_) if control => HiddenKey::Pending,
        KeyCode::Char(c) => {
            password.push(c);
            HiddenKey::Pending
        }
        KeyCode::Backspace => {
            password.pop();
            HiddenKey::Pending
        }
        _ => HiddenKey::Pending,
    }
}

/// Preset credentials, for runs where nobody is at the terminal.
#[derive(Debug, Clone)]
pub struct FixedCredentials {
    username: String,
    password: String,
}

impl FixedCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl CredentialProvider for FixedCredentials {
    fn username(&mut self) -> io::Result<String> {
        Ok(self.username.clone())
    }

    fn password(&mut self) -> io::Result<String> {
        Ok(self.password.clone())
    }
}
