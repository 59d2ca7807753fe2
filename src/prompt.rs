use anyhow::{Result, bail};
use std::io::{self, BufRead, IsTerminal, Write};
use zeroize::Zeroizing;

pub fn is_interactive() -> bool {
    io::stdin().is_terminal()
}

/// Reads a secret: hidden prompt on a TTY, otherwise one line from stdin.
///
/// `printf "%s" "$SECRET" | pwoffice add Gmail me@example.com`
pub fn read_secret(prompt: &str) -> Result<Zeroizing<String>> {
    if is_interactive() {
        return Ok(Zeroizing::new(rpassword::prompt_password(prompt)?));
    }

    let mut buf = Zeroizing::new(String::new());
    io::stdin().lock().read_line(&mut buf)?;
    trim_newline(&mut buf);
    Ok(buf)
}

/// Reads one visible line; the prompt goes to stderr so stdout stays clean.
pub fn read_line(prompt: &str) -> Result<String> {
    if is_interactive() {
        eprint!("{prompt}");
        io::stderr().flush()?;
    }

    let mut buf = String::new();
    io::stdin().lock().read_line(&mut buf)?;
    trim_newline(&mut buf);
    Ok(buf)
}

/// y/N question. Only possible on a terminal.
pub fn confirm(question: &str) -> Result<bool> {
    if !is_interactive() {
        bail!("cannot ask for confirmation without a terminal; pass --yes");
    }

    let answer = read_line(&format!("{question} (y/N): "))?;
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}

/// Destructive actions need the literal `word`, given up front or typed in.
pub fn confirm_word(word: &str, provided: Option<String>, prompt: &str) -> Result<bool> {
    let typed = match provided {
        Some(typed) => typed,
        None => read_line(prompt)?,
    };
    Ok(typed.trim() == word)
}

fn trim_newline(s: &mut String) {
    while s.ends_with('\n') || s.ends_with('\r') {
        s.pop();
    }
}
