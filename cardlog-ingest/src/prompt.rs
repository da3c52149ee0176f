use anyhow::{Context, Result, bail};
use std::io::{self, BufRead, Write};

/// Ask for one line of input; surrounding whitespace is dropped.
pub fn prompt_with<R: BufRead, W: Write>(input: &mut R, output: &mut W, label: &str) -> Result<String> {
    write!(output, "{}: ", label)?;
    output.flush().ok();
    let mut s = String::new();
    let n = input.read_line(&mut s).context("read from stdin")?;
    if n == 0 {
        bail!("no input for '{label}' (stdin closed)");
    }
    Ok(s.trim().to_string())
}

/// Like [`prompt_with`] but rejects empty answers.
pub fn prompt_required<R: BufRead, W: Write>(input: &mut R, output: &mut W, label: &str) -> Result<String> {
    let s = prompt_with(input, output, label)?;
    if s.is_empty() {
        bail!("{label} is required");
    }
    Ok(s)
}

/// Prompt on the terminal.
pub fn prompt(label: &str) -> Result<String> {
    prompt_required(&mut io::stdin().lock(), &mut io::stdout(), label)
}

/// Read a secret from `input` after showing `label`; the answer is not echoed.
pub fn prompt_secret_with<R: BufRead, W: Write>(input: &mut R, output: &mut W, label: &str) -> Result<String> {
    write!(output, "{}: ", label)?;
    output.flush().ok();
    let s = rpassword::read_password_from_bufread(input).context("read secret")?;
    if s.is_empty() {
        bail!("{label} is required");
    }
    Ok(s)
}

/// Prompt on the terminal with echo turned off.
pub fn prompt_secret(label: &str) -> Result<String> {
    let s = rpassword::prompt_password(format!("{label}: ")).context("read secret from terminal")?;
    if s.is_empty() {
        bail!("{label} is required");
    }
    Ok(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trims_answer_and_echoes_label() {
        let mut input = "  1234 \n".as_bytes();
        let mut out = Vec::new();
        let s = prompt_with(&mut input, &mut out, "Account").unwrap();
        assert_eq!(s, "1234");
        assert_eq!(String::from_utf8(out).unwrap(), "Account: ");
    }

    #[test]
    fn test_secret_reads_line_without_newline() {
        let mut input = "hunter2\n".as_bytes();
        let mut out = Vec::new();
        let s = prompt_secret_with(&mut input, &mut out, "Password").unwrap();
        assert_eq!(s, "hunter2");
        assert_eq!(String::from_utf8(out).unwrap(), "Password: ");

        let mut blank = "\n".as_bytes();
        assert!(prompt_secret_with(&mut blank, &mut Vec::new(), "Password").is_err());
    }

    #[test]
    fn test_required_rejects_blank_and_eof() {
        let mut out = Vec::new();
        assert!(prompt_required(&mut "\n".as_bytes(), &mut out, "Path").is_err());
        assert!(prompt_required(&mut "".as_bytes(), &mut out, "Path").is_err());
    }
}
