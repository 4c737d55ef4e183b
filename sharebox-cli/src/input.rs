use std::io::Write;

use crate::deletion::Confirm;

pub fn read_stdin_buf<P>(prompt: P, buffer: &mut String) -> std::io::Result<usize>
where
    P: AsRef<str>
{
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();

    stdout.write_all(prompt.as_ref().as_bytes())?;
    stdout.flush()?;

    stdin.read_line(buffer)
}

/// reads a single line. `Ok(None)` once stdin is closed
pub fn read_stdin<P>(prompt: P) -> std::io::Result<Option<String>>
where
    P: AsRef<str>
{
    let mut buffer = String::new();

    if read_stdin_buf(prompt, &mut buffer)? == 0 {
        Ok(None)
    } else {
        Ok(Some(buffer))
    }
}

pub fn parse_yn(given: &str) -> bool {
    given.trim()
        .chars()
        .next()
        .map(|c| c.to_ascii_lowercase() == 'y')
        .unwrap_or(false)
}

pub fn read_yn<P>(prefix: P) -> std::io::Result<bool>
where
    P: std::fmt::Display
{
    let prompt = format!("{} [y|n]: ", prefix);

    match read_stdin(prompt)? {
        Some(given) => Ok(parse_yn(&given)),
        None => Ok(false)
    }
}

/// confirmation through the terminal, skipped when `assume_yes` is set
#[derive(Debug, Clone, Copy, Default)]
pub struct Prompt {
    pub assume_yes: bool,
}

impl Confirm for Prompt {
    fn confirm(&mut self, prompt: &str) -> std::io::Result<bool> {
        if self.assume_yes {
            Ok(true)
        } else {
            read_yn(prompt)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn yes_no_answers() {
        assert!(parse_yn("y\n"));
        assert!(parse_yn("  Yes"));
        assert!(!parse_yn("n"));
        assert!(!parse_yn(""));
        assert!(!parse_yn("maybe"));
    }

    #[test]
    fn assume_yes_skips_prompt() {
        let mut prompt = Prompt { assume_yes: true };

        assert!(prompt.confirm("delete?").unwrap());
    }
}
