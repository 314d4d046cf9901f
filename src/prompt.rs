// src/prompt.rs

//! Interactive worker-count prompt, used when neither `--count` nor the
//! config file provides one.

use std::io::{self, BufRead, Write};

use crate::errors::{ForkwatchError, Result};

const PROMPT: &str = "How many worker processes? ";

/// Prompt on `output` and read one count from `input`.
pub fn read_count<R: BufRead, W: Write>(mut input: R, mut output: W) -> Result<usize> {
    output.write_all(PROMPT.as_bytes())?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(ForkwatchError::InvalidCount(
            "stdin closed before a count was entered".to_string(),
        ));
    }
    parse_count(&line)
}

/// Prompt on the terminal.
pub fn prompt_count() -> Result<usize> {
    read_count(io::stdin().lock(), io::stdout())
}

pub fn parse_count(s: &str) -> Result<usize> {
    let s = s.trim();
    s.parse::<usize>()
        .map_err(|e| ForkwatchError::InvalidCount(format!("'{s}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_count_and_writes_prompt() {
        let mut out = Vec::new();
        let n = read_count("  4\n".as_bytes(), &mut out).unwrap();
        assert_eq!(n, 4);
        assert_eq!(String::from_utf8(out).unwrap(), PROMPT);
    }

    #[test]
    fn zero_is_a_valid_count() {
        assert_eq!(parse_count("0").unwrap(), 0);
    }

    #[test]
    fn rejects_garbage_negative_and_eof() {
        assert!(matches!(parse_count("three"), Err(ForkwatchError::InvalidCount(_))));
        assert!(matches!(parse_count("-1"), Err(ForkwatchError::InvalidCount(_))));
        assert!(matches!(
            read_count("".as_bytes(), Vec::new()),
            Err(ForkwatchError::InvalidCount(_))
        ));
    }
}
