//! Interactive prompt capabilities.
//!
//! The schedule editor, `edit`, `log`, `generate`, and the confirmation
//! flows all consume the same small capability set so the business logic
//! stays testable with scripted responses. `--yes` swaps in [`AlwaysYes`],
//! which auto-confirms but still errors on prompts that genuinely need
//! typed input.

use std::io::{BufRead, Write};

use crate::error::{Error, Result};

/// The prompt/select/confirm capability set.
pub trait Prompter {
    /// Ask a free-text question.
    fn prompt(&mut self, question: &str) -> Result<String>;

    /// Ask a free-text question with a default shown in brackets; an empty
    /// answer returns the default.
    fn prompt_with_default(&mut self, question: &str, default: &str) -> Result<String> {
        let answer = self.prompt(&format!("{question} [{default}]"))?;
        if answer.is_empty() {
            Ok(default.to_string())
        } else {
            Ok(answer)
        }
    }

    /// Ask a yes/no question; `false` by default.
    fn confirm(&mut self, question: &str) -> Result<bool>;

    /// Pick one option by index.
    fn select(&mut self, question: &str, options: &[&str]) -> Result<usize>;

    /// Pick any number of options by index.
    fn multi_select(&mut self, question: &str, options: &[&str]) -> Result<Vec<usize>>;
}

/// Prompter over stdin/stdout.
pub struct StdinPrompter;

impl StdinPrompter {
    fn read_line(&self) -> Result<String> {
        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line)?;
        Ok(line.trim().to_string())
    }
}

impl Prompter for StdinPrompter {
    fn prompt(&mut self, question: &str) -> Result<String> {
        print!("{question}: ");
        std::io::stdout().flush()?;
        self.read_line()
    }

    fn confirm(&mut self, question: &str) -> Result<bool> {
        print!("{question} [y/N] ");
        std::io::stdout().flush()?;
        let answer = self.read_line()?.to_lowercase();
        Ok(answer == "y" || answer == "yes")
    }

    fn select(&mut self, question: &str, options: &[&str]) -> Result<usize> {
        println!("{question}");
        for (i, option) in options.iter().enumerate() {
            println!("  {}. {option}", i + 1);
        }
        loop {
            print!("> ");
            std::io::stdout().flush()?;
            let answer = self.read_line()?;
            if let Ok(n) = answer.parse::<usize>() {
                if n >= 1 && n <= options.len() {
                    return Ok(n - 1);
                }
            }
            println!("enter a number between 1 and {}", options.len());
        }
    }

    fn multi_select(&mut self, question: &str, options: &[&str]) -> Result<Vec<usize>> {
        println!("{question} (comma-separated numbers, empty for none)");
        for (i, option) in options.iter().enumerate() {
            println!("  {}. {option}", i + 1);
        }
        print!("> ");
        std::io::stdout().flush()?;
        let answer = self.read_line()?;

        let mut picks = Vec::new();
        for part in answer.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let n: usize = part.parse().map_err(|_| {
                Error::InvalidArgument(format!("invalid selection '{part}'"))
            })?;
            if n < 1 || n > options.len() {
                return Err(Error::InvalidArgument(format!(
                    "selection {n} out of range"
                )));
            }
            picks.push(n - 1);
        }
        Ok(picks)
    }
}

/// Wraps another prompter and answers yes to every confirmation. Used by
/// `--yes` flags: other interactions still reach the inner prompter.
pub struct AlwaysYes<P>(pub P);

impl<P: Prompter> Prompter for AlwaysYes<P> {
    fn prompt(&mut self, question: &str) -> Result<String> {
        self.0.prompt(question)
    }

    fn prompt_with_default(&mut self, question: &str, default: &str) -> Result<String> {
        self.0.prompt_with_default(question, default)
    }

    fn confirm(&mut self, _question: &str) -> Result<bool> {
        Ok(true)
    }

    fn select(&mut self, question: &str, options: &[&str]) -> Result<usize> {
        self.0.select(question, options)
    }

    fn multi_select(&mut self, question: &str, options: &[&str]) -> Result<Vec<usize>> {
        self.0.multi_select(question, options)
    }
}

/// Prompter that replays a fixed script. Intended for tests; answers are
/// consumed in order, and running out of script is an error.
pub struct Scripted {
    answers: std::collections::VecDeque<String>,
}

impl Scripted {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
        }
    }

    fn next(&mut self, question: &str) -> Result<String> {
        self.answers.pop_front().ok_or_else(|| {
            Error::OperationFailed(format!("no scripted answer for '{question}'"))
        })
    }
}

impl Prompter for Scripted {
    fn prompt(&mut self, question: &str) -> Result<String> {
        self.next(question)
    }

    fn confirm(&mut self, question: &str) -> Result<bool> {
        let answer = self.next(question)?.to_lowercase();
        Ok(answer == "y" || answer == "yes")
    }

    fn select(&mut self, question: &str, options: &[&str]) -> Result<usize> {
        let answer = self.next(question)?;
        let n: usize = answer
            .parse()
            .map_err(|_| Error::InvalidArgument(format!("invalid selection '{answer}'")))?;
        if n < 1 || n > options.len() {
            return Err(Error::InvalidArgument(format!("selection {n} out of range")));
        }
        Ok(n - 1)
    }

    fn multi_select(&mut self, question: &str, options: &[&str]) -> Result<Vec<usize>> {
        let answer = self.next(question)?;
        let mut picks = Vec::new();
        for part in answer.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let n: usize = part
                .parse()
                .map_err(|_| Error::InvalidArgument(format!("invalid selection '{part}'")))?;
            if n < 1 || n > options.len() {
                return Err(Error::InvalidArgument(format!("selection {n} out of range")));
            }
            picks.push(n - 1);
        }
        Ok(picks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_replays_in_order() {
        let mut p = Scripted::new(["hello", "y", "2"]);
        assert_eq!(p.prompt("q1").unwrap(), "hello");
        assert!(p.confirm("q2").unwrap());
        assert_eq!(p.select("q3", &["a", "b", "c"]).unwrap(), 1);
        assert!(p.prompt("q4").is_err());
    }

    #[test]
    fn prompt_with_default_falls_back() {
        let mut p = Scripted::new(["", "typed"]);
        assert_eq!(p.prompt_with_default("q", "dflt").unwrap(), "dflt");
        assert_eq!(p.prompt_with_default("q", "dflt").unwrap(), "typed");
    }

    #[test]
    fn always_yes_only_overrides_confirm() {
        let mut p = AlwaysYes(Scripted::new(["text"]));
        assert!(p.confirm("sure?").unwrap());
        assert_eq!(p.prompt("q").unwrap(), "text");
    }
}
