use std::io::{self, BufRead, Write};

use instasocial::controller::AmountPrompt;

/// Answers that back out of the prompt.
const CANCEL_ANSWERS: [&str; 2] = ["-", "cancel"];

/// Reads the answer from stdin. A bare Enter accepts the default; `-` or `cancel` backs out,
/// as does end of input.
pub struct StdinPrompt;

impl AmountPrompt for StdinPrompt {
    fn prompt_amount(&self, message: &str, default: &str) -> Option<String> {
        print!("{message} [{default}] (`-` to cancel): ");
        let _ = io::stdout().flush();
        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(interpret_answer(&line, default)),
        }
    }
}

/// An empty string means the user backed out.
fn interpret_answer(line: &str, default: &str) -> String {
    let answer = line.trim();
    if CANCEL_ANSWERS.iter().any(|cancel| answer.eq_ignore_ascii_case(cancel)) {
        String::new()
    } else if answer.is_empty() {
        default.to_string()
    } else {
        answer.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use instasocial::utils::units::parse_tip_amount;

    #[test]
    fn enter_accepts_default() {
        assert_eq!(interpret_answer("\n", "0.001"), "0.001");
        assert_eq!(interpret_answer(" 0.5 \n", "0.001"), "0.5");
    }

    #[test]
    fn cancel_answers_abort_the_tip() {
        for line in ["-\n", "cancel\n", " CANCEL "] {
            let answer = interpret_answer(line, "0.001");
            assert_eq!(answer, "");
            assert_eq!(parse_tip_amount(&answer).unwrap(), None);
        }
    }
}
