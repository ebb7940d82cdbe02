//! The registration conversation as a pure state machine.
//!
//! `advance` maps (current step, inbound text) to (next step, effects) and
//! touches nothing else — no transport, no database — so every transition is
//! testable in isolation. The driver in `registration.rs` executes the
//! effects.

use std::sync::OnceLock;

use regex::Regex;

/// Where a participant currently is in the registration dialogue.
/// Absence of a step (the store returns `None`) is the idle state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    AwaitingEmail,
    AwaitingPassword { email: String },
}

/// Canned replies sent back over the chat transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    Welcome,
    AskEmail,
    BadEmail,
    AskPassword,
    Registered,
    AlreadyRegistered,
}

impl Reply {
    pub fn text(self) -> &'static str {
        match self {
            Reply::Welcome => "Hi! To register on the site, send /register",
            Reply::AskEmail => "Enter your email:",
            Reply::BadEmail => "That email looks invalid. Please enter a valid email:",
            Reply::AskPassword => "Enter your password:",
            Reply::Registered => "Done! You can now sign in to your account on the site.",
            Reply::AlreadyRegistered => "You are already registered.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Reply(Reply),
    /// Run the account-creation sub-procedure: fetch the profile photo, hash
    /// the password, insert the row. The driver reports the outcome.
    CreateAccount { email: String, password: String },
}

/// Advance the conversation one inbound message.
///
/// Commands are only recognized while idle; mid-conversation, "/start" is
/// just an invalid email and "/register" a perfectly valid password. The
/// AwaitingPassword transition always clears the step — account creation may
/// still fail, but the conversation is over either way.
pub fn advance(step: Option<Step>, text: &str) -> (Option<Step>, Vec<Effect>) {
    let text = text.trim();

    match step {
        // Clients may suffix the bot's mention onto a command
        // ("/register@portico_bot"); the suffix carries no information here.
        None => match text.split('@').next().unwrap_or(text) {
            "/start" => (None, vec![Effect::Reply(Reply::Welcome)]),
            "/register" => (Some(Step::AwaitingEmail), vec![Effect::Reply(Reply::AskEmail)]),
            _ => (None, vec![]),
        },
        Some(Step::AwaitingEmail) => {
            if is_valid_email(text) {
                (
                    Some(Step::AwaitingPassword {
                        email: text.to_string(),
                    }),
                    vec![Effect::Reply(Reply::AskPassword)],
                )
            } else {
                (Some(Step::AwaitingEmail), vec![Effect::Reply(Reply::BadEmail)])
            }
        }
        Some(Step::AwaitingPassword { email }) => (
            None,
            vec![Effect::CreateAccount {
                email,
                password: text.to_string(),
            }],
        ),
    }
}

/// Syntactic email check: something, an `@`, something, a dot, something.
/// A prefix match, not RFC address parsing.
pub fn is_valid_email(s: &str) -> bool {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let re = PATTERN.get_or_init(|| Regex::new(r"^[^@]+@[^@]+\.[^@]+").unwrap());
    re.is_match(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_pattern() {
        assert!(is_valid_email("foo@bar.com"));
        assert!(is_valid_email("a@b.c"));
        // Trailing junk is accepted; the pattern is a prefix match.
        assert!(is_valid_email("a@b.c@d"));

        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("missing@dot"));
        assert!(!is_valid_email("@no.local"));
        assert!(!is_valid_email("two@at@signs.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn start_replies_without_entering_the_flow() {
        let (step, effects) = advance(None, "/start");
        assert_eq!(step, None);
        assert_eq!(effects, vec![Effect::Reply(Reply::Welcome)]);
    }

    #[test]
    fn register_enters_awaiting_email() {
        let (step, effects) = advance(None, "/register");
        assert_eq!(step, Some(Step::AwaitingEmail));
        assert_eq!(effects, vec![Effect::Reply(Reply::AskEmail)]);
    }

    #[test]
    fn mention_suffixed_commands_are_recognized() {
        let (step, effects) = advance(None, "/register@portico_bot");
        assert_eq!(step, Some(Step::AwaitingEmail));
        assert_eq!(effects, vec![Effect::Reply(Reply::AskEmail)]);

        let (step, effects) = advance(None, "/start@portico_bot");
        assert_eq!(step, None);
        assert_eq!(effects, vec![Effect::Reply(Reply::Welcome)]);

        // Idle free text containing '@' is still just ignored.
        let (step, effects) = advance(None, "foo@bar.com");
        assert_eq!(step, None);
        assert!(effects.is_empty());
    }

    #[test]
    fn idle_ignores_free_text() {
        let (step, effects) = advance(None, "hello there");
        assert_eq!(step, None);
        assert!(effects.is_empty());
    }

    #[test]
    fn valid_email_is_trimmed_and_advances() {
        let (step, effects) = advance(Some(Step::AwaitingEmail), " foo@bar.com ");
        assert_eq!(
            step,
            Some(Step::AwaitingPassword {
                email: "foo@bar.com".to_string()
            })
        );
        assert_eq!(effects, vec![Effect::Reply(Reply::AskPassword)]);
    }

    #[test]
    fn invalid_email_reprompts_without_advancing() {
        let (step, effects) = advance(Some(Step::AwaitingEmail), "not-an-email");
        assert_eq!(step, Some(Step::AwaitingEmail));
        assert_eq!(effects, vec![Effect::Reply(Reply::BadEmail)]);

        // No retry limit: still reprompting on the tenth attempt.
        let mut step = step;
        for _ in 0..10 {
            let (next, effects) = advance(step, "still wrong");
            assert_eq!(next, Some(Step::AwaitingEmail));
            assert_eq!(effects, vec![Effect::Reply(Reply::BadEmail)]);
            step = next;
        }
    }

    #[test]
    fn commands_mid_conversation_are_plain_text() {
        let (step, effects) = advance(Some(Step::AwaitingEmail), "/start");
        assert_eq!(step, Some(Step::AwaitingEmail));
        assert_eq!(effects, vec![Effect::Reply(Reply::BadEmail)]);
    }

    #[test]
    fn password_step_clears_state_and_emits_creation() {
        let step = Some(Step::AwaitingPassword {
            email: "foo@bar.com".to_string(),
        });
        let (next, effects) = advance(step, "  s3cret  ");
        assert_eq!(next, None);
        assert_eq!(
            effects,
            vec![Effect::CreateAccount {
                email: "foo@bar.com".to_string(),
                password: "s3cret".to_string(),
            }]
        );
    }

    #[test]
    fn password_step_only_reachable_through_email() {
        // From idle or AwaitingEmail, no input produces CreateAccount.
        for input in ["/register", "foo@bar.com", "anything"] {
            let (_, effects) = advance(None, input);
            assert!(!effects
                .iter()
                .any(|e| matches!(e, Effect::CreateAccount { .. })));
        }
        let (step, _) = advance(Some(Step::AwaitingEmail), "foo@bar.com");
        match step {
            Some(Step::AwaitingPassword { email }) => assert_eq!(email, "foo@bar.com"),
            other => panic!("expected AwaitingPassword, got {other:?}"),
        }
    }
}
