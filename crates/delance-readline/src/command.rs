use delance_core::Role;

/// Words offered by completion, in the order `help` lists them.
pub const COMMAND_WORDS: &[&str] = &[
    "connect",
    "role",
    "employer",
    "freelancer",
    "show",
    "requests",
    "pending",
    "refresh",
    "create",
    "approve",
    "set-freelancer",
    "help",
    "quit",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Connect,
    Role(Role),
    /// Employer address field; `None` clears it.
    Employer(Option<String>),
    Freelancer(Option<String>),
    Show,
    Requests,
    Pending,
    Refresh,
    Create { amount: String, title: String },
    Approve(usize),
    SetFreelancer,
    Help,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (word, rest) = line
            .split_once(char::is_whitespace)
            .map(|(word, rest)| (word, rest.trim()))
            .unwrap_or((line, ""));

        match word.to_ascii_lowercase().as_str() {
            "connect" => Ok(Self::Connect),
            "role" => rest
                .parse::<Role>()
                .map(Self::Role)
                .map_err(|_| "usage: role <viewer|employer|freelancer>".to_string()),
            "employer" => Ok(Self::Employer(optional(rest))),
            "freelancer" => Ok(Self::Freelancer(optional(rest))),
            "show" | "status" => Ok(Self::Show),
            "requests" | "list" => Ok(Self::Requests),
            "pending" => Ok(Self::Pending),
            "refresh" => Ok(Self::Refresh),
            "create" => {
                let (amount, title) = rest
                    .split_once(char::is_whitespace)
                    .ok_or_else(|| "usage: create <amount> <title>".to_string())?;
                Ok(Self::Create {
                    amount: amount.to_string(),
                    title: title.trim().to_string(),
                })
            }
            "approve" => rest
                .parse()
                .map(Self::Approve)
                .map_err(|_| "usage: approve <index>".to_string()),
            "set-freelancer" => Ok(Self::SetFreelancer),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" => Ok(Self::Quit),
            other => Err(format!("Unknown command '{}'. Type 'help'.", other)),
        }
    }
}

fn optional(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_role() {
        assert_eq!(Command::parse("role Employer"), Ok(Command::Role(Role::Employer)));
        assert!(Command::parse("role boss").is_err());
    }

    #[test]
    fn test_parse_create_keeps_title_spaces() {
        assert_eq!(
            Command::parse("create 1.5 Design logo"),
            Ok(Command::Create {
                amount: "1.5".to_string(),
                title: "Design logo".to_string(),
            })
        );
        assert!(Command::parse("create 1.5").is_err());
    }

    #[test]
    fn test_parse_address_fields() {
        assert_eq!(
            Command::parse("freelancer 0xabc"),
            Ok(Command::Freelancer(Some("0xabc".to_string())))
        );
        assert_eq!(Command::parse("employer"), Ok(Command::Employer(None)));
    }

    #[test]
    fn test_parse_misc() {
        assert_eq!(Command::parse("  approve 2 "), Ok(Command::Approve(2)));
        assert!(Command::parse("approve first").is_err());
        assert_eq!(Command::parse("exit"), Ok(Command::Quit));
        assert!(Command::parse("withdraw").is_err());
    }
}
