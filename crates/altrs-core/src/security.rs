// Altrs Command Security
// Allow/Ask/Deny rules deciding whether a profile may launch a program

use regex::Regex;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::ids::ItemId;
use crate::item::{ItemChange, Named};

/// Outcome of checking a command line against the rules
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
pub enum CommandDecision {
    Allow,
    Ask,
    Deny,
}

/// A single rule: commands matching `pattern` get `decision`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandRule {
    pub id: ItemId,
    /// Regex matched against the whole command line (program and arguments)
    pub pattern: String,
    pub decision: CommandDecision,
}

impl CommandRule {
    pub fn new(id: ItemId, pattern: impl Into<String>, decision: CommandDecision) -> Self {
        Self {
            id,
            pattern: pattern.into(),
            decision,
        }
    }

    /// Change the decision, reporting a change only if it differs
    pub fn set_decision(&mut self, decision: CommandDecision) -> Option<ItemChange> {
        if self.decision == decision {
            return None;
        }
        self.decision = decision;
        Some(ItemChange::DecisionChanged {
            id: self.id,
            decision,
        })
    }

    /// Compile the rule pattern, anchored to the full command line
    pub fn compile(&self) -> Result<Regex, regex::Error> {
        Regex::new(&format!("^(?:{})$", self.pattern))
    }
}

impl Named for CommandRule {
    fn id(&self) -> ItemId {
        self.id
    }

    fn name(&self) -> &str {
        &self.pattern
    }

    fn set_name(&mut self, name: String) {
        self.pattern = name;
    }
}

/// Build the command line string rules are matched against
pub fn command_line(program: &str, args: &str) -> String {
    if args.trim().is_empty() {
        program.to_string()
    } else {
        format!("{} {}", program, args.trim())
    }
}

/// Decide whether a command line may run.
///
/// Rules are checked in order and the first match wins. A rule whose pattern
/// fails to compile is skipped. Without a match `fallback` applies.
pub fn evaluate(rules: &[CommandRule], command: &str, fallback: CommandDecision) -> CommandDecision {
    for rule in rules {
        match rule.compile() {
            Ok(re) if re.is_match(command) => return rule.decision,
            Ok(_) => {}
            Err(e) => log::warn!("Skipping command rule {}: {}", rule.id, e),
        }
    }
    fallback
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> Vec<CommandRule> {
        vec![
            CommandRule::new(1, r"notepad(\.exe)?", CommandDecision::Allow),
            CommandRule::new(2, r".*rm -rf.*", CommandDecision::Deny),
            CommandRule::new(3, r"firefox .*", CommandDecision::Ask),
        ]
    }

    #[test]
    fn test_first_match_wins() {
        let rules = rules();
        assert_eq!(
            evaluate(&rules, "notepad.exe", CommandDecision::Deny),
            CommandDecision::Allow
        );
        assert_eq!(
            evaluate(&rules, "sh -c rm -rf /", CommandDecision::Allow),
            CommandDecision::Deny
        );
        assert_eq!(
            evaluate(&rules, "firefox https://example.org", CommandDecision::Deny),
            CommandDecision::Ask
        );
    }

    #[test]
    fn test_pattern_is_anchored() {
        let rules = rules();
        // "notepad" must match the whole command line
        assert_eq!(
            evaluate(&rules, "notepad.exe secrets.txt", CommandDecision::Deny),
            CommandDecision::Deny
        );
    }

    #[test]
    fn test_fallback_and_bad_rule() {
        let rules = vec![CommandRule::new(1, "(", CommandDecision::Allow)];
        assert_eq!(evaluate(&rules, "(", CommandDecision::Ask), CommandDecision::Ask);
    }

    #[test]
    fn test_command_line() {
        assert_eq!(command_line("calc", ""), "calc");
        assert_eq!(command_line("firefox", " a.html "), "firefox a.html");
    }

    #[test]
    fn test_decision_parse_and_change() {
        assert_eq!("Deny".parse::<CommandDecision>().unwrap(), CommandDecision::Deny);
        let mut rule = CommandRule::new(5, "x", CommandDecision::Ask);
        assert_eq!(
            rule.set_decision(CommandDecision::Allow),
            Some(ItemChange::DecisionChanged {
                id: 5,
                decision: CommandDecision::Allow
            })
        );
        assert_eq!(rule.set_decision(CommandDecision::Allow), None);
    }
}
