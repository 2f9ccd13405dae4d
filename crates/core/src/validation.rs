//! Post-resolution validation.
//!
//! Provides [`Validator`] which checks resolved text for leftover conflict
//! markers, unbalanced brackets, and missing companions declared by the
//! pairing-rule table.
//!
//! # Pairing rules
//!
//! A rule is a `(flag, requires)` pair of line patterns:
//!
//! | Condition | Finding |
//! |-----------|---------|
//! | A line matches `flag` and no line matches `requires` | `MissingPairing` |
//! | Otherwise | none |
//!
//! Comment lines never match either pattern.

use std::fmt;

use regex_lite::Regex;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::{RuleConfig, ValidationConfig};
use crate::conflict::scanner::marker_lines;
use crate::errors::{ConfigError, ValidationError};

// ---------------------------------------------------------------------------
// Findings
// ---------------------------------------------------------------------------

/// What a finding is about.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FindingKind {
    /// A conflict marker survived.
    ResidualMarker,
    /// A flag is enabled without its companion.
    MissingPairing { rule: String, description: String },
    /// A closing bracket with nothing open.
    UnmatchedBracket { close: char },
    /// A closing bracket that does not match the innermost open one.
    MismatchedBracket { open: char, open_line: usize, close: char },
    /// An opening bracket never closed.
    UnclosedBracket { open: char },
}

/// One validation problem, anchored to a line.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Finding {
    pub line: usize,
    #[serde(flatten)]
    pub kind: FindingKind,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: ", self.line)?;
        match &self.kind {
            FindingKind::ResidualMarker => write!(f, "conflict marker left in output"),
            FindingKind::MissingPairing { rule, description } => {
                write!(f, "missing pairing [{rule}]: {description}")
            }
            FindingKind::UnmatchedBracket { close } => write!(f, "unmatched '{close}'"),
            FindingKind::MismatchedBracket {
                open,
                open_line,
                close,
            } => write!(f, "'{close}' does not close '{open}' from line {open_line}"),
            FindingKind::UnclosedBracket { open } => write!(f, "'{open}' is never closed"),
        }
    }
}

// ---------------------------------------------------------------------------
// Pairing rules
// ---------------------------------------------------------------------------

/// The rules shipped with the tool.
pub fn builtin_rules() -> Vec<RuleConfig> {
    vec![
        RuleConfig {
            name: "core-library-desugaring".into(),
            flag: r"^\s*([\w.]*\.)?(is)?[cC]oreLibraryDesugaringEnabled\s*(=\s*)?true\b".into(),
            requires: r#"^\s*coreLibraryDesugaring\s*[(\s'"]"#.into(),
            description: "coreLibraryDesugaringEnabled requires a coreLibraryDesugaring(...) dependency"
                .into(),
        },
    ]
}

/// A compiled pairing rule.
#[derive(Debug, Clone)]
pub struct PairingRule {
    pub name: String,
    pub description: String,
    flag: Regex,
    requires: Regex,
}

impl PairingRule {
    /// Compile a rule, naming the offending field on a bad pattern.
    pub fn compile(rule: &RuleConfig) -> Result<Self, ConfigError> {
        let pattern = |field: &str, src: &str| {
            Regex::new(src).map_err(|e| ConfigError::InvalidValue {
                field: format!("validation.rules.{}.{}", rule.name, field),
                detail: e.to_string(),
            })
        };
        Ok(Self {
            name: rule.name.clone(),
            description: rule.description.clone(),
            flag: pattern("flag", &rule.flag)?,
            requires: pattern("requires", &rule.requires)?,
        })
    }

    pub fn flag_pattern(&self) -> &str {
        self.flag.as_str()
    }

    pub fn requires_pattern(&self) -> &str {
        self.requires.as_str()
    }

    /// First line enabling the flag when no line provides the companion.
    fn check(&self, code_lines: &[(usize, &str)]) -> Option<usize> {
        let flag_line = code_lines
            .iter()
            .find(|(_, line)| self.flag.is_match(line))
            .map(|(no, _)| *no)?;
        let satisfied = code_lines.iter().any(|(_, line)| self.requires.is_match(line));
        debug!(rule = self.name.as_str(), flag_line, satisfied, "pairing rule checked");
        (!satisfied).then_some(flag_line)
    }
}

// ---------------------------------------------------------------------------
// Validator
// ---------------------------------------------------------------------------

/// Runs every enabled check over a text.
#[derive(Debug, Clone)]
pub struct Validator {
    rules: Vec<PairingRule>,
    check_brackets: bool,
    marker_size: usize,
}

impl Validator {
    pub fn new(rules: Vec<PairingRule>, check_brackets: bool, marker_size: usize) -> Self {
        Self {
            rules,
            check_brackets,
            marker_size,
        }
    }

    /// Build from the `[validation]` config section.
    pub fn from_config(config: &ValidationConfig, marker_size: usize) -> Result<Self, ConfigError> {
        let rules = config
            .effective_rules()
            .iter()
            .map(PairingRule::compile)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(rules, config.check_brackets, marker_size))
    }

    pub fn rules(&self) -> &[PairingRule] {
        &self.rules
    }

    /// All findings for `text`, ordered by line.
    pub fn findings(&self, text: &str) -> Vec<Finding> {
        let mut findings: Vec<Finding> = marker_lines(text, self.marker_size)
            .into_iter()
            .map(|line| Finding {
                line,
                kind: FindingKind::ResidualMarker,
            })
            .collect();

        if self.check_brackets {
            findings.extend(check_brackets(text));
        }

        let code_lines: Vec<(usize, &str)> = text
            .lines()
            .enumerate()
            .map(|(idx, line)| (idx + 1, line))
            .filter(|(_, line)| !is_comment(line))
            .collect();
        for rule in &self.rules {
            if let Some(line) = rule.check(&code_lines) {
                findings.push(Finding {
                    line,
                    kind: FindingKind::MissingPairing {
                        rule: rule.name.clone(),
                        description: rule.description.clone(),
                    },
                });
            }
        }

        findings.sort_by_key(|f| f.line);
        findings
    }

    /// Fail with every finding, or succeed when there are none.
    pub fn validate(&self, text: &str) -> Result<(), ValidationError> {
        let findings = self.findings(text);
        info!(findings = findings.len(), "validated configuration");
        if findings.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::Invalid(findings))
        }
    }
}

fn is_comment(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("//") || trimmed.starts_with("/*") || trimmed.starts_with('*')
}

// ---------------------------------------------------------------------------
// Bracket balance
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, PartialEq, Eq)]
enum Lexeme {
    Code,
    LineComment,
    BlockComment,
    Str(char),
    RawStr,
}

/// A bracket that is part of the code, not of a string or comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Bracket {
    pub line: usize,
    /// Byte offset into the lexed text.
    pub offset: usize,
    pub ch: char,
}

/// Every `{}`, `()` and `[]` in `text` outside string literals (`"`, `'`,
/// `"""`) and comments.
pub(crate) fn code_brackets(text: &str) -> Vec<Bracket> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let at = |i: usize| chars.get(i).map(|&(_, c)| c);

    let mut brackets = Vec::new();
    let mut state = Lexeme::Code;
    let mut line = 1;
    let mut i = 0;

    while i < chars.len() {
        let (offset, c) = chars[i];
        let next = at(i + 1);
        if c == '\n' {
            line += 1;
        }

        match state {
            Lexeme::Code => match c {
                '/' if next == Some('/') => {
                    state = Lexeme::LineComment;
                    i += 1;
                }
                '/' if next == Some('*') => {
                    state = Lexeme::BlockComment;
                    i += 1;
                }
                '"' if next == Some('"') && at(i + 2) == Some('"') => {
                    state = Lexeme::RawStr;
                    i += 2;
                }
                '"' | '\'' => state = Lexeme::Str(c),
                '{' | '(' | '[' | '}' | ')' | ']' => brackets.push(Bracket { line, offset, ch: c }),
                _ => {}
            },
            Lexeme::LineComment => {
                if c == '\n' {
                    state = Lexeme::Code;
                }
            }
            Lexeme::BlockComment => {
                if c == '*' && next == Some('/') {
                    state = Lexeme::Code;
                    i += 1;
                }
            }
            Lexeme::Str(quote) => {
                if c == '\\' {
                    if next == Some('\n') {
                        line += 1;
                    }
                    i += 1;
                } else if c == quote || c == '\n' {
                    state = Lexeme::Code;
                }
            }
            Lexeme::RawStr => {
                if c == '"' && next == Some('"') && at(i + 2) == Some('"') {
                    state = Lexeme::Code;
                    i += 2;
                }
            }
        }
        i += 1;
    }

    brackets
}

/// Check `{}`, `()` and `[]` balance, skipping strings and comments.
///
/// Reports at most one finding: the first closer that does not fit, or the
/// innermost opener still open at the end.
fn check_brackets(text: &str) -> Option<Finding> {
    let mut stack: Vec<(char, usize)> = Vec::new();

    for Bracket { line, ch, .. } in code_brackets(text) {
        if matches!(ch, '{' | '(' | '[') {
            stack.push((ch, line));
            continue;
        }
        match stack.pop() {
            None => {
                return Some(Finding {
                    line,
                    kind: FindingKind::UnmatchedBracket { close: ch },
                })
            }
            Some((open, open_line)) if closer(open) != ch => {
                return Some(Finding {
                    line,
                    kind: FindingKind::MismatchedBracket {
                        open,
                        open_line,
                        close: ch,
                    },
                })
            }
            Some(_) => {}
        }
    }

    stack.pop().map(|(open, line)| Finding {
        line,
        kind: FindingKind::UnclosedBracket { open },
    })
}

fn closer(open: char) -> char {
    match open {
        '{' => '}',
        '(' => ')',
        _ => ']',
    }
}
