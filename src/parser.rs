// 🔎 Command Parser - input text → Command
//
// Grammar: COMMAND_WORD [PREAMBLE] [PREFIX/VALUE]...
// A prefix only counts when it starts the input or follows whitespace, so
// "e/john@a.com" inside an address does not split the address.

use crate::commands::{
    Command, CommandInfo, EditPersonDescriptor, Index, ADD, ANALYTICS, CLEAR, DELETE, DELETE_LOAN,
    EDIT, EXIT, FIND, HELP, LINK_LOAN, LIST, MARK_LOAN, TOGGLE_INFO, VIEW_LOAN, VIEW_LOANS,
};
use crate::entities::{parse_date, Address, Email, Loan, Money, Name, Person, Phone, Tag};
use std::collections::BTreeSet;
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Unknown command")]
    UnknownCommand,
    /// Known command, malformed arguments: carries that command's usage
    #[error("Invalid command format! \n{0}")]
    InvalidFormat(&'static str),
    /// A field value failed its constraint
    #[error("{0}")]
    InvalidField(String),
    #[error("Multiple values specified for the following single-valued field(s): {0}")]
    DuplicatePrefix(String),
    #[error("At least one field to edit must be provided.")]
    NoFieldEdited,
}

// ============================================================================
// PREFIXES
// ============================================================================

pub const PREFIX_NAME: &str = "n/";
pub const PREFIX_PHONE: &str = "p/";
pub const PREFIX_EMAIL: &str = "e/";
pub const PREFIX_ADDRESS: &str = "a/";
pub const PREFIX_TAG: &str = "t/";
pub const PREFIX_AMOUNT: &str = "l/";
pub const PREFIX_START_DATE: &str = "s/";
pub const PREFIX_RETURN_DATE: &str = "r/";

/// Arguments split by prefix, in order of appearance
#[derive(Debug, Default)]
pub struct ArgumentMultimap {
    preamble: String,
    values: Vec<(&'static str, String)>,
}

impl ArgumentMultimap {
    pub fn tokenize(args: &str, prefixes: &[&'static str]) -> Self {
        let mut positions: Vec<(usize, &'static str)> = Vec::new();
        let mut previous: Option<char> = None;

        for (i, c) in args.char_indices() {
            if previous.map_or(true, char::is_whitespace) {
                if let Some(prefix) = prefixes.iter().find(|p| args[i..].starts_with(**p)) {
                    positions.push((i, *prefix));
                }
            }
            previous = Some(c);
        }

        let preamble_end = positions.first().map_or(args.len(), |(pos, _)| *pos);
        let mut map = ArgumentMultimap {
            preamble: args[..preamble_end].trim().to_string(),
            values: Vec::new(),
        };

        for (n, (pos, prefix)) in positions.iter().enumerate() {
            let value_start = pos + prefix.len();
            let value_end = positions.get(n + 1).map_or(args.len(), |(next, _)| *next);
            map.values
                .push((*prefix, args[value_start..value_end].trim().to_string()));
        }

        map
    }

    pub fn preamble(&self) -> &str {
        &self.preamble
    }

    /// Last value given for `prefix`
    pub fn value(&self, prefix: &str) -> Option<&str> {
        self.values
            .iter()
            .rev()
            .find(|(p, _)| *p == prefix)
            .map(|(_, v)| v.as_str())
    }

    pub fn all_values(&self, prefix: &str) -> Vec<&str> {
        self.values
            .iter()
            .filter(|(p, _)| *p == prefix)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn has_all(&self, prefixes: &[&str]) -> bool {
        prefixes.iter().all(|p| self.value(p).is_some())
    }

    /// Fails when any of `prefixes` was given more than once
    pub fn verify_no_duplicates(&self, prefixes: &[&str]) -> Result<(), ParseError> {
        let duplicated: Vec<&str> = prefixes
            .iter()
            .copied()
            .filter(|p| self.all_values(p).len() > 1)
            .collect();

        if duplicated.is_empty() {
            Ok(())
        } else {
            Err(ParseError::DuplicatePrefix(duplicated.join(" ")))
        }
    }
}

// ============================================================================
// ENTRY POINT
// ============================================================================

pub fn parse_command(input: &str) -> Result<Command, ParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ParseError::InvalidFormat(HELP.usage));
    }

    let (word, args) = match trimmed.find(char::is_whitespace) {
        Some(split) => trimmed.split_at(split),
        None => (trimmed, ""),
    };

    match word.to_lowercase().as_str() {
        w if w == ADD.word => parse_add(args),
        w if w == EDIT.word => parse_edit(args),
        w if w == DELETE.word => Ok(Command::Delete(parse_single_index(args, DELETE)?)),
        w if w == CLEAR.word => Ok(Command::Clear),
        w if w == FIND.word => parse_find(args),
        w if w == LIST.word => Ok(Command::List),
        w if w == LINK_LOAN.word => parse_link_loan(args),
        w if w == VIEW_LOAN.word => Ok(Command::ViewLoan(parse_single_index(args, VIEW_LOAN)?)),
        w if w == VIEW_LOANS.word => Ok(Command::ViewLoans),
        w if w == DELETE_LOAN.word => {
            let (person, loan) = parse_index_pair(args, DELETE_LOAN)?;
            Ok(Command::DeleteLoan { person, loan })
        }
        w if w == MARK_LOAN.word => {
            let (person, loan) = parse_index_pair(args, MARK_LOAN)?;
            Ok(Command::MarkLoan { person, loan })
        }
        w if w == ANALYTICS.word => Ok(Command::Analytics(parse_single_index(args, ANALYTICS)?)),
        w if w == TOGGLE_INFO.word => Ok(Command::ToggleInfo),
        w if w == HELP.word => Ok(Command::Help),
        w if w == EXIT.word => Ok(Command::Exit),
        _ => Err(ParseError::UnknownCommand),
    }
}

// ============================================================================
// PER-COMMAND PARSERS
// ============================================================================

fn parse_add(args: &str) -> Result<Command, ParseError> {
    let map = ArgumentMultimap::tokenize(
        args,
        &[PREFIX_NAME, PREFIX_PHONE, PREFIX_EMAIL, PREFIX_ADDRESS, PREFIX_TAG],
    );

    if !map.preamble().is_empty()
        || !map.has_all(&[PREFIX_NAME, PREFIX_PHONE, PREFIX_EMAIL, PREFIX_ADDRESS])
    {
        return Err(ParseError::InvalidFormat(ADD.usage));
    }
    map.verify_no_duplicates(&[PREFIX_NAME, PREFIX_PHONE, PREFIX_EMAIL, PREFIX_ADDRESS])?;

    let person = Person::new(
        field(Name::new(map.value(PREFIX_NAME).unwrap_or_default()))?,
        field(Phone::new(map.value(PREFIX_PHONE).unwrap_or_default()))?,
        field(Email::new(map.value(PREFIX_EMAIL).unwrap_or_default()))?,
        field(Address::new(map.value(PREFIX_ADDRESS).unwrap_or_default()))?,
        parse_tags(&map.all_values(PREFIX_TAG))?,
    );

    Ok(Command::Add(person))
}

fn parse_edit(args: &str) -> Result<Command, ParseError> {
    let map = ArgumentMultimap::tokenize(
        args,
        &[PREFIX_NAME, PREFIX_PHONE, PREFIX_EMAIL, PREFIX_ADDRESS, PREFIX_TAG],
    );

    let index = parse_index(map.preamble()).ok_or(ParseError::InvalidFormat(EDIT.usage))?;
    map.verify_no_duplicates(&[PREFIX_NAME, PREFIX_PHONE, PREFIX_EMAIL, PREFIX_ADDRESS])?;

    let descriptor = EditPersonDescriptor {
        name: map.value(PREFIX_NAME).map(Name::new).transpose().map_err(invalid)?,
        phone: map.value(PREFIX_PHONE).map(Phone::new).transpose().map_err(invalid)?,
        email: map.value(PREFIX_EMAIL).map(Email::new).transpose().map_err(invalid)?,
        address: map.value(PREFIX_ADDRESS).map(Address::new).transpose().map_err(invalid)?,
        tags: parse_tags_for_edit(&map.all_values(PREFIX_TAG))?,
    };

    if !descriptor.is_any_field_edited() {
        return Err(ParseError::NoFieldEdited);
    }

    Ok(Command::Edit { index, descriptor })
}

fn parse_find(args: &str) -> Result<Command, ParseError> {
    let keywords: Vec<String> = args.split_whitespace().map(str::to_string).collect();
    if keywords.is_empty() {
        return Err(ParseError::InvalidFormat(FIND.usage));
    }
    Ok(Command::Find(keywords))
}

fn parse_link_loan(args: &str) -> Result<Command, ParseError> {
    let prefixes = [PREFIX_AMOUNT, PREFIX_START_DATE, PREFIX_RETURN_DATE];
    let map = ArgumentMultimap::tokenize(args, &prefixes);

    let index = parse_index(map.preamble()).ok_or(ParseError::InvalidFormat(LINK_LOAN.usage))?;
    if !map.has_all(&prefixes) {
        return Err(ParseError::InvalidFormat(LINK_LOAN.usage));
    }
    map.verify_no_duplicates(&prefixes)?;

    let amount = field(Money::parse(map.value(PREFIX_AMOUNT).unwrap_or_default()))?;
    let start_date =
        parse_date(map.value(PREFIX_START_DATE).unwrap_or_default()).map_err(ParseError::InvalidField)?;
    let return_date =
        parse_date(map.value(PREFIX_RETURN_DATE).unwrap_or_default()).map_err(ParseError::InvalidField)?;

    if return_date < start_date {
        return Err(invalid(Loan::MESSAGE_DATE_ORDER));
    }

    Ok(Command::LinkLoan {
        index,
        amount,
        start_date,
        return_date,
    })
}

fn parse_single_index(args: &str, info: CommandInfo) -> Result<Index, ParseError> {
    parse_index(args).ok_or(ParseError::InvalidFormat(info.usage))
}

/// Two whitespace-separated indices, nothing else
fn parse_index_pair(args: &str, info: CommandInfo) -> Result<(Index, Index), ParseError> {
    let parts: Vec<&str> = args.split_whitespace().collect();
    match parts.as_slice() {
        [first, second] => match (parse_index(first), parse_index(second)) {
            (Some(first), Some(second)) => Ok((first, second)),
            _ => Err(ParseError::InvalidFormat(info.usage)),
        },
        _ => Err(ParseError::InvalidFormat(info.usage)),
    }
}

// ============================================================================
// FIELD HELPERS
// ============================================================================

/// Non-zero unsigned integer, 1-based
pub fn parse_index(raw: &str) -> Option<Index> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    trimmed
        .parse::<usize>()
        .ok()
        .and_then(Index::from_one_based)
}

fn invalid(message: &'static str) -> ParseError {
    ParseError::InvalidField(message.to_string())
}

fn field<T>(result: Result<T, &'static str>) -> Result<T, ParseError> {
    result.map_err(invalid)
}

fn parse_tags(values: &[&str]) -> Result<BTreeSet<Tag>, ParseError> {
    values.iter().map(|v| field(Tag::new(v))).collect()
}

/// A lone empty `t/` clears all tags
fn parse_tags_for_edit(values: &[&str]) -> Result<Option<BTreeSet<Tag>>, ParseError> {
    match values {
        [] => Ok(None),
        [only] if only.is_empty() => Ok(Some(BTreeSet::new())),
        _ => parse_tags(values).map(Some),
    }
}
