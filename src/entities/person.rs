// 👤 Person Entity - Contact record
//
// "Name is the identity field for duplicates, UUID is the key loans point at"
//
// - Two persons are the same person when their names match ignoring case
// - Editing a person keeps its UUID, so linked loans follow the rename

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

// ============================================================================
// FIELD VALUES
// ============================================================================

/// Person's name: alphanumeric words separated by spaces
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Name(String);

impl Name {
    pub const MESSAGE_CONSTRAINTS: &'static str =
        "Names should only contain alphanumeric characters and spaces, and it should not be blank";

    pub fn new(raw: &str) -> Result<Self, &'static str> {
        let trimmed = raw.trim();
        if Self::is_valid(trimmed) {
            Ok(Name(trimmed.to_string()))
        } else {
            Err(Self::MESSAGE_CONSTRAINTS)
        }
    }

    pub fn is_valid(value: &str) -> bool {
        let mut chars = value.chars();
        match chars.next() {
            Some(first) if first.is_alphanumeric() => {
                chars.all(|c| c.is_alphanumeric() || c == ' ')
            }
            _ => false,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when any whitespace-separated word equals `keyword`, ignoring case
    pub fn contains_word_ignore_case(&self, keyword: &str) -> bool {
        let keyword = keyword.to_lowercase();
        self.0
            .split_whitespace()
            .any(|word| word.to_lowercase() == keyword)
    }
}

/// Phone number: at least 3 digits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phone(String);

impl Phone {
    pub const MESSAGE_CONSTRAINTS: &'static str =
        "Phone numbers should only contain numbers, and it should be at least 3 digits long";

    pub fn new(raw: &str) -> Result<Self, &'static str> {
        let trimmed = raw.trim();
        if Self::is_valid(trimmed) {
            Ok(Phone(trimmed.to_string()))
        } else {
            Err(Self::MESSAGE_CONSTRAINTS)
        }
    }

    pub fn is_valid(value: &str) -> bool {
        value.len() >= 3 && value.chars().all(|c| c.is_ascii_digit())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Email address in `local-part@domain` form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email(String);

const EMAIL_SPECIAL_CHARACTERS: &[char] = &['+', '_', '.', '-'];

impl Email {
    pub const MESSAGE_CONSTRAINTS: &'static str = "Emails should be of the format local-part@domain. \
        The local-part should only contain alphanumeric characters and +_.- and should not start or end \
        with a special character. The domain is made up of labels separated by periods; each label starts \
        and ends with an alphanumeric character, and the last label is at least 2 characters long.";

    pub fn new(raw: &str) -> Result<Self, &'static str> {
        let trimmed = raw.trim();
        if Self::is_valid(trimmed) {
            Ok(Email(trimmed.to_string()))
        } else {
            Err(Self::MESSAGE_CONSTRAINTS)
        }
    }

    pub fn is_valid(value: &str) -> bool {
        let Some((local, domain)) = value.split_once('@') else {
            return false;
        };

        Self::is_valid_local_part(local) && Self::is_valid_domain(domain)
    }

    fn is_valid_local_part(local: &str) -> bool {
        let (Some(first), Some(last)) = (local.chars().next(), local.chars().last()) else {
            return false;
        };

        first.is_alphanumeric()
            && last.is_alphanumeric()
            && local
                .chars()
                .all(|c| c.is_alphanumeric() || EMAIL_SPECIAL_CHARACTERS.contains(&c))
    }

    fn is_valid_domain(domain: &str) -> bool {
        let labels: Vec<&str> = domain.split('.').collect();
        let Some(last) = labels.last() else {
            return false;
        };

        if last.chars().count() < 2 {
            return false;
        }

        labels.iter().all(|label| {
            let (Some(first), Some(end)) = (label.chars().next(), label.chars().last()) else {
                return false;
            };
            first.is_alphanumeric()
                && end.is_alphanumeric()
                && label.chars().all(|c| c.is_alphanumeric() || c == '-')
        })
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Free-form address, must not be blank
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address(String);

impl Address {
    pub const MESSAGE_CONSTRAINTS: &'static str =
        "Addresses can take any values, and it should not be blank";

    pub fn new(raw: &str) -> Result<Self, &'static str> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Err(Self::MESSAGE_CONSTRAINTS)
        } else {
            Ok(Address(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Single alphanumeric tag
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Tag(String);

impl Tag {
    pub const MESSAGE_CONSTRAINTS: &'static str = "Tags names should be alphanumeric";

    pub fn new(raw: &str) -> Result<Self, &'static str> {
        let trimmed = raw.trim();
        if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_alphanumeric()) {
            Ok(Tag(trimmed.to_string()))
        } else {
            Err(Self::MESSAGE_CONSTRAINTS)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// PERSON ENTITY
// ============================================================================

/// A contact in the address book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    /// Stable key that loans refer to - survives edits
    pub id: Uuid,

    pub name: Name,
    pub phone: Phone,
    pub email: Email,
    pub address: Address,
    pub tags: BTreeSet<Tag>,
}

impl Person {
    pub fn new(
        name: Name,
        phone: Phone,
        email: Email,
        address: Address,
        tags: BTreeSet<Tag>,
    ) -> Self {
        Person {
            id: Uuid::new_v4(),
            name,
            phone,
            email,
            address,
            tags,
        }
    }

    /// Weaker notion of equality used to reject duplicates
    pub fn is_same_person(&self, other: &Person) -> bool {
        self.name.as_str().to_lowercase() == other.name.as_str().to_lowercase()
    }
}

impl fmt::Display for Person {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}; Phone: {}; Email: {}; Address: {}; Tags: ",
            self.name.as_str(),
            self.phone.as_str(),
            self.email.as_str(),
            self.address.as_str()
        )?;
        for tag in &self.tags {
            write!(f, "[{}]", tag.as_str())?;
        }
        Ok(())
    }
}
