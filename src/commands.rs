// ⌨️ Commands - one tagged enum, one exhaustive executor
//
// A command is a plain value produced by the parser. `Command::execute` is the
// only place the model is mutated, and every variant validates its indices
// before touching anything, so a failed command leaves the model as it was.

use crate::entities::{Address, Email, Loan, Money, Name, Person, Phone, Tag};
use crate::model::{LoanFilter, Model, PersonFilter};
use crate::view_state::TabFlags;
use chrono::NaiveDate;
use log::debug;
use std::collections::BTreeSet;
use thiserror::Error;

// ============================================================================
// INDEX
// ============================================================================

/// Position in a displayed list. Users type 1-based, storage is 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Index(usize);

impl Index {
    pub fn from_zero_based(index: usize) -> Self {
        Index(index)
    }

    /// `None` for 0
    pub fn from_one_based(index: usize) -> Option<Self> {
        index.checked_sub(1).map(Index)
    }

    pub fn zero_based(&self) -> usize {
        self.0
    }

    pub fn one_based(&self) -> usize {
        self.0 + 1
    }
}

// ============================================================================
// COMMAND VOCABULARY
// ============================================================================

/// Word and usage text of one command
#[derive(Debug, Clone, Copy)]
pub struct CommandInfo {
    pub word: &'static str,
    pub usage: &'static str,
}

pub const ADD: CommandInfo = CommandInfo {
    word: "add",
    usage: "add: Adds a person to the address book. \
        Parameters: n/NAME p/PHONE e/EMAIL a/ADDRESS [t/TAG]...\n\
        Example: add n/John Doe p/98765432 e/johnd@example.com a/311, Clementi Ave 2, #02-25 t/friends",
};
pub const EDIT: CommandInfo = CommandInfo {
    word: "edit",
    usage: "edit: Edits the details of the person identified by the index number used in the displayed person list. \
        Existing values will be overwritten by the input values.\n\
        Parameters: INDEX (must be a positive integer) [n/NAME] [p/PHONE] [e/EMAIL] [a/ADDRESS] [t/TAG]...\n\
        Example: edit 1 p/91234567 e/johndoe@example.com",
};
pub const DELETE: CommandInfo = CommandInfo {
    word: "delete",
    usage: "delete: Deletes the person identified by the index number used in the displayed person list, \
        together with their loans.\n\
        Parameters: INDEX (must be a positive integer)\n\
        Example: delete 1",
};
pub const CLEAR: CommandInfo = CommandInfo {
    word: "clear",
    usage: "clear: Removes every person and loan.",
};
pub const FIND: CommandInfo = CommandInfo {
    word: "find",
    usage: "find: Finds all persons whose names contain any of the specified keywords (case-insensitive) \
        and displays them as a list with index numbers.\n\
        Parameters: KEYWORD [MORE_KEYWORDS]...\n\
        Example: find alice bob charlie",
};
pub const LIST: CommandInfo = CommandInfo {
    word: "list",
    usage: "list: Lists all persons.",
};
pub const LINK_LOAN: CommandInfo = CommandInfo {
    word: "linkloan",
    usage: "linkloan: Links a loan to the person identified by the index number used in the displayed person list.\n\
        Parameters: INDEX (must be a positive integer) l/AMOUNT s/START_DATE r/RETURN_DATE\n\
        Example: linkloan 1 l/500.00 s/2024-01-01 r/2024-12-31",
};
pub const VIEW_LOAN: CommandInfo = CommandInfo {
    word: "viewloan",
    usage: "viewloan: Shows the person identified by the index number used in the displayed person list \
        together with their loans.\n\
        Parameters: INDEX (must be a positive integer)\n\
        Example: viewloan 1",
};
pub const VIEW_LOANS: CommandInfo = CommandInfo {
    word: "viewloans",
    usage: "viewloans: Lists every loan.",
};
pub const DELETE_LOAN: CommandInfo = CommandInfo {
    word: "deleteloan",
    usage: "deleteloan: Deletes a loan of the person identified by the index number used in the displayed \
        person list. The loan index is its position in that person's loan list.\n\
        Parameters: INDEX LOAN_INDEX (both must be positive integers)\n\
        Example: deleteloan 1 2",
};
pub const MARK_LOAN: CommandInfo = CommandInfo {
    word: "markloan",
    usage: "markloan: Marks a loan of the person identified by the index number used in the displayed \
        person list as returned.\n\
        Parameters: INDEX LOAN_INDEX (both must be positive integers)\n\
        Example: markloan 1 2",
};
pub const ANALYTICS: CommandInfo = CommandInfo {
    word: "analytics",
    usage: "analytics: Shows loan analytics of the person identified by the index number used in the \
        displayed person list.\n\
        Parameters: INDEX (must be a positive integer)\n\
        Example: analytics 1",
};
pub const TOGGLE_INFO: CommandInfo = CommandInfo {
    word: "toggleinfo",
    usage: "toggleinfo: Shows or hides the borrower's details in the loan list.",
};
pub const HELP: CommandInfo = CommandInfo {
    word: "help",
    usage: "help: Shows program usage instructions.",
};
pub const EXIT: CommandInfo = CommandInfo {
    word: "exit",
    usage: "exit: Exits the program.",
};

pub const ALL_COMMANDS: &[CommandInfo] = &[
    ADD, EDIT, DELETE, CLEAR, FIND, LIST, LINK_LOAN, VIEW_LOAN, VIEW_LOANS, DELETE_LOAN, MARK_LOAN,
    ANALYTICS, TOGGLE_INFO, HELP, EXIT,
];

pub const MESSAGE_NOT_IMPLEMENTED_YET: &str = "not implemented yet";

// ============================================================================
// RESULT + ERROR
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub feedback_to_user: String,
    /// Help window should be shown to the user
    pub show_help: bool,
    /// The application should exit
    pub exit: bool,
}

impl CommandResult {
    pub fn new(feedback: impl Into<String>) -> Self {
        CommandResult {
            feedback_to_user: feedback.into(),
            show_help: false,
            exit: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("The person index provided is invalid")]
    InvalidPersonIndex,
    #[error("The loan index provided is invalid")]
    InvalidLoanIndex,
    #[error("This person already exists in the address book")]
    DuplicatePerson,
    #[error("not implemented yet")]
    NotImplemented,
    #[error("{0}")]
    InvalidLoan(&'static str),
    #[error("Could not save data to file: {0}")]
    Storage(String),
}

// ============================================================================
// COMMAND
// ============================================================================

/// Fields to overwrite on `edit`; `None` keeps the current value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditPersonDescriptor {
    pub name: Option<Name>,
    pub phone: Option<Phone>,
    pub email: Option<Email>,
    pub address: Option<Address>,
    pub tags: Option<BTreeSet<Tag>>,
}

impl EditPersonDescriptor {
    pub fn is_any_field_edited(&self) -> bool {
        self.name.is_some()
            || self.phone.is_some()
            || self.email.is_some()
            || self.address.is_some()
            || self.tags.is_some()
    }

    fn apply(&self, person: &Person) -> Person {
        Person {
            id: person.id,
            name: self.name.clone().unwrap_or_else(|| person.name.clone()),
            phone: self.phone.clone().unwrap_or_else(|| person.phone.clone()),
            email: self.email.clone().unwrap_or_else(|| person.email.clone()),
            address: self.address.clone().unwrap_or_else(|| person.address.clone()),
            tags: self.tags.clone().unwrap_or_else(|| person.tags.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Add(Person),
    Edit {
        index: Index,
        descriptor: EditPersonDescriptor,
    },
    Delete(Index),
    Clear,
    Find(Vec<String>),
    List,
    LinkLoan {
        index: Index,
        amount: Money,
        start_date: NaiveDate,
        return_date: NaiveDate,
    },
    ViewLoan(Index),
    ViewLoans,
    DeleteLoan {
        person: Index,
        loan: Index,
    },
    /// Recognised but not implemented: always fails without touching the model
    MarkLoan {
        person: Index,
        loan: Index,
    },
    Analytics(Index),
    ToggleInfo,
    Help,
    Exit,
}

impl Command {
    pub fn word(&self) -> &'static str {
        match self {
            Command::Add(_) => ADD.word,
            Command::Edit { .. } => EDIT.word,
            Command::Delete(_) => DELETE.word,
            Command::Clear => CLEAR.word,
            Command::Find(_) => FIND.word,
            Command::List => LIST.word,
            Command::LinkLoan { .. } => LINK_LOAN.word,
            Command::ViewLoan(_) => VIEW_LOAN.word,
            Command::ViewLoans => VIEW_LOANS.word,
            Command::DeleteLoan { .. } => DELETE_LOAN.word,
            Command::MarkLoan { .. } => MARK_LOAN.word,
            Command::Analytics(_) => ANALYTICS.word,
            Command::ToggleInfo => TOGGLE_INFO.word,
            Command::Help => HELP.word,
            Command::Exit => EXIT.word,
        }
    }

    /// True when a successful run may have changed the stored address book
    pub fn modifies_address_book(&self) -> bool {
        matches!(
            self,
            Command::Add(_)
                | Command::Edit { .. }
                | Command::Delete(_)
                | Command::Clear
                | Command::LinkLoan { .. }
                | Command::DeleteLoan { .. }
        )
    }

    pub fn execute(self, model: &mut Model) -> Result<CommandResult, CommandError> {
        debug!("Executing `{}` command", self.word());

        match self {
            Command::Add(person) => {
                if model.has_person(&person) {
                    return Err(CommandError::DuplicatePerson);
                }
                let feedback = format!("New person added: {}", person);
                model.add_person(person);
                model.set_tabs(TabFlags::person_only());
                Ok(CommandResult::new(feedback))
            }

            Command::Edit { index, descriptor } => {
                let person = person_at(model, index)?;
                let edited = descriptor.apply(&person);

                if !person.is_same_person(&edited) && model.has_person(&edited) {
                    return Err(CommandError::DuplicatePerson);
                }

                let feedback = format!("Edited Person: {}", edited);
                model.set_person(edited);
                model.update_person_filter(PersonFilter::All);
                model.set_tabs(TabFlags::person_only());
                Ok(CommandResult::new(feedback))
            }

            Command::Delete(index) => {
                let person = person_at(model, index)?;
                model.delete_person(person.id);
                model.set_tabs(TabFlags::person_only());
                Ok(CommandResult::new(format!("Deleted Person: {}", person)))
            }

            Command::Clear => {
                model.reset_address_book(Default::default());
                model.set_tabs(TabFlags::person_only());
                Ok(CommandResult::new("Address book has been cleared!"))
            }

            Command::Find(keywords) => {
                model.update_person_filter(PersonFilter::NameKeywords(keywords));
                model.set_tabs(TabFlags::person_only());
                let count = model.filtered_person_list().len();
                Ok(CommandResult::new(format!("{} persons listed!", count)))
            }

            Command::List => {
                model.update_person_filter(PersonFilter::All);
                model.set_tabs(TabFlags::person_only());
                Ok(CommandResult::new("Listed all persons"))
            }

            Command::LinkLoan {
                index,
                amount,
                start_date,
                return_date,
            } => {
                let person = person_at(model, index)?;
                let loan = Loan::new(person.id, amount, start_date, return_date)
                    .map_err(CommandError::InvalidLoan)?;
                let feedback = format!("New loan added: {} for {}", loan, person.name.as_str());
                model.add_loan(loan);
                show_person_with_loans(model, &person);
                Ok(CommandResult::new(feedback))
            }

            Command::ViewLoan(index) => {
                let person = person_at(model, index)?;
                show_person_with_loans(model, &person);
                Ok(CommandResult::new(format!(
                    "Listed all loans associated with {}",
                    person.name.as_str()
                )))
            }

            Command::ViewLoans => {
                model.update_loan_filter(LoanFilter::All);
                model.set_tabs(TabFlags::loans_only());
                Ok(CommandResult::new("Listed all loans"))
            }

            Command::DeleteLoan { person, loan } => {
                let person = person_at(model, person)?;
                let target = model
                    .loans_of(person.id)
                    .get(loan.zero_based())
                    .map(|l| l.id)
                    .ok_or(CommandError::InvalidLoanIndex)?;

                let removed = model
                    .delete_loan(target)
                    .ok_or(CommandError::InvalidLoanIndex)?;
                show_person_with_loans(model, &person);
                Ok(CommandResult::new(format!(
                    "Loan deleted: {} from {}",
                    removed,
                    person.name.as_str()
                )))
            }

            Command::MarkLoan { .. } => Err(CommandError::NotImplemented),

            Command::Analytics(index) => {
                let person = person_at(model, index)?;
                model.set_analytics_target(Some(person.id));
                model.set_tabs(TabFlags::analytics_only());
                Ok(CommandResult::new(format!(
                    "Provided analytics for {}",
                    person.name.as_str()
                )))
            }

            Command::ToggleInfo => {
                let on = !model.loanee_info();
                model.set_loanee_info(on);
                Ok(CommandResult::new(if on {
                    "Loanee info is now shown"
                } else {
                    "Loanee info is now hidden"
                }))
            }

            Command::Help => Ok(CommandResult {
                feedback_to_user: "Opened help window.".to_string(),
                show_help: true,
                exit: false,
            }),

            Command::Exit => Ok(CommandResult {
                feedback_to_user: "Exiting Loan Book as requested ...".to_string(),
                show_help: false,
                exit: true,
            }),
        }
    }
}

/// Person at a displayed index (cloned so the model can be mutated afterwards)
fn person_at(model: &Model, index: Index) -> Result<Person, CommandError> {
    model
        .filtered_person_list()
        .get(index.zero_based())
        .map(|p| (*p).clone())
        .ok_or(CommandError::InvalidPersonIndex)
}

fn show_person_with_loans(model: &mut Model, person: &Person) {
    model.update_person_filter(PersonFilter::Only(person.id));
    model.update_loan_filter(LoanFilter::Assignee(person.id));
    model.set_tabs(TabFlags::person_and_loans());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::parse_date;
    use crate::model::test_support::*;
    use crate::view_state::ViewState;

    fn index(one_based: usize) -> Index {
        Index::from_one_based(one_based).unwrap()
    }

    /// Asserts failure with `expected` and that the model did not change
    fn assert_command_failure(command: Command, model: &mut Model, expected: CommandError) {
        let book_before = model.address_book().clone();
        let persons_before: Vec<Person> =
            model.filtered_person_list().into_iter().cloned().collect();
        let flags_before = model.tab_flags();

        let result = command.execute(model);

        assert_eq!(result, Err(expected));
        assert_eq!(model.address_book(), &book_before);
        let persons_after: Vec<Person> =
            model.filtered_person_list().into_iter().cloned().collect();
        assert_eq!(persons_after, persons_before);
        assert_eq!(model.tab_flags(), flags_before);
    }

    #[test]
    fn test_index_conversions() {
        assert_eq!(Index::from_one_based(0), None);
        assert_eq!(index(3).zero_based(), 2);
        assert_eq!(Index::from_zero_based(2).one_based(), 3);
    }

    #[test]
    fn test_mark_loan_not_implemented() {
        let mut model = typical_model();
        assert_command_failure(
            Command::MarkLoan {
                person: Index::from_zero_based(0),
                loan: Index::from_zero_based(0),
            },
            &mut model,
            CommandError::NotImplemented,
        );
        assert_eq!(CommandError::NotImplemented.to_string(), MESSAGE_NOT_IMPLEMENTED_YET);
    }

    #[test]
    fn test_mark_loan_fails_the_same_way_for_any_indices() {
        let mut model = typical_model();
        for (p, l) in [(0, 0), (0, 1), (2, 0), (99, 99)] {
            assert_command_failure(
                Command::MarkLoan {
                    person: Index::from_zero_based(p),
                    loan: Index::from_zero_based(l),
                },
                &mut model,
                CommandError::NotImplemented,
            );
        }
    }

    #[test]
    fn test_modifies_address_book() {
        let stub = Command::MarkLoan {
            person: index(1),
            loan: index(1),
        };
        assert!(!stub.modifies_address_book());
        assert!(!Command::List.modifies_address_book());
        assert!(!Command::Analytics(index(1)).modifies_address_book());
        assert!(Command::Delete(index(1)).modifies_address_book());
        assert!(Command::DeleteLoan { person: index(1), loan: index(1) }.modifies_address_book());
    }

    #[test]
    fn test_add_person() {
        let mut model = typical_model();
        let result = Command::Add(person("Daniel Meier")).execute(&mut model).unwrap();

        assert!(result.feedback_to_user.starts_with("New person added: Daniel Meier;"));
        assert_eq!(model.address_book().persons().len(), 4);
        assert_eq!(model.view_state(), ViewState::Person);
    }

    #[test]
    fn test_add_duplicate_person_fails() {
        let mut model = typical_model();
        assert_command_failure(
            Command::Add(person("alice pauline")),
            &mut model,
            CommandError::DuplicatePerson,
        );
    }

    #[test]
    fn test_edit_person_keeps_identity_and_loans() {
        let mut model = typical_model();
        let alice_id = model.filtered_person_list()[0].id;

        let descriptor = EditPersonDescriptor {
            name: Some(Name::new("Alice Tan").unwrap()),
            ..Default::default()
        };
        Command::Edit { index: index(1), descriptor }
            .execute(&mut model)
            .unwrap();

        let persons = model.filtered_person_list();
        let alice = persons[0];
        assert_eq!(alice.id, alice_id);
        assert_eq!(alice.name.as_str(), "Alice Tan");
        assert_eq!(alice.phone.as_str(), "94351253");
        assert_eq!(model.loans_of(alice_id).len(), 2);
    }

    #[test]
    fn test_edit_into_duplicate_fails() {
        let mut model = typical_model();
        let descriptor = EditPersonDescriptor {
            name: Some(Name::new("Benson Meier").unwrap()),
            ..Default::default()
        };
        assert_command_failure(
            Command::Edit { index: index(1), descriptor },
            &mut model,
            CommandError::DuplicatePerson,
        );
    }

    #[test]
    fn test_edit_same_name_different_case_is_allowed() {
        let mut model = typical_model();
        let descriptor = EditPersonDescriptor {
            name: Some(Name::new("ALICE PAULINE").unwrap()),
            ..Default::default()
        };
        assert!(Command::Edit { index: index(1), descriptor }
            .execute(&mut model)
            .is_ok());
    }

    #[test]
    fn test_invalid_person_index_fails() {
        let mut model = typical_model();
        assert_command_failure(Command::Delete(index(4)), &mut model, CommandError::InvalidPersonIndex);
        assert_command_failure(Command::ViewLoan(index(9)), &mut model, CommandError::InvalidPersonIndex);
        assert_command_failure(Command::Analytics(index(4)), &mut model, CommandError::InvalidPersonIndex);
    }

    #[test]
    fn test_index_refers_to_filtered_list() {
        let mut model = typical_model();
        Command::Find(vec!["carl".to_string()]).execute(&mut model).unwrap();

        // Only Carl is displayed, so index 2 is out of range
        assert_command_failure(Command::Delete(index(2)), &mut model, CommandError::InvalidPersonIndex);

        let result = Command::Delete(index(1)).execute(&mut model).unwrap();
        assert!(result.feedback_to_user.contains("Carl Kurz"));
    }

    #[test]
    fn test_find_and_list() {
        let mut model = typical_model();
        let result = Command::Find(vec!["alice".to_string(), "benson".to_string()])
            .execute(&mut model)
            .unwrap();
        assert_eq!(result.feedback_to_user, "2 persons listed!");

        Command::List.execute(&mut model).unwrap();
        assert_eq!(model.filtered_person_list().len(), 3);
    }

    #[test]
    fn test_link_loan_shows_person_and_loans() {
        let mut model = typical_model();
        let result = Command::LinkLoan {
            index: index(3),
            amount: Money::from_cents(9_900),
            start_date: parse_date("2024-05-01").unwrap(),
            return_date: parse_date("2024-05-31").unwrap(),
        }
        .execute(&mut model)
        .unwrap();

        assert_eq!(
            result.feedback_to_user,
            "New loan added: $99.00, 2024-05-01 to 2024-05-31 for Carl Kurz"
        );
        assert_eq!(model.view_state(), ViewState::PersonAndLoans);
        assert_eq!(model.filtered_person_list().len(), 1);
        assert_eq!(model.sorted_loan_list().len(), 1);
    }

    #[test]
    fn test_view_loans_shows_loans_tab_only() {
        let mut model = typical_model();
        Command::ViewLoan(index(1)).execute(&mut model).unwrap();
        assert_eq!(model.sorted_loan_list().len(), 2);

        Command::ViewLoans.execute(&mut model).unwrap();
        assert_eq!(model.view_state(), ViewState::Loans);
        assert_eq!(model.sorted_loan_list().len(), 3);
    }

    #[test]
    fn test_delete_loan_uses_sorted_order() {
        let mut model = typical_model();
        // Alice's loans sorted by return date: 2024-03-01 first
        let result = Command::DeleteLoan { person: index(1), loan: index(1) }
            .execute(&mut model)
            .unwrap();
        assert!(result.feedback_to_user.starts_with("Loan deleted: $120.50"));
        assert_eq!(model.address_book().loans().len(), 2);
    }

    #[test]
    fn test_delete_loan_invalid_loan_index() {
        let mut model = typical_model();
        assert_command_failure(
            Command::DeleteLoan { person: index(3), loan: index(1) },
            &mut model,
            CommandError::InvalidLoanIndex,
        );
    }

    #[test]
    fn test_analytics_switches_to_analytics_tab() {
        let mut model = typical_model();
        Command::ViewLoan(index(2)).execute(&mut model).unwrap();
        model.take_view_change();

        Command::Analytics(index(1)).execute(&mut model).unwrap();
        assert_eq!(model.view_state(), ViewState::Analytics);
        assert!(model.tab_flags().is_consistent());
        assert_eq!(model.take_view_change(), Some(ViewState::Analytics));
        assert_eq!(model.analytics_target().unwrap().name.as_str(), "Benson Meier");
    }

    #[test]
    fn test_toggle_info() {
        let mut model = typical_model();
        Command::ToggleInfo.execute(&mut model).unwrap();
        assert!(model.loanee_info());
        Command::ToggleInfo.execute(&mut model).unwrap();
        assert!(!model.loanee_info());
    }

    #[test]
    fn test_help_and_exit_flags() {
        let mut model = typical_model();
        let help = Command::Help.execute(&mut model).unwrap();
        assert!(help.show_help && !help.exit);

        let exit = Command::Exit.execute(&mut model).unwrap();
        assert!(exit.exit && !exit.show_help);
    }

    #[test]
    fn test_clear() {
        let mut model = typical_model();
        Command::Clear.execute(&mut model).unwrap();
        assert!(model.address_book().persons().is_empty());
        assert!(model.address_book().loans().is_empty());
    }
}
