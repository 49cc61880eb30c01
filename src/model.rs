// 📒 Model - in-memory address book plus everything the views project from it
//
// The model owns the person and loan lists, the active filters, the tab
// flags and the loanee-info flag. Views never hold copies: every list the
// UI draws is computed from the backing lists on demand.

use crate::analytics::Analytics;
use crate::config::{GuiSettings, UserPrefs};
use crate::entities::{Loan, Person};
use crate::view_state::{TabFlags, ViewState};
use chrono::NaiveDate;
use log::debug;
use std::path::Path;
use uuid::Uuid;

// ============================================================================
// ADDRESS BOOK
// ============================================================================

/// Backing lists. Persons are unique by `Person::is_same_person`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddressBook {
    persons: Vec<Person>,
    loans: Vec<Loan>,
}

impl AddressBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from stored rows, dropping loans whose borrower no longer exists
    pub fn from_parts(persons: Vec<Person>, loans: Vec<Loan>) -> Self {
        let loans = loans
            .into_iter()
            .filter(|loan| persons.iter().any(|p| p.id == loan.assignee))
            .collect();
        AddressBook { persons, loans }
    }

    pub fn persons(&self) -> &[Person] {
        &self.persons
    }

    pub fn loans(&self) -> &[Loan] {
        &self.loans
    }

    pub fn person(&self, id: Uuid) -> Option<&Person> {
        self.persons.iter().find(|p| p.id == id)
    }

    pub fn has_person(&self, person: &Person) -> bool {
        self.persons.iter().any(|p| p.is_same_person(person))
    }

    /// Caller checks `has_person` first
    pub fn add_person(&mut self, person: Person) {
        self.persons.push(person);
    }

    /// Replace the person with `edited.id` in place. Returns false if absent.
    pub fn set_person(&mut self, edited: Person) -> bool {
        match self.persons.iter_mut().find(|p| p.id == edited.id) {
            Some(slot) => {
                *slot = edited;
                true
            }
            None => false,
        }
    }

    /// Remove a person together with their loans
    pub fn remove_person(&mut self, id: Uuid) -> Option<Person> {
        let position = self.persons.iter().position(|p| p.id == id)?;
        self.loans.retain(|loan| loan.assignee != id);
        Some(self.persons.remove(position))
    }

    pub fn add_loan(&mut self, loan: Loan) {
        self.loans.push(loan);
    }

    pub fn remove_loan(&mut self, id: Uuid) -> Option<Loan> {
        let position = self.loans.iter().position(|l| l.id == id)?;
        Some(self.loans.remove(position))
    }

    pub fn clear(&mut self) {
        self.persons.clear();
        self.loans.clear();
    }
}

// ============================================================================
// FILTERS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersonFilter {
    All,
    /// Name contains any keyword as a whole word, ignoring case
    NameKeywords(Vec<String>),
    Only(Uuid),
}

impl PersonFilter {
    pub fn matches(&self, person: &Person) -> bool {
        match self {
            PersonFilter::All => true,
            PersonFilter::NameKeywords(keywords) => keywords
                .iter()
                .any(|keyword| person.name.contains_word_ignore_case(keyword)),
            PersonFilter::Only(id) => person.id == *id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoanFilter {
    All,
    Assignee(Uuid),
}

impl LoanFilter {
    pub fn matches(&self, loan: &Loan) -> bool {
        match self {
            LoanFilter::All => true,
            LoanFilter::Assignee(id) => loan.assignee == *id,
        }
    }
}

/// Active loans first, then by return date, then by start date
fn sort_loans(loans: &mut [&Loan]) {
    loans.sort_by(|a, b| {
        a.is_returned
            .cmp(&b.is_returned)
            .then(a.return_date.cmp(&b.return_date))
            .then(a.start_date.cmp(&b.start_date))
    });
}

// ============================================================================
// MODEL
// ============================================================================

pub struct Model {
    address_book: AddressBook,
    user_prefs: UserPrefs,
    person_filter: PersonFilter,
    loan_filter: LoanFilter,
    tabs: TabFlags,
    /// Set when a flag write changes the derived view; drained by the window
    pending_view_change: Option<ViewState>,
    loanee_info: bool,
    /// Person whose loans the analytics panel summarises (`None` = everyone)
    analytics_target: Option<Uuid>,
}

impl Model {
    pub fn new(address_book: AddressBook, user_prefs: UserPrefs) -> Self {
        Model {
            address_book,
            user_prefs,
            person_filter: PersonFilter::All,
            loan_filter: LoanFilter::All,
            tabs: TabFlags::default(),
            pending_view_change: None,
            loanee_info: false,
            analytics_target: None,
        }
    }

    // ------------------------------------------------------------------------
    // Address book
    // ------------------------------------------------------------------------

    pub fn address_book(&self) -> &AddressBook {
        &self.address_book
    }

    pub fn has_person(&self, person: &Person) -> bool {
        self.address_book.has_person(person)
    }

    pub fn add_person(&mut self, person: Person) {
        self.address_book.add_person(person);
        self.update_person_filter(PersonFilter::All);
    }

    pub fn set_person(&mut self, edited: Person) -> bool {
        self.address_book.set_person(edited)
    }

    pub fn delete_person(&mut self, id: Uuid) -> Option<Person> {
        if self.analytics_target == Some(id) {
            self.analytics_target = None;
        }
        if self.loan_filter == LoanFilter::Assignee(id) {
            self.loan_filter = LoanFilter::All;
        }
        if self.person_filter == PersonFilter::Only(id) {
            self.person_filter = PersonFilter::All;
        }
        self.address_book.remove_person(id)
    }

    pub fn add_loan(&mut self, loan: Loan) {
        self.address_book.add_loan(loan);
    }

    pub fn delete_loan(&mut self, id: Uuid) -> Option<Loan> {
        self.address_book.remove_loan(id)
    }

    pub fn reset_address_book(&mut self, address_book: AddressBook) {
        self.address_book = address_book;
        self.person_filter = PersonFilter::All;
        self.loan_filter = LoanFilter::All;
        self.analytics_target = None;
    }

    // ------------------------------------------------------------------------
    // Projections
    // ------------------------------------------------------------------------

    pub fn filtered_person_list(&self) -> Vec<&Person> {
        self.address_book
            .persons()
            .iter()
            .filter(|p| self.person_filter.matches(p))
            .collect()
    }

    pub fn sorted_loan_list(&self) -> Vec<&Loan> {
        let mut loans: Vec<&Loan> = self
            .address_book
            .loans()
            .iter()
            .filter(|l| self.loan_filter.matches(l))
            .collect();
        sort_loans(&mut loans);
        loans
    }

    /// One person's loans, in the same order the loan list shows them
    pub fn loans_of(&self, person_id: Uuid) -> Vec<&Loan> {
        let mut loans: Vec<&Loan> = self
            .address_book
            .loans()
            .iter()
            .filter(|l| l.assignee == person_id)
            .collect();
        sort_loans(&mut loans);
        loans
    }

    pub fn person_filter(&self) -> &PersonFilter {
        &self.person_filter
    }

    pub fn update_person_filter(&mut self, filter: PersonFilter) {
        debug!("Person filter set to {:?}", filter);
        self.person_filter = filter;
    }

    pub fn loan_filter(&self) -> LoanFilter {
        self.loan_filter
    }

    pub fn update_loan_filter(&mut self, filter: LoanFilter) {
        debug!("Loan filter set to {:?}", filter);
        self.loan_filter = filter;
    }

    pub fn analytics_target(&self) -> Option<&Person> {
        self.analytics_target
            .and_then(|id| self.address_book.person(id))
    }

    pub fn set_analytics_target(&mut self, target: Option<Uuid>) {
        self.analytics_target = target;
    }

    pub fn analytics(&self, today: NaiveDate) -> Analytics {
        match self.analytics_target {
            Some(id) => Analytics::from_loans(self.loans_of(id), today),
            None => Analytics::from_loans(self.address_book.loans(), today),
        }
    }

    // ------------------------------------------------------------------------
    // Tab flags
    // ------------------------------------------------------------------------

    pub fn tab_flags(&self) -> TabFlags {
        self.tabs
    }

    pub fn view_state(&self) -> ViewState {
        ViewState::from_flags(self.tabs)
    }

    pub fn set_person_tab(&mut self, on: bool) {
        let mut next = self.tabs;
        next.person = on;
        self.write_tabs(next);
    }

    /// Turning loans on turns analytics off
    pub fn set_loans_tab(&mut self, on: bool) {
        let mut next = self.tabs;
        next.loans = on;
        if on {
            next.analytics = false;
        }
        self.write_tabs(next);
    }

    /// Turning analytics on turns loans off
    pub fn set_analytics_tab(&mut self, on: bool) {
        let mut next = self.tabs;
        next.analytics = on;
        if on {
            next.loans = false;
        }
        self.write_tabs(next);
    }

    /// Apply all three flags at once, still resolving a loans/analytics clash
    /// in favour of analytics
    pub fn set_tabs(&mut self, flags: TabFlags) {
        let mut next = flags;
        if next.loans && next.analytics {
            next.loans = false;
        }
        self.write_tabs(next);
    }

    fn write_tabs(&mut self, next: TabFlags) {
        debug_assert!(next.is_consistent());

        let before = ViewState::from_flags(self.tabs);
        self.tabs = next;
        let after = ViewState::from_flags(self.tabs);

        if before != after {
            debug!("View state changed: {:?} -> {:?}", before, after);
            self.pending_view_change = Some(after);
        }
    }

    /// Single notification for all tab flag writes since the last call
    pub fn take_view_change(&mut self) -> Option<ViewState> {
        self.pending_view_change.take()
    }

    // ------------------------------------------------------------------------
    // Loanee info flag
    // ------------------------------------------------------------------------

    pub fn loanee_info(&self) -> bool {
        self.loanee_info
    }

    pub fn set_loanee_info(&mut self, on: bool) {
        self.loanee_info = on;
    }

    // ------------------------------------------------------------------------
    // User prefs
    // ------------------------------------------------------------------------

    pub fn user_prefs(&self) -> &UserPrefs {
        &self.user_prefs
    }

    pub fn gui_settings(&self) -> GuiSettings {
        self.user_prefs.gui_settings
    }

    pub fn set_gui_settings(&mut self, settings: GuiSettings) {
        self.user_prefs.gui_settings = settings;
    }

    pub fn address_book_file_path(&self) -> &Path {
        &self.user_prefs.address_book_file_path
    }
}
