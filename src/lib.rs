// Loan Book - Core Library
// Exposes all modules for use in the TUI, headless mode, and tests

pub mod entities;
pub mod view_state;
pub mod analytics;
pub mod model;
pub mod commands;
pub mod parser;
pub mod config;
pub mod db;
pub mod logic;
pub mod main_window;

// Only compile the terminal UI when the TUI feature is enabled
#[cfg(feature = "tui")]
pub mod ui;

// Re-export commonly used types
pub use entities::{
    Person, Name, Phone, Email, Address, Tag,
    Loan, Money,
};
pub use view_state::{
    TabFlags, ViewState, PanelLayout, PanelSize, Panel, layout_for, PERSON_LIST_MAX_HEIGHT,
};
pub use analytics::Analytics;
pub use model::{AddressBook, Model, PersonFilter, LoanFilter};
pub use commands::{
    Command, CommandResult, CommandError, EditPersonDescriptor, Index,
    MESSAGE_NOT_IMPLEMENTED_YET,
};
pub use parser::{parse_command, ParseError};
pub use config::{Config, UserPrefs, GuiSettings};
pub use db::AddressBookStorage;
pub use logic::{Logic, LogicError};
pub use main_window::MainWindow;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
