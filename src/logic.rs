// 🧠 Logic - parse, execute, persist
//
// The only entry point the window uses to change anything. Parse and
// execution failures stay distinct all the way up to the caller.

use crate::commands::{CommandError, CommandResult};
use crate::config::{GuiSettings, UserPrefs};
use crate::db::AddressBookStorage;
use crate::model::Model;
use crate::parser::{parse_command, ParseError};
use crate::view_state::ViewState;
use log::{info, warn};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LogicError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Command(#[from] CommandError),
}

pub struct Logic {
    model: Model,
    storage: AddressBookStorage,
}

impl Logic {
    pub fn new(model: Model, storage: AddressBookStorage) -> Self {
        Logic { model, storage }
    }

    /// Load the address book from `storage` and wrap it with `user_prefs`.
    /// An unreadable file starts an empty book instead of refusing to run.
    pub fn from_storage(storage: AddressBookStorage, user_prefs: UserPrefs) -> Self {
        let address_book = match storage.load() {
            Ok(book) => book,
            Err(err) => {
                warn!(
                    "Data file at {} could not be loaded, starting with an empty address book: {:#}",
                    storage.path().display(),
                    err
                );
                Default::default()
            }
        };

        Logic::new(Model::new(address_book, user_prefs), storage)
    }

    pub fn execute(&mut self, command_text: &str) -> Result<CommandResult, LogicError> {
        info!("----------------[USER COMMAND][{}]", command_text);

        let command = parse_command(command_text)?;
        let modifies = command.modifies_address_book();
        let result = command.execute(&mut self.model)?;

        if modifies {
            self.storage
                .save(self.model.address_book())
                .map_err(|err| CommandError::Storage(format!("{:#}", err)))?;
        }

        Ok(result)
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn view_state(&self) -> ViewState {
        self.model.view_state()
    }

    pub fn take_view_change(&mut self) -> Option<ViewState> {
        self.model.take_view_change()
    }

    pub fn address_book_file_path(&self) -> &Path {
        self.storage.path()
    }

    pub fn user_prefs(&self) -> &UserPrefs {
        self.model.user_prefs()
    }

    pub fn gui_settings(&self) -> GuiSettings {
        self.model.gui_settings()
    }

    pub fn set_gui_settings(&mut self, settings: GuiSettings) {
        self.model.set_gui_settings(settings);
    }

    #[cfg(test)]
    pub(crate) fn storage(&self) -> &AddressBookStorage {
        &self.storage
    }
}
