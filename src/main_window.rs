// 🪟 Main Window - controller behind the terminal UI
//
// Owns the result display, help window, command box and status bar, routes
// input to `Logic`, and recomputes the panel layout whenever the model
// reports a view change. Holds no terminal handles, so it is testable as is.

use crate::commands::{CommandResult, ALL_COMMANDS};
use crate::config::GuiSettings;
use crate::logic::{Logic, LogicError};
use crate::view_state::{layout_for, PanelLayout, ViewState};
use log::{debug, info};
use std::path::{Path, PathBuf};

// ============================================================================
// PARTS
// ============================================================================

/// Help overlay. Showing it while visible only focuses it.
#[derive(Debug, Default)]
pub struct HelpWindow {
    showing: bool,
    focused: bool,
    times_opened: usize,
}

impl HelpWindow {
    pub fn show(&mut self) {
        debug!("Showing help window");
        self.showing = true;
        self.focused = true;
        self.times_opened += 1;
    }

    pub fn focus(&mut self) {
        self.focused = true;
    }

    pub fn hide(&mut self) {
        self.showing = false;
        self.focused = false;
    }

    pub fn is_showing(&self) -> bool {
        self.showing
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// How many times a window was actually opened (focusing does not count)
    pub fn times_opened(&self) -> usize {
        self.times_opened
    }

    pub fn lines() -> Vec<String> {
        ALL_COMMANDS
            .iter()
            .map(|info| info.usage.lines().next().unwrap_or(info.word).to_string())
            .collect()
    }
}

#[derive(Debug, Default)]
pub struct ResultDisplay {
    feedback: String,
}

impl ResultDisplay {
    pub fn set_feedback_to_user(&mut self, feedback: &str) {
        self.feedback = feedback.to_string();
    }

    pub fn feedback(&self) -> &str {
        &self.feedback
    }
}

/// Text input; keeps the text and flags an error when a command fails
#[derive(Debug, Default)]
pub struct CommandBox {
    input: String,
    has_error: bool,
}

impl CommandBox {
    pub fn text(&self) -> &str {
        &self.input
    }

    pub fn has_error(&self) -> bool {
        self.has_error
    }

    pub fn push(&mut self, c: char) {
        self.has_error = false;
        self.input.push(c);
    }

    pub fn pop(&mut self) {
        self.has_error = false;
        self.input.pop();
    }

    pub fn clear(&mut self) {
        self.has_error = false;
        self.input.clear();
    }
}

#[derive(Debug)]
pub struct StatusBarFooter {
    save_location: PathBuf,
}

impl StatusBarFooter {
    pub fn new(save_location: &Path) -> Self {
        StatusBarFooter {
            save_location: save_location.to_path_buf(),
        }
    }

    pub fn text(&self) -> String {
        if self.save_location.is_absolute() {
            self.save_location.display().to_string()
        } else {
            format!("./{}", self.save_location.display())
        }
    }
}

// ============================================================================
// MAIN WINDOW
// ============================================================================

pub struct MainWindow {
    logic: Logic,
    help_window: HelpWindow,
    result_display: ResultDisplay,
    command_box: CommandBox,
    status_bar: StatusBarFooter,
    view_state: ViewState,
    layout: PanelLayout,
    window_size: GuiSettings,
    is_open: bool,
}

impl MainWindow {
    pub fn new(logic: Logic) -> Self {
        let view_state = logic.view_state();
        let status_bar = StatusBarFooter::new(logic.address_book_file_path());
        let window_size = logic.gui_settings();

        MainWindow {
            logic,
            help_window: HelpWindow::default(),
            result_display: ResultDisplay::default(),
            command_box: CommandBox::default(),
            status_bar,
            view_state,
            layout: layout_for(view_state),
            window_size,
            is_open: true,
        }
    }

    // ------------------------------------------------------------------------
    // Command flow
    // ------------------------------------------------------------------------

    /// Execute `command_text` and show the outcome.
    ///
    /// Feedback is displayed before help or exit handling runs. Failures are
    /// displayed too and then handed back to the caller. The layout follows
    /// the model either way, since a failed save keeps the in-memory change.
    pub fn execute_command(&mut self, command_text: &str) -> Result<CommandResult, LogicError> {
        let outcome = self.logic.execute(command_text);
        self.sync_view_state();

        match outcome {
            Ok(result) => {
                info!("Result: {}", result.feedback_to_user);
                self.result_display.set_feedback_to_user(&result.feedback_to_user);

                if result.show_help {
                    self.handle_help();
                }

                if result.exit {
                    self.handle_exit();
                }

                Ok(result)
            }
            Err(err) => {
                info!("An error occurred while executing command: {}", command_text);
                self.result_display.set_feedback_to_user(&err.to_string());
                Err(err)
            }
        }
    }

    /// Run whatever is in the command box. Success clears the box; failure
    /// keeps the text and marks the box as erroneous.
    pub fn submit_command(&mut self) {
        let text = self.command_box.text().to_string();
        match self.execute_command(&text) {
            Ok(_) => self.command_box.clear(),
            Err(_) => self.command_box.has_error = true,
        }
    }

    /// Apply the model's pending view change, if any
    pub fn sync_view_state(&mut self) {
        if let Some(state) = self.logic.take_view_change() {
            self.toggle_tabs(state);
        }
    }

    fn toggle_tabs(&mut self, state: ViewState) {
        self.view_state = state;
        self.layout = layout_for(state);
        debug!("Now showing {:?}", state);
    }

    /// Open the help window, or focus it when it is already open
    pub fn handle_help(&mut self) {
        if !self.help_window.is_showing() {
            self.help_window.show();
        } else {
            self.help_window.focus();
        }
    }

    pub fn hide_help(&mut self) {
        self.help_window.hide();
    }

    /// Remember the window size and close everything
    pub fn handle_exit(&mut self) {
        self.logic.set_gui_settings(self.window_size);
        self.help_window.hide();
        self.is_open = false;
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.window_size = GuiSettings {
            window_width: width,
            window_height: height,
        };
    }

    // ------------------------------------------------------------------------
    // Accessors for rendering
    // ------------------------------------------------------------------------

    pub fn logic(&self) -> &Logic {
        &self.logic
    }

    pub fn help_window(&self) -> &HelpWindow {
        &self.help_window
    }

    pub fn result_display(&self) -> &ResultDisplay {
        &self.result_display
    }

    pub fn command_box(&self) -> &CommandBox {
        &self.command_box
    }

    pub fn command_box_mut(&mut self) -> &mut CommandBox {
        &mut self.command_box
    }

    pub fn status_bar(&self) -> &StatusBarFooter {
        &self.status_bar
    }

    pub fn view_state(&self) -> ViewState {
        self.view_state
    }

    pub fn layout(&self) -> PanelLayout {
        self.layout
    }

    pub fn window_size(&self) -> GuiSettings {
        self.window_size
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }
}
