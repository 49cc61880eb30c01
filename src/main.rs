use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{info, LevelFilter};
use std::fs::OpenOptions;
use std::path::PathBuf;

use loan_book::config::DEFAULT_CONFIG_FILE;
use loan_book::main_window::HelpWindow;
use loan_book::{AddressBookStorage, Config, Logic, MainWindow, UserPrefs};

#[derive(Parser, Debug)]
#[command(name = "loan-book", version, about = "Contacts and the loans you gave them")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file (created with defaults when missing)
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a single command without the terminal UI, e.g. `exec list`
    Exec {
        #[arg(required = true, num_args = 1.., trailing_var_arg = true, allow_hyphen_values = true)]
        words: Vec<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load_or_init(&cli.config)?;
    init_logging(&config)?;
    info!("=============================[ Initializing Loan Book {} ]===========================", loan_book::VERSION);

    let user_prefs = UserPrefs::load_or_default(&config.user_prefs_file_path);
    let storage = AddressBookStorage::open_or_recreate(&user_prefs.address_book_file_path)?;
    let logic = Logic::from_storage(storage, user_prefs);
    let window = MainWindow::new(logic);

    let window = match cli.command {
        Some(Commands::Exec { words }) => run_exec(window, &words.join(" ")),
        None => run_ui_mode(window)?,
    };

    info!("============================ [ Stopping Loan Book ] =============================");
    window
        .logic()
        .user_prefs()
        .save(&config.user_prefs_file_path)
        .context("Failed to save preferences")?;

    Ok(())
}

fn init_logging(config: &Config) -> Result<()> {
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file_path)
        .with_context(|| format!("Failed to open log file {}", config.log_file_path.display()))?;

    let level = config
        .log_level
        .parse::<LevelFilter>()
        .unwrap_or(LevelFilter::Info);

    // RUST_LOG, when set, overrides the configured level
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .try_init()?;

    Ok(())
}

fn run_exec(mut window: MainWindow, command_text: &str) -> MainWindow {
    match window.execute_command(command_text) {
        Ok(result) => {
            println!("{}", window.result_display().feedback());
            if result.show_help {
                for line in HelpWindow::lines() {
                    println!("  {}", line);
                }
            }
        }
        Err(_) => {
            eprintln!("❌ {}", window.result_display().feedback());
            std::process::exit(1);
        }
    }

    window
}

#[cfg(feature = "tui")]
fn run_ui_mode(window: MainWindow) -> Result<MainWindow> {
    let mut app = loan_book::ui::App::new(window);
    loan_book::ui::run_ui(&mut app)?;

    println!("\n✅ Loan Book closed");

    Ok(app.window)
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_window: MainWindow) -> Result<MainWindow> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or run a single command: loan-book exec <command>");
    std::process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults_to_tui_with_default_config() {
        let cli = Cli::try_parse_from(["loan-book"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_FILE));
    }

    #[test]
    fn test_exec_collects_command_words() {
        let cli = Cli::try_parse_from([
            "loan-book",
            "--config",
            "other.json",
            "exec",
            "linkloan",
            "1",
            "l/-5",
            "s/2024-01-01",
        ])
        .unwrap();

        assert_eq!(cli.config, PathBuf::from("other.json"));
        match cli.command {
            Some(Commands::Exec { words }) => {
                assert_eq!(words.join(" "), "linkloan 1 l/-5 s/2024-01-01")
            }
            other => panic!("expected exec, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_malformed_arguments() {
        assert!(Cli::try_parse_from(["loan-book", "--config"]).is_err());
        assert!(Cli::try_parse_from(["loan-book", "exec"]).is_err());
        assert!(Cli::try_parse_from(["loan-book", "--bogus"]).is_err());
        assert!(Cli::try_parse_from(["loan-book", "import"]).is_err());
    }
}
