// 🗄️ Storage - SQLite address book (persons + loans)
//
// Every save rewrites both tables inside one transaction, so the file always
// holds a complete snapshot of the last successful command.

use crate::entities::{parse_date, Address, Email, Loan, Money, Name, Person, Phone, Tag, DATE_FORMAT};
use crate::model::AddressBook;
use anyhow::{anyhow, Context, Result};
use log::{debug, info, warn};
use rusqlite::{params, Connection};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;

    // ==========================================================================
    // Persons Table (position keeps the list order stable across sessions)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS persons (
            id TEXT PRIMARY KEY,
            position INTEGER NOT NULL,
            name TEXT NOT NULL,
            phone TEXT NOT NULL,
            email TEXT NOT NULL,
            address TEXT NOT NULL,
            tags TEXT NOT NULL,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    // ==========================================================================
    // Loans Table
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS loans (
            id TEXT PRIMARY KEY,
            position INTEGER NOT NULL,
            assignee TEXT NOT NULL REFERENCES persons(id) ON DELETE CASCADE,
            amount_cents INTEGER NOT NULL,
            start_date TEXT NOT NULL,
            return_date TEXT NOT NULL,
            is_returned INTEGER NOT NULL DEFAULT 0,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_loans_assignee ON loans(assignee)",
        [],
    )?;

    Ok(())
}

pub fn save_address_book(conn: &mut Connection, book: &AddressBook) -> Result<()> {
    let tx = conn.transaction()?;

    tx.execute("DELETE FROM loans", [])?;
    tx.execute("DELETE FROM persons", [])?;

    {
        let mut insert_person = tx.prepare(
            "INSERT INTO persons (id, position, name, phone, email, address, tags)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;
        for (position, person) in book.persons().iter().enumerate() {
            let tags: Vec<&str> = person.tags.iter().map(Tag::as_str).collect();
            insert_person.execute(params![
                person.id.to_string(),
                position as i64,
                person.name.as_str(),
                person.phone.as_str(),
                person.email.as_str(),
                person.address.as_str(),
                serde_json::to_string(&tags)?,
            ])?;
        }

        let mut insert_loan = tx.prepare(
            "INSERT INTO loans (id, position, assignee, amount_cents, start_date, return_date, is_returned)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;
        for (position, loan) in book.loans().iter().enumerate() {
            insert_loan.execute(params![
                loan.id.to_string(),
                position as i64,
                loan.assignee.to_string(),
                loan.amount.cents() as i64,
                loan.start_date.format(DATE_FORMAT).to_string(),
                loan.return_date.format(DATE_FORMAT).to_string(),
                loan.is_returned,
            ])?;
        }
    }

    tx.commit()?;
    debug!(
        "Saved {} persons and {} loans",
        book.persons().len(),
        book.loans().len()
    );

    Ok(())
}

struct PersonRow {
    id: String,
    name: String,
    phone: String,
    email: String,
    address: String,
    tags: String,
}

struct LoanRow {
    id: String,
    assignee: String,
    amount_cents: i64,
    start_date: String,
    return_date: String,
    is_returned: bool,
}

pub fn load_address_book(conn: &Connection) -> Result<AddressBook> {
    let mut stmt = conn.prepare(
        "SELECT id, name, phone, email, address, tags FROM persons ORDER BY position",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(PersonRow {
            id: row.get(0)?,
            name: row.get(1)?,
            phone: row.get(2)?,
            email: row.get(3)?,
            address: row.get(4)?,
            tags: row.get(5)?,
        })
    })?;

    let mut persons = Vec::new();
    for row in rows {
        persons.push(person_from_row(row?)?);
    }

    let mut stmt = conn.prepare(
        "SELECT id, assignee, amount_cents, start_date, return_date, is_returned
         FROM loans ORDER BY position",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(LoanRow {
            id: row.get(0)?,
            assignee: row.get(1)?,
            amount_cents: row.get(2)?,
            start_date: row.get(3)?,
            return_date: row.get(4)?,
            is_returned: row.get(5)?,
        })
    })?;

    let mut loans = Vec::new();
    for row in rows {
        loans.push(loan_from_row(row?)?);
    }

    Ok(AddressBook::from_parts(persons, loans))
}

/// Stored values go through the same validation as typed input
fn person_from_row(row: PersonRow) -> Result<Person> {
    let tag_names: Vec<String> = serde_json::from_str(&row.tags)
        .with_context(|| format!("Invalid tags for person {}", row.id))?;
    let tags = tag_names
        .iter()
        .map(|t| Tag::new(t).map_err(|e| anyhow!(e)))
        .collect::<Result<BTreeSet<Tag>>>()?;

    Ok(Person {
        id: Uuid::parse_str(&row.id).context("Invalid person id")?,
        name: Name::new(&row.name).map_err(|e| anyhow!(e))?,
        phone: Phone::new(&row.phone).map_err(|e| anyhow!(e))?,
        email: Email::new(&row.email).map_err(|e| anyhow!(e))?,
        address: Address::new(&row.address).map_err(|e| anyhow!(e))?,
        tags,
    })
}

fn loan_from_row(row: LoanRow) -> Result<Loan> {
    let cents = u64::try_from(row.amount_cents)
        .ok()
        .filter(|c| *c > 0)
        .ok_or_else(|| anyhow!(Money::MESSAGE_CONSTRAINTS))?;

    let mut loan = Loan::new(
        Uuid::parse_str(&row.assignee).context("Invalid loan assignee")?,
        Money::from_cents(cents),
        parse_date(&row.start_date).map_err(|e| anyhow!(e))?,
        parse_date(&row.return_date).map_err(|e| anyhow!(e))?,
    )
    .map_err(|e| anyhow!(e))?;
    loan.id = Uuid::parse_str(&row.id).context("Invalid loan id")?;
    loan.is_returned = row.is_returned;

    Ok(loan)
}

// ============================================================================
// STORAGE HANDLE
// ============================================================================

/// Open connection plus the path shown in the status bar
pub struct AddressBookStorage {
    path: PathBuf,
    conn: Connection,
}

impl AddressBookStorage {
    /// Open (creating parent directories and tables as needed)
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database {}", path.display()))?;
        setup_database(&conn)?;
        info!("Using address book at {}", path.display());

        Ok(AddressBookStorage {
            path: path.to_path_buf(),
            conn,
        })
    }

    /// Like `open`, but a file that is not a readable address book is moved
    /// to `<name>.corrupt` and a fresh one is created in its place
    pub fn open_or_recreate(path: &Path) -> Result<Self> {
        match AddressBookStorage::open(path) {
            Ok(storage) => Ok(storage),
            Err(err) if path.exists() => {
                let backup = corrupt_backup_path(path);
                warn!(
                    "Data file at {} is not in the correct format, moving it to {} and starting with an empty address book: {:#}",
                    path.display(),
                    backup.display(),
                    err
                );
                fs::rename(path, &backup)
                    .with_context(|| format!("Failed to move {} aside", path.display()))?;
                AddressBookStorage::open(path)
            }
            Err(err) => Err(err),
        }
    }

    /// In-memory database, nothing touches disk
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        setup_database(&conn)?;
        Ok(AddressBookStorage {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<AddressBook> {
        load_address_book(&self.conn)
    }

    pub fn save(&mut self, book: &AddressBook) -> Result<()> {
        save_address_book(&mut self.conn, book)
    }

    #[cfg(test)]
    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }
}

fn corrupt_backup_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".corrupt");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::test_support::typical_address_book;
    use tempfile::tempdir;

    #[test]
    fn test_new_database_is_empty() {
        let storage = AddressBookStorage::in_memory().unwrap();
        assert_eq!(storage.load().unwrap(), AddressBook::new());
    }

    #[test]
    fn test_save_then_load_keeps_order_ids_and_status() {
        let mut storage = AddressBookStorage::in_memory().unwrap();
        let mut book = typical_address_book();
        let first_loan = book.loans()[0].id;
        let mut returned = book.remove_loan(first_loan).unwrap();
        returned.is_returned = true;
        book.add_loan(returned);

        storage.save(&book).unwrap();
        let loaded = storage.load().unwrap();

        assert_eq!(loaded, book);
        assert!(loaded.loans().last().unwrap().is_returned);
    }

    #[test]
    fn test_save_replaces_previous_snapshot() {
        let mut storage = AddressBookStorage::in_memory().unwrap();
        storage.save(&typical_address_book()).unwrap();
        storage.save(&AddressBook::new()).unwrap();

        assert_eq!(storage.load().unwrap(), AddressBook::new());
    }

    #[test]
    fn test_open_creates_file_and_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data").join("addressbook.db");

        {
            let mut storage = AddressBookStorage::open(&path).unwrap();
            storage.save(&typical_address_book()).unwrap();
            assert_eq!(storage.path(), path.as_path());
        }

        let reopened = AddressBookStorage::open(&path).unwrap();
        assert_eq!(reopened.load().unwrap().persons().len(), 3);
    }

    #[test]
    fn test_garbage_file_is_moved_aside_and_recreated() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("addressbook.db");
        let garbage = "not a database ".repeat(64);
        fs::write(&path, &garbage).unwrap();

        assert!(AddressBookStorage::open(&path).is_err());

        let mut storage = AddressBookStorage::open_or_recreate(&path).unwrap();
        assert_eq!(storage.load().unwrap(), AddressBook::new());
        storage.save(&typical_address_book()).unwrap();

        let backup = dir.path().join("addressbook.db.corrupt");
        assert_eq!(fs::read_to_string(backup).unwrap(), garbage);
        assert_eq!(AddressBookStorage::open(&path).unwrap().load().unwrap().persons().len(), 3);
    }

    #[test]
    fn test_open_or_recreate_keeps_good_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("addressbook.db");
        AddressBookStorage::open(&path)
            .unwrap()
            .save(&typical_address_book())
            .unwrap();

        let storage = AddressBookStorage::open_or_recreate(&path).unwrap();
        assert_eq!(storage.load().unwrap().persons().len(), 3);
        assert!(!dir.path().join("addressbook.db.corrupt").exists());
    }

    #[test]
    fn test_corrupt_row_is_an_error() {
        let storage = AddressBookStorage::in_memory().unwrap();
        storage
            .conn
            .execute(
                "INSERT INTO persons (id, position, name, phone, email, address, tags)
                 VALUES (?1, 0, 'Bad*Name', '123', 'a@b.com', 'x', '[]')",
                params![Uuid::new_v4().to_string()],
            )
            .unwrap();

        assert!(storage.load().is_err());
    }
}
