//! SQLite book store implementation.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use entities::{Book, BookId, Loan, User, UserId};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    FromRow, Pool, Sqlite,
};

use crate::{BookStore, BookStoreError, BookStoreResult, LoanFilter};

/// Schema for the catalog tables.
///
/// Due dates are stored as unix seconds so range queries compare integers.
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    email TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS books (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    borrowed_by INTEGER REFERENCES users(id),
    until INTEGER,
    CHECK ((borrowed_by IS NULL) = (until IS NULL))
);

CREATE INDEX IF NOT EXISTS idx_books_borrowed_by ON books(borrowed_by);
CREATE INDEX IF NOT EXISTS idx_books_until ON books(until);
"#;

/// Database row for Book
#[derive(Debug, FromRow)]
struct BookRow {
    id: i64,
    name: String,
    borrowed_by: Option<i64>,
    until: Option<i64>,
}

impl TryFrom<BookRow> for Book {
    type Error = BookStoreError;

    fn try_from(row: BookRow) -> BookStoreResult<Self> {
        Ok(Book {
            id: row.id,
            name: row.name,
            borrowed_by: row.borrowed_by,
            until: row.until.map(from_unix).transpose()?,
        })
    }
}

/// Database row for User
#[derive(Debug, FromRow)]
struct UserRow {
    id: i64,
    name: String,
    email: String,
}

impl UserRow {
    fn into_user(self, borrowed_books: Vec<BookId>) -> User {
        User {
            id: self.id,
            name: self.name,
            email: self.email,
            borrowed_books,
        }
    }
}

/// Database row for a book joined with its borrower
#[derive(Debug, FromRow)]
struct LoanRow {
    id: i64,
    name: String,
    borrowed_by: i64,
    until: i64,
    borrower_name: String,
    borrower_email: String,
}

impl TryFrom<LoanRow> for Loan {
    type Error = BookStoreError;

    fn try_from(row: LoanRow) -> BookStoreResult<Self> {
        Ok(Loan {
            book: Book {
                id: row.id,
                name: row.name,
                borrowed_by: Some(row.borrowed_by),
                until: Some(from_unix(row.until)?),
            },
            borrower_id: row.borrowed_by,
            borrower_name: row.borrower_name,
            borrower_email: row.borrower_email,
        })
    }
}

fn from_unix(secs: i64) -> BookStoreResult<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| BookStoreError::InvalidRecord(format!("timestamp out of range: {secs}")))
}

/// Maps foreign key failures to their own variant.
fn map_write_error(err: sqlx::Error) -> BookStoreError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
            BookStoreError::ForeignKeyViolation(db_err.message().to_string())
        }
        _ => BookStoreError::Database(err),
    }
}

/// Book store backed by a SQLite database.
#[derive(Debug, Clone)]
pub struct SqliteBookStore {
    pool: Pool<Sqlite>,
}

impl SqliteBookStore {
    /// Connects to `url` (e.g. `sqlite:library.db?mode=rwc` or
    /// `sqlite::memory:`) and creates the schema if needed.
    pub async fn connect(url: &str) -> BookStoreResult<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        // Every connection to an in-memory database sees its own database,
        // so those get a single connection that is never recycled.
        let pool = if url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        }
        .connect_with(options)
        .await?;

        let store = Self { pool };
        store.run_migrations().await?;

        tracing::debug!(url = %url, "Connected to SQLite book store");
        Ok(store)
    }

    /// Returns a reference to the connection pool
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    async fn run_migrations(&self) -> BookStoreResult<()> {
        sqlx::raw_sql(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl BookStore for SqliteBookStore {
    // =========================================================================
    // Book operations
    // =========================================================================

    async fn create_book(&self, book: Book) -> BookStoreResult<Book> {
        let result = sqlx::query("INSERT INTO books (name, borrowed_by, until) VALUES (?, ?, ?)")
            .bind(&book.name)
            .bind(book.borrowed_by)
            .bind(book.until.map(|until| until.timestamp()))
            .execute(&self.pool)
            .await
            .map_err(map_write_error)?;

        Ok(Book {
            id: result.last_insert_rowid(),
            ..book
        })
    }

    async fn get_book(&self, id: BookId) -> BookStoreResult<Option<Book>> {
        let row: Option<BookRow> =
            sqlx::query_as("SELECT id, name, borrowed_by, until FROM books WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(Book::try_from).transpose()
    }

    async fn update_book(&self, book: Book) -> BookStoreResult<Book> {
        let result = sqlx::query("UPDATE books SET name = ?, borrowed_by = ?, until = ? WHERE id = ?")
            .bind(&book.name)
            .bind(book.borrowed_by)
            .bind(book.until.map(|until| until.timestamp()))
            .bind(book.id)
            .execute(&self.pool)
            .await
            .map_err(map_write_error)?;

        if result.rows_affected() == 0 {
            return Err(BookStoreError::not_found("Book", book.id));
        }
        Ok(book)
    }

    async fn delete_book(&self, id: BookId) -> BookStoreResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(BookStoreError::not_found("Book", id));
        }
        Ok(())
    }

    async fn count_books(&self) -> BookStoreResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }

    // =========================================================================
    // Loan operations
    // =========================================================================

    async fn mark_borrowed(
        &self,
        book_id: BookId,
        user_id: UserId,
        until: DateTime<Utc>,
    ) -> BookStoreResult<bool> {
        let result = sqlx::query(
            "UPDATE books SET borrowed_by = ?, until = ?
             WHERE id = ? AND borrowed_by IS NULL",
        )
        .bind(user_id)
        .bind(until.timestamp())
        .bind(book_id)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        if result.rows_affected() == 1 {
            return Ok(true);
        }
        match self.get_book(book_id).await? {
            Some(_) => Ok(false),
            None => Err(BookStoreError::not_found("Book", book_id)),
        }
    }

    async fn mark_returned(&self, book_id: BookId, user_id: UserId) -> BookStoreResult<bool> {
        let result = sqlx::query(
            "UPDATE books SET borrowed_by = NULL, until = NULL
             WHERE id = ? AND borrowed_by = ?",
        )
        .bind(book_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(true);
        }
        match self.get_book(book_id).await? {
            Some(_) => Ok(false),
            None => Err(BookStoreError::not_found("Book", book_id)),
        }
    }

    async fn list_loans(&self, filter: LoanFilter) -> BookStoreResult<Vec<Loan>> {
        let rows: Vec<LoanRow> = sqlx::query_as(
            "SELECT b.id, b.name, b.borrowed_by, b.until,
                    u.name AS borrower_name, u.email AS borrower_email
             FROM books b
             JOIN users u ON u.id = b.borrowed_by
             WHERE (?1 IS NULL OR b.borrowed_by = ?1)
               AND (?2 IS NULL OR b.until > ?2)
               AND (?3 IS NULL OR b.until <= ?3)
             ORDER BY b.until, b.id",
        )
        .bind(filter.borrower_id)
        .bind(filter.due.map(|window| window.after.timestamp()))
        .bind(filter.due.map(|window| window.until.timestamp()))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Loan::try_from).collect()
    }

    // =========================================================================
    // User operations
    // =========================================================================

    async fn create_user(&self, user: User) -> BookStoreResult<User> {
        let result = sqlx::query("INSERT INTO users (name, email) VALUES (?, ?)")
            .bind(&user.name)
            .bind(&user.email)
            .execute(&self.pool)
            .await?;

        Ok(User {
            id: result.last_insert_rowid(),
            borrowed_books: Vec::new(),
            ..user
        })
    }

    async fn get_user(&self, id: UserId) -> BookStoreResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as("SELECT id, name, email FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let borrowed_books: Vec<BookId> =
            sqlx::query_scalar("SELECT id FROM books WHERE borrowed_by = ? ORDER BY id")
                .bind(id)
                .fetch_all(&self.pool)
                .await?;

        Ok(Some(row.into_user(borrowed_books)))
    }

    async fn delete_user(&self, id: UserId) -> BookStoreResult<()> {
        let mut tx = self.pool.begin().await?;

        let held: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books WHERE borrowed_by = ?")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        if held > 0 {
            return Err(BookStoreError::ForeignKeyViolation(format!(
                "user {id} still holds books"
            )));
        }

        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_write_error)?;

        if result.rows_affected() == 0 {
            return Err(BookStoreError::not_found("User", id));
        }
        tx.commit().await?;
        Ok(())
    }

    async fn count_users(&self) -> BookStoreResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }
}
