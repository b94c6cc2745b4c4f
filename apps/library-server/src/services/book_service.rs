//! Book lending service.
//!
//! Every state transition on books and users goes through [`BookService`].
//! Handlers only translate HTTP requests into calls on it.

use std::{collections::HashSet, sync::Arc};

use book_store::{BookStore, BookStoreError, LoanFilter};
use chrono::{DateTime, NaiveTime, TimeDelta, Utc};
use entities::{Book, BookDraft, BookId, BookStatus, DueWindow, User, UserDraft, UserId};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::{Validate, ValidationErrors};

use crate::services::clock::Clock;

/// Shortest loan, in days.
pub const MIN_LOAN_DAYS: i64 = 1;
/// Longest loan, in days.
pub const MAX_LOAN_DAYS: i64 = 14;

pub const BOOK_UPDATED: &str = "Book was successfully updated.";
pub const BOOK_DELETED: &str = "Book was successfully deleted.";
pub const BOOK_BORROWED: &str = "Book was successfully borrowed.";
pub const BOOK_RETURNED: &str = "Book was returned successfully.";
pub const USER_DELETED: &str = "User was successfully deleted.";

const BOOK_MISSING: &str = "Book does not exist.";
const USER_MISSING: &str = "User does not exist.";
const BOOK_OR_USER_MISSING: &str = "Book or user does not exist.";
const ALREADY_BORROWED: &str = "Someone already borrowed this book.";
const LOAN_LENGTH: &str = "Cannot borrow book for less than a day or more than two weeks.";
const NOT_BORROWED: &str = "User does not have this book borrowed.";
const USER_HOLDS_BOOKS: &str = "User still has borrowed books.";

/// Errors returned by [`BookService`].
#[derive(Debug, Error)]
pub enum BookServiceError {
    /// A referenced book or user does not exist.
    #[error("{0}")]
    NotFound(&'static str),

    /// The operation collides with the current loan state.
    #[error("{0}")]
    Conflict(&'static str),

    /// An argument is outside its allowed range.
    #[error("{0}")]
    InvalidArgument(&'static str),

    /// The records are not in the state the operation requires.
    #[error("{0}")]
    InvalidState(&'static str),

    /// A request payload failed field validation.
    #[error("{0}")]
    Validation(String),

    /// Storage failure.
    #[error(transparent)]
    Store(#[from] BookStoreError),
}

impl From<ValidationErrors> for BookServiceError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

/// Result type for book service operations.
pub type BookServiceResult<T> = Result<T, BookServiceError>;

/// A book with its borrower resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookDetails {
    pub id: BookId,
    pub name: String,
    pub borrowed_by: Option<User>,
    pub until: Option<DateTime<Utc>>,
}

/// Returns the due date of a loan of `days` starting on `now`'s UTC day.
pub fn due_date(now: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc() + TimeDelta::days(days)
}

/// Book lending service.
pub struct BookService<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<S> Clone for BookService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<S: BookStore> BookService<S> {
    /// Creates a new book service.
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the current time according to the service clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    // =========================================================================
    // Books
    // =========================================================================

    /// Inserts a new book and returns it with its id.
    pub async fn create(&self, draft: BookDraft) -> BookServiceResult<Book> {
        draft.validate()?;
        self.ensure_borrower_exists(draft.borrowed_by).await?;

        let book = self.store.create_book(draft.into_book(0)).await?;

        tracing::info!(book_id = %book.id, "Book created");
        Ok(book)
    }

    /// Gets a book with its borrower populated.
    pub async fn get_by_id(&self, id: BookId) -> BookServiceResult<BookDetails> {
        let book = self
            .store
            .get_book(id)
            .await?
            .ok_or(BookServiceError::NotFound(BOOK_MISSING))?;

        let borrowed_by = match book.borrowed_by {
            Some(user_id) => self.store.get_user(user_id).await?,
            None => None,
        };

        Ok(BookDetails {
            id: book.id,
            name: book.name,
            borrowed_by,
            until: book.until,
        })
    }

    /// Overwrites every field of an existing book.
    pub async fn update_book(&self, id: BookId, draft: BookDraft) -> BookServiceResult<&'static str> {
        draft.validate()?;
        if self.store.get_book(id).await?.is_none() {
            return Err(BookServiceError::NotFound(BOOK_MISSING));
        }
        self.ensure_borrower_exists(draft.borrowed_by).await?;

        self.store.update_book(draft.into_book(id)).await?;

        tracing::info!(book_id = %id, "Book updated");
        Ok(BOOK_UPDATED)
    }

    /// Deletes a book.
    pub async fn delete_by_id(&self, id: BookId) -> BookServiceResult<&'static str> {
        match self.store.delete_book(id).await {
            Ok(()) => {}
            Err(BookStoreError::NotFound { .. }) => {
                return Err(BookServiceError::NotFound(BOOK_MISSING));
            }
            Err(e) => return Err(e.into()),
        }

        tracing::info!(book_id = %id, "Book deleted");
        Ok(BOOK_DELETED)
    }

    // =========================================================================
    // Loans
    // =========================================================================

    /// Lends an available book to a user for `days` days.
    ///
    /// Nothing is written unless every check passes.
    pub async fn borrow_book(
        &self,
        book_id: BookId,
        user_id: UserId,
        days: i64,
    ) -> BookServiceResult<&'static str> {
        let (book, _user) = self.resolve_loan_parties(book_id, user_id).await?;

        if book.status() == BookStatus::Borrowed {
            return Err(BookServiceError::Conflict(ALREADY_BORROWED));
        }
        if !(MIN_LOAN_DAYS..=MAX_LOAN_DAYS).contains(&days) {
            return Err(BookServiceError::InvalidArgument(LOAN_LENGTH));
        }

        let until = due_date(self.clock.now(), days);
        if !self.store.mark_borrowed(book_id, user_id, until).await? {
            return Err(BookServiceError::Conflict(ALREADY_BORROWED));
        }

        tracing::info!(book_id = %book_id, user_id = %user_id, until = %until, "Book borrowed");
        Ok(BOOK_BORROWED)
    }

    /// Takes a book back from the user holding it.
    pub async fn return_book(
        &self,
        book_id: BookId,
        user_id: UserId,
    ) -> BookServiceResult<&'static str> {
        let (_book, user) = self.resolve_loan_parties(book_id, user_id).await?;

        if !user.holds(book_id) || !self.store.mark_returned(book_id, user_id).await? {
            return Err(BookServiceError::InvalidState(NOT_BORROWED));
        }

        tracing::info!(book_id = %book_id, user_id = %user_id, "Book returned");
        Ok(BOOK_RETURNED)
    }

    /// Emails of borrowers whose books are due within the next day.
    pub async fn notices(&self) -> BookServiceResult<Vec<String>> {
        self.notices_at(self.clock.now()).await
    }

    /// Emails of borrowers whose books are due in `(now, now + 1 day]`.
    ///
    /// Each address appears once, in order of the earliest due date.
    pub async fn notices_at(&self, now: DateTime<Utc>) -> BookServiceResult<Vec<String>> {
        let window = DueWindow::new(now, now + TimeDelta::days(1));
        let loans = self.store.list_loans(LoanFilter::due_within(window)).await?;

        let mut seen = HashSet::new();
        let emails: Vec<String> = loans
            .into_iter()
            .map(|loan| loan.borrower_email)
            .filter(|email| seen.insert(email.clone()))
            .collect();

        tracing::debug!(count = emails.len(), "Collected due-date notices");
        Ok(emails)
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Registers a new user.
    pub async fn create_user(&self, draft: UserDraft) -> BookServiceResult<User> {
        draft.validate()?;

        let user = self.store.create_user(draft.into_user(0)).await?;

        tracing::info!(user_id = %user.id, "User created");
        Ok(user)
    }

    /// Gets a user with their borrowed books.
    pub async fn get_user(&self, id: UserId) -> BookServiceResult<User> {
        self.store
            .get_user(id)
            .await?
            .ok_or(BookServiceError::NotFound(USER_MISSING))
    }

    /// Deletes a user who holds no books.
    pub async fn delete_user(&self, id: UserId) -> BookServiceResult<&'static str> {
        let user = self.get_user(id).await?;
        if !user.borrowed_books.is_empty() {
            return Err(BookServiceError::Conflict(USER_HOLDS_BOOKS));
        }

        match self.store.delete_user(id).await {
            Ok(()) => {}
            Err(BookStoreError::NotFound { .. }) => {
                return Err(BookServiceError::NotFound(USER_MISSING));
            }
            Err(BookStoreError::ForeignKeyViolation(_)) => {
                return Err(BookServiceError::Conflict(USER_HOLDS_BOOKS));
            }
            Err(e) => return Err(e.into()),
        }

        tracing::info!(user_id = %id, "User deleted");
        Ok(USER_DELETED)
    }

    async fn resolve_loan_parties(
        &self,
        book_id: BookId,
        user_id: UserId,
    ) -> BookServiceResult<(Book, User)> {
        let book = self.store.get_book(book_id).await?;
        let user = self.store.get_user(user_id).await?;

        match (book, user) {
            (Some(book), Some(user)) => Ok((book, user)),
            _ => Err(BookServiceError::NotFound(BOOK_OR_USER_MISSING)),
        }
    }

    async fn ensure_borrower_exists(&self, borrower: Option<UserId>) -> BookServiceResult<()> {
        match borrower {
            Some(user_id) if self.store.get_user(user_id).await?.is_none() => {
                Err(BookServiceError::NotFound(USER_MISSING))
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use book_store::MemoryBookStore;
    use chrono::TimeZone;
    use tokio_test::{assert_err, assert_ok};

    use super::*;
    use crate::services::clock::FixedClock;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 14, 9, 30, 0).unwrap()
    }

    fn service() -> BookService<MemoryBookStore> {
        BookService::new(Arc::new(MemoryBookStore::new()), Arc::new(FixedClock(now())))
    }

    async fn user(service: &BookService<MemoryBookStore>, name: &str, email: &str) -> User {
        service.create_user(UserDraft::new(name, email)).await.unwrap()
    }

    #[test]
    fn test_due_date_counts_from_start_of_day() {
        assert_eq!(
            due_date(now(), 3),
            Utc.with_ymd_and_hms(2024, 5, 17, 0, 0, 0).unwrap()
        );
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let service = service();

        let book = service.create(BookDraft::new("Dune")).await.unwrap();
        let details = service.get_by_id(book.id).await.unwrap();

        assert_eq!(details.name, "Dune");
        assert!(details.borrowed_by.is_none());
        assert!(details.until.is_none());
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_drafts() {
        let service = service();

        let result = service.create(BookDraft::new("a".repeat(21))).await;
        assert!(matches!(result, Err(BookServiceError::Validation(_))));

        let mut draft = BookDraft::new("Dune");
        draft.borrowed_by = Some(42);
        draft.until = Some(now());
        let result = service.create(draft).await;
        assert!(matches!(result, Err(BookServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_borrow_sets_due_date_and_user_list() {
        let service = service();
        let book = service.create(BookDraft::new("Dune")).await.unwrap();
        let user = user(&service, "User1", "aaaa@aaa.com").await;

        let message = service.borrow_book(book.id, user.id, 7).await.unwrap();
        assert_eq!(message, BOOK_BORROWED);

        let details = service.get_by_id(book.id).await.unwrap();
        assert_eq!(details.until, Some(due_date(now(), 7)));
        assert_eq!(details.borrowed_by.map(|u| u.id), Some(user.id));

        let user = service.get_user(user.id).await.unwrap();
        assert_eq!(user.borrowed_books, vec![book.id]);
    }

    #[tokio::test]
    async fn test_repeat_borrow_conflicts() {
        let service = service();
        let book = service.create(BookDraft::new("Dune")).await.unwrap();
        let first = user(&service, "User1", "aaaa@aaa.com").await;
        let second = user(&service, "User2", "bbbb@bbbbbb.com").await;

        service.borrow_book(book.id, first.id, 3).await.unwrap();

        let result = service.borrow_book(book.id, second.id, 3).await;
        assert!(matches!(result, Err(BookServiceError::Conflict(_))));
        let result = service.borrow_book(book.id, first.id, 3).await;
        assert!(matches!(result, Err(BookServiceError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_borrow_rejects_out_of_range_days() {
        let service = service();
        let book = service.create(BookDraft::new("Dune")).await.unwrap();
        let user = user(&service, "User1", "aaaa@aaa.com").await;

        for days in [0, 15, -1] {
            let result = service.borrow_book(book.id, user.id, days).await;
            assert!(matches!(result, Err(BookServiceError::InvalidArgument(_))));
        }

        let details = service.get_by_id(book.id).await.unwrap();
        assert!(details.borrowed_by.is_none());
        assert!(details.until.is_none());

        assert_ok!(service.borrow_book(book.id, user.id, 1).await);
    }

    #[tokio::test]
    async fn test_borrow_missing_records() {
        let service = service();
        let book = service.create(BookDraft::new("Dune")).await.unwrap();
        let user = user(&service, "User1", "aaaa@aaa.com").await;

        let result = service.borrow_book(book.id, 99, 3).await;
        assert!(matches!(result, Err(BookServiceError::NotFound(_))));
        let result = service.borrow_book(99, user.id, 3).await;
        assert!(matches!(result, Err(BookServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_return_clears_loan() {
        let service = service();
        let book = service.create(BookDraft::new("Dune")).await.unwrap();
        let user = user(&service, "User1", "aaaa@aaa.com").await;
        service.borrow_book(book.id, user.id, 5).await.unwrap();

        let message = service.return_book(book.id, user.id).await.unwrap();
        assert_eq!(message, BOOK_RETURNED);

        let details = service.get_by_id(book.id).await.unwrap();
        assert!(details.borrowed_by.is_none());
        assert!(details.until.is_none());
        assert!(service.get_user(user.id).await.unwrap().borrowed_books.is_empty());
    }

    #[tokio::test]
    async fn test_return_of_unheld_book_is_invalid_state() {
        let service = service();
        let book = service.create(BookDraft::new("Dune")).await.unwrap();
        let holder = user(&service, "User1", "aaaa@aaa.com").await;
        let other = user(&service, "User2", "bbbb@bbbbbb.com").await;

        let result = service.return_book(book.id, holder.id).await;
        assert!(matches!(result, Err(BookServiceError::InvalidState(_))));

        service.borrow_book(book.id, holder.id, 5).await.unwrap();
        let result = service.return_book(book.id, other.id).await;
        assert!(matches!(result, Err(BookServiceError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_notices_cover_the_next_day_only() {
        let service = service();
        let soon = user(&service, "Soon", "soon@aaa.com").await;
        let later = user(&service, "Later", "later@aaa.com").await;
        let late = user(&service, "Late", "late@aaa.com").await;
        let store = service.store();

        let due_soon = now() + TimeDelta::hours(20);
        store
            .create_book(Book::new("Book1").with_loan(soon.id, due_soon))
            .await
            .unwrap();
        store
            .create_book(Book::new("Book2").with_loan(soon.id, due_soon + TimeDelta::hours(1)))
            .await
            .unwrap();
        store
            .create_book(Book::new("Book3").with_loan(later.id, now() + TimeDelta::days(14)))
            .await
            .unwrap();
        store
            .create_book(Book::new("Book4").with_loan(late.id, now() - TimeDelta::hours(2)))
            .await
            .unwrap();

        let emails = service.notices().await.unwrap();
        assert_eq!(emails, vec!["soon@aaa.com"]);
    }

    #[tokio::test]
    async fn test_missing_book_operations() {
        let service = service();

        assert!(matches!(
            service.get_by_id(1).await,
            Err(BookServiceError::NotFound(_))
        ));
        assert!(matches!(
            service.delete_by_id(1).await,
            Err(BookServiceError::NotFound(_))
        ));
        assert!(matches!(
            service.update_book(1, BookDraft::new("Dune")).await,
            Err(BookServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let service = service();
        let book = service.create(BookDraft::new("Dune")).await.unwrap();

        let message = service
            .update_book(book.id, BookDraft::new("Dune Messiah"))
            .await
            .unwrap();
        assert_eq!(message, BOOK_UPDATED);
        assert_eq!(service.get_by_id(book.id).await.unwrap().name, "Dune Messiah");

        assert_eq!(service.delete_by_id(book.id).await.unwrap(), BOOK_DELETED);
        assert_err!(service.get_by_id(book.id).await);
    }

    #[tokio::test]
    async fn test_user_holding_books_cannot_be_deleted() {
        let service = service();
        let book = service.create(BookDraft::new("Dune")).await.unwrap();
        let user = user(&service, "User1", "aaaa@aaa.com").await;
        service.borrow_book(book.id, user.id, 2).await.unwrap();

        let result = service.delete_user(user.id).await;
        assert!(matches!(result, Err(BookServiceError::Conflict(_))));

        service.return_book(book.id, user.id).await.unwrap();
        assert_ok!(service.delete_user(user.id).await);
        assert!(matches!(
            service.get_user(user.id).await,
            Err(BookServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_create_user_validates_fields() {
        let service = service();

        let result = service
            .create_user(UserDraft::new("User1", "not-an-email"))
            .await;
        assert!(matches!(result, Err(BookServiceError::Validation(_))));

        let result = service
            .create_user(UserDraft::new("LongerThanTen", "aaaa@aaa.com"))
            .await;
        assert!(matches!(result, Err(BookServiceError::Validation(_))));
    }
}
