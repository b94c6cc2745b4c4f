//! Book store trait definitions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use entities::{Book, BookId, DueWindow, Loan, User, UserId};

use crate::BookStoreResult;

/// Filter options for listing loans.
#[derive(Debug, Clone, Default)]
pub struct LoanFilter {
    /// Filter by borrowing user.
    pub borrower_id: Option<UserId>,
    /// Filter by due date.
    pub due: Option<DueWindow>,
}

impl LoanFilter {
    /// Loans whose due date falls inside `window`.
    pub fn due_within(window: DueWindow) -> Self {
        Self {
            due: Some(window),
            ..Default::default()
        }
    }

    /// Loans held by `user_id`.
    pub fn borrowed_by(user_id: UserId) -> Self {
        Self {
            borrower_id: Some(user_id),
            ..Default::default()
        }
    }

    /// Returns true if `book` satisfies every set criterion.
    pub fn matches(&self, book: &Book) -> bool {
        self.borrower_id.is_none_or(|id| book.is_held_by(id))
            && self
                .due
                .is_none_or(|window| book.until.is_some_and(|due| window.contains(due)))
    }
}

/// Trait for catalog storage operations.
#[async_trait]
pub trait BookStore: Send + Sync {
    // =========================================================================
    // Book operations
    // =========================================================================

    /// Inserts a book and returns it with its assigned id.
    async fn create_book(&self, book: Book) -> BookStoreResult<Book>;

    /// Gets a book by ID.
    async fn get_book(&self, id: BookId) -> BookStoreResult<Option<Book>>;

    /// Overwrites every field of an existing book.
    async fn update_book(&self, book: Book) -> BookStoreResult<Book>;

    /// Deletes a book.
    async fn delete_book(&self, id: BookId) -> BookStoreResult<()>;

    /// Counts all books.
    async fn count_books(&self) -> BookStoreResult<u64>;

    // =========================================================================
    // Loan operations
    // =========================================================================

    /// Lends an available book to a user.
    ///
    /// Returns `false` without writing anything if the book is already lent.
    async fn mark_borrowed(
        &self,
        book_id: BookId,
        user_id: UserId,
        until: DateTime<Utc>,
    ) -> BookStoreResult<bool>;

    /// Clears the loan on a book held by `user_id`.
    ///
    /// Returns `false` without writing anything if the user does not hold it.
    async fn mark_returned(&self, book_id: BookId, user_id: UserId) -> BookStoreResult<bool>;

    /// Lists borrowed books joined with their borrowers, ordered by due date.
    async fn list_loans(&self, filter: LoanFilter) -> BookStoreResult<Vec<Loan>>;

    // =========================================================================
    // User operations
    // =========================================================================

    /// Inserts a user and returns it with its assigned id.
    async fn create_user(&self, user: User) -> BookStoreResult<User>;

    /// Gets a user by ID with `borrowed_books` populated.
    async fn get_user(&self, id: UserId) -> BookStoreResult<Option<User>>;

    /// Deletes a user.
    async fn delete_user(&self, id: UserId) -> BookStoreResult<()>;

    /// Counts all users.
    async fn count_users(&self) -> BookStoreResult<u64>;
}
