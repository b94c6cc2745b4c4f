//! In-memory book store implementation for testing.

use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicI64, Ordering},
        Arc,
    },
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use entities::{Book, BookId, Loan, User, UserId};
use tokio::sync::RwLock;

use crate::{BookStore, BookStoreError, BookStoreResult, LoanFilter};

/// In-memory book store.
///
/// Locks are always taken users-then-books so combined operations cannot
/// deadlock.
#[derive(Debug)]
pub struct MemoryBookStore {
    users: Arc<RwLock<BTreeMap<UserId, User>>>,
    books: Arc<RwLock<BTreeMap<BookId, Book>>>,
    next_user_id: AtomicI64,
    next_book_id: AtomicI64,
}

impl Default for MemoryBookStore {
    fn default() -> Self {
        Self {
            users: Arc::default(),
            books: Arc::default(),
            next_user_id: AtomicI64::new(1),
            next_book_id: AtomicI64::new(1),
        }
    }
}

impl MemoryBookStore {
    /// Creates a new in-memory book store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn check_borrower(users: &BTreeMap<UserId, User>, book: &Book) -> BookStoreResult<()> {
    match book.borrowed_by {
        Some(user_id) if !users.contains_key(&user_id) => Err(
            BookStoreError::ForeignKeyViolation(format!("book borrower {user_id} does not exist")),
        ),
        _ => Ok(()),
    }
}

#[async_trait]
impl BookStore for MemoryBookStore {
    // =========================================================================
    // Book operations
    // =========================================================================

    async fn create_book(&self, mut book: Book) -> BookStoreResult<Book> {
        let users = self.users.read().await;
        check_borrower(&users, &book)?;

        let mut books = self.books.write().await;
        book.id = self.next_book_id.fetch_add(1, Ordering::SeqCst);
        books.insert(book.id, book.clone());
        Ok(book)
    }

    async fn get_book(&self, id: BookId) -> BookStoreResult<Option<Book>> {
        let books = self.books.read().await;
        Ok(books.get(&id).cloned())
    }

    async fn update_book(&self, book: Book) -> BookStoreResult<Book> {
        let users = self.users.read().await;
        let mut books = self.books.write().await;
        if !books.contains_key(&book.id) {
            return Err(BookStoreError::not_found("Book", book.id));
        }
        check_borrower(&users, &book)?;
        books.insert(book.id, book.clone());
        Ok(book)
    }

    async fn delete_book(&self, id: BookId) -> BookStoreResult<()> {
        let mut books = self.books.write().await;
        if books.remove(&id).is_none() {
            return Err(BookStoreError::not_found("Book", id));
        }
        Ok(())
    }

    async fn count_books(&self) -> BookStoreResult<u64> {
        Ok(self.books.read().await.len() as u64)
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
        let users = self.users.read().await;
        let mut books = self.books.write().await;

        let Some(book) = books.get_mut(&book_id) else {
            return Err(BookStoreError::not_found("Book", book_id));
        };
        if book.borrowed_by.is_some() {
            return Ok(false);
        }
        if !users.contains_key(&user_id) {
            return Err(BookStoreError::ForeignKeyViolation(format!(
                "book borrower {user_id} does not exist"
            )));
        }

        book.borrowed_by = Some(user_id);
        book.until = Some(until);
        Ok(true)
    }

    async fn mark_returned(&self, book_id: BookId, user_id: UserId) -> BookStoreResult<bool> {
        let mut books = self.books.write().await;

        let Some(book) = books.get_mut(&book_id) else {
            return Err(BookStoreError::not_found("Book", book_id));
        };
        if !book.is_held_by(user_id) {
            return Ok(false);
        }

        book.borrowed_by = None;
        book.until = None;
        Ok(true)
    }

    async fn list_loans(&self, filter: LoanFilter) -> BookStoreResult<Vec<Loan>> {
        let users = self.users.read().await;
        let books = self.books.read().await;

        let mut loans: Vec<Loan> = books
            .values()
            .filter(|book| filter.matches(book))
            .filter_map(|book| {
                let borrower = users.get(&book.borrowed_by?)?;
                Some(Loan {
                    book: book.clone(),
                    borrower_id: borrower.id,
                    borrower_name: borrower.name.clone(),
                    borrower_email: borrower.email.clone(),
                })
            })
            .collect();
        loans.sort_by_key(|loan| loan.book.until);

        Ok(loans)
    }

    // =========================================================================
    // User operations
    // =========================================================================

    async fn create_user(&self, mut user: User) -> BookStoreResult<User> {
        let mut users = self.users.write().await;
        user.id = self.next_user_id.fetch_add(1, Ordering::SeqCst);
        user.borrowed_books.clear();
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: UserId) -> BookStoreResult<Option<User>> {
        let users = self.users.read().await;
        let Some(mut user) = users.get(&id).cloned() else {
            return Ok(None);
        };

        let books = self.books.read().await;
        user.borrowed_books = books
            .values()
            .filter(|book| book.is_held_by(id))
            .map(|book| book.id)
            .collect();
        Ok(Some(user))
    }

    async fn delete_user(&self, id: UserId) -> BookStoreResult<()> {
        let mut users = self.users.write().await;
        if !users.contains_key(&id) {
            return Err(BookStoreError::not_found("User", id));
        }

        let books = self.books.read().await;
        if books.values().any(|book| book.is_held_by(id)) {
            return Err(BookStoreError::ForeignKeyViolation(format!(
                "user {id} still holds books"
            )));
        }

        users.remove(&id);
        Ok(())
    }

    async fn count_users(&self) -> BookStoreResult<u64> {
        Ok(self.users.read().await.len() as u64)
    }
}
