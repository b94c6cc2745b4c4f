//! Demo records for fresh installations.

use book_store::{BookStore, BookStoreResult};
use chrono::{DateTime, TimeDelta, Utc};
use entities::{Book, User};

use crate::services::book_service::due_date;

/// Inserts two users and three books if the store holds no records.
///
/// Returns whether anything was inserted.
pub async fn seed_if_empty<S: BookStore>(store: &S, now: DateTime<Utc>) -> BookStoreResult<bool> {
    if store.count_users().await? > 0 || store.count_books().await? > 0 {
        tracing::debug!("Store already populated, skipping seed data");
        return Ok(false);
    }

    let first = store.create_user(User::new("User1", "aaaa@aaa.com")).await?;
    let second = store.create_user(User::new("User2", "bbbb@bbbbbb.com")).await?;

    store
        .create_book(Book::new("Book1").with_loan(first.id, due_date(now, 14)))
        .await?;
    store
        .create_book(Book::new("Book2").with_loan(second.id, now + TimeDelta::hours(20)))
        .await?;
    store.create_book(Book::new("Book3")).await?;

    tracing::info!(users = 2, books = 3, "Inserted seed data");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use book_store::{LoanFilter, MemoryBookStore};
    use entities::DueWindow;

    use super::*;

    #[tokio::test]
    async fn test_seed_populates_empty_store_once() {
        let store = MemoryBookStore::new();
        let now = Utc::now();

        assert!(seed_if_empty(&store, now).await.unwrap());
        assert!(!seed_if_empty(&store, now).await.unwrap());

        assert_eq!(store.count_users().await.unwrap(), 2);
        assert_eq!(store.count_books().await.unwrap(), 3);

        let due_soon = store
            .list_loans(LoanFilter::due_within(DueWindow::new(now, now + TimeDelta::days(1))))
            .await
            .unwrap();
        assert_eq!(due_soon.len(), 1);
        assert_eq!(due_soon[0].borrower_email, "bbbb@bbbbbb.com");
    }

    #[tokio::test]
    async fn test_seed_skips_store_with_records() {
        let store = MemoryBookStore::new();
        store.create_book(Book::new("Existing")).await.unwrap();

        assert!(!seed_if_empty(&store, Utc::now()).await.unwrap());
        assert_eq!(store.count_books().await.unwrap(), 1);
        assert_eq!(store.count_users().await.unwrap(), 0);
    }
}
