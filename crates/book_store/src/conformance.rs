//! Behaviour shared by every `BookStore` implementation, run against each one.

use chrono::{Duration, DurationRound, Utc};
use entities::{Book, DueWindow, User};
use tokio_test::assert_ok;

use crate::{BookStore, BookStoreError, LoanFilter};

pub async fn book_crud<S: BookStore>(store: &S) {
    // Create
    let created = store.create_book(Book::new("Book1")).await.unwrap();
    assert!(created.id > 0);
    assert_eq!(created.name, "Book1");
    assert_eq!(store.count_books().await.unwrap(), 1);

    // Get
    let fetched = store.get_book(created.id).await.unwrap().unwrap();
    assert_eq!(fetched, created);

    // Update
    let mut renamed = fetched.clone();
    renamed.name = "Dante's Inferno".to_string();
    store.update_book(renamed).await.unwrap();
    let fetched = store.get_book(created.id).await.unwrap().unwrap();
    assert_eq!(fetched.name, "Dante's Inferno");

    // Delete
    store.delete_book(created.id).await.unwrap();
    assert!(store.get_book(created.id).await.unwrap().is_none());
    assert_eq!(store.count_books().await.unwrap(), 0);
}

pub async fn missing_records<S: BookStore>(store: &S) {
    assert!(store.get_book(500).await.unwrap().is_none());
    assert!(store.get_user(500).await.unwrap().is_none());

    let mut ghost = Book::new("Ghost");
    ghost.id = 500;
    assert!(matches!(
        store.update_book(ghost).await,
        Err(BookStoreError::NotFound { .. })
    ));
    assert!(matches!(
        store.delete_book(500).await,
        Err(BookStoreError::NotFound { .. })
    ));
    assert!(matches!(
        store.delete_user(500).await,
        Err(BookStoreError::NotFound { .. })
    ));
}

pub async fn borrow_and_return<S: BookStore>(store: &S) {
    let user = store
        .create_user(User::new("User2", "bbbb@bbbbbb.com"))
        .await
        .unwrap();
    let book = store.create_book(Book::new("Book3")).await.unwrap();
    let until = Utc::now().duration_trunc(Duration::days(1)).unwrap() + Duration::days(5);

    assert!(store.mark_borrowed(book.id, user.id, until).await.unwrap());
    // A second borrow loses.
    assert!(!store.mark_borrowed(book.id, user.id, until).await.unwrap());

    let lent = store.get_book(book.id).await.unwrap().unwrap();
    assert_eq!(lent.borrowed_by, Some(user.id));
    assert_eq!(lent.until, Some(until));

    let holder = store.get_user(user.id).await.unwrap().unwrap();
    assert_eq!(holder.borrowed_books, vec![book.id]);

    let loans = store
        .list_loans(LoanFilter::borrowed_by(user.id))
        .await
        .unwrap();
    assert_eq!(loans.len(), 1);
    assert_eq!(loans[0].borrower_email, "bbbb@bbbbbb.com");

    // Only the holder can return it.
    let other = store
        .create_user(User::new("User1", "aaaa@aaa.com"))
        .await
        .unwrap();
    assert!(!store.mark_returned(book.id, other.id).await.unwrap());
    assert!(store.mark_returned(book.id, user.id).await.unwrap());

    let returned = store.get_book(book.id).await.unwrap().unwrap();
    assert!(returned.borrowed_by.is_none());
    assert!(returned.until.is_none());
    let holder = store.get_user(user.id).await.unwrap().unwrap();
    assert!(holder.borrowed_books.is_empty());
}

pub async fn loans_due_within_window<S: BookStore>(store: &S) {
    let now = Utc::now().duration_trunc(Duration::seconds(1)).unwrap();
    let soon = store
        .create_user(User::new("User2", "bbbb@bbbbbb.com"))
        .await
        .unwrap();
    let later = store
        .create_user(User::new("User1", "aaaa@aaa.com"))
        .await
        .unwrap();

    store
        .create_book(Book::new("Book1").with_loan(later.id, now + Duration::days(14)))
        .await
        .unwrap();
    store
        .create_book(Book::new("Book2").with_loan(soon.id, now + Duration::hours(20)))
        .await
        .unwrap();
    store
        .create_book(Book::new("Overdue").with_loan(later.id, now - Duration::hours(1)))
        .await
        .unwrap();
    store.create_book(Book::new("Book3")).await.unwrap();

    let window = DueWindow::new(now, now + Duration::days(1));
    let loans = store.list_loans(LoanFilter::due_within(window)).await.unwrap();

    assert_eq!(loans.len(), 1);
    assert_eq!(loans[0].book.name, "Book2");
    assert_eq!(loans[0].borrower_id, soon.id);
    assert_eq!(loans[0].borrower_email, "bbbb@bbbbbb.com");

    let all = store.list_loans(LoanFilter::default()).await.unwrap();
    let names: Vec<_> = all.iter().map(|loan| loan.book.name.as_str()).collect();
    assert_eq!(names, vec!["Overdue", "Book2", "Book1"]);
}

pub async fn user_with_books_cannot_be_deleted<S: BookStore>(store: &S) {
    let user = store
        .create_user(User::new("User1", "aaaa@aaa.com"))
        .await
        .unwrap();
    let book = store
        .create_book(Book::new("Book1").with_loan(user.id, Utc::now() + Duration::days(3)))
        .await
        .unwrap();

    assert!(matches!(
        store.delete_user(user.id).await,
        Err(BookStoreError::ForeignKeyViolation(_))
    ));

    assert_ok!(store.delete_book(book.id).await);
    assert_ok!(store.delete_user(user.id).await);
    assert_eq!(store.count_users().await.unwrap(), 0);
}

pub async fn due_window_edges<S: BookStore>(store: &S) {
    let now = Utc::now().duration_trunc(Duration::seconds(1)).unwrap();
    let user = store
        .create_user(User::new("User1", "aaaa@aaa.com"))
        .await
        .unwrap();

    for (name, due) in [
        ("AtStart", now),
        ("AtEnd", now + Duration::days(1)),
        ("PastEnd", now + Duration::days(1) + Duration::seconds(1)),
        ("JustAfter", now + Duration::seconds(1)),
    ] {
        assert_ok!(store.create_book(Book::new(name).with_loan(user.id, due)).await);
    }

    let window = DueWindow::new(now, now + Duration::days(1));
    let loans = store.list_loans(LoanFilter::due_within(window)).await.unwrap();

    let names: Vec<_> = loans.iter().map(|loan| loan.book.name.as_str()).collect();
    assert_eq!(names, vec!["JustAfter", "AtEnd"]);
}
