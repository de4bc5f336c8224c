//! PostgreSQL repository tests
//!
//! These need a live database:
//! DATABASE_URL=postgres://... cargo test --test pg_repository_tests -- --ignored
//!
//! Every test works on freshly created books tagged with a random marker, so
//! runs against a shared database do not interfere.

use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use bookreview_server::{
    models::{BookFilter, CreateBook, CreateReview, NewReview, Pagination, UpdateReview, UserClaims},
    repository::Repository,
    AppError,
};

async fn repository() -> Repository {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must point at a test database");
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .expect("Failed to connect to database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");
    Repository::new(pool)
}

fn marker() -> String {
    Uuid::new_v4().simple().to_string()
}

async fn create_book(repo: &Repository, title: &str, author: &str) -> Uuid {
    let book = repo
        .books
        .create(
            Uuid::new_v4(),
            &CreateBook {
                title: title.to_string(),
                author: author.to_string(),
                genre: None,
                description: None,
            },
        )
        .await
        .expect("Failed to create book");
    book.id
}

fn review(book_id: Uuid, user: Uuid, rating: i16) -> NewReview {
    let claims = UserClaims::new(user, Some("reader".to_string()), 1);
    NewReview::new(
        book_id,
        &claims,
        CreateReview {
            rating,
            comment: Some("fine".to_string()),
        },
    )
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_duplicate_review_is_conflict() {
    let repo = repository().await;
    let book_id = create_book(&repo, &marker(), "Herbert").await;
    let user = Uuid::new_v4();

    repo.reviews.create(&review(book_id, user, 4)).await.unwrap();
    let err = repo.reviews.create(&review(book_id, user, 2)).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)), "{err:?}");

    // The failed insert rolled back with its aggregate update
    let book = repo.books.get_by_id(book_id).await.unwrap().unwrap();
    assert_eq!((book.rating_count, book.rating_sum), (1, 4));

    let err = repo
        .reviews
        .create(&review(Uuid::new_v4(), user, 3))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BookNotFound(_)), "{err:?}");
}

#[tokio::test]
#[ignore]
async fn test_review_writes_keep_aggregate_and_id_list() {
    let repo = repository().await;
    let book_id = create_book(&repo, &marker(), "Herbert").await;

    let first = repo
        .reviews
        .create(&review(book_id, Uuid::new_v4(), 5))
        .await
        .unwrap();
    let second = repo
        .reviews
        .create(&review(book_id, Uuid::new_v4(), 2))
        .await
        .unwrap();

    let book = repo.books.get_by_id(book_id).await.unwrap().unwrap();
    assert_eq!((book.rating_count, book.rating_sum), (2, 7));
    assert_eq!(book.reviews, vec![first.id, second.id]);
    assert_eq!(book.average_rating(), 3.5);

    let patch = UpdateReview {
        rating: Some(3),
        comment: None,
    };
    let updated = repo.reviews.update(first.id, &patch).await.unwrap();
    assert_eq!(updated.rating, 3);
    assert_eq!(updated.comment.as_deref(), Some("fine"));
    let book = repo.books.get_by_id(book_id).await.unwrap().unwrap();
    assert_eq!((book.rating_count, book.rating_sum), (2, 5));

    repo.reviews.delete(second.id).await.unwrap();
    let book = repo.books.get_by_id(book_id).await.unwrap().unwrap();
    assert_eq!((book.rating_count, book.rating_sum), (1, 3));
    assert_eq!(book.reviews, vec![first.id]);

    let err = repo.reviews.delete(second.id).await.unwrap_err();
    assert!(matches!(err, AppError::ReviewNotFound(_)), "{err:?}");
    let err = repo.reviews.update(second.id, &patch).await.unwrap_err();
    assert!(matches!(err, AppError::ReviewNotFound(_)), "{err:?}");
}

#[tokio::test]
#[ignore]
async fn test_reviews_page_newest_first() {
    let repo = repository().await;
    let book_id = create_book(&repo, &marker(), "Herbert").await;

    let mut ids = Vec::new();
    for rating in [1, 2, 3] {
        let created = repo
            .reviews
            .create(&review(book_id, Uuid::new_v4(), rating))
            .await
            .unwrap();
        ids.push(created.id);
    }

    let page = repo
        .reviews
        .list_for_book(book_id, Pagination { page: 1, limit: 2 })
        .await
        .unwrap();
    let got: Vec<_> = page.iter().map(|r| r.id).collect();
    assert_eq!(got, vec![ids[2], ids[1]]);

    let page = repo
        .reviews
        .list_for_book(book_id, Pagination { page: 2, limit: 2 })
        .await
        .unwrap();
    let got: Vec<_> = page.iter().map(|r| r.id).collect();
    assert_eq!(got, vec![ids[0]]);
}

#[tokio::test]
#[ignore]
async fn test_filter_wildcards_are_literal() {
    let repo = repository().await;
    let tag = marker();

    create_book(&repo, "Percent", &format!("{tag} 100%")).await;
    create_book(&repo, "Digits", &format!("{tag} 1000")).await;
    create_book(&repo, "Underscore", &format!("{tag} a_b")).await;
    create_book(&repo, "Letter", &format!("{tag} axb")).await;

    let filter = BookFilter::new(Some(format!("{tag} 100%")), None);
    let books = repo.books.find(&filter, None).await.unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0].title, "Percent");
    assert_eq!(repo.books.count(&filter).await.unwrap(), 1);

    let filter = BookFilter::new(Some(format!("{} A_B", tag.to_uppercase())), None);
    let books = repo.books.find(&filter, None).await.unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0].title, "Underscore");

    let books = repo.books.search(&format!("{tag} a_"), 20).await.unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0].title, "Underscore");

    let filter = BookFilter::new(Some(tag.clone()), None);
    let page = repo
        .books
        .find(&filter, Some(Pagination { page: 2, limit: 3 }))
        .await
        .unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].title, "Letter");
    assert_eq!(repo.books.count(&filter).await.unwrap(), 4);
}
