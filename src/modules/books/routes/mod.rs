//! HTTP handlers for the books module.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use catalog_http::error::AppError;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::Mutex;

use super::error::LibraryError;
use super::library::Library;
use super::models::{Book, BookRecord, NewBook};
use super::notice::Notice;

/// The one library instance, shared by all handlers.
pub type SharedLibrary = Arc<Mutex<Library>>;

/// Query string of the listing endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: Option<String>,
}

/// Response of every state-changing endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct BookResponse {
    pub notice: Notice,
    pub book: BookRecord,
}

impl BookResponse {
    fn new(notice: Notice, book: &Book) -> Self {
        Self {
            notice,
            book: book.to_record(),
        }
    }
}

pub fn router(library: SharedLibrary) -> Router {
    Router::new()
        .route("/", get(list_books).post(add_book))
        .route("/{isbn}", get(get_book).delete(delete_book))
        .route("/{isbn}/borrow", post(borrow_book))
        .route("/{isbn}/return", post(return_book))
        .with_state(library)
}

/// List books, optionally filtered by `?q=`
async fn list_books(
    State(library): State<SharedLibrary>,
    Query(params): Query<SearchParams>,
) -> Json<Vec<BookRecord>> {
    let library = library.lock().await;
    let query = params.q.unwrap_or_default();
    let records = library
        .search(&query)
        .into_iter()
        .map(Book::to_record)
        .collect::<Vec<_>>();

    tracing::debug!(query = %query, results = records.len(), "books listed");
    Json(records)
}

async fn add_book(
    State(library): State<SharedLibrary>,
    input: Result<Json<NewBook>, JsonRejection>,
) -> Result<(StatusCode, Json<BookResponse>), AppError> {
    let Json(input) = input?;

    // Required fields are reported first; a quantity that was given must read as >= 1
    let quantity_given_invalid = input.quantity.as_ref().is_some_and(|q| !q.is_valid());
    let book = Book::new(input)?;
    if quantity_given_invalid {
        return Err(AppError::validation(
            vec![json!({ "field": "quantity", "error": "invalid" })],
            Notice::invalid_quantity().message,
        ));
    }
    let outcome = library.lock().await.add_book(book)?;

    let status = if outcome.updated {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((
        status,
        Json(BookResponse::new(Notice::added(&outcome), &outcome.book)),
    ))
}

async fn get_book(
    State(library): State<SharedLibrary>,
    Path(isbn): Path<String>,
) -> Result<Json<BookRecord>, AppError> {
    let library = library.lock().await;
    let book = library
        .find_by_isbn(&isbn)
        .ok_or(LibraryError::NotFound { isbn })?;
    Ok(Json(book.to_record()))
}

async fn delete_book(
    State(library): State<SharedLibrary>,
    Path(isbn): Path<String>,
) -> Result<Json<BookResponse>, AppError> {
    let removed = library.lock().await.delete_by_isbn(&isbn)?;
    Ok(Json(BookResponse::new(Notice::deleted(&removed), &removed)))
}

async fn borrow_book(
    State(library): State<SharedLibrary>,
    Path(isbn): Path<String>,
) -> Result<Json<BookResponse>, AppError> {
    let book = library.lock().await.borrow_by_isbn(&isbn)?;
    Ok(Json(BookResponse::new(Notice::borrowed(&book), &book)))
}

async fn return_book(
    State(library): State<SharedLibrary>,
    Path(isbn): Path<String>,
) -> Result<Json<BookResponse>, AppError> {
    let book = library.lock().await.return_by_isbn(&isbn)?;
    Ok(Json(BookResponse::new(Notice::returned(&book), &book)))
}

impl From<LibraryError> for AppError {
    fn from(error: LibraryError) -> Self {
        let notice = Notice::from(&error);
        match error {
            LibraryError::Validation { missing } => AppError::validation(
                missing
                    .iter()
                    .map(|field| json!({ "field": field, "error": "required" }))
                    .collect(),
                notice.message,
            ),
            LibraryError::NotFound { .. } => AppError::not_found(notice.message),
            LibraryError::Unavailable { isbn, title } => AppError::conflict(
                "unavailable",
                vec![json!({ "isbn": isbn, "title": title })],
                notice.message,
            ),
            LibraryError::NothingToReturn { isbn, title } => AppError::conflict(
                "nothing_to_return",
                vec![json!({ "isbn": isbn, "title": title })],
                notice.message,
            ),
            LibraryError::Storage(e) => {
                AppError::Internal(anyhow::Error::new(e).context(notice.message))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::books::storage::MemorySlotStore;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request},
        response::Response,
    };
    use tower::ServiceExt;

    fn app() -> Router {
        let library = Library::new(None, MemorySlotStore::new());
        router(Arc::new(Mutex::new(library)))
    }

    fn request(method: Method, uri: &str, body: Option<serde_json::Value>) -> Request<Body> {
        let builder = Request::builder().method(method).uri(uri);
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn send(app: &Router, req: Request<Body>) -> Response {
        app.clone().oneshot(req).await.unwrap()
    }

    fn hobbit(quantity: u32) -> serde_json::Value {
        hobbit_with(json!(quantity))
    }

    fn hobbit_with(quantity: serde_json::Value) -> serde_json::Value {
        json!({
            "title": "The Hobbit",
            "author": "J.R.R. Tolkien",
            "isbn": "111",
            "genre": "Fantasy",
            "quantity": quantity
        })
    }

    #[tokio::test]
    async fn add_then_merge_reports_status_and_notice() {
        let app = app();

        let response = send(&app, request(Method::POST, "/", Some(hobbit(2)))).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = json_body(response).await;
        assert_eq!(body["notice"]["title"], "Book Added!");
        assert_eq!(body["book"]["availableCopies"], 2);

        let response = send(&app, request(Method::POST, "/", Some(hobbit(3)))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["notice"]["title"], "Book Updated");
        assert_eq!(body["book"]["quantity"], 5);
    }

    #[tokio::test]
    async fn missing_fields_are_unprocessable() {
        let app = app();

        let response = send(
            &app,
            request(Method::POST, "/", Some(json!({ "title": "Untitled" }))),
        )
        .await;

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "validation_error");
        assert_eq!(body["error"]["details"][0]["field"], "author");
        assert_eq!(body["error"]["details"][1]["field"], "isbn");
    }

    #[tokio::test]
    async fn numeric_publication_year_is_accepted() {
        let app = app();

        let response = send(
            &app,
            request(
                Method::POST,
                "/",
                Some(json!({
                    "title": "Dune",
                    "author": "Frank Herbert",
                    "isbn": "222",
                    "publicationYear": 1965
                })),
            ),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(json_body(response).await["book"]["publicationYear"], "1965");
    }

    #[tokio::test]
    async fn malformed_bodies_get_the_error_envelope() {
        let app = app();

        let response = send(
            &app,
            request(
                Method::POST,
                "/",
                Some(json!({ "title": "Dune", "publicationYear": [1965] })),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json_body(response).await["error"]["code"], "validation_error");

        let response = send(
            &app,
            Request::builder()
                .method(Method::POST)
                .uri("/")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{\"title\": "))
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"]["code"], "bad_request");
    }

    #[tokio::test]
    async fn given_quantity_must_be_at_least_one() {
        let app = app();

        for quantity in [json!("abc"), json!(0), json!(-2)] {
            let response = send(&app, request(Method::POST, "/", Some(hobbit_with(quantity)))).await;
            assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
            let body = json_body(response).await;
            assert_eq!(
                body["error"]["message"],
                "Quantity must be a valid number and at least 1."
            );
            assert_eq!(body["error"]["details"][0]["field"], "quantity");
        }

        let listing = json_body(send(&app, request(Method::GET, "/", None)).await).await;
        assert!(listing.as_array().unwrap().is_empty());

        let response = send(&app, request(Method::POST, "/", Some(hobbit_with(json!("2 copies"))))).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(json_body(response).await["book"]["quantity"], 2);
    }

    #[tokio::test]
    async fn isbn_named_like_a_route_is_still_a_book() {
        let app = app();
        send(
            &app,
            request(
                Method::POST,
                "/",
                Some(json!({ "title": "Field Guide", "author": "Anon", "isbn": "health" })),
            ),
        )
        .await;

        let response = send(&app, request(Method::GET, "/health", None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["title"], "Field Guide");
    }

    #[tokio::test]
    async fn borrow_until_unavailable_then_return() {
        let app = app();
        send(&app, request(Method::POST, "/", Some(hobbit(1)))).await;

        let response = send(&app, request(Method::POST, "/111/borrow", None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["book"]["availableCopies"], 0);

        let response = send(&app, request(Method::POST, "/111/borrow", None)).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(json_body(response).await["error"]["code"], "unavailable");

        let response = send(&app, request(Method::POST, "/111/return", None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await["notice"]["title"],
            "Book Returned"
        );

        let response = send(&app, request(Method::POST, "/111/return", None)).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(
            json_body(response).await["error"]["code"],
            "nothing_to_return"
        );
    }

    #[tokio::test]
    async fn unknown_isbn_is_not_found() {
        let app = app();

        for req in [
            request(Method::GET, "/404", None),
            request(Method::DELETE, "/404", None),
            request(Method::POST, "/404/borrow", None),
        ] {
            let response = send(&app, req).await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
        }
    }

    #[tokio::test]
    async fn search_filters_listing() {
        let app = app();
        send(&app, request(Method::POST, "/", Some(hobbit(1)))).await;
        send(
            &app,
            request(
                Method::POST,
                "/",
                Some(json!({ "title": "Dune", "author": "Frank Herbert", "isbn": "222" })),
            ),
        )
        .await;

        let all = json_body(send(&app, request(Method::GET, "/", None)).await).await;
        assert_eq!(all.as_array().unwrap().len(), 2);

        let found = json_body(send(&app, request(Method::GET, "/?q=HERBERT", None)).await).await;
        assert_eq!(found.as_array().unwrap().len(), 1);
        assert_eq!(found[0]["isbn"], "222");
        assert_eq!(found[0]["genre"], "N/A");
    }

    #[tokio::test]
    async fn delete_removes_book() {
        let app = app();
        send(&app, request(Method::POST, "/", Some(hobbit(1)))).await;

        let response = send(&app, request(Method::DELETE, "/111", None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["notice"]["title"], "Book Deleted");

        let response = send(&app, request(Method::GET, "/111", None)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
