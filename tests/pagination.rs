mod common;

use common::*;
use ming800_scraper::error::{AppError, ClientError, WalkError};
use ming800_scraper::scraper::records::parse_student_row;
use ming800_scraper::walker::{Listing, PageCount, PaginationWalker};
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn names(students: &[ming800_scraper::Student]) -> Vec<&str> {
    students.iter().map(|s| s.name.as_str()).collect()
}

#[tokio::test]
async fn walks_every_page_in_order() {
    let server = Arc::new(FakeServer::new());
    server
        .page(
            student_list_key("7", 1),
            student_listing(&[("1", "Alice", "13500000001"), ("2", "Bob", "13500000002")], Some(3)),
        )
        .page(
            student_list_key("7", 2),
            student_listing(&[("3", "Carol", "13500000003")], Some(3)),
        )
        .page(
            student_list_key("7", 3),
            student_listing(&[("4", "Dave", "13500000004")], Some(3)),
        );

    let session = logged_in(&server).await;
    let students = PaginationWalker::new(&session, Listing::students_of_class("7"), parse_student_row)
        .collect()
        .await
        .unwrap();

    assert_eq!(names(&students), vec!["Alice", "Bob", "Carol", "Dave"]);
    assert_eq!(
        server.requests(),
        vec![
            student_list_key("7", 1),
            student_list_key("7", 2),
            student_list_key("7", 3)
        ]
    );
}

#[tokio::test]
async fn yields_one_batch_per_page() {
    let server = Arc::new(FakeServer::new());
    server
        .page(
            student_list_key("7", 1),
            student_listing(&[("1", "Alice", "13500000001")], Some(2)),
        )
        .page(
            student_list_key("7", 2),
            student_listing(&[("2", "Bob", "13500000002")], Some(2)),
        );

    let session = logged_in(&server).await;
    let mut pages = PaginationWalker::new(&session, Listing::students_of_class("7"), parse_student_row);

    assert_eq!(names(&pages.next_page().await.unwrap().unwrap()), vec!["Alice"]);
    assert_eq!(pages.total_pages(), 2);
    assert_eq!(names(&pages.next_page().await.unwrap().unwrap()), vec!["Bob"]);
    assert!(pages.next_page().await.unwrap().is_none());
}

#[tokio::test]
async fn page_without_marker_is_a_single_page() {
    let server = Arc::new(FakeServer::new());
    server.page(
        student_list_key("7", 1),
        student_listing(&[("1", "Alice", "13500000001")], None),
    );

    let session = logged_in(&server).await;
    let students = PaginationWalker::new(&session, Listing::students_of_class("7"), parse_student_row)
        .collect()
        .await
        .unwrap();

    assert_eq!(names(&students), vec!["Alice"]);
    assert_eq!(server.requests().len(), 1);
}

#[tokio::test]
async fn empty_listing_yields_no_rows() {
    let server = Arc::new(FakeServer::new());
    server.page(student_list_key("7", 1), student_listing(&[], None));

    let session = logged_in(&server).await;
    let students = PaginationWalker::new(&session, Listing::students_of_class("7"), parse_student_row)
        .collect()
        .await
        .unwrap();

    assert!(students.is_empty());
}

#[tokio::test]
async fn failed_page_carries_listing_and_page_number() {
    let server = Arc::new(FakeServer::new());
    server
        .page(
            student_list_key("7", 1),
            student_listing(&[("1", "Alice", "13500000001")], Some(3)),
        )
        .route(student_list_key("7", 2), Route::Status(500));

    let session = logged_in(&server).await;
    let err = PaginationWalker::new(&session, Listing::students_of_class("7"), parse_student_row)
        .collect()
        .await
        .unwrap_err();

    match err {
        AppError::Walk(WalkError::Page { listing, page, source }) => {
            assert!(listing.contains("liststudentbyclazzinstance"));
            assert_eq!(page, 2);
            assert!(matches!(
                *source,
                AppError::Client(ClientError::ResponseError { status_code: 500, .. })
            ));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(server.requests().len(), 2);
}

#[tokio::test]
async fn unparsable_row_names_its_position() {
    let server = Arc::new(FakeServer::new());
    server.page(
        student_list_key("7", 1),
        "<table><tr><th>姓名</th><th>电话</th></tr><tr><td>no link</td><td>1</td></tr></table>",
    );

    let session = logged_in(&server).await;
    let err = PaginationWalker::new(&session, Listing::students_of_class("7"), parse_student_row)
        .collect()
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        AppError::Walk(WalkError::Row { page: 1, row: 1, .. })
    ));
}

#[tokio::test]
async fn page_count_is_read_once_unless_asked_otherwise() {
    let server = Arc::new(FakeServer::new());
    // The listing grows while it is walked.
    server
        .page(
            student_list_key("7", 1),
            student_listing(&[("1", "Alice", "13500000001")], Some(2)),
        )
        .page(
            student_list_key("7", 2),
            student_listing(&[("2", "Bob", "13500000002")], Some(3)),
        )
        .page(
            student_list_key("7", 3),
            student_listing(&[("3", "Carol", "13500000003")], Some(3)),
        );

    let session = logged_in(&server).await;

    let first_page_only =
        PaginationWalker::new(&session, Listing::students_of_class("7"), parse_student_row)
            .collect()
            .await
            .unwrap();
    assert_eq!(names(&first_page_only), vec!["Alice", "Bob"]);

    let every_page = PaginationWalker::new(&session, Listing::students_of_class("7"), parse_student_row)
        .with_policy(PageCount::EveryPage)
        .collect()
        .await
        .unwrap();
    assert_eq!(names(&every_page), vec!["Alice", "Bob", "Carol"]);
}
