//! Integration tests for the SeaORM repository over in-memory SQLite

mod common;

use common::{print_test_header, seeded_songs, song, song_repository, titles, SEED_COUNT};
use serde_json::json;
use service_repository::{
    ConfigurationError, FilterNode, Operator, PageRequest, PaginationError, PerPage, Repository,
    SortDirective,
};

fn criteria(value: serde_json::Value) -> FilterNode {
    FilterNode::from_json(&value).unwrap()
}

fn song_titles(items: &[song::Model]) -> Vec<String> {
    titles(items, |s| s.title.as_str())
}

#[tokio::test]
async fn test_create_assigns_id_and_keeps_fields() {
    print_test_header(
        "test_create_assigns_id_and_keeps_fields",
        &["Create returns the stored row with its generated key"],
    );
    let repo = song_repository().await;

    let song = repo
        .create(json!({"title": "Song title 1", "is_active": true}))
        .await
        .unwrap();

    assert!(song.id > 0);
    assert_eq!(song.title, "Song title 1");
    assert!(song.is_active);
    assert_eq!(repo.count(None).await.unwrap(), 1);
}

#[tokio::test]
async fn test_create_rejects_non_object() {
    let repo = song_repository().await;

    let err = repo.create(json!(["Song title 1"])).await.unwrap_err();

    assert!(err.downcast_ref::<service_repository::InvalidData>().is_some());
}

#[tokio::test]
async fn test_update_overwrites_known_fields_only() {
    print_test_header(
        "test_update_overwrites_known_fields_only",
        &["Update applies known keys and ignores unknown ones"],
    );
    let repo = song_repository().await;
    let song = repo
        .create(json!({"title": "Song title 1", "is_active": true}))
        .await
        .unwrap();

    let updated = repo
        .update(
            &song,
            json!({"title": "Song title 2", "is_active": false, "genre": "jazz"}),
        )
        .await
        .unwrap();

    assert_eq!(updated.id, song.id);
    assert_eq!(updated.title, "Song title 2");
    assert!(!updated.is_active);

    let stored = repo.get(&FilterNode::eq("id", song.id)).await.unwrap();
    assert_eq!(stored, Some(updated));
}

#[tokio::test]
async fn test_get_and_delete() {
    let repo = seeded_songs().await;

    let found = repo
        .get(&FilterNode::eq("title", "Song title 4"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.title, "Song title 4");

    assert!(repo.delete(&FilterNode::eq("id", found.id)).await.unwrap());
    assert!(repo
        .get(&FilterNode::eq("id", found.id))
        .await
        .unwrap()
        .is_none());
    assert!(!repo.delete(&FilterNode::eq("id", found.id)).await.unwrap());
    assert_eq!(repo.count(None).await.unwrap(), SEED_COUNT as u64 - 1);
}

#[tokio::test]
async fn test_ilike_exact_pattern_matches_one_row() {
    print_test_header(
        "test_ilike_exact_pattern_matches_one_row",
        &[
            "ilike without wildcards is a case-insensitive exact match",
            "'Song title 1' must not match 'Song title 10'..'14'",
        ],
    );
    let repo = seeded_songs().await;

    let filter = criteria(json!({"field": "title", "op": "ilike", "value": "Song title 1"}));
    let page = repo
        .paginate(&PageRequest::default().with_filter(filter))
        .await
        .unwrap();

    assert_eq!(page.total, 1);
    assert_eq!(song_titles(&page.items), vec!["Song title 1"]);
}

#[tokio::test]
async fn test_ilike_wildcard_is_case_insensitive() {
    let repo = seeded_songs().await;

    let filter = criteria(json!({"field": "title", "op": "ilike", "value": "SONG TITLE 1%"}));
    assert_eq!(repo.count(Some(&filter)).await.unwrap(), 6);
}

#[tokio::test]
async fn test_or_with_sort_direction() {
    print_test_header(
        "test_or_with_sort_direction",
        &["OR of two titles, first row depends on the sort direction"],
    );
    let repo = seeded_songs().await;
    let filter = criteria(json!({"or": [
        {"field": "title", "op": "eq", "value": "Song title 2"},
        {"field": "title", "op": "eq", "value": "Song title 3"},
    ]}));

    let asc = repo
        .paginate(
            &PageRequest::default()
                .with_filter(filter.clone())
                .with_sort(vec![SortDirective::asc("title")]),
        )
        .await
        .unwrap();
    assert_eq!(asc.total, 2);
    assert_eq!(asc.items[0].title, "Song title 2");

    let desc = repo
        .paginate(
            &PageRequest::default()
                .with_filter(filter)
                .with_sort(vec![SortDirective::desc("title")]),
        )
        .await
        .unwrap();
    assert_eq!(desc.total, 2);
    assert_eq!(desc.items[0].title, "Song title 3");
}

#[tokio::test]
async fn test_and_is_intersection_or_is_union() {
    let repo = seeded_songs().await;
    let active = criteria(json!({"field": "is_active", "op": "eq", "value": true}));
    let low = criteria(json!({"field": "id", "op": "lte", "value": 4}));

    let both = FilterNode::and(vec![active.clone(), low.clone()]).unwrap();
    let either = FilterNode::or(vec![active.clone(), low.clone()]).unwrap();

    // ids 1..=15, active rows are "Song title 0", "2", ... (odd ids)
    assert_eq!(repo.count(Some(&active)).await.unwrap(), 8);
    assert_eq!(repo.count(Some(&low)).await.unwrap(), 4);
    assert_eq!(repo.count(Some(&both)).await.unwrap(), 2);
    assert_eq!(repo.count(Some(&either)).await.unwrap(), 10);
}

#[tokio::test]
async fn test_implicit_and_list() {
    let repo = seeded_songs().await;
    let filter = criteria(json!([
        {"field": "id", "op": "gt", "value": 3},
        {"field": "id", "op": "lt", "value": 7},
        {"field": "title", "op": "ne", "value": "Song title 4"},
    ]));

    let page = repo
        .paginate(
            &PageRequest::default()
                .with_filter(filter)
                .with_sort(vec![SortDirective::asc("id")]),
        )
        .await
        .unwrap();

    assert_eq!(song_titles(&page.items), vec!["Song title 3", "Song title 5"]);
}

#[tokio::test]
async fn test_membership_operators() {
    let repo = seeded_songs().await;
    let listed = FilterNode::leaf(
        "title",
        Operator::In,
        vec!["Song title 1", "Song title 7", "missing"],
    )
    .unwrap();
    let unlisted = FilterNode::leaf("id", Operator::NotIn, vec![1, 2, 3]).unwrap();

    assert_eq!(repo.count(Some(&listed)).await.unwrap(), 2);
    assert_eq!(repo.count(Some(&unlisted)).await.unwrap(), 12);
}

#[tokio::test]
async fn test_sort_orders() {
    let repo = seeded_songs().await;
    let all = PageRequest::default().with_per_page(PerPage::All);

    let unsorted = repo.paginate(&all).await.unwrap();
    let asc = repo
        .paginate(&all.clone().with_sort(vec![SortDirective::asc("id")]))
        .await
        .unwrap();
    let desc = repo
        .paginate(&all.clone().with_sort(vec![SortDirective::desc("id")]))
        .await
        .unwrap();

    assert_eq!(unsorted.items.len(), SEED_COUNT);
    assert_eq!(asc.items, unsorted.items);
    let mut reversed = asc.items.clone();
    reversed.reverse();
    assert_eq!(desc.items, reversed);
}

#[tokio::test]
async fn test_multi_key_sort() {
    let repo = seeded_songs().await;
    let request = PageRequest::new(1)
        .with_per_page(PerPage::Limit(4))
        .with_sort(vec![SortDirective::asc("is_active"), SortDirective::desc("id")]);

    let page = repo.paginate(&request).await.unwrap();

    // inactive first, newest first within each group
    assert_eq!(
        song_titles(&page.items),
        vec!["Song title 13", "Song title 11", "Song title 9", "Song title 7"]
    );
}

#[tokio::test]
async fn test_unknown_field_is_configuration_error() {
    print_test_header(
        "test_unknown_field_is_configuration_error",
        &["Criteria and sort naming missing attributes fail before the query runs"],
    );
    let repo = seeded_songs().await;

    let err = repo
        .get(&FilterNode::eq("genre", "jazz"))
        .await
        .unwrap_err();
    assert_eq!(
        err.downcast_ref::<ConfigurationError>(),
        Some(&ConfigurationError::UnknownField {
            entity: "songs".to_string(),
            field: "genre".to_string(),
        })
    );

    let err = repo
        .paginate(&PageRequest::default().with_sort(vec![SortDirective::asc("genre")]))
        .await
        .unwrap_err();
    assert!(err.downcast_ref::<ConfigurationError>().is_some());
}

#[tokio::test]
async fn test_pagination_window() {
    print_test_header(
        "test_pagination_window",
        &["Page size is clamped, page counts round up, -1 returns every row"],
    );
    let repo = seeded_songs().await;
    let by_id = vec![SortDirective::asc("id")];

    let second = repo
        .paginate(
            &PageRequest::new(2)
                .with_per_page(PerPage::Limit(4))
                .with_sort(by_id.clone()),
        )
        .await
        .unwrap();
    assert_eq!(second.page, 2);
    assert_eq!(second.per_page, Some(4));
    assert_eq!(second.num_pages, 4);
    assert_eq!(second.total, 15);
    assert_eq!(song_titles(&second.items)[0], "Song title 4");

    let last = repo
        .paginate(
            &PageRequest::new(4)
                .with_per_page(PerPage::Limit(4))
                .with_sort(by_id.clone()),
        )
        .await
        .unwrap();
    assert_eq!(last.items.len(), 3);

    let beyond = repo
        .paginate(&PageRequest::new(9).with_per_page(PerPage::Limit(4)))
        .await
        .unwrap();
    assert!(beyond.items.is_empty());
    assert_eq!(beyond.total, 15);

    let everything = repo
        .paginate(&PageRequest::new(3).with_per_page(PerPage::All))
        .await
        .unwrap();
    assert_eq!(everything.items.len(), SEED_COUNT);
    assert_eq!(everything.page, 1);
    assert_eq!(everything.num_pages, 1);
    assert_eq!(everything.per_page, None);

    let clamped = repo
        .paginate(&PageRequest::new(1).with_per_page(PerPage::Limit(1_000)))
        .await
        .unwrap();
    assert_eq!(clamped.per_page, Some(100));
    assert_eq!(clamped.items.len(), SEED_COUNT);

    let defaulted = repo.paginate(&PageRequest::default()).await.unwrap();
    assert_eq!(defaulted.per_page, Some(15));
}

#[tokio::test]
async fn test_page_zero_is_rejected() {
    let repo = seeded_songs().await;

    let err = repo.paginate(&PageRequest::new(0)).await.unwrap_err();

    assert_eq!(
        err.downcast_ref::<PaginationError>(),
        Some(&PaginationError::InvalidPage(0))
    );
}

#[tokio::test]
async fn test_create_without_key_uses_generated_ids() {
    print_test_header(
        "test_create_without_key_uses_generated_ids",
        &["Payloads without the auto-increment key are inserted with database ids"],
    );
    let repo = song_repository().await;

    let first = repo.create(json!({"title": "First", "is_active": true})).await.unwrap();
    let second = repo.create(json!({"title": "Second", "is_active": false})).await.unwrap();

    assert_eq!(first.id, 1);
    assert_eq!(second.id, 2);
    assert_eq!(
        repo.get(&FilterNode::eq("id", 2)).await.unwrap(),
        Some(second)
    );
}

#[tokio::test]
async fn test_create_with_mistyped_field_is_invalid() {
    let repo = song_repository().await;

    let err = repo
        .create(json!({"title": 42, "is_active": true}))
        .await
        .unwrap_err();

    assert!(err.downcast_ref::<service_repository::InvalidData>().is_some());
    assert_eq!(repo.count(None).await.unwrap(), 0);
}

#[tokio::test]
async fn test_like_is_case_sensitive() {
    print_test_header(
        "test_like_is_case_sensitive",
        &["like matches case exactly, ilike ignores case"],
    );
    let repo = seeded_songs().await;
    let like = |pattern: &str| criteria(json!({"field": "title", "op": "like", "value": pattern}));

    assert_eq!(repo.count(Some(&like("song TITLE 1"))).await.unwrap(), 0);
    assert_eq!(repo.count(Some(&like("Song title 1"))).await.unwrap(), 1);
    assert_eq!(repo.count(Some(&like("Song title 1_"))).await.unwrap(), 5);
    assert_eq!(repo.count(Some(&like("Song title 1%"))).await.unwrap(), 6);
    assert_eq!(repo.count(Some(&like("song title%"))).await.unwrap(), 0);

    let ilike = criteria(json!({"field": "title", "op": "ilike", "value": "song TITLE 1"}));
    assert_eq!(repo.count(Some(&ilike)).await.unwrap(), 1);
}

#[tokio::test]
async fn test_all_rows_page_with_filter_and_sort() {
    let repo = seeded_songs().await;
    let request = PageRequest::new(1)
        .with_per_page(PerPage::All)
        .with_filter(criteria(json!({"field": "is_active", "op": "eq", "value": false})))
        .with_sort(vec![SortDirective::desc("id")]);

    let page = repo.paginate(&request).await.unwrap();

    assert_eq!(page.total, 7);
    assert_eq!(page.items.len(), 7);
    assert_eq!(page.per_page, None);
    assert_eq!(page.num_pages, 1);
    assert_eq!(page.items[0].title, "Song title 13");
    assert_eq!(page.items[6].title, "Song title 1");
}
