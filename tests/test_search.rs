use futures::StreamExt;
use mockito::{Matcher, Server};
use nutrition_scrape::{ContentType, NutritionScraper, SearchEvent, SearchHit};
use std::time::Duration;

const AUTOCOMPLETE_PATH: &str = "/autocomplete/foodstuff-activity-meal";

fn scraper(base_url: &str, retry_attempts: u32) -> NutritionScraper {
    NutritionScraper::builder()
        .base_url(base_url)
        .retry_attempts(retry_attempts)
        .retry_delay(Duration::ZERO)
        .image_lookup_delay(Duration::ZERO)
        .build()
        .unwrap()
}

async fn collect(scraper: &NutritionScraper, query: &str) -> Vec<SearchEvent> {
    scraper.search(query).collect().await
}

#[tokio::test]
async fn test_empty_autocomplete_yields_no_lines() {
    let mut server = Server::new_async().await;
    let autocomplete = server
        .mock("GET", AUTOCOMPLETE_PATH)
        .match_query(Matcher::UrlEncoded("query".into(), "xyzzy".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("[]")
        .create_async()
        .await;

    let events = collect(&scraper(&server.url(), 3), "xyzzy").await;

    autocomplete.assert_async().await;
    assert!(events.is_empty());
}

#[tokio::test]
async fn test_non_list_payload_yields_single_error_line() {
    let mut server = Server::new_async().await;
    let _autocomplete = server
        .mock("GET", AUTOCOMPLETE_PATH)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"title": "Rajče", "value": 18}"#)
        .create_async()
        .await;

    let events = collect(&scraper(&server.url(), 3), "rajce").await;

    assert_eq!(events.len(), 1);
    let line = events[0].to_line();
    let json: serde_json::Value = serde_json::from_str(line.trim_end()).unwrap();
    assert!(json["error"].as_str().unwrap().contains("not a list"));
    assert_eq!(json.as_object().unwrap().len(), 1);
}

#[tokio::test]
async fn test_hits_with_and_without_images() {
    let mut server = Server::new_async().await;
    let _autocomplete = server
        .mock("GET", AUTOCOMPLETE_PATH)
        .match_query(Matcher::UrlEncoded("query".into(), "rajčatová".into()))
        .with_status(200)
        .with_body(
            r#"[
                {"title": "Rajčatová polévka", "value": "32", "hasImage": true, "url": "rajcatova-polevka"},
                {"title": "Rajčatový protlak", "value": 82, "hasImage": false, "url": "rajcatovy-protlak"},
                {"value": null, "hasImage": true}
            ]"#,
        )
        .create_async()
        .await;
    let _recipe = server
        .mock("GET", "/recepty/rajcatova-polevka")
        .with_status(200)
        .with_body(
            r#"<html><body>
                <img src="/images/logo.svg">
                <img src="/file/image/recepty/rajcatova-polevka.jpg">
            </body></html>"#,
        )
        .create_async()
        .await;

    let events = collect(&scraper(&server.url(), 3), "rajčatová").await;

    assert_eq!(
        events,
        vec![
            SearchEvent::Hit(SearchHit {
                name: "Rajčatová polévka".to_string(),
                calories: "32 kcal/100 ml".to_string(),
                image_url: Some(format!(
                    "{}/file/image/recepty/rajcatova-polevka.jpg?w=100",
                    server.url()
                )),
                slug: Some("rajcatova-polevka".to_string()),
                food_type: Some(ContentType::Recipe),
            }),
            SearchEvent::Hit(SearchHit {
                name: "Rajčatový protlak".to_string(),
                calories: "82 kcal/100 g".to_string(),
                image_url: None,
                slug: Some("rajcatovy-protlak".to_string()),
                food_type: None,
            }),
            SearchEvent::Hit(SearchHit {
                name: "Unknown food".to_string(),
                calories: "N/A kcal/100 g".to_string(),
                image_url: None,
                slug: None,
                food_type: None,
            }),
        ]
    );
}

#[tokio::test]
async fn test_image_lookup_falls_back_to_food_page() {
    let mut server = Server::new_async().await;
    let _autocomplete = server
        .mock("GET", AUTOCOMPLETE_PATH)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"[{"title": "Rajče", "value": 18, "hasImage": true, "url": "rajce"}]"#)
        .create_async()
        .await;
    let _recipe = server
        .mock("GET", "/recepty/rajce")
        .with_status(404)
        .create_async()
        .await;
    let _food = server
        .mock("GET", "/potraviny/rajce")
        .with_status(200)
        .with_body(r#"<img class="food" src="/file/image/potraviny/rajce.png">"#)
        .create_async()
        .await;

    let events = collect(&scraper(&server.url(), 3), "rajce").await;

    match &events[..] {
        [SearchEvent::Hit(hit)] => {
            assert_eq!(hit.food_type, Some(ContentType::FoodItem));
            assert_eq!(
                hit.image_url,
                Some(format!("{}/file/image/potraviny/rajce.png?w=100", server.url()))
            );
        }
        other => panic!("unexpected events: {other:?}"),
    }
}

#[tokio::test]
async fn test_autocomplete_is_retried_a_bounded_number_of_times() {
    let mut server = Server::new_async().await;
    let autocomplete = server
        .mock("GET", AUTOCOMPLETE_PATH)
        .match_query(Matcher::Any)
        .with_status(503)
        .expect(2)
        .create_async()
        .await;

    let events = collect(&scraper(&server.url(), 2), "rajce").await;

    autocomplete.assert_async().await;
    assert_eq!(events.len(), 1);
    assert!(matches!(&events[0], SearchEvent::Error { error } if error.contains("503")));
}

#[tokio::test]
async fn test_hit_line_shape() {
    let hit = SearchEvent::Hit(SearchHit {
        name: "Mléko".to_string(),
        calories: "47 kcal/100 ml".to_string(),
        image_url: None,
        slug: Some("mleko".to_string()),
        food_type: None,
    });
    let line = hit.to_line();
    assert!(line.ends_with('\n'));

    let json: serde_json::Value = serde_json::from_str(line.trim_end()).unwrap();
    assert_eq!(json["name"], "Mléko");
    assert_eq!(json["calories"], "47 kcal/100 ml");
    assert!(json["image_url"].is_null());
    assert!(json["food_type"].is_null());
}
