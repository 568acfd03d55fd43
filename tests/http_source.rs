//! Integration tests for the HTTP catalog source
//!
//! A wiremock server stands in for the PokeAPI-shaped API.

use pokedex_core::{CatalogConfig, CatalogError, CatalogSource, HttpCatalogSource};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn source_for(server: &MockServer) -> HttpCatalogSource {
    let config = CatalogConfig::default().with_base_url(server.uri());
    HttpCatalogSource::new(&config).unwrap()
}

fn pikachu_json() -> serde_json::Value {
    json!({
        "id": 25,
        "name": "pikachu",
        "height": 4,
        "weight": 60,
        "sprites": {
            "front_default": "https://img.example/25.png",
            "other": {
                "official-artwork": { "front_default": "https://img.example/artwork/25.png" }
            }
        },
        "types": [
            { "slot": 1, "type": { "name": "electric", "url": "https://pokeapi.co/api/v2/type/13/" } }
        ],
        "stats": [
            { "base_stat": 35, "effort": 0, "stat": { "name": "hp", "url": "https://pokeapi.co/api/v2/stat/1/" } },
            { "base_stat": 90, "effort": 2, "stat": { "name": "speed", "url": "https://pokeapi.co/api/v2/stat/6/" } }
        ],
        "abilities": [
            { "ability": { "name": "static", "url": "" }, "is_hidden": false, "slot": 1 },
            { "ability": { "name": "lightning-rod", "url": "" }, "is_hidden": true, "slot": 3 }
        ]
    })
}

#[tokio::test]
async fn test_fetch_entity_decodes_payload() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pokemon/25"))
        .respond_with(ResponseTemplate::new(200).set_body_json(pikachu_json()))
        .expect(1)
        .mount(&server)
        .await;

    let entity = source_for(&server).await.fetch_entity(25).await.unwrap();

    assert_eq!(entity.id, 25);
    assert_eq!(entity.name, "pikachu");
    assert_eq!(entity.sprite_url, "https://img.example/artwork/25.png");
    assert_eq!(entity.categories, vec!["electric"]);
    assert_eq!(entity.stats.len(), 2);
    assert_eq!(entity.stats[1].name, "speed");
    assert_eq!(entity.stats[1].value, 90);
    assert!(entity.traits[1].hidden);
    assert_eq!(entity.height, 4);
    assert_eq!(entity.weight, 60);
}

#[tokio::test]
async fn test_fetch_entity_by_name_lowercases() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pokemon/pikachu"))
        .respond_with(ResponseTemplate::new(200).set_body_json(pikachu_json()))
        .mount(&server)
        .await;

    let entity = source_for(&server)
        .await
        .fetch_entity_by_name(" Pikachu ")
        .await
        .unwrap();
    assert_eq!(entity.id, 25);
}

#[tokio::test]
async fn test_missing_artwork_is_empty() {
    let server = MockServer::start().await;
    let mut body = pikachu_json();
    body["sprites"] = json!({ "other": { "official-artwork": { "front_default": null } } });
    Mock::given(method("GET"))
        .and(path("/pokemon/25"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let entity = source_for(&server).await.fetch_entity(25).await.unwrap();
    assert!(entity.sprite_url.is_empty());
}

#[tokio::test]
async fn test_not_found_maps_to_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pokemon/missingno"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
        .mount(&server)
        .await;

    let err = source_for(&server)
        .await
        .fetch_entity_by_name("missingno")
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::NotFound(_)));
    assert!(!err.is_network());
}

#[tokio::test]
async fn test_server_error_maps_to_server() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pokemon/1"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let err = source_for(&server).await.fetch_entity(1).await.unwrap_err();
    match err {
        CatalogError::Server { status, ref message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "boom");
        }
        other => panic!("expected server error, got {:?}", other),
    }
    assert!(err.is_network());
}

#[tokio::test]
async fn test_malformed_body_is_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pokemon/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 1 })))
        .mount(&server)
        .await;

    let err = source_for(&server).await.fetch_entity(1).await.unwrap_err();
    assert!(matches!(err, CatalogError::Parse(_)));
}

#[tokio::test]
async fn test_fetch_directory() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pokemon"))
        .and(query_param("limit", "151"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 1302,
            "next": null,
            "previous": null,
            "results": [
                { "name": "bulbasaur", "url": "https://pokeapi.co/api/v2/pokemon/1/" },
                { "name": "ivysaur", "url": "https://pokeapi.co/api/v2/pokemon/2/" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let entries = source_for(&server).await.fetch_directory(151).await.unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].id, 1);
    assert_eq!(entries[0].name, "bulbasaur");
    assert_eq!(entries[1].id, 2);
}

#[tokio::test]
async fn test_fetch_category_extracts_member_ids() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/type/flying"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 3,
            "name": "flying",
            "pokemon": [
                { "slot": 2, "pokemon": { "name": "charizard", "url": "https://pokeapi.co/api/v2/pokemon/6/" } },
                { "slot": 2, "pokemon": { "name": "pidgey", "url": "https://pokeapi.co/api/v2/pokemon/16/" } },
                { "slot": 1, "pokemon": { "name": "tornadus", "url": "https://pokeapi.co/api/v2/pokemon/641/" } }
            ]
        })))
        .mount(&server)
        .await;

    let ids = source_for(&server).await.fetch_category("flying").await.unwrap();
    assert_eq!(ids, vec![6, 16, 641]);
}
