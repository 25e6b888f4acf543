mod common;

use axum::Json;
use axum::Router;
use axum::extract::Path;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use common::{MockUpstream, config_for};
use opendata_upstream::Gateway;
use opendata_upstream::g0v::{
    DEFAULT_DOCUMENT_LIMIT, DateRange, DocumentFilter, SearchAllOptions,
};
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

fn press_releases() -> Value {
    json!([
        {
            "url": "/pressmeddelanden/2025/01/budget-for-forsvaret/",
            "title": "Budget för försvaret",
            "published": "2025-01-15",
            "type": "Pressmeddelande",
            "categories": ["Försvarsdepartementet"],
            "sender": "Försvarsdepartementet"
        },
        {
            "url": "/pressmeddelanden/2024/11/ny-skolplan/",
            "title": "Ny skolplan",
            "published": "2024-11-02",
            "type": "Pressmeddelande",
            "categories": []
        },
        {
            "url": "/pressmeddelanden/2024/06/budgetpropositionen/",
            "title": "Budgetpropositionen i korthet",
            "published": "2024-06-20",
            "type": "Pressmeddelande",
            "categories": [],
            "attachments": [{ "url": "/contentassets/x.pdf", "title": "Bilaga", "type": "pdf" }]
        }
    ])
}

fn g0v_app(listing_calls: Arc<AtomicUsize>) -> Router {
    Router::new()
        .route(
            "/pressmeddelanden.json",
            get(move || {
                let calls = Arc::clone(&listing_calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Json(press_releases())
                }
            }),
        )
        .route(
            "/rattsliga-dokument/{file}",
            get(|Path(file): Path<String>| async move {
                if file == "proposition.json" {
                    Json(json!([{
                        "url": "/rattsliga-dokument/proposition/2024/09/prop.-20242511/",
                        "title": "Budgetpropositionen för 2025",
                        "published": "2024-09-19",
                        "type": "Proposition",
                        "categories": []
                    }]))
                    .into_response()
                } else {
                    StatusCode::INTERNAL_SERVER_ERROR.into_response()
                }
            }),
        )
        .route(
            "/pressmeddelanden/2025/01/{file}",
            get(|Path(file): Path<String>| async move {
                if file == "budget-for-forsvaret.md" {
                    "# Budget för försvaret\n\nRegeringen föreslår...".into_response()
                } else {
                    StatusCode::NOT_FOUND.into_response()
                }
            }),
        )
        .route(
            "/api/latest_updated.json",
            get(|| async { Json(json!({ "latest_updated": "2025-01-16T04:00:00Z", "items": 123456, "codes": 42 })) }),
        )
        .route(
            "/api/codes.json",
            get(|| async { Json(json!({ "1285": "Finansdepartementet", "1286": "Försvarsdepartementet" })) }),
        )
}

#[tokio::test]
async fn listing_is_fetched_once_and_filtered_locally() -> anyhow::Result<()> {
    let calls = Arc::new(AtomicUsize::new(0));
    let server = MockUpstream::spawn(g0v_app(Arc::clone(&calls))).await?;
    let gateway = Gateway::from_config(&config_for(server.base_url(), server.base_url()))?;
    let g0v = gateway.g0v();

    let budget = g0v
        .documents(
            "pressmeddelanden",
            &DocumentFilter {
                search: Some("budget".to_string()),
                ..DocumentFilter::default()
            },
        )
        .await?;
    assert_eq!(budget.len(), 2);

    let recent = g0v
        .documents(
            "PRESSMEDDELANDEN",
            &DocumentFilter {
                date_from: Some("2024-10-01".to_string()),
                limit: Some(1),
                ..DocumentFilter::default()
            },
        )
        .await?;
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].title, "Budget för försvaret");
    assert_eq!(recent[0].sender.as_deref(), Some("Försvarsdepartementet"));

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test]
async fn search_all_tolerates_failing_categories() -> anyhow::Result<()> {
    let server = MockUpstream::spawn(g0v_app(Arc::new(AtomicUsize::new(0)))).await?;
    let gateway = Gateway::from_config(&config_for(server.base_url(), server.base_url()))?;

    let result = gateway
        .g0v()
        .search_all(
            "budget",
            &SearchAllOptions {
                types: vec![
                    "pressmeddelanden".to_string(),
                    "propositioner".to_string(),
                    "sou".to_string(),
                ],
                ..SearchAllOptions::default()
            },
        )
        .await?;

    assert_eq!(result.results["pressmeddelanden"].len(), 2);
    assert_eq!(result.results["propositioner"].len(), 1);
    assert!(result.results["sou"].is_empty());
    assert_eq!(result.failed_types, vec!["sou".to_string()]);
    assert_eq!(result.total, 3);
    Ok(())
}

#[tokio::test]
async fn document_content_follows_regeringen_urls() -> anyhow::Result<()> {
    let server = MockUpstream::spawn(g0v_app(Arc::new(AtomicUsize::new(0)))).await?;
    let gateway = Gateway::from_config(&config_for(server.base_url(), server.base_url()))?;

    let content = gateway
        .g0v()
        .document_content("https://www.regeringen.se/pressmeddelanden/2025/01/budget-for-forsvaret/")
        .await?;
    assert!(content.content.starts_with("# Budget för försvaret"));
    assert_eq!(
        content.markdown_url,
        format!("{}/pressmeddelanden/2025/01/budget-for-forsvaret.md", server.base_url())
    );

    let missing = gateway
        .g0v()
        .document_content("/pressmeddelanden/2025/01/finns-inte")
        .await;
    assert_eq!(gateway.respond("get_g0v_document_content", missing).unwrap_err().code, -32001);

    let slug = gateway.g0v().document_content("budget-for-forsvaret").await;
    assert_eq!(gateway.respond("get_g0v_document_content", slug).unwrap_err().code, -32602);
    Ok(())
}

#[tokio::test]
async fn metadata_endpoints_use_alternate_field_names() -> anyhow::Result<()> {
    let server = MockUpstream::spawn(g0v_app(Arc::new(AtomicUsize::new(0)))).await?;
    let gateway = Gateway::from_config(&config_for(server.base_url(), server.base_url()))?;

    let latest = gateway.g0v().latest_update().await?;
    assert_eq!(latest.updated, "2025-01-16T04:00:00Z");
    assert_eq!(latest.total_documents, 123_456);
    assert_eq!(latest.codes, 42);

    let codes = gateway.g0v().category_codes().await?;
    assert_eq!(codes.count, 2);
    let v = serde_json::to_value(&codes)?;
    assert_eq!(v["categoryCodes"]["1285"], json!("Finansdepartementet"));
    Ok(())
}

#[tokio::test]
async fn search_all_bounds_every_category() -> anyhow::Result<()> {
    let app = Router::new().route(
        "/pressmeddelanden.json",
        get(|| async {
            let docs: Vec<Value> = (0..3000)
                .map(|i| {
                    json!({
                        "url": format!("/pressmeddelanden/2025/01/budget-{i}/"),
                        "title": format!("Budget {i}"),
                        "published": "2025-01-15",
                        "type": "Pressmeddelande",
                    })
                })
                .collect();
            Json(docs)
        }),
    );
    let server = MockUpstream::spawn(app).await?;
    let gateway = Gateway::from_config(&config_for(server.base_url(), server.base_url()))?;
    let options = SearchAllOptions {
        types: vec!["pressmeddelanden".to_string()],
        ..SearchAllOptions::default()
    };

    let found = gateway.g0v().search_all("budget", &options).await;
    let result = gateway.respond("search_g0v_all_types", found).expect("sanitized");
    assert_eq!(
        result.data["results"]["pressmeddelanden"].as_array().map(Vec::len),
        Some(DEFAULT_DOCUMENT_LIMIT)
    );
    assert_eq!(result.data["total"], json!(DEFAULT_DOCUMENT_LIMIT));

    let too_many = SearchAllOptions {
        limit: Some(201),
        ..options
    };
    let rejected = gateway.g0v().search_all("budget", &too_many).await;
    assert_eq!(
        gateway.respond("search_g0v_all_types", rejected).unwrap_err().code,
        -32602
    );
    Ok(())
}

#[tokio::test]
async fn departments_are_counted_across_listings() -> anyhow::Result<()> {
    let app = g0v_app(Arc::new(AtomicUsize::new(0))).route(
        "/tal.json",
        get(|| async {
            Json(json!([
                {
                    "url": "/tal/2024/10/anforande-om-ekonomin/",
                    "title": "Anförande om ekonomin",
                    "published": "2024-10-01",
                    "type": "Tal",
                    "categories": ["1285"]
                },
                {
                    "url": "/tal/2023/05/gammalt-tal/",
                    "title": "Gammalt tal",
                    "published": "2023-05-01",
                    "type": "Tal"
                }
            ]))
        }),
    );
    let server = MockUpstream::spawn(app).await?;
    let gateway = Gateway::from_config(&config_for(server.base_url(), server.base_url()))?;

    let range = DateRange {
        date_from: Some("2024-09-01".to_string()),
        date_to: None,
    };
    let analysis = gateway.g0v().analyze_by_department(&range).await?;
    assert_eq!(analysis.total, 4);

    let defence = &analysis.departments["Försvarsdepartementet"];
    assert_eq!((defence.count, defence.press_releases), (1, 1));
    let finance = &analysis.departments["Finansdepartementet"];
    assert_eq!((finance.count, finance.speeches), (1, 1));
    let unknown = &analysis.departments["Okänt departement"];
    assert_eq!((unknown.count, unknown.press_releases, unknown.propositions), (2, 1, 1));
    Ok(())
}
