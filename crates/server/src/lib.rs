//! HTTP surface of the methodics service.
//!
//! # Endpoints
//!
//! | Method   | Path              | Description                              |
//! |----------|-------------------|------------------------------------------|
//! | `POST`   | `/chat`           | Answer a question                        |
//! | `GET`    | `/search`         | Lexical methodic search with previews    |
//! | `GET`    | `/qa/search`      | QA pairs similar to a query              |
//! | `GET`    | `/methodics/{id}` | Full methodic text                       |
//! | `POST`   | `/methodics`      | Add a methodic                           |
//! | `DELETE` | `/methodics/{id}` | Remove a methodic and its QA pairs       |
//! | `POST`   | `/qa`             | Add a QA pair                            |
//! | `GET`    | `/`               | Service info                             |
//! | `GET`    | `/health`         | Health check                             |
//!
//! All origins, methods and headers are allowed.

mod error;
mod routes;

pub use error::ApiError;

use axum::{
    routing::{get, post},
    Router,
};
use methodics_core::AppResult;
use methodics_knowledge::ChatService;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the application router around a shared chat service.
pub fn router(service: Arc<ChatService>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(routes::root))
        .route("/health", get(routes::health))
        .route("/chat", post(routes::chat))
        .route("/search", get(routes::search))
        .route("/qa/search", get(routes::search_qa))
        .route("/qa", post(routes::create_qa))
        .route("/methodics", post(routes::create_methodic))
        .route(
            "/methodics/{id}",
            get(routes::get_methodic).delete(routes::delete_methodic),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(service)
}

/// Serve until Ctrl-C.
pub async fn run_server(bind: &str, service: Arc<ChatService>) -> AppResult<()> {
    let app = router(service);

    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!("Methodics API listening on http://{}", bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use methodics_knowledge::ingest::seed_samples;
    use methodics_knowledge::{
        MethodicStore, NewDocument, NewQaPair, RetrievalConfig, SqliteStore, Summarizer,
        SummarizerSettings,
    };
    use methodics_prompt::default_prompt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn test_app() -> (Router, Arc<SqliteStore>) {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let summarizer = Summarizer::unavailable(
            "no API key",
            SummarizerSettings::default(),
            default_prompt().unwrap(),
        );
        let service = ChatService::new(store.clone(), summarizer, RetrievalConfig::default());
        (router(Arc::new(service)), store)
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.expect("router response");
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_and_root() {
        let (app, _) = test_app();

        let (status, body) = send(app.clone(), get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["llm_available"], false);

        let (status, body) = send(app, get("/")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["endpoints"].as_array().unwrap().len() >= 4);
    }

    #[tokio::test]
    async fn test_chat_on_empty_corpus() {
        let (app, _) = test_app();

        let (status, body) =
            send(app, post_json("/chat", json!({"question": "Что такое Python?"}))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["found_count"], 0);
        assert_eq!(body["sources"], json!([]));
        assert!(body["answer"]
            .as_str()
            .unwrap()
            .starts_with("По вашему запросу не найдено информации"));
        assert!(body.get("origin").is_none());
    }

    #[tokio::test]
    async fn test_chat_with_seeded_corpus_falls_back() {
        let (app, store) = test_app();
        seed_samples(store.as_ref()).unwrap();

        let (status, body) = send(
            app,
            post_json("/chat", json!({"question": "Что такое Python?"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["found_count"].as_u64().unwrap() >= 1);
        let sources = body["sources"].as_array().unwrap();
        assert!(sources
            .iter()
            .any(|s| s["title"].as_str().unwrap().contains("Python")));
    }

    #[tokio::test]
    async fn test_search_returns_previews() {
        let (app, store) = test_app();
        store
            .create_document(&NewDocument {
                title: "Основы программирования на Python".to_string(),
                subject: None,
                author: Some("Иванов И.И.".to_string()),
                body: "Python ".repeat(100),
            })
            .unwrap();

        let (status, body) = send(app, get("/search?query=python")).await;

        assert_eq!(status, StatusCode::OK);
        let results = body.as_array().unwrap();
        assert_eq!(results.len(), 1);
        let snippet = results[0]["snippet"].as_str().unwrap();
        assert_eq!(snippet.chars().count(), 203);
        assert!(snippet.ends_with("..."));
    }

    #[tokio::test]
    async fn test_qa_search_includes_linked_methodic() {
        let (app, store) = test_app();
        let doc = store
            .create_document(&NewDocument {
                title: "Базы данных".to_string(),
                subject: None,
                author: Some("Сидоров С.С.".to_string()),
                body: "Реляционные базы данных.".to_string(),
            })
            .unwrap();
        store
            .create_qa_pair(&NewQaPair {
                question: "Что такое SQL?".to_string(),
                answer: "SQL — язык запросов.".to_string(),
                document_id: Some(doc.id),
            })
            .unwrap();

        let uri = format!(
            "/qa/search?query={}",
            "%D1%87%D1%82%D0%BE%20%D1%82%D0%B0%D0%BA%D0%BE%D0%B5%20sql"
        );
        let (status, body) = send(app, get(&uri)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 1);
        assert_eq!(body["results"][0]["methodic_title"], "Базы данных");
        assert_eq!(body["results"][0]["methodic_author"], "Сидоров С.С.");
    }

    #[tokio::test]
    async fn test_qa_search_rejects_bad_threshold() {
        let (app, _) = test_app();
        let (status, body) = send(app, get("/qa/search?query=sql&threshold=1.5")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "bad_request");
    }

    #[tokio::test]
    async fn test_methodic_lifecycle() {
        let (app, _) = test_app();

        let (status, created) = send(
            app.clone(),
            post_json(
                "/methodics",
                json!({"title": "  Методика обучения физике ", "body": "Лабораторные работы."}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["title"], "Методика обучения физике");
        let id = created["id"].as_i64().unwrap();

        let (status, body) = send(app.clone(), get(&format!("/methodics/{}", id))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["snippet"], "Лабораторные работы.");

        let delete = Request::builder()
            .method("DELETE")
            .uri(format!("/methodics/{}", id))
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(app.clone(), delete).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = send(app, get(&format!("/methodics/{}", id))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["message"], "Методичка не найдена");
    }

    #[tokio::test]
    async fn test_invalid_methodic_is_rejected() {
        let (app, _) = test_app();
        let (status, body) = send(
            app,
            post_json("/methodics", json!({"title": "   ", "body": "Текст"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "bad_request");
    }

    #[tokio::test]
    async fn test_qa_for_missing_methodic_is_not_found() {
        let (app, _) = test_app();
        let (status, body) = send(
            app,
            post_json(
                "/qa",
                json!({"question": "Что такое SQL?", "answer": "Язык запросов.", "document_id": 42}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "not_found");
    }

    #[tokio::test]
    async fn test_create_qa() {
        let (app, store) = test_app();
        let (status, body) = send(
            app,
            post_json("/qa", json!({"question": "Что такое SQL?", "answer": "Язык запросов."})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["question"], "Что такое SQL?");
        assert_eq!(store.stats().unwrap().qa_pairs, 1);
    }

    #[tokio::test]
    async fn test_chat_rejects_out_of_range_threshold() {
        let (app, store) = test_app();
        store
            .create_qa_pair(&NewQaPair {
                question: "Что такое SQL?".to_string(),
                answer: "Язык структурированных запросов к базам данных.".to_string(),
                document_id: None,
            })
            .unwrap();

        let (status, body) = send(
            app,
            post_json(
                "/chat",
                json!({"question": "Как варить борщ?", "similarity_threshold": -5.0}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "bad_request");
    }

    #[tokio::test]
    async fn test_storage_work_leaves_the_runtime_thread() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let summarizer = Summarizer::unavailable(
            "no API key",
            SummarizerSettings::default(),
            default_prompt().unwrap(),
        );
        let service = Arc::new(ChatService::new(store, summarizer, RetrievalConfig::default()));

        let runtime_thread = std::thread::current().id();
        let storage_thread = routes::blocking(&service, |service| {
            service.store().stats()?;
            Ok(std::thread::current().id())
        })
        .await
        .unwrap();

        assert_ne!(runtime_thread, storage_thread);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_writes_through_router() {
        let (app, store) = test_app();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let app = app.clone();
                tokio::spawn(async move {
                    send(
                        app,
                        post_json(
                            "/qa",
                            json!({"question": format!("Вопрос номер {}?", i), "answer": "Ответ."}),
                        ),
                    )
                    .await
                    .0
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap(), StatusCode::CREATED);
        }
        assert_eq!(store.stats().unwrap().qa_pairs, 8);
    }
}
