//! Statistics endpoints.

use axum::{Router, extract::State, routing::get};
use chrono::Utc;
use storyvault_common::AppResult;
use storyvault_core::Stats;

use crate::{middleware::AppState, response::ApiResponse};

/// Get aggregate story statistics.
async fn stats(State(state): State<AppState>) -> AppResult<ApiResponse<Stats>> {
    let stats = state.stats_service.get(Utc::now()).await?;
    Ok(ApiResponse::ok(stats))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(stats))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;
    use storyvault_core::{StatsService, StoryService, UserService, VoteService};
    use storyvault_db::repositories::{StoryRepository, UserRepository, VoteRepository};
    use tower::util::ServiceExt;

    use crate::middleware::AppState;

    fn count_result(n: i64) -> Vec<std::collections::BTreeMap<&'static str, sea_orm::Value>> {
        vec![maplit::btreemap! {
            "num_items" => sea_orm::Value::BigInt(Some(n))
        }]
    }

    fn test_state(db: Arc<sea_orm::DatabaseConnection>) -> AppState {
        AppState {
            user_service: UserService::new(UserRepository::new(db.clone())),
            story_service: StoryService::new(
                StoryRepository::new(db.clone()),
                UserRepository::new(db.clone()),
            ),
            vote_service: VoteService::new(
                VoteRepository::new(db.clone()),
                StoryRepository::new(db.clone()),
            ),
            stats_service: StatsService::new(StoryRepository::new(db)),
        }
    }

    #[tokio::test]
    async fn test_stats_endpoint() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([
                    count_result(12),
                    count_result(9),
                    count_result(4),
                    count_result(1),
                ])
                .into_connection(),
        );

        let app = crate::router().with_state(test_state(db));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/stats")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["data"]["total"], 12);
        assert_eq!(json["data"]["available"], 9);
        assert_eq!(json["data"]["expiringToday"], 4);
        assert_eq!(json["data"]["expiringHour"], 1);
    }

    #[tokio::test]
    async fn test_create_story_requires_auth() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let app = crate::router().with_state(test_state(db));
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/stories")
                    .header("content-type", "application/json")
                    .body(Body::from("{\"title\":\"t\",\"content\":\"c\"}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_list_stories_huge_page_number() {
        // Pagination math must saturate instead of overflowing when the
        // client sends an absurd page value.
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([count_result(0)])
                .append_query_results([Vec::<storyvault_db::entities::story::Model>::new()])
                .into_connection(),
        );

        let app = crate::router().with_state(test_state(db));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/stories?page=18446744073709551615&limit=50")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["data"]["total"], 0);
        assert_eq!(json["data"]["stories"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_random_story_empty_corpus() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([count_result(0)])
                .into_connection(),
        );

        let app = crate::router().with_state(test_state(db));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/stories/random")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
