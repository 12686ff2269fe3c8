// tests/api_tests.rs

use assessment::{config::Config, routes, state::AppState};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::{Value, json};
use sqlx::{PgPool, postgres::PgPoolOptions};

const SECRET: &str = "test_secret_for_integration_tests";

struct TestApp {
    address: String,
    pool: PgPool,
    client: reqwest::Client,
}

/// Spawns the app on a random port against the database in `DATABASE_URL`.
///
/// These tests need a running Postgres and are ignored by default:
/// `DATABASE_URL=postgres://... cargo test -- --ignored`
async fn spawn_app() -> TestApp {
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing.");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url,
        jwt_secret: SECRET.to_string(),
        rust_log: "error".to_string(),
        server_port: 0,
        db_max_connections: 5,
        cors_origins: vec!["http://localhost:3000".to_string()],
    };

    let app = routes::create_router(AppState::new(pool.clone(), config));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        pool,
        client: reqwest::Client::new(),
    }
}

fn token(sub: &str, role: &str) -> String {
    let exp = (chrono::Utc::now().timestamp() + 600) as usize;
    encode(
        &Header::default(),
        &json!({ "sub": sub, "role": role, "exp": exp }),
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

fn unique(prefix: &str) -> String {
    format!("{}_{}", prefix, &uuid::Uuid::new_v4().simple().to_string()[..12])
}

impl TestApp {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// Inserts a user row and returns its id as the string used in payloads.
    async fn create_user(&self, username: &str) -> String {
        let id: i64 = sqlx::query_scalar("INSERT INTO users (username, role) VALUES ($1, 'user') RETURNING id")
            .bind(username)
            .fetch_one(&self.pool)
            .await
            .expect("Failed to insert user");
        id.to_string()
    }

    /// Creates the two-question "Go Basics" quiz (5 marks) and returns
    /// (quiz id, single-choice question id, multiple-choice question id).
    async fn create_go_basics(&self, name: &str, category: &str) -> (i64, i64, i64) {
        let response = self
            .client
            .post(self.url("/api/admin/quizzes"))
            .bearer_auth(token("1", "admin"))
            .json(&json!({
                "name": name,
                "category": category,
                "description": "Goroutines and channels",
                "durationMinutes": 20,
                "level": "junior",
                "questions": [
                    {
                        "text": "Which keyword starts a goroutine?",
                        "type": "single-choice",
                        "marks": 3,
                        "options": [
                            {"key": "A", "value": "go"},
                            {"key": "B", "value": "defer"},
                            {"key": "C", "value": "async"},
                            {"key": "D", "value": "spawn"}
                        ],
                        "correctAnswers": ["A"]
                    },
                    {
                        "text": "Which types are reference-like?",
                        "type": "multiple-choice",
                        "marks": 2,
                        "options": [
                            {"key": "A", "value": "int"},
                            {"key": "B", "value": "map"},
                            {"key": "C", "value": "chan"},
                            {"key": "D", "value": "bool"}
                        ],
                        "correctAnswers": ["B", "C"]
                    }
                ]
            }))
            .send()
            .await
            .expect("Failed to execute request");

        assert_eq!(response.status().as_u16(), 201);
        let body: Value = response.json().await.unwrap();
        (
            body["id"].as_i64().unwrap(),
            body["questions"][0]["id"].as_i64().unwrap(),
            body["questions"][1]["id"].as_i64().unwrap(),
        )
    }

    async fn submit(&self, caller: &str, body: Value) -> reqwest::Response {
        self.client
            .post(self.url("/api/results"))
            .bearer_auth(token(caller, "user"))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    async fn get(&self, path: &str, bearer: Option<String>) -> reqwest::Response {
        let mut request = self.client.get(self.url(path));
        if let Some(bearer) = bearer {
            request = request.bearer_auth(bearer);
        }
        request.send().await.expect("Failed to execute request")
    }
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn health_check_404() {
    let app = spawn_app().await;

    let response = app.get("/random_path_that_does_not_exist", None).await;

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_go_basics_flow() {
    let app = spawn_app().await;

    let category = unique("Backend");
    let (quiz_id, q1, q2) = app.create_go_basics(&unique("Go Basics"), &category).await;

    let alice_name = unique("alice");
    let alice = app.create_user(&alice_name).await;
    let bob = app.create_user(&unique("bob")).await;

    // Learners never see the correct answers
    let public: Value = app
        .get(&format!("/api/quizzes/{}", quiz_id), None)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(public["questions"].as_array().unwrap().len(), 2);
    assert!(public["questions"][0].get("correctAnswers").is_none());

    // Full marks
    let response = app
        .submit(
            &alice,
            json!({
                "userId": alice,
                "quizId": quiz_id,
                "timeTakenSeconds": 40,
                "answers": [
                    {"questionId": q1, "selectedOptions": ["A"]},
                    {"questionId": q2, "selectedOptions": ["C", "B"]}
                ]
            }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 201);
    let alice_result: Value = response.json().await.unwrap();
    assert_eq!(alice_result["score"], 5);
    assert_eq!(alice_result["totalMarks"], 5);
    assert_eq!(alice_result["percentage"], 100.0);
    let alice_result_id = alice_result["id"].as_i64().unwrap();

    // Partial selection on a multiple-choice question earns nothing
    let response = app
        .submit(
            &bob,
            json!({
                "userId": bob,
                "quizId": quiz_id,
                "timeTakenSeconds": 30,
                "answers": [
                    {"questionId": q1, "selectedOptions": ["B"]},
                    {"questionId": q2, "selectedOptions": ["B"]}
                ]
            }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 201);
    let bob_result: Value = response.json().await.unwrap();
    assert_eq!(bob_result["score"], 0);

    // Submitting on someone else's behalf
    let response = app
        .submit(
            &alice,
            json!({
                "userId": bob,
                "quizId": quiz_id,
                "timeTakenSeconds": 30,
                "answers": [{"questionId": q1, "selectedOptions": ["A"]}]
            }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 403);

    // Leaderboard of the scope
    let rankings: Value = app
        .get(&format!("/api/analysis/rankings/category/{}", category), None)
        .await
        .json()
        .await
        .unwrap();
    let rankings = rankings.as_array().unwrap();
    assert_eq!(rankings.len(), 2);
    assert_eq!(rankings[0]["rank"], 1);
    assert_eq!(rankings[0]["name"], alice_name.as_str());
    assert_eq!(rankings[0]["marks"], 5);
    assert_eq!(rankings[1]["rank"], 2);
    assert_eq!(rankings[1]["marks"], 0);

    let by_role: Value = app
        .get(&format!("/api/analysis/rankings/jobrole/{}", category), None)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(by_role.as_array().unwrap().len(), 2);

    let stats: Value = app
        .get(&format!("/api/analysis/statistics/category/{}", category), None)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(stats["participants"], 2);
    assert_eq!(stats["averageScore"], 50.0);
    assert_eq!(stats["topScore"], 100.0);
    assert_eq!(stats["totalMarks"], 5);

    // Answer breakdown is private to its owner
    let response = app
        .get(
            &format!("/api/results/{}/answers", alice_result_id),
            Some(token(&alice, "user")),
        )
        .await;
    assert_eq!(response.status().as_u16(), 200);
    let detail: Value = response.json().await.unwrap();
    assert_eq!(detail["answers"].as_array().unwrap().len(), 2);
    assert_eq!(detail["answers"][1]["selectedOptions"], json!(["B", "C"]));

    let response = app
        .get(
            &format!("/api/results/{}", alice_result_id),
            Some(token(&bob, "user")),
        )
        .await;
    assert_eq!(response.status().as_u16(), 403);

    // Answered questions cannot be deleted
    let response = app
        .client
        .delete(app.url(&format!("/api/admin/questions/{}", q1)))
        .bearer_auth(token("1", "admin"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);

    let response = app
        .client
        .delete(app.url(&format!("/api/admin/quizzes/{}", quiz_id)))
        .bearer_auth(token("1", "admin"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_invalid_submission_is_rolled_back() {
    let app = spawn_app().await;

    let (quiz_id, q1, q2) = app
        .create_go_basics(&unique("Go Basics"), &unique("Backend"))
        .await;
    let carol = app.create_user(&unique("carol")).await;

    let response = app
        .submit(
            &carol,
            json!({
                "userId": carol,
                "quizId": quiz_id,
                "timeTakenSeconds": 25,
                "answers": [
                    {"questionId": q1, "selectedOptions": ["A"]},
                    {"questionId": q2, "selectedOptions": ["Q"]}
                ]
            }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 422);

    let history: Value = app
        .get(&format!("/api/results/user/{}", carol), Some(token(&carol, "user")))
        .await
        .json()
        .await
        .unwrap();
    assert!(history.as_array().unwrap().is_empty());

    let response = app
        .submit(
            &carol,
            json!({
                "userId": carol,
                "quizId": quiz_id + 100_000,
                "timeTakenSeconds": 25,
                "answers": [{"questionId": q1, "selectedOptions": ["A"]}]
            }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_unknown_scope_statistics_are_empty() {
    let app = spawn_app().await;

    let stats: Value = app
        .get(
            &format!("/api/analysis/statistics/category/{}", unique("Nobody")),
            None,
        )
        .await
        .json()
        .await
        .unwrap();

    assert_eq!(stats["participants"], 0);
    assert_eq!(stats["quizName"], "No Quiz Available");
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_duplicate_quiz_name_conflicts() {
    let app = spawn_app().await;

    let name = unique("Go Basics");
    let category = unique("Backend");
    app.create_go_basics(&name, &category).await;

    let response = app
        .client
        .post(app.url("/api/admin/quizzes"))
        .bearer_auth(token("1", "admin"))
        .json(&json!({
            "name": name,
            "category": category,
            "durationMinutes": 10,
            "questions": [{
                "text": "Pick A",
                "type": "single-choice",
                "marks": 1,
                "options": [{"key": "A", "value": "a"}],
                "correctAnswers": ["A"]
            }]
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 409);
}
