//! End-to-end tests for the HTTP API.
//!
//! Each test binds the real router on an OS-assigned port over a fresh
//! in-memory database with the default accounts seeded, then talks to it
//! with `reqwest`.

use std::net::SocketAddr;

use serde_json::{Value, json};
use tokio::net::TcpListener;

use eduride_auth::{TokenConfig, TokenIssuer};
use eduride_store::{BusStore, Database, RouteStore, StudentStore, seed_defaults};
use eduride_web::{ServerConfig, WebServer};

// ── helpers ──────────────────────────────────────────────────────────────────

struct TestServer {
    base: String,
    db: Database,
    client: reqwest::Client,
    _handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{path}", self.base)
    }

    async fn post(&self, path: &str, body: Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .json(&body)
            .send()
            .await
            .expect("request failed")
    }

    async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("request failed")
    }

    async fn get_as(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("request failed")
    }

    async fn delete(&self, path: &str) -> reqwest::Response {
        self.client
            .delete(self.url(path))
            .send()
            .await
            .expect("request failed")
    }

    /// Log in through `path` and return the access token.
    async fn login(&self, path: &str, body: Value) -> String {
        let resp = self.post(path, body).await;
        assert_eq!(resp.status(), 200, "login via {path} failed");
        let json: Value = resp.json().await.expect("invalid JSON");
        json["access_token"]
            .as_str()
            .expect("access_token missing")
            .to_string()
    }
}

/// Bind to 127.0.0.1:0, start the full router, return the running server.
async fn start_test_server() -> TestServer {
    let db = Database::open_in_memory().expect("open db");
    db.run_migrations().await.expect("migrate");
    seed_defaults(&db).await.expect("seed");

    let tokens = TokenIssuer::new(TokenConfig::new(b"test-secret".to_vec()));
    let server = WebServer::new(ServerConfig::default(), db.clone(), tokens);
    let app = server.router();

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind to port 0");
    let addr: SocketAddr = listener.local_addr().expect("get local addr");
    let base = format!("http://127.0.0.1:{}", addr.port());

    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    // Small yield so the listener is ready.
    tokio::time::sleep(std::time::Duration::from_millis(10)).await;

    TestServer {
        base,
        db,
        client: reqwest::Client::new(),
        _handle: handle,
    }
}

fn student_body(email: &str, roll: &str) -> Value {
    json!({
        "name": "Priya",
        "email": email,
        "roll_number": roll,
        "phone": "9000000001",
        "password": "secret1",
    })
}

fn route_body(name: &str) -> Value {
    json!({
        "route_name": name,
        "description": "Main gate to Periyar",
        "stops": [
            {"stop_name": "Periyar", "latitude": 9.9195, "longitude": 78.1193, "order": 2},
            {"stop_name": "Main Gate", "latitude": 9.8825, "longitude": 78.0815, "order": 1},
        ],
    })
}

// ── liveness ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn root_and_health_sit_outside_the_prefix() {
    let srv = start_test_server().await;

    let resp = srv.client.get(format!("{}/", srv.base)).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["service"], "TCE EduRide API");
    assert!(json["version"].is_string());

    let resp = srv
        .client
        .get(format!("{}/health", srv.base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["database"], true);
}

// ── admin ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn seeded_admins_can_log_in() {
    let srv = start_test_server().await;

    for (username, password) in [("admin", "admin123"), ("tceeduride", "tce@2025")] {
        let resp = srv
            .post(
                "/admin/login",
                json!({"username": username, "password": password}),
            )
            .await;
        assert_eq!(resp.status(), 200, "{username} should log in");
        let json: Value = resp.json().await.unwrap();
        assert!(!json["access_token"].as_str().unwrap().is_empty());
        assert_eq!(json["token_type"], "bearer");
        assert_eq!(json["user"]["username"], username);
        assert_eq!(json["user"]["role"], "admin");
    }
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let srv = start_test_server().await;

    let resp = srv
        .post(
            "/admin/login",
            json!({"username": "admin", "password": "nope"}),
        )
        .await;
    assert_eq!(resp.status(), 401);
    assert!(resp.headers().contains_key("www-authenticate"));
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["detail"], "Invalid username or password");
    assert_eq!(json["reason"], "unauthorized");

    // Unknown user gets the same answer.
    let resp = srv
        .post(
            "/students/login",
            json!({"email": "ghost@tce.edu", "password": "student123"}),
        )
        .await;
    assert_eq!(resp.status(), 401);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["detail"], "Invalid email or password");
}

#[tokio::test]
async fn duplicate_student_email_is_rejected() {
    let srv = start_test_server().await;

    let resp = srv
        .post("/admin/students", student_body("priya@tce.edu", "TCE2025100"))
        .await;
    assert_eq!(resp.status(), 201);

    let resp = srv
        .post("/admin/students", student_body("priya@tce.edu", "TCE2025101"))
        .await;
    assert_eq!(resp.status(), 400);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["detail"], "Email already registered");
    assert_eq!(json["reason"], "conflict");

    let students = StudentStore::new(srv.db.clone());
    assert_eq!(students.count_by_email("priya@tce.edu").await.unwrap(), 1);
}

#[tokio::test]
async fn student_update_and_delete() {
    let srv = start_test_server().await;

    let resp = srv
        .post("/admin/students", student_body("arun@tce.edu", "TCE2025200"))
        .await;
    let created: Value = resp.json().await.unwrap();
    let id = created["id"].as_i64().unwrap();
    assert!(created.get("password_hash").is_none());

    let mut body = student_body("arun@tce.edu", "TCE2025200");
    body["name"] = json!("Arun K");
    let resp = srv
        .client
        .put(srv.url(&format!("/admin/students/{id}")))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let updated: Value = resp.json().await.unwrap();
    assert_eq!(updated["name"], "Arun K");

    let resp = srv.delete(&format!("/admin/students/{id}")).await;
    assert_eq!(resp.status(), 204);
    let resp = srv.delete(&format!("/admin/students/{id}")).await;
    assert_eq!(resp.status(), 404);

    let resp = srv
        .client
        .put(srv.url("/admin/students/9999"))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn student_edit_without_password_keeps_login() {
    let srv = start_test_server().await;

    let created: Value = srv
        .post("/admin/students", student_body("kavya@tce.edu", "TCE2025400"))
        .await
        .json()
        .await
        .unwrap();
    let id = created["id"].as_i64().unwrap();

    // Shape the admin screen sends when the password box is left empty.
    let resp = srv
        .client
        .put(srv.url(&format!("/admin/students/{id}")))
        .json(&json!({
            "name": "Kavya R",
            "email": "kavya@tce.edu",
            "roll_number": "TCE2025400",
            "phone": null,
            "route_id": null,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let updated: Value = resp.json().await.unwrap();
    assert_eq!(updated["name"], "Kavya R");
    assert_eq!(updated["phone"], "9000000001");

    srv.login(
        "/students/login",
        json!({"email": "kavya@tce.edu", "password": "secret1"}),
    )
    .await;
}

#[tokio::test]
async fn driver_edit_can_change_password() {
    let srv = start_test_server().await;

    let driver: Value = srv.get("/admin/drivers").await.json().await.unwrap();
    let id = driver[0]["id"].as_i64().unwrap();

    let resp = srv
        .client
        .put(srv.url(&format!("/admin/drivers/{id}")))
        .json(&json!({
            "name": "Test Driver",
            "email": "driver@tce.edu",
            "license_number": "DL123456789",
            "password": "rotated-pass",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = srv
        .post(
            "/drivers/login",
            json!({"email": "driver@tce.edu", "password": "driver123"}),
        )
        .await;
    assert_eq!(resp.status(), 401);
    srv.login(
        "/drivers/login",
        json!({"email": "driver@tce.edu", "password": "rotated-pass"}),
    )
    .await;
}

#[tokio::test]
async fn deactivated_accounts_lose_portal_access() {
    let srv = start_test_server().await;

    let student_token = srv
        .login(
            "/students/login",
            json!({"email": "student@tce.edu", "password": "student123"}),
        )
        .await;
    let driver_token = srv
        .login(
            "/drivers/login",
            json!({"email": "driver@tce.edu", "password": "driver123"}),
        )
        .await;

    srv.db
        .execute(|conn| {
            conn.execute("UPDATE students SET status = 'inactive'", [])?;
            conn.execute("UPDATE drivers SET status = 'inactive'", [])?;
            Ok(())
        })
        .await
        .unwrap();

    for path in ["/students/dashboard", "/students/track-bus"] {
        let resp = srv.get_as(path, &student_token).await;
        assert_eq!(resp.status(), 401, "{path}");
    }
    let resp = srv.get_as("/drivers/dashboard", &driver_token).await;
    assert_eq!(resp.status(), 401);
    let resp = srv
        .client
        .post(srv.url("/drivers/location"))
        .bearer_auth(&driver_token)
        .json(&json!({"latitude": 9.88, "longitude": 78.08}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["detail"], "Account is not active");
}

#[tokio::test]
async fn student_list_is_stable_and_paged() {
    let srv = start_test_server().await;

    for i in 0..3 {
        let resp = srv
            .post(
                "/admin/students",
                student_body(&format!("s{i}@tce.edu"), &format!("TCE20259{i:02}")),
            )
            .await;
        assert_eq!(resp.status(), 201);
    }

    let first: Value = srv.get("/admin/students").await.json().await.unwrap();
    let second: Value = srv.get("/admin/students").await.json().await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.as_array().unwrap().len(), 4);

    let page: Value = srv
        .get("/admin/students?skip=1&limit=2")
        .await
        .json()
        .await
        .unwrap();
    let page = page.as_array().unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page[0]["email"], "s0@tce.edu");
    assert_eq!(page[1]["email"], "s1@tce.edu");
}

#[tokio::test]
async fn dashboard_reports_live_counts() {
    let srv = start_test_server().await;

    srv.post(
        "/buses",
        json!({"bus_number": "TN-58-1001", "capacity": 50, "model": "Ashok Leyland", "registration_number": "REG1001"}),
    )
    .await;
    srv.post(
        "/buses",
        json!({"bus_number": "TN-58-1002", "capacity": 40, "model": "Tata", "registration_number": "REG1002"}),
    )
    .await;
    srv.post("/routes", route_body("Route A")).await;

    let resp = srv.get("/admin/dashboard").await;
    assert_eq!(resp.status(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["total_buses"], 2);
    assert_eq!(json["active_buses"], 2);
    assert_eq!(json["total_routes"], 1);
    assert_eq!(json["total_students"], 1);
    assert_eq!(json["total_drivers"], 1);
}

// ── buses ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn bus_partial_update_and_missing_delete() {
    let srv = start_test_server().await;

    let resp = srv
        .post(
            "/buses",
            json!({"bus_number": "TN-58-2001", "capacity": 45, "model": "Eicher", "registration_number": "REG2001"}),
        )
        .await;
    assert_eq!(resp.status(), 201);
    let bus: Value = resp.json().await.unwrap();
    let id = bus["id"].as_i64().unwrap();

    let resp = srv
        .client
        .put(srv.url(&format!("/buses/{id}")))
        .json(&json!({"status": "maintenance"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let bus: Value = resp.json().await.unwrap();
    assert_eq!(bus["status"], "maintenance");
    assert_eq!(bus["capacity"], 45);

    let resp = srv.delete("/buses/9999").await;
    assert_eq!(resp.status(), 404);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["detail"], "Bus not found");

    let buses = BusStore::new(srv.db.clone());
    assert_eq!(buses.count().await.unwrap(), 1);
}

#[tokio::test]
async fn malformed_body_is_a_validation_error() {
    let srv = start_test_server().await;

    let resp = srv.post("/buses", json!({"bus_number": "TN-1"})).await;
    assert_eq!(resp.status(), 422);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["reason"], "validation");
}

// ── routes ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn route_stops_come_back_in_order() {
    let srv = start_test_server().await;

    let resp = srv.post("/routes", route_body("Route A")).await;
    assert_eq!(resp.status(), 201);
    let created: Value = resp.json().await.unwrap();
    let id = created["id"].as_i64().unwrap();

    let resp = srv.get(&format!("/routes/{id}")).await;
    assert_eq!(resp.status(), 200);
    let route: Value = resp.json().await.unwrap();
    assert_eq!(route["route_name"], "Route A");
    let stops = route["stops"].as_array().unwrap();
    assert_eq!(stops.len(), 2);
    assert_eq!(stops[0]["stop_name"], "Main Gate");
    assert_eq!(stops[0]["order"], 1);
    assert_eq!(stops[1]["stop_name"], "Periyar");
}

#[tokio::test]
async fn route_replace_and_cascade_delete() {
    let srv = start_test_server().await;

    let created: Value = srv
        .post("/routes", route_body("Route B"))
        .await
        .json()
        .await
        .unwrap();
    let id = created["id"].as_i64().unwrap();

    let resp = srv
        .client
        .put(srv.url(&format!("/routes/{id}")))
        .json(&json!({
            "route_name": "Route B2",
            "stops": [{"stop_name": "Library", "latitude": 9.88, "longitude": 78.08, "order": 1}],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let replaced: Value = resp.json().await.unwrap();
    assert_eq!(replaced["route_name"], "Route B2");
    assert_eq!(replaced["stops"].as_array().unwrap().len(), 1);

    let resp = srv.delete(&format!("/routes/{id}")).await;
    assert_eq!(resp.status(), 204);

    let routes = RouteStore::new(srv.db.clone());
    assert_eq!(routes.stop_count(id).await.unwrap(), 0);
    assert_eq!(srv.get(&format!("/routes/{id}")).await.status(), 404);
}

#[tokio::test]
async fn duplicate_stop_order_leaves_no_route() {
    let srv = start_test_server().await;

    let resp = srv
        .post(
            "/routes",
            json!({
                "route_name": "Broken",
                "stops": [
                    {"stop_name": "A", "latitude": 9.0, "longitude": 78.0, "order": 1},
                    {"stop_name": "B", "latitude": 9.1, "longitude": 78.1, "order": 1},
                ],
            }),
        )
        .await;
    assert_eq!(resp.status(), 422);

    let routes = RouteStore::new(srv.db.clone());
    assert_eq!(routes.count().await.unwrap(), 0);
}

// ── schedules ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn schedule_carries_bus_and_route_names() {
    let srv = start_test_server().await;

    let bus: Value = srv
        .post(
            "/buses",
            json!({"bus_number": "TN-58-3001", "capacity": 50, "model": "Tata", "registration_number": "REG3001"}),
        )
        .await
        .json()
        .await
        .unwrap();
    let route: Value = srv
        .post("/routes", route_body("Route C"))
        .await
        .json()
        .await
        .unwrap();

    let resp = srv
        .post(
            "/schedules",
            json!({
                "bus_id": bus["id"],
                "route_id": route["id"],
                "departure_time": "7:30",
                "days_of_week": ["friday", "Monday"],
            }),
        )
        .await;
    assert_eq!(resp.status(), 201);
    let schedule: Value = resp.json().await.unwrap();
    assert_eq!(schedule["bus_number"], "TN-58-3001");
    assert_eq!(schedule["route_name"], "Route C");
    assert_eq!(schedule["departure_time"], "07:30");
    assert_eq!(schedule["days_of_week"], json!(["Monday", "Friday"]));
    assert_eq!(schedule["status"], "active");

    // The bus is still scheduled, so it cannot be removed.
    let resp = srv.delete(&format!("/buses/{}", bus["id"])).await;
    assert_eq!(resp.status(), 400);

    let resp = srv.delete(&format!("/schedules/{}", schedule["id"])).await;
    assert_eq!(resp.status(), 204);
    let resp = srv.delete(&format!("/buses/{}", bus["id"])).await;
    assert_eq!(resp.status(), 204);
}

// ── feedback ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn feedback_rating_bounds_and_summary() {
    let srv = start_test_server().await;

    for rating in [0, 6] {
        let resp = srv
            .post(
                "/feedback",
                json!({"user_id": 1, "user_type": "student", "rating": rating, "category": "service", "message": "x"}),
            )
            .await;
        assert_eq!(resp.status(), 422, "rating {rating} must be rejected");
    }

    for (rating, category) in [(5, "service"), (4, "service"), (2, "punctuality")] {
        let resp = srv
            .post(
                "/feedback",
                json!({"user_id": 1, "user_type": "student", "rating": rating, "category": category, "message": "ok"}),
            )
            .await;
        assert_eq!(resp.status(), 201);
    }

    let resp = srv.get("/feedback/summary").await;
    assert_eq!(resp.status(), 200);
    let summary: Value = resp.json().await.unwrap();
    assert_eq!(summary["total_feedback"], 3);
    assert_eq!(summary["average_rating"], 3.67);
    assert_eq!(summary["feedback_by_category"]["service"], 2);
    assert_eq!(summary["feedback_by_category"]["punctuality"], 1);
    let recent = summary["recent_feedback"].as_array().unwrap();
    assert_eq!(recent.len(), 3);
    assert_eq!(recent[0]["category"], "punctuality");
    assert_eq!(recent[0]["status"], "pending");

    let list: Value = srv.get("/feedback").await.json().await.unwrap();
    assert_eq!(list.as_array().unwrap().len(), 3);
}

// ── student and driver portals ───────────────────────────────────────────────

#[tokio::test]
async fn portals_require_a_token_with_the_right_role() {
    let srv = start_test_server().await;

    let resp = srv.get("/students/dashboard").await;
    assert_eq!(resp.status(), 401);

    let resp = srv.get_as("/students/dashboard", "not-a-jwt").await;
    assert_eq!(resp.status(), 401);

    let driver_token = srv
        .login(
            "/drivers/login",
            json!({"email": "driver@tce.edu", "password": "driver123"}),
        )
        .await;
    let resp = srv.get_as("/students/dashboard", &driver_token).await;
    assert_eq!(resp.status(), 403);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["reason"], "forbidden");

    let student_token = srv
        .login(
            "/students/login",
            json!({"email": "student@tce.edu", "password": "student123"}),
        )
        .await;
    let resp = srv.get_as("/students/dashboard", &student_token).await;
    assert_eq!(resp.status(), 200);
    let dashboard: Value = resp.json().await.unwrap();
    assert_eq!(dashboard["student_name"], "Test Student");
    assert_eq!(dashboard["roll_number"], "TCE2025001");
    assert!(dashboard["route_assigned"].is_null());

    // No route yet, so nothing to track.
    let resp = srv.get_as("/students/track-bus", &student_token).await;
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn driver_without_bus_cannot_report_location() {
    let srv = start_test_server().await;

    let token = srv
        .login(
            "/drivers/login",
            json!({"email": "driver@tce.edu", "password": "driver123"}),
        )
        .await;
    let resp = srv
        .client
        .post(srv.url("/drivers/location"))
        .bearer_auth(&token)
        .json(&json!({"latitude": 9.88, "longitude": 78.08}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["detail"], "No bus assigned to this driver");
}

#[tokio::test]
async fn driver_ping_is_visible_to_students_on_the_route() {
    let srv = start_test_server().await;

    let bus: Value = srv
        .post(
            "/buses",
            json!({"bus_number": "TN-58-4001", "capacity": 50, "model": "Tata", "registration_number": "REG4001"}),
        )
        .await
        .json()
        .await
        .unwrap();
    let route: Value = srv
        .post("/routes", route_body("Route D"))
        .await
        .json()
        .await
        .unwrap();
    let resp = srv
        .post(
            "/schedules",
            json!({
                "bus_id": bus["id"],
                "route_id": route["id"],
                "departure_time": "07:15",
                "days_of_week": ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday"],
            }),
        )
        .await;
    assert_eq!(resp.status(), 201);

    let mut student = student_body("meena@tce.edu", "TCE2025300");
    student["route_id"] = route["id"].clone();
    assert_eq!(srv.post("/admin/students", student).await.status(), 201);

    let resp = srv
        .post(
            "/admin/drivers",
            json!({
                "name": "Ravi",
                "email": "ravi@tce.edu",
                "phone": "9000000002",
                "license_number": "DL4001",
                "password": "drive4001",
                "bus_id": bus["id"],
            }),
        )
        .await;
    assert_eq!(resp.status(), 201);

    let driver_token = srv
        .login(
            "/drivers/login",
            json!({"email": "ravi@tce.edu", "password": "drive4001"}),
        )
        .await;

    let dashboard: Value = srv
        .get_as("/drivers/dashboard", &driver_token)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(dashboard["driver_name"], "Ravi");
    assert_eq!(dashboard["bus_assigned"], "TN-58-4001");
    assert_eq!(dashboard["route_assigned"], "Route D");
    assert_eq!(
        dashboard["schedule_today"],
        json!([{"time": "07:15", "stop": "Main Gate"}])
    );

    // Parked at the final stop.
    let resp = srv
        .client
        .post(srv.url("/drivers/location"))
        .bearer_auth(&driver_token)
        .json(&json!({"latitude": 9.9195, "longitude": 78.1193, "speed": 30.0}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let ack: Value = resp.json().await.unwrap();
    assert_eq!(ack["status"], "success");
    assert_eq!(ack["location"]["bus_id"], bus["id"]);

    let student_token = srv
        .login(
            "/students/login",
            json!({"email": "meena@tce.edu", "password": "secret1"}),
        )
        .await;

    let dashboard: Value = srv
        .get_as("/students/dashboard", &student_token)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(dashboard["route_assigned"], "Route D");
    assert_eq!(dashboard["bus_number"], "TN-58-4001");

    let resp = srv.get_as("/students/track-bus", &student_token).await;
    assert_eq!(resp.status(), 200);
    let info: Value = resp.json().await.unwrap();
    assert_eq!(info["bus_number"], "TN-58-4001");
    assert_eq!(info["route_name"], "Route D");
    assert_eq!(info["current_location"]["lat"], 9.9195);
    assert_eq!(info["current_location"]["lng"], 78.1193);
    assert_eq!(info["estimated_arrival"], "arriving");
    assert_eq!(info["status"], "on_route");
    assert!(info["last_updated"].as_str().unwrap().contains('T'));

    // Student tokens cannot post driver locations.
    let resp = srv
        .client
        .post(srv.url("/drivers/location"))
        .bearer_auth(&student_token)
        .json(&json!({"latitude": 9.9, "longitude": 78.1}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);
}
