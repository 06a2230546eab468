use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

#[derive(Debug, Deserialize)]
struct ActivityResponse {
    status: String,
    message: String,
    entry: Value,
}

struct TestServer {
    base_url: String,
    child: Child,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

static TEST_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));
static SERVER: Lazy<Mutex<Option<Arc<TestServer>>>> = Lazy::new(|| Mutex::new(None));

#[cfg(unix)]
mod cleanup {
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Once;

    static REGISTER: Once = Once::new();
    static PID: AtomicI32 = AtomicI32::new(0);

    pub fn register(pid: u32) {
        REGISTER.call_once(|| {
            PID.store(pid as i32, Ordering::SeqCst);
            unsafe {
                libc::atexit(on_exit);
            }
        });
    }

    extern "C" fn on_exit() {
        let pid = PID.load(Ordering::SeqCst);
        if pid > 0 {
            unsafe {
                libc::kill(pid, libc::SIGTERM);
            }
        }
    }
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn unique_data_path() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!("habit_calendar_http_{}_{}.json", std::process::id(), nanos));
    path.to_string_lossy().to_string()
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/api/calendar-events")).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

async fn spawn_server() -> TestServer {
    let port = pick_free_port();
    let data_path = unique_data_path();
    let child = Command::new(env!("CARGO_BIN_EXE_habit_calendar"))
        .env("PORT", port.to_string())
        .env("APP_DATA_PATH", data_path)
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    #[cfg(unix)]
    cleanup::register(child.id());

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;

    TestServer { base_url, child }
}

async fn shared_server() -> Arc<TestServer> {
    let mut guard = SERVER.lock().await;
    if let Some(server) = guard.as_ref() {
        return Arc::clone(server);
    }
    let server = Arc::new(spawn_server().await);
    *guard = Some(Arc::clone(&server));
    server
}

async fn post_json(client: &Client, url: String, body: Value) -> reqwest::Response {
    client.post(url).json(&body).send().await.unwrap()
}

async fn entry_for(client: &Client, server: &TestServer, date: &str) -> Value {
    client
        .get(format!("{}/api/entry?date={date}", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

#[tokio::test]
async fn http_log_activity_then_delete_one_kind() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let response = post_json(
        &client,
        format!("{}/api/log-activity", server.base_url),
        json!({
            "date": "2024-03-05",
            "activities": {
                "drinking": { "drinks": " 3 " },
                "gambling": { "gambling_type": "slots", "money_spent": "40", "time_spent": "" }
            }
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let saved: ActivityResponse = response.json().await.unwrap();
    assert_eq!(saved.status, "success");
    assert_eq!(saved.entry["date"], "2024-03-05");
    assert_eq!(saved.entry["drinking"]["drinks"], "3");
    assert_eq!(saved.entry["gambling"]["gambling_type"], "slots");
    assert!(saved.entry["gambling"]["time_spent"].is_null());

    let events: Vec<Value> = client
        .get(format!("{}/api/calendar-events", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(events.iter().any(|event| event["date"] == "2024-03-05"));

    let response = post_json(
        &client,
        format!("{}/api/delete-activity", server.base_url),
        json!({ "date": "2024-03-05", "type": "drinking" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let deleted: ActivityResponse = response.json().await.unwrap();
    assert_eq!(deleted.message, "Drinking entry deleted");
    assert!(deleted.entry["drinking"].is_null());
    assert_eq!(deleted.entry["gambling"]["money_spent"], "40");

    let entry = entry_for(&client, &server, "2024-03-05").await;
    assert!(entry["drinking"].is_null());
    assert!(!entry["gambling"].is_null());
}

#[tokio::test]
async fn http_rejects_invalid_requests() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    let log_url = format!("{}/api/log-activity", server.base_url);

    let cases = [
        (json!({ "activities": { "drinking": {} } }), "Invalid or missing date"),
        (json!({ "date": "2999-01-01", "activities": { "drinking": {} } }), "Cannot log activity for a future date"),
        (json!({ "date": "2024-03-06", "activities": {} }), "No activity selected"),
    ];
    for (body, message) in cases {
        let response = post_json(&client, log_url.clone(), body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let error: Value = response.json().await.unwrap();
        assert_eq!(error["status"], "error");
        assert_eq!(error["message"], message);
    }

    let response = client
        .post(&log_url)
        .header("content-type", "application/json")
        .body("not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_json(
        &client,
        format!("{}/api/delete-activity", server.base_url),
        json!({ "date": "2024-03-06", "type": "shopping" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_json(
        &client,
        format!("{}/api/delete-activity", server.base_url),
        json!({ "date": "2024-03-07", "type": "gambling" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = client
        .delete(format!("{}/api/activity/not-a-number", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error: Value = response.json().await.unwrap();
    assert_eq!(error["status"], "error");
    assert_eq!(error["message"], "Invalid activity id");

    let response = client
        .put(format!("{}/api/activity/-3", server.base_url))
        .json(&json!({ "drinks": "1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error: Value = response.json().await.unwrap();
    assert_eq!(error["message"], "Invalid activity id");
}

#[tokio::test]
async fn http_serves_instruction_pages() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    for (path, heading) in [
        ("alcohol_instructions.html", "Drinking Instructions"),
        ("gambling_instructions.html", "Gambling Instructions"),
    ] {
        let response = client
            .get(format!("{}/{path}", server.base_url))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = response.text().await.unwrap();
        assert!(html.contains(heading), "{path}");
    }
}

#[tokio::test]
async fn http_update_and_delete_by_id() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let saved: ActivityResponse = post_json(
        &client,
        format!("{}/api/log-activity", server.base_url),
        json!({ "date": "2024-04-10", "type": "gambling", "gambling_type": "poker" }),
    )
    .await
    .json()
    .await
    .unwrap();
    let id = saved.entry["gambling"]["id"].as_u64().expect("id assigned");

    let response = client
        .put(format!("{}/api/activity/{id}", server.base_url))
        .json(&json!({ "gambling_type": "sports", "money_earned": -15 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated: ActivityResponse = response.json().await.unwrap();
    assert_eq!(updated.entry["gambling"]["id"].as_u64(), Some(id));
    assert_eq!(updated.entry["gambling"]["gambling_type"], "sports");
    assert_eq!(updated.entry["gambling"]["money_earned"], "-15");

    let response = client
        .delete(format!("{}/api/activity/{id}", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = client
        .delete(format!("{}/api/activity/{id}", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let entry = entry_for(&client, &server, "2024-04-10").await;
    assert!(entry["gambling"].is_null());
}

#[tokio::test]
async fn http_draft_save_entry_and_report() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let response = post_json(
        &client,
        format!("{}/save-entry", server.base_url),
        json!({
            "entry_date": "2024-05-20",
            "entry_type": "both",
            "gambling": { "amount_spent": 100, "amount_earned": 20, "gambling_type": "slots" },
            "alcohol": { "money_spent": 25, "num_drinks": 4, "trigger": "friends" }
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let saved: Value = response.json().await.unwrap();
    assert_eq!(saved["success"], true);
    assert_eq!(saved["entry"]["drinking"]["drinks"], "4");

    let response = client
        .get(format!(
            "{}/api/report.csv?start_date=2024-05-20&end_date=2024-05-20",
            server.base_url
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()["content-type"].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/csv"));
    let body = response.text().await.unwrap();
    let lines: Vec<&str> = body.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("date,has_drinking,has_gambling,drinking_drinks"));
    assert!(lines[1].starts_with("2024-05-20,true,true,4,25,friends,slots,"));

    let response = post_json(
        &client,
        format!("{}/api/delete-entry", server.base_url),
        json!({ "date": "2024-05-20" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let entry = entry_for(&client, &server, "2024-05-20").await;
    assert!(entry["drinking"].is_null());
    assert!(entry["gambling"].is_null());

    let response = client
        .get(format!("{}/api/report.csv?start_date=bogus", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn http_calendar_page_shows_selected_entry() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let response = post_json(
        &client,
        format!("{}/api/log-activity", server.base_url),
        json!({ "date": "2024-07-04", "activities": { "drinking": { "drinks": "<2>" } } }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let html = client
        .get(format!(
            "{}/calendar?month=2024-07&date=2024-07-04",
            server.base_url
        ))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(html.contains(r#"<h1 id="monthLabel">July 2024</h1>"#));
    assert!(html.contains("Independence Day"));
    assert!(html.contains("Thursday, July 4, 2024"));
    assert!(html.contains("Edit Activity for 2024-07-04"));
    assert!(html.contains("&lt;2&gt;"));
    assert!(!html.contains("<2>"));
    assert!(html.contains(r#"id="nextMonth" href="/calendar?month=2024-08""#));
}
