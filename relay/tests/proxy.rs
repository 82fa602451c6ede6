use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use actix_web::dev::ServerHandle;
use actix_web::http::{header, Method, StatusCode};
use actix_web::{test, web, App, HttpResponse, HttpServer};
use relay::{Config, ErrorEnvelope};
use serde_json::{json, Value};

const PREDICTION: &str = r#"{"predicted_churn_status":"Churn (Likely to leave)","probability_of_churn":0.78,"risk_level":"High","recommendations":["Offer contract upgrade"]}"#;

#[derive(Clone)]
enum Behavior {
    Respond(u16, &'static str),
    Stall(Duration),
}

struct UpstreamState {
    behavior: Behavior,
    hits: AtomicUsize,
    received: Mutex<Vec<Value>>,
}

struct MockUpstream {
    addr: SocketAddr,
    state: web::Data<UpstreamState>,
    handle: ServerHandle,
}

impl MockUpstream {
    fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }

    fn received(&self) -> Vec<Value> {
        self.state.received.lock().unwrap().clone()
    }

    async fn stop(self) {
        self.handle.stop(false).await;
    }
}

async fn upstream_predict(
    body: web::Json<Value>,
    state: web::Data<UpstreamState>,
) -> HttpResponse {
    state.hits.fetch_add(1, Ordering::SeqCst);
    state.received.lock().unwrap().push(body.into_inner());

    match state.behavior.clone() {
        Behavior::Respond(status, body) => {
            HttpResponse::build(StatusCode::from_u16(status).unwrap())
                .content_type("application/json")
                .body(body)
        }
        Behavior::Stall(delay) => {
            actix_web::rt::time::sleep(delay).await;
            HttpResponse::Ok().body(PREDICTION)
        }
    }
}

fn spawn_upstream(behavior: Behavior) -> MockUpstream {
    let state = web::Data::new(UpstreamState {
        behavior,
        hits: AtomicUsize::new(0),
        received: Mutex::new(Vec::new()),
    });

    let app_state = state.clone();
    let server = HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .route("/predict", web::post().to(upstream_predict))
    })
    .workers(1)
    .bind(("127.0.0.1", 0))
    .unwrap();
    let addr = server.addrs()[0];
    let server = server.run();
    let handle = server.handle();
    actix_web::rt::spawn(server);

    MockUpstream {
        addr,
        state,
        handle,
    }
}

macro_rules! relay_app {
    ($config:expr) => {
        test::init_service(
            App::new()
                .app_data(relay::app_state($config))
                .wrap(relay::cors::cors_headers())
                .configure(relay::routes),
        )
        .await
    };
}

fn customer_record() -> Value {
    json!({
        "gender": "Male",
        "SeniorCitizen": 0,
        "Partner": "No",
        "Dependents": "No",
        "tenure": 8,
        "PhoneService": "Yes",
        "MultipleLines": "No",
        "InternetService": "Fiber optic",
        "OnlineSecurity": "No",
        "OnlineBackup": "No",
        "DeviceProtection": "No",
        "TechSupport": "No",
        "StreamingTV": "Yes",
        "StreamingMovies": "No",
        "Contract": "Month-to-month",
        "PaperlessBilling": "Yes",
        "PaymentMethod": "Electronic check",
        "MonthlyCharges": 89.5,
        "TotalCharges": 716
    })
}

fn assert_cors(headers: &header::HeaderMap) {
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "*"
    );
    let allowed = headers
        .get(header::ACCESS_CONTROL_ALLOW_HEADERS)
        .unwrap()
        .to_str()
        .unwrap();
    for name in ["authorization", "apikey", "content-type", "x-client-info"] {
        assert!(allowed.contains(name), "{name} missing from {allowed}");
    }
}

#[actix_web::test]
async fn preflight_answers_without_contacting_upstream() {
    let upstream = spawn_upstream(Behavior::Respond(200, PREDICTION));
    let app = relay_app!(Config::new(upstream.url()));

    let req = test::TestRequest::default()
        .method(Method::OPTIONS)
        .uri("/predict-proxy")
        .insert_header((header::ORIGIN, "https://churnsense.example"))
        .insert_header((header::ACCESS_CONTROL_REQUEST_METHOD, "POST"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_cors(resp.headers());
    assert!(test::read_body(resp).await.is_empty());
    assert_eq!(upstream.hits(), 0);
    upstream.stop().await;
}

#[actix_web::test]
async fn success_body_is_relayed_verbatim() {
    let upstream = spawn_upstream(Behavior::Respond(200, PREDICTION));
    let app = relay_app!(Config::new(upstream.url()));

    let req = test::TestRequest::post()
        .uri("/predict-proxy")
        .set_json(customer_record())
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_cors(resp.headers());
    assert_eq!(
        resp.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
    assert_eq!(test::read_body(resp).await, PREDICTION.as_bytes());
    assert_eq!(upstream.hits(), 1);
    assert_eq!(upstream.received()[0], customer_record());
    upstream.stop().await;
}

#[actix_web::test]
async fn array_wrapped_values_are_sanitized_before_forwarding() {
    let upstream = spawn_upstream(Behavior::Respond(200, PREDICTION));
    let app = relay_app!(Config::new(upstream.url()));

    let mut record = customer_record();
    record["tenure"] = json!([8]);
    record["gender"] = json!(["Male"]);
    record["SeniorCitizen"] = json!("1");
    record["MonthlyCharges"] = json!(["89.5"]);
    record["customerID"] = json!(["7590-VHVEG"]);

    let req = test::TestRequest::post()
        .uri("/predict-proxy")
        .set_json(record)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let received = upstream.received();
    let forwarded = &received[0];
    assert_eq!(forwarded["tenure"], json!(8));
    assert_eq!(forwarded["gender"], json!("Male"));
    assert_eq!(forwarded["SeniorCitizen"], json!(1));
    assert_eq!(forwarded["MonthlyCharges"], json!(89.5));
    assert_eq!(forwarded["customerID"], json!("7590-VHVEG"));
    upstream.stop().await;
}

#[actix_web::test]
async fn upstream_failure_status_and_body_are_forwarded() {
    let detail = r#"{"detail":"Invalid value '[1]' for dtype 'str'"}"#;
    let upstream = spawn_upstream(Behavior::Respond(422, detail));
    let app = relay_app!(Config::new(upstream.url()));

    let req = test::TestRequest::post()
        .uri("/predict-proxy")
        .set_json(customer_record())
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_cors(resp.headers());
    let envelope: ErrorEnvelope = test::read_body_json(resp).await;
    assert_eq!(envelope.error, "Upstream API error 422");
    assert_eq!(envelope.detail, detail);
    upstream.stop().await;
}

#[actix_web::test]
async fn slow_upstream_becomes_gateway_timeout() {
    let upstream = spawn_upstream(Behavior::Stall(Duration::from_secs(3)));
    let config = Config::new(upstream.url()).with_upstream_timeout(Duration::from_millis(200));
    let app = relay_app!(config);

    let req = test::TestRequest::post()
        .uri("/predict-proxy")
        .set_json(customer_record())
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::GATEWAY_TIMEOUT);
    assert_cors(resp.headers());
    let envelope: ErrorEnvelope = test::read_body_json(resp).await;
    assert_eq!(envelope.error, "Proxy error");
    assert!(envelope.detail.contains("cold-starting"), "{}", envelope.detail);
    upstream.stop().await;
}

#[actix_web::test]
async fn malformed_body_is_a_proxy_error() {
    let upstream = spawn_upstream(Behavior::Respond(200, PREDICTION));
    let app = relay_app!(Config::new(upstream.url()));

    for body in ["not json", "[1, 2, 3]"] {
        let req = test::TestRequest::post()
            .uri("/predict-proxy")
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .set_payload(body)
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_cors(resp.headers());
        let envelope: ErrorEnvelope = test::read_body_json(resp).await;
        assert_eq!(envelope.error, "Proxy error");
    }
    assert_eq!(upstream.hits(), 0);
    upstream.stop().await;
}

#[actix_web::test]
async fn oversized_body_is_a_proxy_error() {
    let upstream = spawn_upstream(Behavior::Respond(200, PREDICTION));
    let app = relay_app!(Config::new(upstream.url()));

    let mut record = customer_record();
    record["notes"] = json!("x".repeat(300_000));
    let req = test::TestRequest::post()
        .uri("/predict-proxy")
        .set_json(record)
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_cors(resp.headers());
    let envelope: ErrorEnvelope = test::read_body_json(resp).await;
    assert_eq!(envelope.error, "Proxy error");
    assert!(envelope.detail.starts_with("request body could not be read"));
    assert_eq!(upstream.hits(), 0);
    upstream.stop().await;
}

#[actix_web::test]
async fn unreachable_upstream_is_a_proxy_error() {
    // Nothing listens on port 1.
    let app = relay_app!(Config::new("http://127.0.0.1:1"));

    let req = test::TestRequest::post()
        .uri("/predict-proxy")
        .set_json(customer_record())
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let envelope: ErrorEnvelope = test::read_body_json(resp).await;
    assert_eq!(envelope.error, "Proxy error");
    assert!(envelope.detail.starts_with("upstream request failed"));
}

#[actix_web::test]
async fn health_and_unknown_routes_carry_cors_headers() {
    let app = relay_app!(Config::new("http://127.0.0.1:1"));

    let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_cors(resp.headers());
    assert_eq!(test::read_body(resp).await, "OK".as_bytes());

    let resp = test::call_service(&app, test::TestRequest::get().uri("/nope").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_cors(resp.headers());
}

#[actix_web::test]
async fn configured_key_gates_predictions_only() {
    let upstream = spawn_upstream(Behavior::Respond(200, PREDICTION));
    let app = relay_app!(Config::new(upstream.url()).with_api_key("anon-key"));

    let req = test::TestRequest::post()
        .uri("/predict-proxy")
        .set_json(customer_record())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_cors(resp.headers());
    assert_eq!(upstream.hits(), 0);

    let req = test::TestRequest::post()
        .uri("/predict-proxy")
        .insert_header(("apikey", "anon-key"))
        .insert_header((header::AUTHORIZATION, "Bearer anon-key"))
        .set_json(customer_record())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(upstream.hits(), 1);

    let req = test::TestRequest::default()
        .method(Method::OPTIONS)
        .uri("/predict-proxy")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    upstream.stop().await;
}

#[actix_web::test]
async fn run_serves_on_the_given_listener() {
    let upstream = spawn_upstream(Behavior::Respond(200, PREDICTION));
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let server = relay::run(Config::new(upstream.url()), listener).unwrap();
    let handle = server.handle();
    actix_web::rt::spawn(server);

    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/predict-proxy"))
        .json(&customer_record())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    assert_eq!(
        resp.headers()
            .get("access-control-allow-origin")
            .unwrap()
            .to_str()
            .unwrap(),
        "*"
    );
    assert_eq!(resp.text().await.unwrap(), PREDICTION);

    handle.stop(false).await;
    upstream.stop().await;
}
