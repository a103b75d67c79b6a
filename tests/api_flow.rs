use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, put};
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::net::TcpListener;

use nexile_admin::api::models::{ImageRef, ItemField, Section};
use nexile_admin::api::{ApiClient, ApiError};
use nexile_admin::state::{ContactsState, ServicesState};

#[derive(Debug, Clone, Default)]
struct Call {
    method: String,
    path: String,
    texts: Vec<(String, String)>,
    /// Field name, file name, size and declared content type of each file part.
    files: Vec<(String, String, usize, Option<String>)>,
}

impl Call {
    fn text(&self, name: &str) -> Option<&str> {
        self.texts.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str())
    }
}

#[derive(Clone, Default)]
struct FakeApi {
    calls: Arc<Mutex<Vec<Call>>>,
}

impl FakeApi {
    fn record(&self, method: &str, path: String) {
        self.push(Call { method: method.into(), path, ..Call::default() });
    }

    fn push(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn summary(&self) -> Vec<String> {
        self.calls().iter().map(|c| format!("{} {}", c.method, c.path)).collect()
    }

    async fn record_multipart(&self, method: &str, path: String, mut multipart: Multipart) {
        let mut call = Call { method: method.into(), path, ..Call::default() };
        while let Ok(Some(field)) = multipart.next_field().await {
            let name = field.name().unwrap_or_default().to_string();
            let file_name = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);
            let bytes = field.bytes().await.unwrap_or_default();
            match file_name {
                Some(file_name) => call.files.push((name, file_name, bytes.len(), content_type)),
                None => call.texts.push((name, String::from_utf8_lossy(&bytes).into_owned())),
            }
        }
        self.push(call);
    }
}

async fn list_contacts(State(api): State<FakeApi>) -> Json<Value> {
    api.record("GET", "/contact".into());
    Json(json!([
        { "_id": "1", "name": "Ann Lee", "email": "ann@x.com", "phone": "555", "service": "Branding",
          "subject": "Hi", "message": "Hello there", "web": "annlee.dev" },
        { "_id": "2", "name": "Bob Stone", "email": "bob@y.org", "message": "Need a site" }
    ]))
}

async fn delete_contact(State(api): State<FakeApi>, Path(id): Path<String>) -> StatusCode {
    api.record("DELETE", format!("/contact/{id}"));
    if id == "broken" { StatusCode::INTERNAL_SERVER_ERROR } else { StatusCode::OK }
}

async fn list_services(State(api): State<FakeApi>) -> Json<Value> {
    api.record("GET", "/service".into());
    Json(json!([
        { "_id": "42", "title": "Web Design", "subtitle": "Sites that sell",
          "mainServiceImage": "https://cdn.example.com/42.png", "tools": ["rs,ts"],
          "approach": [{ "title": "Listen", "description": "We listen", "image": "https://cdn.example.com/a.png" }],
          "process": [{ "title": "Build", "description": "We build", "image": "" }],
          "why": [{ "title": "Care", "description": "We care", "image": "" }] }
    ]))
}

async fn create_service(State(api): State<FakeApi>, multipart: Multipart) -> StatusCode {
    api.record_multipart("POST", "/service".into(), multipart).await;
    StatusCode::CREATED
}

async fn update_service(State(api): State<FakeApi>, Path(id): Path<String>, multipart: Multipart) -> StatusCode {
    let missing = id == "missing";
    api.record_multipart("PUT", format!("/service/{id}"), multipart).await;
    if missing { StatusCode::NOT_FOUND } else { StatusCode::OK }
}

async fn delete_service(State(api): State<FakeApi>, Path(id): Path<String>) -> StatusCode {
    api.record("DELETE", format!("/service/{id}"));
    StatusCode::OK
}

async fn tech_stacks(State(api): State<FakeApi>) -> Json<Value> {
    api.record("GET", "/techStack".into());
    Json(json!({ "techStack": [
        { "_id": "rs", "title": "Rust", "image": "https://cdn.example.com/rs.png" },
        { "_id": "ts", "title": "TypeScript", "image": "https://cdn.example.com/ts.png" },
        { "_id": "go", "title": "Go", "image": "https://cdn.example.com/go.png" }
    ]}))
}

const PNG_BYTES: &[u8] = b"\x89PNG fake image bytes";

async fn uploaded_image(State(api): State<FakeApi>, Path(name): Path<String>) -> Result<Vec<u8>, StatusCode> {
    api.record("GET", format!("/uploads/{name}"));
    if name == "gone.png" { Err(StatusCode::NOT_FOUND) } else { Ok(PNG_BYTES.to_vec()) }
}

/// Serve the fake API under `/api` on an ephemeral port.
async fn start_server() -> anyhow::Result<(ApiClient, FakeApi)> {
    let fake = FakeApi::default();
    let routes = Router::new()
        .route("/contact", get(list_contacts))
        .route("/contact/:id", delete(delete_contact))
        .route("/service", get(list_services).post(create_service))
        .route("/service/:id", put(update_service).delete(delete_service))
        .route("/techStack", get(tech_stacks))
        .route("/uploads/:name", get(uploaded_image))
        .with_state(fake.clone());
    let app = Router::new().nest("/api", routes);

    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            eprintln!("server error: {}", e);
        }
    });

    let client = ApiClient::new(&format!("http://{}/api", addr))?;
    Ok((client, fake))
}

fn temp_image(tag: &str) -> anyhow::Result<PathBuf> {
    let path = std::env::temp_dir().join(format!("nexile-admin-{}-{tag}.png", std::process::id()));
    std::fs::write(&path, PNG_BYTES)?;
    Ok(path)
}

#[tokio::test]
async fn contacts_load_then_delete_prunes_locally() -> anyhow::Result<()> {
    let (api, fake) = start_server().await?;
    let mut contacts = ContactsState::new();

    assert!(contacts.load(&api).await.is_none());
    assert_eq!(contacts.contacts().len(), 2);
    contacts.set_search("ANN");
    assert_eq!(contacts.visible().len(), 1);

    let notice = contacts.delete(&api, "1").await;
    assert!(!notice.is_error());
    assert_eq!(contacts.contacts().len(), 1);
    assert!(contacts.visible().is_empty());
    assert_eq!(fake.summary(), vec!["GET /contact", "DELETE /contact/1"]);
    Ok(())
}

#[tokio::test]
async fn failed_contact_delete_is_reported_and_row_kept() -> anyhow::Result<()> {
    let (api, _fake) = start_server().await?;
    let mut contacts = ContactsState::new();
    contacts.set_contacts(vec![nexile_admin::api::models::Contact {
        id: "broken".into(),
        name: "Broken".into(),
        ..Default::default()
    }]);

    let notice = contacts.delete(&api, "broken").await;
    assert!(notice.is_error());
    assert_eq!(contacts.contacts().len(), 1);
    Ok(())
}

#[tokio::test]
async fn load_fetches_services_and_catalog() -> anyhow::Result<()> {
    let (api, fake) = start_server().await?;
    let mut services = ServicesState::new();

    assert!(services.load(&api).await.is_none());
    assert!(!services.is_loading());
    assert_eq!(services.services().len(), 1);
    assert_eq!(services.catalog().len(), 3);

    let mut calls = fake.summary();
    calls.sort();
    assert_eq!(calls, vec!["GET /service", "GET /techStack"]);
    Ok(())
}

#[tokio::test]
async fn new_service_is_posted_and_list_refetched() -> anyhow::Result<()> {
    let (api, fake) = start_server().await?;
    let mut services = ServicesState::new();
    services.set_title("Branding");
    services.set_item_field(Section::Approach, 0, ItemField::Title, "Discover");

    let notice = services.submit(&api).await;
    assert_eq!(notice.message, "Service added successfully!");
    assert!(services.draft().title.is_empty());

    let calls = fake.calls();
    assert_eq!(calls[0].method, "POST");
    assert_eq!(calls[0].path, "/service");
    assert_eq!(calls[0].text("title"), Some("Branding"));
    assert_eq!(calls[0].text("tools"), Some(""));
    assert_eq!(calls[0].text("approach[0][title]"), Some("Discover"));
    assert!(calls[0].files.is_empty());

    let mut refetched: Vec<String> = fake.summary().split_off(1);
    refetched.sort();
    assert_eq!(refetched, vec!["GET /service", "GET /techStack"]);
    assert_eq!(services.services().len(), 1);
    Ok(())
}

#[tokio::test]
async fn edited_service_is_put_to_its_identifier() -> anyhow::Result<()> {
    let (api, fake) = start_server().await?;
    let mut services = ServicesState::new();
    services.load(&api).await;

    let existing = services.services()[0].clone();
    services.edit_service(&existing);
    let staged: Vec<&str> = services.staged().iter().map(|s| s.id.as_str()).collect();
    assert_eq!(staged, vec!["rs", "ts"]);
    services.set_title("Web Design & SEO");

    let notice = services.submit(&api).await;
    assert_eq!(notice.message, "Service updated successfully!");
    assert_eq!(services.editing_id(), Some("42"));

    let put = fake
        .calls()
        .into_iter()
        .find(|c| c.method == "PUT")
        .expect("PUT recorded");
    assert_eq!(put.path, "/service/42");
    assert_eq!(put.text("title"), Some("Web Design & SEO"));
    assert_eq!(put.text("tools"), Some("rs,ts"));
    assert!(put.files.is_empty(), "existing URLs must not be re-uploaded");
    Ok(())
}

#[tokio::test]
async fn pending_images_are_uploaded_as_files() -> anyhow::Result<()> {
    let (api, fake) = start_server().await?;
    let cover = temp_image("cover")?;
    let step = temp_image("step")?;

    let mut services = ServicesState::new();
    services.set_title("Branding");
    services.set_main_image(cover.clone());
    let index = services.add_item(Section::Process);
    services.set_item_image(Section::Process, index, step.clone());

    let notice = services.submit(&api).await;
    let _ = std::fs::remove_file(&cover);
    let _ = std::fs::remove_file(&step);
    assert!(!notice.is_error(), "{}", notice.message);

    let post = fake.calls().into_iter().find(|c| c.method == "POST").expect("POST recorded");
    let names: Vec<&str> = post.files.iter().map(|(n, _, _, _)| n.as_str()).collect();
    assert_eq!(names, vec!["mainServiceImage", "process[1][image]"]);
    let (_, file_name, size, _) = &post.files[0];
    assert!(file_name.ends_with("-cover.png"));
    assert_eq!(*size, PNG_BYTES.len());
    for (name, _, _, content_type) in &post.files {
        assert_eq!(content_type.as_deref(), Some("image/png"), "{name}");
    }
    Ok(())
}

#[tokio::test]
async fn uploaded_images_are_fetched_for_previews() -> anyhow::Result<()> {
    let (api, fake) = start_server().await?;
    let bytes = api.fetch_image(api.url(&["uploads", "logo.png"]).as_str()).await?;
    assert_eq!(bytes, PNG_BYTES);

    let missing = api.fetch_image(api.url(&["uploads", "gone.png"]).as_str()).await;
    assert!(matches!(missing, Err(ApiError::Status(s)) if s == reqwest::StatusCode::NOT_FOUND));
    assert!(matches!(api.fetch_image("not a url").await, Err(ApiError::InvalidEndpoint(_))));
    assert_eq!(fake.summary(), vec!["GET /uploads/logo.png", "GET /uploads/gone.png"]);
    Ok(())
}

#[tokio::test]
async fn unreadable_upload_fails_before_sending() -> anyhow::Result<()> {
    let (api, fake) = start_server().await?;
    let mut services = ServicesState::new();
    services.set_main_image(PathBuf::from("/definitely/not/here.png"));

    let notice = services.submit(&api).await;
    assert!(notice.is_error());
    assert!(fake.calls().is_empty());
    assert!(matches!(services.draft().main_service_image, ImageRef::Pending(_)));
    assert!(!services.is_submitting());
    Ok(())
}

#[tokio::test]
async fn failed_update_keeps_the_draft() -> anyhow::Result<()> {
    let (api, fake) = start_server().await?;
    let mut services = ServicesState::new();
    let mut ghost = nexile_admin::api::models::Service::blank();
    ghost.id = Some("missing".into());
    ghost.title = "Ghost".into();
    services.edit_service(&ghost);

    let notice = services.submit(&api).await;
    assert!(notice.is_error());
    assert_eq!(services.editing_id(), Some("missing"));
    assert_eq!(fake.summary(), vec!["PUT /service/missing"]);
    Ok(())
}

#[tokio::test]
async fn confirmed_delete_removes_service() -> anyhow::Result<()> {
    let (api, fake) = start_server().await?;
    let mut services = ServicesState::new();
    services.load(&api).await;
    let target = services.services()[0].clone();

    let declined = services.delete_service(&api, &target, |_| false).await;
    assert!(declined.is_none());
    assert_eq!(services.services().len(), 1);

    let mut prompt = String::new();
    let notice = services
        .delete_service(&api, &target, |text| {
            prompt = text.to_string();
            true
        })
        .await
        .expect("delete attempted");
    assert_eq!(prompt, "You are about to delete the service: Web Design");
    assert_eq!(notice.message, "Service: Web Design deleted successfully");
    assert!(services.services().is_empty());
    assert_eq!(fake.summary().last().map(String::as_str), Some("DELETE /service/42"));
    Ok(())
}

#[tokio::test]
async fn unreachable_api_yields_error_notices() -> anyhow::Result<()> {
    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr = listener.local_addr()?;
    drop(listener);
    let api = ApiClient::new(&format!("http://{}", addr))?;

    let mut contacts = ContactsState::new();
    let notice = contacts.load(&api).await.expect("failure notice");
    assert!(notice.is_error());

    let mut services = ServicesState::new();
    assert!(services.load(&api).await.is_some_and(|n| n.is_error()));
    assert!(!services.is_loading());

    assert!(matches!(api.services().await, Err(ApiError::Http(_))));
    Ok(())
}
