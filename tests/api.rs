use axum::{Json, Router, extract::Path, routing::get};
use image::{Rgba, RgbaImage};
use pretty_assertions::assert_eq;
use realiza_site::{AppState, Config, router};
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use tempfile::TempDir;

const FRAME: Rgba<u8> = Rgba([60, 62, 64, 255]);
const SKY: Rgba<u8> = Rgba([120, 170, 230, 255]);

struct Site {
    base: String,
    http: Client,
    _assets: TempDir,
}

impl Site {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn get(&self, path: &str) -> (StatusCode, Value) {
        let response = self.http.get(self.url(path)).send().await.unwrap();
        let status = response.status();
        (status, response.json().await.unwrap_or(Value::Null))
    }

    async fn send(&self, method: reqwest::Method, path: &str, body: Value) -> (StatusCode, Value) {
        let response = self.http.request(method, self.url(path)).json(&body).send().await.unwrap();
        let status = response.status();
        (status, response.json().await.unwrap_or(Value::Null))
    }

    async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        self.send(reqwest::Method::POST, path, body).await
    }

    async fn put(&self, path: &str, body: Value) -> (StatusCode, Value) {
        self.send(reqwest::Method::PUT, path, body).await
    }

    async fn open(&self, page: &str) -> String {
        let (status, view) = self.post("/api/sessions", json!({ "page": page })).await;
        assert_eq!(status, StatusCode::CREATED);
        view["id"].as_str().unwrap().to_string()
    }
}

async fn postal_stub(Path(code): Path<String>) -> Json<Value> {
    match code.as_str() {
        "13251785" => Json(json!({
            "cep": "13251-785",
            "logradouro": "Rua Monica Scnavinatto",
            "bairro": "Jardim Panorama",
            "localidade": "Itatiba",
            "uf": "SP"
        })),
        _ => Json(json!({ "erro": true })),
    }
}

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

async fn spawn_site() -> Site {
    let assets = tempfile::tempdir().unwrap();
    let mut photo = RgbaImage::new(2, 1);
    photo.put_pixel(0, 0, FRAME);
    photo.put_pixel(1, 0, SKY);
    photo.save(assets.path().join("preview.png")).unwrap();

    let postal = serve(Router::new().route("/ws/{code}/json/", get(postal_stub))).await;
    let config = Config {
        assets_dir: assets.path().to_path_buf(),
        preview_image: "preview.png".into(),
        postal_base_url: postal,
        submit_delay_ms: 0,
        ..Config::default()
    };
    let state = AppState::new(&config).unwrap();
    let base = serve(router(state)).await;

    Site {
        base,
        http: Client::new(),
        _assets: assets,
    }
}

#[tokio::test]
async fn catalog_and_pages_are_listed() {
    let site = spawn_site().await;

    let (status, health) = site.get("/api/health").await;
    assert_eq!((status, health), (StatusCode::OK, json!({ "status": "ok" })));

    let (_, lines) = site.get("/api/catalog").await;
    let ids: Vec<_> = lines.as_array().unwrap().iter().map(|l| l["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["suprema", "gold", "perfetta", "acm", "aluminio"]);

    let (status, acm) = site.get("/api/catalog/acm").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(acm["colors"], json!([]));
    assert_eq!(acm["solid_colors"].as_array().unwrap().len(), 2);

    let (status, error) = site.get("/api/catalog/portas").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(error["error"].as_str().unwrap().contains("portas"));

    let (_, selector) = site.get("/api/catalog/gold/selector?selected=walnut").await;
    let selected: Vec<_> = selector["wood"]["tiles"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|tile| tile["selected"] == json!(true))
        .map(|tile| tile["color"]["id"].as_str().unwrap())
        .collect();
    assert_eq!(selected, vec!["walnut"]);

    let (_, pages) = site.get("/api/pages").await;
    assert_eq!(pages["pages"].as_array().unwrap().len(), 13);
    assert_eq!(pages["whatsapp_url"], json!("https://wa.me/message/X4KQ726JGQX5B1"));
}

#[tokio::test]
async fn quote_flow_from_mount_to_record() {
    let site = spawn_site().await;
    let id = site.open("orcamento").await;

    let (_, view) = site.get(&format!("/api/sessions/{id}")).await;
    assert_eq!(view["line"]["id"], json!("perfetta"));
    assert_eq!(view["submit_enabled"], json!(false));
    assert_eq!(view["summary"]["hint"], json!("Selecione uma cor acima"));

    let (status, view) = site.put(&format!("/api/sessions/{id}/color"), json!({ "color_id": "walnut" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["selected_color"]["name"], json!("Nogueira"));
    assert_eq!(view["submit_enabled"], json!(true));

    let (_, view) = site.put(&format!("/api/sessions/{id}/line"), json!({ "line": "gold" })).await;
    assert_eq!(view["line"]["id"], json!("gold"));
    assert!(view.get("selected_color").is_none());

    let (status, error) = site.put(&format!("/api/sessions/{id}/color"), json!({ "color_id": "acm-black" })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(error["error"].as_str().unwrap().contains("acm-black"));

    site.put(&format!("/api/sessions/{id}/color"), json!({ "color_id": "cherry" })).await;
    let (status, outcome) = site
        .post(
            &format!("/api/sessions/{id}/submit"),
            json!({ "name": "Ana Silva", "email": "ana@example.com", "phone": "11999999999" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["redirect"], json!("/obrigado"));
    assert_eq!(outcome["notice"]["level"], json!("success"));
    assert_eq!(outcome["record"]["product_line"], json!("gold"));
    assert_eq!(outcome["record"]["color"]["name"], json!("Cereja"));
    assert_eq!(outcome["record"]["name"], json!("Ana Silva"));
}

#[tokio::test]
async fn submit_errors_map_to_statuses() {
    let site = spawn_site().await;

    let budget = site.open("orcamento-linhas").await;
    let (status, error) = site
        .post(
            &format!("/api/sessions/{budget}/submit"),
            json!({ "name": "Ana Silva", "email": "ana@example.com", "phone": "11999999999" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["notice"]["message"], json!("Por favor, selecione uma cor"));

    let contact = site.open("contato").await;
    let (status, error) = site
        .post(
            &format!("/api/sessions/{contact}/submit"),
            json!({
                "name": "Ana Silva",
                "email": "not-an-email",
                "phone": "11999999999",
                "message": "Quero esquadrias novas"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error["fields"], json!([{ "field": "email", "message": "E-mail inválido" }]));

    let (status, _) = site.post("/api/sessions/nope/submit", json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let response = site
        .http
        .post(site.url(&format!("/api/sessions/{contact}/submit")))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_line_falls_back_with_notice() {
    let site = spawn_site().await;
    let id = site.open("lp-acm").await;

    let (_, view) = site.get(&format!("/api/sessions/{id}")).await;
    assert_eq!(view["line"]["id"], json!("acm"));

    let (status, view) = site.put(&format!("/api/sessions/{id}/line"), json!({ "line": "brise" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["line"]["id"], json!("perfetta"));
    assert_eq!(view["notice"]["level"], json!("info"));
}

#[tokio::test]
async fn preview_recolors_only_frames() {
    let site = spawn_site().await;
    let id = site.open("landing").await;
    site.put(&format!("/api/sessions/{id}/color"), json!({ "color_id": "white" })).await;

    let response = site.http.get(site.url(&format!("/api/sessions/{id}/preview.png"))).send().await.unwrap();
    assert_eq!(response.headers()["content-type"], "image/png");
    let bytes = response.bytes().await.unwrap();
    let rendered = image::load_from_memory(&bytes).unwrap().to_rgba8();

    assert_eq!(rendered.dimensions(), (2, 1));
    // 60*0.4 + 255*0.6 = 177, 62*0.4 + 153 = 177.8, 64*0.4 + 153 = 178.6
    assert_eq!(rendered.get_pixel(0, 0).0, [177, 178, 179, 255]);
    assert_eq!(*rendered.get_pixel(1, 0), SKY);

    let (_, info) = site.get(&format!("/api/sessions/{id}/preview")).await;
    assert_eq!(info["caption"], json!("Linha Perfetta - Branco"));
    assert_eq!(info["photographic"], json!(true));
    assert_eq!(info["swatch"], json!({ "kind": "fill", "hex": "#ffffff" }));
}

#[tokio::test]
async fn bonus_only_where_offered() {
    let site = spawn_site().await;

    let landing = site.open("lp-4us").await;
    let (status, sent) = site.post(&format!("/api/sessions/{landing}/bonus"), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sent["notice"]["message"], json!("Guia enviado para seu e-mail!"));

    let contact = site.open("contato").await;
    let (status, _) = site.post(&format!("/api/sessions/{contact}/bonus"), json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let aluminio = site.open("lp-aluminio").await;
    let (status, sent) = site.post(&format!("/api/sessions/{aluminio}/bonus"), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert!(sent["bonus"]["title"].as_str().unwrap().starts_with("Bônus Exclusivo"));
}

#[tokio::test]
async fn postal_lookup_fills_or_keeps_fields() {
    let site = spawn_site().await;

    let (status, filled) = site
        .post("/api/postal/lookup", json!({ "code": "13251-785", "address": { "number": "57" } }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(filled["address"]["city"], json!("Itatiba"));
    assert_eq!(filled["address"]["number"], json!("57"));
    assert!(filled.get("notice").is_none());

    let (status, kept) = site
        .post("/api/postal/lookup", json!({ "code": "99999999", "address": { "city": "Jundiaí" } }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(kept["address"]["city"], json!("Jundiaí"));
    assert_eq!(kept["notice"]["message"], json!("CEP não encontrado"));

    let (status, _) = site.post("/api/postal/lookup", json!({ "code": "123" })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn sessions_unmount_and_images_are_served() {
    let site = spawn_site().await;
    let id = site.open("orcamento").await;

    let response = site.http.delete(site.url(&format!("/api/sessions/{id}"))).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let (status, _) = site.get(&format!("/api/sessions/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = site.post("/api/sessions", json!({ "page": "nao-existe" })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let response = site.http.get(site.url("/images/preview.png")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
