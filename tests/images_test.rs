//! Image API tests: upload, list, stream and delete.

mod common;

use common::{base_url, upload_form, TestHarness};
use serde_json::{json, Value};

const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nnot-really-a-png";

#[tokio::test]
async fn upload_list_and_fetch() {
    let (_harness, addr) = TestHarness::with_server().await;
    let client = reqwest::Client::new();
    let base = base_url(addr);

    let resp = client
        .post(format!("{base}/api/images/create"))
        .multipart(upload_form("portal/trips/", "sunset.png", "image/png", PNG_BYTES))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let image: Value = resp.json().await.unwrap();
    assert_eq!(image["id"], "portal/trips/sunset.png");
    assert_eq!(image["name"], "sunset.png");
    assert_eq!(image["size"], PNG_BYTES.len());

    let images: Vec<Value> = client
        .get(format!("{base}/api/images?prefix=portal/trips/"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(images.len(), 1);
    assert_eq!(images[0]["id"], "portal/trips/sunset.png");
    assert_eq!(images[0]["url"], "/api/images/portal/trips/sunset.png");

    let resp = client
        .get(format!("{base}/api/images/portal/trips/sunset.png"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers()["content-type"], "image/png");
    let body = resp.bytes().await.unwrap();
    assert_eq!(body.len(), PNG_BYTES.len());
}

#[tokio::test]
async fn upload_to_root_when_folder_path_empty() {
    let (harness, addr) = TestHarness::with_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/api/images/create", base_url(addr)))
        .multipart(upload_form("", "cover.jpg", "image/jpeg", b"jpg"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    assert_eq!(harness.keys(), vec!["portal/cover.jpg".to_string()]);
}

#[tokio::test]
async fn upload_rejects_disallowed_extension() {
    let (harness, addr) = TestHarness::with_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/api/images/create", base_url(addr)))
        .multipart(upload_form("portal/", "notes.txt", "text/plain", b"hello"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let err: Value = resp.json().await.unwrap();
    assert_eq!(err["code"], "validation_error");
    assert!(harness.keys().is_empty());
}

#[tokio::test]
async fn upload_without_file_is_rejected() {
    let (_harness, addr) = TestHarness::with_server().await;
    let client = reqwest::Client::new();
    let form = reqwest::multipart::Form::new().text("folderPath", "portal/");

    let resp = client
        .post(format!("{}/api/images/create", base_url(addr)))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn batch_upload_is_all_or_nothing_on_validation() {
    let (harness, addr) = TestHarness::with_server().await;
    let client = reqwest::Client::new();
    let base = base_url(addr);

    let part = |name: &str, data: &'static [u8]| {
        reqwest::multipart::Part::bytes(data).file_name(name.to_string())
    };

    let form = reqwest::multipart::Form::new()
        .part("files", part("a.png", b"a"))
        .part("files", part("b.exe", b"b"))
        .text("folderPath", "portal/batch/");
    let resp = client
        .post(format!("{base}/api/images/batch"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    assert!(harness.keys().is_empty());

    let form = reqwest::multipart::Form::new()
        .part("files", part("a.png", b"a"))
        .part("files", part("b.webp", b"b"))
        .text("folderPath", "portal/batch/");
    let resp = client
        .post(format!("{base}/api/images/batch"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let images: Vec<Value> = resp.json().await.unwrap();
    assert_eq!(images.len(), 2);
    assert_eq!(
        harness.keys(),
        vec!["portal/batch/a.png".to_string(), "portal/batch/b.webp".to_string()]
    );
}

#[tokio::test]
async fn listing_skips_markers_and_non_images() {
    let (harness, addr) = TestHarness::with_server().await;
    harness.seed("portal/trips/", b"").await;
    harness.seed("portal/trips/a.jpg", b"a").await;
    harness.seed("portal/trips/readme.md", b"r").await;
    harness.seed("portal/trips/deeper/b.png", b"b").await;

    let images: Vec<Value> = reqwest::get(format!("{}/api/images?prefix=portal/trips", base_url(addr)))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let ids: Vec<&str> = images.iter().filter_map(|i| i["id"].as_str()).collect();
    assert_eq!(ids, vec!["portal/trips/a.jpg"]);
}

#[tokio::test]
async fn missing_image_is_404() {
    let (_harness, addr) = TestHarness::with_server().await;
    let resp = reqwest::get(format!("{}/api/images/portal/nope.png", base_url(addr)))
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let err: Value = resp.json().await.unwrap();
    assert_eq!(err["code"], "not_found");
}

#[tokio::test]
async fn delete_images_reports_each_key() {
    let (harness, addr) = TestHarness::with_server().await;
    harness.seed("portal/a.png", b"a").await;
    harness.seed("portal/b.png", b"b").await;

    let resp = reqwest::Client::new()
        .delete(format!("{}/api/images/delete", base_url(addr)))
        .json(&json!({"imageKeys": ["portal/a.png", "portal/missing.png"]}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let report: Value = resp.json().await.unwrap();
    assert_eq!(report["results"][0]["status"], "deleted");
    assert_eq!(report["results"][1]["status"], "absent");
    assert_eq!(harness.keys(), vec!["portal/b.png".to_string()]);
}

#[tokio::test]
async fn mixed_selection_delete() {
    let (harness, addr) = TestHarness::with_server().await;
    harness.seed("portal/trips/", b"").await;
    harness.seed("portal/trips/x.png", b"x").await;
    harness.seed("portal/top.png", b"t").await;
    harness.seed("portal/keep.png", b"k").await;

    let resp = reqwest::Client::new()
        .delete(format!("{}/api/items/delete", base_url(addr)))
        .json(&json!({"ids": ["portal/trips/", "portal/top.png"]}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let report: Value = resp.json().await.unwrap();
    assert_eq!(report["results"].as_array().unwrap().len(), 2);
    assert_eq!(harness.keys(), vec!["portal/keep.png".to_string()]);
}
