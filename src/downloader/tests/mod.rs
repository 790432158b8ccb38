use super::*;
use crate::downloader::test_helpers::{
    collect_snapshots, create_test_downloader, create_test_downloader_with,
};
use crate::types::ItemStatus;
use std::io::Read;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};


/// Mount a GET route returning `body` on `server`
async fn mount_image(server: &MockServer, route: &str, body: Vec<u8>) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
        .mount(server)
        .await;
}

/// Entry names and sizes of a ZIP held in memory
fn zip_listing(bytes: Vec<u8>) -> Vec<(String, usize)> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
    (0..archive.len())
        .map(|i| {
            let mut entry = archive.by_index(i).unwrap();
            let mut data = Vec::new();
            entry.read_to_end(&mut data).unwrap();
            (entry.name().to_string(), data.len())
        })
        .collect()
}
