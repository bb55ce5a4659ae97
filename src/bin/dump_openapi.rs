use std::fs;

use utoipa::OpenApi;

fn main() -> anyhow::Result<()> {
    let doc = catalog_gate::docs::ApiDoc::openapi();
    let s = serde_json::to_string_pretty(&doc)?;
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "/tmp/catalog-gate-openapi.json".to_string());
    fs::write(&path, s)?;
    println!("wrote {}", path);
    Ok(())
}
