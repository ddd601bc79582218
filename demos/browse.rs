//! HAL browser example
//!
//! Loads a HAL resource and the resources along the given link relations,
//! then prints what was found.
//!
//! Run with: cargo run --example browse -- <uri> [rel ...]

use hypermedia_http::{ClientConfig, ClientRuntime, ResourceContext, ReqwestTransport};
use serde_json::{Map, Value};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let Some(uri) = args.next() else {
        eprintln!("usage: browse <uri> [rel ...]");
        return Ok(());
    };
    let rels: Vec<String> = args.collect();

    println!("HAL Browser Example");
    println!("===================\n");

    let transport = ReqwestTransport::with_config(ClientConfig {
        request_timeout_ms: 10_000,
        ..Default::default()
    });
    let context = ResourceContext::hal(ClientRuntime::new(transport));

    let paths: Map<String, Value> = rels
        .iter()
        .map(|rel| (rel.clone(), Value::Object(Map::new())))
        .collect();

    let root = context.get(&uri, None)?;
    root.load_paths(&Value::Object(paths), None).await?;

    println!("{}", root.uri());
    println!("  data: {}", Value::Object(root.data()));
    for (rel, links) in root.links() {
        for link in links {
            println!("  {} -> {}", rel, link.href);
        }
    }

    for rel in &rels {
        let Some(related) = root.resolve_link_relation(rel, None, None)? else {
            continue;
        };
        for resource in related {
            println!("\n{} ({})", resource.uri(), rel);
            println!("  data: {}", Value::Object(resource.data()));
        }
    }

    println!("\n{} resources cached", context.len());
    Ok(())
}
