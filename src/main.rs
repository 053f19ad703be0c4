use std::fs;
use std::rc::Rc;

use anyhow::{Context as AnyhowContext, Result};
use qloader::scenario::{replay, scan_page, stub_handlers, InvocationCounter, Scenario};
use qloader::{HtmlDocument, HtmlNode, Loader, LoaderConfig, LoggingHost, ModuleRegistry, ReadyState};
use tokio::task::LocalSet;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() {
    let config = LoaderConfig::from_env().unwrap_or_else(|err| {
        eprintln!("Failed to load loader configuration: {err}. Using defaults.");
        LoaderConfig::load(None).expect("default config")
    });

    let subscriber_result = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .with_target(false)
        .try_init();
    if subscriber_result.is_err() {
        // tracing was already initialised; continue silently
    }

    let mut args = std::env::args().skip(1);
    let Some(page_path) = args.next() else {
        eprintln!("usage: qloader <page.html> [scenario.yaml]");
        std::process::exit(2);
    };
    let scenario_path = args.next();

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();

    let local = LocalSet::new();
    if let Err(err) = local.block_on(&rt, run(config, page_path, scenario_path)) {
        error!(target = "qloader", error = %err, "replay failed");
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

async fn run(config: LoaderConfig, page_path: String, scenario_path: Option<String>) -> Result<()> {
    let html = fs::read_to_string(&page_path)
        .with_context(|| format!("failed to read page {page_path}"))?;
    let scenario = match scenario_path {
        Some(path) => {
            let source = fs::read_to_string(&path)
                .with_context(|| format!("failed to read scenario {path}"))?;
            Scenario::from_yaml(&source)?
        }
        None => Scenario::default(),
    };

    let doc = Rc::new(HtmlDocument::parse(&html, config.base_uri.clone()));
    let manifest = scan_page(&doc);
    info!(
        target = "qloader",
        events = manifest.events.len(),
        modules = manifest.modules.len(),
        "scanned page"
    );

    let host = Rc::new(
        LoggingHost::new(config.idle_timeout)
            .with_queued_events(manifest.events.iter().cloned().collect()),
    );
    let registry = Rc::new(ModuleRegistry::<HtmlNode>::new());
    let loader = Loader::new(Rc::clone(&doc), host.clone(), registry.clone());
    let counter = InvocationCounter::default();
    stub_handlers(&manifest, &loader, &registry, &counter);

    let Some(loader) = loader.bootstrap(false) else {
        return Ok(());
    };

    doc.set_ready_state(ReadyState::Complete);
    loader.process_ready_state_change();

    let summary = replay(&loader, &scenario).await?;
    tokio::time::sleep(config.idle_timeout).await;
    tokio::task::yield_now().await;

    info!(
        target = "qloader",
        events = summary.events,
        skipped = summary.skipped,
        handlers = counter.get(),
        errors = host.error_count(),
        "replay finished"
    );
    Ok(())
}
