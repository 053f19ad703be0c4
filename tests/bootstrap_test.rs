use std::rc::Rc;

use qloader::{
    HtmlDocument, HtmlNode, ListenerOptions, ListenerTarget, Loader, ModuleRegistry, ReadyState,
    RecordingHost, Signal,
};
use url::Url;

fn document(state: ReadyState) -> Rc<HtmlDocument> {
    let doc = Rc::new(HtmlDocument::parse(
        "<html q:container><body><button id=\"btn\" on:click=\"./a.js#s\">x</button></body></html>",
        Url::parse("https://example.com/").unwrap(),
    ));
    doc.set_ready_state(state);
    doc
}

fn loader(
    doc: &Rc<HtmlDocument>,
    host: &Rc<RecordingHost<HtmlNode>>,
) -> Loader<HtmlDocument> {
    Loader::new(
        Rc::clone(doc),
        host.clone(),
        Rc::new(ModuleRegistry::<HtmlNode>::new()),
    )
}

#[test]
fn test_queued_events_are_registered_on_bootstrap() {
    let doc = document(ReadyState::Loading);
    let host = Rc::new(RecordingHost::with_queued_events(&["click", "keydown"]));

    let loader = loader(&doc, &host).bootstrap(false).expect("bootstrap");

    assert_eq!(loader.state().registered_events(), vec!["click", "keydown"]);
    let listeners = host.listeners();
    assert!(listeners.contains(&(
        ListenerTarget::Document,
        "click".to_string(),
        ListenerOptions {
            capture: true,
            passive: false
        }
    )));
    assert!(listeners.contains(&(
        ListenerTarget::Window,
        "click".to_string(),
        ListenerOptions {
            capture: false,
            passive: false
        }
    )));
    assert_eq!(host.listener_count(ListenerTarget::Document, "readystatechange"), 1);
}

#[test]
fn test_registration_is_idempotent_per_event() {
    let doc = document(ReadyState::Loading);
    let host = Rc::new(RecordingHost::with_queued_events(&["click"]));
    let loader = loader(&doc, &host).bootstrap(false).expect("bootstrap");

    loader.register(&["click", "click", "input"]);
    let hook = loader.events_hook();
    hook.push(&["input", "click"]);
    hook.clone().push(&[String::from("scroll")]);

    for event in ["click", "input", "scroll"] {
        assert_eq!(host.listener_count(ListenerTarget::Document, event), 1, "{event}");
        assert_eq!(host.listener_count(ListenerTarget::Window, event), 1, "{event}");
    }
    assert_eq!(
        loader.state().registered_events(),
        vec!["click", "input", "scroll"]
    );
}

#[test]
fn test_second_bootstrap_on_same_document_is_noop() {
    let doc = document(ReadyState::Complete);
    let host = Rc::new(RecordingHost::new());

    let first = loader(&doc, &host).bootstrap(false);
    let second = loader(&doc, &host).bootstrap(false);

    assert!(first.is_some());
    assert!(second.is_none());
    assert_eq!(host.listener_count(ListenerTarget::Document, "readystatechange"), 1);
    assert_eq!(host.signal_names(), vec!["qinit"]);
}

#[test]
fn test_readiness_fires_init_and_idle_once() {
    let doc = document(ReadyState::Loading);
    let host = Rc::new(RecordingHost::new());
    let loader = loader(&doc, &host).bootstrap(false).expect("bootstrap");

    assert!(host.signals().is_empty());
    assert_eq!(host.pending_idle(), 0);

    doc.set_ready_state(ReadyState::Interactive);
    loader.process_ready_state_change();
    assert_eq!(host.signal_names(), vec!["qinit"]);
    assert_eq!(host.pending_idle(), 1);

    doc.set_ready_state(ReadyState::Complete);
    loader.process_ready_state_change();
    loader.process_ready_state_change();
    assert_eq!(host.signal_names(), vec!["qinit"]);

    assert_eq!(host.run_idle(), 1);
    assert_eq!(host.signals(), vec![Signal::Init, Signal::Idle]);
    assert!(loader.state().is_initialized());
}

#[test]
fn test_ready_document_initializes_during_bootstrap() {
    let doc = document(ReadyState::Complete);
    let host = Rc::new(RecordingHost::new());

    loader(&doc, &host).bootstrap(false).expect("bootstrap");

    assert_eq!(host.signal_names(), vec!["qinit"]);
    assert_eq!(host.pending_idle(), 1);
}

#[test]
fn test_already_initialized_suppresses_readiness() {
    let doc = document(ReadyState::Complete);
    let host = Rc::new(RecordingHost::with_queued_events(&["qvisible"]));

    let loader = loader(&doc, &host).bootstrap(true).expect("bootstrap");
    loader.process_ready_state_change();

    assert!(host.signals().is_empty());
    assert_eq!(host.pending_idle(), 0);
    assert!(host.observed().is_empty());
}

#[test]
fn test_events_hook_adds_listeners_only_for_new_event_types() {
    let doc = document(ReadyState::Loading);
    let host = Rc::new(RecordingHost::with_queued_events(&["click"]));
    let loader = loader(&doc, &host).bootstrap(false).expect("bootstrap");
    let listeners_before = host.listeners().len();

    loader.events_hook().push(["click", "pointerdown"]);

    let listeners = host.listeners();
    assert_eq!(listeners.len(), listeners_before + 2);
    let count = |target: ListenerTarget, event: &str, options: ListenerOptions| {
        listeners
            .iter()
            .filter(|entry| **entry == (target, event.to_string(), options))
            .count()
    };
    assert_eq!(
        count(ListenerTarget::Document, "pointerdown", ListenerOptions::CAPTURE),
        1
    );
    assert_eq!(
        count(ListenerTarget::Window, "pointerdown", ListenerOptions::BUBBLE),
        1
    );
    assert_eq!(count(ListenerTarget::Document, "click", ListenerOptions::CAPTURE), 1);
    assert_eq!(count(ListenerTarget::Window, "click", ListenerOptions::BUBBLE), 1);
    assert_eq!(
        loader.state().registered_events(),
        vec!["click", "pointerdown"]
    );
}
