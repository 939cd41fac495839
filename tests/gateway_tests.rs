use std::cell::RefCell;
use std::rc::Rc;

use prompt_enhancer::{
    error::{ChannelError, GatewayError},
    gateway::{
        channel::{DisconnectedPort, EnhancementPort, QueuedPort},
        endpoint::EndpointConfig,
        gateway::{FallbackGateway, Gateway, GatewayConfig, handle_message},
        host::{HostStats, serve},
        local::{LocalHeuristic, enhance_locally},
        message::{BackgroundMessage, EnhanceReply},
        providers::{ProviderConfig, ProviderKind},
    },
};

use crate::common::fakes::{BlankGateway, FailingGateway, SuffixGateway};

mod common;

// =========================================================================
// Fallback chain
// =========================================================================

#[test]
fn first_successful_strategy_wins() {
    let gateway = FallbackGateway::new(vec![Box::new(SuffixGateway), Box::new(LocalHeuristic)]);
    assert_eq!(gateway.enhance("hi").unwrap(), "hi [ENHANCED]");
}

#[test]
fn failing_strategy_falls_through() {
    let gateway = FallbackGateway::new(vec![
        Box::new(FailingGateway("down")),
        Box::new(BlankGateway),
        Box::new(SuffixGateway),
    ]);
    assert_eq!(gateway.enhance("hi").unwrap(), "hi [ENHANCED]");
}

#[test]
fn last_error_is_reported_when_all_fail() {
    let gateway = FallbackGateway::new(vec![Box::new(BlankGateway), Box::new(FailingGateway("down"))]);
    assert_eq!(
        gateway.enhance("hi").unwrap_err(),
        GatewayError::Request {
            target: "stub".into(),
            reason: "down".into()
        }
    );
}

#[test]
fn blank_result_counts_as_malformed() {
    let gateway = FallbackGateway::new(vec![Box::new(BlankGateway)]);
    assert!(matches!(
        gateway.enhance("hi"),
        Err(GatewayError::MalformedResponse { provider, .. }) if provider == "blank"
    ));
}

#[test]
fn empty_chain_has_no_strategy() {
    let gateway = FallbackGateway::new(Vec::new());
    assert_eq!(gateway.enhance("hi").unwrap_err(), GatewayError::NoStrategy);
}

#[test]
fn config_orders_provider_endpoint_local() {
    let bare = FallbackGateway::from_config(&GatewayConfig::default());
    assert_eq!(bare.strategy_names(), vec!["local"], "gemini without a key is skipped");

    let keyed = GatewayConfig {
        provider: ProviderConfig {
            api_key: Some("k".into()),
            ..ProviderConfig::default()
        },
        ..GatewayConfig::default()
    };
    assert_eq!(FallbackGateway::from_config(&keyed).strategy_names(), vec!["gemini", "local"]);

    let full = GatewayConfig {
        provider: ProviderConfig {
            kind: ProviderKind::Ollama,
            ..ProviderConfig::default()
        },
        endpoint: EndpointConfig {
            url: Some("http://localhost:9000/enhance".into()),
            allow_user_endpoints: true,
        },
        local_fallback: false,
    };
    assert_eq!(FallbackGateway::from_config(&full).strategy_names(), vec!["ollama", "endpoint"]);
}

#[test]
fn endpoint_needs_opt_in() {
    let config = GatewayConfig {
        endpoint: EndpointConfig {
            url: Some("http://localhost:9000/enhance".into()),
            allow_user_endpoints: false,
        },
        ..GatewayConfig::default()
    };
    assert_eq!(FallbackGateway::from_config(&config).strategy_names(), vec!["local"]);
}

// =========================================================================
// Local heuristic
// =========================================================================

#[test]
fn local_enhancement_appends_checklist() {
    let enhanced = enhance_locally("Summarize this");
    assert!(enhanced.starts_with("Summarize this\n\n[Enhanced by RACCO"));
    assert_eq!(enhanced.lines().filter(|l| l.starts_with('•')).count(), 4);
}

#[test]
fn local_enhancement_of_blank_prompt_asks_for_one() {
    assert!(enhance_locally("  ").ends_with("[Please provide a prompt to enhance]"));
    assert!(LocalHeuristic.enhance("").is_ok());
}

// =========================================================================
// Messages
// =========================================================================

#[test]
fn enhance_message_wire_format() {
    let json = serde_json::to_value(BackgroundMessage::enhance("hello")).unwrap();
    assert_eq!(json, serde_json::json!({"type": "ENHANCE_PROMPT", "prompt": "hello"}));
}

#[test]
fn unknown_message_type_parses() {
    let message: BackgroundMessage = serde_json::from_str(r#"{"type":"PING"}"#).unwrap();
    assert_eq!(message, BackgroundMessage::Unknown);
}

#[test]
fn reply_omits_absent_fields() {
    let json = serde_json::to_value(EnhanceReply::success("better")).unwrap();
    assert_eq!(json, serde_json::json!({"ok": true, "enhanced": "better"}));

    let json = serde_json::to_value(EnhanceReply::failure("nope")).unwrap();
    assert_eq!(json, serde_json::json!({"ok": false, "error": "nope"}));
}

#[test]
fn handle_message_answers_enhance_only() {
    assert_eq!(
        handle_message(&SuffixGateway, &BackgroundMessage::enhance("a")),
        Some(EnhanceReply::success("a [ENHANCED]"))
    );
    assert_eq!(
        handle_message(&FailingGateway("boom"), &BackgroundMessage::enhance("a")),
        Some(EnhanceReply::failure("request to stub failed: boom"))
    );
    assert_eq!(handle_message(&SuffixGateway, &BackgroundMessage::Unknown), None);
}

// =========================================================================
// Ports
// =========================================================================

type Outcomes = Rc<RefCell<Vec<Result<Option<EnhanceReply>, ChannelError>>>>;

fn recorder() -> (Outcomes, impl Fn() -> Box<dyn FnOnce(Result<Option<EnhanceReply>, ChannelError>)>) {
    let outcomes: Outcomes = Rc::new(RefCell::new(Vec::new()));
    let sink = outcomes.clone();
    let make = move || {
        let sink = sink.clone();
        Box::new(move |result: Result<Option<EnhanceReply>, ChannelError>| sink.borrow_mut().push(result))
            as Box<dyn FnOnce(Result<Option<EnhanceReply>, ChannelError>)>
    };
    (outcomes, make)
}

#[test]
fn queued_port_answers_on_pump() {
    let port = QueuedPort::new(Box::new(SuffixGateway));
    let (outcomes, reply) = recorder();

    port.send(BackgroundMessage::enhance("one"), reply());
    port.send(BackgroundMessage::Unknown, reply());
    assert_eq!(port.pending(), 2);
    assert!(outcomes.borrow().is_empty(), "nothing answered before pumping");

    assert_eq!(port.pump(), 2);
    assert_eq!(
        *outcomes.borrow(),
        vec![Ok(Some(EnhanceReply::success("one [ENHANCED]"))), Ok(None)]
    );
    assert_eq!(port.pending(), 0);
}

#[test]
fn disconnected_port_fails_immediately() {
    let port = DisconnectedPort::new("reloaded");
    let (outcomes, reply) = recorder();

    port.send(BackgroundMessage::enhance("x"), reply());

    assert_eq!(
        *outcomes.borrow(),
        vec![Err(ChannelError::Disconnected("reloaded".into()))]
    );
}

// =========================================================================
// Background host
// =========================================================================

#[test]
fn host_answers_one_line_per_message() {
    let input = concat!(
        r#"{"type":"ENHANCE_PROMPT","prompt":"draft"}"#,
        "\n",
        "\n",
        r#"{"type":"PING"}"#,
        "\n",
        "not json\n",
    );
    let mut output = Vec::new();

    let stats = serve(&SuffixGateway, input.as_bytes(), &mut output).unwrap();

    assert_eq!(stats, HostStats { handled: 1, ignored: 1, rejected: 1 });
    let replies: Vec<EnhanceReply> = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(replies.len(), 2);
    assert_eq!(replies[0], EnhanceReply::success("draft [ENHANCED]"));
    assert!(!replies[1].ok);
    assert!(replies[1].error.as_deref().unwrap().starts_with("invalid message:"));
}

#[test]
fn host_reports_gateway_failures_in_reply() {
    let input = r#"{"type":"ENHANCE_PROMPT","prompt":"x"}"#;
    let mut output = Vec::new();

    serve(&FailingGateway("offline"), input.as_bytes(), &mut output).unwrap();

    let reply: EnhanceReply = serde_json::from_slice(output.trim_ascii()).unwrap();
    assert_eq!(reply, EnhanceReply::failure("request to stub failed: offline"));
}
