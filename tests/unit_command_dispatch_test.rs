use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use admind::command::codes::CommandCode;
use admind::command::dispatcher::{AdmindState, CommandDispatcher, CommandSpec, StateMask};
use admind::config::{Config, KnownNodeRaw, RawConfig};
use admind::context::CoreContext;
use admind::errors::AdmindError;

fn test_context() -> Arc<CoreContext> {
    let raw = RawConfig {
        cluster_uuid: "cafe-babe".into(),
        node_id: 0,
        node_name: "node0".into(),
        incarnation: 1,
        known_nodes: vec![KnownNodeRaw {
            node_id: 0,
            name: "node0".into(),
            address: "10.0.0.1".into(),
        }],
        ..RawConfig::default()
    };
    let config = Config::try_from_raw(raw).expect("valid config");
    CoreContext::initialize(config).expect("context initializes")
}

fn noop_spec(code: CommandCode, allowed_states: StateMask, match_cluster_uuid: bool) -> CommandSpec {
    CommandSpec {
        code,
        allowed_states,
        match_cluster_uuid,
        handler: Arc::new(|_ctx, _payload| Box::pin(async { Ok(()) })),
    }
}

#[test]
fn registering_the_same_command_code_twice_is_rejected() {
    let mut dispatcher = CommandDispatcher::new();
    dispatcher
        .register(noop_spec(CommandCode::clinfo, StateMask::all(), false))
        .expect("first registration succeeds");
    let err = dispatcher
        .register(noop_spec(CommandCode::clinfo, StateMask::all(), false))
        .unwrap_err();
    assert!(matches!(err, AdmindError::InvalidParam(_)));
}

#[test]
fn registering_the_same_rpc_code_twice_is_rejected() {
    let mut dispatcher = CommandDispatcher::new();
    dispatcher.register_rpc_code(42).expect("first claim succeeds");
    let err = dispatcher.register_rpc_code(42).unwrap_err();
    assert!(matches!(err, AdmindError::DuplicateRpcRegistration(42)));
}

#[tokio::test]
async fn dispatch_rejects_a_command_not_allowed_in_the_current_state() {
    let mut dispatcher = CommandDispatcher::new();
    dispatcher
        .register(noop_spec(CommandCode::clstart, StateMask::STOPPED, false))
        .unwrap();
    let ctx = test_context();

    let result = dispatcher
        .dispatch(
            CommandCode::clstart,
            ctx,
            AdmindState::Started,
            false,
            None,
            Vec::new(),
        )
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn dispatch_rejects_a_cluster_uuid_mismatch() {
    let mut dispatcher = CommandDispatcher::new();
    dispatcher
        .register(noop_spec(CommandCode::clstop, StateMask::all(), true))
        .unwrap();
    let ctx = test_context();

    let result = dispatcher
        .dispatch(
            CommandCode::clstop,
            ctx,
            AdmindState::Started,
            false,
            Some("wrong-uuid"),
            Vec::new(),
        )
        .await;
    let err = result.unwrap_err();
    assert_eq!(err.code, AdmindError::ClusterUuidMismatch.code());
}

#[tokio::test]
async fn dispatch_rejects_non_readonly_commands_during_recovery() {
    let mut dispatcher = CommandDispatcher::new();
    dispatcher
        .register(noop_spec(CommandCode::dgstart, StateMask::all(), false))
        .unwrap();
    let ctx = test_context();

    let result = dispatcher
        .dispatch(
            CommandCode::dgstart,
            ctx,
            AdmindState::Started,
            true,
            None,
            Vec::new(),
        )
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn dispatch_allows_readonly_commands_during_recovery() {
    let mut dispatcher = CommandDispatcher::new();
    dispatcher
        .register(noop_spec(CommandCode::clinfo, StateMask::all(), false))
        .unwrap();
    let ctx = test_context();

    let result = dispatcher
        .dispatch(
            CommandCode::clinfo,
            ctx,
            AdmindState::Started,
            true,
            None,
            Vec::new(),
        )
        .await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn dispatch_invokes_the_registered_handler_exactly_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let calls_clone = calls.clone();
    let mut dispatcher = CommandDispatcher::new();
    dispatcher
        .register(CommandSpec {
            code: CommandCode::clstats,
            allowed_states: StateMask::all(),
            match_cluster_uuid: false,
            handler: Arc::new(move |_ctx, _payload| {
                let calls = calls_clone.clone();
                Box::pin(async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
            }),
        })
        .unwrap();
    let ctx = test_context();

    dispatcher
        .dispatch(
            CommandCode::clstats,
            ctx,
            AdmindState::Started,
            false,
            None,
            Vec::new(),
        )
        .await
        .expect("handler returns Ok");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
