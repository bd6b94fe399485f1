use std::sync::Arc;
use uuid::Uuid;

use admind::command::catalogue::build_dispatcher;
use admind::command::codes::CommandCode;
use admind::command::dispatcher::AdmindState;
use admind::config::{Config, KnownNodeRaw, RawConfig};
use admind::context::CoreContext;
use admind::messaging::transport::Transport;
use admind::model::disk::{Disk, DiskFlags};
use admind::workthread::exec::WorkThread;

fn test_config(multicast_port: u16) -> Config {
    let raw = RawConfig {
        cluster_uuid: "cafe-babe".into(),
        node_id: 0,
        node_name: "node0".into(),
        incarnation: 1,
        known_nodes: vec![
            KnownNodeRaw { node_id: 0, name: "node0".into(), address: "10.0.0.1".into() },
            KnownNodeRaw { node_id: 1, name: "node1".into(), address: "10.0.0.2".into() },
            KnownNodeRaw { node_id: 2, name: "node2".into(), address: "10.0.0.3".into() },
        ],
        multicast_port,
        ..RawConfig::default()
    };
    Config::try_from_raw(raw).expect("valid config")
}

fn test_context() -> Arc<CoreContext> {
    CoreContext::initialize(test_config(admind::config::RawConfig::default().multicast_port))
        .expect("context initializes")
}

/// A context whose `work_thread` is bound to a real, live UDP multicast
/// socket, so handlers that call `exec::exec_command` actually send. Uses
/// its own multicast port so the bind doesn't race other tests' sockets.
async fn test_context_with_transport(multicast_port: u16) -> Arc<CoreContext> {
    let config = test_config(multicast_port);
    let ctx = CoreContext::initialize(config).expect("context initializes");
    let transport = Arc::new(Transport::bind(&ctx.config).await.expect("transport binds"));
    ctx.set_work_thread(Arc::new(WorkThread::new(transport)));
    ctx
}

async fn dispatch(
    dispatcher: &admind::command::dispatcher::CommandDispatcher,
    ctx: &Arc<CoreContext>,
    code: CommandCode,
    payload: serde_json::Value,
) -> Result<(), admind::errors::ErrorDescriptor> {
    dispatcher
        .dispatch(
            code,
            ctx.clone(),
            AdmindState::Started,
            false,
            Some("cafe-babe"),
            serde_json::to_vec(&payload).unwrap(),
        )
        .await
}

#[tokio::test]
async fn successful_volume_creation_end_to_end() {
    // `§8` scenario 4: create a group, start it with no disks (trivially
    // administrable), create a volume, and see it land in the export list.
    let dispatcher = build_dispatcher().expect("catalogue registers cleanly");
    let ctx = test_context();

    dispatch(
        &dispatcher,
        &ctx,
        CommandCode::dgcreate,
        serde_json::json!({"name": "g0", "layout": "raid1"}),
    )
    .await
    .expect("dgcreate succeeds");
    assert_eq!(ctx.groups.read().len(), 1);

    dispatch(
        &dispatcher,
        &ctx,
        CommandCode::dgstart,
        serde_json::json!({"name": "g0"}),
    )
    .await
    .expect("dgstart succeeds on a disk-less, trivially administrable group");

    dispatch(
        &dispatcher,
        &ctx,
        CommandCode::vlcreate,
        serde_json::json!({"group_name": "g0", "volume_name": "v0", "size_kb": 1024}),
    )
    .await
    .expect("vlcreate succeeds on a started group");

    assert_eq!(ctx.volumes.read().len(), 1);
    let exports = ctx.exports.read();
    assert_eq!(exports.exports.len(), 1);
    assert_eq!(exports.version, 1);
}

#[tokio::test]
async fn a_group_with_a_minority_of_healthy_disks_refuses_to_start() {
    // `§8` scenario 5: a group owned by 3 nodes where only 1 disk is
    // healthy is not administrable -- dgstart must be refused.
    let dispatcher = build_dispatcher().expect("catalogue registers cleanly");
    let ctx = test_context();

    dispatch(
        &dispatcher,
        &ctx,
        CommandCode::dgcreate,
        serde_json::json!({"name": "g0", "layout": "raid1"}),
    )
    .await
    .expect("dgcreate succeeds");

    let group_uuid = ctx.groups.read().values().next().unwrap().uuid;
    {
        let mut disks = ctx.disks.write();
        let mut groups = ctx.groups.write();
        let group = groups.get_mut(&group_uuid).unwrap();
        for (node_id, broken) in [(0u32, false), (1, true), (2, true)] {
            let disk_uuid = Uuid::new_v4();
            let mut disk = Disk::new(disk_uuid, node_id, group_uuid, format!("/dev/sd{node_id}"));
            if broken {
                disk.flags.insert(DiskFlags::BROKEN);
            }
            disks.insert(disk_uuid, disk);
            group.add_disk(disk_uuid);
        }
    }

    let result = dispatch(
        &dispatcher,
        &ctx,
        CommandCode::dgstart,
        serde_json::json!({"name": "g0"}),
    )
    .await;

    let err = result.expect_err("a minority-healthy group must refuse to start");
    assert_eq!(
        err.code,
        admind::errors::AdmindError::GroupNotAdministrable(String::new()).code()
    );
    assert!(!ctx.groups.read().get(&group_uuid).unwrap().started);
}

#[tokio::test]
async fn dgstop_on_an_already_stopped_group_is_idempotent() {
    let dispatcher = build_dispatcher().expect("catalogue registers cleanly");
    let ctx = test_context();

    dispatch(
        &dispatcher,
        &ctx,
        CommandCode::dgcreate,
        serde_json::json!({"name": "g0", "layout": "raid1"}),
    )
    .await
    .expect("dgcreate succeeds");

    let result = dispatch(
        &dispatcher,
        &ctx,
        CommandCode::dgstop,
        serde_json::json!({"name": "g0"}),
    )
    .await;

    // A benign outcome (`NothingToDo`) is a non-error status on the CLI
    // channel (`§7`), not a failure: dgstop on an already-stopped group
    // must succeed quietly rather than return an error.
    result.expect("dgstop on an already-stopped group is a benign no-op");
}

#[tokio::test]
async fn clustered_commands_fan_out_over_the_real_transport() {
    // `§8` scenario 4 again, but with `work_thread` bound to a live
    // multicast socket, so `dgstart`/`vlcreate` actually drive
    // `workthread::exec::exec_command` over the wire instead of skipping
    // the fan-out because no transport is attached.
    let dispatcher = build_dispatcher().expect("catalogue registers cleanly");
    let ctx = test_context_with_transport(48_272).await;

    assert_eq!(ctx.peer_nodes(), vec![1, 2]);

    dispatch(
        &dispatcher,
        &ctx,
        CommandCode::dgcreate,
        serde_json::json!({"name": "g0", "layout": "raid1"}),
    )
    .await
    .expect("dgcreate succeeds");

    dispatch(
        &dispatcher,
        &ctx,
        CommandCode::dgstart,
        serde_json::json!({"name": "g0"}),
    )
    .await
    .expect("dgstart fans out over the transport and resolves locally");

    dispatch(
        &dispatcher,
        &ctx,
        CommandCode::vlcreate,
        serde_json::json!({"group_name": "g0", "volume_name": "v0", "size_kb": 1024}),
    )
    .await
    .expect("vlcreate fans out over the transport and resolves locally");

    assert_eq!(ctx.volumes.read().len(), 1);
    assert_eq!(ctx.exports.read().exports.len(), 1);
}
