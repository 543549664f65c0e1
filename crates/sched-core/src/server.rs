// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The lifecycle controller and its receive loop.
//!
//! Every inbound packet is an event from a runtime in a known state; the
//! controller decides the next state and answers with one reply datagram:
//!
//! | Event            | Action                                   | Reply `next_state`    |
//! |------------------|------------------------------------------|-----------------------|
//! | `Initialize`     | register, remember the return address    | `NeedProfile`         |
//! | `NeedProfile`    | store profile, look up partitioning plan | `SubgraphCreate`      |
//! | `SubgraphCreate` | refresh state                            | `Invoke`              |
//! | `Invoke`         | release previous hold, arbitrate         | `Invoke` / `Blocked`  |
//! | `Terminate`      | release holds, drop from registry        | — (no reply)          |
//! | `Blocked`        | ignored                                  | —                     |
//!
//! Packets are handled one at a time to completion, which serialises all
//! registry, arbiter and planner state without any locking.

use crate::transport::RECV_BUF_LEN;
use crate::{Arbiter, RuntimeRegistry, SchedulerConfig, SchedulerError, SchedulerSocket};
use partition_planner::PartitionPlan;
use resource_monitor::UtilizationCells;
use sched_proto::{Packet, RuntimeState};
use std::path::Path;
use std::sync::Arc;

/// The scheduler: socket, registry, arbiter and utilisation cells,
/// owned by the event loop.
#[derive(Debug)]
pub struct Scheduler {
    socket: SchedulerSocket,
    registry: RuntimeRegistry,
    arbiter: Arbiter,
    cells: Arc<UtilizationCells>,
}

impl Scheduler {
    /// Binds the endpoint from `config` and creates empty state.
    pub fn bind(config: &SchedulerConfig) -> Result<Self, SchedulerError> {
        let socket = SchedulerSocket::bind(&config.socket_path)?;
        Ok(Self {
            socket,
            registry: RuntimeRegistry::new(),
            arbiter: Arbiter::new(),
            cells: Arc::new(UtilizationCells::new()),
        })
    }

    /// The utilisation cells the monitor task writes into.
    ///
    /// Not consulted by today's round-robin policy; carried so future
    /// policies can read live load without a protocol change.
    pub fn utilization(&self) -> Arc<UtilizationCells> {
        Arc::clone(&self.cells)
    }

    /// The registry, for inspection.
    pub fn registry(&self) -> &RuntimeRegistry {
        &self.registry
    }

    /// The arbiter, for inspection.
    pub fn arbiter(&self) -> &Arbiter {
        &self.arbiter
    }

    /// Receives and handles packets until the transport fails.
    ///
    /// Malformed datagrams and failed sends are logged and skipped; a
    /// failed receive ends the loop with the error.
    pub async fn run(&mut self) -> Result<(), SchedulerError> {
        tracing::info!(path = %self.socket.path().display(), "scheduler entering receive loop");
        let mut buf = vec![0u8; RECV_BUF_LEN];
        loop {
            let (len, peer) = self.socket.receive(&mut buf).await?;
            let Some(peer) = peer else {
                tracing::warn!("datagram from unbound peer dropped: no reply route");
                continue;
            };

            let packet = match Packet::from_bytes(&buf[..len]) {
                Ok(p) => p,
                Err(e) => {
                    tracing::warn!(peer = %peer.display(), error = %e, "malformed datagram dropped");
                    continue;
                }
            };

            if let Some(reply) = self.handle(&packet, &peer) {
                if let Err(e) = self.socket.send(&reply.to_bytes(), &peer).await {
                    tracing::warn!(id = reply.runtime_id, error = %e, "reply send failed");
                }
            }
        }
    }

    /// Handles one decoded packet; returns the reply, if one is owed.
    ///
    /// Pure with respect to the socket, so the whole state machine can be
    /// driven in tests without I/O.
    pub fn handle(&mut self, rx: &Packet, peer: &Path) -> Option<Packet> {
        match rx.current_state {
            RuntimeState::Initialize => Some(self.register(rx, peer)),
            RuntimeState::NeedProfile => self.deliver_plan(rx),
            RuntimeState::SubgraphCreate => self.ack_subgraphs(rx),
            RuntimeState::Invoke => self.arbitrate(rx),
            RuntimeState::Terminate => {
                self.terminate(rx);
                None
            }
            RuntimeState::Blocked => {
                tracing::debug!(id = rx.runtime_id, "ignoring packet in state blocked");
                None
            }
        }
    }

    fn register(&mut self, rx: &Packet, peer: &Path) -> Packet {
        if self.registry.contains(rx.runtime_id) {
            tracing::warn!(id = rx.runtime_id, "initialize carries an already-registered id");
        }
        let id = self.registry.register(peer);
        tracing::info!(id, peer = %peer.display(), "registered new runtime");
        tracing::debug!(registry = %self.registry.summary(), "registry after registration");

        let mut tx = Packet::new();
        tx.runtime_id = id;
        tx.next_state = RuntimeState::NeedProfile;
        tx
    }

    fn deliver_plan(&mut self, rx: &Packet) -> Option<Packet> {
        if !self.refresh_state(rx) {
            return None;
        }
        let profile = rx.latency_profile();
        self.registry.set_latencies(rx.runtime_id, profile);
        tracing::info!(
            id = rx.runtime_id,
            layers = profile.len(),
            "latency profile received"
        );

        let plan = PartitionPlan::for_layer_count(profile.len());
        tracing::info!(id = rx.runtime_id, plan = %plan.summary(), "partitioning plan ready");

        let mut tx = Packet::new();
        tx.runtime_id = rx.runtime_id;
        tx.next_state = RuntimeState::SubgraphCreate;
        if let Err(e) = plan.write_into(&mut tx.plan) {
            // Unreachable for table plans; guards future table edits.
            tracing::error!(id = rx.runtime_id, error = %e, "plan does not fit the packet");
            return None;
        }
        Some(tx)
    }

    fn ack_subgraphs(&mut self, rx: &Packet) -> Option<Packet> {
        if !self.refresh_state(rx) {
            return None;
        }
        // No decision at this stage yet; reserved for a schedulability
        // check once subgraph deadlines are reported.
        let mut tx = Packet::new();
        tx.runtime_id = rx.runtime_id;
        tx.next_state = RuntimeState::Invoke;
        Some(tx)
    }

    fn arbitrate(&mut self, rx: &Packet) -> Option<Packet> {
        if !self.refresh_state(rx) {
            return None;
        }
        // The sender coming back to ask again means its previous turn is
        // over; free whatever it still holds before arbitrating anew.
        self.arbiter.release_owned_by(rx.runtime_id);

        let granted =
            self.registry.all_invoking() && self.arbiter.acquire(rx.cur_graph_resource, rx.runtime_id);

        let mut tx = Packet::new();
        tx.runtime_id = rx.runtime_id;
        if granted {
            tracing::info!(
                id = rx.runtime_id,
                resource = %rx.cur_graph_resource,
                "resource granted"
            );
            tx.next_state = RuntimeState::Invoke;
        } else {
            tracing::info!(
                id = rx.runtime_id,
                resource = %rx.cur_graph_resource,
                "runtime blocked"
            );
            tx.next_state = RuntimeState::Blocked;
        }
        Some(tx)
    }

    fn terminate(&mut self, rx: &Packet) {
        match self.registry.remove(rx.runtime_id) {
            Some(entry) => {
                self.arbiter.release_owned_by(entry.id);
                tracing::info!(id = entry.id, "runtime terminated and removed");
            }
            None => {
                tracing::warn!(id = rx.runtime_id, "terminate from unknown runtime dropped");
            }
        }
    }

    /// Records the sender's reported state; logs and refuses unknown ids.
    fn refresh_state(&mut self, rx: &Packet) -> bool {
        if self.registry.update_state(rx.runtime_id, rx.current_state) {
            true
        } else {
            tracing::warn!(
                id = rx.runtime_id,
                state = %rx.current_state,
                "packet from unknown runtime dropped"
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sched_proto::{Resource, END_PLAN, PLAN_COL_FIRST};
    use std::path::PathBuf;

    fn scratch_scheduler(name: &str) -> Scheduler {
        let dir = std::env::temp_dir().join("coex_sched_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(format!("{}_{name}_srv.sock", std::process::id()));
        std::fs::remove_file(&path).ok();
        let config = SchedulerConfig {
            socket_path: path,
            ..Default::default()
        };
        Scheduler::bind(&config).unwrap()
    }

    fn peer(n: u32) -> PathBuf {
        PathBuf::from(format!("/tmp/fake_runtime_{n}.sock"))
    }

    fn initialize() -> Packet {
        Packet::new()
    }

    fn profile(id: i32, layers: usize) -> Packet {
        let mut pkt = Packet::new();
        pkt.runtime_id = id;
        pkt.current_state = RuntimeState::NeedProfile;
        pkt.set_latency_profile(&vec![1.0; layers]);
        pkt
    }

    fn subgraphs_done(id: i32) -> Packet {
        let mut pkt = Packet::new();
        pkt.runtime_id = id;
        pkt.current_state = RuntimeState::SubgraphCreate;
        pkt
    }

    fn invoke(id: i32, resource: Resource) -> Packet {
        let mut pkt = Packet::new();
        pkt.runtime_id = id;
        pkt.current_state = RuntimeState::Invoke;
        pkt.cur_graph_resource = resource;
        pkt
    }

    /// Drives a runtime from first contact into the invoke stage.
    fn bring_to_invoke(sched: &mut Scheduler, n: u32) -> i32 {
        let reply = sched.handle(&initialize(), &peer(n)).unwrap();
        let id = reply.runtime_id;
        sched.handle(&profile(id, 9), &peer(n)).unwrap();
        sched.handle(&subgraphs_done(id), &peer(n)).unwrap();
        sched.handle(&invoke(id, Resource::Cpu), &peer(n)).unwrap();
        id
    }

    #[tokio::test]
    async fn test_registration_reply() {
        let mut sched = scratch_scheduler("registration");
        let reply = sched.handle(&initialize(), &peer(0)).unwrap();
        assert_eq!(reply.runtime_id, 0);
        assert_eq!(reply.next_state, RuntimeState::NeedProfile);

        let entry = sched.registry().lookup(0).unwrap();
        assert_eq!(entry.state, RuntimeState::Initialize);
        assert_eq!(entry.return_address, peer(0));
    }

    #[tokio::test]
    async fn test_registration_ids_are_monotonic() {
        let mut sched = scratch_scheduler("monotonic");
        for expected in 0..5 {
            let reply = sched.handle(&initialize(), &peer(expected as u32)).unwrap();
            assert_eq!(reply.runtime_id, expected);
        }
        assert_eq!(sched.registry().len(), 5);
    }

    #[tokio::test]
    async fn test_duplicate_initialize_still_registers() {
        let mut sched = scratch_scheduler("duplicate");
        sched.handle(&initialize(), &peer(0)).unwrap();
        // Same zeroed packet again: warns about the known id, registers anyway.
        let reply = sched.handle(&initialize(), &peer(1)).unwrap();
        assert_eq!(reply.runtime_id, 1);
        assert_eq!(sched.registry().len(), 2);
    }

    #[tokio::test]
    async fn test_profile_reply_carries_mnist_plan() {
        let mut sched = scratch_scheduler("mnist_plan");
        sched.handle(&initialize(), &peer(0)).unwrap();

        let reply = sched.handle(&profile(0, 9), &peer(0)).unwrap();
        assert_eq!(reply.next_state, RuntimeState::SubgraphCreate);
        assert_eq!(reply.plan_rows(), &[[0, 1, 2, 2], [1, 9, 1, 0]]);
        assert_eq!(reply.plan[2][PLAN_COL_FIRST], END_PLAN);

        // The profile is kept on the entry.
        assert_eq!(sched.registry().lookup(0).unwrap().latencies.len(), 9);
    }

    #[tokio::test]
    async fn test_profile_reply_carries_mobilenet_plan() {
        let mut sched = scratch_scheduler("mobilenet_plan");
        sched.handle(&initialize(), &peer(0)).unwrap();

        let reply = sched.handle(&profile(0, 31), &peer(0)).unwrap();
        assert_eq!(
            reply.plan_rows(),
            &[[0, 27, 2, 18], [27, 29, 2, 8], [29, 31, 0, 0]]
        );
    }

    #[tokio::test]
    async fn test_unknown_shape_gets_fallback_plan() {
        let mut sched = scratch_scheduler("fallback_plan");
        sched.handle(&initialize(), &peer(0)).unwrap();

        let reply = sched.handle(&profile(0, 7), &peer(0)).unwrap();
        assert_eq!(reply.plan_rows(), &[[0, 0, 0, 0]]);
        assert_eq!(reply.plan[1][PLAN_COL_FIRST], END_PLAN);
    }

    #[tokio::test]
    async fn test_subgraph_create_advances_to_invoke() {
        let mut sched = scratch_scheduler("subgraph_ack");
        sched.handle(&initialize(), &peer(0)).unwrap();
        sched.handle(&profile(0, 9), &peer(0)).unwrap();

        let reply = sched.handle(&subgraphs_done(0), &peer(0)).unwrap();
        assert_eq!(reply.next_state, RuntimeState::Invoke);
        assert_eq!(
            sched.registry().lookup(0).unwrap().state,
            RuntimeState::SubgraphCreate
        );
    }

    #[tokio::test]
    async fn test_packet_from_unknown_runtime_dropped() {
        let mut sched = scratch_scheduler("unknown_runtime");
        sched.handle(&initialize(), &peer(0)).unwrap();
        assert!(sched.handle(&profile(42, 9), &peer(0)).is_none());
        assert!(sched.handle(&invoke(42, Resource::Cpu), &peer(0)).is_none());
    }

    #[tokio::test]
    async fn test_bootstrap_barrier_blocks_until_all_invoke() {
        let mut sched = scratch_scheduler("barrier");
        sched.handle(&initialize(), &peer(0)).unwrap();
        sched.handle(&initialize(), &peer(1)).unwrap();
        for id in 0..2 {
            sched.handle(&profile(id, 9), &peer(id as u32)).unwrap();
            sched.handle(&subgraphs_done(id), &peer(id as u32)).unwrap();
        }

        // Runtime 1 is not in invoke yet: every request is refused.
        let reply = sched.handle(&invoke(0, Resource::Cpu), &peer(0)).unwrap();
        assert_eq!(reply.next_state, RuntimeState::Blocked);
        let reply = sched.handle(&invoke(0, Resource::Gpu), &peer(0)).unwrap();
        assert_eq!(reply.next_state, RuntimeState::Blocked);

        // Once runtime 1 reaches invoke, grants begin.
        let reply = sched.handle(&invoke(1, Resource::Cpu), &peer(1)).unwrap();
        assert_eq!(reply.next_state, RuntimeState::Invoke);
    }

    #[tokio::test]
    async fn test_solo_runtime_satisfies_barrier() {
        let mut sched = scratch_scheduler("solo");
        let reply = sched.handle(&initialize(), &peer(0)).unwrap();
        let id = reply.runtime_id;
        sched.handle(&profile(id, 9), &peer(0)).unwrap();
        sched.handle(&subgraphs_done(id), &peer(0)).unwrap();

        let reply = sched.handle(&invoke(id, Resource::Cpu), &peer(0)).unwrap();
        assert_eq!(reply.next_state, RuntimeState::Invoke);
    }

    #[tokio::test]
    async fn test_contender_blocked_while_resource_held() {
        let mut sched = scratch_scheduler("mutual_exclusion");
        sched.handle(&initialize(), &peer(0)).unwrap();
        sched.handle(&initialize(), &peer(1)).unwrap();
        for id in 0..2 {
            sched.handle(&profile(id, 9), &peer(id as u32)).unwrap();
            sched.handle(&subgraphs_done(id), &peer(id as u32)).unwrap();
            sched.handle(&invoke(id, Resource::Gpu), &peer(id as u32)).unwrap();
        }
        // Both at invoke now. First CPU claim wins...
        let reply = sched.handle(&invoke(0, Resource::Cpu), &peer(0)).unwrap();
        assert_eq!(reply.next_state, RuntimeState::Invoke);
        // ...and the contender is blocked while it is held.
        let reply = sched.handle(&invoke(1, Resource::Cpu), &peer(1)).unwrap();
        assert_eq!(reply.next_state, RuntimeState::Blocked);
        assert_eq!(sched.arbiter().holder(Resource::Cpu), Some(0));
    }

    #[tokio::test]
    async fn test_round_robin_over_invoke_cycles() {
        let mut sched = scratch_scheduler("round_robin");
        sched.handle(&initialize(), &peer(0)).unwrap();
        sched.handle(&initialize(), &peer(1)).unwrap();
        for id in 0..2 {
            sched.handle(&profile(id, 9), &peer(id as u32)).unwrap();
            sched.handle(&subgraphs_done(id), &peer(id as u32)).unwrap();
            sched.handle(&invoke(id, Resource::Gpu), &peer(id as u32)).unwrap();
        }

        // 0 takes the CPU.
        let reply = sched.handle(&invoke(0, Resource::Cpu), &peer(0)).unwrap();
        assert_eq!(reply.next_state, RuntimeState::Invoke);

        // 0 finishing its subgraph releases the lane, but as last grantee
        // it may not reclaim before 1 has had a turn.
        let reply = sched.handle(&invoke(0, Resource::Cpu), &peer(0)).unwrap();
        assert_eq!(reply.next_state, RuntimeState::Blocked);
        assert_eq!(sched.arbiter().holder(Resource::Cpu), None);

        let reply = sched.handle(&invoke(1, Resource::Cpu), &peer(1)).unwrap();
        assert_eq!(reply.next_state, RuntimeState::Invoke);

        // And back again: 1 yields, 0 reclaims.
        let reply = sched.handle(&invoke(1, Resource::Cpu), &peer(1)).unwrap();
        assert_eq!(reply.next_state, RuntimeState::Blocked);
        let reply = sched.handle(&invoke(0, Resource::Cpu), &peer(0)).unwrap();
        assert_eq!(reply.next_state, RuntimeState::Invoke);
    }

    #[tokio::test]
    async fn test_terminate_removes_and_releases() {
        let mut sched = scratch_scheduler("terminate");
        sched.handle(&initialize(), &peer(0)).unwrap();
        sched.handle(&profile(0, 9), &peer(0)).unwrap();
        sched.handle(&subgraphs_done(0), &peer(0)).unwrap();
        let reply = sched.handle(&invoke(0, Resource::Cpu), &peer(0)).unwrap();
        assert_eq!(reply.next_state, RuntimeState::Invoke);

        let mut bye = Packet::new();
        bye.runtime_id = 0;
        bye.current_state = RuntimeState::Terminate;
        assert!(sched.handle(&bye, &peer(0)).is_none());

        assert!(sched.registry().is_empty());
        assert_eq!(sched.arbiter().holder(Resource::Cpu), None);
    }

    #[tokio::test]
    async fn test_inbound_blocked_is_ignored() {
        let mut sched = scratch_scheduler("blocked_ignored");
        let id = bring_to_invoke(&mut sched, 0);

        let mut pkt = Packet::new();
        pkt.runtime_id = id;
        pkt.current_state = RuntimeState::Blocked;
        assert!(sched.handle(&pkt, &peer(0)).is_none());
        // The registry still shows the state from the last real event.
        assert_eq!(
            sched.registry().lookup(id).unwrap().state,
            RuntimeState::Invoke
        );
    }

    #[tokio::test]
    async fn test_active_states_always_get_one_reply() {
        let mut sched = scratch_scheduler("reply_obligation");
        assert!(sched.handle(&initialize(), &peer(0)).is_some());
        assert!(sched.handle(&profile(0, 9), &peer(0)).is_some());
        assert!(sched.handle(&subgraphs_done(0), &peer(0)).is_some());
        assert!(sched.handle(&invoke(0, Resource::Cpu), &peer(0)).is_some());
    }
}
