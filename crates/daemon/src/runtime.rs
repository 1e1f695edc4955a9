//! Single-threaded, readiness-based event loop (spec.md §4.9): `nix::poll`
//! multiplexes the listener(s) and every connected client's socket, feeding a
//! `DaemonEvent` per readable fd through a bounded-channel + `Event` enum +
//! `while let ... match` dispatch loop (see `DESIGN.md` for the grounding).

use std::collections::HashMap;
use std::os::fd::RawFd;
use std::time::Instant;

use crossbeam_channel::{bounded, Receiver, Sender};
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};

use semadraw_compositor::{Compositor, FramebufferDesc, NullBackend, PixelFormat, RasterBackend};
use semadraw_config::ResolvedConfig;
use semadraw_ipc::messages::FrameCompleteEvent;
use semadraw_ipc::encode_frame;
use semadraw_registry::SurfaceRegistry;
use semadraw_sdcs::types::Color;
use semadraw_session::{ClientId, ClientSession};
use semadraw_transport::local::{LocalListener, LocalStream};
use semadraw_transport::network::{NetworkListener, NetworkStream};
use semadraw_transport::{FrameAssembler, FramedTransport, TransportError};

use crate::client::{Client, ClientTransport};
use crate::clipboard::ClipboardStore;
use crate::dispatch::dispatch;
use crate::event::DaemonEvent;

/// Local transport's fd-passing cap: one shared-memory segment per
/// `attach_buffer` call (spec.md §4.3 describes a single descriptor per
/// message).
const MAX_FDS_PER_FRAME: usize = 1;
/// Upper bound on the poll loop's wait, per spec.md §4.9.
const MAX_POLL_WAIT_MS: u64 = 100;

pub struct Runtime {
    local_listener: LocalListener,
    network_listener: Option<NetworkListener>,
    clients: HashMap<u32, Client>,
    next_client_id: u32,
    registry: SurfaceRegistry,
    clipboard: ClipboardStore,
    compositor: Compositor<NullBackend>,
    config: ResolvedConfig,
    epoch: Instant,
    last_notified_frame: HashMap<u32, u64>,
    // Kept for the Event-enum + channel shape named in spec.md §4.9; in
    // practice readiness events are produced and drained within one poll
    // iteration rather than crossing a real producer/consumer boundary.
    _events: (Sender<DaemonEvent>, Receiver<DaemonEvent>),
}

impl Runtime {
    pub fn new(config: ResolvedConfig) -> anyhow::Result<Self> {
        if let Some(parent) = config.socket_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).ok();
            }
        }
        let local_listener = LocalListener::bind_with_backlog(&config.socket_path, 16, 0o660)?;
        let network_listener = match &config.tcp_bind {
            Some((addr, port)) => Some(NetworkListener::bind((addr.as_str(), *port))?),
            None => None,
        };

        let desc = FramebufferDesc { width: 1920, height: 1080, refresh_hz: config.target_hz, pixel_format: PixelFormat::Rgba8 };
        let background = Color { r: 0.0, g: 0.0, b: 0.0, a: 1.0 };
        let epoch = Instant::now();
        let mut compositor = Compositor::new(desc, NullBackend::new(), 0, background);
        compositor.start();

        Ok(Self {
            local_listener,
            network_listener,
            clients: HashMap::new(),
            next_client_id: 1,
            registry: SurfaceRegistry::new(),
            clipboard: ClipboardStore::new(),
            compositor,
            config,
            epoch,
            last_notified_frame: HashMap::new(),
            _events: bounded(256),
        })
    }

    fn now_ns(&self) -> u64 {
        self.epoch.elapsed().as_nanos() as u64
    }

    /// Runs until the backend signals shutdown (spec.md §4.9/§5).
    pub fn run(&mut self) -> anyhow::Result<()> {
        loop {
            let timeout_ms = self.poll_timeout_ms();
            let mut fds = self.build_pollfds();
            let n = poll(&mut fds, PollTimeout::from(timeout_ms as u16))?;

            if n > 0 {
                self.handle_ready(&fds);
            }

            if !self.compositor.backend_mut().poll_events() {
                tracing::info!(target: "daemon", "backend_requested_shutdown");
                break;
            }

            self.maybe_composite();
            self.reap_disconnected();
        }

        self.shutdown();
        Ok(())
    }

    fn poll_timeout_ms(&self) -> u64 {
        let now = self.now_ns();
        let deadline = self.compositor.scheduler().next_deadline_ns();
        let until_deadline_ms = deadline.saturating_sub(now) / 1_000_000;
        until_deadline_ms.min(MAX_POLL_WAIT_MS)
    }

    fn build_pollfds(&self) -> Vec<PollFd<'static>> {
        // `PollFd` borrows its fd; since we only need the raw values for one
        // poll() call and none of our sockets own a `BorrowedFd` we keep
        // around past this function, we reconstruct from raw fds.
        let mut raw: Vec<RawFd> = vec![self.local_listener.as_raw_fd()];
        if let Some(net) = &self.network_listener {
            raw.push(net.as_raw_fd());
        }
        for client in self.clients.values() {
            raw.push(client.transport.as_raw_fd());
        }
        raw.into_iter()
            .map(|fd| {
                // SAFETY: every fd above is owned by a listener or client
                // alive for at least the duration of this poll() call.
                let borrowed = unsafe { std::os::fd::BorrowedFd::borrow_raw(fd) };
                PollFd::new(borrowed, PollFlags::POLLIN)
            })
            .collect()
    }

    fn handle_ready(&mut self, fds: &[PollFd<'_>]) {
        let is_readable = |pfd: &PollFd<'_>| {
            pfd.revents().is_some_and(|r| r.intersects(PollFlags::POLLIN | PollFlags::POLLHUP | PollFlags::POLLERR))
        };
        let mut idx = 0;
        let local_ready = is_readable(&fds[idx]);
        idx += 1;
        let network_ready = if self.network_listener.is_some() {
            let r = is_readable(&fds[idx]);
            idx += 1;
            r
        } else {
            false
        };
        let client_ids: Vec<u32> = self.clients.keys().copied().collect();
        let mut readable_clients = Vec::new();
        for id in client_ids {
            if is_readable(&fds[idx]) {
                readable_clients.push(id);
            }
            idx += 1;
        }

        if local_ready {
            self.dispatch_event(DaemonEvent::NewConnection { network: false });
        }
        if network_ready {
            self.dispatch_event(DaemonEvent::NewConnection { network: true });
        }
        for id in readable_clients {
            self.dispatch_event(DaemonEvent::ClientReadable(ClientId(id)));
        }
    }

    fn dispatch_event(&mut self, event: DaemonEvent) {
        match event {
            DaemonEvent::NewConnection { network: false } => self.accept_local(),
            DaemonEvent::NewConnection { network: true } => self.accept_network(),
            DaemonEvent::ClientReadable(id) => self.service_client(id.0),
            DaemonEvent::BackendEvents | DaemonEvent::SchedulerTick | DaemonEvent::Shutdown => {}
        }
    }

    fn admission_allows_one_more(&self) -> bool {
        (self.clients.len() as u32) < self.config.max_clients
    }

    fn accept_local(&mut self) {
        let stream = match self.local_listener.accept() {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(target: "daemon", error = %e, "local_accept_failed");
                return;
            }
        };
        if !self.admission_allows_one_more() {
            tracing::warn!(target: "daemon", "admission_rejected_max_clients_local");
            drop(stream);
            return;
        }
        self.register_client(ClientTransport::Local(stream));
    }

    fn accept_network(&mut self) {
        let Some(listener) = &self.network_listener else { return };
        let stream = match listener.accept() {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(target: "daemon", error = %e, "network_accept_failed");
                return;
            }
        };
        if !self.admission_allows_one_more() {
            tracing::warn!(target: "daemon", "admission_rejected_max_clients_network");
            drop(stream);
            return;
        }
        if let Err(e) = stream.set_nonblocking(true) {
            tracing::warn!(target: "daemon", error = %e, "set_nonblocking_failed");
            return;
        }
        self.register_client(ClientTransport::Network { stream, assembler: FrameAssembler::new() });
    }

    fn register_client(&mut self, transport: ClientTransport) {
        let id = self.next_client_id;
        self.next_client_id += 1;
        let session = ClientSession::new(ClientId(id), self.config.resource_limits);
        let client = Client::new(ClientId(id), transport, session);
        tracing::trace!(target: "daemon", client = id, "client_connected");
        self.clients.insert(id, client);
    }

    /// Reads and dispatches every complete frame currently available from
    /// one client, per spec.md §4.9's "drains as many complete framed
    /// messages as are present" rule.
    fn service_client(&mut self, id: u32) {
        let Some(client) = self.clients.get_mut(&id) else { return };
        let frames = match &mut client.transport {
            ClientTransport::Local(stream) => match read_local_frame(stream) {
                ReadOutcome::Frame(frame, fds) => vec![(frame, fds)],
                ReadOutcome::Closed => {
                    client.session.begin_disconnect();
                    Vec::new()
                }
            },
            ClientTransport::Network { stream, assembler } => {
                drain_network_frames(stream, assembler, &mut client.session)
            }
        };

        for (frame, fds) in frames {
            let outcome = dispatch(
                &mut client.session,
                &mut self.registry,
                &mut self.clipboard,
                &mut client.accounting,
                &frame,
                fds,
            );
            for reply in outcome.replies {
                if let Err(e) = client.transport.send_frame(&reply) {
                    tracing::warn!(target: "daemon", client = id, error = %e, "send_failed");
                    client.session.begin_disconnect();
                    break;
                }
            }
            if outcome.disconnect {
                client.session.begin_disconnect();
                break;
            }
        }
    }

    /// Drives a composite pass when the scheduler's deadline has passed,
    /// notifying each rendered surface's owner with `frame_complete`
    /// (spec.md §4.3, §4.8).
    fn maybe_composite(&mut self) {
        let now = self.now_ns();
        if !self.compositor.needs_composite(&self.registry, now) {
            return;
        }
        let about_to_render = self.compositor.surfaces_to_render(&self.registry);
        let owners: Vec<(u32, u32)> = about_to_render
            .iter()
            .filter_map(|id| self.registry.iter().find(|s| s.id == *id).map(|s| (*id, s.owner)))
            .collect();
        self.compositor.composite(&mut self.registry, now);

        for (surface_id, owner) in owners {
            let Some(frame_number) = self.registry.iter().find(|s| s.id == surface_id).map(|s| s.frame_number) else {
                continue;
            };
            if self.last_notified_frame.get(&surface_id) == Some(&frame_number) {
                continue;
            }
            self.last_notified_frame.insert(surface_id, frame_number);
            if let Some(client) = self.clients.get_mut(&owner) {
                let event = FrameCompleteEvent { id: surface_id, frame_number, timestamp_ns: now };
                if let Err(e) = client.transport.send_frame(&encode_frame(&event)) {
                    tracing::warn!(target: "daemon", client = owner, error = %e, "frame_complete_send_failed");
                    client.session.begin_disconnect();
                }
            }
        }
    }

    /// Tears down every session flagged `disconnecting`, freeing its
    /// surfaces, buffer accounting, and clipboard ownership (spec.md §5).
    fn reap_disconnected(&mut self) {
        let to_remove: Vec<u32> = self
            .clients
            .iter()
            .filter(|(_, c)| c.session.state() == semadraw_session::SessionState::Disconnecting)
            .map(|(id, _)| *id)
            .collect();
        for id in to_remove {
            if let Some(mut client) = self.clients.remove(&id) {
                let removed = self.registry.remove_client_surfaces(id);
                for (surface_id, pixels) in removed {
                    client.session.release_surface(surface_id, pixels);
                    client.accounting.remove_surface(&mut client.session, surface_id);
                    self.last_notified_frame.remove(&surface_id);
                }
                self.clipboard.remove_owner(ClientId(id));
                tracing::trace!(target: "daemon", client = id, "client_disconnected");
            }
        }
    }

    fn shutdown(&mut self) {
        tracing::info!(target: "daemon", "shutdown_begin");
        let ids: Vec<u32> = self.clients.keys().copied().collect();
        for id in ids {
            self.clients.remove(&id);
            self.registry.remove_client_surfaces(id);
        }
        self.compositor.backend_mut().deinit();
        tracing::info!(target: "daemon", "shutdown_complete");
    }
}

enum ReadOutcome {
    Frame(Vec<u8>, Vec<std::os::fd::OwnedFd>),
    Closed,
}

/// Local clients are serviced with one blocking `recvmsg` per poll
/// readiness (see `crate::client::ClientTransport` for why a byte-stream
/// assembler can't carry `SCM_RIGHTS` fds). This can stall the single loop
/// thread if a peer sends a header but withholds the rest of a frame's
/// bytes; accepted as a documented simplification given the 8 KiB local cap
/// (see `DESIGN.md`).
fn read_local_frame(stream: &mut LocalStream) -> ReadOutcome {
    match stream.recv_frame_with_fds(MAX_FDS_PER_FRAME) {
        Ok((frame, fds)) => ReadOutcome::Frame(frame, fds),
        Err(TransportError::Closed) => ReadOutcome::Closed,
        Err(e) => {
            tracing::warn!(target: "daemon", error = %e, "local_read_failed");
            ReadOutcome::Closed
        }
    }
}

fn drain_network_frames(
    stream: &mut NetworkStream,
    assembler: &mut FrameAssembler,
    session: &mut ClientSession,
) -> Vec<(Vec<u8>, Vec<std::os::fd::OwnedFd>)> {
    let mut buf = [0u8; 16 * 1024];
    loop {
        match stream.try_read(&mut buf) {
            Ok(0) => break,
            Ok(n) => assembler.feed(&buf[..n]),
            Err(TransportError::Closed) => {
                session.begin_disconnect();
                break;
            }
            Err(e) => {
                tracing::warn!(target: "daemon", error = %e, "network_read_failed");
                session.begin_disconnect();
                break;
            }
        }
    }

    let mut frames = Vec::new();
    loop {
        match assembler.try_take_frame(stream.max_body_size()) {
            Ok(Some(frame)) => frames.push((frame, Vec::new())),
            Ok(None) => break,
            Err(_) => {
                session.begin_disconnect();
                break;
            }
        }
    }
    frames
}
