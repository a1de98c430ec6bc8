//! In-process overlay provider.
//!
//! Every handle opened from one [`LoopbackOverlay`] shares a topic hub. When
//! two handles announce the same topic with compatible roles they are linked
//! by an in-memory duplex stream and both receive a `Connection` event.
//! Destroying a handle emits `Closed` to every linked remote.

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::{
    Discovery, JoinOptions, OverlayError, OverlayEvent, OverlayEvents, OverlayHandle,
    OverlayNetwork, PeerId, PeerStream, Topic,
};

type EventSender = mpsc::UnboundedSender<OverlayEvent>;

struct Announcement {
    peer: PeerId,
    options: JoinOptions,
}

struct Link {
    remote: PeerId,
    open: Arc<AtomicBool>,
}

struct Member {
    events: EventSender,
    links: Vec<Link>,
}

#[derive(Default)]
struct Hub {
    topics: HashMap<Topic, Vec<Announcement>>,
    members: HashMap<PeerId, Member>,
}

impl Hub {
    fn is_linked(&self, a: &PeerId, b: &PeerId) -> bool {
        self.members
            .get(a)
            .is_some_and(|member| member.links.iter().any(|link| &link.remote == b))
    }

    fn link(&mut self, a: &PeerId, b: &PeerId) {
        if self.is_linked(a, b) {
            return;
        }
        let (Some(a_events), Some(b_events)) = (
            self.members.get(a).map(|m| m.events.clone()),
            self.members.get(b).map(|m| m.events.clone()),
        ) else {
            return;
        };

        let open = Arc::new(AtomicBool::new(true));
        let a_stream = LoopbackStream {
            local: a.clone(),
            remote_events: b_events.clone(),
            open: open.clone(),
        };
        let b_stream = LoopbackStream {
            local: b.clone(),
            remote_events: a_events.clone(),
            open: open.clone(),
        };
        let _ = a_events.send(OverlayEvent::Connection {
            peer: b.clone(),
            stream: Arc::new(a_stream),
        });
        let _ = b_events.send(OverlayEvent::Connection {
            peer: a.clone(),
            stream: Arc::new(b_stream),
        });

        if let Some(member) = self.members.get_mut(a) {
            member.links.push(Link {
                remote: b.clone(),
                open: open.clone(),
            });
        }
        if let Some(member) = self.members.get_mut(b) {
            member.links.push(Link {
                remote: a.clone(),
                open,
            });
        }
        tracing::debug!("Loopback link {} <-> {}", a.short(), b.short());
    }

    fn announce(&mut self, peer: &PeerId, topic: Topic, options: JoinOptions) {
        let candidates: Vec<PeerId> = self
            .topics
            .get(&topic)
            .map(|announcements| {
                announcements
                    .iter()
                    .filter(|a| &a.peer != peer && options.compatible_with(&a.options))
                    .map(|a| a.peer.clone())
                    .collect()
            })
            .unwrap_or_default();
        for remote in candidates {
            self.link(peer, &remote);
        }

        let announcements = self.topics.entry(topic).or_default();
        announcements.retain(|a| &a.peer != peer);
        announcements.push(Announcement {
            peer: peer.clone(),
            options,
        });
    }

    fn evict(&mut self, peer: &PeerId) {
        if let Some(member) = self.members.remove(peer) {
            for link in member.links {
                link.open.store(false, Ordering::SeqCst);
                if let Some(remote) = self.members.get_mut(&link.remote) {
                    remote.links.retain(|l| &l.remote != peer);
                    let _ = remote
                        .events
                        .send(OverlayEvent::Closed { peer: peer.clone() });
                }
            }
        }
        for announcements in self.topics.values_mut() {
            announcements.retain(|a| &a.peer != peer);
        }
        self.topics.retain(|_, announcements| !announcements.is_empty());
    }
}

/// In-process overlay provider backed by a shared topic hub.
#[derive(Clone, Default)]
pub struct LoopbackOverlay {
    hub: Arc<Mutex<Hub>>,
}

impl LoopbackOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of handles currently announcing `topic`.
    pub fn announced(&self, topic: &Topic) -> usize {
        lock(&self.hub).topics.get(topic).map_or(0, Vec::len)
    }

    /// Number of live (not destroyed) handles.
    pub fn members(&self) -> usize {
        lock(&self.hub).members.len()
    }
}

fn lock(hub: &Mutex<Hub>) -> MutexGuard<'_, Hub> {
    hub.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl OverlayNetwork for LoopbackOverlay {
    async fn open(&self) -> Result<(Box<dyn OverlayHandle>, OverlayEvents), OverlayError> {
        let key: [u8; 32] = rand::random();
        let peer = PeerId::from_public_key(&key);
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        lock(&self.hub).members.insert(
            peer.clone(),
            Member {
                events: events_tx,
                links: Vec::new(),
            },
        );
        tracing::debug!("Loopback handle {} opened", peer.short());

        let handle = LoopbackHandle {
            key: peer,
            hub: self.hub.clone(),
            destroyed: false,
        };
        Ok((Box::new(handle), events_rx))
    }
}

/// Membership of one handle in the loopback hub.
pub struct LoopbackHandle {
    key: PeerId,
    hub: Arc<Mutex<Hub>>,
    destroyed: bool,
}

#[async_trait]
impl OverlayHandle for LoopbackHandle {
    fn public_key(&self) -> PeerId {
        self.key.clone()
    }

    async fn join(
        &mut self,
        topic: Topic,
        options: JoinOptions,
    ) -> Result<Discovery, OverlayError> {
        if self.destroyed {
            return Err(OverlayError::Destroyed);
        }
        let mut hub = lock(&self.hub);
        if !hub.members.contains_key(&self.key) {
            return Err(OverlayError::Destroyed);
        }
        hub.announce(&self.key, topic, options);

        let (flushed, discovery) = Discovery::channel();
        let _ = flushed.send(Ok(()));
        Ok(discovery)
    }

    async fn destroy(&mut self) -> Result<(), OverlayError> {
        if !self.destroyed {
            self.destroyed = true;
            lock(&self.hub).evict(&self.key);
            tracing::debug!("Loopback handle {} destroyed", self.key.short());
        }
        Ok(())
    }
}

impl Drop for LoopbackHandle {
    fn drop(&mut self) {
        if !self.destroyed {
            lock(&self.hub).evict(&self.key);
        }
    }
}

/// One direction of a loopback link: frames written here surface as `Data`
/// events on the remote handle.
struct LoopbackStream {
    local: PeerId,
    remote_events: EventSender,
    open: Arc<AtomicBool>,
}

impl PeerStream for LoopbackStream {
    fn write(&self, payload: Vec<u8>) -> Result<(), OverlayError> {
        if !self.open.load(Ordering::SeqCst) {
            return Err(OverlayError::StreamClosed);
        }
        self.remote_events
            .send(OverlayEvent::Data {
                peer: self.local.clone(),
                payload,
            })
            .map_err(|_| OverlayError::StreamClosed)
    }
}
