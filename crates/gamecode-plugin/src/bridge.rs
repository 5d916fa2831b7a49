//! Event handlers that turn room creation into a two-step flow.
//!
//! 1. `room.beforecreate`: the requested settings are reserved under the
//!    client's fingerprint, creation is canceled and the client is asked to
//!    come back with a game code of its choosing.
//! 2. `worker.beforejoin`: if the joining client holds a reservation, the
//!    join is intercepted: `CANCEL` drops the reservation, a code that is
//!    already live is refused, anything else creates the room.
//!
//! Joins from clients without a reservation pass through untouched.

use crate::config::MessagesSection;
use crate::host::{ClientConnection, Worker};
use crate::reservation::{Reservation, ReservationStore};
use gamecode_core::{fingerprint, GameCode, CANCEL_CODE};
use std::sync::Arc;
use tracing::{info, warn};

/// A client asked to create a room.
pub struct BeforeCreateEvent<C, S> {
    pub client: Arc<C>,
    /// Settings requested for the new room.
    pub settings: S,
    canceled: bool,
}

impl<C, S> BeforeCreateEvent<C, S> {
    pub fn new(client: Arc<C>, settings: S) -> Self {
        Self {
            client,
            settings,
            canceled: false,
        }
    }

    /// Stop the host from creating the room.
    pub fn cancel(&mut self) {
        self.canceled = true;
    }

    pub fn is_canceled(&self) -> bool {
        self.canceled
    }
}

/// A client asked to join a room by code.
pub struct BeforeJoinEvent<C, R> {
    pub client: Arc<C>,
    pub code: GameCode,
    canceled: bool,
    room: Option<R>,
}

impl<C, R> BeforeJoinEvent<C, R> {
    pub fn new(client: Arc<C>, code: GameCode) -> Self {
        Self {
            client,
            code,
            canceled: false,
            room: None,
        }
    }

    /// Stop the host from handling the join.
    pub fn cancel(&mut self) {
        self.canceled = true;
    }

    pub fn is_canceled(&self) -> bool {
        self.canceled
    }

    /// Redirect the join into `room`.
    pub fn set_room(&mut self, room: R) {
        self.room = Some(room);
    }

    pub fn room(&self) -> Option<&R> {
        self.room.as_ref()
    }

    pub fn take_room(&mut self) -> Option<R> {
        self.room.take()
    }
}

/// What [`EventBridge::on_before_join`] did with a join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// No reservation; the host handles the join normally.
    Passthrough,
    /// The client sent `CANCEL`; reservation dropped.
    Canceled,
    /// A room with that code is already live; reservation kept.
    CodeInUse,
    /// Room created from the reservation, which was consumed.
    Created,
    /// The host failed to create the room; reservation kept.
    CreationFailed,
}

/// Handlers for the two host events, sharing one reservation store.
pub struct EventBridge<W: Worker> {
    store: ReservationStore<W::Settings>,
    worker: Arc<W>,
    messages: MessagesSection,
}

impl<W: Worker> EventBridge<W> {
    pub fn new(
        store: ReservationStore<W::Settings>,
        worker: Arc<W>,
        messages: MessagesSection,
    ) -> Self {
        Self {
            store,
            worker,
            messages,
        }
    }

    pub fn store(&self) -> &ReservationStore<W::Settings> {
        &self.store
    }

    pub fn worker(&self) -> &Arc<W> {
        &self.worker
    }

    /// Reserve the requested settings and send the client off to pick a code.
    pub async fn on_before_create<C: ClientConnection>(
        &self,
        ev: &mut BeforeCreateEvent<C, W::Settings>,
    ) {
        let owner = fingerprint(ev.client.info());
        let client = owner.digest();
        self.store.put(owner, ev.settings.clone()).await;

        ev.cancel();
        ev.client.disconnect(&self.messages.prompt);
        info!(client = %client, "creating new room, waiting for game code");
    }

    /// Resolve a join against the client's pending reservation, if any.
    pub async fn on_before_join<C: ClientConnection>(
        &self,
        ev: &mut BeforeJoinEvent<C, W::Room>,
    ) -> JoinOutcome {
        let owner = fingerprint(ev.client.info());
        let Some(reservation) = self.store.get(&owner).await else {
            return JoinOutcome::Passthrough;
        };
        let client = owner.digest();

        if ev.code == CANCEL_CODE {
            self.release(&reservation).await;
            ev.client.disconnect(&self.messages.canceled);
            ev.cancel();
            info!(client = %client, "canceled custom game code room creation");
            return JoinOutcome::Canceled;
        }

        if self.worker.find_room(ev.code).await.is_some() {
            ev.client.disconnect(&self.messages.code_in_use);
            ev.cancel();
            info!(client = %client, code = %ev.code, "tried to create a room with a used game code");
            return JoinOutcome::CodeInUse;
        }

        match self.worker.create_room(ev.code, reservation.settings.clone()).await {
            Ok(room) => {
                ev.set_room(room);
                self.release(&reservation).await;
                info!(client = %client, code = %ev.code, "created room with custom game code");
                JoinOutcome::Created
            }
            Err(e) => {
                ev.client.disconnect(&self.messages.creation_failed);
                ev.cancel();
                warn!(client = %client, code = %ev.code, error = %e, "custom game code room creation failed");
                JoinOutcome::CreationFailed
            }
        }
    }

    /// Drop `reservation` unless a newer one has replaced it since it was read.
    async fn release(&self, reservation: &Reservation<W::Settings>) -> bool {
        self.store
            .consume_if(&reservation.owner, reservation.id)
            .await
    }
}
