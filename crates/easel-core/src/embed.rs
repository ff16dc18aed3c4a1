//! State sync with embedded pages over a postMessage-style channel.
//!
//! Replies can arrive late, out of order or never. Each request carries a
//! correlation id and an embed has at most one request outstanding: a new
//! request supersedes the previous one. A reply is applied only if its id is
//! the outstanding one for that item and its origin matches the one recorded
//! on the embed. The first accepted message records the origin.

use crate::items::{EmbedData, ItemId, ItemKind, ItemPatch};
use crate::store::ItemStore;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Protocol version stamped on every outbound message.
pub const EMBED_PROTOCOL_VERSION: u32 = 1;

/// Message sent to an embedded page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EmbedOutbound {
    GetState {
        #[serde(rename = "requestId", default, skip_serializing_if = "Option::is_none")]
        request_id: Option<String>,
        version: u32,
    },
    SetState {
        payload: Value,
        version: u32,
    },
}

/// Message received from an embedded page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EmbedInbound {
    State {
        #[serde(default)]
        payload: Value,
        #[serde(default)]
        version: u32,
        #[serde(rename = "requestId", default, skip_serializing_if = "Option::is_none")]
        request_id: Option<String>,
    },
}

/// An outbound message addressed to one embed.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    pub item_id: ItemId,
    /// Origin the host should post to; `None` when the URL has no origin.
    pub target_origin: Option<String>,
    pub message: EmbedOutbound,
}

/// Why a reply was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    Malformed,
    /// The item was removed or never existed.
    UnknownItem,
    NotAnEmbed,
    ForeignOrigin,
    /// The correlation id is no newer than the last request issued to this item.
    Stale,
    /// The correlation id was never issued for this item.
    UnknownRequest,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReplyOutcome {
    Applied { item_id: ItemId, version: u32 },
    Discarded(DiscardReason),
}

/// Correlation bookkeeping for embed state requests.
#[derive(Debug, Default)]
pub struct EmbedSync {
    /// Outstanding request id per item.
    pending: HashMap<ItemId, u64>,
    /// Newest request sequence issued per item.
    issued: HashMap<ItemId, u64>,
    next_request: u64,
}

const REQUEST_PREFIX: &str = "req-";

fn request_seq(request_id: &str) -> Option<u64> {
    request_id.strip_prefix(REQUEST_PREFIX)?.parse().ok()
}

fn target_origin(embed: &EmbedData) -> Option<String> {
    embed.embed_origin.clone().or_else(|| embed.url_origin())
}

impl EmbedSync {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of requests still waiting for a reply.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    fn next_request_seq(&mut self) -> u64 {
        self.next_request += 1;
        self.next_request
    }

    /// Ask one embed for its state.
    pub fn request_state(&mut self, store: &ItemStore, item_id: &str) -> Option<OutboundMessage> {
        let ItemKind::Embed(embed) = &store.get(item_id)?.kind else {
            return None;
        };
        let seq = self.next_request_seq();
        if let Some(previous) = self.pending.insert(item_id.to_string(), seq) {
            log::debug!("Request {}{} for {} superseded", REQUEST_PREFIX, previous, item_id);
        }
        self.issued.insert(item_id.to_string(), seq);
        Some(OutboundMessage {
            item_id: item_id.to_string(),
            target_origin: target_origin(embed),
            message: EmbedOutbound::GetState {
                request_id: Some(format!("{REQUEST_PREFIX}{seq}")),
                version: EMBED_PROTOCOL_VERSION,
            },
        })
    }

    /// Ask every embed on the canvas for its state.
    pub fn request_all(&mut self, store: &ItemStore) -> Vec<OutboundMessage> {
        let ids: Vec<ItemId> = store
            .items()
            .iter()
            .filter(|item| matches!(item.kind, ItemKind::Embed(_)))
            .map(|item| item.id.clone())
            .collect();
        ids.iter()
            .filter_map(|id| self.request_state(store, id))
            .collect()
    }

    /// Record new state locally and build the message that pushes it to the page.
    pub fn set_state(
        &mut self,
        store: &mut ItemStore,
        item_id: &str,
        payload: Value,
    ) -> Option<OutboundMessage> {
        let ItemKind::Embed(embed) = &store.get(item_id)?.kind else {
            return None;
        };
        let mut embed = embed.clone();
        embed.embed_state = Some(payload.clone());
        embed.embed_state_version = Some(EMBED_PROTOCOL_VERSION);
        let target_origin = target_origin(&embed);
        store.update(item_id, ItemPatch::new().kind(ItemKind::Embed(embed)));
        Some(OutboundMessage {
            item_id: item_id.to_string(),
            target_origin,
            message: EmbedOutbound::SetState {
                payload,
                version: EMBED_PROTOCOL_VERSION,
            },
        })
    }

    /// Handle a raw message posted by the page shown in `item_id`.
    pub fn handle_message(
        &mut self,
        store: &mut ItemStore,
        item_id: &str,
        origin: &str,
        data: &Value,
    ) -> ReplyOutcome {
        let outcome = self.apply(store, item_id, origin, data);
        if let ReplyOutcome::Discarded(reason) = &outcome {
            log::warn!("Discarding embed message for {} from {}: {:?}", item_id, origin, reason);
        }
        outcome
    }

    fn apply(&mut self, store: &mut ItemStore, item_id: &str, origin: &str, data: &Value) -> ReplyOutcome {
        let Ok(EmbedInbound::State {
            payload,
            version,
            request_id,
        }) = EmbedInbound::deserialize(data)
        else {
            return ReplyOutcome::Discarded(DiscardReason::Malformed);
        };

        let Some(item) = store.get(item_id) else {
            self.forget(item_id);
            return ReplyOutcome::Discarded(DiscardReason::UnknownItem);
        };
        let ItemKind::Embed(embed) = &item.kind else {
            return ReplyOutcome::Discarded(DiscardReason::NotAnEmbed);
        };
        if !embed.accepts_origin(origin) {
            return ReplyOutcome::Discarded(DiscardReason::ForeignOrigin);
        }
        if let Some(request_id) = request_id {
            let seq = request_seq(&request_id);
            match (seq, self.pending.get(item_id)) {
                (Some(seq), Some(&pending)) if seq == pending => {
                    self.pending.remove(item_id);
                }
                (Some(seq), _) if self.issued.get(item_id).is_some_and(|&newest| seq <= newest) => {
                    return ReplyOutcome::Discarded(DiscardReason::Stale);
                }
                _ => return ReplyOutcome::Discarded(DiscardReason::UnknownRequest),
            }
        }

        let mut embed = embed.clone();
        if embed.embed_origin.is_none() {
            log::debug!("Embed {} adopted origin {}", item_id, origin);
            embed.embed_origin = Some(origin.to_string());
        }
        embed.embed_state = Some(payload);
        embed.embed_state_version = Some(version);
        store.update(item_id, ItemPatch::new().kind(ItemKind::Embed(embed)));
        ReplyOutcome::Applied {
            item_id: item_id.to_string(),
            version,
        }
    }

    /// Drop pending requests for a removed item.
    pub fn forget(&mut self, item_id: &str) {
        self.pending.remove(item_id);
        self.issued.remove(item_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::ItemDraft;
    use serde_json::json;

    fn setup() -> (ItemStore, ItemId) {
        let mut store = ItemStore::new();
        let id = store.add(ItemDraft::embed("https://widgets.example.com/chart"));
        store.add(ItemDraft::component("button", 0));
        (store, id)
    }

    fn embed(store: &ItemStore, id: &str) -> EmbedData {
        match &store.get(id).unwrap().kind {
            ItemKind::Embed(embed) => embed.clone(),
            other => panic!("not an embed: {other:?}"),
        }
    }

    const ORIGIN: &str = "https://widgets.example.com";

    #[test]
    fn test_request_all_targets_embeds_only() {
        let (store, id) = setup();
        let mut sync = EmbedSync::new();
        let messages = sync.request_all(&store);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].item_id, id);
        assert_eq!(messages[0].target_origin.as_deref(), Some(ORIGIN));
        assert_eq!(sync.pending_count(), 1);

        let wire = serde_json::to_value(&messages[0].message).unwrap();
        assert_eq!(wire["type"], "getState");
        assert_eq!(wire["version"], EMBED_PROTOCOL_VERSION);
        assert!(wire["requestId"].is_string());
    }

    #[test]
    fn test_reply_applies_and_adopts_origin() {
        let (mut store, id) = setup();
        let mut sync = EmbedSync::new();
        let request = sync.request_state(&store, &id).unwrap();
        let EmbedOutbound::GetState { request_id, .. } = request.message else {
            panic!("expected getState");
        };

        let reply = json!({"type": "state", "payload": {"zoom": 3}, "version": 1, "requestId": request_id});
        let outcome = sync.handle_message(&mut store, &id, ORIGIN, &reply);
        assert_eq!(outcome, ReplyOutcome::Applied { item_id: id.clone(), version: 1 });

        let data = embed(&store, &id);
        assert_eq!(data.embed_origin.as_deref(), Some(ORIGIN));
        assert_eq!(data.embed_state, Some(json!({"zoom": 3})));
        assert_eq!(sync.pending_count(), 0);

        // The same reply again is stale.
        let outcome = sync.handle_message(&mut store, &id, ORIGIN, &reply);
        assert_eq!(outcome, ReplyOutcome::Discarded(DiscardReason::Stale));
    }

    #[test]
    fn test_foreign_origin_discarded() {
        let (mut store, id) = setup();
        let mut sync = EmbedSync::new();
        let first = json!({"type": "state", "payload": 1, "version": 1});
        sync.handle_message(&mut store, &id, ORIGIN, &first);

        let spoofed = json!({"type": "state", "payload": 2, "version": 1});
        let outcome = sync.handle_message(&mut store, &id, "https://evil.test", &spoofed);
        assert_eq!(outcome, ReplyOutcome::Discarded(DiscardReason::ForeignOrigin));
        assert_eq!(embed(&store, &id).embed_state, Some(json!(1)));
    }

    #[test]
    fn test_reply_after_removal_discarded() {
        let (mut store, id) = setup();
        let mut sync = EmbedSync::new();
        sync.request_all(&store);
        store.remove(&id);

        let reply = json!({"type": "state", "payload": {}, "version": 1, "requestId": "req-1"});
        let outcome = sync.handle_message(&mut store, &id, ORIGIN, &reply);
        assert_eq!(outcome, ReplyOutcome::Discarded(DiscardReason::UnknownItem));
        assert_eq!(sync.pending_count(), 0);
    }

    #[test]
    fn test_older_reply_after_newer_is_discarded() {
        let (mut store, id) = setup();
        let mut sync = EmbedSync::new();
        sync.request_state(&store, &id);
        sync.request_state(&store, &id);
        assert_eq!(sync.pending_count(), 1);

        let newer = json!({"type": "state", "payload": "new", "version": 1, "requestId": "req-2"});
        let older = json!({"type": "state", "payload": "old", "version": 1, "requestId": "req-1"});
        assert!(matches!(
            sync.handle_message(&mut store, &id, ORIGIN, &newer),
            ReplyOutcome::Applied { .. }
        ));
        assert_eq!(
            sync.handle_message(&mut store, &id, ORIGIN, &older),
            ReplyOutcome::Discarded(DiscardReason::Stale)
        );
        assert_eq!(embed(&store, &id).embed_state, Some(json!("new")));
        assert_eq!(sync.pending_count(), 0);
    }

    #[test]
    fn test_superseded_reply_before_newer_is_discarded() {
        let (mut store, id) = setup();
        let mut sync = EmbedSync::new();
        sync.request_state(&store, &id);
        sync.request_state(&store, &id);

        let older = json!({"type": "state", "payload": "old", "version": 1, "requestId": "req-1"});
        assert_eq!(
            sync.handle_message(&mut store, &id, ORIGIN, &older),
            ReplyOutcome::Discarded(DiscardReason::Stale)
        );
        assert_eq!(embed(&store, &id).embed_state, None);
        assert_eq!(sync.pending_count(), 1);
    }

    #[test]
    fn test_silent_embed_keeps_pending_bounded() {
        let (mut store, _) = setup();
        store.add(ItemDraft::embed("https://widgets.example.com/map"));
        let mut sync = EmbedSync::new();
        for _ in 0..50 {
            assert_eq!(sync.request_all(&store).len(), 2);
        }
        assert_eq!(sync.pending_count(), 2);
    }

    #[test]
    fn test_unissued_request_id_rejected() {
        let (mut store, id) = setup();
        let mut sync = EmbedSync::new();
        sync.request_state(&store, &id);

        for request_id in ["req-9", "bogus"] {
            let reply = json!({"type": "state", "payload": {}, "version": 1, "requestId": request_id});
            assert_eq!(
                sync.handle_message(&mut store, &id, ORIGIN, &reply),
                ReplyOutcome::Discarded(DiscardReason::UnknownRequest)
            );
        }
        assert_eq!(sync.pending_count(), 1);
    }

    #[test]
    fn test_request_id_for_other_item_rejected() {
        let (mut store, id) = setup();
        let other = store.add(ItemDraft::embed("https://widgets.example.com/map"));
        let mut sync = EmbedSync::new();
        sync.request_state(&store, &other);

        let reply = json!({"type": "state", "payload": {}, "version": 1, "requestId": "req-1"});
        let outcome = sync.handle_message(&mut store, &id, ORIGIN, &reply);
        assert_eq!(outcome, ReplyOutcome::Discarded(DiscardReason::UnknownRequest));
        assert_eq!(sync.pending_count(), 1);
    }

    #[test]
    fn test_malformed_and_non_embed() {
        let (mut store, _) = setup();
        let button = store.first_selected().unwrap().id.clone();
        let mut sync = EmbedSync::new();
        let bogus = json!({"type": "resize", "height": 10});
        assert_eq!(
            sync.handle_message(&mut store, &button, ORIGIN, &bogus),
            ReplyOutcome::Discarded(DiscardReason::Malformed)
        );
        let reply = json!({"type": "state", "payload": {}, "version": 1});
        assert_eq!(
            sync.handle_message(&mut store, &button, ORIGIN, &reply),
            ReplyOutcome::Discarded(DiscardReason::NotAnEmbed)
        );
    }

    #[test]
    fn test_set_state_records_locally() {
        let (mut store, id) = setup();
        let mut sync = EmbedSync::new();
        let out = sync.set_state(&mut store, &id, json!({"theme": "dark"})).unwrap();
        let wire = serde_json::to_value(&out.message).unwrap();
        assert_eq!(wire, json!({"type": "setState", "payload": {"theme": "dark"}, "version": 1}));
        assert_eq!(embed(&store, &id).embed_state, Some(json!({"theme": "dark"})));
    }
}
