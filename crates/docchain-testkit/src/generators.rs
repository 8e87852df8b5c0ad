//! Proptest generators for property-based testing.

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use serde_json::{Map, Value};

use docchain_core::{
    mine, Action, Block, BlockPayload, DataHash, EventBuilder, PendingTransaction, Timestamp,
    Transaction, MINER,
};

/// Generate a random DataHash.
pub fn data_hash() -> impl Strategy<Value = DataHash> {
    any::<[u8; 32]>().prop_map(DataHash::from_bytes)
}

/// Generate one of the event actions (never `init`).
pub fn action() -> impl Strategy<Value = Action> {
    prop_oneof![
        Just(Action::Export),
        Just(Action::Sign),
        Just(Action::Verify),
        Just(Action::Update),
    ]
}

/// Generate a timestamp between 2000 and 2100, microsecond precision.
pub fn timestamp() -> impl Strategy<Value = Timestamp> {
    (946_684_800i64..4_102_444_800i64, 0u32..1_000_000u32).prop_map(|(secs, micros)| {
        Utc.timestamp_opt(secs, micros * 1_000)
            .single()
            .unwrap_or_default()
    })
}

/// Generate a document id.
pub fn document_id() -> impl Strategy<Value = String> {
    "DOC-[0-9]{4}-[A-Z0-9]{1,8}".prop_map(String::from)
}

/// Generate an operator id.
pub fn operator_id() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,15}".prop_map(String::from)
}

/// Generate free text, including non-ASCII and control characters.
pub fn summary() -> impl Strategy<Value = String> {
    any::<String>()
}

/// Generate an arbitrary float-free JSON value of bounded depth.
pub fn json_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        any::<u64>().prop_map(Value::from),
        any::<String>().prop_map(Value::String),
    ];
    leaf.prop_recursive(4, 32, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::btree_map(any::<String>(), inner, 0..6)
                .prop_map(|m| Value::Object(m.into_iter().collect::<Map<_, _>>())),
        ]
    })
}

/// Parameters for generating an event.
#[derive(Debug, Clone)]
pub struct EventParams {
    pub action: Action,
    pub operator_id: String,
    pub certificate_thumbprint: Option<String>,
    pub document_id: String,
    pub summary: String,
    pub signature: Option<String>,
    pub timestamp: Timestamp,
}

impl Arbitrary for EventParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            action(),
            operator_id(),
            proptest::option::of("SHA1(:[0-9A-F]{2}){4}"),
            document_id(),
            summary(),
            proptest::option::of("[A-Za-z0-9+/]{8,32}={0,2}"),
            timestamp(),
        )
            .prop_map(
                |(action, operator_id, certificate, document_id, summary, signature, timestamp)| {
                    EventParams {
                        action,
                        operator_id,
                        certificate_thumbprint: certificate,
                        document_id,
                        summary,
                        signature,
                        timestamp,
                    }
                },
            )
            .boxed()
    }
}

impl EventParams {
    /// The builder these parameters describe, with a fixed tx id so the
    /// result is reproducible.
    pub fn builder(&self) -> EventBuilder {
        let mut builder = EventBuilder::new(self.action)
            .operator(self.operator_id.clone())
            .document(self.document_id.clone())
            .summary(self.summary.clone())
            .signature(self.signature.clone())
            .timestamp(self.timestamp)
            .tx_id(format!("TX-PROP-{}", self.document_id));
        if let Some(cert) = &self.certificate_thumbprint {
            builder = builder.certificate(cert.clone());
        }
        builder
    }
}

/// Build a pending transaction from parameters.
pub fn pending_from_params(params: &EventParams) -> PendingTransaction {
    params
        .builder()
        .build()
        .unwrap_or_else(|e| panic!("generated event must be valid: {e}"))
}

/// Mine a chain of genesis plus one block per event, at `difficulty`.
pub fn chain_from_events(events: &[EventParams], difficulty: u32) -> Vec<(Block, Vec<Transaction>)> {
    let mut chain: Vec<(Block, Vec<Transaction>)> = Vec::with_capacity(events.len() + 1);
    let genesis_at = events
        .iter()
        .map(|e| e.timestamp)
        .min()
        .unwrap_or_default();
    let genesis = PendingTransaction::genesis(genesis_at)
        .unwrap_or_else(|e| panic!("genesis: {e}"));

    let pending = std::iter::once(genesis).chain(events.iter().enumerate().map(|(i, params)| {
        let mut tx = pending_from_params(params);
        tx.tx_id = format!("TX-PROP-{i}").into();
        tx
    }));

    for (index, tx) in pending.enumerate() {
        let number = index as u64 + 1;
        let previous = chain.last().map_or(DataHash::ZERO, |(b, _)| b.data_hash);
        let payload = BlockPayload::new(previous, tx.timestamp, tx.clone());
        let mined = mine(&payload, difficulty, u64::MAX).unwrap_or_else(|e| panic!("mine: {e}"));
        let block = Block::from_mined(number, &payload, &mined, difficulty, MINER);
        chain.push((block, vec![tx.commit(number)]));
    }
    chain
}
