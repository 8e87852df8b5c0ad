//! Transactions: document-lifecycle events recorded on the chain.
//!
//! An event starts as a [`PendingTransaction`] built by [`EventBuilder`].
//! Committing it into a block assigns the block number and yields a
//! [`Transaction`]; nothing about it changes afterwards.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, Result};
use crate::types::{format_timestamp, now, Timestamp, TxId};

/// Transaction id of the genesis event.
pub const GENESIS_TX_ID: &str = "GENESIS-TX-001";

/// What happened to the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Export,
    Sign,
    Verify,
    Update,
    /// Ledger initialisation; only the genesis transaction carries it.
    Init,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Export => "export",
            Action::Sign => "sign",
            Action::Verify => "verify",
            Action::Update => "update",
            Action::Init => "init",
        }
    }

    /// The `operation_type` recorded for this action.
    pub fn operation_type(self) -> &'static str {
        match self {
            Action::Export => "document_export",
            Action::Sign => "document_sign",
            Action::Verify => "document_verify",
            Action::Update => "document_update",
            Action::Init => "system",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "export" => Ok(Action::Export),
            "sign" => Ok(Action::Sign),
            "verify" => Ok(Action::Verify),
            "update" => Ok(Action::Update),
            "init" => Ok(Action::Init),
            other => Err(CoreError::UnknownAction(other.to_string())),
        }
    }
}

/// An event that has not been assigned to a block yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTransaction {
    pub tx_id: TxId,
    pub operation_type: String,
    pub operator_id: Option<String>,
    pub certificate_thumbprint: Option<String>,
    pub document_id: Option<String>,
    pub action: Action,
    pub data_summary: String,
    pub timestamp: Timestamp,
    /// Opaque signature produced by an external signer.
    pub signature: Option<String>,
}

impl PendingTransaction {
    /// The genesis event, created once when an empty ledger is initialised.
    pub fn genesis(at: Timestamp) -> Result<Self> {
        let info = json!({
            "message": "DOCScoin Audit Blockchain Genesis Block",
            "created": format_timestamp(&at),
            "standard_version": "2.0.0",
        });
        let summary = crate::canonical::canonical_json(&info)?;
        Ok(Self {
            tx_id: TxId::new(GENESIS_TX_ID),
            operation_type: Action::Init.operation_type().to_string(),
            operator_id: None,
            certificate_thumbprint: None,
            document_id: None,
            action: Action::Init,
            // canonical_json only emits ASCII
            data_summary: String::from_utf8_lossy(&summary).into_owned(),
            timestamp: at,
            signature: None,
        })
    }

    /// The JSON object hashed into the owning block's payload.
    ///
    /// `block_number` is deliberately absent: it follows from the block's
    /// position and is assigned after hashing.
    pub fn to_canonical_value(&self) -> Value {
        json!({
            "tx_id": self.tx_id.as_str(),
            "operation_type": self.operation_type,
            "operator_id": self.operator_id,
            "certificate_thumbprint": self.certificate_thumbprint,
            "document_id": self.document_id,
            "action": self.action.as_str(),
            "data_summary": self.data_summary,
            "timestamp": format_timestamp(&self.timestamp),
            "signature": self.signature,
        })
    }

    /// Attach the transaction to the block that commits it.
    pub fn commit(self, block_number: u64) -> Transaction {
        Transaction {
            block_number,
            body: self,
        }
    }

    pub fn is_genesis(&self) -> bool {
        self.action == Action::Init && self.tx_id.as_str() == GENESIS_TX_ID
    }

    /// Check the fields every event must carry before it may be mined.
    ///
    /// Genesis is exempt from the operator and document requirements; any
    /// other transaction must name both and may not use `init`.
    pub fn validate(&self) -> Result<()> {
        if self.operation_type != self.action.operation_type() {
            return Err(CoreError::InvalidInput(format!(
                "operation_type {:?} does not match action {}",
                self.operation_type, self.action
            )));
        }
        if self.is_genesis() {
            return Ok(());
        }
        if self.action == Action::Init {
            return Err(CoreError::InvalidInput(
                "init is reserved for the genesis transaction".into(),
            ));
        }
        if self.tx_id.as_str().trim().is_empty() {
            return Err(CoreError::InvalidInput("tx_id is required".into()));
        }
        required("operator_id", self.operator_id.as_deref())?;
        required("document_id", self.document_id.as_deref())?;
        Ok(())
    }
}

/// A committed transaction, owned by exactly one block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub block_number: u64,
    #[serde(flatten)]
    pub body: PendingTransaction,
}

impl Transaction {
    pub fn tx_id(&self) -> &TxId {
        &self.body.tx_id
    }

    pub fn document_id(&self) -> Option<&str> {
        self.body.document_id.as_deref()
    }

    pub fn operator_id(&self) -> Option<&str> {
        self.body.operator_id.as_deref()
    }

    pub fn action(&self) -> Action {
        self.body.action
    }

    pub fn timestamp(&self) -> &Timestamp {
        &self.body.timestamp
    }
}

/// Builder for events submitted by collaborators.
///
/// `build` rejects events missing an operator or document before anything
/// reaches the chain.
#[derive(Debug, Clone)]
pub struct EventBuilder {
    action: Action,
    operator_id: Option<String>,
    certificate_thumbprint: Option<String>,
    document_id: Option<String>,
    data_summary: String,
    signature: Option<String>,
    timestamp: Option<Timestamp>,
    tx_id: Option<TxId>,
}

impl EventBuilder {
    /// Start building an event for `action`.
    pub fn new(action: Action) -> Self {
        Self {
            action,
            operator_id: None,
            certificate_thumbprint: None,
            document_id: None,
            data_summary: String::new(),
            signature: None,
            timestamp: None,
            tx_id: None,
        }
    }

    pub fn operator(mut self, operator_id: impl Into<String>) -> Self {
        self.operator_id = Some(operator_id.into());
        self
    }

    pub fn certificate(mut self, thumbprint: impl Into<String>) -> Self {
        self.certificate_thumbprint = Some(thumbprint.into());
        self
    }

    pub fn document(mut self, document_id: impl Into<String>) -> Self {
        self.document_id = Some(document_id.into());
        self
    }

    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.data_summary = summary.into();
        self
    }

    pub fn signature(mut self, signature: Option<String>) -> Self {
        self.signature = signature;
        self
    }

    /// Override the event time (defaults to now).
    pub fn timestamp(mut self, ts: Timestamp) -> Self {
        self.timestamp = Some(ts);
        self
    }

    /// Override the generated transaction id.
    pub fn tx_id(mut self, tx_id: impl Into<TxId>) -> Self {
        self.tx_id = Some(tx_id.into());
        self
    }

    /// Validate required fields and produce the pending transaction.
    pub fn build(self) -> Result<PendingTransaction> {
        if self.action == Action::Init {
            return Err(CoreError::InvalidInput(
                "init is reserved for the genesis transaction".into(),
            ));
        }
        let operator_id = self.operator_id.unwrap_or_default();
        let document_id = self.document_id.unwrap_or_default();
        let certificate_thumbprint = self
            .certificate_thumbprint
            .filter(|c| !c.trim().is_empty());

        let timestamp = self.timestamp.unwrap_or_else(now);
        let tx_id = self
            .tx_id
            .unwrap_or_else(|| TxId::generate(&document_id, &timestamp));

        let pending = PendingTransaction {
            tx_id,
            operation_type: self.action.operation_type().to_string(),
            operator_id: Some(operator_id),
            certificate_thumbprint,
            document_id: Some(document_id),
            action: self.action,
            data_summary: self.data_summary,
            timestamp,
            signature: self.signature,
        };
        pending.validate()?;
        Ok(pending)
    }
}

fn required(field: &str, value: Option<&str>) -> Result<()> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(()),
        _ => Err(CoreError::InvalidInput(format!("{field} is required"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::parse_timestamp;

    #[test]
    fn test_action_parse_and_operation_type() {
        for (text, action, op) in [
            ("export", Action::Export, "document_export"),
            ("SIGN", Action::Sign, "document_sign"),
            (" verify ", Action::Verify, "document_verify"),
            ("update", Action::Update, "document_update"),
            ("init", Action::Init, "system"),
        ] {
            let parsed: Action = text.parse().unwrap();
            assert_eq!(parsed, action);
            assert_eq!(parsed.operation_type(), op);
        }
        assert!(matches!(
            "delete".parse::<Action>(),
            Err(CoreError::UnknownAction(_))
        ));
    }

    #[test]
    fn test_builder_fills_derived_fields() {
        let tx = EventBuilder::new(Action::Export)
            .operator("user_123")
            .certificate("SHA1:AB:CD:EF:12:34")
            .document("DOC-2025-001")
            .summary("employment record export")
            .build()
            .unwrap();

        assert_eq!(tx.operation_type, "document_export");
        assert_eq!(tx.operator_id.as_deref(), Some("user_123"));
        assert!(tx.tx_id.as_str().starts_with("TX-"));
        assert_eq!(tx.signature, None);
    }

    #[test]
    fn test_builder_requires_document_and_operator() {
        let missing_doc = EventBuilder::new(Action::Sign).operator("op").build();
        assert!(matches!(
            missing_doc,
            Err(CoreError::InvalidInput(msg)) if msg.contains("document_id")
        ));

        let blank_operator = EventBuilder::new(Action::Sign)
            .operator("   ")
            .document("DOC-1")
            .build();
        assert!(matches!(
            blank_operator,
            Err(CoreError::InvalidInput(msg)) if msg.contains("operator_id")
        ));
    }

    #[test]
    fn test_builder_rejects_init() {
        let result = EventBuilder::new(Action::Init)
            .operator("op")
            .document("DOC-1")
            .build();
        assert!(matches!(result, Err(CoreError::InvalidInput(_))));
    }

    #[test]
    fn test_validate_rejects_hand_built_transactions() {
        let valid = EventBuilder::new(Action::Sign)
            .operator("op")
            .document("DOC-1")
            .build()
            .unwrap();
        assert!(valid.validate().is_ok());

        let mut anonymous = valid.clone();
        anonymous.operator_id = None;
        assert!(matches!(
            anonymous.validate(),
            Err(CoreError::InvalidInput(msg)) if msg.contains("operator_id")
        ));

        let mut blank_document = valid.clone();
        blank_document.document_id = Some(" ".into());
        assert!(matches!(
            blank_document.validate(),
            Err(CoreError::InvalidInput(msg)) if msg.contains("document_id")
        ));

        let mut init = valid.clone();
        init.action = Action::Init;
        init.operation_type = Action::Init.operation_type().to_string();
        assert!(matches!(
            init.validate(),
            Err(CoreError::InvalidInput(msg)) if msg.contains("init")
        ));

        let mut mislabelled = valid;
        mislabelled.operation_type = "document_export".into();
        assert!(matches!(
            mislabelled.validate(),
            Err(CoreError::InvalidInput(msg)) if msg.contains("operation_type")
        ));
    }

    #[test]
    fn test_genesis_passes_validation() {
        let at = parse_timestamp("2025-01-01T00:00:00Z").unwrap();
        let genesis = PendingTransaction::genesis(at).unwrap();
        assert!(genesis.validate().is_ok());
    }

    #[test]
    fn test_canonical_value_has_frozen_keys() {
        let tx = EventBuilder::new(Action::Verify)
            .operator("op")
            .document("DOC-1")
            .summary("checked")
            .tx_id("TX-1")
            .timestamp(parse_timestamp("2025-01-15T10:20:30Z").unwrap())
            .build()
            .unwrap();

        let value = tx.to_canonical_value();
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(
            keys,
            [
                "action",
                "certificate_thumbprint",
                "data_summary",
                "document_id",
                "operation_type",
                "operator_id",
                "signature",
                "timestamp",
                "tx_id",
            ]
        );
        assert_eq!(value["timestamp"], "2025-01-15T10:20:30.000000Z");
        assert!(value["signature"].is_null());
    }

    #[test]
    fn test_genesis_transaction() {
        let at = parse_timestamp("2025-01-01T00:00:00Z").unwrap();
        let genesis = PendingTransaction::genesis(at).unwrap();
        assert!(genesis.is_genesis());
        assert_eq!(genesis.operation_type, "system");
        assert_eq!(genesis.document_id, None);
        assert!(genesis.data_summary.contains("\"standard_version\": \"2.0.0\""));
    }

    #[test]
    fn test_commit_assigns_block_number() {
        let tx = EventBuilder::new(Action::Update)
            .operator("op")
            .document("DOC-9")
            .build()
            .unwrap();
        let committed = tx.clone().commit(7);
        assert_eq!(committed.block_number, 7);
        assert_eq!(committed.body, tx);
        assert_eq!(committed.document_id(), Some("DOC-9"));
    }
}
