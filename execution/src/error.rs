use thiserror::Error as ThisError;
use worldline_types::{
    address::Address,
    entity::{InstanceId, InventoryError, ItemId},
    FieldError, SchemaError,
};

/// Why an action was rejected.
///
/// Every variant is a deterministic function of the action and the prior snapshot, so two
/// executors always reject the same action with the same error.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum ActionError {
    #[error("address already in use: {0}")]
    AddressAlreadyInUse(Address),
    #[error("{kind} not found at {address}")]
    StateNotFound {
        kind: &'static str,
        address: Address,
    },
    #[error("not ready until block {unlock_block} (current {current_block})")]
    ScheduleNotReady {
        unlock_block: u64,
        current_block: u64,
    },
    #[error("insufficient {resource}: required {required}, available {available}")]
    InsufficientBalance {
        resource: String,
        required: u64,
        available: u64,
    },
    #[error("insufficient material {item_id}: required {required}, available {available}")]
    InsufficientMaterial {
        item_id: ItemId,
        required: u64,
        available: u64,
    },
    #[error("invalid schema version for {kind}: {version}")]
    InvalidSchemaVersion { kind: &'static str, version: u8 },
    #[error("invalid value for {field}: {reason}")]
    InvalidFieldValue { field: &'static str, reason: String },
    #[error("{signer} is not permitted to perform this action")]
    PermissionDenied { signer: Address },
    #[error("unknown action type {0:?}")]
    UnknownActionType(String),
    #[error("out of gas: limit {limit}, required {required}")]
    OutOfGas { limit: u64, required: u64 },
    #[error("stage {stage_id} is locked (last cleared {last_cleared})")]
    StageLocked { stage_id: u32, last_cleared: u32 },
    #[error("action points already full")]
    ActionPointFull,
    #[error("instance {0} already exists")]
    DuplicateInstance(InstanceId),
    #[error("malformed {kind}: {reason}")]
    Malformed { kind: &'static str, reason: String },
}

impl ActionError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidFieldValue {
            field,
            reason: reason.into(),
        }
    }

    pub fn not_found(kind: &'static str, address: Address) -> Self {
        Self::StateNotFound { kind, address }
    }
}

impl From<SchemaError> for ActionError {
    fn from(err: SchemaError) -> Self {
        match err {
            SchemaError::InvalidSchemaVersion { kind, version } => {
                Self::InvalidSchemaVersion { kind, version }
            }
            SchemaError::Malformed { kind, reason } => Self::Malformed { kind, reason },
        }
    }
}

impl From<FieldError> for ActionError {
    fn from(err: FieldError) -> Self {
        match err {
            FieldError::UnknownType(type_id) => Self::UnknownActionType(type_id),
            FieldError::Missing(field) => Self::invalid(field, "missing"),
            FieldError::OutOfRange(field) => Self::invalid(field, "out of range"),
            FieldError::Trailing(_) => Self::invalid("fields", err.to_string()),
            FieldError::Shape { field, .. } => Self::invalid(field, err.to_string()),
        }
    }
}

impl From<InventoryError> for ActionError {
    fn from(err: InventoryError) -> Self {
        match err {
            InventoryError::InsufficientMaterial {
                item_id,
                required,
                available,
            } => Self::InsufficientMaterial {
                item_id,
                required,
                available,
            },
            InventoryError::DuplicateInstance(id) => Self::DuplicateInstance(id),
            InventoryError::MissingInstance(id) => {
                Self::invalid("instance_id", format!("{id} not in inventory"))
            }
            InventoryError::Overflow(item_id) => {
                Self::invalid("count", format!("stack of {item_id} overflows"))
            }
            InventoryError::Full { item_id } => {
                Self::invalid("inventory", format!("no room for item {item_id}"))
            }
        }
    }
}
