//! Operations of the host program
//!
//! An operation is an instruction-equivalent. Register operands point at the
//! defining operation; memory operands are `MemAccess` records naming a
//! pointer value and an access size.

use super::ids::{BlockId, FunctionId, ObjectId, OpId, PtrId};
use serde::{Deserialize, Serialize};

/// A sized memory access through a pointer value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemAccess {
    pub ptr: PtrId,
    pub size: u64,
}

impl MemAccess {
    pub fn new(ptr: PtrId, size: u64) -> Self {
        Self { ptr, size }
    }
}

/// Declared memory behaviour of an external (body-less) function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExternalEffect {
    #[serde(default)]
    pub reads: bool,
    #[serde(default)]
    pub writes: bool,
}

impl ExternalEffect {
    pub const NONE: Self = Self {
        reads: false,
        writes: false,
    };
    pub const READ_WRITE: Self = Self {
        reads: true,
        writes: true,
    };
}

/// Call target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Callee {
    /// Function with a body in this program
    Internal { function: FunctionId },
    /// Declaration only; its effect is taken on faith
    External {
        name: String,
        #[serde(default = "default_external_effect")]
        effect: ExternalEffect,
    },
    /// Unknown target
    Indirect,
}

fn default_external_effect() -> ExternalEffect {
    ExternalEffect::READ_WRITE
}

/// Operation kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum OpKind {
    /// Function parameter or other value defined outside any block body
    Argument,
    /// Pure register computation
    Compute,
    /// Join point; `incoming[i]` is the predecessor block of `operands[i]`
    Phi { incoming: Vec<BlockId> },
    Branch {
        #[serde(default)]
        conditional: bool,
    },
    Switch,
    Return,
    Load { access: MemAccess },
    Store { access: MemAccess },
    Call { callee: Callee },
    /// Allocation site of an abstract object
    Alloc { object: ObjectId },
}

/// One operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub id: OpId,
    pub block: BlockId,
    #[serde(flatten)]
    pub kind: OpKind,
    #[serde(default)]
    pub operands: Vec<OpId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Operation {
    pub fn new(id: OpId, block: BlockId, kind: OpKind) -> Self {
        Self {
            id,
            block,
            kind,
            operands: Vec::new(),
            name: None,
        }
    }

    pub fn with_operands(mut self, operands: Vec<OpId>) -> Self {
        self.operands = operands;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn is_phi(&self) -> bool {
        matches!(self.kind, OpKind::Phi { .. })
    }

    pub fn is_terminator(&self) -> bool {
        matches!(
            self.kind,
            OpKind::Branch { .. } | OpKind::Switch | OpKind::Return
        )
    }

    /// Branch or switch (the operations that may source control dependences)
    pub fn is_branch_like(&self) -> bool {
        matches!(self.kind, OpKind::Branch { .. } | OpKind::Switch)
    }

    pub fn is_call(&self) -> bool {
        matches!(self.kind, OpKind::Call { .. })
    }

    pub fn callee(&self) -> Option<&Callee> {
        match &self.kind {
            OpKind::Call { callee } => Some(callee),
            _ => None,
        }
    }

    /// The pointer access of a load or store
    pub fn direct_access(&self) -> Option<MemAccess> {
        match self.kind {
            OpKind::Load { access } | OpKind::Store { access } => Some(access),
            _ => None,
        }
    }

    /// Phi/branch/switch: the operations a replicated stage can carry for free
    pub fn is_lightweight(&self) -> bool {
        matches!(
            self.kind,
            OpKind::Phi { .. } | OpKind::Branch { .. } | OpKind::Switch
        )
    }

    /// Pure register computations: executing them when they should not run
    /// has no visible effect
    pub fn is_safe_to_speculate(&self) -> bool {
        matches!(
            self.kind,
            OpKind::Compute | OpKind::Phi { .. } | OpKind::Argument
        )
    }

    /// Incoming block of operand `index` for a phi
    pub fn phi_incoming_block(&self, index: usize) -> Option<BlockId> {
        match &self.kind {
            OpKind::Phi { incoming } => incoming.get(index).copied(),
            _ => None,
        }
    }

    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => format!("{}:{}", self.id, name),
            None => self.id.to_string(),
        }
    }
}
