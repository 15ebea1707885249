//! Oracle answer lattices
//!
//! `ModRef` is a two-bit lattice (Mod, Ref) with `NoModRef` at the bottom and
//! `ModRef` at the top. Independent answers for the same question are
//! combined with `&` (intersection): each module's answer is an upper bound,
//! so the intersection is the tightest sound one.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitAnd, BitOr};

/// How the first operand may affect the memory of the second
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ModRef {
    NoModRef = 0,
    Ref = 1,
    Mod = 2,
    ModRef = 3,
}

impl ModRef {
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => ModRef::NoModRef,
            1 => ModRef::Ref,
            2 => ModRef::Mod,
            _ => ModRef::ModRef,
        }
    }

    pub fn bits(self) -> u8 {
        self as u8
    }

    pub fn from_effects(reads: bool, writes: bool) -> Self {
        Self::from_bits(u8::from(reads) | (u8::from(writes) << 1))
    }

    pub fn is_mod(self) -> bool {
        self.bits() & 0b10 != 0
    }

    pub fn is_ref(self) -> bool {
        self.bits() & 0b01 != 0
    }

    /// Drop the Mod bit
    pub fn without_mod(self) -> Self {
        Self::from_bits(self.bits() & 0b01)
    }

    /// Drop the Ref bit
    pub fn without_ref(self) -> Self {
        Self::from_bits(self.bits() & 0b10)
    }

    /// Lattice order: `self` is at most as conservative as `other`
    pub fn le(self, other: ModRef) -> bool {
        self.bits() & other.bits() == self.bits()
    }
}

impl BitAnd for ModRef {
    type Output = ModRef;

    fn bitand(self, rhs: ModRef) -> ModRef {
        ModRef::from_bits(self.bits() & rhs.bits())
    }
}

impl BitOr for ModRef {
    type Output = ModRef;

    fn bitor(self, rhs: ModRef) -> ModRef {
        ModRef::from_bits(self.bits() | rhs.bits())
    }
}

impl fmt::Display for ModRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ModRef::NoModRef => "NoModRef",
            ModRef::Ref => "Ref",
            ModRef::Mod => "Mod",
            ModRef::ModRef => "ModRef",
        };
        f.write_str(s)
    }
}

/// Alias answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AliasResult {
    NoAlias,
    MayAlias,
    MustAlias,
}

impl AliasResult {
    /// Combine two sound answers. `MayAlias` is the top; a definite answer
    /// from either side wins, and `NoAlias` wins a (contradictory) tie.
    pub fn intersect(self, other: AliasResult) -> AliasResult {
        match (self, other) {
            (AliasResult::NoAlias, _) | (_, AliasResult::NoAlias) => AliasResult::NoAlias,
            (AliasResult::MustAlias, _) | (_, AliasResult::MustAlias) => AliasResult::MustAlias,
            _ => AliasResult::MayAlias,
        }
    }

    pub fn is_definite(self) -> bool {
        self != AliasResult::MayAlias
    }
}

/// Position of a module in the chain: higher runs first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SchedulingPreference(pub i32);

impl SchedulingPreference {
    pub const BOTTOM: Self = Self(1);
    pub const LOW: Self = Self(25);
    pub const NORMAL: Self = Self(50);
    pub const TOP: Self = Self(100);

    /// Below every other module
    pub const LAST: Self = Self(Self::BOTTOM.0 - 1);
}
