//! Pointer-residue oracle
//!
//! The profiler records, per pointer, which addresses modulo 16 it took. Two
//! accesses whose widened residue sets never intersect cannot overlap as
//! long as the residues hold.

use crate::features::dependence_oracle::domain::{
    AliasQuery, AliasResult, ModRef, ModRefQuery, ModuleAnswer,
};
use crate::features::dependence_oracle::infrastructure::target_access;
use crate::features::dependence_oracle::ports::{OracleModule, QueryContext};
use crate::shared::constants::oracle_costs;
use crate::shared::models::{ExecutionProfile, MemAccess};

const FULL: u16 = 0xffff;

/// Spread a residue set over the bytes of an access
fn widen(residues: u16, size: u64) -> u16 {
    let mut accum = 0u16;
    for _ in 0..size.min(16) {
        if accum == FULL {
            break;
        }
        accum = residues | accum.rotate_left(1);
    }
    accum
}

#[derive(Debug, Default)]
pub struct PointerResidueModule;

impl PointerResidueModule {
    /// `true` when the residues prove the two footprints disjoint
    pub fn disjoint(profile: &ExecutionProfile, a: MemAccess, b: MemAccess) -> bool {
        if a.ptr == b.ptr {
            return false;
        }
        let informative = |r: u16| r != 0 && r != FULL;
        match (profile.residue(a.ptr), profile.residue(b.ptr)) {
            (Some(ra), Some(rb)) if informative(ra) && informative(rb) => {
                widen(ra, a.size) & widen(rb, b.size) == 0
            }
            _ => false,
        }
    }
}

impl OracleModule for PointerResidueModule {
    fn name(&self) -> &'static str {
        "pointer_residue"
    }

    fn modref(&self, query: &ModRefQuery, cx: &QueryContext<'_>) -> ModuleAnswer<ModRef> {
        let program = cx.program.program;
        if query.loop_id.is_none() {
            return ModuleAnswer::certain(ModRef::ModRef);
        }
        let (Some(a), Some(b)) = (
            program.op(query.op).direct_access(),
            target_access(program, query.target),
        ) else {
            return ModuleAnswer::certain(ModRef::ModRef);
        };
        if Self::disjoint(cx.program.profile, a, b) {
            ModuleAnswer::speculative(ModRef::NoModRef, oracle_costs::POINTER_RESIDUE)
        } else {
            ModuleAnswer::certain(ModRef::ModRef)
        }
    }

    fn alias(&self, query: &AliasQuery, cx: &QueryContext<'_>) -> ModuleAnswer<AliasResult> {
        if query.loop_id.is_some() && Self::disjoint(cx.program.profile, query.a, query.b) {
            ModuleAnswer::speculative(AliasResult::NoAlias, oracle_costs::POINTER_RESIDUE)
        } else {
            ModuleAnswer::certain(AliasResult::MayAlias)
        }
    }
}
