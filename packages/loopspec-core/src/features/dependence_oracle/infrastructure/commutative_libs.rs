//! Commutative library calls
//!
//! Two invocations of the same allow-listed library function (allocators,
//! random number generators) may be reordered freely, so their mutual
//! dependences are not real ordering constraints.

use crate::features::dependence_oracle::domain::{
    ModRef, ModRefQuery, ModuleAnswer,
};
use crate::features::dependence_oracle::ports::{OracleModule, QueryContext};
use crate::shared::constants::{commutative, oracle_costs};
use crate::shared::models::{Callee, OpId, Program};

#[derive(Debug, Default)]
pub struct CommutativeLibsModule;

impl CommutativeLibsModule {
    fn commutative_callee(program: &Program, op: OpId) -> Option<&str> {
        match program.op(op).callee()? {
            Callee::External { name, .. } if commutative::is_commutative_name(name) => {
                Some(name.as_str())
            }
            _ => None,
        }
    }

    /// Both operations call the same commutative function
    pub fn commute(program: &Program, a: OpId, b: OpId) -> bool {
        match (
            Self::commutative_callee(program, a),
            Self::commutative_callee(program, b),
        ) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        }
    }
}

impl OracleModule for CommutativeLibsModule {
    fn name(&self) -> &'static str {
        "commutative_libs"
    }

    fn modref(&self, query: &ModRefQuery, cx: &QueryContext<'_>) -> ModuleAnswer<ModRef> {
        match query.target_op() {
            Some(target) if Self::commute(cx.program.program, query.op, target) => {
                ModuleAnswer::speculative(ModRef::NoModRef, oracle_costs::COMMUTATIVE_LIBS)
            }
            _ => ModuleAnswer::certain(ModRef::ModRef),
        }
    }
}
