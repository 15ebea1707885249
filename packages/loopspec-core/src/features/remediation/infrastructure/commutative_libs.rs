//! Commutative library calls
//!
//! Calls to allocators and random number generators may execute in any
//! order: a dependence between two calls of the same such function, or one
//! involving a call into such a function, is treated as absent. Across
//! iterations the same holds when the loop itself lives inside such a
//! function.

use crate::config::RemediatorKind;
use crate::features::pdg::DepKind;
use crate::features::remediation::domain::{Remedy, RemedyPayload};
use crate::features::remediation::ports::{RemediationContext, Remediator, RemedyResponse};
use crate::shared::constants::{commutative, remedy_costs};
use crate::shared::models::{Callee, FunctionId, OpId, Program};

#[derive(Debug, Default)]
pub struct CommutativeLibsRemediator;

/// Called function, by identity and name
#[derive(PartialEq, Eq)]
enum Target<'a> {
    Internal(FunctionId, &'a str),
    External(&'a str),
}

impl Target<'_> {
    fn name(&self) -> &str {
        match self {
            Target::Internal(_, name) | Target::External(name) => name,
        }
    }

    fn is_commutative(&self) -> bool {
        commutative::is_commutative_name(self.name())
    }
}

impl CommutativeLibsRemediator {
    fn called(program: &Program, op: OpId) -> Option<Target<'_>> {
        match program.op(op).callee()? {
            Callee::Internal { function } => Some(Target::Internal(
                *function,
                program.function(*function).name.as_str(),
            )),
            Callee::External { name, .. } => Some(Target::External(name.as_str())),
            Callee::Indirect => None,
        }
    }

    fn remedy(function: &str) -> RemedyResponse {
        RemedyResponse::removed(Remedy::new(
            RemediatorKind::CommutativeLibs,
            remedy_costs::COMMUTATIVE_LIBS,
            RemedyPayload::CommutativeLibs {
                function: function.to_string(),
            },
        ))
    }

    /// `call` invokes the function `other` executes in
    fn calls_into_commutative(program: &Program, call: OpId, other: OpId) -> Option<&str> {
        match Self::called(program, call)? {
            Target::Internal(f, name)
                if f == program.function_of_op(other) && commutative::is_commutative_name(name) =>
            {
                Some(name)
            }
            _ => None,
        }
    }
}

impl Remediator for CommutativeLibsRemediator {
    fn kind(&self) -> RemediatorKind {
        RemediatorKind::CommutativeLibs
    }

    fn memdep(
        &self,
        a: OpId,
        b: OpId,
        loop_carried: bool,
        _kind: DepKind,
        cx: &RemediationContext<'_>,
    ) -> RemedyResponse {
        let program = cx.program.program;
        let called_a = Self::called(program, a);
        let called_b = Self::called(program, b);

        // self-commutative: two calls of the same function
        if let (Some(ta), Some(tb)) = (&called_a, &called_b) {
            if ta == tb && ta.is_commutative() {
                return Self::remedy(ta.name());
            }
        }

        if loop_carried {
            let fa = program.function_of_op(a);
            let fb = program.function_of_op(b);
            if let Some(name) = Self::calls_into_commutative(program, a, b)
                .or_else(|| Self::calls_into_commutative(program, b, a))
            {
                return Self::remedy(name);
            }
            let enclosing = &program.function(fa).name;
            if fa == fb && commutative::is_commutative_name(enclosing) {
                return Self::remedy(enclosing);
            }
        }

        // allocator-like calls are assumed free of ordering constraints
        for target in [called_a, called_b].into_iter().flatten() {
            if target.is_commutative() {
                return Self::remedy(target.name());
            }
        }
        RemedyResponse::dependent()
    }
}
