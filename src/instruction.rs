// Copyright 2026 The ANGLE Project Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.
//
// Helper functions to create instructions given parameters.  Instructions with a result are
// registered in `IRMeta` right away; the caller decides where the result is placed.

use crate::ir::*;

// The result of creating an instruction.  Either an instruction without a result that should be
// placed in a block as is, or a register whose instruction has been registered in `IRMeta`.
#[derive(Debug)]
pub enum Result {
    Void(OpCode),
    Register(RegisterId),
}

impl Result {
    pub fn get_result_id(&self) -> Id {
        match self {
            &Result::Register(id) => Id::new_register(id),
            Result::Void(_) => panic!("Internal error: Expected instruction with a value"),
        }
    }

    pub fn into_block_instruction(self) -> BlockInstruction {
        match self {
            Result::Void(op) => BlockInstruction::new_void(op),
            Result::Register(id) => BlockInstruction::new_typed(id),
        }
    }
}

fn register(ir_meta: &mut IRMeta, op: OpCode) -> Result {
    Result::Register(ir_meta.new_register(op))
}

pub fn phi(ir_meta: &mut IRMeta, values: Vec<Id>) -> Result {
    debug_assert!(values.len() >= 2);
    register(ir_meta, OpCode::Phi(values))
}

pub fn load(ir_meta: &mut IRMeta, variable: VariableId) -> Result {
    register(ir_meta, OpCode::Load(variable))
}

pub fn store(variable: VariableId, value: Id) -> Result {
    Result::Void(OpCode::Store(variable, value))
}

pub fn subgroup_invocation_id(ir_meta: &mut IRMeta) -> Result {
    register(ir_meta, OpCode::SubgroupInvocationId)
}

// The barrier token never differs between threads, so it is not divergent.
pub fn bar_set(ir_meta: &mut IRMeta) -> Result {
    register(ir_meta, OpCode::BarSet)
}

pub fn bar_sync(token: RegisterId) -> Result {
    Result::Void(OpCode::BarSync(token))
}

pub fn bar_break(token: RegisterId) -> Result {
    Result::Void(OpCode::BarBreak(token))
}

pub fn branch_break() -> Result {
    Result::Void(OpCode::Break)
}

pub fn branch_continue() -> Result {
    Result::Void(OpCode::Continue)
}
