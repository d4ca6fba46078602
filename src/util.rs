// Copyright 2026 The ANGLE Project Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.
//
// Utilities shared by transformations and their users.

use crate::ir::*;
use crate::*;

// Number of barrier instructions found in the IR.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct BarrierSummary {
    pub sets: u32,
    pub syncs: u32,
    pub breaks: u32,
}

impl BarrierSummary {
    fn count(ir_meta: &IRMeta, functions: &[Function]) -> BarrierSummary {
        let mut summary = BarrierSummary::default();
        traverser::visitor::for_each_instruction(&mut summary, functions, &|summary, instruction| {
            match instruction.get_op_and_result(ir_meta).0 {
                OpCode::BarSet => summary.sets += 1,
                OpCode::BarSync(_) => summary.syncs += 1,
                OpCode::BarBreak(_) => summary.breaks += 1,
                _ => {}
            }
        });
        summary
    }

    pub fn of_ir(ir: &IR) -> BarrierSummary {
        Self::count(&ir.meta, &ir.functions)
    }

    pub fn of_function(ir_meta: &IRMeta, function: &Function) -> BarrierSummary {
        Self::count(ir_meta, std::slice::from_ref(function))
    }

    pub fn is_empty(&self) -> bool {
        self.sets == 0 && self.syncs == 0 && self.breaks == 0
    }
}
