// Copyright 2026 The ANGLE Project Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.
//
// Debug utilities.  Notably, the IR can be dumped for inspection.

use crate::ir::*;
use crate::*;

fn register_id_str(id: RegisterId) -> String {
    format!("r{}", id.id)
}

fn constant_id_str(id: ConstantId) -> String {
    format!("c{}", id.id)
}

fn variable_id_str(id: VariableId) -> String {
    format!("v{}", id.id)
}

fn function_id_str(id: FunctionId) -> String {
    format!("f{}", id.id)
}

fn id_str(id: Id) -> String {
    match id {
        Id::Register(rid) => register_id_str(rid),
        Id::Constant(cid) => constant_id_str(cid),
        Id::Variable(vid) => variable_id_str(vid),
    }
}

fn id_list_str(ids: &[Id]) -> String {
    ids.iter().map(|&id| id_str(id)).collect::<Vec<_>>().join(", ")
}

fn opcode_str(op: &OpCode) -> String {
    match op {
        OpCode::Phi(values) => format!("Phi ({})", id_list_str(values)),
        &OpCode::Load(variable) => format!("Load {}", variable_id_str(variable)),
        &OpCode::Store(variable, value) => {
            format!("Store {} {}", variable_id_str(variable), id_str(value))
        }
        OpCode::SubgroupInvocationId => "SubgroupInvocationId".to_string(),
        OpCode::BarSet => "BarSet".to_string(),
        &OpCode::BarSync(token) => format!("BarSync {}", register_id_str(token)),
        &OpCode::BarBreak(token) => format!("BarBreak {}", register_id_str(token)),
        OpCode::Break => "Break".to_string(),
        OpCode::Continue => "Continue".to_string(),
    }
}

fn divergent_str(divergent: bool) -> &'static str {
    if divergent {
        " [divergent]"
    } else {
        ""
    }
}

fn list_kind_str(kind: traverser::ListKind) -> &'static str {
    match kind {
        traverser::ListKind::Function => "",
        traverser::ListKind::Then => "Then:",
        traverser::ListKind::Else => "Else:",
        traverser::ListKind::LoopBody => "Body:",
    }
}

fn append_on_new_line(result: &mut String, new: String, indent: usize) {
    if new.is_empty() {
        return;
    }
    result.push('\n');
    result.push_str(&"  ".repeat(indent));
    result.push_str(&new);
}

fn dump_instruction(
    result: &mut String,
    ir_meta: &IRMeta,
    instruction: &BlockInstruction,
    indent: usize,
) {
    let formatted = match instruction {
        &BlockInstruction::Register(id) => {
            let instruction = ir_meta.get_instruction(id);
            debug_assert!(id == instruction.result);
            format!(
                "{} = {}{}",
                register_id_str(id),
                opcode_str(&instruction.op),
                divergent_str(instruction.divergent)
            )
        }
        BlockInstruction::Void(op) => opcode_str(op),
    };
    append_on_new_line(result, formatted, indent);
}

fn dump_node(
    result: &mut String,
    ir_meta: &IRMeta,
    node: &CFNode,
    location: traverser::visitor::NodeLocation,
    base_indent: usize,
) {
    let indent = base_indent + location.depth;
    if location.is_first_in_list() {
        append_on_new_line(result, list_kind_str(location.list_kind).to_string(), indent - 1);
    }

    match node {
        CFNode::Block(block) => {
            append_on_new_line(result, format!("Block b{}:", block.index.id), indent);
            for instruction in &block.instructions {
                dump_instruction(result, ir_meta, instruction, indent + 1);
            }
        }
        CFNode::If(if_node) => {
            let formatted = format!(
                "If {}{}",
                id_str(if_node.condition),
                divergent_str(ir_meta.is_divergent(if_node.condition))
            );
            append_on_new_line(result, formatted, indent);
        }
        CFNode::Loop(loop_node) => {
            let formatted = format!("Loop{}", divergent_str(loop_node.divergent));
            append_on_new_line(result, formatted, indent);
        }
    }
}

fn dump_function(
    result: &mut String,
    ir_meta: &IRMeta,
    id: FunctionId,
    function: &Function,
    base_indent: usize,
) {
    append_on_new_line(
        result,
        format!("Function {}: {}", function_id_str(id), function.name),
        base_indent - 1,
    );
    traverser::visitor::visit_list(
        result,
        &function.body,
        traverser::ListKind::Function,
        &|result: &mut String, node: &CFNode, location| {
            dump_node(result, ir_meta, node, location, base_indent);
            traverser::visitor::VISIT_SUB_LISTS
        },
        0,
        0,
    );
}

fn dump_constants(ir_meta: &IRMeta, result: &mut String) {
    result.push_str("Constants:");
    ir_meta.all_constants().iter().enumerate().for_each(|(id, c)| {
        let value = match c {
            &ConstantValue::Float(f) => format!("{f:?}"),
            &ConstantValue::Int(i) => i.to_string(),
            &ConstantValue::Uint(u) => format!("{u}u"),
            &ConstantValue::Bool(b) => b.to_string(),
        };
        append_on_new_line(result, format!("c{id}: {value}"), 1);
    });
}

fn dump_variables(ir_meta: &IRMeta, result: &mut String) {
    result.push_str("\n\nVariables:");
    ir_meta.all_variables().iter().enumerate().for_each(|(id, v)| {
        append_on_new_line(result, format!("v{id}: {}", v.name), 1);
    });
}

fn dump_functions(ir: &IR, result: &mut String) {
    write!(result, "\n\nFunctions ({}):", ir.functions.len()).unwrap();
    ir.functions.iter().enumerate().for_each(|(id, function)| {
        result.push('\n');
        dump_function(result, &ir.meta, FunctionId { id: id as u32 }, function, 2);
    });
}

// Textual form of a single function.  Blocks are printed with their index, so the result is only
// stable while the block index is valid.
pub fn dump_function_to_string(ir_meta: &IRMeta, id: FunctionId, function: &Function) -> String {
    let mut result = String::new();
    dump_function(&mut result, ir_meta, id, function, 1);
    result
}

pub fn dump_to_string(ir: &IR) -> String {
    let mut result = String::new();
    dump_constants(&ir.meta, &mut result);
    dump_variables(&ir.meta, &mut result);
    dump_functions(ir, &mut result);
    result
}

// Dump the IR for debug purposes.
pub fn dump(ir: &IR) {
    if log::log_enabled!(log::Level::Trace) {
        log::trace!("{}", dump_to_string(ir));
    }
}
