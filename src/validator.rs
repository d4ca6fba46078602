// Copyright 2026 The ANGLE Project Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.
//
// A helper to validate the rules of IR.  This is useful particularly to be run after
// transformations, to ensure they generate valid IR.  The rules are:
//
//   - Every control-flow list is non-empty, starts and ends with a block, and blocks alternate
//     with ifs and loops, so that every if and loop has a block right before and after it.
//   - Phis are only found at the start of a block.
//   - Break and continue are the last instruction of the last block of their list, and are
//     inside a loop.
//   - Every id refers to an existing register, constant or variable.
//   - Every register is placed in at most one block position, and instructions that produce a
//     result are only placed through their register.
//   - The operand of BarSync and BarBreak is produced by BarSet.

#[macro_export]
macro_rules! validate_in_debug_build_only {
    ($arg:expr) => {
        #[cfg(debug_assertions)]
        $crate::validator::validate_or_panic($arg);
    };
}

use crate::ir::*;
use crate::*;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("{function}: empty control-flow list")]
    EmptyList { function: String },
    #[error("{function}: if or loop at position {position} is not surrounded by blocks")]
    MissingAnchorBlock { function: String, position: usize },
    #[error("{function}: b{block} directly follows another block")]
    AdjacentBlocks { function: String, block: u32 },
    #[error("{function}: phi r{register} follows a non-phi instruction in b{block}")]
    PhiAfterNonPhi { function: String, block: u32, register: u32 },
    #[error("{function}: jump in the middle of b{block}")]
    JumpNotAtEndOfBlock { function: String, block: u32 },
    #[error("{function}: b{block} ends in a jump but is not the last block of its list")]
    JumpNotAtEndOfList { function: String, block: u32 },
    #[error("{function}: {jump} outside of a loop in b{block}")]
    JumpOutsideLoop { function: String, block: u32, jump: &'static str },
    #[error("{function}: invalid register r{register}")]
    InvalidRegister { function: String, register: u32 },
    #[error("{function}: invalid constant c{constant}")]
    InvalidConstant { function: String, constant: u32 },
    #[error("{function}: invalid variable v{variable}")]
    InvalidVariable { function: String, variable: u32 },
    #[error("{function}: r{register} is placed in more than one block position")]
    DuplicateRegister { function: String, register: u32 },
    #[error("{function}: instruction with a result is placed without its register in b{block}")]
    UnregisteredResult { function: String, block: u32 },
    #[error("{function}: r{register} is used as a barrier token but is not produced by BarSet")]
    InvalidBarrierToken { function: String, register: u32 },
}

pub fn validate(ir: &IR) -> Result<(), ValidationError> {
    let mut validator = Validator::new(&ir.meta);

    traverser::visitor::for_each_function(
        &mut validator,
        &ir.functions,
        |validator, _, function| {
            validator.function_name = function.name.clone();
            validator.validate_list(&function.body);
        },
        |validator, node, location| {
            validator.validate_node(node, location);
            traverser::visitor::VISIT_SUB_LISTS
        },
        |_, _, _| {},
    );

    match validator.error {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

// Validate the IR and panic with a dump of the IR if it is invalid.
pub fn validate_or_panic(ir: &IR) {
    if let Err(error) = validate(ir) {
        log::error!("Internal error: Invalid IR! {error}");
        log::error!("{}", debug::dump_to_string(ir));
        panic!("Internal error: Invalid IR! {error}");
    }
}

struct Validator<'a> {
    ir_meta: &'a IRMeta,
    function_name: String,
    // Registers already found in a block, to catch instructions placed twice.
    seen_registers: HashSet<RegisterId>,
    // Only the first error is reported.
    error: Option<ValidationError>,
}

impl<'a> Validator<'a> {
    fn new(ir_meta: &'a IRMeta) -> Validator<'a> {
        Validator {
            ir_meta,
            function_name: String::new(),
            seen_registers: HashSet::new(),
            error: None,
        }
    }

    fn on_error(&mut self, error: ValidationError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    fn function(&self) -> String {
        self.function_name.clone()
    }

    fn validate_list(&mut self, list: &CFList) {
        if list.is_empty() {
            self.on_error(ValidationError::EmptyList { function: self.function() });
            return;
        }

        for (position, node) in list.iter().enumerate() {
            // Blocks are at even positions, ifs and loops at odd positions.
            let expect_block = position % 2 == 0;
            match node {
                CFNode::Block(block) if !expect_block => {
                    self.on_error(ValidationError::AdjacentBlocks {
                        function: self.function(),
                        block: block.index.id,
                    });
                }
                CFNode::If(_) | CFNode::Loop(_) if expect_block => {
                    self.on_error(ValidationError::MissingAnchorBlock {
                        function: self.function(),
                        position,
                    });
                }
                _ => {}
            }
        }

        match list.last() {
            Some(CFNode::Block(_)) => {}
            _ => self.on_error(ValidationError::MissingAnchorBlock {
                function: self.function(),
                position: list.len() - 1,
            }),
        }

        // Only the last block may end in a jump.
        for node in &list[..list.len() - 1] {
            if let CFNode::Block(block) = node {
                if block.is_terminated() {
                    self.on_error(ValidationError::JumpNotAtEndOfList {
                        function: self.function(),
                        block: block.index.id,
                    });
                }
            }
        }
    }

    fn validate_node(&mut self, node: &CFNode, location: traverser::visitor::NodeLocation) {
        match node {
            CFNode::Block(block) => self.validate_block(block, location),
            CFNode::If(if_node) => {
                self.validate_id(if_node.condition);
                self.validate_list(&if_node.then_list);
                self.validate_list(&if_node.else_list);
            }
            CFNode::Loop(loop_node) => self.validate_list(&loop_node.body),
        }
    }

    fn validate_block(&mut self, block: &Block, location: traverser::visitor::NodeLocation) {
        let ir_meta = self.ir_meta;
        let block_index = block.index.id;
        let mut seen_non_phi = false;

        for (index, instruction) in block.instructions.iter().enumerate() {
            let op = match instruction {
                BlockInstruction::Void(op) => {
                    if op.has_result() {
                        self.on_error(ValidationError::UnregisteredResult {
                            function: self.function(),
                            block: block_index,
                        });
                    }
                    op
                }
                &BlockInstruction::Register(id) => {
                    if id.id >= ir_meta.total_register_count() {
                        self.on_error(ValidationError::InvalidRegister {
                            function: self.function(),
                            register: id.id,
                        });
                        continue;
                    }
                    if !self.seen_registers.insert(id) {
                        self.on_error(ValidationError::DuplicateRegister {
                            function: self.function(),
                            register: id.id,
                        });
                    }
                    let op = &ir_meta.get_instruction(id).op;
                    if op.is_phi() && seen_non_phi {
                        self.on_error(ValidationError::PhiAfterNonPhi {
                            function: self.function(),
                            block: block_index,
                            register: id.id,
                        });
                    }
                    op
                }
            };

            seen_non_phi = seen_non_phi || !op.is_phi();
            self.validate_op(op);

            if op.is_jump() {
                if index + 1 != block.instructions.len() {
                    self.on_error(ValidationError::JumpNotAtEndOfBlock {
                        function: self.function(),
                        block: block_index,
                    });
                }
                if location.loop_depth == 0 {
                    self.on_error(ValidationError::JumpOutsideLoop {
                        function: self.function(),
                        block: block_index,
                        jump: if matches!(op, OpCode::Break) { "break" } else { "continue" },
                    });
                }
            }
        }
    }

    fn validate_op(&mut self, op: &OpCode) {
        match op {
            OpCode::SubgroupInvocationId | OpCode::BarSet | OpCode::Break | OpCode::Continue => {}
            OpCode::Phi(values) => {
                for &value in values {
                    self.validate_id(value);
                }
            }
            &OpCode::Load(variable) => self.validate_id(Id::new_variable(variable)),
            &OpCode::Store(variable, value) => {
                self.validate_id(Id::new_variable(variable));
                self.validate_id(value);
            }
            &OpCode::BarSync(token) | &OpCode::BarBreak(token) => {
                self.validate_barrier_token(token)
            }
        }
    }

    fn validate_id(&mut self, id: Id) {
        match id {
            Id::Register(register_id) => {
                if register_id.id >= self.ir_meta.total_register_count() {
                    self.on_error(ValidationError::InvalidRegister {
                        function: self.function(),
                        register: register_id.id,
                    });
                }
            }
            Id::Constant(constant_id) => {
                if constant_id.id as usize >= self.ir_meta.all_constants().len() {
                    self.on_error(ValidationError::InvalidConstant {
                        function: self.function(),
                        constant: constant_id.id,
                    });
                }
            }
            Id::Variable(variable_id) => {
                if variable_id.id as usize >= self.ir_meta.all_variables().len() {
                    self.on_error(ValidationError::InvalidVariable {
                        function: self.function(),
                        variable: variable_id.id,
                    });
                }
            }
        }
    }

    fn validate_barrier_token(&mut self, token: RegisterId) {
        if token.id >= self.ir_meta.total_register_count() {
            self.on_error(ValidationError::InvalidRegister {
                function: self.function(),
                register: token.id,
            });
        } else if !matches!(self.ir_meta.get_instruction(token).op, OpCode::BarSet) {
            self.on_error(ValidationError::InvalidBarrierToken {
                function: self.function(),
                register: token.id,
            });
        }
    }
}
