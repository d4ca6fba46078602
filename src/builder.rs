// Copyright 2026 The ANGLE Project Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.
//
// Helpers to create and modify the IR:
//
// - `Builder` inserts instructions at a `Cursor` inside an existing block.  This is what
//   transformations use to splice new instructions into a function.
// - `FunctionBuilder` constructs the control-flow tree of a new function, one construct at a
//   time, automatically creating the blocks that must surround every if and loop.

use crate::ir::*;
use crate::*;

// Where in a block an instruction is inserted.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Cursor {
    // After the last instruction of the block.  The block must not end in a jump.
    AfterBlock,
    // Before the first instruction of the block that is not a phi.
    BeforeBlockAfterPhis,
    // Before the instruction at the given index.
    BeforeInstruction(usize),
}

impl Cursor {
    fn resolve(self, ir_meta: &IRMeta, block: &Block) -> usize {
        match self {
            Cursor::AfterBlock => {
                assert!(
                    !block.is_terminated(),
                    "Internal error: Cannot append instructions after a jump"
                );
                block.instructions.len()
            }
            Cursor::BeforeBlockAfterPhis => block.first_non_phi_index(ir_meta),
            Cursor::BeforeInstruction(index) => {
                assert!(index < block.instructions.len());
                index
            }
        }
    }
}

pub struct Builder<'a> {
    ir_meta: &'a mut IRMeta,
}

impl<'a> Builder<'a> {
    pub fn new(ir_meta: &'a mut IRMeta) -> Builder<'a> {
        Builder { ir_meta }
    }

    pub fn ir_meta(&self) -> &IRMeta {
        &*self.ir_meta
    }

    // Insert an instruction at the cursor.  Returns the cursor to use to place another
    // instruction right after the inserted one.
    pub fn insert(
        &mut self,
        block: &mut Block,
        cursor: Cursor,
        inst: instruction::Result,
    ) -> Cursor {
        let block_instruction = inst.into_block_instruction();
        debug_assert!(!block_instruction.is_jump());
        debug_assert!(
            !block_instruction.is_phi(self.ir_meta) || cursor == Cursor::BeforeBlockAfterPhis
        );

        let index = cursor.resolve(self.ir_meta, block);
        block.instructions.insert(index, block_instruction);

        match cursor {
            Cursor::AfterBlock => Cursor::AfterBlock,
            _ => Cursor::BeforeInstruction(index + 1),
        }
    }

    pub fn bar_set(&mut self, block: &mut Block, cursor: Cursor) -> RegisterId {
        let inst = instruction::bar_set(self.ir_meta);
        let token = inst.get_result_id().get_register();
        self.insert(block, cursor, inst);
        token
    }

    pub fn bar_sync(&mut self, block: &mut Block, cursor: Cursor, token: RegisterId) -> Cursor {
        self.insert(block, cursor, instruction::bar_sync(token))
    }

    pub fn bar_break(&mut self, block: &mut Block, cursor: Cursor, token: RegisterId) -> Cursor {
        self.insert(block, cursor, instruction::bar_break(token))
    }
}

#[derive(Debug)]
enum OpenConstruct {
    If { condition: Id, then_list: Option<CFList> },
    Loop { divergent: bool },
}

// A construct that is being built, along with the list it will be placed in once finished.
#[derive(Debug)]
struct IntermediateList {
    parent_list: CFList,
    construct: OpenConstruct,
}

// Helper to construct the control-flow tree of a function.
//
// `current_list` is the list that is being built, which always ends in a block where new
// instructions are appended.  When an if or loop begins, `current_list` is pushed on the
// `open_constructs` stack and a new list is started for the then-list or body.  When the
// construct ends, the list is popped, the finished construct is appended to it followed by a new
// block.  Once the function is complete, the stack should be empty.
//
// Once a block is terminated with break or continue, any new instructions that are encountered
// are dead code and are dropped.
pub struct FunctionBuilder<'ir> {
    ir_meta: &'ir mut IRMeta,
    name: String,
    current_list: CFList,
    open_constructs: Vec<IntermediateList>,
}

impl<'ir> FunctionBuilder<'ir> {
    pub fn new(ir_meta: &'ir mut IRMeta, name: &str) -> FunctionBuilder<'ir> {
        FunctionBuilder {
            ir_meta,
            name: name.to_string(),
            current_list: vec![CFNode::Block(Block::new())],
            open_constructs: Vec::new(),
        }
    }

    pub fn ir_meta(&mut self) -> &mut IRMeta {
        self.ir_meta
    }

    pub fn current_block(&self) -> &Block {
        self.current_list.last().unwrap().as_block()
    }
    fn current_block_mut(&mut self) -> &mut Block {
        self.current_list.last_mut().unwrap().as_block_mut()
    }

    fn is_in_loop(&self) -> bool {
        self.open_constructs
            .iter()
            .any(|open| matches!(open.construct, OpenConstruct::Loop { .. }))
    }

    // Append an instruction created by the `instruction` helpers to the current block.  Returns
    // the id of the result, if any.
    pub fn add_instruction(&mut self, inst: instruction::Result) -> Option<Id> {
        let id = match inst {
            instruction::Result::Void(_) => None,
            instruction::Result::Register(id) => Some(Id::new_register(id)),
        };
        let block = self.current_block_mut();
        if !block.is_terminated() {
            block.instructions.push(inst.into_block_instruction());
        }
        id
    }

    fn add_typed_instruction(&mut self, inst: instruction::Result) -> Id {
        self.add_instruction(inst).unwrap()
    }

    pub fn load(&mut self, variable: VariableId) -> Id {
        let inst = instruction::load(self.ir_meta, variable);
        self.add_typed_instruction(inst)
    }

    pub fn store(&mut self, variable: VariableId, value: Id) {
        self.add_instruction(instruction::store(variable, value));
    }

    // Phis must come before any other instruction of the block.
    pub fn phi(&mut self, values: Vec<Id>) -> Id {
        debug_assert!(self
            .current_block()
            .instructions
            .iter()
            .all(|instruction| instruction.is_phi(self.ir_meta)));
        let inst = instruction::phi(self.ir_meta, values);
        self.add_typed_instruction(inst)
    }

    pub fn subgroup_invocation_id(&mut self) -> Id {
        let inst = instruction::subgroup_invocation_id(self.ir_meta);
        self.add_typed_instruction(inst)
    }

    // Record the result of divergence analysis for a value.
    pub fn mark_divergent(&mut self, id: Id) {
        self.ir_meta.set_divergent(id.get_register(), true);
    }

    fn push_construct(&mut self, construct: OpenConstruct) {
        debug_assert!(
            !self.current_block().is_terminated(),
            "Internal error: control flow after a jump is dead code"
        );
        let parent_list =
            std::mem::replace(&mut self.current_list, vec![CFNode::Block(Block::new())]);
        self.open_constructs.push(IntermediateList { parent_list, construct });
    }

    fn pop_construct(&mut self, node: CFNode) {
        let open = self.open_constructs.pop().unwrap();
        let mut parent_list = open.parent_list;
        parent_list.push(node);
        parent_list.push(CFNode::Block(Block::new()));
        self.current_list = parent_list;
    }

    pub fn begin_if(&mut self, condition: Id) {
        self.push_construct(OpenConstruct::If { condition, then_list: None });
    }

    pub fn begin_else(&mut self) {
        let then_list =
            std::mem::replace(&mut self.current_list, vec![CFNode::Block(Block::new())]);
        match self.open_constructs.last_mut().map(|open| &mut open.construct) {
            Some(OpenConstruct::If { then_list: pending @ None, .. }) => {
                *pending = Some(then_list);
            }
            _ => panic!("Internal error: else without a matching if"),
        }
    }

    pub fn end_if(&mut self) {
        let list = std::mem::take(&mut self.current_list);
        let (condition, then_list, else_list) = match self.open_constructs.last_mut() {
            Some(IntermediateList {
                construct: OpenConstruct::If { condition, then_list }, ..
            }) => match then_list.take() {
                Some(then_list) => (*condition, then_list, list),
                None => (*condition, list, vec![CFNode::Block(Block::new())]),
            },
            _ => panic!("Internal error: end of if without a matching if"),
        };
        self.pop_construct(CFNode::If(IfNode { condition, then_list, else_list }));
    }

    pub fn begin_loop(&mut self, divergent: bool) {
        self.push_construct(OpenConstruct::Loop { divergent });
    }

    pub fn end_loop(&mut self) {
        let body = std::mem::take(&mut self.current_list);
        let divergent = match self.open_constructs.last() {
            Some(IntermediateList { construct: OpenConstruct::Loop { divergent }, .. }) => {
                *divergent
            }
            _ => panic!("Internal error: end of loop without a matching loop"),
        };
        self.pop_construct(CFNode::Loop(LoopNode { divergent, body }));
    }

    pub fn jump_break(&mut self) {
        assert!(self.is_in_loop(), "Internal error: break outside of a loop");
        self.add_instruction(instruction::branch_break());
    }

    pub fn jump_continue(&mut self) {
        assert!(self.is_in_loop(), "Internal error: continue outside of a loop");
        self.add_instruction(instruction::branch_continue());
    }

    pub fn finish(self) -> Function {
        assert!(self.open_constructs.is_empty(), "Internal error: unterminated control flow");
        let mut function = Function::new(&self.name, self.current_list);
        function.index_blocks();
        function
    }
}

// Build a function with the given closure and add it to the IR.
pub fn build_function<Build>(ir: &mut IR, name: &str, build: Build) -> FunctionId
where
    Build: FnOnce(&mut FunctionBuilder),
{
    let mut builder = FunctionBuilder::new(&mut ir.meta, name);
    build(&mut builder);
    let function = builder.finish();
    ir.add_function(function)
}
