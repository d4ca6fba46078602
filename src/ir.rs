// Copyright 2026 The ANGLE Project Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.
//
// The IR itself, consisting of a number of enums and structs.  Functions are made of a
// structured control-flow tree: a list of nodes that are either a basic block, an if/else or
// a loop, the latter two containing nested lists of their own.

use crate::*;

// Strong types for ids that refer to constants, registers, variables etc.  They are used to look
// information up in different tables.
#[derive(Eq, PartialEq, Hash, Copy, Clone, Debug)]
pub struct RegisterId {
    pub id: u32,
}

#[derive(Eq, PartialEq, Hash, Copy, Clone, Debug)]
pub struct ConstantId {
    pub id: u32,
}

#[derive(Eq, PartialEq, Hash, Copy, Clone, Debug)]
pub struct VariableId {
    pub id: u32,
}

#[derive(Eq, PartialEq, Hash, Copy, Clone, Debug)]
pub struct FunctionId {
    pub id: u32,
}

// The index of a block in program order within its function.  Only meaningful while
// `Metadata::BLOCK_INDEX` is valid for the function.
#[derive(Eq, PartialEq, Hash, Copy, Clone, Debug, Default)]
pub struct BlockId {
    pub id: u32,
}

// An ID that can be referred to by an operand of an instruction.
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum Id {
    Register(RegisterId),
    Constant(ConstantId),
    Variable(VariableId),
}

impl Id {
    pub fn new_register(id: RegisterId) -> Id {
        Id::Register(id)
    }
    pub fn new_constant(id: ConstantId) -> Id {
        Id::Constant(id)
    }
    pub fn new_variable(id: VariableId) -> Id {
        Id::Variable(id)
    }

    pub fn get_register(&self) -> RegisterId {
        match self {
            &Id::Register(id) => id,
            _ => {
                panic!("Internal error: unexpected non-register id");
            }
        }
    }
}

// The opcode of an instruction together with its possible operands.  The `result`, if applicable,
// is always specified in the `Instruction` struct.
#[derive(Clone, Debug)]
pub enum OpCode {
    // Merge values flowing in from the predecessors of the block.  Phis must be the first
    // instructions of their block; nothing may be placed before them.
    //   %result = Phi %values...
    Phi(Vec<Id>),

    // Load from a variable.
    //   %result = Load %variable
    Load(VariableId),
    // Store to a variable.
    //   Store %variable %value
    Store(VariableId, Id),

    // The index of the invocation within its warp.  Always different between threads.
    //   %result = SubgroupInvocationId
    SubgroupInvocationId,

    // Open a reconvergence point.  The result is the barrier token passed to the other barrier
    // ops.
    //   %token = BarSet
    BarSet,
    // Block until every thread that participated in `BarSet` of the token arrives here.
    //   BarSync %token
    BarSync(RegisterId),
    // Remove the current thread from the token's participants, used when leaving the region of
    // the barrier through a jump.
    //   BarBreak %token
    BarBreak(RegisterId),

    // Break out of the innermost loop.
    //   Break
    Break,
    // Continue the innermost loop.
    //   Continue
    Continue,
}

impl OpCode {
    pub fn is_jump(&self) -> bool {
        matches!(*self, OpCode::Break | OpCode::Continue)
    }

    pub fn is_phi(&self) -> bool {
        matches!(self, OpCode::Phi(_))
    }

    // Whether the instruction produces a register.
    pub fn has_result(&self) -> bool {
        matches!(
            self,
            OpCode::Phi(_)
                | OpCode::Load(_)
                | OpCode::SubgroupInvocationId
                | OpCode::BarSet
        )
    }

    pub fn get_barrier_token(&self) -> Option<RegisterId> {
        match self {
            &OpCode::BarSync(token) | &OpCode::BarBreak(token) => Some(token),
            _ => None,
        }
    }
}

// Representation of an IR instruction that produces a result.  For example:
//
//     %result = Operation %operand1 ...
//
// As with the rest of the ANGLE IR, instructions with a result are stored in
// `IRMeta::instructions` indexed by their result register, and blocks only reference them.  The
// instructions without a result are directly stored in the blocks.
#[derive(Debug)]
pub struct Instruction {
    pub op: OpCode,
    pub result: RegisterId,
    // Set by divergence analysis: whether the value may differ between the threads of a warp.
    pub divergent: bool,
}

impl Instruction {
    pub fn new(op: OpCode, result: RegisterId) -> Instruction {
        Instruction { op, result, divergent: false }
    }
}

// The entities in a block of the IR.  They are either directly the opcodes themselves (if they
// don't have a result), or an indirect reference to `IRMeta::instructions` by the ID of the result
// they produce.
#[derive(Debug)]
pub enum BlockInstruction {
    Void(OpCode),
    Register(RegisterId),
}

impl BlockInstruction {
    pub fn new_void(op: OpCode) -> BlockInstruction {
        debug_assert!(!op.has_result());
        BlockInstruction::Void(op)
    }

    pub fn new_typed(id: RegisterId) -> BlockInstruction {
        BlockInstruction::Register(id)
    }

    pub fn is_jump(&self) -> bool {
        match self {
            BlockInstruction::Void(op) => op.is_jump(),
            _ => false,
        }
    }

    // Convenience function to get the OpCode of the instruction no matter if Void or Register.
    // The result (if available) is simultaneously returned.
    pub fn get_op_and_result<'block, 'ir: 'block>(
        &'block self,
        ir_meta: &'ir IRMeta,
    ) -> (&'block OpCode, Option<RegisterId>) {
        match self {
            BlockInstruction::Void(op) => (op, None),
            &BlockInstruction::Register(id) => (&ir_meta.get_instruction(id).op, Some(id)),
        }
    }

    pub fn is_phi(&self, ir_meta: &IRMeta) -> bool {
        self.get_op_and_result(ir_meta).0.is_phi()
    }
}

// A basic block: a linear sequence of instructions with no branching inside it.  The only
// control flow a block may end with is a `Break` or `Continue`; other control flow is expressed
// by the structure of the `CFNode` lists.
#[derive(Debug, Default)]
pub struct Block {
    pub index: BlockId,
    pub instructions: Vec<BlockInstruction>,
}

impl Block {
    pub fn new() -> Block {
        Block { index: BlockId::default(), instructions: Vec::with_capacity(8) }
    }

    pub fn add_void_instruction(&mut self, op: OpCode) {
        debug_assert!(!self.is_terminated());
        self.instructions.push(BlockInstruction::new_void(op));
    }
    pub fn add_register_instruction(&mut self, id: RegisterId) {
        debug_assert!(!self.is_terminated());
        self.instructions.push(BlockInstruction::new_typed(id));
    }

    // Whether the block ends in a jump.  Nothing can be appended to such a block.
    pub fn is_terminated(&self) -> bool {
        self.instructions.last().map(|instruction| instruction.is_jump()).unwrap_or(false)
    }

    // The jump at the end of the block, if any.
    pub fn get_jump(&self) -> Option<&OpCode> {
        match self.instructions.last() {
            Some(BlockInstruction::Void(op)) if op.is_jump() => Some(op),
            _ => None,
        }
    }

    // The index of the first instruction that is not a phi.  Equal to the number of
    // instructions if the block only contains phis.
    pub fn first_non_phi_index(&self, ir_meta: &IRMeta) -> usize {
        self.instructions
            .iter()
            .position(|instruction| !instruction.is_phi(ir_meta))
            .unwrap_or(self.instructions.len())
    }
}

#[derive(Debug)]
pub struct IfNode {
    pub condition: Id,
    pub then_list: CFList,
    pub else_list: CFList,
}

#[derive(Debug)]
pub struct LoopNode {
    // Set by divergence analysis: whether threads may leave the loop at different iterations.
    pub divergent: bool,
    pub body: CFList,
}

// A node of the structured control-flow tree.  In every list, `If` and `Loop` nodes are always
// surrounded by blocks, and every list starts and ends with a block.
#[derive(Debug)]
pub enum CFNode {
    Block(Block),
    If(IfNode),
    Loop(LoopNode),
}

impl CFNode {
    pub fn is_block(&self) -> bool {
        matches!(self, CFNode::Block(_))
    }

    pub fn as_block(&self) -> &Block {
        match self {
            CFNode::Block(block) => block,
            _ => panic!("Internal error: Expected block"),
        }
    }
    pub fn as_block_mut(&mut self) -> &mut Block {
        match self {
            CFNode::Block(block) => block,
            _ => panic!("Internal error: Expected block"),
        }
    }
}

pub type CFList = Vec<CFNode>;

bitflags::bitflags! {
    // Analyses that may be cached on a function.  A transformation reports which of them are
    // still valid after it has run.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct Metadata: u8 {
        const BLOCK_INDEX = 0x1;
        const DOMINANCE = 0x2;
        const LOOP_ANALYSIS = 0x4;
        const LIVE_DEFS = 0x8;
        const DIVERGENCE = 0x10;
    }
}

#[derive(Debug)]
pub struct Function {
    pub name: String,
    pub body: CFList,
    valid_metadata: Metadata,
}

impl Function {
    pub fn new(name: &str, body: CFList) -> Function {
        Function { name: name.to_string(), body, valid_metadata: Metadata::empty() }
    }

    pub fn get_valid_metadata(&self) -> Metadata {
        self.valid_metadata
    }

    pub fn is_metadata_valid(&self, metadata: Metadata) -> bool {
        self.valid_metadata.contains(metadata)
    }

    // Called by analyses once they have produced their results.
    pub fn mark_metadata_valid(&mut self, metadata: Metadata) {
        self.valid_metadata |= metadata;
    }

    // Called by transformations once they are done: anything not in `preserved` is invalidated.
    pub fn preserve_metadata(&mut self, preserved: Metadata) {
        self.valid_metadata &= preserved;
    }

    // Make sure the requested metadata is valid.  Only the block index is computed here, the
    // rest belongs to analyses outside of this crate.
    pub fn require_metadata(&mut self, metadata: Metadata) {
        let needs_block_index = metadata.contains(Metadata::BLOCK_INDEX);
        if needs_block_index && !self.is_metadata_valid(Metadata::BLOCK_INDEX) {
            self.index_blocks();
        }
        debug_assert!(
            self.is_metadata_valid(metadata),
            "Internal error: metadata {:?} requested but not computed",
            metadata.difference(self.valid_metadata)
        );
    }

    // Number the blocks in program order.
    pub fn index_blocks(&mut self) {
        fn index_list(list: &mut CFList, next_index: &mut u32) {
            for node in list.iter_mut() {
                match node {
                    CFNode::Block(block) => {
                        block.index = BlockId { id: *next_index };
                        *next_index += 1;
                    }
                    CFNode::If(if_node) => {
                        index_list(&mut if_node.then_list, next_index);
                        index_list(&mut if_node.else_list, next_index);
                    }
                    CFNode::Loop(loop_node) => index_list(&mut loop_node.body, next_index),
                }
            }
        }

        let mut next_index = 0;
        index_list(&mut self.body, &mut next_index);
        self.valid_metadata |= Metadata::BLOCK_INDEX;
    }
}

#[derive(Copy, Clone, Debug)]
pub enum ConstantValue {
    Float(f32),
    Int(i32),
    Uint(u32),
    Bool(bool),
}

#[derive(Debug)]
pub struct Variable {
    pub name: String,
}

#[derive(Debug, Default)]
pub struct IRMeta {
    constants: Vec<ConstantValue>,
    variables: Vec<Variable>,

    // List of instructions indexed by register ID.  Stored in a global array, this allows
    // easy look up of instructions that calculate an id, such as the parameter of another
    // instruction.
    instructions: Vec<Instruction>,

    // Maps to look up the id of existing constants to avoid duplicates.  Note that float
    // constants are hashed by their bit pattern as integers because Rust does not implement Eq
    // and Hash for f32.
    float_constant_map: HashMap<u32, ConstantId>,
    int_constant_map: HashMap<i32, ConstantId>,
    uint_constant_map: HashMap<u32, ConstantId>,
    bool_constant_map: HashMap<bool, ConstantId>,
}

impl IRMeta {
    pub fn new() -> IRMeta {
        IRMeta::default()
    }

    fn add_constant(&mut self, value: ConstantValue) -> ConstantId {
        let id = ConstantId { id: self.constants.len() as u32 };
        self.constants.push(value);
        id
    }

    pub fn get_constant_float(&mut self, value: f32) -> ConstantId {
        if let Some(&id) = self.float_constant_map.get(&value.to_bits()) {
            return id;
        }
        let id = self.add_constant(ConstantValue::Float(value));
        self.float_constant_map.insert(value.to_bits(), id);
        id
    }
    pub fn get_constant_int(&mut self, value: i32) -> ConstantId {
        if let Some(&id) = self.int_constant_map.get(&value) {
            return id;
        }
        let id = self.add_constant(ConstantValue::Int(value));
        self.int_constant_map.insert(value, id);
        id
    }
    pub fn get_constant_uint(&mut self, value: u32) -> ConstantId {
        if let Some(&id) = self.uint_constant_map.get(&value) {
            return id;
        }
        let id = self.add_constant(ConstantValue::Uint(value));
        self.uint_constant_map.insert(value, id);
        id
    }
    pub fn get_constant_bool(&mut self, value: bool) -> ConstantId {
        if let Some(&id) = self.bool_constant_map.get(&value) {
            return id;
        }
        let id = self.add_constant(ConstantValue::Bool(value));
        self.bool_constant_map.insert(value, id);
        id
    }

    pub fn all_constants(&self) -> &[ConstantValue] {
        &self.constants
    }

    pub fn add_variable(&mut self, name: &str) -> VariableId {
        let id = VariableId { id: self.variables.len() as u32 };
        self.variables.push(Variable { name: name.to_string() });
        id
    }
    pub fn get_variable(&self, id: VariableId) -> &Variable {
        &self.variables[id.id as usize]
    }
    pub fn all_variables(&self) -> &[Variable] {
        &self.variables
    }

    // Allocate a new register for an instruction.  Registers are never reused.
    pub fn new_register(&mut self, op: OpCode) -> RegisterId {
        debug_assert!(op.has_result());
        let id = RegisterId { id: self.instructions.len() as u32 };
        self.instructions.push(Instruction::new(op, id));
        id
    }

    pub fn get_instruction(&self, id: RegisterId) -> &Instruction {
        &self.instructions[id.id as usize]
    }
    pub fn get_instruction_mut(&mut self, id: RegisterId) -> &mut Instruction {
        &mut self.instructions[id.id as usize]
    }
    pub fn total_register_count(&self) -> u32 {
        self.instructions.len() as u32
    }

    // Divergence is produced by an analysis outside of this crate, and recorded here.
    pub fn set_divergent(&mut self, id: RegisterId, divergent: bool) {
        self.get_instruction_mut(id).divergent = divergent;
    }

    // Constants and variables never diverge; registers carry the result of divergence analysis.
    pub fn is_divergent(&self, id: Id) -> bool {
        match id {
            Id::Register(register_id) => self.get_instruction(register_id).divergent,
            Id::Constant(_) | Id::Variable(_) => false,
        }
    }
}

#[derive(Debug, Default)]
pub struct IR {
    pub meta: IRMeta,
    // The body of each function, indexed by function id.
    //
    // This is separate from IRMeta so that can be mutated while the function blocks are traversed.
    pub functions: Vec<Function>,
}

impl IR {
    pub fn new() -> IR {
        IR::default()
    }

    pub fn add_function(&mut self, function: Function) -> FunctionId {
        let id = FunctionId { id: self.functions.len() as u32 };
        self.functions.push(function);
        id
    }

    pub fn get_function(&self, id: FunctionId) -> &Function {
        &self.functions[id.id as usize]
    }

    // Used by transformations that decide not to do anything for the whole shader.
    pub fn preserve_all_metadata(&mut self) {
        self.functions.iter_mut().for_each(|function| function.preserve_metadata(Metadata::all()));
    }
}
