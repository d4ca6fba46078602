// Copyright 2026 The ANGLE Project Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.
//
// Insert warp reconvergence barriers around divergent control flow.
//
// Hardware without automatic reconvergence needs the threads of a warp to be explicitly brought
// back together after an if or a loop in which they may have taken different paths.  For every
// divergent if or loop, this transformation places a `BarSet` at the end of the block before the
// construct and a `BarSync` at the beginning of the block after it (after its phis):
//
//     %token = BarSet
//     If/Loop ...
//     BarSync %token
//
// A thread that leaves the region between the two through a `break` or `continue` would never
// arrive at the `BarSync`, so a `BarBreak` is placed before the jump for every barrier that the
// jump escapes, innermost first.  Jumps only leave the innermost loop, so barriers around (or
// outside) that loop are untouched.
//
// The barrier is omitted when the construct is immediately followed by a sync anyway: either a
// `BarSync` of another barrier, or (if the following block is empty) the end of an if whose own
// successor syncs, or the end of the function.  The end of a loop body is not considered a sync
// point, as the loop continues after it.
use crate::builder::{Builder, Cursor};
use crate::ir::*;
use crate::*;

pub struct Options {
    pub requires_reconvergence_barriers: bool,
}

// Identifies an if or loop during the walk of one function.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
struct NodeId {
    id: u32,
}

// An open barrier: the construct it surrounds and the token produced by its `BarSet`.
#[derive(Debug)]
struct BarrierRecord {
    owner: NodeId,
    token: RegisterId,
}

// An if or loop enclosing the list that is currently being processed.
#[derive(Copy, Clone, Debug)]
struct Ancestor {
    id: NodeId,
    is_loop: bool,
}

struct State<'a> {
    builder: Builder<'a>,
    // Barriers whose construct is being processed, innermost last.
    barriers: Vec<BarrierRecord>,
    // The path from the function body to the current list, innermost last.
    ancestors: Vec<Ancestor>,
    next_node_id: u32,
    progress: bool,
}

// Whether the block following the if or loop at `index` starts with a sync, ignoring its phis.
// `list_end_is_sync` is the answer for when the following block is empty and ends the list.
fn imm_succ_is_sync(
    ir_meta: &IRMeta,
    list: &CFList,
    index: usize,
    list_end_is_sync: bool,
) -> bool {
    let next = list[index + 1].as_block();
    let first_non_phi = next.first_non_phi_index(ir_meta);

    match next.instructions.get(first_non_phi) {
        Some(instruction) => {
            matches!(instruction.get_op_and_result(ir_meta).0, OpCode::BarSync(_))
        }
        // Another if or loop follows the block, which is not a sync.
        None if index + 2 < list.len() => false,
        None => list_end_is_sync,
    }
}

impl<'a> State<'a> {
    fn new(ir_meta: &'a mut IRMeta) -> State<'a> {
        State {
            builder: Builder::new(ir_meta),
            barriers: Vec::new(),
            ancestors: Vec::new(),
            next_node_id: 0,
            progress: false,
        }
    }

    fn new_node_id(&mut self) -> NodeId {
        let id = NodeId { id: self.next_node_id };
        self.next_node_id += 1;
        id
    }

    fn add_barrier(&mut self, list: &mut CFList, index: usize, owner: NodeId) {
        let token = self.builder.bar_set(list[index - 1].as_block_mut(), Cursor::AfterBlock);
        self.builder.bar_sync(list[index + 1].as_block_mut(), Cursor::BeforeBlockAfterPhis, token);

        log::debug!(
            "Barrier {} set in b{} and synced in b{}",
            token.id,
            list[index - 1].as_block().index.id,
            list[index + 1].as_block().index.id
        );

        self.barriers.push(BarrierRecord { owner, token });
        self.progress = true;
    }

    fn pop_barrier(&mut self, owner: NodeId) {
        if self.barriers.last().map(|barrier| barrier.owner == owner).unwrap_or(false) {
            self.barriers.pop();
        }
    }

    // If the block ends in a jump, release the barriers of the constructs between the jump and
    // the loop it jumps in.
    fn break_loop_barriers(&mut self, block: &mut Block) {
        if block.get_jump().is_none() {
            return;
        }

        let mut cursor = Cursor::BeforeInstruction(block.instructions.len() - 1);
        let mut barrier_index = self.barriers.len();
        for ancestor in self.ancestors.iter().rev() {
            if ancestor.is_loop {
                return;
            }

            // Uniform and elided constructs have no barrier to release.
            let barrier = match barrier_index.checked_sub(1).map(|index| &self.barriers[index]) {
                Some(barrier) if barrier.owner == ancestor.id => barrier,
                _ => continue,
            };
            log::debug!(
                "Barrier {} released before jump in b{}",
                barrier.token.id,
                block.index.id
            );
            cursor = self.builder.bar_break(block, cursor, barrier.token);
            barrier_index -= 1;
        }

        panic!("Internal error: jump in b{} outside of a loop", block.index.id);
    }

    fn process_construct(&mut self, list: &mut CFList, index: usize, list_end_is_sync: bool) {
        let id = self.new_node_id();
        let (divergent, is_loop) = match &list[index] {
            CFNode::If(if_node) => {
                (self.builder.ir_meta().is_divergent(if_node.condition), false)
            }
            CFNode::Loop(loop_node) => (loop_node.divergent, true),
            CFNode::Block(_) => unreachable!(),
        };

        if divergent {
            if imm_succ_is_sync(self.builder.ir_meta(), list, index, list_end_is_sync) {
                log::debug!(
                    "Barrier elided, b{} already syncs",
                    list[index + 1].as_block().index.id
                );
            } else {
                self.add_barrier(list, index, id);
            }
        }

        // The end of the arms of an if is followed by whatever follows the if, with any barrier
        // just added in place.
        let arms_end_is_sync =
            !is_loop && imm_succ_is_sync(self.builder.ir_meta(), list, index, list_end_is_sync);

        self.ancestors.push(Ancestor { id, is_loop });
        match &mut list[index] {
            CFNode::If(if_node) => {
                self.process_list(&mut if_node.then_list, arms_end_is_sync);
                self.process_list(&mut if_node.else_list, arms_end_is_sync);
            }
            CFNode::Loop(loop_node) => self.process_list(&mut loop_node.body, false),
            CFNode::Block(_) => unreachable!(),
        }
        self.ancestors.pop();

        self.pop_barrier(id);
    }

    fn process_list(&mut self, list: &mut CFList, list_end_is_sync: bool) {
        for index in 0..list.len() {
            if let CFNode::Block(block) = &mut list[index] {
                self.break_loop_barriers(block);
                continue;
            }
            self.process_construct(list, index, list_end_is_sync);
        }
    }
}

// Insert barriers in one function.  Divergence information must be up to date.
pub fn run_on_function(ir_meta: &mut IRMeta, function: &mut Function) -> bool {
    // Blocks are referred to by index in the log.
    function.require_metadata(Metadata::BLOCK_INDEX);
    let mut state = State::new(ir_meta);

    // The end of the function is a natural sync point.
    state.process_list(&mut function.body, true);
    debug_assert!(state.barriers.is_empty());
    debug_assert!(state.ancestors.is_empty());

    // No blocks are created or removed, only instructions are added.
    if state.progress {
        function.preserve_metadata(
            Metadata::BLOCK_INDEX | Metadata::DOMINANCE | Metadata::LOOP_ANALYSIS,
        );
    } else {
        function.preserve_metadata(Metadata::all());
    }

    state.progress
}

pub fn run(ir: &mut IR, options: &Options) -> bool {
    if !options.requires_reconvergence_barriers {
        ir.preserve_all_metadata();
        return false;
    }

    struct ShaderState<'a> {
        ir_meta: &'a mut IRMeta,
        progress: bool,
    }
    let mut state = ShaderState { ir_meta: &mut ir.meta, progress: false };

    traverser::transformer::for_each_function(
        &mut state,
        &mut ir.functions,
        |_, id| log::trace!("Adding barriers to f{}", id.id),
        &|state, function| {
            state.progress |= run_on_function(state.ir_meta, function);
        },
    );
    let progress = state.progress;

    crate::validate_in_debug_build_only!(ir);
    progress
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_function;
    use crate::util::BarrierSummary;

    const OPTIONS: Options = Options { requires_reconvergence_barriers: true };

    fn dump_first_function(ir: &IR) -> String {
        debug::dump_function_to_string(&ir.meta, FunctionId { id: 0 }, &ir.functions[0])
    }

    // Nested divergent ifs, each followed by a store.
    fn build_nested_ifs(ir: &mut IR) {
        let variable = ir.meta.add_variable("x");
        build_function(ir, "main", |b| {
            let invocation = b.subgroup_invocation_id();
            b.mark_divergent(invocation);
            b.begin_if(invocation);
            let value = b.load(variable);
            b.mark_divergent(value);
            b.begin_if(value);
            b.store(variable, invocation);
            b.end_if();
            b.store(variable, value);
            b.end_if();
            b.store(variable, invocation);
        });
    }

    #[test]
    fn nested_divergent_ifs() {
        let mut ir = IR::new();
        build_nested_ifs(&mut ir);

        assert!(run(&mut ir, &OPTIONS));
        let expected = "
Function f0: main
  Block b0:
    r0 = SubgroupInvocationId [divergent]
    r2 = BarSet
  If r0 [divergent]
  Then:
    Block b1:
      r1 = Load v0 [divergent]
      r3 = BarSet
    If r1 [divergent]
    Then:
      Block b2:
        Store v0 r0
    Else:
      Block b3:
    Block b4:
      BarSync r3
      Store v0 r1
  Else:
    Block b5:
  Block b6:
    BarSync r2
    Store v0 r0";
        assert_eq!(dump_first_function(&ir), expected);
        assert!(validator::validate(&ir).is_ok());
    }

    #[test]
    fn break_releases_enclosing_barriers_innermost_first() {
        let mut ir = IR::new();
        let variable = ir.meta.add_variable("x");
        build_function(&mut ir, "main", |b| {
            let invocation = b.subgroup_invocation_id();
            b.mark_divergent(invocation);
            b.begin_loop(true);
            b.begin_if(invocation);
            b.begin_if(invocation);
            b.jump_break();
            b.end_if();
            b.store(variable, invocation);
            b.end_if();
            b.store(variable, invocation);
            b.end_loop();
            b.store(variable, invocation);
        });

        assert!(run(&mut ir, &OPTIONS));
        let expected = "
Function f0: main
  Block b0:
    r0 = SubgroupInvocationId [divergent]
    r1 = BarSet
  Loop [divergent]
  Body:
    Block b1:
      r2 = BarSet
    If r0 [divergent]
    Then:
      Block b2:
        r3 = BarSet
      If r0 [divergent]
      Then:
        Block b3:
          BarBreak r3
          BarBreak r2
          Break
      Else:
        Block b4:
      Block b5:
        BarSync r3
        Store v0 r0
    Else:
      Block b6:
    Block b7:
      BarSync r2
      Store v0 r0
  Block b8:
    BarSync r1
    Store v0 r0";
        assert_eq!(dump_first_function(&ir), expected);
        assert!(validator::validate(&ir).is_ok());
    }

    #[test]
    fn continue_only_releases_barriers_inside_the_loop() {
        let mut ir = IR::new();
        let variable = ir.meta.add_variable("x");
        build_function(&mut ir, "main", |b| {
            let invocation = b.subgroup_invocation_id();
            b.mark_divergent(invocation);
            b.begin_if(invocation);
            b.begin_loop(false);
            b.begin_if(invocation);
            b.jump_continue();
            b.end_if();
            b.store(variable, invocation);
            b.end_loop();
            b.store(variable, invocation);
            b.end_if();
            b.store(variable, invocation);
        });

        assert!(run(&mut ir, &OPTIONS));
        let dumped = dump_first_function(&ir);
        assert!(dumped.contains("\n          BarBreak r2\n          Continue"));
        assert!(!dumped.contains("BarBreak r1"));
        assert_eq!(
            BarrierSummary::of_ir(&ir),
            BarrierSummary { sets: 2, syncs: 2, breaks: 1 }
        );
    }

    #[test]
    fn uniform_ifs_between_jump_and_barrier_are_skipped() {
        let mut ir = IR::new();
        let variable = ir.meta.add_variable("x");
        build_function(&mut ir, "main", |b| {
            let invocation = b.subgroup_invocation_id();
            b.mark_divergent(invocation);
            let uniform = b.load(variable);
            b.begin_loop(false);
            b.begin_if(invocation);
            b.begin_if(uniform);
            b.jump_break();
            b.end_if();
            b.store(variable, invocation);
            b.end_if();
            b.store(variable, invocation);
            b.end_loop();
        });

        assert!(run(&mut ir, &OPTIONS));
        assert_eq!(
            BarrierSummary::of_ir(&ir),
            BarrierSummary { sets: 1, syncs: 1, breaks: 1 }
        );
        assert!(validator::validate(&ir).is_ok());
    }

    #[test]
    fn continue_does_not_release_the_barrier_of_its_own_loop() {
        let mut ir = IR::new();
        let variable = ir.meta.add_variable("x");
        build_function(&mut ir, "main", |b| {
            let invocation = b.subgroup_invocation_id();
            b.begin_loop(true);
            b.store(variable, invocation);
            b.jump_continue();
            b.end_loop();
            b.store(variable, invocation);
        });

        assert!(run(&mut ir, &OPTIONS));
        let expected = "
Function f0: main
  Block b0:
    r0 = SubgroupInvocationId
    r1 = BarSet
  Loop [divergent]
  Body:
    Block b1:
      Store v0 r0
      Continue
  Block b2:
    BarSync r1
    Store v0 r0";
        assert_eq!(dump_first_function(&ir), expected);
    }

    #[test]
    fn existing_sync_after_if_is_reused() {
        let mut ir = IR::new();
        let variable = ir.meta.add_variable("x");
        build_function(&mut ir, "main", |b| {
            let invocation = b.subgroup_invocation_id();
            b.mark_divergent(invocation);
            b.begin_if(invocation);
            b.store(variable, invocation);
            b.end_if();
            b.store(variable, invocation);
        });

        // Sync on a barrier set at the start of the function.
        let body = &mut ir.functions[0].body;
        let mut builder = Builder::new(&mut ir.meta);
        let token = builder.bar_set(body[0].as_block_mut(), Cursor::BeforeInstruction(0));
        builder.bar_sync(body[2].as_block_mut(), Cursor::BeforeBlockAfterPhis, token);

        assert!(!run(&mut ir, &OPTIONS));
        assert_eq!(
            BarrierSummary::of_ir(&ir),
            BarrierSummary { sets: 1, syncs: 1, breaks: 0 }
        );
    }

    #[test]
    fn if_at_end_of_function_is_elided() {
        let mut ir = IR::new();
        let variable = ir.meta.add_variable("x");
        build_function(&mut ir, "main", |b| {
            let invocation = b.subgroup_invocation_id();
            b.mark_divergent(invocation);
            b.begin_if(invocation);
            b.store(variable, invocation);
            b.end_if();
        });

        assert!(!run(&mut ir, &OPTIONS));
        assert_eq!(BarrierSummary::of_ir(&ir), BarrierSummary::default());
    }

    #[test]
    fn existing_sync_after_loop_is_reused() {
        let mut ir = IR::new();
        let variable = ir.meta.add_variable("x");
        build_function(&mut ir, "main", |b| {
            let invocation = b.subgroup_invocation_id();
            b.begin_loop(true);
            b.jump_break();
            b.end_loop();
            b.store(variable, invocation);
        });

        let body = &mut ir.functions[0].body;
        let mut builder = Builder::new(&mut ir.meta);
        let token = builder.bar_set(body[0].as_block_mut(), Cursor::BeforeInstruction(0));
        builder.bar_sync(body[2].as_block_mut(), Cursor::BeforeBlockAfterPhis, token);

        assert!(!run(&mut ir, &OPTIONS));
        assert_eq!(
            BarrierSummary::of_ir(&ir),
            BarrierSummary { sets: 1, syncs: 1, breaks: 0 }
        );
    }

    #[test]
    fn loop_at_end_of_function_is_elided() {
        let mut ir = IR::new();
        let variable = ir.meta.add_variable("x");
        build_function(&mut ir, "main", |b| {
            let invocation = b.subgroup_invocation_id();
            b.mark_divergent(invocation);
            b.begin_loop(true);
            b.store(variable, invocation);
            b.jump_break();
            b.end_loop();
        });

        assert!(!run(&mut ir, &OPTIONS));
        assert!(BarrierSummary::of_ir(&ir).is_empty());
    }

    #[test]
    fn if_at_end_of_loop_body_is_not_elided() {
        let mut ir = IR::new();
        let variable = ir.meta.add_variable("x");
        build_function(&mut ir, "main", |b| {
            let invocation = b.subgroup_invocation_id();
            b.mark_divergent(invocation);
            b.begin_loop(false);
            b.begin_if(invocation);
            b.store(variable, invocation);
            b.end_if();
            b.end_loop();
            b.store(variable, invocation);
        });

        assert!(run(&mut ir, &OPTIONS));
        let expected = "
Function f0: main
  Block b0:
    r0 = SubgroupInvocationId [divergent]
  Loop
  Body:
    Block b1:
      r1 = BarSet
    If r0 [divergent]
    Then:
      Block b2:
        Store v0 r0
    Else:
      Block b3:
    Block b4:
      BarSync r1
  Block b5:
    Store v0 r0";
        assert_eq!(dump_first_function(&ir), expected);
    }

    #[test]
    fn inner_if_is_elided_when_outer_if_syncs() {
        let mut ir = IR::new();
        let variable = ir.meta.add_variable("x");
        build_function(&mut ir, "main", |b| {
            let invocation = b.subgroup_invocation_id();
            b.mark_divergent(invocation);
            b.begin_if(invocation);
            b.begin_if(invocation);
            b.store(variable, invocation);
            b.end_if();
            b.end_if();
            b.store(variable, invocation);
        });

        assert!(run(&mut ir, &OPTIONS));
        assert_eq!(
            BarrierSummary::of_ir(&ir),
            BarrierSummary { sets: 1, syncs: 1, breaks: 0 }
        );
    }

    #[test]
    fn innermost_if_defers_to_outermost_sync() {
        let mut ir = IR::new();
        let variable = ir.meta.add_variable("x");
        build_function(&mut ir, "main", |b| {
            let invocation = b.subgroup_invocation_id();
            b.mark_divergent(invocation);
            b.begin_if(invocation);
            b.begin_if(invocation);
            b.begin_if(invocation);
            b.store(variable, invocation);
            b.end_if();
            b.end_if();
            b.end_if();
            b.store(variable, invocation);
        });

        assert!(run(&mut ir, &OPTIONS));
        let dumped = dump_first_function(&ir);
        assert!(dumped.contains("r0 = SubgroupInvocationId [divergent]\n    r1 = BarSet\n  If"));
        assert_eq!(
            BarrierSummary::of_ir(&ir),
            BarrierSummary { sets: 1, syncs: 1, breaks: 0 }
        );
    }

    // The if in the else list is followed by a store, so the end of the else list does not
    // decide its elision.  The loop body ends in an empty block, which never syncs.
    #[test]
    fn constructs_in_else_list() {
        let mut ir = IR::new();
        let variable = ir.meta.add_variable("x");
        build_function(&mut ir, "main", |b| {
            let invocation = b.subgroup_invocation_id();
            b.mark_divergent(invocation);
            b.begin_if(invocation);
            b.store(variable, invocation);
            b.begin_else();
            b.begin_if(invocation);
            b.store(variable, invocation);
            b.end_if();
            b.store(variable, invocation);
            b.begin_loop(true);
            b.begin_if(invocation);
            b.jump_break();
            b.end_if();
            b.store(variable, invocation);
            b.end_loop();
            b.end_if();
            b.store(variable, invocation);
        });

        assert!(run(&mut ir, &OPTIONS));
        let expected = "
Function f0: main
  Block b0:
    r0 = SubgroupInvocationId [divergent]
    r1 = BarSet
  If r0 [divergent]
  Then:
    Block b1:
      Store v0 r0
  Else:
    Block b2:
      r2 = BarSet
    If r0 [divergent]
    Then:
      Block b3:
        Store v0 r0
    Else:
      Block b4:
    Block b5:
      BarSync r2
      Store v0 r0
    Loop [divergent]
    Body:
      Block b6:
        r3 = BarSet
      If r0 [divergent]
      Then:
        Block b7:
          BarBreak r3
          Break
      Else:
        Block b8:
      Block b9:
        BarSync r3
        Store v0 r0
    Block b10:
  Block b11:
    BarSync r1
    Store v0 r0";
        assert_eq!(dump_first_function(&ir), expected);
        assert!(validator::validate(&ir).is_ok());
    }

    #[test]
    fn sync_is_placed_after_phis() {
        let mut ir = IR::new();
        let variable = ir.meta.add_variable("x");
        build_function(&mut ir, "main", |b| {
            let invocation = b.subgroup_invocation_id();
            b.mark_divergent(invocation);
            b.begin_if(invocation);
            b.end_if();
            let zero = Id::new_constant(b.ir_meta().get_constant_int(0));
            let merged = b.phi(vec![invocation, zero]);
            b.store(variable, merged);
        });

        assert!(run(&mut ir, &OPTIONS));
        let dumped = dump_first_function(&ir);
        assert!(dumped.contains("r2 = BarSet"));
        assert!(dumped.ends_with("r1 = Phi (r0, c0)\n    BarSync r2\n    Store v0 r1"));
        assert!(validator::validate(&ir).is_ok());
    }

    #[test]
    fn phis_at_end_of_function_are_elided() {
        let mut ir = IR::new();
        build_function(&mut ir, "main", |b| {
            let invocation = b.subgroup_invocation_id();
            b.mark_divergent(invocation);
            b.begin_if(invocation);
            b.end_if();
            let zero = Id::new_constant(b.ir_meta().get_constant_int(0));
            b.phi(vec![invocation, zero]);
        });

        assert!(!run(&mut ir, &OPTIONS));
    }

    #[test]
    fn divergent_if_before_another_if_is_not_elided() {
        let mut ir = IR::new();
        let variable = ir.meta.add_variable("x");
        build_function(&mut ir, "main", |b| {
            let invocation = b.subgroup_invocation_id();
            b.mark_divergent(invocation);
            let uniform = b.load(variable);
            b.begin_if(invocation);
            b.store(variable, invocation);
            b.end_if();
            b.begin_if(uniform);
            b.store(variable, invocation);
            b.end_if();
        });

        assert!(run(&mut ir, &OPTIONS));
        assert_eq!(
            BarrierSummary::of_ir(&ir),
            BarrierSummary { sets: 1, syncs: 1, breaks: 0 }
        );
    }

    #[test]
    fn uniform_control_flow_is_untouched() {
        let mut ir = IR::new();
        let variable = ir.meta.add_variable("x");
        build_function(&mut ir, "main", |b| {
            let value = b.load(variable);
            b.begin_loop(false);
            b.begin_if(value);
            b.jump_break();
            b.end_if();
            b.store(variable, value);
            b.end_loop();
            b.store(variable, value);
        });
        let before = dump_first_function(&ir);
        ir.functions[0].mark_metadata_valid(Metadata::all());

        assert!(!run(&mut ir, &OPTIONS));
        assert_eq!(dump_first_function(&ir), before);
        assert_eq!(ir.functions[0].get_valid_metadata(), Metadata::all());
    }

    #[test]
    fn running_twice_adds_nothing() {
        let mut ir = IR::new();
        build_nested_ifs(&mut ir);

        assert!(run(&mut ir, &OPTIONS));
        let once = dump_first_function(&ir);
        let registers = ir.meta.total_register_count();

        assert!(!run(&mut ir, &OPTIONS));
        assert_eq!(dump_first_function(&ir), once);
        assert_eq!(ir.meta.total_register_count(), registers);
    }

    #[test]
    fn progress_invalidates_analyses() {
        let mut ir = IR::new();
        build_nested_ifs(&mut ir);
        ir.functions[0].mark_metadata_valid(Metadata::all());

        assert!(run(&mut ir, &OPTIONS));
        assert_eq!(
            ir.functions[0].get_valid_metadata(),
            Metadata::BLOCK_INDEX | Metadata::DOMINANCE | Metadata::LOOP_ANALYSIS
        );
    }

    #[test]
    fn disabled_pass_preserves_everything() {
        let mut ir = IR::new();
        build_nested_ifs(&mut ir);
        ir.functions[0].mark_metadata_valid(Metadata::all());
        let before = dump_first_function(&ir);

        assert!(!run(&mut ir, &Options { requires_reconvergence_barriers: false }));
        assert_eq!(dump_first_function(&ir), before);
        assert_eq!(ir.functions[0].get_valid_metadata(), Metadata::all());
    }

    #[test]
    fn progress_is_combined_over_functions() {
        let mut ir = IR::new();
        let variable = ir.meta.add_variable("x");
        build_function(&mut ir, "uniform", |b| {
            let value = b.load(variable);
            b.begin_if(value);
            b.end_if();
            b.store(variable, value);
        });
        build_nested_ifs(&mut ir);
        ir.functions.iter_mut().for_each(|function| function.mark_metadata_valid(Metadata::all()));

        assert!(run(&mut ir, &OPTIONS));
        assert_eq!(ir.functions[0].get_valid_metadata(), Metadata::all());
        assert!(!ir.functions[1].is_metadata_valid(Metadata::DIVERGENCE));
        assert_eq!(
            BarrierSummary::of_function(&ir.meta, &ir.functions[1]),
            BarrierSummary { sets: 2, syncs: 2, breaks: 0 }
        );
    }

    #[test]
    #[should_panic(expected = "outside of a loop")]
    fn jump_outside_loop_panics() {
        let mut meta = IRMeta::new();
        let mut block = Block::new();
        block.add_void_instruction(OpCode::Break);
        let mut function = Function::new("main", vec![CFNode::Block(block)]);
        run_on_function(&mut meta, &mut function);
    }

    #[test]
    fn stale_block_index_is_recomputed() {
        let mut meta = IRMeta::new();
        let variable = meta.add_variable("x");
        let mut block = Block::new();
        block.add_void_instruction(OpCode::Store(variable, Id::new_variable(variable)));
        let loop_node = LoopNode { divergent: false, body: vec![CFNode::Block(block)] };
        let mut function = Function::new(
            "main",
            vec![CFNode::Block(Block::new()), CFNode::Loop(loop_node), CFNode::Block(Block::new())],
        );
        assert!(!function.is_metadata_valid(Metadata::BLOCK_INDEX));

        assert!(!run_on_function(&mut meta, &mut function));
        assert!(function.is_metadata_valid(Metadata::BLOCK_INDEX));
        assert_eq!(function.body[2].as_block().index.id, 2);
    }

    #[test]
    #[should_panic(expected = "outside of a loop")]
    fn jump_under_uniform_if_outside_loop_panics() {
        let mut meta = IRMeta::new();
        let condition = Id::new_constant(meta.get_constant_bool(true));
        let mut jump_block = Block::new();
        jump_block.add_void_instruction(OpCode::Break);
        let if_node = IfNode {
            condition,
            then_list: vec![CFNode::Block(jump_block)],
            else_list: vec![CFNode::Block(Block::new())],
        };
        let mut function = Function::new(
            "main",
            vec![CFNode::Block(Block::new()), CFNode::If(if_node), CFNode::Block(Block::new())],
        );
        run_on_function(&mut meta, &mut function);
    }
}
