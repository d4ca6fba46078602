// Copyright 2026 The ANGLE Project Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.
//
// Traverser utilities for the IR.  Fundamentally, there are two types of traversers:
//
// - A visitor does a read-only traversal of the IR.
// - A transformer may mutate the IR.  Transformations that need to look around the node they are
//   transforming (such as the neighboring blocks of an if) walk the control-flow lists themselves,
//   the transformer only hands out the functions one at a time.

use crate::ir::*;

// Which list of the control-flow tree a node is found in.
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum ListKind {
    // The body of the function
    Function,
    // The true and false lists of an if
    Then,
    Else,
    // The body of a loop
    LoopBody,
}

pub mod visitor {
    use super::*;

    #[derive(PartialEq, Copy, Clone, Debug)]
    pub enum VisitAfter {
        SubLists,
        Nothing,
    }

    pub const VISIT_SUB_LISTS: VisitAfter = VisitAfter::SubLists;
    pub const SKIP_SUB_LISTS: VisitAfter = VisitAfter::Nothing;

    // Where a node is found, passed to the node visitor.
    #[derive(Copy, Clone, Debug)]
    pub struct NodeLocation {
        pub list_kind: ListKind,
        // Index of the node in its list.
        pub index: usize,
        // Number of ifs and loops this node is nested in.
        pub depth: usize,
        // Number of loops this node is nested in.
        pub loop_depth: usize,
    }

    impl NodeLocation {
        pub fn is_first_in_list(&self) -> bool {
            self.index == 0
        }
    }

    pub fn for_each_function<State, PreVisit, NodeVisit, PostVisit>(
        state: &mut State,
        functions: &[Function],
        pre_visit: PreVisit,
        node_visit: NodeVisit,
        post_visit: PostVisit,
    ) where
        PreVisit: Fn(&mut State, FunctionId, &Function),
        NodeVisit: Fn(&mut State, &CFNode, NodeLocation) -> VisitAfter,
        PostVisit: Fn(&mut State, FunctionId, &Function),
    {
        for (id, function) in functions.iter().enumerate() {
            let function_id = FunctionId { id: id as u32 };
            pre_visit(state, function_id, function);
            visit_list(state, &function.body, ListKind::Function, &node_visit, 0, 0);
            post_visit(state, function_id, function);
        }
    }

    pub fn visit_list<State, NodeVisit>(
        state: &mut State,
        list: &CFList,
        list_kind: ListKind,
        node_visit: &NodeVisit,
        depth: usize,
        loop_depth: usize,
    ) where
        NodeVisit: Fn(&mut State, &CFNode, NodeLocation) -> VisitAfter,
    {
        for (index, node) in list.iter().enumerate() {
            let location = NodeLocation { list_kind, index, depth, loop_depth };
            if node_visit(state, node, location) != VISIT_SUB_LISTS {
                continue;
            }

            match node {
                CFNode::Block(_) => {}
                CFNode::If(if_node) => {
                    visit_list(
                        state,
                        &if_node.then_list,
                        ListKind::Then,
                        node_visit,
                        depth + 1,
                        loop_depth,
                    );
                    visit_list(
                        state,
                        &if_node.else_list,
                        ListKind::Else,
                        node_visit,
                        depth + 1,
                        loop_depth,
                    );
                }
                CFNode::Loop(loop_node) => {
                    visit_list(
                        state,
                        &loop_node.body,
                        ListKind::LoopBody,
                        node_visit,
                        depth + 1,
                        loop_depth + 1,
                    );
                }
            }
        }
    }

    // Visit every block of every function, in program order.
    pub fn for_each_block<State, BlockVisit>(
        state: &mut State,
        functions: &[Function],
        block_visit: &BlockVisit,
    ) where
        BlockVisit: Fn(&mut State, &Block),
    {
        for_each_function(
            state,
            functions,
            |_, _, _| {},
            |state, node, _| {
                if let CFNode::Block(block) = node {
                    block_visit(state, block);
                }
                VISIT_SUB_LISTS
            },
            |_, _, _| {},
        );
    }

    pub fn for_each_instruction<State, InstVisit>(
        state: &mut State,
        functions: &[Function],
        inst_visit: &InstVisit,
    ) where
        InstVisit: Fn(&mut State, &BlockInstruction),
    {
        for_each_block(state, functions, &|state, block| {
            block.instructions.iter().for_each(|instruction| inst_visit(state, instruction));
        });
    }
}

pub mod transformer {
    use super::*;

    // Hand out every function to `function_transform`, which is free to transform it as it sees
    // fit.
    pub fn for_each_function<State, PreVisit, FunctionTransform>(
        state: &mut State,
        functions: &mut [Function],
        pre_visit: PreVisit,
        function_transform: &FunctionTransform,
    ) where
        PreVisit: Fn(&mut State, FunctionId),
        FunctionTransform: Fn(&mut State, &mut Function),
    {
        for (id, function) in functions.iter_mut().enumerate() {
            let function_id = FunctionId { id: id as u32 };
            pre_visit(state, function_id);
            function_transform(state, function);
        }
    }
}
