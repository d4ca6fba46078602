// Copyright 2026 The ANGLE Project Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.
//
// Entry point of the backend passes: derives the options of each transformation from the
// description of the target and runs them in order.

use crate::ir::*;
use crate::*;

// The first shader model whose warps do not automatically reconverge after divergent control
// flow.
pub const SM_REQUIRING_RECONVERGENCE_BARRIERS: u32 = 75;

#[derive(Clone, Debug)]
pub struct Options {
    // The shader model of the target GPU, e.g. 75 for SM 7.5.
    pub shader_model: u32,
    // Run the validator before and after the transformations.
    pub validate: bool,
    // Log the IR once the transformations are done.
    pub dump_ir: bool,
}

impl Default for Options {
    fn default() -> Options {
        Options {
            shader_model: SM_REQUIRING_RECONVERGENCE_BARRIERS,
            validate: cfg!(debug_assertions),
            dump_ir: false,
        }
    }
}

// Returns whether the IR was changed.
pub fn run(ir: &mut IR, options: &Options) -> bool {
    if options.validate {
        validator::validate_or_panic(ir);
    }

    let transform_options = transform::add_barriers::Options {
        requires_reconvergence_barriers: options.shader_model
            >= SM_REQUIRING_RECONVERGENCE_BARRIERS,
    };
    let progress = transform::add_barriers::run(ir, &transform_options);

    if options.validate {
        validator::validate_or_panic(ir);
    }

    log::info!(
        "SM {}: {} function(s), barriers {}",
        options.shader_model,
        ir.functions.len(),
        if progress { "added" } else { "not needed" }
    );
    if options.dump_ir {
        debug::dump(ir);
    }

    progress
}
