// Copyright 2026 The ANGLE Project Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.
//
// Structured-control-flow IR of a shader, and the pass that inserts warp reconvergence barriers
// around divergent ifs and loops for hardware without automatic reconvergence.

pub mod builder;
pub mod compile;
pub mod debug;
pub mod instruction;
pub mod ir;
pub mod transform;
pub mod traverser;
pub mod util;
pub mod validator;
use std::collections::{HashMap, HashSet};
use std::fmt::Write;
