// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("out of memory allocating the joint cache")]
    OutOfMemory,
    #[error("TransformPQR failed while sampling: {0}")]
    TransformPqrFailure(String),
    #[error("remap_finish returned an unreachable channel count: {0}")]
    UnreachableDispatch(usize),
}

pub type Result<T> = std::result::Result<T, Error>;
