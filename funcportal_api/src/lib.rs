// SPDX-FileCopyrightText: © 2023 Technical University of Munich, Chair of Connected Mobility
// SPDX-License-Identifier: MIT

/// Named argument maps passed to wrapped functions.
pub mod arguments;
pub use arguments::{ArgumentError, Arguments};

/// Explicit parameter metadata attached to a function at registration time.
pub mod signature;
pub use signature::{ArgumentsDescription, Parameter, Signature};

/// Wraps a callable with its signature and classifies the result of each invocation.
pub mod function;
pub use function::{ExtraArguments, FunctionAdapter, InvocationError};

/// Tokens, job views and the capabilities offered by a job store.
pub mod job;
