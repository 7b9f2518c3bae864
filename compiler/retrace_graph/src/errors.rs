//! Errors raised while recording a graph.

use retrace_ir::NodeId;
use retrace_value::EvalError;
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Error)]
pub enum GraphError {
    #[error("node {0} does not belong to this graph")]
    UnknownNode(NodeId),

    #[error("node {0} is not an argument")]
    NotAnArgument(NodeId),

    #[error("node {0} is not an object shell")]
    NotAShell(NodeId),

    #[error("shell {0} is still open")]
    UnsealedShell(NodeId),

    #[error("shell {0} is sealed; no more fields can be assigned")]
    SealedShell(NodeId),

    /// Arguments do not fit the signature.
    #[error("TypeError: {0}")]
    Binding(String),

    /// A raw operation failed while computing a snapshot.
    #[error(transparent)]
    Eval(#[from] EvalError),
}
