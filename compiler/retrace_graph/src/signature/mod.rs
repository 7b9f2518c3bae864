//! Binding call arguments to parameters.
//!
//! A traced callee receives one `Argument` node per parameter, tagged with
//! the parameter's [`ArgTag`]. [`Signature::bind`] produces those nodes from
//! the caller's positional and keyword operands, filling in defaults as
//! literals and packing `*args`/`**kwargs` into containers.

use retrace_ir::{ArgTag, Name, NodeId, ParamKind};
use retrace_value::Value;

use crate::{Deep, GraphBuilder, GraphError};

#[derive(Clone, Debug)]
pub struct Param {
    pub name: Name,
    pub kind: ParamKind,
    pub default: Option<Value>,
}

impl Param {
    pub fn new(name: &str, kind: ParamKind) -> Self {
        Param {
            name: Name::intern(name),
            kind,
            default: None,
        }
    }

    pub fn positional(name: &str) -> Self {
        Param::new(name, ParamKind::PositionalOrKeyword)
    }

    #[must_use]
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn tag(&self) -> ArgTag {
        ArgTag::new(self.name, self.kind)
    }
}

/// Parameter list of a traced callable.
#[derive(Clone, Debug)]
pub struct Signature {
    name: Name,
    params: Vec<Param>,
}

/// `Argument` nodes produced by [`Signature::bind`].
///
/// `args` holds positional-capable parameters (including `*args`), `kwargs`
/// keyword-only parameters and `**kwargs`, each in declaration order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BoundArguments {
    pub args: Vec<NodeId>,
    pub kwargs: Vec<NodeId>,
}

impl Signature {
    pub fn new(name: &str, params: Vec<Param>) -> Self {
        Signature {
            name: Name::intern(name),
            params,
        }
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    fn error(&self, message: std::fmt::Arguments<'_>) -> GraphError {
        GraphError::Binding(format!("{}() {message}", self.name))
    }

    pub fn bind(
        &self,
        builder: &mut GraphBuilder,
        positional: &[NodeId],
        keywords: &[(&str, NodeId)],
    ) -> Result<BoundArguments, GraphError> {
        let mut bound = BoundArguments::default();
        let mut used = vec![false; keywords.len()];
        let mut next = 0;

        let take_keyword = |name: Name, used: &mut Vec<bool>| {
            keywords
                .iter()
                .position(|(k, _)| Name::intern(k) == name)
                .map(|i| {
                    used[i] = true;
                    keywords[i].1
                })
        };

        for param in &self.params {
            let tag = param.tag();
            match param.kind {
                ParamKind::PositionalOnly | ParamKind::PositionalOrKeyword => {
                    let value = if next < positional.len() {
                        if param.kind.accepts_keyword()
                            && take_keyword(param.name, &mut used).is_some()
                        {
                            return Err(self.error(format_args!(
                                "got multiple values for argument '{}'",
                                param.name
                            )));
                        }
                        next += 1;
                        Some(positional[next - 1])
                    } else if param.kind.accepts_keyword() {
                        take_keyword(param.name, &mut used)
                    } else {
                        None
                    };
                    let value = self.resolve(builder, param, value)?;
                    bound.args.push(builder.argument(tag, value)?);
                }
                ParamKind::VarPositional => {
                    let rest = positional[next..]
                        .iter()
                        .map(|id| Deep::Node(*id))
                        .collect();
                    next = positional.len();
                    let packed = builder.container(Deep::Tuple(rest))?;
                    bound.args.push(builder.argument(tag, packed)?);
                }
                ParamKind::KeywordOnly => {
                    let value = take_keyword(param.name, &mut used);
                    let value = self.resolve(builder, param, value)?;
                    bound.kwargs.push(builder.argument(tag, value)?);
                }
                ParamKind::VarKeyword => {
                    let mut entries = Vec::new();
                    for (i, (name, value)) in keywords.iter().enumerate() {
                        if !used[i] {
                            used[i] = true;
                            entries.push((Deep::Raw(Value::string(name)), Deep::Node(*value)));
                        }
                    }
                    let packed = builder.container(Deep::Map(entries))?;
                    bound.kwargs.push(builder.argument(tag, packed)?);
                }
            }
        }

        if next < positional.len() {
            let expected = self
                .params
                .iter()
                .filter(|p| p.kind.accepts_positional())
                .count();
            return Err(self.error(format_args!(
                "takes {expected} positional arguments but {} were given",
                positional.len()
            )));
        }
        if let Some(i) = used.iter().position(|u| !u) {
            return Err(self.error(format_args!(
                "got an unexpected keyword argument '{}'",
                keywords[i].0
            )));
        }
        Ok(bound)
    }

    fn resolve(
        &self,
        builder: &mut GraphBuilder,
        param: &Param,
        value: Option<NodeId>,
    ) -> Result<NodeId, GraphError> {
        match (value, &param.default) {
            (Some(id), _) => Ok(id),
            (None, Some(default)) => Ok(builder.literal(default.clone())),
            (None, None) => Err(self.error(format_args!(
                "missing required argument: '{}'",
                param.name
            ))),
        }
    }
}

#[cfg(test)]
mod tests;
