//! Deep container shapes.
//!
//! A `Deep<T>` mirrors a (possibly nested) host container whose leaves are
//! either traced elements (`Node`) or untraced values (`Raw`). The graph
//! stores `Deep<NodeId>`; back-ends map it to `Deep<Output>` with
//! [`Deep::try_map`].

use retrace_value::{EvalResult, Value};

#[derive(Clone, Debug, PartialEq)]
pub enum Deep<T> {
    Node(T),
    Raw(Value),
    List(Vec<Deep<T>>),
    Tuple(Vec<Deep<T>>),
    /// Entries in insertion order.
    Map(Vec<(Deep<T>, Deep<T>)>),
    Set(Vec<Deep<T>>),
    /// `[start, stop, step]`
    Slice(Box<[Deep<T>; 3]>),
}

impl<T> Deep<T> {
    /// Map every `Node` leaf, depth first, left to right (keys before values).
    pub fn try_map<U, E, F>(&self, f: &mut F) -> Result<Deep<U>, E>
    where
        F: FnMut(&T) -> Result<U, E>,
    {
        Ok(match self {
            Deep::Node(t) => Deep::Node(f(t)?),
            Deep::Raw(value) => Deep::Raw(value.clone()),
            Deep::List(items) => Deep::List(try_map_all(items, f)?),
            Deep::Tuple(items) => Deep::Tuple(try_map_all(items, f)?),
            Deep::Set(items) => Deep::Set(try_map_all(items, f)?),
            Deep::Map(entries) => {
                let mut mapped = Vec::with_capacity(entries.len());
                for (key, value) in entries {
                    let key = key.try_map(f)?;
                    mapped.push((key, value.try_map(f)?));
                }
                Deep::Map(mapped)
            }
            Deep::Slice(bounds) => {
                let [start, stop, step] = &**bounds;
                let start = start.try_map(f)?;
                let stop = stop.try_map(f)?;
                Deep::Slice(Box::new([start, stop, step.try_map(f)?]))
            }
        })
    }

    /// `Node` leaves in traversal order.
    pub fn nodes(&self) -> Vec<&T> {
        let mut out = Vec::new();
        self.collect_nodes(&mut out);
        out
    }

    fn collect_nodes<'a>(&'a self, out: &mut Vec<&'a T>) {
        match self {
            Deep::Node(t) => out.push(t),
            Deep::Raw(_) => {}
            Deep::List(items) | Deep::Tuple(items) | Deep::Set(items) => {
                for item in items {
                    item.collect_nodes(out);
                }
            }
            Deep::Map(entries) => {
                for (key, value) in entries {
                    key.collect_nodes(out);
                    value.collect_nodes(out);
                }
            }
            Deep::Slice(bounds) => {
                for bound in bounds.iter() {
                    bound.collect_nodes(out);
                }
            }
        }
    }
}

fn try_map_all<T, U, E, F>(items: &[Deep<T>], f: &mut F) -> Result<Vec<Deep<U>>, E>
where
    F: FnMut(&T) -> Result<U, E>,
{
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        out.push(item.try_map(f)?);
    }
    Ok(out)
}

impl Deep<Value> {
    /// Rebuild the host container. Map keys and set elements must be
    /// hashable.
    pub fn into_value(self) -> EvalResult {
        match self {
            Deep::Node(value) | Deep::Raw(value) => Ok(value),
            Deep::List(items) => Ok(Value::list(into_values(items)?)),
            Deep::Tuple(items) => Ok(Value::tuple(into_values(items)?)),
            Deep::Set(items) => Value::set(into_values(items)?),
            Deep::Map(entries) => {
                let mut pairs = Vec::with_capacity(entries.len());
                for (key, value) in entries {
                    pairs.push((key.into_value()?, value.into_value()?));
                }
                Value::map(pairs)
            }
            Deep::Slice(bounds) => {
                let [start, stop, step] = *bounds;
                Ok(Value::slice(
                    start.into_value()?,
                    stop.into_value()?,
                    step.into_value()?,
                ))
            }
        }
    }
}

fn into_values(items: Vec<Deep<Value>>) -> EvalResult<Vec<Value>> {
    items.into_iter().map(Deep::into_value).collect()
}
