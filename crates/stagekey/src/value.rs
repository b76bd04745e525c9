// Copyright (c) Contributors to the stagekey project.
// SPDX-License-Identifier: Apache-2.0

//! The applicative value algebra over dependency-tracked keys.
//!
//! A [`Value<T>`] is "a `T` computable once its dependency keys are
//! resolved". Values are built only through the combinators here, so the
//! dependency set is correct by construction: it is the transitive union of
//! every key the computation can read. Evaluation is pure and total — keys
//! missing from the resolution map fall back to their defaults.

use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;

use crate::key::{Key, UntypedKey};
use crate::resolve::ResolutionMap;

#[cfg(test)]
#[path = "./value_test.rs"]
mod value_test;

/// Set of type-erased keys a computation depends on.
pub type DepSet = BTreeSet<UntypedKey>;

/// A computation over a resolution map, carrying its dependency set.
pub struct Value<T> {
    deps: DepSet,
    thunk: Rc<dyn Fn(&ResolutionMap) -> T>,
}

impl<T> Clone for Value<T> {
    fn clone(&self) -> Self {
        Value {
            deps: self.deps.clone(),
            thunk: Rc::clone(&self.thunk),
        }
    }
}

impl<T> fmt::Debug for Value<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.deps.iter().map(|k| k.name()).collect();
        f.debug_struct("Value").field("deps", &names).finish()
    }
}

impl<T: 'static> Value<T> {
    /// A dependency-free value.
    pub fn pure(value: T) -> Self
    where
        T: Clone,
    {
        Value {
            deps: DepSet::new(),
            thunk: Rc::new(move |_| value.clone()),
        }
    }

    /// Apply a resolved function to a resolved argument.
    ///
    /// The result depends on the union of both dependency sets.
    pub fn ap<F, A>(func: &Value<F>, arg: &Value<A>) -> Value<T>
    where
        F: Fn(A) -> T + 'static,
        A: 'static,
    {
        let deps = func.deps.union(&arg.deps).cloned().collect();
        let func_thunk = Rc::clone(&func.thunk);
        let arg_thunk = Rc::clone(&arg.thunk);
        Value {
            deps,
            thunk: Rc::new(move |map| (func_thunk(map))(arg_thunk(map))),
        }
    }

    /// Transform the result without touching the dependency set.
    pub fn map<U: 'static>(&self, f: impl Fn(T) -> U + 'static) -> Value<U> {
        let thunk = Rc::clone(&self.thunk);
        Value {
            deps: self.deps.clone(),
            thunk: Rc::new(move |map| f(thunk(map))),
        }
    }

    /// Combine two values with a binary function.
    pub fn map2<A, B>(f: impl Fn(A, B) -> T + 'static, a: &Value<A>, b: &Value<B>) -> Value<T>
    where
        A: 'static,
        B: 'static,
    {
        let deps = a.deps.union(&b.deps).cloned().collect();
        let a_thunk = Rc::clone(&a.thunk);
        let b_thunk = Rc::clone(&b.thunk);
        Value {
            deps,
            thunk: Rc::new(move |map| f(a_thunk(map), b_thunk(map))),
        }
    }

    /// Select between two values based on a condition.
    ///
    /// Both branches' keys are counted as dependencies even though only one
    /// branch executes: the generated program must be able to satisfy either
    /// branch depending on its own input.
    pub fn branch(cond: &Value<bool>, when_true: &Value<T>, when_false: &Value<T>) -> Value<T> {
        let mut deps = cond.deps.clone();
        deps.extend(when_true.deps.iter().cloned());
        deps.extend(when_false.deps.iter().cloned());
        let cond_thunk = Rc::clone(&cond.thunk);
        let true_thunk = Rc::clone(&when_true.thunk);
        let false_thunk = Rc::clone(&when_false.thunk);
        Value {
            deps,
            thunk: Rc::new(move |map| {
                if cond_thunk(map) {
                    true_thunk(map)
                } else {
                    false_thunk(map)
                }
            }),
        }
    }

    /// Force extra keys into the dependency set without changing evaluation.
    ///
    /// For dependencies discovered outside the algebra, e.g. a device that
    /// reads a key through side information.
    pub fn with_deps(mut self, extra: impl IntoIterator<Item = UntypedKey>) -> Self {
        self.deps.extend(extra);
        self
    }

    /// The keys this computation can read.
    pub fn deps(&self) -> &DepSet {
        &self.deps
    }

    /// Evaluate against a resolution map. Pure, total, and idempotent.
    pub fn eval(&self, map: &ResolutionMap) -> T {
        (self.thunk)(map)
    }
}

impl<T: Clone + Send + Sync + 'static> Key<T> {
    /// Lift this key into the algebra.
    ///
    /// The resulting value depends on exactly this key and evaluates to the
    /// key's resolved value, falling back to its default.
    pub fn value(&self) -> Value<T> {
        let key = self.clone();
        Value {
            deps: DepSet::from([self.untyped()]),
            thunk: Rc::new(move |map| key.get(map)),
        }
    }
}
