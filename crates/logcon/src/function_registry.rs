//! FunctionRegistry - the primary builtin dispatch table.
//!
//! Grounded on `Runtime/FunctionRegistry.h` and `BuiltinFunctions.cpp`:
//! a process-wide table of `FunctionInfo` records, each reachable by
//! its canonical name or any of its aliases (the same implementation
//! is usually registered under half a dozen names - Russian, English,
//! and a handful of other locales). `Interpreter::CallFunction` tries
//! this table first, before falling back to the smaller legacy
//! builtin switch that only ever covers a subset of these names.

use crate::value::RuntimeValue;
use std::collections::HashMap;
use std::rc::Rc;

pub type NativeFunction = Rc<dyn Fn(&[RuntimeValue]) -> RuntimeValue>;

#[derive(Clone)]
pub struct FunctionInfo {
    pub canonical_name: String,
    pub aliases: Vec<String>,
    pub implementation: NativeFunction,
    pub category: String,
    pub description: String,
    pub min_args: usize,
    pub max_args: usize,
}

#[derive(Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, FunctionInfo>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `info` under its canonical name and every alias. An alias
    /// already bound to a *different* canonical name is rejected with a
    /// warning and left pointing at its original owner.
    pub fn register_function(&mut self, info: FunctionInfo) {
        for alias in info.aliases.iter().cloned().chain(std::iter::once(info.canonical_name.clone())) {
            if let Some(existing) = self.functions.get(&alias) {
                if existing.canonical_name != info.canonical_name {
                    log::warn!(
                        "function alias '{alias}' already registered to '{}', refusing to rebind to '{}'",
                        existing.canonical_name,
                        info.canonical_name
                    );
                    continue;
                }
            }
            self.functions.insert(alias, info.clone());
        }
    }

    pub fn find_function(&self, name: &str) -> Option<&FunctionInfo> {
        self.functions.get(&name.to_lowercase())
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.functions.contains_key(&name.to_lowercase())
    }

    /// Calls `name` with `args`, returning `None` if the name isn't
    /// registered OR if the argument count falls outside
    /// `[min_args, max_args]` - both cases fall through to the
    /// interpreter's next dispatch step rather than answering with a
    /// value.
    pub fn call_function(&self, name: &str, args: &[RuntimeValue]) -> Option<RuntimeValue> {
        let info = self.find_function(name)?;
        if args.len() < info.min_args || args.len() > info.max_args {
            log::warn!(
                "function '{}' called with {} argument(s), expected {}..={}",
                info.canonical_name,
                args.len(),
                info.min_args,
                info.max_args
            );
            return None;
        }
        Some((info.implementation)(args))
    }

    pub fn functions_by_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a FunctionInfo> {
        self.functions.values().filter(move |f| f.category == category)
    }

    pub fn all_function_names(&self) -> Vec<String> {
        self.functions.keys().cloned().collect()
    }

    pub fn unregister_function(&mut self, name: &str) {
        self.functions.remove(&name.to_lowercase());
    }

    pub fn clear_category(&mut self, category: &str) {
        self.functions.retain(|_, f| f.category != category);
    }

    pub fn clear(&mut self) {
        self.functions.clear();
    }
}

/// Fluent helper for registering every alias of a function under one
/// category without repeating `category`/`description` at each call
/// site.
pub struct FunctionRegistrar<'a> {
    registry: &'a mut FunctionRegistry,
    category: String,
}

impl<'a> FunctionRegistrar<'a> {
    pub fn new(registry: &'a mut FunctionRegistry, category: impl Into<String>) -> Self {
        Self { registry, category: category.into() }
    }

    pub fn add(
        &mut self,
        names: &[&str],
        description: &str,
        min_args: usize,
        max_args: usize,
        implementation: impl Fn(&[RuntimeValue]) -> RuntimeValue + 'static,
    ) -> &mut Self {
        let canonical_name = names[0].to_string();
        let aliases = names[1..].iter().map(|s| s.to_string()).collect();
        self.registry.register_function(FunctionInfo {
            canonical_name,
            aliases,
            implementation: Rc::new(implementation),
            category: self.category.clone(),
            description: description.to_string(),
            min_args,
            max_args,
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_by_alias_reaches_canonical_implementation() {
        let mut registry = FunctionRegistry::new();
        FunctionRegistrar::new(&mut registry, "test").add(
            &["double", "удвоить"],
            "doubles a number",
            1,
            1,
            |args| RuntimeValue::Number(args[0].as_number() * 2.0),
        );

        let result = registry.call_function("удвоить", &[RuntimeValue::Number(4.0)]).unwrap();
        assert_eq!(result.as_number(), 8.0);
    }

    #[test]
    fn call_below_min_args_warns_and_returns_none() {
        let mut registry = FunctionRegistry::new();
        FunctionRegistrar::new(&mut registry, "test").add(&["needs_two"], "", 2, 2, |_| RuntimeValue::Bool(true));

        assert!(registry.call_function("needs_two", &[RuntimeValue::Number(1.0)]).is_none());
    }

    #[test]
    fn unknown_function_returns_none() {
        let registry = FunctionRegistry::new();
        assert!(registry.call_function("nope", &[]).is_none());
    }
}
