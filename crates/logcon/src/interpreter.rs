//! Interpreter - tree-walking evaluator over a parsed `Script` (spec
//! §4.10).
//!
//! Grounded on `Runtime/Interpreter.cpp`: every scripted entity gets a
//! `RuntimeEntityInstance` holding its own variables/constants/
//! functions, bound to a host through the small `ScriptHost` trait
//! (`SPEC_FULL.md` A.5) rather than a raw back-pointer, since Rust
//! can't hold an unmanaged alias across an `Entity` the ECS might
//! destroy out from under it. Function-call dispatch tries the
//! `FunctionRegistry` first, then a small hardcoded legacy builtin
//! set, then the entity's own user-defined functions, exactly in that
//! order.

use crate::ast::{
    AssignmentTarget, BinaryOp, DeclarationScope, Entity, EventBlock, EventKind, Expression,
    FunctionDef, Statement, UnaryOp,
};
use crate::function_registry::FunctionRegistry;
use crate::value::RuntimeValue;
use std::collections::HashMap;

/// Caps the number of iterations a single `while`/`for` loop may run
/// before the interpreter aborts it with a warning.
pub const MAX_LOOP_ITERATIONS: u64 = 1_000_000;

/// Caps user-function call depth; exceeding it silently returns
/// `RuntimeValue::Unit` instead of overflowing the native stack (spec
/// §4.10, §9).
pub const MAX_RECURSION_DEPTH: u32 = 1_000;

/// Opaque identity for a scripted entity instance. Callers (typically
/// `engine_bridge`) are free to use whatever is convenient - an ECS
/// `Entity`'s bit pattern, a slot index, anything stable for the
/// instance's lifetime.
pub type InstanceId = u64;

/// What a scripted entity is hosted on. `logcon` never touches the
/// ECS directly; the host maps `RuntimeValue`s onto whatever concrete
/// fields it owns.
pub trait ScriptHost {
    fn get_field(&self, name: &str) -> RuntimeValue;
    fn set_field(&mut self, name: &str, value: RuntimeValue);
}

/// Threads control flow (return/break/continue) through statement
/// evaluation instead of using exceptions.
#[derive(Debug, Clone, PartialEq)]
enum ControlFlow {
    Normal,
    Return,
    Break,
    Continue,
}

struct ExecutionContext {
    flow: ControlFlow,
    return_value: RuntimeValue,
}

impl ExecutionContext {
    fn new() -> Self {
        Self { flow: ControlFlow::Normal, return_value: RuntimeValue::Unit }
    }

    fn should_stop(&self) -> bool {
        self.flow != ControlFlow::Normal
    }
}

struct RuntimeEntityInstance {
    entity_name: String,
    properties: HashMap<String, RuntimeValue>,
    variables: HashMap<String, RuntimeValue>,
    constants: HashMap<String, RuntimeValue>,
    functions: HashMap<String, FunctionDef>,
    custom_events: HashMap<String, EventBlock>,
    on_create: Option<EventBlock>,
    on_update: Option<EventBlock>,
    on_destroy: Option<EventBlock>,
    context: ExecutionContext,
    recursion_depth: u32,
}

impl RuntimeEntityInstance {
    fn new(entity_name: String) -> Self {
        Self {
            entity_name,
            properties: HashMap::new(),
            variables: HashMap::new(),
            constants: HashMap::new(),
            functions: HashMap::new(),
            custom_events: HashMap::new(),
            on_create: None,
            on_update: None,
            on_destroy: None,
            context: ExecutionContext::new(),
            recursion_depth: 0,
        }
    }
}

pub struct Interpreter {
    globals: HashMap<String, RuntimeValue>,
    functions: FunctionRegistry,
    instances: HashMap<InstanceId, RuntimeEntityInstance>,
}

impl Interpreter {
    pub fn new(functions: FunctionRegistry) -> Self {
        Self { globals: HashMap::new(), functions, instances: HashMap::new() }
    }

    pub fn function_registry(&self) -> &FunctionRegistry {
        &self.functions
    }

    pub fn function_registry_mut(&mut self) -> &mut FunctionRegistry {
        &mut self.functions
    }

    pub fn is_instantiated(&self, id: InstanceId) -> bool {
        self.instances.contains_key(&id)
    }

    /// Reads a bound instance's property map and, failing that, the
    /// host's mapped field.
    /// Returns `None` if `id` isn't instantiated.
    pub fn get_property(&self, id: InstanceId, identifier: &str, host: &dyn ScriptHost) -> Option<RuntimeValue> {
        let normalized = normalize_identifier(identifier);
        let instance = self.instances.get(&id)?;
        if let Some(value) = instance.properties.get(&normalized) {
            return Some(value.clone());
        }
        Some(match host_field_name(&normalized) {
            Some(canonical) => host.get_field(canonical),
            None => RuntimeValue::String(identifier.to_string()),
        })
    }

    /// Builds a `RuntimeEntityInstance` for `entity`, runs its
    /// top-level property statements once, and binds its event blocks
    /// and function definitions. Does not run `Create` itself - a host
    /// installs `Interpreter::create` as a GameObject `OnCreate` hook
    /// (SPEC_FULL.md A.5) and fires it once the object is actually
    /// live, chaining after any previously installed callback.
    pub fn instantiate(&mut self, id: InstanceId, entity: &Entity, host: &mut dyn ScriptHost) {
        let mut instance = RuntimeEntityInstance::new(entity.name.clone());

        for function in &entity.functions {
            instance.functions.insert(normalize_identifier(&function.name), function.clone());
        }

        for event in &entity.events {
            match &event.kind {
                EventKind::Create => instance.on_create = Some(event.clone()),
                EventKind::Update => instance.on_update = Some(event.clone()),
                EventKind::Destroy => instance.on_destroy = Some(event.clone()),
                EventKind::Collision | EventKind::KeyPress => {
                    instance.custom_events.insert(event_name(&event.kind), event.clone());
                }
                EventKind::Custom(name) => {
                    instance.custom_events.insert(name.clone(), event.clone());
                }
            }
        }

        self.instances.insert(id, instance);

        let properties = entity.properties.clone();
        for statement in &properties {
            self.execute_statement(id, statement, host);
            if self.instances.get(&id).map(|i| i.context.should_stop()).unwrap_or(true) {
                break;
            }
        }
    }

    /// Runs the bound `Create` block, if any. Intended to be installed
    /// as a GameObject's `OnCreate` hook (see `instantiate`'s doc
    /// comment) rather than called synchronously from `instantiate`,
    /// so it chains after any callback a host already installed.
    pub fn create(&mut self, id: InstanceId, host: &mut dyn ScriptHost) {
        let on_create = self.instances.get(&id).and_then(|i| i.on_create.clone());
        if let Some(event) = on_create {
            self.execute_event(id, &event, &[], host);
        }
    }

    /// Runs the bound `Update` block, if any, with `delta_time` bound
    /// to the event's declared parameter.
    pub fn update(&mut self, id: InstanceId, delta_time: f32, host: &mut dyn ScriptHost) {
        let on_update = self.instances.get(&id).and_then(|i| i.on_update.clone());
        if let Some(event) = on_update {
            self.execute_event(id, &event, &[RuntimeValue::Number(delta_time as f64)], host);
        }
    }

    /// Runs the bound `Destroy` block, if any, then unconditionally
    /// unregisters the instance - `OnDestroy` is always effectively
    /// installed so cleanup happens even for scripts that never
    /// declared one.
    pub fn destroy(&mut self, id: InstanceId, host: &mut dyn ScriptHost) {
        let on_destroy = self.instances.get(&id).and_then(|i| i.on_destroy.clone());
        if let Some(event) = on_destroy {
            self.execute_event(id, &event, &[], host);
        }
        self.instances.remove(&id);
    }

    pub fn trigger_event(&mut self, id: InstanceId, name: &str, args: &[RuntimeValue], host: &mut dyn ScriptHost) {
        let normalized = normalize_identifier(name);
        let event = self.instances.get(&id).and_then(|i| i.custom_events.get(&normalized).cloned());
        match event {
            Some(event) => self.execute_event(id, &event, args, host),
            None => log::info!("triggerevent: entity has no custom event named '{name}'"),
        }
    }

    fn execute_event(&mut self, id: InstanceId, event: &EventBlock, args: &[RuntimeValue], host: &mut dyn ScriptHost) {
        if let Some(instance) = self.instances.get_mut(&id) {
            instance.context = ExecutionContext::new();
            if let Some(param) = &event.param {
                if let Some(value) = args.first() {
                    instance.variables.insert(param.clone(), value.clone());
                }
            }
        }

        let statements = event.statements.clone();
        self.execute_block(id, &statements, host);

        if let Some(instance) = self.instances.get_mut(&id) {
            if let Some(param) = &event.param {
                instance.variables.remove(param);
            }
        }
    }

    fn execute_block(&mut self, id: InstanceId, statements: &[Statement], host: &mut dyn ScriptHost) {
        for statement in statements {
            if self.instances.get(&id).map(|i| i.context.should_stop()).unwrap_or(true) {
                break;
            }
            self.execute_statement(id, statement, host);
        }
    }

    fn execute_statement(&mut self, id: InstanceId, statement: &Statement, host: &mut dyn ScriptHost) {
        match statement {
            Statement::Assignment { target, value } => {
                let evaluated = self.evaluate_expression(id, value, host);
                self.execute_assignment(id, target, evaluated, host);
            }
            Statement::FunctionCall(expr) => {
                self.evaluate_expression(id, expr, host);
            }
            Statement::Block(statements) => self.execute_block(id, statements, host),
            Statement::If { condition, then_branch, else_branch } => {
                let cond = self.evaluate_expression(id, condition, host).as_bool();
                if cond {
                    self.execute_block(id, then_branch, host);
                } else if let Some(else_branch) = else_branch {
                    self.execute_block(id, else_branch, host);
                }
            }
            Statement::FunctionDefinition(def) => {
                if let Some(instance) = self.instances.get_mut(&id) {
                    instance.functions.insert(normalize_identifier(&def.name), def.clone());
                }
            }
            Statement::VariableDeclaration { scope, name, value } => {
                self.execute_variable_declaration(id, *scope, name, value.as_ref(), host);
            }
            Statement::TriggerEvent { name, args } => {
                let values: Vec<RuntimeValue> = args.iter().map(|a| self.evaluate_expression(id, a, host)).collect();
                self.trigger_event(id, name, &values, host);
            }
            Statement::Return(expr) => {
                let value = expr.as_ref().map(|e| self.evaluate_expression(id, e, host)).unwrap_or(RuntimeValue::Unit);
                if let Some(instance) = self.instances.get_mut(&id) {
                    instance.context.return_value = value;
                    instance.context.flow = ControlFlow::Return;
                }
            }
            Statement::While { condition, body } => self.execute_while(id, condition, body, host),
            Statement::For { variable, start, end, body } => self.execute_for(id, variable, start, end, body, host),
            Statement::Break => {
                if let Some(instance) = self.instances.get_mut(&id) {
                    instance.context.flow = ControlFlow::Break;
                }
            }
            Statement::Continue => {
                if let Some(instance) = self.instances.get_mut(&id) {
                    instance.context.flow = ControlFlow::Continue;
                }
            }
        }
    }

    fn execute_while(&mut self, id: InstanceId, condition: &Expression, body: &[Statement], host: &mut dyn ScriptHost) {
        let mut iterations: u64 = 0;
        loop {
            if !self.evaluate_expression(id, condition, host).as_bool() {
                break;
            }
            self.execute_block(id, body, host);

            if let Some(instance) = self.instances.get_mut(&id) {
                match instance.context.flow {
                    ControlFlow::Break => {
                        instance.context.flow = ControlFlow::Normal;
                        break;
                    }
                    ControlFlow::Continue => instance.context.flow = ControlFlow::Normal,
                    ControlFlow::Return => break,
                    ControlFlow::Normal => {}
                }
            }

            iterations += 1;
            if iterations > MAX_LOOP_ITERATIONS {
                log::warn!("while loop exceeded {MAX_LOOP_ITERATIONS} iterations, aborting");
                break;
            }
        }
    }

    fn execute_for(
        &mut self,
        id: InstanceId,
        variable: &str,
        start: &Expression,
        end: &Expression,
        body: &[Statement],
        host: &mut dyn ScriptHost,
    ) {
        let variable = normalize_identifier(variable);
        let start_value = self.evaluate_expression(id, start, host).as_number();
        let end_value = self.evaluate_expression(id, end, host).as_number();
        let step = if end_value >= start_value { 1.0 } else { -1.0 };

        let estimated_iterations = ((end_value - start_value) / step).abs() + 1.0;
        if estimated_iterations > MAX_LOOP_ITERATIONS as f64 {
            log::warn!("for loop estimated {estimated_iterations} iterations, exceeds cap, aborting");
            return;
        }

        let previous = self.instances.get(&id).and_then(|i| i.variables.get(&variable).cloned());
        let mut current = start_value;
        let mut iterations: u64 = 0;
        loop {
            if (step > 0.0 && current > end_value) || (step < 0.0 && current < end_value) {
                break;
            }

            if let Some(instance) = self.instances.get_mut(&id) {
                instance.variables.insert(variable.clone(), RuntimeValue::Number(current));
            }

            self.execute_block(id, body, host);

            if let Some(instance) = self.instances.get_mut(&id) {
                match instance.context.flow {
                    ControlFlow::Break => {
                        instance.context.flow = ControlFlow::Normal;
                        break;
                    }
                    ControlFlow::Continue => instance.context.flow = ControlFlow::Normal,
                    ControlFlow::Return => break,
                    ControlFlow::Normal => {}
                }
            }

            current += step;
            iterations += 1;
            if iterations > MAX_LOOP_ITERATIONS {
                log::warn!("for loop exceeded {MAX_LOOP_ITERATIONS} iterations, aborting");
                break;
            }
        }

        if let Some(instance) = self.instances.get_mut(&id) {
            match previous {
                Some(value) => instance.variables.insert(variable.clone(), value),
                None => instance.variables.remove(&variable),
            };
        }
    }

    fn execute_variable_declaration(
        &mut self,
        id: InstanceId,
        scope: DeclarationScope,
        name: &str,
        value: Option<&Expression>,
        host: &mut dyn ScriptHost,
    ) {
        let evaluated = value.map(|e| self.evaluate_expression(id, e, host)).unwrap_or(RuntimeValue::Unit);
        let normalized = normalize_identifier(name);
        match scope {
            DeclarationScope::Global => {
                self.globals.insert(normalized, evaluated);
            }
            DeclarationScope::Constant => {
                if let Some(instance) = self.instances.get_mut(&id) {
                    instance.constants.insert(normalized, evaluated);
                }
            }
            DeclarationScope::Local => {
                if let Some(instance) = self.instances.get_mut(&id) {
                    instance.variables.insert(normalized, evaluated);
                }
            }
        }
    }

    fn execute_assignment(&mut self, id: InstanceId, target: &AssignmentTarget, value: RuntimeValue, host: &mut dyn ScriptHost) {
        match target {
            AssignmentTarget::Identifier(name) => {
                let normalized = normalize_identifier(name);
                if let Some(instance) = self.instances.get_mut(&id) {
                    if instance.variables.contains_key(&normalized) {
                        instance.variables.insert(normalized, value);
                        return;
                    }
                    if instance.constants.contains_key(&normalized) {
                        log::warn!("assignment to constant '{name}' ignored");
                        return;
                    }
                    if self.globals.contains_key(&normalized) {
                        self.globals.insert(normalized, value);
                        return;
                    }
                }

                if let Some(canonical) = host_field_name(&normalized) {
                    apply_property_to_host(canonical, value.clone(), host);
                }
                if let Some(instance) = self.instances.get_mut(&id) {
                    instance.properties.insert(normalized, value);
                }
            }
            AssignmentTarget::Index { object, index } => {
                let object = normalize_identifier(object);
                let array = self.instances.get(&id).and_then(|i| i.variables.get(&object).cloned());
                let array = array.or_else(|| self.instances.get(&id).and_then(|i| i.properties.get(&object).cloned()));
                let index_value = self.evaluate_expression(id, index, host).as_number();
                if let Some(RuntimeValue::Array(items)) = array {
                    let idx = index_value as i64;
                    let mut items = items.borrow_mut();
                    if idx >= 0 && (idx as usize) < items.len() {
                        items[idx as usize] = value;
                    } else {
                        log::warn!("array index {idx} out of bounds (len {})", items.len());
                    }
                }
            }
        }
    }

    fn evaluate_expression(&mut self, id: InstanceId, expr: &Expression, host: &mut dyn ScriptHost) -> RuntimeValue {
        match expr {
            Expression::Identifier(name) => self.resolve_identifier(id, name, host),
            Expression::StringLiteral(s) => RuntimeValue::String(s.clone()),
            Expression::NumberLiteral(n) => RuntimeValue::Number(*n),
            Expression::BooleanLiteral(b) => RuntimeValue::Bool(*b),
            Expression::ArrayLiteral(items) => {
                let values = items.iter().map(|e| self.evaluate_expression(id, e, host)).collect();
                RuntimeValue::array(values)
            }
            Expression::ArrayAccess { object, index } => {
                let array = self.evaluate_expression(id, object, host);
                let idx = self.evaluate_expression(id, index, host).as_number() as i64;
                match array {
                    RuntimeValue::Array(items) => {
                        let items = items.borrow();
                        if idx >= 0 && (idx as usize) < items.len() {
                            items[idx as usize].clone()
                        } else {
                            RuntimeValue::Unit
                        }
                    }
                    _ => RuntimeValue::Unit,
                }
            }
            Expression::Binary { left, op, right } => self.evaluate_binary(id, left, *op, right, host),
            Expression::Unary { op, operand } => self.evaluate_unary(id, *op, operand, host),
            Expression::Call { name, args } => {
                let values: Vec<RuntimeValue> = args.iter().map(|a| self.evaluate_expression(id, a, host)).collect();
                self.call_function(id, name, &values, host)
            }
        }
    }

    /// `AND`/`OR` short-circuit over `AsBool` of the left operand
    /// before the right is ever evaluated (spec §4.10); every other
    /// operator evaluates both operands eagerly.
    fn evaluate_binary(&mut self, id: InstanceId, left: &Expression, op: BinaryOp, right: &Expression, host: &mut dyn ScriptHost) -> RuntimeValue {
        if op == BinaryOp::And {
            let left = self.evaluate_expression(id, left, host);
            if !left.as_bool() {
                return RuntimeValue::Bool(false);
            }
            let right = self.evaluate_expression(id, right, host);
            return RuntimeValue::Bool(right.as_bool());
        }
        if op == BinaryOp::Or {
            let left = self.evaluate_expression(id, left, host);
            if left.as_bool() {
                return RuntimeValue::Bool(true);
            }
            let right = self.evaluate_expression(id, right, host);
            return RuntimeValue::Bool(right.as_bool());
        }

        let left = self.evaluate_expression(id, left, host);
        let right = self.evaluate_expression(id, right, host);

        match op {
            BinaryOp::Plus => {
                if matches!(left, RuntimeValue::String(_)) || matches!(right, RuntimeValue::String(_)) {
                    RuntimeValue::String(format!("{}{}", left.as_string(), right.as_string()))
                } else {
                    RuntimeValue::Number(left.as_number() + right.as_number())
                }
            }
            BinaryOp::Minus => RuntimeValue::Number(left.as_number() - right.as_number()),
            BinaryOp::Star => RuntimeValue::Number(left.as_number() * right.as_number()),
            BinaryOp::Slash => {
                let divisor = right.as_number();
                if divisor == 0.0 {
                    log::warn!("division by zero");
                    RuntimeValue::Number(0.0)
                } else {
                    RuntimeValue::Number(left.as_number() / divisor)
                }
            }
            BinaryOp::Percent => {
                let divisor = right.as_number();
                if divisor == 0.0 {
                    RuntimeValue::Number(0.0)
                } else {
                    RuntimeValue::Number(left.as_number() % divisor)
                }
            }
            BinaryOp::EqualEqual => RuntimeValue::Bool(left.as_string() == right.as_string()),
            BinaryOp::BangEqual => RuntimeValue::Bool(left.as_string() != right.as_string()),
            BinaryOp::Greater => RuntimeValue::Bool(left.as_number() > right.as_number()),
            BinaryOp::GreaterEqual => RuntimeValue::Bool(left.as_number() >= right.as_number()),
            BinaryOp::Less => RuntimeValue::Bool(left.as_number() < right.as_number()),
            BinaryOp::LessEqual => RuntimeValue::Bool(left.as_number() <= right.as_number()),
            BinaryOp::And | BinaryOp::Or => unreachable!("short-circuited above"),
        }
    }

    fn evaluate_unary(&mut self, id: InstanceId, op: UnaryOp, operand: &Expression, host: &mut dyn ScriptHost) -> RuntimeValue {
        let value = self.evaluate_expression(id, operand, host);
        match op {
            UnaryOp::Minus => RuntimeValue::Number(-value.as_number()),
            UnaryOp::Not => RuntimeValue::Bool(!value.as_bool()),
        }
    }

    /// Identifier resolution order: local variables,
    /// constants, interpreter-wide globals, entity properties, the
    /// host's field, then finally the identifier text itself.
    fn resolve_identifier(&mut self, id: InstanceId, name: &str, host: &dyn ScriptHost) -> RuntimeValue {
        let normalized = normalize_identifier(name);

        if let Some(instance) = self.instances.get(&id) {
            if let Some(value) = instance.variables.get(&normalized) {
                return value.clone();
            }
            if let Some(value) = instance.constants.get(&normalized) {
                return value.clone();
            }
        }

        if let Some(value) = self.globals.get(&normalized) {
            return value.clone();
        }

        if let Some(instance) = self.instances.get(&id) {
            if let Some(value) = instance.properties.get(&normalized) {
                return value.clone();
            }
        }

        if let Some(canonical) = host_field_name(&normalized) {
            return host.get_field(canonical);
        }

        RuntimeValue::String(name.to_string())
    }

    /// Four-step dispatch: the process-wide
    /// `FunctionRegistry`, then a small legacy builtin set, then the
    /// entity's own user-defined functions, then a warning and
    /// `RuntimeValue::Unit`.
    fn call_function(&mut self, id: InstanceId, name: &str, args: &[RuntimeValue], host: &mut dyn ScriptHost) -> RuntimeValue {
        let normalized = normalize_identifier(name);

        if let Some(result) = self.functions.call_function(&normalized, args) {
            return result;
        }

        if let Some(result) = self.call_legacy_builtin(id, &normalized, args, host) {
            return result;
        }

        let has_user_function = self.instances.get(&id).map(|i| i.functions.contains_key(&normalized)).unwrap_or(false);
        if has_user_function {
            return self.execute_user_function(id, &normalized, args, host);
        }

        log::warn!("call to unknown function '{name}'");
        RuntimeValue::Unit
    }

    /// A small set of builtins that predate `FunctionRegistry` and
    /// still only exist here: movement directions, `teleport`,
    /// `print`, and the no-op `wait` - a coroutine/scheduler extension
    /// point, intentionally inert for now.
    fn call_legacy_builtin(&mut self, id: InstanceId, name: &str, args: &[RuntimeValue], host: &mut dyn ScriptHost) -> Option<RuntimeValue> {
        match name {
            "print" | "вывести" | "печать" => {
                let rendered: Vec<String> = args.iter().map(RuntimeValue::as_string).collect();
                log::info!("{}", rendered.join(" "));
                Some(RuntimeValue::Unit)
            }
            "moveup" | "двигатьвверх" => {
                self.nudge(id, host, 0.0, -args.first().map(RuntimeValue::as_number).unwrap_or(1.0));
                Some(RuntimeValue::Unit)
            }
            "movedown" | "двигатьвниз" => {
                self.nudge(id, host, 0.0, args.first().map(RuntimeValue::as_number).unwrap_or(1.0));
                Some(RuntimeValue::Unit)
            }
            "moveleft" | "двигатьвлево" => {
                self.nudge(id, host, -args.first().map(RuntimeValue::as_number).unwrap_or(1.0), 0.0);
                Some(RuntimeValue::Unit)
            }
            "moveright" | "двигатьвправо" => {
                self.nudge(id, host, args.first().map(RuntimeValue::as_number).unwrap_or(1.0), 0.0);
                Some(RuntimeValue::Unit)
            }
            "teleport" | "телепорт" => {
                let x = args.first().map(RuntimeValue::as_number).unwrap_or(0.0);
                let y = args.get(1).map(RuntimeValue::as_number).unwrap_or(0.0);
                host.set_field("x", RuntimeValue::Number(x));
                host.set_field("y", RuntimeValue::Number(y));
                Some(RuntimeValue::Unit)
            }
            "iskeypressed" | "клавишанажата" => {
                log::debug!("iskeypressed: no windowing/input backend is wired up, reporting false");
                Some(RuntimeValue::Bool(false))
            }
            "wait" | "ждать" => Some(RuntimeValue::Unit),
            _ => None,
        }
    }

    fn nudge(&mut self, id: InstanceId, host: &mut dyn ScriptHost, dx: f64, dy: f64) {
        let x = host.get_field("x").as_number() + dx;
        let y = host.get_field("y").as_number() + dy;
        host.set_field("x", RuntimeValue::Number(x));
        host.set_field("y", RuntimeValue::Number(y));
        let _ = id;
    }

    fn execute_user_function(&mut self, id: InstanceId, name: &str, args: &[RuntimeValue], host: &mut dyn ScriptHost) -> RuntimeValue {
        let depth = self.instances.get(&id).map(|i| i.recursion_depth).unwrap_or(0);
        if depth >= MAX_RECURSION_DEPTH {
            log::warn!("function '{name}' exceeded max recursion depth ({MAX_RECURSION_DEPTH}), aborting call");
            return RuntimeValue::Unit;
        }

        let def = match self.instances.get(&id).and_then(|i| i.functions.get(name).cloned()) {
            Some(def) => def,
            None => return RuntimeValue::Unit,
        };

        let mut saved_bindings = Vec::new();
        if let Some(instance) = self.instances.get_mut(&id) {
            instance.recursion_depth += 1;
            for (param, value) in def.params.iter().zip(args.iter()) {
                let param = normalize_identifier(param);
                saved_bindings.push((param.clone(), instance.variables.insert(param, value.clone())));
            }
            instance.context = ExecutionContext::new();
        }

        self.execute_block(id, &def.body, host);

        let return_value = self.instances.get(&id).map(|i| i.context.return_value.clone()).unwrap_or(RuntimeValue::Unit);

        if let Some(instance) = self.instances.get_mut(&id) {
            for (param, previous) in saved_bindings {
                match previous {
                    Some(value) => {
                        instance.variables.insert(param, value);
                    }
                    None => {
                        instance.variables.remove(&param);
                    }
                }
            }
            instance.context = ExecutionContext::new();
            instance.recursion_depth = instance.recursion_depth.saturating_sub(1);
        }

        return_value
    }
}

fn event_name(kind: &EventKind) -> String {
    match kind {
        EventKind::Collision => "collision".to_string(),
        EventKind::KeyPress => "keypress".to_string(),
        EventKind::Custom(name) => name.clone(),
        EventKind::Create => "create".to_string(),
        EventKind::Update => "update".to_string(),
        EventKind::Destroy => "destroy".to_string(),
    }
}

/// Lowercases and trims an identifier before it's used as a lookup key.
pub fn normalize_identifier(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Maps a normalized property name (English or Russian) onto its
/// canonical host field name. `скорость` ("speed") is
/// deliberately absent: the original removed that alias, leaving it a
/// plain script property rather than a speedX/speedY write.
fn host_field_name(normalized: &str) -> Option<&'static str> {
    Some(match normalized {
        "x" => "x",
        "y" => "y",
        "width" | "ширина" => "width",
        "height" | "высота" => "height",
        "angle" => "angle",
        "layer" | "слой" => "layer",
        "visible" | "видимый" => "visible",
        "alpha" => "alpha",
        "physics" | "физика" => "physics",
        "speedx" => "speedx",
        "speedy" => "speedy",
        "gravity" | "гравитация" => "gravity",
        "friction" | "трение" => "friction",
        _ => return None,
    })
}

fn apply_property_to_host(canonical: &str, value: RuntimeValue, host: &mut dyn ScriptHost) {
    let coerced = match canonical {
        "layer" => RuntimeValue::Number(value.as_number().floor()),
        "visible" | "physics" => RuntimeValue::Bool(value.as_bool()),
        _ => value,
    };
    host.set_field(canonical, coerced);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::register_builtin_functions;
    use std::cell::RefCell;
    use std::collections::HashMap as StdHashMap;
    use std::rc::Rc;

    #[derive(Default)]
    struct TestHost {
        fields: Rc<RefCell<StdHashMap<String, RuntimeValue>>>,
    }

    impl ScriptHost for TestHost {
        fn get_field(&self, name: &str) -> RuntimeValue {
            self.fields.borrow().get(name).cloned().unwrap_or(RuntimeValue::Number(0.0))
        }
        fn set_field(&mut self, name: &str, value: RuntimeValue) {
            self.fields.borrow_mut().insert(name.to_string(), value);
        }
    }

    fn interpreter() -> Interpreter {
        let mut registry = FunctionRegistry::new();
        register_builtin_functions(&mut registry);
        Interpreter::new(registry)
    }

    fn hero_with_update(statements: Vec<Statement>) -> Entity {
        let mut entity = Entity::new("Hero");
        entity.properties.push(Statement::VariableDeclaration {
            scope: DeclarationScope::Local,
            name: "health".to_string(),
            value: Some(Expression::NumberLiteral(100.0)),
        });
        entity.events.push(EventBlock { kind: EventKind::Update, param: Some("dt".to_string()), statements });
        entity
    }

    #[test]
    fn update_runs_five_times_and_mutates_health() {
        let mut interp = interpreter();
        let mut host = TestHost::default();
        let entity = hero_with_update(vec![Statement::Assignment {
            target: AssignmentTarget::Identifier("health".to_string()),
            value: Expression::Binary {
                left: Box::new(Expression::Identifier("health".to_string())),
                op: BinaryOp::Minus,
                right: Box::new(Expression::NumberLiteral(1.0)),
            },
        }]);

        interp.instantiate(1, &entity, &mut host);
        for _ in 0..5 {
            interp.update(1, 0.016, &mut host);
        }

        let value = interp.resolve_identifier(1, "health", &host);
        assert_eq!(value.as_number(), 95.0);
    }

    #[test]
    fn declaration_name_is_normalized_to_match_lookup() {
        let mut interp = interpreter();
        let mut host = TestHost::default();

        let mut entity = Entity::new("Hero");
        entity.properties.push(Statement::VariableDeclaration {
            scope: DeclarationScope::Local,
            name: "Health".to_string(),
            value: Some(Expression::NumberLiteral(100.0)),
        });
        entity.events.push(EventBlock {
            kind: EventKind::Update,
            param: Some("dt".to_string()),
            statements: vec![Statement::Assignment {
                target: AssignmentTarget::Identifier("health".to_string()),
                value: Expression::Binary {
                    left: Box::new(Expression::Identifier("HEALTH".to_string())),
                    op: BinaryOp::Minus,
                    right: Box::new(Expression::NumberLiteral(1.0)),
                },
            }],
        });

        interp.instantiate(1, &entity, &mut host);
        interp.update(1, 0.016, &mut host);

        // Reading back through any casing must hit the same normalized
        // binding the declaration created, not fall through to a
        // shadow entry in `properties` or the host field default.
        let value = interp.resolve_identifier(1, "health", &host);
        assert_eq!(value.as_number(), 99.0);
        assert!(!interp.instances.get(&1).unwrap().properties.contains_key("health"));
    }

    #[test]
    fn division_by_zero_warns_and_returns_zero() {
        let mut interp = interpreter();
        let mut host = TestHost::default();
        let entity = Entity::new("Hero");
        interp.instantiate(1, &entity, &mut host);

        let result = interp.evaluate_binary(
            1,
            &Expression::NumberLiteral(5.0),
            BinaryOp::Slash,
            &Expression::NumberLiteral(0.0),
            &mut host,
        );
        assert_eq!(result.as_number(), 0.0);
    }

    #[test]
    fn logical_and_short_circuits_on_false_left() {
        let mut interp = interpreter();
        let mut host = TestHost::default();
        let entity = Entity::new("Hero");
        interp.instantiate(1, &entity, &mut host);

        // The right side calls an unknown function; if AND evaluated
        // it anyway we'd still get `false` back, but we also want to
        // confirm the left-false short-circuit doesn't panic or touch
        // the right operand's side effects in a richer host.
        let result = interp.evaluate_binary(
            1,
            &Expression::BooleanLiteral(false),
            BinaryOp::And,
            &Expression::BooleanLiteral(true),
            &mut host,
        );
        assert!(!result.as_bool());
    }

    #[test]
    fn logical_or_short_circuits_on_true_left() {
        let mut interp = interpreter();
        let mut host = TestHost::default();
        let entity = Entity::new("Hero");
        interp.instantiate(1, &entity, &mut host);

        let result = interp.evaluate_binary(
            1,
            &Expression::BooleanLiteral(true),
            BinaryOp::Or,
            &Expression::Call { name: "sort".to_string(), args: vec![] },
            &mut host,
        );
        assert!(result.as_bool());
    }

    #[test]
    fn destroy_unregisters_even_without_destroy_block() {
        let mut interp = interpreter();
        let mut host = TestHost::default();
        let entity = Entity::new("Hero");
        interp.instantiate(1, &entity, &mut host);
        assert!(interp.is_instantiated(1));
        interp.destroy(1, &mut host);
        assert!(!interp.is_instantiated(1));
    }

    #[test]
    fn array_sort_then_print_first_element() {
        let mut interp = interpreter();
        let mut host = TestHost::default();
        let mut entity = Entity::new("Hero");
        entity.properties.push(Statement::VariableDeclaration {
            scope: DeclarationScope::Local,
            name: "xs".to_string(),
            value: Some(Expression::ArrayLiteral(vec![
                Expression::NumberLiteral(3.0),
                Expression::NumberLiteral(1.0),
                Expression::NumberLiteral(2.0),
            ])),
        });
        entity.properties.push(Statement::FunctionCall(Expression::Call {
            name: "sort".to_string(),
            args: vec![Expression::Identifier("xs".to_string())],
        }));

        interp.instantiate(1, &entity, &mut host);
        let xs = interp.resolve_identifier(1, "xs", &host);
        if let RuntimeValue::Array(items) = xs {
            assert_eq!(items.borrow()[0].as_number(), 1.0);
        } else {
            panic!("expected array");
        }
    }

    #[test]
    fn recursion_cap_aborts_with_unit() {
        let mut interp = interpreter();
        let mut host = TestHost::default();
        let mut entity = Entity::new("Hero");
        entity.functions.push(FunctionDef {
            name: "recurse".to_string(),
            params: vec![],
            body: vec![Statement::Return(Some(Expression::Call { name: "recurse".to_string(), args: vec![] }))],
        });
        interp.instantiate(1, &entity, &mut host);

        let result = interp.call_function(1, "recurse", &[], &mut host);
        assert!(matches!(result, RuntimeValue::Unit));
    }

    #[test]
    fn host_field_mapping_coerces_layer_to_integer() {
        assert_eq!(host_field_name("слой"), Some("layer"));
        assert_eq!(host_field_name("скорость"), None);
    }
}
